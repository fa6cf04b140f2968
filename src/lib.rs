pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod views;
