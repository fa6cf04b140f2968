//! Application services: feed queries, relationship toggles, and their store contracts.

pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod profile;
pub mod relations;
pub mod repos;
pub mod revalidate;
