pub mod db;
pub mod error;
pub mod http;
pub mod memory;
pub mod revalidate;
pub mod telemetry;
