pub mod entities;
pub mod executor;
pub mod intent;
mod service;

pub use executor::QueryExecutor;
pub use service::{EXAMPLE_QUERIES, NlpResponse, NlpService, SUGGESTED_QUERIES};
