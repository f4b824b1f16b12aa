pub mod config;
pub mod error;
pub mod token_budget;
pub mod types;

pub use config::AppConfig;
pub use error::ClaimsiftError;
pub use types::*;
