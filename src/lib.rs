pub mod alert;
pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod utils;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use models::{Availability, CheckResult, PageSnapshot};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
