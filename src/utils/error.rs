use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Page load timed out after {seconds}s: {message}")]
    Timeout { seconds: u64, message: String },

    #[error("Alert error: {0}")]
    Alert(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Fetch and timeout failures are downgraded to an Unknown check result;
    /// everything else is fatal at startup.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(self, AppError::Fetch(_) | AppError::Timeout { .. })
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
