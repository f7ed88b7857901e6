use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// An input is neither an `s3://` URI nor a readable list-file.
    #[error("Invalid input path: {0}")]
    Format(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store error for {target}: {message}")]
    Store { target: String, message: String },

    #[error("Report error: {0}")]
    Report(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Gave up waiting after {polls} polls; {remaining} object(s) still restoring")]
    PollLimit { polls: u32, remaining: usize },
}

impl AppError {
    pub fn store(target: impl ToString, message: impl Into<String>) -> Self {
        AppError::Store {
            target: target.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
