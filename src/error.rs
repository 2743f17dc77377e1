use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error), // Converts io::Error into AppError automatically

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError), // Converts rusqlite::Error automatically

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParam { param: String, reason: String },

    #[error("Error: {0}")]
    Error(String), // Allows custom application errors
}

impl AppError {
    pub fn invalid_param(param: &str, reason: impl Into<String>) -> Self {
        AppError::InvalidParam {
            param: param.to_owned(),
            reason: reason.into(),
        }
    }
}
