// Settings errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings source unreadable: {0}")]
    Unreadable(String),

    #[error("settings source malformed: {0}")]
    Malformed(String),

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
