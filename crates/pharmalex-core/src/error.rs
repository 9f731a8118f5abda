use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid vocabulary pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Group key field '{field}' is absent on every record")]
    MissingGroupKey { field: String },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
