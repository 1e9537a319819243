use thiserror::Error;

#[derive(Debug, Error)]
pub enum WringError {
    #[error("pattern error: {0}")]
    Pattern(#[from] fancy_regex::Error),

    #[error("invalid option value: {0}")]
    InvalidOption(String),
}
