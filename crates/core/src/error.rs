#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}
