use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised at the document boundary.
///
/// The translators themselves never fail: malformed fragments are degraded
/// and reported through [`crate::types::Warnings`]. These variants cover
/// reading input documents, loading configuration and writing output.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
