use thiserror::Error;

/// Error type for engine configuration and input-document failures.
///
/// Scoring and sampling never fail; only building a configuration or parsing
/// JSON input does.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
