use thiserror::Error;

/// Error type collaborators hand back across the trait seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Card rendering error wrapper.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl From<String> for RenderError {
    fn from(value: String) -> Self {
        RenderError(value)
    }
}

impl From<&str> for RenderError {
    fn from(value: &str) -> Self {
        RenderError(value.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(value: serde_json::Error) -> Self {
        RenderError(format!("invalid card json: {value}"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config validation failed: {0} is required")]
    Missing(&'static str),
    #[error("config validation failed: {field} must be an absolute URL (got {value})")]
    NotAbsoluteUrl { field: &'static str, value: String },
    #[error("config validation failed: bot_domain must be a bare host name (got {0})")]
    BotDomain(String),
}

/// Failures that end a query turn without a result list.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unsupported invoke: {0}")]
    UnsupportedInvoke(String),
    #[error("token exchange failed: {0}")]
    Auth(BoxError),
    #[error("profile lookup failed: {0}")]
    Profile(BoxError),
    #[error("query parameter {index} out of range: query carries {len} parameters")]
    ParameterOutOfRange { index: usize, len: usize },
    #[error("card rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("bundled data invalid: {0}")]
    Dataset(String),
}
