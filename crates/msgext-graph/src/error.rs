use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("invalid sso token: {0}")]
    SsoToken(String),
    #[error("blocking task failed: {0}")]
    Join(String),
}

impl From<ureq::Error> for GraphError {
    fn from(value: ureq::Error) -> Self {
        GraphError::Transport(value.to_string())
    }
}

impl From<tokio::task::JoinError> for GraphError {
    fn from(value: tokio::task::JoinError) -> Self {
        GraphError::Join(value.to_string())
    }
}
