use thiserror::Error;

/// Errors surfaced by the panel core.
///
/// None of these abort the host: configuration problems are logged and the panel degrades,
/// `NotReady` is returned to the caller for a later retry, and URL validation failures are
/// shown on the status label.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("panel is not ready: {0}")]
    NotReady(&'static str),

    #[error("button label must not be empty")]
    EmptyLabel,

    #[error(transparent)]
    Validation(#[from] UrlValidationError),
}

/// Rejections produced by the server address confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UrlValidationError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("Invalid URL format")]
    InvalidFormat,
}

impl PanelError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, PanelError::NotReady(_))
    }
}
