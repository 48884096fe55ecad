use thiserror::Error;

/// Errors surfaced by the page server outside of a request.
///
/// Request-level problems never reach callers as `Err`: they are turned into
/// status responses by the router.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid value for {key}: {message}")]
    Config { key: String, message: String },

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("request body of {0} bytes exceeds the configured limit")]
    PayloadTooLarge(usize),

    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Addr(#[from] std::net::AddrParseError),
}

impl Error {
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
