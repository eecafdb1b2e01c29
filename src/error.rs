/// Error types for the reverse rewriting proxy
use thiserror::Error;

/// Main error type for reverse proxy operations
#[derive(Error, Debug)]
pub enum ReverseProxyError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected reverse proxy rules
    #[error("Reverse proxy rule rejected: {0}")]
    Rule(#[from] RuleError),

    /// Upstream connection errors
    #[error("Upstream connection error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Network I/O errors
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Reasons a reverse proxy rule is discarded at load time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Rule has no backend url at all
    #[error("Illegal reverse proxy rule: missing url")]
    MissingUrl,

    /// Backend url lacks a scheme separator
    #[error("Skipping reverse proxy rule: '{url}' is not a valid url")]
    InvalidUrl { url: String },

    /// Path rule that is not absolute
    #[error("Skipping reverse proxy rule: path '{path}' doesn't start with a /")]
    PathWithoutSlash { path: String },

    /// Host rule without a host
    #[error("Skipping reverse proxy rule: host is missing")]
    MissingHost,

    /// Configuration entry naming both a path and a host
    #[error("Skipping reverse proxy rule: both path '{path}' and host '{host}' given")]
    AmbiguousDiscriminator { path: String, host: String },
}

/// Upstream connection errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection failed
    #[error("Failed to connect to upstream {upstream}: {reason}")]
    ConnectionFailed { upstream: String, reason: String },

    /// Request failed
    #[error("Upstream request failed to {upstream}: {reason}")]
    RequestFailed { upstream: String, reason: String },

    /// Timeout
    #[error("Upstream request timeout to {upstream} after {timeout:?}")]
    Timeout {
        upstream: String,
        timeout: std::time::Duration,
    },

    /// Response body over the configured limit
    #[error("Upstream response from {upstream} exceeds {limit} bytes")]
    ResponseTooLarge { upstream: String, limit: usize },

    /// Invalid upstream address
    #[error("Invalid upstream address: {address}")]
    InvalidAddress { address: String },
}

/// Result type alias for convenience
pub type ReverseProxyResult<T> = Result<T, ReverseProxyError>;

/// Helper trait to convert errors to [`ReverseProxyError`].
///
/// Wraps errors from external operations (parsing, validation) into
/// [`ReverseProxyError::InvalidInput`] with additional context.
///
/// # Example
///
/// ```rust
/// use reverse_rewrite::error::ToReverseProxyError;
///
/// let result: Result<String, &'static str> = Err("invalid format");
/// let converted = result.to_reverse_proxy_error("url parsing").unwrap_err();
/// assert!(converted.to_string().contains("url parsing"));
/// ```
pub trait ToReverseProxyError<T> {
    /// Convert the result to a [`ReverseProxyResult`] with context.
    fn to_reverse_proxy_error(self, context: &str) -> Result<T, ReverseProxyError>;
}

impl<T, E: std::fmt::Display> ToReverseProxyError<T> for Result<T, E> {
    fn to_reverse_proxy_error(self, context: &str) -> Result<T, ReverseProxyError> {
        self.map_err(|e| ReverseProxyError::InvalidInput(format!("{}: {}", context, e)))
    }
}
