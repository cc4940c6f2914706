//! Error types for URL and settings handling.

/// Errors surfaced by the URL utilities, the JSON view and the host-input checks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base URL could not be parsed as an absolute URL
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Edited JSON view is not valid JSON
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid JSON: Not an array")]
    NotAnArray,

    #[error("Invalid JSON: entry {index} is not a string")]
    NonStringEntry { index: usize },

    #[error("No active tab URL found")]
    NoActiveTab,

    /// Browser-internal pages cannot be inspected
    #[error("Cannot access browser internal pages: {0}")]
    RestrictedPage(String),

    #[error("Invalid URL in clipboard")]
    InvalidClipboardUrl,
}

pub type Result<T> = std::result::Result<T, Error>;
