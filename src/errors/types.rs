//! Error type definitions for the Pokedex browser
//!
//! Errors are layered: the catalog source and the color pipeline each own a
//! focused enum, and `AppError` wraps them for callers that deal with both.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog source errors (paging, detail lookups)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Dominant-color extraction errors
    #[error("Color error: {0}")]
    Color(#[from] ColorError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while talking to the remote catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure: connection refused, timeout, reset...
    #[error("Network error: {url} - {message}")]
    Network { url: String, message: String },

    /// Non-success HTTP status from the catalog
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Response body could not be parsed
    #[error("Decode error: {url} - {message}")]
    Decode { url: String, message: String },

    /// A summary record without a usable numeric id. Recorded and skipped,
    /// never fatal to the page it came from.
    #[error("Malformed record: no numeric id in reference '{reference}'")]
    MalformedRecord { reference: String },

    /// Request the controller refuses to send
    #[error("Invalid request: {field} - {message}")]
    InvalidRequest { field: String, message: String },
}

/// Errors raised by the color extraction pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Image bytes could not be decoded, or held no usable pixels.
    /// The entry keeps its default color and extraction may be retried.
    #[error("Image decode error: {message}")]
    Decode { message: String },

    /// The extraction was cancelled before its result was committed
    #[error("Extraction cancelled")]
    Cancelled,

    /// The background task panicked or was aborted by the runtime
    #[error("Extraction task failed: {message}")]
    Task { message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a network error
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed record error
    pub fn malformed<R: Into<String>>(reference: R) -> Self {
        Self::MalformedRecord {
            reference: reference.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from the transport rather than the payload
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Http { .. })
    }
}

impl ColorError {
    /// Create a decode error
    pub fn decode<M: Into<String>>(message: M) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ColorError {
    fn from(err: image::ImageError) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ColorError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Task {
                message: err.to_string(),
            }
        }
    }
}
