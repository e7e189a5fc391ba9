//! Error types for resource fetching and rewriting

/// Error raised while fetching, rewriting or storing a resource
///
/// `Clone` so a single failed fetch can be handed to every caller that was
/// waiting on the same coalesced request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    #[error("request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        /// Leading excerpt of the response body, for diagnostics
        body: String,
    },

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse CSS: {0}")]
    Css(String),

    #[error("failed to rewrite HTML: {0}")]
    Html(String),

    #[error("failed to render markdown: {0}")]
    Markdown(String),

    #[error("malformed content: {0}")]
    Data(String),

    #[error("API error from {query}: {message}")]
    Api { query: String, message: String },
}

impl ResourceError {
    pub(crate) fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        ResourceError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Status code for errors that came back from the server
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ResourceError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        ResourceError::Data(e.to_string())
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;
