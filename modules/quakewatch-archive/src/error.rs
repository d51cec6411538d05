use std::time::Duration;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A page could not be retrieved. Every variant aborts extraction for the run.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Timed out after {}s fetching {url}", after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rendering proxy failed: {0}")]
    Proxy(String),

    #[error("Headless browser failed: {0}")]
    Browser(String),

    #[error("Response body could not be read: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No backend configured for the {0} profile")]
    Unavailable(String),
}

impl TransportError {
    /// Short tag stored on error records.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "Timeout",
            TransportError::Connect(_) => "Connect",
            TransportError::HttpStatus { .. } => "HttpStatus",
            TransportError::Request(_) => "Request",
            TransportError::Proxy(_) => "Proxy",
            TransportError::Browser(_) => "Browser",
            TransportError::Decode(_) => "Decode",
            TransportError::InvalidUrl(_) => "InvalidUrl",
            TransportError::Unavailable(_) => "Unavailable",
        }
    }

    /// Classify a reqwest failure for `url`, fetched with the given timeout.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                after: timeout,
            }
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_url_and_budget() {
        let err = TransportError::Timeout {
            url: "https://example.com".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.to_string(), "Timed out after 30s fetching https://example.com");
    }

    #[test]
    fn status_errors_keep_the_code() {
        let err = TransportError::HttpStatus {
            status: 503,
            url: "https://example.com".into(),
        };
        assert_eq!(err.kind(), "HttpStatus");
        assert!(err.to_string().contains("503"));
    }
}
