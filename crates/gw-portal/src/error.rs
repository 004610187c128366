//! Error types for the portal handshake and page fetching.

use std::fmt;

/// Transport-level failure category.
///
/// Connect and read timeouts are kept apart: a dead network path and a slow
/// portal server call for different remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// TCP connect (or DNS resolution) did not finish in time.
    ConnectTimeout,
    /// The server accepted the connection but did not answer in time.
    ReadTimeout,
    /// The remote end refused or dropped the connection.
    ConnectionRefused,
    /// DNS lookup found no such host.
    HostNotFound,
    /// Anything else (TLS, malformed response, redirect loop).
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectTimeout => "connect timeout",
            Self::ReadTimeout => "read timeout",
            Self::ConnectionRefused => "connection refused",
            Self::HostNotFound => "host not found",
            Self::Other => "transport error",
        })
    }
}

/// HTTP request failed before a response could be read.
#[derive(Debug, thiserror::Error)]
#[error("{kind} while requesting {url}")]
pub struct NetworkError {
    /// Requested URL.
    pub url: String,
    /// Failure category.
    pub kind: NetworkErrorKind,
    #[source]
    source: Option<ureq::Error>,
}

impl NetworkError {
    /// Create a network error without an underlying transport error.
    #[must_use]
    pub fn new(url: impl Into<String>, kind: NetworkErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
            source: None,
        }
    }

    /// Classify a ureq error.
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        Self {
            url: url.to_owned(),
            kind: classify(&err),
            source: Some(err),
        }
    }

    /// Whether this is a connect or read timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind,
            NetworkErrorKind::ConnectTimeout | NetworkErrorKind::ReadTimeout
        )
    }
}

fn classify(err: &ureq::Error) -> NetworkErrorKind {
    match err {
        ureq::Error::Timeout(ureq::Timeout::Resolve | ureq::Timeout::Connect) => {
            NetworkErrorKind::ConnectTimeout
        }
        ureq::Error::Timeout(_) => NetworkErrorKind::ReadTimeout,
        ureq::Error::HostNotFound => NetworkErrorKind::HostNotFound,
        ureq::Error::ConnectionFailed => NetworkErrorKind::ConnectionRefused,
        ureq::Error::Io(io) => match io.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => NetworkErrorKind::ConnectionRefused,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                NetworkErrorKind::ReadTimeout
            }
            _ => NetworkErrorKind::Other,
        },
        _ => NetworkErrorKind::Other,
    }
}

/// Error from the portal handshake or an authenticated fetch.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Transport failure (timeout, refused connection, DNS).
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The portal answered with an error status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The login form no longer looks like the configured layout.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The portal rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The portal bounced an authenticated request back to the login page.
    #[error("session expired while fetching {url}")]
    SessionExpired {
        /// Requested URL.
        url: String,
    },

    /// The document is not a usable HTML form page.
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = NetworkError::new("https://portal.test/Default.aspx", NetworkErrorKind::ReadTimeout);
        assert_eq!(
            err.to_string(),
            "read timeout while requesting https://portal.test/Default.aspx"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_refused_is_not_timeout() {
        let err = NetworkError::new("https://portal.test", NetworkErrorKind::ConnectionRefused);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_classify_ureq_errors() {
        assert_eq!(
            classify(&ureq::Error::Timeout(ureq::Timeout::Connect)),
            NetworkErrorKind::ConnectTimeout
        );
        assert_eq!(
            classify(&ureq::Error::Timeout(ureq::Timeout::Resolve)),
            NetworkErrorKind::ConnectTimeout
        );
        assert_eq!(
            classify(&ureq::Error::Timeout(ureq::Timeout::RecvResponse)),
            NetworkErrorKind::ReadTimeout
        );
        assert_eq!(classify(&ureq::Error::HostNotFound), NetworkErrorKind::HostNotFound);
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert_eq!(
            classify(&ureq::Error::Io(refused)),
            NetworkErrorKind::ConnectionRefused
        );
    }

    #[test]
    fn test_portal_error_from_network() {
        let err: PortalError =
            NetworkError::new("https://portal.test", NetworkErrorKind::HostNotFound).into();
        assert!(matches!(err, PortalError::Network(_)));
        assert_eq!(err.to_string(), "host not found while requesting https://portal.test");
    }
}
