//! Portal access for gradewatch.
//!
//! Logs into a stateful server-rendered student portal and fetches pages
//! with the resulting session cookies. The login is a two-phase handshake:
//!
//! 1. GET the login page and extract its hidden form state
//!    ([`extract_hidden_fields`])
//! 2. POST the credentials together with the echoed state
//!    ([`Authenticator::submit`])
//!
//! # Architecture
//!
//! - [`HttpTransport`] trait with `get()` and `post_form()`
//! - [`UreqTransport`] blocking implementation with a per-run cookie jar
//! - [`PortalClient`] / [`Session`] for login and page fetching
//! - [`MockTransport`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use gw_portal::PortalClient;
//!
//! let client = PortalClient::from_config(&config.portal);
//! let mut session = client.login(&config.credentials)?;
//! let html = session.fetch_page(&config.portal.results_path)?;
//! ```

mod auth;
mod error;
mod form;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod session;
mod transport;

pub use auth::{AuthState, Authenticator, LoginChallenge};
pub use error::{NetworkError, NetworkErrorKind, PortalError};
pub use form::{HiddenFormState, extract_hidden_fields};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, RecordedRequest};
pub use session::{PortalClient, Session};
pub use transport::{HttpTransport, PortalResponse, UreqTransport};
