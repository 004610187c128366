//! Mock transport for testing.
//!
//! Provides [`MockTransport`] for exercising the handshake and the page
//! fetcher without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{NetworkError, NetworkErrorKind};
use crate::transport::{HttpTransport, PortalResponse};

type Scripted = Result<PortalResponse, NetworkErrorKind>;

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// `GET` or `POST`.
    pub method: &'static str,
    /// Requested URL.
    pub url: String,
    /// Form fields (empty for GET).
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a posted form field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Scripted in-memory [`HttpTransport`].
///
/// Responses are queued per method and URL. When a queue holds a single
/// response it is replayed for every further request; unscripted URLs fail
/// with a refused connection.
///
/// # Example
///
/// ```ignore
/// use gw_portal::{HttpTransport, MockTransport};
///
/// let transport = MockTransport::new()
///     .with_get("https://portal.test/Default.aspx", "<form>...</form>");
/// let page = transport.get("https://portal.test/Default.aspx").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(&'static str, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create an empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response for a GET.
    #[must_use]
    pub fn with_get(self, url: &str, body: &str) -> Self {
        self.with_response("GET", url, ok(url, body))
    }

    /// Queue a 200 response for a POST.
    #[must_use]
    pub fn with_post(self, url: &str, body: &str) -> Self {
        self.with_response("POST", url, ok(url, body))
    }

    /// Queue a GET that ends up (after redirects) at `final_url`.
    #[must_use]
    pub fn with_redirect(self, url: &str, final_url: &str, body: &str) -> Self {
        self.with_response("GET", url, ok(final_url, body))
    }

    /// Queue a GET answered with an error status.
    #[must_use]
    pub fn with_status(self, url: &str, status: u16) -> Self {
        let response = PortalResponse {
            status,
            url: url.to_owned(),
            body: String::new(),
        };
        self.with_response("GET", url, response)
    }

    /// Queue a GET that fails at the transport level.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_get_error(self, url: &str, kind: NetworkErrorKind) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(("GET", url.to_owned()))
            .or_default()
            .push_back(Err(kind));
        self
    }

    /// Requests seen so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests to a URL with the given method.
    #[must_use]
    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn with_response(self, method: &'static str, url: &str, response: PortalResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_owned()))
            .or_default()
            .push_back(Ok(response));
        self
    }

    fn respond(
        &self,
        method: &'static str,
        url: &str,
        form: &[(String, String)],
    ) -> Result<PortalResponse, NetworkError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_owned(),
            form: form.to_vec(),
        });

        let mut routes = self.routes.lock().unwrap();
        let scripted = match routes.get_mut(&(method, url.to_owned())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(kind)) => Err(NetworkError::new(url, kind)),
            None => Err(NetworkError::new(url, NetworkErrorKind::ConnectionRefused)),
        }
    }
}

impl HttpTransport for MockTransport {
    fn get(&self, url: &str) -> Result<PortalResponse, NetworkError> {
        self.respond("GET", url, &[])
    }

    fn post_form(
        &self,
        url: &str,
        _referer: &str,
        fields: &[(String, String)],
    ) -> Result<PortalResponse, NetworkError> {
        self.respond("POST", url, fields)
    }
}

fn ok(url: &str, body: &str) -> PortalResponse {
    PortalResponse {
        status: 200,
        url: url.to_owned(),
        body: body.to_owned(),
    }
}
