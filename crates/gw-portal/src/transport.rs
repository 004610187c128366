//! Blocking HTTP transport with a per-run cookie jar.

use gw_config::PortalConfig;
use tracing::debug;
use ureq::{Agent, ResponseExt};

use crate::error::NetworkError;

/// Maximum redirects followed per request.
const MAX_REDIRECTS: u32 = 10;

/// Response as seen by the handshake and the page fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    /// HTTP status code.
    pub status: u16,
    /// URL the body was finally served from (after redirects).
    pub url: String,
    /// Response body.
    pub body: String,
}

/// Minimal HTTP surface the portal client needs.
///
/// Implementations must keep cookies between calls: the login POST has to
/// carry the cookies set by the login GET, and page fetches the cookies set
/// by the login POST. Error statuses are returned as responses, not errors.
pub trait HttpTransport {
    /// Perform a GET request.
    fn get(&self, url: &str) -> Result<PortalResponse, NetworkError>;

    /// Perform a form-urlencoded POST request.
    fn post_form(
        &self,
        url: &str,
        referer: &str,
        fields: &[(String, String)],
    ) -> Result<PortalResponse, NetworkError>;
}

/// [`HttpTransport`] backed by a ureq agent with cookie store.
pub struct UreqTransport {
    agent: Agent,
    user_agent: String,
}

impl UreqTransport {
    /// Create a transport with the portal's connect and read timeouts.
    ///
    /// The read timeout bounds both waiting for the response head and
    /// receiving the body.
    #[must_use]
    pub fn new(portal: &PortalConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_connect(Some(portal.connect_timeout()))
            .timeout_recv_response(Some(portal.read_timeout()))
            .timeout_recv_body(Some(portal.read_timeout()))
            .max_redirects(MAX_REDIRECTS)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: portal.user_agent.clone(),
        }
    }

    fn read(
        url: &str,
        response: ureq::http::Response<ureq::Body>,
    ) -> Result<PortalResponse, NetworkError> {
        let status = response.status().as_u16();
        let final_url = response.get_uri().to_string();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| NetworkError::from_ureq(url, e))?;

        debug!(status, url = %final_url, bytes = body.len(), "response received");
        Ok(PortalResponse {
            status,
            url: final_url,
            body,
        })
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<PortalResponse, NetworkError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| NetworkError::from_ureq(url, e))?;
        Self::read(url, response)
    }

    fn post_form(
        &self,
        url: &str,
        referer: &str,
        fields: &[(String, String)],
    ) -> Result<PortalResponse, NetworkError> {
        let response = self
            .agent
            .post(url)
            .header("User-Agent", &self.user_agent)
            .header("Referer", referer)
            .send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| NetworkError::from_ureq(url, e))?;
        Self::read(url, response)
    }
}
