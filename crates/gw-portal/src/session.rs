//! Portal client and authenticated session.

use gw_config::{Credentials, PortalConfig};
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::error::PortalError;
use crate::form::has_input_named;
use crate::transport::{HttpTransport, UreqTransport};

/// Entry point for talking to the portal.
///
/// Owns the transport, so the cookie jar lives exactly as long as the
/// client. Create one client per run (or per scheduler tick).
pub struct PortalClient<T: HttpTransport = UreqTransport> {
    transport: T,
    portal: PortalConfig,
}

impl PortalClient<UreqTransport> {
    /// Create a client with a fresh ureq agent and cookie jar.
    #[must_use]
    pub fn from_config(portal: &PortalConfig) -> Self {
        Self::new(UreqTransport::new(portal), portal.clone())
    }
}

impl<T: HttpTransport> PortalClient<T> {
    /// Create a client over an arbitrary transport.
    #[must_use]
    pub fn new(transport: T, portal: PortalConfig) -> Self {
        Self { transport, portal }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the full two-phase login handshake.
    ///
    /// # Errors
    ///
    /// Any error from [`Authenticator::fetch_login_page`] or
    /// [`Authenticator::submit`].
    pub fn authenticate(&self, credentials: &Credentials) -> Result<(), PortalError> {
        let mut auth = Authenticator::new(&self.transport, &self.portal);
        let challenge = auth.fetch_login_page()?;
        auth.submit(challenge, credentials)
    }

    /// Log in and return a session for fetching pages.
    ///
    /// # Errors
    ///
    /// Same as [`PortalClient::authenticate`].
    pub fn login<'a>(&'a self, credentials: &'a Credentials) -> Result<Session<'a, T>, PortalError> {
        self.authenticate(credentials)?;
        info!("Authentication succeeded");
        Ok(Session {
            client: self,
            credentials,
            reauthenticated: false,
        })
    }
}

/// An authenticated portal session.
///
/// The session may log in again once when the portal expires it mid-run;
/// a second expiry is reported instead of retried, so a portal that keeps
/// bouncing us never sees a stream of login attempts.
pub struct Session<'a, T: HttpTransport> {
    client: &'a PortalClient<T>,
    credentials: &'a Credentials,
    reauthenticated: bool,
}

impl<T: HttpTransport> Session<'_, T> {
    /// Fetch a page by path relative to the portal base URL.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Network`] on transport failure
    /// - [`PortalError::HttpStatus`] on an error status
    /// - [`PortalError::SessionExpired`] if the portal sends us back to the
    ///   login page and the one allowed re-login was already used
    /// - any handshake error from the re-login
    pub fn fetch_page(&mut self, path: &str) -> Result<String, PortalError> {
        match self.fetch_once(path) {
            Err(PortalError::SessionExpired { url }) if !self.reauthenticated => {
                warn!("Session expired while fetching {url}, logging in again");
                self.reauthenticated = true;
                self.client.authenticate(self.credentials)?;
                self.fetch_once(path)
            }
            other => other,
        }
    }

    /// Whether the one allowed re-login has been used.
    #[must_use]
    pub fn has_reauthenticated(&self) -> bool {
        self.reauthenticated
    }

    fn fetch_once(&self, path: &str) -> Result<String, PortalError> {
        let portal = &self.client.portal;
        let url = portal.url(path);
        info!("Fetching page: {url}");

        let response = self.client.transport.get(&url)?;
        if response.status >= 400 {
            return Err(PortalError::HttpStatus {
                status: response.status,
                url,
            });
        }

        if is_login_url(portal, &response.url, &url)
            || has_input_named(&response.body, &portal.login.identifier_field)
        {
            return Err(PortalError::SessionExpired { url });
        }

        Ok(response.body)
    }
}

/// Whether `final_url` is the login page (and not the page we asked for).
fn is_login_url(portal: &PortalConfig, final_url: &str, requested: &str) -> bool {
    let strip = |u: &str| {
        u.split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_ascii_lowercase()
    };
    let landed = strip(final_url);
    if landed == strip(requested) {
        return false;
    }
    [portal.url(&portal.login_path), portal.url("")]
        .iter()
        .any(|login| strip(login) == landed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::tests::{HOME_PAGE, LOGIN_PAGE, LOGIN_URL, credentials, portal};
    use crate::mock::MockTransport;

    const RESULTS_URL: &str = "https://portal.test/studzone/FrmEpsStudResult.aspx";
    const RESULTS_PAGE: &str = "<table id=\"DgResult\"><tr><th>Course Code</th></tr></table>";

    fn logged_in_transport() -> MockTransport {
        MockTransport::new()
            .with_get(LOGIN_URL, LOGIN_PAGE)
            .with_post(LOGIN_URL, HOME_PAGE)
    }

    #[test]
    fn test_fetch_page_after_login() {
        let transport = logged_in_transport().with_get(RESULTS_URL, RESULTS_PAGE);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let mut session = client.login(&creds).unwrap();
        let html = session.fetch_page("FrmEpsStudResult.aspx").unwrap();
        assert_eq!(html, RESULTS_PAGE);
        assert!(!session.has_reauthenticated());
    }

    #[test]
    fn test_rejected_login_fetches_nothing() {
        let transport = MockTransport::new()
            .with_get(LOGIN_URL, LOGIN_PAGE)
            .with_post(LOGIN_URL, "<p>Invalid user name or password</p>")
            .with_get(RESULTS_URL, RESULTS_PAGE);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let err = client.login(&creds).err().unwrap();
        assert!(matches!(err, PortalError::Authentication(_)));
        assert_eq!(client.transport().count("GET", RESULTS_URL), 0);
    }

    #[test]
    fn test_expired_session_relogs_once() {
        let transport = logged_in_transport()
            .with_redirect(RESULTS_URL, LOGIN_URL, LOGIN_PAGE)
            .with_get(RESULTS_URL, RESULTS_PAGE);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let mut session = client.login(&creds).unwrap();
        let html = session.fetch_page("FrmEpsStudResult.aspx").unwrap();

        assert_eq!(html, RESULTS_PAGE);
        assert!(session.has_reauthenticated());
        assert_eq!(client.transport().count("POST", LOGIN_URL), 2);
    }

    #[test]
    fn test_second_expiry_is_an_error() {
        let transport = logged_in_transport().with_redirect(RESULTS_URL, LOGIN_URL, LOGIN_PAGE);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let mut session = client.login(&creds).unwrap();
        let err = session.fetch_page("FrmEpsStudResult.aspx").unwrap_err();

        assert!(matches!(err, PortalError::SessionExpired { .. }), "got {err:?}");
        assert_eq!(client.transport().count("POST", LOGIN_URL), 2);

        // Budget is per session: a later expiry is not retried either
        let err = session.fetch_page("FrmEpsStudResult.aspx").unwrap_err();
        assert!(matches!(err, PortalError::SessionExpired { .. }));
        assert_eq!(client.transport().count("POST", LOGIN_URL), 2);
    }

    #[test]
    fn test_login_form_in_body_means_expired() {
        let transport = logged_in_transport().with_get(RESULTS_URL, LOGIN_PAGE);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let mut session = client.login(&creds).unwrap();
        let err = session.fetch_page("FrmEpsStudResult.aspx").unwrap_err();
        assert!(matches!(err, PortalError::SessionExpired { .. }));
    }

    #[test]
    fn test_fetch_error_status() {
        let transport = logged_in_transport().with_status(RESULTS_URL, 500);
        let client = PortalClient::new(transport, portal());
        let creds = credentials();

        let mut session = client.login(&creds).unwrap();
        let err = session.fetch_page("FrmEpsStudResult.aspx").unwrap_err();
        assert!(matches!(err, PortalError::HttpStatus { status: 500, .. }));
    }

    #[test]
    fn test_is_login_url() {
        let portal = portal();
        assert!(is_login_url(
            &portal,
            "https://portal.test/studzone/default.aspx?ReturnUrl=%2fFrmEpsStudResult.aspx",
            RESULTS_URL
        ));
        assert!(is_login_url(&portal, "https://portal.test/studzone/", RESULTS_URL));
        assert!(!is_login_url(&portal, RESULTS_URL, RESULTS_URL));
    }
}
