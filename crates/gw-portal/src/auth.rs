//! Two-phase login handshake.
//!
//! 1. GET the login page and pull out the hidden form state
//! 2. POST the credentials together with every hidden field
//!
//! The portal answers a rejected login with HTTP 200 and an error banner (or
//! simply the login form again), so the outcome is classified from the body,
//! never from the status code alone.

use gw_config::{Credentials, LoginFormConfig, PortalConfig};
use tracing::{debug, info, warn};

use crate::error::PortalError;
use crate::form::{HiddenFormState, extract_hidden_fields, has_input_named};
use crate::transport::{HttpTransport, PortalResponse};

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing sent yet.
    Unauthenticated,
    /// Login page GET in flight.
    FetchingLoginPage,
    /// Credentials POST in flight.
    Submitting,
    /// The portal accepted the credentials.
    Authenticated,
    /// The handshake failed; start over with a new [`Authenticator`].
    Failed,
}

/// Server-issued state from phase one, consumed by phase two.
#[derive(Debug, Clone)]
pub struct LoginChallenge {
    /// URL the login form was served from; the POST goes there.
    pub action_url: String,
    /// Hidden fields to echo back.
    pub state: HiddenFormState,
}

/// Drives one login attempt against the portal.
pub struct Authenticator<'a, T: HttpTransport> {
    transport: &'a T,
    portal: &'a PortalConfig,
    state: AuthState,
}

impl<'a, T: HttpTransport> Authenticator<'a, T> {
    /// Create an authenticator in the [`AuthState::Unauthenticated`] state.
    #[must_use]
    pub fn new(transport: &'a T, portal: &'a PortalConfig) -> Self {
        Self {
            transport,
            portal,
            state: AuthState::Unauthenticated,
        }
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Phase one: fetch the login page and extract its hidden state.
    ///
    /// The configured login path is tried first, then the bare base URL;
    /// a 404 falls through to the next candidate.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Network`] on transport failure
    /// - [`PortalError::HttpStatus`] on an error status
    /// - [`PortalError::Parse`] if the page has no form
    /// - [`PortalError::Protocol`] if a required hidden field is missing
    pub fn fetch_login_page(&mut self) -> Result<LoginChallenge, PortalError> {
        self.transition(AuthState::FetchingLoginPage);
        let result = self.fetch_login_page_inner();
        if result.is_err() {
            self.transition(AuthState::Failed);
        }
        result
    }

    fn fetch_login_page_inner(&self) -> Result<LoginChallenge, PortalError> {
        let response = self.get_login_page()?;
        let state = extract_hidden_fields(&response.body)?;

        let missing = state.missing(&self.portal.login.required_fields);
        if !missing.is_empty() {
            warn!(missing = ?missing, "login form lacks required hidden fields");
            return Err(PortalError::Protocol(format!(
                "portal form layout changed: missing hidden field(s) {}",
                missing.join(", ")
            )));
        }

        debug!(fields = state.len(), url = %response.url, "login form state extracted");
        Ok(LoginChallenge {
            action_url: response.url,
            state,
        })
    }

    fn get_login_page(&self) -> Result<PortalResponse, PortalError> {
        let candidates = login_url_candidates(self.portal);
        let last = candidates.len() - 1;

        for (attempt, url) in candidates.iter().enumerate() {
            info!("Fetching login page: {url}");
            let response = self.transport.get(url)?;
            match response.status {
                404 if attempt < last => {
                    warn!("Login page {url} returned 404, trying next candidate");
                }
                status if status >= 400 => {
                    return Err(PortalError::HttpStatus {
                        status,
                        url: url.clone(),
                    });
                }
                _ => return Ok(response),
            }
        }

        Err(PortalError::Protocol("login page could not be retrieved".to_owned()))
    }

    /// Phase two: submit credentials with the hidden state of `challenge`.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Network`] on transport failure
    /// - [`PortalError::HttpStatus`] on an error status
    /// - [`PortalError::Authentication`] if the body shows the login was rejected
    pub fn submit(
        &mut self,
        challenge: LoginChallenge,
        credentials: &Credentials,
    ) -> Result<(), PortalError> {
        self.transition(AuthState::Submitting);
        let result = self.submit_inner(challenge, credentials);
        self.transition(if result.is_ok() {
            AuthState::Authenticated
        } else {
            AuthState::Failed
        });
        result
    }

    fn submit_inner(
        &self,
        challenge: LoginChallenge,
        credentials: &Credentials,
    ) -> Result<(), PortalError> {
        let form = build_login_form(&challenge.state, &self.portal.login, credentials);
        let response = self.transport.post_form(
            &challenge.action_url,
            &challenge.action_url,
            &form,
        )?;

        if response.status >= 400 {
            return Err(PortalError::HttpStatus {
                status: response.status,
                url: challenge.action_url,
            });
        }

        if let Some(reason) = rejection_reason(&response.body, &self.portal.login) {
            warn!(reason, "portal rejected the login");
            return Err(PortalError::Authentication("credentials rejected".to_owned()));
        }

        info!("Login POST accepted at {}", response.url);
        Ok(())
    }

    fn transition(&mut self, next: AuthState) {
        debug!(from = ?self.state, to = ?next, "auth state");
        self.state = next;
    }
}

/// Login page URLs to try, in order, without duplicates.
fn login_url_candidates(portal: &PortalConfig) -> Vec<String> {
    let mut urls = vec![portal.url(&portal.login_path)];
    let base = portal.url("");
    if !urls.contains(&base) {
        urls.push(base);
    }
    urls
}

/// Hidden state, then static extras, then the credentials.
///
/// Later entries override earlier ones with the same name, so a configured
/// extra (e.g. `__EVENTTARGET`) wins over the empty value the page issued.
fn build_login_form(
    state: &HiddenFormState,
    login: &LoginFormConfig,
    credentials: &Credentials,
) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> =
        Vec::with_capacity(state.len() + login.extra_fields.len() + 2);
    let mut set = |name: &str, value: &str| {
        if let Some(existing) = form.iter_mut().find(|(n, _)| n == name) {
            value.clone_into(&mut existing.1);
        } else {
            form.push((name.to_owned(), value.to_owned()));
        }
    };

    for (name, value) in state.iter() {
        set(name, value);
    }
    for (name, value) in &login.extra_fields {
        set(name, value);
    }
    set(&login.identifier_field, &credentials.identifier);
    set(&login.secret_field, credentials.secret.expose());

    form
}

/// Why a login POST response counts as a rejection, if it does.
fn rejection_reason(body: &str, login: &LoginFormConfig) -> Option<&'static str> {
    let lowered = body.to_lowercase();
    let marker_hit = login
        .failure_markers
        .iter()
        .filter(|m| !m.is_empty())
        .any(|m| lowered.contains(&m.to_lowercase()));
    if marker_hit {
        return Some("failure marker present");
    }
    if has_input_named(body, &login.identifier_field) {
        return Some("login form reappeared");
    }
    None
}
