//! Configuration management for gradewatch.
//!
//! Parses `gradewatch.toml` with serde and provides auto-discovery of the
//! config file in parent directories. Everything the portal handshake needs
//! (paths, table ids, form field names, failure markers) is configuration;
//! nothing portal-specific is built in.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `portal.base_url`
//! - `credentials.identifier`
//! - `credentials.secret`
//! - `mail.smtp_host`
//! - `mail.username`
//! - `mail.password`
//! - `mail.sender`
//! - `mail.recipient`
//! - `state.dir`

mod expand;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gradewatch.toml";

/// Default state directory, relative to the config file.
const DEFAULT_STATE_DIR: &str = ".gradewatch";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the baseline state directory.
    pub state_dir: Option<PathBuf>,
    /// Override the scheduler interval.
    pub interval_minutes: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Portal location and login form layout.
    pub portal: PortalConfig,
    /// Portal account.
    pub credentials: Credentials,
    /// Outbound mail relay.
    pub mail: MailConfig,
    /// Baseline storage (paths are relative strings from TOML).
    #[serde(default)]
    state: StateConfigRaw,
    /// Scheduler cadence for `gw watch`.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Resolved state configuration (set after loading).
    #[serde(skip)]
    pub state_resolved: StateConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// A string that must never show up in logs or debug output.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the cleartext value. Only pass the result to the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

/// Portal account credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Login identifier (roll number, user name).
    pub identifier: String,
    /// Login password.
    pub secret: Secret,
}

/// Portal location, page paths and timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL, e.g. `https://portal.example.edu/studzone`.
    pub base_url: String,
    /// Login page path relative to `base_url` (empty for the base URL itself).
    pub login_path: String,
    /// Results page path relative to `base_url`.
    pub results_path: String,
    /// Attendance page path relative to `base_url`.
    pub attendance_path: String,
    /// `id` attribute of the results table.
    pub results_table: String,
    /// `id` attribute of the attendance table.
    pub attendance_table: String,
    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Timeout for the server to answer and send the body.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Login form layout.
    pub login: LoginFormConfig,
}

impl PortalConfig {
    /// Join a relative path onto the base URL.
    ///
    /// An empty (or `/`-only) path yields the base URL itself.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim().trim_start_matches('/');
        if path.is_empty() {
            base.to_owned()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "portal.base_url")?;
        require_http_url(&self.base_url, "portal.base_url")?;
        require_non_empty(&self.results_path, "portal.results_path")?;
        require_non_empty(&self.attendance_path, "portal.attendance_path")?;
        require_non_empty(&self.results_table, "portal.results_table")?;
        require_non_empty(&self.attendance_table, "portal.attendance_table")?;
        require_positive(self.connect_timeout_secs, "portal.connect_timeout_secs")?;
        require_positive(self.read_timeout_secs, "portal.read_timeout_secs")?;
        require_non_empty(&self.login.identifier_field, "portal.login.identifier_field")?;
        require_non_empty(&self.login.secret_field, "portal.login.secret_field")?;
        Ok(())
    }
}

/// Layout of the stateful login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginFormConfig {
    /// Name of the input carrying the login identifier.
    pub identifier_field: String,
    /// Name of the input carrying the password.
    pub secret_field: String,
    /// Hidden fields that must be echoed back, e.g. `__VIEWSTATE`.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Static fields added to the login POST (event target, button value).
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
    /// Body substrings (case-insensitive) that mark a rejected login.
    #[serde(default)]
    pub failure_markers: Vec<String>,
}

/// Transport security for the mail relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Implicit TLS (SMTPS, usually port 465).
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    Starttls,
}

/// Outbound mail relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Relay host name.
    pub smtp_host: String,
    /// Relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Transport security.
    #[serde(default)]
    pub security: MailSecurity,
    /// Relay user name.
    pub username: String,
    /// Relay password.
    pub password: Secret,
    /// `From` address.
    pub sender: String,
    /// `To` address.
    pub recipient: String,
    /// Timeout for each relay operation.
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
    /// Send a notice after every successful portal login.
    #[serde(default)]
    pub notify_on_login: bool,
}

impl MailConfig {
    /// Relay timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.smtp_host, "mail.smtp_host")?;
        require_non_empty(&self.username, "mail.username")?;
        require_non_empty(self.password.expose(), "mail.password")?;
        require_non_empty(&self.sender, "mail.sender")?;
        require_non_empty(&self.recipient, "mail.recipient")?;
        if self.smtp_port == 0 {
            return Err(ConfigError::Validation(
                "mail.smtp_port cannot be 0".to_owned(),
            ));
        }
        require_positive(self.timeout_secs, "mail.timeout_secs")?;
        Ok(())
    }
}

/// Raw state configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StateConfigRaw {
    dir: Option<String>,
}

/// Resolved baseline storage configuration with absolute paths.
#[derive(Debug, Default)]
pub struct StateConfig {
    /// Directory holding one baseline file per record kind.
    pub dir: PathBuf,
}

/// Scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between two checks in `gw watch`.
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
        }
    }
}

impl ScheduleConfig {
    /// Interval as a [`Duration`], saturating for absurd values.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("gradewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_smtp_port() -> u16 {
    465
}

fn default_mail_timeout() -> u64 {
    30
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error (includes missing required keys).
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`credentials.secret`").
        field: String,
        /// Error message (e.g., "${`PORTAL_PASSWORD`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `gradewatch.toml` in the current directory and its parents. There
    /// is no built-in fallback: portal paths and credentials have no sensible
    /// defaults, so a missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns error if no config file is found, parsing fails, a referenced
    /// environment variable is unset, or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => path.to_path_buf(),
            None => Self::discover_config()
                .ok_or_else(|| ConfigError::NotFound(PathBuf::from(CONFIG_FILENAME)))?,
        };

        let mut config = Self::load_from_file(&path)?;

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse configuration from TOML text, resolving relative paths against
    /// `config_dir`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus file discovery.
    pub fn from_toml_str(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(state_dir) = &settings.state_dir {
            self.state_resolved.dir.clone_from(state_dir);
        }
        if let Some(interval) = settings.interval_minutes {
            self.schedule.interval_minutes = interval;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml_str(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.portal.validate()?;
        require_non_empty(&self.credentials.identifier, "credentials.identifier")?;
        require_non_empty(self.credentials.secret.expose(), "credentials.secret")?;
        self.mail.validate()?;
        require_positive(self.schedule.interval_minutes, "schedule.interval_minutes")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.portal.base_url = expand::expand_env(&self.portal.base_url, "portal.base_url")?;

        self.credentials.identifier =
            expand::expand_env(&self.credentials.identifier, "credentials.identifier")?;
        self.credentials.secret = Secret::new(expand::expand_env(
            self.credentials.secret.expose(),
            "credentials.secret",
        )?);

        let mail = &mut self.mail;
        mail.smtp_host = expand::expand_env(&mail.smtp_host, "mail.smtp_host")?;
        mail.username = expand::expand_env(&mail.username, "mail.username")?;
        mail.password = Secret::new(expand::expand_env(mail.password.expose(), "mail.password")?);
        mail.sender = expand::expand_env(&mail.sender, "mail.sender")?;
        mail.recipient = expand::expand_env(&mail.recipient, "mail.recipient")?;

        if let Some(ref dir) = self.state.dir {
            self.state.dir = Some(expand::expand_env(dir, "state.dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let dir = self.state.dir.as_deref().unwrap_or(DEFAULT_STATE_DIR);
        self.state_resolved = StateConfig {
            dir: config_dir.join(dir),
        };
    }
}
