use std::env;
use std::time::Duration;

use crate::error::TrackerError;

pub const DEFAULT_TEAM_ID: &str = "372250";
pub const DEFAULT_TEAM_NAME: &str = "Obsidian Howlers";
pub const DEFAULT_BASE_URL: &str = "https://ctftime.org";

pub const WEB_APP_URL_VAR: &str = "APPS_SCRIPT_WEB_APP_URL";
pub const SECRET_TOKEN_VAR: &str = "APPS_SCRIPT_SECRET_TOKEN";

// ============================================================================
// TRACKER CONFIGURATION
// ============================================================================

/// Which team to track and how patiently to fetch its pages.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub team_id: String,
    pub team_name: String,
    pub base_url: String,
    pub profile_timeout: Duration,
    pub event_timeout: Duration,
    /// Number of event pages fetched at once. 1 keeps the run strictly sequential.
    pub fetch_concurrency: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            team_id: DEFAULT_TEAM_ID.to_string(),
            team_name: DEFAULT_TEAM_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            profile_timeout: Duration::from_secs(15),
            event_timeout: Duration::from_secs(10),
            fetch_concurrency: 1,
        }
    }
}

impl TrackerConfig {
    pub fn new(team_id: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_profile_timeout(mut self, timeout: Duration) -> Self {
        self.profile_timeout = timeout;
        self
    }

    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// URL of the team profile page.
    pub fn team_url(&self) -> String {
        format!("{}/team/{}", self.base_url, self.team_id)
    }

    /// Turns a site-relative link into an absolute URL.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        }
    }
}

// ============================================================================
// PUBLISH CONFIGURATION
// ============================================================================

/// Endpoint and shared secret for the spreadsheet web app.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub web_app_url: String,
    pub secret_token: String,
    pub timeout: Duration,
}

impl PublishConfig {
    pub fn new(web_app_url: impl Into<String>, secret_token: impl Into<String>) -> Self {
        Self {
            web_app_url: web_app_url.into(),
            secret_token: secret_token.into(),
            timeout: Duration::from_secs(45),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads both values from the environment. Missing or blank values are an error,
    /// never an attempt with empty credentials.
    pub fn from_env() -> Result<Self, TrackerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(TrackerError::MissingConfig(key))
        };

        let web_app_url = read(WEB_APP_URL_VAR)?;
        let secret_token = read(SECRET_TOKEN_VAR)?;
        Ok(Self::new(web_app_url, secret_token))
    }
}
