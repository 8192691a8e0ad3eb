//! Environment-driven configuration.

use std::env;

pub const DEFAULT_DB_URL: &str = "sqlite://lms.sqlite3";
pub const DEFAULT_SITE_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAIL_FROM: &str = "no-reply@enhancedlms.com";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailRelayConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailConfig {
    pub from_address: String,
    /// HTTP relay; `None` selects the console backend.
    pub relay: Option<MailRelayConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmsConfig {
    pub database_url: String,
    /// Base for absolute links in emails and notifications.
    pub site_url: String,
    pub mail: MailConfig,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LmsConfig {
    /// Reads `LMS_DB_URL`, `LMS_SITE_URL`, `LMS_MAIL_FROM`,
    /// `LMS_MAIL_RELAY_URL` and `LMS_MAIL_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let relay = match (get("LMS_MAIL_RELAY_URL"), get("LMS_MAIL_API_KEY")) {
            (Some(url), Some(api_key)) => Some(MailRelayConfig { url, api_key }),
            _ => None,
        };

        Self {
            database_url: get("LMS_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()),
            site_url: get("LMS_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.into()),
            mail: MailConfig {
                from_address: get("LMS_MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.into()),
                relay,
            },
        }
    }

    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }
}
