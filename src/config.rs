use std::time::Duration;

use crate::error::{ClerkError, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for talking to the generative endpoint.
#[derive(Clone)]
pub struct ClerkConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClerkConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClerkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClerkConfig {
    /// Load from the process environment.
    ///
    /// `API_KEY` (or `GEMINI_API_KEY`), `CLERK_MODEL`, `CLERK_BASE_URL`,
    /// `CLERK_TIMEOUT_SECS`. A missing key is not an error here; it is
    /// reported when a generation is attempted.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            api_key: non_blank("API_KEY").or_else(|| non_blank("GEMINI_API_KEY")),
            ..Self::default()
        };
        if let Some(model) = non_blank("CLERK_MODEL") {
            config.model = model;
        }
        if let Some(url) = non_blank("CLERK_BASE_URL") {
            config.base_url = url;
        }
        if let Some(secs) = non_blank("CLERK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClerkError::Configuration(format!("CLERK_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = timeout_from_secs(secs)?;
        }
        Ok(config)
    }

    /// The credential, or the error every generation raises without one.
    pub fn require_api_key(&self) -> Result<&str> {
        require_api_key(self.api_key.as_deref())
    }
}

/// Request timeout from whole seconds. Zero would fail every request.
pub fn timeout_from_secs(secs: u64) -> Result<Duration> {
    check_timeout(Duration::from_secs(secs))
}

pub(crate) fn check_timeout(timeout: Duration) -> Result<Duration> {
    if timeout.is_zero() {
        return Err(ClerkError::Configuration(
            "request timeout must be greater than zero".into(),
        ));
    }
    Ok(timeout)
}

pub(crate) fn require_api_key(key: Option<&str>) -> Result<&str> {
    key.filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ClerkError::Configuration("API Key not found".into()))
}
