//! Runtime configuration sourced from the process environment.

use std::fmt;

/// Default variable holding the API endpoint URL.
pub const DEFAULT_URL_VAR: &str = "SUPABASE_URL";

/// Default variable holding the API access key.
pub const DEFAULT_KEY_VAR: &str = "SUPABASE_KEY";

/// Names of the environment variables carrying the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVars {
    /// Variable holding the endpoint URL
    pub url: String,

    /// Variable holding the access key
    pub key: String,
}

impl Default for EnvVars {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL_VAR.to_string(),
            key: DEFAULT_KEY_VAR.to_string(),
        }
    }
}

/// The endpoint URL and access key delivered to the browser.
///
/// Both values are secrets as far as logging goes: `Debug` never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_url: String,
    pub api_key: String,
}

impl RuntimeConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env(vars: &EnvVars) -> Option<Self> {
        Self::from_lookup(vars, |name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// The two variables are evaluated as a pair. A variable counts as set
    /// only when it is non-blank; values are kept exactly as given. If just
    /// one of the two is set the pair is treated as absent.
    pub fn from_lookup<F>(vars: &EnvVars, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(&vars.url).filter(|v| !v.trim().is_empty());
        let key = lookup(&vars.key).filter(|v| !v.trim().is_empty());

        match (url, key) {
            (Some(api_url), Some(api_key)) => Some(Self { api_url, api_key }),
            (Some(_), None) => {
                tracing::warn!("{} is set but {} is not, ignoring both", vars.url, vars.key);
                None
            }
            (None, Some(_)) => {
                tracing::warn!("{} is set but {} is not, ignoring both", vars.key, vars.url);
                None
            }
            (None, None) => None,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("api_url", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
