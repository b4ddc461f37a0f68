use std::{env, time::Duration};

use derive_builder::Builder;

/// Scheme used to resolve `//host/...` query urls when none is configured.
pub const DEFAULT_SCHEME: &str = "https";
/// User agent sent to the wiki. Wikimedia wikis reject requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const ENV_SCHEME: &str = "MEDIAWIKI_STORAGE_SCHEME";
pub const ENV_USER_AGENT: &str = "MEDIAWIKI_STORAGE_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "MEDIAWIKI_STORAGE_TIMEOUT_SECS";

/// Settings for the http transport.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct StorageConfig {
    /// `http` or `https`.
    #[builder(setter(into))]
    pub scheme: String,
    #[builder(setter(into))]
    pub user_agent: String,
    /// Whole-request timeout. `None` waits for as long as reqwest does.
    #[builder(setter(strip_option))]
    pub timeout: Option<Duration>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: None,
        }
    }
}

impl StorageConfig {
    /// Load `.env` (if any) and read the `MEDIAWIKI_STORAGE_*` variables.
    ///
    /// Values that can't be used are logged and replaced with their default.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(scheme) = lookup(ENV_SCHEME) {
            match parse_scheme(&scheme) {
                Some(scheme) => config.scheme = scheme,
                None => log::warn!(
                    "Ignoring {}={:?}, expected http or https",
                    ENV_SCHEME,
                    scheme
                ),
            }
        }

        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(secs) => config.timeout = Some(Duration::from_secs(secs)),
                Err(e) => log::warn!("Ignoring {}={:?} ({})", ENV_TIMEOUT_SECS, secs, e),
            }
        }

        config
    }
}

fn parse_scheme(value: &str) -> Option<String> {
    let value = value.trim().trim_end_matches(':').to_lowercase();
    match value.as_str() {
        "http" | "https" => Some(value),
        _ => None,
    }
}
