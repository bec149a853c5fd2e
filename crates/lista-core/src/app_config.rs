use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings for the feed client, cache and interactive search.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Origin hosting both the locator resource and the snapshots,
    /// e.g. `"https://lista.example.com"`.
    pub feed_base_url: String,
    /// Path of the text resource naming the current snapshot.
    pub locator_path: String,
    /// Path prefix under which snapshots are published as `{prefix}/{identifier}`.
    pub snapshot_prefix: String,
    /// Currency reference endpoint (display only).
    pub rate_url: String,
    /// Location of the single-slot snapshot cache file.
    pub cache_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Quiescence window applied to interactive search input.
    pub search_debounce_ms: u64,
}
