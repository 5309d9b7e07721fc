use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the application server that owns durable storage
    /// and the story catalogue
    #[serde(default = "default_platform_url")]
    pub platform_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How often (seconds) the story catalogue is refreshed from the
    /// application server
    #[serde(default = "default_catalogue_refresh_secs")]
    pub catalogue_refresh_secs: u64,

    /// How often (seconds) newly ingested events are flushed to the
    /// application server
    #[serde(default = "default_state_flush_secs")]
    pub state_flush_secs: u64,

    /// Maximum number of requests handled concurrently
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_platform_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_catalogue_refresh_secs() -> u64 {
    300
}

fn default_state_flush_secs() -> u64 {
    60
}

fn default_max_concurrent_requests() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
