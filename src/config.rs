use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pseudocount for affinity scoring when a request does not give one
    #[serde(default)]
    pub default_smoothing: u32,

    /// Minimum support for popularity rankings when a request does not give one
    #[serde(default)]
    pub default_min_support: i64,

    /// Upper bound on rows returned by any ranked endpoint
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Largest accepted request body, in bytes (dataset uploads)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_results() -> usize {
    1000
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            default_smoothing: 0,
            default_min_support: 0,
            max_results: default_max_results(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamps a requested result count to `max_results`
    pub fn limit(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.max_results, |n| n.min(self.max_results))
    }
}
