use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// `fwa` or `cc`; validated when the scraper is built.
    #[serde(default = "default_league")]
    pub league: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Passed to the site as `rlim`.
    #[serde(default = "default_actions_limit")]
    pub actions_limit: u32,

    /// Passed to the site as `slim`.
    #[serde(default = "default_attacks_limit")]
    pub attacks_limit: u32,

    #[serde(default = "default_true")]
    pub fix_war_pid: bool,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_league() -> String {
    "fwa".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_jitter_ms() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    2
}
fn default_user_agent() -> String {
    "chocolate-clash/0.1 (member profile scraper)".to_string()
}
fn default_actions_limit() -> u32 {
    20
}
fn default_attacks_limit() -> u32 {
    20
}
fn default_true() -> bool {
    true
}
fn default_concurrency() -> usize {
    3
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            league: default_league(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
            actions_limit: default_actions_limit(),
            attacks_limit: default_attacks_limit(),
            fix_war_pid: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    /// (`CC_SCRAPER__LEAGUE=cc`, `CC_PIPELINE__CONCURRENCY=5`, ...).
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("CC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}
