//! Configuration for gatehouse-daemon

use serde::{Deserialize, Serialize};

/// Main daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Lifecycle deadline offsets
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Raid detection window and threshold
    #[serde(default)]
    pub raid: RaidConfig,

    /// Escalation sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            raid: RaidConfig::default(),
            sweep: SweepConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Lifecycle deadline offsets, in seconds from entry into tracking.
///
/// `remove_offset_secs` is expected to exceed `warn_offset_secs`. The
/// daemon does not validate the ordering; an inverted pair is honored
/// as-is (the warn branch still wins on the first qualifying sweep).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Unverified member gets warned this long after joining
    #[serde(default = "default_warn_offset")]
    pub warn_offset_secs: u64,

    /// Warned member gets removal requested this long after joining
    #[serde(default = "default_remove_offset")]
    pub remove_offset_secs: u64,

    /// Resolved records are kept this long for audit before deletion
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            warn_offset_secs: default_warn_offset(),
            remove_offset_secs: default_remove_offset(),
            retention_secs: default_retention(),
        }
    }
}

/// Raid detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidConfig {
    /// Sliding window width in seconds
    #[serde(default = "default_raid_window")]
    pub window_secs: u64,

    /// Joins inside the window that trip the alert
    #[serde(default = "default_raid_threshold")]
    pub threshold: u32,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            window_secs: default_raid_window(),
            threshold: default_raid_threshold(),
        }
    }
}

/// Escalation sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Sweep period in seconds. Coarse polling: escalation latency is up
    /// to one period past the deadline.
    #[serde(default = "default_sweep_period")]
    pub period_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            period_secs: default_sweep_period(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// Default value helpers
fn default_warn_offset() -> u64 {
    300
}

fn default_remove_offset() -> u64 {
    600
}

fn default_retention() -> u64 {
    3600
}

fn default_raid_window() -> u64 {
    60
}

fn default_raid_threshold() -> u32 {
    5
}

fn default_sweep_period() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with GATEHOUSE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("GATEHOUSE")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
