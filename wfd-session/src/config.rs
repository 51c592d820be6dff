//! Session configuration
//!
//! Every field has a default so a config file only needs to name what it
//! changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use wfd_core::{DropThresholds, DOWN_THRESHOLD, UP_THRESHOLD};

/// Longest accepted muxer poll interval, one hour
pub const MAX_MUXER_POLL_INTERVAL_MS: u64 = 3_600_000;

/// Tunables of one streaming session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Consecutive UP samples before stepping up
    #[serde(default = "default_up_threshold")]
    pub up_threshold: u32,
    /// Consecutive DOWN samples before stepping down
    #[serde(default = "default_down_threshold")]
    pub down_threshold: u32,
    /// Cooldown before dropped buckets become available again
    #[serde(default = "default_reenable_buckets_timeout")]
    pub reenable_buckets_timeout_ms: u64,
    /// Grace period with no active display or audio before disconnecting
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: u64,
    /// Window the frame-drop ring must fit into to signal degradation
    #[serde(default = "default_drop_window")]
    pub drop_window_ms: u64,
    /// Drop share of nominal frame rate below which reports are ignored
    #[serde(default = "default_drop_min_ratio")]
    pub drop_min_ratio: f64,
    /// Drop share at the floor bucket that ends the session
    #[serde(default = "default_drop_fatal_ratio")]
    pub drop_fatal_ratio: f64,
    /// Observed/nominal rate ratio below which UP samples are distrusted
    #[serde(default = "default_up_veto_ratio")]
    pub up_veto_ratio: f64,
    /// Lower bound handed to the bandwidth estimator
    #[serde(default = "default_estimator_min_mbps")]
    pub estimator_min_mbps: u32,
    /// Upper bound handed to the bandwidth estimator
    #[serde(default = "default_estimator_max_mbps")]
    pub estimator_max_mbps: u32,
    /// Interval between muxer statistics reads
    #[serde(default = "default_muxer_poll_interval")]
    pub muxer_poll_interval_ms: u64,
    /// Consecutive failed reads tolerated before polling stops
    #[serde(default = "default_muxer_poll_max_retries")]
    pub muxer_poll_max_retries: u32,
}

fn default_up_threshold() -> u32 {
    UP_THRESHOLD
}

fn default_down_threshold() -> u32 {
    DOWN_THRESHOLD
}

fn default_reenable_buckets_timeout() -> u64 {
    120_000
}

fn default_idle_timeout() -> u64 {
    180_000
}

fn default_drop_window() -> u64 {
    10_000
}

fn default_drop_min_ratio() -> f64 {
    0.05
}

fn default_drop_fatal_ratio() -> f64 {
    0.30
}

fn default_up_veto_ratio() -> f64 {
    0.5
}

fn default_estimator_min_mbps() -> u32 {
    1
}

fn default_estimator_max_mbps() -> u32 {
    40
}

fn default_muxer_poll_interval() -> u64 {
    1_000
}

fn default_muxer_poll_max_retries() -> u32 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            up_threshold: default_up_threshold(),
            down_threshold: default_down_threshold(),
            reenable_buckets_timeout_ms: default_reenable_buckets_timeout(),
            idle_timeout_ms: default_idle_timeout(),
            drop_window_ms: default_drop_window(),
            drop_min_ratio: default_drop_min_ratio(),
            drop_fatal_ratio: default_drop_fatal_ratio(),
            up_veto_ratio: default_up_veto_ratio(),
            estimator_min_mbps: default_estimator_min_mbps(),
            estimator_max_mbps: default_estimator_max_mbps(),
            muxer_poll_interval_ms: default_muxer_poll_interval(),
            muxer_poll_max_retries: default_muxer_poll_max_retries(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.up_threshold == 0 || self.down_threshold == 0 {
            return Err(ConfigError::Invalid(
                "hysteresis thresholds must be at least 1".to_string(),
            ));
        }
        if self.reenable_buckets_timeout_ms == 0
            || self.idle_timeout_ms == 0
            || self.drop_window_ms == 0
            || self.muxer_poll_interval_ms == 0
        {
            return Err(ConfigError::Invalid(
                "timeouts and intervals must be non-zero".to_string(),
            ));
        }
        if self.muxer_poll_interval_ms > MAX_MUXER_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "muxer_poll_interval_ms must be at most {}, got {}",
                MAX_MUXER_POLL_INTERVAL_MS, self.muxer_poll_interval_ms
            )));
        }
        for (name, ratio) in [
            ("drop_min_ratio", self.drop_min_ratio),
            ("drop_fatal_ratio", self.drop_fatal_ratio),
            ("up_veto_ratio", self.up_veto_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.estimator_min_mbps == 0 || self.estimator_min_mbps > self.estimator_max_mbps {
            return Err(ConfigError::Invalid(format!(
                "estimator range {}..{} Mbps is empty",
                self.estimator_min_mbps, self.estimator_max_mbps
            )));
        }
        Ok(())
    }

    /// Bucket re-enable cooldown as Duration
    pub fn reenable_buckets_timeout(&self) -> Duration {
        Duration::from_millis(self.reenable_buckets_timeout_ms)
    }

    /// Idle disconnect grace period as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Base muxer poll interval as Duration
    pub fn muxer_poll_interval(&self) -> Duration {
        Duration::from_millis(self.muxer_poll_interval_ms)
    }

    /// Frame-drop detector thresholds
    pub fn drop_thresholds(&self) -> DropThresholds {
        DropThresholds {
            min_ratio: self.drop_min_ratio,
            fatal_ratio: self.drop_fatal_ratio,
            window: Duration::from_millis(self.drop_window_ms),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.up_threshold, 5);
        assert_eq!(config.down_threshold, 2);
        assert_eq!(config.idle_timeout(), Duration::from_secs(180));
        assert_eq!(config.reenable_buckets_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = SessionConfig::from_toml_str("idle_timeout_ms = 5000\n").unwrap();
        assert_eq!(config.idle_timeout_ms, 5000);
        assert_eq!(config.up_threshold, 5);
        assert_eq!(config.muxer_poll_max_retries, 3);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = SessionConfig {
            up_threshold: 3,
            ..SessionConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed = SessionConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SessionConfig::from_toml_str("up_threshold = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("up_veto_ratio = 1.5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("estimator_min_mbps = 50\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("muxer_poll_interval_ms = 86400000\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml_str("idle_timeout_ms = \"soon\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_drop_thresholds() {
        let thresholds = SessionConfig::default().drop_thresholds();
        assert_eq!(thresholds.window, Duration::from_secs(10));
        assert!((thresholds.min_ratio - 0.05).abs() < f64::EPSILON);
    }
}
