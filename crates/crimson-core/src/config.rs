// ── Runtime controller configuration ──
//
// These types describe *how* the controller paces the connection cycle
// and where advisory text comes from. They never touch disk: the CLI
// builds them (usually via crimson-config) and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_ADVISOR_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ADVISOR_MODEL: &str = "gemini-3-flash-preview";

/// Half-open range `[min, max)` in Mbps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub min: f64,
    pub max: f64,
}

impl RateRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    fn validate(&self, field: &str) -> Result<(), CoreError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 || self.min >= self.max
        {
            return Err(CoreError::Config {
                message: format!(
                    "{field} must satisfy 0 <= min < max (got {}..{})",
                    self.min, self.max
                ),
            });
        }
        Ok(())
    }
}

/// Bounds for synthetic traffic readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficProfile {
    pub upload_mbps: RateRange,
    pub download_mbps: RateRange,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            upload_mbps: RateRange::new(1.0, 6.0),
            download_mbps: RateRange::new(5.0, 30.0),
        }
    }
}

/// Timing and capacity knobs for the connection cycle.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// `Connecting` -> `Connected` delay.
    pub connect_delay: Duration,
    /// `Disconnecting` -> `Disconnected` delay.
    pub disconnect_delay: Duration,
    /// Traffic sampling period while connected.
    pub sample_period: Duration,
    /// Maximum samples retained in the rolling window.
    pub window_capacity: usize,
    pub traffic: TrafficProfile,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(2000),
            disconnect_delay: Duration::from_millis(1000),
            sample_period: Duration::from_millis(1000),
            window_capacity: 20,
            traffic: TrafficProfile::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.window_capacity == 0 {
            return Err(CoreError::Config {
                message: "window_capacity must be at least 1".into(),
            });
        }
        if self.sample_period.is_zero() {
            return Err(CoreError::Config {
                message: "sample_period must be greater than zero".into(),
            });
        }
        self.traffic.upload_mbps.validate("upload range")?;
        self.traffic.download_mbps.validate("download range")?;
        Ok(())
    }
}

/// TLS verification strategy for the advisory service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Additionally trust a custom CA certificate file.
    CustomCa(PathBuf),
}

/// Where advisory text comes from.
#[derive(Debug, Clone)]
pub enum AdvisorConfig {
    /// No model access: every request resolves to the fallback text.
    Offline,
    /// Generative Language API.
    Gemini {
        base_url: Url,
        model: String,
        api_key: SecretString,
        timeout: Duration,
        tls: TlsVerification,
    },
}

impl AdvisorConfig {
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_timing() {
        let config = ControllerConfig::default();
        assert_eq!(config.connect_delay, Duration::from_secs(2));
        assert_eq!(config.disconnect_delay, Duration::from_secs(1));
        assert_eq!(config.sample_period, Duration::from_secs(1));
        assert_eq!(config.window_capacity, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = ControllerConfig {
            window_capacity: 0,
            ..ControllerConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn inverted_rate_range_is_rejected() {
        let mut config = ControllerConfig::default();
        config.traffic.download_mbps = RateRange::new(30.0, 5.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("download range"));
    }

    #[test]
    fn range_is_half_open() {
        let range = RateRange::new(1.0, 6.0);
        assert!(range.contains(1.0));
        assert!(range.contains(5.999));
        assert!(!range.contains(6.0));
    }
}
