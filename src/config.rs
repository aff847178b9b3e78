use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 2000;
pub const UPDATE_INTERVAL_RANGE_MS: RangeInclusive<u64> = 1000..=300_000;
pub const DISPLAY_WINDOW_RANGE_SECS: RangeInclusive<u64> = 10..=3_600_000;

/// Sampling configuration shared by every monitored process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub update_interval_ms: u64,
    /// Display window applied to newly added processes. `None` shows the whole history.
    pub display_window_secs: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            display_window_secs: None,
        }
    }
}

impl MonitorConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        validate_interval(self.update_interval_ms)?;
        if let Some(window) = self.display_window_secs {
            validate_display_window(window)?;
        }
        Ok(())
    }
}

pub fn validate_interval(interval_ms: u64) -> Result<()> {
    if UPDATE_INTERVAL_RANGE_MS.contains(&interval_ms) {
        Ok(())
    } else {
        Err(MonitorError::InvalidInterval(interval_ms))
    }
}

pub fn validate_display_window(seconds: u64) -> Result<()> {
    if DISPLAY_WINDOW_RANGE_SECS.contains(&seconds) {
        Ok(())
    } else {
        Err(MonitorError::InvalidDisplayWindow(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.update_interval_ms, 2000);
        assert!(config.display_window_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        assert!(validate_interval(1000).is_ok());
        assert!(validate_interval(300_000).is_ok());
        assert_eq!(validate_interval(999), Err(MonitorError::InvalidInterval(999)));
        assert_eq!(
            validate_interval(300_001),
            Err(MonitorError::InvalidInterval(300_001))
        );
    }

    #[test]
    fn display_window_bounds_are_inclusive() {
        assert!(validate_display_window(10).is_ok());
        assert!(validate_display_window(3_600_000).is_ok());
        assert_eq!(
            validate_display_window(9),
            Err(MonitorError::InvalidDisplayWindow(9))
        );
    }

    #[test]
    fn invalid_window_in_config_is_rejected() {
        let config = MonitorConfig {
            display_window_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(MonitorError::InvalidDisplayWindow(5)));
    }
}
