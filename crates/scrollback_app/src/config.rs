use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use scrollback_core::HarvestLimits;
use scrollback_engine::HarvestSettings;
use serde::{Deserialize, Serialize};

/// Settings read from an optional RON file; every field may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settle_delay_ms: u64,
    pub retry_ceiling: u32,
    pub confirm_threshold: u32,
    pub step_fraction: f64,
    pub end_tolerance: u64,
    /// Height assigned to one replayed snapshot window.
    pub viewport_height: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = HarvestSettings::default();
        Self {
            settle_delay_ms: settings.settle_delay.as_millis() as u64,
            retry_ceiling: settings.limits.retry_ceiling,
            confirm_threshold: settings.limits.confirm_threshold,
            step_fraction: settings.limits.step_fraction,
            end_tolerance: settings.limits.end_tolerance,
            viewport_height: 1000,
        }
    }
}

impl AppConfig {
    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            limits: HarvestLimits {
                retry_ceiling: self.retry_ceiling.max(1),
                confirm_threshold: self.confirm_threshold,
                step_fraction: self.step_fraction,
                end_tolerance: self.end_tolerance,
            },
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.step_fraction > 0.0 && self.step_fraction <= 1.0) {
            engine_warn!(
                "step_fraction {} out of range (0, 1], using {}",
                self.step_fraction,
                defaults.step_fraction
            );
            self.step_fraction = defaults.step_fraction;
        }
        if self.viewport_height == 0 {
            engine_warn!("viewport_height must be positive, using {}", defaults.viewport_height);
            self.viewport_height = defaults.viewport_height;
        }
        self
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: AppConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    engine_info!("loaded settings from {:?}", path);
    Ok(config.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.ron");
        fs::write(&path, "(retry_ceiling: 8, settle_delay_ms: 0)").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.retry_ceiling, 8);
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.confirm_threshold, AppConfig::default().confirm_threshold);

        let settings = config.harvest_settings();
        assert_eq!(settings.limits.retry_ceiling, 8);
        assert!(settings.settle_delay.is_zero());
    }

    #[test]
    fn out_of_range_fraction_falls_back() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.ron");
        fs::write(&path, "(step_fraction: 3.5)").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.step_fraction, AppConfig::default().step_fraction);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(load_config(Some(&temp.path().join("absent.ron"))).is_err());
    }
}
