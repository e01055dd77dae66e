use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Cut-offs shared by ledger status derivation and issue classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thresholds {
    #[serde(default = "default_battery_health_pass")]
    pub battery_health_pass: f64,
    #[serde(default = "default_battery_health_fail")]
    pub battery_health_fail: f64,
    #[serde(default = "default_cycle_count_warning")]
    pub cycle_count_warning: u32,
    #[serde(default = "default_cycle_count_fail")]
    pub cycle_count_fail: u32,
}

fn default_battery_health_pass() -> f64 {
    80.0
}

fn default_battery_health_fail() -> f64 {
    60.0
}

fn default_cycle_count_warning() -> u32 {
    500
}

fn default_cycle_count_fail() -> u32 {
    800
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            battery_health_pass: default_battery_health_pass(),
            battery_health_fail: default_battery_health_fail(),
            cycle_count_warning: default_cycle_count_warning(),
            cycle_count_fail: default_cycle_count_fail(),
        }
    }
}

impl Thresholds {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read thresholds {}", path.display()))?;
        let thresholds: Thresholds = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse thresholds {}", path.display()))?;
        if thresholds.battery_health_fail > thresholds.battery_health_pass {
            anyhow::bail!("battery_health_fail must not exceed battery_health_pass");
        }
        if thresholds.cycle_count_warning > thresholds.cycle_count_fail {
            anyhow::bail!("cycle_count_warning must not exceed cycle_count_fail");
        }
        Ok(thresholds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionOptions {
    #[serde(default)]
    pub thresholds: Thresholds,
}
