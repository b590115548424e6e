use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{currency::CurrencyCode, errors::Result, utils};

const TMP_SUFFIX: &str = "tmp";

/// Lower bound for the recurrence advance guard; smaller configured values are raised to it.
pub const MIN_RECURRENCE_GUARD: usize = 500;

/// Tunables consumed by the resolver, allocator and aggregation helpers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_currency")]
    pub currency: String,
    #[serde(default = "EngineConfig::default_minor_unit_digits")]
    pub minor_unit_digits: u8,
    #[serde(default = "EngineConfig::default_recurrence_guard")]
    pub recurrence_guard: usize,
    #[serde(default = "EngineConfig::default_pending_window_days")]
    pub pending_window_days: i64,
    #[serde(default = "EngineConfig::default_upcoming_horizon_days")]
    pub upcoming_horizon_days: i64,
    #[serde(default = "EngineConfig::default_trend_months")]
    pub trend_months: usize,
    #[serde(default = "EngineConfig::default_percent_tolerance")]
    pub percent_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: Self::default_currency(),
            minor_unit_digits: Self::default_minor_unit_digits(),
            recurrence_guard: Self::default_recurrence_guard(),
            pending_window_days: Self::default_pending_window_days(),
            upcoming_horizon_days: Self::default_upcoming_horizon_days(),
            trend_months: Self::default_trend_months(),
            percent_tolerance: Self::default_percent_tolerance(),
        }
    }
}

impl EngineConfig {
    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn default_minor_unit_digits() -> u8 {
        2
    }

    pub fn default_recurrence_guard() -> usize {
        1024
    }

    pub fn default_pending_window_days() -> i64 {
        7
    }

    pub fn default_upcoming_horizon_days() -> i64 {
        30
    }

    pub fn default_trend_months() -> usize {
        12
    }

    pub fn default_percent_tolerance() -> f64 {
        0.01
    }

    /// Currency new obligations are recorded in.
    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.as_str())
    }

    /// Guard actually applied by the resolver, never below [`MIN_RECURRENCE_GUARD`].
    pub fn effective_recurrence_guard(&self) -> usize {
        self.recurrence_guard.max(MIN_RECURRENCE_GUARD)
    }
}

/// Loads and stores [`EngineConfig`] as pretty-printed JSON.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manager bound to `<app data dir>/config.json`.
    pub fn default_location() -> Self {
        Self::new(utils::config_file())
    }

    pub fn load(&self) -> Result<EngineConfig> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config = serde_json::from_str(&data)?;
            debug!(path = %self.path.display(), "loaded engine configuration");
            Ok(config)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved engine configuration");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_clamped_to_minimum() {
        let config = EngineConfig {
            recurrence_guard: 10,
            ..EngineConfig::default()
        };
        assert_eq!(config.effective_recurrence_guard(), MIN_RECURRENCE_GUARD);
        assert_eq!(EngineConfig::default().effective_recurrence_guard(), 1024);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"currency":"EUR"}"#).unwrap();
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.minor_unit_digits, 2);
        assert_eq!(config.trend_months, 12);
    }

    #[test]
    fn tmp_path_appends_suffix() {
        let tmp = tmp_path(Path::new("/data/config.json"));
        assert_eq!(tmp, PathBuf::from("/data/config.json.tmp"));
    }
}
