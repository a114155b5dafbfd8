//! Configuration management
//!
//! Handles loading and validating JSON dataset configuration files, with
//! environment variable overrides for the provider endpoint.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::yahoo::DEFAULT_CHART_URL;
use crate::{DateRange, Interval, Symbol};

/// Dataset download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub symbol: String,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub provider: ProviderConfig,
    pub splits: Vec<SplitConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            symbol: "EURUSD=X".to_string(),
            interval: Interval::Daily,
            output_dir: default_output_dir(),
            provider: ProviderConfig::default(),
            splits: vec![
                SplitConfig::new("training", ymd(2014, 1, 1), ymd(2023, 12, 31), "EURUSD_hr_data"),
                SplitConfig::new("validation", ymd(2024, 1, 1), ymd(2024, 8, 21), "Validation_data"),
            ],
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context(format!(
            "Failed to read config file {}",
            path.as_ref().display()
        ))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.provider.apply_env()?;
        Ok(config)
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::new(&self.symbol)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn split(&self, name: &str) -> Option<&SplitConfig> {
        self.splits.iter().find(|s| s.name == name)
    }

    pub fn split_mut(&mut self, name: &str) -> Option<&mut SplitConfig> {
        self.splits.iter_mut().find(|s| s.name == name)
    }

    /// Check the configuration before any network call is made
    pub fn validate(&self) -> Result<()> {
        if self.symbol().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }
        if self.splits.is_empty() {
            anyhow::bail!("at least one split must be configured");
        }

        let mut names = HashSet::new();
        let mut files = HashSet::new();
        for split in &self.splits {
            if split.file.trim().is_empty() {
                anyhow::bail!("split '{}' has no output file", split.name);
            }
            if !names.insert(split.name.as_str()) {
                anyhow::bail!("duplicate split name '{}'", split.name);
            }
            if !files.insert(split.file.as_str()) {
                anyhow::bail!("splits share output file '{}'", split.file);
            }
        }

        for (i, a) in self.splits.iter().enumerate() {
            for b in &self.splits[i + 1..] {
                if a.range().overlaps(&b.range()) {
                    anyhow::bail!(
                        "split '{}' ({}) overlaps split '{}' ({})",
                        a.name,
                        a.range(),
                        b.name,
                        b.range()
                    );
                }
            }
        }

        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider timeout must be at least one second");
        }

        Ok(())
    }
}

/// Market-data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_CHART_URL.to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Override endpoint and timeout from the environment if set
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("YAHOO_CHART_URL") {
            self.base_url = url;
        }
        if let Ok(timeout) = std::env::var("FX_HTTP_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .context(format!("Invalid FX_HTTP_TIMEOUT_SECS: {}", timeout))?;
        }
        Ok(())
    }
}

/// One named date window written to its own file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub name: String,
    pub start: NaiveDate,
    /// Exclusive
    pub end: NaiveDate,
    pub file: String,
}

impl SplitConfig {
    pub fn new(name: &str, start: NaiveDate, end: NaiveDate, file: &str) -> Self {
        SplitConfig {
            name: name.to_string(),
            start,
            end,
            file: file.to_string(),
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(&self.file)
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reproduces_original_datasets() {
        let config = Config::default();
        assert_eq!(config.symbol, "EURUSD=X");
        assert_eq!(config.interval, Interval::Daily);

        let training = config.split("training").unwrap();
        assert_eq!(training.range().to_string(), "2014-01-01..2023-12-31");
        assert_eq!(training.file, "EURUSD_hr_data");

        let validation = config.split("validation").unwrap();
        assert_eq!(validation.range().to_string(), "2024-01-01..2024-08-21");
        assert_eq!(validation.file, "Validation_data");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_json_uses_defaults() {
        let json = r#"{
            "symbol": "GBPUSD=X",
            "splits": [
                {"name": "train", "start": "2015-01-01", "end": "2020-01-01", "file": "gbp_train.csv"}
            ]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.symbol().as_str(), "GBPUSD=X");
        assert_eq!(config.interval, Interval::Daily);
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(
            config.splits[0].path_in("data"),
            PathBuf::from("data").join("gbp_train.csv")
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let json = serde_json::to_string_pretty(&Config::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.splits.len(), 2);
        assert!(config.validate().is_ok());

        assert!(Config::from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_validate_rejects_overlapping_splits() {
        let mut config = Config::default();
        config.split_mut("validation").unwrap().start = ymd(2023, 6, 1);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_validate_rejects_shared_file_and_empty_symbol() {
        let mut config = Config::default();
        config.split_mut("validation").unwrap().file = "EURUSD_hr_data".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.symbol = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.splits.clear();
        assert!(config.validate().is_err());
    }
}
