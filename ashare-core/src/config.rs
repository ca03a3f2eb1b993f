//! Static configuration defaults.
//!
//! Settings are read once (TOML file or built-in defaults) and never
//! reloaded. Any key missing from a file keeps its built-in value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::data::request::{Adjust, Defaults, A_SHARE_MARKET, DEFAULT_START_DATE};
use crate::data::symbol::Exchange;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub favorite_stocks: Vec<String>,
    pub favorite_industries: Vec<String>,
    pub favorite_concepts: Vec<String>,
    /// `YYYYMMDD`
    pub default_start_date: String,
    pub default_adjust: Adjust,
    pub request_timeout_secs: u64,
    /// Recorded for reference; retrieval makes exactly one attempt per call.
    pub max_retries: u32,
    /// Default output directory for saved tables.
    pub data_dir: PathBuf,
    /// Market code (`sh`, `sz`, `bj`) to display name.
    pub market_names: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        let market_names = [("sh", "上海"), ("sz", "深圳"), ("bj", "北京")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            favorite_stocks: strings(&["600000", "600519", "600036", "000001", "000002"]),
            favorite_industries: strings(&["银行", "证券", "保险", "房地产", "医药生物"]),
            favorite_concepts: strings(&["人工智能", "新能源汽车", "芯片", "5G", "大数据"]),
            default_start_date: DEFAULT_START_DATE.to_string(),
            default_adjust: Adjust::Forward,
            request_timeout_secs: 10,
            max_retries: 3,
            data_dir: PathBuf::from("data"),
            market_names,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Request defaults derived from these settings.
    pub fn request_defaults(&self) -> Defaults {
        Defaults {
            start_date: self.default_start_date.clone(),
            adjust: self.default_adjust.clone(),
            market: A_SHARE_MARKET.to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Display name of the exchange a symbol trades on (`600000` → `上海`).
    pub fn market_name_for(&self, symbol: &str) -> Option<&str> {
        let exchange = Exchange::of(symbol)?;
        self.market_names.get(exchange.code()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.default_start_date, "20200101");
        assert_eq!(s.default_adjust, Adjust::Forward);
        assert_eq!(s.request_timeout(), Duration::from_secs(10));
        assert_eq!(s.max_retries, 3);
        assert!(s.favorite_stocks.contains(&"600519".to_string()));
    }

    #[test]
    fn toml_roundtrip() {
        let s = Settings::default();
        let toml_str = s.to_toml().unwrap();
        let parsed = Settings::from_toml(&toml_str).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn partial_file_keeps_builtin_values() {
        let s = Settings::from_toml(
            r#"
default_adjust = "hfq"
request_timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(s.default_adjust, Adjust::Backward);
        assert_eq!(s.request_timeout_secs, 30);
        assert_eq!(s.default_start_date, "20200101");
        assert_eq!(s.favorite_stocks.len(), 5);
    }

    #[test]
    fn unadjusted_tag_parses() {
        let s = Settings::from_toml(r#"default_adjust = """#).unwrap();
        assert_eq!(s.request_defaults().adjust, Adjust::Unadjusted);
    }

    #[test]
    fn market_names_by_symbol() {
        let s = Settings::default();
        assert_eq!(s.market_name_for("600000"), Some("上海"));
        assert_eq!(s.market_name_for("000002"), Some("深圳"));
        assert_eq!(s.market_name_for("830799"), Some("北京"));
        assert_eq!(s.market_name_for("bogus"), None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Settings::from_file(Path::new("/nonexistent/ashare.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
