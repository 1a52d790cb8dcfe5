// src/config.rs
use crate::error::{ReportError, Result};
use crate::geo::RenderHints;
use crate::process::{MonthlyMode, StateCodes, TimestampGrammar};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Report settings, usually read from a YAML file. Every key is optional.
///
/// ```yaml
/// timestamp_grammar: iso8601
/// monthly_mode: count
/// states:
///   codes: [CA, NV, OR]
/// geo:
///   boundaries: us-states.json
///   hints:
///     max_elevation: 50000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub timestamp_grammar: TimestampGrammar,
    pub monthly_mode: MonthlyMode,
    pub currency_symbol: String,
    /// Rows of the raw upload echoed in the preview.
    pub preview_rows: usize,
    pub states: StatesConfig,
    pub geo: Option<GeoConfig>,
    pub output: OutputConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timestamp_grammar: TimestampGrammar::default(),
            monthly_mode: MonthlyMode::default(),
            currency_symbol: "$".into(),
            preview_rows: 5,
            states: StatesConfig::default(),
            geo: None,
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatesConfig {
    pub enabled: bool,
    /// Replaces the 50 US codes when set.
    pub codes: Option<Vec<String>>,
}

impl Default for StatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            codes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    /// GeoJSON FeatureCollection of state boundaries.
    pub boundaries: PathBuf,
    /// Feature property holding the state code; the feature `id` when unset.
    #[serde(default)]
    pub key_property: Option<String>,
    #[serde(default)]
    pub hints: RenderHints,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub report_json: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
}

impl ReportConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        // surface a bad allow-list at load time
        config.state_codes()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ReportError::Unclassified(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn state_codes(&self) -> Result<StateCodes> {
        match &self.states.codes {
            Some(codes) => StateCodes::from_codes(codes),
            None => Ok(StateCodes::us_states()),
        }
    }
}
