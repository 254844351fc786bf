// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Run configuration.
//!
//! `KinkConfig` is passed explicitly into every analysis call. It can be
//! read from a TOML file; any field left out falls back to the defaults in
//! `settings`.
//!
//! ```toml
//! max_kink_size = 2.5
//! mode = "adjacent-masters"
//! glyphs = ["a", "o"]
//! report_incompatibilities = true
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::settings;

/// Where in the design space kinks are looked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleMode {
    /// Halfway between every pair of masters (false positives with 6+ masters)
    #[default]
    AllMasterPairs,
    /// Halfway between neighbouring masters only (single axis, 3+ masters)
    AdjacentMasters,
    /// In every exporting instance
    ActiveInstances,
    /// In every instance, exporting or not
    AllInstances,
    /// In the masters themselves instead of interpolations
    Masters,
}

/// Settings for one kink scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KinkConfig {
    /// Largest acceptable kink in units: the perpendicular distance between
    /// a node and the line through its neighbours
    pub max_kink_size: f64,
    pub mode: SampleMode,
    /// Glyphs to scan; empty means every glyph in the font
    pub glyphs: Vec<String>,
    /// Skip glyphs that do not export
    pub exporting_only: bool,
    /// Include failed and incompatible interpolations in the report
    pub report_incompatibilities: bool,
    /// Produce node marks for downstream annotation
    pub mark_kinks: bool,
    /// Interpolated coordinates are rounded to this grid (0 = off)
    pub grid_length: f64,
    /// Instance names treated as not exporting
    pub inactive_instances: Vec<String>,
}

impl Default for KinkConfig {
    fn default() -> Self {
        Self {
            max_kink_size: settings::kink::MAX_KINK_SIZE,
            mode: SampleMode::default(),
            glyphs: Vec::new(),
            exporting_only: true,
            report_incompatibilities: false,
            mark_kinks: true,
            grid_length: settings::interpolation::GRID_LENGTH,
            inactive_instances: Vec::new(),
        }
    }
}

impl KinkConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric fields for usable values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_kink_size.is_finite() || self.max_kink_size < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_kink_size",
                value: self.max_kink_size.to_string(),
            });
        }
        if !self.grid_length.is_finite() || self.grid_length < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "grid_length",
                value: self.grid_length.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the scan looks at masters rather than interpolations
    pub fn in_masters(&self) -> bool {
        self.mode == SampleMode::Masters
    }
}

impl SampleMode {
    pub const ALL: [SampleMode; 5] = [
        SampleMode::AllMasterPairs,
        SampleMode::AdjacentMasters,
        SampleMode::ActiveInstances,
        SampleMode::AllInstances,
        SampleMode::Masters,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SampleMode::AllMasterPairs => "all-master-pairs",
            SampleMode::AdjacentMasters => "adjacent-masters",
            SampleMode::ActiveInstances => "active-instances",
            SampleMode::AllInstances => "all-instances",
            SampleMode::Masters => "masters",
        }
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}
