// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Command-line arguments.

use std::path::PathBuf;

use crate::config::{KinkConfig, SampleMode};
use crate::error::ConfigError;

pub const USAGE: &str = "\
Usage: kinkfinder <FONT> [GLYPH...] [OPTIONS]

FONT is a .ufo or .designspace path.

Options:
  --config FILE                 read settings from a TOML file
  --threshold N                 largest acceptable kink in units
  --mode MODE                   all-master-pairs, adjacent-masters,
                                active-instances, all-instances, masters
  --include-non-exporting       also scan glyphs that do not export
  --report-incompatibilities    list samples that could not be compared
  --no-marks                    do not plan node marks
  --json                        write a JSON report
  -h, --help                    print this help";

/// Parsed command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub font: PathBuf,
    pub glyphs: Vec<String>,
    pub config: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub mode: Option<SampleMode>,
    pub include_non_exporting: bool,
    pub report_incompatibilities: bool,
    pub no_marks: bool,
    pub json: bool,
    pub help: bool,
}

impl CliArgs {
    /// Parse arguments, not including the program name
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut font = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--config" => parsed.config = Some(PathBuf::from(value(&mut args, &arg)?)),
                "--threshold" => {
                    let text = value(&mut args, &arg)?;
                    let threshold = text.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
                        field: "max_kink_size",
                        value: text.clone(),
                    })?;
                    parsed.threshold = Some(threshold);
                }
                "--mode" => parsed.mode = Some(value(&mut args, &arg)?.parse::<SampleMode>()?),
                "--include-non-exporting" => parsed.include_non_exporting = true,
                "--report-incompatibilities" => parsed.report_incompatibilities = true,
                "--no-marks" => parsed.no_marks = true,
                "--json" => parsed.json = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(ConfigError::Usage(format!("unknown option '{flag}'")));
                }
                _ if font.is_none() => font = Some(PathBuf::from(arg)),
                _ => parsed.glyphs.push(arg),
            }
        }

        match font {
            Some(font) => parsed.font = font,
            None if parsed.help => {}
            None => return Err(ConfigError::Usage("missing font path".to_string())),
        }
        Ok(parsed)
    }

    /// Overlay the command line onto a loaded configuration
    pub fn apply(&self, config: &mut KinkConfig) -> Result<(), ConfigError> {
        if let Some(threshold) = self.threshold {
            config.max_kink_size = threshold;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if !self.glyphs.is_empty() {
            config.glyphs = self.glyphs.clone();
        }
        if self.include_non_exporting {
            config.exporting_only = false;
        }
        if self.report_incompatibilities {
            config.report_incompatibilities = true;
        }
        if self.no_marks {
            config.mark_kinks = false;
        }
        config.validate()
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    args.next()
        .ok_or_else(|| ConfigError::Usage(format!("{flag} needs a value")))
}
