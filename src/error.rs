// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the scan and its configuration.
//!
//! Only a missing master set aborts a scan. Geometry problems, failed
//! interpolations and incompatible outlines are recorded in the report
//! instead (see `scanner::ScanReport`).

use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a scan before any glyph is looked at
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("font '{0}' has no masters")]
    NoMasters(String),
}

/// Problems reading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("unknown sample mode '{0}'")]
    UnknownMode(String),
    #[error("{0}")]
    Usage(String),
}
