// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Built-in defaults and fixed constants.
//!
//! Anything a user can change per run lives in `config::KinkConfig`; this
//! module only holds the values it falls back to.

// ============================================================================
// KINK SETTINGS
// ============================================================================
/// Largest acceptable kink, in font units
const MAX_KINK_SIZE: f64 = 0.9;

/// Master count from which pairwise halfway blends start to leave the
/// designed interpolation space
const PAIRWISE_WARNING_MASTERS: usize = 6;

// ============================================================================
// INTERPOLATION SETTINGS
// ============================================================================
/// Coordinates of interpolated outlines are rounded to this grid (0 = off)
const GRID_LENGTH: f64 = 1.0;

// ============================================================================
// REPORT SETTINGS
// ============================================================================
/// Suffix used in node marks and report lines
const NODE_MARKER: &str = "⛔️";

/// Label of the reference sample in interpolation modes
const REFERENCE_LABEL: &str = "First Master";

// ============================================================================
// PUBLIC API
// ============================================================================

/// Kink detection defaults
pub mod kink {
    /// Largest acceptable kink, in font units
    pub const MAX_KINK_SIZE: f64 = super::MAX_KINK_SIZE;

    /// See the all-master-pairs sample mode
    pub const PAIRWISE_WARNING_MASTERS: usize = super::PAIRWISE_WARNING_MASTERS;
}

/// Interpolation defaults
pub mod interpolation {
    pub const GRID_LENGTH: f64 = super::GRID_LENGTH;
}

/// Report wording
pub mod report {
    pub const NODE_MARKER: &str = super::NODE_MARKER;
    pub const REFERENCE_LABEL: &str = super::REFERENCE_LABEL;
}
