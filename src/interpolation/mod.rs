// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Materialising outlines at arbitrary blends of masters.
//!
//! The scanner only talks to the [`InterpolationEngine`] trait, so a host
//! with its own interpolation (brace layers, smart components, ...) can
//! plug in. [`LinearInterpolator`] is the built-in engine: a weighted sum
//! of compatible master outlines, optionally rounded to the font grid.

pub mod model;

pub use model::{ModelError, VariationModel};

use kurbo::{Point, Vec2};
use thiserror::Error;

use crate::model::font::{Blend, Font, MasterId};
use crate::model::outline::{Incompatibility, Outline};

/// Why an outline could not be produced for a blend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    #[error("blend references unknown master '{0}'")]
    UnknownMaster(MasterId),
    #[error("glyph '{glyph}' is missing in master '{master}'")]
    MissingGlyph { glyph: String, master: String },
    #[error("glyph '{0}' has no paths")]
    NoPaths(String),
    #[error("masters '{first}' and '{other}' are incompatible: {reason}")]
    IncompatibleMasters {
        first: String,
        other: String,
        reason: Incompatibility,
    },
    #[error("blend has no weighted masters")]
    EmptyBlend,
}

/// Produces the outline of a glyph at a point of the design space
pub trait InterpolationEngine {
    fn interpolate(&self, glyph: &str, blend: &Blend) -> Result<Outline, InterpolationError>;
}

/// Weighted sum of master outlines
#[derive(Debug, Clone)]
pub struct LinearInterpolator<'a> {
    font: &'a Font,
    grid_length: f64,
}

impl<'a> LinearInterpolator<'a> {
    pub fn new(font: &'a Font) -> Self {
        Self {
            font,
            grid_length: crate::settings::interpolation::GRID_LENGTH,
        }
    }

    /// Round results to multiples of `grid_length` (0 disables rounding)
    pub fn with_grid(mut self, grid_length: f64) -> Self {
        self.grid_length = grid_length;
        self
    }
}

impl InterpolationEngine for LinearInterpolator<'_> {
    fn interpolate(&self, glyph: &str, blend: &Blend) -> Result<Outline, InterpolationError> {
        let mut contributions = Vec::new();
        for (id, weight) in blend.iter() {
            if weight == 0.0 {
                continue;
            }
            let master = self
                .font
                .master(id)
                .ok_or_else(|| InterpolationError::UnknownMaster(id.clone()))?;
            let outline =
                master
                    .glyph(glyph)
                    .ok_or_else(|| InterpolationError::MissingGlyph {
                        glyph: glyph.to_string(),
                        master: master.name.clone(),
                    })?;
            contributions.push((master, outline, weight));
        }

        // Node types and connections come from the first master in font order.
        contributions.sort_by_key(|(master, _, _)| {
            self.font
                .masters
                .iter()
                .position(|m| m.id == master.id)
                .unwrap_or(usize::MAX)
        });

        let Some(&(first_master, first, _)) = contributions.first() else {
            return Err(InterpolationError::EmptyBlend);
        };

        if first.is_empty() {
            return Err(InterpolationError::NoPaths(glyph.to_string()));
        }

        for (master, outline, _) in &contributions[1..] {
            first.check_compatible(outline).map_err(|reason| {
                InterpolationError::IncompatibleMasters {
                    first: first_master.name.clone(),
                    other: master.name.clone(),
                    reason,
                }
            })?;
        }

        let mut result = first.clone();
        for (path, contour) in result.contours.iter_mut().enumerate() {
            for (index, node) in contour.nodes.iter_mut().enumerate() {
                let mut sum = Vec2::ZERO;
                for (_, outline, weight) in &contributions {
                    let source = outline.contours[path].nodes[index].position;
                    sum += source.to_vec2() * *weight;
                }
                node.position = Point::ORIGIN + sum;
            }
        }

        result.round_to_grid(self.grid_length);
        Ok(result)
    }
}
