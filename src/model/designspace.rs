// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Loading designspace projects into a multi-master `Font`.
//!
//! A designspace file ties multiple UFO masters together. This module reads
//! the axes, sources and instances with `norad` and loads every source UFO
//! through [`Workspace`]. Source order in the document is master order.

use anyhow::{Context, Result};
use norad::designspace::{DesignSpaceDocument, Dimension, Source as NoradSource};
use std::path::{Path, PathBuf};

use super::font::{Axis, Font, Instance, Location};
use super::workspace::{Workspace, is_ufo};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A designspace project with all masters loaded
#[derive(Debug)]
pub struct DesignspaceProject {
    /// Path to the .designspace file
    pub path: PathBuf,

    /// Design axes (wght, wdth, etc.)
    pub axes: Vec<Axis>,

    /// One loaded workspace per source, with its master metadata
    pub sources: Vec<LoadedSource>,

    /// Named instances
    pub instances: Vec<Instance>,
}

/// A source UFO and where it sits in the design space
#[derive(Debug)]
pub struct LoadedSource {
    /// Display name (e.g., "Virtua Grotesk Regular")
    pub name: String,

    /// Style name (e.g., "Regular", "Bold")
    pub style_name: String,

    /// Location in design space
    pub location: Location,

    pub workspace: Workspace,
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

impl DesignspaceProject {
    /// Load a designspace project from a .designspace file
    ///
    /// This parses the designspace XML and loads all referenced UFO sources.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading designspace: {}", path.display());

        let designspace_doc = DesignSpaceDocument::load(path)
            .with_context(|| format!("Failed to parse designspace: {}", path.display()))?;

        // Source filenames are relative to the designspace directory
        let base_dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Invalid designspace path"))?;

        let axes = Self::parse_axes(&designspace_doc);
        tracing::debug!("Found {} axes", axes.len());

        let sources = Self::load_sources(&designspace_doc, base_dir)?;
        tracing::info!("Loaded {} masters", sources.len());

        let instances = Self::parse_instances(&designspace_doc);
        tracing::debug!("Found {} instances", instances.len());

        Ok(Self {
            path: path.to_path_buf(),
            axes,
            sources,
            instances,
        })
    }

    /// Parse axes from the designspace document
    ///
    /// Axis bounds are given in user space while source and instance
    /// locations are design space, so the bounds are mapped through the
    /// axis `<map>` first.
    fn parse_axes(doc: &DesignSpaceDocument) -> Vec<Axis> {
        doc.axes
            .iter()
            .map(|axis| {
                let mut mapping: Vec<(f64, f64)> = axis
                    .map
                    .iter()
                    .flatten()
                    .map(|m| (m.input as f64, m.output as f64))
                    .collect();
                mapping.sort_by(|a, b| a.0.total_cmp(&b.0));
                let to_design = |value: f32| piecewise_linear_map(value as f64, &mapping);

                let default = to_design(axis.default);
                Axis {
                    tag: axis.tag.clone(),
                    name: axis.name.clone(),
                    minimum: axis.minimum.map(to_design).unwrap_or(default),
                    default,
                    maximum: axis.maximum.map(to_design).unwrap_or(default),
                }
            })
            .collect()
    }

    /// Load all source UFOs
    fn load_sources(doc: &DesignSpaceDocument, base_dir: &Path) -> Result<Vec<LoadedSource>> {
        let sources = doc
            .sources
            .iter()
            .map(|source| Self::load_source(source, base_dir))
            .collect::<Result<Vec<_>>>()?;

        if sources.is_empty() {
            anyhow::bail!("Designspace has no sources");
        }

        Ok(sources)
    }

    /// Load a single source UFO
    fn load_source(source: &NoradSource, base_dir: &Path) -> Result<LoadedSource> {
        let ufo_path = base_dir.join(&source.filename);

        tracing::debug!(
            "Loading master '{}' from {}",
            source.name.as_deref().unwrap_or("unnamed"),
            ufo_path.display()
        );

        let workspace = Workspace::load(&ufo_path)
            .with_context(|| format!("Failed to load UFO: {}", ufo_path.display()))?;

        let name = source.name.clone().unwrap_or_else(|| {
            ufo_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string()
        });

        let style_name = source
            .stylename
            .clone()
            .unwrap_or_else(|| workspace.style_name.clone());

        Ok(LoadedSource {
            name,
            style_name,
            location: parse_location(&source.location),
            workspace,
        })
    }

    /// Parse instances from the designspace document
    fn parse_instances(doc: &DesignSpaceDocument) -> Vec<Instance> {
        doc.instances
            .iter()
            .enumerate()
            .map(|(index, inst)| {
                let name = inst
                    .stylename
                    .clone()
                    .or_else(|| inst.name.clone())
                    .unwrap_or_else(|| format!("Instance {index}"));
                Instance::at(name, parse_location(&inst.location))
            })
            .collect()
    }

    /// Get the display name for this designspace
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    }

    /// Index of the source at the default location, or the first source
    pub fn default_source(&self) -> usize {
        self.sources
            .iter()
            .position(|source| {
                self.axes.iter().all(|axis| {
                    let value = source.location.get(&axis.name).copied().unwrap_or(axis.default);
                    (value - axis.default).abs() < 1e-6
                })
            })
            .unwrap_or(0)
    }

    /// Build the font snapshot.
    ///
    /// The default source provides the family name, glyph order and export
    /// flags. Masters keep document order. Instances named in
    /// `inactive_instances` do not export.
    pub fn into_font(self, inactive_instances: &[String]) -> Font {
        let default_index = self.default_source();
        let family_name = self
            .sources
            .get(default_index)
            .map(|s| s.workspace.family_name.clone())
            .unwrap_or_else(|| self.display_name());
        let mut font = Font::new(family_name);
        font.axes = self.axes;

        let mut glyph_order = None;
        let mut non_exporting = None;
        for (index, source) in self.sources.into_iter().enumerate() {
            if index == default_index {
                glyph_order = Some(source.workspace.glyph_order.clone());
                non_exporting = Some(source.workspace.non_exporting.clone());
            }
            let master = source
                .workspace
                .into_master(format!("{index}:{}", source.name), source.style_name)
                .with_location(source.location);
            font.add_master(master);
        }
        if let Some(order) = glyph_order {
            font.set_glyph_order(order);
        }
        if let Some(names) = non_exporting {
            font.set_non_exporting(names);
        }

        for mut instance in self.instances {
            if inactive_instances.contains(&instance.name) {
                instance.exports = false;
            }
            font.instances.push(instance);
        }
        font
    }
}

/// Map `value` through sorted (input, output) pairs, linearly between them.
/// Outside the mapped range the nearest pair's offset applies.
fn piecewise_linear_map(value: f64, mapping: &[(f64, f64)]) -> f64 {
    let (Some(&(first_in, first_out)), Some(&(last_in, last_out))) =
        (mapping.first(), mapping.last())
    else {
        return value;
    };
    if value <= first_in {
        return value + first_out - first_in;
    }
    if value >= last_in {
        return value + last_out - last_in;
    }
    for pair in mapping.windows(2) {
        let ((a_in, a_out), (b_in, b_out)) = (pair[0], pair[1]);
        if value <= b_in {
            return a_out + (b_out - a_out) * (value - a_in) / (b_in - a_in);
        }
    }
    value
}

/// Parse a location from designspace dimensions
fn parse_location(dimensions: &[Dimension]) -> Location {
    dimensions
        .iter()
        .filter_map(|dim| dim.xvalue.map(|v| (dim.name.clone(), v as f64)))
        .collect()
}

/// Check if a path is a designspace file
pub fn is_designspace_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("designspace"))
        .unwrap_or(false)
}

/// Load a `.designspace` or `.ufo` path into a font snapshot
pub fn load_font(path: &Path, inactive_instances: &[String]) -> Result<Font> {
    if is_designspace_file(path) {
        let project = DesignspaceProject::load(path)?;
        tracing::info!(
            "Loaded designspace: {} ({} masters, {} instances)",
            project.display_name(),
            project.sources.len(),
            project.instances.len()
        );
        Ok(project.into_font(inactive_instances))
    } else if is_ufo(path) {
        let workspace = Workspace::load(path)?;
        tracing::info!(
            "Loaded font: {} ({} glyphs)",
            workspace.display_name(),
            workspace.glyph_count()
        );
        Ok(workspace.into_font())
    } else {
        anyhow::bail!("Not a .ufo or .designspace path: {}", path.display())
    }
}
