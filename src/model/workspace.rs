// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Loading a single UFO into outline snapshots via `norad`.
//!
//! `Workspace` reads a `.ufo` font and converts the default layer's glyph
//! contours into `Outline`s. Only what the kink scan needs is kept: point
//! positions, on/off-curve type, the smooth flag and whether a contour is
//! open. Components are not resolved.

use anyhow::{Context, Result};
use norad::{Font as NoradFont, Glyph as NoradGlyph};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::font::{Font, Master, compare_glyphs};
use super::outline::{Connection, Contour, Node, NodeType, Outline};

const GLYPH_ORDER_KEY: &str = "public.glyphOrder";
const SKIP_EXPORT_KEY: &str = "public.skipExportGlyphs";

// ============================================================================
// WORKSPACE
// ============================================================================

/// A loaded UFO: outlines of the default layer plus ordering metadata
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Path to the UFO directory
    pub path: PathBuf,

    /// Name of the font family
    pub family_name: String,

    /// Style name (e.g., "Regular", "Bold")
    pub style_name: String,

    /// Outlines by glyph name
    pub glyphs: HashMap<String, Outline>,

    /// Glyph names in font order
    pub glyph_order: Vec<String>,

    /// Glyphs listed in `public.skipExportGlyphs`
    pub non_exporting: BTreeSet<String>,
}

impl Workspace {
    /// Load a UFO from a directory path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let font = NoradFont::load(path)
            .with_context(|| format!("Failed to load UFO from {:?}", path))?;

        let family_name = font
            .font_info
            .family_name
            .clone()
            .unwrap_or_else(|| "Untitled Font".to_string());

        let style_name = font
            .font_info
            .style_name
            .clone()
            .unwrap_or_else(|| "Regular".to_string());

        let mut glyphs = HashMap::new();
        let mut codepoints = HashMap::new();
        for norad_glyph in font.default_layer().iter() {
            let name = norad_glyph.name().to_string();
            codepoints.insert(name.clone(), norad_glyph.codepoints.iter().next());
            glyphs.insert(name, Self::convert_glyph(norad_glyph));
        }

        let glyph_order = Self::glyph_order(&font, &codepoints);
        let non_exporting = Self::lib_names(&font, SKIP_EXPORT_KEY).into_iter().collect();

        tracing::debug!(
            "Loaded UFO {} {} with {} glyphs",
            family_name,
            style_name,
            glyphs.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            family_name,
            style_name,
            glyphs,
            glyph_order,
            non_exporting,
        })
    }

    /// Glyph order: `public.glyphOrder` first, then the remaining glyphs by
    /// codepoint and name
    fn glyph_order(font: &NoradFont, codepoints: &HashMap<String, Option<char>>) -> Vec<String> {
        let mut listed = HashSet::new();
        let mut order: Vec<String> = Self::lib_names(font, GLYPH_ORDER_KEY)
            .into_iter()
            .filter(|name| codepoints.contains_key(name) && listed.insert(name.clone()))
            .collect();

        let mut rest: Vec<(&String, Option<char>)> = codepoints
            .iter()
            .filter(|(name, _)| !listed.contains(name.as_str()))
            .map(|(name, cp)| (name, *cp))
            .collect();
        rest.sort_by(|(name_a, cp_a), (name_b, cp_b)| compare_glyphs(name_a, *cp_a, name_b, *cp_b));

        order.extend(rest.into_iter().map(|(name, _)| name.clone()));
        order
    }

    /// String array stored under `key` in the font lib
    fn lib_names(font: &NoradFont, key: &str) -> Vec<String> {
        font.lib
            .get(key)
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_string())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert a norad Glyph's contours to an Outline
    fn convert_glyph(norad_glyph: &NoradGlyph) -> Outline {
        Outline::new(
            norad_glyph
                .contours
                .iter()
                .map(Self::convert_contour)
                .collect(),
        )
    }

    /// Convert a norad contour. A contour starting with a move point is open.
    fn convert_contour(norad_contour: &norad::Contour) -> Contour {
        let closed = norad_contour
            .points
            .first()
            .map(|pt| pt.typ != norad::PointType::Move)
            .unwrap_or(true);

        let nodes = norad_contour
            .points
            .iter()
            .map(Self::convert_point)
            .collect();

        Contour { nodes, closed }
    }

    /// Convert a norad point to a Node
    fn convert_point(pt: &norad::ContourPoint) -> Node {
        let node_type = match pt.typ {
            norad::PointType::OffCurve => NodeType::OffCurve,
            norad::PointType::Move
            | norad::PointType::Line
            | norad::PointType::Curve
            | norad::PointType::QCurve => NodeType::OnCurve,
        };
        let connection = if pt.smooth {
            Connection::Smooth
        } else {
            Connection::Corner
        };
        Node::new(pt.x, pt.y, node_type, connection)
    }

    /// Get the display name of the font (Family + Style)
    pub fn display_name(&self) -> String {
        format!("{} {}", self.family_name, self.style_name)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Turn this workspace into a master with the given id and name
    pub fn into_master(self, id: impl Into<String>, name: impl Into<String>) -> Master {
        let mut master = Master::new(id, name);
        master.glyphs = self.glyphs;
        master
    }

    /// A single-master font
    pub fn into_font(self) -> Font {
        let mut font = Font::new(self.family_name.clone());
        let glyph_order = self.glyph_order.clone();
        let non_exporting = self.non_exporting.clone();
        let style_name = self.style_name.clone();
        font.add_master(self.into_master(style_name.clone(), style_name));
        font.set_glyph_order(glyph_order);
        font.set_non_exporting(non_exporting);
        font
    }
}

/// Check if a path is a UFO
pub fn is_ufo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("ufo"))
        .unwrap_or(false)
}
