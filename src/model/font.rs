// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Immutable font snapshot: axes, masters, instances and glyph outlines.
//!
//! `Font` is the only view the analysis has of a font source. It is built
//! once (by the UFO/designspace loaders or by hand in tests) and never
//! mutated by the scanner; marks and reports are produced as separate data.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use super::outline::Outline;

/// Axis name -> design-space coordinate
pub type Location = BTreeMap<String, f64>;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Stable identifier of a master
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MasterId(String);

/// Weights per master describing one point in the design space
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Blend(BTreeMap<MasterId, f64>);

/// A design axis (e.g., Weight, Width)
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Axis tag (e.g., "wght", "wdth")
    pub tag: String,
    /// Human-readable name, used as the key in locations
    pub name: String,
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
}

/// A font master with its drawn glyph outlines
#[derive(Debug, Clone)]
pub struct Master {
    pub id: MasterId,
    /// Display name (e.g., "Light", "Bold")
    pub name: String,
    /// Location in design space
    pub location: Location,
    /// Outlines by glyph name
    pub glyphs: HashMap<String, Outline>,
}

/// A named instance (specific point in design space)
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    /// Whether the instance is exported
    pub exports: bool,
    /// Location in design space
    pub location: Location,
    /// Explicit master weights; take precedence over `location`
    pub weights: Option<Blend>,
}

/// A loaded font: the read-only input of a kink scan
#[derive(Debug, Clone, Default)]
pub struct Font {
    pub family_name: String,
    pub axes: Vec<Axis>,
    pub masters: Vec<Master>,
    pub instances: Vec<Instance>,
    glyph_order: Vec<String>,
    non_exporting: BTreeSet<String>,
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

impl MasterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Blend {
    /// A single master at full weight
    pub fn single(master: MasterId) -> Self {
        Self(BTreeMap::from([(master, 1.0)]))
    }

    /// Halfway between two masters
    pub fn halfway(a: MasterId, b: MasterId) -> Self {
        Self(BTreeMap::from([(a, 0.5), (b, 0.5)]))
    }

    pub fn from_weights(weights: impl IntoIterator<Item = (MasterId, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn weight(&self, master: &MasterId) -> f64 {
        self.0.get(master).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MasterId, f64)> {
        self.0.iter().map(|(id, w)| (id, *w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|w| *w == 0.0)
    }
}

impl Master {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MasterId::new(id),
            name: name.into(),
            location: Location::new(),
            glyphs: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_glyph(mut self, name: impl Into<String>, outline: Outline) -> Self {
        self.glyphs.insert(name.into(), outline);
        self
    }

    pub fn glyph(&self, name: &str) -> Option<&Outline> {
        self.glyphs.get(name)
    }
}

impl Instance {
    pub fn at(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            exports: true,
            location,
            weights: None,
        }
    }

    pub fn with_weights(name: impl Into<String>, weights: Blend) -> Self {
        Self {
            name: name.into(),
            exports: true,
            location: Location::new(),
            weights: Some(weights),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.exports = false;
        self
    }
}

impl Font {
    pub fn new(family_name: impl Into<String>) -> Self {
        Self {
            family_name: family_name.into(),
            ..Self::default()
        }
    }

    /// Add a master; its glyphs are appended to the glyph order in name order
    pub fn with_master(mut self, master: Master) -> Self {
        self.add_master(master);
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn add_master(&mut self, master: Master) {
        let known: HashSet<&str> = self.glyph_order.iter().map(String::as_str).collect();
        let mut new_names: Vec<String> = master
            .glyphs
            .keys()
            .filter(|name| !known.contains(name.as_str()))
            .cloned()
            .collect();
        new_names.sort();
        self.glyph_order.extend(new_names);
        self.masters.push(master);
    }

    /// Replace the glyph order. Names not listed keep their relative order
    /// after the given ones.
    pub fn set_glyph_order(&mut self, order: Vec<String>) {
        let listed: HashSet<&str> = order.iter().map(String::as_str).collect();
        let rest: Vec<String> = self
            .glyph_order
            .iter()
            .filter(|name| !listed.contains(name.as_str()))
            .cloned()
            .collect();
        self.glyph_order = order;
        self.glyph_order.extend(rest);
    }

    pub fn set_non_exporting(&mut self, names: impl IntoIterator<Item = String>) {
        self.non_exporting = names.into_iter().collect();
    }

    /// Glyph names in font order
    pub fn glyph_order(&self) -> &[String] {
        &self.glyph_order
    }

    pub fn contains_glyph(&self, name: &str) -> bool {
        self.masters.iter().any(|m| m.glyphs.contains_key(name))
    }

    pub fn glyph_exports(&self, name: &str) -> bool {
        !self.non_exporting.contains(name)
    }

    pub fn master(&self, id: &MasterId) -> Option<&Master> {
        self.masters.iter().find(|m| &m.id == id)
    }

    pub fn first_master(&self) -> Option<&Master> {
        self.masters.first()
    }
}

/// Compare two glyphs for the fallback glyph order.
///
/// Glyphs with a codepoint come first, ordered by codepoint; the rest are
/// ordered by name.
pub fn compare_glyphs(
    name_a: &str,
    codepoint_a: Option<char>,
    name_b: &str,
    codepoint_b: Option<char>,
) -> std::cmp::Ordering {
    match (codepoint_a, codepoint_b) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| name_a.cmp(name_b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => name_a.cmp(name_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_order_follows_master_insertion() {
        let font = Font::new("Test")
            .with_master(
                Master::new("m0", "Light")
                    .with_glyph("b", Outline::default())
                    .with_glyph("a", Outline::default()),
            )
            .with_master(Master::new("m1", "Bold").with_glyph("c", Outline::default()));
        assert_eq!(font.glyph_order(), &["a", "b", "c"]);
    }

    #[test]
    fn explicit_glyph_order_keeps_unlisted_glyphs() {
        let mut font = Font::new("Test").with_master(
            Master::new("m0", "Regular")
                .with_glyph("a", Outline::default())
                .with_glyph("b", Outline::default())
                .with_glyph("c", Outline::default()),
        );
        font.set_glyph_order(vec!["c".to_string(), "a".to_string()]);
        assert_eq!(font.glyph_order(), &["c", "a", "b"]);
    }

    #[test]
    fn large_glyph_orders_merge() {
        let names: Vec<String> = (0..40_000).map(|i| format!("uni{i:05X}")).collect();
        let mut master = Master::new("m0", "Regular");
        for name in &names {
            master = master.with_glyph(name.clone(), Outline::default());
        }
        let mut font = Font::new("Test").with_master(master);
        assert_eq!(font.glyph_order().len(), 40_000);

        let mut order: Vec<String> = names.iter().rev().take(20_000).cloned().collect();
        order.push("notdef".to_string());
        font.set_glyph_order(order);
        let glyph_order = font.glyph_order();
        assert_eq!(glyph_order.len(), 40_001);
        assert_eq!(glyph_order[0], "uni09C3F");
        assert_eq!(glyph_order[20_000], "notdef");
        assert_eq!(glyph_order[20_001], "uni00000");
    }

    #[test]
    fn non_exporting_glyphs() {
        let mut font = Font::new("Test");
        font.set_non_exporting(["_part".to_string()]);
        assert!(!font.glyph_exports("_part"));
        assert!(font.glyph_exports("a"));
    }

    #[test]
    fn blend_weights() {
        let a = MasterId::new("a");
        let b = MasterId::new("b");
        let blend = Blend::halfway(a.clone(), b.clone());
        assert_eq!(blend.weight(&a), 0.5);
        assert_eq!(blend.weight(&b), 0.5);
        assert_eq!(blend.weight(&MasterId::new("c")), 0.0);
        assert!(!blend.is_empty());
        assert!(Blend::default().is_empty());
    }

    #[test]
    fn codepoint_glyphs_sort_first() {
        use std::cmp::Ordering;
        assert_eq!(compare_glyphs("b", Some('b'), "a", Some('a')), Ordering::Greater);
        assert_eq!(compare_glyphs("z", Some('z'), ".notdef", None), Ordering::Less);
        assert_eq!(compare_glyphs("x.alt", None, "a.alt", None), Ordering::Greater);
    }
}
