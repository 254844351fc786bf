// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Marks for kinky nodes.
//!
//! The scan never touches font sources. Instead it hands a list of [`Mark`]s
//! to a downstream sink, which may label the nodes in an editor or just
//! print them.

use kurbo::Point;
use serde::Serialize;

use crate::config::KinkConfig;
use crate::model::font::{Font, Master, MasterId};
use crate::model::outline::Outline;
use crate::scanner::{Finding, ScanReport};
use crate::settings;

/// A label to attach to a master layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Mark {
    /// Label an existing node
    Node {
        glyph: String,
        master: MasterId,
        path: usize,
        node: usize,
        label: String,
        #[serde(skip)]
        deviation: f64,
    },
    /// Free-standing label at a position with no matching node
    Annotation {
        glyph: String,
        master: MasterId,
        position: Point,
        label: String,
        #[serde(skip)]
        deviation: f64,
    },
}

impl Mark {
    pub fn glyph(&self) -> &str {
        match self {
            Mark::Node { glyph, .. } | Mark::Annotation { glyph, .. } => glyph,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Mark::Node { label, .. } | Mark::Annotation { label, .. } => label,
        }
    }

    fn deviation(&self) -> f64 {
        match self {
            Mark::Node { deviation, .. } | Mark::Annotation { deviation, .. } => *deviation,
        }
    }

    /// Two marks land on the same spot of the same layer
    fn same_target(&self, other: &Mark) -> bool {
        match (self, other) {
            (
                Mark::Node {
                    glyph: g1,
                    master: m1,
                    path: p1,
                    node: n1,
                    ..
                },
                Mark::Node {
                    glyph: g2,
                    master: m2,
                    path: p2,
                    node: n2,
                    ..
                },
            ) => g1 == g2 && m1 == m2 && p1 == p2 && n1 == n2,
            (
                Mark::Annotation {
                    glyph: g1,
                    master: m1,
                    position: q1,
                    ..
                },
                Mark::Annotation {
                    glyph: g2,
                    master: m2,
                    position: q2,
                    ..
                },
            ) => g1 == g2 && m1 == m2 && q1 == q2,
            _ => false,
        }
    }
}

/// Label text for a deviation, e.g. `"12.3 ⛔️"`
pub fn mark_label(deviation: f64) -> String {
    format!("{:.1} {}", deviation, settings::report::NODE_MARKER)
}

/// Marks for every finding of `report`; empty when marking is disabled
pub fn plan_marks(font: &Font, config: &KinkConfig, report: &ScanReport) -> Vec<Mark> {
    if !config.mark_kinks {
        return Vec::new();
    }

    let mut marks: Vec<Mark> = Vec::new();
    for finding in &report.findings {
        let Some(mark) = mark_for(font, finding) else {
            tracing::debug!(
                "No layer to mark for {} path {} node {}",
                finding.glyph,
                finding.path,
                finding.node
            );
            continue;
        };

        match marks.iter_mut().find(|existing| existing.same_target(&mark)) {
            Some(existing) => {
                if mark.deviation() > existing.deviation() {
                    *existing = mark;
                }
            }
            None => marks.push(mark),
        }
    }
    marks
}

fn mark_for(font: &Font, finding: &Finding) -> Option<Mark> {
    let label = mark_label(finding.deviation);

    // Masters mode: the finding already names its master and node
    if let Some(id) = &finding.master {
        let master = font.master(id)?;
        return Some(Mark::Node {
            glyph: finding.glyph.clone(),
            master: master.id.clone(),
            path: finding.path,
            node: finding.node,
            label,
            deviation: finding.deviation,
        });
    }

    let master: &Master = font.first_master()?;
    let outline = master.glyph(&finding.glyph);
    match outline.and_then(|outline| node_at(outline, finding.position)) {
        Some((path, node)) => Some(Mark::Node {
            glyph: finding.glyph.clone(),
            master: master.id.clone(),
            path,
            node,
            label,
            deviation: finding.deviation,
        }),
        None => Some(Mark::Annotation {
            glyph: finding.glyph.clone(),
            master: master.id.clone(),
            position: finding.position,
            label,
            deviation: finding.deviation,
        }),
    }
}

/// The node at exactly `position`, preferring smooth on-curve nodes
fn node_at(outline: &Outline, position: Point) -> Option<(usize, usize)> {
    let nodes = || {
        outline.contours.iter().enumerate().flat_map(|(path, contour)| {
            contour
                .nodes
                .iter()
                .enumerate()
                .map(move |(index, node)| (path, index, node))
        })
    };

    nodes()
        .find(|(_, _, node)| node.position == position && node.is_on_curve() && node.is_smooth())
        .or_else(|| nodes().find(|(_, _, node)| node.position == position))
        .map(|(path, index, _)| (path, index))
}
