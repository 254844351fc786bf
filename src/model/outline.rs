// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Read-only outline snapshots.
//!
//! An `Outline` is what the scanner sees of a glyph at one position in the
//! design space: ordered contours of typed nodes. Outlines are plain values
//! with no back-references into the font they came from, so a sampled
//! outline can be compared, interpolated and dropped freely.

use kurbo::Point;
use serde::Serialize;
use std::fmt;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Whether a node lies on the curve or is a control handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    OnCurve,
    OffCurve,
}

/// How the segments meeting at an on-curve node are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Connection {
    /// Incoming and outgoing directions are tangent
    Smooth,
    Corner,
}

/// A point in a contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub position: Point,
    pub node_type: NodeType,
    pub connection: Connection,
}

/// A single path of an outline
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub nodes: Vec<Node>,
    pub closed: bool,
}

/// All contours of a glyph at one design-space position
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

/// The reason two outlines cannot be compared node by node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Incompatibility {
    PathCount { expected: usize, found: usize },
    Closedness { path: usize },
    NodeCount { path: usize, expected: usize, found: usize },
    NodeType { path: usize, node: usize },
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

impl Node {
    pub fn new(x: f64, y: f64, node_type: NodeType, connection: Connection) -> Self {
        Self {
            position: Point::new(x, y),
            node_type,
            connection,
        }
    }

    /// On-curve smooth node
    pub fn smooth(x: f64, y: f64) -> Self {
        Self::new(x, y, NodeType::OnCurve, Connection::Smooth)
    }

    /// On-curve corner node
    pub fn corner(x: f64, y: f64) -> Self {
        Self::new(x, y, NodeType::OnCurve, Connection::Corner)
    }

    /// Off-curve handle
    pub fn off_curve(x: f64, y: f64) -> Self {
        Self::new(x, y, NodeType::OffCurve, Connection::Corner)
    }

    pub fn is_on_curve(&self) -> bool {
        self.node_type == NodeType::OnCurve
    }

    pub fn is_smooth(&self) -> bool {
        self.connection == Connection::Smooth
    }
}

impl Contour {
    pub fn closed(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            closed: true,
        }
    }

    pub fn open(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            closed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `index` is the first or last node of an open path
    pub fn is_open_endpoint(&self, index: usize) -> bool {
        !self.closed && (index == 0 || index + 1 == self.nodes.len())
    }

    /// The (previous, current, next) nodes around `index`.
    ///
    /// Closed contours wrap around; open contours have no neighbour across
    /// the seam, so their endpoints yield `None`.
    pub fn triplet(&self, index: usize) -> Option<(&Node, &Node, &Node)> {
        let len = self.nodes.len();
        if index >= len || self.is_open_endpoint(index) {
            return None;
        }
        let prev = (index + len - 1) % len;
        let next = (index + 1) % len;
        Some((&self.nodes[prev], &self.nodes[index], &self.nodes[next]))
    }

    /// Whether the node at `index` is measured for kinks at all.
    ///
    /// Off-curve handles and corner joints break colinearity on purpose;
    /// open endpoints have only one neighbour.
    pub fn is_kink_candidate(&self, index: usize) -> bool {
        match self.nodes.get(index) {
            Some(node) => {
                node.is_on_curve() && node.is_smooth() && !self.is_open_endpoint(index)
            }
            None => false,
        }
    }
}

impl Outline {
    pub fn new(contours: Vec<Contour>) -> Self {
        Self { contours }
    }

    /// True when there is nothing drawable
    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(Contour::is_empty)
    }

    pub fn node_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    pub fn node(&self, path: usize, node: usize) -> Option<&Node> {
        self.contours.get(path).and_then(|c| c.nodes.get(node))
    }

    /// Check that `other` can be compared with `self` index by index
    pub fn check_compatible(&self, other: &Outline) -> Result<(), Incompatibility> {
        if self.contours.len() != other.contours.len() {
            return Err(Incompatibility::PathCount {
                expected: self.contours.len(),
                found: other.contours.len(),
            });
        }

        for (path, (ours, theirs)) in self.contours.iter().zip(&other.contours).enumerate() {
            if ours.closed != theirs.closed {
                return Err(Incompatibility::Closedness { path });
            }
            if ours.nodes.len() != theirs.nodes.len() {
                return Err(Incompatibility::NodeCount {
                    path,
                    expected: ours.nodes.len(),
                    found: theirs.nodes.len(),
                });
            }
            if let Some(node) = ours
                .nodes
                .iter()
                .zip(&theirs.nodes)
                .position(|(a, b)| a.node_type != b.node_type)
            {
                return Err(Incompatibility::NodeType { path, node });
            }
        }

        Ok(())
    }

    pub fn is_compatible(&self, other: &Outline) -> bool {
        self.check_compatible(other).is_ok()
    }

    /// Round every coordinate to the nearest multiple of `grid`.
    ///
    /// A grid of zero (or less) leaves coordinates untouched.
    pub fn round_to_grid(&mut self, grid: f64) {
        if grid.is_nan() || grid <= 0.0 {
            return;
        }
        for node in self.contours.iter_mut().flat_map(|c| c.nodes.iter_mut()) {
            node.position = Point::new(
                (node.position.x / grid).round() * grid,
                (node.position.y / grid).round() * grid,
            );
        }
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathCount { expected, found } => {
                write!(f, "expected {expected} paths, found {found}")
            }
            Self::Closedness { path } => write!(f, "path {path} differs in open/closed state"),
            Self::NodeCount {
                path,
                expected,
                found,
            } => write!(f, "path {path}: expected {expected} nodes, found {found}"),
            Self::NodeType { path, node } => {
                write!(f, "path {path}, node {node}: on-curve/off-curve mismatch")
            }
        }
    }
}
