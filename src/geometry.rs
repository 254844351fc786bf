// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Geometry primitives used for kink measurement.
//!
//! A kink is measured as the perpendicular distance from a node to the
//! chord through its two neighbours. Degenerate input never fails the
//! scan: it measures as zero.

use kurbo::Point;

/// Intersection of the infinite line AB with the infinite line CD.
///
/// Returns `None` when the lines are parallel (or either one collapses to a
/// point), i.e. when the determinant divisor is zero.
pub fn line_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let (x1, y1) = (a.x, a.y);
    let (x2, y2) = (b.x, b.y);
    let (x3, y3) = (c.x, c.y);
    let (x4, y4) = (d.x, d.y);

    let xtop = (x4 - x3) * (x2 * y1 - x1 * y2) - (x2 - x1) * (x4 * y3 - x3 * y4);
    let ytop = (y1 - y2) * (x4 * y3 - x3 * y4) - (y3 - y4) * (x2 * y1 - x1 * y2);
    let divisor = (y4 - y3) * (x2 - x1) - (y2 - y1) * (x4 - x3);

    if divisor == 0.0 {
        return None;
    }

    let intersection = Point::new(xtop / divisor, ytop / divisor);
    intersection.is_finite().then_some(intersection)
}

/// Euclidean distance between two points
pub fn distance(p: Point, q: Point) -> f64 {
    (p.x - q.x).hypot(p.y - q.y)
}

/// Perpendicular distance from `pivot` to the line through `a` and `b`.
///
/// Builds the line through `pivot` orthogonal to AB, intersects it with AB
/// and measures from `pivot` to the foot point. Returns `0.0` when AB is
/// degenerate.
pub fn orthogonal_distance(pivot: Point, a: Point, b: Point) -> f64 {
    let delta = a - b;
    let pivot2 = Point::new(pivot.x + delta.y, pivot.y - delta.x);

    match line_intersection(pivot, pivot2, a, b) {
        Some(foot) => distance(foot, pivot),
        None => {
            tracing::debug!(
                "Degenerate triplet at ({}, {}): neighbours {:?} and {:?} coincide",
                pivot.x,
                pivot.y,
                a,
                b
            );
            0.0
        }
    }
}
