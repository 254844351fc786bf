// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Resolving design-space locations into master weights.
//!
//! This is the OpenType variation model: every master gets a region of
//! influence (a support) in normalized space, deltas are layered from the
//! default master outwards, and the per-delta scalars at a location are
//! folded back into one weight per master. Summing master outlines with
//! those weights gives the same result as applying the deltas.
//!
//! Axis maps are not applied; locations are normalized linearly between
//! each axis' minimum, default and maximum.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::font::{Axis, Blend, Location, MasterId};

/// (lower, peak, upper) per axis, in normalized coordinates
type Region = BTreeMap<String, (f64, f64, f64)>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("no master at the default location")]
    NoDefaultMaster,
    #[error("masters '{0}' and '{1}' share the same location")]
    DuplicateLocation(String, String),
    #[error("no masters to build a model from")]
    Empty,
}

/// Master weights for any location in the design space
#[derive(Debug, Clone)]
pub struct VariationModel {
    axes: Vec<Axis>,
    /// Master ids in model order (default master first)
    ids: Vec<MasterId>,
    supports: Vec<Region>,
    /// For each master in model order, the scalars of earlier deltas at its location
    delta_weights: Vec<BTreeMap<usize, f64>>,
}

impl VariationModel {
    /// Build a model from masters given as (id, design location)
    pub fn new(axes: &[Axis], masters: &[(MasterId, Location)]) -> Result<Self, ModelError> {
        if masters.is_empty() {
            return Err(ModelError::Empty);
        }

        let mut normalized: Vec<(MasterId, BTreeMap<String, f64>)> = masters
            .iter()
            .map(|(id, loc)| (id.clone(), normalize_location(loc, axes)))
            .collect();

        for (i, (id_a, a)) in normalized.iter().enumerate() {
            if let Some((id_b, _)) = normalized[i + 1..].iter().find(|(_, b)| b == a) {
                return Err(ModelError::DuplicateLocation(
                    id_a.to_string(),
                    id_b.to_string(),
                ));
            }
        }

        if !normalized.iter().any(|(_, loc)| loc.is_empty()) {
            return Err(ModelError::NoDefaultMaster);
        }

        let axis_order: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        normalized.sort_by(|(_, a), (_, b)| {
            sort_key(a, &axis_order)
                .partial_cmp(&sort_key(b, &axis_order))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let locations: Vec<&BTreeMap<String, f64>> = normalized.iter().map(|(_, l)| l).collect();
        let supports = compute_supports(&locations);

        let delta_weights = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| {
                supports[..i]
                    .iter()
                    .enumerate()
                    .filter_map(|(j, support)| {
                        let scalar = support_scalar(loc, support);
                        (scalar != 0.0).then_some((j, scalar))
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            axes: axes.to_vec(),
            ids: normalized.into_iter().map(|(id, _)| id).collect(),
            supports,
            delta_weights,
        })
    }

    /// Weights per master for a design-space location
    pub fn master_weights(&self, location: &Location) -> Blend {
        let loc = normalize_location(location, &self.axes);
        let mut scalars: Vec<f64> = self
            .supports
            .iter()
            .map(|support| support_scalar(&loc, support))
            .collect();

        for (i, weights) in self.delta_weights.iter().enumerate().rev() {
            for (&j, &weight) in weights {
                scalars[j] -= scalars[i] * weight;
            }
        }

        Blend::from_weights(
            self.ids
                .iter()
                .cloned()
                .zip(scalars)
                .filter(|(_, w)| w.abs() > f64::EPSILON),
        )
    }
}

/// Map a design location to [-1, 1] per axis, dropping axes at their default
pub fn normalize_location(location: &Location, axes: &[Axis]) -> BTreeMap<String, f64> {
    axes.iter()
        .filter_map(|axis| {
            let value = location.get(&axis.name).copied().unwrap_or(axis.default);
            let value = value.clamp(axis.minimum.min(axis.default), axis.maximum.max(axis.default));
            let normalized = if value < axis.default {
                (value - axis.default) / (axis.default - axis.minimum)
            } else if value > axis.default {
                (value - axis.default) / (axis.maximum - axis.default)
            } else {
                0.0
            };
            (normalized != 0.0).then(|| (axis.name.clone(), normalized))
        })
        .collect()
}

/// Ordering of masters: by number of non-default axes, then axis order,
/// then direction and distance from the default.
fn sort_key(loc: &BTreeMap<String, f64>, axis_order: &[&str]) -> (usize, Vec<usize>, Vec<f64>, Vec<f64>) {
    let mut axes: Vec<(usize, f64)> = loc
        .iter()
        .map(|(name, value)| {
            let index = axis_order
                .iter()
                .position(|a| a == name)
                .unwrap_or(usize::MAX);
            (index, *value)
        })
        .collect();
    axes.sort_by_key(|(index, _)| *index);
    (
        loc.len(),
        axes.iter().map(|(i, _)| *i).collect(),
        axes.iter().map(|(_, v)| v.signum()).collect(),
        axes.iter().map(|(_, v)| v.abs()).collect(),
    )
}

fn compute_supports(locations: &[&BTreeMap<String, f64>]) -> Vec<Region> {
    let mut min_v: BTreeMap<&str, f64> = BTreeMap::new();
    let mut max_v: BTreeMap<&str, f64> = BTreeMap::new();
    for loc in locations {
        for (axis, &v) in loc.iter() {
            let min = min_v.entry(axis).or_insert(v);
            *min = min.min(v);
            let max = max_v.entry(axis).or_insert(v);
            *max = max.max(v);
        }
    }

    let regions: Vec<Region> = locations
        .iter()
        .map(|loc| {
            loc.iter()
                .map(|(axis, &v)| {
                    let triple = if v > 0.0 {
                        (0.0, v, max_v[axis.as_str()])
                    } else {
                        (min_v[axis.as_str()], v, 0.0)
                    };
                    (axis.clone(), triple)
                })
                .collect()
        })
        .collect();

    let mut supports: Vec<Region> = Vec::with_capacity(regions.len());
    for (i, region) in regions.iter().enumerate() {
        let mut region = region.clone();
        for prev in &regions[..i] {
            if !prev.keys().eq(region.keys()) {
                continue;
            }
            let relevant = region.iter().all(|(axis, &(lower, peak, upper))| {
                let p = prev[axis].1;
                p == peak || (lower < p && p < upper)
            });
            if !relevant {
                continue;
            }

            // Split the box for the new master along the axes with the
            // largest range ratio.
            let mut best_axes: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
            let mut best_ratio = -1.0;
            for (axis, &(_, val, _)) in prev.iter() {
                let (lower, loc_v, upper) = region[axis];
                let (mut new_lower, mut new_upper) = (lower, upper);
                let ratio = if val < loc_v {
                    new_lower = val;
                    (val - loc_v) / (lower - loc_v)
                } else if loc_v < val {
                    new_upper = val;
                    (val - loc_v) / (upper - loc_v)
                } else {
                    continue;
                };
                if ratio > best_ratio {
                    best_axes.clear();
                    best_ratio = ratio;
                }
                if ratio == best_ratio {
                    best_axes.insert(axis.clone(), (new_lower, loc_v, new_upper));
                }
            }
            region.extend(best_axes);
        }
        supports.push(region);
    }
    supports
}

fn support_scalar(location: &BTreeMap<String, f64>, support: &Region) -> f64 {
    let mut scalar = 1.0;
    for (axis, &(lower, peak, upper)) in support {
        if peak == 0.0 || lower > peak || peak > upper || (lower < 0.0 && upper > 0.0) {
            continue;
        }
        let v = location.get(axis).copied().unwrap_or(0.0);
        if v == peak {
            continue;
        }
        if v <= lower || upper <= v {
            return 0.0;
        }
        if v < peak {
            scalar *= (v - lower) / (peak - lower);
        } else {
            scalar *= (v - upper) / (peak - upper);
        }
    }
    scalar
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn axis(name: &str, minimum: f64, default: f64, maximum: f64) -> Axis {
        Axis {
            tag: name[..4.min(name.len())].to_lowercase(),
            name: name.to_string(),
            minimum,
            default,
            maximum,
        }
    }

    fn loc(values: &[(&str, f64)]) -> Location {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn id(name: &str) -> MasterId {
        MasterId::new(name)
    }

    fn assert_weight(blend: &Blend, master: &str, expected: f64) {
        let actual = blend.weight(&id(master));
        assert!(
            (actual - expected).abs() < EPSILON,
            "weight of {master}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalizes_around_default() {
        let axes = [axis("Weight", 100.0, 400.0, 900.0)];
        assert_eq!(normalize_location(&loc(&[("Weight", 400.0)]), &axes), BTreeMap::new());
        assert_eq!(
            normalize_location(&loc(&[("Weight", 250.0)]), &axes)["Weight"],
            -0.5
        );
        assert_eq!(
            normalize_location(&loc(&[("Weight", 900.0)]), &axes)["Weight"],
            1.0
        );
        // Missing axes sit at their default.
        assert!(normalize_location(&Location::new(), &axes).is_empty());
    }

    #[test]
    fn single_axis_two_masters_is_linear() {
        let axes = [axis("Weight", 100.0, 100.0, 900.0)];
        let model = VariationModel::new(
            &axes,
            &[
                (id("light"), loc(&[("Weight", 100.0)])),
                (id("bold"), loc(&[("Weight", 900.0)])),
            ],
        )
        .unwrap();

        let w = model.master_weights(&loc(&[("Weight", 300.0)]));
        assert_weight(&w, "light", 0.75);
        assert_weight(&w, "bold", 0.25);

        let w = model.master_weights(&loc(&[("Weight", 900.0)]));
        assert_weight(&w, "light", 0.0);
        assert_weight(&w, "bold", 1.0);
    }

    #[test]
    fn single_axis_three_masters_uses_neighbours() {
        let axes = [axis("Weight", 100.0, 400.0, 900.0)];
        let model = VariationModel::new(
            &axes,
            &[
                (id("light"), loc(&[("Weight", 100.0)])),
                (id("regular"), loc(&[("Weight", 400.0)])),
                (id("bold"), loc(&[("Weight", 900.0)])),
            ],
        )
        .unwrap();

        let w = model.master_weights(&loc(&[("Weight", 650.0)]));
        assert_weight(&w, "light", 0.0);
        assert_weight(&w, "regular", 0.5);
        assert_weight(&w, "bold", 0.5);

        let w = model.master_weights(&loc(&[("Weight", 175.0)]));
        assert_weight(&w, "light", 0.75);
        assert_weight(&w, "regular", 0.25);
    }

    #[test]
    fn two_axes_four_corners_is_bilinear() {
        let axes = [
            axis("Weight", 0.0, 0.0, 100.0),
            axis("Width", 0.0, 0.0, 100.0),
        ];
        let model = VariationModel::new(
            &axes,
            &[
                (id("base"), loc(&[("Weight", 0.0), ("Width", 0.0)])),
                (id("wght"), loc(&[("Weight", 100.0), ("Width", 0.0)])),
                (id("wdth"), loc(&[("Weight", 0.0), ("Width", 100.0)])),
                (id("both"), loc(&[("Weight", 100.0), ("Width", 100.0)])),
            ],
        )
        .unwrap();

        let w = model.master_weights(&loc(&[("Weight", 50.0), ("Width", 50.0)]));
        for master in ["base", "wght", "wdth", "both"] {
            assert_weight(&w, master, 0.25);
        }

        let w = model.master_weights(&loc(&[("Weight", 100.0), ("Width", 100.0)]));
        assert_weight(&w, "both", 1.0);
        assert_weight(&w, "base", 0.0);
    }

    #[test]
    fn default_master_is_required() {
        let axes = [axis("Weight", 100.0, 400.0, 900.0)];
        let result = VariationModel::new(
            &axes,
            &[
                (id("light"), loc(&[("Weight", 100.0)])),
                (id("bold"), loc(&[("Weight", 900.0)])),
            ],
        );
        assert_eq!(result.unwrap_err(), ModelError::NoDefaultMaster);
        assert_eq!(
            VariationModel::new(&axes, &[]).unwrap_err(),
            ModelError::Empty
        );
    }

    #[test]
    fn duplicate_locations_are_rejected() {
        let axes = [axis("Weight", 100.0, 100.0, 900.0)];
        let result = VariationModel::new(
            &axes,
            &[
                (id("a"), loc(&[("Weight", 100.0)])),
                (id("b"), loc(&[("Weight", 100.0)])),
            ],
        );
        assert!(matches!(result, Err(ModelError::DuplicateLocation(..))));
    }
}
