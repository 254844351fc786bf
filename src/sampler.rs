// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Sample positions in the interpolation space.
//!
//! A scan compares a reference outline (the first master) against the
//! outline at every sample position. Which positions are sampled depends on
//! the [`SampleMode`]: halfway blends of master pairs, the font's
//! instances, or each master on its own.

use serde::Serialize;

use crate::config::{KinkConfig, SampleMode};
use crate::interpolation::VariationModel;
use crate::model::font::{Blend, Font, Instance, MasterId};
use crate::settings;

/// A named point of the design space, alive for one scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePosition {
    pub label: String,
    pub blend: Blend,
}

impl SamplePosition {
    pub fn new(label: impl Into<String>, blend: Blend) -> Self {
        Self {
            label: label.into(),
            blend,
        }
    }
}

/// The position all samples are compared against: the first master
pub fn reference_position(font: &Font) -> Option<SamplePosition> {
    font.first_master().map(|master| {
        SamplePosition::new(
            settings::report::REFERENCE_LABEL,
            Blend::single(master.id.clone()),
        )
    })
}

/// Build the sample positions for `config.mode`
pub fn build_samples(font: &Font, config: &KinkConfig) -> Vec<SamplePosition> {
    let samples = match config.mode {
        SampleMode::AllMasterPairs => master_pairs(font, false),
        SampleMode::AdjacentMasters => master_pairs(font, true),
        SampleMode::ActiveInstances => instance_samples(font, config, true),
        SampleMode::AllInstances => instance_samples(font, config, false),
        SampleMode::Masters => font
            .masters
            .iter()
            .map(|m| SamplePosition::new(m.name.clone(), Blend::single(m.id.clone())))
            .collect(),
    };

    tracing::info!("Testing in {} samples:", samples.len());
    for sample in &samples {
        tracing::info!("- {}", sample.label);
    }
    samples
}

/// Halfway blends between master pairs, in master order
fn master_pairs(font: &Font, adjacent_only: bool) -> Vec<SamplePosition> {
    let masters = &font.masters;
    if pairs_may_leave_design_space(masters.len(), adjacent_only) {
        tracing::warn!(
            "{} masters: halfway blends between all master pairs may fall outside \
             the designed interpolation space and report false positives",
            masters.len()
        );
    }

    let mut samples = Vec::new();
    for (i, a) in masters.iter().enumerate() {
        for (j, b) in masters.iter().enumerate().skip(i + 1) {
            if adjacent_only && j - i != 1 {
                continue;
            }
            samples.push(SamplePosition::new(
                format!("{}/{}", a.name, b.name),
                Blend::halfway(a.id.clone(), b.id.clone()),
            ));
        }
    }
    samples
}

/// Whether halfway blends of every master pair are likely to leave the
/// designed space and need a warning
fn pairs_may_leave_design_space(master_count: usize, adjacent_only: bool) -> bool {
    !adjacent_only && master_count >= settings::kink::PAIRWISE_WARNING_MASTERS
}

/// One sample per instance, using explicit weights or the variation model
fn instance_samples(font: &Font, config: &KinkConfig, exporting_only: bool) -> Vec<SamplePosition> {
    let mut model = None;
    let mut samples = Vec::new();

    for instance in &font.instances {
        let exports = instance.exports && !config.inactive_instances.contains(&instance.name);
        if exporting_only && !exports {
            tracing::debug!("Skipping inactive instance {}", instance.name);
            continue;
        }

        match instance_blend(font, instance, &mut model) {
            Some(blend) => samples.push(SamplePosition::new(instance.name.clone(), blend)),
            None => tracing::warn!(
                "Could not resolve instance '{}' to master weights, skipping it",
                instance.name
            ),
        }
    }
    samples
}

/// Master weights of an instance; the model is built on first use
fn instance_blend(
    font: &Font,
    instance: &Instance,
    model: &mut Option<Option<VariationModel>>,
) -> Option<Blend> {
    if let Some(weights) = &instance.weights {
        return Some(weights.clone());
    }

    let model = model.get_or_insert_with(|| {
        let masters: Vec<(MasterId, _)> = font
            .masters
            .iter()
            .map(|m| (m.id.clone(), m.location.clone()))
            .collect();
        VariationModel::new(&font.axes, &masters)
            .map_err(|e| tracing::warn!("Cannot build variation model: {}", e))
            .ok()
    });

    model
        .as_ref()
        .map(|model| model.master_weights(&instance.location))
        .filter(|blend| !blend.is_empty())
}
