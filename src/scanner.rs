// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! The kink scan.
//!
//! For every glyph the scanner materialises a reference outline and one
//! outline per sample position, then measures each smooth on-curve node in
//! every compatible sample. A node whose deviation from the chord through
//! its neighbours exceeds the threshold becomes a [`Finding`].
//!
//! In masters mode there are no synthetic blends: each master's own outline
//! is measured directly, which finds kinks already drawn into the masters.
//!
//! Nothing short of a font without masters stops a scan. Failed or
//! incompatible samples and unusable glyphs end up in the [`ScanReport`].

use kurbo::Point;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::KinkConfig;
use crate::error::ScanError;
use crate::geometry::orthogonal_distance;
use crate::interpolation::{InterpolationEngine, InterpolationError};
use crate::model::font::{Font, MasterId};
use crate::model::outline::{Contour, Outline};
use crate::sampler::{self, SamplePosition};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A node whose kink exceeds the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub glyph: String,
    pub path: usize,
    pub node: usize,
    /// Node position in the reference outline (or in the master, in masters mode)
    pub position: Point,
    /// Largest deviation over all contributing samples
    pub deviation: f64,
    /// Labels of the samples where the threshold was exceeded
    pub samples: Vec<String>,
    /// Name of the master the node was found on, in masters mode
    pub layer: Option<String>,
    /// Id of that master; names need not be unique
    pub master: Option<MasterId>,
}

/// A sample that could not be compared with the reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompatibilityNote {
    pub glyph: String,
    pub sample: String,
    pub reason: String,
}

/// Why a glyph was not scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum SkipReason {
    NotExported,
    NotInFont,
    NoPaths,
    /// The reference outline could not be produced
    Unresolvable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGlyph {
    pub glyph: String,
    pub reason: SkipReason,
}

/// Progress of a running scan, reported before each glyph
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress<'a> {
    pub index: usize,
    pub total: usize,
    pub glyph: &'a str,
}

/// Everything a scan found
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub samples: Vec<String>,
    pub findings: Vec<Finding>,
    pub incompatibilities: Vec<IncompatibilityNote>,
    pub skipped: Vec<SkippedGlyph>,
}

/// Runs kink scans over a font with an injected interpolation engine
pub struct KinkScanner<'a, E> {
    font: &'a Font,
    engine: &'a E,
    config: &'a KinkConfig,
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

impl<'a, E: InterpolationEngine> KinkScanner<'a, E> {
    pub fn new(font: &'a Font, engine: &'a E, config: &'a KinkConfig) -> Self {
        Self {
            font,
            engine,
            config,
        }
    }

    /// Scan the configured glyphs (or every glyph, when none are configured)
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        self.scan_with_progress(|_| {})
    }

    /// Like [`scan`](Self::scan), calling `progress` before each glyph
    pub fn scan_with_progress<F>(&self, mut progress: F) -> Result<ScanReport, ScanError>
    where
        F: FnMut(ScanProgress<'_>),
    {
        if self.font.masters.is_empty() {
            return Err(ScanError::NoMasters(self.font.family_name.clone()));
        }

        let glyphs: &[String] = if self.config.glyphs.is_empty() {
            self.font.glyph_order()
        } else {
            &self.config.glyphs
        };

        let mut report = ScanReport::default();
        let samples = if self.config.in_masters() {
            Vec::new()
        } else {
            sampler::build_samples(self.font, self.config)
        };
        report.samples = if self.config.in_masters() {
            self.font.masters.iter().map(|m| m.name.clone()).collect()
        } else {
            samples.iter().map(|s| s.label.clone()).collect()
        };

        let total = glyphs.len();
        for (index, glyph) in glyphs.iter().enumerate() {
            progress(ScanProgress {
                index,
                total,
                glyph,
            });
            tracing::debug!("Scanning glyph {} ({}/{})", glyph, index + 1, total);

            if !self.font.contains_glyph(glyph) {
                report.skip(glyph, SkipReason::NotInFont);
                continue;
            }
            if self.config.exporting_only && !self.font.glyph_exports(glyph) {
                report.skip(glyph, SkipReason::NotExported);
                continue;
            }

            if self.config.in_masters() {
                self.scan_masters(glyph, &mut report);
            } else {
                self.scan_interpolations(glyph, &samples, &mut report);
            }
        }

        tracing::info!(
            "Scanned {} glyphs: {} kinks in {} glyphs, {} skipped",
            total,
            report.findings.len(),
            report.kinky_glyphs().len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Measure every candidate node of every master's own outline
    fn scan_masters(&self, glyph: &str, report: &mut ScanReport) {
        for master in &self.font.masters {
            let Some(outline) = master.glyph(glyph) else {
                continue;
            };
            for (path_index, contour) in outline.contours.iter().enumerate() {
                for node_index in 0..contour.len() {
                    if !contour.is_kink_candidate(node_index) {
                        continue;
                    }
                    let Some(kink) = kink_size(contour, node_index) else {
                        continue;
                    };
                    if kink <= self.config.max_kink_size {
                        continue;
                    }
                    report.findings.push(Finding {
                        glyph: glyph.to_string(),
                        path: path_index,
                        node: node_index,
                        position: contour.nodes[node_index].position,
                        deviation: kink,
                        samples: vec![master.name.clone()],
                        layer: Some(master.name.clone()),
                        master: Some(master.id.clone()),
                    });
                }
            }
        }
    }

    /// Compare the reference against every sample, node by node
    fn scan_interpolations(
        &self,
        glyph: &str,
        samples: &[SamplePosition],
        report: &mut ScanReport,
    ) {
        let Some(reference_position) = sampler::reference_position(self.font) else {
            return;
        };
        let reference = match self.engine.interpolate(glyph, &reference_position.blend) {
            Ok(outline) => outline,
            Err(InterpolationError::NoPaths(_)) => {
                report.skip(glyph, SkipReason::NoPaths);
                return;
            }
            Err(e) => {
                tracing::warn!("Could not determine primary layer of {}: {}", glyph, e);
                report.skip(glyph, SkipReason::Unresolvable(e.to_string()));
                return;
            }
        };

        let sampled: Vec<(&SamplePosition, Outline)> = samples
            .iter()
            .filter_map(|sample| match self.materialise(glyph, &reference, sample) {
                Ok(outline) => Some((sample, outline)),
                Err(reason) => {
                    tracing::debug!("{}: skipping sample {}: {}", glyph, sample.label, reason);
                    report.incompatibilities.push(IncompatibilityNote {
                        glyph: glyph.to_string(),
                        sample: sample.label.clone(),
                        reason,
                    });
                    None
                }
            })
            .collect();

        for (path_index, contour) in reference.contours.iter().enumerate() {
            for node_index in 0..contour.len() {
                if !contour.is_kink_candidate(node_index) {
                    continue;
                }

                let mut max_kink = 0.0;
                let mut contributing = Vec::new();
                for (sample, outline) in &sampled {
                    let Some(kink) = kink_size(&outline.contours[path_index], node_index) else {
                        continue;
                    };
                    if kink > self.config.max_kink_size {
                        max_kink = f64::max(max_kink, kink);
                        contributing.push(sample.label.clone());
                    }
                }

                if !contributing.is_empty() {
                    report.findings.push(Finding {
                        glyph: glyph.to_string(),
                        path: path_index,
                        node: node_index,
                        position: contour.nodes[node_index].position,
                        deviation: max_kink,
                        samples: contributing,
                        layer: None,
                        master: None,
                    });
                }
            }
        }
    }

    /// Outline at `sample`, if it can be compared with `reference`
    fn materialise(
        &self,
        glyph: &str,
        reference: &Outline,
        sample: &SamplePosition,
    ) -> Result<Outline, String> {
        let outline = self
            .engine
            .interpolate(glyph, &sample.blend)
            .map_err(|e| format!("could not calculate interpolation: {e}"))?;
        reference
            .check_compatible(&outline)
            .map_err(|e| format!("interpolation incompatible: {e}"))?;
        Ok(outline)
    }
}

/// Deviation of the node at `index` from the chord through its neighbours
fn kink_size(contour: &Contour, index: usize) -> Option<f64> {
    let (prev, node, next) = contour.triplet(index)?;
    Some(orthogonal_distance(
        node.position,
        prev.position,
        next.position,
    ))
}

impl ScanReport {
    fn skip(&mut self, glyph: &str, reason: SkipReason) {
        self.skipped.push(SkippedGlyph {
            glyph: glyph.to_string(),
            reason,
        });
    }

    /// Glyphs with at least one finding, in the order they were found
    pub fn kinky_glyphs(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.findings
            .iter()
            .map(|finding| finding.glyph.as_str())
            .filter(|glyph| seen.insert(*glyph))
            .collect()
    }

    /// (glyph, master) pairs with findings, in masters mode
    pub fn kinky_layers(&self) -> Vec<(&str, &MasterId)> {
        let mut seen = HashSet::new();
        self.findings
            .iter()
            .filter_map(|finding| Some((finding.glyph.as_str(), finding.master.as_ref()?)))
            .filter(|key| seen.insert(*key))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleMode;
    use crate::interpolation::LinearInterpolator;
    use crate::model::font::Master;
    use crate::model::outline::Node;

    /// Closed path: corner (0,0), smooth mid-bottom node, then corners.
    fn bar(mid_y: f64) -> Outline {
        Outline::new(vec![Contour::closed(vec![
            Node::corner(0.0, 0.0),
            Node::smooth(100.0, mid_y),
            Node::corner(200.0, 0.0),
            Node::corner(200.0, 100.0),
            Node::corner(0.0, 100.0),
        ])])
    }

    fn two_master_font(light: Outline, bold: Outline) -> Font {
        Font::new("Test")
            .with_master(Master::new("light", "Light").with_glyph("a", light))
            .with_master(Master::new("bold", "Bold").with_glyph("a", bold))
    }

    fn config(threshold: f64, mode: SampleMode) -> KinkConfig {
        KinkConfig {
            max_kink_size: threshold,
            mode,
            grid_length: 0.0,
            ..KinkConfig::default()
        }
    }

    fn scan(font: &Font, config: &KinkConfig) -> ScanReport {
        let engine = LinearInterpolator::new(font).with_grid(config.grid_length);
        KinkScanner::new(font, &engine, config).scan().unwrap()
    }

    /// Returns `reference` for the first master alone and `halfway` for anything else
    struct FixedEngine {
        reference: Outline,
        halfway: Option<Outline>,
    }

    impl InterpolationEngine for FixedEngine {
        fn interpolate(
            &self,
            _glyph: &str,
            blend: &crate::model::font::Blend,
        ) -> Result<Outline, InterpolationError> {
            if blend.weight(&crate::model::font::MasterId::new("light")) == 1.0 {
                Ok(self.reference.clone())
            } else {
                self.halfway
                    .clone()
                    .ok_or_else(|| InterpolationError::NoPaths("a".to_string()))
            }
        }
    }

    #[test]
    fn uniform_geometry_has_no_findings() {
        let font = two_master_font(bar(0.0), bar(0.0));
        let report = scan(&font, &config(0.5, SampleMode::AllMasterPairs));
        assert!(report.is_clean());
        assert!(report.incompatibilities.is_empty());
        assert_eq!(report.samples, vec!["Light/Bold"]);
    }

    #[test]
    fn kink_just_above_threshold_is_found() {
        let threshold = 10.0;
        let epsilon = 0.25;
        // Halfway between 0 and 2 * (threshold + epsilon).
        let font = two_master_font(bar(0.0), bar(2.0 * (threshold + epsilon)));
        let report = scan(&font, &config(threshold, SampleMode::AllMasterPairs));

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!((finding.path, finding.node), (0, 1));
        assert!((finding.deviation - (threshold + epsilon)).abs() < 1e-9);
        assert_eq!(finding.samples, vec!["Light/Bold"]);
        assert_eq!(finding.position, Point::new(100.0, 0.0));
        assert_eq!(report.kinky_glyphs(), vec!["a"]);
    }

    #[test]
    fn kink_equal_to_threshold_is_not_found() {
        let font = two_master_font(bar(0.0), bar(20.0));
        let report = scan(&font, &config(10.0, SampleMode::AllMasterPairs));
        assert!(report.is_clean());
    }

    #[test]
    fn moved_node_reports_its_deviation() {
        // The middle node moves 50 units off the chord of its neighbours.
        let engine = FixedEngine {
            reference: bar(0.0),
            halfway: Some(bar(50.0)),
        };
        let font = two_master_font(bar(0.0), bar(100.0));
        let cfg = config(10.0, SampleMode::AllMasterPairs);
        let report = KinkScanner::new(&font, &engine, &cfg).scan().unwrap();

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!((finding.path, finding.node), (0, 1));
        assert!((finding.deviation - 50.0).abs() < 1e-9);
    }

    #[test]
    fn corners_and_handles_are_never_reported() {
        let outline = |y: f64| {
            Outline::new(vec![Contour::closed(vec![
                Node::corner(0.0, 0.0),
                Node::off_curve(50.0, y),
                Node::off_curve(150.0, y),
                Node::corner(200.0, y),
                Node::corner(100.0, 300.0),
            ])])
        };
        let font = two_master_font(outline(0.0), outline(400.0));
        let report = scan(&font, &config(0.0, SampleMode::AllMasterPairs));
        assert!(report.is_clean());

        let report = scan(&font, &config(0.0, SampleMode::Masters));
        assert!(report.is_clean());
    }

    #[test]
    fn open_path_endpoints_are_never_reported() {
        let outline = |y: f64| {
            Outline::new(vec![Contour::open(vec![
                Node::smooth(0.0, y),
                Node::smooth(100.0, 0.0),
                Node::smooth(200.0, y),
            ])])
        };
        let font = two_master_font(outline(0.0), outline(300.0));

        let report = scan(&font, &config(1.0, SampleMode::Masters));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].node, 1);
        assert_eq!(report.findings[0].layer.as_deref(), Some("Bold"));

        let report = scan(&font, &config(1.0, SampleMode::AllMasterPairs));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].node, 1);
        assert!((report.findings[0].deviation - 150.0).abs() < 1e-9);
    }

    #[test]
    fn incompatible_sample_is_skipped() {
        let mut broken = bar(0.0);
        broken.contours[0].nodes.pop();
        let font = Font::new("Test")
            .with_master(Master::new("light", "Light").with_glyph("a", bar(0.0)))
            .with_master(Master::new("broken", "Broken").with_glyph("a", broken))
            .with_master(Master::new("bold", "Bold").with_glyph("a", bar(60.0)));

        let report = scan(&font, &config(10.0, SampleMode::AllMasterPairs));

        // Light/Broken and Broken/Bold fail, Light/Bold is still measured.
        assert_eq!(report.incompatibilities.len(), 2);
        assert!(
            report
                .incompatibilities
                .iter()
                .all(|note| note.sample.contains("Broken"))
        );
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].samples, vec!["Light/Bold"]);
        assert!((report.findings[0].deviation - 30.0).abs() < 1e-9);
    }

    #[test]
    fn structurally_different_sample_is_incompatible() {
        let mut extra = bar(30.0);
        extra.contours.push(Contour::closed(vec![Node::corner(0.0, 0.0)]));
        let engine = FixedEngine {
            reference: bar(0.0),
            halfway: Some(extra),
        };
        let font = two_master_font(bar(0.0), bar(0.0));
        let cfg = config(1.0, SampleMode::AllMasterPairs);
        let report = KinkScanner::new(&font, &engine, &cfg).scan().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.incompatibilities.len(), 1);
        assert!(report.incompatibilities[0].reason.contains("incompatible"));

        let engine = FixedEngine {
            reference: bar(0.0),
            halfway: None,
        };
        let report = KinkScanner::new(&font, &engine, &cfg).scan().unwrap();
        assert!(
            report.incompatibilities[0]
                .reason
                .contains("could not calculate interpolation")
        );
    }

    #[test]
    fn maximum_deviation_over_samples_is_kept() {
        let font = Font::new("Test")
            .with_master(Master::new("a", "A").with_glyph("a", bar(0.0)))
            .with_master(Master::new("b", "B").with_glyph("a", bar(40.0)))
            .with_master(Master::new("c", "C").with_glyph("a", bar(100.0)));
        let report = scan(&font, &config(10.0, SampleMode::AllMasterPairs));

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        // A/B = 20, A/C = 50, B/C = 70.
        assert_eq!(finding.samples, vec!["A/B", "A/C", "B/C"]);
        assert!((finding.deviation - 70.0).abs() < 1e-9);
    }

    #[test]
    fn masters_mode_with_colinear_neighbours_is_clean() {
        let font =
            Font::new("Test").with_master(Master::new("m", "Regular").with_glyph("a", bar(0.0)));
        let report = scan(&font, &config(0.1, SampleMode::Masters));
        assert!(report.is_clean());
        assert_eq!(report.samples, vec!["Regular"]);
    }

    #[test]
    fn masters_mode_reports_layers() {
        let font = two_master_font(bar(0.0), bar(25.0));
        let report = scan(&font, &config(5.0, SampleMode::Masters));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].layer.as_deref(), Some("Bold"));
        assert_eq!(report.findings[0].position, Point::new(100.0, 25.0));
        let bold = MasterId::new("bold");
        assert_eq!(report.kinky_layers(), vec![("a", &bold)]);
    }

    #[test]
    fn masters_sharing_a_name_stay_apart() {
        let font = Font::new("Test")
            .with_master(Master::new("0:Narrow", "Regular").with_glyph("a", bar(0.0)))
            .with_master(Master::new("1:Wide", "Regular").with_glyph("a", bar(30.0)))
            .with_master(Master::new("2:Wide Bold", "Regular").with_glyph("a", bar(40.0)));
        let report = scan(&font, &config(5.0, SampleMode::Masters));

        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].master, Some(MasterId::new("1:Wide")));
        assert_eq!(report.findings[1].master, Some(MasterId::new("2:Wide Bold")));
        let wide = MasterId::new("1:Wide");
        let wide_bold = MasterId::new("2:Wide Bold");
        assert_eq!(report.kinky_layers(), vec![("a", &wide), ("a", &wide_bold)]);
    }

    #[test]
    fn kinky_glyphs_are_unique_in_order() {
        let font = Font::new("Test")
            .with_master(
                Master::new("light", "Light")
                    .with_glyph("b", bar(0.0))
                    .with_glyph("a", bar(0.0)),
            )
            .with_master(
                Master::new("bold", "Bold")
                    .with_glyph("b", bar(50.0))
                    .with_glyph("a", bar(50.0)),
            );
        let mut cfg = config(5.0, SampleMode::Masters);
        cfg.glyphs = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let report = scan(&font, &cfg);

        assert_eq!(report.findings.len(), 3);
        assert_eq!(report.kinky_glyphs(), vec!["b", "a"]);
    }

    #[test]
    fn unusable_glyphs_are_skipped() {
        let mut font = Font::new("Test")
            .with_master(
                Master::new("light", "Light")
                    .with_glyph("a", bar(0.0))
                    .with_glyph("space", Outline::default())
                    .with_glyph("_hidden", bar(0.0)),
            )
            .with_master(
                Master::new("bold", "Bold")
                    .with_glyph("a", bar(0.0))
                    .with_glyph("space", Outline::default())
                    .with_glyph("_hidden", bar(0.0)),
            );
        font.set_non_exporting(["_hidden".to_string()]);

        let mut cfg = config(1.0, SampleMode::AllMasterPairs);
        cfg.glyphs = vec!["space".into(), "_hidden".into(), "missing".into(), "a".into()];
        let report = scan(&font, &cfg);

        assert_eq!(
            report.skipped,
            vec![
                SkippedGlyph {
                    glyph: "space".into(),
                    reason: SkipReason::NoPaths
                },
                SkippedGlyph {
                    glyph: "_hidden".into(),
                    reason: SkipReason::NotExported
                },
                SkippedGlyph {
                    glyph: "missing".into(),
                    reason: SkipReason::NotInFont
                },
            ]
        );

        cfg.exporting_only = false;
        let report = scan(&font, &cfg);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn glyph_missing_in_first_master_is_unresolvable() {
        let font = Font::new("Test")
            .with_master(Master::new("light", "Light"))
            .with_master(Master::new("bold", "Bold").with_glyph("a", bar(0.0)));
        let report = scan(&font, &config(1.0, SampleMode::AllMasterPairs));
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Unresolvable(_)
        ));
    }

    #[test]
    fn font_without_masters_aborts() {
        let font = Font::new("Empty");
        let cfg = KinkConfig::default();
        let engine = LinearInterpolator::new(&font);
        let result = KinkScanner::new(&font, &engine, &cfg).scan();
        assert_eq!(result.unwrap_err(), ScanError::NoMasters("Empty".to_string()));
    }

    #[test]
    fn progress_is_reported_per_glyph() {
        let font = Font::new("Test").with_master(
            Master::new("m", "Regular")
                .with_glyph("a", bar(0.0))
                .with_glyph("b", bar(0.0)),
        );
        let cfg = config(1.0, SampleMode::Masters);
        let engine = LinearInterpolator::new(&font);
        let mut seen = Vec::new();
        KinkScanner::new(&font, &engine, &cfg)
            .scan_with_progress(|p| seen.push((p.index, p.total, p.glyph.to_string())))
            .unwrap();
        assert_eq!(
            seen,
            vec![(0, 2, "a".to_string()), (1, 2, "b".to_string())]
        );
    }
}
