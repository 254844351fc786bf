// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Reporting sinks for scan results.
//!
//! A [`ReportSink`] receives the finished [`ScanReport`] plus the planned
//! marks. [`TextReport`] writes a human readable log, [`JsonReport`] a
//! machine readable document.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::config::KinkConfig;
use crate::marking::Mark;
use crate::model::font::Font;
use crate::scanner::{Finding, IncompatibilityNote, ScanReport, SkippedGlyph};
use crate::settings;

/// Destination of a finished scan
pub trait ReportSink {
    fn report(
        &mut self,
        font: &Font,
        config: &KinkConfig,
        report: &ScanReport,
        marks: &[Mark],
    ) -> Result<()>;
}

/// Round to one decimal, the precision deviations are reported in
pub fn round_deviation(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// TEXT
// ============================================================================

/// Plain text report, one line per kink
pub struct TextReport<W> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn finding_line(&mut self, finding: &Finding) -> std::io::Result<()> {
        let marker = settings::report::NODE_MARKER;
        match &finding.layer {
            Some(layer) => writeln!(
                self.out,
                "{} Kink in {} on layer '{}', path {}, node {}: {:.1} units",
                marker, finding.glyph, layer, finding.path, finding.node, finding.deviation
            ),
            None => writeln!(
                self.out,
                "{} Kink in {} at {}, path {}, node {}: {:.1} units ({:.1}, {:.1})",
                marker,
                finding.glyph,
                finding.samples.join(", "),
                finding.path,
                finding.node,
                finding.deviation,
                finding.position.x,
                finding.position.y
            ),
        }
    }

    fn incompatibility_line(&mut self, note: &IncompatibilityNote) -> std::io::Result<()> {
        writeln!(
            self.out,
            "⚠️ {} in {}: {} (most likely cause: cap or corner components, bracket layers)",
            note.glyph, note.sample, note.reason
        )
    }

    fn closing_lines(
        &mut self,
        font: &Font,
        config: &KinkConfig,
        report: &ScanReport,
    ) -> std::io::Result<()> {
        let layers = report.kinky_layers();
        let glyphs = report.kinky_glyphs();

        if !layers.is_empty() {
            let layers: Vec<String> = layers
                .iter()
                .map(|(glyph, id)| match font.master(id) {
                    Some(master) => format!("{glyph} ({})", master.name),
                    None => format!("{glyph} ({id})"),
                })
                .collect();
            writeln!(self.out, "\nKinky layers: {}", layers.join(", "))
        } else if !glyphs.is_empty() {
            writeln!(self.out, "\n/{}", glyphs.join("/"))
        } else {
            let scope = if config.in_masters() {
                "master layers"
            } else {
                "interpolations"
            };
            writeln!(
                self.out,
                "\nNo kinks found 🎉 Could not find any kinks larger than {:.1} units in {} of {}.",
                config.max_kink_size, scope, font.family_name
            )
        }
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn report(
        &mut self,
        font: &Font,
        config: &KinkConfig,
        report: &ScanReport,
        marks: &[Mark],
    ) -> Result<()> {
        for finding in &report.findings {
            self.finding_line(finding)
                .context("Failed to write finding")?;
        }

        if config.report_incompatibilities {
            for note in &report.incompatibilities {
                self.incompatibility_line(note)
                    .context("Failed to write incompatibility")?;
            }
        }

        if !report.skipped.is_empty() {
            let names: Vec<&str> = report.skipped.iter().map(|s| s.glyph.as_str()).collect();
            writeln!(
                self.out,
                "\nSkipped {} glyphs:\n{}",
                report.skipped.len(),
                names.join(", ")
            )?;
        }

        if !marks.is_empty() {
            writeln!(self.out, "\nPlanned {} node marks", marks.len())?;
        }

        self.closing_lines(font, config, report)
            .context("Failed to write report summary")?;
        self.out.flush()?;
        Ok(())
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON report written in one go
pub struct JsonReport<W> {
    out: W,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    family: &'a str,
    mode: String,
    max_kink_size: f64,
    samples: &'a [String],
    findings: Vec<Finding>,
    kinky_glyphs: Vec<&'a str>,
    incompatibilities: &'a [IncompatibilityNote],
    skipped: &'a [SkippedGlyph],
    marks: &'a [Mark],
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn report(
        &mut self,
        font: &Font,
        config: &KinkConfig,
        report: &ScanReport,
        marks: &[Mark],
    ) -> Result<()> {
        let findings = report
            .findings
            .iter()
            .map(|finding| Finding {
                deviation: round_deviation(finding.deviation),
                ..finding.clone()
            })
            .collect();

        let document = JsonDocument {
            family: &font.family_name,
            mode: config.mode.to_string(),
            max_kink_size: config.max_kink_size,
            samples: &report.samples,
            findings,
            kinky_glyphs: report.kinky_glyphs(),
            incompatibilities: &report.incompatibilities,
            skipped: &report.skipped,
            marks,
        };

        serde_json::to_writer_pretty(&mut self.out, &document)
            .context("Failed to serialize JSON report")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
