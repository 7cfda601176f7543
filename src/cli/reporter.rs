// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::kernel::{Outcome, Written};
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a finished planning run
    pub fn report_plan(dir: &Path, outcome: &Outcome, written: &Written, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Planned:".bold(), dir.display().to_string().cyan());
        println!("{}", "━".repeat(80).bright_black());

        let joints = &outcome.input.joints;
        let segments: usize = joints.iter().map(|j| j.segments.len()).sum();
        Self::print_field("Layers", outcome.device.layer_count().to_string());
        Self::print_field("Components", outcome.input.components.len().to_string());
        Self::print_field("Joints", format!("{} ({} segments)", joints.len(), segments));
        Self::print_field(
            "Device area",
            format!("{:.3}", outcome.device.laminate.total_area()),
        );

        let release = &outcome.plan.release;
        let passes = release.passes();
        Self::print_field(
            "Release",
            format!(
                "{} segments in {} passes",
                release.segments.len(),
                passes.len()
            ),
        );
        for pass in &release.single_layer {
            println!(
                "    {} layer {} ({} cuts)",
                "↳".bright_black(),
                pass.layer,
                pass.cuts.len()
            );
        }

        println!("\n{}", "Written:".bold());
        let mut files = vec![&written.layers, &written.release, &written.report];
        if let Some(preview) = &written.preview {
            files.push(preview);
        }
        for file in files {
            println!("  {}", file.display().to_string().bright_black());
        }

        if !outcome.warnings.is_empty() {
            println!(
                "\n{} {}",
                "Warnings:".yellow().bold(),
                outcome.warnings.len()
            );
            for warning in &outcome.warnings {
                println!("  {} {}", "•".yellow(), warning);
            }
        }

        println!(
            "\n  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    fn print_field(name: &str, value: String) {
        println!(
            "  {} {}",
            format!("{}:", name).bright_black(),
            value.cyan()
        );
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
