// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! JSON summary of a planning run

use crate::assembler::Device;
use crate::input::ResolvedInput;
use crate::planner::Plan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    pub name: String,
    /// Thin layer the pass belongs to; `None` for the full-stack pass
    pub layer: Option<usize>,
    pub segments: usize,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub layers: usize,
    pub components: usize,
    pub joints: usize,
    pub joint_segments: usize,
    pub device_area: Vec<f64>,
    pub web_area: f64,
    pub release_segments: usize,
    pub passes: Vec<PassSummary>,
    pub warnings: Vec<String>,
}

impl PlanReport {
    pub fn new(input: &ResolvedInput, device: &Device, plan: &Plan, warnings: &[String]) -> Self {
        let full = std::iter::once((None, &plan.release.full_stack));
        let singles = plan
            .release
            .single_layer
            .iter()
            .map(|p| (Some(p.layer), &p.cuts));
        let passes = full
            .chain(singles)
            .enumerate()
            .map(|(k, (layer, cuts))| PassSummary {
                name: super::exporter::pass_name(k),
                layer,
                segments: cuts.len(),
                length: cuts.iter().map(|s| s.length()).sum(),
            })
            .collect();

        Self {
            layers: device.layer_count(),
            components: input.components.len(),
            joints: input.joints.len(),
            joint_segments: input.joints.iter().map(|j| j.segments.len()).sum(),
            device_area: device.laminate.iter().map(|l| l.area()).collect(),
            web_area: plan.web.total_area(),
            release_segments: plan.release.segments.len(),
            passes,
            warnings: warnings.to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
