// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planner configuration
//!
//! Every field has a default, so a partial `laminate.toml` only needs the
//! values it changes. Lookup order: defaults, the file, then environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up inside an input directory
pub const CONFIG_FILE_NAME: &str = "laminate.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub geometry: GeometryConfig,
    pub joints: JointsConfig,
    pub plan: PlanConfig,
    pub io: IoConfig,
}

/// Numeric tolerances of the geometry container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Cleanup epsilon; slivers thinner than twice this vanish
    pub small_dim: f64,
    /// Polygons below this area (mm²) are dropped by cleanup
    pub min_area: f64,
    /// Segments used to approximate circles
    pub circle_segments: usize,
    /// Buffer applied to the outer polygon when testing containment
    pub containment_tolerance: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            small_dim: 0.001,
            min_area: 1e-4,
            circle_segments: 64,
            containment_tolerance: 0.001,
        }
    }
}

/// Joint generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointsConfig {
    /// Flexure width
    pub width: f64,
    /// Length offset added to every flexure
    pub length_offset: f64,
    /// Width of the mask that shields joints from body kerfs
    pub mask_width: f64,
    /// Buffer and end trim used when locating joint segments
    pub trim_epsilon: f64,
    pub stamp_tooth_length: f64,
    /// Footprint width of a bend joint, as a multiple of `width`
    pub bend_widen: f64,
    pub bend_rib_width: f64,
    /// Rib length across the axis, as a multiple of `width`
    pub bend_rib_factor: f64,
    pub dashed_tooth_length: f64,
    pub dashed_gap: f64,
    pub dashed_pad: f64,
    pub dashed_slot_width: f64,
}

impl Default for JointsConfig {
    fn default() -> Self {
        Self {
            width: 1.5,
            length_offset: 0.0,
            mask_width: 0.5,
            trim_epsilon: 0.01,
            stamp_tooth_length: 1.0,
            bend_widen: 3.0,
            bend_rib_width: 0.5,
            bend_rib_factor: 2.0,
            dashed_tooth_length: 2.0,
            dashed_gap: 1.0,
            dashed_pad: 0.5,
            dashed_slot_width: 0.2,
        }
    }
}

/// Manufacturability planning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Laser kerf, also used as body separation width
    pub kerf: f64,
    /// Safety clearance around non-removable material
    pub clearance: f64,
    pub jig_diameter: f64,
    pub jig_hole_spacing: f64,
    pub support_width: f64,
    pub support_offset: f64,
    /// Layers that get their own single-layer release pass.
    /// `None` picks the middle layer of stacks with three or more layers.
    pub thin_layers: Option<Vec<usize>>,
    /// Adhesive layer indices. `None` means every odd layer.
    pub adhesive_layers: Option<Vec<usize>>,
    pub labels: bool,
    pub label_dot: bool,
    pub label_tick_width: f64,
    pub label_tick_height: f64,
    pub label_tick_pitch: f64,
    pub label_dot_diameter: f64,
    /// Single-layer regions below this area are ignored
    pub min_cut_area: f64,
    /// Opening radius that strips thin slivers from single-layer regions
    pub sliver: f64,
    /// Growth applied to single-layer regions before splitting the passes
    pub single_layer_margin: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            kerf: 0.1,
            clearance: 0.1,
            jig_diameter: 5.0,
            jig_hole_spacing: 20.0,
            support_width: 0.1,
            support_offset: 0.0,
            thin_layers: None,
            adhesive_layers: None,
            labels: true,
            label_dot: false,
            label_tick_width: 0.5,
            label_tick_height: 2.0,
            label_tick_pitch: 1.0,
            label_dot_diameter: 1.0,
            min_cut_area: 0.01,
            sliver: 0.01,
            single_layer_margin: 0.5,
        }
    }
}

impl PlanConfig {
    /// Thin layers for a stack of `layers`, configured or defaulted
    pub fn thin_layers_for(&self, layers: usize) -> Vec<usize> {
        match &self.thin_layers {
            Some(list) => list.iter().copied().filter(|&i| i < layers).collect(),
            None if layers >= 3 => vec![layers / 2],
            None => Vec::new(),
        }
    }

    /// Adhesive flags for a stack of `layers`
    pub fn adhesive_mask(&self, layers: usize) -> Vec<bool> {
        match &self.adhesive_layers {
            Some(list) => (0..layers).map(|i| list.contains(&i)).collect(),
            None => (0..layers).map(|i| i % 2 == 1).collect(),
        }
    }
}

/// Input and output file handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Scale applied to DXF coordinates on import
    pub dxf_scale: f64,
    pub layers_table: String,
    pub joints_table: String,
    /// Output stem of the layer layout drawing
    pub layers_file: String,
    /// Output stem of the release cut drawing
    pub release_file: String,
    /// Vertical gap between laid out layers, relative to their height
    pub gap_ratio: f64,
    pub preview_file: String,
    pub report_file: String,
    /// Longest preview edge in pixels
    pub preview_size: u32,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            dxf_scale: 1.0,
            layers_table: "layers.csv".to_string(),
            joints_table: "rev_joints.csv".to_string(),
            layers_file: "leg_layers".to_string(),
            release_file: "leg_release".to_string(),
            gap_ratio: 0.1,
            preview_file: "preview.png".to_string(),
            report_file: "plan_report.json".to_string(),
            preview_size: 1600,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `laminate.toml` from `dir` when present, then apply environment
    /// variable overrides
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `LAMINATE_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kerf) = lookup("LAMINATE_KERF") {
            self.plan.kerf = parse_env("LAMINATE_KERF", &kerf)?;
        }

        if let Some(width) = lookup("LAMINATE_JOINT_WIDTH") {
            self.joints.width = parse_env("LAMINATE_JOINT_WIDTH", &width)?;
        }

        if let Some(thin) = lookup("LAMINATE_THIN_LAYERS") {
            let layers = thin
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_env("LAMINATE_THIN_LAYERS", s))
                .collect::<Result<Vec<usize>>>()?;
            self.plan.thin_layers = Some(layers);
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    /// Reject values that would make the geometry meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("plan.kerf", self.plan.kerf),
            ("plan.jig_diameter", self.plan.jig_diameter),
            ("plan.jig_hole_spacing", self.plan.jig_hole_spacing),
            ("joints.width", self.joints.width),
            ("joints.mask_width", self.joints.mask_width),
            ("joints.trim_epsilon", self.joints.trim_epsilon),
            ("io.dxf_scale", self.io.dxf_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.geometry.circle_segments < 8 {
            return Err(Error::Config("geometry.circle_segments must be at least 8".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PlannerConfig = toml::from_str("[plan]\nkerf = 0.2\n").unwrap();
        assert_eq!(config.plan.kerf, 0.2);
        assert_eq!(config.plan.jig_diameter, 5.0);
        assert_eq!(config.joints.width, 1.5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LAMINATE_KERF", "0.15"),
            ("LAMINATE_THIN_LAYERS", "1, 3"),
        ]
        .into_iter()
        .collect();
        let mut config = PlannerConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.plan.kerf, 0.15);
        assert_eq!(config.plan.thin_layers, Some(vec![1, 3]));
        assert_eq!(config.joints.width, 1.5);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = PlannerConfig::default();
        let result = config.apply_env_overrides(|k| {
            (k == "LAMINATE_JOINT_WIDTH").then(|| "wide".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_thin_layer_default() {
        let plan = PlanConfig::default();
        assert_eq!(plan.thin_layers_for(5), vec![2]);
        assert!(plan.thin_layers_for(1).is_empty());
        assert_eq!(plan.adhesive_mask(5), vec![false, true, false, true, false]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = PlannerConfig::default();
        config.plan.thin_layers = Some(vec![2]);
        config.save(&path).unwrap();
        let loaded = PlannerConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.plan.thin_layers, Some(vec![2]));
    }
}
