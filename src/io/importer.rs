// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Device directory importer
//!
//! A device directory holds the layer table, the joint table and one DXF per
//! (layer, component) pair named `{layer}_{component}.dxf`.

use super::dxf::{parse_dxf, DxfDrawing};
use super::tables::{read_joint_table, read_layer_table};
use crate::config::IoConfig;
use crate::error::{Error, Result};
use crate::input::{Circle, Component, DeviceInput, Footprint};
use nalgebra::Point2;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn outline_path(dir: &Path, layer: usize, component: &str) -> PathBuf {
    dir.join(format!("{}_{}.dxf", layer, component))
}

/// Read one component outline file
pub fn import_footprint(path: impl AsRef<Path>, scale: f64) -> Result<(Footprint, Vec<String>)> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let drawing = parse_dxf(&source).map_err(|reason| Error::Dxf {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(footprint_from_drawing(&drawing, scale, &path.display().to_string()))
}

/// Closed polylines become outlines and circles become holes
pub fn footprint_from_drawing(
    drawing: &DxfDrawing,
    scale: f64,
    source: &str,
) -> (Footprint, Vec<String>) {
    let mut warnings = Vec::new();
    let scaled = |p: &Point2<f64>| Point2::new(p.x * scale, p.y * scale);

    let mut outlines = Vec::new();
    for poly in &drawing.polylines {
        if !poly.closed || poly.points.len() < 3 {
            let message = format!(
                "{}: ignoring open polyline with {} vertices",
                source,
                poly.points.len()
            );
            warn!("{}", message);
            warnings.push(message);
            continue;
        }
        outlines.push(poly.points.iter().map(scaled).collect());
    }

    let holes = drawing
        .circles
        .iter()
        .map(|c| Circle::new(scaled(&c.center), c.radius * scale))
        .collect();

    if !drawing.skipped.is_empty() {
        debug!(source, skipped = ?drawing.skipped, "unsupported DXF entities skipped");
    }

    (Footprint { outlines, holes }, warnings)
}

/// Read the tables and every outline file of a device directory
pub fn import_device(
    dir: impl AsRef<Path>,
    config: &IoConfig,
) -> Result<(DeviceInput, Vec<String>)> {
    let dir = dir.as_ref();
    let table = read_layer_table(dir.join(&config.layers_table))?;
    let joints = read_joint_table(dir.join(&config.joints_table))?;

    let wanted: Vec<(String, usize)> = table
        .component_names()
        .flat_map(|name| {
            table
                .layers_of(name)
                .iter()
                .map(move |&layer| (name.to_string(), layer))
        })
        .collect();

    let loaded = wanted
        .par_iter()
        .map(|(name, layer)| {
            let path = outline_path(dir, *layer, name);
            import_footprint(&path, config.dxf_scale).map(|(f, w)| (name, *layer, f, w))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut components: BTreeMap<String, Component> = BTreeMap::new();
    let mut warnings = Vec::new();
    for (name, layer, footprint, footprint_warnings) in loaded {
        warnings.extend(footprint_warnings);
        components
            .entry(name.clone())
            .or_insert_with(|| Component::new(name.clone()))
            .layers
            .insert(layer, footprint);
    }

    debug!(
        layers = table.len(),
        components = components.len(),
        joints = joints.len(),
        "device imported"
    );
    Ok((
        DeviceInput {
            table,
            components,
            joints,
        },
        warnings,
    ))
}
