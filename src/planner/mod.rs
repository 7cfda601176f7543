// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Manufacturability planning
//!
//! Takes the assembled device and works out what stays in the sheet until
//! release: the web of removable scrap, the support around the keepout, jig
//! holes and labels, and the classified release cuts.

pub mod fixtures;
pub mod reachability;
pub mod release;

pub use fixtures::Fixtures;
pub use reachability::{not_removable_down, not_removable_up, Reachability};
pub use release::{Isolation, ReleaseCuts, SingleLayerPass};

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::geometry::{Laminate, Layer};
use serde::Serialize;
use tracing::{debug, info};

/// Everything the exporter needs, plus intermediate masks for inspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub reachability: Reachability,
    pub fixtures: Fixtures,
    pub web: Laminate,
    pub keepout: Laminate,
    pub support: Laminate,
    pub supported: Laminate,
    /// Per-layer geometry written to the layer drawing
    pub layers_cut: Laminate,
    pub release_scrap: Laminate,
    pub material_cut: Laminate,
    pub release: ReleaseCuts,
}

impl Plan {
    pub fn layer_count(&self) -> usize {
        self.layers_cut.len()
    }
}

/// Plan the cuts for `device`. `keepout_mask` adds a region the laser must
/// never cross on top of the device footprint.
pub fn plan(
    device: &Laminate,
    config: &PlannerConfig,
    keepout_mask: Option<&Layer>,
) -> Result<Plan> {
    let layers = device.len();
    let plan_cfg = &config.plan;
    let geometry = &config.geometry;
    let tidy = (geometry.small_dim, geometry.min_area);
    info!(layers, "planning cuts");

    let fixtures = Fixtures::build(device, plan_cfg, geometry.circle_segments)?;
    let sheet = fixtures.sheet.to_laminate(layers);
    let jig_holes = fixtures.jig_holes.to_laminate(layers);

    let adhesive = plan_cfg.adhesive_mask(layers);
    let reachability = Reachability::compute(device, &adhesive)?;
    let scrap = sheet.difference(device)?;
    let removable_up = scrap.difference(&reachability.up.dilate(plan_cfg.clearance))?;
    let removable_down = scrap.difference(&reachability.down.dilate(plan_cfg.clearance))?;
    let web = removable_up.union(&removable_down)?.difference(&jig_holes)?;
    debug!(area = web.total_area(), "web computed");

    let keepout = release::keepout(device, keepout_mask)?;
    let support = release::support(
        device,
        &keepout,
        plan_cfg.support_width,
        plan_cfg.support_offset,
        tidy,
    )?;
    let supported = web
        .union(device)?
        .union(&support)?
        .cleanup(tidy.0, tidy.1);
    let layers_cut = supported.difference(&fixtures.labels)?;

    let release_scrap = sheet.difference(&keepout)?.difference(&fixtures.labels)?;
    let material_cut = release::material_cut(&supported, &release_scrap, plan_cfg.kerf)?;

    let segments = match (sheet.layers().first(), keepout.layers().first()) {
        (Some(sheet), Some(keepout)) => release::release_segments(sheet, keepout)?,
        _ => Vec::new(),
    };
    let isolation = Isolation {
        min_area: plan_cfg.min_cut_area,
        sliver: plan_cfg.sliver,
        margin: plan_cfg.single_layer_margin,
    };
    let regions = plan_cfg
        .thin_layers_for(layers)
        .into_iter()
        .map(|t| -> Result<(usize, Layer)> {
            Ok((t, release::single_layer_region(&material_cut, t, isolation)?))
        })
        .collect::<Result<Vec<_>>>()?;
    let release = ReleaseCuts::classify(segments, regions)?;
    info!(
        segments = release.segments.len(),
        full_stack = release.full_stack.len(),
        passes = release.passes().len(),
        "release cut classified"
    );

    Ok(Plan {
        reachability,
        fixtures,
        web,
        keepout,
        support,
        supported,
        layers_cut,
        release_scrap,
        material_cut,
        release,
    })
}
