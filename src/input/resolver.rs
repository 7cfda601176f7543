// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Joint placement: which layer a joint sits in and where its two
//! components overlap along the joint axis

use super::{Component, DeviceInput, Joint, JointSpec, LayerTable};
use crate::config::PlannerConfig;
use crate::error::{InputError, Result};
use crate::geometry::Segment;
use crate::joints::{JointStyle, StyleTag};
use nalgebra::{Point2, Vector2};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Device description with every joint placed
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub table: LayerTable,
    pub components: BTreeMap<String, Component>,
    pub joints: Vec<Joint>,
    /// Soft failures met while resolving
    pub warnings: Vec<String>,
}

impl ResolvedInput {
    pub fn layer_count(&self) -> usize {
        self.table.len()
    }
}

/// Place every joint of `input`. Malformed references are fatal; a joint
/// whose components never meet along its axis only produces a warning.
pub fn resolve(input: DeviceInput, config: &PlannerConfig) -> Result<ResolvedInput> {
    let layers = input.table.len();
    let outcomes = input
        .joints
        .par_iter()
        .map(|spec| resolve_joint(spec, &input, layers, config))
        .collect::<Result<Vec<_>>>()?;

    let mut joints = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    for (joint, joint_warnings) in outcomes {
        warnings.extend(joint_warnings);
        joints.push(joint);
    }

    Ok(ResolvedInput {
        table: input.table,
        components: input.components,
        joints,
        warnings,
    })
}

fn resolve_joint(
    spec: &JointSpec,
    input: &DeviceInput,
    layers: usize,
    config: &PlannerConfig,
) -> Result<(Joint, Vec<String>)> {
    let mut warnings = Vec::new();

    let style = match spec.style.as_deref().map(str::parse::<StyleTag>) {
        None => StyleTag::default_for(layers),
        Some(Ok(tag)) => tag,
        Some(Err(reason)) => {
            let fallback = StyleTag::default_for(layers);
            let message = format!("joint '{}': {}, using {}", spec.name, reason, fallback);
            warn!("{}", message);
            warnings.push(message);
            fallback
        }
    };
    let style = JointStyle::from_tag(style, &config.joints);

    let layer = input
        .table
        .layer_at(spec.anchor.z)
        .ok_or_else(|| InputError::JointOutsideStack {
            joint: spec.name.clone(),
            z: spec.anchor.z,
        })?;

    let a = component_at(spec, &spec.component_a, layer, input)?;
    let b = component_at(spec, &spec.component_b, layer, input)?;

    let axis = Vector2::new(spec.axis.x, spec.axis.y);
    let norm = axis.norm();
    if !(norm > f64::EPSILON) {
        return Err(InputError::DegenerateAxis(spec.name.clone()).into());
    }
    let axis = axis / norm;

    let eps = config.joints.trim_epsilon;
    let region_a = a.region(layer)?;
    let region_b = b.region(layer)?;
    let overlap = region_a.dilate(eps).intersection(&region_b.dilate(eps))?;

    // probe line long enough to cross both bodies from any anchor
    let anchor = Point2::new(spec.anchor.x, spec.anchor.y);
    let bbox = region_a.bounding_box().merge(&region_b.bounding_box());
    let reach = if bbox.is_empty() {
        1.0
    } else {
        bbox.diagonal() + (anchor - bbox.center()).norm() + 1.0
    };
    let probe = Segment::new(anchor - axis * reach, anchor + axis * reach);

    let segments: Vec<Segment> = overlap
        .clip_segment(&probe)
        .inside
        .iter()
        .filter_map(|piece| piece.shrunk(eps))
        .collect();

    if segments.is_empty() {
        let message = format!(
            "joint '{}': components '{}' and '{}' do not meet along the axis on layer {}",
            spec.name, spec.component_a, spec.component_b, layer
        );
        warn!("{}", message);
        warnings.push(message);
    } else {
        debug!(joint = %spec.name, layer, segments = segments.len(), "joint resolved");
    }

    Ok((
        Joint {
            name: spec.name.clone(),
            style,
            component_a: spec.component_a.clone(),
            component_b: spec.component_b.clone(),
            layer,
            segments,
        },
        warnings,
    ))
}

fn component_at<'a>(
    spec: &JointSpec,
    name: &str,
    layer: usize,
    input: &'a DeviceInput,
) -> Result<&'a Component> {
    let component = input
        .components
        .get(name)
        .ok_or_else(|| InputError::UnknownComponent {
            joint: spec.name.clone(),
            component: name.to_string(),
        })?;
    if component.footprint(layer).is_none() {
        return Err(InputError::ComponentNotOnLayer {
            joint: spec.name.clone(),
            component: name.to_string(),
            layer,
        }
        .into());
    }
    Ok(component)
}
