// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Device description: layer table, components and joints
//!
//! Everything here is read once and immutable afterwards. [`resolve`] turns
//! raw joint rows into placed joints with trimmed segments.

mod resolver;

pub use resolver::{resolve, ResolvedInput};

use crate::error::{GeometryError, InputError};
use crate::geometry::{Layer, Segment};
use crate::joints::JointStyle;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Circular cutout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn to_layer(&self, segments: usize) -> Layer {
        Layer::circle(self.center, self.radius, segments)
    }
}

/// Outlines and holes of one component on one layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub outlines: Vec<Vec<Point2<f64>>>,
    pub holes: Vec<Circle>,
}

/// A named rigid body with per-layer geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub layers: BTreeMap<usize, Footprint>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: usize, footprint: Footprint) -> Self {
        self.layers.insert(layer, footprint);
        self
    }

    pub fn footprint(&self, layer: usize) -> Option<&Footprint> {
        self.layers.get(&layer)
    }

    /// Planar union of the component's outlines on `layer`
    pub fn region(&self, layer: usize) -> Result<Layer, GeometryError> {
        let Some(footprint) = self.footprint(layer) else {
            return Ok(Layer::empty());
        };
        footprint
            .outlines
            .iter()
            .try_fold(Layer::empty(), |acc, outline| {
                acc.union(&Layer::polygon(outline.clone())?)
            })
    }
}

/// One row of the layer table per layer: start height and occupants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub z_start: f64,
    pub components: Vec<String>,
}

/// Layer to component relationships and layer heights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerTable {
    layers: Vec<LayerEntry>,
    component_layers: BTreeMap<String, Vec<usize>>,
}

impl LayerTable {
    /// Build the table from `(layer, component, z_start)` rows. The first
    /// row of a layer fixes its start height.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (usize, S, f64)>,
        S: Into<String>,
    {
        let mut by_layer: BTreeMap<usize, LayerEntry> = BTreeMap::new();
        let mut component_layers: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (layer, component, z_start) in rows {
            let component = component.into();
            let entry = by_layer.entry(layer).or_insert_with(|| LayerEntry {
                z_start,
                components: Vec::new(),
            });
            if !entry.components.contains(&component) {
                entry.components.push(component.clone());
            }
            let layers = component_layers.entry(component).or_default();
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        }

        if by_layer.is_empty() {
            return Err(InputError::EmptyStack);
        }
        for (expected, layer) in by_layer.keys().enumerate() {
            if *layer != expected {
                return Err(InputError::MissingLayer(expected));
            }
        }

        Ok(Self {
            layers: by_layer.into_values().collect(),
            component_layers,
        })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.layers
    }

    pub fn components_on(&self, layer: usize) -> &[String] {
        self.layers
            .get(layer)
            .map(|e| e.components.as_slice())
            .unwrap_or(&[])
    }

    pub fn layers_of(&self, component: &str) -> &[usize] {
        self.component_layers
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.component_layers.keys().map(String::as_str)
    }

    pub fn z_start(&self, layer: usize) -> Option<f64> {
        self.layers.get(layer).map(|e| e.z_start)
    }

    /// Layer whose slab holds height `z`. A boundary height belongs to the
    /// layer above it; anything past the last start is in the last layer.
    pub fn layer_at(&self, z: f64) -> Option<usize> {
        let first = self.layers.first()?.z_start;
        if !(z > first) {
            return None;
        }
        let last = self.layers.len() - 1;
        (0..last)
            .find(|&l| z < self.layers[l + 1].z_start)
            .or(Some(last))
    }
}

/// A joint row as it appears in the joint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    pub name: String,
    /// Style tag after `=` in the name, if any
    pub style: Option<String>,
    pub component_a: String,
    pub component_b: String,
    pub anchor: Point3<f64>,
    pub axis: Vector3<f64>,
}

impl JointSpec {
    /// Split `NAME=STYLE`
    pub fn parse_name(raw: &str) -> Result<(String, Option<String>), InputError> {
        let parts: Vec<&str> = raw.split('=').collect();
        match parts.as_slice() {
            [name] => Ok((name.trim().to_string(), None)),
            [name, style] => Ok((name.trim().to_string(), Some(style.trim().to_string()))),
            _ => Err(InputError::MalformedJointName(raw.to_string())),
        }
    }
}

/// A joint placed in the stack with its trimmed segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub style: JointStyle,
    pub component_a: String,
    pub component_b: String,
    pub layer: usize,
    pub segments: Vec<Segment>,
}

/// Raw device description as read from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInput {
    pub table: LayerTable,
    pub components: BTreeMap<String, Component>,
    pub joints: Vec<JointSpec>,
}
