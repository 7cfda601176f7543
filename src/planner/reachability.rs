// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Directional reachability
//!
//! Scrap on a layer can only be lifted off the stack in one direction if no
//! device material lies beyond it in that direction. Adhesive glues a layer
//! to its neighbours, so glued pairs share their blocking masks.

use crate::error::GeometryError;
use crate::geometry::{Laminate, Layer};
use serde::Serialize;

/// Blocking masks for removal towards the last layer (`up`) and towards
/// layer 0 (`down`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reachability {
    pub up: Laminate,
    pub down: Laminate,
}

impl Reachability {
    pub fn compute(device: &Laminate, adhesive: &[bool]) -> Result<Self, GeometryError> {
        Ok(Self {
            up: not_removable_up(device, adhesive)?,
            down: not_removable_down(device, adhesive)?,
        })
    }
}

/// Material that blocks lifting each layer's scrap towards the last layer
pub fn not_removable_up(device: &Laminate, adhesive: &[bool]) -> Result<Laminate, GeometryError> {
    let n = device.len();
    let is_adhesive = |i: usize| adhesive.get(i).copied().unwrap_or(false);

    // sweep from the far face inwards; each layer sees everything beyond it
    let mut blocking = vec![Layer::empty(); n];
    let mut beyond = Layer::empty();
    for i in (0..n).rev() {
        blocking[i] = beyond.clone();
        beyond = beyond.union(&device[i])?;
    }

    // scrap glued to device material underneath stays with it
    let mut masks = blocking.clone();
    for i in 1..n {
        if is_adhesive(i) || is_adhesive(i - 1) {
            masks[i] = blocking[i].union(&device[i - 1])?;
        }
    }

    // an adhesive layer leaves together with the layer it is bonded to
    for a in 0..n.saturating_sub(1) {
        if is_adhesive(a) {
            let shared = masks[a].union(&masks[a + 1])?;
            masks[a] = shared.clone();
            masks[a + 1] = shared;
        }
    }

    Ok(Laminate::new(masks))
}

/// Same as [`not_removable_up`] with the stack flipped
pub fn not_removable_down(device: &Laminate, adhesive: &[bool]) -> Result<Laminate, GeometryError> {
    let flipped: Vec<bool> = adhesive.iter().rev().copied().collect();
    let mut padded = vec![false; device.len().saturating_sub(flipped.len())];
    padded.extend(flipped);
    Ok(not_removable_up(&device.reversed(), &padded)?.reversed())
}
