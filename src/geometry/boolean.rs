// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean and offset operations using Clipper2
//!
//! Layers are handed to Clipper2 as flat path lists and always evaluated with
//! the non-zero fill rule, so outer boundaries must be counter-clockwise and
//! holes clockwise. Every result comes back in that orientation.
//!
//! Booleans snap coordinates to a 0.001 mm grid inside the kernel (`Milli`).
//! Offsets run on a finer grid so that growing and shrinking by one grid step
//! does not re-round every curved edge.

use super::Layer;
use crate::error::GeometryError;
use clipper2::{
    difference, inflate, intersect, simplify, union, xor, EndType, FillRule, JoinType, Milli,
    PointScaler,
};
use tracing::debug;

/// Flat path representation exchanged with Clipper2
pub(crate) type RawPaths = Vec<Vec<(f64, f64)>>;

/// Miter limit for mitred offsets; square corners (ratio sqrt 2) stay sharp
const MITER_LIMIT: f64 = 2.0;

/// 1e-6 mm grid used for offsets
#[derive(Debug, Default, Copy, Clone, PartialEq, Hash)]
pub(crate) struct Micro;

impl PointScaler for Micro {
    const MULTIPLIER: f64 = 1_000_000.0;
}

/// Tolerance used to simplify operands before the single retry
pub const REPAIR_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
    SymmetricDifference,
}

impl BooleanOp {
    pub fn name(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
            BooleanOp::SymmetricDifference => "symmetric difference",
        }
    }
}

/// Run a boolean between two raw path sets
pub(crate) fn clip_paths(
    subject: &RawPaths,
    clip: &RawPaths,
    op: BooleanOp,
) -> Result<RawPaths, GeometryError> {
    check_finite(subject, op)?;
    check_finite(clip, op)?;

    // Clipper2 wants a non-empty clip set, so an empty side resolves to a
    // self-union of the other (which still normalises orientation).
    let (subject, clip, op) = match (subject.is_empty(), clip.is_empty(), op) {
        (true, true, _) => return Ok(Vec::new()),
        (_, true, BooleanOp::Intersection) | (true, _, BooleanOp::Intersection) => {
            return Ok(Vec::new())
        }
        (true, _, BooleanOp::Difference) => return Ok(Vec::new()),
        (false, true, _) => (subject.clone(), subject.clone(), BooleanOp::Union),
        (true, false, _) => (clip.clone(), clip.clone(), BooleanOp::Union),
        (false, false, op) => (subject.clone(), clip.clone(), op),
    };
    let result = match op {
        BooleanOp::Union => union::<Milli>(subject, clip, FillRule::NonZero),
        BooleanOp::Difference => difference::<Milli>(subject, clip, FillRule::NonZero),
        BooleanOp::Intersection => intersect::<Milli>(subject, clip, FillRule::NonZero),
        BooleanOp::SymmetricDifference => xor::<Milli>(subject, clip, FillRule::NonZero),
    }
    .map_err(|e| GeometryError::Invalid {
        op: op.name(),
        reason: format!("{:?}", e),
    })?;

    Ok(result.into())
}

/// Offset closed paths by `delta` with a mitred join (negative shrinks)
pub(crate) fn offset_paths(paths: &RawPaths, delta: f64) -> RawPaths {
    // the binding scales the limit like a coordinate, so undo that here
    inflate::<Micro>(
        paths.clone(),
        delta,
        JoinType::Miter,
        EndType::Polygon,
        MITER_LIMIT / Micro::MULTIPLIER,
    )
    .into()
}

/// Round paths onto the boolean grid and merge what touches
pub(crate) fn snap_paths(paths: &RawPaths) -> Result<RawPaths, GeometryError> {
    clip_paths(paths, &Vec::new(), BooleanOp::Union)
}

/// Remove near-collinear vertices and self-intersections
pub(crate) fn simplify_paths(paths: &RawPaths, tolerance: f64) -> RawPaths {
    simplify::<Milli>(paths.clone(), tolerance, false).into()
}

fn check_finite(paths: &RawPaths, op: BooleanOp) -> Result<(), GeometryError> {
    let finite = paths
        .iter()
        .flatten()
        .all(|(x, y)| x.is_finite() && y.is_finite());
    if finite {
        Ok(())
    } else {
        Err(GeometryError::Invalid {
            op: op.name(),
            reason: "non-finite coordinate".to_string(),
        })
    }
}

/// Run `op`, and on a geometry validity error simplify both operands with
/// `tolerance` and run it exactly once more.
pub fn repair_and_retry<F>(
    a: &Layer,
    b: &Layer,
    tolerance: f64,
    mut op: F,
) -> Result<Layer, GeometryError>
where
    F: FnMut(&Layer, &Layer) -> Result<Layer, GeometryError>,
{
    match op(a, b) {
        Err(GeometryError::Invalid { op: name, reason }) => {
            debug!(op = name, %reason, tolerance, "repairing operands and retrying");
            let a = a.simplified(tolerance);
            let b = b.simplified(tolerance);
            op(&a, &b)
        }
        other => other,
    }
}
