// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - planar regions, layer stacks and their algebra

mod bbox;
mod boolean;
mod laminate;
mod layer;
mod segment;

pub use bbox::BoundingBox;
pub use boolean::{repair_and_retry, BooleanOp, REPAIR_TOLERANCE};
pub use laminate::Laminate;
pub use layer::{Layer, Ring, SegmentClip};
pub use segment::Segment;
