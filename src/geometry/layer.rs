// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Single-sheet 2D regions
//!
//! A [`Layer`] is the material footprint of one fabrication layer: any number
//! of disjoint polygons, each possibly with holes, stored as a flat list of
//! oriented [`Ring`]s. Outer boundaries run counter-clockwise and holes
//! clockwise, which is exactly what the non-zero fill rule needs.

use super::boolean::{
    clip_paths, offset_paths, repair_and_retry, simplify_paths, snap_paths, RawPaths,
};
use super::{BooleanOp, BoundingBox, Laminate, Segment, REPAIR_TOLERANCE};
use crate::error::GeometryError;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Rings with less area than this are numerical debris and never kept
const AREA_EPSILON: f64 = 1e-9;

/// Parameters closer than this are treated as the same split point
const SPLIT_EPSILON: f64 = 1e-12;

/// Closed boundary loop without a repeated closing vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub points: Vec<Point2<f64>>,
}

impl Ring {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Shoelace area, positive for counter-clockwise rings
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let p = &self.points[i];
            let q = &self.points[(i + 1) % n];
            sum += p.x * q.y - q.x * p.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn reversed(&self) -> Ring {
        let mut points = self.points.clone();
        points.reverse();
        Ring::new(points)
    }

    /// Consecutive vertex pairs, closing edge included
    pub fn edges(&self) -> Vec<Segment> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        (0..n)
            .map(|i| Segment::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    /// Winding number of the ring around `point` (signed by orientation)
    pub fn winding_number(&self, point: &Point2<f64>) -> i32 {
        let n = self.points.len();
        let mut winding = 0;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % n];
            let side = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);
            if a.y <= point.y {
                if b.y > point.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= point.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    fn to_raw(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }
}

/// Pieces of a segment after clipping against a layer
#[derive(Debug, Clone, Default)]
pub struct SegmentClip {
    pub inside: Vec<Segment>,
    pub outside: Vec<Segment>,
}

/// Material region of one fabrication layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    rings: Vec<Ring>,
}

impl Layer {
    pub fn empty() -> Self {
        Self { rings: Vec::new() }
    }

    /// Build a layer from rings that may overlap. Clockwise rings only cancel
    /// material where they sit inside a counter-clockwise ring.
    pub fn from_rings(rings: Vec<Ring>) -> Result<Layer, GeometryError> {
        let raw = Layer { rings };
        if raw.rings.is_empty() {
            return Ok(raw);
        }
        repair_and_retry(&raw, &Layer::empty(), REPAIR_TOLERANCE, |a, b| {
            a.boolean_raw(b, BooleanOp::Union)
        })
    }

    /// A filled polygon, whichever way its outline winds
    pub fn polygon(points: Vec<Point2<f64>>) -> Result<Layer, GeometryError> {
        let ring = Ring::new(points);
        let ring = if ring.is_hole() { ring.reversed() } else { ring };
        Layer::from_rings(vec![ring])
    }

    /// Axis-aligned rectangle between two corners
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Layer {
        let bbox = BoundingBox::new(
            Point2::new(min.x.min(max.x), min.y.min(max.y)),
            Point2::new(min.x.max(max.x), min.y.max(max.y)),
        );
        Layer::from_simple(Ring::new(bbox.corners().to_vec()))
    }

    /// Rectangle centred on `center`, long side along `direction`
    pub fn oriented_rectangle(
        center: Point2<f64>,
        direction: Vector2<f64>,
        half_length: f64,
        half_width: f64,
    ) -> Layer {
        let norm = direction.norm();
        if half_length <= 0.0 || half_width <= 0.0 || norm == 0.0 {
            return Layer::empty();
        }
        let u = direction / norm;
        let v = Vector2::new(-u.y, u.x);
        let a = u * half_length;
        let b = v * half_width;
        Layer::from_simple(Ring::new(vec![
            center - a - b,
            center + a - b,
            center + a + b,
            center - a + b,
        ]))
    }

    /// Regular polygon approximation of a circle
    pub fn circle(center: Point2<f64>, radius: f64, segments: usize) -> Layer {
        if radius <= 0.0 {
            return Layer::empty();
        }
        let segments = segments.max(8);
        let points = (0..segments)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / segments as f64;
                Point2::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect();
        Layer::from_simple(Ring::new(points))
    }

    /// Union of circles around each point
    pub fn from_points(
        points: &[Point2<f64>],
        radius: f64,
        segments: usize,
    ) -> Result<Layer, GeometryError> {
        points.iter().try_fold(Layer::empty(), |acc, p| {
            acc.union(&Layer::circle(*p, radius, segments))
        })
    }

    fn from_simple(ring: Ring) -> Layer {
        if ring.area() < AREA_EPSILON {
            Layer::empty()
        } else {
            Layer { rings: vec![ring] }
        }
    }

    fn from_raw(paths: RawPaths) -> Layer {
        let rings = paths
            .into_iter()
            .filter(|path| path.len() >= 3)
            .map(|path| Ring::new(path.into_iter().map(|(x, y)| Point2::new(x, y)).collect()))
            .filter(|ring| ring.area() >= AREA_EPSILON)
            .collect();
        Layer { rings }
    }

    fn to_raw(&self) -> RawPaths {
        self.rings.iter().map(Ring::to_raw).collect()
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Net material area (holes subtracted)
    pub fn area(&self) -> f64 {
        self.rings.iter().map(Ring::signed_area).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.rings.iter().flat_map(|r| r.points.iter()))
    }

    /// The bounding box as a filled rectangle layer
    pub fn bounding_rectangle(&self) -> Layer {
        let bbox = self.bounding_box();
        if bbox.is_empty() {
            Layer::empty()
        } else {
            Layer::rectangle(bbox.min, bbox.max)
        }
    }

    pub fn boolean(&self, other: &Layer, op: BooleanOp) -> Result<Layer, GeometryError> {
        match op {
            BooleanOp::Union | BooleanOp::SymmetricDifference if other.is_empty() => {
                return Ok(self.clone())
            }
            BooleanOp::Union | BooleanOp::SymmetricDifference if self.is_empty() => {
                return Ok(other.clone())
            }
            BooleanOp::Difference if self.is_empty() || other.is_empty() => {
                return Ok(self.clone())
            }
            BooleanOp::Intersection if self.is_empty() || other.is_empty() => {
                return Ok(Layer::empty())
            }
            _ => {}
        }
        repair_and_retry(self, other, REPAIR_TOLERANCE, |a, b| a.boolean_raw(b, op))
    }

    fn boolean_raw(&self, other: &Layer, op: BooleanOp) -> Result<Layer, GeometryError> {
        clip_paths(&self.to_raw(), &other.to_raw(), op).map(Layer::from_raw)
    }

    pub fn union(&self, other: &Layer) -> Result<Layer, GeometryError> {
        self.boolean(other, BooleanOp::Union)
    }

    pub fn difference(&self, other: &Layer) -> Result<Layer, GeometryError> {
        self.boolean(other, BooleanOp::Difference)
    }

    pub fn intersection(&self, other: &Layer) -> Result<Layer, GeometryError> {
        self.boolean(other, BooleanOp::Intersection)
    }

    pub fn symmetric_difference(&self, other: &Layer) -> Result<Layer, GeometryError> {
        self.boolean(other, BooleanOp::SymmetricDifference)
    }

    /// Union of many layers
    pub fn union_all<'a>(
        layers: impl IntoIterator<Item = &'a Layer>,
    ) -> Result<Layer, GeometryError> {
        layers
            .into_iter()
            .try_fold(Layer::empty(), |acc, layer| acc.union(layer))
    }

    /// Grow outward by `distance` with mitred corners (negative shrinks)
    pub fn dilate(&self, distance: f64) -> Layer {
        if self.is_empty() || distance == 0.0 {
            return self.clone();
        }
        Layer::from_raw(offset_paths(&self.to_raw(), distance))
    }

    /// Shrink inward by `distance` with mitred corners
    pub fn erode(&self, distance: f64) -> Layer {
        self.dilate(-distance)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Layer {
        let offset = Vector2::new(dx, dy);
        Layer {
            rings: self
                .rings
                .iter()
                .map(|r| Ring::new(r.points.iter().map(|p| p + offset).collect()))
                .collect(),
        }
    }

    /// Mirror about the y axis, keeping ring orientation valid
    pub fn mirror_x(&self) -> Layer {
        Layer {
            rings: self
                .rings
                .iter()
                .map(|r| {
                    let mut points: Vec<_> =
                        r.points.iter().map(|p| Point2::new(-p.x, p.y)).collect();
                    points.reverse();
                    Ring::new(points)
                })
                .collect(),
        }
    }

    /// Drop drop-out and near-collinear vertices; used as the geometry repair step
    pub fn simplified(&self, tolerance: f64) -> Layer {
        let cleaned: RawPaths = self
            .rings
            .iter()
            .map(|r| {
                r.points
                    .iter()
                    .filter(|p| p.x.is_finite() && p.y.is_finite())
                    .map(|p| (p.x, p.y))
                    .collect::<Vec<_>>()
            })
            .filter(|path| path.len() >= 3)
            .collect();
        if cleaned.is_empty() {
            return Layer::empty();
        }
        Layer::from_raw(simplify_paths(&cleaned, tolerance))
    }

    /// Remove every ring whose enclosed area is below `min_area`
    pub fn filter_small(&self, min_area: f64) -> Layer {
        Layer {
            rings: self
                .rings
                .iter()
                .filter(|r| r.area() >= min_area)
                .cloned()
                .collect(),
        }
    }

    /// Close gaps and then strip slivers thinner than `2 * epsilon`, then drop
    /// fragments below `min_area`. The result sits on the boolean grid, so a
    /// second cleanup leaves it as it is.
    pub fn cleanup(&self, epsilon: f64, min_area: f64) -> Layer {
        let layer = if epsilon > 0.0 {
            self.dilate(epsilon).erode(2.0 * epsilon).dilate(epsilon)
        } else {
            self.clone()
        };
        layer.snapped().filter_small(min_area)
    }

    /// Round onto the boolean grid, keeping the input if that fails
    fn snapped(&self) -> Layer {
        if self.is_empty() {
            return Layer::empty();
        }
        match snap_paths(&self.to_raw()) {
            Ok(paths) => Layer::from_raw(paths),
            Err(_) => self.clone(),
        }
    }

    /// Non-zero winding containment
    pub fn contains_point(&self, point: &Point2<f64>) -> bool {
        self.rings
            .iter()
            .map(|r| r.winding_number(point))
            .sum::<i32>()
            != 0
    }

    /// True when `self` lies inside `other` grown by `tolerance`
    pub fn within(&self, other: &Layer, tolerance: f64) -> Result<bool, GeometryError> {
        if self.is_empty() {
            return Ok(true);
        }
        let outside = self.difference(&other.dilate(tolerance))?;
        Ok(outside.area() <= tolerance * tolerance)
    }

    /// All boundary edges of all rings
    pub fn edges(&self) -> Vec<Segment> {
        self.rings.iter().flat_map(Ring::edges).collect()
    }

    /// Split `segment` at every boundary crossing and sort the pieces into
    /// those inside and outside the layer
    pub fn clip_segment(&self, segment: &Segment) -> SegmentClip {
        let mut clip = SegmentClip::default();
        if segment.length() == 0.0 {
            return clip;
        }

        let mut splits = vec![0.0, 1.0];
        for edge in self.edges() {
            if let Some(t) = segment.intersection_parameter(&edge) {
                splits.push(t);
            }
        }
        splits.sort_by(|a, b| a.total_cmp(b));
        splits.dedup_by(|a, b| (*a - *b).abs() < SPLIT_EPSILON);

        let mut current: Option<(bool, f64, f64)> = None;
        for window in splits.windows(2) {
            let (t0, t1) = (window[0], window[1]);
            let inside = self.contains_point(&segment.point_at((t0 + t1) / 2.0));
            current = match current {
                Some((state, start, _)) if state == inside => Some((state, start, t1)),
                Some((state, start, end)) => {
                    push_piece(&mut clip, segment, state, start, end);
                    Some((inside, t0, t1))
                }
                None => Some((inside, t0, t1)),
            };
        }
        if let Some((state, start, end)) = current {
            push_piece(&mut clip, segment, state, start, end);
        }
        clip
    }

    /// Replicate this layer across `n` stack positions
    pub fn to_laminate(&self, n: usize) -> Laminate {
        Laminate::new(vec![self.clone(); n])
    }
}

fn push_piece(clip: &mut SegmentClip, segment: &Segment, inside: bool, t0: f64, t1: f64) {
    let piece = Segment::new(segment.point_at(t0), segment.point_at(t1));
    if inside {
        clip.inside.push(piece);
    } else {
        clip.outside.push(piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, s: f64) -> Layer {
        Layer::rectangle(Point2::new(x, y), Point2::new(x + s, y + s))
    }

    #[test]
    fn test_rectangle_area() {
        assert_relative_eq!(square(0.0, 0.0, 10.0).area(), 100.0);
    }

    #[test]
    fn test_clockwise_polygon_is_material() {
        let layer = Layer::polygon(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 5.0),
            Point2::new(5.0, 5.0),
            Point2::new(5.0, 0.0),
        ])
        .unwrap();
        assert_relative_eq!(layer.area(), 25.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_creates_hole() {
        let outer = square(0.0, 0.0, 10.0);
        let inner = square(2.0, 2.0, 2.0);
        let result = outer.difference(&inner).unwrap();
        assert_relative_eq!(result.area(), 96.0, epsilon = 1e-6);
        assert_eq!(result.rings().len(), 2);
        assert_eq!(result.rings().iter().filter(|r| r.is_hole()).count(), 1);
        assert!(!result.contains_point(&Point2::new(3.0, 3.0)));
        assert!(result.contains_point(&Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_mitred_dilate_keeps_square_corners() {
        let grown = square(0.0, 0.0, 10.0).dilate(1.0);
        assert_relative_eq!(grown.area(), 144.0, epsilon = 1e-3);
        let shrunk = square(0.0, 0.0, 10.0).erode(1.0);
        assert_relative_eq!(shrunk.area(), 64.0, epsilon = 1e-3);
    }

    #[test]
    fn test_cleanup_removes_sliver() {
        let body = square(0.0, 0.0, 10.0);
        let sliver = Layer::rectangle(Point2::new(20.0, 0.0), Point2::new(20.0005, 10.0));
        let layer = body.union(&sliver).unwrap();
        let cleaned = layer.cleanup(0.001, 1e-4);
        assert_eq!(cleaned.rings().len(), 1);
        assert_relative_eq!(cleaned.area(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_cleanup_is_idempotent_on_curves() {
        let circle = Layer::circle(Point2::new(0.0, 0.0), 5.123, 128);
        let triangle = Layer::polygon(vec![
            Point2::new(3.0, -1.7),
            Point2::new(11.3, 0.9),
            Point2::new(4.1, 6.2),
        ])
        .unwrap();
        let once = circle.union(&triangle).unwrap().cleanup(0.001, 1e-4);
        let mut again = once.clone();
        for _ in 0..5 {
            again = again.cleanup(0.001, 1e-4);
        }
        let drift = once.symmetric_difference(&again).unwrap();
        assert!(drift.area() < 1e-4, "drift {}", drift.area());
        assert_relative_eq!(again.area(), once.area(), epsilon = 1e-5);
    }

    #[test]
    fn test_clip_segment() {
        let layer = square(0.0, 0.0, 10.0);
        let seg = Segment::new(Point2::new(-5.0, 5.0), Point2::new(15.0, 5.0));
        let clip = layer.clip_segment(&seg);
        assert_eq!(clip.inside.len(), 1);
        assert_eq!(clip.outside.len(), 2);
        assert_relative_eq!(clip.inside[0].length(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_within() {
        let big = square(0.0, 0.0, 10.0);
        let small = square(2.0, 2.0, 2.0);
        assert!(small.within(&big, 0.001).unwrap());
        assert!(!big.within(&small, 0.001).unwrap());
    }

    #[test]
    fn test_mirror_keeps_area_positive() {
        let layer = square(1.0, 0.0, 2.0).mirror_x();
        assert_relative_eq!(layer.area(), 4.0);
        assert_relative_eq!(layer.bounding_box().max.x, -1.0);
    }
}
