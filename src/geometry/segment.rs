// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Straight line segments (joint axes and laser paths)

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

const PARALLEL_EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start, &self.end)
    }

    /// Unit direction from start to end, `None` for a zero-length segment
    pub fn direction(&self) -> Option<Vector2<f64>> {
        let d = self.end - self.start;
        let len = d.norm();
        if len > 0.0 {
            Some(d / len)
        } else {
            None
        }
    }

    pub fn point_at(&self, t: f64) -> Point2<f64> {
        self.start + (self.end - self.start) * t
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.end, self.start)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Segment {
        let v = Vector2::new(dx, dy);
        Segment::new(self.start + v, self.end + v)
    }

    /// Pull both endpoints towards each other by `distance`.
    /// Returns `None` when nothing of the segment would remain.
    pub fn shrunk(&self, distance: f64) -> Option<Segment> {
        let dir = self.direction()?;
        if self.length() <= 2.0 * distance {
            return None;
        }
        Some(Segment::new(
            self.start + dir * distance,
            self.end - dir * distance,
        ))
    }

    /// Parameter `t` along `self` where it crosses `other`, if they cross
    pub fn intersection_parameter(&self, other: &Segment) -> Option<f64> {
        let r = self.end - self.start;
        let s = other.end - other.start;
        let denom = r.perp(&s);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let qp = other.start - self.start;
        let t = qp.perp(&s) / denom;
        let u = qp.perp(&r) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(t)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shrunk() {
        let seg = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let shrunk = seg.shrunk(1.0).unwrap();
        assert_relative_eq!(shrunk.start.x, 1.0);
        assert_relative_eq!(shrunk.end.x, 9.0);
        assert!(seg.shrunk(5.0).is_none());
    }

    #[test]
    fn test_intersection_parameter() {
        let a = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let b = Segment::new(Point2::new(4.0, -1.0), Point2::new(4.0, 1.0));
        assert_relative_eq!(a.intersection_parameter(&b).unwrap(), 0.4);

        let parallel = Segment::new(Point2::new(0.0, 1.0), Point2::new(10.0, 1.0));
        assert!(a.intersection_parameter(&parallel).is_none());
    }
}
