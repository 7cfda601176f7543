// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-style joint geometry. Each generator returns `(keep, footprint)`.

use super::{BendParams, DashedParams, PlainParams, StampParams};
use crate::error::GeometryError;
use crate::geometry::{Laminate, Layer, Segment};
use nalgebra::{Point2, Vector2};

/// Local frame of a joint segment
struct Frame {
    center: Point2<f64>,
    along: Vector2<f64>,
    across: Vector2<f64>,
    length: f64,
}

impl Frame {
    fn new(segment: &Segment) -> Option<Frame> {
        let along = segment.direction()?;
        Some(Frame {
            center: segment.midpoint(),
            along,
            across: Vector2::new(-along.y, along.x),
            length: segment.length(),
        })
    }

    fn at(&self, s: f64, t: f64) -> Point2<f64> {
        self.center + self.along * s + self.across * t
    }

    /// Rectangle centred at `(s, t)` in the joint frame
    fn rect(&self, s: f64, t: f64, half_along: f64, half_across: f64) -> Layer {
        Layer::oriented_rectangle(self.at(s, t), self.along, half_along, half_across)
    }

    /// The flexure: centreline shrunk by `w/2 - dl/2` per end, buffered by
    /// `w/2` with square caps
    fn flex(&self, width: f64, dl: f64) -> Layer {
        self.rect(0.0, 0.0, self.length / 2.0 + dl / 2.0, width / 2.0)
    }
}

fn five(rigid: &Layer, adhesive: &Layer, flex: &Layer) -> Laminate {
    Laminate::new(vec![
        rigid.clone(),
        adhesive.clone(),
        flex.clone(),
        adhesive.clone(),
        rigid.clone(),
    ])
}

fn empty_block(layers: usize) -> (Laminate, Laminate) {
    (Laminate::empty(layers), Laminate::empty(layers))
}

pub(super) fn plain5(segment: &Segment, p: &PlainParams) -> (Laminate, Laminate) {
    let Some(frame) = Frame::new(segment) else {
        return empty_block(5);
    };
    let flex = frame.flex(p.width, p.dl);
    let none = Layer::empty();
    (five(&none, &none, &flex), flex.to_laminate(5))
}

pub(super) fn plain1(segment: &Segment, p: &PlainParams) -> (Laminate, Laminate) {
    let Some(frame) = Frame::new(segment) else {
        return empty_block(1);
    };
    let flex = frame.flex(p.width, p.dl);
    (flex.to_laminate(1), flex.to_laminate(1))
}

pub(super) fn stamp5(
    segment: &Segment,
    p: &StampParams,
) -> Result<(Laminate, Laminate), GeometryError> {
    let Some(frame) = Frame::new(segment) else {
        return Ok(empty_block(5));
    };
    let flex = frame.flex(p.width, p.dl);
    let flex_length = frame.length + p.dl;
    let pitch = 2.0 * p.tooth_length;
    let count = if p.tooth_length > 0.0 {
        ((flex_length + p.tooth_length) / pitch).floor().max(0.0) as usize
    } else {
        0
    };

    let quarter = p.width / 4.0;
    let teeth = (0..count).try_fold(Layer::empty(), |acc, k| {
        let s = (k as f64 - (count as f64 - 1.0) / 2.0) * pitch;
        // even teeth hang from side A, odd ones from side B
        let t = if k % 2 == 0 { -quarter } else { quarter };
        acc.union(&frame.rect(s, t, p.tooth_length / 2.0, quarter))
    })?;

    Ok((five(&teeth, &teeth, &flex), flex.to_laminate(5)))
}

pub(super) fn bend5(
    segment: &Segment,
    p: &BendParams,
) -> Result<(Laminate, Laminate), GeometryError> {
    let Some(frame) = Frame::new(segment) else {
        return Ok(empty_block(5));
    };
    let half_flex = frame.length / 2.0 + p.dl / 2.0;
    let footprint = frame.rect(0.0, 0.0, half_flex, p.widen * p.width / 2.0);
    let flex = frame.flex(p.width, p.dl);

    let centreline = (half_flex - p.width / 2.0).max(0.0);
    let ribs = [-centreline, 0.0, centreline]
        .iter()
        .map(|&s| frame.rect(s, 0.0, p.rib_width / 2.0, p.rib_factor * p.width / 2.0))
        .try_fold(Layer::empty(), |acc, rib| acc.union(&rib))?
        .intersection(&footprint)?;

    let flex_keep = footprint.difference(&ribs)?;
    let other_keep = footprint.difference(&flex.union(&ribs)?)?;
    Ok((
        five(&other_keep, &other_keep, &flex_keep),
        footprint.to_laminate(5),
    ))
}

pub(super) fn dashed1(
    segment: &Segment,
    p: &DashedParams,
) -> Result<(Laminate, Laminate), GeometryError> {
    let Some(frame) = Frame::new(segment) else {
        return Ok(empty_block(1));
    };
    let flex = frame.flex(p.width, p.dl);
    let usable = frame.length + p.dl - 2.0 * p.pad;
    let step = p.tooth_length + p.gap;
    let count = if usable > 0.0 && step > 0.0 {
        ((usable + p.gap) / step).floor() as usize
    } else {
        0
    };

    let span = count as f64 * p.tooth_length + count.saturating_sub(1) as f64 * p.gap;
    let slots = (0..count).try_fold(Layer::empty(), |acc, k| {
        let s = -span / 2.0 + p.tooth_length / 2.0 + k as f64 * step;
        acc.union(&frame.rect(s, 0.0, p.tooth_length / 2.0, p.slot_width / 2.0))
    })?;

    let keep = flex.difference(&slots)?;
    Ok((keep.to_laminate(1), flex.to_laminate(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn segment() -> Segment {
        Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0))
    }

    #[test]
    fn test_flex_dimensions() {
        let p = PlainParams {
            width: 1.5,
            dl: 0.0,
        };
        let (keep, footprint) = plain5(&segment(), &p);
        let bbox = keep[2].bounding_box();
        assert_relative_eq!(bbox.width(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.height(), 1.5, epsilon = 1e-9);
        assert_eq!(footprint.len(), 5);
    }

    #[test]
    fn test_negative_length_offset_shortens() {
        let p = PlainParams {
            width: 0.5,
            dl: -0.1,
        };
        let (keep, _) = plain5(&segment(), &p);
        assert_relative_eq!(keep[2].bounding_box().width(), 9.9, epsilon = 1e-9);
    }

    #[test]
    fn test_dashed_slot_count() {
        let p = DashedParams {
            width: 1.5,
            dl: 0.0,
            tooth_length: 2.0,
            gap: 1.0,
            pad: 0.5,
            slot_width: 0.2,
        };
        let (keep, footprint) = dashed1(&segment(), &p).unwrap();
        // usable 9, three slots of 2 with gaps of 1
        let removed = footprint[0].area() - keep[0].area();
        assert_relative_eq!(removed, 3.0 * 2.0 * 0.2, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_segment_is_empty() {
        let p = PlainParams {
            width: 1.5,
            dl: 0.0,
        };
        let point = Segment::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0));
        let (keep, footprint) = plain5(&point, &p);
        assert!(keep.is_void());
        assert!(footprint.is_void());
    }

    #[test]
    fn test_stamp_teeth_alternate_sides() {
        let p = StampParams {
            width: 2.0,
            dl: 0.0,
            tooth_length: 2.0,
        };
        let (keep, footprint) = stamp5(&segment(), &p).unwrap();
        // three 2x1 teeth centred on x = 1, 5, 9
        let rigid = &keep[0];
        assert_relative_eq!(rigid.area(), 6.0, epsilon = 1e-3);
        assert!(rigid.contains_point(&Point2::new(1.0, -0.5)));
        assert!(!rigid.contains_point(&Point2::new(1.0, 0.5)));
        assert!(rigid.contains_point(&Point2::new(5.0, 0.5)));
        assert!(!rigid.contains_point(&Point2::new(5.0, -0.5)));
        assert!(rigid.contains_point(&Point2::new(9.0, -0.5)));

        assert_eq!(keep[1], keep[0]);
        assert_eq!(keep[3], keep[0]);
        assert_eq!(keep[4], keep[0]);
        assert_relative_eq!(keep[2].area(), 20.0, epsilon = 1e-3);
        assert_relative_eq!(footprint[0].area(), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bend_ribs_perforate_flex_only() {
        let p = BendParams {
            width: 1.0,
            dl: 0.0,
            widen: 2.0,
            rib_width: 0.5,
            rib_factor: 3.0,
        };
        let (keep, footprint) = bend5(&segment(), &p).unwrap();
        assert_relative_eq!(footprint[0].area(), 20.0, epsilon = 1e-3);

        // flex layer: footprint less three 0.5x2 ribs
        let flex = &keep[2];
        assert_relative_eq!(flex.area(), 17.0, epsilon = 1e-3);
        assert!(flex.contains_point(&Point2::new(2.0, 0.0)));
        assert!(!flex.contains_point(&Point2::new(5.0, 0.0)));
        assert!(!flex.contains_point(&Point2::new(5.0, 0.75)));

        // other layers also lose the flex strip itself
        for i in [0, 1, 3, 4] {
            let layer = &keep[i];
            assert_relative_eq!(layer.area(), 8.5, epsilon = 1e-3);
            assert!(layer.contains_point(&Point2::new(2.0, 0.75)), "layer {}", i);
            assert!(!layer.contains_point(&Point2::new(2.0, 0.0)), "layer {}", i);
            assert!(!layer.contains_point(&Point2::new(5.0, 0.75)), "layer {}", i);
        }
    }
}
