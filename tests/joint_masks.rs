// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Keep and cut blocks of every joint style partition the joint footprint

use approx::assert_relative_eq;
use laminate_planner::config::JointsConfig;
use laminate_planner::geometry::{Laminate, Segment};
use laminate_planner::joints::{JointStyle, StyleTag};
use nalgebra::Point2;

const TAGS: [StyleTag; 5] = [
    StyleTag::Plain5,
    StyleTag::Plain1,
    StyleTag::Stamp,
    StyleTag::Bend,
    StyleTag::Dashed,
];

fn segments() -> Vec<Segment> {
    vec![
        Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
        Segment::new(Point2::new(3.0, -2.0), Point2::new(3.0, 9.0)),
        Segment::new(Point2::new(-4.0, 1.0), Point2::new(4.0, 7.0)),
    ]
}

#[test]
fn test_keep_and_cut_partition_footprint() {
    let config = JointsConfig::default();
    for tag in TAGS {
        let style = JointStyle::from_tag(tag, &config);
        for segment in segments() {
            let mask = style.generate(&segment).unwrap();
            assert_eq!(mask.keep.len(), style.layer_count(), "{}", tag);
            assert_eq!(mask.cut.len(), style.layer_count(), "{}", tag);

            let overlap = mask.keep.intersection(&mask.cut).unwrap();
            assert!(overlap.total_area() < 1e-6, "{} keep and cut overlap", tag);

            let whole: Laminate = mask.keep.union(&mask.cut).unwrap();
            let parts = mask.keep.total_area() + mask.cut.total_area();
            assert_relative_eq!(whole.total_area(), parts, epsilon = 1e-6);
            assert!(whole.total_area() > 0.0, "{} footprint is empty", tag);
        }
    }
}

#[test]
fn test_plain5_keeps_only_the_flex_layer() {
    let style = JointStyle::from_tag(StyleTag::Plain5, &JointsConfig::default());
    let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
    let mask = style.generate(&segment).unwrap();

    for (i, layer) in mask.keep.iter().enumerate() {
        assert_eq!(!layer.is_empty(), i == 2, "layer {}", i);
    }
    assert_relative_eq!(mask.keep[2].area(), 10.0 * 1.5, epsilon = 1e-6);

    // the joint footprint is the flex box on every layer
    let footprint = mask.keep[2].bounding_rectangle();
    for i in [0, 1, 3, 4] {
        let diff = mask.cut[i].symmetric_difference(&footprint).unwrap();
        assert!(diff.area() < 1e-6, "layer {}", i);
    }
    assert!(mask.cut[2].is_empty());
}

#[test]
fn test_protection_mask_is_narrower() {
    let config = JointsConfig::default();
    let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
    for tag in [StyleTag::Plain5, StyleTag::Plain1] {
        let style = JointStyle::from_tag(tag, &config);
        let keep = style.generate(&segment).unwrap().keep;
        let shield = style
            .protection_mask(&segment, config.mask_width, 0.1)
            .unwrap();
        assert!(shield.total_area() < keep.total_area());
        assert!(shield.difference(&keep).unwrap().total_area() < 1e-6);
    }
}
