// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Jig holes, sheet outline and layer labels

use crate::config::PlanConfig;
use crate::error::GeometryError;
use crate::geometry::{BoundingBox, Laminate, Layer};
use nalgebra::Point2;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixtures {
    /// Centres ordered lower-left, upper-left, lower-right, upper-right
    pub jig_centers: Vec<Point2<f64>>,
    pub jig_holes: Layer,
    pub sheet: Layer,
    /// Per-layer tick marks (and optional dot)
    pub labels: Laminate,
}

impl Fixtures {
    pub fn build(
        device: &Laminate,
        config: &PlanConfig,
        circle_segments: usize,
    ) -> Result<Self, GeometryError> {
        let jig_centers = jig_centers(&device.bounding_box(), config.jig_hole_spacing);
        let radius = config.jig_diameter / 2.0;
        let jig_holes = Layer::from_points(&jig_centers, radius, circle_segments)?;

        let sheet_box =
            BoundingBox::from_points(&jig_centers).inflated(radius + config.jig_diameter);
        let sheet = Layer::rectangle(sheet_box.min, sheet_box.max);

        let labels = (0..device.len())
            .map(|i| label(i, jig_centers[0], radius, config, circle_segments))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            jig_centers,
            jig_holes,
            sheet,
            labels: Laminate::new(labels),
        })
    }
}

/// Corners of the device box grown by half a spacing, with width and height
/// rounded up to whole spacings around the same centre
pub fn jig_centers(device_box: &BoundingBox, spacing: f64) -> Vec<Point2<f64>> {
    let (center, w, h) = if device_box.is_empty() {
        (Point2::origin(), spacing, spacing)
    } else {
        let grown = device_box.inflated(spacing / 2.0);
        let round_up = |v: f64| ((v / spacing).ceil() * spacing).max(spacing);
        (grown.center(), round_up(grown.width()), round_up(grown.height()))
    };
    let (hw, hh) = (w / 2.0, h / 2.0);
    vec![
        Point2::new(center.x - hw, center.y - hh),
        Point2::new(center.x - hw, center.y + hh),
        Point2::new(center.x + hw, center.y - hh),
        Point2::new(center.x + hw, center.y + hh),
    ]
}

/// `index + 1` ticks to the right of the lower-left jig hole
fn label(
    index: usize,
    anchor: Point2<f64>,
    radius: f64,
    config: &PlanConfig,
    circle_segments: usize,
) -> Result<Layer, GeometryError> {
    let start = anchor.x + radius + config.label_tick_pitch;
    let y0 = anchor.y - config.label_tick_height / 2.0;
    let mut label = Layer::empty();
    let mut cursor = start;

    if config.labels {
        for _ in 0..=index {
            let tick = Layer::rectangle(
                Point2::new(cursor, y0),
                Point2::new(cursor + config.label_tick_width, y0 + config.label_tick_height),
            );
            label = label.union(&tick)?;
            cursor += config.label_tick_pitch;
        }
    }

    if config.label_dot {
        let r = config.label_dot_diameter / 2.0;
        let dot = Layer::circle(Point2::new(cursor + r, anchor.y), r, circle_segments);
        label = label.union(&dot)?;
    }

    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jig_grid() {
        let bbox = BoundingBox::new(Point2::new(0.0, 0.0), Point2::new(30.0, 12.0));
        let centers = jig_centers(&bbox, 20.0);
        // 50 x 32 grows to 60 x 40 around (15, 6)
        assert_relative_eq!(centers[0].x, -15.0);
        assert_relative_eq!(centers[0].y, -14.0);
        assert_relative_eq!(centers[3].x, 45.0);
        assert_relative_eq!(centers[3].y, 26.0);
    }

    #[test]
    fn test_label_ticks_count() {
        let config = PlanConfig::default();
        let device = Laminate::new(vec![
            Layer::rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
            3
        ]);
        let fixtures = Fixtures::build(&device, &config, 32).unwrap();
        assert_eq!(fixtures.labels[0].rings().len(), 1);
        assert_eq!(fixtures.labels[2].rings().len(), 3);
        assert_eq!(fixtures.jig_centers.len(), 4);
    }

    #[test]
    fn test_sheet_encloses_jig_holes() {
        let config = PlanConfig::default();
        let device = Laminate::new(vec![Layer::rectangle(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
        )]);
        let fixtures = Fixtures::build(&device, &config, 32).unwrap();
        assert!(fixtures.jig_holes.within(&fixtures.sheet, 1e-6).unwrap());
    }
}
