// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Device assembly
//!
//! Merges every component's outlines into one laminate, then removes joint
//! cuts and the kerfs that separate touching bodies:
//!
//! ```text
//! device = raw - joints_cut - (bodies_cut - joint_protection)
//! ```

use crate::config::PlannerConfig;
use crate::error::{GeometryError, Result};
use crate::geometry::{Laminate, Layer};
use crate::input::ResolvedInput;
use crate::joints::align;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Assembled device and the masks that shaped it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Union of all component outlines, holes removed
    pub raw: Laminate,
    pub joints_cut: Laminate,
    pub bodies_cut: Laminate,
    /// Final keep geometry
    pub laminate: Laminate,
}

impl Device {
    pub fn layer_count(&self) -> usize {
        self.laminate.len()
    }

    /// Mirror the whole device about x and place the copy to the right of the
    /// original, `spacing` apart
    pub fn with_twin(&self, spacing: f64) -> Result<Device> {
        let bbox = self.raw.bounding_box();
        if bbox.is_empty() {
            return Ok(self.clone());
        }
        // mirrored min x is -max.x; move it to max.x + spacing
        let dx = 2.0 * bbox.max.x + spacing;
        let twin = |lam: &Laminate| -> Result<Laminate> {
            Ok(lam.union(&lam.mirror_x().translate(dx, 0.0))?)
        };
        Ok(Device {
            raw: twin(&self.raw)?,
            joints_cut: twin(&self.joints_cut)?,
            bodies_cut: twin(&self.bodies_cut)?,
            laminate: twin(&self.laminate)?,
        })
    }
}

/// Number of sibling polygons each polygon lies within
pub fn nesting_depths(
    polygons: &[Layer],
    tolerance: f64,
) -> std::result::Result<Vec<usize>, GeometryError> {
    polygons
        .iter()
        .enumerate()
        .map(|(i, p)| {
            polygons
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .try_fold(0usize, |depth, (_, other)| {
                    Ok::<_, GeometryError>(depth + usize::from(p.within(other, tolerance)?))
                })
        })
        .collect()
}

/// Outline polygons of one layer with their nesting depth
struct LayerBodies {
    polygons: Vec<Layer>,
    depths: Vec<usize>,
}

impl LayerBodies {
    fn collect(input: &ResolvedInput, layer: usize, tolerance: f64) -> Result<Self> {
        let mut polygons = Vec::new();
        for name in input.table.components_on(layer) {
            let Some(footprint) = input.components.get(name).and_then(|c| c.footprint(layer))
            else {
                continue;
            };
            for outline in &footprint.outlines {
                let polygon = Layer::polygon(outline.clone())?;
                if !polygon.is_empty() {
                    polygons.push(polygon);
                }
            }
        }
        let depths = nesting_depths(&polygons, tolerance)?;
        Ok(Self { polygons, depths })
    }

    fn bodies(&self) -> impl Iterator<Item = (usize, &Layer)> + '_ {
        self.polygons
            .iter()
            .enumerate()
            .filter(|(i, _)| self.depths[*i] % 2 == 0)
    }

    /// Fold depth levels shallow first: levels whose parity matches `adds`
    /// are unioned in, the others subtracted. `skip` leaves one polygon out.
    fn fold_depths(
        &self,
        adds: usize,
        skip: Option<usize>,
    ) -> std::result::Result<Layer, GeometryError> {
        let max_depth = self.depths.iter().copied().max().unwrap_or(0);
        (0..=max_depth).try_fold(Layer::empty(), |acc, depth| {
            let level = Layer::union_all(
                self.polygons
                    .iter()
                    .zip(&self.depths)
                    .enumerate()
                    .filter(|(i, (_, d))| **d == depth && Some(*i) != skip)
                    .map(|(_, (p, _))| p),
            )?;
            if depth % 2 == adds % 2 {
                acc.union(&level)
            } else {
                acc.difference(&level)
            }
        })
    }

    /// Even depths add material, odd depths remove it
    fn region(&self) -> std::result::Result<Layer, GeometryError> {
        self.fold_depths(0, None)
    }

    /// Interior cut-outs whole, bodies nested in them spared, plus a kerf
    /// wherever two bodies meet
    fn separation_cut(&self, kerf: f64) -> std::result::Result<Layer, GeometryError> {
        let half = kerf / 2.0;
        let interiors = self.fold_depths(1, None)?;

        let bodies: Vec<(usize, &Layer)> = self.bodies().collect();
        if bodies.len() < 2 {
            return Ok(interiors);
        }
        bodies.iter().try_fold(interiors, |acc, (i, body)| {
            // material of every other body, windows already taken out
            let others = self.fold_depths(0, Some(*i))?;
            if others.is_empty() {
                return Ok(acc);
            }
            let band = body.dilate(half).difference(&body.erode(half))?;
            acc.union(&band.intersection(&others.dilate(half))?)
        })
    }
}

/// Assemble the device laminate from resolved input
pub fn assemble(input: &ResolvedInput, config: &PlannerConfig) -> Result<Device> {
    let layers = input.layer_count();
    let geometry = &config.geometry;
    let kerf = config.plan.kerf;
    info!(layers, joints = input.joints.len(), "assembling device");

    let per_layer = (0..layers)
        .into_par_iter()
        .map(|l| -> Result<(Layer, Layer)> {
            let bodies = LayerBodies::collect(input, l, geometry.containment_tolerance)?;
            let holes: Vec<Layer> = input
                .table
                .components_on(l)
                .iter()
                .filter_map(|name| input.components.get(name)?.footprint(l))
                .flat_map(|f| f.holes.iter())
                .map(|c| c.to_layer(geometry.circle_segments))
                .collect();
            let holes = Layer::union_all(&holes)?;
            let region = bodies
                .region()?
                .difference(&holes)?
                .cleanup(geometry.small_dim, geometry.min_area);
            let cut = bodies.separation_cut(kerf)?;
            debug!(
                layer = l,
                polygons = bodies.polygons.len(),
                area = region.area(),
                "layer merged"
            );
            Ok((region, cut))
        })
        .collect::<Result<Vec<_>>>()?;
    let (raw, bodies_cut): (Vec<Layer>, Vec<Layer>) = per_layer.into_iter().unzip();
    let raw = Laminate::new(raw);
    let bodies_cut = Laminate::new(bodies_cut);

    let placements: Vec<_> = input
        .joints
        .iter()
        .flat_map(|j| j.segments.iter().map(move |s| (j, s)))
        .collect();

    let masks = placements
        .par_iter()
        .map(|(joint, segment)| -> Result<(Laminate, Laminate)> {
            let mask = joint.style.generate(segment)?;
            let protection =
                joint
                    .style
                    .protection_mask(segment, config.joints.mask_width, kerf)?;
            Ok((
                align(&mask.cut, joint.layer, layers),
                align(&protection, joint.layer, layers),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let (joints_cut, protection) = masks.iter().try_fold(
        (Laminate::empty(layers), Laminate::empty(layers)),
        |(cut, shield), (c, p)| -> Result<(Laminate, Laminate)> {
            Ok((cut.union(c)?, shield.union(p)?))
        },
    )?;
    let joints_cut = joints_cut.cleanup(geometry.small_dim, geometry.min_area);
    let bodies_cut = bodies_cut.difference(&protection)?;

    let laminate = raw.difference(&joints_cut)?.difference(&bodies_cut)?;
    info!(area = laminate.total_area(), "device assembled");

    Ok(Device {
        raw,
        joints_cut,
        bodies_cut,
        laminate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(x: f64, y: f64, s: f64) -> Layer {
        Layer::rectangle(Point2::new(x, y), Point2::new(x + s, y + s))
    }

    #[test]
    fn test_nesting_depths() {
        let polygons = vec![
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
        ];
        assert_eq!(nesting_depths(&polygons, 0.001).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_nested_region() {
        let polygons = vec![
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
        ];
        let depths = nesting_depths(&polygons, 0.001).unwrap();
        let bodies = LayerBodies { polygons, depths };
        // 100 - 36 + 4
        assert_relative_eq!(bodies.region().unwrap().area(), 68.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lone_body_has_no_kerf() {
        let bodies = LayerBodies {
            polygons: vec![square(0.0, 0.0, 10.0)],
            depths: vec![0],
        };
        assert!(bodies.separation_cut(0.1).unwrap().is_empty());
    }

    #[test]
    fn test_abutting_bodies_share_kerf() {
        let bodies = LayerBodies {
            polygons: vec![square(0.0, 0.0, 10.0), square(10.0, 0.0, 10.0)],
            depths: vec![0, 0],
        };
        let cut = bodies.separation_cut(0.1).unwrap();
        let bbox = cut.bounding_box();
        assert_relative_eq!(bbox.min.x, 9.95, epsilon = 1e-6);
        assert_relative_eq!(bbox.max.x, 10.05, epsilon = 1e-6);
    }

    fn framed(flap: Layer) -> LayerBodies {
        let polygons = vec![square(0.0, 0.0, 30.0), square(5.0, 5.0, 20.0), flap];
        let depths = nesting_depths(&polygons, 0.001).unwrap();
        assert_eq!(depths, vec![0, 1, 2]);
        LayerBodies { polygons, depths }
    }

    #[test]
    fn test_body_in_window_survives() {
        let bodies = framed(square(10.0, 10.0, 10.0));
        let region = bodies.region().unwrap();
        let cut = bodies.separation_cut(0.1).unwrap();
        assert!(!cut.contains_point(&Point2::new(15.0, 15.0)));
        assert!(cut.contains_point(&Point2::new(7.0, 7.0)));

        let device = region.difference(&cut).unwrap();
        assert!(device.contains_point(&Point2::new(15.0, 15.0)));
        // frame 900 - 400 plus the flap, nothing touches so no kerf
        assert_relative_eq!(device.area(), 600.0, epsilon = 1e-3);
    }

    #[test]
    fn test_body_touching_window_edge_gets_kerf() {
        let bodies = framed(Layer::rectangle(
            Point2::new(5.0, 10.0),
            Point2::new(15.0, 20.0),
        ));
        let cut = bodies.separation_cut(0.1).unwrap();
        assert!(cut.contains_point(&Point2::new(5.0, 15.0)));
        assert!(!cut.contains_point(&Point2::new(10.0, 15.0)));
        assert!(!cut.contains_point(&Point2::new(2.0, 15.0)));
    }
}
