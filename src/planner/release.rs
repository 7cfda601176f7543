// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Keepout, support and the release cut
//!
//! The release cut follows the keepout boundary. Segments that only ever
//! separate material on a thin layer go into that layer's own pass; the rest
//! are cut through the whole stack.

use crate::error::GeometryError;
use crate::geometry::{Laminate, Layer, Segment};
use serde::Serialize;

/// Region the laser must never cross: the device footprint over the whole
/// stack plus an optional caller mask
pub fn keepout(device: &Laminate, extra: Option<&Layer>) -> Result<Laminate, GeometryError> {
    let mut region = device.unary_union()?;
    if let Some(mask) = extra {
        region = region.union(mask)?;
    }
    Ok(region.to_laminate(device.len()))
}

/// Band of scrap hugging the keepout so parts cannot drop out early
pub fn support(
    device: &Laminate,
    keepout: &Laminate,
    width: f64,
    offset: f64,
    cleanup: (f64, f64),
) -> Result<Laminate, GeometryError> {
    let band = keepout.dilate(width).difference(keepout)?;
    let clear = if offset > 0.0 {
        device.dilate(offset)
    } else {
        device.clone()
    };
    Ok(band.difference(&clear)?.cleanup(cleanup.0, cleanup.1))
}

/// Boundary of the keepout as seen from the scrap side: the edges of every
/// hole `keepout` punches into `sheet`
pub fn release_segments(sheet: &Layer, keepout: &Layer) -> Result<Vec<Segment>, GeometryError> {
    let scrap = sheet.difference(keepout)?;
    Ok(scrap
        .rings()
        .iter()
        .filter(|r| r.is_hole())
        .flat_map(|r| r.edges())
        .collect())
}

/// Material the release cut actually has to sever, per layer
pub fn material_cut(
    supported: &Laminate,
    release_scrap: &Laminate,
    kerf: f64,
) -> Result<Laminate, GeometryError> {
    let released = supported.difference(&release_scrap.dilate(kerf / 2.0))?;
    released.dilate(kerf).intersection(release_scrap)
}

/// Parameters for isolating single-layer regions
#[derive(Debug, Clone, Copy)]
pub struct Isolation {
    pub min_area: f64,
    pub sliver: f64,
    pub margin: f64,
}

/// Region of `material_cut` that exists on `thin` and on no other layer
pub fn single_layer_region(
    material_cut: &Laminate,
    thin: usize,
    params: Isolation,
) -> Result<Layer, GeometryError> {
    let own = material_cut.get(thin)?;
    let others = Layer::union_all(
        material_cut
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != thin)
            .map(|(_, l)| l),
    )?;
    let only = own.difference(&others)?.filter_small(params.min_area);
    let opened = if params.sliver > 0.0 {
        only.erode(params.sliver).dilate(params.sliver)
    } else {
        only
    };
    Ok(opened.dilate(params.margin))
}

/// One single-layer release pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleLayerPass {
    pub layer: usize,
    pub region: Layer,
    pub cuts: Vec<Segment>,
}

/// Release segments split into passes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReleaseCuts {
    /// Every release segment before classification
    pub segments: Vec<Segment>,
    pub full_stack: Vec<Segment>,
    pub single_layer: Vec<SingleLayerPass>,
}

impl ReleaseCuts {
    /// Split `segments` by the single-layer regions of the thin layers
    pub fn classify(
        segments: Vec<Segment>,
        regions: Vec<(usize, Layer)>,
    ) -> Result<Self, GeometryError> {
        let mut single_layer = Vec::with_capacity(regions.len());
        for (layer, region) in regions {
            let cuts = segments
                .iter()
                .flat_map(|s| region.clip_segment(s).inside)
                .collect();
            single_layer.push(SingleLayerPass { layer, region, cuts });
        }

        let claimed = Layer::union_all(single_layer.iter().map(|p| &p.region))?;
        let full_stack = segments
            .iter()
            .flat_map(|s| claimed.clip_segment(s).outside)
            .collect();

        Ok(Self {
            segments,
            full_stack,
            single_layer,
        })
    }

    /// Passes in cutting order: full stack first, then each single layer
    pub fn passes(&self) -> Vec<&[Segment]> {
        std::iter::once(self.full_stack.as_slice())
            .chain(self.single_layer.iter().map(|p| p.cuts.as_slice()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.full_stack.is_empty() && self.single_layer.iter().all(|p| p.cuts.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Layer {
        Layer::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_release_segments_trace_keepout() {
        let sheet = rect(-10.0, -10.0, 20.0, 20.0);
        let keepout = rect(0.0, 0.0, 10.0, 5.0);
        let segments = release_segments(&sheet, &keepout).unwrap();
        assert_eq!(segments.len(), 4);
        let total: f64 = segments.iter().map(Segment::length).sum();
        assert_relative_eq!(total, 30.0, epsilon = 1e-6);
    }

    #[test]
    fn test_keepout_covering_sheet_has_no_segments() {
        let sheet = rect(0.0, 0.0, 10.0, 10.0);
        let keepout = rect(-1.0, -1.0, 11.0, 11.0);
        assert!(release_segments(&sheet, &keepout).unwrap().is_empty());
    }

    #[test]
    fn test_classify_splits_segment() {
        let segment = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let region = rect(4.0, -1.0, 6.0, 1.0);
        let cuts = ReleaseCuts::classify(vec![segment], vec![(2, region)]).unwrap();
        assert_eq!(cuts.single_layer.len(), 1);
        assert_eq!(cuts.single_layer[0].cuts.len(), 1);
        assert_relative_eq!(cuts.single_layer[0].cuts[0].length(), 2.0, epsilon = 1e-9);
        assert_eq!(cuts.full_stack.len(), 2);
        assert_eq!(cuts.passes().len(), 2);
    }

    #[test]
    fn test_single_layer_region() {
        let material = Laminate::new(vec![
            rect(0.0, 0.0, 4.0, 1.0),
            rect(0.0, 0.0, 10.0, 1.0),
            rect(0.0, 0.0, 4.0, 1.0),
        ]);
        let params = Isolation {
            min_area: 0.01,
            sliver: 0.01,
            margin: 0.0,
        };
        let region = single_layer_region(&material, 1, params).unwrap();
        assert_relative_eq!(region.area(), 6.0, epsilon = 1e-3);
    }

    #[test]
    fn test_support_band_clears_device() {
        let device = Laminate::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let keepout = keepout(&device, None).unwrap();
        let band = support(&device, &keepout, 2.0, 0.5, (0.001, 1e-4)).unwrap();

        // 14x14 less the device grown by the offset
        assert_relative_eq!(band[0].area(), 196.0 - 121.0, epsilon = 1e-3);
        assert!(band[0].contains_point(&Point2::new(-1.0, 5.0)));
        assert!(!band[0].contains_point(&Point2::new(-0.25, 5.0)));
        assert!(!band[0].contains_point(&Point2::new(5.0, 5.0)));
        assert!(!band[0].contains_point(&Point2::new(-3.0, 5.0)));
    }

    #[test]
    fn test_material_cut_follows_attached_edge() {
        let sheet = rect(-5.0, -5.0, 15.0, 15.0);
        let device = rect(0.0, 0.0, 10.0, 10.0);
        let web = rect(-4.0, 0.0, -2.0, 10.0);
        let supported = Laminate::new(vec![device.union(&web).unwrap()]);
        let scrap = Laminate::new(vec![sheet.difference(&device).unwrap()]);

        let cut = material_cut(&supported, &scrap, 0.1).unwrap();
        // a kerf-wide ring just outside the device
        assert_relative_eq!(cut[0].area(), 10.1 * 10.1 - 100.0, epsilon = 1e-3);
        assert!(cut[0].contains_point(&Point2::new(-0.025, 5.0)));
        assert!(!cut[0].contains_point(&Point2::new(5.0, 5.0)));
        assert!(!cut[0].contains_point(&Point2::new(-3.0, 5.0)));
    }
}
