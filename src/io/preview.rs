// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PNG preview of a cutting plan
//!
//! Layers are scanline-filled with the non-zero rule and cut paths are drawn
//! on top in their pass colour.

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Layer, Segment};
use image::{ImageFormat, Rgb, RgbImage};
use nalgebra::Point2;
use std::io::Cursor;

const BACKGROUND: Rgb<u8> = Rgb([15, 18, 26]);
const MATERIAL: Rgb<u8> = Rgb([180, 186, 196]);

/// Colours for cut passes, matching the DXF palette order
pub const PASS_COLOURS: [Rgb<u8>; 4] = [
    Rgb([230, 60, 60]),
    Rgb([70, 120, 240]),
    Rgb([70, 200, 90]),
    Rgb([220, 80, 220]),
];

/// World to pixel mapping with y pointing up
struct Viewport {
    bounds: BoundingBox,
    scale: f64,
    height: u32,
    margin: f64,
}

impl Viewport {
    fn fit(bounds: BoundingBox, max_size: u32) -> (Self, u32, u32) {
        let max_size = max_size.max(16);
        let span_x = bounds.width().max(1e-3);
        let span_y = bounds.height().max(1e-3);
        let margin = 8.0;
        let usable = max_size as f64 - 2.0 * margin;
        let scale = (usable / span_x).min(usable / span_y);
        let width = (span_x * scale + 2.0 * margin).ceil().max(1.0) as u32;
        let height = (span_y * scale + 2.0 * margin).ceil().max(1.0) as u32;
        (
            Self {
                bounds,
                scale,
                height,
                margin,
            },
            width,
            height,
        )
    }

    fn to_pixel(&self, p: &Point2<f64>) -> (f64, f64) {
        let x = (p.x - self.bounds.min.x) * self.scale + self.margin;
        let y = self.height as f64 - ((p.y - self.bounds.min.y) * self.scale + self.margin);
        (x, y)
    }
}

/// Rasterise `layers` and the cut `passes` into one image whose longer side
/// is at most `max_size` pixels
pub fn render_preview(layers: &[Layer], passes: &[&[Segment]], max_size: u32) -> RgbImage {
    let mut bounds = layers
        .iter()
        .map(Layer::bounding_box)
        .fold(BoundingBox::empty(), |acc, b| acc.merge(&b));
    for segment in passes.iter().flat_map(|p| p.iter()) {
        bounds.expand_to_include(&segment.start);
        bounds.expand_to_include(&segment.end);
    }
    if bounds.is_empty() {
        return RgbImage::from_pixel(max_size.max(16), max_size.max(16), BACKGROUND);
    }

    let (view, width, height) = Viewport::fit(bounds, max_size);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    for layer in layers {
        fill_layer(&mut image, &view, layer, MATERIAL);
    }
    for (i, pass) in passes.iter().enumerate() {
        let colour = PASS_COLOURS[i % PASS_COLOURS.len()];
        for segment in pass.iter() {
            draw_segment(&mut image, &view, segment, colour);
        }
    }
    image
}

/// PNG encoding of a rendered preview
pub fn encode_preview(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| Error::Preview(e.to_string()))?;
    Ok(bytes.into_inner())
}

fn fill_layer(image: &mut RgbImage, view: &Viewport, layer: &Layer, colour: Rgb<u8>) {
    let edges: Vec<((f64, f64), (f64, f64))> = layer
        .edges()
        .iter()
        .map(|e| (view.to_pixel(&e.start), view.to_pixel(&e.end)))
        .collect();
    if edges.is_empty() {
        return;
    }

    let (width, height) = image.dimensions();
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for py in 0..height {
        let y = py as f64 + 0.5;
        crossings.clear();
        for &((x0, y0), (x1, y1)) in &edges {
            // pixel y grows downwards, so a rising edge has y1 < y0
            let dir = if y0 <= y && y < y1 {
                -1
            } else if y1 <= y && y < y0 {
                1
            } else {
                continue;
            };
            let t = (y - y0) / (y1 - y0);
            crossings.push((x0 + t * (x1 - x0), dir));
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let start = pair[0].0.round().max(0.0) as u32;
            let end = (pair[1].0.round().max(0.0) as u32).min(width);
            for px in start..end {
                image.put_pixel(px, py, colour);
            }
        }
    }
}

fn draw_segment(image: &mut RgbImage, view: &Viewport, segment: &Segment, colour: Rgb<u8>) {
    let (x0, y0) = view.to_pixel(&segment.start);
    let (x1, y1) = view.to_pixel(&segment.end);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
    let (width, height) = image.dimensions();
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (x0 + t * (x1 - x0)).floor();
        let y = (y0 + t * (y1 - y0)).floor();
        if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
            image.put_pixel(x as u32, y as u32, colour);
        }
    }
}
