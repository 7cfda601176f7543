// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ordered layer stacks
//!
//! Index 0 is one face of the stack and `len() - 1` the opposite face. All
//! layers share one planar frame. Layer-wise booleans run in parallel since
//! layers never interact in them.

use super::{BooleanOp, BoundingBox, Layer};
use crate::error::GeometryError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::{Index, Range};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Laminate {
    layers: Vec<Layer>,
}

impl Laminate {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// `n` empty layers
    pub fn empty(n: usize) -> Self {
        Self::new(vec![Layer::empty(); n])
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// True when every layer is empty
    pub fn is_void(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    pub fn get(&self, index: usize) -> Result<&Layer, GeometryError> {
        self.layers.get(index).ok_or(GeometryError::IndexOutOfRange {
            index,
            len: self.layers.len(),
        })
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Laminate, GeometryError> {
        if range.start > range.end || range.end > self.len() {
            return Err(GeometryError::IndexOutOfRange {
                index: range.end,
                len: self.len(),
            });
        }
        Ok(Laminate::new(self.layers[range].to_vec()))
    }

    pub fn reversed(&self) -> Laminate {
        let mut layers = self.layers.clone();
        layers.reverse();
        Laminate::new(layers)
    }

    pub fn boolean(&self, other: &Laminate, op: BooleanOp) -> Result<Laminate, GeometryError> {
        if self.len() != other.len() {
            return Err(GeometryError::LayerCountMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        let layers = self
            .layers
            .par_iter()
            .zip(other.layers.par_iter())
            .map(|(a, b)| a.boolean(b, op))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Laminate::new(layers))
    }

    pub fn union(&self, other: &Laminate) -> Result<Laminate, GeometryError> {
        self.boolean(other, BooleanOp::Union)
    }

    pub fn difference(&self, other: &Laminate) -> Result<Laminate, GeometryError> {
        self.boolean(other, BooleanOp::Difference)
    }

    pub fn intersection(&self, other: &Laminate) -> Result<Laminate, GeometryError> {
        self.boolean(other, BooleanOp::Intersection)
    }

    pub fn symmetric_difference(&self, other: &Laminate) -> Result<Laminate, GeometryError> {
        self.boolean(other, BooleanOp::SymmetricDifference)
    }

    pub fn map<F>(&self, f: F) -> Laminate
    where
        F: Fn(&Layer) -> Layer + Sync + Send,
    {
        Laminate::new(self.layers.par_iter().map(f).collect())
    }

    pub fn dilate(&self, distance: f64) -> Laminate {
        self.map(|l| l.dilate(distance))
    }

    pub fn erode(&self, distance: f64) -> Laminate {
        self.map(|l| l.erode(distance))
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Laminate {
        self.map(|l| l.translate(dx, dy))
    }

    pub fn mirror_x(&self) -> Laminate {
        self.map(Layer::mirror_x)
    }

    pub fn cleanup(&self, epsilon: f64, min_area: f64) -> Laminate {
        self.map(|l| l.cleanup(epsilon, min_area))
    }

    /// Flatten the stack into one layer
    pub fn unary_union(&self) -> Result<Layer, GeometryError> {
        Layer::union_all(self.layers.iter())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.layers
            .iter()
            .map(Layer::bounding_box)
            .fold(BoundingBox::empty(), |acc, b| acc.merge(&b))
    }

    pub fn total_area(&self) -> f64 {
        self.layers.iter().map(Layer::area).sum()
    }
}

impl Index<usize> for Laminate {
    type Output = Layer;

    fn index(&self, index: usize) -> &Layer {
        &self.layers[index]
    }
}

impl FromIterator<Layer> for Laminate {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        Laminate::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Laminate {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(s: f64) -> Layer {
        Layer::rectangle(Point2::new(0.0, 0.0), Point2::new(s, s))
    }

    #[test]
    fn test_layer_count_mismatch() {
        let a = square(1.0).to_laminate(5);
        let b = square(1.0).to_laminate(1);
        assert_eq!(
            a.union(&b),
            Err(GeometryError::LayerCountMismatch { left: 5, right: 1 })
        );
    }

    #[test]
    fn test_layerwise_difference() {
        let a = square(10.0).to_laminate(3);
        let b = Laminate::new(vec![Layer::empty(), square(5.0), square(10.0)]);
        let diff = a.difference(&b).unwrap();
        assert_relative_eq!(diff[0].area(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(diff[1].area(), 75.0, epsilon = 1e-6);
        assert!(diff[2].is_empty());
    }

    #[test]
    fn test_get_out_of_range() {
        let lam = Laminate::empty(2);
        assert!(lam.get(1).is_ok());
        assert_eq!(
            lam.get(2),
            Err(GeometryError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_slice_and_reverse() {
        let lam = Laminate::new(vec![square(1.0), Layer::empty(), square(2.0)]);
        let rev = lam.reversed();
        assert_relative_eq!(rev[0].area(), 4.0);
        let sliced = lam.slice(1..3).unwrap();
        assert_eq!(sliced.len(), 2);
        assert!(lam.slice(2..4).is_err());
    }
}
