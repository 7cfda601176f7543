// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Joint library
//!
//! A joint style turns one trimmed joint segment into a small block of layers:
//! the `keep` laminate (flexure material that must survive) and the `cut`
//! laminate (the rest of the joint footprint, removed from the device).
//! Blocks are local to the joint and get placed into the device stack with
//! [`align`].

mod generators;

use crate::config::JointsConfig;
use crate::error::GeometryError;
use crate::geometry::{Laminate, Segment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Style names accepted in joint tables (`NAME=STYLE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    Plain5,
    Plain1,
    Stamp,
    Bend,
    Dashed,
}

impl StyleTag {
    /// Style used when a joint names none: a five layer flexure when the
    /// stack is tall enough for one, else a single-layer hinge
    pub fn default_for(layers: usize) -> StyleTag {
        if layers >= 5 {
            StyleTag::Plain5
        } else {
            StyleTag::Plain1
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StyleTag::Plain5 => "plain5",
            StyleTag::Plain1 => "plain1",
            StyleTag::Stamp => "stamp",
            StyleTag::Bend => "bend",
            StyleTag::Dashed => "dashed",
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain5" => Ok(StyleTag::Plain5),
            "plain1" => Ok(StyleTag::Plain1),
            "stamp" => Ok(StyleTag::Stamp),
            "bend" => Ok(StyleTag::Bend),
            "dashed" => Ok(StyleTag::Dashed),
            other => Err(format!("unknown joint style '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlainParams {
    pub width: f64,
    /// Length offset; negative shortens the flexure
    pub dl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampParams {
    pub width: f64,
    pub dl: f64,
    pub tooth_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendParams {
    pub width: f64,
    pub dl: f64,
    pub widen: f64,
    pub rib_width: f64,
    pub rib_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashedParams {
    pub width: f64,
    pub dl: f64,
    pub tooth_length: f64,
    pub gap: f64,
    pub pad: f64,
    pub slot_width: f64,
}

/// A joint style together with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JointStyle {
    /// rigid, adhesive, flex, adhesive, rigid
    Plain5(PlainParams),
    /// Single layer kept continuous across the joint
    Plain1(PlainParams),
    /// Five layer flexure with interlocking teeth
    Stamp5(StampParams),
    /// Five layer flexure with relief ribs
    Bend5(BendParams),
    /// Perforated single-layer hinge
    Dashed1(DashedParams),
}

/// Keep and cut blocks of one joint segment
#[derive(Debug, Clone)]
pub struct JointMask {
    pub keep: Laminate,
    pub cut: Laminate,
}

impl JointStyle {
    pub fn from_tag(tag: StyleTag, config: &JointsConfig) -> JointStyle {
        let width = config.width;
        let dl = config.length_offset;
        match tag {
            StyleTag::Plain5 => JointStyle::Plain5(PlainParams { width, dl }),
            StyleTag::Plain1 => JointStyle::Plain1(PlainParams { width, dl }),
            StyleTag::Stamp => JointStyle::Stamp5(StampParams {
                width,
                dl,
                tooth_length: config.stamp_tooth_length,
            }),
            StyleTag::Bend => JointStyle::Bend5(BendParams {
                width,
                dl,
                widen: config.bend_widen,
                rib_width: config.bend_rib_width,
                rib_factor: config.bend_rib_factor,
            }),
            StyleTag::Dashed => JointStyle::Dashed1(DashedParams {
                width,
                dl,
                tooth_length: config.dashed_tooth_length,
                gap: config.dashed_gap,
                pad: config.dashed_pad,
                slot_width: config.dashed_slot_width,
            }),
        }
    }

    pub fn tag(&self) -> StyleTag {
        match self {
            JointStyle::Plain5(_) => StyleTag::Plain5,
            JointStyle::Plain1(_) => StyleTag::Plain1,
            JointStyle::Stamp5(_) => StyleTag::Stamp,
            JointStyle::Bend5(_) => StyleTag::Bend,
            JointStyle::Dashed1(_) => StyleTag::Dashed,
        }
    }

    /// Number of layers in the generated block
    pub fn layer_count(&self) -> usize {
        match self {
            JointStyle::Plain5(_) | JointStyle::Stamp5(_) | JointStyle::Bend5(_) => 5,
            JointStyle::Plain1(_) | JointStyle::Dashed1(_) => 1,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            JointStyle::Plain5(p) | JointStyle::Plain1(p) => p.width,
            JointStyle::Stamp5(p) => p.width,
            JointStyle::Bend5(p) => p.width,
            JointStyle::Dashed1(p) => p.width,
        }
    }

    /// Same style with a different width and length offset
    pub fn resized(&self, width: f64, dl: f64) -> JointStyle {
        let mut style = *self;
        match &mut style {
            JointStyle::Plain5(p) | JointStyle::Plain1(p) => {
                p.width = width;
                p.dl = dl;
            }
            JointStyle::Stamp5(p) => {
                p.width = width;
                p.dl = dl;
            }
            JointStyle::Bend5(p) => {
                p.width = width;
                p.dl = dl;
            }
            JointStyle::Dashed1(p) => {
                p.width = width;
                p.dl = dl;
            }
        }
        style
    }

    /// Keep and cut blocks for one joint segment
    pub fn generate(&self, segment: &Segment) -> Result<JointMask, GeometryError> {
        let (keep, footprint) = match self {
            JointStyle::Plain5(p) => generators::plain5(segment, p),
            JointStyle::Plain1(p) => generators::plain1(segment, p),
            JointStyle::Stamp5(p) => generators::stamp5(segment, p)?,
            JointStyle::Bend5(p) => generators::bend5(segment, p)?,
            JointStyle::Dashed1(p) => generators::dashed1(segment, p)?,
        };
        let cut = footprint.difference(&keep)?;
        Ok(JointMask { keep, cut })
    }

    /// Keep block at reduced width, shielding the joint from body kerfs
    pub fn protection_mask(
        &self,
        segment: &Segment,
        mask_width: f64,
        kerf: f64,
    ) -> Result<Laminate, GeometryError> {
        Ok(self.resized(mask_width, -kerf).generate(segment)?.keep)
    }
}

/// Place a joint-local block into a stack of `layers`, centred on `anchor`.
/// Block layers that fall outside the stack are dropped.
pub fn align(block: &Laminate, anchor: usize, layers: usize) -> Laminate {
    let start = anchor as isize - (block.len() / 2) as isize;
    let mut stack = Laminate::empty(layers).into_layers();
    for (offset, layer) in block.iter().enumerate() {
        let target = start + offset as isize;
        if target < 0 || target >= layers as isize {
            if !layer.is_empty() {
                debug!(target, layers, "joint block layer falls outside the stack");
            }
            continue;
        }
        stack[target as usize] = layer.clone();
    }
    Laminate::new(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Layer;
    use nalgebra::Point2;

    #[test]
    fn test_style_tags() {
        assert_eq!("STAMP".parse::<StyleTag>(), Ok(StyleTag::Stamp));
        assert!("hinge".parse::<StyleTag>().is_err());
        assert_eq!(StyleTag::default_for(5), StyleTag::Plain5);
        assert_eq!(StyleTag::default_for(3), StyleTag::Plain1);
    }

    #[test]
    fn test_from_tag_round_trip() {
        let config = JointsConfig::default();
        for tag in [
            StyleTag::Plain5,
            StyleTag::Plain1,
            StyleTag::Stamp,
            StyleTag::Bend,
            StyleTag::Dashed,
        ] {
            let style = JointStyle::from_tag(tag, &config);
            assert_eq!(style.tag(), tag);
            assert_eq!(style.width(), config.width);
        }
    }

    #[test]
    fn test_align_centres_block() {
        let square = Layer::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let block = Laminate::new(vec![
            square.clone(),
            Layer::empty(),
            square.clone(),
            Layer::empty(),
            square,
        ]);
        let placed = align(&block, 2, 5);
        assert_eq!(placed, block);

        let shifted = align(&block, 0, 3);
        assert_eq!(shifted.len(), 3);
        assert!(!shifted[0].is_empty());
        assert!(shifted[1].is_empty());
        assert!(!shifted[2].is_empty());
    }

    #[test]
    fn test_resized_keeps_style() {
        let style = JointStyle::from_tag(StyleTag::Bend, &JointsConfig::default());
        let mask = style.resized(0.5, -0.1);
        assert_eq!(mask.tag(), StyleTag::Bend);
        assert_eq!(mask.width(), 0.5);
    }
}
