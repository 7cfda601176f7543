// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the planning pipeline
//!
//! Malformed input is fatal and never retried. Geometry validity failures are
//! repaired locally once (see [`crate::geometry::repair_and_retry`]) and only
//! reach this type when the repair did not help. Soft failures such as a joint
//! without any overlap are not errors at all; they are logged as warnings.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by the geometry container
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The boolean kernel rejected its operands, even after repair
    #[error("invalid geometry during {op}: {reason}")]
    Invalid { op: &'static str, reason: String },

    /// Layer-wise operation between laminates of different height
    #[error("laminate layer count mismatch: {left} vs {right}")]
    LayerCountMismatch { left: usize, right: usize },

    /// Layer index outside the laminate
    #[error("layer index {index} out of range for laminate with {len} layers")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Malformed or inconsistent device description
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("joint '{joint}' references unknown component '{component}'")]
    UnknownComponent { joint: String, component: String },

    #[error("component '{component}' has no outline on layer {layer} (needed by joint '{joint}')")]
    ComponentNotOnLayer {
        joint: String,
        component: String,
        layer: usize,
    },

    #[error("incorrect joint name format '{0}'; expected NAME or NAME=STYLE")]
    MalformedJointName(String),

    #[error("joint '{joint}' anchor z={z} lies outside the layer stack")]
    JointOutsideStack { joint: String, z: f64 },

    #[error("joint '{0}' axis has no planar component")]
    DegenerateAxis(String),

    #[error("{table} row {row}: {reason}")]
    BadRow {
        table: &'static str,
        row: usize,
        reason: String,
    },

    #[error("layer table is empty")]
    EmptyStack,

    #[error("layer indices must be contiguous from 0; missing layer {0}")]
    MissingLayer(usize),
}

/// Errors that can occur while planning a device
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse table {path}: {reason}")]
    Table { path: PathBuf, reason: String },

    #[error("failed to parse DXF {path}: {reason}")]
    Dxf { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("preview rendering failed: {0}")]
    Preview(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_message() {
        let err: Error = GeometryError::LayerCountMismatch { left: 5, right: 1 }.into();
        assert_eq!(err.to_string(), "laminate layer count mismatch: 5 vs 1");
    }

    #[test]
    fn test_input_error_message() {
        let err = InputError::MalformedJointName("a=b=c".into());
        assert!(err.to_string().contains("NAME=STYLE"));
    }
}
