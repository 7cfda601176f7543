// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Laminate Planner
//!
//! Turns a layered device (per-layer component outlines plus hinge joints)
//! into laser-cut drawings: one outline per layer and a multi-pass release
//! cut that frees the device from the surrounding sheet.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod io;
pub mod joints;
pub mod kernel;
pub mod planner;

pub use assembler::{assemble, Device};
pub use config::PlannerConfig;
pub use error::{Error, GeometryError, InputError, Result};
pub use geometry::{Laminate, Layer, Segment};
pub use input::{resolve, DeviceInput, ResolvedInput};
pub use joints::{JointStyle, StyleTag};
pub use kernel::{Kernel, Outcome, Stage, Written};
pub use planner::{plan, Plan};

use std::path::Path;

/// Plan a device directory with the configuration found next to it
pub fn plan_directory(dir: impl AsRef<Path>) -> Result<(Outcome, Written)> {
    let dir = dir.as_ref();
    let config = PlannerConfig::load(dir)?;
    Kernel::new(config).process_dir(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory() {
        let result = plan_directory("/nonexistent/device");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
