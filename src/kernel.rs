// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API for the planning pipeline
//!
//! Stages run strictly in order (resolve, assemble, plan, export) and each
//! consumes only the previous stage's output. Nothing is written to disk
//! until every geometry stage has succeeded.

use crate::assembler::{self, Device};
use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::geometry::Layer;
use crate::input::{self, DeviceInput, ResolvedInput};
use crate::io::{self, PlanReport, Staged};
use crate::planner::{self, Plan};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Import,
    Resolve,
    Assemble,
    Plan,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Import,
        Stage::Resolve,
        Stage::Assemble,
        Stage::Plan,
        Stage::Export,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Import => "import",
            Stage::Resolve => "resolve",
            Stage::Assemble => "assemble",
            Stage::Plan => "plan",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Result of the geometry stages
#[derive(Debug, Clone)]
pub struct Outcome {
    pub input: ResolvedInput,
    pub device: Device,
    pub plan: Plan,
    pub warnings: Vec<String>,
}

/// Files produced by an export
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub layers: PathBuf,
    pub release: PathBuf,
    pub report: PathBuf,
    pub preview: Option<PathBuf>,
}

/// Main kernel for planning a laminate device
pub struct Kernel {
    config: PlannerConfig,
    twin: bool,
    keepout: Option<Layer>,
    preview: bool,
}

impl Kernel {
    /// Create a new kernel
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            twin: false,
            keepout: None,
            preview: false,
        }
    }

    /// Plan a mirrored copy beside the device
    pub fn with_twin(mut self, twin: bool) -> Self {
        self.twin = twin;
        self
    }

    /// Extra region the laser must never cross
    pub fn with_keepout(mut self, keepout: Layer) -> Self {
        self.keepout = Some(keepout);
        self
    }

    /// Also render a PNG preview when exporting
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Read a device directory
    pub fn import(&self, dir: impl AsRef<Path>) -> Result<(DeviceInput, Vec<String>)> {
        io::import_device(dir, &self.config.io)
    }

    pub fn resolve(&self, input: DeviceInput) -> Result<ResolvedInput> {
        input::resolve(input, &self.config)
    }

    pub fn assemble(&self, input: &ResolvedInput) -> Result<Device> {
        let device = assembler::assemble(input, &self.config)?;
        if self.twin {
            device.with_twin(self.config.plan.jig_hole_spacing)
        } else {
            Ok(device)
        }
    }

    pub fn plan(&self, device: &Device) -> Result<Plan> {
        planner::plan(&device.laminate, &self.config, self.keepout.as_ref())
    }

    /// Resolve, assemble and plan
    pub fn run(&self, input: DeviceInput) -> Result<Outcome> {
        self.config.validate()?;
        let input = self.resolve(input)?;
        let device = self.assemble(&input)?;
        let plan = self.plan(&device)?;
        let warnings = input.warnings.clone();
        Ok(Outcome {
            input,
            device,
            plan,
            warnings,
        })
    }

    /// Write the layer and release drawings, the report and optionally the
    /// preview into `dir`. Everything is rendered before the first file is
    /// written, and the files land together or not at all.
    pub fn export(&self, outcome: &mut Outcome, dir: impl AsRef<Path>) -> Result<Written> {
        let dir = dir.as_ref();
        let io_cfg = &self.config.io;
        let laid_out = io::layout_layers(&outcome.plan.layers_cut, io_cfg.gap_ratio);
        let mut staged = Staged::new();

        let layers = dir.join(format!("{}.dxf", io_cfg.layers_file));
        let drawing = io::render_layers(&laid_out).map_err(|e| Error::io(&layers, e))?;
        staged.add(&layers, drawing);

        let release = dir.join(format!("{}.dxf", io_cfg.release_file));
        let (drawing, release_warnings) =
            io::render_release(&outcome.plan.release).map_err(|e| Error::io(&release, e))?;
        staged.add(&release, drawing);
        outcome.warnings.extend(release_warnings);

        let preview = if self.preview {
            let path = dir.join(&io_cfg.preview_file);
            let image = io::render_preview(
                &laid_out,
                &outcome.plan.release.passes(),
                io_cfg.preview_size,
            );
            staged.add(&path, io::encode_preview(&image)?);
            Some(path)
        } else {
            None
        };

        let report = dir.join(&io_cfg.report_file);
        let summary = PlanReport::new(
            &outcome.input,
            &outcome.device,
            &outcome.plan,
            &outcome.warnings,
        );
        let json = summary
            .to_json()
            .map_err(|e| Error::io(&report, e.into()))?;
        staged.add(&report, json.into_bytes());

        staged.commit()?;
        info!(dir = %dir.display(), "outputs written");

        Ok(Written {
            layers,
            release,
            report,
            preview,
        })
    }

    /// Import, plan and export a device directory in place
    pub fn process_dir(&self, dir: impl AsRef<Path>) -> Result<(Outcome, Written)> {
        let dir = dir.as_ref();
        info!(dir = %dir.display(), "processing device directory");
        let (input, import_warnings) = self.import(dir)?;
        let mut outcome = self.run(input)?;
        outcome.warnings.splice(0..0, import_warnings);
        let written = self.export(&mut outcome, dir)?;
        Ok((outcome, written))
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
