// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Drawing export: laid out layer geometry and multi-pass release cuts

use super::dxf::DxfWriter;
use crate::error::{Error, Result};
use crate::geometry::{Laminate, Layer};
use crate::planner::ReleaseCuts;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// ACI colours for release passes: red, blue, green, magenta
pub const PASS_PALETTE: [i16; 4] = [1, 5, 3, 6];

/// Colour used for layer outlines
const LAYER_COLOUR: i16 = 7;

pub fn layer_name(index: usize) -> String {
    format!("LAYER_{}", index)
}

pub fn pass_name(index: usize) -> String {
    format!("PASS_{}", index)
}

/// Stack the layers of `laminate` vertically so they do not overlap. Layer
/// `i` moves up by `i * (h + gap_ratio * h)` where `h` is the height of the
/// whole stack's footprint.
pub fn layout_layers(laminate: &Laminate, gap_ratio: f64) -> Vec<Layer> {
    let h = laminate.bounding_box().height();
    let pitch = h + gap_ratio * h;
    laminate
        .iter()
        .enumerate()
        .map(|(i, layer)| layer.translate(0.0, i as f64 * pitch))
        .collect()
}

/// Drawing of every ring of every laid out layer as closed polylines
pub fn render_layers(layers: &[Layer]) -> std::io::Result<Vec<u8>> {
    let table: Vec<(String, i16)> = (0..layers.len())
        .map(|i| (layer_name(i), LAYER_COLOUR))
        .collect();

    let mut dxf = DxfWriter::new(Vec::new(), &table)?;
    for (i, layer) in layers.iter().enumerate() {
        let name = layer_name(i);
        for ring in layer.rings() {
            dxf.lwpolyline(&name, &ring.points, true)?;
        }
    }
    dxf.finish()
}

pub fn export_layers(path: impl AsRef<Path>, layers: &[Layer]) -> Result<()> {
    let path = path.as_ref();
    let bytes = render_layers(layers).map_err(|e| Error::io(path, e))?;
    let mut staged = Staged::new();
    staged.add(path, bytes);
    staged.commit()?;

    info!(path = %path.display(), layers = layers.len(), "layer drawing written");
    Ok(())
}

/// Drawing of the release cut, one DXF layer and colour per pass, with the
/// warnings raised (palette overflow)
pub fn render_release(release: &ReleaseCuts) -> std::io::Result<(Vec<u8>, Vec<String>)> {
    let passes = release.passes();
    let mut warnings = Vec::new();
    if passes.len() > PASS_PALETTE.len() {
        let message = format!(
            "{} release passes but only {} distinct colours; colours are reused",
            passes.len(),
            PASS_PALETTE.len()
        );
        warn!("{}", message);
        warnings.push(message);
    }

    let table: Vec<(String, i16)> = (0..passes.len())
        .map(|k| (pass_name(k), PASS_PALETTE[k % PASS_PALETTE.len()]))
        .collect();

    let mut dxf = DxfWriter::new(Vec::new(), &table)?;
    for (k, pass) in passes.iter().enumerate() {
        let (name, colour) = &table[k];
        for segment in pass.iter() {
            dxf.line(name, *colour, segment)?;
        }
    }
    debug!(
        passes = passes.len(),
        segments = passes.iter().map(|p| p.len()).sum::<usize>(),
        "release drawing rendered"
    );
    Ok((dxf.finish()?, warnings))
}

pub fn export_release(path: impl AsRef<Path>, release: &ReleaseCuts) -> Result<Vec<String>> {
    let path = path.as_ref();
    let (bytes, warnings) = render_release(release).map_err(|e| Error::io(path, e))?;
    let mut staged = Staged::new();
    staged.add(path, bytes);
    staged.commit()?;

    info!(path = %path.display(), "release drawing written");
    Ok(warnings)
}

/// Output files rendered in memory and written as one batch
#[derive(Debug, Default)]
pub struct Staged {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl Staged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, contents: Vec<u8>) {
        self.files.push((path.into(), contents));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file to a temporary sibling, then rename them all into
    /// place. No destination is touched unless every write succeeded.
    pub fn commit(self) -> Result<()> {
        let mut pending = Vec::with_capacity(self.files.len());
        for (path, contents) in &self.files {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
            file.write_all(contents)
                .and_then(|_| file.as_file().sync_all())
                .map_err(|e| Error::io(path, e))?;
            pending.push((file, path));
        }

        for (file, path) in pending {
            file.persist(path).map_err(|e| Error::io(path, e.error))?;
        }
        debug!(files = self.files.len(), "staged files committed");
        Ok(())
    }
}
