// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - table and drawing parsing, importing, and exporting

pub mod dxf;
mod exporter;
mod importer;
mod preview;
mod report;
mod tables;

pub use dxf::{parse_dxf, DxfDrawing, DxfWriter};
pub use exporter::{
    export_layers, export_release, layer_name, layout_layers, pass_name, render_layers,
    render_release, Staged, PASS_PALETTE,
};
pub use importer::{footprint_from_drawing, import_device, import_footprint, outline_path};
pub use preview::{encode_preview, render_preview, PASS_COLOURS};
pub use report::{PassSummary, PlanReport};
pub use tables::{
    joints_from_rows, layer_table_from_rows, parse_csv, read_joint_table, read_layer_table,
};
