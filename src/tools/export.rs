//! Export Tool
//!
//! Regenerates the static JSON files from the current catalog.

use std::path::Path;

use crate::db::Database;
use crate::export::{ExportSummary, StaticDataExporter};

/// Write products, posts and per-post files to `output_dir`
pub fn export_static_data(db: &Database, output_dir: &Path) -> Result<ExportSummary, String> {
    StaticDataExporter::new(output_dir)
        .export_all(db)
        .map_err(|e| format!("Export failed: {}", e))
}
