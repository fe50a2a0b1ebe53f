//! Static export
//!
//! JSON views of products and posts, and the exporter that writes them.

pub mod exporter;
pub mod view;

pub use exporter::{ExportError, ExportResult, ExportSummary, StaticDataExporter};
pub use view::{to_export_view, ComparisonView, ComponentView, PostView, ProductView, UsePhaseView};
