//! Tools module
//!
//! Operations behind the MCP tools: lookups with computed impacts, catalog
//! maintenance with input validation, export and status.

pub mod export;
pub mod materials;
pub mod posts;
pub mod products;
pub mod status;
pub mod validate;
