//! MCP server
//!
//! Tool server over stdio.

mod server;

pub use server::FullPriceService;
