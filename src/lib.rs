//! The Full Price Library
//!
//! Lifecycle impact engine, catalog storage and static data publishing for
//! consumer products.

pub mod build_info;
pub mod config;
pub mod db;
pub mod export;
pub mod impact;
pub mod mcp;
pub mod models;
pub mod tools;
