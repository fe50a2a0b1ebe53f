//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.
//!
//! - `FULLPRICE_DATABASE_PATH`: SQLite database file (default `<project>/data/fullprice.db`)
//! - `FULLPRICE_STATIC_OUTPUT_DIR`: where the exporter writes JSON (default `<project>/static_data`)
//! - `RUST_LOG`: log filter, on top of the built-in `fullprice=info`

use std::path::PathBuf;

pub const DATABASE_PATH_VAR: &str = "FULLPRICE_DATABASE_PATH";
pub const STATIC_OUTPUT_DIR_VAR: &str = "FULLPRICE_STATIC_OUTPUT_DIR";

/// Default log directive applied before `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "fullprice=info";

/// Resolved configuration for the binaries
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub static_output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: env_path(DATABASE_PATH_VAR)
                .unwrap_or_else(|| project_root().join("data").join("fullprice.db")),
            static_output_dir: env_path(STATIC_OUTPUT_DIR_VAR)
                .unwrap_or_else(|| project_root().join("static_data")),
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Directory of the running executable, lifted out of `target/{debug,release}`
fn project_root() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path
}

/// Initialize the tracing subscriber. Output goes to stderr so stdout stays
/// free for the MCP transport.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
