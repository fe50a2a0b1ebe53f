//! Export the catalog and published posts as static JSON
//!
//! Usage: `export_static [OUTPUT_DIR]`. Without an argument the directory
//! comes from `FULLPRICE_STATIC_OUTPUT_DIR` or defaults to `<project>/static_data`.

use std::path::PathBuf;

use fullprice::config::{self, Config};
use fullprice::db::{migrations, Database};
use fullprice::export::StaticDataExporter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init_logging()?;

    let config = Config::from_env();
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or(config.static_output_dir);

    println!("Database path: {}", config.database_path.display());
    println!("Output directory: {}", output_dir.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database = Database::new(&config.database_path)?;
    database.with_conn(migrations::run_migrations)?;

    let summary = StaticDataExporter::new(&output_dir).export_all(&database)?;

    println!("Exported {} products", summary.products);
    println!("Exported {} posts ({} post files)", summary.posts, summary.post_files);
    println!("Timestamp: {}", summary.export_timestamp);

    Ok(())
}
