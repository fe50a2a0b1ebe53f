//! The Full Price
//!
//! An MCP server for product lifecycle impacts.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

use fullprice::build_info::BuildInfo;
use fullprice::config::{self, Config};
use fullprice::db::{self, Database};
use fullprice::mcp::FullPriceService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging goes to stderr; stdout is the MCP transport
    config::init_logging()?;

    tracing::info!("{}", BuildInfo::current().banner());
    let config = Config::from_env();
    tracing::info!(path = %config.database_path.display(), "Opening database");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        tracing::info!(version, "Database schema ready");
        Ok(())
    })?;

    let service = FullPriceService::new(config.database_path, database, config.static_output_dir);

    tracing::info!("Starting MCP server on stdio");
    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
