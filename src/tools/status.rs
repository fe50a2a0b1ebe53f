//! Status Tool
//!
//! Runtime status of the service, and data-entry instructions for
//! assistants editing the catalog.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::Product;

/// Catalog data-entry instructions for AI assistants
pub const CATALOG_INSTRUCTIONS: &str = r#"
# The Full Price Catalog Instructions

## Units

| Field | Unit |
|-------|------|
| Material factors | per **kilogram** of material |
| Component weight | **grams** (converted to kg by dividing by 1000) |
| Use-phase factors | per **single use** of the product |
| uses_per_year | uses per year (1 = yearly, 365 = daily) |
| average_lifespan_uses | uses before the product is replaced (1 = single-use) |

Metrics: greenhouse_gas_kg (kg CO2e), water_liters (L), energy_kwh (kWh),
land_m2 (m2), cost_usd (USD).

## Material phases

Each material has three phases: production, transport, end_of_life.
Factors that are unknown stay at 0 and contribute nothing. Put the citation
for each phase in its source field.

## Workflow

1. `list_materials` to reuse existing materials before adding new ones.
2. `add_material` with per-kg factors for each phase.
3. `create_product` with lifecycle parameters and per-use factors.
4. `add_component` once per material (a product cannot list a material twice).
5. `get_product_impact_breakdown` to check the result.
6. `export_static_data` to publish.

## How totals are computed

total = ((production + transport + end_of_life) / average_lifespan_uses) * uses_per_year + use

A value of 0 for uses_per_year or average_lifespan_uses is treated as 1.
Negative or non-finite numbers are rejected.
"#;

/// Service status information
#[derive(Debug, Serialize)]
pub struct FullPriceStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub product_count: Option<i64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self, db: &Database) -> FullPriceStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());
        let product_count = db.with_conn(Product::count).ok();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FullPriceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            product_count,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_status_reports_product_count() {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();

        let status = StatusTracker::new(PathBuf::from(":memory:")).get_status(&db);
        assert_eq!(status.product_count, Some(0));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
    }
}
