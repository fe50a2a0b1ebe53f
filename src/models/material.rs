//! Material model
//!
//! A material products can be made from, with impact factors per kilogram
//! for each material lifecycle phase.

use rusqlite::{params, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::impact::{Impacts, MaterialPhase, Metric, MetricSet, PerPhase, PhaseFactors};

/// Column holding each (phase, metric) factor
static FACTOR_COLUMNS: PerPhase<MetricSet<&str>> = PerPhase {
    production: MetricSet {
        greenhouse_gas_kg: "production_co2e_kg_per_kg",
        water_liters: "production_water_liters_per_kg",
        energy_kwh: "production_energy_kwh_per_kg",
        land_m2: "production_land_m2_per_kg",
        cost_usd: "production_cost_per_kg",
    },
    transport: MetricSet {
        greenhouse_gas_kg: "transport_co2e_kg_per_kg",
        water_liters: "transport_water_liters_per_kg",
        energy_kwh: "transport_energy_kwh_per_kg",
        land_m2: "transport_land_m2_per_kg",
        cost_usd: "transport_cost_per_kg",
    },
    end_of_life: MetricSet {
        greenhouse_gas_kg: "end_of_life_co2e_kg_per_kg",
        water_liters: "end_of_life_water_liters_per_kg",
        energy_kwh: "end_of_life_energy_kwh_per_kg",
        land_m2: "end_of_life_land_m2_per_kg",
        cost_usd: "end_of_life_cost_per_kg",
    },
};

/// Column holding each phase's citation
static CITATION_COLUMNS: PerPhase<&str> = PerPhase {
    production: "production_source",
    transport: "transport_source",
    end_of_life: "end_of_life_source",
};

/// A material with per-phase impact factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub factors: PhaseFactors,
    pub citations: PerPhase<Option<String>>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new material. Omitted factors default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub factors: PhaseFactors,
    #[serde(default)]
    pub citations: PerPhase<Option<String>>,
}

/// Replacement values for one phase of a material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseUpdate {
    pub phase: MaterialPhase,
    #[serde(default)]
    pub factors: MetricSet<Option<f64>>,
    pub source: Option<String>,
}

/// Data for updating a material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub phases: Vec<PhaseUpdate>,
}

impl Material {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            factors: PerPhase::try_from_fn(|phase| {
                let columns = FACTOR_COLUMNS.get(phase);
                Impacts::try_from_fn(|metric| row.get(*columns.get(metric)))
            })?,
            citations: PerPhase::try_from_fn(|phase| row.get(*CITATION_COLUMNS.get(phase)))?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Citation text for a phase, empty when none was entered
    pub fn citation(&self, phase: MaterialPhase) -> &str {
        self.citations.get(phase).as_deref().unwrap_or("")
    }

    /// Insert a new material
    pub fn create(conn: &Connection, data: &MaterialCreate) -> DbResult<Self> {
        let mut columns: Vec<&str> = vec!["name", "description"];
        let mut values: Vec<&dyn ToSql> = vec![&data.name, &data.description];

        for phase in MaterialPhase::ALL {
            let factor_columns = FACTOR_COLUMNS.get(phase);
            let factors = data.factors.get(phase);
            for metric in Metric::ALL {
                columns.push(*factor_columns.get(metric));
                values.push(factors.get(metric));
            }
            columns.push(*CITATION_COLUMNS.get(phase));
            values.push(data.citations.get(phase));
        }

        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO materials ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );
        conn.execute(&sql, values.as_slice())?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::not_found("Material", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM materials WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM materials WHERE name = ?1")?;

        match stmt.query_row([name], Self::from_row) {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All materials ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM materials ORDER BY name ASC")?;

        let materials = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(materials)
    }

    /// Partial update. Returns None if the material does not exist.
    pub fn update(conn: &Connection, id: i64, data: &MaterialUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref description) = data.description {
            updates.push(format!("description = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(description.clone()));
        }

        for phase_update in &data.phases {
            let factor_columns = FACTOR_COLUMNS.get(phase_update.phase);
            for (metric, value) in phase_update.factors.iter() {
                if let Some(value) = value {
                    updates.push(format!(
                        "{} = ?{}",
                        factor_columns.get(metric),
                        params_vec.len() + 1
                    ));
                    params_vec.push(Box::new(*value));
                }
            }
            if let Some(ref source) = phase_update.source {
                updates.push(format!(
                    "{} = ?{}",
                    CITATION_COLUMNS.get(phase_update.phase),
                    params_vec.len() + 1
                ));
                params_vec.push(Box::new(source.clone()));
            }
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE materials SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of product components referencing this material
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM product_components WHERE material_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Names of the products using this material
    pub fn get_used_in_products(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.name FROM products p
            INNER JOIN product_components pc ON p.id = pc.product_id
            WHERE pc.material_id = ?1
            ORDER BY p.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Delete a material. Fails with a constraint error while any product
    /// component references it. Ok(false) if not found.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM materials WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
