//! Product model
//!
//! A consumer product: lifecycle parameters plus impacts incurred on each use.
//! Materials are attached through product components.

use rusqlite::{params, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::impact::{non_zero_or_one, Impacts, Metric, MetricSet};

static USE_COLUMNS: MetricSet<&str> = MetricSet {
    greenhouse_gas_kg: "use_co2e_kg_per_use",
    water_liters: "use_water_liters_per_use",
    energy_kwh: "use_energy_kwh_per_use",
    land_m2: "use_land_m2_per_use",
    cost_usd: "use_cost_per_use",
};

/// A product with lifecycle parameters and use-phase factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub purchase_price_usd: f64,
    /// Average uses per year (1 for yearly, 365 for daily)
    pub uses_per_year: f64,
    /// Average number of uses before the product is replaced
    pub average_lifespan_uses: f64,
    /// Impact of a single use (washing, charging, detergent, ...)
    pub use_factors: Impacts,
    pub use_source: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    #[serde(default)]
    pub purchase_price_usd: f64,
    #[serde(default = "default_one")]
    pub uses_per_year: f64,
    #[serde(default = "default_one")]
    pub average_lifespan_uses: f64,
    #[serde(default)]
    pub use_factors: Impacts,
    pub use_source: Option<String>,
}

fn default_one() -> f64 {
    1.0
}

impl ProductCreate {
    /// A product with default lifecycle parameters and no use-phase impact
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            slug: slug.into(),
            purchase_price_usd: 0.0,
            uses_per_year: 1.0,
            average_lifespan_uses: 1.0,
            use_factors: Impacts::zero(),
            use_source: None,
        }
    }
}

/// Data for updating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub purchase_price_usd: Option<f64>,
    pub uses_per_year: Option<f64>,
    pub average_lifespan_uses: Option<f64>,
    #[serde(default)]
    pub use_factors: MetricSet<Option<f64>>,
    pub use_source: Option<String>,
}

impl Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            slug: row.get("slug")?,
            purchase_price_usd: row.get("purchase_price_usd")?,
            uses_per_year: row.get("uses_per_year")?,
            average_lifespan_uses: row.get("average_lifespan_uses")?,
            use_factors: Impacts::try_from_fn(|metric| row.get(*USE_COLUMNS.get(metric)))?,
            use_source: row.get("use_source")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// `uses_per_year`, with zero treated as 1
    pub fn effective_uses_per_year(&self) -> f64 {
        non_zero_or_one(self.uses_per_year)
    }

    /// `average_lifespan_uses`, with zero treated as 1
    pub fn effective_lifespan_uses(&self) -> f64 {
        non_zero_or_one(self.average_lifespan_uses)
    }

    /// Use-phase citation, empty when none was entered
    pub fn use_citation(&self) -> &str {
        self.use_source.as_deref().unwrap_or("")
    }

    /// Insert a new product
    pub fn create(conn: &Connection, data: &ProductCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO products (
                name, description, slug,
                purchase_price_usd, uses_per_year, average_lifespan_uses,
                use_co2e_kg_per_use, use_water_liters_per_use, use_energy_kwh_per_use,
                use_land_m2_per_use, use_cost_per_use, use_source
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                data.name,
                data.description,
                data.slug,
                data.purchase_price_usd,
                data.uses_per_year,
                data.average_lifespan_uses,
                data.use_factors.greenhouse_gas_kg,
                data.use_factors.water_liters,
                data.use_factors.energy_kwh,
                data.use_factors.land_m2,
                data.use_factors.cost_usd,
                data.use_source,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::not_found("Product", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_slug(conn: &Connection, slug: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE slug = ?1")?;

        match stmt.query_row([slug], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All products ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products ORDER BY name ASC")?;

        let products = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Products whose name or slug contains `query`
    pub fn search(conn: &Connection, query: &str) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT * FROM products WHERE name LIKE ?1 OR slug LIKE ?1 ORDER BY name ASC",
        )?;

        let products = stmt
            .query_map([&pattern], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Partial update. Returns None if the product does not exist.
    pub fn update(conn: &Connection, id: i64, data: &ProductUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(description, "description");
        add_update!(slug, "slug");
        add_update!(purchase_price_usd, "purchase_price_usd");
        add_update!(uses_per_year, "uses_per_year");
        add_update!(average_lifespan_uses, "average_lifespan_uses");
        add_update!(use_source, "use_source");

        for metric in Metric::ALL {
            if let Some(value) = data.use_factors.get(metric) {
                updates.push(format!("{} = ?{}", USE_COLUMNS.get(metric), params_vec.len() + 1));
                params_vec.push(Box::new(*value));
            }
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE products SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a product. Its components and comparison entries go with it.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
