//! Database migrations
//!
//! Schema creation and versioning.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to `SCHEMA_VERSION`
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Migration v1: catalog and editorial tables
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- MATERIALS
        -- Impact factors per kg, per lifecycle phase
        -- ============================================
        CREATE TABLE materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',

            production_co2e_kg_per_kg REAL NOT NULL DEFAULT 0,
            production_water_liters_per_kg REAL NOT NULL DEFAULT 0,
            production_energy_kwh_per_kg REAL NOT NULL DEFAULT 0,
            production_land_m2_per_kg REAL NOT NULL DEFAULT 0,
            production_cost_per_kg REAL NOT NULL DEFAULT 0,
            production_source TEXT,

            transport_co2e_kg_per_kg REAL NOT NULL DEFAULT 0,
            transport_water_liters_per_kg REAL NOT NULL DEFAULT 0,
            transport_energy_kwh_per_kg REAL NOT NULL DEFAULT 0,
            transport_land_m2_per_kg REAL NOT NULL DEFAULT 0,
            transport_cost_per_kg REAL NOT NULL DEFAULT 0,
            transport_source TEXT,

            end_of_life_co2e_kg_per_kg REAL NOT NULL DEFAULT 0,
            end_of_life_water_liters_per_kg REAL NOT NULL DEFAULT 0,
            end_of_life_energy_kwh_per_kg REAL NOT NULL DEFAULT 0,
            end_of_life_land_m2_per_kg REAL NOT NULL DEFAULT 0,
            end_of_life_cost_per_kg REAL NOT NULL DEFAULT 0,
            end_of_life_source TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PRODUCTS
        -- Lifecycle parameters and per-use impacts
        -- ============================================
        CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL UNIQUE,

            purchase_price_usd REAL NOT NULL DEFAULT 0,
            uses_per_year REAL NOT NULL DEFAULT 1,
            average_lifespan_uses REAL NOT NULL DEFAULT 1,

            use_co2e_kg_per_use REAL NOT NULL DEFAULT 0,
            use_water_liters_per_use REAL NOT NULL DEFAULT 0,
            use_energy_kwh_per_use REAL NOT NULL DEFAULT 0,
            use_land_m2_per_use REAL NOT NULL DEFAULT 0,
            use_cost_per_use REAL NOT NULL DEFAULT 0,
            use_source TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PRODUCT COMPONENTS
        -- Bill of materials: which material, how heavy
        -- ============================================
        CREATE TABLE product_components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            material_id INTEGER NOT NULL REFERENCES materials(id) ON DELETE RESTRICT,
            weight_grams REAL NOT NULL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(product_id, material_id)      -- one entry per material per product
        );

        CREATE INDEX idx_product_components_product ON product_components(product_id);
        CREATE INDEX idx_product_components_material ON product_components(material_id);

        -- ============================================
        -- POSTS
        -- Blog posts and product comparisons
        -- ============================================
        CREATE TABLE posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            post_type TEXT NOT NULL DEFAULT 'blog' CHECK(post_type IN ('blog', 'comparison')),
            content TEXT NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT 'The Full Price Team',
            published INTEGER NOT NULL DEFAULT 1,
            featured INTEGER NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        );

        CREATE INDEX idx_posts_published ON posts(published);

        -- ============================================
        -- COMPARISON POSTS
        -- Products featured in a comparison post
        -- ============================================
        CREATE TABLE comparison_posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            display_order INTEGER NOT NULL DEFAULT 0,

            UNIQUE(post_id, product_id)
        );

        CREATE INDEX idx_comparison_posts_post ON comparison_posts(post_id);
        "#,
    )?;

    Ok(())
}

/// Get the applied schema version (0 for a fresh database)
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }
}
