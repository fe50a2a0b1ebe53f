//! Product Tools
//!
//! Product lookups with computed impacts, comparisons, and catalog edits
//! for products and their components.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::export::ProductView;
use crate::impact::{assess, compare_products as compare, Candidate, Comparison, Metric, PhaseBreakdown, TotalImpact};
use crate::models::{
    Material, Product, ProductComponent, ProductComponentCreate, ProductCreate, ProductUpdate,
};

use super::validate;

/// Product summary for listing
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub purchase_price_usd: f64,
    pub uses_per_year: f64,
    pub average_lifespan_uses: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            purchase_price_usd: product.purchase_price_usd,
            uses_per_year: product.uses_per_year,
            average_lifespan_uses: product.average_lifespan_uses,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<ProductView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchProductsResponse {
    pub products: Vec<ProductSummary>,
    pub total: usize,
}

/// Totals and phase breakdown for one product
#[derive(Debug, Serialize)]
pub struct ImpactBreakdownResponse {
    pub slug: String,
    pub name: String,
    pub impacts: TotalImpact,
    pub impacts_by_phase: PhaseBreakdown,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Component as returned by the component tools
#[derive(Debug, Serialize)]
pub struct ComponentResponse {
    pub id: i64,
    pub product_id: i64,
    pub material_id: i64,
    pub material_name: String,
    pub weight_grams: f64,
}

fn product_by_slug(conn: &Connection, slug: &str) -> Result<Option<Product>, String> {
    Product::get_by_slug(conn, slug.trim()).map_err(|e| format!("Failed to get product: {}", e))
}

fn product_view(conn: &Connection, product: &Product) -> Result<ProductView, String> {
    ProductView::load(conn, product).map_err(|e| format!("Failed to load product components: {}", e))
}

fn product_by_id(conn: &Connection, id: i64) -> Result<Product, String> {
    Product::get_by_id(conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Product not found with id: {}", id))
}

fn validate_create(data: &mut ProductCreate) -> Result<(), String> {
    data.name = validate::require_text("Product name", &data.name)?.to_string();
    data.slug = validate::require_slug(&data.slug)?.to_string();
    validate::require_non_negative("Purchase price", data.purchase_price_usd)?;
    validate::require_non_negative("Uses per year", data.uses_per_year)?;
    validate::require_non_negative("Average lifespan uses", data.average_lifespan_uses)?;
    validate::require_metric_set("use", &data.use_factors)
}

fn validate_update(data: &mut ProductUpdate) -> Result<(), String> {
    if let Some(name) = &data.name {
        data.name = Some(validate::require_text("Product name", name)?.to_string());
    }
    if let Some(slug) = &data.slug {
        data.slug = Some(validate::require_slug(slug)?.to_string());
    }
    validate::optional_non_negative("Purchase price", data.purchase_price_usd)?;
    validate::optional_non_negative("Uses per year", data.uses_per_year)?;
    validate::optional_non_negative("Average lifespan uses", data.average_lifespan_uses)?;
    validate::optional_metric_set("use", &data.use_factors)
}

fn constraint_message(e: crate::db::DbError, action: &str) -> String {
    if e.is_constraint_violation() {
        "A product with that name or slug already exists".to_string()
    } else {
        format!("Failed to {} product: {}", action, e)
    }
}

// ============================================================================
// Read Tools
// ============================================================================

/// All products with computed impacts, ordered by name
pub fn list_products(db: &Database) -> Result<ListProductsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let products = ProductView::load_all(&conn).map_err(|e| format!("Failed to list products: {}", e))?;

    let total = products.len();
    Ok(ListProductsResponse { products, total })
}

/// Products whose name or slug contains `query`
pub fn search_products(db: &Database, query: &str) -> Result<SearchProductsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let products = Product::search(&conn, query.trim())
        .map_err(|e| format!("Failed to search products: {}", e))?;

    let summaries: Vec<ProductSummary> = products.iter().map(ProductSummary::from).collect();
    let total = summaries.len();
    Ok(SearchProductsResponse {
        products: summaries,
        total,
    })
}

/// A product's full view by slug
pub fn get_product(db: &Database, slug: &str) -> Result<Option<ProductView>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    match product_by_slug(&conn, slug)? {
        Some(product) => product_view(&conn, &product).map(Some),
        None => Ok(None),
    }
}

/// Totals and phase breakdown by slug
pub fn get_product_impact_breakdown(db: &Database, slug: &str) -> Result<Option<ImpactBreakdownResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = match product_by_slug(&conn, slug)? {
        Some(product) => product,
        None => return Ok(None),
    };
    let components = ProductComponent::get_resolved_for_product(&conn, product.id)
        .map_err(|e| format!("Failed to load product components: {}", e))?;
    let report = assess(&product, &components);

    Ok(Some(ImpactBreakdownResponse {
        slug: product.slug,
        name: product.name,
        impacts: report.impacts,
        impacts_by_phase: report.impacts_by_phase,
    }))
}

/// Compare two products (by slug) on one metric
pub fn compare_products(db: &Database, slug_a: &str, slug_b: &str, metric: &str) -> Result<Comparison, String> {
    let metric: Metric = metric.parse()?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product_a = product_by_slug(&conn, slug_a)?.ok_or_else(|| format!("Product not found: {}", slug_a))?;
    let product_b = product_by_slug(&conn, slug_b)?.ok_or_else(|| format!("Product not found: {}", slug_b))?;

    let load = |product: &Product| {
        ProductComponent::get_resolved_for_product(&conn, product.id)
            .map(|components| assess(product, &components))
            .map_err(|e| format!("Failed to load product components: {}", e))
    };
    let report_a = load(&product_a)?;
    let report_b = load(&product_b)?;

    Ok(compare(
        &Candidate { product: &product_a, report: &report_a },
        &Candidate { product: &product_b, report: &report_b },
        metric,
    ))
}

// ============================================================================
// Catalog Tools
// ============================================================================

/// Create a product
pub fn create_product(db: &Database, mut data: ProductCreate) -> Result<ProductView, String> {
    validate_create(&mut data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let product = Product::create(&conn, &data).map_err(|e| constraint_message(e, "create"))?;

    tracing::info!(slug = %product.slug, "Created product");
    product_view(&conn, &product)
}

/// Partially update a product
pub fn update_product(db: &Database, id: i64, mut data: ProductUpdate) -> Result<ProductView, String> {
    validate_update(&mut data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = Product::update(&conn, id, &data).map_err(|e| constraint_message(e, "update"))?;

    match updated {
        Some(product) => product_view(&conn, &product),
        None => Err(format!("Product not found with id: {}", id)),
    }
}

/// Delete a product together with its components
pub fn delete_product(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let product = product_by_id(&conn, id)?;

    Product::delete(&conn, id).map_err(|e| format!("Failed to delete product: {}", e))?;

    tracing::info!(slug = %product.slug, "Deleted product");
    Ok(DeleteResponse {
        success: true,
        message: format!("Deleted product '{}'", product.name),
    })
}

/// Add a material to a product's bill of materials
pub fn add_component(db: &Database, product_id: i64, material_id: i64, weight_grams: f64) -> Result<ComponentResponse, String> {
    let weight_grams = validate::require_non_negative("Weight", weight_grams)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let product = product_by_id(&conn, product_id)?;
    let material = Material::get_by_id(&conn, material_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Material not found with id: {}", material_id))?;

    let component = ProductComponent::create(
        &conn,
        &ProductComponentCreate {
            product_id,
            material_id,
            weight_grams,
        },
    )
    .map_err(|e| {
        if e.is_constraint_violation() {
            format!("'{}' already lists material '{}'", product.name, material.name)
        } else {
            format!("Failed to add component: {}", e)
        }
    })?;

    Ok(ComponentResponse {
        id: component.id,
        product_id,
        material_id,
        material_name: material.name,
        weight_grams: component.weight_grams,
    })
}

/// Change a component's weight
pub fn update_component(db: &Database, id: i64, weight_grams: f64) -> Result<ComponentResponse, String> {
    let weight_grams = validate::require_non_negative("Weight", weight_grams)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let component = ProductComponent::update_weight(&conn, id, weight_grams)
        .map_err(|e| format!("Failed to update component: {}", e))?
        .ok_or_else(|| format!("Component not found with id: {}", id))?;
    let material_name = Material::get_by_id(&conn, component.material_id)
        .map_err(|e| format!("Database error: {}", e))?
        .map(|m| m.name)
        .ok_or_else(|| format!("Material not found with id: {}", component.material_id))?;

    Ok(ComponentResponse {
        id: component.id,
        product_id: component.product_id,
        material_id: component.material_id,
        material_name,
        weight_grams: component.weight_grams,
    })
}

/// Remove a component from its product
pub fn remove_component(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = ProductComponent::delete(&conn, id)
        .map_err(|e| format!("Failed to remove component: {}", e))?;
    if !deleted {
        return Err(format!("Component not found with id: {}", id));
    }

    Ok(DeleteResponse {
        success: true,
        message: format!("Removed component {}", id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::impact::{Impacts, MaterialPhase, PhaseFactors};
    use crate::models::MaterialCreate;
    use crate::tools::materials;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();

        let mut factors = PhaseFactors::default();
        *factors.get_mut(MaterialPhase::Production) = Impacts {
            greenhouse_gas_kg: 2.0,
            water_liters: 10000.0,
            energy_kwh: 1.0,
            land_m2: 1.0,
            cost_usd: 10.0,
        };
        let cotton = materials::add_material(
            &db,
            MaterialCreate { name: "Cotton".into(), factors, ..Default::default() },
        )
        .unwrap();
        (db, cotton.id)
    }

    fn shirt(slug: &str, lifespan: f64) -> ProductCreate {
        ProductCreate {
            purchase_price_usd: 20.0,
            uses_per_year: 50.0,
            average_lifespan_uses: lifespan,
            ..ProductCreate::new(format!("Shirt {}", slug), slug)
        }
    }

    #[test]
    fn test_t_shirt_through_tools() {
        let (db, cotton) = setup();
        let product = create_product(&db, shirt("t-shirt", 100.0)).unwrap();
        add_component(&db, product.id, cotton, 200.0).unwrap();

        let view = get_product(&db, "t-shirt").unwrap().unwrap();
        assert!((view.impacts.greenhouse_gas_kg.value - 0.2).abs() < 1e-9);
        assert!((view.components[0].impacts.water_liters - 2000.0).abs() < 1e-9);

        let breakdown = get_product_impact_breakdown(&db, "t-shirt").unwrap().unwrap();
        assert!((breakdown.impacts_by_phase.production.greenhouse_gas_kg.value - 0.4).abs() < 1e-9);

        assert!(get_product(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let (db, cotton) = setup();
        assert!(create_product(&db, shirt("", 100.0)).is_err());
        assert!(create_product(&db, shirt("bad", -1.0)).is_err());

        let product = create_product(&db, shirt("ok", 100.0)).unwrap();
        assert!(add_component(&db, product.id, cotton, -5.0).is_err());
        assert!(add_component(&db, product.id, 999, 5.0).is_err());

        let err = update_product(&db, product.id, ProductUpdate { uses_per_year: Some(f64::NAN), ..Default::default() });
        assert!(err.is_err());
    }

    #[test]
    fn test_duplicate_component_message() {
        let (db, cotton) = setup();
        let product = create_product(&db, shirt("tee", 100.0)).unwrap();
        add_component(&db, product.id, cotton, 200.0).unwrap();

        let err = add_component(&db, product.id, cotton, 100.0).unwrap_err();
        assert!(err.contains("already lists material 'Cotton'"), "{}", err);
    }

    #[test]
    fn test_update_component_requires_material() {
        let (db, cotton) = setup();
        let product = create_product(&db, shirt("tee", 100.0)).unwrap();
        let component = add_component(&db, product.id, cotton, 200.0).unwrap();

        let updated = update_component(&db, component.id, 150.0).unwrap();
        assert_eq!(updated.material_name, "Cotton");
        assert_eq!(updated.weight_grams, 150.0);

        db.with_conn(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
            conn.execute("DELETE FROM materials WHERE id = ?1", [cotton])?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        })
        .unwrap();

        let err = update_component(&db, component.id, 100.0).unwrap_err();
        assert_eq!(err, format!("Material not found with id: {}", cotton));
    }

    #[test]
    fn test_compare_through_tools() {
        let (db, cotton) = setup();
        let short = create_product(&db, shirt("short-lived", 10.0)).unwrap();
        let long = create_product(&db, shirt("long-lived", 1000.0)).unwrap();
        add_component(&db, short.id, cotton, 200.0).unwrap();
        add_component(&db, long.id, cotton, 200.0).unwrap();

        let result = compare_products(&db, "short-lived", "long-lived", "co2e").unwrap();
        assert_eq!(result.winner, "Shirt long-lived");
        assert!(result.difference > 0.0);

        assert!(compare_products(&db, "short-lived", "nope", "co2e").is_err());
        assert!(compare_products(&db, "short-lived", "long-lived", "noise").is_err());
    }

    #[test]
    fn test_delete_product_frees_material() {
        let (db, cotton) = setup();
        let product = create_product(&db, shirt("tee", 100.0)).unwrap();
        add_component(&db, product.id, cotton, 200.0).unwrap();

        let blocked = materials::delete_material(&db, cotton).unwrap();
        assert!(!blocked.success);
        assert_eq!(blocked.used_in_products, vec!["Shirt tee".to_string()]);

        delete_product(&db, product.id).unwrap();
        assert!(materials::delete_material(&db, cotton).unwrap().success);
    }
}
