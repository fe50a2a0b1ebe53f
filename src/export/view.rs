//! Serialization views
//!
//! The JSON shapes consumed by the front end. Views compose stored records
//! with freshly computed impacts; nothing here is persisted.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::DbResult;
use crate::impact::{assess, Impacts, PhaseBreakdown, TotalImpact};
use crate::models::{ComparisonPost, Post, PostType, Product, ProductComponent, ResolvedComponent};

/// A product with its totals, phase breakdown and components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub purchase_price_usd: f64,
    pub uses_per_year: f64,
    pub average_lifespan_uses: f64,
    pub impacts: TotalImpact,
    pub impacts_by_phase: PhaseBreakdown,
    pub use_phase: UsePhaseView,
    pub components: Vec<ComponentView>,
}

/// The five raw per-use factors, as entered
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsePhaseView {
    pub co2e_kg_per_use: f64,
    pub water_liters_per_use: f64,
    pub energy_kwh_per_use: f64,
    pub land_m2_per_use: f64,
    pub cost_per_use: f64,
}

impl From<&Impacts> for UsePhaseView {
    fn from(factors: &Impacts) -> Self {
        Self {
            co2e_kg_per_use: factors.greenhouse_gas_kg,
            water_liters_per_use: factors.water_liters,
            energy_kwh_per_use: factors.energy_kwh,
            land_m2_per_use: factors.land_m2,
            cost_per_use: factors.cost_usd,
        }
    }
}

/// A component with its lifetime material impact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentView {
    pub id: i64,
    pub material_name: String,
    pub weight_grams: f64,
    pub impacts: Impacts,
}

impl From<&ResolvedComponent> for ComponentView {
    fn from(component: &ResolvedComponent) -> Self {
        Self {
            id: component.id,
            material_name: component.material.name.clone(),
            weight_grams: component.weight_grams,
            impacts: component.lifetime_impacts(),
        }
    }
}

/// Build the exported representation of a product from already loaded
/// components
pub fn to_export_view(product: &Product, components: &[ResolvedComponent]) -> ProductView {
    let report = assess(product, components);

    ProductView {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        slug: product.slug.clone(),
        purchase_price_usd: product.purchase_price_usd,
        uses_per_year: product.uses_per_year,
        average_lifespan_uses: product.average_lifespan_uses,
        impacts: report.impacts,
        impacts_by_phase: report.impacts_by_phase,
        use_phase: UsePhaseView::from(&product.use_factors),
        components: components.iter().map(ComponentView::from).collect(),
    }
}

impl ProductView {
    /// Load a product's components and build its view
    pub fn load(conn: &Connection, product: &Product) -> DbResult<Self> {
        let components = ProductComponent::get_resolved_for_product(conn, product.id)?;
        Ok(to_export_view(product, &components))
    }

    /// Views of every product, ordered by name
    pub fn load_all(conn: &Connection) -> DbResult<Vec<Self>> {
        Product::list(conn)?
            .iter()
            .map(|product| Self::load(conn, product))
            .collect()
    }
}

/// Products featured in a comparison post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub product_ids: Vec<i64>,
    pub products: Vec<ProductView>,
}

/// A published post as exported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub post_type: PostType,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonView>,
    /// Always empty for blog posts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductView>>,
}

impl PostView {
    pub fn load(conn: &Connection, post: &Post) -> DbResult<Self> {
        let (comparison, products) = match post.post_type {
            PostType::Comparison => {
                let product_ids = ComparisonPost::get_product_ids(conn, post.id)?;
                let mut products = Vec::with_capacity(product_ids.len());
                for id in &product_ids {
                    // Skip products deleted since the IDs were read
                    if let Some(product) = Product::get_by_id(conn, *id)? {
                        products.push(ProductView::load(conn, &product)?);
                    }
                }
                (Some(ComparisonView { product_ids, products }), None)
            }
            PostType::Blog => (None, Some(Vec::new())),
        };

        Ok(Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            post_type: post.post_type,
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            author: post.author.clone(),
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
            featured: post.featured,
            comparison,
            products,
        })
    }

    /// Views of every published post, newest first
    pub fn load_published(conn: &Connection) -> DbResult<Vec<Self>> {
        Post::list_published(conn)?
            .iter()
            .map(|post| Self::load(conn, post))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::impact::{MaterialPhase, PhaseFactors};
    use crate::models::{Material, MaterialCreate, PostCreate, ProductComponentCreate, ProductCreate};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn t_shirt(conn: &Connection) -> Product {
        let mut factors = PhaseFactors::default();
        *factors.get_mut(MaterialPhase::Production) = Impacts {
            greenhouse_gas_kg: 2.0,
            water_liters: 10000.0,
            energy_kwh: 1.0,
            land_m2: 1.0,
            cost_usd: 10.0,
        };
        let cotton = Material::create(
            conn,
            &MaterialCreate { name: "Cotton".into(), factors, ..Default::default() },
        )
        .unwrap();

        let product = Product::create(
            conn,
            &ProductCreate {
                purchase_price_usd: 20.0,
                uses_per_year: 50.0,
                average_lifespan_uses: 100.0,
                ..ProductCreate::new("T-Shirt", "t-shirt")
            },
        )
        .unwrap();
        ProductComponent::create(
            conn,
            &ProductComponentCreate { product_id: product.id, material_id: cotton.id, weight_grams: 200.0 },
        )
        .unwrap();
        product
    }

    #[test]
    fn test_product_view_shape() {
        let conn = setup();
        let product = t_shirt(&conn);
        let view = ProductView::load(&conn, &product).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        for key in [
            "id", "name", "description", "slug", "purchase_price_usd", "uses_per_year",
            "average_lifespan_uses", "impacts", "impacts_by_phase", "use_phase", "components",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["impacts_by_phase"].get("use").is_some());
        assert_eq!(json["use_phase"]["cost_per_use"], 0.0);
        assert_eq!(json["components"][0]["material_name"], "Cotton");

        let ghg = json["components"][0]["impacts"]["greenhouse_gas_kg"].as_f64().unwrap();
        assert!((ghg - 0.4).abs() < 1e-9);
        assert!((view.impacts.greenhouse_gas_kg.value - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_view_reflects_current_data() {
        let conn = setup();
        let product = t_shirt(&conn);
        let before = ProductView::load(&conn, &product).unwrap();

        let component = ProductComponent::get_for_product(&conn, product.id).unwrap().remove(0);
        ProductComponent::update_weight(&conn, component.id, 400.0).unwrap();
        let after = ProductView::load(&conn, &product).unwrap();

        assert!((after.impacts.greenhouse_gas_kg.value - 2.0 * before.impacts.greenhouse_gas_kg.value).abs() < 1e-9);
    }

    #[test]
    fn test_post_views() {
        let conn = setup();
        let product = t_shirt(&conn);
        let base = PostCreate {
            title: "Shirts".into(),
            slug: "shirts".into(),
            post_type: PostType::Comparison,
            content: "Compare".into(),
            excerpt: String::new(),
            author: None,
            published: true,
            featured: true,
        };
        let comparison = Post::create(&conn, &base).unwrap();
        ComparisonPost::create(&conn, comparison.id, product.id, 0).unwrap();
        let blog = Post::create(&conn, &PostCreate { slug: "news".into(), post_type: PostType::Blog, ..base }).unwrap();

        let json = serde_json::to_value(PostView::load(&conn, &comparison).unwrap()).unwrap();
        assert_eq!(json["comparison"]["product_ids"][0], product.id);
        assert_eq!(json["comparison"]["products"][0]["slug"], "t-shirt");
        assert!(json.get("products").is_none());

        let json = serde_json::to_value(PostView::load(&conn, &blog).unwrap()).unwrap();
        assert_eq!(json["products"].as_array().unwrap().len(), 0);
        assert!(json.get("comparison").is_none());
    }
}
