//! The Full Price MCP Server Implementation
//!
//! Exposes product impacts, posts and catalog maintenance as MCP tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::impact::{MaterialPhase, MetricSet, PerPhase, PhaseFactors};
use crate::models::{MaterialCreate, MaterialUpdate, PhaseUpdate, PostCreate, ProductCreate, ProductUpdate};
use crate::tools::status::StatusTracker;
use crate::tools::{export, materials, posts, products};

/// The Full Price MCP Service
#[derive(Clone)]
pub struct FullPriceService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    static_output_dir: PathBuf,
    tool_router: ToolRouter<FullPriceService>,
}

impl FullPriceService {
    pub fn new(database_path: PathBuf, database: Database, static_output_dir: PathBuf) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            static_output_dir,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(message: &str, key: &str, value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let mut body = serde_json::Map::new();
    body.insert("error".to_string(), message.into());
    body.insert(key.to_string(), value);
    json_result(&body)
}

// ============================================================================
// Shared Parameter Structs
// ============================================================================

/// One value per impact metric; omitted metrics are left unchanged (or 0 on create)
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ImpactFactorParams {
    /// kg CO2e
    pub greenhouse_gas_kg: Option<f64>,
    /// Liters
    pub water_liters: Option<f64>,
    /// kWh
    pub energy_kwh: Option<f64>,
    /// Square meters
    pub land_m2: Option<f64>,
    /// USD
    pub cost_usd: Option<f64>,
}

impl From<ImpactFactorParams> for MetricSet<Option<f64>> {
    fn from(p: ImpactFactorParams) -> Self {
        MetricSet {
            greenhouse_gas_kg: p.greenhouse_gas_kg,
            water_liters: p.water_liters,
            energy_kwh: p.energy_kwh,
            land_m2: p.land_m2,
            cost_usd: p.cost_usd,
        }
    }
}

fn filled(factors: Option<ImpactFactorParams>) -> MetricSet<f64> {
    let partial: MetricSet<Option<f64>> = factors.unwrap_or_default().into();
    partial.map(|_, v| v.unwrap_or(0.0))
}

// ============================================================================
// Product Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SlugParams {
    /// URL slug, e.g. "cloth-napkin"
    pub slug: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsParams {
    /// Text to find in product names or slugs
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompareProductsParams {
    pub slug_a: String,
    pub slug_b: String,
    /// greenhouse_gas_kg, water_liters, energy_kwh, land_m2 or cost_usd (default greenhouse_gas_kg)
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String { "greenhouse_gas_kg".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateProductParams {
    pub name: String,
    /// Unique URL slug (lowercase letters, digits, hyphens)
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub purchase_price_usd: f64,
    /// Average uses per year (default 1)
    #[serde(default = "default_one")]
    pub uses_per_year: f64,
    /// Uses before replacement (default 1, i.e. single-use)
    #[serde(default = "default_one")]
    pub average_lifespan_uses: f64,
    /// Impact of a single use
    pub use_factors: Option<ImpactFactorParams>,
    /// Citation for the use-phase factors
    pub use_source: Option<String>,
}

fn default_one() -> f64 { 1.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub purchase_price_usd: Option<f64>,
    pub uses_per_year: Option<f64>,
    pub average_lifespan_uses: Option<f64>,
    pub use_factors: Option<ImpactFactorParams>,
    pub use_source: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddComponentParams {
    pub product_id: i64,
    pub material_id: i64,
    /// Weight of this material in the product, in grams
    pub weight_grams: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateComponentParams {
    /// Component ID
    pub id: i64,
    pub weight_grams: f64,
}

// ============================================================================
// Material Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMaterialParams {
    /// Material ID (takes precedence over name)
    pub id: Option<i64>,
    /// Exact material name
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMaterialParams {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Production factors per kg
    pub production: Option<ImpactFactorParams>,
    /// Transport factors per kg
    pub transport: Option<ImpactFactorParams>,
    /// End-of-life factors per kg
    pub end_of_life: Option<ImpactFactorParams>,
    pub production_source: Option<String>,
    pub transport_source: Option<String>,
    pub end_of_life_source: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMaterialParams {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub production: Option<ImpactFactorParams>,
    pub transport: Option<ImpactFactorParams>,
    pub end_of_life: Option<ImpactFactorParams>,
    pub production_source: Option<String>,
    pub transport_source: Option<String>,
    pub end_of_life_source: Option<String>,
}

// ============================================================================
// Post Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreatePostParams {
    pub title: String,
    pub slug: String,
    /// "blog" or "comparison" (default blog)
    #[serde(default)]
    pub post_type: Option<String>,
    /// Markdown or HTML body
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub author: Option<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_true() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddComparisonProductParams {
    pub post_id: i64,
    pub product_id: i64,
    /// Position in the comparison (lower first, default 0)
    #[serde(default)]
    pub display_order: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportStaticDataParams {
    /// Output directory (defaults to the configured static output directory)
    pub output_dir: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FullPriceService {
    #[tool(description = "Get the current status of the service including build info, database status, and process information")]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(&self.database))
    }

    #[tool(description = "Get instructions for entering materials, products and components. Call this before editing the catalog.")]
    fn catalog_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CATALOG_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CATALOG_INSTRUCTIONS)]))
    }

    // --- Products ---

    #[tool(description = "List all products with annualized impacts, phase breakdown and components")]
    fn list_products(&self) -> Result<CallToolResult, McpError> {
        let result = products::list_products(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Search products by name or slug")]
    fn search_products(&self, Parameters(p): Parameters<SearchProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::search_products(&self.database, &p.query).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a product by slug with annualized impacts, phase breakdown, use-phase factors and components")]
    fn get_product(&self, Parameters(p): Parameters<SlugParams>) -> Result<CallToolResult, McpError> {
        match products::get_product(&self.database, &p.slug).map_err(|e| McpError::internal_error(e, None))? {
            Some(view) => json_result(&view),
            None => not_found("Product not found", "slug", p.slug.into()),
        }
    }

    #[tool(description = "Get a product's annualized totals and per-phase impacts with full source provenance")]
    fn get_product_impact_breakdown(&self, Parameters(p): Parameters<SlugParams>) -> Result<CallToolResult, McpError> {
        match products::get_product_impact_breakdown(&self.database, &p.slug).map_err(|e| McpError::internal_error(e, None))? {
            Some(breakdown) => json_result(&breakdown),
            None => not_found("Product not found", "slug", p.slug.into()),
        }
    }

    #[tool(description = "Compare two products on one metric: annualized values, difference, winner, replacement rates and break-even year")]
    fn compare_products(&self, Parameters(p): Parameters<CompareProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::compare_products(&self.database, &p.slug_a, &p.slug_b, &p.metric)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Create a product with lifecycle parameters and per-use impact factors")]
    fn create_product(&self, Parameters(p): Parameters<CreateProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductCreate {
            name: p.name, description: p.description, slug: p.slug,
            purchase_price_usd: p.purchase_price_usd, uses_per_year: p.uses_per_year,
            average_lifespan_uses: p.average_lifespan_uses,
            use_factors: filled(p.use_factors), use_source: p.use_source,
        };
        let result = products::create_product(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a product. Only provided fields change; use_factors may set individual metrics.")]
    fn update_product(&self, Parameters(p): Parameters<UpdateProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductUpdate {
            name: p.name, description: p.description, slug: p.slug,
            purchase_price_usd: p.purchase_price_usd, uses_per_year: p.uses_per_year,
            average_lifespan_uses: p.average_lifespan_uses,
            use_factors: p.use_factors.unwrap_or_default().into(), use_source: p.use_source,
        };
        let result = products::update_product(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a product and its components")]
    fn delete_product(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = products::delete_product(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add a material to a product by weight in grams. A product cannot list the same material twice.")]
    fn add_component(&self, Parameters(p): Parameters<AddComponentParams>) -> Result<CallToolResult, McpError> {
        let result = products::add_component(&self.database, p.product_id, p.material_id, p.weight_grams)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Change the weight of a product component")]
    fn update_component(&self, Parameters(p): Parameters<UpdateComponentParams>) -> Result<CallToolResult, McpError> {
        let result = products::update_component(&self.database, p.id, p.weight_grams)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove a component from its product")]
    fn remove_component(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = products::remove_component(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Materials ---

    #[tool(description = "List all materials with how many products use each")]
    fn list_materials(&self) -> Result<CallToolResult, McpError> {
        let result = materials::list_materials(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a material's per-kg factors for each phase, sources and the products using it. Look up by id or exact name.")]
    fn get_material(&self, Parameters(p): Parameters<GetMaterialParams>) -> Result<CallToolResult, McpError> {
        let result = match (p.id, p.name.as_deref()) {
            (Some(id), _) => materials::get_material(&self.database, id),
            (None, Some(name)) => materials::get_material_by_name(&self.database, name),
            (None, None) => Err("Provide either id or name".to_string()),
        }
        .map_err(|e| McpError::internal_error(e, None))?;

        match result {
            Some(material) => json_result(&material),
            None => match p.id {
                Some(id) => not_found("Material not found", "id", id.into()),
                None => not_found("Material not found", "name", p.name.unwrap_or_default().into()),
            },
        }
    }

    #[tool(description = "Add a material with per-kg impact factors for production, transport and end-of-life. Omitted factors are 0.")]
    fn add_material(&self, Parameters(p): Parameters<AddMaterialParams>) -> Result<CallToolResult, McpError> {
        let data = MaterialCreate {
            name: p.name,
            description: p.description,
            factors: PhaseFactors {
                production: filled(p.production),
                transport: filled(p.transport),
                end_of_life: filled(p.end_of_life),
            },
            citations: PerPhase {
                production: p.production_source,
                transport: p.transport_source,
                end_of_life: p.end_of_life_source,
            },
        };
        let result = materials::add_material(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a material. Only provided fields change; each phase may set individual metrics.")]
    fn update_material(&self, Parameters(p): Parameters<UpdateMaterialParams>) -> Result<CallToolResult, McpError> {
        let phases = [
            (MaterialPhase::Production, p.production, p.production_source),
            (MaterialPhase::Transport, p.transport, p.transport_source),
            (MaterialPhase::EndOfLife, p.end_of_life, p.end_of_life_source),
        ]
        .into_iter()
        .filter(|(_, factors, source)| factors.is_some() || source.is_some())
        .map(|(phase, factors, source)| PhaseUpdate {
            phase,
            factors: factors.unwrap_or_default().into(),
            source,
        })
        .collect();

        let data = MaterialUpdate { name: p.name, description: p.description, phases };
        let result = materials::update_material(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a material (only allowed if no product uses it)")]
    fn delete_material(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = materials::delete_material(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Posts ---

    #[tool(description = "List published posts, newest first. Comparison posts include their products.")]
    fn list_posts(&self) -> Result<CallToolResult, McpError> {
        let result = posts::list_posts(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a published post by slug")]
    fn get_post(&self, Parameters(p): Parameters<SlugParams>) -> Result<CallToolResult, McpError> {
        match posts::get_post(&self.database, &p.slug).map_err(|e| McpError::internal_error(e, None))? {
            Some(post) => json_result(&post),
            None => not_found("Post not found", "slug", p.slug.into()),
        }
    }

    #[tool(description = "Create a blog or comparison post")]
    fn create_post(&self, Parameters(p): Parameters<CreatePostParams>) -> Result<CallToolResult, McpError> {
        let post_type = posts::parse_post_type(p.post_type.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let data = PostCreate {
            title: p.title, slug: p.slug,
            post_type,
            content: p.content, excerpt: p.excerpt, author: p.author,
            published: p.published, featured: p.featured,
        };
        let result = posts::create_post(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a post")]
    fn delete_post(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = posts::delete_post(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add a product to a comparison post at a display position")]
    fn add_comparison_product(&self, Parameters(p): Parameters<AddComparisonProductParams>) -> Result<CallToolResult, McpError> {
        let result = posts::add_comparison_product(&self.database, p.post_id, p.product_id, p.display_order)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Export ---

    #[tool(description = "Write products.json, posts.json and posts/<slug>.json for the static front end")]
    fn export_static_data(&self, Parameters(p): Parameters<ExportStaticDataParams>) -> Result<CallToolResult, McpError> {
        let output_dir = p.output_dir.map(PathBuf::from).unwrap_or_else(|| self.static_output_dir.clone());
        let result = export::export_static_data(&self.database, &output_dir)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FullPriceService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fullprice".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("The Full Price".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "The Full Price - lifecycle impact of consumer products (CO2e, water, energy, land, cost), annualized per year of use. \
                 Call catalog_instructions before editing data. \
                 Products: list_products, search_products, get_product, get_product_impact_breakdown, compare_products, \
                 create/update/delete_product, add/update/remove_component. \
                 Materials: list_materials, get_material, add/update/delete_material. \
                 Posts: list_posts, get_post, create/delete_post, add_comparison_product. \
                 Publishing: export_static_data. Service: status."
                    .into(),
            ),
        }
    }
}
