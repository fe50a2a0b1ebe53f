//! Material Tools
//!
//! Maintenance of the material impact factor table.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::impact::{PerPhase, PhaseFactors};
use crate::models::{Material, MaterialCreate, MaterialUpdate};

use super::validate;

/// Material summary for listing
#[derive(Debug, Serialize)]
pub struct MaterialSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub usage_count: i64,
}

/// Full material detail
#[derive(Debug, Serialize)]
pub struct MaterialDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Impact per kg, by phase and metric
    pub factors: PhaseFactors,
    pub sources: PerPhase<Option<String>>,
    pub used_in_products: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListMaterialsResponse {
    pub materials: Vec<MaterialSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteMaterialResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub used_in_products: Vec<String>,
}

fn detail(conn: &Connection, material: Material) -> Result<MaterialDetail, String> {
    let used_in_products = Material::get_used_in_products(conn, material.id)
        .map_err(|e| format!("Failed to get material usage: {}", e))?;

    Ok(MaterialDetail {
        id: material.id,
        name: material.name,
        description: material.description,
        factors: material.factors,
        sources: material.citations,
        used_in_products,
        created_at: material.created_at,
        updated_at: material.updated_at,
    })
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Add a material
pub fn add_material(db: &Database, mut data: MaterialCreate) -> Result<MaterialDetail, String> {
    data.name = validate::require_text("Material name", &data.name)?.to_string();
    validate::require_phase_factors(&data.factors)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let material = Material::create(&conn, &data).map_err(|e| {
        if e.is_constraint_violation() {
            format!("A material named '{}' already exists", data.name)
        } else {
            format!("Failed to create material: {}", e)
        }
    })?;

    detail(&conn, material)
}

/// Get a material by ID
pub fn get_material(db: &Database, id: i64) -> Result<Option<MaterialDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let material = Material::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get material: {}", e))?;

    material.map(|m| detail(&conn, m)).transpose()
}

/// Get a material by exact name
pub fn get_material_by_name(db: &Database, name: &str) -> Result<Option<MaterialDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let material = Material::get_by_name(&conn, name.trim())
        .map_err(|e| format!("Failed to get material: {}", e))?;

    material.map(|m| detail(&conn, m)).transpose()
}

/// List all materials by name
pub fn list_materials(db: &Database) -> Result<ListMaterialsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let materials = Material::list(&conn).map_err(|e| format!("Failed to list materials: {}", e))?;

    let mut summaries = Vec::with_capacity(materials.len());
    for material in materials {
        let usage_count = Material::get_usage_count(&conn, material.id)
            .map_err(|e| format!("Failed to count material usage: {}", e))?;
        summaries.push(MaterialSummary {
            id: material.id,
            name: material.name,
            description: material.description,
            usage_count,
        });
    }

    let total = summaries.len();
    Ok(ListMaterialsResponse {
        materials: summaries,
        total,
    })
}

/// Update a material's name, description or phase factors
pub fn update_material(db: &Database, id: i64, mut data: MaterialUpdate) -> Result<MaterialDetail, String> {
    if let Some(name) = &data.name {
        data.name = Some(validate::require_text("Material name", name)?.to_string());
    }
    for phase in &data.phases {
        validate::optional_metric_set(phase.phase.key(), &phase.factors)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = Material::update(&conn, id, &data).map_err(|e| {
        if e.is_constraint_violation() {
            "A material with that name already exists".to_string()
        } else {
            format!("Failed to update material: {}", e)
        }
    })?;

    match updated {
        Some(material) => detail(&conn, material),
        None => Err(format!("Material not found with id: {}", id)),
    }
}

/// Delete a material (only allowed if no product uses it)
pub fn delete_material(db: &Database, id: i64) -> Result<DeleteMaterialResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = Material::get_by_id(&conn, id).map_err(|e| format!("Database error: {}", e))?;
    let material = match existing {
        Some(material) => material,
        None => return Err(format!("Material not found with id: {}", id)),
    };

    let used_in_products = Material::get_used_in_products(&conn, id)
        .map_err(|e| format!("Failed to get material usage: {}", e))?;
    if !used_in_products.is_empty() {
        return Ok(DeleteMaterialResponse {
            success: false,
            message: format!(
                "Cannot delete '{}': used in {} product(s)",
                material.name,
                used_in_products.len()
            ),
            used_in_products,
        });
    }

    Material::delete(&conn, id).map_err(|e| format!("Failed to delete material: {}", e))?;

    Ok(DeleteMaterialResponse {
        success: true,
        message: format!("Deleted material '{}'", material.name),
        used_in_products: Vec::new(),
    })
}
