//! Product Component model
//!
//! One line of a product's bill of materials: a material and its weight.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::Material;

/// A component linking a material to a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComponent {
    pub id: i64,
    pub product_id: i64,
    pub material_id: i64,
    pub weight_grams: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// A component with its material record loaded, ready for calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedComponent {
    pub id: i64,
    pub product_id: i64,
    pub material: Material,
    pub weight_grams: f64,
}

/// Data for adding a component to a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComponentCreate {
    pub product_id: i64,
    pub material_id: i64,
    pub weight_grams: f64,
}

impl ProductComponent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            material_id: row.get("material_id")?,
            weight_grams: row.get("weight_grams")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add a material to a product. Fails with a constraint error if the
    /// product already lists this material.
    pub fn create(conn: &Connection, data: &ProductComponentCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO product_components (product_id, material_id, weight_grams)
            VALUES (?1, ?2, ?3)
            "#,
            params![data.product_id, data.material_id, data.weight_grams],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::not_found("Product component", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM product_components WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(component) => Ok(Some(component)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All components of a product, in insertion order
    pub fn get_for_product(conn: &Connection, product_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM product_components WHERE product_id = ?1 ORDER BY id",
        )?;

        let components = stmt
            .query_map([product_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(components)
    }

    /// All components of a product with their materials, in insertion order
    pub fn get_resolved_for_product(
        conn: &Connection,
        product_id: i64,
    ) -> DbResult<Vec<ResolvedComponent>> {
        let components = Self::get_for_product(conn, product_id)?;
        let mut materials: HashMap<i64, Material> = HashMap::new();
        let mut resolved = Vec::with_capacity(components.len());

        for component in components {
            let material = match materials.get(&component.material_id) {
                Some(material) => material.clone(),
                None => {
                    let material = Material::get_by_id(conn, component.material_id)?
                        .ok_or_else(|| DbError::not_found("Material", component.material_id))?;
                    materials.insert(material.id, material.clone());
                    material
                }
            };

            resolved.push(ResolvedComponent {
                id: component.id,
                product_id: component.product_id,
                material,
                weight_grams: component.weight_grams,
            });
        }

        Ok(resolved)
    }

    /// Change a component's weight
    pub fn update_weight(conn: &Connection, id: i64, weight_grams: f64) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE product_components SET weight_grams = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![weight_grams, id],
        )?;
        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM product_components WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{MaterialCreate, Product, ProductCreate};

    fn setup() -> (Connection, i64, i64, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let product = Product::create(&conn, &ProductCreate::new("Hybrid Bag", "hybrid-bag")).unwrap();
        let cotton = Material::create(&conn, &MaterialCreate { name: "Cotton".into(), ..Default::default() }).unwrap();
        let plastic = Material::create(&conn, &MaterialCreate { name: "Plastic".into(), ..Default::default() }).unwrap();
        (conn, product.id, cotton.id, plastic.id)
    }

    #[test]
    fn test_resolved_components_keep_insertion_order() {
        let (conn, product_id, cotton_id, plastic_id) = setup();
        // Plastic first, even though it sorts after Cotton by name
        ProductComponent::create(&conn, &ProductComponentCreate { product_id, material_id: plastic_id, weight_grams: 100.0 }).unwrap();
        ProductComponent::create(&conn, &ProductComponentCreate { product_id, material_id: cotton_id, weight_grams: 400.0 }).unwrap();

        let resolved = ProductComponent::get_resolved_for_product(&conn, product_id).unwrap();
        let names: Vec<&str> = resolved.iter().map(|c| c.material.name.as_str()).collect();
        assert_eq!(names, vec!["Plastic", "Cotton"]);
        assert_eq!(resolved[1].weight_grams, 400.0);
    }

    #[test]
    fn test_duplicate_material_is_rejected() {
        let (conn, product_id, cotton_id, _) = setup();
        let data = ProductComponentCreate { product_id, material_id: cotton_id, weight_grams: 200.0 };
        ProductComponent::create(&conn, &data).unwrap();

        let err = ProductComponent::create(&conn, &data).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_referenced_material_cannot_be_deleted() {
        let (conn, product_id, cotton_id, plastic_id) = setup();
        ProductComponent::create(&conn, &ProductComponentCreate { product_id, material_id: cotton_id, weight_grams: 200.0 }).unwrap();

        assert!(Material::delete(&conn, cotton_id).unwrap_err().is_constraint_violation());
        assert!(Material::delete(&conn, plastic_id).unwrap());
    }

    #[test]
    fn test_deleting_product_cascades_to_components() {
        let (conn, product_id, cotton_id, _) = setup();
        let component = ProductComponent::create(&conn, &ProductComponentCreate { product_id, material_id: cotton_id, weight_grams: 200.0 }).unwrap();

        assert!(Product::delete(&conn, product_id).unwrap());
        assert!(ProductComponent::get_by_id(&conn, component.id).unwrap().is_none());
        assert!(Material::delete(&conn, cotton_id).unwrap());
    }
}
