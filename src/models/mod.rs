//! Data models
//!
//! Rust structs representing database entities.

mod material;
mod post;
mod product;
mod product_component;

pub use material::{Material, MaterialCreate, MaterialUpdate, PhaseUpdate};
pub use post::{ComparisonPost, Post, PostCreate, PostType, DEFAULT_AUTHOR};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use product_component::{ProductComponent, ProductComponentCreate, ResolvedComponent};
