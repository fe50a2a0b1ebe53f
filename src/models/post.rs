//! Post models
//!
//! Editorial content: blog posts, and comparison posts that feature an
//! ordered list of products.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

pub const DEFAULT_AUTHOR: &str = "The Full Price Team";

/// Kind of post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Blog,
    Comparison,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Blog => "blog",
            PostType::Comparison => "comparison",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "comparison" => PostType::Comparison,
            _ => PostType::Blog,
        }
    }
}

/// A blog post or product comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub post_type: PostType,
    /// Markdown or HTML
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub published: bool,
    pub featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub post_type: PostType,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub author: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_published() -> bool {
    true
}

/// A product featured in a comparison post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonPost {
    pub id: i64,
    pub post_id: i64,
    pub product_id: i64,
    pub display_order: i64,
}

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            post_type: PostType::from_str(row.get::<_, String>("post_type")?.as_str()),
            content: row.get("content")?,
            excerpt: row.get("excerpt")?,
            author: row.get("author")?,
            published: row.get::<_, i32>("published")? != 0,
            featured: row.get::<_, i32>("featured")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &PostCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO posts (title, slug, post_type, content, excerpt, author, published, featured)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.title,
                data.slug,
                data.post_type.as_str(),
                data.content,
                data.excerpt,
                data.author.as_deref().unwrap_or(DEFAULT_AUTHOR),
                data.published as i32,
                data.featured as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::not_found("Post", id))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM posts WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(post) => Ok(Some(post)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// A published post by slug; drafts are invisible here
    pub fn get_published_by_slug(conn: &Connection, slug: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM posts WHERE slug = ?1 AND published = 1")?;

        match stmt.query_row([slug], Self::from_row) {
            Ok(post) => Ok(Some(post)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Published posts, newest first
    pub fn list_published(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM posts WHERE published = 1 ORDER BY created_at DESC, id DESC",
        )?;

        let posts = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl ComparisonPost {
    /// Feature a product in a comparison post
    pub fn create(conn: &Connection, post_id: i64, product_id: i64, display_order: i64) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO comparison_posts (post_id, product_id, display_order) VALUES (?1, ?2, ?3)",
            params![post_id, product_id, display_order],
        )?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            post_id,
            product_id,
            display_order,
        })
    }

    /// Product IDs of a comparison post in display order
    pub fn get_product_ids(conn: &Connection, post_id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT product_id FROM comparison_posts WHERE post_id = ?1 ORDER BY display_order, id",
        )?;

        let ids = stmt
            .query_map([post_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }
}
