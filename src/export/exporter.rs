//! Static data exporter
//!
//! Writes the catalog and published posts as pretty-printed JSON files for
//! the static front end:
//!
//! - `products.json`: `{products, export_timestamp}`
//! - `posts.json`: `{posts, export_timestamp}`
//! - `posts/<slug>.json`: `{post, export_timestamp}`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::{Database, DbError};

use super::view::{PostView, ProductView};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Serialize)]
struct ProductsFile<'a> {
    products: &'a [ProductView],
    export_timestamp: &'a str,
}

#[derive(Serialize)]
struct PostsFile<'a> {
    posts: &'a [PostView],
    export_timestamp: &'a str,
}

#[derive(Serialize)]
struct PostFile<'a> {
    post: &'a PostView,
    export_timestamp: &'a str,
}

/// Counts of what an export run wrote
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    pub output_dir: String,
    pub products: usize,
    pub posts: usize,
    pub post_files: usize,
    pub export_timestamp: String,
}

pub struct StaticDataExporter {
    output_dir: PathBuf,
}

impl StaticDataExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Export products, the post index and one file per published post
    pub fn export_all(&self, db: &Database) -> ExportResult<ExportSummary> {
        let conn = db.get_conn()?;
        self.export_all_with_conn(&conn)
    }

    pub fn export_all_with_conn(&self, conn: &Connection) -> ExportResult<ExportSummary> {
        create_dir(&self.output_dir)?;
        let export_timestamp = timestamp();

        let products = self.export_products(conn, &export_timestamp)?;
        let posts = PostView::load_published(conn)?;
        self.export_posts(&posts, &export_timestamp)?;
        let post_files = self.export_individual_posts(&posts, &export_timestamp)?;

        tracing::info!(
            products,
            posts = posts.len(),
            output_dir = %self.output_dir.display(),
            "Static export complete"
        );

        Ok(ExportSummary {
            output_dir: self.output_dir.display().to_string(),
            products,
            posts: posts.len(),
            post_files,
            export_timestamp,
        })
    }

    /// Write `products.json`; returns the number of products
    pub fn export_products(&self, conn: &Connection, export_timestamp: &str) -> ExportResult<usize> {
        let products = ProductView::load_all(conn)?;
        self.write_json(
            &self.output_dir.join("products.json"),
            &ProductsFile {
                products: &products,
                export_timestamp,
            },
        )?;
        Ok(products.len())
    }

    /// Write `posts.json`
    pub fn export_posts(&self, posts: &[PostView], export_timestamp: &str) -> ExportResult<()> {
        self.write_json(
            &self.output_dir.join("posts.json"),
            &PostsFile {
                posts,
                export_timestamp,
            },
        )
    }

    /// Write `posts/<slug>.json` for each post; returns the number written
    pub fn export_individual_posts(&self, posts: &[PostView], export_timestamp: &str) -> ExportResult<usize> {
        let posts_dir = self.output_dir.join("posts");
        create_dir(&posts_dir)?;

        for post in posts {
            self.write_json(
                &posts_dir.join(format!("{}.json", post.slug)),
                &PostFile {
                    post,
                    export_timestamp,
                },
            )?;
        }

        Ok(posts.len())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> ExportResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Exported");
        Ok(())
    }
}

fn create_dir(path: &Path) -> ExportResult<()> {
    fs::create_dir_all(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Current UTC time in ISO-8601
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{ComparisonPost, Post, PostCreate, PostType, Product, ProductCreate};

    fn seeded_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            let bag = Product::create(conn, &ProductCreate::new("Paper Bag", "paper-bag"))?;
            Product::create(conn, &ProductCreate::new("Cotton Tote", "cotton-tote"))?;

            let base = PostCreate {
                title: "Bags".into(),
                slug: "bags".into(),
                post_type: PostType::Comparison,
                content: "Which bag?".into(),
                excerpt: String::new(),
                author: None,
                published: true,
                featured: false,
            };
            let post = Post::create(conn, &base)?;
            ComparisonPost::create(conn, post.id, bag.id, 0)?;
            Post::create(conn, &PostCreate { slug: "draft".into(), published: false, post_type: PostType::Blog, ..base })?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn read(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_export_all_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("static_data");
        let exporter = StaticDataExporter::new(&out);

        let summary = exporter.export_all(&seeded_db()).unwrap();
        assert_eq!(summary.products, 2);
        assert_eq!(summary.posts, 1);
        assert_eq!(summary.post_files, 1);

        let products = read(&out.join("products.json"));
        assert_eq!(products["products"].as_array().unwrap().len(), 2);
        assert_eq!(products["products"][0]["slug"], "cotton-tote");
        assert_eq!(products["export_timestamp"], summary.export_timestamp.as_str());

        let posts = read(&out.join("posts.json"));
        assert_eq!(posts["posts"].as_array().unwrap().len(), 1);

        let post = read(&out.join("posts").join("bags.json"));
        assert_eq!(post["post"]["comparison"]["products"][0]["slug"], "paper-bag");
        assert!(!out.join("posts").join("draft.json").exists());
    }

    #[test]
    fn test_timestamp_is_utc() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
