//! Post Tools
//!
//! Published blog and comparison posts, and their maintenance.

use serde::Serialize;

use crate::db::{Database, DbError};
use crate::export::PostView;
use crate::models::{ComparisonPost, Post, PostCreate, PostType, Product};

use super::products::DeleteResponse;
use super::validate;

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub posts: Vec<PostView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub post_type: PostType,
    pub published: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct AddComparisonProductResponse {
    pub post_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub display_order: i64,
    pub product_ids: Vec<i64>,
}

/// Published posts, newest first
pub fn list_posts(db: &Database) -> Result<ListPostsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let posts = PostView::load_published(&conn).map_err(|e| format!("Failed to list posts: {}", e))?;

    let total = posts.len();
    Ok(ListPostsResponse { posts, total })
}

/// A published post by slug
pub fn get_post(db: &Database, slug: &str) -> Result<Option<PostView>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let post = Post::get_published_by_slug(&conn, slug.trim())
        .map_err(|e| format!("Failed to get post: {}", e))?;

    post.map(|p| PostView::load(&conn, &p).map_err(|e| format!("Failed to load post: {}", e)))
        .transpose()
}

/// Post type from its stored name; a missing value means a blog post
pub fn parse_post_type(value: Option<&str>) -> Result<PostType, String> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("blog") => Ok(PostType::Blog),
        Some("comparison") => Ok(PostType::Comparison),
        Some(other) => Err(format!("Unknown post type '{}': expected 'blog' or 'comparison'", other)),
    }
}

/// Create a blog or comparison post
pub fn create_post(db: &Database, mut data: PostCreate) -> Result<CreatePostResponse, String> {
    data.title = validate::require_text("Title", &data.title)?.to_string();
    data.slug = validate::require_slug(&data.slug)?.to_string();
    if let Some(author) = &data.author {
        data.author = Some(validate::require_text("Author", author)?.to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let post = Post::create(&conn, &data).map_err(|e| {
        if e.is_constraint_violation() {
            format!("A post with slug '{}' already exists", data.slug)
        } else {
            format!("Failed to create post: {}", e)
        }
    })?;

    Ok(CreatePostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        post_type: post.post_type,
        published: post.published,
        created_at: post.created_at,
    })
}

/// Delete a post
pub fn delete_post(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let post = Post::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Post not found with id: {}", id))?;
    Post::delete(&conn, id).map_err(|e| format!("Failed to delete post: {}", e))?;

    Ok(DeleteResponse {
        success: true,
        message: format!("Deleted post '{}'", post.slug),
    })
}

/// Feature a product in a comparison post
pub fn add_comparison_product(
    db: &Database,
    post_id: i64,
    product_id: i64,
    display_order: i64,
) -> Result<AddComparisonProductResponse, String> {
    db.with_transaction(|tx| {
        let post = Post::get_by_id(tx, post_id)?.ok_or_else(|| DbError::not_found("Post", post_id))?;
        if post.post_type != PostType::Comparison {
            return Err(DbError::Rejected(format!("Post '{}' is not a comparison post", post.slug)));
        }
        let product = Product::get_by_id(tx, product_id)?.ok_or_else(|| DbError::not_found("Product", product_id))?;

        ComparisonPost::create(tx, post_id, product_id, display_order).map_err(|e| {
            if e.is_constraint_violation() {
                DbError::Rejected(format!("'{}' is already part of '{}'", product.name, post.slug))
            } else {
                e
            }
        })?;
        let product_ids = ComparisonPost::get_product_ids(tx, post_id)?;

        Ok(AddComparisonProductResponse {
            post_id,
            product_id,
            product_name: product.name,
            display_order,
            product_ids,
        })
    })
    .map_err(|e| {
        if e.is_user_facing() {
            e.to_string()
        } else {
            format!("Failed to add product to comparison: {}", e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::ProductCreate;
    use crate::tools::products;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        db
    }

    fn post(slug: &str, post_type: PostType) -> PostCreate {
        PostCreate {
            title: "Napkins".into(),
            slug: slug.into(),
            post_type,
            content: "Paper or cloth?".into(),
            excerpt: String::new(),
            author: None,
            published: true,
            featured: false,
        }
    }

    #[test]
    fn test_comparison_post_lists_products() {
        let db = setup();
        let created = create_post(&db, post("napkins", PostType::Comparison)).unwrap();
        let paper = products::create_product(&db, ProductCreate::new("Paper Napkin", "paper-napkin")).unwrap();
        let cloth = products::create_product(&db, ProductCreate::new("Cloth Napkin", "cloth-napkin")).unwrap();

        add_comparison_product(&db, created.id, paper.id, 1).unwrap();
        let added = add_comparison_product(&db, created.id, cloth.id, 0).unwrap();
        assert_eq!(added.product_ids, vec![cloth.id, paper.id]);

        let view = get_post(&db, "napkins").unwrap().unwrap();
        let comparison = view.comparison.unwrap();
        assert_eq!(comparison.products[0].slug, "cloth-napkin");
        assert!(get_post(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_post_type_names() {
        assert_eq!(parse_post_type(None).unwrap(), PostType::Blog);
        assert_eq!(parse_post_type(Some("Comparison")).unwrap(), PostType::Comparison);
        assert_eq!(parse_post_type(Some(" blog ")).unwrap(), PostType::Blog);

        let err = parse_post_type(Some("comparsion")).unwrap_err();
        assert!(err.contains("comparsion"));
    }

    #[test]
    fn test_comparison_product_rejections() {
        let db = setup();
        let created = create_post(&db, post("bags", PostType::Comparison)).unwrap();
        let tote = products::create_product(&db, ProductCreate::new("Tote", "tote")).unwrap();

        add_comparison_product(&db, created.id, tote.id, 0).unwrap();
        let err = add_comparison_product(&db, created.id, tote.id, 1).unwrap_err();
        assert_eq!(err, "'Tote' is already part of 'bags'");

        let err = add_comparison_product(&db, 999, tote.id, 0).unwrap_err();
        assert_eq!(err, "Post not found: 999");
        let err = add_comparison_product(&db, created.id, 999, 0).unwrap_err();
        assert_eq!(err, "Product not found: 999");

        let view = get_post(&db, "bags").unwrap().unwrap();
        assert_eq!(view.comparison.unwrap().product_ids, vec![tote.id]);
    }

    #[test]
    fn test_blog_post_rejects_products() {
        let db = setup();
        let created = create_post(&db, post("news", PostType::Blog)).unwrap();
        let product = products::create_product(&db, ProductCreate::new("Mug", "mug")).unwrap();

        let err = add_comparison_product(&db, created.id, product.id, 0).unwrap_err();
        assert_eq!(err, "Post 'news' is not a comparison post");
        assert_eq!(list_posts(&db).unwrap().total, 1);

        delete_post(&db, created.id).unwrap();
        assert_eq!(list_posts(&db).unwrap().total, 0);
    }
}
