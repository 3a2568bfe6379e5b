use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::blog::{BlogPostInput, NewBlogPost};
use crate::models::BlogPost;
use crate::query::{self, BlogFilter, Order};

/// Number of posts on the public blog list unless the caller asks otherwise.
pub const PUBLIC_LIST_LIMIT: i64 = 6;

/// Stores a validated post.
///
/// # Errors
///
/// Returns `AppError::Conflict` when another post already uses the slug.
pub async fn create(pool: &SqlitePool, post: &NewBlogPost) -> AppResult<BlogPost> {
    let now = Utc::now();
    let stored = sqlx::query_as::<_, BlogPost>(
        r#"
        INSERT INTO blog_post (
            titulo, slug, contenido, resumen, imagen_url, categoria, tags, publicado,
            fecha_creacion, fecha_publicacion, fecha_actualizacion, vistas, autor, tiempo_lectura
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&post.titulo)
    .bind(&post.slug)
    .bind(&post.contenido)
    .bind(&post.resumen)
    .bind(&post.imagen_url)
    .bind(&post.categoria)
    .bind(&post.tags)
    .bind(post.publicado)
    .bind(now)
    .bind(post.fecha_publicacion)
    .bind(now)
    .bind(&post.autor)
    .bind(post.tiempo_lectura)
    .fetch_one(pool)
    .await?;

    info!("Created blog post {} ({})", stored.id, stored.slug);
    Ok(stored)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<BlogPost> {
    sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_post WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Post"))
}

pub async fn update(pool: &SqlitePool, id: i64, changes: BlogPostInput) -> AppResult<BlogPost> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_post WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    let merged = NewBlogPost::merged(current, changes, now)?;

    let updated = sqlx::query_as::<_, BlogPost>(
        r#"
        UPDATE blog_post SET
            titulo = ?, slug = ?, contenido = ?, resumen = ?, imagen_url = ?, categoria = ?,
            tags = ?, publicado = ?, fecha_publicacion = ?, autor = ?, tiempo_lectura = ?,
            fecha_actualizacion = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&merged.titulo)
    .bind(&merged.slug)
    .bind(&merged.contenido)
    .bind(&merged.resumen)
    .bind(&merged.imagen_url)
    .bind(&merged.categoria)
    .bind(&merged.tags)
    .bind(merged.publicado)
    .bind(merged.fecha_publicacion)
    .bind(&merged.autor)
    .bind(merged.tiempo_lectura)
    .bind(now)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Takes a post off the public site, keeping the row and its view count.
pub async fn unpublish(pool: &SqlitePool, id: i64) -> AppResult<BlogPost> {
    sqlx::query_as::<_, BlogPost>(
        "UPDATE blog_post SET publicado = 0, fecha_actualizacion = ? WHERE id = ? RETURNING *",
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Post"))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM blog_post WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post"));
    }
    info!("Deleted blog post {}", id);
    Ok(())
}

/// Published posts, most recently published first.
pub async fn list_public(pool: &SqlitePool, limit: i64) -> Result<Vec<BlogPost>, sqlx::Error> {
    query::fetch_all(
        pool,
        &BlogFilter::visible(),
        Order::desc("fecha_publicacion"),
        Some(limit),
    )
    .await
}

/// Fetches a published post by slug and counts the view.
///
/// The increment and the read are one statement, so concurrent readers
/// never lose a view.
pub async fn view_published(pool: &SqlitePool, slug: &str) -> AppResult<BlogPost> {
    sqlx::query_as::<_, BlogPost>(
        "UPDATE blog_post SET vistas = vistas + 1 WHERE slug = ? AND publicado = 1 RETURNING *",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Post"))
}
