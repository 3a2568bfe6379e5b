use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::testimonial::{NewTestimonial, TestimonialInput};
use crate::models::Testimonial;
use crate::query::{self, Order, TestimonialFilter};

pub async fn create(pool: &SqlitePool, testimonial: &NewTestimonial) -> AppResult<Testimonial> {
    let stored = sqlx::query_as::<_, Testimonial>(
        r#"
        INSERT INTO testimonial (
            nombre_cliente, empresa, cargo, testimonio, imagen_url, activo, orden,
            calificacion, proyecto_relacionado, fecha_creacion
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&testimonial.nombre_cliente)
    .bind(&testimonial.empresa)
    .bind(&testimonial.cargo)
    .bind(&testimonial.testimonio)
    .bind(&testimonial.imagen_url)
    .bind(testimonial.activo)
    .bind(testimonial.orden)
    .bind(testimonial.calificacion)
    .bind(&testimonial.proyecto_relacionado)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    info!("Created testimonial {} from {}", stored.id, stored.nombre_cliente);
    Ok(stored)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Testimonial> {
    sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonial WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Testimonial"))
}

pub async fn update(pool: &SqlitePool, id: i64, changes: TestimonialInput) -> AppResult<Testimonial> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonial WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Testimonial"))?;
    let merged = NewTestimonial::merged(current, changes)?;

    let updated = sqlx::query_as::<_, Testimonial>(
        r#"
        UPDATE testimonial SET
            nombre_cliente = ?, empresa = ?, cargo = ?, testimonio = ?, imagen_url = ?,
            activo = ?, orden = ?, calificacion = ?, proyecto_relacionado = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&merged.nombre_cliente)
    .bind(&merged.empresa)
    .bind(&merged.cargo)
    .bind(&merged.testimonio)
    .bind(&merged.imagen_url)
    .bind(merged.activo)
    .bind(merged.orden)
    .bind(merged.calificacion)
    .bind(&merged.proyecto_relacionado)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

pub async fn deactivate(pool: &SqlitePool, id: i64) -> AppResult<Testimonial> {
    sqlx::query_as::<_, Testimonial>("UPDATE testimonial SET activo = 0 WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Testimonial"))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM testimonial WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Testimonial"));
    }
    info!("Deleted testimonial {}", id);
    Ok(())
}

/// Active testimonials in display order.
pub async fn list_public(pool: &SqlitePool) -> Result<Vec<Testimonial>, sqlx::Error> {
    query::fetch_all(pool, &TestimonialFilter::visible(), Order::asc("orden"), None).await
}
