use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::project::{NewProject, ProjectInput};
use crate::models::Project;
use crate::query::{self, Order, ProjectFilter};

pub async fn create(pool: &SqlitePool, project: &NewProject) -> AppResult<Project> {
    let now = Utc::now();
    let stored = sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO project (
            titulo, descripcion_problema, descripcion_solucion, resultados, imagen_url,
            categoria, activo, orden, cliente, tecnologias, duracion,
            fecha_creacion, fecha_actualizacion
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&project.titulo)
    .bind(&project.descripcion_problema)
    .bind(&project.descripcion_solucion)
    .bind(&project.resultados)
    .bind(&project.imagen_url)
    .bind(&project.categoria)
    .bind(project.activo)
    .bind(project.orden)
    .bind(&project.cliente)
    .bind(&project.tecnologias)
    .bind(&project.duracion)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    info!("Created project {} ({})", stored.id, stored.titulo);
    Ok(stored)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Project> {
    sqlx::query_as::<_, Project>("SELECT * FROM project WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Project"))
}

/// Applies `changes` to the stored project and refreshes
/// `fecha_actualizacion`. Read and write share one transaction.
pub async fn update(pool: &SqlitePool, id: i64, changes: ProjectInput) -> AppResult<Project> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Project>("SELECT * FROM project WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Project"))?;
    let merged = NewProject::merged(current, changes)?;

    let updated = sqlx::query_as::<_, Project>(
        r#"
        UPDATE project SET
            titulo = ?, descripcion_problema = ?, descripcion_solucion = ?, resultados = ?,
            imagen_url = ?, categoria = ?, activo = ?, orden = ?, cliente = ?,
            tecnologias = ?, duracion = ?, fecha_actualizacion = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&merged.titulo)
    .bind(&merged.descripcion_problema)
    .bind(&merged.descripcion_solucion)
    .bind(&merged.resultados)
    .bind(&merged.imagen_url)
    .bind(&merged.categoria)
    .bind(merged.activo)
    .bind(merged.orden)
    .bind(&merged.cliente)
    .bind(&merged.tecnologias)
    .bind(&merged.duracion)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Hides a project from the public site, keeping the row.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> AppResult<Project> {
    sqlx::query_as::<_, Project>(
        "UPDATE project SET activo = 0, fecha_actualizacion = ? WHERE id = ? RETURNING *",
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Project"))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM project WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project"));
    }
    info!("Deleted project {}", id);
    Ok(())
}

/// Active projects in display order.
pub async fn list_public(pool: &SqlitePool) -> Result<Vec<Project>, sqlx::Error> {
    query::fetch_all(pool, &ProjectFilter::visible(), Order::asc("orden"), None).await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    query::count(pool, &ProjectFilter::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn input(titulo: &str, orden: i64) -> ProjectInput {
        ProjectInput {
            titulo: Some(titulo.into()),
            descripcion_problema: Some("Manual inventory".into()),
            descripcion_solucion: Some("Point of sale".into()),
            resultados: Some("Fewer errors".into()),
            orden: Some(orden),
            ..Default::default()
        }
    }

    async fn create_input(pool: &SqlitePool, input: ProjectInput) -> Project {
        create(pool, &input.validate().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_public_list_sorted_by_orden() {
        let pool = memory_pool().await;
        for (titulo, orden) in [("two", 2), ("one", 1), ("three", 3)] {
            create_input(&pool, input(titulo, orden)).await;
        }
        let titles: Vec<String> = list_public(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.titulo)
            .collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_inactive_hidden_from_public_list() {
        let pool = memory_pool().await;
        let active = create_input(&pool, input("shown", 0)).await;
        let mut hidden = input("hidden", 0);
        hidden.activo = Some(false);
        create_input(&pool, hidden).await;

        let public = list_public(&pool).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, active.id);
        assert_eq!(count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp_and_keeps_absent_fields() {
        let pool = memory_pool().await;
        let project = create_input(&pool, input("POS", 0)).await;

        let updated = update(
            &pool,
            project.id,
            ProjectInput {
                categoria: Some("Retail".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.titulo, "POS");
        assert_eq!(updated.categoria.as_deref(), Some("Retail"));
        assert!(updated.fecha_actualizacion >= project.fecha_actualizacion);
        assert_eq!(updated.fecha_creacion, project.fecha_creacion);
    }

    #[tokio::test]
    async fn test_soft_and_hard_delete() {
        let pool = memory_pool().await;
        let project = create_input(&pool, input("POS", 0)).await;

        let hidden = deactivate(&pool, project.id).await.unwrap();
        assert!(!hidden.activo);
        assert!(list_public(&pool).await.unwrap().is_empty());

        delete(&pool, project.id).await.unwrap();
        assert!(matches!(get(&pool, project.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&pool, project.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_missing_project() {
        let pool = memory_pool().await;
        let err = update(&pool, 9, ProjectInput::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Project")));
    }
}
