use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::contact::NewContactMessage;
use crate::models::ContactMessage;
use crate::query::{self, MessageFilter, Order};

/// Persists a validated submission with `leido = false` and `fecha = now`.
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
/// * `message` - Submission that already passed `ContactForm::validate`
///
/// # Returns
///
/// The stored row, including its assigned id.
pub async fn insert(pool: &SqlitePool, message: &NewContactMessage) -> AppResult<ContactMessage> {
    let stored = sqlx::query_as::<_, ContactMessage>(
        r#"
        INSERT INTO contact_message (nombre, email, telefono, servicio, mensaje, leido, fecha, ip_address)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&message.nombre)
    .bind(&message.email)
    .bind(&message.telefono)
    .bind(&message.servicio)
    .bind(&message.mensaje)
    .bind(Utc::now())
    .bind(&message.ip_address)
    .fetch_one(pool)
    .await?;

    info!("Stored contact message {} for service {}", stored.id, stored.servicio);
    Ok(stored)
}

/// Reads a message without side effects.
pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<ContactMessage> {
    sqlx::query_as::<_, ContactMessage>("SELECT * FROM contact_message WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Message"))
}

/// Reads a message for an administrator, marking it read in the same
/// statement.
pub async fn view(pool: &SqlitePool, id: i64) -> AppResult<ContactMessage> {
    sqlx::query_as::<_, ContactMessage>("UPDATE contact_message SET leido = 1 WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Message"))
}

/// Sets `leido`. Marking an already-read message is a no-op success.
pub async fn mark_read(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("UPDATE contact_message SET leido = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Message"));
    }
    Ok(())
}

/// Stores an administrator reply and marks the message read.
pub async fn reply(pool: &SqlitePool, id: i64, respuesta: &str) -> AppResult<ContactMessage> {
    sqlx::query_as::<_, ContactMessage>(
        r#"
        UPDATE contact_message
        SET respuesta = ?, fecha_respuesta = ?, leido = 1
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(respuesta)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Message"))
}

/// Removes a message permanently.
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM contact_message WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Message"));
    }
    info!("Deleted contact message {}", id);
    Ok(())
}

/// The `limit` newest messages.
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ContactMessage>, sqlx::Error> {
    query::fetch_all(
        pool,
        &MessageFilter::default(),
        Order::newest::<ContactMessage>(),
        Some(limit),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::contact::ContactForm;

    async fn submit(pool: &SqlitePool) -> ContactMessage {
        let form = ContactForm {
            nombre: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            telefono: Some("555-0101".into()),
            servicio: Some("web".into()),
            mensaje: Some("Need a site".into()),
        };
        insert(pool, &form.validate(Some("10.0.0.1".into())).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_starts_unread() {
        let pool = memory_pool().await;
        let message = submit(&pool).await;
        assert!(message.id > 0);
        assert!(!message.leido);
        assert_eq!(message.ip_address.as_deref(), Some("10.0.0.1"));
        assert!(message.respuesta.is_none());
    }

    #[tokio::test]
    async fn test_read_flag_is_monotonic() {
        let pool = memory_pool().await;
        let message = submit(&pool).await;
        assert!(!get(&pool, message.id).await.unwrap().leido);

        mark_read(&pool, message.id).await.unwrap();
        mark_read(&pool, message.id).await.unwrap();
        assert!(get(&pool, message.id).await.unwrap().leido);

        let viewed = view(&pool, message.id).await.unwrap();
        assert!(viewed.leido);
    }

    #[tokio::test]
    async fn test_view_marks_read() {
        let pool = memory_pool().await;
        let message = submit(&pool).await;
        let viewed = view(&pool, message.id).await.unwrap();
        assert!(viewed.leido);
        assert_eq!(viewed.fecha, message.fecha);
    }

    #[tokio::test]
    async fn test_reply_records_answer() {
        let pool = memory_pool().await;
        let message = submit(&pool).await;
        let replied = reply(&pool, message.id, "Thanks, we'll call you").await.unwrap();
        assert_eq!(replied.respuesta.as_deref(), Some("Thanks, we'll call you"));
        assert!(replied.fecha_respuesta.is_some());
        assert!(replied.leido);
    }

    #[tokio::test]
    async fn test_missing_message_is_not_found() {
        let pool = memory_pool().await;
        assert!(matches!(mark_read(&pool, 42).await, Err(AppError::NotFound(_))));
        assert!(matches!(view(&pool, 42).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&pool, 42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let pool = memory_pool().await;
        let message = submit(&pool).await;
        delete(&pool, message.id).await.unwrap();
        assert!(matches!(get(&pool, message.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_recent_is_capped() {
        let pool = memory_pool().await;
        for _ in 0..7 {
            submit(&pool).await;
        }
        let latest = recent(&pool, 5).await.unwrap();
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].id, 7);
    }
}
