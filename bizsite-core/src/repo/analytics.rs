use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::models::ContactMessage;
use crate::query::{self, GroupCount};

/// Headline counts shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DashboardStats {
    pub total_messages: i64,
    pub unread_messages: i64,
    pub active_projects: i64,
    pub active_testimonials: i64,
    pub published_posts: i64,
    pub total_users: i64,
}

pub async fn dashboard_stats(pool: &SqlitePool) -> Result<DashboardStats, sqlx::Error> {
    sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM contact_message) AS total_messages,
            (SELECT COUNT(*) FROM contact_message WHERE leido = 0) AS unread_messages,
            (SELECT COUNT(*) FROM project WHERE activo = 1) AS active_projects,
            (SELECT COUNT(*) FROM testimonial WHERE activo = 1) AS active_testimonials,
            (SELECT COUNT(*) FROM blog_post WHERE publicado = 1) AS published_posts,
            (SELECT COUNT(*) FROM users) AS total_users
        "#,
    )
    .fetch_one(pool)
    .await
}

/// Rows created inside one trailing time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct WindowCounts {
    pub messages: i64,
    pub projects: i64,
}

pub async fn created_since(pool: &SqlitePool, since: DateTime<Utc>) -> Result<WindowCounts, sqlx::Error> {
    sqlx::query_as::<_, WindowCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM contact_message WHERE fecha >= ?) AS messages,
            (SELECT COUNT(*) FROM project WHERE fecha_creacion >= ?) AS projects
        "#,
    )
    .bind(since)
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Trailing windows of 1, 7, 30 and 365 days ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub today: WindowCounts,
    pub week: WindowCounts,
    pub month: WindowCounts,
    pub year: WindowCounts,
}

pub async fn period_stats(pool: &SqlitePool, now: DateTime<Utc>) -> Result<PeriodStats, sqlx::Error> {
    Ok(PeriodStats {
        today: created_since(pool, now - Duration::days(1)).await?,
        week: created_since(pool, now - Duration::days(7)).await?,
        month: created_since(pool, now - Duration::days(30)).await?,
        year: created_since(pool, now - Duration::days(365)).await?,
    })
}

/// Message volume per requested service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: i64,
}

impl From<GroupCount> for ServiceCount {
    fn from(group: GroupCount) -> Self {
        ServiceCount {
            service: group.value,
            count: group.count,
        }
    }
}

pub async fn service_counts(pool: &SqlitePool) -> Result<Vec<ServiceCount>, sqlx::Error> {
    let groups = query::group_count::<ContactMessage>(pool, "servicio").await?;
    Ok(groups.into_iter().map(ServiceCount::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::contact::ContactForm;
    use crate::models::project::ProjectInput;
    use crate::repo::{messages, projects};

    async fn message(pool: &SqlitePool, servicio: &str) -> ContactMessage {
        let form = ContactForm {
            nombre: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            telefono: None,
            servicio: Some(servicio.into()),
            mensaje: Some("Hola".into()),
        };
        messages::insert(pool, &form.validate(None).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_stats_counts_each_table() {
        let pool = memory_pool().await;
        let first = message(&pool, "web").await;
        message(&pool, "web").await;
        messages::mark_read(&pool, first.id).await.unwrap();

        let project = ProjectInput {
            titulo: Some("POS".into()),
            descripcion_problema: Some("p".into()),
            descripcion_solucion: Some("s".into()),
            resultados: Some("r".into()),
            activo: Some(false),
            ..Default::default()
        };
        projects::create(&pool, &project.validate().unwrap()).await.unwrap();

        let stats = dashboard_stats(&pool).await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_messages: 2,
                unread_messages: 1,
                active_projects: 0,
                active_testimonials: 0,
                published_posts: 0,
                total_users: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_windows_exclude_older_rows() {
        let pool = memory_pool().await;
        let old = message(&pool, "web").await;
        message(&pool, "web").await;
        sqlx::query("UPDATE contact_message SET fecha = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(10))
            .bind(old.id)
            .execute(&pool)
            .await
            .unwrap();

        let periods = period_stats(&pool, Utc::now()).await.unwrap();
        assert_eq!(periods.today.messages, 1);
        assert_eq!(periods.week.messages, 1);
        assert_eq!(periods.month.messages, 2);
        assert_eq!(periods.year.messages, 2);
    }

    #[tokio::test]
    async fn test_service_counts_largest_first() {
        let pool = memory_pool().await;
        for service in ["seo", "web", "web", "pos", "web", "pos"] {
            message(&pool, service).await;
        }
        let counts = service_counts(&pool).await.unwrap();
        let pairs: Vec<(&str, i64)> = counts.iter().map(|c| (c.service.as_str(), c.count)).collect();
        assert_eq!(pairs, vec![("web", 3), ("pos", 2), ("seo", 1)]);
    }
}
