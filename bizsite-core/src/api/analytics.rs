use axum::extract::State;
use axum::response::Json;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::contact::MessageSummary;
use crate::repo::{analytics, messages};
use crate::AppState;

const RECENT_ACTIVITY_LIMIT: i64 = 5;

/// `GET /api/admin/analytics`
pub async fn overview(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let stats = analytics::dashboard_stats(&state.db).await?;
    let period_stats = analytics::period_stats(&state.db, Utc::now()).await?;
    let services = analytics::service_counts(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
        "period_stats": period_stats,
        "services": services,
    })))
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let stats = analytics::dashboard_stats(&state.db).await?;
    let week = analytics::created_since(&state.db, Utc::now() - Duration::days(7)).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
        "weekly_stats": {
            "messages_this_week": week.messages,
            "projects_created": week.projects,
        },
    })))
}

/// `GET /api/admin/recent-activity`
pub async fn recent_activity(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let recent = messages::recent(&state.db, RECENT_ACTIVITY_LIMIT).await?;
    let summaries: Vec<MessageSummary> = recent.into_iter().map(MessageSummary::from).collect();
    Ok(Json(json!({ "success": true, "messages": summaries })))
}
