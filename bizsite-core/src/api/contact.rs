use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::response::Json;
use serde_json::{json, Value};

use super::json_body;
use crate::error::AppResult;
use crate::models::contact::ContactForm;
use crate::repo::messages;
use crate::AppState;

/// `POST /api/contact`
///
/// Validates the submission and stores it unread, stamped with the
/// caller's address when it is known.
pub async fn submit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let form = json_body(payload)?;
    let ip_address = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());

    let message = messages::insert(&state.db, &form.validate(ip_address)?).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Message sent. We will get back to you soon.",
        "id": message.id,
    })))
}
