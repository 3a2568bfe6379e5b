use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::Extension;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use super::{done, json_body, paged, DeleteParams, IdPath, ListParams};
use crate::error::AppResult;
use crate::models::blog::{BlogPostInput, BlogPostView};
use crate::models::contact::ReplyRequest;
use crate::models::project::ProjectInput;
use crate::models::testimonial::TestimonialInput;
use crate::models::{required, BlogPost, ContactMessage, Project, Session};
use crate::query::{
    self, ActiveFilter, BlogFilter, Discriminator, ListQuery, MessageFilter, ProjectFilter,
    PublishedFilter, ReadFilter, TestimonialFilter,
};
use crate::repo::{blog, messages, projects, testimonials};
use crate::AppState;

// Messages

/// `GET /api/admin/messages?page&per_page&read&service`
pub async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let filter = MessageFilter {
        read: ReadFilter::from_param(params.read.as_deref()),
        service: Discriminator::from_param(params.service.as_deref()),
    };
    let page = query::paginate(&state.db, &ListQuery::new(filter, params.page_request())).await?;
    paged("messages", page)
}

/// `GET /api/admin/messages/:id`
///
/// Viewing a message marks it read.
pub async fn get_message(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<Value>> {
    let message = messages::view(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

/// `POST /api/admin/messages/:id/mark-read`
pub async fn mark_message_read(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<Value>> {
    messages::mark_read(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "message": "Message marked as read" })))
}

/// `POST /api/admin/messages/:id/reply`
pub async fn reply_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    IdPath(id): IdPath,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let respuesta = required("respuesta", json_body(payload)?.respuesta)?;
    let message = messages::reply(&state.db, id, &respuesta).await?;
    info!("Message {} answered by {}", id, session.username);
    done("Reply saved", message)
}

/// `DELETE /api/admin/messages/:id`
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    IdPath(id): IdPath,
) -> AppResult<Json<Value>> {
    messages::delete(&state.db, id).await?;
    info!("Message {} deleted by {}", id, session.username);
    Ok(Json(json!({ "success": true, "message": "Message deleted" })))
}

/// `GET /api/admin/messages/services`
pub async fn message_services(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let services = query::group_count::<ContactMessage>(&state.db, "servicio").await?;
    Ok(Json(json!({ "success": true, "services": services })))
}

// Projects

/// `GET /api/admin/projects?page&per_page&active&category`
pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let filter = ProjectFilter {
        active: ActiveFilter::from_param(params.active.as_deref()),
        category: Discriminator::from_param(params.category.as_deref()),
    };
    let page = query::paginate(&state.db, &ListQuery::new(filter, params.page_request())).await?;
    paged("projects", page)
}

pub async fn get_project(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<Value>> {
    let project = projects::get(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let project = json_body(payload)?.validate()?;
    let stored = projects::create(&state.db, &project).await?;
    done("Project created", stored)
}

pub async fn update_project(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let updated = projects::update(&state.db, id, json_body(payload)?).await?;
    done("Project updated", updated)
}

/// `DELETE /api/admin/projects/:id[?permanent=true]`
///
/// Deactivates by default; removes the row only when `permanent` is set.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    IdPath(id): IdPath,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<Value>> {
    if params.is_permanent() {
        projects::delete(&state.db, id).await?;
        info!("Project {} permanently deleted by {}", id, session.username);
        return Ok(Json(json!({ "success": true, "message": "Project deleted" })));
    }
    let project: Project = projects::deactivate(&state.db, id).await?;
    done("Project deactivated", project)
}

/// `GET /api/admin/projects/categories`
pub async fn project_categories(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let categories = query::group_count::<Project>(&state.db, "categoria").await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

// Testimonials

/// `GET /api/admin/testimonials?page&per_page&active`
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let filter = TestimonialFilter {
        active: ActiveFilter::from_param(params.active.as_deref()),
    };
    let page = query::paginate(&state.db, &ListQuery::new(filter, params.page_request())).await?;
    paged("testimonials", page)
}

pub async fn get_testimonial(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<Value>> {
    let testimonial = testimonials::get(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "testimonial": testimonial })))
}

pub async fn create_testimonial(
    State(state): State<AppState>,
    payload: Result<Json<TestimonialInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let testimonial = json_body(payload)?.validate()?;
    let stored = testimonials::create(&state.db, &testimonial).await?;
    done("Testimonial created", stored)
}

pub async fn update_testimonial(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    payload: Result<Json<TestimonialInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let updated = testimonials::update(&state.db, id, json_body(payload)?).await?;
    done("Testimonial updated", updated)
}

pub async fn delete_testimonial(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    IdPath(id): IdPath,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<Value>> {
    if params.is_permanent() {
        testimonials::delete(&state.db, id).await?;
        info!("Testimonial {} permanently deleted by {}", id, session.username);
        return Ok(Json(json!({ "success": true, "message": "Testimonial deleted" })));
    }
    let testimonial = testimonials::deactivate(&state.db, id).await?;
    done("Testimonial deactivated", testimonial)
}

// Blog

/// `GET /api/admin/blog?page&per_page&published&category`
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let filter = BlogFilter {
        published: PublishedFilter::from_param(params.published.as_deref()),
        category: Discriminator::from_param(params.category.as_deref()),
    };
    let page = query::paginate(&state.db, &ListQuery::new(filter, params.page_request())).await?;
    paged("posts", page.map(BlogPostView::from))
}

pub async fn get_post(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<Value>> {
    let post = blog::get(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "post": BlogPostView::from(post) })))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<BlogPostInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let post = json_body(payload)?.validate(Utc::now())?;
    let stored = blog::create(&state.db, &post).await?;
    done("Post created", BlogPostView::from(stored))
}

pub async fn update_post(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    payload: Result<Json<BlogPostInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let updated = blog::update(&state.db, id, json_body(payload)?).await?;
    done("Post updated", BlogPostView::from(updated))
}

/// `DELETE /api/admin/blog/:id[?permanent=true]`
///
/// Unpublishes by default; removes the row only when `permanent` is set.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    IdPath(id): IdPath,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<Value>> {
    if params.is_permanent() {
        blog::delete(&state.db, id).await?;
        info!("Post {} permanently deleted by {}", id, session.username);
        return Ok(Json(json!({ "success": true, "message": "Post deleted" })));
    }
    let post: BlogPost = blog::unpublish(&state.db, id).await?;
    done("Post unpublished", BlogPostView::from(post))
}

/// `GET /api/admin/blog/categories`
pub async fn blog_categories(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let categories = query::group_count::<BlogPost>(&state.db, "categoria").await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}
