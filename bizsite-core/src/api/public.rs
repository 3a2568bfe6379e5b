use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::blog::{BlogDetail, BlogSummary};
use crate::models::project::ProjectPublic;
use crate::models::testimonial::TestimonialPublic;
use crate::repo::{blog, projects, testimonials};
use crate::AppState;

/// Upper bound for `?limit=` on the public blog list.
pub const MAX_PUBLIC_POSTS: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct BlogListParams {
    pub limit: Option<String>,
}

impl BlogListParams {
    fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|limit| limit.clamp(1, MAX_PUBLIC_POSTS))
            .unwrap_or(blog::PUBLIC_LIST_LIMIT)
    }
}

/// `GET /api/projects`
pub async fn list_projects(State(state): State<AppState>) -> AppResult<Json<Vec<ProjectPublic>>> {
    let projects = projects::list_public(&state.db).await?;
    Ok(Json(projects.into_iter().map(ProjectPublic::from).collect()))
}

/// `GET /api/testimonials`
pub async fn list_testimonials(State(state): State<AppState>) -> AppResult<Json<Vec<TestimonialPublic>>> {
    let testimonials = testimonials::list_public(&state.db).await?;
    Ok(Json(testimonials.into_iter().map(TestimonialPublic::from).collect()))
}

/// `GET /api/blog`
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<BlogListParams>,
) -> AppResult<Json<Vec<BlogSummary>>> {
    let posts = blog::list_public(&state.db, params.limit()).await?;
    Ok(Json(posts.into_iter().map(BlogSummary::from).collect()))
}

/// `GET /api/blog/:slug`
///
/// Each successful fetch counts one view.
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogDetail>> {
    let post = blog::view_published(&state.db, &slug).await?;
    Ok(Json(BlogDetail::from(post)))
}
