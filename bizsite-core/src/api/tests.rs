use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::db::memory_pool;
use crate::models::contact::ContactForm;
use crate::models::project::ProjectInput;
use crate::models::user::NewUser;
use crate::repo::{messages, projects, users};
use crate::{create_router, AppState};

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let pool = memory_pool().await;
        let config = Config {
            bcrypt_cost: 4,
            ..Config::default()
        };
        users::create(
            &pool,
            &NewUser {
                username: "admin".into(),
                email: "admin@example.com".into(),
                password: "admin123".into(),
                is_admin: true,
            },
            config.bcrypt_cost,
        )
        .await
        .unwrap();

        let state = AppState::new(pool, config);
        let router = create_router(state.clone())
            .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 51000))));
        TestApp { router, state }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/admin/login",
                json!({ "username": "admin", "password": "admin123" }),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }
}

fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn contact_form(servicio: &str) -> ContactForm {
    ContactForm {
        nombre: Some("Ana".into()),
        email: Some("ana@example.com".into()),
        telefono: None,
        servicio: Some(servicio.into()),
        mensaje: Some("Need a quote".into()),
    }
}

fn project(titulo: &str, orden: i64, activo: bool) -> ProjectInput {
    ProjectInput {
        titulo: Some(titulo.into()),
        descripcion_problema: Some("problem".into()),
        descripcion_solucion: Some("solution".into()),
        resultados: Some("results".into()),
        orden: Some(orden),
        activo: Some(activo),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app.send(get("/health/db", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["database"], "connected");
}

#[tokio::test]
async fn test_contact_submission_is_stored_unread_with_caller_ip() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/contact",
            json!({
                "nombre": "Ana",
                "email": "ana@example.com",
                "servicio": "POS",
                "mensaje": "Need a quote"
            }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let id = body["id"].as_i64().unwrap();
    let stored = messages::get(&app.state.db, id).await.unwrap();
    assert!(!stored.leido);
    assert_eq!(stored.ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_contact_submission_with_blank_message_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/contact",
            json!({
                "nombre": "Ana",
                "email": "ana@example.com",
                "servicio": "POS",
                "mensaje": "   "
            }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["field"], "mensaje");

    let token = app.login().await;
    let body = body_json(app.send(get("/api/admin/messages", Some(&token))).await).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_public_projects_hide_inactive_and_follow_display_order() {
    let app = TestApp::new().await;
    for (titulo, orden, activo) in [("B", 2, true), ("A", 1, true), ("C", 3, true), ("Hidden", 0, false)] {
        projects::create(&app.state.db, &project(titulo, orden, activo).validate().unwrap())
            .await
            .unwrap();
    }

    let body = body_json(app.send(get("/api/projects", None)).await).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["titulo"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/admin/login",
            json!({ "username": "admin", "password": "wrong" }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_login_sets_session_cookie_usable_by_admin_routes() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/admin/login",
            json!({ "username": "admin", "password": "admin123" }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("bizsite_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie_pair = set_cookie.split(';').next().unwrap();
    let request = Request::builder()
        .uri("/api/admin/stats")
        .header(header::COOKIE, cookie_pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_form_login_failure_redirects_back_to_login() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=nope"))
        .unwrap();
    let response = app.send(request).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login?error=invalid"
    );
}

#[tokio::test]
async fn test_admin_routes_require_a_session() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/admin/messages", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/messages?page=2")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert!(response.status().is_redirection());
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("/admin/login?next="));
}

#[tokio::test]
async fn test_check_session_reports_state() {
    let app = TestApp::new().await;

    let body = body_json(app.send(get("/admin/check-session", None)).await).await;
    assert_eq!(body["authenticated"], false);

    let token = app.login().await;
    let body = body_json(app.send(get("/admin/check-session", Some(&token))).await).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "admin");
}

#[tokio::test]
async fn test_logout_revokes_the_session() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let response = app.send(get("/admin/logout", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());

    let response = app.send(get("/api/admin/messages", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_message_list_paginates_and_filters() {
    let app = TestApp::new().await;
    for servicio in ["POS", "POS", "Web"] {
        messages::insert(&app.state.db, &contact_form(servicio).validate(None).unwrap())
            .await
            .unwrap();
    }
    let token = app.login().await;

    let body = body_json(app.send(get("/api/admin/messages?per_page=2", Some(&token))).await).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pages"], 2);
    assert_eq!(body["pagination"]["has_next"], true);

    let body = body_json(app.send(get("/api/admin/messages?service=Web", Some(&token))).await).await;
    assert_eq!(body["pagination"]["total"], 1);

    let body = body_json(app.send(get("/api/admin/messages?page=abc&per_page=0", Some(&token))).await).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["per_page"], 10);
}

#[tokio::test]
async fn test_viewing_a_message_marks_it_read() {
    let app = TestApp::new().await;
    let stored = messages::insert(&app.state.db, &contact_form("POS").validate(None).unwrap())
        .await
        .unwrap();
    let token = app.login().await;

    let uri = format!("/api/admin/messages/{}", stored.id);
    let body = body_json(app.send(get(&uri, Some(&token))).await).await;
    assert_eq!(body["message"]["leido"], true);

    let body = body_json(app.send(get("/api/admin/messages?read=unread", Some(&token))).await).await;
    assert_eq!(body["pagination"]["total"], 0);

    let response = app.send(get("/api/admin/messages/9999", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_delete_is_soft_unless_permanent() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/admin/projects",
            json!({
                "titulo": "Inventory",
                "descripcion_problema": "p",
                "descripcion_solucion": "s",
                "resultados": "r"
            }),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/admin/projects/{}", id);

    let response = app
        .send(json_request(Method::PUT, &uri, json!({ "orden": 4 }), Some(&token)))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["orden"], 4);
    assert_eq!(body["data"]["titulo"], "Inventory");

    let body = body_json(app.send(delete(&uri, &token)).await).await;
    assert_eq!(body["data"]["activo"], false);
    let public = body_json(app.send(get("/api/projects", None)).await).await;
    assert!(public.as_array().unwrap().is_empty());

    let response = app.send(delete(&format!("{}?permanent=true", uri), &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.send(get(&uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_publish_flow_and_view_counting() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let post = json!({
        "titulo": "Hello World",
        "contenido": "A short post about nothing in particular.",
        "tags": "rust, web",
        "publicado": true
    });
    let response = app
        .send(json_request(Method::POST, "/api/admin/blog", post.clone(), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], "hello-world");
    assert_eq!(body["data"]["tags"], json!(["rust", "web"]));
    assert!(body["data"]["fecha_publicacion"].is_string());

    let response = app
        .send(json_request(Method::POST, "/api/admin/blog", post, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let first = body_json(app.send(get("/api/blog/hello-world", None)).await).await;
    let second = body_json(app.send(get("/api/blog/hello-world", None)).await).await;
    assert_eq!(first["vistas"], 1);
    assert_eq!(second["vistas"], 2);
    assert!(second["contenido"].is_string());

    let list = body_json(app.send(get("/api/blog", None)).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert!(list[0].get("contenido").is_none());

    let response = app.send(get("/api/blog/missing-post", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unpublished_post_is_hidden_from_public() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/admin/blog",
            json!({ "titulo": "Draft", "contenido": "Not yet." }),
            Some(&token),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["publicado"], false);

    let response = app.send(get("/api/blog/draft", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analytics_reports_counts() {
    let app = TestApp::new().await;
    messages::insert(&app.state.db, &contact_form("POS").validate(None).unwrap())
        .await
        .unwrap();
    let token = app.login().await;

    let body = body_json(app.send(get("/api/admin/analytics", Some(&token))).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["total_messages"], 1);
    assert_eq!(body["stats"]["unread_messages"], 1);
    assert_eq!(body["period_stats"]["today"]["messages"], 1);
    assert_eq!(body["services"][0]["service"], "POS");

    let body = body_json(app.send(get("/api/admin/stats", Some(&token))).await).await;
    assert_eq!(body["weekly_stats"]["messages_this_week"], 1);

    let body = body_json(app.send(get("/api/admin/recent-activity", Some(&token))).await).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_form_login_ignores_backslash_redirect_targets() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/login?next=/%5Cevil.example")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=admin123"))
        .unwrap();
    let response = app.send(request).await;
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/dashboard"
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/login?next=/api/admin/messages")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=admin123"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/admin/messages"
    );
}

#[tokio::test]
async fn test_non_numeric_ids_get_a_json_error() {
    let app = TestApp::new().await;
    let token = app.login().await;

    for uri in ["/api/admin/messages/abc", "/api/admin/projects/1x", "/api/admin/blog/-"] {
        let response = app.send(get(uri, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"), "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], "id");
    }

    let response = app.send(delete("/api/admin/testimonials/abc", &token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "id");
}
