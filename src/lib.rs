pub mod auth;
pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod tenant;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::store::{collections, DocumentStore, Query, CENTRAL_NAMESPACE};

/// Builds the full router. Generic over the store so the same surface runs
/// against Postgres in production and the in-memory store in tests.
pub fn app<S: DocumentStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::<S>))
        .merge(school_routes::<S>())
        .merge(student_routes::<S>())
        .merge(admin_routes::<S>())
        .merge(tenant_routes::<S>())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn school_routes<S: DocumentStore>() -> Router<AppState<S>> {
    use crate::handlers::schools;

    Router::new()
        .route("/schools/register", post(schools::register::<S>))
        .route("/schools/login", post(schools::login::<S>))
        .route("/schools", get(schools::list::<S>))
        .route(
            "/schools/:id",
            get(schools::get::<S>).patch(schools::update::<S>),
        )
        .route(
            "/schools/by-subdomain/:sub_domain",
            get(schools::get_by_subdomain::<S>),
        )
}

fn student_routes<S: DocumentStore>() -> Router<AppState<S>> {
    use crate::handlers::{payments, students};

    Router::new()
        .route("/students/register", post(students::register::<S>))
        .route("/students/login", post(students::login::<S>))
        .route(
            "/students/forgot-password",
            post(students::forgot_password::<S>),
        )
        .route(
            "/students/reset-password",
            post(students::reset_password::<S>),
        )
        .route("/students/:id/courses", get(students::courses::<S>))
        .route("/students/:id/payments", get(payments::for_student::<S>))
        .route("/payments", post(payments::record::<S>))
}

fn admin_routes<S: DocumentStore>() -> Router<AppState<S>> {
    use crate::handlers::admins;

    Router::new()
        .route("/admins/register", post(admins::register::<S>))
        .route("/admins/login", post(admins::login::<S>))
}

/// Routes scoped to one school's namespace; `:tenant` accepts a slug, a
/// subdomain, or a full subdomain URL.
fn tenant_routes<S: DocumentStore>() -> Router<AppState<S>> {
    use crate::handlers::{comments, courses, payments, schools};

    Router::new()
        .route("/api/:tenant/init-db", post(schools::init_db::<S>))
        .route(
            "/api/:tenant/courses",
            get(courses::list_courses::<S>).post(courses::create_course::<S>),
        )
        .route(
            "/api/:tenant/courses/:id",
            get(courses::get_course::<S>).delete(courses::delete_course::<S>),
        )
        .route(
            "/api/:tenant/courses/:id/exams/:kind",
            put(courses::set_course_exam::<S>),
        )
        .route(
            "/api/:tenant/courses/:id/questions/:kind",
            get(courses::get_course_questions::<S>),
        )
        .route(
            "/api/:tenant/sections/:id/videos",
            post(courses::add_videos::<S>),
        )
        .route(
            "/api/:tenant/sections/:id",
            axum::routing::delete(courses::delete_section::<S>),
        )
        .route(
            "/api/:tenant/exams/:id/questions",
            post(courses::add_exam_question::<S>),
        )
        .route(
            "/api/:tenant/courses/:id/comments",
            get(comments::for_course::<S>),
        )
        .route("/api/:tenant/comments", post(comments::add::<S>))
        .route(
            "/api/:tenant/comments/:id",
            axum::routing::delete(comments::delete::<S>),
        )
        .route("/api/:tenant/comments/:id/like", post(comments::like::<S>))
        .route(
            "/api/:tenant/comments/:id/unlike",
            post(comments::unlike::<S>),
        )
        .route(
            "/api/:tenant/payments/checkout",
            post(payments::create_checkout::<S>),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Eduvia API",
            "version": version,
            "description": "Multi-tenant course platform backend",
            "endpoints": {
                "home": "/ (public)",
                "schools": "/schools/* (registration, login, directory)",
                "students": "/students/* (registration, login, password reset, entitlements)",
                "admins": "/admins/* (platform operator accounts)",
                "tenant": "/api/:tenant/* (courses, sections, exams, comments, checkout)",
                "payments": "/payments (central ledger)",
            }
        }
    }))
}

async fn health<S: DocumentStore>(
    State(state): State<AppState<S>>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state
        .store
        .count(CENTRAL_NAMESPACE, collections::SCHOOLS, Query::new())
        .await
    {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
