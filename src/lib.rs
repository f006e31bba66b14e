use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod inbox;
pub mod models;
pub mod repository;
pub mod storage;

// Routing split by access level (public, session route layer, admin gate).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenKeys;
pub use config::AppConfig;
pub use credentials::CredentialsState;
pub use repository::{InMemoryStore, PostgresStore, StoreState};
pub use storage::{CloudinaryClient, MediaState, MockMediaHost};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`. The generic content
/// routes are not listed individually; their schemas are.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::login, handlers::logout, handlers::me,
        handlers::upload, handlers::get_dashboard,
        handlers::list_common_tasks, handlers::create_common_task,
        handlers::list_personal_tasks, handlers::create_personal_task,
        inbox::submit, inbox::list_submissions, inbox::get_submission,
        inbox::mark_read, inbox::update_submission, inbox::delete_submission,
    ),
    components(
        schemas(
            models::MediaRef, models::LinkButton, models::InfoCard,
            models::Hero, models::About, models::Community,
            models::Course, models::CourseLevel, models::CourseBadge,
            models::Service, models::Software, models::Project, models::ProjectStatus,
            models::TeamMember, models::Meetup, models::MeetupKind, models::UpcomingProject,
            models::Submission, models::SubmissionStatus, models::SubmitRequest,
            models::ReadStateRequest, models::SubmissionUpdateRequest,
            models::LoginRequest, models::TaskRequest, models::CommonTask, models::PersonalTask,
            models::UploadResponse, models::StatusMessage, models::Message, models::Success,
            models::DashboardStats, models::SessionInfo,
        )
    ),
    tags(
        (name = "raynk-site", description = "RaYnk Labs site content and admin API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration. Built once in
/// `main` (or by the test harness) and cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Document store behind every collection.
    pub store: StoreState,
    /// External image host.
    pub media: MediaState,
    /// Login credential check selected by `ADMIN_AUTH`.
    pub credentials: CredentialsState,
    /// Session token signing and verification.
    pub tokens: TokenKeys,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for MediaState {
    fn from_ref(app_state: &AppState) -> MediaState {
        app_state.media.clone()
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(app_state: &AppState) -> TokenKeys {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing table, the auth layers and the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Route Assembly
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Mutations of the public content paths and the upload passthrough
        // need a session; GET on the same paths stays open.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.tokens.clone(),
                auth::require_admin,
            )),
        )
        .merge(admin::admin_routes());

    // Optional built frontend for every path the API does not claim.
    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    // 3. Admin gate: covers /api/admin and the /admin/dashboard pages,
    // including pages served by the static fallback.
    let router = router
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth::admin_gate,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state);

    // 4. Observability and Correlation Layers
    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the `http_request` span for each request, tagged with the request id
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
