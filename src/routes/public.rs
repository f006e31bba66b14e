use crate::{AppState, content::ContentType, handlers, inbox};
use axum::{
    Router,
    routing::{get, post},
};

fn register<T: ContentType>(router: Router<AppState>) -> Router<AppState> {
    router
        // GET /api/<type>
        // Active documents only; single-view sections answer with one document or null.
        .route(&format!("/api/{}", T::PATH), get(handlers::list_public::<T>))
        // GET /api/<type>/{id}
        // Inactive documents are reported as 404.
        .route(&format!("/api/{}/{{id}}", T::PATH), get(handlers::get_public::<T>))
}

/// Public Router Module
///
/// Unauthenticated endpoints. Content reads go through the same generic
/// handlers for every section and never expose inactive documents.
pub fn public_routes() -> Router<AppState> {
    let router = Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(handlers::health))
        // POST /api/submit
        // Contact, inquiry, community and RSVP forms all land in the inbox.
        .route("/api/submit", post(inbox::submit));

    for_each_content_type!(router, register)
}
