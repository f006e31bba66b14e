use crate::{AppState, content::ContentType, handlers};
use axum::{
    Router,
    routing::{post, put},
};

fn register<T: ContentType>(router: Router<AppState>) -> Router<AppState> {
    router
        // POST/PUT/DELETE /api/<type>
        // PUT and DELETE carry the id in the body, as the admin forms send it.
        .route(
            &format!("/api/{}", T::PATH),
            post(handlers::create::<T>)
                .put(handlers::update_by_body::<T>)
                .delete(handlers::delete_by_body::<T>),
        )
        // PUT/PATCH/DELETE /api/<type>/{id}
        .route(
            &format!("/api/{}/{{id}}", T::PATH),
            put(handlers::update_by_path::<T>)
                .patch(handlers::update_by_path::<T>)
                .delete(handlers::delete_by_path::<T>),
        )
}

/// Authenticated Router Module
///
/// The mutating methods of the public content paths plus the upload
/// passthrough. Every route here relies on the `require_admin` route layer
/// applied in `create_router`, which attaches the `AdminSession`.
pub fn authenticated_routes() -> Router<AppState> {
    let router = Router::new()
        // POST /api/upload
        // Multipart `file` field forwarded to the media host's root folder.
        .route("/api/upload", post(handlers::upload));

    for_each_content_type!(router, register)
}
