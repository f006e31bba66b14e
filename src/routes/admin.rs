use crate::{AppState, content::ContentType, handlers, inbox};
use axum::{
    Router,
    routing::{get, post},
};

fn register<T: ContentType>(router: Router<AppState>) -> Router<AppState> {
    router
        // GET/POST/PUT/DELETE /api/admin/<type>
        // The admin list includes inactive documents.
        .route(
            &format!("/api/admin/{}", T::PATH),
            get(handlers::list_admin::<T>)
                .post(handlers::create::<T>)
                .put(handlers::update_by_body::<T>)
                .delete(handlers::delete_by_body::<T>),
        )
        // GET/PUT/PATCH/DELETE /api/admin/<type>/{id}
        // Soft-deleted documents stay retrievable here.
        .route(
            &format!("/api/admin/{}/{{id}}", T::PATH),
            get(handlers::get_admin::<T>)
                .put(handlers::update_by_path::<T>)
                .patch(handlers::update_by_path::<T>)
                .delete(handlers::delete_by_path::<T>),
        )
}

/// Admin Router Module
///
/// Everything under `/api/admin`. Access control is the global `admin_gate`
/// middleware, which lets only `/login` and `/logout` through without a
/// session and attaches the `AdminSession` for the rest.
pub fn admin_routes() -> Router<AppState> {
    let router = Router::new()
        // POST /api/admin/login, /api/admin/logout
        // Issue and clear the session cookie.
        .route("/api/admin/login", post(handlers::login))
        .route("/api/admin/logout", post(handlers::logout))
        // GET /api/admin/me
        .route("/api/admin/me", get(handlers::me))
        // GET /api/admin/dashboard
        // Counts per section for the landing page.
        .route("/api/admin/dashboard", get(handlers::get_dashboard))
        // GET/POST /api/admin/common-tasks
        .route(
            "/api/admin/common-tasks",
            get(handlers::list_common_tasks).post(handlers::create_common_task),
        )
        // GET/POST /api/admin/personal/tasks
        // Scoped to the session subject.
        .route(
            "/api/admin/personal/tasks",
            get(handlers::list_personal_tasks).post(handlers::create_personal_task),
        )
        // --- Submission inbox ---
        .route("/api/admin/submissions", get(inbox::list_submissions))
        .route(
            "/api/admin/submissions/{id}",
            get(inbox::get_submission)
                .patch(inbox::mark_read)
                .put(inbox::update_submission)
                .delete(inbox::delete_submission),
        );

    for_each_content_type!(router, register)
}
