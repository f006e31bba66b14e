mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use common::{TestApp, id_of, message_of, read_json, spawn_app};
use raynk_site::{models::Submission, repository::Collection};
use serde_json::{Value, json};

fn contact_form() -> Value {
    json!({
        "type": "contact",
        "originTitle": "Footer",
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "phone": "+91 98765 43210",
        "message": "Can you build us a site?"
    })
}

async fn submit(app: &TestApp, body: Value) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.2")
        .header(header::USER_AGENT, "integration-test")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.send(request).await
}

async fn stored_count(app: &TestApp) -> i64 {
    Collection::<Submission>::new(app.store_state()).count().await.unwrap()
}

// --- Intake ---

#[tokio::test]
async fn test_submit_stores_unread_submission() {
    let app = spawn_app();

    let response = submit(&app, contact_form()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Form submitted successfully");

    let data = &body["data"];
    assert_eq!(data["type"], "contact");
    assert_eq!(data["originTitle"], "Footer");
    assert_eq!(data["isRead"], false);
    assert_eq!(data["status"], "new");
    assert_eq!(data["adminNote"], "");
    assert_eq!(data["ipAddress"], "203.0.113.9");
    assert_eq!(data["userAgent"], "integration-test");
    assert_eq!(stored_count(&app).await, 1);
}

#[tokio::test]
async fn test_submit_rejects_disposable_email() {
    let app = spawn_app();
    let mut form = contact_form();
    form["email"] = json!("someone@mailinator.com");

    let response = submit(&app, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(response).await, "Invalid or disposable email not allowed");
    assert_eq!(stored_count(&app).await, 0);
}

#[tokio::test]
async fn test_submit_rejects_malformed_email() {
    let app = spawn_app();
    let mut form = contact_form();
    form["email"] = json!("grace-at-example");

    let response = submit(&app, form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_count(&app).await, 0);
}

#[tokio::test]
async fn test_submit_requires_type_name_and_email() {
    let app = spawn_app();

    for missing in ["type", "name", "email"] {
        let mut form = contact_form();
        form.as_object_mut().unwrap().remove(missing);

        let response = submit(&app, form).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "missing {missing}");
        assert_eq!(message_of(response).await, "Type, name and email are required");
    }
    assert_eq!(stored_count(&app).await, 0);
}

// --- Admin review ---

#[tokio::test]
async fn test_inbox_requires_session() {
    let app = spawn_app();
    submit(&app, contact_form()).await;

    let response = app.get("/api/admin/submissions", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_filters_by_type() {
    let app = spawn_app();
    let cookie = app.admin_cookie();

    submit(&app, contact_form()).await;
    let mut course_inquiry = contact_form();
    course_inquiry["type"] = json!("course");
    course_inquiry["originTitle"] = json!("Rust Foundations");
    submit(&app, course_inquiry).await;

    let all = read_json(app.get("/api/admin/submissions", Some(&cookie)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let courses = read_json(app.get("/api/admin/submissions?type=course", Some(&cookie)).await).await;
    let courses = courses.as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["originTitle"], "Rust Foundations");
}

#[tokio::test]
async fn test_list_filters_by_date_window() {
    let app = spawn_app();
    let cookie = app.admin_cookie();
    submit(&app, contact_form()).await;

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let within = read_json(
        app.get(
            &format!("/api/admin/submissions?from={today}&to={today}"),
            Some(&cookie),
        )
        .await,
    )
    .await;
    assert_eq!(within.as_array().unwrap().len(), 1);

    let before = read_json(app.get("/api/admin/submissions?to=2000-01-01", Some(&cookie)).await).await;
    assert!(before.as_array().unwrap().is_empty());

    let malformed = app.get("/api/admin/submissions?from=yesterday", Some(&cookie)).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(malformed).await, "Invalid 'from' date");
}

#[tokio::test]
async fn test_malformed_query_answers_with_json_message() {
    let app = spawn_app();
    let cookie = app.admin_cookie();

    let response = app
        .get("/api/admin/submissions?type=contact&type=course", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!message_of(response).await.is_empty());
}

#[tokio::test]
async fn test_mark_read_defaults_to_true() {
    let app = spawn_app();
    let cookie = app.admin_cookie();
    let created = read_json(submit(&app, contact_form()).await).await;
    let uri = format!("/api/admin/submissions/{}", id_of(&created["data"]));

    let read = app
        .send(common::empty_request(Method::PATCH, &uri, Some(&cookie)))
        .await;
    assert_eq!(read.status(), StatusCode::OK);
    assert_eq!(read_json(read).await["isRead"], true);

    let unread = app
        .json(Method::PATCH, &uri, json!({ "isRead": false }), Some(&cookie))
        .await;
    assert_eq!(read_json(unread).await["isRead"], false);
}

#[tokio::test]
async fn test_update_status_and_note() {
    let app = spawn_app();
    let cookie = app.admin_cookie();
    let created = read_json(submit(&app, contact_form()).await).await;
    let uri = format!("/api/admin/submissions/{}", id_of(&created["data"]));

    let response = app
        .json(
            Method::PUT,
            &uri,
            json!({ "status": "reviewed", "adminNote": "Called back on Monday" }),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["status"], "reviewed");
    assert_eq!(updated["adminNote"], "Called back on Monday");
    assert_eq!(updated["name"], "Grace Hopper");

    let invalid = app
        .json(Method::PUT, &uri, json!({ "status": "archived" }), Some(&cookie))
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_submission() {
    let app = spawn_app();
    let cookie = app.admin_cookie();
    let created = read_json(submit(&app, contact_form()).await).await;
    let uri = format!("/api/admin/submissions/{}", id_of(&created["data"]));

    let response = app
        .send(common::empty_request(Method::DELETE, &uri, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(message_of(response).await, "Submission deleted");

    let gone = app.get(&uri, Some(&cookie)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(gone).await, "Submission not found");
    assert_eq!(stored_count(&app).await, 0);
}
