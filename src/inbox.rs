//! The submission inbox: public form intake and its admin review routes.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    forms::{ContentPayload, JsonBody, QueryParams},
    handlers::parse_id,
    models::{
        Message, ReadStateRequest, StatusMessage, SubmitRequest, Submission, SubmissionFilter,
        SubmissionStatus, SubmissionUpdateRequest,
    },
    repository::{Collection, ListQuery, Record, SortOrder},
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// Substrings of throwaway-mail domains refused by the public forms.
const BLOCKED_DOMAINS: [&str; 6] = [
    "tempmail",
    "mailinator",
    "10minutemail",
    "guerrillamail",
    "yopmail",
    "fakeinbox",
];

/// is_valid_email
///
/// Syntactic check plus the disposable-domain blocklist (case-insensitive
/// substring match on the domain part).
pub fn is_valid_email(email: &str) -> bool {
    if !EMAIL_RE.is_match(email) {
        return false;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let domain = domain.to_ascii_lowercase();
    !BLOCKED_DOMAINS.iter().any(|blocked| domain.contains(blocked))
}

/// First hop of `x-forwarded-for`, the client address behind the proxy.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub data: Record<Submission>,
}

/// submit
///
/// [Public Route] Stores a form submission as unread with status `new`.
#[utoipa::path(
    post,
    path = "/api/submit",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submission stored"),
        (status = 400, description = "Missing fields or rejected email", body = Message)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let (Some(kind), Some(name), Some(email)) = (
        non_blank(request.kind),
        non_blank(request.name),
        non_blank(request.email),
    ) else {
        return Err(ApiError::validation("Type, name and email are required"));
    };

    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid or disposable email not allowed"));
    }

    let submission = Submission {
        kind,
        origin_title: request.origin_title.unwrap_or_default(),
        name,
        email,
        phone: request.phone.unwrap_or_default(),
        message: request.message.unwrap_or_default(),
        is_read: false,
        status: SubmissionStatus::New,
        admin_note: String::new(),
        ip_address: client_ip(&headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let record = Collection::new(state.store.clone()).insert(submission, true).await?;
    tracing::info!(id = %record.id, kind = %record.data.kind, "form submission received");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "Form submitted successfully".to_string(),
            data: record,
        }),
    ))
}

/// Parses a filter bound given as RFC 3339 or a bare `YYYY-MM-DD` date. A bare
/// date resolves to the start of the day, or its last instant when `end_of_day`.
pub fn parse_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}

fn bound(raw: Option<&str>, end_of_day: bool, name: &str) -> ApiResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => parse_bound(value, end_of_day)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("Invalid '{name}' date"))),
    }
}

/// list_submissions
///
/// [Admin Route] Newest first, optionally filtered by form type and creation window.
#[utoipa::path(
    get,
    path = "/api/admin/submissions",
    params(SubmissionFilter),
    responses(
        (status = 200, description = "Submissions, newest first", body = [Submission]),
        (status = 400, description = "Malformed date", body = Message)
    )
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<SubmissionFilter>,
) -> ApiResult<Json<Vec<Record<Submission>>>> {
    let mut query = ListQuery::all(SortOrder::NewestFirst);
    if let Some(kind) = non_blank(filter.kind) {
        query = query.with_field("type", kind);
    }
    query.created_from = bound(filter.from.as_deref(), false, "from")?;
    query.created_to = bound(filter.to.as_deref(), true, "to")?;

    let submissions = Collection::<Submission>::new(state.store.clone())
        .list(&query)
        .await?;
    Ok(Json(submissions))
}

#[utoipa::path(
    get,
    path = "/api/admin/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Found", body = Submission),
        (status = 404, description = "Not found", body = Message)
    )
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<Submission>>> {
    Collection::<Submission>::new(state.store.clone())
        .get(parse_id(&id)?)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Submission"))
}

/// mark_read
///
/// [Admin Route] Sets the read flag; an empty body marks the submission read.
#[utoipa::path(
    patch,
    path = "/api/admin/submissions/{id}",
    request_body = ReadStateRequest,
    responses((status = 200, description = "Updated", body = Submission))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: ContentPayload,
) -> ApiResult<Json<Record<Submission>>> {
    let id = parse_id(&id)?;
    let request: ReadStateRequest = serde_json::from_value(Value::Object(payload.fields))
        .map_err(|e| ApiError::validation(format!("Invalid read state: {e}")))?;

    let submissions = Collection::<Submission>::new(state.store.clone());
    let mut record = submissions
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("Submission"))?;
    record.data.is_read = request.is_read.unwrap_or(true);

    submissions
        .save(&record)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Submission"))
}

/// update_submission
///
/// [Admin Route] Review workflow: sets `status` and/or `adminNote`.
#[utoipa::path(
    put,
    path = "/api/admin/submissions/{id}",
    request_body = SubmissionUpdateRequest,
    responses((status = 200, description = "Updated", body = Submission))
)]
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<SubmissionUpdateRequest>,
) -> ApiResult<Json<Record<Submission>>> {
    let id = parse_id(&id)?;
    let submissions = Collection::<Submission>::new(state.store.clone());
    let mut record = submissions
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("Submission"))?;

    if let Some(status) = request.status {
        record.data.status = status;
    }
    if let Some(note) = request.admin_note {
        record.data.admin_note = note;
    }

    submissions
        .save(&record)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Submission"))
}

#[utoipa::path(
    delete,
    path = "/api/admin/submissions/{id}",
    responses(
        (status = 200, description = "Deleted", body = StatusMessage),
        (status = 404, description = "Not found", body = Message)
    )
)]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    let removed = Collection::<Submission>::new(state.store.clone())
        .remove(parse_id(&id)?)
        .await?;
    if !removed {
        return Err(ApiError::NotFound("Submission"));
    }
    Ok(Json(StatusMessage::ok("Submission deleted")))
}
