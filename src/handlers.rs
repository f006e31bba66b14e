use crate::{
    AppState,
    auth::{AdminSession, clear_session_cookie, session_cookie},
    content::{ContentType, DeletePolicy, PublicView},
    error::{ApiError, ApiResult},
    forms::{ContentPayload, JsonBody, UploadedFile},
    models::{
        CommonTask, Course, DashboardStats, LoginRequest, MediaRef, Message, PersonalTask, Project,
        Service, SessionInfo, Software, StatusMessage, Success, TaskRequest, TeamMember,
        UploadResponse,
    },
    repository::{Collection, ListQuery, Record, SortOrder, StoreError},
    storage::stage_upload,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use uuid::Uuid;

/// Parses a path or body identifier, answering 400 instead of axum's plain-text rejection.
pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation("Invalid id"))
}

fn collection<T: ContentType>(state: &AppState) -> Collection<T> {
    Collection::new(state.store.clone())
}

// --- Media helpers ---

/// Stages `file` and uploads it into the content type's folder.
async fn upload_image<T: ContentType>(state: &AppState, file: UploadedFile) -> ApiResult<MediaRef> {
    let staged = stage_upload(file).await?;
    let folder = format!("{}/{}", state.config.cloudinary.folder, T::PATH);
    Ok(state.media.upload(&staged, &folder).await?)
}

/// Deletes an asset that is no longer referenced. Failures leave an orphan on
/// the media host and are only logged.
async fn release_image(state: &AppState, public_id: &str) {
    if let Err(e) = state.media.delete(public_id).await {
        tracing::warn!(error = %e, public_id, "failed to delete media asset, leaving orphan");
    }
}

async fn release_new_upload(state: &AppState, uploaded: Option<MediaRef>) {
    if let Some(media) = uploaded {
        release_image(state, &media.public_id).await;
    }
}

/// Rejects a file for types without an image slot, and a missing image for
/// types that require one. Runs before anything is uploaded.
fn check_image<T: ContentType>(data: &mut T, file: Option<&UploadedFile>) -> ApiResult<()> {
    if file.is_some() && data.image_slot().is_none() {
        return Err(ApiError::validation(format!("{} does not accept an image", T::LABEL)));
    }
    if T::IMAGE_REQUIRED && file.is_none() && data.image().is_none() {
        return Err(ApiError::validation(format!("{} image is required", T::LABEL)));
    }
    Ok(())
}

fn parse_data<T: ContentType>(fields: Value) -> ApiResult<T> {
    serde_json::from_value(fields)
        .map_err(|e| ApiError::validation(format!("Invalid {} data: {e}", T::LABEL.to_lowercase())))
}

// --- Generic content handlers ---

/// list_public
///
/// [Public Route] Active documents of one content type, in the type's order.
/// Single-view sections answer with the first active document or `null`.
pub async fn list_public<T: ContentType>(State(state): State<AppState>) -> ApiResult<Response> {
    let records = collection::<T>(&state)
        .list(&ListQuery::active(T::SORT))
        .await?;

    Ok(match T::PUBLIC_VIEW {
        PublicView::List => Json(records).into_response(),
        PublicView::Single => Json(records.into_iter().next()).into_response(),
    })
}

/// get_public
///
/// [Public Route] One active document; inactive ones are reported as missing.
pub async fn get_public<T: ContentType>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<T>>> {
    collection::<T>(&state)
        .get(parse_id(&id)?)
        .await?
        .filter(|record| record.is_active)
        .map(Json)
        .ok_or(ApiError::NotFound(T::LABEL))
}

/// list_admin
///
/// [Admin Route] Every document of the type, active or not.
pub async fn list_admin<T: ContentType>(State(state): State<AppState>) -> ApiResult<Json<Vec<Record<T>>>> {
    let records = collection::<T>(&state).list(&ListQuery::all(T::SORT)).await?;
    Ok(Json(records))
}

pub async fn get_admin<T: ContentType>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<T>>> {
    collection::<T>(&state)
        .get(parse_id(&id)?)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(T::LABEL))
}

/// create
///
/// [Admin Route] Validates the payload, uploads the optional `image` file, then
/// stores the document. Nothing is persisted or uploaded when validation fails.
pub async fn create<T: ContentType>(
    State(state): State<AppState>,
    mut payload: ContentPayload,
) -> ApiResult<(StatusCode, Json<Record<T>>)> {
    let is_active = payload.take_active()?.unwrap_or(true);
    payload.strip_envelope();
    let file = payload.take_file("image");

    let mut data: T = parse_data(Value::Object(payload.fields))?;
    data.validate()?;
    check_image(&mut data, file.as_ref())?;

    let uploaded = match file {
        Some(file) => Some(upload_image::<T>(&state, file).await?),
        None => None,
    };
    if let (Some(media), Some(slot)) = (&uploaded, data.image_slot()) {
        *slot = Some(media.clone());
    }

    match collection::<T>(&state).insert(data, is_active).await {
        Ok(record) => {
            tracing::info!(id = %record.id, kind = T::PATH, "content created");
            Ok((StatusCode::CREATED, Json(record)))
        }
        Err(e) => {
            release_new_upload(&state, uploaded).await;
            Err(e.into())
        }
    }
}

/// Shared body of the update routes: partial merge, optional image swap.
///
/// Image replacement uploads the new asset first, saves the document, and only
/// then deletes the previous asset. A failed save discards the new upload.
async fn apply_update<T: ContentType>(
    state: &AppState,
    path_id: Option<Uuid>,
    mut payload: ContentPayload,
) -> ApiResult<Json<Record<T>>> {
    let body_id = payload.take_id()?;
    let id = path_id
        .or(body_id)
        .ok_or_else(|| ApiError::validation(format!("{} ID required", T::LABEL)))?;
    let is_active = payload.take_active()?;
    payload.strip_envelope();
    let file = payload.take_file("image");

    let documents = collection::<T>(state);
    let mut record = documents.get(id).await?.ok_or(ApiError::NotFound(T::LABEL))?;
    let previous_image = record.data.image().cloned();

    // Provided fields overwrite, absent ones are kept.
    let mut merged = serde_json::to_value(&record.data).map_err(StoreError::from)?;
    if let Value::Object(target) = &mut merged {
        target.extend(payload.fields);
    }
    let mut data: T = parse_data(merged)?;
    data.validate()?;
    check_image(&mut data, file.as_ref())?;

    let uploaded = match file {
        Some(file) => Some(upload_image::<T>(state, file).await?),
        None => None,
    };
    if let (Some(media), Some(slot)) = (&uploaded, data.image_slot()) {
        *slot = Some(media.clone());
    }

    record.data = data;
    if let Some(active) = is_active {
        record.is_active = active;
    }

    let saved = match documents.save(&record).await {
        Ok(Some(saved)) => saved,
        Ok(None) => {
            release_new_upload(state, uploaded).await;
            return Err(ApiError::NotFound(T::LABEL));
        }
        Err(e) => {
            release_new_upload(state, uploaded).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous_image {
        let still_referenced = saved
            .data
            .image()
            .is_some_and(|current| current.public_id == previous.public_id);
        if !still_referenced {
            release_image(state, &previous.public_id).await;
        }
    }

    tracing::info!(id = %saved.id, kind = T::PATH, "content updated");
    Ok(Json(saved))
}

/// update_by_path
///
/// [Admin Route] `PUT`/`PATCH /<type>/{id}`.
pub async fn update_by_path<T: ContentType>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: ContentPayload,
) -> ApiResult<Json<Record<T>>> {
    apply_update(&state, Some(parse_id(&id)?), payload).await
}

/// update_by_body
///
/// [Admin Route] `PUT /<type>` with the id carried in the body (`id` or `_id`),
/// as the admin forms send it.
pub async fn update_by_body<T: ContentType>(
    State(state): State<AppState>,
    payload: ContentPayload,
) -> ApiResult<Json<Record<T>>> {
    apply_update(&state, None, payload).await
}

async fn apply_delete<T: ContentType>(state: &AppState, id: Uuid) -> ApiResult<Json<StatusMessage>> {
    let documents = collection::<T>(state);

    match state.config.delete_policy(T::PATH, T::DELETE_POLICY) {
        DeletePolicy::Soft => {
            documents
                .set_active(id, false)
                .await?
                .ok_or(ApiError::NotFound(T::LABEL))?;
        }
        DeletePolicy::Hard => {
            let record = documents.get(id).await?.ok_or(ApiError::NotFound(T::LABEL))?;
            if !documents.remove(id).await? {
                return Err(ApiError::NotFound(T::LABEL));
            }
            if let Some(image) = record.data.image() {
                release_image(state, &image.public_id).await;
            }
        }
    }

    tracing::info!(%id, kind = T::PATH, "content deleted");
    Ok(Json(StatusMessage::ok(format!("{} deleted successfully", T::LABEL))))
}

/// delete_by_path
///
/// [Admin Route] Applies the type's delete policy (soft: deactivate, hard:
/// remove the document and its image).
pub async fn delete_by_path<T: ContentType>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    apply_delete::<T>(&state, parse_id(&id)?).await
}

pub async fn delete_by_body<T: ContentType>(
    State(state): State<AppState>,
    mut payload: ContentPayload,
) -> ApiResult<Json<StatusMessage>> {
    let id = payload
        .take_id()?
        .ok_or_else(|| ApiError::validation(format!("{} ID required", T::LABEL)))?;
    apply_delete::<T>(&state, id).await
}

// --- Auth ---

/// login
///
/// [Public Route] Verifies the credentials and sets the session cookie.
/// Unknown email and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = Message),
        (status = 400, description = "Missing email or password", body = Message),
        (status = 401, description = "Invalid credentials", body = Message)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Response> {
    let email = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let password = request.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::validation("Email and password are required"));
    };

    let Some(identity) = state.credentials.verify(email, password).await? else {
        tracing::warn!(email, "rejected admin login");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    };

    let token = state.tokens.sign(&identity)?;
    let cookie = session_cookie(&token, state.config.is_production());
    tracing::info!(email = %identity.email, "admin logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(Message {
            message: "Login successful".to_string(),
        }),
    )
        .into_response())
}

/// logout
///
/// [Public Route] Clears the session cookie. Tokens are stateless, so nothing
/// is revoked server-side.
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses((status = 200, description = "Cookie cleared", body = Success))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(state.config.is_production());
    ([(header::SET_COOKIE, cookie)], Json(Success { success: true })).into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "No valid session", body = Message)
    )
)]
pub async fn me(session: AdminSession) -> Json<SessionInfo> {
    Json(session.into())
}

// --- Upload passthrough ---

/// upload
///
/// [Admin Route] Forwards a single multipart `file` field to the media host's
/// root folder and returns its reference.
#[utoipa::path(
    post,
    path = "/api/upload",
    responses(
        (status = 200, description = "Uploaded", body = UploadResponse),
        (status = 400, description = "File not found", body = Message),
        (status = 413, description = "File over the upload limit", body = Message)
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    mut payload: ContentPayload,
) -> ApiResult<Json<UploadResponse>> {
    let file = payload
        .take_file("file")
        .ok_or_else(|| ApiError::validation("File not found"))?;

    let staged = stage_upload(file).await?;
    let media = state
        .media
        .upload(&staged, &state.config.cloudinary.folder)
        .await?;

    Ok(Json(UploadResponse {
        url: media.url,
        public_id: media.public_id,
    }))
}

// --- Dashboard & tasks ---

/// get_dashboard
///
/// [Admin Route] Document counts per section, active and inactive alike.
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses((status = 200, description = "Counts", body = DashboardStats))
)]
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let services = collection::<Service>(&state).count().await?;
    let courses = collection::<Course>(&state).count().await?;
    let projects = collection::<Project>(&state).count().await?;
    let softwares = collection::<Software>(&state).count().await?;
    let team = collection::<TeamMember>(&state).count().await?;

    Ok(Json(DashboardStats {
        services,
        courses,
        projects,
        softwares,
        team,
    }))
}

fn task_title(request: TaskRequest) -> ApiResult<String> {
    request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Title is required"))
}

#[utoipa::path(
    get,
    path = "/api/admin/common-tasks",
    responses((status = 200, description = "Shared tasks, newest first", body = [CommonTask]))
)]
pub async fn list_common_tasks(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Record<CommonTask>>>> {
    let tasks = Collection::<CommonTask>::new(state.store.clone())
        .list(&ListQuery::all(SortOrder::NewestFirst))
        .await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/admin/common-tasks",
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = CommonTask),
        (status = 400, description = "Blank title", body = Message)
    )
)]
pub async fn create_common_task(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Record<CommonTask>>)> {
    let title = task_title(request)?;
    let task = Collection::new(state.store.clone())
        .insert(CommonTask { title }, true)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// list_personal_tasks
///
/// [Admin Route] Tasks owned by the session subject.
#[utoipa::path(
    get,
    path = "/api/admin/personal/tasks",
    responses((status = 200, description = "My tasks, newest first", body = [PersonalTask]))
)]
pub async fn list_personal_tasks(
    session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Record<PersonalTask>>>> {
    let query = ListQuery::all(SortOrder::NewestFirst).with_field("owner", session.subject);
    let tasks = Collection::<PersonalTask>::new(state.store.clone())
        .list(&query)
        .await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/admin/personal/tasks",
    request_body = TaskRequest,
    responses((status = 201, description = "Task created", body = PersonalTask))
)]
pub async fn create_personal_task(
    session: AdminSession,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TaskRequest>,
) -> ApiResult<(StatusCode, Json<Record<PersonalTask>>)> {
    let task = PersonalTask {
        owner: session.subject,
        title: task_title(request)?,
    };
    let task = Collection::new(state.store.clone()).insert(task, true).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
