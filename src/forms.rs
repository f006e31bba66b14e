use axum::{
    body::Bytes,
    extract::{
        FromRequest, Multipart, Request,
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::header,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// JsonBody
///
/// `axum::Json` with its rejection folded into `ApiError`, so malformed bodies
/// answer with the same `{message}` shape (and 400) as every other failure.
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

/// QueryParams
///
/// `axum::extract::Query` with the same treatment as `JsonBody`.
#[derive(axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    ApiError::rejected(e.status(), format!("{context}: {}", e.body_text()))
}

/// An uploaded file held in memory until it is staged for the media host.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// ContentPayload
///
/// The body of a content create/update request. Admin forms post either JSON
/// or `multipart/form-data` (when an image is attached); both are normalized
/// into a JSON object of fields plus at most one file per field name.
///
/// In multipart mode every text value arrives as a string, repeated keys
/// become arrays, and empty values are dropped so that a blank form input
/// leaves the stored value untouched on update.
#[derive(Debug, Default)]
pub struct ContentPayload {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl ContentPayload {
    /// Removes and parses the identifier carried in the body (`id` or `_id`).
    pub fn take_id(&mut self) -> Result<Option<Uuid>, ApiError> {
        let raw = self.fields.remove("id").or_else(|| self.fields.remove("_id"));
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Uuid::parse_str(s.trim())
                .map(Some)
                .map_err(|_| ApiError::validation("Invalid id")),
            Some(_) => Err(ApiError::validation("Invalid id")),
        }
    }

    /// Removes the `isActive` flag, accepting booleans or their string forms.
    pub fn take_active(&mut self) -> Result<Option<bool>, ApiError> {
        match self.fields.remove("isActive") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::String(s)) => match s.trim() {
                "true" | "1" | "on" => Ok(Some(true)),
                "false" | "0" | "off" => Ok(Some(false)),
                _ => Err(ApiError::validation("isActive must be a boolean")),
            },
            Some(_) => Err(ApiError::validation("isActive must be a boolean")),
        }
    }

    /// Drops envelope keys that clients echo back but may not write.
    pub fn strip_envelope(&mut self) {
        for key in ["id", "_id", "createdAt", "updatedAt", "__v"] {
            self.fields.remove(key);
        }
    }

    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut payload = ContentPayload::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Failed to read multipart", e))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file", e))?;
                // Browsers send an empty part for an untouched file input.
                if !bytes.is_empty() {
                    payload.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| multipart_error(&format!("Failed to read field {name}"), e))?;
            if text.is_empty() {
                continue;
            }

            match payload.fields.get_mut(&name) {
                Some(Value::Array(values)) => values.push(Value::String(text)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(text)]);
                }
                None => {
                    payload.fields.insert(name, Value::String(text));
                }
            }
        }

        Ok(payload)
    }

    fn from_json(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ContentPayload::default());
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => Ok(ContentPayload {
                fields,
                files: Vec::new(),
            }),
            Ok(_) => Err(ApiError::validation("Request body must be a JSON object")),
            Err(e) => Err(ApiError::validation(format!("Invalid JSON body: {e}"))),
        }
    }
}

impl<S> FromRequest<S> for ContentPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
        Self::from_json(&bytes)
    }
}

/// Deserializers that accept both JSON-typed values and the plain strings a
/// multipart form produces.
pub mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
        Text(String),
    }

    /// An integer, a numeric string, or null/empty (0).
    pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Number>::deserialize(deserializer)? {
            None => Ok(0),
            Some(Number::Int(n)) => Ok(n),
            Some(Number::Float(f)) => Ok(f as i64),
            Some(Number::Text(s)) if s.trim().is_empty() => Ok(0),
            Some(Number::Text(s)) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    /// A list of strings, a single string, or null (empty list).
    pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
            Some(OneOrMany::One(s)) => vec![s],
            Some(OneOrMany::Many(v)) => v,
        })
    }
}
