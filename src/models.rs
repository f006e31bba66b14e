use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::forms::lenient;

// --- Shared Building Blocks ---

/// MediaRef
///
/// A reference to an asset stored at the media host. `public_id` is the host's
/// handle, needed to delete the asset later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MediaRef {
    pub url: String,
    // The upload endpoint answers with snake_case, so accept both spellings.
    #[serde(alias = "public_id")]
    pub public_id: String,
}

/// A call-to-action button on the hero section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LinkButton {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub href: String,
}

/// A titled card with an icon name (about cards, upcoming project features).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct InfoCard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Icon key understood by the frontend (lightbulb, graduation, users, rocket...).
    #[serde(default)]
    pub icon: String,
}

// --- Content Types ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Hero {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    /// Rotating words shown after the title.
    #[serde(default, deserialize_with = "lenient::strings")]
    pub words: Vec<String>,
    #[serde(default)]
    pub primary_btn: Option<LinkButton>,
    #[serde(default)]
    pub secondary_btn: Option<LinkButton>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct About {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cards: Vec<InfoCard>,
}

fn default_community_cta() -> String {
    "Join Community \u{2014} Free".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Community {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub points: Vec<String>,
    #[serde(default = "default_community_cta")]
    pub cta_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum CourseBadge {
    #[default]
    Free,
    Paid,
    Popular,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub level: CourseLevel,
    #[serde(default)]
    pub badge: CourseBadge,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default, deserialize_with = "lenient::int")]
    #[ts(type = "number")]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Service {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default, deserialize_with = "lenient::int")]
    #[ts(type = "number")]
    pub order: i64,
}

fn default_software_status() -> String {
    "upcoming".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Software {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_software_status")]
    pub status: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub image: Option<MediaRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum ProjectStatus {
    #[default]
    Live,
    #[serde(rename = "Coming Soon")]
    ComingSoon,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default, deserialize_with = "lenient::int")]
    #[ts(type = "number")]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMember {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default, deserialize_with = "lenient::int")]
    #[ts(type = "number")]
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum MeetupKind {
    #[default]
    Meetup,
    Masterclass,
    Podcast,
}

fn default_meetup_cta() -> String {
    "Register".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Meetup {
    #[serde(default)]
    pub title: String,
    /// Free-form display date ("12 March, 6 PM").
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: MeetupKind,
    #[serde(default = "default_meetup_cta")]
    pub cta: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpcomingProject {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<InfoCard>,
    #[serde(default)]
    pub live_url: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub image: Option<MediaRef>,
}

// --- Inbox ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SubmissionStatus {
    #[default]
    New,
    Reviewed,
    Resolved,
}

/// Submission
///
/// One public form payload (contact, service/course inquiry, community join,
/// meetup RSVP). `kind` says which form, `origin_title` which card triggered it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Submission {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub origin_title: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub admin_note: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

// --- Admin Area ---

/// Admin
///
/// Stored login identity. Only ever read by the credential verifier; never
/// serialized into a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommonTask {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PersonalTask {
    /// Session subject of the admin owning the task.
    pub owner: String,
    pub title: String,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// SubmitRequest
///
/// Public form body. Every field is optional at the wire level so that missing
/// fields produce the inbox's own 400 message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(alias = "originTitle", default)]
    pub origin_title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadStateRequest {
    #[serde(default)]
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdateRequest {
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct SubmissionFilter {
    /// Form kind, e.g. `contact` or `course`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Lower bound on `createdAt` (RFC 3339 or `YYYY-MM-DD`).
    pub from: Option<String>,
    /// Upper bound on `createdAt` (RFC 3339 or `YYYY-MM-DD`, whole day included).
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskRequest {
    #[serde(default)]
    pub title: Option<String>,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
}

/// Plain `{message}` body (login success, every error).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Success {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatusMessage {
    pub success: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// DashboardStats
///
/// Document counts shown on the admin landing page (both active and inactive).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardStats {
    pub services: i64,
    pub courses: i64,
    pub projects: i64,
    pub softwares: i64,
    pub team: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionInfo {
    pub admin_id: Option<Uuid>,
    pub email: String,
    pub role: String,
}
