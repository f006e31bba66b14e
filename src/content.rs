//! The content-type registry.
//!
//! Every section of the public site is one `ContentType`: a typed schema plus
//! the handful of knobs (route path, ordering, public view, delete policy,
//! required fields) that the generic handlers need. Adding a section means
//! adding a struct in `models` and an impl here.

use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    models::{
        About, Admin, CommonTask, Community, Course, Hero, MediaRef, Meetup, PersonalTask, Project,
        Service, Software, Submission, TeamMember, UpcomingProject,
    },
    repository::{Entity, SortOrder},
};

/// How the public endpoint presents a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicView {
    /// All active documents.
    List,
    /// The first active document, or `null` (page sections edited as one block).
    Single,
}

/// What `DELETE` does to a document of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Flip `isActive` to false; the document stays retrievable by id.
    Soft,
    /// Remove the document and its media asset.
    Hard,
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(DeletePolicy::Soft),
            "hard" => Ok(DeletePolicy::Hard),
            other => Err(format!("unknown delete policy '{other}' (expected soft or hard)")),
        }
    }
}

/// ContentType
///
/// A site section managed through the generic CRUD handlers.
pub trait ContentType: Entity {
    /// Path segment under `/api` and `/api/admin`.
    const PATH: &'static str;
    /// Human name used in messages ("Course not found").
    const LABEL: &'static str;
    const SORT: SortOrder;
    const PUBLIC_VIEW: PublicView = PublicView::List;
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Soft;
    /// Whether a document must carry an image to be valid.
    const IMAGE_REQUIRED: bool = false;

    /// Checks the required display fields (trimmed, non-empty).
    fn validate(&self) -> Result<(), ApiError>;

    fn image(&self) -> Option<&MediaRef> {
        None
    }

    /// Mutable access to the image slot; `None` for types that carry no image.
    fn image_slot(&mut self) -> Option<&mut Option<MediaRef>> {
        None
    }
}

/// Fails with `message` unless every value is non-blank.
fn require(values: &[&str], message: &str) -> Result<(), ApiError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ApiError::validation(message));
    }
    Ok(())
}

// Generates the image accessors for types with an `image: Option<MediaRef>` field.
macro_rules! image_field {
    () => {
        fn image(&self) -> Option<&MediaRef> {
            self.image.as_ref()
        }

        fn image_slot(&mut self) -> Option<&mut Option<MediaRef>> {
            Some(&mut self.image)
        }
    };
}

impl Entity for Hero {
    const COLLECTION: &'static str = "hero";
}

impl ContentType for Hero {
    const PATH: &'static str = "hero";
    const LABEL: &'static str = "Hero";
    const SORT: SortOrder = SortOrder::NewestFirst;
    const PUBLIC_VIEW: PublicView = PublicView::Single;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.tagline], "Title and tagline are required")
    }
}

impl Entity for About {
    const COLLECTION: &'static str = "about";
}

impl ContentType for About {
    const PATH: &'static str = "about";
    const LABEL: &'static str = "About section";
    const SORT: SortOrder = SortOrder::NewestFirst;
    const PUBLIC_VIEW: PublicView = PublicView::Single;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.heading, &self.description], "Heading and description are required")
    }
}

impl Entity for Community {
    const COLLECTION: &'static str = "community";
}

impl ContentType for Community {
    const PATH: &'static str = "community";
    const LABEL: &'static str = "Community";
    const SORT: SortOrder = SortOrder::NewestFirst;
    const PUBLIC_VIEW: PublicView = PublicView::Single;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.description], "Title and description are required")
    }
}

impl Entity for Course {
    const COLLECTION: &'static str = "courses";

    fn sort_key(&self) -> i64 {
        self.order
    }
}

impl ContentType for Course {
    const PATH: &'static str = "courses";
    const LABEL: &'static str = "Course";
    const SORT: SortOrder = SortOrder::Manual;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.description], "Title and description are required")
    }

    image_field!();
}

impl Entity for Service {
    const COLLECTION: &'static str = "services";

    fn sort_key(&self) -> i64 {
        self.order
    }
}

impl ContentType for Service {
    const PATH: &'static str = "services";
    const LABEL: &'static str = "Service";
    const SORT: SortOrder = SortOrder::Manual;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.description], "Title and description are required")
    }

    image_field!();
}

impl Entity for Software {
    const COLLECTION: &'static str = "softwares";
}

impl ContentType for Software {
    const PATH: &'static str = "softwares";
    const LABEL: &'static str = "Software";
    const SORT: SortOrder = SortOrder::NewestFirst;
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Hard;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.name, &self.description], "Name and description are required")
    }

    image_field!();
}

impl Entity for Project {
    const COLLECTION: &'static str = "projects";

    fn sort_key(&self) -> i64 {
        self.order
    }
}

impl ContentType for Project {
    const PATH: &'static str = "projects";
    const LABEL: &'static str = "Project";
    const SORT: SortOrder = SortOrder::NewestFirst;
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Hard;
    const IMAGE_REQUIRED: bool = true;

    fn validate(&self) -> Result<(), ApiError> {
        require(
            &[&self.title, &self.description],
            "Title, description and image are required",
        )
    }

    image_field!();
}

impl Entity for TeamMember {
    const COLLECTION: &'static str = "team";

    fn sort_key(&self) -> i64 {
        self.order
    }
}

impl ContentType for TeamMember {
    const PATH: &'static str = "team";
    const LABEL: &'static str = "Team member";
    const SORT: SortOrder = SortOrder::Manual;
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Hard;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.name, &self.role], "Name and role are required")
    }

    image_field!();
}

impl Entity for Meetup {
    const COLLECTION: &'static str = "meetups";
}

impl ContentType for Meetup {
    const PATH: &'static str = "meetups";
    const LABEL: &'static str = "Meetup";
    const SORT: SortOrder = SortOrder::NewestFirst;

    fn validate(&self) -> Result<(), ApiError> {
        require(
            &[&self.title, &self.date, &self.description],
            "Title, date and description are required",
        )
    }
}

impl Entity for UpcomingProject {
    const COLLECTION: &'static str = "upcoming_projects";
}

impl ContentType for UpcomingProject {
    const PATH: &'static str = "upcoming-projects";
    const LABEL: &'static str = "Upcoming project";
    const SORT: SortOrder = SortOrder::NewestFirst;

    fn validate(&self) -> Result<(), ApiError> {
        require(&[&self.title, &self.description], "Title and description are required")
    }

    image_field!();
}

// --- Entities outside the generic content routes ---

impl Entity for Submission {
    const COLLECTION: &'static str = "submissions";
}

impl Entity for Admin {
    const COLLECTION: &'static str = "admins";
}

impl Entity for CommonTask {
    const COLLECTION: &'static str = "common_tasks";
}

impl Entity for PersonalTask {
    const COLLECTION: &'static str = "personal_tasks";
}
