use raynk_site::{
    content::{ContentType, DeletePolicy, PublicView},
    models::{
        About, Community, Course, CourseBadge, CourseLevel, Hero, MediaRef, Meetup, MeetupKind,
        Project, ProjectStatus, Service, Software, Submission, SubmissionStatus, TeamMember,
        UpcomingProject,
    },
    repository::SortOrder,
};
use serde_json::json;

// --- Registry settings ---

#[test]
fn test_route_paths_and_views() {
    assert_eq!(Hero::PATH, "hero");
    assert_eq!(UpcomingProject::PATH, "upcoming-projects");
    assert_eq!(Hero::PUBLIC_VIEW, PublicView::Single);
    assert_eq!(About::PUBLIC_VIEW, PublicView::Single);
    assert_eq!(Community::PUBLIC_VIEW, PublicView::Single);
    assert_eq!(Course::PUBLIC_VIEW, PublicView::List);
}

#[test]
fn test_default_delete_policies() {
    assert_eq!(Course::DELETE_POLICY, DeletePolicy::Soft);
    assert_eq!(Service::DELETE_POLICY, DeletePolicy::Soft);
    assert_eq!(Meetup::DELETE_POLICY, DeletePolicy::Soft);
    assert_eq!(Software::DELETE_POLICY, DeletePolicy::Hard);
    assert_eq!(Project::DELETE_POLICY, DeletePolicy::Hard);
    assert_eq!(TeamMember::DELETE_POLICY, DeletePolicy::Hard);
}

#[test]
fn test_curated_types_sort_manually() {
    assert_eq!(Course::SORT, SortOrder::Manual);
    assert_eq!(Service::SORT, SortOrder::Manual);
    assert_eq!(TeamMember::SORT, SortOrder::Manual);
    assert_eq!(Meetup::SORT, SortOrder::NewestFirst);
}

// --- Validation ---

#[test]
fn test_team_member_requires_name_and_role() {
    let member: TeamMember = serde_json::from_value(json!({ "name": "Ada", "role": " " })).unwrap();
    let err = member.validate().unwrap_err();
    assert_eq!(err.to_string(), "Name and role are required");

    let member: TeamMember =
        serde_json::from_value(json!({ "name": "Ada", "role": "Engineer" })).unwrap();
    assert!(member.validate().is_ok());
}

#[test]
fn test_meetup_requires_date() {
    let meetup: Meetup =
        serde_json::from_value(json!({ "title": "Meetup", "description": "Talks" })).unwrap();
    assert_eq!(
        meetup.validate().unwrap_err().to_string(),
        "Title, date and description are required"
    );
}

#[test]
fn test_hero_and_software_messages() {
    let hero = Hero::default();
    assert_eq!(hero.validate().unwrap_err().to_string(), "Title and tagline are required");

    let software: Software = serde_json::from_value(json!({ "name": "Notes" })).unwrap();
    assert_eq!(
        software.validate().unwrap_err().to_string(),
        "Name and description are required"
    );
}

// --- Wire shapes ---

#[test]
fn test_course_defaults() {
    let course: Course = serde_json::from_value(json!({ "title": "Rust", "description": "d" })).unwrap();

    assert_eq!(course.level, CourseLevel::Beginner);
    assert_eq!(course.badge, CourseBadge::Free);
    assert_eq!(course.order, 0);
    assert!(course.image.is_none());
}

#[test]
fn test_form_strings_are_accepted() {
    let project: Project = serde_json::from_value(json!({
        "title": "CRM",
        "description": "Pipeline",
        "techStack": "Rust",
        "order": "4",
        "status": "Coming Soon",
        "projectType": "Web App"
    }))
    .unwrap();

    assert_eq!(project.tech_stack, vec!["Rust"]);
    assert_eq!(project.order, 4);
    assert_eq!(project.status, ProjectStatus::ComingSoon);
    assert_eq!(project.project_type, "Web App");
}

#[test]
fn test_community_and_meetup_defaults() {
    let community: Community = serde_json::from_value(json!({ "title": "t", "description": "d" })).unwrap();
    assert_eq!(community.cta_text, "Join Community \u{2014} Free");

    let meetup: Meetup = serde_json::from_value(json!({ "type": "podcast" })).unwrap();
    assert_eq!(meetup.kind, MeetupKind::Podcast);
    assert_eq!(meetup.cta, "Register");
}

#[test]
fn test_media_ref_accepts_both_spellings() {
    let camel: MediaRef = serde_json::from_value(json!({ "url": "u", "publicId": "p" })).unwrap();
    let snake: MediaRef = serde_json::from_value(json!({ "url": "u", "public_id": "p" })).unwrap();
    assert_eq!(camel, snake);

    assert_eq!(serde_json::to_value(&camel).unwrap(), json!({ "url": "u", "publicId": "p" }));
}

#[test]
fn test_submission_serializes_kind_as_type() {
    let submission: Submission = serde_json::from_value(json!({
        "type": "community",
        "name": "Linus",
        "email": "linus@example.com"
    }))
    .unwrap();

    assert_eq!(submission.status, SubmissionStatus::New);
    assert!(!submission.is_read);

    let value = serde_json::to_value(&submission).unwrap();
    assert_eq!(value["type"], "community");
    assert_eq!(value["isRead"], false);
    assert!(value.get("kind").is_none());
}
