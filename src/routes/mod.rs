//! Router Module Index
//!
//! Splits the routing table by access level. The split only decides which
//! layer a route sits behind; handlers stay shared across modules.

/// Applies a generic route-registration function to every content type.
macro_rules! for_each_content_type {
    ($router:expr, $register:ident) => {{
        use crate::models::{
            About, Community, Course, Hero, Meetup, Project, Service, Software, TeamMember,
            UpcomingProject,
        };
        let router = $router;
        let router = $register::<Hero>(router);
        let router = $register::<About>(router);
        let router = $register::<Community>(router);
        let router = $register::<Course>(router);
        let router = $register::<Service>(router);
        let router = $register::<Software>(router);
        let router = $register::<Project>(router);
        let router = $register::<TeamMember>(router);
        let router = $register::<Meetup>(router);
        $register::<UpcomingProject>(router)
    }};
}

/// Routes open to any visitor: the site's read endpoints and the form intake.
pub mod public;

/// Mutating routes outside `/api/admin`, wrapped in the `require_admin` route layer.
pub mod authenticated;

/// Everything under `/api/admin`, protected by the global admin gate
/// (login and logout excepted).
pub mod admin;
