use serde::Serialize;
use std::fmt;

use crate::model::{CourseId, SubmissionId};

/// Named views an operation can send the caller to instead of failing.
///
/// The web layer maps these onto its URL scheme; the paths returned by
/// [`Route::path`] mirror the default layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "route", content = "id", rename_all = "snake_case")]
pub enum Route {
    Home,
    Login,
    AdminDashboard,
    InstructorDashboard,
    StudentDashboard,
    SponsorDashboard,
    CourseList,
    CourseDetail(CourseId),
    SubmissionDetail(SubmissionId),
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_owned(),
            Route::Login => "/login/".to_owned(),
            Route::AdminDashboard => "/dashboard/admin/".to_owned(),
            Route::InstructorDashboard => "/dashboard/instructor/".to_owned(),
            Route::StudentDashboard => "/dashboard/student/".to_owned(),
            Route::SponsorDashboard => "/dashboard/sponsor/".to_owned(),
            Route::CourseList => "/courses/".to_owned(),
            Route::CourseDetail(id) => format!("/courses/{id}/"),
            Route::SubmissionDetail(id) => format!("/submissions/{id}/"),
        }
    }

    /// Absolute URL for this route under `site_url`.
    #[must_use]
    pub fn absolute(&self, site_url: &str) -> String {
        format!("{}{}", site_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
