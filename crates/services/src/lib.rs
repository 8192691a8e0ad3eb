#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessments;
pub mod config;
pub mod courses;
pub mod dashboards;
pub mod error;
pub mod notifications;
pub mod routed;
pub mod sponsor;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use assessments::{AssessmentCreated, AssessmentService, GradedSubmission, SubmissionDetail};
pub use config::{LmsConfig, MailConfig, MailRelayConfig};
pub use courses::{CourseDetail, CourseListQuery, CourseListing, CourseService, ModuleOutline};
pub use dashboards::{
    AdminDashboard, DashboardService, InstructorDashboard, StudentDashboard, TaughtCourse,
};
pub use error::{
    AppServicesError, AssessmentServiceError, CourseServiceError, DashboardError, MailError,
    NotificationServiceError,
};
pub use notifications::{
    Attempt, ConsoleMailer, DispatchReport, HttpMailer, MarkReadResponse, Mailer, Notice,
    NotificationDispatcher, NotificationService, OutgoingMail, RequestMethod, UnreadSummary,
};
pub use routed::Routed;
pub use sponsor::{
    ProgressFilter, SponsorDashboard, SponsorDashboardQuery, SponsorDashboardService,
    SponsorHeadline, SponsoredStudent, StatusFilter, StudentRollup,
};
