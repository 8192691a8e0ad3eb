use async_trait::async_trait;
use lms_core::model::{
    Assessment, AssessmentId, CourseId, CoursePayment, Course, Enrollment, EnrollmentId, Lesson,
    Module, ModuleId, Money, NewAssessment, NewCourse, NewEnrollment, NewLesson, NewModule,
    NewNotification, NewPayment, NewSponsorship, NewSubmission, NewUser, Notification,
    NotificationId, PaymentId, SponsorProfile, Sponsorship, Submission, SubmissionId, User, UserId,
};
use std::sync::Arc;
use thiserror::Error;

use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and assign its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Overwrite names, roles, flags and profile of an existing user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// All users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// Delete a user. Owned rows cascade; payer and sender references become null.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn delete_user(&self, id: UserId) -> Result<(), StorageError>;
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another course has the same title.
    async fn insert_course(&self, course: NewCourse) -> Result<Course, StorageError>;

    /// Overwrite an existing course, including its instructor set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id or
    /// `StorageError::Conflict` for a duplicate title.
    async fn update_course(&self, course: &Course) -> Result<(), StorageError>;

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// All courses ordered by title.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Courses the user teaches, ordered by title.
    async fn courses_taught_by(&self, instructor: UserId) -> Result<Vec<Course>, StorageError>;

    /// Delete a course with its modules, lessons, enrollments, assessments,
    /// submissions and payments.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the course already has a module at
    /// that order, or `StorageError::NotFound` for an unknown course.
    async fn insert_module(&self, module: NewModule) -> Result<Module, StorageError>;

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError>;

    /// Modules of a course in display order.
    async fn modules_for_course(&self, course: CourseId) -> Result<Vec<Module>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the module already has a lesson at
    /// that order, or `StorageError::NotFound` for an unknown module.
    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StorageError>;

    /// Lessons of a module in display order.
    async fn lessons_for_module(&self, module: ModuleId) -> Result<Vec<Lesson>, StorageError>;
}

//
// ─── ENROLLMENTS ───────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the student is already enrolled.
    async fn insert_enrollment(&self, enrollment: NewEnrollment)
    -> Result<Enrollment, StorageError>;

    /// Persist progress and completion changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError>;

    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// A student's enrollments, newest first.
    async fn enrollments_for_student(&self, student: UserId)
    -> Result<Vec<Enrollment>, StorageError>;

    /// A course's enrollments, newest first.
    async fn enrollments_for_course(&self, course: CourseId)
    -> Result<Vec<Enrollment>, StorageError>;

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError>;
}

//
// ─── ASSESSMENTS & SUBMISSIONS ─────────────────────────────────────────────────
//

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown course.
    async fn insert_assessment(&self, assessment: NewAssessment)
    -> Result<Assessment, StorageError>;

    async fn get_assessment(&self, id: AssessmentId) -> Result<Option<Assessment>, StorageError>;

    /// Assessments belonging to any of `courses`, earliest due date first.
    async fn assessments_for_courses(
        &self,
        courses: &[CourseId],
    ) -> Result<Vec<Assessment>, StorageError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Create the student's submission, or replace the content of an existing
    /// one and clear its grade.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown assessment or student.
    async fn upsert_submission(&self, submission: NewSubmission)
    -> Result<Submission, StorageError>;

    /// Persist grading fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the submission does not exist.
    async fn update_submission(&self, submission: &Submission) -> Result<(), StorageError>;

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError>;

    /// Submissions for any of `assessments`, newest first.
    async fn submissions_for_assessments(
        &self,
        assessments: &[AssessmentId],
    ) -> Result<Vec<Submission>, StorageError>;
}

//
// ─── SPONSORSHIPS & PAYMENTS ───────────────────────────────────────────────────
//

#[async_trait]
pub trait SponsorshipRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` for a duplicate
    /// `(sponsor, student, start_date)`.
    async fn insert_sponsorship(&self, sponsorship: NewSponsorship)
    -> Result<Sponsorship, StorageError>;

    /// A sponsor's sponsorships, newest start date first.
    async fn sponsorships_for_sponsor(
        &self,
        sponsor: UserId,
    ) -> Result<Vec<Sponsorship>, StorageError>;

    async fn list_sponsorships(&self) -> Result<Vec<Sponsorship>, StorageError>;

    /// Create or replace the sponsor profile of `profile.user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown user.
    async fn upsert_profile(&self, profile: &SponsorProfile) -> Result<(), StorageError>;

    async fn get_profile(&self, user: UserId) -> Result<Option<SponsorProfile>, StorageError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` for a reused transaction id or an
    /// enrollment that already has a payment.
    async fn insert_payment(&self, payment: NewPayment) -> Result<CoursePayment, StorageError>;

    async fn get_payment(&self, id: PaymentId) -> Result<Option<CoursePayment>, StorageError>;

    /// Payments made by `payer`, newest first.
    async fn payments_by_payer(&self, payer: UserId) -> Result<Vec<CoursePayment>, StorageError>;

    /// Sum of completed payment amounts made by `payer`.
    async fn completed_total_for_payer(&self, payer: UserId) -> Result<Money, StorageError>;
}

//
// ─── NOTIFICATIONS ─────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown recipient.
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StorageError>;

    async fn get_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StorageError>;

    /// A recipient's notifications, most recent first.
    async fn notifications_for(&self, recipient: UserId)
    -> Result<Vec<Notification>, StorageError>;

    /// Up to `limit` unread notifications, most recent first.
    async fn unread_for(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError>;

    async fn unread_count(&self, recipient: UserId) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the notification does not exist.
    async fn mark_read(&self, id: NotificationId) -> Result<(), StorageError>;

    /// Marks every unread notification of `recipient` as read; returns how many changed.
    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, StorageError>;
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub sponsorships: Arc<dyn SponsorshipRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wires every repository field to clones of one backend.
    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: UserRepository
            + CourseRepository
            + EnrollmentRepository
            + AssessmentRepository
            + SubmissionRepository
            + SponsorshipRepository
            + PaymentRepository
            + NotificationRepository
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            assessments: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            sponsorships: Arc::new(repo.clone()),
            payments: Arc::new(repo.clone()),
            notifications: Arc::new(repo),
        }
    }
}
