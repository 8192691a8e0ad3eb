//! Assessment publishing, submissions and grading.

use serde::Serialize;

use lms_core::Clock;
use lms_core::model::{
    Assessment, AssessmentDraft, AssessmentId, Course, CourseId, GradeInput, NewSubmission,
    Submission, SubmissionId, User, UserId,
};
use lms_core::roles::Role;
use lms_core::routes::Route;
use storage::{Storage, StorageError};

use crate::error::AssessmentServiceError;
use crate::notifications::{DispatchReport, Notice, NotificationDispatcher};
use crate::routed::{Routed, require};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentCreated {
    pub assessment: Assessment,
    /// One entry per student enrolled at publication time.
    pub dispatches: Vec<DispatchReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradedSubmission {
    pub submission: Submission,
    pub dispatch: DispatchReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub assessment: Assessment,
    pub course: Course,
}

#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    storage: Storage,
    dispatcher: NotificationDispatcher,
}

impl AssessmentService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage, dispatcher: NotificationDispatcher) -> Self {
        Self {
            clock,
            storage,
            dispatcher,
        }
    }

    /// Publishes an assessment and notifies every enrolled student.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentServiceError::Assessment` for validation failures and
    /// `AssessmentServiceError::Storage` if the course is missing or the insert
    /// fails. Notification failures are reported, not returned.
    pub async fn create(
        &self,
        actor: &User,
        draft: AssessmentDraft,
    ) -> Result<Routed<AssessmentCreated>, AssessmentServiceError> {
        let course = self.course(draft.course_id).await?;
        require!(can_grade(actor, &course), Route::CourseDetail(course.id));

        let assessment = self
            .storage
            .assessments
            .insert_assessment(draft.validate(self.clock.now())?)
            .await?;
        tracing::info!(assessment = %assessment.id, course = %course.id, "assessment created");

        let enrollments = self.storage.enrollments.enrollments_for_course(course.id).await?;
        let mut dispatches = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let student = self.user(enrollment.student_id).await?;
            let notice = Notice::NewAssignment {
                course: &course,
                assessment: &assessment,
            };
            dispatches.push(self.dispatcher.dispatch(&student, Some(actor.id), notice).await);
        }

        Ok(Routed::Done(AssessmentCreated {
            assessment,
            dispatches,
        }))
    }

    /// Creates or replaces the student's submission. Resubmitting clears any grade.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentServiceError::Storage` if the assessment is missing or
    /// persistence fails.
    pub async fn submit(
        &self,
        actor: &User,
        assessment_id: AssessmentId,
        content: Option<String>,
    ) -> Result<Routed<Submission>, AssessmentServiceError> {
        require!(actor.has_role(Role::Student), Route::Login);
        let assessment = self.assessment(assessment_id).await?;
        let enrolled = self
            .storage
            .enrollments
            .find_enrollment(actor.id, assessment.course_id)
            .await?
            .is_some();
        require!(enrolled, Route::CourseDetail(assessment.course_id));

        let submission = self
            .storage
            .submissions
            .upsert_submission(NewSubmission {
                assessment_id,
                student_id: actor.id,
                content: content.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
                submitted_at: self.clock.now(),
            })
            .await?;
        Ok(Routed::Done(submission))
    }

    /// Grades a submission and notifies the student.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentServiceError::Grade` when the score exceeds the
    /// assessment's maximum, and `AssessmentServiceError::Storage` on
    /// repository failures.
    pub async fn grade(
        &self,
        actor: &User,
        submission_id: SubmissionId,
        input: GradeInput,
    ) -> Result<Routed<GradedSubmission>, AssessmentServiceError> {
        let mut submission = self.submission(submission_id).await?;
        let assessment = self.assessment(submission.assessment_id).await?;
        let course = self.course(assessment.course_id).await?;
        require!(can_grade(actor, &course), Route::InstructorDashboard);

        submission.apply_grade(input, assessment.max_score)?;
        self.storage.submissions.update_submission(&submission).await?;
        tracing::info!(submission = %submission.id, grader = %actor.id, "submission graded");

        let student = self.user(submission.student_id).await?;
        let notice = Notice::AssessmentGraded {
            course: &course,
            assessment: &assessment,
            submission: &submission,
        };
        let dispatch = self.dispatcher.dispatch(&student, Some(actor.id), notice).await;

        Ok(Routed::Done(GradedSubmission {
            submission,
            dispatch,
        }))
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError::Storage` if the submission is missing.
    pub async fn submission_detail(
        &self,
        actor: &User,
        id: SubmissionId,
    ) -> Result<Routed<SubmissionDetail>, AssessmentServiceError> {
        require!(
            actor.has_role(Role::Student)
                || actor.has_role(Role::Instructor)
                || actor.is_admin_or_superuser(),
            Route::Login
        );

        let submission = self.submission(id).await?;
        let assessment = self.assessment(submission.assessment_id).await?;
        let course = self.course(assessment.course_id).await?;

        require!(
            !actor.has_role(Role::Student) || submission.student_id == actor.id,
            Route::StudentDashboard
        );
        require!(
            !actor.has_role(Role::Instructor)
                || course.is_taught_by(actor.id)
                || actor.is_admin_or_superuser(),
            Route::InstructorDashboard
        );

        Ok(Routed::Done(SubmissionDetail {
            submission,
            assessment,
            course,
        }))
    }

    async fn course(&self, id: CourseId) -> Result<Course, StorageError> {
        self.storage
            .courses
            .get_course(id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn assessment(&self, id: AssessmentId) -> Result<Assessment, StorageError> {
        self.storage
            .assessments
            .get_assessment(id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn submission(&self, id: SubmissionId) -> Result<Submission, StorageError> {
        self.storage
            .submissions
            .get_submission(id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn user(&self, id: UserId) -> Result<User, StorageError> {
        self.storage
            .users
            .get_user(id)
            .await?
            .ok_or(StorageError::NotFound)
    }
}

fn can_grade(actor: &User, course: &Course) -> bool {
    actor.is_superuser || (actor.has_role(Role::Instructor) && course.is_taught_by(actor.id))
}
