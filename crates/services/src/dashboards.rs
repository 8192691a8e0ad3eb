//! Student, instructor and admin dashboards plus the post-login redirect.

use std::collections::BTreeSet;

use serde::Serialize;

use lms_core::Clock;
use lms_core::model::{Assessment, Course, CourseId, Enrollment, Money, Progress, Submission, User};
use lms_core::roles::{Role, dashboard_route};
use lms_core::routes::Route;
use storage::{Storage, StorageError};

use crate::error::DashboardError;
use crate::routed::{Routed, require};

/// How many upcoming assessments and pending submissions a dashboard lists.
pub const DASHBOARD_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: Course,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDashboard {
    pub enrollments: Vec<EnrolledCourse>,
    pub upcoming_assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaughtCourse {
    pub course: Course,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSubmission {
    pub submission: Submission,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorDashboard {
    pub courses_taught: Vec<TaughtCourse>,
    pub pending_submissions: Vec<PendingSubmission>,
    pub total_active_courses: usize,
    pub total_students_across_courses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDashboard {
    pub total_users: usize,
    pub total_students: usize,
    pub total_instructors: usize,
    pub total_sponsors: usize,
    pub total_admins: usize,
    pub total_courses: usize,
    pub active_courses: usize,
    pub total_enrollments: usize,
    pub completed_enrollments: usize,
    pub average_completion_rate: Progress,
    pub total_sponsorships: usize,
    pub total_funds_received: Money,
}

#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    storage: Storage,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self { clock, storage }
    }

    /// Where a freshly signed-in user should land.
    #[must_use]
    pub fn redirect(&self, viewer: Option<&User>) -> Route {
        viewer.map_or(Route::Login, dashboard_route)
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn student(&self, viewer: &User) -> Result<Routed<StudentDashboard>, DashboardError> {
        require!(viewer.has_role(Role::Student), Route::Login);

        let enrollments = self.storage.enrollments.enrollments_for_student(viewer.id).await?;
        let mut enrolled = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course = self
                .storage
                .courses
                .get_course(enrollment.course_id)
                .await?
                .ok_or(StorageError::NotFound)?;
            enrolled.push(EnrolledCourse { enrollment, course });
        }

        let course_ids: Vec<CourseId> = enrolled.iter().map(|e| e.course.id).collect();
        let now = self.clock.now();
        let upcoming_assessments = self
            .storage
            .assessments
            .assessments_for_courses(&course_ids)
            .await?
            .into_iter()
            .filter(|a| a.due_date >= now)
            .take(DASHBOARD_LIST_LIMIT)
            .collect();

        Ok(Routed::Done(StudentDashboard {
            enrollments: enrolled,
            upcoming_assessments,
        }))
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn instructor(
        &self,
        viewer: &User,
    ) -> Result<Routed<InstructorDashboard>, DashboardError> {
        require!(viewer.has_role(Role::Instructor), Route::Login);

        let courses = self.storage.courses.courses_taught_by(viewer.id).await?;
        let mut students = BTreeSet::new();
        let mut courses_taught = Vec::with_capacity(courses.len());
        for course in courses {
            let enrollments = self.storage.enrollments.enrollments_for_course(course.id).await?;
            students.extend(enrollments.iter().map(|e| e.student_id));
            courses_taught.push(TaughtCourse {
                course,
                total_students: enrollments.len(),
            });
        }

        let course_ids: Vec<CourseId> = courses_taught.iter().map(|t| t.course.id).collect();
        let assessments = self
            .storage
            .assessments
            .assessments_for_courses(&course_ids)
            .await?;
        let assessment_ids: Vec<_> = assessments.iter().map(|a| a.id).collect();
        let mut ungraded: Vec<Submission> = self
            .storage
            .submissions
            .submissions_for_assessments(&assessment_ids)
            .await?
            .into_iter()
            .filter(|s| !s.is_graded)
            .collect();
        // Stable sort keeps newest-first order among equal due dates.
        ungraded.sort_by_key(|s| {
            assessments
                .iter()
                .find(|a| a.id == s.assessment_id)
                .map(|a| a.due_date)
        });
        let pending_submissions = ungraded
            .into_iter()
            .take(DASHBOARD_LIST_LIMIT)
            .filter_map(|submission| {
                let assessment = assessments
                    .iter()
                    .find(|a| a.id == submission.assessment_id)?
                    .clone();
                Some(PendingSubmission {
                    submission,
                    assessment,
                })
            })
            .collect();

        Ok(Routed::Done(InstructorDashboard {
            total_active_courses: courses_taught.iter().filter(|t| t.course.is_active).count(),
            total_students_across_courses: students.len(),
            courses_taught,
            pending_submissions,
        }))
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn admin(&self, viewer: &User) -> Result<Routed<AdminDashboard>, DashboardError> {
        require!(viewer.is_admin_or_superuser(), Route::Login);

        let users = self.storage.users.list_users().await?;
        let role_count = |role: Role| users.iter().filter(|u| u.has_role(role)).count();
        let courses = self.storage.courses.list_courses().await?;
        let enrollments = self.storage.enrollments.list_enrollments().await?;
        let sponsorships = self.storage.sponsorships.list_sponsorships().await?;

        let progress_sum: u64 = enrollments
            .iter()
            .map(|e| u64::from(e.progress.hundredths()))
            .sum();
        let enrollment_count = u64::try_from(enrollments.len()).unwrap_or(u64::MAX);

        Ok(Routed::Done(AdminDashboard {
            total_users: users.len(),
            total_students: role_count(Role::Student),
            total_instructors: role_count(Role::Instructor),
            total_sponsors: role_count(Role::Sponsor),
            total_admins: role_count(Role::Admin),
            total_courses: courses.len(),
            active_courses: courses.iter().filter(|c| c.is_active).count(),
            total_enrollments: enrollments.len(),
            completed_enrollments: enrollments.iter().filter(|e| e.is_completed).count(),
            average_completion_rate: Progress::mean(progress_sum, enrollment_count),
            total_sponsorships: sponsorships.len(),
            total_funds_received: sponsorships.iter().map(|s| s.amount_funded).sum(),
        }))
    }
}
