use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::decimal::Progress;
use crate::model::ids::{CourseId, EnrollmentId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

impl NewEnrollment {
    #[must_use]
    pub fn new(student_id: UserId, course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            enrolled_at,
        }
    }

    #[must_use]
    pub fn assign_id(self, id: EnrollmentId) -> Enrollment {
        Enrollment {
            id,
            student_id: self.student_id,
            course_id: self.course_id,
            enrollment_date: self.enrolled_at,
            completion_date: None,
            is_completed: false,
            progress: Progress::ZERO,
        }
    }
}

/// A student's membership in a course, with progress tracking.
///
/// `(student_id, course_id)` is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrollment_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub progress: Progress,
}

impl Enrollment {
    pub fn record_progress(&mut self, progress: Progress) {
        self.progress = progress;
    }

    /// Flags the enrollment as completed. Progress is left as tracked.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completion_date = Some(at);
    }

    pub fn reopen(&mut self) {
        self.is_completed = false;
        self.completion_date = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_enrollment_starts_at_zero() {
        let e = NewEnrollment::new(UserId::new(1), CourseId::new(2), fixed_now())
            .assign_id(EnrollmentId::new(3));
        assert_eq!(e.progress, Progress::ZERO);
        assert!(!e.is_completed);
        assert_eq!(e.completion_date, None);
    }

    #[test]
    fn completion_round_trip() {
        let mut e = NewEnrollment::new(UserId::new(1), CourseId::new(2), fixed_now())
            .assign_id(EnrollmentId::new(3));
        e.record_progress("42.5".parse().unwrap());
        e.mark_completed(fixed_now());
        assert!(e.is_completed);
        assert_eq!(e.progress.to_string(), "42.50");
        e.reopen();
        assert!(!e.is_completed);
        assert_eq!(e.completion_date, None);
    }
}
