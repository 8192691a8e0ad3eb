//! In-memory backend for tests and prototyping.
//!
//! All tables live behind one mutex so cascading deletes and uniqueness
//! checks happen atomically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{
    Assessment, AssessmentId, Course, CourseId, CoursePayment, Enrollment, EnrollmentId, Lesson,
    LessonId, Module, ModuleId, Money, NewAssessment, NewCourse, NewEnrollment, NewLesson,
    NewModule, NewNotification, NewPayment, NewSponsorship, NewSubmission, NewUser, Notification,
    NotificationId, PaymentId, SponsorProfile, Sponsorship, SponsorshipId, Submission,
    SubmissionId, User, UserId,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::repository::{
    AssessmentRepository, CourseRepository, EnrollmentRepository, NotificationRepository,
    PaymentRepository, SponsorshipRepository, StorageError, SubmissionRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    courses: BTreeMap<CourseId, Course>,
    modules: BTreeMap<ModuleId, Module>,
    lessons: BTreeMap<LessonId, Lesson>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
    assessments: BTreeMap<AssessmentId, Assessment>,
    submissions: BTreeMap<SubmissionId, Submission>,
    profiles: BTreeMap<UserId, SponsorProfile>,
    sponsorships: BTreeMap<SponsorshipId, Sponsorship>,
    payments: BTreeMap<PaymentId, CoursePayment>,
    notifications: BTreeMap<NotificationId, Notification>,
}

impl Tables {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, id: UserId) -> Result<(), StorageError> {
        self.users
            .contains_key(&id)
            .then_some(())
            .ok_or(StorageError::NotFound)
    }

    fn require_course(&self, id: CourseId) -> Result<(), StorageError> {
        self.courses
            .contains_key(&id)
            .then_some(())
            .ok_or(StorageError::NotFound)
    }

    fn remove_enrollments(&mut self, doomed: impl Fn(&Enrollment) -> bool) {
        let removed: Vec<EnrollmentId> = self
            .enrollments
            .values()
            .filter(|e| doomed(e))
            .map(|e| e.id)
            .collect();
        self.enrollments.retain(|id, _| !removed.contains(id));
        self.payments
            .retain(|_, p| p.enrollment_id.is_none_or(|e| !removed.contains(&e)));
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, u64)) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut t = self.lock()?;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(t.next());
        let user = user.assign_id(id);
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StorageError::Conflict);
        }
        let slot = t.users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        t.users.remove(&id).ok_or(StorageError::NotFound)?;

        for course in t.courses.values_mut() {
            course.instructors.remove(&id);
        }
        t.remove_enrollments(|e| e.student_id == id);
        t.submissions.retain(|_, s| s.student_id != id);
        t.profiles.remove(&id);
        t.sponsorships
            .retain(|_, s| s.sponsor_id != id && s.student_id != id);
        t.notifications.retain(|_, n| n.recipient_id != id);
        for n in t.notifications.values_mut() {
            if n.sender_id == Some(id) {
                n.sender_id = None;
            }
        }
        for p in t.payments.values_mut() {
            if p.payer_id == Some(id) {
                p.payer_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, StorageError> {
        let mut t = self.lock()?;
        if t.courses.values().any(|c| c.title == course.title) {
            return Err(StorageError::Conflict);
        }
        if course.instructors.iter().any(|i| !t.users.contains_key(i)) {
            return Err(StorageError::NotFound);
        }
        let id = CourseId::new(t.next());
        let course = course.assign_id(id);
        t.courses.insert(id, course.clone());
        Ok(course)
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t
            .courses
            .values()
            .any(|c| c.id != course.id && c.title == course.title)
        {
            return Err(StorageError::Conflict);
        }
        if course.instructors.iter().any(|i| !t.users.contains_key(i)) {
            return Err(StorageError::NotFound);
        }
        let slot = t.courses.get_mut(&course.id).ok_or(StorageError::NotFound)?;
        *slot = course.clone();
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.lock()?.courses.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let mut courses: Vec<Course> = self.lock()?.courses.values().cloned().collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn courses_taught_by(&self, instructor: UserId) -> Result<Vec<Course>, StorageError> {
        let mut courses: Vec<Course> = self
            .lock()?
            .courses
            .values()
            .filter(|c| c.is_taught_by(instructor))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        t.courses.remove(&id).ok_or(StorageError::NotFound)?;

        let modules: Vec<ModuleId> = t
            .modules
            .values()
            .filter(|m| m.course_id == id)
            .map(|m| m.id)
            .collect();
        t.modules.retain(|_, m| m.course_id != id);
        t.lessons.retain(|_, l| !modules.contains(&l.module_id));

        let assessments: Vec<AssessmentId> = t
            .assessments
            .values()
            .filter(|a| a.course_id == id)
            .map(|a| a.id)
            .collect();
        t.assessments.retain(|_, a| a.course_id != id);
        t.submissions
            .retain(|_, s| !assessments.contains(&s.assessment_id));

        t.remove_enrollments(|e| e.course_id == id);
        t.payments.retain(|_, p| p.course_id != id);
        Ok(())
    }

    async fn insert_module(&self, module: NewModule) -> Result<Module, StorageError> {
        let mut t = self.lock()?;
        t.require_course(module.course_id)?;
        if t
            .modules
            .values()
            .any(|m| m.course_id == module.course_id && m.order == module.order)
        {
            return Err(StorageError::Conflict);
        }
        let id = ModuleId::new(t.next());
        let module = module.assign_id(id);
        t.modules.insert(id, module.clone());
        Ok(module)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        Ok(self.lock()?.modules.get(&id).cloned())
    }

    async fn modules_for_course(&self, course: CourseId) -> Result<Vec<Module>, StorageError> {
        let mut modules: Vec<Module> = self
            .lock()?
            .modules
            .values()
            .filter(|m| m.course_id == course)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.order);
        Ok(modules)
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StorageError> {
        let mut t = self.lock()?;
        if !t.modules.contains_key(&lesson.module_id) {
            return Err(StorageError::NotFound);
        }
        if t
            .lessons
            .values()
            .any(|l| l.module_id == lesson.module_id && l.order == lesson.order)
        {
            return Err(StorageError::Conflict);
        }
        let id = LessonId::new(t.next());
        let lesson = lesson.assign_id(id);
        t.lessons.insert(id, lesson.clone());
        Ok(lesson)
    }

    async fn lessons_for_module(&self, module: ModuleId) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons: Vec<Lesson> = self
            .lock()?
            .lessons
            .values()
            .filter(|l| l.module_id == module)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.order);
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, StorageError> {
        let mut t = self.lock()?;
        t.require_user(enrollment.student_id)?;
        t.require_course(enrollment.course_id)?;
        if t.enrollments.values().any(|e| {
            e.student_id == enrollment.student_id && e.course_id == enrollment.course_id
        }) {
            return Err(StorageError::Conflict);
        }
        let id = EnrollmentId::new(t.next());
        let enrollment = enrollment.assign_id(id);
        t.enrollments.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let slot = t
            .enrollments
            .get_mut(&enrollment.id)
            .ok_or(StorageError::NotFound)?;
        *slot = enrollment.clone();
        Ok(())
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        Ok(self.lock()?.enrollments.get(&id).cloned())
    }

    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(self
            .lock()?
            .enrollments
            .values()
            .find(|e| e.student_id == student && e.course_id == course)
            .cloned())
    }

    async fn enrollments_for_student(
        &self,
        student: UserId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = self
            .lock()?
            .enrollments
            .values()
            .filter(|e| e.student_id == student)
            .cloned()
            .collect();
        Ok(newest_first(rows, |e| (e.enrollment_date, e.id.value())))
    }

    async fn enrollments_for_course(
        &self,
        course: CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = self
            .lock()?
            .enrollments
            .values()
            .filter(|e| e.course_id == course)
            .cloned()
            .collect();
        Ok(newest_first(rows, |e| (e.enrollment_date, e.id.value())))
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError> {
        let rows = self.lock()?.enrollments.values().cloned().collect();
        Ok(newest_first(rows, |e| (e.enrollment_date, e.id.value())))
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn insert_assessment(
        &self,
        assessment: NewAssessment,
    ) -> Result<Assessment, StorageError> {
        let mut t = self.lock()?;
        t.require_course(assessment.course_id)?;
        let id = AssessmentId::new(t.next());
        let assessment = assessment.assign_id(id);
        t.assessments.insert(id, assessment.clone());
        Ok(assessment)
    }

    async fn get_assessment(&self, id: AssessmentId) -> Result<Option<Assessment>, StorageError> {
        Ok(self.lock()?.assessments.get(&id).cloned())
    }

    async fn assessments_for_courses(
        &self,
        courses: &[CourseId],
    ) -> Result<Vec<Assessment>, StorageError> {
        let mut rows: Vec<Assessment> = self
            .lock()?
            .assessments
            .values()
            .filter(|a| courses.contains(&a.course_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.due_date, a.id));
        Ok(rows)
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn upsert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<Submission, StorageError> {
        let mut t = self.lock()?;
        t.require_user(submission.student_id)?;
        if !t.assessments.contains_key(&submission.assessment_id) {
            return Err(StorageError::NotFound);
        }
        let existing = t
            .submissions
            .values()
            .find(|s| {
                s.assessment_id == submission.assessment_id
                    && s.student_id == submission.student_id
            })
            .map(|s| s.id);
        let id = match existing {
            Some(id) => id,
            None => SubmissionId::new(t.next()),
        };
        let submission = submission.assign_id(id);
        t.submissions.insert(id, submission.clone());
        Ok(submission)
    }

    async fn update_submission(&self, submission: &Submission) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let slot = t
            .submissions
            .get_mut(&submission.id)
            .ok_or(StorageError::NotFound)?;
        *slot = submission.clone();
        Ok(())
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        Ok(self.lock()?.submissions.get(&id).cloned())
    }

    async fn submissions_for_assessments(
        &self,
        assessments: &[AssessmentId],
    ) -> Result<Vec<Submission>, StorageError> {
        let rows = self
            .lock()?
            .submissions
            .values()
            .filter(|s| assessments.contains(&s.assessment_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |s| (s.submission_date, s.id.value())))
    }
}

#[async_trait]
impl SponsorshipRepository for InMemoryRepository {
    async fn insert_sponsorship(
        &self,
        sponsorship: NewSponsorship,
    ) -> Result<Sponsorship, StorageError> {
        let mut t = self.lock()?;
        t.require_user(sponsorship.sponsor_id)?;
        t.require_user(sponsorship.student_id)?;
        if t.sponsorships.values().any(|s| {
            s.sponsor_id == sponsorship.sponsor_id
                && s.student_id == sponsorship.student_id
                && s.start_date == sponsorship.start_date
        }) {
            return Err(StorageError::Conflict);
        }
        let id = SponsorshipId::new(t.next());
        let sponsorship = sponsorship.assign_id(id);
        t.sponsorships.insert(id, sponsorship.clone());
        Ok(sponsorship)
    }

    async fn sponsorships_for_sponsor(
        &self,
        sponsor: UserId,
    ) -> Result<Vec<Sponsorship>, StorageError> {
        let mut rows: Vec<Sponsorship> = self
            .lock()?
            .sponsorships
            .values()
            .filter(|s| s.sponsor_id == sponsor)
            .cloned()
            .collect();
        rows.sort_by_key(|s| std::cmp::Reverse((s.start_date, s.id)));
        Ok(rows)
    }

    async fn list_sponsorships(&self) -> Result<Vec<Sponsorship>, StorageError> {
        let mut rows: Vec<Sponsorship> = self.lock()?.sponsorships.values().cloned().collect();
        rows.sort_by_key(|s| std::cmp::Reverse((s.start_date, s.id)));
        Ok(rows)
    }

    async fn upsert_profile(&self, profile: &SponsorProfile) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        t.require_user(profile.user_id)?;
        t.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user: UserId) -> Result<Option<SponsorProfile>, StorageError> {
        Ok(self.lock()?.profiles.get(&user).cloned())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryRepository {
    async fn insert_payment(&self, payment: NewPayment) -> Result<CoursePayment, StorageError> {
        let mut t = self.lock()?;
        t.require_course(payment.course_id)?;
        if let Some(payer) = payment.payer_id {
            t.require_user(payer)?;
        }
        if let Some(enrollment) = payment.enrollment_id {
            if !t.enrollments.contains_key(&enrollment) {
                return Err(StorageError::NotFound);
            }
            if t.payments.values().any(|p| p.enrollment_id == Some(enrollment)) {
                return Err(StorageError::Conflict);
            }
        }
        let reused_tx = payment.transaction_id.as_ref().is_some_and(|tx| {
            t.payments
                .values()
                .any(|p| p.transaction_id.as_ref() == Some(tx))
        });
        if reused_tx {
            return Err(StorageError::Conflict);
        }
        let id = PaymentId::new(t.next());
        let payment = payment.assign_id(id);
        t.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<CoursePayment>, StorageError> {
        Ok(self.lock()?.payments.get(&id).cloned())
    }

    async fn payments_by_payer(&self, payer: UserId) -> Result<Vec<CoursePayment>, StorageError> {
        let rows = self
            .lock()?
            .payments
            .values()
            .filter(|p| p.payer_id == Some(payer))
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| (p.payment_date, p.id.value())))
    }

    async fn completed_total_for_payer(&self, payer: UserId) -> Result<Money, StorageError> {
        Ok(self
            .lock()?
            .payments
            .values()
            .filter(|p| p.payer_id == Some(payer) && p.is_completed())
            .map(|p| p.amount)
            .sum())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StorageError> {
        let mut t = self.lock()?;
        t.require_user(notification.recipient_id)?;
        if let Some(sender) = notification.sender_id {
            t.require_user(sender)?;
        }
        let id = NotificationId::new(t.next());
        let notification = notification.assign_id(id);
        t.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn get_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StorageError> {
        Ok(self.lock()?.notifications.get(&id).cloned())
    }

    async fn notifications_for(
        &self,
        recipient: UserId,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = self
            .lock()?
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient)
            .cloned()
            .collect();
        Ok(newest_first(rows, |n| (n.created_at, n.id.value())))
    }

    async fn unread_for(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = self
            .lock()?
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient && !n.is_read)
            .cloned()
            .collect();
        let mut rows = newest_first(rows, |n| (n.created_at, n.id.value()));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, StorageError> {
        let count = self
            .lock()?
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient && !n.is_read)
            .count();
        u64::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        t.notifications
            .get_mut(&id)
            .ok_or(StorageError::NotFound)?
            .mark_read();
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, StorageError> {
        let mut t = self.lock()?;
        let mut changed = 0;
        for n in t
            .notifications
            .values_mut()
            .filter(|n| n.recipient_id == recipient && !n.is_read)
        {
            n.mark_read();
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{CourseDraft, NotificationType, PaymentStatus, Progress, UserDraft};
    use lms_core::roles::Role;
    use lms_core::time::fixed_now;

    async fn user(repo: &InMemoryRepository, name: &str, role: Role) -> User {
        let draft = UserDraft::with_role(name, format!("{name}@example.com"), role);
        repo.insert_user(draft.validate(fixed_now()).unwrap())
            .await
            .unwrap()
    }

    async fn course(repo: &InMemoryRepository, title: &str, instructor: UserId) -> Course {
        let mut draft = CourseDraft::new(title, "About");
        draft.instructors.insert(instructor);
        repo.insert_course(draft.validate(fixed_now()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_and_enrollment_conflict() {
        let repo = InMemoryRepository::new();
        let instructor = user(&repo, "ines", Role::Instructor).await;
        let student = user(&repo, "tomas", Role::Student).await;
        let dup = UserDraft::with_role("tomas", "", Role::Student)
            .validate(fixed_now())
            .unwrap();
        assert!(matches!(repo.insert_user(dup).await, Err(StorageError::Conflict)));

        let c = course(&repo, "Rust", instructor.id).await;
        let new = NewEnrollment::new(student.id, c.id, fixed_now());
        repo.insert_enrollment(new.clone()).await.unwrap();
        assert!(matches!(
            repo.insert_enrollment(new).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn deleting_course_cascades() {
        let repo = InMemoryRepository::new();
        let instructor = user(&repo, "ines", Role::Instructor).await;
        let student = user(&repo, "tomas", Role::Student).await;
        let c = course(&repo, "Rust", instructor.id).await;
        let e = repo
            .insert_enrollment(NewEnrollment::new(student.id, c.id, fixed_now()))
            .await
            .unwrap();
        repo.insert_payment(NewPayment {
            enrollment_id: Some(e.id),
            payer_id: Some(student.id),
            course_id: c.id,
            amount: Money::from_cents(1000),
            paid_at: fixed_now(),
            transaction_id: None,
            payment_method: None,
            status: PaymentStatus::Completed,
        })
        .await
        .unwrap();

        repo.delete_course(c.id).await.unwrap();
        assert!(repo.enrollments_for_student(student.id).await.unwrap().is_empty());
        assert!(repo.payments_by_payer(student.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_course(c.id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn deleting_user_nulls_sender_and_keeps_progress_elsewhere() {
        let repo = InMemoryRepository::new();
        let instructor = user(&repo, "ines", Role::Instructor).await;
        let student = user(&repo, "tomas", Role::Student).await;
        let other = user(&repo, "lea", Role::Student).await;
        let c = course(&repo, "Rust", instructor.id).await;
        let mut e = repo
            .insert_enrollment(NewEnrollment::new(other.id, c.id, fixed_now()))
            .await
            .unwrap();
        e.record_progress(Progress::COMPLETE);
        repo.update_enrollment(&e).await.unwrap();

        let note = repo
            .insert_notification(NewNotification {
                recipient_id: student.id,
                sender_id: Some(instructor.id),
                notification_type: NotificationType::General,
                message: "hi".into(),
                link: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();

        repo.delete_user(instructor.id).await.unwrap();
        let note = repo.get_notification(note.id).await.unwrap().unwrap();
        assert_eq!(note.sender_id, None);
        let c = repo.get_course(c.id).await.unwrap().unwrap();
        assert!(c.instructors.is_empty());
        assert_eq!(
            repo.find_enrollment(other.id, c.id).await.unwrap().unwrap().progress,
            Progress::COMPLETE
        );
    }

    #[tokio::test]
    async fn resubmitting_keeps_id_and_clears_grade() {
        let repo = InMemoryRepository::new();
        let instructor = user(&repo, "ines", Role::Instructor).await;
        let student = user(&repo, "tomas", Role::Student).await;
        let c = course(&repo, "Rust", instructor.id).await;
        let a = repo
            .insert_assessment(
                lms_core::model::AssessmentDraft {
                    course_id: c.id,
                    title: "Quiz".into(),
                    description: None,
                    assessment_type: lms_core::model::AssessmentType::Quiz,
                    due_date: fixed_now(),
                    max_score: 10,
                }
                .validate(fixed_now())
                .unwrap(),
            )
            .await
            .unwrap();
        let new = NewSubmission {
            assessment_id: a.id,
            student_id: student.id,
            content: Some("v1".into()),
            submitted_at: fixed_now(),
        };
        let mut first = repo.upsert_submission(new.clone()).await.unwrap();
        first.is_graded = true;
        repo.update_submission(&first).await.unwrap();

        let second = repo
            .upsert_submission(NewSubmission {
                content: Some("v2".into()),
                ..new
            })
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert!(!second.is_graded);
        assert_eq!(second.content.as_deref(), Some("v2"));
    }
}
