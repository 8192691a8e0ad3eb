use std::sync::Arc;

use serde::Serialize;
use tera::Context;

use lms_core::Clock;
use lms_core::model::{
    Assessment, Course, NewNotification, NotificationId, NotificationType, Submission, User, UserId,
};
use lms_core::routes::Route;
use storage::repository::NotificationRepository;

use crate::config::LmsConfig;
use crate::error::MailError;
use crate::notifications::mail::{Mailer, OutgoingMail};
use crate::notifications::templates::{ASSESSMENT_GRADED, EmailTemplates, NEW_ASSIGNMENT};

/// The events that notify a student.
#[derive(Debug, Clone, Copy)]
pub enum Notice<'a> {
    NewAssignment {
        course: &'a Course,
        assessment: &'a Assessment,
    },
    AssessmentGraded {
        course: &'a Course,
        assessment: &'a Assessment,
        submission: &'a Submission,
    },
}

impl Notice<'_> {
    #[must_use]
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Notice::NewAssignment { .. } => NotificationType::NewAssignment,
            Notice::AssessmentGraded { .. } => NotificationType::AssessmentResult,
        }
    }

    /// Email subject, also stored as the notification message.
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Notice::NewAssignment { course, assessment } => {
                format!("New Assignment: {} for {}", assessment.title, course.title)
            }
            Notice::AssessmentGraded {
                assessment,
                submission,
                ..
            } => format!(
                "Assessment Graded: {} - {}/{}",
                assessment.title,
                score_label(submission),
                assessment.max_score
            ),
        }
    }

    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Notice::NewAssignment { course, .. } => Route::CourseDetail(course.id),
            Notice::AssessmentGraded { submission, .. } => Route::SubmissionDetail(submission.id),
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Notice::NewAssignment { .. } => NEW_ASSIGNMENT,
            Notice::AssessmentGraded { .. } => ASSESSMENT_GRADED,
        }
    }

    fn context(&self, recipient: &User, link: &str) -> Context {
        let mut context = Context::new();
        context.insert("student_name", recipient.display_name());
        match self {
            Notice::NewAssignment { course, assessment } => {
                context.insert("course_title", &course.title);
                context.insert("assignment_title", &assessment.title);
                context.insert(
                    "due_date",
                    &assessment.due_date.format("%Y-%m-%d %H:%M UTC").to_string(),
                );
                context.insert("assignment_link", link);
            }
            Notice::AssessmentGraded {
                course,
                assessment,
                submission,
            } => {
                context.insert("course_title", &course.title);
                context.insert("assignment_title", &assessment.title);
                context.insert("score", &score_label(submission));
                context.insert("max_score", &assessment.max_score);
                context.insert("feedback", submission.feedback.as_deref().unwrap_or(""));
                context.insert("submission_link", link);
            }
        }
        context
    }
}

fn score_label(submission: &Submission) -> String {
    submission
        .score
        .map_or_else(|| "n/a".to_owned(), |score| score.to_string())
}

/// Outcome of one side effect of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum Attempt {
    Succeeded,
    Failed(String),
}

impl Attempt {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Attempt::Succeeded)
    }
}

/// What happened when notifying one recipient. Failures are reported here,
/// never returned as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub recipient_id: UserId,
    pub email: Attempt,
    pub notification: Attempt,
    pub notification_id: Option<NotificationId>,
}

/// Renders, mails and records notifications for domain events.
#[derive(Clone)]
pub struct NotificationDispatcher {
    clock: Clock,
    notifications: Arc<dyn NotificationRepository>,
    mailer: Arc<dyn Mailer>,
    templates: Arc<EmailTemplates>,
    site_url: String,
    from_address: String,
}

impl NotificationDispatcher {
    /// # Errors
    ///
    /// Returns `MailError::Template` if the email templates fail to load.
    pub fn new(
        clock: Clock,
        notifications: Arc<dyn NotificationRepository>,
        mailer: Arc<dyn Mailer>,
        config: &LmsConfig,
    ) -> Result<Self, MailError> {
        Ok(Self {
            clock,
            notifications,
            mailer,
            templates: Arc::new(EmailTemplates::new()?),
            site_url: config.site_url.clone(),
            from_address: config.mail.from_address.clone(),
        })
    }

    /// Sends the email and records the notification. Each step runs even if
    /// the other fails.
    pub async fn dispatch(
        &self,
        recipient: &User,
        sender: Option<UserId>,
        notice: Notice<'_>,
    ) -> DispatchReport {
        let subject = notice.subject();
        let link = notice.route().absolute(&self.site_url);

        let email = match self.send_email(recipient, &subject, &link, &notice).await {
            Ok(()) => Attempt::Succeeded,
            Err(err) => {
                tracing::warn!(
                    recipient = %recipient.id,
                    kind = notice.notification_type().as_str(),
                    error = %err,
                    "failed to send notification email"
                );
                Attempt::Failed(err.to_string())
            }
        };

        let record = NewNotification {
            recipient_id: recipient.id,
            sender_id: sender,
            notification_type: notice.notification_type(),
            message: subject,
            link: Some(link),
            created_at: self.clock.now(),
        };
        let (notification, notification_id) =
            match self.notifications.insert_notification(record).await {
                Ok(saved) => (Attempt::Succeeded, Some(saved.id)),
                Err(err) => {
                    tracing::warn!(
                        recipient = %recipient.id,
                        error = %err,
                        "failed to record notification"
                    );
                    (Attempt::Failed(err.to_string()), None)
                }
            };

        DispatchReport {
            recipient_id: recipient.id,
            email,
            notification,
            notification_id,
        }
    }

    async fn send_email(
        &self,
        recipient: &User,
        subject: &str,
        link: &str,
        notice: &Notice<'_>,
    ) -> Result<(), MailError> {
        let body = self
            .templates
            .render(notice.template(), &notice.context(recipient, link))?;
        let mail = OutgoingMail {
            from: self.from_address.clone(),
            to: recipient.email.clone(),
            subject: subject.to_owned(),
            html: body.html,
            text: body.text,
        };
        self.mailer.send(&mail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use lms_core::model::{
        AssessmentDraft, AssessmentId, AssessmentType, CourseDraft, CourseId, GradeInput,
        NewSubmission, SubmissionId, UserDraft,
    };
    use lms_core::roles::Role;
    use lms_core::time::{fixed_clock, fixed_now};
    use std::sync::Mutex;
    use storage::Storage;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn course() -> Course {
        CourseDraft::new("Rust 101", "Ownership")
            .validate(fixed_now())
            .unwrap()
            .assign_id(CourseId::new(1))
    }

    fn assessment() -> Assessment {
        AssessmentDraft {
            course_id: CourseId::new(1),
            title: "Quiz 1".into(),
            description: None,
            assessment_type: AssessmentType::Quiz,
            due_date: fixed_now() + Duration::days(3),
            max_score: 10,
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(AssessmentId::new(2))
    }

    #[test]
    fn subjects_and_links_follow_event() {
        let course = course();
        let assessment = assessment();
        let notice = Notice::NewAssignment {
            course: &course,
            assessment: &assessment,
        };
        assert_eq!(notice.subject(), "New Assignment: Quiz 1 for Rust 101");
        assert_eq!(notice.route(), Route::CourseDetail(CourseId::new(1)));

        let mut submission = NewSubmission {
            assessment_id: assessment.id,
            student_id: UserId::new(5),
            content: None,
            submitted_at: fixed_now(),
        }
        .assign_id(SubmissionId::new(7));
        let graded = Notice::AssessmentGraded {
            course: &course,
            assessment: &assessment,
            submission: &submission,
        };
        assert_eq!(graded.subject(), "Assessment Graded: Quiz 1 - n/a/10");

        submission
            .apply_grade(GradeInput::from_raw("9.5", None, true).unwrap(), 10)
            .unwrap();
        let graded = Notice::AssessmentGraded {
            course: &course,
            assessment: &assessment,
            submission: &submission,
        };
        assert_eq!(graded.subject(), "Assessment Graded: Quiz 1 - 9.50/10");
        assert_eq!(graded.notification_type(), NotificationType::AssessmentResult);
    }

    #[tokio::test]
    async fn dispatch_mails_and_records() {
        let storage = Storage::in_memory();
        let student = storage
            .users
            .insert_user(
                UserDraft::with_role("ada", "ada@example.com", Role::Student)
                    .validate(fixed_now())
                    .unwrap(),
            )
            .await
            .unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = NotificationDispatcher::new(
            fixed_clock(),
            Arc::clone(&storage.notifications),
            mailer.clone(),
            &LmsConfig::default(),
        )
        .unwrap();

        let course = course();
        let assessment = assessment();
        let report = dispatcher
            .dispatch(
                &student,
                None,
                Notice::NewAssignment {
                    course: &course,
                    assessment: &assessment,
                },
            )
            .await;

        assert!(report.email.succeeded());
        assert!(report.notification.succeeded());

        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert!(sent[0].text.contains("http://localhost:8000/courses/1/"));

        let stored = storage
            .notifications
            .get_notification(report.notification_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.message, "New Assignment: Quiz 1 for Rust 101");
        assert_eq!(stored.link.as_deref(), Some("http://localhost:8000/courses/1/"));
        assert!(!stored.is_read);
    }
}
