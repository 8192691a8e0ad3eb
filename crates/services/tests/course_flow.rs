use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use lms_core::model::{
    AssessmentDraft, AssessmentType, CourseDraft, CourseId, GradeError, GradeInput, ModuleDraft,
    User, UserDraft,
};
use lms_core::roles::Role;
use lms_core::routes::Route;
use lms_core::time::{fixed_clock, fixed_now};
use services::{
    AppServices, AssessmentServiceError, CourseListQuery, LmsConfig, MailError, Mailer,
    OutgoingMail, RequestMethod,
};
use storage::Storage;

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::NoRecipient)
    }
}

async fn user(storage: &Storage, username: &str, role: Role) -> User {
    storage
        .users
        .insert_user(
            UserDraft::with_role(username, format!("{username}@example.com"), role)
                .validate(fixed_now())
                .expect("valid user"),
        )
        .await
        .expect("insert user")
}

fn app(storage: &Storage) -> AppServices {
    AppServices::from_storage(
        storage.clone(),
        &LmsConfig::default(),
        fixed_clock(),
        Arc::new(FailingMailer),
    )
    .expect("services")
}

fn quiz(course_id: CourseId, days: i64) -> AssessmentDraft {
    AssessmentDraft {
        course_id,
        title: format!("Quiz {days}"),
        description: None,
        assessment_type: AssessmentType::Quiz,
        due_date: fixed_now() + Duration::days(days),
        max_score: 10,
    }
}

#[tokio::test]
async fn publish_submit_and_grade() {
    let storage = Storage::in_memory();
    let app = app(&storage);
    let instructor = user(&storage, "grace", Role::Instructor).await;
    let stranger = user(&storage, "linus", Role::Instructor).await;
    let mut students = Vec::new();
    for name in ["ada", "alan", "barbara"] {
        students.push(user(&storage, name, Role::Student).await);
    }
    let outsider = user(&storage, "edsger", Role::Student).await;

    let course = app
        .courses()
        .create(&instructor, CourseDraft::new("Rust 101", "Ownership"))
        .await
        .expect("create")
        .done()
        .expect("instructor may create");

    for student in &students {
        let routed = app.courses().enroll(student, course.id).await.expect("enroll");
        assert!(routed.done().is_some());
    }
    let again = app.courses().enroll(&students[0], course.id).await.expect("enroll");
    assert_eq!(again.redirect(), Some(Route::CourseDetail(course.id)));

    let denied = app
        .assessments()
        .create(&stranger, quiz(course.id, 3))
        .await
        .expect("create");
    assert_eq!(denied.redirect(), Some(Route::CourseDetail(course.id)));

    let created = app
        .assessments()
        .create(&instructor, quiz(course.id, 3))
        .await
        .expect("create")
        .done()
        .expect("instructor may publish");
    assert_eq!(created.dispatches.len(), 3);
    assert!(created.dispatches.iter().all(|d| !d.email.succeeded()));
    assert!(created.dispatches.iter().all(|d| d.notification.succeeded()));

    let summary = app
        .notifications()
        .unread_summary(&students[1])
        .await
        .expect("summary");
    assert_eq!(summary.unread_notifications_count, 1);
    assert_eq!(
        summary.unread_notifications[0].message,
        "New Assignment: Quiz 3 for Rust 101"
    );

    let blocked = app
        .assessments()
        .submit(&outsider, created.assessment.id, Some("answer".into()))
        .await
        .expect("submit");
    assert_eq!(blocked.redirect(), Some(Route::CourseDetail(course.id)));

    let submission = app
        .assessments()
        .submit(&students[0], created.assessment.id, Some("42".into()))
        .await
        .expect("submit")
        .done()
        .expect("enrolled student may submit");

    let too_high = GradeInput::from_raw("10.01", None, true).expect("score");
    let err = app
        .assessments()
        .grade(&instructor, submission.id, too_high)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssessmentServiceError::Grade(GradeError::ScoreExceedsMax { max: 10 })
    ));
    assert_eq!(err.to_string(), "Score cannot exceed maximum score of 10.");

    let denied = app
        .assessments()
        .grade(
            &stranger,
            submission.id,
            GradeInput::from_raw("5", None, true).expect("score"),
        )
        .await
        .expect("grade");
    assert_eq!(denied.redirect(), Some(Route::InstructorDashboard));

    let graded = app
        .assessments()
        .grade(
            &instructor,
            submission.id,
            GradeInput::from_raw("10", Some("Perfect".into()), true).expect("score"),
        )
        .await
        .expect("grade")
        .done()
        .expect("instructor may grade");
    assert!(graded.submission.is_graded);
    assert!(graded.dispatch.notification.succeeded());

    let notes = app.notifications().list(&students[0]).await.expect("list");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].message, "Assessment Graded: Quiz 3 - 10.00/10");
    assert_eq!(
        notes[0].link.as_deref(),
        Some(format!("http://localhost:8000/submissions/{}/", submission.id).as_str())
    );
    assert!(notes.iter().all(|n| n.is_read));

    let response = app
        .notifications()
        .mark_as_read(&students[1], RequestMethod::Get, notes[0].id)
        .await
        .expect("mark");
    assert!(!response.success);

    let own = app
        .assessments()
        .submission_detail(&students[0], submission.id)
        .await
        .expect("detail");
    assert!(own.done().is_some());
    let peer = app
        .assessments()
        .submission_detail(&students[1], submission.id)
        .await
        .expect("detail");
    assert_eq!(peer.redirect(), Some(Route::StudentDashboard));
    let other_instructor = app
        .assessments()
        .submission_detail(&stranger, submission.id)
        .await
        .expect("detail");
    assert_eq!(other_instructor.redirect(), Some(Route::InstructorDashboard));
}

#[tokio::test]
async fn catalogue_detail_and_delete() {
    let storage = Storage::in_memory();
    let app = app(&storage);
    let instructor = user(&storage, "grace", Role::Instructor).await;
    let stranger = user(&storage, "linus", Role::Instructor).await;
    let student = user(&storage, "ada", Role::Student).await;

    let mut first = None;
    for n in 0..12 {
        let mut draft = CourseDraft::new(format!("Course {n:02}"), "Topics");
        draft.is_active = n != 11;
        let course = app
            .courses()
            .create(&instructor, draft)
            .await
            .expect("create")
            .done()
            .expect("created");
        if first.is_none() {
            first = Some(course);
        }
    }
    let first = first.expect("course");

    let page_two = app
        .courses()
        .list(&CourseListQuery::from_raw(None, Some("all"), None, Some("2")))
        .await
        .expect("list");
    assert_eq!(page_two.courses.total_items, 11);
    assert_eq!(page_two.courses.num_pages, 2);
    assert_eq!(page_two.courses.items.len(), 2);
    assert_eq!(page_two.courses.items[1].title, "Course 10");

    let module = app
        .courses()
        .add_module(
            &instructor,
            ModuleDraft {
                course_id: first.id,
                title: "Basics".into(),
                description: None,
                order: 1,
            },
        )
        .await
        .expect("module")
        .done()
        .expect("instructor may author");

    let anonymous = app.courses().detail(None, first.id).await.expect("detail");
    assert!(!anonymous.is_enrolled);
    assert_eq!(anonymous.modules[0].module.id, module.id);
    let as_instructor = app.courses().detail(Some(&stranger), first.id).await.expect("detail");
    assert!(as_instructor.is_enrolled);
    app.courses().enroll(&student, first.id).await.expect("enroll");
    let as_student = app.courses().detail(Some(&student), first.id).await.expect("detail");
    assert!(as_student.is_enrolled);

    let denied = app.courses().delete(&stranger, first.id).await.expect("delete");
    assert_eq!(denied.redirect(), Some(Route::CourseList));
    let denied = app.courses().delete(&student, first.id).await.expect("delete");
    assert_eq!(denied.redirect(), Some(Route::Login));

    app.courses()
        .delete(&instructor, first.id)
        .await
        .expect("delete")
        .done()
        .expect("instructor may delete");
    assert!(storage.courses.get_course(first.id).await.expect("get").is_none());
    assert!(storage.courses.modules_for_course(first.id).await.expect("modules").is_empty());
    assert!(
        storage
            .enrollments
            .find_enrollment(student.id, first.id)
            .await
            .expect("find")
            .is_none()
    );
}

#[tokio::test]
async fn dashboards_summarise_activity() {
    let storage = Storage::in_memory();
    let app = app(&storage);
    let instructor = user(&storage, "grace", Role::Instructor).await;
    let ada = user(&storage, "ada", Role::Student).await;
    let alan = user(&storage, "alan", Role::Student).await;
    let admin = user(&storage, "root", Role::Admin).await;

    let course = app
        .courses()
        .create(&instructor, CourseDraft::new("Rust 101", "Ownership"))
        .await
        .expect("create")
        .done()
        .expect("created");
    for student in [&ada, &alan] {
        app.courses().enroll(student, course.id).await.expect("enroll");
    }
    let past = app
        .assessments()
        .create(&instructor, quiz(course.id, -1))
        .await
        .expect("create")
        .done()
        .expect("published");
    for days in [9, 2, 5, 7, 3, 4] {
        app.assessments()
            .create(&instructor, quiz(course.id, days))
            .await
            .expect("create");
    }
    app.assessments()
        .submit(&ada, past.assessment.id, Some("late".into()))
        .await
        .expect("submit");

    let student = app
        .dashboards()
        .student(&ada)
        .await
        .expect("student")
        .done()
        .expect("student may view");
    assert_eq!(student.enrollments.len(), 1);
    let titles: Vec<_> = student
        .upcoming_assessments
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Quiz 2", "Quiz 3", "Quiz 4", "Quiz 5", "Quiz 7"]);

    let overview = app
        .dashboards()
        .instructor(&instructor)
        .await
        .expect("instructor")
        .done()
        .expect("instructor may view");
    assert_eq!(overview.courses_taught[0].total_students, 2);
    assert_eq!(overview.total_active_courses, 1);
    assert_eq!(overview.total_students_across_courses, 2);
    assert_eq!(overview.pending_submissions.len(), 1);

    let denied = app.dashboards().admin(&instructor).await.expect("admin");
    assert_eq!(denied.redirect(), Some(Route::Login));
    let totals = app
        .dashboards()
        .admin(&admin)
        .await
        .expect("admin")
        .done()
        .expect("admin may view");
    assert_eq!(totals.total_users, 4);
    assert_eq!(totals.total_students, 2);
    assert_eq!(totals.total_instructors, 1);
    assert_eq!(totals.total_admins, 1);
    assert_eq!(totals.total_enrollments, 2);
    assert_eq!(totals.average_completion_rate.to_string(), "0.00");

    assert_eq!(app.dashboards().redirect(Some(&ada)), Route::StudentDashboard);
    assert_eq!(app.dashboards().redirect(None), Route::Login);
}
