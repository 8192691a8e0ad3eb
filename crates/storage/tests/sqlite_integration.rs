use chrono::{Duration, NaiveDate};
use lms_core::model::{
    AssessmentDraft, AssessmentType, CourseDraft, LessonDraft, Money, ModuleDraft, NewEnrollment,
    NewNotification, NewPayment, NewSponsorship, NewSubmission, NotificationType, PaymentStatus,
    Progress, Score, SponsorProfile, UserDraft,
};
use lms_core::roles::Role;
use lms_core::time::fixed_now;
use storage::StorageError;
use storage::repository::{
    AssessmentRepository, CourseRepository, EnrollmentRepository, NotificationRepository,
    PaymentRepository, SponsorshipRepository, SubmissionRepository, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn user(repo: &SqliteRepository, name: &str, role: Role) -> lms_core::model::User {
    let draft = UserDraft::with_role(name, format!("{name}@example.com"), role);
    repo.insert_user(draft.validate(fixed_now()).unwrap())
        .await
        .unwrap()
}

fn payment(
    course: lms_core::model::CourseId,
    payer: lms_core::model::UserId,
    cents: u64,
    status: PaymentStatus,
) -> NewPayment {
    NewPayment {
        enrollment_id: None,
        payer_id: Some(payer),
        course_id: course,
        amount: Money::from_cents(cents),
        paid_at: fixed_now(),
        transaction_id: None,
        payment_method: Some("card".into()),
        status,
    }
}

#[tokio::test]
async fn sqlite_roundtrips_users_and_courses() {
    let repo = connect("memdb_roundtrip").await;
    let mut instructor = user(&repo, "ines", Role::Instructor).await;
    instructor.profile.bio = Some("Systems".into());
    instructor.profile.date_of_birth = NaiveDate::from_ymd_opt(1990, 4, 2);
    repo.update_user(&instructor).await.unwrap();

    let fetched = repo.get_user(instructor.id).await.unwrap().unwrap();
    assert_eq!(fetched, instructor);
    assert!(fetched.has_role(Role::Instructor));

    let mut draft = CourseDraft::new("Rust", "Ownership");
    draft.instructors.insert(instructor.id);
    draft.price = "49.99".parse().unwrap();
    let course = repo
        .insert_course(draft.validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let stored = repo.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(stored, course);
    assert_eq!(stored.price.to_string(), "49.99");
    assert_eq!(repo.courses_taught_by(instructor.id).await.unwrap().len(), 1);

    let dup = CourseDraft::new("Rust", "Again").validate(fixed_now()).unwrap();
    assert!(matches!(repo.insert_course(dup).await, Err(StorageError::Conflict)));
}

#[tokio::test]
async fn sqlite_orders_modules_and_rejects_duplicate_order() {
    let repo = connect("memdb_modules").await;
    let course = repo
        .insert_course(CourseDraft::new("Go", "Channels").validate(fixed_now()).unwrap())
        .await
        .unwrap();

    for order in [2, 1] {
        repo.insert_module(
            ModuleDraft {
                course_id: course.id,
                title: format!("Part {order}"),
                description: None,
                order,
            }
            .validate(fixed_now())
            .unwrap(),
        )
        .await
        .unwrap();
    }
    let modules = repo.modules_for_course(course.id).await.unwrap();
    assert_eq!(modules.iter().map(|m| m.order).collect::<Vec<_>>(), vec![1, 2]);

    let clash = ModuleDraft {
        course_id: course.id,
        title: "Again".into(),
        description: None,
        order: 1,
    }
    .validate(fixed_now())
    .unwrap();
    assert!(matches!(repo.insert_module(clash).await, Err(StorageError::Conflict)));

    let lesson = repo
        .insert_lesson(
            LessonDraft {
                module_id: modules[0].id,
                title: "Intro".into(),
                content: "Hello".into(),
                video_url: Some("https://videos.example/1".into()),
                order: 1,
            }
            .validate(fixed_now())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(repo.lessons_for_module(modules[0].id).await.unwrap(), vec![lesson]);
}

#[tokio::test]
async fn sqlite_course_delete_cascades() {
    let repo = connect("memdb_course_cascade").await;
    let student = user(&repo, "tomas", Role::Student).await;
    let course = repo
        .insert_course(CourseDraft::new("SQL", "Joins").validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let module = repo
        .insert_module(
            ModuleDraft {
                course_id: course.id,
                title: "Basics".into(),
                description: None,
                order: 1,
            }
            .validate(fixed_now())
            .unwrap(),
        )
        .await
        .unwrap();
    let enrollment = repo
        .insert_enrollment(NewEnrollment::new(student.id, course.id, fixed_now()))
        .await
        .unwrap();
    let assessment = repo
        .insert_assessment(
            AssessmentDraft {
                course_id: course.id,
                title: "Quiz".into(),
                description: None,
                assessment_type: AssessmentType::Quiz,
                due_date: fixed_now() + Duration::days(3),
                max_score: 10,
            }
            .validate(fixed_now())
            .unwrap(),
        )
        .await
        .unwrap();
    let submission = repo
        .upsert_submission(NewSubmission {
            assessment_id: assessment.id,
            student_id: student.id,
            content: Some("42".into()),
            submitted_at: fixed_now(),
        })
        .await
        .unwrap();
    let mut p = payment(course.id, student.id, 1_000, PaymentStatus::Completed);
    p.enrollment_id = Some(enrollment.id);
    let paid = repo.insert_payment(p).await.unwrap();

    repo.delete_course(course.id).await.unwrap();

    assert!(repo.get_module(module.id).await.unwrap().is_none());
    assert!(repo.get_enrollment(enrollment.id).await.unwrap().is_none());
    assert!(repo.get_assessment(assessment.id).await.unwrap().is_none());
    assert!(repo.get_submission(submission.id).await.unwrap().is_none());
    assert!(repo.get_payment(paid.id).await.unwrap().is_none());
    assert!(repo.get_user(student.id).await.unwrap().is_some());
    assert!(matches!(
        repo.delete_course(course.id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_user_delete_nulls_payer_and_sender() {
    let repo = connect("memdb_user_delete").await;
    let sponsor = user(&repo, "sofia", Role::Sponsor).await;
    let student = user(&repo, "tomas", Role::Student).await;
    let course = repo
        .insert_course(CourseDraft::new("Art", "Colour").validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let paid = repo
        .insert_payment(payment(course.id, sponsor.id, 2_500, PaymentStatus::Completed))
        .await
        .unwrap();
    let note = repo
        .insert_notification(NewNotification {
            recipient_id: student.id,
            sender_id: Some(sponsor.id),
            notification_type: NotificationType::General,
            message: "Welcome".into(),
            link: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    repo.insert_sponsorship(
        NewSponsorship::new(sponsor.id, student.id, Money::from_cents(10_000), start).unwrap(),
    )
    .await
    .unwrap();

    repo.delete_user(sponsor.id).await.unwrap();

    let paid = repo.get_payment(paid.id).await.unwrap().unwrap();
    assert_eq!(paid.payer_id, None);
    let note = repo.get_notification(note.id).await.unwrap().unwrap();
    assert_eq!(note.sender_id, None);
    assert!(repo.sponsorships_for_sponsor(sponsor.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_sums_only_completed_payments_for_payer() {
    let repo = connect("memdb_payment_sum").await;
    let sponsor = user(&repo, "sofia", Role::Sponsor).await;
    let other = user(&repo, "omar", Role::Sponsor).await;
    let course = repo
        .insert_course(CourseDraft::new("Maths", "Sets").validate(fixed_now()).unwrap())
        .await
        .unwrap();
    for (payer, cents, status) in [
        (sponsor.id, 1_050, PaymentStatus::Completed),
        (sponsor.id, 2_000, PaymentStatus::Completed),
        (sponsor.id, 9_999, PaymentStatus::Pending),
        (other.id, 7_000, PaymentStatus::Completed),
    ] {
        repo.insert_payment(payment(course.id, payer, cents, status))
            .await
            .unwrap();
    }
    assert_eq!(
        repo.completed_total_for_payer(sponsor.id).await.unwrap(),
        Money::from_cents(3_050)
    );

    let mut dup = payment(course.id, sponsor.id, 1, PaymentStatus::Failed);
    dup.transaction_id = Some("tx-1".into());
    repo.insert_payment(dup.clone()).await.unwrap();
    assert!(matches!(repo.insert_payment(dup).await, Err(StorageError::Conflict)));
}

#[tokio::test]
async fn sqlite_sponsorships_profiles_and_progress() {
    let repo = connect("memdb_sponsorships").await;
    let sponsor = user(&repo, "sofia", Role::Sponsor).await;
    let student = user(&repo, "tomas", Role::Student).await;
    let course = repo
        .insert_course(CourseDraft::new("Chem", "Atoms").validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let older = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
    let newer = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    for start in [older, newer] {
        repo.insert_sponsorship(
            NewSponsorship::new(sponsor.id, student.id, Money::from_cents(500), start).unwrap(),
        )
        .await
        .unwrap();
    }
    let dup = NewSponsorship::new(sponsor.id, student.id, Money::ZERO, newer).unwrap();
    assert!(matches!(
        repo.insert_sponsorship(dup).await,
        Err(StorageError::Conflict)
    ));
    let listed = repo.sponsorships_for_sponsor(sponsor.id).await.unwrap();
    assert_eq!(listed[0].start_date, newer);

    let mut profile = SponsorProfile::new(sponsor.id);
    profile.organization_name = Some("Acme Trust".into());
    profile.total_funds_provided = Money::from_cents(100_000);
    repo.upsert_profile(&profile).await.unwrap();
    assert_eq!(repo.get_profile(sponsor.id).await.unwrap(), Some(profile));

    let mut enrollment = repo
        .insert_enrollment(NewEnrollment::new(student.id, course.id, fixed_now()))
        .await
        .unwrap();
    enrollment.record_progress("75".parse::<Progress>().unwrap());
    enrollment.mark_completed(fixed_now());
    repo.update_enrollment(&enrollment).await.unwrap();
    let stored = repo.find_enrollment(student.id, course.id).await.unwrap().unwrap();
    assert_eq!(stored, enrollment);
}

#[tokio::test]
async fn sqlite_resubmission_resets_grade_and_notifications_mark_read() {
    let repo = connect("memdb_submissions").await;
    let student = user(&repo, "tomas", Role::Student).await;
    let course = repo
        .insert_course(CourseDraft::new("Bio", "Cells").validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let assessment = repo
        .insert_assessment(
            AssessmentDraft {
                course_id: course.id,
                title: "Lab".into(),
                description: None,
                assessment_type: AssessmentType::Project,
                due_date: fixed_now(),
                max_score: 20,
            }
            .validate(fixed_now())
            .unwrap(),
        )
        .await
        .unwrap();
    let new = NewSubmission {
        assessment_id: assessment.id,
        student_id: student.id,
        content: Some("draft".into()),
        submitted_at: fixed_now(),
    };
    let mut first = repo.upsert_submission(new.clone()).await.unwrap();
    first.score = Some(Score::whole(18));
    first.is_graded = true;
    repo.update_submission(&first).await.unwrap();
    assert_eq!(
        repo.get_submission(first.id).await.unwrap().unwrap().score,
        Some(Score::whole(18))
    );

    let again = repo
        .upsert_submission(NewSubmission {
            content: Some("final".into()),
            submitted_at: fixed_now() + Duration::hours(1),
            ..new
        })
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    let stored = repo.get_submission(first.id).await.unwrap().unwrap();
    assert!(!stored.is_graded);
    assert_eq!(stored.score, None);

    for minutes in 0..3 {
        repo.insert_notification(NewNotification {
            recipient_id: student.id,
            sender_id: None,
            notification_type: NotificationType::AssessmentResult,
            message: format!("note {minutes}"),
            link: None,
            created_at: fixed_now() + Duration::minutes(minutes),
        })
        .await
        .unwrap();
    }
    let unread = repo.unread_for(student.id, 2).await.unwrap();
    assert_eq!(unread.len(), 2);
    assert_eq!(unread[0].message, "note 2");
    assert_eq!(repo.unread_count(student.id).await.unwrap(), 3);

    repo.mark_read(unread[0].id).await.unwrap();
    assert_eq!(repo.unread_count(student.id).await.unwrap(), 2);
    assert_eq!(repo.mark_all_read(student.id).await.unwrap(), 2);
    assert_eq!(repo.unread_count(student.id).await.unwrap(), 0);
}
