//! Demo data for local development.

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Serialize;

use lms_core::model::{
    AssessmentDraft, AssessmentType, CourseDraft, Difficulty, LessonDraft, Money, ModuleDraft,
    NewPayment, NewSponsorship, PaymentStatus, Progress, SponsorProfile, User, UserDraft,
};
use lms_core::roles::Role;
use services::{AppServices, Clock, Routed};

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub skipped: bool,
    pub users: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub sponsorships: usize,
}

struct Student {
    username: &'static str,
    first_name: &'static str,
    /// (course index, progress, completed)
    enrollments: &'static [(usize, &'static str, bool)],
}

const STUDENTS: &[Student] = &[
    Student {
        username: "alice",
        first_name: "Alice",
        enrollments: &[(0, "80", true)],
    },
    Student {
        username: "bob",
        first_name: "Bob",
        enrollments: &[(1, "30", false), (2, "60", false)],
    },
    Student {
        username: "carol",
        first_name: "Carol",
        enrollments: &[(0, "12.5", false)],
    },
];

const COURSES: &[(&str, &str, Difficulty)] = &[
    ("Rust Fundamentals", "Ownership, borrowing and lifetimes.", Difficulty::Beginner),
    ("Async Rust", "Futures, executors and tokio.", Difficulty::Intermediate),
    ("Database Internals", "Storage engines and query planning.", Difficulty::Advanced),
];

fn done<T>(routed: Routed<T>, what: &str) -> Result<T> {
    routed
        .done()
        .with_context(|| format!("seed user is not allowed to {what}"))
}

async fn user(app: &AppServices, clock: Clock, draft: UserDraft) -> Result<User> {
    let user = app
        .storage()
        .users
        .insert_user(draft.validate(clock.now())?)
        .await?;
    Ok(user)
}

fn draft(username: &str, first_name: &str, role: Role) -> UserDraft {
    let mut draft = UserDraft::with_role(username, format!("{username}@example.com"), role);
    draft.first_name = first_name.to_owned();
    draft
}

/// Populates an empty database. Does nothing when the admin account exists.
pub async fn run(app: &AppServices, clock: Clock) -> Result<SeedSummary> {
    let storage = app.storage();
    if storage.users.find_user_by_username("admin").await?.is_some() {
        tracing::info!("demo data already present; skipping seed");
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    let mut summary = SeedSummary::default();

    let mut admin = draft("admin", "Ada", Role::Admin);
    admin.is_superuser = true;
    user(app, clock, admin).await?;
    let instructor = user(app, clock, draft("grace", "Grace", Role::Instructor)).await?;
    let sponsor = user(app, clock, draft("acme", "Acme", Role::Sponsor)).await?;
    summary.users += 3;

    let mut profile = SponsorProfile::new(sponsor.id);
    profile.organization_name = Some("Acme Foundation".into());
    profile.contact_email = Some("grants@acme.example".into());
    storage.sponsorships.upsert_profile(&profile).await?;

    let mut courses = Vec::with_capacity(COURSES.len());
    for (title, description, difficulty) in COURSES {
        let mut course_draft = CourseDraft::new(*title, *description);
        course_draft.difficulty = *difficulty;
        course_draft.price = Money::from_cents(4_900);
        let course = done(
            app.courses().create(&instructor, course_draft).await?,
            "create courses",
        )?;

        let module = done(
            app.courses()
                .add_module(
                    &instructor,
                    ModuleDraft {
                        course_id: course.id,
                        title: "Getting started".into(),
                        description: None,
                        order: 1,
                    },
                )
                .await?,
            "add modules",
        )?;
        done(
            app.courses()
                .add_lesson(
                    &instructor,
                    LessonDraft {
                        module_id: module.id,
                        title: "Welcome".into(),
                        content: format!("Welcome to {title}."),
                        video_url: None,
                        order: 1,
                    },
                )
                .await?,
            "add lessons",
        )?;
        courses.push(course);
    }
    summary.courses = courses.len();

    for (offset, seeded) in STUDENTS.iter().enumerate() {
        let student_draft = draft(seeded.username, seeded.first_name, Role::Student);
        let student = user(app, clock, student_draft).await?;
        summary.users += 1;

        for &(course_index, progress, completed) in seeded.enrollments {
            let course = &courses[course_index];
            let mut enrollment = done(app.courses().enroll(&student, course.id).await?, "enroll")?;
            enrollment.record_progress(progress.parse::<Progress>()?);
            if completed {
                enrollment.mark_completed(clock.now());
            }
            storage.enrollments.update_enrollment(&enrollment).await?;
            summary.enrollments += 1;

            storage
                .payments
                .insert_payment(NewPayment {
                    enrollment_id: Some(enrollment.id),
                    payer_id: Some(sponsor.id),
                    course_id: course.id,
                    amount: course.price,
                    paid_at: clock.now(),
                    transaction_id: Some(format!("seed-{}", enrollment.id)),
                    payment_method: Some("card".into()),
                    status: PaymentStatus::Completed,
                })
                .await?;
        }

        if offset < 2 {
            let days = i64::try_from(offset)? * 30;
            let start = clock.today() - Duration::days(90 - days);
            storage
                .sponsorships
                .insert_sponsorship(
                    NewSponsorship::new(sponsor.id, student.id, Money::from_cents(50_000), start)?
                        .with_notes("Demo sponsorship"),
                )
                .await?;
            summary.sponsorships += 1;
        }
    }

    done(
        app.assessments()
            .create(
                &instructor,
                AssessmentDraft {
                    course_id: courses[0].id,
                    title: "Ownership quiz".into(),
                    description: Some("Ten questions on moves and borrows.".into()),
                    assessment_type: AssessmentType::Quiz,
                    due_date: clock.now() + Duration::days(7),
                    max_score: 10,
                },
            )
            .await?,
        "publish assessments",
    )?;

    tracing::info!(
        users = summary.users,
        courses = summary.courses,
        enrollments = summary.enrollments,
        "seeded demo data"
    );
    Ok(summary)
}
