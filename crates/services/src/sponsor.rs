//! Sponsor dashboard: per-student rollups, headline totals and filtered,
//! paginated student records.
//!
//! Headline totals always cover every sponsorship of the sponsor. Filters and
//! pagination only decide which student records are displayed.

use std::sync::Arc;

use serde::Serialize;

use lms_core::model::{Enrollment, Money, Progress, Sponsorship, User};
use lms_core::pagination::{Page, PageRequest, Paginator};
use lms_core::roles::Role;
use lms_core::routes::Route;
use storage::repository::{
    EnrollmentRepository, PaymentRepository, SponsorshipRepository, StorageError, UserRepository,
};

use crate::error::DashboardError;
use crate::routed::{Routed, require};

pub const SPONSOR_PAGE_SIZE: usize = 10;

/// Lowest overall progress (hundredths) shown under "high progress".
const HIGH_PROGRESS_FROM: u32 = 7_500;
/// Overall progress (hundredths) at which "low progress" stops matching.
const LOW_PROGRESS_BELOW: u32 = 2_500;

//
// ─── FILTERS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
}

impl StatusFilter {
    /// Unrecognised or missing values mean `All`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("completed") => StatusFilter::Completed,
            _ => StatusFilter::All,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
        }
    }

    fn admits(self, rollup: &StudentRollup) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => rollup.has_completed_courses,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressFilter {
    #[default]
    All,
    HighProgress,
    LowProgress,
}

impl ProgressFilter {
    /// Unrecognised or missing values mean `All`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("high_progress") => ProgressFilter::HighProgress,
            Some("low_progress") => ProgressFilter::LowProgress,
            _ => ProgressFilter::All,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressFilter::All => "all",
            ProgressFilter::HighProgress => "high_progress",
            ProgressFilter::LowProgress => "low_progress",
        }
    }

    /// Values in `[25, 75)` match neither `HighProgress` nor `LowProgress`.
    #[must_use]
    pub fn admits(self, value: Progress) -> bool {
        match self {
            ProgressFilter::All => true,
            ProgressFilter::HighProgress => value.hundredths() >= HIGH_PROGRESS_FROM,
            ProgressFilter::LowProgress => value.hundredths() < LOW_PROGRESS_BELOW,
        }
    }
}

/// Dashboard query as it arrives from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SponsorDashboardQuery {
    pub status: StatusFilter,
    pub progress: ProgressFilter,
    pub page: PageRequest,
}

impl Default for SponsorDashboardQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            progress: ProgressFilter::All,
            page: PageRequest::First,
        }
    }
}

impl SponsorDashboardQuery {
    #[must_use]
    pub fn from_raw(status: Option<&str>, progress: Option<&str>, page: Option<&str>) -> Self {
        Self {
            status: StatusFilter::parse(status),
            progress: ProgressFilter::parse(progress),
            page: PageRequest::parse(page),
        }
    }
}

//
// ─── ROLLUPS ───────────────────────────────────────────────────────────────────
//

/// Derived summary of one student's enrollments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentRollup {
    pub has_completed_courses: bool,
    pub has_in_progress_courses: bool,
    /// Highest progress across the enrollments; zero without enrollments.
    pub overall_progress_value: Progress,
}

impl StudentRollup {
    #[must_use]
    pub fn from_enrollments(enrollments: &[Enrollment]) -> Self {
        Self {
            has_completed_courses: enrollments.iter().any(|e| e.is_completed),
            has_in_progress_courses: enrollments.iter().any(|e| !e.is_completed),
            overall_progress_value: enrollments
                .iter()
                .map(|e| e.progress)
                .max()
                .unwrap_or(Progress::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsoredStudent {
    pub student: User,
    pub sponsorship: Sponsorship,
    pub enrollments: Vec<Enrollment>,
    #[serde(flatten)]
    pub rollup: StudentRollup,
}

/// Totals over every sponsorship of the sponsor, ignoring filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorHeadline {
    pub total_students_sponsored: usize,
    pub total_active_sponsorships: usize,
    pub total_funds_provided: Money,
    pub total_funds_utilized: Money,
    pub total_completed_by_sponsored: usize,
    pub total_in_progress_by_sponsored: usize,
    pub total_sponsored_enrollments: usize,
    pub avg_sponsored_student_progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorDashboard {
    pub all_sponsorships: Vec<Sponsorship>,
    pub headline: SponsorHeadline,
    pub sponsored_students: Page<SponsoredStudent>,
    pub status_filter: StatusFilter,
    pub progress_filter: ProgressFilter,
}

/// One sponsorship with the data the dashboard needs about its student.
#[derive(Debug, Clone)]
pub struct SponsorshipRecord {
    pub sponsorship: Sponsorship,
    pub student: User,
    pub enrollments: Vec<Enrollment>,
}

/// Builds the dashboard from already loaded records, in sponsorship order.
#[must_use]
pub fn build_dashboard(
    records: Vec<SponsorshipRecord>,
    funds_utilized: Money,
    query: SponsorDashboardQuery,
) -> SponsorDashboard {
    let mut headline = SponsorHeadline {
        total_students_sponsored: records.len(),
        total_active_sponsorships: 0,
        total_funds_provided: Money::ZERO,
        total_funds_utilized: funds_utilized,
        total_completed_by_sponsored: 0,
        total_in_progress_by_sponsored: 0,
        total_sponsored_enrollments: 0,
        avg_sponsored_student_progress: Progress::ZERO,
    };
    let mut progress_sum: u64 = 0;
    let mut all_sponsorships = Vec::with_capacity(records.len());
    let mut shown = Vec::new();

    for record in records {
        let rollup = StudentRollup::from_enrollments(&record.enrollments);

        if record.sponsorship.is_active {
            headline.total_active_sponsorships += 1;
        }
        headline.total_funds_provided =
            headline.total_funds_provided + record.sponsorship.amount_funded;
        if rollup.has_completed_courses {
            headline.total_completed_by_sponsored += 1;
        }
        if rollup.has_in_progress_courses {
            headline.total_in_progress_by_sponsored += 1;
        }
        headline.total_sponsored_enrollments += record.enrollments.len();
        progress_sum += record
            .enrollments
            .iter()
            .map(|e| u64::from(e.progress.hundredths()))
            .sum::<u64>();

        all_sponsorships.push(record.sponsorship.clone());

        if query.status.admits(&rollup) && query.progress.admits(rollup.overall_progress_value) {
            shown.push(SponsoredStudent {
                student: record.student,
                sponsorship: record.sponsorship,
                enrollments: record.enrollments,
                rollup,
            });
        }
    }

    let enrollment_count = u64::try_from(headline.total_sponsored_enrollments).unwrap_or(u64::MAX);
    headline.avg_sponsored_student_progress = Progress::mean(progress_sum, enrollment_count);

    SponsorDashboard {
        all_sponsorships,
        headline,
        sponsored_students: Paginator::new(SPONSOR_PAGE_SIZE).page(shown, query.page),
        status_filter: query.status,
        progress_filter: query.progress,
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct SponsorDashboardService {
    users: Arc<dyn UserRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    sponsorships: Arc<dyn SponsorshipRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl SponsorDashboardService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        sponsorships: Arc<dyn SponsorshipRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            users,
            enrollments,
            sponsorships,
            payments,
        }
    }

    /// Sponsor dashboard for `viewer`; anyone without the sponsor role is sent
    /// to the login page.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn dashboard(
        &self,
        viewer: &User,
        query: SponsorDashboardQuery,
    ) -> Result<Routed<SponsorDashboard>, DashboardError> {
        require!(viewer.has_role(Role::Sponsor), Route::Login);

        let sponsorships = self.sponsorships.sponsorships_for_sponsor(viewer.id).await?;
        let funds_utilized = self.payments.completed_total_for_payer(viewer.id).await?;

        let mut records = Vec::with_capacity(sponsorships.len());
        for sponsorship in sponsorships {
            let student = self
                .users
                .get_user(sponsorship.student_id)
                .await?
                .ok_or(StorageError::NotFound)?;
            let enrollments = self.enrollments.enrollments_for_student(student.id).await?;
            records.push(SponsorshipRecord {
                sponsorship,
                student,
                enrollments,
            });
        }

        Ok(Routed::Done(build_dashboard(records, funds_utilized, query)))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lms_core::model::{
        CourseId, EnrollmentId, NewEnrollment, NewSponsorship, SponsorshipId, UserDraft, UserId,
    };
    use lms_core::time::fixed_now;

    fn progress(raw: &str) -> Progress {
        raw.parse().unwrap()
    }

    fn enrollment(id: u64, value: &str, completed: bool) -> Enrollment {
        let mut enrollment = NewEnrollment::new(UserId::new(1), CourseId::new(id), fixed_now())
            .assign_id(EnrollmentId::new(id));
        enrollment.record_progress(progress(value));
        if completed {
            enrollment.mark_completed(fixed_now());
        }
        enrollment
    }

    fn record(student_id: u64, enrollments: Vec<Enrollment>) -> SponsorshipRecord {
        let student = UserDraft::with_role(format!("s{student_id}"), "s@example.com", Role::Student)
            .validate(fixed_now())
            .unwrap()
            .assign_id(UserId::new(student_id));
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let sponsorship = NewSponsorship::new(
            UserId::new(100),
            student.id,
            Money::from_cents(10_000),
            start,
        )
        .unwrap()
        .assign_id(SponsorshipId::new(student_id));
        SponsorshipRecord {
            sponsorship,
            student,
            enrollments,
        }
    }

    fn values(dashboard: &SponsorDashboard) -> Vec<String> {
        dashboard
            .sponsored_students
            .items
            .iter()
            .map(|s| s.rollup.overall_progress_value.to_string())
            .collect()
    }

    #[test]
    fn rollup_uses_max_not_mean() {
        let rollup = StudentRollup::from_enrollments(&[
            enrollment(1, "30", false),
            enrollment(2, "60", false),
        ]);
        assert_eq!(rollup.overall_progress_value, progress("60"));
        assert!(rollup.has_in_progress_courses);
        assert!(!rollup.has_completed_courses);
    }

    #[test]
    fn rollup_without_enrollments_is_zero() {
        let rollup = StudentRollup::from_enrollments(&[]);
        assert_eq!(rollup.overall_progress_value, Progress::ZERO);
        assert!(!rollup.has_completed_courses);
        assert!(!rollup.has_in_progress_courses);
    }

    #[test]
    fn unknown_filter_values_mean_all() {
        assert_eq!(StatusFilter::parse(Some("archived")), StatusFilter::All);
        assert_eq!(StatusFilter::parse(None), StatusFilter::All);
        assert_eq!(ProgressFilter::parse(Some("HIGH")), ProgressFilter::All);
        assert_eq!(ProgressFilter::parse(Some("low_progress")), ProgressFilter::LowProgress);
    }

    #[test]
    fn progress_boundaries() {
        let high = ProgressFilter::HighProgress;
        let low = ProgressFilter::LowProgress;
        assert!(high.admits(progress("75")));
        assert!(!low.admits(progress("75")));
        assert!(!high.admits(progress("74.99")));
        assert!(low.admits(progress("24.99")));
        assert!(!low.admits(progress("25")));
        for gap in ["25", "50", "74.99"] {
            assert!(!high.admits(progress(gap)) && !low.admits(progress(gap)));
        }
    }

    #[test]
    fn scenario_totals_and_rollups() {
        let records = vec![
            record(1, vec![enrollment(1, "80", true)]),
            record(2, vec![enrollment(2, "30", false), enrollment(3, "60", false)]),
        ];
        let dashboard = build_dashboard(records, Money::ZERO, SponsorDashboardQuery::default());

        let headline = &dashboard.headline;
        assert_eq!(headline.total_completed_by_sponsored, 1);
        assert_eq!(headline.total_in_progress_by_sponsored, 1);
        assert_eq!(headline.total_sponsored_enrollments, 3);
        assert_eq!(headline.avg_sponsored_student_progress, progress("56.67"));
        assert_eq!(headline.total_funds_provided, Money::from_cents(20_000));
        assert_eq!(values(&dashboard), vec!["80.00", "60.00"]);
    }

    #[test]
    fn filters_leave_headline_untouched() {
        let records = || {
            vec![
                record(1, vec![enrollment(1, "80", true)]),
                record(2, vec![enrollment(2, "30", false), enrollment(3, "60", false)]),
                record(3, vec![enrollment(4, "10", false)]),
                record(4, vec![]),
            ]
        };
        let unfiltered = build_dashboard(records(), Money::ZERO, SponsorDashboardQuery::default());

        let cases = [
            (Some("completed"), None, vec!["80.00"]),
            (None, Some("high_progress"), vec!["80.00"]),
            (None, Some("low_progress"), vec!["10.00", "0.00"]),
            (Some("completed"), Some("low_progress"), vec![]),
        ];
        for (status, progress_filter, expected) in cases {
            let query = SponsorDashboardQuery::from_raw(status, progress_filter, None);
            let dashboard = build_dashboard(records(), Money::ZERO, query);
            assert_eq!(values(&dashboard), expected, "{status:?} {progress_filter:?}");
            assert_eq!(dashboard.headline, unfiltered.headline);
            assert_eq!(dashboard.all_sponsorships.len(), 4);
        }
    }

    #[test]
    fn pages_hold_ten_and_clamp() {
        let records = || (1..=23).map(|id| record(id, vec![])).collect::<Vec<_>>();

        let first = build_dashboard(
            records(),
            Money::ZERO,
            SponsorDashboardQuery::from_raw(None, None, Some("0")),
        );
        assert_eq!(first.sponsored_students.number, 1);
        assert_eq!(first.sponsored_students.items.len(), 10);

        let last = build_dashboard(
            records(),
            Money::ZERO,
            SponsorDashboardQuery::from_raw(None, None, Some("99")),
        );
        assert_eq!(last.sponsored_students.number, 3);
        assert_eq!(last.sponsored_students.items.len(), 3);
        assert_eq!(last.headline, first.headline);
    }
}
