use std::sync::Arc;

use storage::Storage;

use crate::assessments::AssessmentService;
use crate::config::LmsConfig;
use crate::courses::CourseService;
use crate::dashboards::DashboardService;
use crate::error::AppServicesError;
use crate::notifications::{Mailer, NotificationDispatcher, NotificationService};
use crate::sponsor::SponsorDashboardService;
use crate::Clock;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    courses: Arc<CourseService>,
    assessments: Arc<AssessmentService>,
    dashboards: Arc<DashboardService>,
    sponsor_dashboard: Arc<SponsorDashboardService>,
    notifications: Arc<NotificationService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or the
    /// email templates fail to load.
    pub async fn new_sqlite(config: &LmsConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Self::from_storage(storage, config, clock, config.mail.mailer())
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Mail` if the email templates fail to load.
    pub fn from_storage(
        storage: Storage,
        config: &LmsConfig,
        clock: Clock,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AppServicesError> {
        let dispatcher = NotificationDispatcher::new(
            clock,
            Arc::clone(&storage.notifications),
            mailer,
            config,
        )?;

        Ok(Self {
            courses: Arc::new(CourseService::new(clock, storage.clone())),
            assessments: Arc::new(AssessmentService::new(clock, storage.clone(), dispatcher)),
            dashboards: Arc::new(DashboardService::new(clock, storage.clone())),
            sponsor_dashboard: Arc::new(SponsorDashboardService::new(
                Arc::clone(&storage.users),
                Arc::clone(&storage.enrollments),
                Arc::clone(&storage.sponsorships),
                Arc::clone(&storage.payments),
            )),
            notifications: Arc::new(NotificationService::new(Arc::clone(
                &storage.notifications,
            ))),
            storage,
        })
    }

    /// Direct repository access for seeding and administration.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn assessments(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessments)
    }

    #[must_use]
    pub fn dashboards(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboards)
    }

    #[must_use]
    pub fn sponsor_dashboard(&self) -> Arc<SponsorDashboardService> {
        Arc::clone(&self.sponsor_dashboard)
    }

    #[must_use]
    pub fn notifications(&self) -> Arc<NotificationService> {
        Arc::clone(&self.notifications)
    }
}
