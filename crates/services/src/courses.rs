//! Course catalogue and authoring.

use std::collections::BTreeMap;

use serde::Serialize;

use lms_core::Clock;
use lms_core::model::{
    Course, CourseDraft, CourseId, Enrollment, Lesson, LessonDraft, Module, ModuleDraft,
    NewEnrollment, User, UserId,
};
use lms_core::pagination::{Page, PageRequest, Paginator};
use lms_core::roles::Role;
use lms_core::routes::Route;
use storage::{Storage, StorageError};

use crate::error::CourseServiceError;
use crate::routed::{Routed, require};

pub const COURSE_PAGE_SIZE: usize = 9;

//
// ─── LISTING ───────────────────────────────────────────────────────────────────
//

/// Catalogue search parameters. Blank values disable a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseListQuery {
    pub search: String,
    pub difficulty: String,
    pub instructor: String,
    pub page: PageRequest,
}

impl Default for CourseListQuery {
    fn default() -> Self {
        Self::from_raw(None, None, None, None)
    }
}

impl CourseListQuery {
    #[must_use]
    pub fn from_raw(
        search: Option<&str>,
        difficulty: Option<&str>,
        instructor: Option<&str>,
        page: Option<&str>,
    ) -> Self {
        let text = |raw: Option<&str>| raw.map(str::trim).unwrap_or_default().to_owned();
        Self {
            search: text(search),
            difficulty: text(difficulty),
            instructor: text(instructor),
            page: PageRequest::parse(page),
        }
    }

    fn matches(&self, course: &Course, instructors: &[&User]) -> bool {
        let search = self.search.to_lowercase();
        let instructor = self.instructor.to_lowercase();

        let search_ok = search.is_empty()
            || contains(&course.title, &search)
            || contains(&course.description, &search)
            || instructors
                .iter()
                .any(|u| contains(&u.first_name, &search) || contains(&u.last_name, &search));
        let difficulty_ok = self.difficulty.is_empty()
            || self.difficulty == "all"
            || course.difficulty.as_str() == self.difficulty;
        let instructor_ok = instructor.is_empty()
            || instructors.iter().any(|u| {
                contains(&u.username, &instructor)
                    || contains(&u.first_name, &instructor)
                    || contains(&u.last_name, &instructor)
            });

        search_ok && difficulty_ok && instructor_ok
    }
}

fn contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseListing {
    pub courses: Page<Course>,
    pub search_query: String,
    pub difficulty_filter: String,
    pub instructor_filter: String,
}

//
// ─── DETAIL ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutline {
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    pub is_enrolled: bool,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    storage: Storage,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self { clock, storage }
    }

    /// Active courses matching `query`, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` on repository failures.
    pub async fn list(&self, query: &CourseListQuery) -> Result<CourseListing, CourseServiceError> {
        let users: BTreeMap<UserId, User> = self
            .storage
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let matching: Vec<Course> = self
            .storage
            .courses
            .list_courses()
            .await?
            .into_iter()
            .filter(|course| course.is_active)
            .filter(|course| {
                let instructors: Vec<&User> = course
                    .instructors
                    .iter()
                    .filter_map(|id| users.get(id))
                    .collect();
                query.matches(course, &instructors)
            })
            .collect();

        Ok(CourseListing {
            courses: Paginator::new(COURSE_PAGE_SIZE).page(matching, query.page),
            search_query: query.search.clone(),
            difficulty_filter: query.difficulty.clone(),
            instructor_filter: query.instructor.clone(),
        })
    }

    /// Creates a course taught by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures and
    /// `CourseServiceError::Storage` if persistence fails.
    pub async fn create(
        &self,
        actor: &User,
        mut draft: CourseDraft,
    ) -> Result<Routed<Course>, CourseServiceError> {
        require!(actor.has_role(Role::Instructor), Route::Login);

        draft.instructors.insert(actor.id);
        let course = self
            .storage
            .courses
            .insert_course(draft.validate(self.clock.now())?)
            .await?;
        tracing::info!(course = %course.id, instructor = %actor.id, "course created");
        Ok(Routed::Done(course))
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures and
    /// `CourseServiceError::Storage` if the course is missing or persistence fails.
    pub async fn update(
        &self,
        actor: &User,
        id: CourseId,
        draft: CourseDraft,
    ) -> Result<Routed<Course>, CourseServiceError> {
        require!(actor.has_role(Role::Instructor), Route::Login);
        let course = self.load(id).await?;
        require!(can_manage(actor, &course), Route::CourseList);

        let updated = course.apply_update(draft.validate(self.clock.now())?);
        self.storage.courses.update_course(&updated).await?;
        tracing::info!(course = %id, "course updated");
        Ok(Routed::Done(updated))
    }

    /// Deletes the course with its modules, lessons, enrollments, assessments
    /// and payments.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course is missing or the
    /// delete fails.
    pub async fn delete(
        &self,
        actor: &User,
        id: CourseId,
    ) -> Result<Routed<()>, CourseServiceError> {
        require!(actor.has_role(Role::Instructor), Route::Login);
        let course = self.load(id).await?;
        require!(can_manage(actor, &course), Route::CourseList);

        self.storage.courses.delete_course(id).await?;
        tracing::info!(course = %id, "course deleted");
        Ok(Routed::Done(()))
    }

    /// Course with its ordered outline. `viewer` is `None` for anonymous visitors.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course is missing.
    pub async fn detail(
        &self,
        viewer: Option<&User>,
        id: CourseId,
    ) -> Result<CourseDetail, CourseServiceError> {
        let course = self.load(id).await?;

        let mut modules = Vec::new();
        for module in self.storage.courses.modules_for_course(id).await? {
            let lessons = self.storage.courses.lessons_for_module(module.id).await?;
            modules.push(ModuleOutline { module, lessons });
        }

        let is_enrolled = match viewer {
            None => false,
            Some(user) if user.is_admin_or_superuser() || user.has_role(Role::Instructor) => true,
            Some(user) => self
                .storage
                .enrollments
                .find_enrollment(user.id, id)
                .await?
                .is_some(),
        };

        Ok(CourseDetail {
            course,
            modules,
            is_enrolled,
        })
    }

    /// Enrolls a student. An existing enrollment sends them back to the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course is missing or
    /// persistence fails.
    pub async fn enroll(
        &self,
        actor: &User,
        id: CourseId,
    ) -> Result<Routed<Enrollment>, CourseServiceError> {
        require!(actor.has_role(Role::Student), Route::Login);
        let course = self.load(id).await?;

        if self
            .storage
            .enrollments
            .find_enrollment(actor.id, course.id)
            .await?
            .is_some()
        {
            return Ok(Routed::Redirect(Route::CourseDetail(course.id)));
        }

        let enrollment = self
            .storage
            .enrollments
            .insert_enrollment(NewEnrollment::new(actor.id, course.id, self.clock.now()))
            .await?;
        tracing::info!(course = %course.id, student = %actor.id, "student enrolled");
        Ok(Routed::Done(enrollment))
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures and
    /// `CourseServiceError::Storage` for a missing course or a duplicate order.
    pub async fn add_module(
        &self,
        actor: &User,
        draft: ModuleDraft,
    ) -> Result<Routed<Module>, CourseServiceError> {
        require!(actor.has_role(Role::Instructor), Route::Login);
        let course = self.load(draft.course_id).await?;
        require!(can_manage(actor, &course), Route::CourseDetail(course.id));

        let module = self
            .storage
            .courses
            .insert_module(draft.validate(self.clock.now())?)
            .await?;
        Ok(Routed::Done(module))
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures and
    /// `CourseServiceError::Storage` for a missing module or a duplicate order.
    pub async fn add_lesson(
        &self,
        actor: &User,
        draft: LessonDraft,
    ) -> Result<Routed<Lesson>, CourseServiceError> {
        require!(actor.has_role(Role::Instructor), Route::Login);
        let module = self
            .storage
            .courses
            .get_module(draft.module_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let course = self.load(module.course_id).await?;
        require!(can_manage(actor, &course), Route::CourseDetail(course.id));

        let lesson = self
            .storage
            .courses
            .insert_lesson(draft.validate(self.clock.now())?)
            .await?;
        Ok(Routed::Done(lesson))
    }

    async fn load(&self, id: CourseId) -> Result<Course, CourseServiceError> {
        Ok(self
            .storage
            .courses
            .get_course(id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }
}

fn can_manage(actor: &User, course: &Course) -> bool {
    actor.is_superuser || course.is_taught_by(actor.id)
}
