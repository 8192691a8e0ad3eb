use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::decimal::Money;
use crate::model::ids::{CourseId, LessonId, ModuleId, UserId};

const MAX_TITLE_LEN: usize = 200;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("title must be at most 200 characters")]
    TitleTooLong,

    #[error("description cannot be empty")]
    EmptyDescription,

    #[error("lesson content cannot be empty")]
    EmptyContent,

    #[error("order must be a positive number")]
    InvalidOrder,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

fn validate_title(raw: &str) -> Result<String, CourseError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CourseError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CourseError::TitleTooLong);
    }
    Ok(title.to_owned())
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty())
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| CourseError::InvalidDifficulty(s.to_owned()))
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub instructors: BTreeSet<UserId>,
    pub difficulty: Difficulty,
    pub price: Money,
    pub is_active: bool,
}

impl CourseDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            instructors: BTreeSet::new(),
            difficulty: Difficulty::default(),
            price: Money::ZERO,
            is_active: true,
        }
    }

    /// # Errors
    ///
    /// Returns `CourseError` if the title or description is blank, or the
    /// title is longer than 200 characters.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewCourse, CourseError> {
        let title = validate_title(&self.title)?;
        let description = self.description.trim().to_owned();
        if description.is_empty() {
            return Err(CourseError::EmptyDescription);
        }
        Ok(NewCourse {
            title,
            description,
            instructors: self.instructors,
            difficulty: self.difficulty,
            price: self.price,
            is_active: self.is_active,
            validated_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub instructors: BTreeSet<UserId>,
    pub difficulty: Difficulty,
    pub price: Money,
    pub is_active: bool,
    pub validated_at: DateTime<Utc>,
}

impl NewCourse {
    #[must_use]
    pub fn assign_id(self, id: CourseId) -> Course {
        Course {
            id,
            title: self.title,
            description: self.description,
            instructors: self.instructors,
            difficulty: self.difficulty,
            price: self.price,
            created_at: self.validated_at,
            updated_at: self.validated_at,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub instructors: BTreeSet<UserId>,
    pub difficulty: Difficulty,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Course {
    #[must_use]
    pub fn is_taught_by(&self, user: UserId) -> bool {
        self.instructors.contains(&user)
    }

    /// Applies validated edits, keeping identity and creation time.
    #[must_use]
    pub fn apply_update(&self, edits: NewCourse) -> Course {
        Course {
            id: self.id,
            created_at: self.created_at,
            ..edits.assign_id(self.id)
        }
    }
}

//
// ─── MODULES & LESSONS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDraft {
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
}

impl ModuleDraft {
    /// # Errors
    ///
    /// Returns `CourseError` for a blank title or a zero order.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewModule, CourseError> {
        if self.order == 0 {
            return Err(CourseError::InvalidOrder);
        }
        Ok(NewModule {
            course_id: self.course_id,
            title: validate_title(&self.title)?,
            description: optional_text(self.description),
            order: self.order,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModule {
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

impl NewModule {
    #[must_use]
    pub fn assign_id(self, id: ModuleId) -> Module {
        Module {
            id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            order: self.order,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// An ordered section of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub module_id: ModuleId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub order: u32,
}

impl LessonDraft {
    /// # Errors
    ///
    /// Returns `CourseError` for a blank title or content, a zero order, or a
    /// video URL that does not parse.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewLesson, CourseError> {
        if self.order == 0 {
            return Err(CourseError::InvalidOrder);
        }
        let content = self.content.trim().to_owned();
        if content.is_empty() {
            return Err(CourseError::EmptyContent);
        }
        let video_url = optional_text(self.video_url)
            .map(|raw| Url::parse(&raw).map_err(|_| CourseError::InvalidVideoUrl(raw)))
            .transpose()?;

        Ok(NewLesson {
            module_id: self.module_id,
            title: validate_title(&self.title)?,
            content,
            video_url,
            order: self.order,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub module_id: ModuleId,
    pub title: String,
    pub content: String,
    pub video_url: Option<Url>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

impl NewLesson {
    #[must_use]
    pub fn assign_id(self, id: LessonId) -> Lesson {
        Lesson {
            id,
            module_id: self.module_id,
            title: self.title,
            content: self.content,
            video_url: self.video_url,
            order: self.order,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    pub content: String,
    pub video_url: Option<Url>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn course_trims_and_requires_title() {
        let err = CourseDraft::new("   ", "desc").validate(fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);

        let course = CourseDraft::new("  Rust 101 ", " Ownership ")
            .validate(fixed_now())
            .unwrap()
            .assign_id(CourseId::new(1));
        assert_eq!(course.title, "Rust 101");
        assert_eq!(course.description, "Ownership");
        assert!(course.is_active);
    }

    #[test]
    fn course_rejects_long_title() {
        let err = CourseDraft::new("x".repeat(201), "desc")
            .validate(fixed_now())
            .unwrap_err();
        assert_eq!(err, CourseError::TitleTooLong);
    }

    #[test]
    fn apply_update_keeps_identity_and_created_at() {
        let course = CourseDraft::new("Algebra", "Linear equations")
            .validate(fixed_now())
            .unwrap()
            .assign_id(CourseId::new(9));

        let later = fixed_now() + Duration::hours(3);
        let mut draft = CourseDraft::new("Algebra II", "Quadratics");
        draft.difficulty = Difficulty::Intermediate;
        let updated = course.apply_update(draft.validate(later).unwrap());

        assert_eq!(updated.id, CourseId::new(9));
        assert_eq!(updated.created_at, fixed_now());
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.title, "Algebra II");
        assert_eq!(updated.difficulty, Difficulty::Intermediate);
    }

    #[test]
    fn lesson_validates_video_url_and_order() {
        let draft = LessonDraft {
            module_id: ModuleId::new(1),
            title: "Intro".into(),
            content: "Welcome".into(),
            video_url: Some("not a url".into()),
            order: 1,
        };
        assert!(matches!(
            draft.clone().validate(fixed_now()).unwrap_err(),
            CourseError::InvalidVideoUrl(_)
        ));

        let lesson = LessonDraft {
            video_url: Some("https://videos.example/intro".into()),
            ..draft.clone()
        }
        .validate(fixed_now())
        .unwrap();
        assert_eq!(lesson.video_url.unwrap().host_str(), Some("videos.example"));

        let err = LessonDraft { order: 0, ..draft }.validate(fixed_now()).unwrap_err();
        assert_eq!(err, CourseError::InvalidOrder);
    }

    #[test]
    fn difficulty_parses() {
        assert_eq!("advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
