use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::decimal::{DecimalError, Score};
use crate::model::ids::{AssessmentId, CourseId, SubmissionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("title must be at most 200 characters")]
    TitleTooLong,

    #[error("maximum score must be greater than zero")]
    InvalidMaxScore,

    #[error("invalid assessment type: {0}")]
    InvalidType(String),
}

/// Rejections raised while validating a grade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradeError {
    #[error("Score cannot exceed maximum score of {max}.")]
    ScoreExceedsMax { max: u32 },

    #[error("Enter a valid score: {0}")]
    InvalidScore(#[source] DecimalError),
}

//
// ─── ASSESSMENT TYPE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    #[default]
    Quiz,
    Assignment,
    Exam,
    Project,
}

impl AssessmentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::Quiz => "quiz",
            AssessmentType::Assignment => "assignment",
            AssessmentType::Exam => "exam",
            AssessmentType::Project => "project",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "quiz" => Ok(AssessmentType::Quiz),
            "assignment" => Ok(AssessmentType::Assignment),
            "exam" => Ok(AssessmentType::Exam),
            "project" => Ok(AssessmentType::Project),
            other => Err(AssessmentError::InvalidType(other.to_owned())),
        }
    }
}

//
// ─── ASSESSMENT ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentDraft {
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub assessment_type: AssessmentType,
    pub due_date: DateTime<Utc>,
    pub max_score: u32,
}

impl AssessmentDraft {
    /// # Errors
    ///
    /// Returns `AssessmentError` for a blank or overlong title, or a zero
    /// maximum score.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewAssessment, AssessmentError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(AssessmentError::EmptyTitle);
        }
        if title.chars().count() > 200 {
            return Err(AssessmentError::TitleTooLong);
        }
        if self.max_score == 0 {
            return Err(AssessmentError::InvalidMaxScore);
        }
        Ok(NewAssessment {
            course_id: self.course_id,
            title,
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            assessment_type: self.assessment_type,
            due_date: self.due_date,
            max_score: self.max_score,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssessment {
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub assessment_type: AssessmentType,
    pub due_date: DateTime<Utc>,
    pub max_score: u32,
    pub created_at: DateTime<Utc>,
}

impl NewAssessment {
    #[must_use]
    pub fn assign_id(self, id: AssessmentId) -> Assessment {
        Assessment {
            id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            assessment_type: self.assessment_type,
            due_date: self.due_date,
            max_score: self.max_score,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub assessment_type: AssessmentType,
    pub due_date: DateTime<Utc>,
    pub max_score: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub assessment_id: AssessmentId,
    pub student_id: UserId,
    pub content: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl NewSubmission {
    #[must_use]
    pub fn assign_id(self, id: SubmissionId) -> Submission {
        Submission {
            id,
            assessment_id: self.assessment_id,
            student_id: self.student_id,
            submission_date: self.submitted_at,
            content: self.content,
            score: None,
            feedback: None,
            is_graded: false,
        }
    }
}

/// A student's answer to an assessment. `(assessment_id, student_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub assessment_id: AssessmentId,
    pub student_id: UserId,
    pub submission_date: DateTime<Utc>,
    pub content: Option<String>,
    pub score: Option<Score>,
    pub feedback: Option<String>,
    pub is_graded: bool,
}

/// Grading form input as entered by an instructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeInput {
    pub score: Option<Score>,
    pub feedback: Option<String>,
    pub is_graded: bool,
}

impl GradeInput {
    /// Builds input from a raw score field; an empty field means "no score".
    ///
    /// # Errors
    ///
    /// Returns `GradeError::InvalidScore` if the field is not a non-negative
    /// decimal with at most two places.
    pub fn from_raw(
        score: &str,
        feedback: Option<String>,
        is_graded: bool,
    ) -> Result<Self, GradeError> {
        let score = if score.trim().is_empty() {
            None
        } else {
            Some(score.parse::<Score>().map_err(GradeError::InvalidScore)?)
        };
        Ok(Self {
            score,
            feedback,
            is_graded,
        })
    }

    /// # Errors
    ///
    /// Returns `GradeError::ScoreExceedsMax` when the score is above `max_score`.
    pub fn validate(&self, max_score: u32) -> Result<(), GradeError> {
        match self.score {
            Some(score) if score.exceeds(max_score) => {
                Err(GradeError::ScoreExceedsMax { max: max_score })
            }
            _ => Ok(()),
        }
    }
}

impl Submission {
    /// Validates and applies a grade against the assessment's maximum score.
    ///
    /// # Errors
    ///
    /// Returns `GradeError::ScoreExceedsMax` and leaves the submission
    /// untouched when the score is too high.
    pub fn apply_grade(&mut self, input: GradeInput, max_score: u32) -> Result<(), GradeError> {
        input.validate(max_score)?;
        self.score = input.score;
        self.feedback = input
            .feedback
            .map(|f| f.trim().to_owned())
            .filter(|f| !f.is_empty());
        self.is_graded = input.is_graded;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
