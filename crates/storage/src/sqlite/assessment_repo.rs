use lms_core::model::{
    Assessment, AssessmentId, AssessmentType, CourseId, NewAssessment, NewSubmission, Submission,
    SubmissionId, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, score_from_i64, ser, u32_from_i64};
use crate::repository::{AssessmentRepository, StorageError, SubmissionRepository};

fn map_assessment_row(row: &SqliteRow) -> Result<Assessment, StorageError> {
    let kind: String = row.try_get("assessment_type").map_err(ser)?;
    Ok(Assessment {
        id: AssessmentId::new(i64_to_u64("assessment_id", row.try_get("id").map_err(ser)?)?),
        course_id: CourseId::new(i64_to_u64("course_id", row.try_get("course_id").map_err(ser)?)?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        assessment_type: kind.parse::<AssessmentType>().map_err(ser)?,
        due_date: row.try_get("due_date").map_err(ser)?,
        max_score: u32_from_i64("max_score", row.try_get("max_score").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

fn map_submission_row(row: &SqliteRow) -> Result<Submission, StorageError> {
    Ok(Submission {
        id: SubmissionId::new(i64_to_u64("submission_id", row.try_get("id").map_err(ser)?)?),
        assessment_id: AssessmentId::new(i64_to_u64(
            "assessment_id",
            row.try_get("assessment_id").map_err(ser)?,
        )?),
        student_id: UserId::new(i64_to_u64("student_id", row.try_get("student_id").map_err(ser)?)?),
        submission_date: row.try_get("submission_date").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        score: score_from_i64(row.try_get("score").map_err(ser)?)?,
        feedback: row.try_get("feedback").map_err(ser)?,
        is_graded: row.try_get("is_graded").map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn insert_assessment(
        &self,
        assessment: NewAssessment,
    ) -> Result<Assessment, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO assessments (course_id, title, description, assessment_type, due_date, max_score, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ",
        )
        .bind(id_i64("course_id", assessment.course_id.value())?)
        .bind(&assessment.title)
        .bind(&assessment.description)
        .bind(assessment.assessment_type.as_str())
        .bind(assessment.due_date)
        .bind(i64::from(assessment.max_score))
        .bind(assessment.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = AssessmentId::new(i64_to_u64("assessment_id", res.last_insert_rowid())?);
        Ok(assessment.assign_id(id))
    }

    async fn get_assessment(&self, id: AssessmentId) -> Result<Option<Assessment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, description, assessment_type, due_date, max_score, created_at, updated_at
            FROM assessments WHERE id = ?1
            ",
        )
        .bind(id_i64("assessment_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_assessment_row).transpose()
    }

    async fn assessments_for_courses(
        &self,
        courses: &[CourseId],
    ) -> Result<Vec<Assessment>, StorageError> {
        if courses.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, course_id, title, description, assessment_type, due_date, max_score, \
             created_at, updated_at FROM assessments WHERE course_id IN (",
        );
        let mut list = qb.separated(", ");
        for course in courses {
            list.push_bind(id_i64("course_id", course.value())?);
        }
        qb.push(") ORDER BY due_date ASC, id ASC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(map_assessment_row).collect()
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn upsert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<Submission, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO submissions (assessment_id, student_id, submission_date, content, score, feedback, is_graded)
            VALUES (?1, ?2, ?3, ?4, NULL, NULL, 0)
            ON CONFLICT(assessment_id, student_id) DO UPDATE SET
                submission_date = excluded.submission_date,
                content = excluded.content,
                score = NULL,
                feedback = NULL,
                is_graded = 0
            RETURNING id
            ",
        )
        .bind(id_i64("assessment_id", submission.assessment_id.value())?)
        .bind(id_i64("student_id", submission.student_id.value())?)
        .bind(submission.submitted_at)
        .bind(&submission.content)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let id = SubmissionId::new(i64_to_u64("submission_id", row.try_get("id").map_err(ser)?)?);
        Ok(submission.assign_id(id))
    }

    async fn update_submission(&self, submission: &Submission) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE submissions SET
                content = ?2,
                score = ?3,
                feedback = ?4,
                is_graded = ?5
            WHERE id = ?1
            ",
        )
        .bind(id_i64("submission_id", submission.id.value())?)
        .bind(&submission.content)
        .bind(submission.score.map(|s| i64::from(s.hundredths())))
        .bind(&submission.feedback)
        .bind(submission.is_graded)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, assessment_id, student_id, submission_date, content, score, feedback, is_graded
            FROM submissions WHERE id = ?1
            ",
        )
        .bind(id_i64("submission_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_submission_row).transpose()
    }

    async fn submissions_for_assessments(
        &self,
        assessments: &[AssessmentId],
    ) -> Result<Vec<Submission>, StorageError> {
        if assessments.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, assessment_id, student_id, submission_date, content, score, feedback, \
             is_graded FROM submissions WHERE assessment_id IN (",
        );
        let mut list = qb.separated(", ");
        for assessment in assessments {
            list.push_bind(id_i64("assessment_id", assessment.value())?);
        }
        qb.push(") ORDER BY submission_date DESC, id DESC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(map_submission_row).collect()
    }
}
