use lms_core::model::{CourseId, Enrollment, EnrollmentId, NewEnrollment, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, progress_from_i64, ser};
use crate::repository::{EnrollmentRepository, StorageError};

const ENROLLMENT_SELECT: &str = "SELECT id, student_id, course_id, enrollment_date, \
                                 completion_date, is_completed, progress FROM enrollments";

fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    Ok(Enrollment {
        id: EnrollmentId::new(i64_to_u64("enrollment_id", row.try_get("id").map_err(ser)?)?),
        student_id: UserId::new(i64_to_u64("student_id", row.try_get("student_id").map_err(ser)?)?),
        course_id: CourseId::new(i64_to_u64("course_id", row.try_get("course_id").map_err(ser)?)?),
        enrollment_date: row.try_get("enrollment_date").map_err(ser)?,
        completion_date: row.try_get("completion_date").map_err(ser)?,
        is_completed: row.try_get("is_completed").map_err(ser)?,
        progress: progress_from_i64(row.try_get("progress").map_err(ser)?)?,
    })
}

impl SqliteRepository {
    async fn enrollments_matching(
        &self,
        clause: &str,
        bind: Option<i64>,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(&format!(
            "{ENROLLMENT_SELECT} {clause} ORDER BY enrollment_date DESC, id DESC"
        ))
        .bind(bind)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_enrollment_row).collect()
    }
}

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO enrollments (student_id, course_id, enrollment_date, completion_date, is_completed, progress)
            VALUES (?1, ?2, ?3, NULL, 0, 0)
            ",
        )
        .bind(id_i64("student_id", enrollment.student_id.value())?)
        .bind(id_i64("course_id", enrollment.course_id.value())?)
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = EnrollmentId::new(i64_to_u64("enrollment_id", res.last_insert_rowid())?);
        Ok(enrollment.assign_id(id))
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments SET
                completion_date = ?2,
                is_completed = ?3,
                progress = ?4
            WHERE id = ?1
            ",
        )
        .bind(id_i64("enrollment_id", enrollment.id.value())?)
        .bind(enrollment.completion_date)
        .bind(enrollment.is_completed)
        .bind(i64::from(enrollment.progress.hundredths()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(&format!("{ENROLLMENT_SELECT} WHERE id = ?1"))
            .bind(id_i64("enrollment_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(&format!(
            "{ENROLLMENT_SELECT} WHERE student_id = ?1 AND course_id = ?2"
        ))
        .bind(id_i64("student_id", student.value())?)
        .bind(id_i64("course_id", course.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn enrollments_for_student(
        &self,
        student: UserId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        self.enrollments_matching(
            "WHERE student_id = ?1",
            Some(id_i64("student_id", student.value())?),
        )
        .await
    }

    async fn enrollments_for_course(
        &self,
        course: CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        self.enrollments_matching(
            "WHERE course_id = ?1",
            Some(id_i64("course_id", course.value())?),
        )
        .await
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StorageError> {
        self.enrollments_matching("WHERE ?1 IS NULL", None).await
    }
}
