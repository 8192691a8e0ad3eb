use lms_core::model::{
    Course, CourseId, Difficulty, Lesson, LessonId, Module, ModuleId, NewCourse, NewLesson,
    NewModule, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::{BTreeSet, HashMap};
use url::Url;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, money_from_i64, money_to_i64, ser, u32_from_i64};
use crate::repository::{CourseRepository, StorageError};

const COURSE_COLUMNS: &str =
    "id, title, description, difficulty, price_cents, created_at, updated_at, is_active";

fn course_id(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

fn map_course_row(
    row: &SqliteRow,
    instructors: &mut HashMap<CourseId, BTreeSet<UserId>>,
) -> Result<Course, StorageError> {
    let id = course_id(row.try_get("id").map_err(ser)?)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    Ok(Course {
        id,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        instructors: instructors.remove(&id).unwrap_or_default(),
        difficulty: difficulty.parse::<Difficulty>().map_err(ser)?,
        price: money_from_i64(row.try_get("price_cents").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
        is_active: row.try_get("is_active").map_err(ser)?,
    })
}

fn map_module_row(row: &SqliteRow) -> Result<Module, StorageError> {
    Ok(Module {
        id: ModuleId::new(i64_to_u64("module_id", row.try_get("id").map_err(ser)?)?),
        course_id: course_id(row.try_get("course_id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        order: u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let video_url = row
        .try_get::<Option<String>, _>("video_url")
        .map_err(ser)?
        .map(|raw| Url::parse(&raw).map_err(ser))
        .transpose()?;
    Ok(Lesson {
        id: LessonId::new(i64_to_u64("lesson_id", row.try_get("id").map_err(ser)?)?),
        module_id: ModuleId::new(i64_to_u64("module_id", row.try_get("module_id").map_err(ser)?)?),
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        video_url,
        order: u32_from_i64("position", row.try_get("position").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

async fn write_instructors(
    tx: &mut Transaction<'_, Sqlite>,
    course: i64,
    instructors: &BTreeSet<UserId>,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM course_instructors WHERE course_id = ?1")
        .bind(course)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    for instructor in instructors {
        sqlx::query("INSERT INTO course_instructors (course_id, user_id) VALUES (?1, ?2)")
            .bind(course)
            .bind(id_i64("user_id", instructor.value())?)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

impl SqliteRepository {
    /// Instructor sets keyed by course, optionally for a single course.
    async fn instructor_sets(
        &self,
        course: Option<CourseId>,
    ) -> Result<HashMap<CourseId, BTreeSet<UserId>>, StorageError> {
        let course = course.map(|c| id_i64("course_id", c.value())).transpose()?;
        let rows = sqlx::query(
            r"
            SELECT course_id, user_id FROM course_instructors
            WHERE ?1 IS NULL OR course_id = ?1
            ",
        )
        .bind(course)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut sets: HashMap<CourseId, BTreeSet<UserId>> = HashMap::new();
        for row in rows {
            let course = course_id(row.try_get("course_id").map_err(ser)?)?;
            let user = UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?);
            sets.entry(course).or_default().insert(user);
        }
        Ok(sets)
    }

    async fn courses_where(
        &self,
        clause: &str,
        bind: Option<i64>,
    ) -> Result<Vec<Course>, StorageError> {
        let mut instructors = self.instructor_sets(None).await?;
        let rows = sqlx::query(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses {clause} ORDER BY title ASC"
        ))
        .bind(bind)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(|row| map_course_row(row, &mut instructors))
            .collect()
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let res = sqlx::query(
            r"
            INSERT INTO courses (title, description, difficulty, price_cents, created_at, updated_at, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)
            ",
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.difficulty.as_str())
        .bind(money_to_i64(course.price)?)
        .bind(course.validated_at)
        .bind(course.is_active)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let id = res.last_insert_rowid();
        write_instructors(&mut tx, id, &course.instructors).await?;
        tx.commit().await.map_err(db_err)?;

        Ok(course.assign_id(course_id(id)?))
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let id = id_i64("course_id", course.id.value())?;
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let res = sqlx::query(
            r"
            UPDATE courses SET
                title = ?2,
                description = ?3,
                difficulty = ?4,
                price_cents = ?5,
                updated_at = ?6,
                is_active = ?7
            WHERE id = ?1
            ",
        )
        .bind(id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.difficulty.as_str())
        .bind(money_to_i64(course.price)?)
        .bind(course.updated_at)
        .bind(course.is_active)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        write_instructors(&mut tx, id, &course.instructors).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"))
            .bind(id_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(row) => {
                let mut instructors = self.instructor_sets(Some(id)).await?;
                map_course_row(&row, &mut instructors).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        self.courses_where("WHERE ?1 IS NULL", None).await
    }

    async fn courses_taught_by(&self, instructor: UserId) -> Result<Vec<Course>, StorageError> {
        self.courses_where(
            "WHERE id IN (SELECT course_id FROM course_instructors WHERE user_id = ?1)",
            Some(id_i64("user_id", instructor.value())?),
        )
        .await
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id_i64("course_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn insert_module(&self, module: NewModule) -> Result<Module, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO modules (course_id, title, description, position, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
        )
        .bind(id_i64("course_id", module.course_id.value())?)
        .bind(&module.title)
        .bind(&module.description)
        .bind(i64::from(module.order))
        .bind(module.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = ModuleId::new(i64_to_u64("module_id", res.last_insert_rowid())?);
        Ok(module.assign_id(id))
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, description, position, created_at, updated_at
            FROM modules WHERE id = ?1
            ",
        )
        .bind(id_i64("module_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_module_row).transpose()
    }

    async fn modules_for_course(&self, course: CourseId) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, description, position, created_at, updated_at
            FROM modules WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_i64("course_id", course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_module_row).collect()
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (module_id, title, content, video_url, position, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ",
        )
        .bind(id_i64("module_id", lesson.module_id.value())?)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.video_url.as_ref().map(Url::as_str))
        .bind(i64::from(lesson.order))
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = LessonId::new(i64_to_u64("lesson_id", res.last_insert_rowid())?);
        Ok(lesson.assign_id(id))
    }

    async fn lessons_for_module(&self, module: ModuleId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, module_id, title, content, video_url, position, created_at, updated_at
            FROM lessons WHERE module_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_i64("module_id", module.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_lesson_row).collect()
    }
}
