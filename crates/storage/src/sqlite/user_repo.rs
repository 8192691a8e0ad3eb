use lms_core::model::{NewUser, User, UserId, UserProfile};
use lms_core::roles::RoleSet;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, ser};
use crate::repository::{StorageError, UserRepository};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, roles, is_superuser, \
                            is_active, bio, date_of_birth, phone_number, date_joined";

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let mask: i64 = row.try_get("roles").map_err(ser)?;
    let mask = u8::try_from(mask)
        .map_err(|_| StorageError::Serialization(format!("invalid roles mask: {mask}")))?;

    Ok(User {
        id: UserId::new(i64_to_u64("user_id", row.try_get("id").map_err(ser)?)?),
        username: row.try_get("username").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        roles: RoleSet::from_mask(mask),
        is_superuser: row.try_get("is_superuser").map_err(ser)?,
        is_active: row.try_get("is_active").map_err(ser)?,
        profile: UserProfile {
            bio: row.try_get("bio").map_err(ser)?,
            date_of_birth: row.try_get("date_of_birth").map_err(ser)?,
            phone_number: row.try_get("phone_number").map_err(ser)?,
        },
        date_joined: row.try_get("date_joined").map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (username, email, first_name, last_name, roles, is_superuser, is_active, bio, date_of_birth, phone_number, date_joined)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(i64::from(user.roles.mask()))
        .bind(user.is_superuser)
        .bind(&user.profile.bio)
        .bind(user.profile.date_of_birth)
        .bind(&user.profile.phone_number)
        .bind(user.date_joined)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = UserId::new(i64_to_u64("user_id", res.last_insert_rowid())?);
        Ok(user.assign_id(id))
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users SET
                username = ?2,
                email = ?3,
                first_name = ?4,
                last_name = ?5,
                roles = ?6,
                is_superuser = ?7,
                is_active = ?8,
                bio = ?9,
                date_of_birth = ?10,
                phone_number = ?11
            WHERE id = ?1
            ",
        )
        .bind(id_i64("user_id", user.id.value())?)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(i64::from(user.roles.mask()))
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(&user.profile.bio)
        .bind(user.profile.date_of_birth)
        .bind(&user.profile.phone_number)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(map_user_row).collect()
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
