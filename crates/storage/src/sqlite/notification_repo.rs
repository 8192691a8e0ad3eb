use lms_core::model::{NewNotification, Notification, NotificationId, NotificationType, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, ser};
use crate::repository::{NotificationRepository, StorageError};

const NOTIFICATION_SELECT: &str = "SELECT id, recipient_id, sender_id, notification_type, \
                                   message, link, created_at, is_read FROM notifications";

fn map_notification_row(row: &SqliteRow) -> Result<Notification, StorageError> {
    let kind: String = row.try_get("notification_type").map_err(ser)?;
    Ok(Notification {
        id: NotificationId::new(i64_to_u64("notification_id", row.try_get("id").map_err(ser)?)?),
        recipient_id: UserId::new(i64_to_u64(
            "recipient_id",
            row.try_get("recipient_id").map_err(ser)?,
        )?),
        sender_id: row
            .try_get::<Option<i64>, _>("sender_id")
            .map_err(ser)?
            .map(|v| i64_to_u64("sender_id", v).map(UserId::new))
            .transpose()?,
        notification_type: kind.parse::<NotificationType>().map_err(ser)?,
        message: row.try_get("message").map_err(ser)?,
        link: row.try_get("link").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        is_read: row.try_get("is_read").map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl NotificationRepository for SqliteRepository {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO notifications (recipient_id, sender_id, notification_type, message, link, created_at, is_read)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
            ",
        )
        .bind(id_i64("recipient_id", notification.recipient_id.value())?)
        .bind(
            notification
                .sender_id
                .map(|s| id_i64("sender_id", s.value()))
                .transpose()?,
        )
        .bind(notification.notification_type.as_str())
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = NotificationId::new(i64_to_u64("notification_id", res.last_insert_rowid())?);
        Ok(notification.assign_id(id))
    }

    async fn get_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StorageError> {
        let row = sqlx::query(&format!("{NOTIFICATION_SELECT} WHERE id = ?1"))
            .bind(id_i64("notification_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_notification_row).transpose()
    }

    async fn notifications_for(
        &self,
        recipient: UserId,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = sqlx::query(&format!(
            "{NOTIFICATION_SELECT} WHERE recipient_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(id_i64("recipient_id", recipient.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_notification_row).collect()
    }

    async fn unread_for(
        &self,
        recipient: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError> {
        let rows = sqlx::query(&format!(
            "{NOTIFICATION_SELECT} WHERE recipient_id = ?1 AND is_read = 0 \
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))
        .bind(id_i64("recipient_id", recipient.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_notification_row).collect()
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
        )
        .bind(id_i64("recipient_id", recipient.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        i64_to_u64("unread_count", count)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
            .bind(id_i64("notification_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, StorageError> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
        )
        .bind(id_i64("recipient_id", recipient.value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected())
    }
}
