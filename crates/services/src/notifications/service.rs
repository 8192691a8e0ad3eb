use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use lms_core::model::{Notification, NotificationId, User};
use storage::repository::NotificationRepository;

use crate::error::NotificationServiceError;

/// Number of unread notifications shown in the header dropdown.
pub const UNREAD_PREVIEW_LIMIT: u32 = 5;

/// HTTP verb of the incoming request, as far as this service cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Other,
}

impl FromStr for RequestMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "GET" => RequestMethod::Get,
            "POST" => RequestMethod::Post,
            _ => RequestMethod::Other,
        })
    }
}

/// JSON body returned by the mark-as-read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP status the web layer should answer with.
    #[serde(skip)]
    pub status: u16,
}

impl MarkReadResponse {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
            status: 200,
        }
    }

    fn rejected(status: u16, message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_owned()),
            status,
        }
    }
}

/// Header badge data: the latest unread notifications and the unread total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadSummary {
    pub unread_notifications: Vec<Notification>,
    pub unread_notifications_count: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    #[must_use]
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// All of the user's notifications, newest first. Viewing the list marks
    /// every unread one as read.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` on repository failures.
    pub async fn list(&self, user: &User) -> Result<Vec<Notification>, NotificationServiceError> {
        let marked = self.notifications.mark_all_read(user.id).await?;
        if marked > 0 {
            tracing::debug!(user = %user.id, marked, "marked notifications read");
        }
        Ok(self.notifications.notifications_for(user.id).await?)
    }

    /// Marks one of the caller's notifications as read. Only POST is accepted.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` on repository failures.
    pub async fn mark_as_read(
        &self,
        user: &User,
        method: RequestMethod,
        id: NotificationId,
    ) -> Result<MarkReadResponse, NotificationServiceError> {
        if method != RequestMethod::Post {
            return Ok(MarkReadResponse::rejected(400, "Invalid request method."));
        }

        let owned = self
            .notifications
            .get_notification(id)
            .await?
            .filter(|n| n.recipient_id == user.id);
        if owned.is_none() {
            return Ok(MarkReadResponse::rejected(404, "Notification not found."));
        }

        self.notifications.mark_read(id).await?;
        Ok(MarkReadResponse::ok())
    }

    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` on repository failures.
    pub async fn unread_summary(
        &self,
        user: &User,
    ) -> Result<UnreadSummary, NotificationServiceError> {
        Ok(UnreadSummary {
            unread_notifications: self
                .notifications
                .unread_for(user.id, UNREAD_PREVIEW_LIMIT)
                .await?,
            unread_notifications_count: self.notifications.unread_count(user.id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lms_core::model::{NewNotification, NotificationType, UserDraft};
    use lms_core::roles::Role;
    use lms_core::time::fixed_now;
    use storage::Storage;

    async fn setup() -> (Storage, NotificationService, User, User) {
        let storage = Storage::in_memory();
        let mut users = Vec::new();
        for name in ["ada", "grace"] {
            users.push(
                storage
                    .users
                    .insert_user(
                        UserDraft::with_role(name, format!("{name}@example.com"), Role::Student)
                            .validate(fixed_now())
                            .unwrap(),
                    )
                    .await
                    .unwrap(),
            );
        }
        let grace = users.pop().unwrap();
        let ada = users.pop().unwrap();
        let service = NotificationService::new(Arc::clone(&storage.notifications));
        (storage, service, ada, grace)
    }

    async fn notify(storage: &Storage, user: &User, minutes: i64) -> Notification {
        storage
            .notifications
            .insert_notification(NewNotification {
                recipient_id: user.id,
                sender_id: None,
                notification_type: NotificationType::General,
                message: format!("note {minutes}"),
                link: None,
                created_at: fixed_now() + Duration::minutes(minutes),
            })
            .await
            .unwrap()
    }

    #[test]
    fn success_serializes_without_message() {
        let json = serde_json::to_value(MarkReadResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
    }

    #[tokio::test]
    async fn mark_as_read_rejects_non_post() {
        let (storage, service, ada, _) = setup().await;
        let note = notify(&storage, &ada, 0).await;

        let response = service
            .mark_as_read(&ada, RequestMethod::Get, note.id)
            .await
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.status, 400);
        assert_eq!(response.message.as_deref(), Some("Invalid request method."));

        let stored = storage.notifications.get_notification(note.id).await.unwrap();
        assert!(!stored.unwrap().is_read);
    }

    #[tokio::test]
    async fn mark_as_read_only_touches_own_notifications() {
        let (storage, service, ada, grace) = setup().await;
        let note = notify(&storage, &ada, 0).await;

        let response = service
            .mark_as_read(&grace, RequestMethod::Post, note.id)
            .await
            .unwrap();
        assert_eq!(response.status, 404);

        let response = service
            .mark_as_read(&ada, RequestMethod::Post, note.id)
            .await
            .unwrap();
        assert!(response.success);
        let stored = storage.notifications.get_notification(note.id).await.unwrap();
        assert!(stored.unwrap().is_read);
    }

    #[tokio::test]
    async fn listing_marks_everything_read() {
        let (storage, service, ada, grace) = setup().await;
        for minute in 0..3 {
            notify(&storage, &ada, minute).await;
        }
        notify(&storage, &grace, 0).await;

        let listed = service.list(&ada).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].message, "note 2");
        assert!(listed.iter().all(|n| n.is_read));

        assert_eq!(service.unread_summary(&ada).await.unwrap().unread_notifications_count, 0);
        assert_eq!(service.unread_summary(&grace).await.unwrap().unread_notifications_count, 1);
    }

    #[tokio::test]
    async fn unread_summary_caps_preview_at_five() {
        let (storage, service, ada, _) = setup().await;
        for minute in 0..7 {
            notify(&storage, &ada, minute).await;
        }
        let summary = service.unread_summary(&ada).await.unwrap();
        assert_eq!(summary.unread_notifications.len(), 5);
        assert_eq!(summary.unread_notifications_count, 7);
        assert_eq!(summary.unread_notifications[0].message, "note 6");
    }

    #[test]
    fn request_method_parses_case_insensitively() {
        assert_eq!("post".parse::<RequestMethod>().unwrap(), RequestMethod::Post);
        assert_eq!("DELETE".parse::<RequestMethod>().unwrap(), RequestMethod::Other);
    }
}
