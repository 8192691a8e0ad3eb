use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{NotificationId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid notification type: {0}")]
pub struct NotificationTypeError(pub String);

/// The closed set of in-app notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    CourseDeadline,
    AssessmentResult,
    NewAssignment,
    ProgressReport,
    EngagementAlert,
    General,
}

impl NotificationType {
    pub const ALL: [NotificationType; 6] = [
        NotificationType::CourseDeadline,
        NotificationType::AssessmentResult,
        NotificationType::NewAssignment,
        NotificationType::ProgressReport,
        NotificationType::EngagementAlert,
        NotificationType::General,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::CourseDeadline => "course_deadline",
            NotificationType::AssessmentResult => "assessment_result",
            NotificationType::NewAssignment => "new_assignment",
            NotificationType::ProgressReport => "progress_report",
            NotificationType::EngagementAlert => "engagement_alert",
            NotificationType::General => "general",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            NotificationType::CourseDeadline => "Course Deadline",
            NotificationType::AssessmentResult => "Assessment Result",
            NotificationType::NewAssignment => "New Assignment",
            NotificationType::ProgressReport => "Progress Report",
            NotificationType::EngagementAlert => "Engagement Alert",
            NotificationType::General => "General Announcement",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = NotificationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| NotificationTypeError(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    #[must_use]
    pub fn assign_id(self, id: NotificationId) -> Notification {
        Notification {
            id,
            recipient_id: self.recipient_id,
            sender_id: self.sender_id,
            notification_type: self.notification_type,
            message: self.message,
            link: self.link,
            created_at: self.created_at,
            is_read: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Notification {
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_round_trip_through_str() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), t);
        }
        assert!("reminder".parse::<NotificationType>().is_err());
    }

    #[test]
    fn general_label() {
        assert_eq!(NotificationType::General.label(), "General Announcement");
    }
}
