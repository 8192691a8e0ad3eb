use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::decimal::Money;
use crate::model::ids::{CourseId, EnrollmentId, PaymentId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid payment status: {0}")]
pub struct PaymentStatusError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(PaymentStatusError(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub enrollment_id: Option<EnrollmentId>,
    pub payer_id: Option<UserId>,
    pub course_id: CourseId,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub status: PaymentStatus,
}

impl NewPayment {
    #[must_use]
    pub fn assign_id(self, id: PaymentId) -> CoursePayment {
        CoursePayment {
            id,
            enrollment_id: self.enrollment_id,
            payer_id: self.payer_id,
            course_id: self.course_id,
            amount: self.amount,
            payment_date: self.paid_at,
            transaction_id: self.transaction_id,
            payment_method: self.payment_method,
            status: self.status,
        }
    }
}

/// A payment towards a course, made by a student or a sponsor.
///
/// `payer_id` becomes `None` when the paying user is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoursePayment {
    pub id: PaymentId,
    pub enrollment_id: Option<EnrollmentId>,
    pub payer_id: Option<UserId>,
    pub course_id: CourseId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub status: PaymentStatus,
}

impl CoursePayment {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}
