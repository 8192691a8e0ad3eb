use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::decimal::Money;
use crate::model::ids::{SponsorshipId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SponsorshipError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("a sponsor cannot sponsor themselves")]
    SelfSponsorship,
}

/// Organisation details for a sponsor user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorProfile {
    pub user_id: UserId,
    pub organization_name: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub total_funds_provided: Money,
}

impl SponsorProfile {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            organization_name: None,
            contact_person: None,
            contact_email: None,
            total_funds_provided: Money::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSponsorship {
    pub sponsor_id: UserId,
    pub student_id: UserId,
    pub amount_funded: Money,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl NewSponsorship {
    /// An active, open-ended sponsorship.
    ///
    /// # Errors
    ///
    /// Returns `SponsorshipError::SelfSponsorship` if sponsor and student are the same user.
    pub fn new(
        sponsor_id: UserId,
        student_id: UserId,
        amount_funded: Money,
        start_date: NaiveDate,
    ) -> Result<Self, SponsorshipError> {
        if sponsor_id == student_id {
            return Err(SponsorshipError::SelfSponsorship);
        }
        Ok(Self {
            sponsor_id,
            student_id,
            amount_funded,
            start_date,
            end_date: None,
            is_active: true,
            notes: None,
        })
    }

    /// # Errors
    ///
    /// Returns `SponsorshipError::EndBeforeStart` if `end` precedes the start date.
    pub fn ending(mut self, end: NaiveDate) -> Result<Self, SponsorshipError> {
        if end < self.start_date {
            return Err(SponsorshipError::EndBeforeStart {
                start: self.start_date,
                end,
            });
        }
        self.end_date = Some(end);
        Ok(self)
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into()).filter(|n| !n.trim().is_empty());
        self
    }

    #[must_use]
    pub fn assign_id(self, id: SponsorshipId) -> Sponsorship {
        Sponsorship {
            id,
            sponsor_id: self.sponsor_id,
            student_id: self.student_id,
            amount_funded: self.amount_funded,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            notes: self.notes,
        }
    }
}

/// Funding from a sponsor user to a student user.
///
/// `(sponsor_id, student_id, start_date)` is unique. Rows are never removed
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sponsorship {
    pub id: SponsorshipId,
    pub sponsor_id: UserId,
    pub student_id: UserId,
    pub amount_funded: Money,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_end_before_start() {
        let err = NewSponsorship::new(UserId::new(1), UserId::new(2), Money::ZERO, date(2024, 5, 1))
            .unwrap()
            .ending(date(2024, 4, 30))
            .unwrap_err();
        assert!(matches!(err, SponsorshipError::EndBeforeStart { .. }));
    }

    #[test]
    fn rejects_self_sponsorship() {
        let err = NewSponsorship::new(UserId::new(1), UserId::new(1), Money::ZERO, date(2024, 5, 1))
            .unwrap_err();
        assert_eq!(err, SponsorshipError::SelfSponsorship);
    }

    #[test]
    fn builder_sets_flags() {
        let s = NewSponsorship::new(UserId::new(1), UserId::new(2), Money::from_cents(500), date(2024, 1, 1))
            .unwrap()
            .ending(date(2024, 12, 31))
            .unwrap()
            .inactive()
            .with_notes("   ")
            .assign_id(SponsorshipId::new(4));
        assert!(!s.is_active);
        assert_eq!(s.notes, None);
        assert_eq!(s.end_date, Some(date(2024, 12, 31)));
    }
}
