use lms_core::model::{NewSponsorship, SponsorProfile, Sponsorship, SponsorshipId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, money_from_i64, money_to_i64, ser};
use crate::repository::{SponsorshipRepository, StorageError};

const SPONSORSHIP_SELECT: &str = "SELECT id, sponsor_id, student_id, amount_cents, start_date, \
                                  end_date, is_active, notes FROM sponsorships";

fn map_sponsorship_row(row: &SqliteRow) -> Result<Sponsorship, StorageError> {
    Ok(Sponsorship {
        id: SponsorshipId::new(i64_to_u64("sponsorship_id", row.try_get("id").map_err(ser)?)?),
        sponsor_id: UserId::new(i64_to_u64("sponsor_id", row.try_get("sponsor_id").map_err(ser)?)?),
        student_id: UserId::new(i64_to_u64("student_id", row.try_get("student_id").map_err(ser)?)?),
        amount_funded: money_from_i64(row.try_get("amount_cents").map_err(ser)?)?,
        start_date: row.try_get("start_date").map_err(ser)?,
        end_date: row.try_get("end_date").map_err(ser)?,
        is_active: row.try_get("is_active").map_err(ser)?,
        notes: row.try_get("notes").map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl SponsorshipRepository for SqliteRepository {
    async fn insert_sponsorship(
        &self,
        sponsorship: NewSponsorship,
    ) -> Result<Sponsorship, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO sponsorships (sponsor_id, student_id, amount_cents, start_date, end_date, is_active, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_i64("sponsor_id", sponsorship.sponsor_id.value())?)
        .bind(id_i64("student_id", sponsorship.student_id.value())?)
        .bind(money_to_i64(sponsorship.amount_funded)?)
        .bind(sponsorship.start_date)
        .bind(sponsorship.end_date)
        .bind(sponsorship.is_active)
        .bind(&sponsorship.notes)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = SponsorshipId::new(i64_to_u64("sponsorship_id", res.last_insert_rowid())?);
        Ok(sponsorship.assign_id(id))
    }

    async fn sponsorships_for_sponsor(
        &self,
        sponsor: UserId,
    ) -> Result<Vec<Sponsorship>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SPONSORSHIP_SELECT} WHERE sponsor_id = ?1 ORDER BY start_date DESC, id DESC"
        ))
        .bind(id_i64("sponsor_id", sponsor.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_sponsorship_row).collect()
    }

    async fn list_sponsorships(&self) -> Result<Vec<Sponsorship>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SPONSORSHIP_SELECT} ORDER BY start_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_sponsorship_row).collect()
    }

    async fn upsert_profile(&self, profile: &SponsorProfile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO sponsor_profiles (user_id, organization_name, contact_person, contact_email, total_funds_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                organization_name = excluded.organization_name,
                contact_person = excluded.contact_person,
                contact_email = excluded.contact_email,
                total_funds_cents = excluded.total_funds_cents
            ",
        )
        .bind(id_i64("user_id", profile.user_id.value())?)
        .bind(&profile.organization_name)
        .bind(&profile.contact_person)
        .bind(&profile.contact_email)
        .bind(money_to_i64(profile.total_funds_provided)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_profile(&self, user: UserId) -> Result<Option<SponsorProfile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, organization_name, contact_person, contact_email, total_funds_cents
            FROM sponsor_profiles WHERE user_id = ?1
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(Some(SponsorProfile {
                user_id: user,
                organization_name: row.try_get("organization_name").map_err(ser)?,
                contact_person: row.try_get("contact_person").map_err(ser)?,
                contact_email: row.try_get("contact_email").map_err(ser)?,
                total_funds_provided: money_from_i64(
                    row.try_get("total_funds_cents").map_err(ser)?,
                )?,
            })),
            None => Ok(None),
        }
    }
}
