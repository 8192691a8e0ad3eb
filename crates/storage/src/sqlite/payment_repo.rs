use lms_core::model::{
    CourseId, CoursePayment, EnrollmentId, Money, NewPayment, PaymentId, PaymentStatus, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{db_err, i64_to_u64, id_i64, money_from_i64, money_to_i64, ser};
use crate::repository::{PaymentRepository, StorageError};

const PAYMENT_SELECT: &str = "SELECT id, enrollment_id, payer_id, course_id, amount_cents, \
                              payment_date, transaction_id, payment_method, status \
                              FROM course_payments";

fn map_payment_row(row: &SqliteRow) -> Result<CoursePayment, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    Ok(CoursePayment {
        id: PaymentId::new(i64_to_u64("payment_id", row.try_get("id").map_err(ser)?)?),
        enrollment_id: row
            .try_get::<Option<i64>, _>("enrollment_id")
            .map_err(ser)?
            .map(|v| i64_to_u64("enrollment_id", v).map(EnrollmentId::new))
            .transpose()?,
        payer_id: row
            .try_get::<Option<i64>, _>("payer_id")
            .map_err(ser)?
            .map(|v| i64_to_u64("payer_id", v).map(UserId::new))
            .transpose()?,
        course_id: CourseId::new(i64_to_u64("course_id", row.try_get("course_id").map_err(ser)?)?),
        amount: money_from_i64(row.try_get("amount_cents").map_err(ser)?)?,
        payment_date: row.try_get("payment_date").map_err(ser)?,
        transaction_id: row.try_get("transaction_id").map_err(ser)?,
        payment_method: row.try_get("payment_method").map_err(ser)?,
        status: status.parse::<PaymentStatus>().map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl PaymentRepository for SqliteRepository {
    async fn insert_payment(&self, payment: NewPayment) -> Result<CoursePayment, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO course_payments (enrollment_id, payer_id, course_id, amount_cents, payment_date, transaction_id, payment_method, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(
            payment
                .enrollment_id
                .map(|e| id_i64("enrollment_id", e.value()))
                .transpose()?,
        )
        .bind(
            payment
                .payer_id
                .map(|p| id_i64("payer_id", p.value()))
                .transpose()?,
        )
        .bind(id_i64("course_id", payment.course_id.value())?)
        .bind(money_to_i64(payment.amount)?)
        .bind(payment.paid_at)
        .bind(&payment.transaction_id)
        .bind(&payment.payment_method)
        .bind(payment.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = PaymentId::new(i64_to_u64("payment_id", res.last_insert_rowid())?);
        Ok(payment.assign_id(id))
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<CoursePayment>, StorageError> {
        let row = sqlx::query(&format!("{PAYMENT_SELECT} WHERE id = ?1"))
            .bind(id_i64("payment_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_payment_row).transpose()
    }

    async fn payments_by_payer(&self, payer: UserId) -> Result<Vec<CoursePayment>, StorageError> {
        let rows = sqlx::query(&format!(
            "{PAYMENT_SELECT} WHERE payer_id = ?1 ORDER BY payment_date DESC, id DESC"
        ))
        .bind(id_i64("payer_id", payer.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_payment_row).collect()
    }

    async fn completed_total_for_payer(&self, payer: UserId) -> Result<Money, StorageError> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(amount_cents), 0) FROM course_payments
            WHERE payer_id = ?1 AND status = 'completed'
            ",
        )
        .bind(id_i64("payer_id", payer.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        money_from_i64(total)
    }
}
