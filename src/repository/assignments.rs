use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::models::assignment::{AssignmentStatus, FreightAssignment};

pub struct AssignmentRepository;

impl AssignmentRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        freight_id: i64,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO freight_assignments (freight_id, driver_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(freight_id)
        .bind(driver_id)
        .bind(AssignmentStatus::PendingConfirmation)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn find_active_for_freight(
        conn: &mut SqliteConnection,
        freight_id: i64,
    ) -> AppResult<Option<FreightAssignment>> {
        let assignments = Self::list_for_freight(conn, freight_id).await?;
        Ok(assignments
            .into_iter()
            .find(|assignment| assignment.status.is_active()))
    }

    pub async fn list_for_freight(
        conn: &mut SqliteConnection,
        freight_id: i64,
    ) -> AppResult<Vec<FreightAssignment>> {
        let assignments = sqlx::query_as::<_, FreightAssignment>(
            "SELECT * FROM freight_assignments WHERE freight_id = ? ORDER BY id ASC",
        )
        .bind(freight_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(assignments)
    }

    pub async fn mark_confirmed(
        conn: &mut SqliteConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE freight_assignments SET status = ?, confirmed_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(AssignmentStatus::Confirmed)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn mark_rejected(
        conn: &mut SqliteConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE freight_assignments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(AssignmentStatus::Rejected)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn mark_pickup(
        conn: &mut SqliteConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE freight_assignments SET pickup_confirmed_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn mark_delivery(
        conn: &mut SqliteConnection,
        id: i64,
        recipient_name: &str,
        signature_data: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE freight_assignments
            SET delivery_confirmed_at = ?,
                recipient_name = ?,
                recipient_signature_data = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(recipient_name)
        .bind(signature_data)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn delete_for_freight(
        conn: &mut SqliteConnection,
        freight_id: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM freight_assignments WHERE freight_id = ?")
            .bind(freight_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
