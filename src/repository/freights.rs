use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::models::freight::{
    CreateFreightRequest, DriverFreight, Freight, FreightListing, FreightStatus, ShipperFreight,
};

pub struct FreightRepository;

impl FreightRepository {
    pub async fn insert(
        conn: &mut SqliteConnection,
        shipper_id: i64,
        data: &CreateFreightRequest,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO freights (
                shipper_id, cargo_type, cargo_description, weight_tons, required_vehicle_type,
                pickup_address, pickup_city, pickup_state, pickup_date, pickup_contact_name, pickup_contact_phone,
                delivery_address, delivery_city, delivery_state, delivery_date, delivery_contact_name, delivery_contact_phone,
                freight_value, payment_term_days, distance_km, notes, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(shipper_id)
        .bind(&data.cargo_type)
        .bind(&data.cargo_description)
        .bind(data.weight_tons)
        .bind(data.required_vehicle_type)
        .bind(&data.pickup_address)
        .bind(&data.pickup_city)
        .bind(&data.pickup_state)
        .bind(data.pickup_date)
        .bind(&data.pickup_contact_name)
        .bind(&data.pickup_contact_phone)
        .bind(&data.delivery_address)
        .bind(&data.delivery_city)
        .bind(&data.delivery_state)
        .bind(data.delivery_date)
        .bind(&data.delivery_contact_name)
        .bind(&data.delivery_contact_phone)
        .bind(data.freight_value)
        .bind(i64::from(data.payment_term_days.days()))
        .bind(data.distance_km)
        .bind(&data.notes)
        .bind(FreightStatus::Available)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Freight>> {
        let freight = sqlx::query_as::<_, Freight>("SELECT * FROM freights WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(freight)
    }

    pub async fn find_owned(
        conn: &mut SqliteConnection,
        id: i64,
        auth_user_id: &str,
    ) -> AppResult<Option<Freight>> {
        let freight = sqlx::query_as::<_, Freight>(
            r#"
            SELECT f.*
            FROM freights f
            JOIN shippers s ON f.shipper_id = s.id
            JOIN user_profiles up ON s.user_profile_id = up.id
            WHERE f.id = ? AND up.auth_user_id = ?
            "#,
        )
        .bind(id)
        .bind(auth_user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(freight)
    }

    pub async fn find_listing(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> AppResult<Option<FreightListing>> {
        let listing = sqlx::query_as::<_, FreightListing>(
            r#"
            SELECT f.*, s.company_name, s.trade_name
            FROM freights f
            JOIN shippers s ON f.shipper_id = s.id
            WHERE f.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(listing)
    }

    pub async fn list_available(conn: &mut SqliteConnection) -> AppResult<Vec<FreightListing>> {
        let listings = sqlx::query_as::<_, FreightListing>(
            r#"
            SELECT f.*, s.company_name, s.trade_name
            FROM freights f
            JOIN shippers s ON f.shipper_id = s.id
            WHERE f.status = ?
            ORDER BY f.pickup_date ASC, f.id ASC
            "#,
        )
        .bind(FreightStatus::Available)
        .fetch_all(&mut *conn)
        .await?;
        Ok(listings)
    }

    pub async fn list_for_shipper(
        conn: &mut SqliteConnection,
        shipper_id: i64,
    ) -> AppResult<Vec<ShipperFreight>> {
        let freights = sqlx::query_as::<_, ShipperFreight>(
            r#"
            SELECT f.*, d.vehicle_plate AS assigned_vehicle_plate
            FROM freights f
            LEFT JOIN freight_assignments fa ON fa.freight_id = f.id AND fa.status <> 'rejected'
            LEFT JOIN drivers d ON fa.driver_id = d.id
            WHERE f.shipper_id = ?
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(shipper_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(freights)
    }

    pub async fn list_for_driver(
        conn: &mut SqliteConnection,
        driver_id: i64,
    ) -> AppResult<Vec<DriverFreight>> {
        let freights = sqlx::query_as::<_, DriverFreight>(
            r#"
            SELECT f.*,
                fa.status AS assignment_status,
                fa.pickup_confirmed_at,
                fa.delivery_confirmed_at,
                s.company_name,
                s.trade_name
            FROM freight_assignments fa
            JOIN freights f ON fa.freight_id = f.id
            JOIN shippers s ON f.shipper_id = s.id
            WHERE fa.driver_id = ? AND fa.status <> 'rejected'
            ORDER BY f.pickup_date DESC, f.id DESC
            "#,
        )
        .bind(driver_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(freights)
    }

    // false when the freight already left `from`
    pub async fn transition_status(
        conn: &mut SqliteConnection,
        id: i64,
        from: FreightStatus,
        to: FreightStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE freights SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM freights WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
