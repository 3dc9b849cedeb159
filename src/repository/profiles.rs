use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::AppResult;
use crate::models::profile::{
    CreateDriverProfileRequest, CreateShipperProfileRequest, Driver, Role, Shipper, UserProfile,
};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn find_by_auth_user(
        conn: &mut SqliteConnection,
        auth_user_id: &str,
    ) -> AppResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, auth_user_id, role, profile_status, full_name, phone, created_at, updated_at
            FROM user_profiles
            WHERE auth_user_id = ?
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(profile)
    }

    pub async fn insert_profile(
        conn: &mut SqliteConnection,
        auth_user_id: &str,
        role: Role,
        full_name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user_profiles (auth_user_id, role, profile_status, full_name, phone, created_at, updated_at)
            VALUES (?, ?, 'active', ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(auth_user_id)
        .bind(role)
        .bind(full_name)
        .bind(phone)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn insert_driver(
        conn: &mut SqliteConnection,
        user_profile_id: i64,
        data: &CreateDriverProfileRequest,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO drivers (
                user_profile_id, cpf, birth_date, vehicle_type, vehicle_brand, vehicle_model,
                vehicle_plate, cargo_capacity, cnh_number, cnh_category, cnh_expiry, antt_number,
                pix_key, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_profile_id)
        .bind(&data.cpf)
        .bind(data.birth_date)
        .bind(data.vehicle_type)
        .bind(&data.vehicle_brand)
        .bind(&data.vehicle_model)
        .bind(&data.vehicle_plate)
        .bind(data.cargo_capacity)
        .bind(&data.cnh_number)
        .bind(&data.cnh_category)
        .bind(data.cnh_expiry)
        .bind(&data.antt_number)
        .bind(&data.pix_key)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn insert_shipper(
        conn: &mut SqliteConnection,
        user_profile_id: i64,
        data: &CreateShipperProfileRequest,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO shippers (
                user_profile_id, company_name, trade_name, cnpj, address_street, address_number,
                address_complement, address_city, address_state, address_zip, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_profile_id)
        .bind(&data.company_name)
        .bind(&data.trade_name)
        .bind(&data.cnpj)
        .bind(&data.address_street)
        .bind(&data.address_number)
        .bind(&data.address_complement)
        .bind(&data.address_city)
        .bind(&data.address_state)
        .bind(&data.address_zip)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    pub async fn find_driver_by_profile(
        conn: &mut SqliteConnection,
        user_profile_id: i64,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE user_profile_id = ?")
            .bind(user_profile_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(driver)
    }

    pub async fn find_shipper_by_profile(
        conn: &mut SqliteConnection,
        user_profile_id: i64,
    ) -> AppResult<Option<Shipper>> {
        let shipper =
            sqlx::query_as::<_, Shipper>("SELECT * FROM shippers WHERE user_profile_id = ?")
                .bind(user_profile_id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(shipper)
    }

    pub async fn find_driver_by_auth_user(
        conn: &mut SqliteConnection,
        auth_user_id: &str,
    ) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            SELECT d.*
            FROM drivers d
            JOIN user_profiles up ON d.user_profile_id = up.id
            WHERE up.auth_user_id = ?
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(driver)
    }

    pub async fn find_shipper_by_auth_user(
        conn: &mut SqliteConnection,
        auth_user_id: &str,
    ) -> AppResult<Option<Shipper>> {
        let shipper = sqlx::query_as::<_, Shipper>(
            r#"
            SELECT s.*
            FROM shippers s
            JOIN user_profiles up ON s.user_profile_id = up.id
            WHERE up.auth_user_id = ?
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(shipper)
    }

    pub async fn increment_completed_freights(
        conn: &mut SqliteConnection,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE drivers
            SET total_completed_freights = total_completed_freights + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(driver_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn increment_posted_freights(
        conn: &mut SqliteConnection,
        shipper_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE shippers
            SET total_posted_freights = total_posted_freights + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(shipper_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
