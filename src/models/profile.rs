use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Driver,
    Shipper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VehicleType {
    Truck,
    SemiTruck,
    BoxTruck,
    Flatbed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub auth_user_id: String,
    pub role: Role,
    pub profile_status: String,
    pub full_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: i64,
    pub user_profile_id: i64,
    pub cpf: String,
    pub birth_date: NaiveDate,
    pub vehicle_type: VehicleType,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub cargo_capacity: f64,
    pub cnh_number: String,
    pub cnh_category: String,
    pub cnh_expiry: NaiveDate,
    pub antt_number: String,
    pub pix_key: Option<String>,
    pub total_completed_freights: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shipper {
    pub id: i64,
    pub user_profile_id: i64,
    pub company_name: String,
    pub trade_name: Option<String>,
    pub cnpj: String,
    pub address_street: String,
    pub address_number: String,
    pub address_complement: Option<String>,
    pub address_city: String,
    pub address_state: String,
    pub address_zip: String,
    pub credit_rating: String,
    pub total_posted_freights: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverProfileRequest {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 11))]
    pub cpf: String,
    pub birth_date: NaiveDate,
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1))]
    pub vehicle_brand: String,
    #[validate(length(min = 1))]
    pub vehicle_model: String,
    #[validate(length(min = 7))]
    pub vehicle_plate: String,
    #[validate(custom = "crate::models::validate_positive")]
    pub cargo_capacity: f64,
    #[validate(length(min = 1))]
    pub cnh_number: String,
    #[validate(length(min = 1))]
    pub cnh_category: String,
    pub cnh_expiry: NaiveDate,
    #[validate(length(min = 1))]
    pub antt_number: String,
    pub pix_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipperProfileRequest {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub company_name: String,
    pub trade_name: Option<String>,
    #[validate(length(min = 14))]
    pub cnpj: String,
    #[validate(length(min = 1))]
    pub address_street: String,
    #[validate(length(min = 1))]
    pub address_number: String,
    pub address_complement: Option<String>,
    #[validate(length(min = 1))]
    pub address_city: String,
    #[validate(length(equal = 2))]
    pub address_state: String,
    #[validate(length(min = 8))]
    pub address_zip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedProfile {
    pub user_type: Role,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper: Option<Shipper>,
}
