use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::assignment::AssignmentStatus;
use crate::models::profile::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FreightStatus {
    Available,
    PendingConfirmation,
    Confirmed,
    InTransit,
    Delivered,
}

impl FreightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreightStatus::Available => "available",
            FreightStatus::PendingConfirmation => "pending_confirmation",
            FreightStatus::Confirmed => "confirmed",
            FreightStatus::InTransit => "in_transit",
            FreightStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for FreightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u16", into = "u16")]
pub enum PaymentTerm {
    Days30,
    Days45,
    Days60,
    Days90,
}

impl PaymentTerm {
    pub fn days(self) -> u16 {
        match self {
            PaymentTerm::Days30 => 30,
            PaymentTerm::Days45 => 45,
            PaymentTerm::Days60 => 60,
            PaymentTerm::Days90 => 90,
        }
    }
}

impl TryFrom<u16> for PaymentTerm {
    type Error = String;

    fn try_from(days: u16) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(PaymentTerm::Days30),
            45 => Ok(PaymentTerm::Days45),
            60 => Ok(PaymentTerm::Days60),
            90 => Ok(PaymentTerm::Days90),
            other => Err(format!(
                "unsupported payment term: {other}, expected 30/45/60/90"
            )),
        }
    }
}

impl From<PaymentTerm> for u16 {
    fn from(term: PaymentTerm) -> Self {
        term.days()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Freight {
    pub id: i64,
    pub shipper_id: i64,
    pub cargo_type: String,
    pub cargo_description: String,
    pub weight_tons: f64,
    pub required_vehicle_type: VehicleType,
    pub pickup_address: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub pickup_date: NaiveDate,
    pub pickup_contact_name: String,
    pub pickup_contact_phone: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_date: NaiveDate,
    pub delivery_contact_name: String,
    pub delivery_contact_phone: String,
    pub freight_value: f64,
    pub payment_term_days: i64,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub status: FreightStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FreightListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub freight: Freight,
    pub company_name: String,
    pub trade_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShipperFreight {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub freight: Freight,
    pub assigned_vehicle_plate: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DriverFreight {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub freight: Freight,
    pub assignment_status: AssignmentStatus,
    pub pickup_confirmed_at: Option<DateTime<Utc>>,
    pub delivery_confirmed_at: Option<DateTime<Utc>>,
    pub company_name: String,
    pub trade_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFreightRequest {
    #[validate(length(min = 1))]
    pub cargo_type: String,
    #[validate(length(min = 1))]
    pub cargo_description: String,
    #[validate(custom = "crate::models::validate_positive")]
    pub weight_tons: f64,
    pub required_vehicle_type: VehicleType,
    #[validate(length(min = 1))]
    pub pickup_address: String,
    #[validate(length(min = 1))]
    pub pickup_city: String,
    #[validate(length(equal = 2))]
    pub pickup_state: String,
    pub pickup_date: NaiveDate,
    #[validate(length(min = 1))]
    pub pickup_contact_name: String,
    #[validate(length(min = 1))]
    pub pickup_contact_phone: String,
    #[validate(length(min = 1))]
    pub delivery_address: String,
    #[validate(length(min = 1))]
    pub delivery_city: String,
    #[validate(length(equal = 2))]
    pub delivery_state: String,
    pub delivery_date: NaiveDate,
    #[validate(length(min = 1))]
    pub delivery_contact_name: String,
    #[validate(length(min = 1))]
    pub delivery_contact_phone: String,
    #[validate(custom = "crate::models::validate_positive")]
    pub freight_value: f64,
    pub payment_term_days: PaymentTerm,
    #[validate(range(min = 0.0))]
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}
