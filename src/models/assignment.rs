use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::freight::FreightStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AssignmentStatus {
    PendingConfirmation,
    Confirmed,
    Rejected,
}

impl AssignmentStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, AssignmentStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FreightAssignment {
    pub id: i64,
    pub freight_id: i64,
    pub driver_id: i64,
    pub status: AssignmentStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub pickup_confirmed_at: Option<DateTime<Utc>>,
    pub delivery_confirmed_at: Option<DateTime<Utc>>,
    pub recipient_name: Option<String>,
    pub recipient_signature_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryRequest {
    #[serde(default)]
    pub recipient_name: String,
    #[validate(length(max = 1_000_000))]
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightEvent {
    pub freight_id: i64,
    pub event: String,
    pub status: Option<FreightStatus>,
    pub assignment_status: Option<AssignmentStatus>,
    pub occurred_at: DateTime<Utc>,
}
