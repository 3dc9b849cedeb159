use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;

use crate::api::rest::extract::ValidatedJson;
use crate::api::rest::{SuccessResponse, success};
use crate::auth::AuthUser;
use crate::engine::transitions;
use crate::error::{AppError, AppResult};
use crate::models::assignment::ConfirmDeliveryRequest;
use crate::models::freight::{CreateFreightRequest, DriverFreight, FreightListing, ShipperFreight};
use crate::repository::{FreightRepository, ProfileRepository};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/freights", post(create_freight))
        .route("/api/freights/available", get(list_available))
        .route("/api/freights/shipper", get(list_shipper_freights))
        .route("/api/freights/driver", get(list_driver_freights))
        .route("/api/freights/:id", get(get_freight).delete(delete_freight))
        .route("/api/freights/:id/accept", post(accept_freight))
        .route("/api/freights/:id/confirm-pickup", post(confirm_pickup))
        .route("/api/freights/:id/confirm-delivery", post(confirm_delivery))
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Serialize)]
pub struct FreightsResponse<T> {
    pub freights: Vec<T>,
}

#[derive(Serialize)]
pub struct FreightResponse {
    pub freight: FreightListing,
}

async fn create_freight(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateFreightRequest>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let id = transitions::post_freight(&state, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn list_available(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<FreightsResponse<FreightListing>>> {
    let mut conn = state.db.acquire().await?;
    let freights = FreightRepository::list_available(&mut conn).await?;
    Ok(Json(FreightsResponse { freights }))
}

async fn list_shipper_freights(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<FreightsResponse<ShipperFreight>>> {
    let mut conn = state.db.acquire().await?;
    let shipper = ProfileRepository::find_shipper_by_auth_user(&mut conn, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("shipper profile not found".to_string()))?;

    let freights = FreightRepository::list_for_shipper(&mut conn, shipper.id).await?;
    Ok(Json(FreightsResponse { freights }))
}

async fn list_driver_freights(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<FreightsResponse<DriverFreight>>> {
    let mut conn = state.db.acquire().await?;
    let driver = ProfileRepository::find_driver_by_auth_user(&mut conn, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?;

    let freights = FreightRepository::list_for_driver(&mut conn, driver.id).await?;
    Ok(Json(FreightsResponse { freights }))
}

async fn get_freight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<FreightResponse>> {
    let mut conn = state.db.acquire().await?;
    let freight = FreightRepository::find_listing(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("freight {id} not found")))?;

    Ok(Json(FreightResponse { freight }))
}

async fn delete_freight(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::delete_freight(&state, &user, id).await?;
    Ok(success())
}

async fn accept_freight(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::accept_freight(&state, &user, id).await?;
    Ok(success())
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::confirm_pickup(&state, &user, id).await?;
    Ok(success())
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ConfirmDeliveryRequest>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::confirm_delivery(
        &state,
        &user,
        id,
        &payload.recipient_name,
        payload.signature_data.as_deref(),
    )
    .await?;
    Ok(success())
}
