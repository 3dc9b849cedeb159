use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use crate::api::rest::extract::ValidatedJson;
use crate::api::rest::{SuccessResponse, success};
use crate::auth::AuthUser;
use crate::db::WriteTx;
use crate::engine::transitions::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::models::profile::{CreateDriverProfileRequest, CreateShipperProfileRequest, Role};
use crate::repository::ProfileRepository;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profiles/driver", post(create_driver_profile))
        .route("/api/profiles/shipper", post(create_shipper_profile))
}

async fn create_driver_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateDriverProfileRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse>)> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let profile_id = insert_profile(
        &mut tx,
        &user,
        Role::Driver,
        &payload.full_name,
        &payload.phone,
    )
    .await?;
    let driver_id = ProfileRepository::insert_driver(&mut *tx, profile_id, &payload, now).await?;
    tx.commit().await?;

    info!(profile_id, driver_id, "driver profile created");
    Ok((StatusCode::CREATED, success()))
}

async fn create_shipper_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateShipperProfileRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse>)> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let profile_id = insert_profile(
        &mut tx,
        &user,
        Role::Shipper,
        &payload.full_name,
        &payload.phone,
    )
    .await?;
    let shipper_id = ProfileRepository::insert_shipper(&mut *tx, profile_id, &payload, now).await?;
    tx.commit().await?;

    info!(profile_id, shipper_id, "shipper profile created");
    Ok((StatusCode::CREATED, success()))
}

async fn insert_profile(
    conn: &mut SqliteConnection,
    user: &AuthUser,
    role: Role,
    full_name: &str,
    phone: &str,
) -> AppResult<i64> {
    if ProfileRepository::find_by_auth_user(&mut *conn, &user.id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("profile already exists".to_string()));
    }

    ProfileRepository::insert_profile(&mut *conn, &user.id, role, full_name, phone, Utc::now())
        .await
        .map_err(|err| match err {
            AppError::Database(db_err) if is_unique_violation(&db_err) => {
                AppError::BadRequest("profile already exists".to_string())
            }
            other => other,
        })
}
