use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use serde::Serialize;

use crate::api::rest::{SuccessResponse, success};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::profile::{DetailedProfile, Role, UserProfile};
use crate::repository::ProfileRepository;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(current_user))
        .route("/api/users/profile", get(detailed_profile))
        .route("/api/logout", get(logout))
}

#[derive(Serialize)]
struct CurrentUserResponse {
    user: AuthUser,
    profile: Option<UserProfile>,
}

#[derive(Serialize)]
struct DetailedProfileResponse {
    profile: DetailedProfile,
}

async fn current_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<CurrentUserResponse>> {
    let mut conn = state.db.acquire().await?;
    let profile = ProfileRepository::find_by_auth_user(&mut conn, &user.id).await?;
    Ok(Json(CurrentUserResponse { user, profile }))
}

async fn detailed_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<DetailedProfileResponse>> {
    let mut conn = state.db.acquire().await?;
    let profile = ProfileRepository::find_by_auth_user(&mut conn, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;

    let (driver, shipper) = match profile.role {
        Role::Driver => (
            ProfileRepository::find_driver_by_profile(&mut conn, profile.id).await?,
            None,
        ),
        Role::Shipper => (
            None,
            ProfileRepository::find_shipper_by_profile(&mut conn, profile.id).await?,
        ),
    };

    Ok(Json(DetailedProfileResponse {
        profile: DetailedProfile {
            user_type: profile.role,
            full_name: profile.full_name,
            phone: profile.phone,
            email: user.email,
            driver,
            shipper,
        },
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    let cookie = Cookie::build((state.sessions.cookie_name().to_string(), ""))
        .path("/")
        .http_only(true)
        .build();

    (jar.remove(cookie), success())
}
