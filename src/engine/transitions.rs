use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::db::WriteTx;
use crate::engine::lifecycle::{LifecycleEvent, Transition};
use crate::error::{AppError, AppResult};
use crate::models::assignment::{AssignmentStatus, FreightAssignment, FreightEvent};
use crate::models::freight::{CreateFreightRequest, Freight, FreightStatus};
use crate::models::profile::Driver;
use crate::repository::{AssignmentRepository, FreightRepository, ProfileRepository};
use crate::state::AppState;

const NOT_AVAILABLE: &str = "freight not available";
const NOT_OWNED: &str = "freight not found or unauthorized";

pub async fn post_freight(
    state: &AppState,
    user: &AuthUser,
    data: &CreateFreightRequest,
) -> AppResult<i64> {
    observed(state, "post", insert_freight(state, user, data)).await
}

pub async fn accept_freight(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
) -> AppResult<Transition> {
    let event = LifecycleEvent::Accept;
    observed(state, event.as_str(), accept(state, user, freight_id)).await
}

pub async fn confirm_assignment(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
) -> AppResult<Transition> {
    let event = LifecycleEvent::Confirm;
    observed(state, event.as_str(), review(state, user, freight_id, event)).await
}

pub async fn reject_assignment(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
) -> AppResult<Transition> {
    let event = LifecycleEvent::Reject;
    observed(state, event.as_str(), review(state, user, freight_id, event)).await
}

pub async fn confirm_pickup(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
) -> AppResult<Transition> {
    let event = LifecycleEvent::ConfirmPickup;
    observed(state, event.as_str(), pickup(state, user, freight_id)).await
}

pub async fn confirm_delivery(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
    recipient_name: &str,
    signature_data: Option<&str>,
) -> AppResult<Transition> {
    let event = LifecycleEvent::ConfirmDelivery;
    let delivery = deliver(state, user, freight_id, recipient_name, signature_data);
    observed(state, event.as_str(), delivery).await
}

pub async fn delete_freight(state: &AppState, user: &AuthUser, freight_id: i64) -> AppResult<()> {
    observed(state, "delete", remove(state, user, freight_id)).await
}

async fn insert_freight(
    state: &AppState,
    user: &AuthUser,
    data: &CreateFreightRequest,
) -> AppResult<i64> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let shipper = ProfileRepository::find_shipper_by_auth_user(&mut *tx, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("shipper profile not found".to_string()))?;

    let freight_id = FreightRepository::insert(&mut *tx, shipper.id, data, now).await?;
    ProfileRepository::increment_posted_freights(&mut *tx, shipper.id, now).await?;
    tx.commit().await?;

    info!(freight_id, shipper_id = shipper.id, "freight posted");
    publish(state, freight_id, "post", Some(FreightStatus::Available), None);
    Ok(freight_id)
}

async fn accept(state: &AppState, user: &AuthUser, freight_id: i64) -> AppResult<Transition> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let driver = caller_driver(&mut tx, user).await?;
    let freight = FreightRepository::find_by_id(&mut *tx, freight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_AVAILABLE.to_string()))?;

    let transition = freight
        .status
        .apply(LifecycleEvent::Accept)
        .map_err(|_| AppError::NotFound(NOT_AVAILABLE.to_string()))?;

    // Status guard; the partial unique index on active assignments backs it up.
    let moved = FreightRepository::transition_status(
        &mut *tx,
        freight_id,
        transition.from,
        transition.to,
        now,
    )
    .await?;
    if !moved {
        return Err(AppError::NotFound(NOT_AVAILABLE.to_string()));
    }

    AssignmentRepository::insert(&mut *tx, freight_id, driver.id, now)
        .await
        .map_err(|err| match err {
            AppError::Database(db_err) if is_unique_violation(&db_err) => {
                AppError::NotFound(NOT_AVAILABLE.to_string())
            }
            other => other,
        })?;
    tx.commit().await?;

    info!(freight_id, driver_id = driver.id, "freight accepted");
    publish_transition(state, freight_id, LifecycleEvent::Accept, &transition);
    Ok(transition)
}

async fn review(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
    event: LifecycleEvent,
) -> AppResult<Transition> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let freight = FreightRepository::find_owned(&mut *tx, freight_id, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_OWNED.to_string()))?;

    let assignment = AssignmentRepository::find_active_for_freight(&mut *tx, freight_id)
        .await?
        .ok_or_else(|| AppError::NotFound("assignment not found".to_string()))?;

    if assignment.status != AssignmentStatus::PendingConfirmation {
        return Err(AppError::Conflict(
            "assignment is not awaiting confirmation".to_string(),
        ));
    }

    let transition = apply_and_persist(&mut tx, &freight, event).await?;
    if event == LifecycleEvent::Confirm {
        AssignmentRepository::mark_confirmed(&mut *tx, assignment.id, now).await?;
    } else {
        AssignmentRepository::mark_rejected(&mut *tx, assignment.id, now).await?;
    }
    tx.commit().await?;

    info!(
        freight_id,
        assignment_id = assignment.id,
        driver_id = assignment.driver_id,
        event = %event,
        "assignment reviewed"
    );
    publish_transition(state, freight_id, event, &transition);
    Ok(transition)
}

async fn pickup(state: &AppState, user: &AuthUser, freight_id: i64) -> AppResult<Transition> {
    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let driver = caller_driver(&mut tx, user).await?;
    let (freight, assignment) = driver_assignment(&mut tx, &driver, freight_id).await?;

    let transition = apply_and_persist(&mut tx, &freight, LifecycleEvent::ConfirmPickup).await?;
    AssignmentRepository::mark_pickup(&mut *tx, assignment.id, now).await?;
    tx.commit().await?;

    info!(freight_id, driver_id = driver.id, "pickup confirmed");
    publish_transition(state, freight_id, LifecycleEvent::ConfirmPickup, &transition);
    Ok(transition)
}

async fn deliver(
    state: &AppState,
    user: &AuthUser,
    freight_id: i64,
    recipient_name: &str,
    signature_data: Option<&str>,
) -> AppResult<Transition> {
    let recipient_name = recipient_name.trim();
    if recipient_name.is_empty() {
        return Err(AppError::BadRequest(
            "recipient name is required".to_string(),
        ));
    }

    let now = Utc::now();
    let mut tx = WriteTx::begin(&state.db).await?;

    let driver = caller_driver(&mut tx, user).await?;
    let (freight, assignment) = driver_assignment(&mut tx, &driver, freight_id).await?;

    let transition = apply_and_persist(&mut tx, &freight, LifecycleEvent::ConfirmDelivery).await?;
    AssignmentRepository::mark_delivery(
        &mut *tx,
        assignment.id,
        recipient_name,
        signature_data,
        now,
    )
    .await?;
    ProfileRepository::increment_completed_freights(&mut *tx, driver.id, now).await?;
    tx.commit().await?;

    info!(freight_id, driver_id = driver.id, recipient_name, "delivery confirmed");
    publish_transition(state, freight_id, LifecycleEvent::ConfirmDelivery, &transition);
    Ok(transition)
}

async fn remove(state: &AppState, user: &AuthUser, freight_id: i64) -> AppResult<()> {
    let mut tx = WriteTx::begin(&state.db).await?;

    let freight = FreightRepository::find_owned(&mut *tx, freight_id, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_OWNED.to_string()))?;

    let active = AssignmentRepository::find_active_for_freight(&mut *tx, freight_id).await?;
    if active.is_some() || !freight.status.is_deletable() {
        return Err(AppError::Conflict(format!(
            "freight {freight_id} is {} and cannot be deleted",
            freight.status
        )));
    }

    let removed_assignments = AssignmentRepository::delete_for_freight(&mut *tx, freight_id).await?;
    FreightRepository::delete(&mut *tx, freight_id).await?;
    tx.commit().await?;

    info!(freight_id, removed_assignments, "freight deleted");
    publish(state, freight_id, "delete", None, None);
    Ok(())
}

async fn caller_driver(conn: &mut SqliteConnection, user: &AuthUser) -> AppResult<Driver> {
    ProfileRepository::find_driver_by_auth_user(&mut *conn, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))
}

async fn driver_assignment(
    conn: &mut SqliteConnection,
    driver: &Driver,
    freight_id: i64,
) -> AppResult<(Freight, FreightAssignment)> {
    let assignment = AssignmentRepository::find_active_for_freight(&mut *conn, freight_id)
        .await?
        .filter(|assignment| assignment.driver_id == driver.id)
        .ok_or_else(|| AppError::NotFound("assignment not found for driver".to_string()))?;

    if assignment.status != AssignmentStatus::Confirmed {
        return Err(AppError::Conflict(
            "assignment has not been confirmed by the shipper".to_string(),
        ));
    }

    let freight = FreightRepository::find_by_id(&mut *conn, freight_id)
        .await?
        .ok_or_else(|| AppError::NotFound("freight not found".to_string()))?;

    Ok((freight, assignment))
}

async fn apply_and_persist(
    conn: &mut SqliteConnection,
    freight: &Freight,
    event: LifecycleEvent,
) -> AppResult<Transition> {
    let transition = freight
        .status
        .apply(event)
        .map_err(|err| AppError::Conflict(err.to_string()))?;

    let moved = FreightRepository::transition_status(
        &mut *conn,
        freight.id,
        transition.from,
        transition.to,
        Utc::now(),
    )
    .await?;
    if !moved {
        return Err(AppError::Conflict(format!(
            "freight {} changed status concurrently",
            freight.id
        )));
    }

    Ok(transition)
}

async fn observed<T, F>(state: &AppState, event: &str, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let start = Instant::now();
    let result = operation.await;
    let elapsed = start.elapsed().as_secs_f64();

    match &result {
        Ok(_) => state.metrics.record_transition(event, "success", elapsed),
        Err(err) => {
            state.metrics.record_transition(event, "error", elapsed);
            warn!(event, error = %err, "freight transition failed");
        }
    }

    result
}

fn publish_transition(
    state: &AppState,
    freight_id: i64,
    event: LifecycleEvent,
    transition: &Transition,
) {
    publish(
        state,
        freight_id,
        event.as_str(),
        Some(transition.to),
        transition.assignment,
    );
}

fn publish(
    state: &AppState,
    freight_id: i64,
    event: &str,
    status: Option<FreightStatus>,
    assignment_status: Option<AssignmentStatus>,
) {
    let _ = state.freight_events_tx.send(FreightEvent {
        freight_id,
        event: event.to_string(),
        status,
        assignment_status,
        occurred_at: Utc::now(),
    });
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
