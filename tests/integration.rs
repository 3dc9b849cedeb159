use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use freight_market::api::rest::router;
use freight_market::auth::SessionKeys;
use freight_market::db::init_pool;
use freight_market::models::assignment::AssignmentStatus;
use freight_market::repository::AssignmentRepository;
use freight_market::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";
const SHIPPER: &str = "shipper-1";
const DRIVER: &str = "driver-1";
const OTHER_DRIVER: &str = "driver-2";
const OTHER_SHIPPER: &str = "shipper-2";

async fn setup() -> (axum::Router, Arc<AppState>) {
    let pool = init_pool("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .unwrap();
    let sessions = SessionKeys::new(SECRET, "session_token");
    let state = Arc::new(AppState::new(pool, sessions, 64));
    (router(state.clone()), state)
}

fn token(state: &AppState, user_id: &str) -> String {
    state
        .sessions
        .issue(user_id, &format!("{user_id}@example.com"), chrono::Duration::hours(1))
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn driver_profile(plate: &str) -> Value {
    json!({
        "fullName": "Carlos Souza",
        "phone": "+55 11 99999-0000",
        "cpf": "12345678901",
        "birthDate": "1985-04-12",
        "vehicleType": "semi_truck",
        "vehicleBrand": "Volvo",
        "vehicleModel": "FH 540",
        "vehiclePlate": plate,
        "cargoCapacity": 30.0,
        "cnhNumber": "0123456789",
        "cnhCategory": "E",
        "cnhExpiry": "2030-01-01",
        "anttNumber": "ANTT-42"
    })
}

fn shipper_profile() -> Value {
    json!({
        "fullName": "Ana Lima",
        "phone": "+55 11 98888-0000",
        "companyName": "Agro Norte Ltda",
        "tradeName": "Agro Norte",
        "cnpj": "12345678000199",
        "addressStreet": "Av. Brasil",
        "addressNumber": "1000",
        "addressCity": "Cuiabá",
        "addressState": "MT",
        "addressZip": "78000000"
    })
}

fn freight_payload(pickup_date: &str) -> Value {
    json!({
        "cargoType": "grains",
        "cargoDescription": "Soybeans in bulk",
        "weightTons": 28.5,
        "requiredVehicleType": "semi_truck",
        "pickupAddress": "Rod. BR-163 km 10",
        "pickupCity": "Sorriso",
        "pickupState": "MT",
        "pickupDate": pickup_date,
        "pickupContactName": "João",
        "pickupContactPhone": "+55 66 90000-0000",
        "deliveryAddress": "Porto de Santos, Armazém 3",
        "deliveryCity": "Santos",
        "deliveryState": "SP",
        "deliveryDate": "2026-11-20",
        "deliveryContactName": "Marta",
        "deliveryContactPhone": "+55 13 90000-0000",
        "freightValue": 18500.0,
        "paymentTermDays": 30
    })
}

async fn create_driver(app: &axum::Router, state: &AppState, user_id: &str, plate: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/profiles/driver",
            &token(state, user_id),
            driver_profile(plate),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn create_shipper(app: &axum::Router, state: &AppState, user_id: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/profiles/shipper",
            &token(state, user_id),
            shipper_profile(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn post_freight(app: &axum::Router, state: &AppState, pickup_date: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/freights",
            &token(state, SHIPPER),
            freight_payload(pickup_date),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn post(app: &axum::Router, state: &AppState, user_id: &str, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(authed_request("POST", uri, &token(state, user_id)))
        .await
        .unwrap()
        .status()
}

async fn freight_status(app: &axum::Router, id: i64) -> String {
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/freights/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["freight"]["status"]
        .as_str()
        .unwrap()
        .to_string()
}

// Shipper and driver profiles plus one posted freight.
async fn marketplace() -> (axum::Router, Arc<AppState>, i64) {
    let (app, state) = setup().await;
    create_shipper(&app, &state, SHIPPER).await;
    create_driver(&app, &state, DRIVER, "ABC1D23").await;
    let freight_id = post_freight(&app, &state, "2026-11-10").await;
    (app, state, freight_id)
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup().await;
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, state, freight_id) = marketplace().await;
    assert_eq!(
        post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await,
        StatusCode::OK
    );

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("websocket_subscribers"));
    assert!(body.contains(r#"freight_transitions_total{event="accept",outcome="success"} 1"#));
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _state) = setup().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/users/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());

    let response = app
        .oneshot(authed_request("POST", "/api/freights/1/accept", "not-a-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let (app, state) = setup().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/users/me")
        .header("cookie", format!("session_token={}", token(&state, DRIVER)))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], DRIVER);
    assert!(body["profile"].is_null());
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let (app, _state) = setup().await;
    let response = app.oneshot(get_request("/api/logout")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_token="));
    assert_eq!(body_json(response).await["success"], true);
}

#[tokio::test]
async fn second_profile_for_same_user_is_rejected() {
    let (app, state) = setup().await;
    create_driver(&app, &state, DRIVER, "ABC1D23").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/profiles/shipper",
            &token(&state, DRIVER),
            shipper_profile(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "profile already exists");

    let response = app
        .oneshot(authed_request("GET", "/api/users/me", &token(&state, DRIVER)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["profile"]["role"], "driver");
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let (app, state) = setup().await;

    let mut profile = driver_profile("ABC1D23");
    profile["cargoCapacity"] = json!(-3.0);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/profiles/driver",
            &token(&state, DRIVER),
            profile,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    create_shipper(&app, &state, SHIPPER).await;
    let mut freight = freight_payload("2026-11-10");
    freight["paymentTermDays"] = json!(15);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/freights",
            &token(&state, SHIPPER),
            freight,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/api/freights/available"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["freights"], json!([]));
}

#[tokio::test]
async fn driver_cannot_post_freight() {
    let (app, state) = setup().await;
    create_driver(&app, &state, DRIVER, "ABC1D23").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/freights",
            &token(&state, DRIVER),
            freight_payload("2026-11-10"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn freight_runs_through_full_lifecycle() {
    let (app, state, freight_id) = marketplace().await;
    let mut events = state.freight_events_tx.subscribe();

    let response = app
        .clone()
        .oneshot(get_request("/api/freights/available"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let listed = body["freights"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], freight_id);
    assert_eq!(listed[0]["company_name"], "Agro Norte Ltda");

    assert_eq!(
        post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await,
        StatusCode::OK
    );
    assert_eq!(freight_status(&app, freight_id).await, "pending_confirmation");

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/freights/driver",
            &token(&state, DRIVER),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["freights"][0]["id"], freight_id);
    assert_eq!(body["freights"][0]["status"], "pending_confirmation");
    assert_eq!(body["freights"][0]["assignment_status"], "pending_confirmation");

    let response = app
        .clone()
        .oneshot(get_request("/api/freights/available"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["freights"], json!([]));

    assert_eq!(
        post(
            &app,
            &state,
            SHIPPER,
            &format!("/api/freight-assignments/{freight_id}/confirm")
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(freight_status(&app, freight_id).await, "confirmed");

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/freights/shipper",
            &token(&state, SHIPPER),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["freights"][0]["assigned_vehicle_plate"], "ABC1D23");

    assert_eq!(
        post(
            &app,
            &state,
            DRIVER,
            &format!("/api/freights/{freight_id}/confirm-pickup")
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(freight_status(&app, freight_id).await, "in_transit");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/freights/{freight_id}/confirm-delivery"),
            &token(&state, DRIVER),
            json!({ "recipientName": "Jane Doe", "signatureData": "data:image/png;base64,AAAA" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(freight_status(&app, freight_id).await, "delivered");

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/freights/driver",
            &token(&state, DRIVER),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let mine = &body["freights"][0];
    assert_eq!(mine["status"], "delivered");
    assert_eq!(mine["assignment_status"], "confirmed");
    assert!(mine["pickup_confirmed_at"].is_string());
    assert!(mine["delivery_confirmed_at"].is_string());

    let mut conn = state.db.acquire().await.unwrap();
    let assignments = AssignmentRepository::list_for_freight(&mut conn, freight_id)
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].recipient_name.as_deref(), Some("Jane Doe"));
    assert_eq!(
        assignments[0].recipient_signature_data.as_deref(),
        Some("data:image/png;base64,AAAA")
    );
    assert!(assignments[0].confirmed_at.is_some());
    assert!(assignments[0].pickup_confirmed_at.is_some());
    assert!(assignments[0].delivery_confirmed_at.is_some());

    let seen: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|event| event.event)
        .collect();
    assert_eq!(
        seen,
        vec!["accept", "confirm", "confirm_pickup", "confirm_delivery"]
    );
}

#[tokio::test]
async fn profile_counters_track_posted_and_completed_freights() {
    let (app, state, freight_id) = marketplace().await;
    post_freight(&app, &state, "2026-11-12").await;

    post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await;
    post(
        &app,
        &state,
        SHIPPER,
        &format!("/api/freight-assignments/{freight_id}/confirm"),
    )
    .await;
    post(
        &app,
        &state,
        DRIVER,
        &format!("/api/freights/{freight_id}/confirm-pickup"),
    )
    .await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/freights/{freight_id}/confirm-delivery"),
            &token(&state, DRIVER),
            json!({ "recipientName": "Jane Doe" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/users/profile",
            &token(&state, SHIPPER),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["profile"]["user_type"], "shipper");
    assert_eq!(body["profile"]["shipper"]["total_posted_freights"], 2);
    assert_eq!(body["profile"]["shipper"]["credit_rating"], "A");

    let response = app
        .oneshot(authed_request(
            "GET",
            "/api/users/profile",
            &token(&state, DRIVER),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["profile"]["email"], "driver-1@example.com");
    assert_eq!(body["profile"]["driver"]["total_completed_freights"], 1);

    let mut conn = state.db.acquire().await.unwrap();
    let delivered = AssignmentRepository::find_active_for_freight(&mut conn, freight_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivered.recipient_name.as_deref(), Some("Jane Doe"));
    assert!(delivered.recipient_signature_data.is_none());
    assert!(delivered.delivery_confirmed_at.is_some());
}

#[tokio::test]
async fn accepting_a_taken_freight_is_not_found() {
    let (app, state, freight_id) = marketplace().await;
    create_driver(&app, &state, OTHER_DRIVER, "XYZ9K87").await;

    let accept = format!("/api/freights/{freight_id}/accept");
    assert_eq!(post(&app, &state, DRIVER, &accept).await, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request("POST", &accept, &token(&state, OTHER_DRIVER)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "freight not available");

    assert_eq!(
        post(&app, &state, DRIVER, "/api/freights/9999/accept").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn rejected_freight_returns_to_market() {
    let (app, state, freight_id) = marketplace().await;
    create_driver(&app, &state, OTHER_DRIVER, "XYZ9K87").await;

    let accept = format!("/api/freights/{freight_id}/accept");
    assert_eq!(post(&app, &state, DRIVER, &accept).await, StatusCode::OK);
    assert_eq!(
        post(
            &app,
            &state,
            SHIPPER,
            &format!("/api/freight-assignments/{freight_id}/reject")
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(freight_status(&app, freight_id).await, "available");

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/freights/driver",
            &token(&state, DRIVER),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["freights"], json!([]));

    assert_eq!(post(&app, &state, OTHER_DRIVER, &accept).await, StatusCode::OK);
    assert_eq!(freight_status(&app, freight_id).await, "pending_confirmation");

    let mut conn = state.db.acquire().await.unwrap();
    let statuses: Vec<AssignmentStatus> =
        AssignmentRepository::list_for_freight(&mut conn, freight_id)
            .await
            .unwrap()
            .into_iter()
            .map(|assignment| assignment.status)
            .collect();
    assert_eq!(
        statuses,
        vec![
            AssignmentStatus::Rejected,
            AssignmentStatus::PendingConfirmation
        ]
    );
    assert_eq!(statuses.iter().filter(|status| status.is_active()).count(), 1);
}

#[tokio::test]
async fn empty_recipient_leaves_freight_in_transit() {
    let (app, state, freight_id) = marketplace().await;
    post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await;
    post(
        &app,
        &state,
        SHIPPER,
        &format!("/api/freight-assignments/{freight_id}/confirm"),
    )
    .await;
    post(
        &app,
        &state,
        DRIVER,
        &format!("/api/freights/{freight_id}/confirm-pickup"),
    )
    .await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/freights/{freight_id}/confirm-delivery"),
            &token(&state, DRIVER),
            json!({ "recipientName": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(freight_status(&app, freight_id).await, "in_transit");
}

#[tokio::test]
async fn only_owner_can_review_assignment() {
    let (app, state, freight_id) = marketplace().await;
    create_shipper(&app, &state, OTHER_SHIPPER).await;
    post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/api/freight-assignments/{freight_id}/confirm"),
            &token(&state, OTHER_SHIPPER),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "freight not found or unauthorized"
    );
    assert_eq!(freight_status(&app, freight_id).await, "pending_confirmation");
}

#[tokio::test]
async fn out_of_order_transitions_conflict() {
    let (app, state, freight_id) = marketplace().await;
    post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await;

    let pickup = format!("/api/freights/{freight_id}/confirm-pickup");
    assert_eq!(post(&app, &state, DRIVER, &pickup).await, StatusCode::CONFLICT);
    assert_eq!(freight_status(&app, freight_id).await, "pending_confirmation");

    let confirm = format!("/api/freight-assignments/{freight_id}/confirm");
    assert_eq!(post(&app, &state, SHIPPER, &confirm).await, StatusCode::OK);
    assert_eq!(post(&app, &state, SHIPPER, &confirm).await, StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/freights/{freight_id}/confirm-delivery"),
            &token(&state, DRIVER),
            json!({ "recipientName": "Jane Doe" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(freight_status(&app, freight_id).await, "confirmed");
}

#[tokio::test]
async fn freight_with_active_assignment_cannot_be_deleted() {
    let (app, state, freight_id) = marketplace().await;
    let idle_freight = post_freight(&app, &state, "2026-11-15").await;
    post(&app, &state, DRIVER, &format!("/api/freights/{freight_id}/accept")).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/freights/{freight_id}"),
            &token(&state, SHIPPER),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/freights/{idle_freight}"),
            &token(&state, DRIVER),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/freights/{idle_freight}"),
            &token(&state, SHIPPER),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!("/api/freights/{idle_freight}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_on_shared_database_yield_single_winner() {
    const DRIVERS: usize = 8;
    const FREIGHTS: usize = 5;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("freight.db").display());
    let pool = init_pool(&url, DRIVERS as u32, Duration::from_secs(10))
        .await
        .unwrap();
    let sessions = SessionKeys::new(SECRET, "session_token");
    let state = Arc::new(AppState::new(pool, sessions, 64));
    let app = router(state.clone());

    create_shipper(&app, &state, SHIPPER).await;
    let drivers: Vec<String> = (0..DRIVERS).map(|n| format!("racer-{n}")).collect();
    for (n, driver) in drivers.iter().enumerate() {
        create_driver(&app, &state, driver, &format!("RAC{n:04}")).await;
    }

    for _ in 0..FREIGHTS {
        let freight_id = post_freight(&app, &state, "2026-11-10").await;
        let accept = format!("/api/freights/{freight_id}/accept");

        let handles: Vec<_> = drivers
            .iter()
            .map(|driver| {
                let request = authed_request("POST", &accept, &token(&state, driver));
                tokio::spawn(app.clone().oneshot(request))
            })
            .collect();

        let mut ok = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap().status() {
                StatusCode::OK => ok += 1,
                StatusCode::NOT_FOUND => not_found += 1,
                other => panic!("unexpected accept status {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(not_found, DRIVERS - 1);

        let mut conn = state.db.acquire().await.unwrap();
        let assignments = AssignmentRepository::list_for_freight(&mut conn, freight_id)
            .await
            .unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].status, AssignmentStatus::PendingConfirmation);
    }
}

#[tokio::test]
async fn available_freights_are_ordered_by_pickup_date() {
    let (app, state, first) = marketplace().await;
    let earlier = post_freight(&app, &state, "2026-11-01").await;

    let response = app
        .oneshot(get_request("/api/freights/available"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let ids: Vec<i64> = body["freights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|freight| freight["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![earlier, first]);
}

#[tokio::test]
async fn websocket_disconnect_releases_event_subscription() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (app, state) = setup().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /ws HTTP/1.1\r\n\
              Host: localhost\r\n\
              Upgrade: websocket\r\n\
              Connection: Upgrade\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
              Sec-WebSocket-Version: 13\r\n\r\n",
        )
        .await
        .unwrap();

    let mut head = Vec::new();
    let mut buf = [0u8; 512];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut buf).await.unwrap();
        assert!(read > 0, "connection closed during handshake");
        head.extend_from_slice(&buf[..read]);
    }
    assert!(head.starts_with(b"HTTP/1.1 101"));

    let connected = tokio::time::timeout(Duration::from_secs(5), async {
        while state.freight_events_tx.receiver_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(connected.is_ok());
    assert_eq!(state.metrics.websocket_subscribers.get(), 1);

    drop(stream);

    let released = tokio::time::timeout(Duration::from_secs(5), async {
        while state.freight_events_tx.receiver_count() > 0
            || state.metrics.websocket_subscribers.get() > 0
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(released.is_ok(), "subscription outlived the client");
}
