use super::*;
use std::{collections::BTreeSet, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::domain::{Activity, GroupSize};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    generate_bodies: Arc<Mutex<Vec<Value>>>,
    fetch_queries: Arc<Mutex<Vec<Option<String>>>>,
}

#[derive(serde::Deserialize)]
struct FetchQuery {
    user_id: Option<String>,
}

async fn handle_signup(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "User already exists!"})),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully!"})),
    )
}

async fn handle_login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials!"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful!",
            "token": "tok-42",
            "user_id": 42,
            "username": "asha"
        })),
    )
}

async fn handle_reset() -> Json<Value> {
    Json(json!({"message": "Password reset email sent successfully!"}))
}

async fn handle_preferences(Path(user_id): Path<i64>) -> (StatusCode, Json<Value>) {
    if user_id != 42 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No preferences found for this user"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "user_id": 42,
            "destination": "Jaipur",
            "start_date": "2026-11-02",
            "end_date": "2026-11-05",
            "budget": "30000",
            "activities": ["City Tour"],
            "group_size": "2"
        })),
    )
}

async fn handle_generate(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.generate_bodies.lock().await.push(body.clone());
    if body["destination"] == "Atlantis" {
        return (
            StatusCode::MULTI_STATUS,
            Json(json!({
                "error": "upstream down",
                "message": "Preferences saved, but itinerary generation failed.",
                "preferences": body
            })),
        );
    }
    (StatusCode::OK, Json(json!({
        "destination": body["destination"],
        "itinerary": [
            {"day": 1, "morning": "Visit Museum", "afternoon": "Lunch at Cafe", "evening": "Dinner at Restaurant"},
            {"day": 2, "morning": "Hike in Park", "afternoon": "Shopping", "evening": "Relax at Beach"}
        ]
    })))
}

async fn handle_fetch(
    State(state): State<ServerState>,
    Query(query): Query<FetchQuery>,
) -> Json<Value> {
    state.fetch_queries.lock().await.push(query.user_id);
    Json(json!({"itinerary": [{"day": 1, "morning": "Sunrise point"}]}))
}

async fn spawn_planner_server(state: ServerState) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/signup", post(handle_signup))
        .route("/api/login", post(handle_login))
        .route("/api/password-reset", post(handle_reset))
        .route("/api/trip-preferences/:user_id", get(handle_preferences))
        .route(
            "/generate-itinerary",
            post(handle_generate).get(handle_fetch),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn sample_preferences() -> TripPreferences {
    TripPreferences {
        user_id: UserId(42),
        destination: "Jaipur".into(),
        start_date: NaiveDate::from_ymd_opt(2026, 11, 2).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2026, 11, 5).expect("date"),
        budget_inr: 30000.0,
        activities: BTreeSet::from([Activity::CityTour, Activity::Hiking]),
        group_size: GroupSize::Small,
    }
}

#[tokio::test]
async fn login_maps_success_to_logged_in_outcome() {
    let server_url = spawn_planner_server(ServerState::default()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    let outcome = api
        .login(LoginRequest {
            email: "asha@example.com".into(),
            password: "secret".into(),
        })
        .await
        .expect("login");

    assert_eq!(
        outcome,
        AuthOutcome::LoggedIn {
            session: SessionRecord {
                token: Some("tok-42".into()),
                user_id: Some(UserId(42)),
                username: Some("asha".into()),
            },
            message: "Login successful!".into(),
        }
    );
}

#[tokio::test]
async fn server_error_body_is_carried_in_failure() {
    let server_url = spawn_planner_server(ServerState::default()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    let err = api
        .login(LoginRequest {
            email: "asha@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        ApiFailure::Status {
            status: 401,
            message: Some("Invalid credentials!".into()),
        }
    );

    let err = api
        .signup(SignupRequest {
            username: "asha".into(),
            email: "taken@example.com".into(),
            phone: "9999".into(),
            password: "secret".into(),
        })
        .await
        .expect_err("conflict");
    assert_eq!(err.display_message(), "User already exists!");
}

#[tokio::test]
async fn signup_and_reset_map_to_their_own_outcomes() {
    let server_url = spawn_planner_server(ServerState::default()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    let signup = api
        .signup(SignupRequest {
            username: "asha".into(),
            email: "asha@example.com".into(),
            phone: "9999".into(),
            password: "secret".into(),
        })
        .await
        .expect("signup");
    assert!(matches!(signup, AuthOutcome::Registered { .. }));

    let reset = api
        .request_password_reset(PasswordResetRequest {
            email: "asha@example.com".into(),
        })
        .await
        .expect("reset");
    assert_eq!(reset.message(), "Password reset email sent successfully!");
    assert!(matches!(reset, AuthOutcome::ResetEmailSent { .. }));
}

#[tokio::test]
async fn missing_preferences_are_not_an_error() {
    let server_url = spawn_planner_server(ServerState::default()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    let found = api.fetch_preferences(UserId(42)).await.expect("fetch");
    assert_eq!(
        found.and_then(|record| record.destination).as_deref(),
        Some("Jaipur")
    );

    let missing = api.fetch_preferences(UserId(5)).await.expect("fetch");
    assert!(missing.is_none());
}

#[tokio::test]
async fn generate_itinerary_posts_wire_shaped_preferences() {
    let state = ServerState::default();
    let server_url = spawn_planner_server(state.clone()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    let payload = api
        .generate_itinerary(&sample_preferences())
        .await
        .expect("generate");
    assert_eq!(payload.itinerary.len(), 2);
    assert_eq!(payload.destination.as_deref(), Some("Jaipur"));

    let bodies = state.generate_bodies.lock().await;
    let body = &bodies[0];
    assert_eq!(body["user_id"], json!(42));
    assert_eq!(body["start_date"], json!("2026-11-02"));
    assert_eq!(body["budget"], json!(30000.0));
    assert_eq!(body["group_size"], json!("3-5"));
    assert_eq!(body["activities"], json!(["Hiking", "City Tour"]));
}

#[tokio::test]
async fn generation_error_body_with_success_status_is_a_failure() {
    let server_url = spawn_planner_server(ServerState::default()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");
    let preferences = TripPreferences {
        destination: "Atlantis".into(),
        ..sample_preferences()
    };

    let err = api
        .generate_itinerary(&preferences)
        .await
        .expect_err("generation failed upstream");

    assert_eq!(
        err,
        ApiFailure::Status {
            status: 207,
            message: Some("upstream down".into()),
        }
    );
    assert_eq!(err.display_message(), "upstream down");
}

#[tokio::test]
async fn fetch_itinerary_passes_user_id_when_known() {
    let state = ServerState::default();
    let server_url = spawn_planner_server(state.clone()).await;
    let api = HttpTripPlannerApi::new(&server_url).expect("api");

    api.fetch_itinerary(Some(UserId(42))).await.expect("fetch");
    api.fetch_itinerary(None).await.expect("fetch anonymous");

    let queries = state.fetch_queries.lock().await;
    assert_eq!(*queries, vec![Some("42".to_string()), None]);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpTripPlannerApi::new(&format!("http://{addr}")).expect("api");
    let err = api.fetch_itinerary(None).await.expect_err("no server");
    assert!(matches!(err, ApiFailure::Transport(_)));
    assert_eq!(err.display_message(), "Request failed");
}

#[test]
fn base_url_keeps_path_prefix_and_rejects_other_schemes() {
    let url = normalize_base_url(" http://localhost:5000/planner ").expect("url");
    assert_eq!(url.as_str(), "http://localhost:5000/planner/");
    assert_eq!(
        url.join(LOGIN_PATH).expect("join").as_str(),
        "http://localhost:5000/planner/api/login"
    );

    assert!(normalize_base_url("ftp://localhost").is_err());
    assert!(normalize_base_url("   ").is_err());
}
