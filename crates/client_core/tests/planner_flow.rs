use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use client_core::{
    controller::preferences::PreferenceEdit, FileSessionStore, HttpTripPlannerApi, Navigation,
    PlannerRuntime, RuntimeConfig, Screen, Session, SessionStore, UiAction, Update,
};
use serde_json::{json, Value};
use shared::domain::{Activity, AuthMode, Coordinate, CredentialField, UserId};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Counters {
    generate: Arc<AtomicUsize>,
    fetch: Arc<AtomicUsize>,
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Email and password are required!"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful!",
            "token": "tok-flow",
            "user_id": 42,
            "username": "meera"
        })),
    )
}

async fn preferences(Path(user_id): Path<i64>) -> (StatusCode, Json<Value>) {
    if user_id != 42 {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "user_id": 42,
            "destination": "Jaipur",
            "start_date": "2026-11-02",
            "end_date": "2026-11-05",
            "budget": 30000,
            "activities": [],
            "group_size": "3-5"
        })),
    )
}

async fn generate(State(counters): State<Counters>, Json(body): Json<Value>) -> Json<Value> {
    counters.generate.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "destination": body["destination"],
        "itinerary": [
            {"day": 1, "morning": "Amber Fort", "morning_location": {"lat": 26.9855, "lng": 75.8513},
             "afternoon": "Jal Mahal", "evening": "Chokhi Dhani"},
            {"day": 2, "morning": "City Palace", "afternoon": "Hawa Mahal", "evening": "Bapu Bazaar"},
            {"day": 3, "morning": "Jantar Mantar", "evening": "Nahargarh"},
            {"day": 4, "morning": "Albert Hall"}
        ]
    }))
}

async fn fetch(State(counters): State<Counters>) -> Json<Value> {
    counters.fetch.fetch_add(1, Ordering::SeqCst);
    Json(json!({"itinerary": []}))
}

async fn spawn_server(counters: Counters) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/trip-preferences/:user_id", get(preferences))
        .route("/generate-itinerary", post(generate).get(fetch))
        .with_state(counters);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn login_to_revealed_itinerary() {
    let counters = Counters::default();
    let base_url = spawn_server(counters.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileSessionStore::new(dir.path().join("storage.json")));
    let session = Session::init(store.clone()).expect("session");
    let api = Arc::new(HttpTripPlannerApi::new(&base_url).expect("api"));
    let mut runtime = PlannerRuntime::new(
        api,
        session,
        RuntimeConfig {
            reveal_interval: Duration::from_millis(5),
        },
    );

    runtime.dispatch(UiAction::SwitchAuthMode(AuthMode::Login));
    runtime.dispatch(UiAction::EditCredential(
        CredentialField::Email,
        "meera@example.com".into(),
    ));
    runtime.dispatch(UiAction::EditCredential(
        CredentialField::Password,
        "hunter2".into(),
    ));
    assert_eq!(runtime.dispatch(UiAction::SubmitAuth), Update::RequestStarted);

    assert_eq!(
        runtime.step().await,
        Some(Update::Navigated(Screen::Preferences))
    );
    let persisted = store.load().expect("load").expect("session record");
    assert_eq!(persisted.token.as_deref(), Some("tok-flow"));
    assert_eq!(persisted.user_id, Some(UserId(42)));

    assert_eq!(runtime.step().await, Some(Update::PreferencesPrefilled));
    let form = runtime.preferences().expect("form").form();
    assert_eq!(form.destination, "Jaipur");
    assert_eq!(form.start_date, NaiveDate::from_ymd_opt(2026, 11, 2));
    assert!(form.activities.is_empty());

    let blocked = runtime.dispatch(UiAction::SubmitPreferences);
    assert!(matches!(blocked, Update::Rejected(_)));
    assert_eq!(
        runtime.preferences().and_then(|form| form.error_message()),
        Some("All fields are required!")
    );
    assert!(runtime.is_settled());
    assert_eq!(counters.generate.load(Ordering::SeqCst), 0);

    runtime.dispatch(UiAction::EditPreferences(PreferenceEdit::ToggleActivity(
        Activity::Adventure,
    )));
    assert_eq!(
        runtime.dispatch(UiAction::SubmitPreferences),
        Update::RequestStarted
    );

    let updates = runtime.run_until_settled().await;
    assert_eq!(updates[0], Update::Navigated(Screen::Itinerary));
    let revealed: Vec<_> = updates
        .iter()
        .filter_map(|update| match update {
            Update::DayRevealed { index } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(revealed, vec![0, 1, 2, 3]);

    let itinerary = runtime.itinerary().expect("itinerary screen");
    assert_eq!(itinerary.visible_days().len(), 4);
    assert_eq!(
        itinerary.map_center(),
        Some(Coordinate::new(26.9855, 75.8513))
    );
    assert_eq!(itinerary.markers().len(), 1);
    assert_eq!(counters.generate.load(Ordering::SeqCst), 1);
    assert_eq!(counters.fetch.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn itinerary_screen_without_handoff_fetches_once() {
    let counters = Counters::default();
    let base_url = spawn_server(counters.clone()).await;
    let session = Session::init(Arc::new(client_core::MemorySessionStore::new())).expect("session");
    let api = Arc::new(HttpTripPlannerApi::new(&base_url).expect("api"));
    let mut runtime = PlannerRuntime::new(api, session, RuntimeConfig::default());

    runtime.dispatch(UiAction::Navigate(Navigation::Itinerary { forwarded: None }));
    let updates = runtime.run_until_settled().await;

    assert_eq!(updates, vec![Update::ItineraryResolved { days: 0 }]);
    assert_eq!(counters.fetch.load(Ordering::SeqCst), 1);
}
