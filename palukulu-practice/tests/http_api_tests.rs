//! Router-level tests for the practice, proverb, analysis and contribution
//! endpoints

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use palukulu_practice::attempt_log::{AttemptLog, JsonIndexAttemptLog, SqliteAttemptLog};
use palukulu_practice::audio_store::AudioStore;
use palukulu_practice::registry::SessionRegistry;
use palukulu_practice::services::TranscriptionService;
use palukulu_practice::session::SessionController;
use palukulu_practice::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

use helpers::{
    create_test_db, generate_test_wav, sample_catalog, single_proverb_catalog, FakeClassifier,
    FakeSynthesis, FixedTranscriber, SlowTranscriber,
};

struct TestApp {
    router: Router,
    state: AppState,
    _temp_dir: TempDir,
}

async fn create_test_app(transcriber: Arc<dyn TranscriptionService>) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let pool = create_test_db(temp_dir.path()).await;
    let log: Arc<dyn AttemptLog> = Arc::new(SqliteAttemptLog::new(pool.clone()));
    build_app(temp_dir, pool, log, transcriber)
}

fn build_app(
    temp_dir: TempDir,
    pool: sqlx::SqlitePool,
    log: Arc<dyn AttemptLog>,
    transcriber: Arc<dyn TranscriptionService>,
) -> TestApp {
    let controller = SessionController::new(
        single_proverb_catalog(),
        transcriber,
        log.clone(),
        AudioStore::new(temp_dir.path().join("user_audios")),
    );
    let state = AppState::new(pool, Arc::new(controller), log, Arc::new(FakeSynthesis))
        .with_max_upload_bytes(64 * 1024);

    TestApp {
        router: build_router(state.clone()),
        state,
        _temp_dir: temp_dir,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_audio(uri: &str, audio: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "audio/wav")
        .body(Body::from(audio))
        .unwrap()
}

async fn start_session(router: &Router) -> String {
    let (status, body) = send_json(router, post_empty("/api/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send_json(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "palukulu-practice");
    assert_eq!(body["proverbs"], 1);
    assert_eq!(body["attempt_log"], "sqlite");
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_idle_session_expires() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;
    let sessions = Arc::new(SessionRegistry::new(Duration::from_millis(50), 100));
    let router = build_router(app.state.clone().with_sessions(Arc::clone(&sessions)));

    let session_id = start_session(&router).await;
    assert_eq!(sessions.len().await, 1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(sessions.evict_idle().await, 1);
    assert_eq!(sessions.len().await, 0);

    let (status, body) = send_json(&router, get(&format!("/api/sessions/{}", session_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_session_count_is_capped() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;
    let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(3600), 3));
    let router = build_router(app.state.clone().with_sessions(Arc::clone(&sessions)));

    let first = start_session(&router).await;
    for _ in 0..20 {
        start_session(&router).await;
    }

    assert_eq!(sessions.len().await, 3);
    let (status, _) = send(&router, get(&format!("/api/sessions/{}", first))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send_json(&router, get("/health")).await;
    assert_eq!(health["live_sessions"], 3);
}

#[tokio::test]
async fn test_practice_page_served() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("/static/practice.js"));

    let (status, _) = send(&app.router, get("/static/practice.js")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_full_practice_turn() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send_json(&app.router, post_empty("/api/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["proverb"]["id"], 1);
    assert_eq!(body["proverb"]["original_text"], "ఆ");
    assert_eq!(body["state"], "awaiting_submission");
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let (status, result) = send_json(
        &app.router,
        post_audio(
            &format!("/api/sessions/{}/submit", session_id),
            generate_test_wav(0.2),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["proverb_id"], 1);
    assert_eq!(result["transcription"], "Could not understand audio");
    assert!(result["similarity_score"].as_f64().unwrap() < 0.1);

    let (status, listed) = send_json(&app.router, get("/api/proverbs/1/attempts")).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["attempt_id"], result["attempt_id"]);
    assert_eq!(listed[0]["audio_path"], result["audio_reference"]);

    let (status, body) = send_json(
        &app.router,
        get(&format!("/api/sessions/{}", session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "awaiting_submission");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send_json(
        &app.router,
        post_audio(&format!("/api/sessions/{}/submit", missing), generate_test_wav(0.1)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app.router, post_empty(&format!("/api/sessions/{}/next", missing))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_submit_on_same_session_is_409() {
    let app = create_test_app(Arc::new(SlowTranscriber {
        delay: Duration::from_millis(300),
        text: "ఆ".to_string(),
    }))
    .await;
    let session_id = start_session(&app.router).await;
    let uri = format!("/api/sessions/{}/submit", session_id);

    let first = {
        let router = app.router.clone();
        let request = post_audio(&uri, generate_test_wav(0.1));
        tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, body) = send_json(&app.router, post_audio(&uri, generate_test_wav(0.1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    assert_eq!(first.await.unwrap(), StatusCode::OK);
    assert_eq!(app.state.attempt_log.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_hard_transcription_failure_is_503_and_recorded() {
    let app = create_test_app(Arc::new(FixedTranscriber::failing("connection reset"))).await;
    let session_id = start_session(&app.router).await;

    let (status, body) = send_json(
        &app.router,
        post_audio(&format!("/api/sessions/{}/submit", session_id), generate_test_wav(0.1)),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(app.state.attempt_log.count().await.unwrap(), 0);

    let (_, health) = send_json(&app.router, get("/health")).await;
    assert!(health["last_error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_unsaved_attempt_returns_result_in_body() {
    let temp_dir = TempDir::new().unwrap();
    let pool = create_test_db(temp_dir.path()).await;
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let log: Arc<dyn AttemptLog> =
        Arc::new(JsonIndexAttemptLog::new(blocker.join("user_audio_index.json")));
    let app = build_app(temp_dir, pool, log, Arc::new(FixedTranscriber::recognized("ఆ")));
    let session_id = start_session(&app.router).await;

    let (status, body) = send_json(
        &app.router,
        post_audio(&format!("/api/sessions/{}/submit", session_id), generate_test_wav(0.1)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "NOT_SAVED");
    assert_eq!(body["result"]["proverb_id"], 1);
    assert_eq!(body["result"]["similarity_score"], 1.0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = create_test_app(Arc::new(FixedTranscriber::recognized("ఆ"))).await;
    let session_id = start_session(&app.router).await;

    let (status, _) = send(
        &app.router,
        post_audio(
            &format!("/api/sessions/{}/submit", session_id),
            vec![0u8; 128 * 1024],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.state.attempt_log.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_next_replaces_proverb() {
    let temp_dir = TempDir::new().unwrap();
    let pool = create_test_db(temp_dir.path()).await;
    let log: Arc<dyn AttemptLog> = Arc::new(SqliteAttemptLog::new(pool.clone()));
    let controller = SessionController::new(
        sample_catalog(),
        Arc::new(FixedTranscriber::unintelligible()),
        log.clone(),
        AudioStore::new(temp_dir.path().join("user_audios")),
    );
    let state = AppState::new(pool, Arc::new(controller), log, Arc::new(FakeSynthesis));
    let router = build_router(state);
    let session_id = start_session(&router).await;

    let (status, body) = send_json(&router, post_empty(&format!("/api/sessions/{}/next", session_id))).await;

    assert_eq!(status, StatusCode::OK);
    let id = body["proverb"]["id"].as_i64().unwrap();
    assert!((1..=3).contains(&id));
    assert_eq!(body["state"], "awaiting_submission");
}

#[tokio::test]
async fn test_proverb_lookup_and_speech() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send_json(&app.router, get("/api/proverbs/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_text"], "ఆ");

    let (status, _) = send_json(&app.router, get("/api/proverbs/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app.router.clone().oneshot(get("/api/proverbs/1/speech")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
}

#[tokio::test]
async fn test_analysis_requires_classifier() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send_json(
        &app.router,
        post_json("/api/analysis", json!({"text": "ఆకలి రుచి ఎరుగదు"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_analysis_uses_default_labels() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;
    let router = build_router(app.state.clone().with_classifier(Arc::new(FakeClassifier)));

    let (status, body) = send_json(
        &router,
        post_json("/api/analysis", json!({"text": "ఆకలి రుచి ఎరుగదు"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"][0]["label"], "wisdom");
    assert_eq!(body["labels"][1]["label"], "life");

    let (status, body) = send_json(
        &router,
        post_json("/api/analysis", json!({"text": "ఆ", "labels": ["humor"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"].as_array().unwrap().len(), 1);

    let (status, _) = send_json(&router, post_json("/api/analysis", json!({"text": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contribution_flow() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, user) = send_json(
        &app.router,
        post_json("/api/users", json!({"display_name": "Sita", "email": "sita@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = user["id"].as_i64().unwrap();

    let (status, proverb) = send_json(
        &app.router,
        post_json(
            "/api/contributions/proverbs",
            json!({
                "text": "అడగనిదే అమ్మైనా పెట్టదు",
                "contributor_id": user_id,
                "tags": ["wisdom", "region:Telangana"]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(proverb["tags"], json!(["wisdom", "region:Telangana"]));

    let (status, twister) = send_json(
        &app.router,
        post_json(
            "/api/contributions/tongue-twisters",
            json!({"text": "కాకి కాకి కడవల కాకి", "contributor_id": user_id, "difficulty": "hard"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(twister["difficulty"], "hard");

    let (status, listed) =
        send_json(&app.router, get(&format!("/api/users/{}/proverbs", user_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) =
        send_json(&app.router, get(&format!("/api/users/{}/tongue-twisters", user_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["text"], "కాకి కాకి కడవల కాకి");
}

#[tokio::test]
async fn test_contribution_for_missing_user_is_404() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/api/contributions/proverbs",
            json!({"text": "ఆ", "contributor_id": 4242}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send_json(&app.router, get("/api/users/4242")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_display_name_is_400() {
    let app = create_test_app(Arc::new(FixedTranscriber::unintelligible())).await;

    let (status, body) =
        send_json(&app.router, post_json("/api/users", json!({"display_name": " "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
