use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fluentblocks_backend::{build_router, AppState};

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::default());
    (build_router(state.clone()), state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn start(app: &Router, lesson: &str) -> String {
    let (status, body) = call(app, "POST", "/api/v1/sessions", Some(json!({ "lessonId": lesson }))).await;
    assert_eq!(status, StatusCode::OK);
    body["sessionId"].as_str().unwrap().to_string()
}

async fn select(app: &Router, sid: &str, step: usize, option: &str) -> (StatusCode, Value) {
    call(
        app,
        "POST",
        &format!("/api/v1/sessions/{sid}/select"),
        Some(json!({ "step": step, "option": option })),
    )
    .await
}

#[tokio::test]
async fn health_and_lessons() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, lessons) = call(&app, "GET", "/api/v1/lessons", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = lessons.as_array().unwrap().iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert_eq!(ids.first(), Some(&"present-simple"));
    assert!(ids.contains(&"modal-can"));

    let (status, lesson) = call(&app, "GET", "/api/v1/lessons/modal-can", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lesson["steps"][0]["isDisabled"], false);
    assert_eq!(lesson["steps"][1]["isDisabled"], true);
    assert_eq!(lesson["nextLessonId"], "past-simple");

    let (status, err) = call(&app, "GET", "/api/v1/lessons/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["success"], false);
    assert_eq!(err["code"], "NOT_FOUND");
}

#[tokio::test]
async fn building_she_can_play_the_guitar() {
    let (app, _) = app();
    let sid = start(&app, "modal-can").await;

    let (status, err) = select(&app, &sid, 2, "the_guitar").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "STEP_DISABLED");

    select(&app, &sid, 0, "she").await;
    let (_, after_verb) = select(&app, &sid, 1, "play").await;
    assert_eq!(after_verb["session"]["preview"], "She can play");
    assert_eq!(after_verb["session"]["gloss"], Value::Null);

    let (status, done) = select(&app, &sid, 2, "the_guitar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["session"]["complete"], true);
    assert_eq!(done["session"]["preview"], "She can play the guitar");
    assert_eq!(done["session"]["gloss"], "Ella toca la guitarra");

    // A new verb discards the complement chosen for the old one.
    let (_, changed) = select(&app, &sid, 1, "swim").await;
    assert_eq!(changed["cleared"], json!([2]));
    assert_eq!(changed["session"]["preview"], "She can swim");
    let extras: Vec<&str> = changed["session"]["steps"][2]["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["key"].as_str().unwrap())
        .collect();
    assert_eq!(extras, ["very_well", "fast"]);

    let (status, err) = select(&app, &sid, 2, "the_guitar").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "UNKNOWN_OPTION");
}

#[tokio::test]
async fn exercises_are_exact_match() {
    let (app, _) = app();
    let sid = start(&app, "present-simple").await;

    let (status, ex) = call(&app, "GET", &format!("/api/v1/sessions/{sid}/exercise"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ex["id"], "ps-1");
    assert_eq!(ex["tokens"].as_array().unwrap().len(), 5);

    let uri = format!("/api/v1/sessions/{sid}/answer");
    let (_, wrong) = call(
        &app,
        "POST",
        &uri,
        Some(json!({ "exerciseId": "ps-1", "tokens": ["you", "Do", "like", "apples", "?"] })),
    )
    .await;
    assert_eq!(wrong["correct"], false);
    assert_eq!(wrong["expected"], "Do you like apples ?");

    let (_, right) = call(
        &app,
        "POST",
        &uri,
        Some(json!({ "exerciseId": "ps-1", "tokens": ["Do", "you", "like", "apples", "?"] })),
    )
    .await;
    assert_eq!(right["correct"], true);
    assert_eq!(right["expected"], Value::Null);
    assert_eq!(right["solved"], 1);

    let (_, stats) = call(&app, "GET", &format!("/api/v1/sessions/{sid}/stats"), None).await;
    assert_eq!(stats["correctAnswers"], 1);
    assert_eq!(stats["incorrectAnswers"], 1);

    let (status, _) = call(&app, "POST", &format!("/api/v1/sessions/{sid}/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &format!("/api/v1/sessions/{sid}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn two_levels_trigger_feedback_once() {
    let (app, _) = app();
    for level in ["present-simple", "present-continuous"] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/progress",
            Some(json!({ "levelId": level, "completed": true, "score": 100, "attempts": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, fb) = call(&app, "GET", "/api/v1/feedback", None).await;
    assert_eq!(fb["levelsCompleted"], 2);
    assert_eq!(fb["showFeedbackModal"], true);

    let (_, fb) = call(&app, "POST", "/api/v1/feedback/shown", None).await;
    assert_eq!(fb["showFeedbackModal"], false);
    assert_eq!(fb["hasShownFeedback"], true);

    let (_, fb) = call(
        &app,
        "POST",
        "/api/v1/progress",
        Some(json!({ "levelId": "future-going-to", "completed": true, "score": 70, "attempts": 3 })),
    )
    .await;
    assert_eq!(fb["feedback"]["showFeedbackModal"], false);
    assert_eq!(fb["nextLessonId"], "modal-can");

    let (_, saved) = call(&app, "GET", "/api/v1/progress", None).await;
    assert_eq!(saved.as_array().unwrap().len(), 3);

    let (status, fb) = call(&app, "DELETE", "/api/v1/feedback", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fb["levelsCompleted"], 0);
    assert_eq!(fb["hasShownFeedback"], false);
}

#[tokio::test]
async fn feedback_submission_and_disabled_audio() {
    let (app, state) = app();
    let (status, _) = call(&app, "POST", "/api/v1/feedback", Some(json!({ "rating": 9 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fb) = call(
        &app,
        "POST",
        "/api/v1/feedback",
        Some(json!({ "rating": 4, "comment": "nice", "appName": "FluentBlocks", "source": "modal" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fb["hasShownFeedback"], true);
    assert!(state.tracker.snapshot().has_shown_feedback);

    let (status, err) = call(&app, "POST", "/api/v1/audio", Some(json!({ "text": "She can swim." }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["code"], "AUDIO_DISABLED");
}
