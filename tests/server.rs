//! HTTP session API with scripted agents.

mod common;

use common::*;
use learnie::cli::commands::{router, AppState};
use learnie::completion::CompletionReply;
use serde_json::{json, Value};
use std::sync::Arc;

async fn start_server(completion: Arc<ScriptedCompletion>) -> String {
    let state = Arc::new(AppState::new(factory(completion, StaticImageSearch::new())));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn new_session(client: &reqwest::Client, base: &str) -> String {
    let response = client
        .post(format!("{}/sessions", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"]["state"], "awaiting_topic");
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let base = start_server(ScriptedCompletion::new(vec![])).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_session_flow() {
    let completion = ScriptedCompletion::new(vec![
        lookups(3),
        CompletionReply::text(topic_json([&image_url(1), &image_url(2), &image_url(3)])),
        CompletionReply::text(choice_quiz_json()),
    ]);
    let base = start_server(completion).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let response = client
        .get(format!("{}/sessions/{}/topic", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = client
        .post(format!("{}/sessions/{}/messages", base, id))
        .json(&json!({ "message": "/topic I want to learn basic statistics" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["reply"]["kind"], "topic_created");
    assert_eq!(body["reply"]["topic"]["title"], "I want to learn basic statistics");
    assert_eq!(body["state"]["state"], "topic_ready");

    let topic: Value = client
        .get(format!("{}/sessions/{}/topic", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(topic["sections"].as_array().unwrap().len(), 3);

    let body: Value = client
        .post(format!("{}/sessions/{}/messages", base, id))
        .json(&json!({ "message": "/quiz 1.1" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["reply"]["kind"], "quiz");
    assert_eq!(body["reply"]["subtopic"], "1.1");

    let result: Value = client
        .post(format!("{}/sessions/{}/quiz-answers", base, id))
        .json(&json!({ "subtopic": "1.1", "answers": [0, 1, 2] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"], 100);
    assert_eq!(result["passed"], true);

    let body: Value = client
        .post(format!("{}/sessions/{}/game-score", base, id))
        .json(&json!({ "subtopic": "Mean and Median", "score": 80 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["game_score"], 80);
    assert_eq!(body["progress"], 56);

    let report: Value = client
        .get(format!("{}/sessions/{}/progress/1.1", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["score"], 56);
    assert_eq!(report["practice_attempts"], 2);
}

#[tokio::test]
async fn test_unknown_session_and_subtopic() {
    let completion = ScriptedCompletion::new(vec![
        lookups(3),
        CompletionReply::text(topic_json(["", "", ""])),
    ]);
    let base = start_server(completion).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!(
            "{}/sessions/00000000-0000-4000-8000-000000000000/messages",
            base
        ))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let id = new_session(&client, &base).await;
    client
        .post(format!("{}/sessions/{}/messages", base, id))
        .json(&json!({ "message": "/topic I want to learn basic statistics" }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/sessions/{}/progress/7.7", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!("{}/sessions/{}/quiz-answers", base, id))
        .json(&json!({ "subtopic": "1.1", "answers": [0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .delete(format!("{}/sessions/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    let response = client
        .get(format!("{}/sessions/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_planning_endpoints() {
    let completion = ScriptedCompletion::new(vec![
        CompletionReply::text(r#"[{"question": "Is this for work or for fun?"}]"#),
        lookups(3),
        CompletionReply::text(topic_json([&image_url(1), &image_url(2), &image_url(3)])),
        CompletionReply::text(
            r#"{"title": "Weighted Mean", "summary": "Averages where some values count more."}"#,
        ),
        CompletionReply::text(
            r#"[{"title": "Mode", "description": "The most common value."},
                {"title": "Trimmed Mean", "description": "Dropping the extremes first."},
                {"title": "Geometric Mean", "description": "Averaging growth rates."}]"#,
        ),
    ]);
    let base = start_server(completion.clone()).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body: Value = client
        .post(format!("{}/sessions/{}/clarifications", base, id))
        .json(&json!({ "request": "I want to learn basic statistics" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["questions"][0]["question"], "Is this for work or for fun?");

    let response = client
        .post(format!("{}/sessions/{}/topic", base, id))
        .json(&json!({
            "request": "I want to learn basic statistics",
            "learningStyle": { "materialSize": "small" },
            "clarifications": [{ "question": "Is this for work or for fun?", "answer": "Work" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"]["state"], "topic_ready");
    assert_eq!(body["reply"]["topic"]["learningStyle"]["materialSize"], "small");

    let response = client
        .post(format!("{}/sessions/{}/subtopics", base, id))
        .json(&json!({ "parent": "1.1", "context": "grades with credits" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "1.4");
    assert_eq!(body["subtopic"]["title"], "Weighted Mean");

    let body: Value = client
        .get(format!("{}/sessions/{}/subtopics/1.4/suggestions", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);

    let body: Value = client
        .post(format!("{}/sessions/{}/clarifications", base, id))
        .json(&json!({
            "request": "I want to learn basic statistics",
            "answered": [
                { "question": "a?", "answer": "x" },
                { "question": "b?", "answer": "y" },
                { "question": "c?", "answer": "z" }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["questions"].as_array().unwrap().is_empty());
    assert_eq!(completion.remaining(), 0);

    let response = client
        .post(format!("{}/sessions/{}/subtopics", base, id))
        .json(&json!({ "parent": "9.9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
