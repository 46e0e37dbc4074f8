//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine;
use haven_gateway::companion::{FALLBACK_REPLY, NO_SPEECH_REPLY};
use haven_gateway::voice::NO_SPEECH_SENTINEL;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{
    Answer, Harness, STUB_REPLY, StubModel, StubSynthesizer, StubTranscriber, body_json, json_request,
    multipart_request,
};

fn decode(audio: &serde_json::Value) -> Vec<u8> {
    base64::engine::general_purpose::STANDARD
        .decode(audio.as_str().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_crisis_turn_returns_hotline() {
    let harness = Harness::hearing("I want to end it all");

    let response = harness
        .router()
        .oneshot(multipart_request("audio", b"fake-webm-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["text"].as_str().unwrap().contains("988"));
    assert_eq!(json["kind"], "crisis");
    assert_eq!(json["transcript"], "I want to end it all");
    assert!(!decode(&json["audio"]).is_empty());

    // alerted and recorded for the dashboard
    assert_eq!(harness.alerts.count(), 1);
    let dashboard = harness
        .router()
        .oneshot(Request::builder().uri("/dashboard_data").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let dashboard = body_json(dashboard).await;
    assert_eq!(dashboard["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["alerts"][0]["severity"], "high");
}

#[tokio::test]
async fn test_happy_turn_uses_generated_reply() {
    let harness = Harness::hearing("I'm so happy today!");

    let response = harness
        .router()
        .oneshot(multipart_request("audio", b"fake-webm-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], STUB_REPLY);
    assert_eq!(json["emotion"], "happy");
    assert_eq!(json["kind"], "normal");
    assert!(!json["text"].as_str().unwrap().contains("988"));

    let audio = decode(&json["audio"]);
    assert!(audio.starts_with(b"ID3"));
    assert_eq!(harness.alerts.count(), 0);
}

#[tokio::test]
async fn test_transcription_timeout_falls_back() {
    let harness = Harness::new(
        Arc::new(StubTranscriber::Hangs),
        StubModel::default(),
        Arc::new(StubSynthesizer::default()),
    );

    let response = harness
        .router()
        .oneshot(multipart_request("audio", b"fake-webm-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], FALLBACK_REPLY);
    assert_eq!(json["kind"], "fallback");
    assert!(json.get("transcript").is_none());
    assert!(!decode(&json["audio"]).is_empty());
    assert_eq!(harness.model.calls(), 0);
}

#[tokio::test]
async fn test_empty_audio_reports_no_speech() {
    let harness = Harness::new(
        Arc::new(StubTranscriber::Echo("unused".to_string())),
        StubModel::default(),
        Arc::new(StubSynthesizer::default()),
    );

    let response = harness
        .router()
        .oneshot(multipart_request("audio", b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["transcript"], NO_SPEECH_SENTINEL);
    assert_eq!(json["text"], NO_SPEECH_REPLY);
    assert_eq!(json["kind"], "no_speech");
    assert_eq!(harness.model.calls(), 0);
}

#[tokio::test]
async fn test_missing_audio_field_is_bad_request() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(multipart_request("recording", b"bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("audio"));
}

#[tokio::test]
async fn test_unspeakable_reply_is_bad_gateway_with_text() {
    let harness = Harness::new(
        StubTranscriber::hears("I feel worthless"),
        StubModel::default(),
        StubSynthesizer::broken(),
    );

    let response = harness
        .router()
        .oneshot(multipart_request("audio", b"fake-webm-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert!(json["text"].as_str().unwrap().contains("988"));
    assert_eq!(json["kind"], "crisis");
}

#[tokio::test]
async fn test_chat_text_endpoint() {
    let harness = Harness::hearing("unused");

    let response = harness
        .router()
        .oneshot(json_request("/chat_text", &json!({ "text": "Today was a good day" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], STUB_REPLY);
    assert_eq!(json["transcript"], "Today was a good day");
}

#[tokio::test]
async fn test_dashboard_empty_window_is_zero() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(Request::builder().uri("/dashboard_data").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["insights"]["average_mood_intensity"], 0.0);
    assert_eq!(json["insights"]["average_score"], 0.0);
    assert_eq!(json["insights"]["average_reaction_time_ms"], 0.0);
    assert!(json["moodScores"].as_array().unwrap().is_empty());
    assert!(json["dates"].as_array().unwrap().is_empty());
    assert!(json["mood_trends"].as_array().unwrap().is_empty());
    assert!(json["game_performance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_game_compact_shape() {
    let harness = Harness::hearing("hello");
    let router = harness.router();

    let response = router
        .clone()
        .oneshot(json_request(
            "/analyze_game",
            &json!({ "score": 7, "reactionTime": 420.0, "timestamp": "2025-05-01T12:00:00Z" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["mood_score"], 70);
    assert_eq!(json["percentile"], 100.0);
    assert!(json["analysis"].is_string());
    assert!(!json["recommendations"].as_array().unwrap().is_empty());

    let response = router
        .oneshot(json_request("/analyze_game", &json!({ "score": 3, "reactionTime": 500 })))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["mood_score"], 30);
    assert_eq!(json["percentile"], 50.0);
}

#[tokio::test]
async fn test_analyze_game_rejects_negative_reaction_time() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request("/analyze_game", &json!({ "score": 3, "reactionTime": -1 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_journal_uses_model() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request(
            "/analyze_journal",
            &json!({ "content": "Went hiking and felt great", "mood": "Happy", "intensity": 8 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sentiment"], "positive");
    assert_eq!(json["risk_level"], "low");
    assert_eq!(json["recommendations"][0], "Keep a gratitude list");
    assert!(json.get("crisis_resources").is_none());
    assert_eq!(harness.model.calls(), 1);
}

#[tokio::test]
async fn test_analyze_journal_crisis_skips_model() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request(
            "/analyze_journal",
            &json!({ "content": "There is no point anymore", "mood": "sad", "intensity": 9 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["risk_level"], "high");
    assert_eq!(json["sentiment"], "negative");
    let resources = json["crisis_resources"].as_array().unwrap();
    assert!(resources.iter().any(|r| r.as_str().unwrap().contains("988")));
    assert_eq!(harness.model.calls(), 0);
    assert_eq!(harness.alerts.count(), 1);
}

#[tokio::test]
async fn test_analyze_journal_model_failure_uses_defaults() {
    let model = StubModel {
        journal: Answer::Fails,
        ..StubModel::default()
    };
    let harness = Harness::new(StubTranscriber::hears("hello"), model, Arc::new(StubSynthesizer::default()));

    let response = harness
        .router()
        .oneshot(json_request(
            "/analyze_journal",
            &json!({ "content": "Deadlines everywhere", "mood": "Stressed", "intensity": 14 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sentiment"], "negative");
    assert_eq!(json["risk_level"], "moderate");

    // intensity clamped before storage
    let dashboard = harness
        .router()
        .oneshot(Request::builder().uri("/dashboard_data").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let dashboard = body_json(dashboard).await;
    assert_eq!(dashboard["mood_trends"][0]["intensity"], 10);
    assert_eq!(dashboard["moodScores"][0], 0);
}

#[tokio::test]
async fn test_analyze_journal_rejects_empty_content() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request(
            "/analyze_journal",
            &json!({ "content": "   ", "mood": "calm", "intensity": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_rejects_excess() {
    let harness = Harness::hearing("hello");
    let router = harness.router_with_limit(Some(1));

    let first = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert_eq!(json["error"], "too many requests");
}

#[tokio::test]
async fn test_malformed_game_body_is_json_bad_request() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request("/analyze_game", &json!({ "score": "seven", "reactionTime": 400 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_journal_missing_field_is_json_bad_request() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request("/analyze_journal", &json!({ "content": "x" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(harness.model.calls(), 0);
}

#[tokio::test]
async fn test_chat_without_multipart_is_json_bad_request() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(json_request("/chat_ai", &json!({ "audio": "not a form" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_dashboard_bad_days_is_json_bad_request() {
    let harness = Harness::hearing("hello");

    let response = harness
        .router()
        .oneshot(Request::builder().uri("/dashboard_data?days=abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}
