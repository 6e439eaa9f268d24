mod helpers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ember::companion::geo::{Coordinates, DeviceLocation, Geolocator, HttpGeolocator};
use ember::companion::llm::{ChatModel, GeminiChat, LlmError};
use ember::companion::responder::{Companion, Session};
use ember::config::CompanionConfig;
use helpers::{clock_at, spawn_app};
use serde_json::{json, Value};

const GENERATE: &str = "/v1beta/models/gemini-test:generateContent";

/// Requests seen by a stub endpoint: headers and decoded body or query.
type Seen<T> = Arc<Mutex<Vec<(HeaderMap, T)>>>;

fn config_for(base: &str) -> CompanionConfig {
    CompanionConfig {
        api_key: "test-key".into(),
        model: "gemini-test".into(),
        api_base_url: format!("{base}/v1beta"),
        reverse_geocode_url: format!("{base}/reverse"),
        ip_lookup_url: format!("{base}/ip"),
        ip_context_url: format!("{base}/context"),
        user_agent: "ember-test/1".into(),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

async fn gemini_stub(status: StatusCode, reply: Value) -> (String, Seen<Value>) {
    let seen: Seen<Value> = Arc::default();
    let recorded = seen.clone();
    let app = Router::new().route(
        GENERATE,
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorded = recorded.clone();
            let reply = reply.clone();
            async move {
                recorded.lock().unwrap().push((headers, body));
                (status, Json(reply))
            }
        }),
    );
    (spawn_app(app).await, seen)
}

#[tokio::test]
async fn gemini_sends_key_and_prompt() {
    let (base, seen) = gemini_stub(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "Take a slow breath."}]}}]}),
    )
    .await;
    let chat = GeminiChat::from_config(&config_for(&base)).unwrap();

    let reply = chat.reply("I feel overwhelmed").await.unwrap();
    assert_eq!(reply, "Take a slow breath.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-goog-api-key"], "test-key");
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "I feel overwhelmed");
}

#[tokio::test]
async fn gemini_error_status_keeps_truncated_body() {
    let long_message = "quota exceeded ".repeat(100);
    let (base, _) = gemini_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": long_message}}),
    )
    .await;
    let chat = GeminiChat::from_config(&config_for(&base)).unwrap();

    match chat.reply("hello").await {
        Err(LlmError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.starts_with("{\"error\""));
            assert!(body.ends_with("..."));
            assert!(body.len() < long_message.len());
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn gemini_blocked_reply_is_empty() {
    let (base, _) = gemini_stub(
        StatusCode::OK,
        json!({"promptFeedback": {"blockReason": "SAFETY"}}),
    )
    .await;
    let chat = GeminiChat::from_config(&config_for(&base)).unwrap();

    assert!(matches!(chat.reply("hello").await, Err(LlmError::EmptyReply)));
}

/// Serves `/reverse`, `/ip` and `/context` with the given statuses and bodies.
async fn geo_stub(
    reverse: (StatusCode, Value),
    ip: (StatusCode, Value),
    context: (StatusCode, Value),
) -> (String, Seen<HashMap<String, String>>) {
    let seen: Seen<HashMap<String, String>> = Arc::default();
    let recorded = seen.clone();
    let app = Router::new()
        .route(
            "/reverse",
            get(
                move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| {
                    let recorded = recorded.clone();
                    let (status, body) = reverse.clone();
                    async move {
                        recorded.lock().unwrap().push((headers, query));
                        (status, Json(body))
                    }
                },
            ),
        )
        .route(
            "/ip",
            get(move || {
                let (status, body) = ip.clone();
                async move { (status, Json(body)) }
            }),
        )
        .route(
            "/context",
            get(move || {
                let (status, body) = context.clone();
                async move { (status, Json(body)) }
            }),
        );
    (spawn_app(app).await, seen)
}

const LONDON: Coordinates = Coordinates {
    latitude: 51.5,
    longitude: -0.12,
};

#[tokio::test]
async fn reverse_geocode_sends_coordinates_and_user_agent() {
    let (base, seen) = geo_stub(
        (StatusCode::OK, json!({"display_name": "Trafalgar Square, London"})),
        (StatusCode::OK, json!({})),
        (StatusCode::OK, json!({})),
    )
    .await;
    let geo = HttpGeolocator::from_config(&config_for(&base)).unwrap();

    let address = geo.reverse_geocode(LONDON).await;
    assert_eq!(address.as_deref(), Some("Trafalgar Square, London"));

    let seen = seen.lock().unwrap();
    let (headers, query) = &seen[0];
    assert_eq!(headers["user-agent"], "ember-test/1");
    assert_eq!(query["format"], "jsonv2");
    assert_eq!(query["lat"], "51.5");
    assert_eq!(query["lon"], "-0.12");
}

#[tokio::test]
async fn lookups_give_none_on_error_status() {
    let (base, _) = geo_stub(
        (StatusCode::INTERNAL_SERVER_ERROR, json!({"display_name": "ignored"})),
        (StatusCode::TOO_MANY_REQUESTS, json!({"city": "Austin", "region": "Texas"})),
        (StatusCode::OK, json!({"city": "Leeds", "region": "England"})),
    )
    .await;
    let geo = HttpGeolocator::from_config(&config_for(&base)).unwrap();

    assert!(geo.reverse_geocode(LONDON).await.is_none());
    assert!(geo.ip_place().await.is_none());

    let context = geo.context_place().await.unwrap();
    assert_eq!(context.to_string(), "Leeds, England");
}

#[tokio::test]
async fn unreachable_lookup_gives_none() {
    let mut config = config_for("http://127.0.0.1:9");
    config.request_timeout_secs = 1;
    let geo = HttpGeolocator::from_config(&config).unwrap();

    assert!(geo.ip_place().await.is_none());
}

#[tokio::test]
async fn companion_falls_back_to_ip_over_http() {
    let (base, _) = geo_stub(
        (StatusCode::OK, json!({"error": "Unable to geocode"})),
        (StatusCode::OK, json!({"city": "London", "region": "England"})),
        (StatusCode::OK, json!({})),
    )
    .await;
    let config = config_for(&base);
    let companion = Companion::new(
        HttpGeolocator::from_config(&config).unwrap(),
        GeminiChat::from_config(&config).unwrap(),
        config.fallback_location.clone(),
    );
    let mut session = Session::new();

    let reply = companion
        .respond(
            &mut session,
            "where is my location",
            DeviceLocation::At(LONDON),
            &clock_at("2024-01-01T10:00:00"),
        )
        .await;

    assert_eq!(
        reply.as_deref(),
        Some("I couldn't fetch the full address, but you are likely in **London, England**.")
    );
}
