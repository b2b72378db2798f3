use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use products_hr::{
    AiAssistant, AiSettings,
    ai::{EMPTY_QUESTION, NO_RESPONSE, NOT_CONFIGURED},
};
use serde_json::{Value, json};
use talento_tests::memory_db;
use tokio::net::TcpListener;

const API_KEY: &str = "test-key";

/// Serves `router` on an ephemeral port and returns its `/v1` base URL.
async fn serve(router: Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}/v1"))
}

async fn assistant(base_url: String, timeout: Duration) -> Result<AiAssistant> {
    let mut settings = AiSettings::new(API_KEY);
    settings.base_url = base_url;
    settings.timeout = timeout;
    Ok(AiAssistant::new(memory_db().await?, settings)?)
}

async fn answering(
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let well_formed = params.get("key").map(String::as_str) == Some(API_KEY)
        && body["generationConfig"]["maxOutputTokens"] == 1024
        && prompt.contains("PREGUNTA DEL USUARIO:\n¿Cuántos empleados hay?");
    if !well_formed {
        return (StatusCode::BAD_REQUEST, "unexpected request").into_response();
    }
    Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": "Hay 0 empleados." }] } }]
    }))
    .into_response()
}

#[tokio::test]
async fn model_text_is_returned_unchanged() -> Result<()> {
    let base_url = serve(Router::new().fallback(answering)).await?;
    let answer = assistant(base_url, Duration::from_secs(5))
        .await?
        .ask("¿Cuántos empleados hay?")
        .await;
    assert!(answer.success);
    assert_eq!(answer.response.as_deref(), Some("Hay 0 empleados."));
    assert!(answer.error.is_none());
    Ok(())
}

#[tokio::test]
async fn error_status_falls_back_to_generic_message() -> Result<()> {
    let router = Router::new()
        .fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "quota exceeded") });
    let answer = assistant(serve(router).await?, Duration::from_secs(5))
        .await?
        .ask("¿Cuántos empleados hay?")
        .await;
    assert!(!answer.success);
    assert_eq!(answer.error.as_deref(), Some(NO_RESPONSE));
    assert!(answer.response.is_none());
    Ok(())
}

#[tokio::test]
async fn reply_without_candidates_falls_back() -> Result<()> {
    let router = Router::new().fallback(|| async { Json(json!({ "candidates": [] })) });
    let answer = assistant(serve(router).await?, Duration::from_secs(5))
        .await?
        .ask("¿Cuántos empleados hay?")
        .await;
    assert_eq!(answer.error.as_deref(), Some(NO_RESPONSE));
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_falls_back() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let answer = assistant(format!("http://{addr}/v1"), Duration::from_secs(5))
        .await?
        .ask("¿Cuántos empleados hay?")
        .await;
    assert_eq!(answer.error.as_deref(), Some(NO_RESPONSE));
    Ok(())
}

#[tokio::test]
async fn slow_model_times_out() -> Result<()> {
    let router = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "tarde" }] } }]
        }))
    });
    let answer = assistant(serve(router).await?, Duration::from_millis(200))
        .await?
        .ask("¿Cuántos empleados hay?")
        .await;
    assert_eq!(answer.error.as_deref(), Some(NO_RESPONSE));
    Ok(())
}

#[tokio::test]
async fn missing_key_and_blank_question_skip_the_call() -> Result<()> {
    let db = memory_db().await?;
    let unconfigured = AiAssistant::new(db.clone(), AiSettings::new(""))?;
    let answer = unconfigured.ask("¿Cuántos empleados hay?").await;
    assert_eq!(answer.error.as_deref(), Some(NOT_CONFIGURED));

    let configured = AiAssistant::new(db, AiSettings::new(API_KEY))?;
    let answer = configured.ask("   ").await;
    assert_eq!(answer.error.as_deref(), Some(EMPTY_QUESTION));
    Ok(())
}
