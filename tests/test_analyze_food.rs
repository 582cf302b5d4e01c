use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use mockito::{Matcher, Mock, Server, ServerGuard};
use nutrition_vision::{
    server::create_router, AnalysisPipeline, FailureKind, FoodAnalyzer, NutritionAnalysis,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const VISION_MODEL: &str = "test/vision-model";
const STRUCTURING_MODEL: &str = "test/structuring-model";

const DESCRIPTION: &str = "Caesar salad: romaine (120g), grilled chicken breast (100g), \
    parmesan (15g), croutons (20g), dressing (30ml). Roughly 480 kcal.";

const ANALYSIS_JSON: &str = r#"{
  "calories": {"total": 480, "unit": "kcal"},
  "macronutrients": {"protein": "36g", "carbs": "18g", "fats": "29g", "fiber": "3g"},
  "items": [
    {"name": "romaine lettuce", "quantity": "120g"},
    {"name": "grilled chicken breast", "quantity": "100g"},
    {"name": "parmesan", "quantity": "15g"},
    {"name": "croutons", "quantity": "20g"},
    {"name": "caesar dressing", "quantity": "30ml"}
  ]
}"#;

fn completion(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

fn pipeline(server: &ServerGuard) -> Arc<AnalysisPipeline> {
    let pipeline = FoodAnalyzer::builder()
        .api_key("fake_api_key")
        .base_url(server.url())
        .vision_model(VISION_MODEL)
        .structuring_model(STRUCTURING_MODEL)
        .build()
        .expect("expected pipeline to build");
    Arc::new(pipeline)
}

async fn mock_stage(server: &mut ServerGuard, model: &str, status: usize, body: String) -> Mock {
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "model": model })))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn post_analyze(server: &ServerGuard, body: &str) -> (StatusCode, Value) {
    let app = create_router(pipeline(server));
    let request = Request::builder()
        .method("POST")
        .uri("/analyze-food")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("expected request to build");

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("expected response body");
    (status, serde_json::from_slice(&bytes).expect("expected json body"))
}

const REQUEST: &str = r#"{"image_url": "https://images.example.com/caesar.jpg"}"#;

#[tokio::test]
async fn test_both_stages_succeed() {
    let mut server = Server::new_async().await;
    let vision = mock_stage(&mut server, VISION_MODEL, 200, completion(DESCRIPTION)).await;
    let structuring = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": STRUCTURING_MODEL })),
            Matcher::Regex("Caesar salad".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(ANALYSIS_JSON))
        .create_async()
        .await;

    let (status, payload) = post_analyze(&server, REQUEST).await;

    assert_eq!(status, StatusCode::OK);
    let analysis: NutritionAnalysis =
        serde_json::from_value(payload.clone()).expect("expected nutrition analysis shape");
    assert_eq!(analysis.calories.unit, "kcal");
    assert_eq!(analysis.items.len(), 5);
    assert_eq!(payload["macronutrients"].as_object().unwrap().len(), 4);
    assert!(payload["calories"]["total"].is_u64());

    vision.assert_async().await;
    structuring.assert_async().await;
}

#[tokio::test]
async fn test_fenced_structuring_output_is_accepted() {
    let mut server = Server::new_async().await;
    let _vision = mock_stage(&mut server, VISION_MODEL, 200, completion(DESCRIPTION)).await;
    let _structuring = mock_stage(
        &mut server,
        STRUCTURING_MODEL,
        200,
        completion(&format!("```json\n{}\n```", ANALYSIS_JSON)),
    )
    .await;

    let (status, payload) = post_analyze(&server, REQUEST).await;

    assert_eq!(status, StatusCode::OK);
    let expected: Value = serde_json::from_str(ANALYSIS_JSON).unwrap();
    assert_eq!(payload, expected);
}

#[tokio::test]
async fn test_missing_image_url() {
    let server = Server::new_async().await;

    let (status, payload) = post_analyze(&server, r#"{"url": "https://example.com/a.jpg"}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"], "Validation failed");
    assert_eq!(payload["message"], "image_url: Missing data for required field.");
}

#[tokio::test]
async fn test_malformed_url_never_reaches_models() {
    let mut server = Server::new_async().await;
    let upstream = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let (status, payload) = post_analyze(&server, r#"{"image_url": "not-a-url"}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"], "Validation failed");
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_vision_error_object() {
    let mut server = Server::new_async().await;
    let _vision = mock_stage(
        &mut server,
        VISION_MODEL,
        200,
        json!({"error": {"message": "Unable to fetch image", "code": 400}}).to_string(),
    )
    .await;
    let structuring = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "model": STRUCTURING_MODEL })))
        .expect(0)
        .create_async()
        .await;

    let (status, payload) = post_analyze(&server, REQUEST).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"], "Vision analysis failed");
    assert_eq!(payload["message"], "Vision model error: Unable to fetch image");
    structuring.assert_async().await;
}

#[tokio::test]
async fn test_structuring_returns_prose() {
    let mut server = Server::new_async().await;
    let _vision = mock_stage(&mut server, VISION_MODEL, 200, completion(DESCRIPTION)).await;
    let _structuring = mock_stage(
        &mut server,
        STRUCTURING_MODEL,
        200,
        completion("This salad has about 480 calories and lots of protein."),
    )
    .await;

    let (status, payload) = post_analyze(&server, REQUEST).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"], "Nutrition analysis failed");
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON response"));
    assert_eq!(
        payload["details"],
        "This salad has about 480 calories and lots of protein."
    );
}

#[tokio::test]
async fn test_stage_failures_have_distinct_categories() {
    let mut vision_server = Server::new_async().await;
    let _vision = mock_stage(&mut vision_server, VISION_MODEL, 502, "bad gateway".into()).await;
    let (vision_status, vision_payload) = post_analyze(&vision_server, REQUEST).await;

    let mut structuring_server = Server::new_async().await;
    let _ok = mock_stage(
        &mut structuring_server,
        VISION_MODEL,
        200,
        completion(DESCRIPTION),
    )
    .await;
    let _failing = mock_stage(
        &mut structuring_server,
        STRUCTURING_MODEL,
        502,
        "bad gateway".into(),
    )
    .await;
    let (structuring_status, structuring_payload) =
        post_analyze(&structuring_server, REQUEST).await;

    assert_eq!(vision_status, structuring_status);
    assert_eq!(vision_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_ne!(vision_payload["error"], structuring_payload["error"]);
}

#[tokio::test]
async fn test_partial_structured_output_is_rejected() {
    let mut server = Server::new_async().await;
    let _vision = mock_stage(&mut server, VISION_MODEL, 200, completion(DESCRIPTION)).await;
    let _structuring = mock_stage(
        &mut server,
        STRUCTURING_MODEL,
        200,
        completion(r#"{"calories": {"total": 480}, "macronutrients": {"protein": "36g"}}"#),
    )
    .await;

    let (status, payload) = post_analyze(&server, REQUEST).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["error"], "Validation failed");
    assert!(payload.get("calories").is_none());
}

#[tokio::test]
async fn test_vision_call_timeout_is_a_vision_failure() {
    // Accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let pipeline = FoodAnalyzer::builder()
        .api_key("fake_api_key")
        .base_url(format!("http://{}", addr))
        .vision_model(VISION_MODEL)
        .structuring_model(STRUCTURING_MODEL)
        .vision_timeout(Duration::from_millis(200))
        .pipeline_timeout(Duration::from_secs(5))
        .build()
        .expect("expected pipeline to build");

    let err = pipeline
        .run(json!({"image_url": "https://images.example.com/caesar.jpg"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Vision);
    assert_eq!(err.to_string(), "Request timed out after 0.2 seconds");
    silent.abort();
}
