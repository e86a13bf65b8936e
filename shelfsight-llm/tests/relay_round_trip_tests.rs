//! Relay client against a live relay router, and the OpenAI backend against a mock API

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use shelfsight_core::{EncodedImage, FieldSelection};
use shelfsight_llm::{
    relay_router, DescribeBackendKind, DescribeConfig, DescribeError, DescriptionBackend,
    DescriptionClient, OpenAiBackend, RelayBackend,
};
use std::sync::{Arc, Mutex};

struct RecordingBackend {
    answer: Result<&'static str, ()>,
    seen: Mutex<Vec<(usize, FieldSelection)>>,
}

#[async_trait]
impl DescriptionBackend for RecordingBackend {
    async fn describe_raw(
        &self,
        image: &EncodedImage,
        fields: &FieldSelection,
    ) -> shelfsight_llm::Result<String> {
        self.seen.lock().unwrap().push((image.bytes.len(), *fields));
        match self.answer {
            Ok(text) => Ok(text.to_string()),
            Err(()) => Err(DescribeError::InvalidResponse("model down".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn snapshot() -> EncodedImage {
    EncodedImage::jpeg(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), 2, 2)
}

async fn relay_client(answer: Result<&'static str, ()>) -> (Arc<RecordingBackend>, DescriptionClient) {
    let backend = Arc::new(RecordingBackend {
        answer,
        seen: Mutex::new(Vec::new()),
    });
    let url = serve(relay_router(backend.clone())).await;
    let config = DescribeConfig {
        backend: DescribeBackendKind::Relay,
        relay_url: url,
        ..Default::default()
    };
    let client = DescriptionClient::new(Arc::new(RelayBackend::new(&config).unwrap()));
    (backend, client)
}

#[tokio::test]
async fn test_relay_round_trip_composes_description() {
    let (backend, client) = relay_client(Ok("Milk, 1-2 months")).await;

    let description = client.describe(&snapshot(), &FieldSelection::default()).await.unwrap();
    assert_eq!(description, "Milk, expires in 1-2 months");

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 5);
    assert_eq!(seen[0].1, FieldSelection::default());
}

#[tokio::test]
async fn test_relay_forwards_field_selection() {
    let (backend, client) = relay_client(Ok("Horizon, Milk")).await;
    let fields = FieldSelection {
        brand: true,
        name: true,
        expiration_range: false,
        mold: false,
        recipe: false,
    };

    let description = client.describe(&snapshot(), &fields).await.unwrap();
    assert_eq!(description, "Horizon, Milk");
    assert_eq!(backend.seen.lock().unwrap()[0].1, fields);
}

#[tokio::test]
async fn test_relay_apology_becomes_try_again() {
    let (_, client) = relay_client(Ok("I'm sorry, I can't identify any object in the image.")).await;
    let description = client.describe(&snapshot(), &FieldSelection::default()).await.unwrap();
    assert_eq!(description, "Try again");
}

#[tokio::test]
async fn test_relay_backend_failure_is_500() {
    let (_, client) = relay_client(Err(())).await;
    let result = client.describe(&snapshot(), &FieldSelection::default()).await;
    match result {
        Err(DescribeError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "An error occurred while processing the image");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_relay_unreachable_is_http_error() {
    let config = DescribeConfig {
        relay_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..Default::default()
    };
    let backend = RelayBackend::new(&config).unwrap();
    let result = backend.describe_raw(&snapshot(), &FieldSelection::default()).await;
    assert!(matches!(result, Err(DescribeError::HttpRequest(_))));
}

async fn mock_openai(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<(String, Value)>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let router = Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorded = recorded.clone();
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                recorded.lock().unwrap().push((auth, body));
                (status, Json(reply))
            }
        }),
    );
    (serve(router).await, requests)
}

fn openai_config(base_url: String) -> DescribeConfig {
    DescribeConfig {
        backend: DescribeBackendKind::OpenAi,
        openai_base_url: base_url,
        api_key: Some("sk-test-0123456789".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_openai_backend_request_and_answer() {
    let (url, requests) = mock_openai(
        StatusCode::OK,
        json!({"choices": [{"message": {"role": "assistant", "content": "Milk, 1-2 months"}}]}),
    )
    .await;
    let client = DescriptionClient::new(Arc::new(OpenAiBackend::new(&openai_config(url)).unwrap()));

    let description = client.describe(&snapshot(), &FieldSelection::default()).await.unwrap();
    assert_eq!(description, "Milk, expires in 1-2 months");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth, "Bearer sk-test-0123456789");
    assert_eq!(body["model"], "gpt-4o");
    assert!(body["messages"][1]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_openai_rate_limit_and_auth_errors() {
    let (url, _) = mock_openai(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
    let backend = OpenAiBackend::new(&openai_config(url)).unwrap();
    assert!(matches!(
        backend.describe_raw(&snapshot(), &FieldSelection::default()).await,
        Err(DescribeError::RateLimit)
    ));

    let (url, _) = mock_openai(StatusCode::UNAUTHORIZED, json!({})).await;
    let backend = OpenAiBackend::new(&openai_config(url)).unwrap();
    assert!(matches!(
        backend.describe_raw(&snapshot(), &FieldSelection::default()).await,
        Err(DescribeError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn test_openai_empty_answer_becomes_try_again() {
    let (url, _) = mock_openai(
        StatusCode::OK,
        json!({"choices": [{"message": {"content": ""}}]}),
    )
    .await;
    let client = DescriptionClient::new(Arc::new(OpenAiBackend::new(&openai_config(url)).unwrap()));
    let description = client.describe(&snapshot(), &FieldSelection::default()).await.unwrap();
    assert_eq!(description, "Try again");
}
