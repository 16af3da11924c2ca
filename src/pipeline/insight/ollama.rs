use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::InsightError;
use crate::pipeline::{http_client, join_url};

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at a local Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InsightError> {
        let client =
            http_client(timeout_secs).map_err(|e| InsightError::ServiceError(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, InsightError> {
        let url = join_url(&self.base_url, "api/generate");
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| InsightError::from_transport(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InsightError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| InsightError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn backend(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::pipeline::test_server::TestServer;

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn generate_posts_non_streaming_request() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let seen_in_handler = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let seen = Arc::clone(&seen_in_handler);
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({"model": "medgemma", "response": "Research options: ...", "done": true}))
                }
            }),
        );
        let server = TestServer::spawn(router);

        let client = OllamaClient::new(&server.base_url, 5).unwrap();
        let text = client.generate("medgemma", "prompt", "system").unwrap();
        assert_eq!(text, "Research options: ...");

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "medgemma");
        assert_eq!(body["system"], "system");
    }

    #[test]
    fn model_not_found_is_http_error() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "model 'medgemma' not found"})),
                )
            }),
        );
        let server = TestServer::spawn(router);
        let client = OllamaClient::new(&server.base_url, 5).unwrap();
        let err = client.generate("medgemma", "p", "s").unwrap_err();
        assert!(matches!(err, InsightError::Http { status: 404, .. }));
    }
}
