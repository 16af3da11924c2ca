use std::sync::Mutex;

use super::types::LlmClient;
use super::InsightError;

/// Mock LLM client for testing. Returns a configurable response and
/// remembers the last prompt it saw.
pub struct MockLlmClient {
    outcome: Result<String, fn() -> InsightError>,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            outcome: Ok(response.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    /// Client whose every call fails with the error `make_error` builds.
    pub fn failing(make_error: fn() -> InsightError) -> Self {
        Self {
            outcome: Err(make_error),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, prompt: &str, _system: &str) -> Result<String, InsightError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        match &self.outcome {
            Ok(response) => Ok(response.clone()),
            Err(make_error) => Err(make_error()),
        }
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        let result = client.generate("model", "prompt", "system").unwrap();
        assert_eq!(result, "test response");
        assert_eq!(client.last_prompt().as_deref(), Some("prompt"));
    }

    #[test]
    fn failing_mock_returns_error() {
        let client = MockLlmClient::failing(|| InsightError::Timeout(3));
        assert!(matches!(
            client.generate("m", "p", "s"),
            Err(InsightError::Timeout(3))
        ));
    }
}
