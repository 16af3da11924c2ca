use super::prompt::{build_insight_prompt, INSIGHT_SYSTEM_PROMPT};
use super::types::{InsightSubject, LlmClient};
use super::{InsightError, OllamaClient, OpenAiClient};
use crate::config::InsightServiceConfig;
use crate::models::{HubModule, Insight, InsightProvider};

/// Packages clinical data into a prompt and asks the reasoning service.
pub struct InsightRequester<C: LlmClient> {
    client: C,
    model: String,
    system_prompt: String,
}

impl<C: LlmClient> InsightRequester<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: INSIGHT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// One reasoning call. The returned text is not interpreted; a blank
    /// answer is an error, never an empty `Insight`.
    pub fn request_insight(
        &self,
        subject: InsightSubject<'_>,
        module: HubModule,
    ) -> Result<Insight, InsightError> {
        let prompt = build_insight_prompt(&subject, module);

        tracing::info!(
            backend = self.client.backend(),
            model = %self.model,
            module = %module,
            prompt_chars = prompt.len(),
            "Requesting insight"
        );

        let text = self
            .client
            .generate(&self.model, &prompt, &self.system_prompt)
            .inspect_err(|e| tracing::warn!(error = %e, "Insight request failed"))?;

        let text = text.trim();
        if text.is_empty() {
            tracing::warn!(model = %self.model, "Reasoning service returned blank text");
            return Err(InsightError::EmptyResponse);
        }

        Ok(Insight::new(text.to_string(), prompt, self.model.clone()))
    }
}

/// Build the backend named by configuration.
pub fn client_from_config(
    config: &InsightServiceConfig,
) -> Result<Box<dyn LlmClient + Send + Sync>, InsightError> {
    match config.provider {
        InsightProvider::OpenAi => {
            let api_key = config
                .api_key
                .as_ref()
                .ok_or(InsightError::MissingApiKey("openai"))?;
            Ok(Box::new(OpenAiClient::new(
                &config.base_url,
                api_key.as_str(),
                config.timeout_secs,
            )?))
        }
        InsightProvider::Ollama => Ok(Box::new(OllamaClient::new(
            &config.base_url,
            config.timeout_secs,
        )?)),
    }
}
