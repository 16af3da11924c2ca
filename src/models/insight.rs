use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-text answer from the reasoning service, kept with the exact
/// prompt and model that produced it for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub text: String,
    pub prompt: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(text: String, prompt: String, model: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            prompt,
            model,
            generated_at: Utc::now(),
        }
    }
}
