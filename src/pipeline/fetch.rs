use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{http_client, join_url};
use crate::models::{ResourceType, Token};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Patient identifier must not be empty")]
    InvalidQuery,

    #[error("Clinical data service refused the token (status {status}); re-authenticate")]
    Unauthorized { status: u16 },

    #[error("Clinical data service unreachable: {0}")]
    Unreachable(String),

    #[error("Clinical data service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("Malformed bundle: {0}")]
    Malformed(String),
}

/// One patient lookup against one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientQuery {
    patient_id: String,
    resource_type: ResourceType,
}

impl PatientQuery {
    pub fn new(patient_id: &str, resource_type: ResourceType) -> Result<Self, FetchError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(FetchError::InvalidQuery);
        }
        Ok(Self {
            patient_id: patient_id.to_string(),
            resource_type,
        })
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }
}

/// Unmodified response body for one query. Opaque until normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawBundle {
    body: Map<String, Value>,
}

impl RawBundle {
    /// The "no data" bundle: a valid outcome, not a failure.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Object(body) => Ok(Self { body }),
            other => Err(FetchError::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Entries of the bundle; a missing or non-array `entry` reads as none.
    pub fn entries(&self) -> &[Value] {
        self.body
            .get("entry")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Authenticated reads of clinical resources by patient.
pub struct ClinicalRecordFetcher {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ClinicalRecordFetcher {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let client =
            http_client(timeout_secs).map_err(|e| FetchError::Unreachable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Single GET `{base}/{ResourceType}?patient={id}`. 404 and empty
    /// result sets come back as an empty bundle; 401/403 (or a token already
    /// past its expiry) as `Unauthorized`.
    pub fn fetch(&self, query: &PatientQuery, token: &Token) -> Result<RawBundle, FetchError> {
        if token.is_expired() {
            tracing::warn!(patient_id = %query.patient_id(), "Token expired before fetch");
            return Err(FetchError::Unauthorized {
                status: StatusCode::UNAUTHORIZED.as_u16(),
            });
        }

        let url = join_url(&self.base_url, query.resource_type().as_str());
        tracing::info!(
            patient_id = %query.patient_id(),
            resource_type = %query.resource_type(),
            "Fetching clinical resources"
        );

        let response = self
            .client
            .get(&url)
            .query(&[("patient", query.patient_id())])
            .bearer_auth(token.bearer())
            .header(reqwest::header::ACCEPT, "application/fhir+json")
            .send()
            .map_err(|e| {
                tracing::warn!(error = %e, "Clinical data service unreachable");
                FetchError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = status.as_u16(), "Token refused");
                return Err(FetchError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
                tracing::info!(patient_id = %query.patient_id(), "No resources found");
                return Ok(RawBundle::empty());
            }
            s if !s.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(FetchError::Service {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let text = response
            .text()
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        if text.trim().is_empty() {
            tracing::info!(patient_id = %query.patient_id(), "Empty response body");
            return Ok(RawBundle::empty());
        }
        let value: Value =
            serde_json::from_str(&text).map_err(|e| FetchError::Malformed(e.to_string()))?;
        let bundle = RawBundle::from_value(value)?;

        tracing::info!(
            patient_id = %query.patient_id(),
            entries = bundle.entries().len(),
            "Bundle received"
        );
        Ok(bundle)
    }
}
