//! OAuth2 token acquisition for the clinical data service.
//!
//! One request per `authenticate` call: no caching across runs, no refresh,
//! no retry. Whether to try again is the caller's decision.

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::http_client;
use crate::models::{Credentials, Token};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Identity provider rejected the credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed token response: {0}")]
    Malformed(String),
}

/// Response body from the token endpoint. `expires_in` is a number on
/// most servers, a numeric string on some.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<Value>,
}

/// Obtains and holds the bearer token for one process run.
pub struct AuthSession {
    token_url: String,
    client: reqwest::blocking::Client,
    token: Option<Token>,
}

impl AuthSession {
    pub fn new(token_url: &str, timeout_secs: u64) -> Result<Self, AuthError> {
        let client = http_client(timeout_secs).map_err(|e| AuthError::Unreachable(e.to_string()))?;
        Ok(Self {
            token_url: token_url.to_string(),
            client,
            token: None,
        })
    }

    /// Exchange credentials for a token. A failed attempt also drops any
    /// previously held token.
    pub fn authenticate(&mut self, credentials: &Credentials) -> Result<&Token, AuthError> {
        self.token = None;

        tracing::info!(
            client_id = %credentials.client_id(),
            grant_type = %credentials.grant_type(),
            "Requesting access token"
        );

        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&credentials.form_params())
            .send()
            .map_err(|e| {
                tracing::warn!(error = %e, "Token endpoint unreachable");
                AuthError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if credentials_rejected(status) {
            tracing::warn!(status = status.as_u16(), "Credentials rejected");
            return Err(AuthError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token endpoint failed");
            return Err(AuthError::Unreachable(format!(
                "token endpoint returned status {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;
        let token = parse_token_response(&body)?;

        tracing::info!(expires_at = ?token.expires_at(), "Access token acquired");
        Ok(&*self.token.insert(token))
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Forget the held token; the next fetch needs a new `authenticate`.
    pub fn discard(&mut self) {
        self.token = None;
    }
}

/// OAuth2 reports bad credentials as 400 (`invalid_grant`, `invalid_client`),
/// 401 or 403. Other 4xx (wrong URL, rate limiting) are endpoint problems.
fn credentials_rejected(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::BAD_REQUEST
            | reqwest::StatusCode::UNAUTHORIZED
            | reqwest::StatusCode::FORBIDDEN
    )
}

fn parse_token_response(body: &str) -> Result<Token, AuthError> {
    let parsed: TokenResponse =
        serde_json::from_str(body).map_err(|e| AuthError::Malformed(e.to_string()))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AuthError::Malformed("missing access_token".into()))?;

    let expires_at = parsed
        .expires_in
        .as_ref()
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .filter(|secs| *secs > 0)
        .map(|secs| Utc::now() + Duration::seconds(secs));

    Ok(Token::new(access_token, expires_at))
}
