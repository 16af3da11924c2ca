use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::models::{Credentials, HubModule, InsightProvider};

/// Application-level constants
pub const APP_NAME: &str = "OncoHub";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "medgemma";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INSIGHT_TIMEOUT_SECS: u64 = 120;

/// Log filter used when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "oncohub=info,oncohub_lib=info,warn"
}

/// Get the application data directory, or `None` when no home is known.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Get the exports directory (falls back to the working directory).
pub fn exports_dir() -> PathBuf {
    app_data_dir()
        .map(|dir| dir.join("exports"))
        .unwrap_or_else(|| PathBuf::from("exports"))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Module '{0}' is not enabled in this deployment")]
    ModuleDisabled(HubModule),
}

/// Which OAuth2 grant the deployment uses.
pub enum AuthFlow {
    ClientCredentials {
        client_secret: Zeroizing<String>,
    },
    Password {
        username: String,
        password: Zeroizing<String>,
    },
}

/// Reasoning service settings.
pub struct InsightServiceConfig {
    pub provider: InsightProvider,
    pub base_url: String,
    pub api_key: Option<Zeroizing<String>>,
    pub model: String,
    pub timeout_secs: u64,
}

/// Process-wide configuration, built once at startup and passed down.
pub struct AppConfig {
    pub fhir_base_url: String,
    pub oauth_url: String,
    pub client_id: String,
    pub auth_flow: AuthFlow,
    pub http_timeout_secs: u64,
    pub insight: InsightServiceConfig,
    pub enabled_modules: Vec<HubModule>,
}

impl AppConfig {
    /// Build from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let fhir_base_url = require("FHIR_BASE_URL")?;
        let oauth_url = require("OAUTH_URL")?;
        let client_id = require("EPIC_CLIENT_ID")?;

        let auth_flow = match (get("EPIC_USERNAME"), get("EPIC_PASSWORD")) {
            (Some(username), Some(password)) => AuthFlow::Password {
                username,
                password: Zeroizing::new(password),
            },
            _ => AuthFlow::ClientCredentials {
                client_secret: Zeroizing::new(require("EPIC_CLIENT_SECRET")?),
            },
        };

        let http_timeout_secs =
            parse_secs("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)?;
        let insight_timeout_secs = parse_secs(
            "INSIGHT_TIMEOUT_SECS",
            get("INSIGHT_TIMEOUT_SECS"),
            DEFAULT_INSIGHT_TIMEOUT_SECS,
        )?;

        let provider = match get("INSIGHT_PROVIDER") {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<InsightProvider>()
                .map_err(|_| ConfigError::Invalid {
                    key: "INSIGHT_PROVIDER",
                    value: raw,
                })?,
            None => InsightProvider::OpenAi,
        };

        let insight = match provider {
            InsightProvider::OpenAi => InsightServiceConfig {
                provider,
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
                api_key: get("OPENAI_API_KEY").map(Zeroizing::new),
                model: get("INSIGHT_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
                timeout_secs: insight_timeout_secs,
            },
            InsightProvider::Ollama => InsightServiceConfig {
                provider,
                base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.into()),
                api_key: None,
                model: get("INSIGHT_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
                timeout_secs: insight_timeout_secs,
            },
        };

        let enabled_modules = match get("HUB_MODULES") {
            Some(raw) => parse_modules(&raw)?,
            None => HubModule::ALL.to_vec(),
        };

        Ok(Self {
            fhir_base_url,
            oauth_url,
            client_id,
            auth_flow,
            http_timeout_secs,
            insight,
            enabled_modules,
        })
    }

    /// Credentials for the token endpoint, per the configured flow.
    pub fn credentials(&self) -> Credentials {
        match &self.auth_flow {
            AuthFlow::ClientCredentials { client_secret } => {
                Credentials::client_credentials(self.client_id.as_str(), client_secret.as_str())
            }
            AuthFlow::Password { username, password } => {
                Credentials::password(self.client_id.as_str(), username.as_str(), password.as_str())
            }
        }
    }

    pub fn ensure_module_enabled(&self, module: HubModule) -> Result<(), ConfigError> {
        if self.enabled_modules.contains(&module) {
            Ok(())
        } else {
            Err(ConfigError::ModuleDisabled(module))
        }
    }
}

fn parse_secs(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}

/// Comma-separated module keys; duplicates collapse, order is kept.
fn parse_modules(raw: &str) -> Result<Vec<HubModule>, ConfigError> {
    let mut seen = HashSet::new();
    let mut modules = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let module = part.parse::<HubModule>().map_err(|_| ConfigError::Invalid {
            key: "HUB_MODULES",
            value: part.to_string(),
        })?;
        if seen.insert(module) {
            modules.push(module);
        }
    }
    Ok(modules)
}
