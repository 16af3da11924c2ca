//! End-to-end run: authenticate → fetch → normalize → {score, insight}.
//!
//! Authentication failure stops everything. A fetch failure is reported for
//! its own query only. An insight failure is reported next to an aggregate
//! that is still valid.

use thiserror::Error;

use super::auth::{AuthError, AuthSession};
use super::fetch::{ClinicalRecordFetcher, FetchError, PatientQuery};
use super::insight::{client_from_config, InsightError, InsightRequester, InsightSubject, LlmClient};
use super::normalize::normalize;
use super::scoring::score;
use crate::config::{AppConfig, ConfigError};
use crate::models::{Aggregate, Credentials, HubModule, Insight, MetricSpec, Record, Token};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetcher setup failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Reasoning service setup failed: {0}")]
    Insight(#[from] InsightError),
}

/// Everything computed for one patient query.
#[derive(Debug)]
pub struct PatientReport {
    pub records: Vec<Record>,
    pub aggregate: Aggregate,
    /// `None` when insights are switched off.
    pub insight: Option<Result<Insight, InsightError>>,
}

#[derive(Debug)]
pub struct PatientOutcome {
    pub query: PatientQuery,
    pub result: Result<PatientReport, FetchError>,
}

pub type BoxedClient = Box<dyn LlmClient + Send + Sync>;

pub struct Pipeline<C: LlmClient = BoxedClient> {
    auth: AuthSession,
    fetcher: ClinicalRecordFetcher,
    /// `None` when insights are switched off.
    requester: Option<InsightRequester<C>>,
    enabled_modules: Vec<HubModule>,
}

impl Pipeline<BoxedClient> {
    /// Build every stage from the process configuration.
    pub fn new(config: &AppConfig) -> Result<Self, PipelineError> {
        let client = client_from_config(&config.insight)?;
        Self::with_client(config, client)
    }

    /// Fetch, normalize and score only. No reasoning backend is built, so
    /// its settings (API key included) are not needed.
    pub fn without_insights(config: &AppConfig) -> Result<Self, PipelineError> {
        Self::build(config, None)
    }
}

impl<C: LlmClient> Pipeline<C> {
    /// Build with a caller-supplied reasoning backend.
    pub fn with_client(config: &AppConfig, client: C) -> Result<Self, PipelineError> {
        let requester = InsightRequester::new(client, config.insight.model.clone());
        Self::build(config, Some(requester))
    }

    fn build(
        config: &AppConfig,
        requester: Option<InsightRequester<C>>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            auth: AuthSession::new(&config.oauth_url, config.http_timeout_secs)?,
            fetcher: ClinicalRecordFetcher::new(&config.fhir_base_url, config.http_timeout_secs)?,
            requester,
            enabled_modules: config.enabled_modules.clone(),
        })
    }

    /// Drop the reasoning backend; later runs report no insight.
    pub fn disable_insights(mut self) -> Self {
        self.requester = None;
        self
    }

    /// Authenticate once, then process every query in order.
    pub fn run(
        &mut self,
        credentials: &Credentials,
        queries: &[PatientQuery],
        metric: &MetricSpec,
        module: HubModule,
    ) -> Result<Vec<PatientOutcome>, PipelineError> {
        if !self.enabled_modules.contains(&module) {
            return Err(ConfigError::ModuleDisabled(module).into());
        }

        let token = self.auth.authenticate(credentials)?.clone();

        let outcomes = queries
            .iter()
            .map(|query| {
                let result = self.run_query(query, &token, metric, module);
                if let Err(e) = &result {
                    tracing::warn!(
                        patient_id = %query.patient_id(),
                        error = %e,
                        "Patient query failed"
                    );
                }
                PatientOutcome {
                    query: query.clone(),
                    result,
                }
            })
            .collect();

        Ok(outcomes)
    }

    /// Fetch and process a single query with an existing token.
    pub fn run_query(
        &self,
        query: &PatientQuery,
        token: &Token,
        metric: &MetricSpec,
        module: HubModule,
    ) -> Result<PatientReport, FetchError> {
        let bundle = self.fetcher.fetch(query, token)?;
        let records: Vec<Record> = normalize(&bundle).collect();
        let aggregate = score(&records, metric);

        let insight = self.requester.as_ref().map(|requester| {
            requester.request_insight(
                InsightSubject::Both {
                    records: &records,
                    aggregate: &aggregate,
                },
                module,
            )
        });

        Ok(PatientReport {
            records,
            aggregate,
            insight,
        })
    }
}
