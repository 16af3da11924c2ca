use super::InsightError;
use crate::models::{Aggregate, Record};

/// Reasoning service abstraction (allows mocking)
pub trait LlmClient {
    /// Send one prompt and return the raw completion text.
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, InsightError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, InsightError> {
        (**self).generate(model, prompt, system)
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// What an insight is asked about.
#[derive(Debug, Clone, Copy)]
pub enum InsightSubject<'a> {
    Records(&'a [Record]),
    Aggregate(&'a Aggregate),
    Both {
        records: &'a [Record],
        aggregate: &'a Aggregate,
    },
}

impl<'a> InsightSubject<'a> {
    pub fn records(&self) -> &'a [Record] {
        match *self {
            Self::Records(records) | Self::Both { records, .. } => records,
            Self::Aggregate(_) => &[],
        }
    }

    pub fn aggregate(&self) -> Option<&'a Aggregate> {
        match *self {
            Self::Aggregate(aggregate) | Self::Both { aggregate, .. } => Some(aggregate),
            Self::Records(_) => None,
        }
    }
}
