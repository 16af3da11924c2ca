use serde::{Deserialize, Serialize};

use super::enums::Reducer;

/// Which values feed a reduction and how they are reduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub metric_name: String,
    pub reducer: Reducer,
    /// Restrict to records with this test name (case-insensitive).
    pub test_name: Option<String>,
    /// Restrict to records with `final` status.
    pub final_only: bool,
}

impl MetricSpec {
    pub fn new(metric_name: impl Into<String>, reducer: Reducer) -> Self {
        Self {
            metric_name: metric_name.into(),
            reducer,
            test_name: None,
            final_only: false,
        }
    }

    /// Mean over every numeric result, the dashboard's mutation risk score.
    pub fn mutation_risk() -> Self {
        Self::new("mutation_risk_score", Reducer::Mean)
    }

    pub fn for_test(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = Some(test_name.into());
        self
    }

    pub fn final_only(mut self) -> Self {
        self.final_only = true;
        self
    }
}

/// Named numeric summary over a sequence of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub metric_name: String,
    pub reducer: Reducer,
    pub value: f64,
    pub sample_count: usize,
    pub has_data: bool,
}

impl Aggregate {
    pub fn no_data(metric_name: impl Into<String>, reducer: Reducer) -> Self {
        Self {
            metric_name: metric_name.into(),
            reducer,
            value: 0.0,
            sample_count: 0,
            has_data: false,
        }
    }
}
