use std::borrow::Borrow;

use crate::models::{Aggregate, MetricSpec, Record, RecordStatus, Reducer};

/// Reduce the numeric values of `records` per `metric`.
///
/// Values that are not numeric (see `RecordValue::as_number`) are skipped
/// and do not count toward `sample_count`. With no samples the aggregate is
/// `0` with `has_data == false`. Values are summed in input order, so equal
/// input always produces a bit-identical result.
///
/// The sum is plain `f64` addition and may overflow to infinity for extreme
/// inputs. Such an aggregate is still returned as data and logged as a warning.
pub fn score<I, R>(records: I, metric: &MetricSpec) -> Aggregate
where
    I: IntoIterator<Item = R>,
    R: Borrow<Record>,
{
    let mut sum = 0.0_f64;
    let mut sample_count = 0_usize;

    for record in records {
        let record = record.borrow();
        if !matches_metric(record, metric) {
            continue;
        }
        if let Some(n) = record.value.as_number() {
            sum += n;
            sample_count += 1;
        }
    }

    if sample_count == 0 {
        return Aggregate::no_data(metric.metric_name.clone(), metric.reducer);
    }

    let value = match metric.reducer {
        Reducer::Mean => sum / sample_count as f64,
        Reducer::Sum => sum,
        Reducer::Count => sample_count as f64,
    };

    if !value.is_finite() {
        tracing::warn!(
            metric = %metric.metric_name,
            sample_count,
            "Aggregate overflowed f64 range"
        );
    }

    tracing::debug!(
        metric = %metric.metric_name,
        reducer = %metric.reducer,
        sample_count,
        value,
        "Aggregate computed"
    );

    Aggregate {
        metric_name: metric.metric_name.clone(),
        reducer: metric.reducer,
        value,
        sample_count,
        has_data: true,
    }
}

fn matches_metric(record: &Record, metric: &MetricSpec) -> bool {
    if metric.final_only && record.status != RecordStatus::Final {
        return false;
    }
    match &metric.test_name {
        Some(name) => record.test_name.trim().eq_ignore_ascii_case(name.trim()),
        None => true,
    }
}
