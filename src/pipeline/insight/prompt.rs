use std::fmt::Write as _;

use super::types::InsightSubject;
use crate::models::{Aggregate, HubModule, Record};

pub const INSIGHT_SYSTEM_PROMPT: &str = r#"
You are an oncology research assistant supporting clinicians and researchers.
You receive laboratory and genomic results already retrieved from an EHR.

RULES:
1. Base every statement ONLY on the data provided. Say so when data is missing.
2. Treat non-final results as provisional.
3. Offer treatment suggestions for research discussion, never as orders.
4. End with one line stating that this is not medical advice.
"#;

/// Build the user prompt. Pure and deterministic: the same subject and
/// module always give byte-identical text, with records in input order.
pub fn build_insight_prompt(subject: &InsightSubject<'_>, module: HubModule) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Module: {}", module.title());
    let _ = writeln!(prompt, "Focus: {}", module.focus());
    let genes = module.genes_of_interest();
    if !genes.is_empty() {
        let _ = writeln!(prompt, "Genes of interest: {}", genes.join(", "));
    }
    prompt.push('\n');

    let records = subject.records();
    if !records.is_empty() {
        let _ = writeln!(prompt, "Patient results ({} records):", records.len());
        for (i, record) in records.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, format_record(record));
        }
        prompt.push('\n');
    } else if subject.aggregate().is_none() {
        prompt.push_str("Patient results: none available.\n\n");
    }

    if let Some(aggregate) = subject.aggregate() {
        let _ = writeln!(prompt, "Summary metric: {}", format_aggregate(aggregate));
        prompt.push('\n');
    }

    prompt.push_str(
        "Using only the data above, suggest treatment options worth discussing \
         and note which results would change those suggestions.",
    );
    prompt
}

/// One record as `test=… | result=… | status=… | time=…`.
pub fn format_record(record: &Record) -> String {
    let mut line = format!(
        "test={} | result={} | status={}",
        one_line(&record.test_name),
        one_line(&record.value.to_string()),
        record.status
    );
    if let Some(ts) = record.timestamp {
        let _ = write!(line, " | time={}", ts.to_rfc3339());
    }
    line
}

pub fn format_aggregate(aggregate: &Aggregate) -> String {
    if aggregate.has_data {
        format!(
            "{} ({}) = {:.4} over {} numeric results",
            aggregate.metric_name, aggregate.reducer, aggregate.value, aggregate.sample_count
        )
    } else {
        format!(
            "{} ({}) = no numeric data",
            aggregate.metric_name, aggregate.reducer
        )
    }
}

/// Keep each record on its own line: control characters become spaces.
fn one_line(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "(missing)".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricSpec, RecordStatus};
    use crate::pipeline::scoring::score;

    fn records() -> Vec<Record> {
        vec![
            Record::new("EGFR", 5.0, RecordStatus::Final),
            Record::new("KRAS", "pending", RecordStatus::Preliminary),
        ]
    }

    #[test]
    fn records_listed_in_order_with_stable_fields() {
        let recs = records();
        let prompt = build_insight_prompt(&InsightSubject::Records(&recs), HubModule::MutationRisk);
        let egfr = prompt
            .find("1. test=EGFR | result=5 | status=final")
            .unwrap();
        let kras = prompt
            .find("2. test=KRAS | result=pending | status=preliminary")
            .unwrap();
        assert!(egfr < kras);
        assert!(prompt.contains("Patient results (2 records):"));
        assert!(!prompt.contains("Summary metric"));
    }

    #[test]
    fn prompt_is_reproducible() {
        let recs = records();
        let aggregate = score(&recs, &MetricSpec::mutation_risk());
        let subject = InsightSubject::Both {
            records: &recs,
            aggregate: &aggregate,
        };
        assert_eq!(
            build_insight_prompt(&subject, HubModule::TumorEvolution),
            build_insight_prompt(&subject, HubModule::TumorEvolution)
        );
    }

    #[test]
    fn aggregate_only_prompt() {
        let aggregate = score(&records(), &MetricSpec::mutation_risk());
        let prompt =
            build_insight_prompt(&InsightSubject::Aggregate(&aggregate), HubModule::MutationRisk);
        assert!(prompt.contains(
            "Summary metric: mutation_risk_score (mean) = 5.0000 over 1 numeric results"
        ));
        assert!(!prompt.contains("Patient results"));
    }

    #[test]
    fn no_data_aggregate_is_explicit() {
        let aggregate = score(Vec::<Record>::new(), &MetricSpec::mutation_risk());
        assert_eq!(
            format_aggregate(&aggregate),
            "mutation_risk_score (mean) = no numeric data"
        );
    }

    #[test]
    fn module_genes_included() {
        let recs = records();
        let prompt =
            build_insight_prompt(&InsightSubject::Records(&recs), HubModule::CrisprEditing);
        assert!(prompt.contains("Module: CRISPR Editing Feasibility"));
        assert!(prompt.contains("Genes of interest: BRAF, EGFR"));
    }

    #[test]
    fn multiline_values_are_flattened() {
        let record = Record::new("Panel\nA", "line1\r\nline2", RecordStatus::Unknown);
        assert_eq!(
            format_record(&record),
            "test=Panel A | result=line1  line2 | status=unknown"
        );
        let blank = Record::new("", "", RecordStatus::Unknown);
        assert_eq!(
            format_record(&blank),
            "test=(missing) | result=(missing) | status=unknown"
        );
    }

    #[test]
    fn empty_records_noted() {
        let prompt = build_insight_prompt(&InsightSubject::Records(&[]), HubModule::DigitalTwin);
        assert!(prompt.contains("Patient results: none available."));
    }

    #[test]
    fn system_prompt_requires_disclaimer() {
        assert!(INSIGHT_SYSTEM_PROMPT.contains("not medical advice"));
        assert!(INSIGHT_SYSTEM_PROMPT.contains("ONLY on the data provided"));
    }
}
