//! Flattening of FHIR bundles into uniform `Record` rows.
//!
//! Every field has a defined default: a missing or oddly shaped field yields
//! an empty test name, an empty text value, `unknown` status, or no
//! timestamp. Normalization never fails and never drops an entry, so output
//! position `i` always corresponds to `bundle.entry[i]`.

use std::iter::FusedIterator;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde_json::Value;

use super::fetch::RawBundle;
use crate::models::{Record, RecordStatus, RecordValue};

const TEST_NAME_PATHS: &[&str] = &["/code/text", "/code/coding/0/display", "/code/coding/0/code"];

const VALUE_PATHS: &[&str] = &[
    "/result",
    "/valueQuantity/value",
    "/valueString",
    "/valueCodeableConcept/text",
    "/valueInteger",
    "/valueBoolean",
];

const TIMESTAMP_PATHS: &[&str] = &["/effectiveDateTime", "/issued"];

/// Single pass over a bundle's entries, yielding one `Record` per entry.
pub struct NormalizedRecords<'a> {
    entries: std::slice::Iter<'a, Value>,
}

impl Iterator for NormalizedRecords<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.entries.next().map(normalize_entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for NormalizedRecords<'_> {}

impl FusedIterator for NormalizedRecords<'_> {}

/// Lazily normalize a bundle. An empty bundle yields nothing.
pub fn normalize(bundle: &RawBundle) -> NormalizedRecords<'_> {
    NormalizedRecords {
        entries: bundle.entries().iter(),
    }
}

/// Normalize one `entry` element (the object holding `resource`).
pub fn normalize_entry(entry: &Value) -> Record {
    let resource = entry.get("resource").filter(|r| r.is_object());
    let Some(resource) = resource else {
        tracing::debug!("Bundle entry without resource object");
        return Record::new("", RecordValue::empty(), RecordStatus::Unknown);
    };

    Record {
        test_name: extract_test_name(resource),
        value: extract_value(resource),
        status: resource
            .get("status")
            .and_then(Value::as_str)
            .map(RecordStatus::from_fhir)
            .unwrap_or(RecordStatus::Unknown),
        timestamp: extract_timestamp(resource),
    }
}

fn extract_test_name(resource: &Value) -> String {
    TEST_NAME_PATHS
        .iter()
        .filter_map(|path| resource.pointer(path).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn extract_value(resource: &Value) -> RecordValue {
    VALUE_PATHS
        .iter()
        .filter_map(|path| resource.pointer(path))
        .find_map(value_from_json)
        .unwrap_or_default()
}

/// Map one JSON value to a record value; `None` means "keep looking".
fn value_from_json(value: &Value) -> Option<RecordValue> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(RecordValue::Number),
        Value::String(s) => Some(RecordValue::Text(s.clone())),
        Value::Bool(b) => Some(RecordValue::Text(b.to_string())),
        // DiagnosticReport.result is a list of references
        Value::Array(items) => {
            let labels: Vec<&str> = items.iter().filter_map(reference_label).collect();
            if labels.is_empty() {
                None
            } else {
                Some(RecordValue::Text(labels.join("; ")))
            }
        }
        Value::Object(_) => {
            reference_label(value).map(|label| RecordValue::Text(label.to_string()))
        }
    }
}

fn reference_label(value: &Value) -> Option<&str> {
    ["display", "reference", "text"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|label| !label.is_empty())
}

fn extract_timestamp(resource: &Value) -> Option<DateTime<FixedOffset>> {
    TIMESTAMP_PATHS
        .iter()
        .filter_map(|path| resource.pointer(path).and_then(Value::as_str))
        .find_map(parse_fhir_instant)
}

/// FHIR dateTime: full RFC 3339, or a bare date read as midnight UTC.
fn parse_fhir_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .or_else(|| {
            raw.parse::<DateTime<Utc>>()
                .ok()
                .map(|dt| dt.fixed_offset())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(value: Value) -> RawBundle {
        RawBundle::from_value(value).unwrap()
    }

    fn egfr_kras_bundle() -> RawBundle {
        bundle(json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"code": {"text": "EGFR"}, "result": 5, "status": "final"}},
                {"resource": {"code": {"text": "KRAS"}, "result": "pending", "status": "preliminary"}}
            ]
        }))
    }

    #[test]
    fn scenario_egfr_kras() {
        let records: Vec<Record> = normalize(&egfr_kras_bundle()).collect();
        assert_eq!(
            records,
            vec![
                Record::new("EGFR", 5.0, RecordStatus::Final),
                Record::new("KRAS", "pending", RecordStatus::Preliminary),
            ]
        );
    }

    #[test]
    fn empty_or_missing_entry_list_yields_nothing() {
        assert_eq!(normalize(&RawBundle::empty()).count(), 0);
        assert_eq!(normalize(&bundle(json!({"entry": []}))).count(), 0);
        assert_eq!(normalize(&bundle(json!({"resourceType": "Bundle"}))).count(), 0);
    }

    #[test]
    fn order_matches_entry_order() {
        let names = ["TP53", "BRAF", "KRAS", "EGFR", "ALK"];
        let entries: Vec<Value> = names
            .iter()
            .map(|n| json!({"resource": {"code": {"text": n}, "result": 1}}))
            .collect();
        let records: Vec<Record> = normalize(&bundle(json!({ "entry": entries }))).collect();
        let got: Vec<&str> = records.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(got, names);
    }

    #[test]
    fn normalizing_twice_gives_equal_sequences() {
        let raw = egfr_kras_bundle();
        let first: Vec<Record> = normalize(&raw).collect();
        let second: Vec<Record> = normalize(&raw).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let records: Vec<Record> = normalize(&bundle(json!({
            "entry": [
                {"resource": {}},
                {"fullUrl": "urn:uuid:1"},
                "not an object",
                {"resource": {"code": {"text": 42}, "status": 7}}
            ]
        })))
        .collect();

        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.test_name, "");
            assert_eq!(record.value, RecordValue::empty());
            assert_eq!(record.status, RecordStatus::Unknown);
            assert!(record.timestamp.is_none());
        }
    }

    #[test]
    fn fhir_native_fields_are_used_as_fallbacks() {
        let entry = json!({"resource": {
            "code": {"coding": [{"system": "http://loinc.org", "code": "21667-1", "display": "BRAF gene mutations"}]},
            "valueQuantity": {"value": 0.82, "unit": "score"},
            "status": "final",
            "effectiveDateTime": "2024-03-01T10:15:00+01:00"
        }});
        let record = normalize_entry(&entry);
        assert_eq!(record.test_name, "BRAF gene mutations");
        assert_eq!(record.value, RecordValue::Number(0.82));
        assert_eq!(record.status, RecordStatus::Final);
        assert_eq!(
            record.timestamp.unwrap().to_rfc3339(),
            "2024-03-01T10:15:00+01:00"
        );
    }

    #[test]
    fn coding_code_used_when_no_display() {
        let entry = json!({"resource": {"code": {"coding": [{"code": "48018-6"}]}, "valueString": "detected"}});
        let record = normalize_entry(&entry);
        assert_eq!(record.test_name, "48018-6");
        assert_eq!(record.value, RecordValue::from("detected"));
    }

    #[test]
    fn diagnostic_report_references_become_text() {
        let entry = json!({"resource": {
            "code": {"text": "Tumor panel"},
            "result": [{"reference": "Observation/1", "display": "TP53 p.R273H"}, {"reference": "Observation/2"}],
            "status": "final",
            "issued": "2024-05-02"
        }});
        let record = normalize_entry(&entry);
        assert_eq!(record.value, RecordValue::from("TP53 p.R273H; Observation/2"));
        assert_eq!(
            record.timestamp.unwrap().to_rfc3339(),
            "2024-05-02T00:00:00+00:00"
        );
    }

    #[test]
    fn null_result_falls_through_to_value_fields() {
        let entry = json!({"resource": {"result": null, "valueInteger": 3}});
        assert_eq!(normalize_entry(&entry).value, RecordValue::Number(3.0));
    }

    #[test]
    fn unparsable_timestamp_is_absent() {
        let entry = json!({"resource": {"effectiveDateTime": "last tuesday"}});
        assert!(normalize_entry(&entry).timestamp.is_none());
    }

    #[test]
    fn iterator_is_single_pass_and_sized() {
        let raw = egfr_kras_bundle();
        let mut records = normalize(&raw);
        assert_eq!(records.len(), 2);
        assert!(records.next().is_some());
        assert!(records.next().is_some());
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }
}
