//! Record predicates shared by every reducer.
//!
//! All reports apply the same numeric guard so that they never drift apart
//! on what counts as a usable record.

use crate::records::{finite_number, BreachRecord};

/// The record's `recordsCompromised` value, if it is a well-formed number.
pub fn valid_count(record: &BreachRecord) -> Option<f64> {
    finite_number(record.records_compromised.as_ref())
}

/// Records that pass the numeric guard, paired with their count.
pub fn counted(records: &[BreachRecord]) -> impl Iterator<Item = (&BreachRecord, f64)> {
    records
        .iter()
        .filter_map(|record| valid_count(record).map(|count| (record, count)))
}

/// A ranking field value, or `None` when missing or empty.
pub fn ranking_value(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(doc: serde_json::Value) -> BreachRecord {
        BreachRecord::from_document(doc).unwrap()
    }

    #[test]
    fn test_valid_count() {
        assert_eq!(valid_count(&record(json!({ "recordsCompromised": 100 }))), Some(100.0));
        assert_eq!(valid_count(&record(json!({ "recordsCompromised": 2.5 }))), Some(2.5));
        assert_eq!(valid_count(&record(json!({ "recordsCompromised": "100" }))), None);
        assert_eq!(valid_count(&record(json!({ "recordsCompromised": true }))), None);
        assert_eq!(valid_count(&record(json!({}))), None);
    }

    #[test]
    fn test_counted_skips_malformed() {
        let records = vec![
            record(json!({ "recordsCompromised": 1 })),
            record(json!({ "recordsCompromised": "n/a" })),
            record(json!({ "recordsCompromised": 3 })),
        ];
        let counts: Vec<f64> = counted(&records).map(|(_, c)| c).collect();
        assert_eq!(counts, vec![1.0, 3.0]);
    }

    #[test]
    fn test_ranking_value() {
        assert_eq!(ranking_value(Some("Acme")), Some("Acme"));
        assert_eq!(ranking_value(Some("")), None);
        assert_eq!(ranking_value(None), None);
    }
}
