//! Overall and grouped reducers over compromised-record counts.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::Serialize;

use super::filter::counted;
use crate::records::{BreachRecord, PeriodKey};

/// Running count/sum/max for one group. Rebuilt on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<K> {
    pub key: K,
    pub count: u64,
    pub sum: f64,
    pub max: f64,
}

impl<K> Bucket<K> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            count: 0,
            sum: 0.0,
            max: f64::NEG_INFINITY,
        }
    }

    /// Sums saturate at `f64::MAX` / `f64::MIN` so totals stay finite.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum = (self.sum + value).clamp(f64::MIN, f64::MAX);
        self.max = self.max.max(value);
    }

    /// Mean of the accumulated values. Only meaningful once `count > 0`.
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Group values by key, keeping groups in first-encountered order.
pub fn group_in_encounter_order<K, I>(items: I) -> Vec<Bucket<K>>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<Bucket<K>> = Vec::new();

    for (key, value) in items {
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket::new(key));
                buckets.len() - 1
            }
        };
        buckets[slot].add(value);
    }

    buckets
}

/// Group values by key, returning groups in ascending key order.
pub fn group_in_key_order<K, I>(items: I) -> Vec<Bucket<K>>
where
    K: Ord + Clone,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut groups: BTreeMap<K, Bucket<K>> = BTreeMap::new();
    for (key, value) in items {
        groups
            .entry(key.clone())
            .or_insert_with(|| Bucket::new(key))
            .add(value);
    }
    groups.into_values().collect()
}

/// Totals across every record with a well-formed count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_count: u64,
    #[serde(serialize_with = "super::number::serialize")]
    pub total_sum: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub mean: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub max: f64,
}

/// Count and volume for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub period: PeriodKey,
    pub count: u64,
    #[serde(serialize_with = "super::number::serialize")]
    pub sum: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub mean: f64,
}

/// Count and volume for one breach type. `breach_type` is `None` for the
/// bucket of records that carry no type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    pub breach_type: Option<String>,
    pub count: u64,
    #[serde(serialize_with = "super::number::serialize")]
    pub sum: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub mean: f64,
}

/// Overall totals, or `None` when no record has a well-formed count.
pub fn overall(records: &[BreachRecord]) -> Option<OverallStats> {
    let mut bucket = Bucket::new(());
    for (_, count) in counted(records) {
        bucket.add(count);
    }

    if bucket.count == 0 {
        return None;
    }

    Some(OverallStats {
        total_count: bucket.count,
        total_sum: bucket.sum,
        mean: bucket.mean(),
        max: bucket.max,
    })
}

/// Per-period totals in ascending period order.
pub fn by_period(records: &[BreachRecord]) -> Vec<PeriodStats> {
    group_in_key_order(counted(records).map(|(record, count)| (record.period_key(), count)))
        .into_iter()
        .map(|b| PeriodStats {
            mean: b.mean(),
            period: b.key,
            count: b.count,
            sum: b.sum,
        })
        .collect()
}

/// Per-type totals, most frequent first. Equal counts keep encounter order.
pub fn by_type(records: &[BreachRecord]) -> Vec<TypeStats> {
    let mut groups = group_in_encounter_order(
        counted(records).map(|(record, count)| (record.breach_type.clone(), count)),
    );
    groups.sort_by(|a, b| b.count.cmp(&a.count));

    groups
        .into_iter()
        .map(|b| TypeStats {
            mean: b.mean(),
            breach_type: b.key,
            count: b.count,
            sum: b.sum,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(docs: serde_json::Value) -> Vec<BreachRecord> {
        crate::records::records_from_json(docs).unwrap()
    }

    #[test]
    fn test_overall() {
        let rs = records(json!([
            { "recordsCompromised": 100, "year": 2020 },
            { "recordsCompromised": 200, "year": 2020 },
            { "recordsCompromised": "n/a", "year": 2021 }
        ]));
        let stats = overall(&rs).unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.total_sum, 300.0);
        assert_eq!(stats.mean, 150.0);
        assert_eq!(stats.max, 200.0);
    }

    #[test]
    fn test_overflowing_sum_saturates() {
        let rs = records(json!([
            { "recordsCompromised": 1e308 },
            { "recordsCompromised": 1e308 }
        ]));
        let stats = overall(&rs).unwrap();
        assert_eq!(stats.total_sum, f64::MAX);
        assert!(stats.mean.is_finite());

        let value = serde_json::to_value(&stats).unwrap();
        assert!(value["totalSum"].is_number());
        assert!(value["mean"].is_number());
        assert_eq!(value["max"], json!(1e308));

        let by_period = by_period(&rs);
        assert_eq!(by_period[0].sum, f64::MAX);
    }

    #[test]
    fn test_overall_without_data_is_absent() {
        assert_eq!(overall(&[]), None);
        let rs = records(json!([{ "recordsCompromised": "unknown" }, { "organization": "Acme" }]));
        assert_eq!(overall(&rs), None);
    }

    #[test]
    fn test_overall_serializes_integral_values_as_integers() {
        let rs = records(json!([{ "recordsCompromised": 100 }, { "recordsCompromised": 201 }]));
        let value = serde_json::to_value(overall(&rs).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "totalCount": 2, "totalSum": 301, "mean": 150.5, "max": 201 })
        );
    }

    #[test]
    fn test_by_period_orders_and_separates_representations() {
        let rs = records(json!([
            { "recordsCompromised": 5, "year": 2021 },
            { "recordsCompromised": 1, "year": "2020" },
            { "recordsCompromised": 2, "year": 2020 },
            { "recordsCompromised": 4, "year": 2020 },
            { "recordsCompromised": 8 }
        ]));
        let trends = by_period(&rs);

        let periods: Vec<&PeriodKey> = trends.iter().map(|t| &t.period).collect();
        assert_eq!(
            periods,
            vec![
                &PeriodKey::Unset,
                &PeriodKey::Number(2020.0),
                &PeriodKey::Number(2021.0),
                &PeriodKey::Text("2020".into()),
            ]
        );
        assert_eq!(trends[1].count, 2);
        assert_eq!(trends[1].sum, 6.0);
        assert_eq!(trends[1].mean, 3.0);
    }

    #[test]
    fn test_by_type_buckets_missing_types_and_sorts_stably() {
        let rs = records(json!([
            { "recordsCompromised": 1, "breachType": "Malware" },
            { "recordsCompromised": 1 },
            { "recordsCompromised": 1, "breachType": "Hacking" },
            { "recordsCompromised": 1, "breachType": "Hacking" },
            { "recordsCompromised": 1, "breachType": null },
            { "recordsCompromised": 1, "breachType": "Phishing" },
            { "recordsCompromised": "x", "breachType": "Phishing" }
        ]));
        let types = by_type(&rs);
        let keys: Vec<Option<&str>> = types.iter().map(|t| t.breach_type.as_deref()).collect();
        // The unset bucket reaches two records before Hacking does.
        assert_eq!(keys, vec![None, Some("Hacking"), Some("Malware"), Some("Phishing")]);
        assert_eq!(types[0].count, 2);
        assert_eq!(types[1].count, 2);
        assert_eq!(types[3].count, 1);
    }

    #[test]
    fn test_group_in_encounter_order() {
        let groups = group_in_encounter_order(vec![("b", 1.0), ("a", 2.0), ("b", 3.0)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "b");
        assert_eq!(groups[0].sum, 4.0);
        assert_eq!(groups[0].max, 3.0);
        assert_eq!(groups[1].key, "a");
    }
}
