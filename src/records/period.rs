//! Opaque period keys for time-series grouping.

use std::cmp::Ordering;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// The period a breach is filed under, kept in the representation it was
/// stored with. A year stored as `2020` and a date stored as `"2020-03-01"`
/// are different keys; nothing is parsed or coerced.
///
/// Ordering is `Unset < Number < Text < Other`, numbers ascending
/// numerically and text lexically.
#[derive(Debug, Clone)]
pub enum PeriodKey {
    Unset,
    Number(f64),
    Text(String),
    /// Booleans, arrays and objects. Ordered by their JSON text.
    Other(Value),
}

impl PeriodKey {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => PeriodKey::Unset,
            Some(Value::Number(n)) => n.as_f64().map_or(PeriodKey::Unset, PeriodKey::Number),
            Some(Value::String(s)) => PeriodKey::Text(s.clone()),
            Some(other) => PeriodKey::Other(other.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PeriodKey::Unset => 0,
            PeriodKey::Number(_) => 1,
            PeriodKey::Text(_) => 2,
            PeriodKey::Other(_) => 3,
        }
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PeriodKey::Number(a), PeriodKey::Number(b)) => a.total_cmp(b),
            (PeriodKey::Text(a), PeriodKey::Text(b)) => a.cmp(b),
            (PeriodKey::Other(a), PeriodKey::Other(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PeriodKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PeriodKey {}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PeriodKey::Unset => serializer.serialize_none(),
            PeriodKey::Number(n) => crate::analysis::number::serialize(n, serializer),
            PeriodKey::Text(s) => serializer.serialize_str(s),
            PeriodKey::Other(v) => v.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordering_across_representations() {
        let mut keys = vec![
            PeriodKey::Text("2019-01-01".into()),
            PeriodKey::Number(2021.0),
            PeriodKey::Unset,
            PeriodKey::Number(2019.0),
            PeriodKey::Other(json!(true)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PeriodKey::Unset,
                PeriodKey::Number(2019.0),
                PeriodKey::Number(2021.0),
                PeriodKey::Text("2019-01-01".into()),
                PeriodKey::Other(json!(true)),
            ]
        );
    }

    #[test]
    fn test_number_and_text_never_equal() {
        assert_ne!(PeriodKey::Number(2020.0), PeriodKey::Text("2020".into()));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_value(PeriodKey::Number(2020.0)).unwrap(), json!(2020));
        assert_eq!(serde_json::to_value(PeriodKey::Number(2020.5)).unwrap(), json!(2020.5));
        assert_eq!(serde_json::to_value(PeriodKey::Unset).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(PeriodKey::Text("2020-02".into())).unwrap(),
            json!("2020-02")
        );
    }
}
