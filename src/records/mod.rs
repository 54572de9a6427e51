//! Breach records -- the documents stored by the service and consumed by the
//! reporting engine.
//!
//! Records are schemaless JSON objects with a handful of well-known fields.
//! Numeric fields are kept as raw JSON values so that malformed inputs (e.g.
//! `"n/a"`) survive ingestion and are excluded later at aggregation time
//! instead of being coerced to zero.

mod period;

pub use self::period::PeriodKey;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::AnalyticsError;

/// Document keys owned by the storage layer; never kept inside a record body.
pub const RESERVED_KEYS: &[&str] = &["id", "_id", "createdBy", "createdAt", "updatedAt"];

/// One logged data-breach incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_compromised: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breach_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Everything else on the document (country, description, impact fields, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl BreachRecord {
    /// Build a record from a raw JSON document.
    ///
    /// The document must be an object and its well-known string fields must
    /// be strings (or null). Reserved storage keys are stripped.
    pub fn from_document(document: Value) -> Result<Self, AnalyticsError> {
        let Value::Object(mut map) = document else {
            return Err(AnalyticsError::InvalidInput(format!(
                "breach record must be a JSON object, got {}",
                json_kind(&document)
            )));
        };
        for key in RESERVED_KEYS {
            map.remove(*key);
        }
        serde_json::from_value(Value::Object(map))
            .map_err(|e| AnalyticsError::InvalidInput(format!("malformed breach record: {e}")))
    }

    /// Grouping key for time-series reports: `date` when set, else `year`.
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::from_value(self.date.as_ref().or(self.year.as_ref()))
    }

    /// Textual form of the `year` field, as used by list filtering.
    pub fn year_text(&self) -> Option<String> {
        match self.year.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// 0-100 impact score from record count, financial loss and reputation damage.
    ///
    /// Fields that are missing or not well-formed numbers contribute nothing.
    pub fn severity_score(&self) -> u8 {
        let mut score: u32 = 0;

        if let Some(records) = finite_number(self.records_compromised.as_ref()) {
            score += match records {
                r if r > 1_000_000.0 => 40,
                r if r > 100_000.0 => 30,
                r if r > 10_000.0 => 20,
                r if r > 1_000.0 => 10,
                _ => 0,
            };
        }

        if let Some(loss) = finite_number(self.attributes.get("financialLoss")) {
            score += match loss {
                l if l > 10_000_000.0 => 30,
                l if l > 1_000_000.0 => 20,
                l if l > 100_000.0 => 10,
                _ => 0,
            };
        }

        score += match self.attributes.get("reputationDamage").and_then(Value::as_str) {
            Some("Critical") => 20,
            Some("High") => 15,
            Some("Medium") => 10,
            _ => 0,
        };

        score.min(100) as u8
    }

    /// Whole days between the breach `date` and `now`.
    ///
    /// Only string dates are read, either RFC 3339 or `YYYY-MM-DD`. Bare
    /// years and unparseable values give `None`.
    pub fn breach_age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        let Some(Value::String(raw)) = self.date.as_ref() else {
            return None;
        };
        let date = DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc).date_naive())
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()?;
        Some((now.date_naive() - date).num_days())
    }
}

/// Parse a JSON array of documents into records.
///
/// Anything other than an array of objects is an invalid-input fault.
pub fn records_from_json(value: Value) -> Result<Vec<BreachRecord>, AnalyticsError> {
    let Value::Array(items) = value else {
        return Err(AnalyticsError::InvalidInput(format!(
            "expected an array of breach records, got {}",
            json_kind(&value)
        )));
    };
    items.into_iter().map(BreachRecord::from_document).collect()
}

/// A well-formed, finite JSON number. Strings, booleans and nulls are not numbers.
pub(crate) fn finite_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Optional narrowing applied when fetching records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreachFilter {
    /// Exact match on the textual form of `year`.
    pub year: Option<String>,
    /// Case-insensitive substring of `organization`.
    pub organization: Option<String>,
    /// Exact match on `breachType`.
    pub breach_type: Option<String>,
}

impl BreachFilter {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.organization.is_none() && self.breach_type.is_none()
    }

    pub fn matches(&self, record: &BreachRecord) -> bool {
        if let Some(year) = &self.year {
            if record.year_text().as_deref() != Some(year.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.organization {
            let needle = needle.to_ascii_lowercase();
            match &record.organization {
                Some(org) if org.to_ascii_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        if let Some(breach_type) = &self.breach_type {
            if record.breach_type.as_deref() != Some(breach_type.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Data-access collaborator that materializes a snapshot of records.
///
/// The reporting engine never talks to storage itself; callers fetch through
/// a source and hand the resulting slice to [`crate::analysis::BreachAggregator`].
pub trait RecordSource {
    fn fetch_records(&self, filter: &BreachFilter) -> anyhow::Result<Vec<BreachRecord>>;
}

impl RecordSource for [BreachRecord] {
    fn fetch_records(&self, filter: &BreachFilter) -> anyhow::Result<Vec<BreachRecord>> {
        Ok(self.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}

impl RecordSource for Vec<BreachRecord> {
    fn fetch_records(&self, filter: &BreachFilter) -> anyhow::Result<Vec<BreachRecord>> {
        self.as_slice().fetch_records(filter)
    }
}
