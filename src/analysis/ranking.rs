//! Top-N rankings by summed compromised records.

use serde::Serialize;

use super::filter::{counted, ranking_value};
use super::stats::group_in_encounter_order;
use crate::records::BreachRecord;

/// Field a ranking groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankField {
    Organization,
    Industry,
}

impl RankField {
    fn value<'a>(&self, record: &'a BreachRecord) -> Option<&'a str> {
        let raw = match self {
            RankField::Organization => record.organization.as_deref(),
            RankField::Industry => record.industry.as_deref(),
        };
        ranking_value(raw)
    }
}

impl std::fmt::Display for RankField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankField::Organization => write!(f, "organization"),
            RankField::Industry => write!(f, "industry"),
        }
    }
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedGroup {
    pub name: String,
    #[serde(serialize_with = "super::number::serialize")]
    pub total_records: f64,
    pub breach_count: u64,
}

/// Groups ranked by total compromised records, largest first, at most
/// `limit` entries. Records without a usable count or without a value for
/// `field` are left out entirely. Equal totals keep encounter order.
pub fn top_n(records: &[BreachRecord], field: RankField, limit: usize) -> Vec<RankedGroup> {
    let mut groups = group_in_encounter_order(
        counted(records)
            .filter_map(|(record, count)| field.value(record).map(|name| (name, count))),
    );
    groups.sort_by(|a, b| b.sum.total_cmp(&a.sum));
    groups.truncate(limit);

    groups
        .into_iter()
        .map(|b| RankedGroup {
            name: b.key.to_string(),
            total_records: b.sum,
            breach_count: b.count,
        })
        .collect()
}
