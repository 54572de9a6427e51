//! Snapshot facade exposing every report the engine produces.

use crate::analysis::ranking::{self, RankField, RankedGroup};
use crate::analysis::report::StatsReport;
use crate::analysis::stats::{self, OverallStats, PeriodStats, TypeStats};
use crate::records::BreachRecord;

/// Query surface over a snapshot of breach records.
///
/// Borrows the snapshot and never mutates it, so the same aggregator (or
/// several over the same slice) can be queried any number of times with
/// identical results.
#[derive(Debug, Clone, Copy)]
pub struct BreachAggregator<'a> {
    records: &'a [BreachRecord],
}

impl<'a> BreachAggregator<'a> {
    /// Default length of top-N rankings.
    pub const DEFAULT_TOP_N: usize = 10;

    pub fn new(records: &'a [BreachRecord]) -> Self {
        Self { records }
    }

    /// Count, sum, mean and max of compromised records; `None` when no
    /// record carries a well-formed count.
    pub fn overall_stats(&self) -> Option<OverallStats> {
        stats::overall(self.records)
    }

    /// Per-period count, sum and mean in ascending period order.
    pub fn yearly_trends(&self) -> Vec<PeriodStats> {
        stats::by_period(self.records)
    }

    /// Per-breach-type count, sum and mean, most frequent first.
    pub fn breach_type_breakdown(&self) -> Vec<TypeStats> {
        stats::by_type(self.records)
    }

    pub fn top_by_organization(&self, limit: usize) -> Vec<RankedGroup> {
        ranking::top_n(self.records, RankField::Organization, limit)
    }

    pub fn top_by_industry(&self, limit: usize) -> Vec<RankedGroup> {
        ranking::top_n(self.records, RankField::Industry, limit)
    }

    /// The single industry with the most compromised records, if any qualifies.
    pub fn top_industry(&self) -> Option<RankedGroup> {
        ranking::top_n(self.records, RankField::Industry, 1).into_iter().next()
    }

    /// Overall, yearly, by-type and top-industry summaries in one pass of calls.
    pub fn stats_report(&self) -> StatsReport {
        let report = StatsReport {
            overall: self.overall_stats(),
            yearly: self.yearly_trends(),
            by_type: self.breach_type_breakdown(),
            top_industry: self.top_industry(),
        };
        tracing::debug!(
            records = self.records.len(),
            periods = report.yearly.len(),
            types = report.by_type.len(),
            "computed stats report"
        );
        report
    }
}
