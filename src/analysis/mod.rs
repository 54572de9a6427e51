//! Breach reporting engine.
//!
//! Turns a snapshot of [`BreachRecord`](crate::records::BreachRecord)s into
//! summaries: overall statistics, yearly trends, breach-type breakdowns and
//! top-N rankings. Every reducer is a pure function over a borrowed slice;
//! nothing here performs I/O or holds state between calls.

pub mod aggregator;
pub mod filter;
pub mod ranking;
pub mod report;
pub mod stats;

pub use self::aggregator::BreachAggregator;
pub use self::ranking::{RankField, RankedGroup};
pub use self::report::StatsReport;
pub use self::stats::{OverallStats, PeriodStats, TypeStats};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Serialize an `f64` as a JSON integer when it has no fractional part.
pub(crate) mod number {
    use serde::Serializer;

    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() < MAX_EXACT {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }
}
