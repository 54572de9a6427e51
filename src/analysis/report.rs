//! Combined stats report and its text rendering.

use serde::Serialize;

use super::ranking::RankedGroup;
use super::stats::{OverallStats, PeriodStats, TypeStats};
use crate::records::PeriodKey;

/// Everything the dashboard stats view needs in one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// `null` when no record has a well-formed count.
    pub overall: Option<OverallStats>,
    pub yearly: Vec<PeriodStats>,
    pub by_type: Vec<TypeStats>,
    pub top_industry: Option<RankedGroup>,
}

/// Format a stats report as a human-readable summary.
pub fn format_summary(report: &StatsReport) -> String {
    let mut out = String::new();

    match &report.overall {
        Some(o) => out.push_str(&format!(
            "{} breach{} with {} records compromised (mean {}, max {})\n",
            o.total_count,
            if o.total_count == 1 { "" } else { "es" },
            format_count(o.total_sum),
            format_count(o.mean),
            format_count(o.max),
        )),
        None => out.push_str("No breach records with a numeric record count.\n"),
    }

    if !report.yearly.is_empty() {
        out.push_str("\nBy period:\n");
        for p in &report.yearly {
            out.push_str(&format!(
                "  {:<12} {:>6} breaches {:>16} records\n",
                format_period(&p.period),
                p.count,
                format_count(p.sum)
            ));
        }
    }

    if !report.by_type.is_empty() {
        out.push_str("\nBy breach type:\n");
        for t in &report.by_type {
            out.push_str(&format!(
                "  {:<20} {:>6} breaches {:>16} records\n",
                t.breach_type.as_deref().unwrap_or("(unset)"),
                t.count,
                format_count(t.sum)
            ));
        }
    }

    if let Some(top) = &report.top_industry {
        out.push_str(&format!(
            "\nTop industry: {} ({} records across {} breach{})\n",
            top.name,
            format_count(top.total_records),
            top.breach_count,
            if top.breach_count == 1 { "" } else { "es" },
        ));
    }

    out
}

fn format_period(period: &PeriodKey) -> String {
    match period {
        PeriodKey::Unset => "(unset)".to_string(),
        PeriodKey::Number(n) => format_count(*n),
        PeriodKey::Text(s) => s.clone(),
        PeriodKey::Other(v) => v.to_string(),
    }
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BreachAggregator;
    use serde_json::json;

    #[test]
    fn test_format_summary() {
        let records = crate::records::records_from_json(json!([
            { "recordsCompromised": 100, "year": 2020,
              "breachType": "Hacking", "industry": "Retail" },
            { "recordsCompromised": 250, "year": 2021, "industry": "Retail" }
        ]))
        .unwrap();
        let summary = format_summary(&BreachAggregator::new(&records).stats_report());

        assert!(summary.contains("2 breaches with 350 records compromised (mean 175, max 250)"));
        assert!(summary.contains("2020"));
        assert!(summary.contains("Hacking"));
        assert!(summary.contains("(unset)"));
        assert!(summary.contains("Top industry: Retail (350 records across 2 breaches)"));
    }

    #[test]
    fn test_format_summary_without_data() {
        let summary = format_summary(&BreachAggregator::new(&[]).stats_report());
        assert!(summary.contains("No breach records"));
        assert!(!summary.contains("Top industry"));
    }

    #[test]
    fn test_report_serializes_missing_overall_as_null() {
        let value = serde_json::to_value(BreachAggregator::new(&[]).stats_report()).unwrap();
        assert_eq!(
            value,
            json!({ "overall": null, "yearly": [], "byType": [], "topIndustry": null })
        );
    }
}
