//! Conversion rates per lead source and per website traffic source.

use crate::stats;
use crate::tables::{self, TableSet};
use insights_core::artifact::{ConversionAnalysis, SourceConversion, TrafficConversion};
use insights_core::sheets::{self, sales, website};
use insights_core::{CleanTable, InsightsResult};
use std::collections::BTreeMap;
use tracing::info;

pub const ANALYSIS: &str = "conversion";

#[derive(Default)]
struct SourceTally {
    total: u64,
    closed: u64,
    won: u64,
    value_sum: f64,
    value_count: u64,
}

/// Won / closed deals per lead source in the sales pipeline, plus website
/// conversions per traffic source when that sheet is present.
pub fn analyze(tables: &TableSet<'_>) -> InsightsResult<ConversionAnalysis> {
    let pipeline = tables.require(ANALYSIS, sheets::SALES_PIPELINE)?;
    let stages = tables::texts(ANALYSIS, pipeline, sales::STAGE)?;
    let sources = tables::texts(ANALYSIS, pipeline, sales::SOURCE)?;
    let values = pipeline
        .numbers(sales::VALUE)
        .unwrap_or_else(|| vec![None; pipeline.len()]);

    let mut tallies: BTreeMap<&str, SourceTally> = BTreeMap::new();
    for row in 0..pipeline.len() {
        let tally = tallies.entry(sources[row].unwrap_or("Unknown")).or_default();
        tally.total += 1;
        match stages[row] {
            Some(sales::CLOSED_WON) => {
                tally.closed += 1;
                tally.won += 1;
            }
            Some(sales::CLOSED_LOST) => tally.closed += 1,
            _ => {}
        }
        if let Some(v) = values[row] {
            tally.value_sum += v;
            tally.value_count += 1;
        }
    }

    let by_source: Vec<SourceConversion> = tallies
        .into_iter()
        .map(|(source, t)| SourceConversion {
            source: source.to_string(),
            total_deals: t.total,
            closed_deals: t.closed,
            won_deals: t.won,
            conversion_rate: stats::conversion_rate(t.won as f64, t.closed as f64),
            avg_deal_value: stats::ratio(t.value_sum, t.value_count as f64),
        })
        .collect();

    let total_closed: u64 = by_source.iter().map(|s| s.closed_deals).sum();
    let total_won: u64 = by_source.iter().map(|s| s.won_deals).sum();
    let overall_rate = stats::conversion_rate(total_won as f64, total_closed as f64);

    let by_traffic_source = match tables.get(sheets::WEBSITE_TRAFFIC) {
        Some(traffic) => traffic_conversion(traffic)?,
        None => Vec::new(),
    };

    info!(
        sources = by_source.len(),
        closed = total_closed,
        won = total_won,
        rate = ?overall_rate,
        "Conversion analysis complete"
    );

    Ok(ConversionAnalysis {
        by_source,
        overall_rate,
        total_closed,
        total_won,
        by_traffic_source,
    })
}

/// Ticket inquiries per session for each traffic source.
pub fn traffic_conversion(table: &CleanTable) -> InsightsResult<Vec<TrafficConversion>> {
    let sources = tables::texts(ANALYSIS, table, website::SOURCE)?;
    let sessions = tables::amounts(ANALYSIS, table, website::SESSIONS)?;
    let conversions = tables::amounts_or_zero(table, website::CONVERSIONS);

    Ok(tables::group_sums(&sources, &[sessions.as_slice(), conversions.as_slice()])
        .into_iter()
        .map(|(source, sums)| TrafficConversion {
            source,
            sessions: sums[0],
            conversions: sums[1],
            conversion_rate: stats::conversion_rate(sums[1], sums[0]),
        })
        .collect())
}

/// Source with the highest defined conversion rate; ties keep the first.
pub fn best_source(analysis: &ConversionAnalysis) -> Option<&SourceConversion> {
    analysis
        .by_source
        .iter()
        .filter(|s| s.conversion_rate.is_some())
        .fold(None, |best: Option<&SourceConversion>, s| match best {
            Some(b) if b.conversion_rate >= s.conversion_rate => Some(b),
            _ => Some(s),
        })
}
