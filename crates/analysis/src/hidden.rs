//! Patterns that are easy to miss in the raw sheets: deals stalled late in
//! the pipeline, what blocks them, and sources that bring large but rarely
//! closing deals.

use crate::channels::label_counts;
use crate::tables::{self, TableSet};
use crate::targets::leads_per_month;
use chrono::NaiveDate;
use insights_core::artifact::{ConversionAnalysis, HiddenInsights, LabelCount, SourceConversion};
use insights_core::config::HiddenInsightsConfig;
use insights_core::sheets::{self, sales};
use insights_core::{CleanTable, InsightsError, InsightsResult};
use tracing::info;

pub const ANALYSIS: &str = "hidden";

const TOP_BLOCKERS: usize = 3;

/// Columns recording something that already happened. Forward-looking
/// dates such as the expected close never set the reference date.
const ACTIVITY_COLUMNS: [&str; 2] = [sales::FIRST_CONTACT, sales::LAST_ACTIVITY];

/// Latest observed-activity date in the sales pipeline.
pub fn latest_activity_date(pipeline: &CleanTable) -> Option<NaiveDate> {
    ACTIVITY_COLUMNS
        .iter()
        .filter_map(|column| pipeline.dates(column))
        .flatten()
        .flatten()
        .max()
}

/// The keyword occurring earliest in `note`, case-insensitively.
pub fn first_blocker<'k>(note: &str, keywords: &'k [String]) -> Option<&'k str> {
    let note = note.to_lowercase();
    keywords
        .iter()
        .filter_map(|k| note.find(&k.to_lowercase()).map(|pos| (pos, k.as_str())))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, k)| k)
}

pub fn analyze(
    tables: &TableSet<'_>,
    config: &HiddenInsightsConfig,
    conversion: Option<&ConversionAnalysis>,
) -> InsightsResult<HiddenInsights> {
    let pipeline = tables.require(ANALYSIS, sheets::SALES_PIPELINE)?;
    let stages = tables::texts(ANALYSIS, pipeline, sales::STAGE)?;
    let first_contact = tables::dates(ANALYSIS, pipeline, sales::FIRST_CONTACT)?;
    let values = tables::amounts_or_zero(pipeline, sales::VALUE);
    let notes = pipeline
        .texts(sales::NOTES)
        .unwrap_or_else(|| vec![None; pipeline.len()]);

    let as_of = config
        .as_of
        .or_else(|| latest_activity_date(pipeline))
        .ok_or_else(|| InsightsError::degraded(ANALYSIS, "no activity date in the sales pipeline"))?;

    let stuck: Vec<usize> = (0..pipeline.len())
        .filter(|&row| {
            let in_stage = stages[row].is_some_and(|s| config.stuck_stages.iter().any(|st| st == s));
            let aged = first_contact[row]
                .is_some_and(|d| (as_of - d).num_days() > config.stuck_after_days);
            in_stage && aged
        })
        .collect();

    let stuck_deals_value: f64 = stuck.iter().map(|&row| values[row]).sum();

    let blockers: Vec<Option<&str>> = stuck
        .iter()
        .filter_map(|&row| notes[row])
        .map(|note| first_blocker(note, &config.blocker_keywords))
        .collect();
    let mut common_blockers = label_counts(&blockers);
    common_blockers.truncate(TOP_BLOCKERS);

    let high_value_low_conversion: Vec<SourceConversion> = conversion
        .map(|c| {
            c.by_source
                .iter()
                .filter(|s| {
                    s.avg_deal_value.is_some_and(|v| v > config.high_value_threshold)
                        && s.conversion_rate.is_some_and(|r| r < config.low_conversion_threshold)
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let monthly_lead_trend = leads_per_month(&first_contact)
        .into_iter()
        .map(|((year, month), count)| LabelCount {
            label: format!("{year:04}-{month:02}"),
            count,
        })
        .collect();

    info!(
        %as_of,
        stuck = stuck.len(),
        stuck_value = stuck_deals_value,
        "Hidden insights found"
    );

    Ok(HiddenInsights {
        as_of,
        stuck_deals_count: stuck.len() as u64,
        stuck_deals_value,
        common_blockers,
        high_value_low_conversion,
        monthly_lead_trend,
    })
}
