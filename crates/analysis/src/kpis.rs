//! Headline figures, each taken from whichever section can supply it.

use crate::stats;
use crate::tables::TableSet;
use insights_core::artifact::{
    ChannelSummaries, ConversionAnalysis, HiddenInsights, KpiSummary, RoiAnalysis, TargetProgress,
};
use insights_core::sheets::{self, sales};

/// Sections the KPIs are read from. Absent sections leave their KPIs empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiSources<'a> {
    pub channels: Option<&'a ChannelSummaries>,
    pub roi: Option<&'a RoiAnalysis>,
    pub conversion: Option<&'a ConversionAnalysis>,
    pub targets: Option<&'a TargetProgress>,
    pub hidden: Option<&'a HiddenInsights>,
}

/// Summed deal value of Closed Won deals.
pub fn won_revenue(tables: &TableSet<'_>) -> Option<f64> {
    let pipeline = tables.get(sheets::SALES_PIPELINE)?;
    let stages = pipeline.texts(sales::STAGE)?;
    let values = pipeline.numbers(sales::VALUE)?;
    Some(
        stages
            .iter()
            .zip(values)
            .filter(|(stage, _)| **stage == Some(sales::CLOSED_WON))
            .filter_map(|(_, value)| value)
            .sum(),
    )
}

pub fn compute(tables: &TableSet<'_>, sources: KpiSources<'_>) -> KpiSummary {
    let sales = sources.channels.and_then(|c| c.sales.as_ref());
    let ads = sources.channels.and_then(|c| c.ads.as_ref());

    KpiSummary {
        total_leads: sales.map(|s| s.total_deals),
        overall_conversion_rate: sources.conversion.and_then(|c| c.overall_rate),
        won_revenue: won_revenue(tables),
        pipeline_value: sales.map(|s| s.total_pipeline_value),
        total_ad_spend: ads.map(|a| a.total_spend),
        overall_cpa: ads.and_then(|a| stats::ratio(a.total_spend, a.total_conversions)),
        delegate_progress: sources
            .targets
            .and_then(|t| stats::ratio(t.current_delegates as f64, t.delegate_target as f64)),
        sponsor_progress: sources
            .targets
            .and_then(|t| stats::ratio(t.current_sponsors as f64, t.sponsor_target as f64)),
        average_roi: sources.roi.and_then(|r| r.average_roi),
        stuck_deals_count: sources.hidden.map(|h| h.stuck_deals_count),
    }
}
