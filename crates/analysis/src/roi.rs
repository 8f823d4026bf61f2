//! Return on investment per marketing channel.
//!
//! Paid channels come from the Ad Spend sheet, one channel per platform and
//! campaign. Owned channels (email, organic website, social) are costed
//! with the configured estimates.

use crate::stats;
use crate::tables::{self, TableSet};
use insights_core::artifact::{ChannelRoi, RoiAnalysis};
use insights_core::config::RoiConfig;
use insights_core::sheets::{self, ads, email, social, website};
use insights_core::{InsightsError, InsightsResult};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const ANALYSIS: &str = "roi";

pub fn channel_roi(channel: &str, spend: f64, conversions: f64, estimated_return: f64) -> ChannelRoi {
    ChannelRoi {
        channel: channel.to_string(),
        spend,
        conversions,
        estimated_return,
        roi: stats::roi(estimated_return, spend),
        roas: stats::roas(estimated_return, spend),
        cpa: stats::ratio(spend, conversions),
    }
}

/// ROI for every channel whose sheet is present.
pub fn analyze(tables: &TableSet<'_>, config: &RoiConfig) -> InsightsResult<RoiAnalysis> {
    let mut channels = Vec::new();

    if let Some(table) = tables.get(sheets::AD_SPEND) {
        let platforms = tables::texts(ANALYSIS, table, ads::PLATFORM)?;
        let campaigns = tables::texts(ANALYSIS, table, ads::CAMPAIGN)?;
        let spend = tables::amounts(ANALYSIS, table, ads::SPEND)?;
        let conversions = tables::amounts_or_zero(table, ads::CONVERSIONS);

        let mut groups: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for row in 0..table.len() {
            let name = format!(
                "{} {}",
                platforms[row].unwrap_or("Unknown"),
                campaigns[row].unwrap_or("Unknown")
            );
            let entry = groups.entry(name).or_default();
            entry.0 += spend[row];
            entry.1 += conversions[row];
        }
        for (name, (spend, conversions)) in groups {
            channels.push(channel_roi(
                &name,
                spend,
                conversions,
                conversions * config.ad_value_per_conversion,
            ));
        }
    }

    if let Some(table) = tables.get(sheets::EMAIL_CAMPAIGNS) {
        let conversions: f64 = tables::amounts_or_zero(table, email::CONVERSIONS).iter().sum();
        let revenue: f64 = tables::amounts_or_zero(table, email::REVENUE).iter().sum();
        channels.push(channel_roi("Email Campaigns", config.email_cost, conversions, revenue));
    }

    if let Some(table) = tables.get(sheets::WEBSITE_TRAFFIC) {
        let conversions: f64 = tables::amounts_or_zero(table, website::CONVERSIONS).iter().sum();
        channels.push(channel_roi(
            "Website Organic",
            config.website_cost,
            conversions,
            conversions * config.website_value_per_conversion,
        ));
    }

    if let Some(table) = tables.get(sheets::SOCIAL_MEDIA) {
        let clicks: f64 = tables::amounts_or_zero(table, social::CLICKS).iter().sum();
        let conversions = clicks * config.social_click_conversion_rate;
        channels.push(channel_roi(
            "Social Media",
            config.social_cost,
            conversions,
            conversions * config.social_value_per_conversion,
        ));
    }

    if channels.is_empty() {
        return Err(InsightsError::degraded(ANALYSIS, "no channel sheets available"));
    }
    for c in &channels {
        debug!(channel = %c.channel, spend = c.spend, roi = ?c.roi, "Channel ROI");
    }

    let result = summarize(channels);
    info!(
        channels = result.channels.len(),
        best = ?result.best_channel,
        worst = ?result.worst_channel,
        "ROI analysis complete"
    );
    Ok(result)
}

/// Best, worst and mean over channels with a defined ROI.
pub fn summarize(channels: Vec<ChannelRoi>) -> RoiAnalysis {
    let defined: Vec<(&str, f64)> = channels
        .iter()
        .filter_map(|c| c.roi.map(|r| (c.channel.as_str(), r)))
        .collect();

    let best = defined
        .iter()
        .copied()
        .reduce(|best, next| if next.1 > best.1 { next } else { best });
    let worst = defined
        .iter()
        .copied()
        .reduce(|worst, next| if next.1 < worst.1 { next } else { worst });
    let average = stats::mean(&defined.iter().map(|(_, r)| *r).collect::<Vec<_>>());

    RoiAnalysis {
        best_channel: best.map(|(c, _)| c.to_string()),
        best_roi: best.map(|(_, r)| r),
        worst_channel: worst.map(|(c, _)| c.to_string()),
        worst_roi: worst.map(|(_, r)| r),
        average_roi: average,
        channels,
    }
}
