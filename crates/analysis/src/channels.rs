//! Descriptive summaries per marketing channel.

use crate::conversion::traffic_conversion;
use crate::stats;
use crate::tables::{self, TableSet};
use insights_core::artifact::{
    AdPlatformStats, AdsSummary, ChannelSummaries, EmailSummary, LabelCount, PlatformEngagement,
    SalesSummary, SocialSummary, WebsiteSummary,
};
use insights_core::sheets::{self, ads, email, sales, social};
use insights_core::{CleanTable, InsightsError, InsightsResult};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const ANALYSIS: &str = "channels";

const TOP_SOURCES: usize = 5;

/// Summaries for every channel sheet that is present. A sheet that cannot
/// be summarised is left out with a warning.
pub fn analyze(tables: &TableSet<'_>) -> InsightsResult<ChannelSummaries> {
    let mut summaries = ChannelSummaries::default();

    fn keep<T>(sheet: &str, result: InsightsResult<T>) -> Option<T> {
        result
            .map_err(|e| warn!(sheet, error = %e, "Channel summary skipped"))
            .ok()
    }

    if let Some(t) = tables.get(sheets::WEBSITE_TRAFFIC) {
        summaries.website = keep(sheets::WEBSITE_TRAFFIC, website_summary(t));
    }
    if let Some(t) = tables.get(sheets::SOCIAL_MEDIA) {
        summaries.social = keep(sheets::SOCIAL_MEDIA, social_summary(t));
    }
    if let Some(t) = tables.get(sheets::EMAIL_CAMPAIGNS) {
        summaries.email = keep(sheets::EMAIL_CAMPAIGNS, email_summary(t));
    }
    if let Some(t) = tables.get(sheets::SALES_PIPELINE) {
        summaries.sales = keep(sheets::SALES_PIPELINE, sales_summary(t));
    }
    if let Some(t) = tables.get(sheets::AD_SPEND) {
        summaries.ads = keep(sheets::AD_SPEND, ads_summary(t));
    }

    if summaries == ChannelSummaries::default() {
        return Err(InsightsError::degraded(ANALYSIS, "no channel sheets could be summarised"));
    }
    info!("Channel summaries complete");
    Ok(summaries)
}

pub fn website_summary(table: &CleanTable) -> InsightsResult<WebsiteSummary> {
    let by_source = traffic_conversion(table)?;
    Ok(WebsiteSummary {
        total_sessions: by_source.iter().map(|s| s.sessions).sum(),
        total_conversions: by_source.iter().map(|s| s.conversions).sum(),
        by_source,
    })
}

pub fn social_summary(table: &CleanTable) -> InsightsResult<SocialSummary> {
    let platforms = tables::texts(ANALYSIS, table, social::PLATFORM)?;
    let impressions = tables::amounts_or_zero(table, social::IMPRESSIONS);
    let engagements = tables::amounts_or_zero(table, social::ENGAGEMENTS);
    let clicks = tables::amounts_or_zero(table, social::CLICKS);

    let platforms: Vec<PlatformEngagement> = tables::group_sums(
        &platforms,
        &[impressions.as_slice(), engagements.as_slice(), clicks.as_slice()],
    )
    .into_iter()
    .map(|(platform, s)| PlatformEngagement {
        platform,
        impressions: s[0],
        engagements: s[1],
        clicks: s[2],
        engagement_rate: stats::ratio(s[1], s[0]),
    })
    .collect();

    let best_platform = platforms
        .iter()
        .filter_map(|p| p.engagement_rate.map(|r| (p, r)))
        .fold(None, |best: Option<(&PlatformEngagement, f64)>, (p, r)| match best {
            Some((_, b)) if b >= r => best,
            _ => Some((p, r)),
        })
        .map(|(p, _)| p.platform.clone());

    Ok(SocialSummary {
        total_impressions: impressions.iter().sum(),
        total_clicks: clicks.iter().sum(),
        platforms,
        best_platform,
    })
}

pub fn email_summary(table: &CleanTable) -> InsightsResult<EmailSummary> {
    let campaigns = tables::texts(ANALYSIS, table, email::CAMPAIGN)?;
    let rate = |column: &str| table.numbers(column).and_then(|v| stats::mean_defined(v));
    Ok(EmailSummary {
        campaigns: campaigns.iter().flatten().count() as u64,
        total_conversions: tables::amounts_or_zero(table, email::CONVERSIONS).iter().sum(),
        total_revenue: tables::amounts_or_zero(table, email::REVENUE).iter().sum(),
        avg_open_rate: rate(email::OPEN_RATE),
        avg_ctr: rate(email::CTR),
    })
}

pub fn sales_summary(table: &CleanTable) -> InsightsResult<SalesSummary> {
    let stages = tables::texts(ANALYSIS, table, sales::STAGE)?;
    let sources = table
        .texts(sales::SOURCE)
        .unwrap_or_else(|| vec![None; table.len()]);

    let mut top_sources = label_counts(&sources);
    top_sources.truncate(TOP_SOURCES);

    Ok(SalesSummary {
        total_deals: table.len() as u64,
        total_pipeline_value: tables::amounts_or_zero(table, sales::VALUE).iter().sum(),
        stage_distribution: label_counts(&stages),
        top_sources,
    })
}

pub fn ads_summary(table: &CleanTable) -> InsightsResult<AdsSummary> {
    let platforms = tables::texts(ANALYSIS, table, ads::PLATFORM)?;
    let spend = tables::amounts(ANALYSIS, table, ads::SPEND)?;
    let conversions = tables::amounts_or_zero(table, ads::CONVERSIONS);
    let impressions = tables::amounts_or_zero(table, ads::IMPRESSIONS);
    let clicks = tables::amounts_or_zero(table, ads::CLICKS);

    let platforms: Vec<AdPlatformStats> = tables::group_sums(
        &platforms,
        &[
            spend.as_slice(),
            conversions.as_slice(),
            impressions.as_slice(),
            clicks.as_slice(),
        ],
    )
    .into_iter()
    .map(|(platform, s)| AdPlatformStats {
        platform,
        spend: s[0],
        conversions: s[1],
        impressions: s[2],
        clicks: s[3],
        cpa: stats::ratio(s[0], s[1]),
        cpc: stats::ratio(s[0], s[3]),
    })
    .collect();

    let best_platform = platforms
        .iter()
        .filter_map(|p| p.cpa.map(|c| (p, c)))
        .fold(None, |best: Option<(&AdPlatformStats, f64)>, (p, c)| match best {
            Some((_, b)) if b <= c => best,
            _ => Some((p, c)),
        })
        .map(|(p, _)| p.platform.clone());

    Ok(AdsSummary {
        total_spend: spend.iter().sum(),
        total_conversions: conversions.iter().sum(),
        platforms,
        best_platform,
    })
}

/// Occurrences per non-null label, most frequent first, ties by label.
pub fn label_counts(values: &[Option<&str>]) -> Vec<LabelCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for &v in values.iter().flatten() {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}
