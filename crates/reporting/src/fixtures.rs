//! Artifact shared by the rendering and server tests.

use chrono::{NaiveDate, TimeZone, Utc};
use insights_core::artifact::*;
use insights_core::InsightsArtifact;
use uuid::Uuid;

fn week(i: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 1, 5).map(|d| d + chrono::Duration::weeks(i as i64))
}

fn roi_channel(channel: &str, spend: f64, conversions: f64, estimated_return: f64) -> ChannelRoi {
    ChannelRoi {
        channel: channel.into(),
        spend,
        conversions,
        estimated_return,
        roi: Some((estimated_return - spend) / spend),
        roas: Some(estimated_return / spend),
        cpa: (conversions > 0.0).then(|| spend / conversions),
    }
}

fn source(name: &str, closed: u64, won: u64, avg: f64) -> SourceConversion {
    SourceConversion {
        source: name.into(),
        total_deals: closed + 1,
        closed_deals: closed,
        won_deals: won,
        conversion_rate: (closed > 0).then(|| won as f64 / closed as f64),
        avg_deal_value: Some(avg),
    }
}

pub fn sample_artifact() -> InsightsArtifact {
    let channels = vec![
        roi_channel("Google Ads Retargeting", 9900.0, 26.0, 130_000.0),
        roi_channel("LinkedIn Ads C-Suite", 16_000.0, 3.0, 15_000.0),
        roi_channel("Email Campaigns", 5000.0, 24.0, 49_000.0),
    ];
    let conversion = ConversionAnalysis {
        by_source: vec![
            source("Referral", 2, 2, 25_000.0),
            source("Cold Outreach", 2, 1, 13_000.0),
            source("Conference Meeting", 2, 1, 41_666.0),
        ],
        overall_rate: Some(4.0 / 6.0),
        total_closed: 6,
        total_won: 4,
        by_traffic_source: vec![TrafficConversion {
            source: "organic_search".into(),
            sessions: 11_230.0,
            conversions: 117.0,
            conversion_rate: Some(117.0 / 11_230.0),
        }],
    };

    InsightsArtifact {
        metadata: ArtifactMetadata {
            run_id: Uuid::nil(),
            generated_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap(),
            random_seed: 42,
            cluster_count: 3,
            forecast_target: "Ticket Inquiry Conversions".into(),
            sheets_analyzed: vec!["Ad Spend".into(), "Sales Pipeline".into()],
        },
        kpis: Some(KpiSummary {
            total_leads: Some(12),
            overall_conversion_rate: Some(4.0 / 6.0),
            won_revenue: Some(116_000.0),
            pipeline_value: Some(282_000.0),
            total_ad_spend: Some(25_900.0),
            overall_cpa: Some(25_900.0 / 29.0),
            delegate_progress: Some(2.0 / 300.0),
            sponsor_progress: Some(2.0 / 25.0),
            average_roi: Some(5.0),
            stuck_deals_count: Some(4),
        }),
        channels: Some(ChannelSummaries {
            website: Some(WebsiteSummary {
                total_sessions: 11_230.0,
                total_conversions: 117.0,
                by_source: conversion.by_traffic_source.clone(),
            }),
            sales: Some(SalesSummary {
                total_deals: 12,
                total_pipeline_value: 282_000.0,
                stage_distribution: vec![LabelCount {
                    label: "Closed Won".into(),
                    count: 4,
                }],
                top_sources: vec![LabelCount {
                    label: "Referral".into(),
                    count: 3,
                }],
            }),
            ..Default::default()
        }),
        roi: Some(RoiAnalysis {
            best_channel: Some("Google Ads Retargeting".into()),
            best_roi: channels[0].roi,
            worst_channel: Some("LinkedIn Ads C-Suite".into()),
            worst_roi: channels[1].roi,
            average_roi: Some(5.0),
            channels,
        }),
        conversion: Some(conversion),
        forecast: Some(ForecastResult {
            sheet: "Website Traffic".into(),
            target: "Ticket Inquiry Conversions".into(),
            features: vec!["Sessions".into(), "New Users".into()],
            intercept: 1.5,
            coefficients: vec![0.008, 0.002],
            train_rows: 6,
            test_rows: 2,
            accuracy: ModelAccuracy {
                r_squared: Some(0.91),
                mae: 0.8,
                rmse: 1.1,
            },
            history: (0..8)
                .map(|i| SeriesPoint {
                    period: i,
                    date: week(i),
                    value: 18.0 + i as f64,
                })
                .collect(),
            predictions: (8..12)
                .map(|i| SeriesPoint {
                    period: i,
                    date: None,
                    value: 18.5 + i as f64,
                })
                .collect(),
        }),
        clusters: Some(ClusterResult {
            sheet: "Sales Pipeline".into(),
            features: vec!["Deal Value (EUR)".into(), "Days In Pipeline".into()],
            k: 2,
            iterations: 3,
            converged: true,
            inertia: 4.2,
            centroids: vec![
                ClusterCentroid {
                    cluster: 0,
                    size: 2,
                    center: vec![8000.0, 20.0],
                },
                ClusterCentroid {
                    cluster: 1,
                    size: 1,
                    center: vec![60_000.0, 39.0],
                },
            ],
            assignments: vec![
                ClusterAssignment {
                    row: 0,
                    label: "Acme".into(),
                    cluster: 0,
                },
                ClusterAssignment {
                    row: 1,
                    label: "Initech".into(),
                    cluster: 0,
                },
                ClusterAssignment {
                    row: 2,
                    label: "Umbrella".into(),
                    cluster: 1,
                },
            ],
        }),
        targets: Some(TargetProgress {
            current_delegates: 2,
            current_sponsors: 2,
            delegate_target: 300,
            sponsor_target: 25,
            monthly_growth_rate: 0.15,
            delegate_forecast: 3.5,
            sponsor_forecast: 3.5,
            delegate_gap: 296.5,
            sponsor_gap: 21.5,
            monthly: vec![MonthlyTargetPrediction {
                month: 1,
                delegates: 2,
                sponsors: 2,
            }],
            on_track_delegates: false,
            on_track_sponsors: false,
        }),
        hidden: Some(HiddenInsights {
            as_of: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            stuck_deals_count: 4,
            stuck_deals_value: 135_000.0,
            common_blockers: vec![LabelCount {
                label: "board approval".into(),
                count: 1,
            }],
            high_value_low_conversion: vec![],
            monthly_lead_trend: vec![LabelCount {
                label: "2026-01".into(),
                count: 5,
            }],
        }),
        recommendations: vec![
            Recommendation {
                title: "Reallocate budget from LinkedIn Ads C-Suite to Google Ads Retargeting".into(),
                details: "Shift spend".into(),
                priority: Priority::Critical,
                impact: Impact::High,
            },
            Recommendation {
                title: "Hold a weekly performance review".into(),
                details: "Every Monday".into(),
                priority: Priority::Medium,
                impact: Impact::High,
            },
        ],
        degraded: vec![],
        warnings: vec![],
    }
}
