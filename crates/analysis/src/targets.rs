//! Delegate and sponsor sales against their targets, projected forward at
//! the observed monthly lead growth.

use crate::stats;
use crate::tables::{self, TableSet};
use chrono::Datelike;
use insights_core::artifact::{MonthlyTargetPrediction, TargetProgress};
use insights_core::config::TargetConfig;
use insights_core::sheets::{self, sales};
use insights_core::InsightsResult;
use std::collections::BTreeMap;
use tracing::info;

pub const ANALYSIS: &str = "targets";

/// Mean month-over-month change of `counts`, falling back to the default
/// when it is unavailable or not positive, and capped.
pub fn monthly_growth(counts: &[u64], config: &TargetConfig) -> f64 {
    let changes: Vec<f64> = counts
        .windows(2)
        .filter_map(|w| stats::ratio(w[1] as f64 - w[0] as f64, w[0] as f64))
        .collect();
    match stats::mean(&changes) {
        Some(g) if g > 0.0 => g.min(config.max_growth),
        _ => config.default_growth,
    }
}

/// New leads per calendar month of first contact, oldest first.
pub fn leads_per_month(dates: &[Option<chrono::NaiveDate>]) -> BTreeMap<(i32, u32), u64> {
    let mut months = BTreeMap::new();
    for d in dates.iter().flatten() {
        *months.entry((d.year(), d.month())).or_insert(0) += 1;
    }
    months
}

pub fn analyze(tables: &TableSet<'_>, config: &TargetConfig) -> InsightsResult<TargetProgress> {
    let pipeline = tables.require(ANALYSIS, sheets::SALES_PIPELINE)?;
    let stages = tables::texts(ANALYSIS, pipeline, sales::STAGE)?;
    let ticket_types = tables::texts(ANALYSIS, pipeline, sales::TICKET_TYPE)?;
    let first_contact = tables::dates(ANALYSIS, pipeline, sales::FIRST_CONTACT)?;

    let won_of = |kind: &str| -> u64 {
        stages
            .iter()
            .zip(&ticket_types)
            .filter(|(stage, ticket)| {
                **stage == Some(sales::CLOSED_WON)
                    && ticket.is_some_and(|t| t.to_lowercase().contains(kind))
            })
            .count() as u64
    };
    let current_delegates = won_of("delegate");
    let current_sponsors = won_of("sponsor");

    let counts: Vec<u64> = leads_per_month(&first_contact).into_values().collect();
    let growth = monthly_growth(&counts, config);
    let months = config.months_remaining;

    let project = |current: u64, month: u32| current as f64 * (1.0 + growth).powi(month as i32);
    let delegate_forecast = project(current_delegates, months);
    let sponsor_forecast = project(current_sponsors, months);

    let monthly = (1..=months)
        .map(|month| MonthlyTargetPrediction {
            month,
            delegates: project(current_delegates, month).floor() as u64,
            sponsors: project(current_sponsors, month).floor() as u64,
        })
        .collect();

    let delegate_target = config.delegate_target as f64;
    let sponsor_target = config.sponsor_target as f64;

    let progress = TargetProgress {
        current_delegates,
        current_sponsors,
        delegate_target: config.delegate_target,
        sponsor_target: config.sponsor_target,
        monthly_growth_rate: growth,
        delegate_forecast,
        sponsor_forecast,
        delegate_gap: (delegate_target - delegate_forecast).max(0.0),
        sponsor_gap: (sponsor_target - sponsor_forecast).max(0.0),
        monthly,
        on_track_delegates: delegate_forecast >= config.on_track_ratio * delegate_target,
        on_track_sponsors: sponsor_forecast >= config.on_track_ratio * sponsor_target,
    };

    info!(
        delegates = current_delegates,
        sponsors = current_sponsors,
        growth,
        delegate_forecast,
        sponsor_forecast,
        "Target progress projected"
    );
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insights_core::{Cell, CleanRecord, CleanTable, ColumnDef, ColumnType};

    fn pipeline(deals: &[(&str, &str, (i32, u32, u32))]) -> CleanTable {
        let mut t = CleanTable::new(
            sheets::SALES_PIPELINE,
            vec![
                ColumnDef {
                    name: sales::STAGE.into(),
                    column_type: ColumnType::Text,
                },
                ColumnDef {
                    name: sales::TICKET_TYPE.into(),
                    column_type: ColumnType::Text,
                },
                ColumnDef {
                    name: sales::FIRST_CONTACT.into(),
                    column_type: ColumnType::Date,
                },
            ],
        );
        for (stage, ticket, (y, m, d)) in deals {
            t.records.push(CleanRecord {
                cells: vec![
                    Cell::Text(stage.to_string()),
                    Cell::Text(ticket.to_string()),
                    Cell::Date(NaiveDate::from_ymd_opt(*y, *m, *d).unwrap()),
                ],
            });
        }
        t
    }

    #[test]
    fn test_monthly_growth_rules() {
        let config = TargetConfig::default();
        // 10 -> 11 -> 12.1: 10% growth per month.
        assert!((monthly_growth(&[100, 110, 121], &config) - 0.10).abs() < 1e-12);
        // Shrinking leads fall back to the default.
        assert!((monthly_growth(&[10, 5], &config) - config.default_growth).abs() < f64::EPSILON);
        // A single month has no change to measure.
        assert!((monthly_growth(&[10], &config) - config.default_growth).abs() < f64::EPSILON);
        // Explosive growth is capped.
        assert!((monthly_growth(&[1, 10], &config) - config.max_growth).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_projection() {
        let tables = vec![pipeline(&[
            ("Closed Won", "Delegate Pass", (2026, 1, 5)),
            ("Closed Won", "Delegate Pass", (2026, 1, 9)),
            ("Closed Won", "Gold Sponsor", (2026, 2, 2)),
            ("Closed Lost", "Delegate Pass", (2026, 2, 3)),
            ("Negotiation", "Silver Sponsor", (2026, 2, 20)),
        ])];
        let config = TargetConfig::default();
        let progress = analyze(&TableSet::new(&tables), &config).unwrap();

        assert_eq!(progress.current_delegates, 2);
        assert_eq!(progress.current_sponsors, 1);
        // Leads 2 -> 3 is +50%, capped at 30%.
        assert!((progress.monthly_growth_rate - 0.30).abs() < 1e-12);

        let expected = 2.0 * 1.3f64.powi(4);
        assert!((progress.delegate_forecast - expected).abs() < 1e-9);
        assert!((progress.delegate_gap - (300.0 - expected)).abs() < 1e-9);
        assert!(!progress.on_track_delegates);
        assert_eq!(progress.monthly.len(), 4);
        assert_eq!(progress.monthly[0].delegates, 2);
        assert_eq!(progress.monthly[3].delegates, expected.floor() as u64);
    }

    #[test]
    fn test_gap_never_negative() {
        let deals: Vec<(&str, &str, (i32, u32, u32))> =
            (0..30).map(|_| ("Closed Won", "Sponsor", (2026, 1, 1))).collect();
        let tables = vec![pipeline(&deals)];
        let progress = analyze(&TableSet::new(&tables), &TargetConfig::default()).unwrap();
        assert_eq!(progress.sponsor_gap, 0.0);
        assert!(progress.on_track_sponsors);
    }
}
