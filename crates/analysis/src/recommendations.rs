//! Action items derived from the analysis sections that are present.

use crate::conversion::best_source;
use insights_core::artifact::{
    ConversionAnalysis, HiddenInsights, Impact, Priority, Recommendation, RoiAnalysis,
    TargetProgress,
};

fn recommendation(title: String, details: String, priority: Priority, impact: Impact) -> Recommendation {
    Recommendation {
        title,
        details,
        priority,
        impact,
    }
}

fn percent(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn generate(
    roi: Option<&RoiAnalysis>,
    conversion: Option<&ConversionAnalysis>,
    hidden: Option<&HiddenInsights>,
    targets: Option<&TargetProgress>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(roi) = roi {
        if let (Some(best), Some(worst), Some(best_roi), Some(worst_roi)) = (
            &roi.best_channel,
            &roi.worst_channel,
            roi.best_roi,
            roi.worst_roi,
        ) {
            if best != worst {
                out.push(recommendation(
                    format!("Reallocate budget from {worst} to {best}"),
                    format!(
                        "{worst} returns an ROI of {worst_roi:.1}x against {best_roi:.1}x for {best}. \
                         Move spend towards the stronger channel."
                    ),
                    Priority::Critical,
                    Impact::High,
                ));
            }
        }
    }

    if let Some(conversion) = conversion {
        if let Some(source) = best_source(conversion) {
            out.push(recommendation(
                format!("Launch a referral programme targeting {} leads", source.source),
                format!(
                    "{} leads convert at {} against {} overall. Reward successful referrals.",
                    source.source,
                    percent(source.conversion_rate),
                    percent(conversion.overall_rate),
                ),
                Priority::High,
                Impact::Medium,
            ));
        }
    }

    if let Some(hidden) = hidden {
        if hidden.stuck_deals_count > 0 {
            out.push(recommendation(
                "Run a pipeline rescue campaign for stuck deals".to_string(),
                format!(
                    "{} deals worth EUR {:.0} have been open since before the cut-off. \
                     Escalate outreach with a limited-time incentive.",
                    hidden.stuck_deals_count, hidden.stuck_deals_value
                ),
                Priority::High,
                Impact::High,
            ));
        }
    }

    if let Some(targets) = targets {
        if targets.delegate_gap > 0.0 || targets.sponsor_gap > 0.0 {
            out.push(recommendation(
                "Accelerate acquisition with time-bound promotions".to_string(),
                format!(
                    "The forecast falls {:.0} delegates and {:.0} sponsors short of target. \
                     Offer an early sign-up discount with a fixed deadline.",
                    targets.delegate_gap.ceil(),
                    targets.sponsor_gap.ceil()
                ),
                Priority::High,
                Impact::Medium,
            ));
        }
    }

    out.push(recommendation(
        "Hold a weekly performance review".to_string(),
        "Review leads, conversion rate, pipeline value and stuck deals every week against this report."
            .to_string(),
        Priority::Medium,
        Impact::High,
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::{channel_roi, summarize};
    use chrono::NaiveDate;

    #[test]
    fn test_weekly_review_always_present() {
        let recs = generate(None, None, None, None);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].impact, Impact::High);
    }

    #[test]
    fn test_reallocation_names_worst_and_best() {
        let roi = summarize(vec![
            channel_roi("Google Ads Retargeting", 100.0, 1.0, 900.0),
            channel_roi("LinkedIn Ads C-Suite", 100.0, 1.0, 50.0),
        ]);
        let recs = generate(Some(&roi), None, None, None);
        assert_eq!(recs.len(), 2);
        assert_eq!(
            recs[0].title,
            "Reallocate budget from LinkedIn Ads C-Suite to Google Ads Retargeting"
        );
        assert_eq!(recs[0].priority, Priority::Critical);
    }

    #[test]
    fn test_rescue_only_with_stuck_deals() {
        let mut hidden = HiddenInsights {
            as_of: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            stuck_deals_count: 0,
            stuck_deals_value: 0.0,
            common_blockers: vec![],
            high_value_low_conversion: vec![],
            monthly_lead_trend: vec![],
        };
        assert_eq!(generate(None, None, Some(&hidden), None).len(), 1);

        hidden.stuck_deals_count = 2;
        hidden.stuck_deals_value = 48_000.0;
        let recs = generate(None, None, Some(&hidden), None);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].details.starts_with("2 deals worth EUR 48000"));
    }
}
