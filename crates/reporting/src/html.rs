//! Self-contained HTML report rendered from an insights artifact.
//!
//! Every section renders on its own. A section whose analysis is absent
//! shows a placeholder panel, with the degradation reason when one was
//! recorded.

use crate::charts::{self, Bar, Series};
use crate::format::{eur, number, percent, ratio};
use insights_core::artifact::{
    ChannelSummaries, ClusterResult, ConversionAnalysis, ForecastResult, HiddenInsights,
    KpiSummary, Recommendation, RoiAnalysis, SeriesPoint, TargetProgress,
};
use insights_core::config::ReportConfig;
use insights_core::InsightsArtifact;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #F9FAFB; color: #111827; }
header { background: #1E3A8A; color: #FFFFFF; padding: 24px 32px; }
header p { margin: 4px 0 0; opacity: 0.8; font-size: 13px; }
nav { position: sticky; top: 0; z-index: 1; display: flex; flex-wrap: wrap; gap: 16px; background: #FFFFFF; border-bottom: 1px solid #E5E7EB; padding: 10px 32px; }
nav a { color: #1E3A8A; text-decoration: none; font-size: 14px; }
nav a:hover { text-decoration: underline; }
main { padding: 24px 32px; max-width: 1100px; }
section { scroll-margin-top: 56px; background: #FFFFFF; border: 1px solid #E5E7EB; border-radius: 8px; padding: 16px 20px; margin-bottom: 20px; }
h2 { margin-top: 0; font-size: 18px; }
.cards { display: flex; flex-wrap: wrap; gap: 12px; }
.card { flex: 1 1 160px; border: 1px solid #E5E7EB; border-radius: 6px; padding: 12px; }
.card .value { font-size: 22px; font-weight: 600; }
.card .label { font-size: 12px; color: #6B7280; }
table { border-collapse: collapse; width: 100%; margin-top: 12px; font-size: 13px; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #E5E7EB; }
.chart rect:hover, .chart circle:hover, .progress rect:hover { opacity: 0.75; }
.placeholder { color: #6B7280; font-style: italic; }
.notice { border-left: 4px solid #F59E0B; padding-left: 12px; }
.priority-critical { color: #B91C1C; }
.priority-high { color: #B45309; }
.priority-medium { color: #1D4ED8; }
"#;

/// Section anchors in page order, with their navigation labels.
const NAV: [(&str, &str); 9] = [
    ("kpis", "Key metrics"),
    ("roi", "ROI"),
    ("conversion", "Conversion"),
    ("channels", "Channels"),
    ("forecast", "Forecast"),
    ("clusters", "Segments"),
    ("targets", "Targets"),
    ("hidden", "Hidden insights"),
    ("recommendations", "Recommendations"),
];

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(artifact: &InsightsArtifact, config: &ReportConfig) -> String {
    let meta = &artifact.metadata;
    let sections = [
        kpi_section(artifact.kpis.as_ref()),
        section_or_placeholder(artifact, "roi", "ROI by channel", artifact.roi.as_ref(), roi_section),
        section_or_placeholder(
            artifact,
            "conversion",
            "Conversion by source",
            artifact.conversion.as_ref(),
            conversion_section,
        ),
        section_or_placeholder(
            artifact,
            "channels",
            "Channel performance",
            artifact.channels.as_ref(),
            channels_section,
        ),
        section_or_placeholder(artifact, "forecast", "Forecast", artifact.forecast.as_ref(), forecast_section),
        section_or_placeholder(
            artifact,
            "clusters",
            "Deal segments",
            artifact.clusters.as_ref(),
            clusters_section,
        ),
        section_or_placeholder(
            artifact,
            "targets",
            "Target progress",
            artifact.targets.as_ref(),
            targets_section,
        ),
        section_or_placeholder(
            artifact,
            "hidden",
            "Hidden insights",
            artifact.hidden.as_ref(),
            hidden_section,
        ),
        recommendations_section(&artifact.recommendations),
        notices_section(artifact),
    ];

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<header><h1>{title}</h1><p>Generated {generated} · run {run_id} · seed {seed} · sheets: {sheets}</p></header>\n{nav}\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(&config.title),
        generated = meta.generated_at.format("%Y-%m-%d %H:%M UTC"),
        run_id = meta.run_id,
        seed = meta.random_seed,
        sheets = escape(&meta.sheets_analyzed.join(", ")),
        nav = nav_bar(has_notices(artifact)),
        body = sections.join("\n"),
    )
}

/// Links to every section; the notices link only when that section exists.
fn nav_bar(notices: bool) -> String {
    let mut links: String = NAV
        .iter()
        .map(|(id, label)| format!("<a href=\"#{id}\">{label}</a>"))
        .collect();
    if notices {
        links.push_str("<a href=\"#notices\">Notices</a>");
    }
    format!("<nav>{links}</nav>")
}

fn has_notices(artifact: &InsightsArtifact) -> bool {
    !artifact.degraded.is_empty() || !artifact.warnings.is_empty()
}

fn panel(id: &str, title: &str, body: &str) -> String {
    format!(
        "<section id=\"{id}\"><h2>{}</h2>\n{body}\n</section>",
        escape(title)
    )
}

fn placeholder(artifact: &InsightsArtifact, id: &str, title: &str) -> String {
    let reason = artifact
        .degraded
        .iter()
        .find(|d| d.analysis == id)
        .map(|d| format!(" ({})", escape(&d.reason)))
        .unwrap_or_default();
    panel(
        id,
        title,
        &format!("<p class=\"placeholder\">No results available for this analysis{reason}.</p>"),
    )
}

fn section_or_placeholder<T>(
    artifact: &InsightsArtifact,
    id: &str,
    title: &str,
    section: Option<&T>,
    render: fn(&T) -> String,
) -> String {
    match section {
        Some(value) => panel(id, title, &render(value)),
        None => placeholder(artifact, id, title),
    }
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape(h)))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|c| format!("<td>{}</td>", escape(c))).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!("<table><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>")
}

// ─── KPIs ───────────────────────────────────────────────────────────────────

fn kpi_section(kpis: Option<&KpiSummary>) -> String {
    let Some(k) = kpis else {
        return panel(
            "kpis",
            "Key metrics",
            "<p class=\"placeholder\">No key metrics available.</p>",
        );
    };
    let cards = [
        ("Total leads", k.total_leads.map(|v| v.to_string())),
        ("Conversion rate", k.overall_conversion_rate.map(|r| percent(Some(r)))),
        ("Won revenue", k.won_revenue.map(eur)),
        ("Pipeline value", k.pipeline_value.map(eur)),
        ("Ad spend", k.total_ad_spend.map(eur)),
        ("Cost per acquisition", k.overall_cpa.map(eur)),
        ("Delegate progress", k.delegate_progress.map(|r| percent(Some(r)))),
        ("Sponsor progress", k.sponsor_progress.map(|r| percent(Some(r)))),
        ("Average ROI", k.average_roi.map(|r| ratio(Some(r)))),
        ("Stuck deals", k.stuck_deals_count.map(|v| v.to_string())),
    ];
    let cards: String = cards
        .iter()
        .map(|(label, value)| {
            format!(
                "<div class=\"card\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
                escape(value.as_deref().unwrap_or("n/a")),
                escape(label)
            )
        })
        .collect();
    panel("kpis", "Key metrics", &format!("<div class=\"cards\">{cards}</div>"))
}

// ─── ROI ────────────────────────────────────────────────────────────────────

fn roi_status(roi: Option<f64>) -> &'static str {
    match roi {
        Some(r) if r > 3.0 => "Scale up",
        Some(r) if r > 1.0 => "Maintain",
        Some(_) => "Review",
        None => "No spend",
    }
}

fn roi_section(roi: &RoiAnalysis) -> String {
    let mut channels: Vec<_> = roi.channels.iter().collect();
    channels.sort_by(|a, b| {
        b.roi
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&a.roi.unwrap_or(f64::NEG_INFINITY))
    });

    let bars: Vec<Bar> = channels
        .iter()
        .filter_map(|c| c.roi.map(|r| Bar::new(c.channel.clone(), r, charts::roi_color(Some(r)))))
        .collect();
    let chart = charts::bar_chart("ROI by channel", &bars, |v| format!("{v:.1}x"));

    let rows: Vec<Vec<String>> = channels
        .iter()
        .map(|c| {
            vec![
                c.channel.clone(),
                eur(c.spend),
                number(c.conversions),
                eur(c.estimated_return),
                ratio(c.roi),
                ratio(c.roas),
                c.cpa.map(eur).unwrap_or_else(|| "n/a".into()),
                roi_status(c.roi).to_string(),
            ]
        })
        .collect();

    let summary = match (&roi.best_channel, &roi.worst_channel) {
        (Some(best), Some(worst)) => format!(
            "<p>Best: <strong>{}</strong> ({}). Worst: <strong>{}</strong> ({}). Average ROI {}.</p>",
            escape(best),
            ratio(roi.best_roi),
            escape(worst),
            ratio(roi.worst_roi),
            ratio(roi.average_roi)
        ),
        _ => String::new(),
    };

    format!(
        "{summary}{chart}{}",
        table(
            &["Channel", "Spend", "Conversions", "Return", "ROI", "ROAS", "CPA", "Status"],
            &rows
        )
    )
}

// ─── Conversion ─────────────────────────────────────────────────────────────

fn conversion_section(conversion: &ConversionAnalysis) -> String {
    let mut sources: Vec<_> = conversion.by_source.iter().collect();
    sources.sort_by(|a, b| {
        b.conversion_rate
            .unwrap_or(-1.0)
            .total_cmp(&a.conversion_rate.unwrap_or(-1.0))
    });

    let bars: Vec<Bar> = sources
        .iter()
        .filter_map(|s| {
            s.conversion_rate
                .map(|r| Bar::new(s.source.clone(), r * 100.0, charts::BLUE))
        })
        .collect();
    let chart = charts::bar_chart("Conversion rate by lead source", &bars, |v| format!("{v:.1}%"));

    let rows: Vec<Vec<String>> = sources
        .iter()
        .map(|s| {
            vec![
                s.source.clone(),
                s.total_deals.to_string(),
                s.closed_deals.to_string(),
                s.won_deals.to_string(),
                percent(s.conversion_rate),
                s.avg_deal_value.map(eur).unwrap_or_else(|| "n/a".into()),
            ]
        })
        .collect();

    let mut out = format!(
        "<p>Overall conversion {} ({} won of {} closed).</p>{chart}{}",
        percent(conversion.overall_rate),
        conversion.total_won,
        conversion.total_closed,
        table(&["Lead source", "Deals", "Closed", "Won", "Rate", "Avg value"], &rows)
    );

    if !conversion.by_traffic_source.is_empty() {
        let rows: Vec<Vec<String>> = conversion
            .by_traffic_source
            .iter()
            .map(|t| {
                vec![
                    t.source.clone(),
                    number(t.sessions),
                    number(t.conversions),
                    percent(t.conversion_rate),
                ]
            })
            .collect();
        out.push_str("<h3>Website traffic sources</h3>");
        out.push_str(&table(&["Traffic source", "Sessions", "Conversions", "Rate"], &rows));
    }
    out
}

// ─── Channels ───────────────────────────────────────────────────────────────

fn channels_section(channels: &ChannelSummaries) -> String {
    let mut out = String::new();

    if let Some(w) = &channels.website {
        out.push_str(&format!(
            "<h3>Website</h3><p>{} sessions, {} ticket inquiries.</p>",
            number(w.total_sessions),
            number(w.total_conversions)
        ));
    }
    if let Some(s) = &channels.social {
        let bars: Vec<Bar> = s
            .platforms
            .iter()
            .filter_map(|p| {
                p.engagement_rate
                    .map(|r| Bar::new(p.platform.clone(), r * 100.0, charts::BLUE))
            })
            .collect();
        out.push_str(&format!(
            "<h3>Social media</h3><p>{} impressions, {} link clicks. Best platform: {}.</p>{}",
            number(s.total_impressions),
            number(s.total_clicks),
            escape(s.best_platform.as_deref().unwrap_or("n/a")),
            charts::bar_chart("Engagement rate by platform", &bars, |v| format!("{v:.2}%"))
        ));
    }
    if let Some(e) = &channels.email {
        out.push_str(&format!(
            "<h3>Email</h3><p>{} campaigns, {} conversions, {} attributed revenue. Mean open rate {}, mean CTR {}.</p>",
            e.campaigns,
            number(e.total_conversions),
            eur(e.total_revenue),
            percent(e.avg_open_rate),
            percent(e.avg_ctr)
        ));
    }
    if let Some(s) = &channels.sales {
        let stages: Vec<Bar> = s
            .stage_distribution
            .iter()
            .map(|l| Bar::new(l.label.clone(), l.count as f64, charts::BLUE))
            .collect();
        out.push_str(&format!(
            "<h3>Sales pipeline</h3><p>{} deals worth {}.</p>{}",
            s.total_deals,
            eur(s.total_pipeline_value),
            charts::bar_chart("Deals by stage", &stages, |v| format!("{v:.0}"))
        ));
    }
    if let Some(a) = &channels.ads {
        let rows: Vec<Vec<String>> = a
            .platforms
            .iter()
            .map(|p| {
                vec![
                    p.platform.clone(),
                    eur(p.spend),
                    number(p.conversions),
                    p.cpa.map(eur).unwrap_or_else(|| "n/a".into()),
                    p.cpc.map(eur).unwrap_or_else(|| "n/a".into()),
                ]
            })
            .collect();
        out.push_str(&format!(
            "<h3>Paid ads</h3><p>{} spent for {} conversions. Lowest CPA: {}.</p>{}",
            eur(a.total_spend),
            number(a.total_conversions),
            escape(a.best_platform.as_deref().unwrap_or("n/a")),
            table(&["Platform", "Spend", "Conversions", "CPA", "CPC"], &rows)
        ));
    }
    out
}

// ─── Forecast ───────────────────────────────────────────────────────────────

fn period_label(point: &SeriesPoint) -> String {
    point
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("period {}", point.period))
}

fn forecast_section(forecast: &ForecastResult) -> String {
    let history = Series {
        name: "Actual".into(),
        color: charts::BLUE,
        points: forecast
            .history
            .iter()
            .map(|p| (p.period as f64, p.value))
            .collect(),
        labels: forecast.history.iter().map(period_label).collect(),
        dashed: false,
    };
    // The forecast line starts at the last actual point so the two join.
    let joined: Vec<&SeriesPoint> = forecast
        .history
        .last()
        .into_iter()
        .chain(&forecast.predictions)
        .collect();
    let prediction = Series {
        name: "Forecast".into(),
        color: charts::AMBER,
        points: joined.iter().map(|p| (p.period as f64, p.value)).collect(),
        labels: joined.iter().map(|p| period_label(p)).collect(),
        dashed: true,
    };
    let chart = charts::line_chart(&format!("{} forecast", forecast.target), &[history, prediction]);

    let rows: Vec<Vec<String>> = forecast
        .predictions
        .iter()
        .map(|p| vec![period_label(p), format!("{:.1}", p.value)])
        .collect();

    format!(
        "<p>{} from {} on sheet {} ({} training rows, {} held out).</p><p>R² {} · MAE {:.2} · RMSE {:.2}</p>{chart}{}",
        escape(&forecast.target),
        escape(&forecast.features.join(", ")),
        escape(&forecast.sheet),
        forecast.train_rows,
        forecast.test_rows,
        forecast
            .accuracy
            .r_squared
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "n/a".into()),
        forecast.accuracy.mae,
        forecast.accuracy.rmse,
        table(&["Period", "Predicted"], &rows)
    )
}

// ─── Clusters ───────────────────────────────────────────────────────────────

fn clusters_section(clusters: &ClusterResult) -> String {
    let bars: Vec<Bar> = clusters
        .centroids
        .iter()
        .map(|c| Bar::new(format!("Cluster {}", c.cluster), c.size as f64, charts::BLUE))
        .collect();
    let chart = charts::bar_chart("Records per cluster", &bars, |v| format!("{v:.0}"));

    let mut headers = vec!["Cluster", "Size"];
    headers.extend(clusters.features.iter().map(String::as_str));
    let rows: Vec<Vec<String>> = clusters
        .centroids
        .iter()
        .map(|c| {
            let mut row = vec![c.cluster.to_string(), c.size.to_string()];
            row.extend(c.center.iter().map(|v| format!("{v:.1}")));
            row
        })
        .collect();

    format!(
        "<p>{} clusters over {} records of {}; {} iterations, {}, inertia {:.2}.</p>{chart}{}",
        clusters.k,
        clusters.assignments.len(),
        escape(&clusters.sheet),
        clusters.iterations,
        if clusters.converged { "converged" } else { "iteration cap reached" },
        clusters.inertia,
        table(&headers, &rows)
    )
}

// ─── Targets ────────────────────────────────────────────────────────────────

fn targets_section(targets: &TargetProgress) -> String {
    let status = |on_track: bool| if on_track { "on track" } else { "behind" };
    let color = |on_track: bool| if on_track { charts::GREEN } else { charts::RED };

    let rows: Vec<Vec<String>> = targets
        .monthly
        .iter()
        .map(|m| {
            vec![
                format!("Month {}", m.month),
                m.delegates.to_string(),
                m.sponsors.to_string(),
            ]
        })
        .collect();

    format!(
        "<p>Monthly lead growth {}. Forecast {:.0} delegates ({}, gap {:.0}) and {:.0} sponsors ({}, gap {:.0}).</p>{}{}{}",
        percent(Some(targets.monthly_growth_rate)),
        targets.delegate_forecast,
        status(targets.on_track_delegates),
        targets.delegate_gap,
        targets.sponsor_forecast,
        status(targets.on_track_sponsors),
        targets.sponsor_gap,
        charts::progress_bar(
            "Delegates",
            targets.current_delegates as f64,
            targets.delegate_target as f64,
            color(targets.on_track_delegates)
        ),
        charts::progress_bar(
            "Sponsors",
            targets.current_sponsors as f64,
            targets.sponsor_target as f64,
            color(targets.on_track_sponsors)
        ),
        table(&["Month", "Delegates", "Sponsors"], &rows)
    )
}

// ─── Hidden insights ────────────────────────────────────────────────────────

fn hidden_section(hidden: &HiddenInsights) -> String {
    let blockers: Vec<Bar> = hidden
        .common_blockers
        .iter()
        .map(|b| Bar::new(b.label.clone(), b.count as f64, charts::AMBER))
        .collect();
    let trend: Vec<Bar> = hidden
        .monthly_lead_trend
        .iter()
        .map(|m| Bar::new(m.label.clone(), m.count as f64, charts::BLUE))
        .collect();

    let mut out = format!(
        "<p>As of {}: <strong>{} stuck deals</strong> worth {}.</p>",
        hidden.as_of,
        hidden.stuck_deals_count,
        eur(hidden.stuck_deals_value)
    );
    if !blockers.is_empty() {
        out.push_str(&charts::bar_chart("Common blockers", &blockers, |v| format!("{v:.0}")));
    }
    if !hidden.high_value_low_conversion.is_empty() {
        let rows: Vec<Vec<String>> = hidden
            .high_value_low_conversion
            .iter()
            .map(|s| {
                vec![
                    s.source.clone(),
                    s.avg_deal_value.map(eur).unwrap_or_else(|| "n/a".into()),
                    percent(s.conversion_rate),
                ]
            })
            .collect();
        out.push_str("<h3>High-value, low-conversion sources</h3>");
        out.push_str(&table(&["Lead source", "Avg value", "Rate"], &rows));
    }
    out.push_str(&charts::bar_chart("New leads per month", &trend, |v| format!("{v:.0}")));
    out
}

// ─── Recommendations and notices ────────────────────────────────────────────

fn recommendations_section(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return panel(
            "recommendations",
            "Recommendations",
            "<p class=\"placeholder\">No recommendations.</p>",
        );
    }
    let items: String = recommendations
        .iter()
        .map(|r| {
            let priority = serde_json::to_value(r.priority)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!(
                "<li><strong class=\"priority-{priority}\">[{:?}]</strong> {} <em>(impact: {:?})</em><br>{}</li>",
                r.priority,
                escape(&r.title),
                r.impact,
                escape(&r.details)
            )
        })
        .collect();
    panel("recommendations", "Recommendations", &format!("<ol>{items}</ol>"))
}

fn notices_section(artifact: &InsightsArtifact) -> String {
    if !has_notices(artifact) {
        return String::new();
    }
    let degraded: String = artifact
        .degraded
        .iter()
        .map(|d| format!("<li><strong>{}</strong>: {}</li>", escape(&d.analysis), escape(&d.reason)))
        .collect();
    let warnings: String = artifact
        .warnings
        .iter()
        .map(|w| format!("<li>{}</li>", escape(w)))
        .collect();
    panel(
        "notices",
        "Notices",
        &format!("<div class=\"notice\"><ul>{degraded}{warnings}</ul></div>"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_artifact;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_full_report_has_every_section() {
        let artifact = sample_artifact();
        let html = render_html(&artifact, &ReportConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        for id in [
            "kpis",
            "roi",
            "conversion",
            "channels",
            "forecast",
            "clusters",
            "targets",
            "hidden",
            "recommendations",
        ] {
            assert!(html.contains(&format!("<section id=\"{id}\">")), "section {id}");
        }
        assert!(!html.contains("class=\"placeholder\""));
        assert!(html.contains("<svg"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_nav_links_every_section() {
        let mut artifact = sample_artifact();
        let html = render_html(&artifact, &ReportConfig::default());
        let nav_start = html.find("<nav>").unwrap();
        let nav = &html[nav_start..html.find("</nav>").unwrap()];
        assert!(nav_start < html.find("<main>").unwrap());
        for (id, _) in NAV {
            assert!(nav.contains(&format!("href=\"#{id}\"")), "nav link {id}");
            assert!(html.contains(&format!("<section id=\"{id}\">")), "anchor {id}");
        }
        assert!(!nav.contains("#notices"));

        artifact.warnings.push("clustering stopped at the iteration cap".into());
        let html = render_html(&artifact, &ReportConfig::default());
        assert!(html.contains("<a href=\"#notices\">Notices</a>"));
        assert!(html.contains("<section id=\"notices\">"));
    }

    #[test]
    fn test_charts_have_hover_details() {
        let artifact = sample_artifact();
        let html = render_html(&artifact, &ReportConfig::default());
        let roi = &html[html.find("<section id=\"roi\">").unwrap()..];
        assert!(roi.contains("<title>Google Ads Retargeting: "));

        let forecast = artifact.forecast.as_ref().unwrap();
        let first = &forecast.history[0];
        let section = &html[html.find("<section id=\"forecast\">").unwrap()..];
        assert!(section.contains(&format!(
            "<title>Actual {}: {:.1}</title>",
            period_label(first),
            first.value
        )));
        assert_eq!(
            section[..section.find("</section>").unwrap()].matches("<circle").count(),
            forecast.history.len() + 1 + forecast.predictions.len()
        );
        assert!(html.contains("<title>Delegates: "));
    }

    #[test]
    fn test_absent_sections_render_placeholders() {
        let mut artifact = sample_artifact();
        artifact.forecast = None;
        artifact.clusters = None;
        artifact.degraded.push(insights_core::artifact::DegradedAnalysis {
            analysis: "forecast".into(),
            reason: "3 usable periods, need at least 4".into(),
        });
        let html = render_html(&artifact, &ReportConfig::default());
        assert_eq!(html.matches("class=\"placeholder\"").count(), 2);
        assert!(html.contains("3 usable periods, need at least 4"));
        assert!(html.contains("<section id=\"notices\">"));
    }

    #[test]
    fn test_render_does_not_mutate_artifact() {
        let artifact = sample_artifact();
        let before = artifact.clone();
        let _ = render_html(&artifact, &ReportConfig::default());
        assert_eq!(artifact, before);
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut artifact = sample_artifact();
        if let Some(roi) = artifact.roi.as_mut() {
            roi.channels[0].channel = "<img src=x>".into();
        }
        let html = render_html(&artifact, &ReportConfig::default());
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("&lt;img src=x&gt;"));
    }
}
