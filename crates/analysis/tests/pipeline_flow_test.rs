//! Ingest → clean → analyse over a small marketing workbook on disk.

use insights_analysis::{analyze, clustering, conversion, regression};
use insights_cleaning::{load_clean_tables, write_outputs, Cleaner};
use insights_core::sheets::{self, sales};
use insights_core::PipelineConfig;
use insights_ingest::Workbook;
use std::fs;
use std::path::Path;

const WEBSITE_TRAFFIC: &str = "\
Week Starting,Traffic Source,Sessions,Users,New Users,Bounce Rate,Ticket Inquiry Conversions
2026-01-05,Organic Search,1200,950,600,45%,12
2026-01-05,Paid Ads,800,700,500,52%,6
2026-01-12,Organic Search,1260,990,640,44%,13
2026-01-12,Paid Ads,820,720,510,51%,7
2026-01-19,Organic Search,1310,1020,610,46%,12
2026-01-19,Paid Ads,900,760,560,50%,8
2026-01-26,Organic Search,1405,1100,700,43%,15
2026-01-26,Paid Ads,870,750,530,49%,7
2026-02-02,Organic Search,1380,1090,720,42%,14
2026-02-02,Paid Ads,950,800,600,48%,9
2026-02-09,Organic Search,1500,1180,760,41%,16
2026-02-09,Paid Ads,990,820,610,47%,9
2026-02-16,Organic Search,1555,1210,740,42%,17
2026-02-16,Paid Ads,1010,840,640,46%,10
2026-02-23,Organic Search,1620,1260,800,40%,18
2026-02-23,Paid Ads,1100,900,690,45%,11
";

const SOCIAL_MEDIA: &str = "\
Week Starting,Platform,Followers (Total),New Followers,Impressions,Engagements,Engagement Rate,Link Clicks,Top Post Type,Top Post Impressions
2026-01-05,LinkedIn,10000,120,50000,2500,5%,400,Video,12000
2026-01-05,X/Twitter,8000,60,40000,800,2%,150,Image,8000
2026-01-12,LinkedIn,10120,140,52000,2700,5.2%,420,Carousel,13000
2026-01-12,Twitter,8060,50,38000,700,1.8%,140,Text,7000
";

const EMAIL_CAMPAIGNS: &str = "\
Campaign Name,Send Date,List Size,Emails Delivered,Opens,Open Rate,Clicks,CTR,Unsubscribes,Conversions (Ticket Inquiries),Revenue Attributed
Early Bird Launch,2026-01-10,5000,4900,1470,30%,245,5%,12,8,16000
Speaker Reveal,2026-02-07,5200,5100,1632,32%,306,6%,10,10,21000
Last Call,2026-03-07,5300,5200,1456,28%,208,4%,15,6,12000
";

const SALES_PIPELINE: &str = "\
Company Name,Contact Name,Contact Email,Deal Stage,Deal Value (EUR),Lead Source,Ticket Type,First Contact Date,Last Activity Date,Expected Close Date,Notes
Acme,Ann Lee,,closed won,12000,Referral,Delegate Pass,2026-01-03,2026-01-20,2026-01-25,
Globex,Bob Ray,bob@globex.com,Closed Won,45000,Referral,Gold Sponsor,2026-01-08,2026-02-10,2026-02-15,Signed
Initech,Cy Dow,,Closed Lost,8000,Cold Outreach,Delegate Pass,2026-01-10,2026-02-01,,Went with another event
Umbrella,Di Fox,,Negotiation,60000,Conference Meeting,Platinum Sponsor,2026-01-12,2026-02-20,2026-03-30,Awaiting board approval
Stark,Ed Gee,,Proposal Sent,22000,Cold Outreach,Delegate Pass,2026-01-15,2026-02-05,2026-03-15,Budget review pending
Wayne,Flo Hu,,Negotiation,35000,Partner Network,Silver Sponsor,2026-02-01,2026-02-25,2026-03-20,Comparing options
Hooli,Gus Ivy,,Lead,5000,Website Inquiry,Delegate Pass,2026-02-10,2026-02-12,,
Soylent,Hal Jo,,Closed Won,9000,Cold Outreach,Delegate Pass,2026-02-14,2026-03-01,2026-03-01,
Tyrell,Ian Kim,,Closed Lost,15000,Conference Meeting,Delegate Pass,2026-02-18,2026-03-05,,No budget
Cyberdyne,Jo Lin,,Proposal Sent,18000,Referral,Delegate Pass,2026-03-01,2026-03-10,2026-04-01,Did not respond
Oscorp,Kai Mo,,Closed Won,50000,Conference Meeting,Gold Sponsor,2026-03-05,2026-03-25,2026-03-25,
Vandelay,Lu Ng,,Lead,3000,Website Inquiry,Delegate Pass,2026-03-12,2026-03-14,,
Hooli,Gus Ivy,,Lead,5000,Website Inquiry,Delegate Pass,2026-02-10,2026-02-12,,
";

const AD_SPEND: &str = "\
Month,Platform,Campaign Name,Budget (EUR),Spend (EUR),Impressions,Clicks,Conversions
2026-01,Google Ads,Retargeting,5000,4800,120000,2400,12
2026-02,Google Ads,Retargeting,5000,5100,125000,2600,14
2026-01,LinkedIn Ads,C-Suite,8000,7900,40000,300,1
2026-02,LinkedIn Ads,C-Suite,8000,8100,42000,320,2
";

fn write_workbook(dir: &Path) {
    for (file, body) in [
        ("Website_Traffic.csv", WEBSITE_TRAFFIC),
        ("Social_Media.csv", SOCIAL_MEDIA),
        ("Email_Campaigns.csv", EMAIL_CAMPAIGNS),
        ("Sales_Pipeline.csv", SALES_PIPELINE),
        ("Ad_Spend.csv", AD_SPEND),
    ] {
        fs::write(dir.join(file), body).unwrap();
    }
}

#[test]
fn test_full_pipeline_produces_every_section() {
    let dir = tempfile::tempdir().unwrap();
    write_workbook(dir.path());
    let config = PipelineConfig::default();

    let workbook = Workbook::open(dir.path()).unwrap();
    assert_eq!(workbook.len(), 5);

    let cleaner = Cleaner::new(&config.cleaning);
    let cleaned = cleaner.clean(workbook.into_tables()).unwrap();
    assert_eq!(cleaned.tables.len(), 5);
    assert!(cleaned.missing_sheets.is_empty());

    let pipeline_report = cleaned.report(sheets::SALES_PIPELINE).unwrap();
    assert_eq!(pipeline_report.rows_in, 13);
    assert_eq!(pipeline_report.duplicates_removed, 1);
    assert_eq!(pipeline_report.rows_out, 12);

    let artifact = analyze(&cleaned.tables, &config);
    assert!(artifact.degraded.is_empty(), "degraded: {:?}", artifact.degraded);
    assert!(artifact.channels.is_some());
    assert!(artifact.roi.is_some());
    assert!(artifact.forecast.is_some());
    assert!(artifact.clusters.is_some());

    let conversion = artifact.conversion.as_ref().unwrap();
    assert_eq!(conversion.total_closed, 6);
    assert_eq!(conversion.total_won, 4);
    assert_eq!(conversion::best_source(conversion).unwrap().source, "Referral");

    let targets = artifact.targets.as_ref().unwrap();
    assert_eq!(targets.current_delegates, 2);
    assert_eq!(targets.current_sponsors, 2);

    let hidden = artifact.hidden.as_ref().unwrap();
    // Latest first contact or last activity; expected close dates run later.
    assert_eq!(hidden.as_of, chrono::NaiveDate::from_ymd_opt(2026, 3, 25).unwrap());
    assert_eq!(hidden.stuck_deals_count, 3);
    assert!((hidden.stuck_deals_value - 117_000.0).abs() < f64::EPSILON);

    let forecast = artifact.forecast.as_ref().unwrap();
    assert_eq!(forecast.history.len(), 8);
    assert_eq!(forecast.predictions.len(), config.forecast.horizon);
    assert!(forecast.predictions.iter().all(|p| p.value >= 0.0));

    let clusters = artifact.clusters.as_ref().unwrap();
    assert_eq!(clusters.assignments.len(), 12);
    assert!(clusters.assignments.iter().all(|a| a.cluster < config.cluster_count));

    let kpis = artifact.kpis.as_ref().unwrap();
    assert_eq!(kpis.total_leads, Some(12));
    assert_eq!(kpis.won_revenue, Some(116_000.0));
    assert_eq!(kpis.stuck_deals_count, Some(3));
    assert!(artifact.recommendations.len() >= 4);
}

#[test]
fn test_fixed_seed_reproduces_clusters_and_forecast() {
    let dir = tempfile::tempdir().unwrap();
    write_workbook(dir.path());
    let config = PipelineConfig::default();

    let cleaner = Cleaner::new(&config.cleaning);
    let tables = cleaner
        .clean(Workbook::open(dir.path()).unwrap().into_tables())
        .unwrap()
        .tables;

    let first = analyze(&tables, &config);
    let second = analyze(&tables, &config);
    assert_eq!(first.clusters, second.clusters);
    assert_eq!(first.forecast, second.forecast);
    assert_ne!(first.metadata.run_id, second.metadata.run_id);
}

#[test]
fn test_persisted_clean_tables_reload_to_the_same_analysis() {
    let raw_dir = tempfile::tempdir().unwrap();
    let clean_dir = tempfile::tempdir().unwrap();
    write_workbook(raw_dir.path());
    let config = PipelineConfig::default();

    let cleaner = Cleaner::new(&config.cleaning);
    let cleaned = cleaner
        .clean(Workbook::open(raw_dir.path()).unwrap().into_tables())
        .unwrap();
    write_outputs(&cleaned, clean_dir.path()).unwrap();

    let reloaded = load_clean_tables(clean_dir.path(), &cleaner).unwrap();
    assert_eq!(reloaded.tables, cleaned.tables);
    for report in &reloaded.reports {
        assert_eq!(report.duplicates_removed, 0, "{}", report.sheet);
        assert_eq!(report.rows_in, report.rows_out, "{}", report.sheet);
    }

    let direct = analyze(&cleaned.tables, &config);
    let from_disk = analyze(&reloaded.tables, &config);
    assert_eq!(direct.conversion, from_disk.conversion);
    assert_eq!(direct.targets, from_disk.targets);
}

#[test]
fn test_missing_sheets_only_degrade_their_analyses() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Sales_Pipeline.csv"), SALES_PIPELINE).unwrap();
    let config = PipelineConfig::default();

    let cleaner = Cleaner::new(&config.cleaning);
    let cleaned = cleaner
        .clean(Workbook::open(dir.path()).unwrap().into_tables())
        .unwrap();
    assert_eq!(cleaned.missing_sheets.len(), 4);

    let artifact = analyze(&cleaned.tables, &config);
    assert!(artifact.is_degraded(regression::ANALYSIS));
    assert!(!artifact.is_degraded(clustering::ANALYSIS));
    assert!(artifact.conversion.is_some());
    assert_eq!(
        artifact.conversion.as_ref().unwrap().by_source.iter().map(|s| s.total_deals).sum::<u64>(),
        12
    );
    let won = artifact
        .channels
        .as_ref()
        .and_then(|c| c.sales.as_ref())
        .map(|s| s.stage_distribution.iter().any(|l| l.label == sales::CLOSED_WON));
    assert_eq!(won, Some(true));
}
