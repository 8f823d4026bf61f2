//! Built-in schemas for the five sheets of the marketing workbook.

use crate::schema::{ColumnSpec, DerivedColumn, Formula, Imputation, Normalizer, SheetSchema};
use insights_core::sheets::{AD_SPEND, EMAIL_CAMPAIGNS, SALES_PIPELINE, SOCIAL_MEDIA, WEBSITE_TRAFFIC};
use insights_core::{Cell, ColumnType};

/// Schemas for every sheet the pipeline understands, in processing order.
pub fn builtin_schemas() -> Vec<SheetSchema> {
    vec![
        website_traffic(),
        social_media(),
        email_campaigns(),
        sales_pipeline(),
        ad_spend(),
    ]
}

fn zero() -> Imputation {
    Imputation::Constant(Cell::Int(0))
}

fn zero_amount() -> Imputation {
    Imputation::Constant(Cell::Float(0.0))
}

pub fn website_traffic() -> SheetSchema {
    SheetSchema::new(WEBSITE_TRAFFIC)
        .column(ColumnSpec::required("Week Starting", ColumnType::Date))
        .column(
            ColumnSpec::required("Traffic Source", ColumnType::Text)
                .normalize(Normalizer::LowerSnake),
        )
        .column(ColumnSpec::required("Sessions", ColumnType::Integer))
        .column(ColumnSpec::optional("Users", ColumnType::Integer).impute(Imputation::Mean))
        .column(ColumnSpec::optional("New Users", ColumnType::Integer).impute(Imputation::Mean))
        .column(ColumnSpec::optional("Bounce Rate", ColumnType::Rate).impute(Imputation::Mean))
        .column(ColumnSpec::optional("Ticket Inquiry Conversions", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Conversion Rate", ColumnType::Rate))
        .derive(DerivedColumn::fill_missing(
            "Conversion Rate",
            ColumnType::Rate,
            Formula::Ratio {
                numerator: "Ticket Inquiry Conversions".into(),
                denominator: "Sessions".into(),
                scale: 1.0,
            },
        ))
}

pub fn social_media() -> SheetSchema {
    SheetSchema::new(SOCIAL_MEDIA)
        .column(ColumnSpec::required("Week Starting", ColumnType::Date))
        .column(
            ColumnSpec::required("Platform", ColumnType::Text).normalize(Normalizer::Mapping(vec![
                ("X/Twitter".into(), "Twitter".into()),
                ("X".into(), "Twitter".into()),
                ("twitter".into(), "Twitter".into()),
            ])),
        )
        .column(ColumnSpec::optional("Followers (Total)", ColumnType::Integer))
        .column(ColumnSpec::optional("New Followers", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Impressions", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Engagements", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Engagement Rate", ColumnType::Rate).impute(Imputation::Mean))
        .column(ColumnSpec::optional("Link Clicks", ColumnType::Integer).impute(zero()))
        .column(
            ColumnSpec::optional("Top Post Type", ColumnType::Text)
                .normalize(Normalizer::LowerSnake)
                .impute(Imputation::Mode),
        )
        .column(ColumnSpec::optional("Top Post Impressions", ColumnType::Integer))
}

pub fn email_campaigns() -> SheetSchema {
    SheetSchema::new(EMAIL_CAMPAIGNS)
        .column(
            ColumnSpec::required("Campaign Name", ColumnType::Text).normalize(Normalizer::TitleCase),
        )
        .column(ColumnSpec::required("Send Date", ColumnType::Date))
        .column(ColumnSpec::optional("List Size", ColumnType::Integer))
        .column(ColumnSpec::optional("Emails Delivered", ColumnType::Integer))
        .column(ColumnSpec::optional("Opens", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Open Rate", ColumnType::Rate).impute(Imputation::Mean))
        .column(ColumnSpec::optional("Clicks", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("CTR", ColumnType::Rate).impute(Imputation::Mean))
        .column(ColumnSpec::optional("Unsubscribes", ColumnType::Integer).impute(zero()))
        .column(
            ColumnSpec::optional("Conversions (Ticket Inquiries)", ColumnType::Integer)
                .impute(zero()),
        )
        .column(ColumnSpec::optional("Revenue Attributed", ColumnType::Currency).impute(zero_amount()))
}

pub fn sales_pipeline() -> SheetSchema {
    SheetSchema::new(SALES_PIPELINE)
        .column(ColumnSpec::required("Company Name", ColumnType::Text).normalize(Normalizer::Trim))
        .column(ColumnSpec::optional("Contact Name", ColumnType::Text).normalize(Normalizer::Trim))
        .column(
            ColumnSpec::optional("Contact Email", ColumnType::Text).normalize(Normalizer::Lowercase),
        )
        .column(
            ColumnSpec::required("Deal Stage", ColumnType::Text).normalize(Normalizer::TitleCase),
        )
        .column(ColumnSpec::optional("Deal Value (EUR)", ColumnType::Currency).impute(zero_amount()))
        .column(
            ColumnSpec::optional("Lead Source", ColumnType::Text)
                .normalize(Normalizer::TitleCase)
                .impute(Imputation::Constant(Cell::Text("Unknown".into()))),
        )
        .column(
            ColumnSpec::optional("Ticket Type", ColumnType::Text).normalize(Normalizer::TitleCase),
        )
        .column(ColumnSpec::required("First Contact Date", ColumnType::Date))
        .column(ColumnSpec::optional("Last Activity Date", ColumnType::Date))
        .column(ColumnSpec::optional("Expected Close Date", ColumnType::Date))
        .column(ColumnSpec::optional("Notes", ColumnType::Text))
        .derive(DerivedColumn::fill_missing(
            "Contact Email",
            ColumnType::Text,
            Formula::EmailFromContact {
                name: "Contact Name".into(),
                company: "Company Name".into(),
            },
        ))
        .derive(DerivedColumn::create(
            "Days In Pipeline",
            ColumnType::Integer,
            Formula::DaysBetween {
                start: "First Contact Date".into(),
                end: "Last Activity Date".into(),
            },
        ))
}

pub fn ad_spend() -> SheetSchema {
    SheetSchema::new(AD_SPEND)
        .column(ColumnSpec::required("Month", ColumnType::Month))
        .column(ColumnSpec::required("Platform", ColumnType::Text).normalize(Normalizer::Trim))
        .column(
            ColumnSpec::required("Campaign Name", ColumnType::Text).normalize(Normalizer::Trim),
        )
        .column(ColumnSpec::optional("Budget (EUR)", ColumnType::Currency))
        .column(ColumnSpec::required("Spend (EUR)", ColumnType::Currency))
        .column(ColumnSpec::optional("Impressions", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Clicks", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("Conversions", ColumnType::Integer).impute(zero()))
        .column(ColumnSpec::optional("CPM (EUR)", ColumnType::Currency))
        .column(ColumnSpec::optional("CPC (EUR)", ColumnType::Currency))
        .column(ColumnSpec::optional("Cost per Conversion (EUR)", ColumnType::Currency))
        .derive(DerivedColumn::fill_missing(
            "Cost per Conversion (EUR)",
            ColumnType::Currency,
            Formula::Ratio {
                numerator: "Spend (EUR)".into(),
                denominator: "Conversions".into(),
                scale: 1.0,
            },
        ))
}
