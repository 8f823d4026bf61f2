//! Sheet and column names of the marketing workbook, shared by the
//! cleaning schemas and the analyses that read them.

pub const WEBSITE_TRAFFIC: &str = "Website Traffic";
pub const SOCIAL_MEDIA: &str = "Social Media";
pub const EMAIL_CAMPAIGNS: &str = "Email Campaigns";
pub const SALES_PIPELINE: &str = "Sales Pipeline";
pub const AD_SPEND: &str = "Ad Spend";

pub mod website {
    pub const WEEK: &str = "Week Starting";
    pub const SOURCE: &str = "Traffic Source";
    pub const SESSIONS: &str = "Sessions";
    pub const CONVERSIONS: &str = "Ticket Inquiry Conversions";
}

pub mod social {
    pub const PLATFORM: &str = "Platform";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const ENGAGEMENTS: &str = "Engagements";
    pub const CLICKS: &str = "Link Clicks";
}

pub mod email {
    pub const CAMPAIGN: &str = "Campaign Name";
    pub const OPEN_RATE: &str = "Open Rate";
    pub const CTR: &str = "CTR";
    pub const CONVERSIONS: &str = "Conversions (Ticket Inquiries)";
    pub const REVENUE: &str = "Revenue Attributed";
}

pub mod sales {
    pub const COMPANY: &str = "Company Name";
    pub const STAGE: &str = "Deal Stage";
    pub const VALUE: &str = "Deal Value (EUR)";
    pub const SOURCE: &str = "Lead Source";
    pub const TICKET_TYPE: &str = "Ticket Type";
    pub const FIRST_CONTACT: &str = "First Contact Date";
    pub const LAST_ACTIVITY: &str = "Last Activity Date";
    pub const EXPECTED_CLOSE: &str = "Expected Close Date";
    pub const NOTES: &str = "Notes";

    pub const CLOSED_WON: &str = "Closed Won";
    pub const CLOSED_LOST: &str = "Closed Lost";
}

pub mod ads {
    pub const MONTH: &str = "Month";
    pub const PLATFORM: &str = "Platform";
    pub const CAMPAIGN: &str = "Campaign Name";
    pub const SPEND: &str = "Spend (EUR)";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const CLICKS: &str = "Clicks";
    pub const CONVERSIONS: &str = "Conversions";
}
