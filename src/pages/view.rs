//! View models for the dashboard pages, derived from the stored record.
//!
//! A missing record renders the same as an empty one.

use crate::wizard::model::WizardResult;

pub const NO_CAMPAIGNS: &str = "You haven't created any campaigns yet.";
pub const NO_CREATIVES: &str = "You haven't generated any creatives yet.";
pub const NO_CAMPAIGN_DATA: &str = "Campaign data will appear here once available.";
pub const NO_DASHBOARD_CREATIVES: &str = "Your generated ad creatives will appear here.";
pub const NOT_AVAILABLE: &str = "N/A";
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

const FALLBACK_BUSINESS: &str = "your business";

fn business_label(record: Option<&WizardResult>) -> String {
    record
        .and_then(WizardResult::business_name)
        .unwrap_or(FALLBACK_BUSINESS)
        .to_string()
}

/// One row of the campaigns table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRow {
    pub title: String,
    pub offer_type: String,
    pub description: String,
}

/// `/campaigns`: one row per selected offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignsPage {
    pub business: String,
    pub rows: Vec<CampaignRow>,
}

impl CampaignsPage {
    pub const COLUMNS: [&'static str; 3] =
        ["Campaign Name / Offer Title", "Offer Type", "Description"];

    pub fn from_record(record: Option<&WizardResult>) -> Self {
        let rows = record
            .map(|r| {
                r.selected_offers
                    .iter()
                    .map(|offer| CampaignRow {
                        title: offer.title.clone(),
                        offer_type: offer.offer_type.clone(),
                        description: offer.description.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            business: business_label(record),
            rows,
        }
    }

    pub fn description(&self) -> String {
        format!("A list of all campaigns created for {}.", self.business)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeCard {
    pub headline: String,
    pub target_street: String,
    pub offer: String,
    pub description: String,
}

/// `/creatives`: one card per generated creative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativesPage {
    pub business: String,
    pub cards: Vec<CreativeCard>,
}

impl CreativesPage {
    pub fn from_record(record: Option<&WizardResult>) -> Self {
        let cards = record
            .map(|r| {
                r.generated_creatives
                    .iter()
                    .map(|c| CreativeCard {
                        headline: c.headline.clone(),
                        target_street: c.target_street.clone(),
                        offer: c.offer.clone(),
                        description: c.description.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            business: business_label(record),
            cards,
        }
    }

    pub fn description(&self) -> String {
        format!("A list of all creatives generated for {}.", self.business)
    }
}

/// A creative in the dashboard gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub image_url: String,
    pub street: String,
    pub headline: String,
    pub body: String,
}

/// `/dashboard`. Metrics are not collected yet and always read "N/A".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformancePage {
    pub business_name: Option<String>,
    pub stats: [(&'static str, &'static str); 4],
    /// Campaign names for the breakdown table.
    pub campaigns: Vec<String>,
    pub gallery: Vec<GalleryItem>,
}

impl PerformancePage {
    pub const BREAKDOWN_COLUMNS: [&'static str; 7] = [
        "Campaign Name",
        "Spend",
        "Impressions",
        "Clicks",
        "Conversions",
        "CTR",
        "CVR",
    ];

    pub fn from_record(record: Option<&WizardResult>) -> Self {
        let (campaigns, gallery) = match record {
            Some(r) => (
                r.selected_offers.iter().map(|o| o.title.clone()).collect(),
                r.generated_creatives
                    .iter()
                    .map(|c| GalleryItem {
                        image_url: c
                            .image_url
                            .clone()
                            .filter(|u| !u.is_empty())
                            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
                        street: c.target_street.clone(),
                        headline: c.headline.clone(),
                        body: c.description.clone(),
                    })
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            business_name: record.and_then(WizardResult::business_name).map(str::to_string),
            stats: [
                ("Total Spend", NOT_AVAILABLE),
                ("Impressions", NOT_AVAILABLE),
                ("Clicks", NOT_AVAILABLE),
                ("Conversions", NOT_AVAILABLE),
            ],
            campaigns,
            gallery,
        }
    }

    pub fn title(&self) -> String {
        match &self.business_name {
            Some(name) => format!("Performance Dashboard - {name}"),
            None => "Performance Dashboard".to_string(),
        }
    }
}
