//! Wizard data models: business profile, offers, creatives, and the
//! aggregate result persisted on completion.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Canadian provinces and territories accepted by the business form.
pub const PROVINCES: &[&str] = &[
    "Alberta",
    "British Columbia",
    "Manitoba",
    "New Brunswick",
    "Newfoundland and Labrador",
    "Northwest Territories",
    "Nova Scotia",
    "Nunavut",
    "Ontario",
    "Prince Edward Island",
    "Quebec",
    "Saskatchewan",
    "Yukon",
];

/// Cities suggested by the business form. Free text is also accepted.
pub const SUGGESTED_CITIES: &[&str] = &[
    "Ajax",
    "Aurora",
    "Barrie",
    "Brampton",
    "Burlington",
    "East York",
    "Etobicoke",
    "Guelph",
    "Hamilton",
    "Kingston",
    "Kitchener",
    "London",
    "Markham",
    "Mississauga",
    "Newmarket",
    "North York",
    "Oakville",
    "Oshawa",
    "Ottawa",
    "Pickering",
    "Richmond Hill",
    "Scarborough",
    "Toronto",
    "Vaughan",
    "Waterloo",
    "Whitby",
    "Windsor",
    "York",
];

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d$").expect("postal code pattern compiles")
});

/// Kind of business being advertised.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Restaurant,
    Retail,
    Service,
    Healthcare,
    Fitness,
    Beauty,
    Automotive,
    #[default]
    #[serde(other)]
    Other,
}

impl BusinessType {
    pub const ALL: [BusinessType; 8] = [
        Self::Restaurant,
        Self::Retail,
        Self::Service,
        Self::Healthcare,
        Self::Fitness,
        Self::Beauty,
        Self::Automotive,
        Self::Other,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Restaurant => "Restaurant",
            Self::Retail => "Retail Store",
            Self::Service => "Service Business",
            Self::Healthcare => "Healthcare",
            Self::Fitness => "Fitness & Wellness",
            Self::Beauty => "Beauty & Salon",
            Self::Automotive => "Automotive",
            Self::Other => "Other",
        }
    }

    fn parse(s: &str) -> Option<BusinessType> {
        Self::ALL.into_iter().find(|t| t.to_string() == s)
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Restaurant => "restaurant",
            Self::Retail => "retail",
            Self::Service => "service",
            Self::Healthcare => "healthcare",
            Self::Fitness => "fitness",
            Self::Beauty => "beauty",
            Self::Automotive => "automotive",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Raw business form as submitted from the first wizard step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessForm {
    pub business_name: String,
    pub business_type: String,
    pub description: String,
    pub street_name: String,
    pub street_number: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub website: String,
    pub phone: String,
    pub max_discount_percentage: Option<u32>,
}

impl BusinessForm {
    /// Validate the form and build the business profile.
    ///
    /// Collects every offending field rather than stopping at the first.
    pub fn validate(self) -> Result<BusinessInfo, ValidationError> {
        let mut fields = Vec::new();

        let required = [
            ("businessName", &self.business_name),
            ("businessType", &self.business_type),
            ("streetName", &self.street_name),
            ("streetNumber", &self.street_number),
            ("city", &self.city),
            ("province", &self.province),
            ("postalCode", &self.postal_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                fields.push(name.to_string());
            }
        }

        let business_type = BusinessType::parse(self.business_type.trim());
        if business_type.is_none() && !self.business_type.trim().is_empty() {
            fields.push("businessType".to_string());
        }

        let province = self.province.trim();
        if !province.is_empty() && !PROVINCES.contains(&province) {
            fields.push("province".to_string());
        }

        let postal_code = self.postal_code.trim().to_uppercase();
        if !postal_code.is_empty() && !POSTAL_CODE.is_match(&postal_code) {
            fields.push("postalCode".to_string());
        }

        if !fields.is_empty() {
            return Err(ValidationError { fields });
        }

        let mut info = BusinessInfo {
            business_name: self.business_name.trim().to_string(),
            business_type: business_type.unwrap_or_default(),
            description: self.description.trim().to_string(),
            street_name: self.street_name.trim().to_string(),
            street_number: self.street_number.trim().to_string(),
            city: self.city.trim().to_string(),
            province: province.to_string(),
            postal_code,
            website: self.website.trim().to_string(),
            phone: self.phone.trim().to_string(),
            max_discount_percentage: self.max_discount_percentage,
            full_address: String::new(),
        };
        info.full_address = info.compose_address();
        Ok(info)
    }
}

/// Validated business profile, the output of the first wizard step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub business_name: String,
    pub business_type: BusinessType,
    pub description: String,
    pub street_name: String,
    pub street_number: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub website: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_percentage: Option<u32>,
    pub full_address: String,
}

impl BusinessInfo {
    /// `"{number} {street}, {city}, {province} {postal}"`.
    pub fn compose_address(&self) -> String {
        format!(
            "{} {}, {}, {} {}",
            self.street_number, self.street_name, self.city, self.province, self.postal_code
        )
    }
}

fn default_offer_type() -> String {
    "discount".to_string()
}

/// A promotional deal candidate surfaced for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Unique within one generation batch.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub promotion_type: String,
    #[serde(rename = "type", default = "default_offer_type")]
    pub offer_type: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn default_call_to_action() -> String {
    "Order Now".to_string()
}

/// Generated ad copy tied to a street and an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    #[serde(default)]
    pub id: String,
    pub headline: String,
    #[serde(default, alias = "body")]
    pub description: String,
    #[serde(default, alias = "street")]
    pub target_street: String,
    /// Title of the offer this creative promotes.
    #[serde(default)]
    pub offer: String,
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Terminal aggregate of a completed wizard.
///
/// Persisted verbatim under [`settings_keys::WIZARD_DATA`] and read by every
/// dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardResult {
    pub business_data: BusinessInfo,
    pub selected_streets: Vec<String>,
    pub selected_offers: Vec<Offer>,
    pub generated_creatives: Vec<Creative>,
}

impl WizardResult {
    /// Business name, or `None` if the record has none.
    pub fn business_name(&self) -> Option<&str> {
        let name = self.business_data.business_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Settings keys used for wizard persistence.
pub mod settings_keys {
    /// Key for the WizardResult JSON blob in the settings table.
    pub const WIZARD_DATA: &str = "wizardData";
    /// Default user ID (single-user system).
    pub const DEFAULT_USER: &str = "default";
}
