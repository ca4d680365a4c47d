//! Wire schemas for the external endpoints and the decode step that turns
//! raw bodies into wizard models.
//!
//! Decoding is strict: a body that is not JSON or lacks a required field is a
//! [`ApiError::MalformedResponse`], never silently coerced.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::wizard::model::{BusinessInfo, Creative, Offer};

pub const STREETS_ENDPOINT: &str = "street-discovery";
pub const OFFERS_ENDPOINT: &str = "offer-generation";
pub const CREATIVES_ENDPOINT: &str = "creative-generation";

/// Minimum guarantee window sent with every offer request.
pub const MIN_GUARANTEE_DAYS: u32 = 14;

/// `GET {streets}?address=...` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreetsResponse {
    #[serde(default)]
    nearby_streets: Vec<String>,
}

/// One offer as returned by the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    pub promotion_type: String,
    pub offer: String,
    pub validity: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Both `{ "response": [...] }` and a bare array are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { response: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Envelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Wrapped { response } => response,
            Self::Bare(items) => items,
        }
    }
}

/// One creative as returned by the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub headline: String,
    #[serde(alias = "body")]
    pub description: String,
    #[serde(alias = "street")]
    pub target_street: String,
    #[serde(default)]
    pub offer: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Query parameters for the offer-generation endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferQuery {
    pub business_name: String,
    pub business_description: String,
    pub business_type: String,
    /// Empty when the business did not set a cap.
    pub max_discount_percentage: String,
    pub min_guarantee_days: u32,
}

impl OfferQuery {
    pub fn for_business(business: &BusinessInfo) -> Self {
        Self {
            business_name: business.business_name.clone(),
            business_description: business.description.clone(),
            business_type: business.business_type.to_string(),
            max_discount_percentage: business
                .max_discount_percentage
                .map(|p| p.to_string())
                .unwrap_or_default(),
            min_guarantee_days: MIN_GUARANTEE_DAYS,
        }
    }
}

/// JSON body for the creative-generation endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRequest {
    pub business_data: BusinessInfo,
    pub selected_streets: Vec<String>,
    pub selected_offers: Vec<Offer>,
}

fn malformed(endpoint: &'static str, err: impl std::fmt::Display) -> ApiError {
    ApiError::MalformedResponse {
        endpoint,
        reason: err.to_string(),
    }
}

/// Decode a street-discovery body into street names.
pub fn decode_streets(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let parsed: StreetsResponse =
        serde_json::from_slice(body).map_err(|e| malformed(STREETS_ENDPOINT, e))?;
    Ok(parsed.nearby_streets)
}

/// Decode an offer-generation body.
///
/// Every offer in the batch gets the id `"{batch}-{index}"`.
pub fn decode_offers(
    body: &[u8],
    business_type: &str,
    batch: i64,
) -> Result<Vec<Offer>, ApiError> {
    let envelope: Envelope<OfferRecord> =
        serde_json::from_slice(body).map_err(|e| malformed(OFFERS_ENDPOINT, e))?;

    let offers = envelope
        .into_items()
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let mut description = format!(
                "{} - Valid until {}",
                record.promotion_type, record.validity
            );
            if let Some(code) = record.code.as_deref().filter(|c| !c.is_empty()) {
                description.push_str(&format!(" - Code: {code}"));
            }
            Offer {
                id: format!("{batch}-{index}"),
                title: record.offer,
                description,
                reasoning: format!(
                    "AI-generated offer based on your {business_type} business with {} promotion.",
                    record.promotion_type
                ),
                promotion_type: record.promotion_type,
                offer_type: "discount".to_string(),
                validity: Some(record.validity),
                code: record.code,
            }
        })
        .collect();
    Ok(offers)
}

/// Decode a creative-generation body.
///
/// Ids are unique within the batch: records without an id, or repeating one
/// already used, get `"gen-{index}"` (suffixed if that is taken too).
pub fn decode_creatives(body: &[u8]) -> Result<Vec<Creative>, ApiError> {
    let envelope: Envelope<CreativeRecord> =
        serde_json::from_slice(body).map_err(|e| malformed(CREATIVES_ENDPOINT, e))?;
    let records = envelope.into_items();

    let reserved: HashSet<String> = records
        .iter()
        .filter_map(|r| r.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    let mut used = HashSet::with_capacity(records.len());

    let creatives = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let id = match record.id.filter(|id| !id.is_empty() && !used.contains(id)) {
                Some(id) => id,
                None => generated_id(index, &reserved, &used),
            };
            used.insert(id.clone());
            Creative {
                id,
                headline: record.headline,
                description: record.description,
                target_street: record.target_street,
                offer: record.offer.unwrap_or_default(),
                call_to_action: record
                    .call_to_action
                    .unwrap_or_else(|| "Order Now".to_string()),
                framework: record.framework,
                image_url: record.image_url,
            }
        })
        .collect();
    Ok(creatives)
}

fn generated_id(index: usize, reserved: &HashSet<String>, used: &HashSet<String>) -> String {
    let base = format!("gen-{index}");
    let mut candidate = base.clone();
    let mut n = 1;
    while reserved.contains(&candidate) || used.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    candidate
}
