//! Clients for the external street-discovery, offer-generation, and
//! creative-generation endpoints.
//!
//! The wizard only depends on the [`MarketingApi`] trait; [`HttpMarketingApi`]
//! is the reqwest-backed implementation configured from the environment.

pub mod http;
pub mod schema;

pub use http::HttpMarketingApi;
pub use schema::{CreativeRequest, OfferQuery};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::wizard::model::{Creative, Offer};

/// The three external data sources the wizard steps fetch from.
#[async_trait]
pub trait MarketingApi: Send + Sync {
    /// Streets near a business address.
    async fn nearby_streets(&self, address: &str) -> Result<Vec<String>, ApiError>;

    /// Candidate promotional offers for a business.
    async fn generate_offers(&self, query: &OfferQuery) -> Result<Vec<Offer>, ApiError>;

    /// Ad creatives for the chosen streets and offers.
    async fn generate_creatives(&self, request: &CreativeRequest)
    -> Result<Vec<Creative>, ApiError>;
}
