//! reqwest-backed [`MarketingApi`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::MarketingApi;
use super::schema::{
    self, CREATIVES_ENDPOINT, CreativeRequest, OFFERS_ENDPOINT, OfferQuery, STREETS_ENDPOINT,
};
use crate::config::EndpointConfig;
use crate::error::ApiError;
use crate::wizard::model::{Creative, Offer};

/// HTTP client for the external generation endpoints.
pub struct HttpMarketingApi {
    endpoints: EndpointConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpMarketingApi {
    pub fn new(endpoints: EndpointConfig, timeout: Duration) -> Self {
        Self {
            endpoints,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn base_url<'a>(
        url: &'a Option<String>,
        endpoint: &'static str,
        env_var: &'static str,
    ) -> Result<&'a str, ApiError> {
        url.as_deref()
            .ok_or(ApiError::MissingEndpoint { endpoint, env_var })
    }

    /// Send a request and return the body of a successful response.
    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, ApiError> {
        let resp = request.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    endpoint,
                    timeout: self.timeout,
                }
            } else {
                ApiError::Request {
                    endpoint,
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| ApiError::Request {
            endpoint,
            reason: format!("Failed to read body: {e}"),
        })?;
        debug!(endpoint, bytes = body.len(), "Endpoint responded");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl MarketingApi for HttpMarketingApi {
    async fn nearby_streets(&self, address: &str) -> Result<Vec<String>, ApiError> {
        let base = Self::base_url(
            &self.endpoints.streets_url,
            STREETS_ENDPOINT,
            "LOCA_STREETS_API_URL",
        )?;
        let body = self
            .send(
                STREETS_ENDPOINT,
                self.client.get(base).query(&[("address", address)]),
            )
            .await?;
        schema::decode_streets(&body)
    }

    async fn generate_offers(&self, query: &OfferQuery) -> Result<Vec<Offer>, ApiError> {
        let base = Self::base_url(
            &self.endpoints.offers_url,
            OFFERS_ENDPOINT,
            "LOCA_OFFERS_API_URL",
        )?;
        let body = self
            .send(OFFERS_ENDPOINT, self.client.get(base).query(query))
            .await?;
        let batch = chrono::Utc::now().timestamp_millis();
        schema::decode_offers(&body, &query.business_type, batch)
    }

    async fn generate_creatives(
        &self,
        request: &CreativeRequest,
    ) -> Result<Vec<Creative>, ApiError> {
        let base = Self::base_url(
            &self.endpoints.creatives_url,
            CREATIVES_ENDPOINT,
            "LOCA_CREATIVES_API_URL",
        )?;
        let body = self
            .send(CREATIVES_ENDPOINT, self.client.post(base).json(request))
            .await?;
        schema::decode_creatives(&body)
    }
}
