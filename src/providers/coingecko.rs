//! CoinGecko market data client

use crate::{
    constants::{
        COINGECKO_API_URL, COINGECKO_COINS_LIST_ENDPOINT, COINGECKO_SIMPLE_PRICE_ENDPOINT,
        REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::ProviderError,
    provider::MarketDataClient,
    types::{AssetId, CatalogEntry, Quote},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    #[serde(flatten)]
    prices: HashMap<String, CoinGeckoPriceData>,
}

/// Unknown or delisted ids can come back as `{}`, so every field is optional
#[derive(Debug, Deserialize)]
struct CoinGeckoPriceData {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// CoinGecko market data client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Creates a client against the public CoinGecko API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(
            COINGECKO_API_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Creates a client against `base_url` with the given request timeout
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the simple price request, with query parameters encoded by reqwest
    fn quote_request(&self, ids: &[AssetId]) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, COINGECKO_SIMPLE_PRICE_ENDPOINT);
        let ids = ids
            .iter()
            .map(AssetId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        self.client.get(url).query(&[
            ("ids", ids.as_str()),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
        ])
    }

    /// Parses the CoinGecko response into quotes for the requested ids
    fn parse_response(response: CoinGeckoResponse, ids: &[AssetId]) -> HashMap<AssetId, Quote> {
        let mut result = HashMap::new();

        for id in ids {
            if let Some(data) = response.prices.get(id.as_str()) {
                result.insert(
                    id.clone(),
                    Quote::new(id.clone(), data.usd, data.usd_24h_change),
                );
            }
        }

        result
    }

    /// Sends `request` and returns the body of a successful response
    async fn send_text(request: RequestBuilder) -> Result<String, ProviderError> {
        let response = request.send().await.map_err(map_send_error)?;
        let response = check_status(response).await?;
        response.text().await.map_err(ProviderError::NetworkError)
    }
}

fn map_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::NetworkError(err)
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    // Check for rate limiting
    if response.status().as_u16() == 429 {
        return Err(ProviderError::RateLimitExceeded);
    }

    if !response.status().is_success() {
        return Err(ProviderError::ApiError(format!(
            "HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    Ok(response)
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    async fn fetch_quotes(
        &self,
        ids: &[AssetId],
    ) -> Result<HashMap<AssetId, Quote>, ProviderError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        tracing::debug!(count = ids.len(), "Fetching quotes from CoinGecko");

        let response_text = Self::send_text(self.quote_request(ids)).await?;

        let coingecko_response: CoinGeckoResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                ProviderError::InvalidResponse(format!(
                    "Failed to parse CoinGecko response: {}. Response: {}",
                    e, response_text
                ))
            })?;

        let quotes = Self::parse_response(coingecko_response, ids);

        tracing::debug!(
            requested = ids.len(),
            returned = quotes.len(),
            "Fetched quotes from CoinGecko"
        );

        Ok(quotes)
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError> {
        let url = format!("{}{}", self.base_url, COINGECKO_COINS_LIST_ENDPOINT);
        tracing::debug!(url = %url, "Fetching coin catalog from CoinGecko");

        let response_text = Self::send_text(self.client.get(&url)).await?;

        let entries: Vec<CatalogEntry> = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse CoinGecko coin list: {}", e))
        })?;

        tracing::debug!(count = entries.len(), "Fetched coin catalog from CoinGecko");

        Ok(entries)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
