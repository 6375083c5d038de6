//! FinancialModelingPrep client.
//!
//! API: `https://financialmodelingprep.com/api/v3`
//! Auth: `apikey` query parameter.
//! Endpoints used: `/profile/{ticker}` and
//! `/historical-price-full/stock_dividend/{ticker}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CompanyProfile, QuoteProvider};
use crate::types::DividendRecord;

pub struct FmpClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl FmpClient {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("callsight/0.1.0")
            .build()
            .context("Failed to build FMP HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.expose_secret())])
            .send()
            .await
            .with_context(|| format!("Request failed: {path}"))?
            .error_for_status()
            .with_context(|| format!("Bad status: {path}"))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response shape: {path}"))
    }
}

#[derive(Debug, Deserialize)]
struct DividendHistoryResponse {
    #[serde(default)]
    historical: Vec<RawDividend>,
}

#[derive(Debug, Deserialize)]
struct RawDividend {
    date: NaiveDate,
    #[serde(default)]
    dividend: f64,
}

#[async_trait]
impl QuoteProvider for FmpClient {
    async fn profile(&self, ticker: &str) -> Option<CompanyProfile> {
        // The profile endpoint answers with a one-element array.
        match self
            .get_json::<Vec<CompanyProfile>>(&format!("/profile/{ticker}"))
            .await
        {
            Ok(profiles) => {
                let profile = profiles.into_iter().next();
                debug!(ticker, found = profile.is_some(), "Profile fetched");
                profile
            }
            Err(e) => {
                warn!(ticker, error = %e, "Profile unavailable, treating as no data");
                None
            }
        }
    }

    async fn dividend_history(&self, ticker: &str) -> Vec<DividendRecord> {
        match self
            .get_json::<DividendHistoryResponse>(&format!(
                "/historical-price-full/stock_dividend/{ticker}"
            ))
            .await
        {
            Ok(response) => {
                debug!(ticker, payments = response.historical.len(), "Dividends fetched");
                response
                    .historical
                    .into_iter()
                    .map(|raw| DividendRecord {
                        date: raw.date,
                        dividend: raw.dividend,
                    })
                    .collect()
            }
            Err(e) => {
                warn!(ticker, error = %e, "Dividend history unavailable, treating as empty");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "fmp"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
