//! Remote price/dividend data.
//!
//! Defines the `QuoteProvider` trait and the FinancialModelingPrep
//! implementation. Provider failures are absorbed at this seam: callers
//! always get "no data" rather than an error, so a flaky provider can
//! never abort a run.

pub mod fmp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::DividendRecord;

/// Company profile as exposed by the provider. Only the share price is
/// load-bearing; the rest is carried for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "companyName")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl CompanyProfile {
    /// Share price, 0.0 when the provider has none.
    pub fn price_or_zero(&self) -> f64 {
        self.price.filter(|p| p.is_finite()).unwrap_or(0.0)
    }
}

/// Abstraction over the remote price/dividend source.
///
/// Both operations are total: network or parse failures degrade to
/// `None`/empty, never a fatal error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the company profile; `None` when unavailable.
    async fn profile(&self, ticker: &str) -> Option<CompanyProfile>;

    /// Fetch dividend payment history, most recent first; empty when
    /// unavailable.
    async fn dividend_history(&self, ticker: &str) -> Vec<DividendRecord>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_provider_shape() {
        let json = r#"{"symbol":"AAPL","companyName":"Apple Inc.","price":192.42,"beta":1.28}"#;
        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.symbol.as_deref(), Some("AAPL"));
        assert_eq!(profile.company_name.as_deref(), Some("Apple Inc."));
        assert!((profile.price_or_zero() - 192.42).abs() < 1e-10);
    }

    #[test]
    fn test_profile_missing_price_is_zero() {
        let profile: CompanyProfile = serde_json::from_str(r#"{"symbol":"X"}"#).unwrap();
        assert_eq!(profile.price_or_zero(), 0.0);
    }
}
