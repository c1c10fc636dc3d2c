//! HTTP client for the node's dashboard API.
//!
//! One poll cycle issues all six endpoint fetches concurrently and joins
//! them into a single [`RawBatch`]. The batch is atomic: the first fetch to
//! fail aborts the join, the remaining futures are dropped, and the caller
//! keeps whatever snapshot it already had.

use crate::types::{Block, BusinessMetrics, CostReport, NodeStats, RawBatch, RevenueReport, Transaction};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const STATS_ENDPOINT: &str = "/api/stats";
const CHAIN_ENDPOINT: &str = "/api/chain";
const MEMPOOL_ENDPOINT: &str = "/api/mempool";
const REVENUE_ENDPOINT: &str = "/api/revenue";
const BUSINESS_ENDPOINT: &str = "/api/business";
const COSTS_ENDPOINT: &str = "/api/costs";

/// Why a batch fetch failed. Both variants abandon the current cycle only;
/// the fixed poll interval is the retry mechanism.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a usable response: DNS, connection,
    /// timeout, or a non-success HTTP status.
    #[error("{endpoint}: request failed: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not valid JSON of the expected shape.
    #[error("{endpoint}: invalid response body: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of raw batches. The poller is written against this seam so tests
/// can drive it with a stub instead of a live node.
pub trait BatchSource: Send + Sync {
    fn fetch_batch(&self) -> impl Future<Output = Result<RawBatch, FetchError>> + Send;
}

/// Reqwest-backed client for a node's dashboard API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url` (e.g. `http://localhost:8000`).
    ///
    /// The timeout applies per request; an expired request surfaces as
    /// [`FetchError::Network`] and abandons the cycle like any other failure.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Network { endpoint, source })?;
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Parse { endpoint, source })
    }
}

impl BatchSource for ApiClient {
    fn fetch_batch(&self) -> impl Future<Output = Result<RawBatch, FetchError>> + Send {
        async move {
            let (stats, chain, mempool, revenue, business, costs) = tokio::try_join!(
                self.get_json::<NodeStats>(STATS_ENDPOINT),
                self.get_json::<Vec<Block>>(CHAIN_ENDPOINT),
                self.get_json::<Vec<Transaction>>(MEMPOOL_ENDPOINT),
                self.get_json::<RevenueReport>(REVENUE_ENDPOINT),
                self.get_json::<BusinessMetrics>(BUSINESS_ENDPOINT),
                self.get_json::<CostReport>(COSTS_ENDPOINT),
            )?;

            debug!(
                height = stats.height,
                mempool = mempool.len(),
                "batch fetched"
            );

            Ok(RawBatch {
                stats,
                chain,
                mempool,
                revenue,
                business,
                costs,
            })
        }
    }
}
