use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node-level counters from `/api/stats`.
///
/// Every field defaults to zero when missing so a sparse payload can never
/// take down a render pass. A field of the wrong JSON type is a parse error
/// and fails the whole batch instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStats {
    pub height: u64,
    pub supply: f64,
    pub mempool_size: u64,
    pub peer_count: u64,
    pub port: u16,
}

/// One confirmed block as reported by `/api/chain`.
///
/// The chain array arrives ascending by `index`; consumers wanting
/// newest-first must reverse a copy, never the fetched array itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub hash: String,
    pub previous_hash: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
}

/// A pending or confirmed transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub value: f64,
    pub fee: f64,
}

/// All-time and per-day revenue totals from `/api/revenue`.
///
/// `BTreeMap` keeps the ISO date keys in ascending lexicographic order,
/// which is also chronological order for this key format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueReport {
    pub total_fees_all_time: f64,
    pub total_rewards_all_time: f64,
    pub daily_fees: BTreeMap<String, f64>,
    pub daily_rewards: BTreeMap<String, f64>,
}

/// Business KPIs from `/api/business`. `network_load` is a 0..1 fraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub active_wallets: u64,
    pub average_fee_per_tx: f64,
    pub network_load: f64,
}

/// Validator economics from `/api/costs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostReport {
    pub cost_per_block: f64,
}

/// The six payloads fetched in one poll cycle.
///
/// A batch either contains all six responses or it does not exist: any
/// individual fetch failure abandons the cycle before a `RawBatch` is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub stats: NodeStats,
    pub chain: Vec<Block>,
    pub mempool: Vec<Transaction>,
    pub revenue: RevenueReport,
    pub business: BusinessMetrics,
    pub costs: CostReport,
}
