//! Derived view model and the per-cycle merge.
//!
//! [`merge`] is a pure function of (previous snapshot, new batch, load
//! label): no clock reads, no shared state. The only value carried from one
//! cycle to the next is the load-series ring buffer; everything else is
//! rebuilt from the batch.

use crate::types::{Block, NodeStats, RawBatch, RevenueReport, Transaction};
use serde::Serialize;
use std::collections::BTreeSet;

/// How many blocks the recent-blocks panel shows, newest first.
pub const RECENT_BLOCK_COUNT: usize = 5;

/// Capacity of the network-load ring buffer; the oldest point is evicted
/// once the buffer is full.
pub const LOAD_WINDOW_POINTS: usize = 20;

/// Share of all-time rewards assumed held by the treasury. A display-side
/// simplification, not an on-chain value.
pub const TREASURY_SHARE: f64 = 0.10;

/// Multiplier applied to the average fee for the validator panel's projected
/// fee volume. A placeholder until a measured rolling volume exists.
pub const FEE_VOLUME_MULTIPLIER: f64 = 10.0;

/// One chart point: a label (time or date key) and a numeric value.
/// Formatting into display strings happens in the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Derived scalar KPIs for the stat cards and validator panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// All-time fees plus all-time rewards.
    pub total_revenue: f64,
    pub active_wallets: u64,
    /// Average fee per transaction, passed through from the node.
    pub avg_fee: f64,
    /// `total_rewards_all_time * TREASURY_SHARE`.
    pub treasury_estimate: f64,
    pub cost_per_block: f64,
    /// `avg_fee * FEE_VOLUME_MULTIPLIER`, a mock figure for the validator panel.
    pub projected_fee_volume: f64,
}

/// Immutable view model for one refresh cycle. Built by [`merge`], consumed
/// by the renderer, then superseded by the next cycle's snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: NodeStats,
    /// At most [`RECENT_BLOCK_COUNT`] blocks, newest first.
    pub recent_blocks: Vec<Block>,
    pub mempool: Vec<Transaction>,
    pub kpis: Kpis,
    /// One point per distinct date key present in either daily map,
    /// ascending by key.
    pub revenue_series: Vec<TimeSeriesPoint>,
    /// Ring buffer of the most recent load samples, capped at
    /// [`LOAD_WINDOW_POINTS`].
    pub load_series: Vec<TimeSeriesPoint>,
}

/// Build the snapshot for one cycle.
///
/// `load_label` is the wall-clock label for the new load point; the caller
/// supplies it so this function stays deterministic for a given input.
pub fn merge(
    previous: Option<&DashboardSnapshot>,
    batch: &RawBatch,
    load_label: String,
) -> DashboardSnapshot {
    let load_point = TimeSeriesPoint {
        label: load_label,
        value: batch.business.network_load * 100.0,
    };

    DashboardSnapshot {
        stats: batch.stats.clone(),
        recent_blocks: recent_blocks(&batch.chain),
        mempool: batch.mempool.clone(),
        kpis: Kpis {
            total_revenue: batch.revenue.total_fees_all_time + batch.revenue.total_rewards_all_time,
            active_wallets: batch.business.active_wallets,
            avg_fee: batch.business.average_fee_per_tx,
            treasury_estimate: batch.revenue.total_rewards_all_time * TREASURY_SHARE,
            cost_per_block: batch.costs.cost_per_block,
            projected_fee_volume: batch.business.average_fee_per_tx * FEE_VOLUME_MULTIPLIER,
        },
        revenue_series: revenue_series(&batch.revenue),
        load_series: append_load_point(previous.map(|p| p.load_series.as_slice()), load_point),
    }
}

/// Union of both daily maps' date keys, ascending, with missing sides
/// defaulting to zero.
fn revenue_series(revenue: &RevenueReport) -> Vec<TimeSeriesPoint> {
    let mut keys: BTreeSet<&str> = revenue.daily_fees.keys().map(String::as_str).collect();
    keys.extend(revenue.daily_rewards.keys().map(String::as_str));

    keys.into_iter()
        .map(|key| TimeSeriesPoint {
            label: key.to_string(),
            value: revenue.daily_fees.get(key).copied().unwrap_or(0.0)
                + revenue.daily_rewards.get(key).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Copy the previous buffer, append the new point, evict from the front
/// until the capacity holds. The previous buffer is never touched.
fn append_load_point(
    previous: Option<&[TimeSeriesPoint]>,
    point: TimeSeriesPoint,
) -> Vec<TimeSeriesPoint> {
    let mut series: Vec<TimeSeriesPoint> = previous.unwrap_or_default().to_vec();
    series.push(point);
    if series.len() > LOAD_WINDOW_POINTS {
        let excess = series.len() - LOAD_WINDOW_POINTS;
        series.drain(..excess);
    }
    series
}

/// Last `RECENT_BLOCK_COUNT` elements of the ascending chain, newest first.
/// Works on a copy; the fetched array is left in wire order.
fn recent_blocks(chain: &[Block]) -> Vec<Block> {
    chain.iter().rev().take(RECENT_BLOCK_COUNT).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BusinessMetrics;

    fn point(label: &str, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            label: label.to_string(),
            value,
        }
    }

    #[test]
    fn load_buffer_grows_until_capacity() {
        let mut series: Vec<TimeSeriesPoint> = Vec::new();
        for i in 0..LOAD_WINDOW_POINTS {
            series = append_load_point(Some(&series), point(&format!("t{i}"), i as f64));
        }
        assert_eq!(series.len(), LOAD_WINDOW_POINTS);
        assert_eq!(series[0].label, "t0");
    }

    #[test]
    fn load_buffer_evicts_oldest_on_overflow() {
        let mut series: Vec<TimeSeriesPoint> = Vec::new();
        for i in 0..(LOAD_WINDOW_POINTS + 1) {
            series = append_load_point(Some(&series), point(&format!("t{i}"), i as f64));
        }
        assert_eq!(series.len(), LOAD_WINDOW_POINTS);
        // After 21 appends the buffer holds points 2..=21.
        assert_eq!(series[0].label, "t1");
        assert_eq!(series.last().unwrap().label, format!("t{LOAD_WINDOW_POINTS}"));
    }

    #[test]
    fn load_buffer_append_does_not_mutate_previous() {
        let previous = vec![point("t0", 1.0), point("t1", 2.0)];
        let next = append_load_point(Some(&previous), point("t2", 3.0));
        assert_eq!(previous.len(), 2);
        assert_eq!(next.len(), 3);
    }

    #[test]
    fn revenue_series_is_union_of_both_key_sets() {
        let mut revenue = RevenueReport::default();
        revenue.daily_fees.insert("2026-08-01".into(), 10.0);
        revenue.daily_fees.insert("2026-08-03".into(), 30.0);
        revenue.daily_rewards.insert("2026-08-02".into(), 20.0);
        revenue.daily_rewards.insert("2026-08-03".into(), 5.0);

        let series = revenue_series(&revenue);
        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2026-08-01", "2026-08-02", "2026-08-03"]);
        assert_eq!(series[0].value, 10.0);
        assert_eq!(series[1].value, 20.0);
        assert_eq!(series[2].value, 35.0);
    }

    #[test]
    fn recent_blocks_takes_last_five_newest_first() {
        let chain: Vec<Block> = (1..=7)
            .map(|i| Block {
                index: i,
                ..Block::default()
            })
            .collect();
        let recent = recent_blocks(&chain);
        let indices: Vec<u64> = recent.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![7, 6, 5, 4, 3]);
        // Source order untouched.
        assert_eq!(chain[0].index, 1);
    }

    #[test]
    fn recent_blocks_handles_short_chain() {
        let chain: Vec<Block> = (1..=2)
            .map(|i| Block {
                index: i,
                ..Block::default()
            })
            .collect();
        let indices: Vec<u64> = recent_blocks(&chain).iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![2, 1]);
    }

    #[test]
    fn load_value_is_percentage_of_fraction() {
        let batch = RawBatch {
            business: BusinessMetrics {
                network_load: 0.37,
                ..BusinessMetrics::default()
            },
            ..RawBatch::default()
        };
        let snapshot = merge(None, &batch, "12:00:00".into());
        assert_eq!(snapshot.load_series.len(), 1);
        assert!((snapshot.load_series[0].value - 37.0).abs() < 1e-9);
    }
}
