// glrestore/src/cost/mod.rs
//! Restore cost estimation (USD). Pure; no rounding is applied here.
use std::collections::BTreeMap;

use crate::classify::ClassificationTable;
use crate::config::RestorePolicy;
use crate::store::SpeedTier;

/// Monthly storage price per GB for the temporary restored copy.
pub const STORAGE_RATE_PER_GB_MONTH: f64 = 0.022;
const BYTES_PER_GB: f64 = 1e9;

/// (price per 1000 requests, price per GB retrieved)
pub fn tier_rates(tier: SpeedTier) -> (f64, f64) {
    match tier {
        SpeedTier::Expedited => (10.00, 0.03),
        SpeedTier::Standard => (0.10, 0.02),
        SpeedTier::Bulk => (0.025, 0.0025),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub num_objects: usize,
    pub total_size_gb: f64,
    pub request_cost: BTreeMap<SpeedTier, f64>,
    pub data_cost: BTreeMap<SpeedTier, f64>,
    pub extended_storage_cost: f64,
    pub chosen_tier_total: f64,
}

impl CostEstimate {
    pub fn tier_total(&self, tier: SpeedTier) -> f64 {
        self.request_cost.get(&tier).copied().unwrap_or_default()
            + self.data_cost.get(&tier).copied().unwrap_or_default()
    }
}

pub fn extended_storage_cost(total_size_gb: f64, days: i32) -> f64 {
    total_size_gb * (f64::from(days) / 30.0) * STORAGE_RATE_PER_GB_MONTH
}

/// Costs only the actionable subset: archived objects with no restore yet.
pub fn estimate(table: &ClassificationTable, policy: &RestorePolicy) -> CostEstimate {
    let (num_objects, total_bytes) = table
        .actionable()
        .fold((0usize, 0u64), |(n, bytes), r| (n + 1, bytes.saturating_add(r.size_bytes.unwrap_or(0))));
    let total_size_gb = total_bytes as f64 / BYTES_PER_GB;

    let mut request_cost = BTreeMap::new();
    let mut data_cost = BTreeMap::new();
    for tier in SpeedTier::ALL {
        let (request_rate, data_rate) = tier_rates(tier);
        request_cost.insert(tier, (num_objects as f64 / 1000.0) * request_rate);
        data_cost.insert(tier, total_size_gb * data_rate);
    }

    let extended_storage_cost = extended_storage_cost(total_size_gb, policy.days);
    let chosen_tier_total = extended_storage_cost
        + request_cost[&policy.speed]
        + data_cost[&policy.speed];

    CostEstimate {
        num_objects,
        total_size_gb,
        request_cost,
        data_cost,
        extended_storage_cost,
        chosen_tier_total,
    }
}
