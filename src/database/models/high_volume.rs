use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock brand joined to its precomputed volume average
///
/// Read-only; the averages are produced by a separate aggregation.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
pub struct HighVolumeStockBrand {
    pub ticker_symbol: String,
    pub name: String,
    pub volume_average: f64,
}
