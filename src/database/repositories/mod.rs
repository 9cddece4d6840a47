//! Repository implementations, one trait and one concrete type per table
//!
//! Every method takes the [`DbContext`](crate::database::DbContext) it runs
//! against: a pool-bound context for standalone calls or the
//! transaction-bound one handed out by `do_in_tx`.

pub mod analyze_history_repository;
pub mod daily_price_for_analyze_repository;
pub mod daily_price_repository;
pub mod high_volume_stock_brand_repository;
pub mod index_daily_price_repository;
pub mod stock_brand_repository;

pub use analyze_history_repository::{AnalyzeHistoryRepository, AnalyzeHistoryRepositoryImpl};
pub use daily_price_for_analyze_repository::{
    DailyPriceForAnalyzeRepository, DailyPriceForAnalyzeRepositoryImpl,
};
pub use daily_price_repository::{DailyPriceRepository, DailyPriceRepositoryImpl};
pub use high_volume_stock_brand_repository::{
    HighVolumeStockBrandRepository, HighVolumeStockBrandRepositoryImpl,
};
pub use index_daily_price_repository::{IndexDailyPriceRepository, IndexDailyPriceRepositoryImpl};
pub use stock_brand_repository::{StockBrandRepository, StockBrandRepositoryImpl};

use std::collections::HashMap;
use std::hash::Hash;

/// Rows per multi-row INSERT; keeps well under PostgreSQL's bind-parameter cap
pub(crate) const UPSERT_CHUNK_SIZE: usize = 1000;

/// Keep only the last item for each key, in first-seen key order
///
/// A single `INSERT .. ON CONFLICT DO UPDATE` may not touch the same row
/// twice, so duplicate natural keys within one batch collapse to the latest.
pub(crate) fn last_per_key<T, K, F>(items: &[T], key: F) -> Vec<&T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(items.len());
    let mut kept: Vec<&T> = Vec::with_capacity(items.len());

    for item in items {
        match slots.get(&key(item)) {
            Some(&slot) => kept[slot] = item,
            None => {
                slots.insert(key(item), kept.len());
                kept.push(item);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_per_key_keeps_latest_value() {
        let items = [("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let kept = last_per_key(&items, |(k, _)| *k);

        assert_eq!(kept, vec![&("a", 3), &("b", 5), &("c", 4)]);
    }

    #[test]
    fn test_last_per_key_without_duplicates() {
        let items = [1, 2, 3];
        assert_eq!(last_per_key(&items, |v| *v), vec![&1, &2, &3]);
    }
}
