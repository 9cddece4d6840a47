use crate::database::connection::DatabaseError;
use crate::database::models::stock_brand::MAIN_MARKET_CODES;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filter for listing stock brands
///
/// `only_main_markets` takes precedence over `market_codes`: when it is set
/// the explicit codes are ignored. `symbol_cursor` and `limit` paginate
/// independently of the market constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockBrandFilter {
    pub only_main_markets: bool,
    pub market_codes: BTreeSet<String>,
    /// Return symbols strictly greater than this one; empty for the first page
    pub symbol_cursor: String,
    /// Maximum rows; zero or negative means unbounded
    pub limit: i64,
}

impl StockBrandFilter {
    pub fn main_markets() -> Self {
        Self {
            only_main_markets: true,
            ..Self::default()
        }
    }

    pub fn with_market_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.market_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn after(mut self, symbol_cursor: impl Into<String>) -> Self {
        self.symbol_cursor = symbol_cursor.into();
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Market codes to restrict to, or `None` for no market constraint
    pub fn effective_market_codes(&self) -> Option<Vec<String>> {
        if self.only_main_markets {
            return Some(MAIN_MARKET_CODES.iter().map(|c| c.to_string()).collect());
        }
        if self.market_codes.is_empty() {
            return None;
        }
        Some(self.market_codes.iter().cloned().collect())
    }

    /// Page size, if bounded
    pub fn effective_limit(&self) -> Option<i64> {
        positive_limit(self.limit)
    }
}

fn positive_limit(limit: i64) -> Option<i64> {
    (limit > 0).then_some(limit)
}

/// Filter for a symbol's daily series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceFilter {
    /// Required
    pub ticker_symbol: String,
    #[serde(flatten)]
    pub range: DateRange,
}

impl DailyPriceFilter {
    pub fn new(ticker_symbol: impl Into<String>) -> Self {
        Self {
            ticker_symbol: ticker_symbol.into(),
            range: DateRange::default(),
        }
    }

    pub fn date_from(mut self, date_from: DateTime<Utc>) -> Self {
        self.range.date_from = Some(date_from);
        self
    }

    pub fn date_to(mut self, date_to: DateTime<Utc>) -> Self {
        self.range.date_to = Some(date_to);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), DatabaseError> {
        if self.ticker_symbol.is_empty() {
            return Err(DatabaseError::InvalidInput(
                "ticker symbol is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Inclusive calendar-day range
///
/// Both bounds are normalised to midnight UTC, so `date_to` covers any
/// timestamp on that day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(date_from: Option<DateTime<Utc>>, date_to: Option<DateTime<Utc>>) -> Self {
        Self { date_from, date_to }
    }

    /// Inclusive lower bound
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.date_from.map(start_of_day)
    }

    /// Exclusive upper bound: midnight after `date_to`
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.date_to.map(|to| start_of_day(to) + Duration::days(1))
    }
}

/// Midnight UTC of the day containing `at`
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn contains(range: &DateRange, at: DateTime<Utc>) -> bool {
        range.lower_bound().map_or(true, |lower| at >= lower)
            && range.upper_bound().map_or(true, |upper| at < upper)
    }

    #[test]
    fn test_main_markets_override_explicit_codes() {
        let filter = StockBrandFilter::main_markets().with_market_codes(["999"]);
        let codes = filter.effective_market_codes().unwrap();

        assert_eq!(codes, vec!["111", "112", "113"]);
        assert!(!codes.contains(&"999".to_string()));
    }

    #[test]
    fn test_explicit_codes_apply_without_main_flag() {
        let filter = StockBrandFilter::default().with_market_codes(["999", "121"]);
        assert_eq!(
            filter.effective_market_codes(),
            Some(vec!["121".to_string(), "999".to_string()])
        );
    }

    #[test]
    fn test_no_market_constraint() {
        assert_eq!(StockBrandFilter::default().effective_market_codes(), None);
    }

    #[test]
    fn test_limit_zero_or_negative_is_unbounded() {
        assert_eq!(StockBrandFilter::default().effective_limit(), None);
        assert_eq!(StockBrandFilter::default().with_limit(-5).effective_limit(), None);
        assert_eq!(StockBrandFilter::default().with_limit(10).effective_limit(), Some(10));
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(at(2023, 1, 3, 15, 30)), at(2023, 1, 3, 0, 0));
        assert_eq!(start_of_day(at(2023, 1, 3, 0, 0)), at(2023, 1, 3, 0, 0));
    }

    #[test]
    fn test_date_range_is_day_inclusive() {
        let range = DateRange::new(Some(at(2023, 1, 2, 12, 0)), Some(at(2023, 1, 3, 0, 0)));

        assert!(contains(&range, at(2023, 1, 2, 0, 0)));
        assert!(!contains(&range, at(2023, 1, 1, 0, 0)));
        assert!(contains(&range, at(2023, 1, 3, 23, 59)));
        assert!(!contains(&range, at(2023, 1, 4, 0, 0)));
    }

    #[test]
    fn test_open_range_contains_everything() {
        assert!(contains(&DateRange::default(), at(1999, 12, 31, 23, 59)));
    }

    #[test]
    fn test_daily_price_filter_requires_symbol() {
        assert!(DailyPriceFilter::default().validate().is_err());
        assert!(DailyPriceFilter::new("1001").validate().is_ok());
    }
}
