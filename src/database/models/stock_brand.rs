use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Market codes treated as primary listings (Prime, Standard, Growth)
pub const MAIN_MARKET_CODES: [&str; 3] = ["111", "112", "113"];

/// Stock brand entity - an issuer listed by the quote provider
///
/// At most one active (not soft-deleted) row exists per ticker symbol.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::stock_brands)]
#[diesel(primary_key(id))]
pub struct StockBrand {
    /// Opaque identifier, immutable once inserted
    pub id: String,

    /// Exchange ticker symbol (e.g., "7203")
    pub ticker_symbol: String,

    /// Display name
    pub name: String,

    pub market_code: String,
    pub market_name: String,

    /// 33-sector classification
    pub sector33_code: String,
    pub sector33_name: String,

    /// 17-sector classification
    pub sector17_code: String,
    pub sector17_name: String,

    pub created_at: DateTime<Utc>,

    /// Last time the provider reported this brand
    pub updated_at: DateTime<Utc>,

    /// Set when the provider stopped listing the brand
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StockBrand {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn is_main_market(&self) -> bool {
        MAIN_MARKET_CODES.contains(&self.market_code.as_str())
    }
}

/// Stock brand for insertion or upsert
///
/// `updated_at` is the refresh time of the listing this row came from; it
/// defaults to now.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::stock_brands)]
pub struct NewStockBrand {
    pub id: String,
    pub ticker_symbol: String,
    pub name: String,
    pub market_code: String,
    pub market_name: String,
    pub sector33_code: String,
    pub sector33_name: String,
    pub sector17_code: String,
    pub sector17_name: String,
    pub updated_at: DateTime<Utc>,
}

impl NewStockBrand {
    /// Create a new stock brand builder
    pub fn new(
        id: impl Into<String>,
        ticker_symbol: impl Into<String>,
        name: impl Into<String>,
        market_code: impl Into<String>,
        market_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            ticker_symbol: ticker_symbol.into(),
            name: name.into(),
            market_code: market_code.into(),
            market_name: market_name.into(),
            sector33_code: String::new(),
            sector33_name: String::new(),
            sector17_code: String::new(),
            sector17_name: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_sector33(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.sector33_code = code.into();
        self.sector33_name = name.into();
        self
    }

    pub fn with_sector17(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.sector17_code = code.into();
        self.sector17_name = name.into();
        self
    }

    /// Set the refresh time recorded as `updated_at`
    pub fn refreshed_at(mut self, refreshed_at: DateTime<Utc>) -> Self {
        self.updated_at = refreshed_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_stock_brand_builder() {
        let refreshed = Utc.with_ymd_and_hms(2023, 1, 4, 9, 0, 0).unwrap();
        let brand = NewStockBrand::new("b1", "1001", "Example Corp", "111", "Prime")
            .with_sector33("0050", "Fishery")
            .with_sector17("1", "Foods")
            .refreshed_at(refreshed);

        assert_eq!(brand.id, "b1");
        assert_eq!(brand.ticker_symbol, "1001");
        assert_eq!(brand.market_code, "111");
        assert_eq!(brand.sector33_code, "0050");
        assert_eq!(brand.sector17_name, "Foods");
        assert_eq!(brand.updated_at, refreshed);
    }

    #[test]
    fn test_main_market_membership() {
        let now = Utc::now();
        let mut brand = StockBrand {
            id: "b1".to_string(),
            ticker_symbol: "1001".to_string(),
            name: "Example Corp".to_string(),
            market_code: "112".to_string(),
            market_name: "Standard".to_string(),
            sector33_code: String::new(),
            sector33_name: String::new(),
            sector17_code: String::new(),
            sector17_name: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(brand.is_main_market());
        assert!(brand.is_active());

        brand.market_code = "999".to_string();
        brand.deleted_at = Some(now);
        assert!(!brand.is_main_market());
        assert!(!brand.is_active());
    }
}
