pub mod analyze;
pub mod daily_price;
pub mod filter;
pub mod high_volume;
pub mod index_price;
pub mod ohlcv;
pub mod stock_brand;

pub use analyze::{
    AnalyzeStockBrandPriceHistory, DailyPriceForAnalyze, NewAnalyzeStockBrandPriceHistory,
    NewDailyPriceForAnalyze,
};
pub use daily_price::{DailyPrice, NewDailyPrice};
pub use filter::{DailyPriceFilter, DateRange, StockBrandFilter};
pub use high_volume::HighVolumeStockBrand;
pub use index_price::{IndexDailyPrice, MarketIndex, NewIndexDailyPrice};
pub use ohlcv::Ohlcv;
pub use stock_brand::{NewStockBrand, StockBrand, MAIN_MARKET_CODES};
