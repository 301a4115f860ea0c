mod market_collector;

pub mod chart;
pub mod price_table;

pub use market_collector::{CollectOutcome, MarketCollector, TABLE_CLASS, TABLE_CSS, parse_table};
pub use price_table::MarketRow;
