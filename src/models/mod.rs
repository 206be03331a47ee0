mod analysis;
mod fundamentals;
mod ohlcv;
mod symbol;
pub mod indicators;

pub use analysis::{MarketOverview, OverviewEntry, SectorStats, Signal, SymbolSnapshot};
pub use fundamentals::Fundamentals;
pub use ohlcv::Ohlcv;
pub use symbol::SymbolRecord;

/// Daily history for a single symbol, ascending by date
pub type TimeSeries = Vec<Ohlcv>;
