pub mod analyzer;
pub mod cache_store;
pub mod fetch_sync;
pub mod report;
pub mod symbol_list;
pub mod yahoo;

pub use analyzer::{analyze_cache, analyze_series, AnalysisResult};
pub use cache_store::{CacheEntryInfo, CacheStore};
pub use fetch_sync::{FetchConfig, FetchStats, FetchSync};
pub use report::render_report;
pub use symbol_list::{load_symbols, SymbolList};
pub use yahoo::{YahooClient, YahooError};
