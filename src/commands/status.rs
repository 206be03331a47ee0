use crate::services::CacheStore;
use crate::utils::get_cache_dir;

pub fn run() {
    println!("📊 Cache Status");
    println!("===============");

    let store = CacheStore::new(get_cache_dir());
    let tickers = match store.list_cached_symbols() {
        Ok(tickers) => tickers,
        Err(e) => {
            eprintln!("❌ Failed to read cache: {}", e);
            std::process::exit(1);
        }
    };

    if tickers.is_empty() {
        println!("📭 Cache is empty, run `fetch` to populate it");
        return;
    }

    println!("📦 Cached symbols: {}", tickers.len());
    println!();
    println!(
        "{:<14} {:>8} {:>12} {:>12} {:>12} {:>6}",
        "TICKER", "RECORDS", "FIRST", "LAST", "CLOSE", "FUND"
    );

    let mut total_records = 0usize;
    for ticker in &tickers {
        match store.entry_info(ticker) {
            Ok(info) => {
                total_records += info.record_count;
                println!(
                    "{:<14} {:>8} {:>12} {:>12} {:>12.2} {:>6}",
                    info.ticker,
                    info.record_count,
                    info.first_date,
                    info.last_date,
                    info.last_close,
                    if info.has_fundamentals { "yes" } else { "no" }
                );
            }
            Err(e) => {
                println!("{:<14} ⚠️  unreadable: {}", ticker, e);
            }
        }
    }

    println!();
    println!("📈 Total records: {}", total_records);
}
