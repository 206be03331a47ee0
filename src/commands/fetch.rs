use crate::services::{load_symbols, CacheStore, FetchConfig, FetchSync};
use crate::utils::get_cache_dir;
use std::path::PathBuf;
use std::time::Duration;

pub async fn run(symbols_path: PathBuf, pacing_ms: Option<u64>, quiet: bool) {
    println!("📥 Fetching market data");
    println!("📁 Symbol list: {}", symbols_path.display());

    let list = match load_symbols(&symbols_path) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("❌ Failed to load symbol list: {}", e);
            std::process::exit(1);
        }
    };

    if list.skipped_rows > 0 {
        println!(
            "⚠️  Skipped {} malformed rows in {}",
            list.skipped_rows,
            symbols_path.display()
        );
    }
    println!("📈 {} symbols to fetch", list.symbols.len());

    let cache_dir = get_cache_dir();
    println!("💾 Cache directory: {}", cache_dir.display());

    let mut config = FetchConfig::default();
    if let Some(ms) = pacing_ms {
        config.pacing = Duration::from_millis(ms);
    }
    config.quiet = quiet;

    let mut sync = match FetchSync::new(CacheStore::new(cache_dir), config) {
        Ok(sync) => sync,
        Err(e) => {
            eprintln!("❌ Failed to initialize fetcher: {}", e);
            std::process::exit(1);
        }
    };

    match sync.fetch_all(&list.symbols).await {
        Ok(_) => {
            sync.print_summary();
            let stats = sync.stats();
            if stats.fetched == 0 {
                eprintln!("\n❌ No symbol could be fetched this run");
                std::process::exit(1);
            }
            println!("\n✅ Fetch completed");
        }
        Err(e) => {
            eprintln!("\n❌ Fetch aborted: {}", e);
            std::process::exit(1);
        }
    }
}
