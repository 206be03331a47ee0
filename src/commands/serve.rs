use crate::services::{analyze_cache, load_symbols, CacheStore};
use crate::server::{self, Dataset};
use crate::utils::get_cache_dir;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

pub async fn run(symbols_path: PathBuf, port: u16) {
    println!("🚀 Starting dashboard server");

    let list = match load_symbols(&symbols_path) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("❌ Failed to load symbol list: {}", e);
            std::process::exit(1);
        }
    };

    let store = CacheStore::new(get_cache_dir());
    let analysis = match analyze_cache(&store, &list.symbols) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Analysis failed: {}", e);
            std::process::exit(1);
        }
    };

    if analysis.snapshots.is_empty() {
        eprintln!("❌ No cached data to serve, run `fetch` first");
        std::process::exit(1);
    }

    // Keep the full series in memory so the chart endpoint never
    // re-reads the cache on request.
    let mut series = HashMap::new();
    for snapshot in &analysis.snapshots {
        match store.read_history(&snapshot.ticker) {
            Ok(bars) => {
                series.insert(snapshot.ticker.clone(), bars);
            }
            Err(e) => {
                eprintln!("⚠️  Failed to load series for {}: {}", snapshot.ticker, e);
            }
        }
    }

    println!("   📈 Symbols: {}", analysis.overview.symbol_count);

    let dataset = Dataset {
        analysis,
        series,
        started: Instant::now(),
    };

    if let Err(e) = server::serve(dataset, port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
