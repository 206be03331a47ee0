use crate::error::Result;
use crate::services::{analyze_cache, load_symbols, AnalysisResult, CacheStore};
use crate::utils::{get_cache_dir, get_data_dir};
use std::fs;
use std::path::PathBuf;

pub fn run(symbols_path: PathBuf) {
    println!("🧮 Analyzing cached market data");

    match analyze_and_save(&symbols_path) {
        Ok(result) => {
            let overview = &result.overview;
            println!("\n✅ Analysis completed");
            println!("   📈 Symbols analyzed: {}", overview.symbol_count);
            println!("   ⏭️  Skipped:          {}", result.skipped.len());
            println!("   💰 Total market cap: {:.0}", overview.total_market_cap);
            if let Some(pe) = overview.average_pe {
                println!("   📐 Average P/E:      {:.2}", pe);
            }
            if let Some(breadth) = overview.market_breadth {
                println!("   🌡️  Market breadth:   {:.1}%", breadth * 100.0);
            }
        }
        Err(e) => {
            eprintln!("❌ Analysis failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn analyze_and_save(symbols_path: &PathBuf) -> Result<AnalysisResult> {
    let list = load_symbols(symbols_path)?;
    let store = CacheStore::new(get_cache_dir());
    let result = analyze_cache(&store, &list.symbols)?;

    let data_dir = get_data_dir();
    fs::create_dir_all(&data_dir)?;

    // Full result for the dashboard and downstream tooling
    let analysis_path = data_dir.join("analysis.json");
    fs::write(&analysis_path, serde_json::to_string_pretty(&result)?)?;
    println!("💾 Analysis saved to {}", analysis_path.display());

    // Flat signal table, one row per symbol
    let signals_path = data_dir.join("signals.csv");
    let mut writer = csv::Writer::from_path(&signals_path)?;
    writer.write_record([
        "ticker",
        "name",
        "last_close",
        "signal",
        "daily_change_pct",
        "pe_ratio",
        "sector",
    ])?;
    for snapshot in &result.snapshots {
        writer.write_record([
            snapshot.ticker.clone(),
            snapshot.name.clone(),
            snapshot.last_close.to_string(),
            snapshot
                .signal
                .map(|s| s.to_string())
                .unwrap_or_default(),
            snapshot
                .daily_change_pct
                .map(|c| format!("{:.4}", c))
                .unwrap_or_default(),
            snapshot
                .pe_ratio
                .map(|pe| format!("{:.2}", pe))
                .unwrap_or_default(),
            snapshot.sector.clone(),
        ])?;
    }
    writer.flush()?;
    println!("💾 Signals saved to {}", signals_path.display());

    Ok(result)
}
