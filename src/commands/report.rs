use crate::error::Result;
use crate::services::{analyze_cache, load_symbols, render_report, CacheStore};
use crate::utils::{get_cache_dir, get_data_dir};
use std::fs;
use std::path::PathBuf;

pub fn run(symbols_path: PathBuf, output: Option<PathBuf>) {
    println!("📄 Generating PDF report");

    match generate(&symbols_path, output) {
        Ok(path) => {
            println!("✅ Report written to {}", path.display());
        }
        Err(e) => {
            eprintln!("❌ Report generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate(symbols_path: &PathBuf, output: Option<PathBuf>) -> Result<PathBuf> {
    let list = load_symbols(symbols_path)?;
    let store = CacheStore::new(get_cache_dir());
    let analysis = analyze_cache(&store, &list.symbols)?;

    let bytes = render_report(&analysis)?;

    let path = match output {
        Some(path) => path,
        None => {
            let data_dir = get_data_dir();
            fs::create_dir_all(&data_dir)?;
            data_dir.join("stock_analysis_report.pdf")
        }
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&path, bytes)?;
    Ok(path)
}
