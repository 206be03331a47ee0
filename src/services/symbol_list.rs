//! Symbol reference-data loader.
//!
//! The symbol list is a static CSV with header `ticker,name,sector` and an
//! optional `exchange` column. Malformed rows are skipped with a warning;
//! they never abort a run. Duplicate tickers keep the first occurrence.

use crate::error::{Error, Result};
use crate::models::SymbolRecord;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Outcome of loading the symbol file
#[derive(Debug)]
pub struct SymbolList {
    pub symbols: Vec<SymbolRecord>,
    pub skipped_rows: usize,
}

/// Load and validate the symbol CSV. Failure to read the file itself is
/// unrecoverable; bad rows inside it are not.
pub fn load_symbols(path: &Path) -> Result<SymbolList> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::Io(format!("Failed to read symbol file {}: {}", path.display(), e)))?;

    let mut symbols = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped_rows = 0;

    for (line_no, result) in reader.records().enumerate() {
        // Header is line 1, first record is line 2
        let line = line_no + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed symbol row at line {}: {}", line, e);
                skipped_rows += 1;
                continue;
            }
        };

        let ticker = record.get(0).unwrap_or("").trim().to_uppercase();
        let name = record.get(1).unwrap_or("").trim().to_string();
        let sector = record.get(2).unwrap_or("").trim().to_string();
        let exchange = record
            .get(3)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if ticker.is_empty() || name.is_empty() || sector.is_empty() {
            warn!(
                "Skipping symbol row at line {}: missing ticker, name or sector",
                line
            );
            skipped_rows += 1;
            continue;
        }

        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '&' || c == '.')
        {
            warn!("Skipping symbol row at line {}: invalid ticker '{}'", line, ticker);
            skipped_rows += 1;
            continue;
        }

        if !seen.insert(ticker.clone()) {
            warn!("Skipping duplicate ticker '{}' at line {}", ticker, line);
            skipped_rows += 1;
            continue;
        }

        symbols.push(SymbolRecord {
            ticker,
            name,
            sector,
            exchange,
        });
    }

    if symbols.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No valid symbols in {}",
            path.display()
        )));
    }

    Ok(SymbolList {
        symbols,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_symbols() {
        let file = write_csv(
            "ticker,name,sector\n\
             RELIANCE,Reliance Industries,Energy\n\
             TCS,Tata Consultancy Services,Information Technology\n",
        );

        let list = load_symbols(file.path()).unwrap();
        assert_eq!(list.symbols.len(), 2);
        assert_eq!(list.skipped_rows, 0);
        assert_eq!(list.symbols[0].ticker, "RELIANCE");
        assert_eq!(list.symbols[1].sector, "Information Technology");
    }

    #[test]
    fn test_malformed_rows_skipped_with_warning() {
        let file = write_csv(
            "ticker,name,sector\n\
             RELIANCE,Reliance Industries,Energy\n\
             ,Missing Ticker,Energy\n\
             INFY,Infosys,Information Technology\n\
             HDFCBANK,,Financial Services\n",
        );

        let list = load_symbols(file.path()).unwrap();
        assert_eq!(list.symbols.len(), 2);
        assert_eq!(list.skipped_rows, 2);
    }

    #[test]
    fn test_duplicate_ticker_keeps_first() {
        let file = write_csv(
            "ticker,name,sector\n\
             ITC,ITC Limited,Consumer Staples\n\
             itc,ITC Duplicate,Consumer Staples\n",
        );

        let list = load_symbols(file.path()).unwrap();
        assert_eq!(list.symbols.len(), 1);
        assert_eq!(list.symbols[0].name, "ITC Limited");
        assert_eq!(list.skipped_rows, 1);
    }

    #[test]
    fn test_all_rows_invalid_is_error() {
        let file = write_csv("ticker,name,sector\n,,\n");
        assert!(load_symbols(file.path()).is_err());
    }

    #[test]
    fn test_ticker_uppercased_and_exchange_column() {
        let file = write_csv(
            "ticker,name,sector,exchange\n\
             sbin,State Bank of India,Financial Services,NSE\n",
        );

        let list = load_symbols(file.path()).unwrap();
        assert_eq!(list.symbols[0].ticker, "SBIN");
        assert_eq!(list.symbols[0].exchange.as_deref(), Some("NSE"));
    }
}
