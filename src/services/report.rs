//! PDF snapshot report.
//!
//! Mirrors the dashboard's content in a printable layout: market overview
//! metrics, top gainers, sector aggregates and the per-symbol signal table.
//! Tables are set in Courier so column padding lines up.

use crate::error::{Error, Result};
use crate::services::analyzer::AnalysisResult;
use crate::utils::format_date;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const LINE_STEP_MM: f32 = 5.5;

struct ReportWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Report(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Report(e.to_string()))?;
        let mono = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| Error::Report(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            regular,
            bold,
            mono,
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn ensure_space(&mut self, lines: usize) {
        let needed = lines as f32 * LINE_STEP_MM;
        if self.y - needed < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(3);
        self.y -= LINE_STEP_MM;
        let font = self.bold.clone();
        self.layer.use_text(text, 13.0, Mm(MARGIN_MM), Mm(self.y), &font);
        self.y -= LINE_STEP_MM;
    }

    fn body(&mut self, text: &str) {
        self.ensure_space(1);
        let font = self.regular.clone();
        self.layer.use_text(text, 10.0, Mm(MARGIN_MM), Mm(self.y), &font);
        self.y -= LINE_STEP_MM;
    }

    fn table_row(&mut self, text: &str) {
        self.ensure_space(1);
        let font = self.mono.clone();
        self.layer.use_text(text, 8.0, Mm(MARGIN_MM), Mm(self.y), &font);
        self.y -= LINE_STEP_MM * 0.85;
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| Error::Report(e.to_string()))
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Render the analysis result as a PDF document, returned as bytes.
pub fn render_report(result: &AnalysisResult) -> Result<Vec<u8>> {
    let overview = &result.overview;
    let mut writer = ReportWriter::new("Stock Market Analysis Report")?;

    // Title block
    writer.y -= 2.0;
    let title_font = writer.bold.clone();
    writer
        .layer
        .use_text("Stock Market Analysis Report", 18.0, Mm(MARGIN_MM), Mm(writer.y), &title_font);
    writer.y -= LINE_STEP_MM * 1.5;
    writer.body(&format!(
        "Generated on {}",
        overview.analysis_time.format("%Y-%m-%d %H:%M UTC")
    ));

    // Market overview
    writer.heading("Market Overview");
    writer.body(&format!("Symbols analyzed: {}", overview.symbol_count));
    writer.body(&format!("Total market cap: {:.0}", overview.total_market_cap));
    writer.body(&format!("Average P/E: {}", fmt_opt(overview.average_pe, 2)));
    writer.body(&format!(
        "Market breadth: {}",
        overview
            .market_breadth
            .map(|b| format!("{:.1}%", b * 100.0))
            .unwrap_or_else(|| "-".to_string())
    ));

    // Top gainers
    writer.heading("Top Gainers");
    writer.table_row(&format!(
        "{:<12} {:<28} {:>10} {:>9} {:>12}",
        "Symbol", "Company", "Price", "Change%", "Volume"
    ));
    for entry in &overview.top_gainers {
        writer.table_row(&format!(
            "{:<12} {:<28} {:>10.2} {:>9} {:>12}",
            entry.ticker,
            truncate(&entry.name, 28),
            entry.last_close,
            fmt_opt(entry.daily_change_pct, 2),
            entry.last_volume
        ));
    }

    // Most active
    writer.heading("Most Active");
    for entry in &overview.most_active {
        writer.table_row(&format!(
            "{:<12} {:<28} {:>10.2} {:>9} {:>12}",
            entry.ticker,
            truncate(&entry.name, 28),
            entry.last_close,
            fmt_opt(entry.daily_change_pct, 2),
            entry.last_volume
        ));
    }

    // Sector analysis
    writer.heading("Sector Analysis");
    writer.table_row(&format!(
        "{:<26} {:>7} {:>16} {:>9} {:>9}",
        "Sector", "Symbols", "Market Cap", "Avg P/E", "Change%"
    ));
    for sector in &result.sectors {
        writer.table_row(&format!(
            "{:<26} {:>7} {:>16.0} {:>9} {:>9}",
            truncate(&sector.sector, 26),
            sector.symbol_count,
            sector.total_market_cap,
            fmt_opt(sector.average_pe, 2),
            fmt_opt(sector.average_daily_change_pct, 2)
        ));
    }

    // Technical signals
    writer.heading("Technical Signals");
    writer.table_row(&format!(
        "{:<12} {:>10} {:>6} {:>9} {:>9} {:>9} {:>6}",
        "Symbol", "Price", "Sig", "SMA20", "SMA50", "RSI14", "Date"
    ));
    for snapshot in &result.snapshots {
        writer.table_row(&format!(
            "{:<12} {:>10.2} {:>6} {:>9} {:>9} {:>9} {:>10}",
            snapshot.ticker,
            snapshot.last_close,
            snapshot
                .signal
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            fmt_opt(snapshot.sma20, 2),
            fmt_opt(snapshot.sma50, 2),
            fmt_opt(snapshot.rsi14, 1),
            format_date(snapshot.last_date)
        ));
    }

    writer.finish()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fundamentals, SymbolRecord, TimeSeries};
    use crate::services::analyzer::analyze_series;
    use chrono::NaiveDate;

    fn input(ticker: &str, closes: &[f64]) -> (SymbolRecord, TimeSeries, Option<Fundamentals>) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                crate::models::Ohlcv::new(
                    start + chrono::Duration::days(i as i64),
                    c,
                    c + 1.0,
                    c - 1.0,
                    c,
                    5_000,
                )
            })
            .collect();
        (
            SymbolRecord::new(ticker, format!("{} Ltd", ticker), "Energy"),
            series,
            Some(Fundamentals {
                pe_ratio: Some(15.0),
                market_cap: Some(1.0e9),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_render_report_produces_pdf() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.3).collect();
        let result = analyze_series(vec![input("AAA", &closes), input("BBB", &[10.0, 10.5])]);

        let bytes = render_report(&result).unwrap();
        assert!(bytes.len() > 500);
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_report_survives_many_rows() {
        // Enough snapshot rows to force page breaks
        let inputs: Vec<_> = (0..120)
            .map(|i| input(&format!("SYM{:03}", i), &[100.0, 101.0, 99.5]))
            .collect();
        let result = analyze_series(inputs);

        let bytes = render_report(&result).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long company name", 10), "a very lo…");
    }
}
