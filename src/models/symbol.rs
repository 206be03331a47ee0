use serde::{Deserialize, Serialize};

/// Immutable reference data for one listed equity, loaded from the symbol CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Bare ticker without exchange suffix (e.g. RELIANCE)
    pub ticker: String,

    /// Company name
    pub name: String,

    /// Sector classification
    pub sector: String,

    /// Exchange listing (optional fourth column)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl SymbolRecord {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            sector: sector.into(),
            exchange: None,
        }
    }
}
