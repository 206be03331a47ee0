use serde::{Deserialize, Serialize};

/// Fundamental fields fetched alongside the price history.
///
/// Every field is optional: the feed routinely omits values for thinly
/// covered symbols, and a missing field is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,

    /// Trailing price-to-earnings ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,

    /// Trailing earnings per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,

    /// Dividend yield as a fraction (0.013 = 1.3%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_none() {
        let f = Fundamentals::default();
        assert_eq!(f.market_cap, None);
        assert_eq!(f.pe_ratio, None);
        assert_eq!(f.dividend_yield, None);
    }

    #[test]
    fn test_skips_missing_fields_in_json() {
        let f = Fundamentals {
            pe_ratio: Some(18.4),
            ..Default::default()
        };
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"pe_ratio":18.4}"#);
    }
}
