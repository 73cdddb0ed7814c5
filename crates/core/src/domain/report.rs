use crate::domain::lenient;
use serde::{Deserialize, Serialize};

/// Rating label the report source uses for "Buy".
pub const BUY_RATING: &str = "买入";

/// One analyst report about one stock.
///
/// Field names on the wire are the report endpoint's own (`stockCode`, `predictThisYearPe`,
/// ...), in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "stockName", default, deserialize_with = "lenient::string")]
    pub stock_name: String,
    #[serde(rename = "stockCode", default, deserialize_with = "lenient::string")]
    pub stock_code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(rename = "orgCode", default, deserialize_with = "lenient::string")]
    pub org_code: String,
    #[serde(rename = "orgName", default, deserialize_with = "lenient::string")]
    pub org_name: String,
    #[serde(rename = "orgSName", default, deserialize_with = "lenient::string")]
    pub org_short_name: String,

    #[serde(rename = "predictThisYearPe", default, deserialize_with = "lenient::opt_f64")]
    pub predict_this_year_pe: Option<f64>,
    #[serde(rename = "predictThisYearEps", default, deserialize_with = "lenient::opt_f64")]
    pub predict_this_year_eps: Option<f64>,
    #[serde(rename = "predictNextYearPe", default, deserialize_with = "lenient::opt_f64")]
    pub predict_next_year_pe: Option<f64>,
    #[serde(rename = "predictNextYearEps", default, deserialize_with = "lenient::opt_f64")]
    pub predict_next_year_eps: Option<f64>,
    #[serde(rename = "predictNextTwoYearPe", default, deserialize_with = "lenient::opt_f64")]
    pub predict_next_two_year_pe: Option<f64>,
    #[serde(rename = "predictNextTwoYearEps", default, deserialize_with = "lenient::opt_f64")]
    pub predict_next_two_year_eps: Option<f64>,

    #[serde(rename = "indvInduName", default, deserialize_with = "lenient::string")]
    pub industry_name: String,
    #[serde(rename = "indvInduCode", default, deserialize_with = "lenient::string")]
    pub industry_code: String,
    #[serde(rename = "emRatingName", default, deserialize_with = "lenient::string")]
    pub rating: String,
    #[serde(rename = "lastEmRatingName", default, deserialize_with = "lenient::string")]
    pub last_rating: String,

    /// Reports published on this stock within the trailing month.
    #[serde(rename = "count", default, deserialize_with = "lenient::count")]
    pub report_count: u32,

    /// Kept as the source string (`2024-05-20 00:00:00.000`).
    #[serde(rename = "publishDate", default, deserialize_with = "lenient::string")]
    pub publish_date: String,
}

impl ReportRecord {
    pub fn is_rated(&self, rating: &str) -> bool {
        self.rating == rating
    }

    /// `YYYY-MM-DD` part of the publish timestamp.
    pub fn publish_day(&self) -> &str {
        self.publish_date.get(..10).unwrap_or(&self.publish_date)
    }
}

/// One decoded page of the report listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportPage {
    #[serde(default)]
    pub data: Option<Vec<ReportRecord>>,
}

impl ReportPage {
    pub fn into_records(self) -> Vec<ReportRecord> {
        self.data.unwrap_or_default()
    }
}
