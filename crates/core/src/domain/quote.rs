use crate::domain::lenient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quote snapshots keyed by bare six-digit code.
pub type QuoteBook = HashMap<String, QuoteSnapshot>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    #[serde(rename = "f12", default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(rename = "f14", default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "f2", default, deserialize_with = "lenient::opt_f64")]
    pub latest_price: Option<f64>,
    #[serde(rename = "f18", default, deserialize_with = "lenient::opt_f64")]
    pub previous_close: Option<f64>,
}

pub fn into_book(quotes: impl IntoIterator<Item = QuoteSnapshot>) -> QuoteBook {
    quotes
        .into_iter()
        .filter(|q| !q.code.is_empty())
        .map(|q| (q.code.clone(), q))
        .collect()
}
