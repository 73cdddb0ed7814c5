use serde::{Deserialize, Serialize};

/// Which quote field priced the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    Latest,
    PreviousClose,
}

impl PriceBasis {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Latest => "最新价",
            Self::PreviousClose => "昨收",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub basis: PriceBasis,
    pub budget_per_stock: f64,
    pub rows: Vec<AllocationRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    /// Exchange-prefixed code.
    pub code: String,
    pub name: String,
    pub report_count: u32,
    pub latest_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub shares: u64,
}

impl AllocationRow {
    pub fn reference_price(&self, basis: PriceBasis) -> Option<f64> {
        match basis {
            PriceBasis::Latest => self.latest_price,
            PriceBasis::PreviousClose => self.previous_close,
        }
    }
}

impl AllocationPlan {
    pub fn total_shares(&self) -> u64 {
        self.rows.iter().map(|r| r.shares).sum()
    }
}
