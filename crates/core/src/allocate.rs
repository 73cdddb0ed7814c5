use crate::domain::plan::{AllocationPlan, AllocationRow, PriceBasis};
use crate::domain::quote::QuoteBook;
use crate::domain::report::ReportRecord;
use crate::error::PickError;
use crate::symbol::strip_exchange_prefix;

pub const LOT_SIZE: u64 = 100;
pub const DEFAULT_BUDGET_PER_STOCK: f64 = 100_000.0;

/// Whole lots affordable with `budget` at `price`:
/// `floor(floor(budget / price) / 100) * 100`.
pub fn lot_shares(budget: f64, price: f64) -> Result<u64, PickError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(PickError::AllocationArithmetic(format!("unusable price {price}")));
    }
    let whole = (budget / price).floor();
    if !whole.is_finite() || whole < 0.0 {
        return Err(PickError::AllocationArithmetic(format!(
            "budget {budget} / price {price} is not a share count"
        )));
    }
    Ok((whole as u64) / LOT_SIZE * LOT_SIZE)
}

/// Like [`lot_shares`], but a missing or unusable price buys nothing.
pub fn shares_or_zero(budget: f64, price: Option<f64>) -> u64 {
    let Some(price) = price else {
        return 0;
    };
    match lot_shares(budget, price) {
        Ok(n) => n,
        Err(err) => {
            tracing::debug!(error = %err, "allocating 0 shares");
            0
        }
    }
}

/// Joins selected reports against quotes and sizes each position.
///
/// The batch is priced on latest price only if every row has one. A single row without
/// a latest price (no quote book, no matching quote, or a blank field) reprices the
/// whole batch on previous close.
pub fn allocate(
    selected: &[ReportRecord],
    quotes: Option<&QuoteBook>,
    budget_per_stock: f64,
) -> AllocationPlan {
    let mut rows: Vec<AllocationRow> = selected
        .iter()
        .map(|r| {
            let quote = quotes.and_then(|q| q.get(strip_exchange_prefix(&r.stock_code)));
            AllocationRow {
                code: r.stock_code.clone(),
                name: r.stock_name.clone(),
                report_count: r.report_count,
                latest_price: quote.and_then(|q| q.latest_price),
                previous_close: quote.and_then(|q| q.previous_close),
                shares: 0,
            }
        })
        .collect();

    let basis = match latest_price_shares(&rows, quotes.is_some(), budget_per_stock) {
        Ok(shares) => {
            for (row, n) in rows.iter_mut().zip(shares) {
                row.shares = n;
            }
            PriceBasis::Latest
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                "latest price unavailable; pricing batch on previous close"
            );
            for row in rows.iter_mut() {
                row.shares = shares_or_zero(budget_per_stock, row.previous_close);
            }
            PriceBasis::PreviousClose
        }
    };

    AllocationPlan {
        basis,
        budget_per_stock,
        rows,
    }
}

fn latest_price_shares(
    rows: &[AllocationRow],
    have_quotes: bool,
    budget: f64,
) -> Result<Vec<u64>, PickError> {
    if !have_quotes {
        return Err(PickError::QuoteUnavailable("no quote snapshot".to_string()));
    }
    rows.iter()
        .map(|row| {
            let price = row.latest_price.ok_or_else(|| {
                PickError::QuoteUnavailable(format!("no latest price for {}", row.code))
            })?;
            Ok(shares_or_zero(budget, Some(price)))
        })
        .collect()
}
