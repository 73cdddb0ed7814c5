use crate::domain::report::{ReportRecord, BUY_RATING};
use crate::error::PickError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    /// Keep only reports with this rating label. `None` keeps everything.
    pub rating: Option<String>,
    /// Order by trailing-month report count, highest first.
    pub rank_by_report_count: bool,
    pub limit: usize,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            rating: Some(BUY_RATING.to_string()),
            rank_by_report_count: true,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Filters, ranks and dedups reports down to at most `criteria.limit` distinct stocks.
///
/// The sort is stable, so among equal counts the fetch order decides which duplicate
/// of a stock survives.
pub fn select(
    reports: &[ReportRecord],
    criteria: &SelectionCriteria,
) -> Result<Vec<ReportRecord>, PickError> {
    if criteria.limit < 1 {
        return Err(PickError::InvalidInput(format!(
            "selection size must be >= 1 (got {})",
            criteria.limit
        )));
    }

    let mut kept: Vec<&ReportRecord> = match criteria.rating.as_deref() {
        Some(rating) => reports.iter().filter(|r| r.is_rated(rating)).collect(),
        None => reports.iter().collect(),
    };

    if criteria.rank_by_report_count {
        kept.sort_by(|a, b| b.report_count.cmp(&a.report_count));
    }

    let mut seen = HashSet::<String>::new();
    let out: Vec<ReportRecord> = kept
        .into_iter()
        .filter(|r| seen.insert(r.stock_code.clone()))
        .take(criteria.limit)
        .cloned()
        .collect();

    tracing::debug!(
        input = reports.len(),
        selected = out.len(),
        rating = ?criteria.rating,
        rank = criteria.rank_by_report_count,
        "selected reports"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::testing::report;

    fn codes(rs: &[ReportRecord]) -> Vec<&str> {
        rs.iter().map(|r| r.stock_code.as_str()).collect()
    }

    #[test]
    fn filters_ranks_dedups_and_truncates() {
        let reports = vec![
            report("sh600000", BUY_RATING, 3),
            report("sz000001", "增持", 20),
            report("sz300750", BUY_RATING, 8),
            report("sh600000", BUY_RATING, 3),
            report("sh601318", BUY_RATING, 5),
            report("sz300750", BUY_RATING, 8),
        ];
        let criteria = SelectionCriteria {
            limit: 2,
            ..Default::default()
        };

        let out = select(&reports, &criteria).unwrap();
        assert_eq!(codes(&out), ["sz300750", "sh601318"]);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let mut first = report("sh600000", BUY_RATING, 5);
        first.title = "first".to_string();
        let mut second = report("sh600000", BUY_RATING, 5);
        second.title = "second".to_string();
        let reports = vec![report("sz000002", BUY_RATING, 5), first, second];

        let out = select(&reports, &SelectionCriteria::default()).unwrap();
        assert_eq!(codes(&out), ["sz000002", "sh600000"]);
        assert_eq!(out[1].title, "first");
    }

    #[test]
    fn without_filter_or_rank_keeps_input_order() {
        let reports = vec![
            report("sz000001", "增持", 1),
            report("sh600000", BUY_RATING, 9),
            report("sz000001", BUY_RATING, 4),
        ];
        let criteria = SelectionCriteria {
            rating: None,
            rank_by_report_count: false,
            limit: 10,
        };

        let out = select(&reports, &criteria).unwrap();
        assert_eq!(codes(&out), ["sz000001", "sh600000"]);
        assert_eq!(out[0].rating, "增持");
    }

    #[test]
    fn rerunning_is_deterministic() {
        let reports: Vec<_> = (0..50)
            .map(|i| report(&format!("sh6000{:02}", i % 17), BUY_RATING, (i * 7 % 5) as u32))
            .collect();
        let criteria = SelectionCriteria::default();
        let a = select(&reports, &criteria).unwrap();
        let b = select(&reports, &criteria).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn zero_limit_is_invalid() {
        let criteria = SelectionCriteria {
            limit: 0,
            ..Default::default()
        };
        assert!(matches!(select(&[], &criteria), Err(PickError::InvalidInput(_))));
    }
}
