use crate::error::PickError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const CST_OFFSET_SECS: i32 = 8 * 3600;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date in China Standard Time (UTC+8).
pub fn china_today(now_utc: DateTime<Utc>) -> NaiveDate {
    // 8h is always a valid offset; fall back to UTC rather than fail.
    match FixedOffset::east_opt(CST_OFFSET_SECS) {
        Some(cst) => now_utc.with_timezone(&cst).date_naive(),
        None => now_utc.date_naive(),
    }
}

/// Inclusive report publish-date window; also the fetch memo key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Yesterday through today, China time.
    pub fn default_for(now_utc: DateTime<Utc>) -> Self {
        let end = china_today(now_utc);
        Self {
            begin: end - Duration::days(1),
            end,
        }
    }

    /// Validates `YYYY-MM-DD` inputs. A missing `end` means today (China time).
    pub fn parse(
        begin: &str,
        end: Option<&str>,
        now_utc: DateTime<Utc>,
    ) -> Result<Self, PickError> {
        let begin = parse_date("begin", begin)?;
        let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_date("end", s)?,
            None => china_today(now_utc),
        };
        Ok(Self { begin, end })
    }

    pub fn begin_str(&self) -> String {
        self.begin.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.begin, self.end)
    }
}

fn parse_date(which: &str, s: &str) -> Result<NaiveDate, PickError> {
    let s = s.trim();
    if s.split('-').count() != 3 {
        return Err(PickError::InvalidInput(format!(
            "{which} date must be YYYY-MM-DD (got {s:?})"
        )));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
        PickError::InvalidInput(format!("{which} date {s:?} is not a valid date: {e}"))
    })
}
