//! A-share code normalization.
//!
//! Report records carry bare six-digit codes; downstream keys use the exchange-prefixed
//! form (`sh600000`, `sz000001`). Quote snapshots stay keyed by the bare code, so the join
//! in allocation goes back through [`strip_exchange_prefix`].

const SHANGHAI: &str = "sh";
const SHENZHEN: &str = "sz";

/// Prefixes a bare code with its exchange. Codes matching no rule come back unchanged.
pub fn normalize(code: &str) -> String {
    if code.starts_with('6') || code.starts_with("900") {
        format!("{SHANGHAI}{code}")
    } else if code.starts_with("00") || code.starts_with("30") || code.starts_with("200") {
        format!("{SHENZHEN}{code}")
    } else {
        code.to_string()
    }
}

pub fn strip_exchange_prefix(code: &str) -> &str {
    code.strip_prefix(SHANGHAI)
        .or_else(|| code.strip_prefix(SHENZHEN))
        .unwrap_or(code)
}
