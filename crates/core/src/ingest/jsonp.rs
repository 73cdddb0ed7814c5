use anyhow::Context;
use serde::de::DeserializeOwned;

/// Returns the JSON payload inside a `callback(...)` wrapper.
///
/// Bare JSON (no wrapper) is passed through, so a server that ignores `cb` still decodes.
pub fn unwrap_jsonp(text: &str) -> Option<&str> {
    let trimmed = text.trim().trim_end_matches(';').trim_end();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trimmed);
    }

    let start = trimmed.find('(')?;
    let end = trimmed.rfind(')')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start + 1..end].trim())
}

pub fn decode_jsonp<T: DeserializeOwned>(text: &str) -> anyhow::Result<T> {
    let payload = unwrap_jsonp(text).with_context(|| {
        let head: String = text.chars().take(120).collect();
        format!("response is not JSONP: {head}")
    })?;
    serde_json::from_str::<T>(payload)
        .context("JSONP payload is not valid JSON for the expected shape")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn unwraps_callback() {
        let s = "datatable4263982({\"data\":[]})";
        assert_eq!(unwrap_jsonp(s), Some("{\"data\":[]}"));
    }

    #[test]
    fn tolerates_whitespace_and_semicolon() {
        let s = "  cb ( {\"a\":\"(x)\"} );\n";
        assert_eq!(unwrap_jsonp(s), Some("{\"a\":\"(x)\"}"));
    }

    #[test]
    fn passes_bare_json_through() {
        assert_eq!(unwrap_jsonp("{\"a\":1}"), Some("{\"a\":1}"));
    }

    #[test]
    fn rejects_unwrapped_garbage() {
        assert_eq!(unwrap_jsonp("<html>blocked</html>"), None);
        assert!(decode_jsonp::<Value>("<html>blocked</html>").is_err());
        assert!(decode_jsonp::<Value>("cb({not json})").is_err());
    }
}
