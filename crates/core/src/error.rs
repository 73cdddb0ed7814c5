use thiserror::Error;

/// Failure kinds surfaced by the picking pipeline.
///
/// Only `InvalidInput`, `TransportOrParse` and `Notification` ever reach a caller;
/// `QuoteUnavailable` and `AllocationArithmetic` are recovered inside the allocation step
/// and exist so that the recovery paths can be logged and tested by kind.
#[derive(Debug, Error)]
pub enum PickError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("report fetch failed: {0:#}")]
    TransportOrParse(anyhow::Error),

    #[error("quotes unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("allocation arithmetic failed: {0}")]
    AllocationArithmetic(String),

    #[error("notification failed: {0:#}")]
    Notification(anyhow::Error),
}

impl PickError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::TransportOrParse(_) => "transport_or_parse",
            Self::QuoteUnavailable(_) => "quote_unavailable",
            Self::AllocationArithmetic(_) => "allocation_arithmetic",
            Self::Notification(_) => "notification",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_context_chain() {
        let err = PickError::TransportOrParse(
            anyhow::anyhow!("connection reset").context("report page 3 request failed"),
        );
        assert_eq!(
            err.to_string(),
            "report fetch failed: report page 3 request failed: connection reset"
        );
        assert_eq!(err.kind(), "transport_or_parse");
    }
}
