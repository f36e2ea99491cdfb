use thiserror::Error;

// ── Fetch failures ────────────────────────────────────────────────────────────

/// Network-level failures. All of these are recoverable: the facade turns
/// them into "no record" while the counters keep the distinction.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::ConnectionFailed(err.to_string())
        }
    }

    /// Transient failures worth another attempt. Client errors other than
    /// 429 mean the request itself is wrong and retrying won't help.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::ConnectionFailed(_) => true,
            FetchError::HttpStatus(code) => *code == 429 || *code >= 500,
        }
    }
}

// ── Parse failures ────────────────────────────────────────────────────────────

/// Page-level failures. Field-level gaps are never errors; they degrade to
/// defaults in the normalizer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The site's "no such player" page. The expected miss, not a fault.
    #[error("no such player")]
    NotFound,

    /// The page is neither a profile nor the not-found page. Usually means
    /// the upstream layout drifted.
    #[error("page does not look like a player profile")]
    UnrecognizedPage,
}

// ── Umbrella ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ScrapeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::Parse(ParseError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::ConnectionFailed("refused".into()).is_retryable());
        assert!(FetchError::HttpStatus(429).is_retryable());
        assert!(FetchError::HttpStatus(503).is_retryable());
        assert!(!FetchError::HttpStatus(404).is_retryable());
        assert!(!FetchError::HttpStatus(403).is_retryable());
    }

    #[test]
    fn not_found_is_a_parse_outcome() {
        let err = ScrapeError::from(ParseError::NotFound);
        assert!(err.is_not_found());
        assert!(!ScrapeError::from(FetchError::Timeout).is_not_found());
    }
}
