use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TimeoutParseError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {duration:?}: {source}")]
    Invalid {
        duration: String,
        #[source]
        source: humantime::DurationError,
    },
}

/// Parse the `timeout` query parameter the API server appends to webhook
/// calls, e.g. `10s`, `1m30s` or `500ms`.
pub(crate) fn parse_timeout(value: &str) -> Result<Duration, TimeoutParseError> {
    match value {
        "" => Err(TimeoutParseError::Empty),
        // a bare zero is the only duration allowed without a unit
        "0" => Ok(Duration::ZERO),
        _ => humantime::parse_duration(value).map_err(|source| TimeoutParseError::Invalid {
            duration: value.to_owned(),
            source,
        }),
    }
}
