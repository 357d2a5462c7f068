//! Time-bounded session calls

use crate::session::SessionError;
use std::time::{Duration, Instant};

/// Why a bounded call did not produce a usable result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoFailure {
    Session(SessionError),
    /// The call returned, but only after its bound had passed
    Timeout {
        op: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },
}

impl std::fmt::Display for IoFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoFailure::Session(err) => write!(f, "{}", err),
            IoFailure::Timeout {
                op,
                elapsed_ms,
                limit_ms,
            } => write!(f, "{} took {}ms, limit {}ms", op, elapsed_ms, limit_ms),
        }
    }
}

/// Run a session call and check its duration afterwards
///
/// Sessions are synchronous and cannot be interrupted, so an overrun is
/// detected once the call returns. The result of an overrunning call is
/// discarded.
pub fn bounded<T>(
    op: &str,
    limit: Duration,
    call: impl FnOnce() -> Result<T, SessionError>,
) -> Result<T, IoFailure> {
    let started = Instant::now();
    let result = call();
    let elapsed = started.elapsed();
    if elapsed > limit {
        return Err(IoFailure::Timeout {
            op: op.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            limit_ms: limit.as_millis() as u64,
        });
    }
    result.map_err(IoFailure::Session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_call_passes_through() {
        let result = bounded("read_sheet", Duration::from_secs(5), || Ok::<_, SessionError>(7));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn test_session_error_wrapped() {
        let result: Result<(), _> = bounded("read_sheet", Duration::from_secs(5), || {
            Err(SessionError::Transient {
                message: "busy".to_string(),
            })
        });
        assert!(matches!(result, Err(IoFailure::Session(SessionError::Transient { .. }))));
    }

    #[test]
    fn test_overrun_becomes_timeout() {
        let result = bounded("write_sheet", Duration::from_millis(1), || {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, SessionError>(())
        });
        assert!(matches!(result, Err(IoFailure::Timeout { limit_ms: 1, .. })));
    }
}
