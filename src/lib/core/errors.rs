use anyhow::Error;
use std::io;

/// Returns `true` if the error originated from a broken pipe.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
            .unwrap_or(false)
            || matches!(
                cause.downcast_ref::<crate::core::error::TriageError>(),
                Some(crate::core::error::TriageError::Io(io_err))
                    if io_err.kind() == io::ErrorKind::BrokenPipe
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TriageError;

    #[test]
    fn detects_wrapped_broken_pipe() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let err = Error::from(TriageError::Io(io_err)).context("writing report");
        assert!(is_broken_pipe(&err));
    }

    #[test]
    fn ignores_other_errors() {
        let err = Error::msg("boom");
        assert!(!is_broken_pipe(&err));
    }
}
