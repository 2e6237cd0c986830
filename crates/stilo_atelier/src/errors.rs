//! Rewrite errors.
//!
//! The rewriter itself never fails on recognisable ineligibility; it skips.
//! The only error surfaced to the host is a parse failure, in which case
//! the file is left untransformed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    /// The file could not be parsed; it is reported and left untouched.
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = RewriteError::Parse {
            file: "app.tsx".into(),
            message: "unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse app.tsx: unexpected token"
        );
    }
}
