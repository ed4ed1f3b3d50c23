//! Error types raised while building conditions.
//!
//! The evaluator itself never returns an error: the `test_block` decision table is total over
//! its input lattice, so an implementation that falls through it has a bug, not a recoverable
//! failure — that case panics with a diagnostic rather than surfacing a `QueryError` variant.

use thiserror::Error;

/// Errors raised while parsing a [`crate::condition::Condition`] from its clause form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A clause referenced a field name that was never registered.
    #[error("unknown field `{0}` referenced in condition clause")]
    UnknownField(String),

    /// A clause could not be parsed: an unparseable pattern string, or a positional entry with
    /// no field to default to.
    #[error("bad condition: {0}")]
    BadCondition(String),
}
