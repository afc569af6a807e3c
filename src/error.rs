//! Error types reported by the parser and by the transcendental functions.

use crate::float::Format;
use thiserror::Error;

/// Describes why a string could not be parsed as a floating point literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the input provided was empty")]
    Empty,
    #[error("unexpected character {found:?} at offset {offset}")]
    InvalidCharacter { offset: usize, found: char },
    #[error("the literal has no significand digits")]
    MissingDigits,
    #[error("failed parsing the exponent of the literal")]
    InvalidExponent,
}

/// Errors returned by operations that may not be able to produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloatError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// None of the working precisions allowed by the escalation policy
    /// produced a result that rounds the same way on both sides of the
    /// error bound.
    #[error(
        "{function} did not stabilize for {format} within {max_extra_bits} extra bits"
    )]
    PrecisionExhausted {
        function: &'static str,
        format: Format,
        max_extra_bits: u32,
    },
}
