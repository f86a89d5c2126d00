//! Construction-time errors
//!
//! The simulator is a trusted environment: once a design is elaborated and
//! running, malformed input can no longer occur and internal invariant
//! violations panic. Everything that can go wrong while *building* a design
//! (bad symbols coming from the host front-end, trace-file I/O) surfaces as
//! a `SimError` instead.

use std::fmt;
use std::io;
use volt_core::value::InvalidBitSymbol;

#[derive(Debug)]
pub enum SimError {
    /// An edge name other than `anyedge`, `posedge` or `negedge`.
    InvalidEdge(String),
    /// An operator symbol the IR does not know.
    InvalidOperator(String),
    /// A time unit name other than `s`, `ms`, `us`, `ns` or `ps`.
    InvalidTimeUnit(String),
    /// A bit-string literal with a symbol outside the four-state alphabet.
    InvalidBitString(InvalidBitSymbol),
    /// A port name that matches no registered signal.
    UnknownPort(String),
    /// Trace-file creation or write failure.
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidEdge(name) => write!(f, "invalid edge '{name}'"),
            SimError::InvalidOperator(sym) => write!(f, "invalid operator '{sym}'"),
            SimError::InvalidTimeUnit(name) => write!(f, "invalid time unit '{name}'"),
            SimError::InvalidBitString(e) => write!(f, "invalid bit-string literal: {e}"),
            SimError::UnknownPort(name) => write!(f, "unknown port '{name}'"),
            SimError::Io(e) => write!(f, "trace output error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::InvalidBitString(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<InvalidBitSymbol> for SimError {
    fn from(e: InvalidBitSymbol) -> Self {
        SimError::InvalidBitString(e)
    }
}
