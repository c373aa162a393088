//! Fatal error types
//!
//! Everything a parse run can recover from is recorded as a
//! [`Diagnostic`](crate::diagnostics::Diagnostic) instead. The types here stop
//! the run: the source could not be tokenized, or one of the bounded tables
//! ran out of room.

use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use std::fmt;

/// Which bounded table was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Symbols,
    Scopes,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Symbols => write!(f, "too many symbols"),
            Table::Scopes => write!(f, "too many scopes"),
        }
    }
}

/// The symbol or scope table is full
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{table} (limit is {limit})")]
pub struct CapacityError {
    pub table: Table,
    pub limit: usize,
}

/// Unrecoverable failure of a parse run
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Capacity exceeded at {location}: {source}")]
    Capacity {
        source: CapacityError,
        location: SourceLocation,
    },
}
