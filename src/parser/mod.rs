//! tinyj source parser
//!
//! One pass turns source text into a checked AST while filling the symbol
//! table and type arena of a [`Session`](crate::session::Session):
//! - [`lexer`]: tokenization and the [`TokenSource`](lexer::TokenSource) the parser reads
//! - [`ast`]: AST node definitions and the node arena
//! - [`parse`]: the [`Parser`](parse::Parser) struct, options and shared helpers
//! - `declarations`, `statements`, `expressions`: grammar productions
//!
//! # Dialects
//!
//! - [`Dialect::Block`](parse::Dialect::Block): `program := block`. Signs
//!   directly before a digit are lexed into the literal.
//! - [`Dialect::Program`](parse::Dialect::Program): `program := classdecl+`
//!   with structs, functions, calls and `return`.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with one token of lookahead. Recoverable
//! errors go to the session's diagnostics and parsing resumes at a
//! synchronization token; only capacity exhaustion stops a run.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
