//! # Introduction
//!
//! tinyj is the one-pass front end of a compiler for a small class-based
//! imperative language. A recursive-descent parser builds the AST while it
//! resolves identifiers against a scoped symbol table, assigns stack-frame
//! storage to variables and arguments, and checks types structurally.
//! Syntax errors are recovered from, so one run reports as many problems as
//! it can find.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → TokenStream → Parser → (Ast, SymbolTable, TypeTable) + Diagnostics
//! ```
//!
//! 1. [`parser`]: tokenizer, AST arena and the grammar for both dialects.
//! 2. [`symbols`]: scope stack, declarations, lookup, storage locations.
//! 3. [`types`]: structural types, equality, sizes, and `type_of` over nodes.
//! 4. [`session`]: the context object owning all of the above for one run.
//! 5. [`diagnostics`]: positioned recoverable errors; [`error`] holds the
//!    fatal ones.
//!
//! ## Example
//!
//! ```
//! use tinyj::{Dialect, ParseOptions, Parser};
//!
//! let options = ParseOptions::new().with_dialect(Dialect::Block);
//! let mut parser = Parser::new("{ int x; x = 1; }", options).unwrap();
//! let root = parser.parse().unwrap();
//! let session = parser.into_session();
//!
//! assert!(session.diagnostics.is_empty());
//! assert_eq!(
//!     session.ast.render(root),
//!     "(block (vardecls (vardecl (vars x))) (stmts (= x 1)))"
//! );
//! ```

pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod session;
pub mod strings;
pub mod symbols;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::Error;
pub use parser::parse::{Dialect, ParseOptions, Parser};
pub use session::Session;
