//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, its configuration and the
//! helper methods every grammar production shares.
//!
//! # Parser Architecture
//!
//! - This module: Parser struct, options, token helpers, scope and symbol helpers
//! - `declarations`: program, classes, structs, variables, functions, blocks
//! - `statements`: if/while/break/continue, assignments, calls, return
//! - `expressions`: arithmetic and boolean expressions, lvalues, constants
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::constants::{MAX_SCOPE_ENTRIES, MAX_SYMBOL_ENTRIES};
use crate::diagnostics::DiagnosticKind;
use crate::error::{CapacityError, Error};
use crate::parser::ast::{NodeId, SourceLocation};
use crate::parser::lexer::{Symbol, Token, TokenSource, TokenStream};
use crate::session::Session;
use crate::symbols::{StorageClass, SymbolError, SymbolId, SymbolTable};
use crate::types::TypeId;

/// Entry grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Dialect {
    /// `program := block`
    Block,
    /// `program := classdecl+`
    #[default]
    Program,
}

impl Dialect {
    /// Whether `+`/`-` directly before a digit belongs to the literal
    pub fn signed_literals(self) -> bool {
        self == Dialect::Block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub dialect: Dialect,
    pub max_symbols: usize,
    pub max_scopes: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            max_symbols: MAX_SYMBOL_ENTRIES,
            max_scopes: MAX_SCOPE_ENTRIES,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_symbols(mut self, limit: usize) -> Self {
        self.max_symbols = limit;
        self
    }

    pub fn with_max_scopes(mut self, limit: usize) -> Self {
        self.max_scopes = limit;
        self
    }
}

/// Recursive descent parser for both tinyj dialects
pub struct Parser {
    pub(crate) tokens: Box<dyn TokenSource>,
    pub(crate) session: Session,
    pub(crate) options: ParseOptions,
    /// Lexically inside a `while` body
    pub(crate) in_loop: bool,
    /// Function whose body is being parsed
    pub(crate) current_function: Option<SymbolId>,
    /// Functions of the class being parsed, in declaration order
    pub(crate) class_functions: Vec<SymbolId>,
}

impl Parser {
    /// Tokenize `source` for the configured dialect
    pub fn new(source: &str, options: ParseOptions) -> Result<Self, Error> {
        let tokens = TokenStream::from_source(source, options.dialect.signed_literals())?;
        Ok(Self::from_tokens(tokens, options))
    }

    pub fn from_tokens(tokens: impl TokenSource + 'static, options: ParseOptions) -> Self {
        let symbols = SymbolTable::with_limits(options.max_symbols, options.max_scopes);
        Self {
            tokens: Box::new(tokens),
            session: Session::new(symbols),
            options,
            in_loop: false,
            current_function: None,
            class_functions: Vec::new(),
        }
    }

    /// Parse the whole input and return the root node.
    ///
    /// Recoverable errors are collected in the session's diagnostics; the
    /// returned tree is then best-effort.
    pub fn parse(&mut self) -> Result<NodeId, Error> {
        let root = self.program()?;
        log::debug!(
            "parsed {} nodes, {} symbols, {} diagnostics",
            self.session.ast.len(),
            self.session.symbols.len(),
            self.session.diagnostics.len()
        );
        Ok(root)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    // ===== Token helpers =====

    pub(crate) fn current(&self) -> &Token {
        self.tokens.current()
    }

    pub(crate) fn symbol(&self) -> Symbol {
        self.tokens.current().symbol
    }

    pub(crate) fn location(&self) -> SourceLocation {
        self.tokens.current().location
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.tokens.advance()
    }

    /// Class match against the lookahead
    pub(crate) fn check(&self, symbol: Symbol) -> bool {
        self.symbol().same_class(&symbol)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.symbol() == Symbol::Eof
    }

    /// Consume `symbol` if it is the lookahead, otherwise report `message`
    pub(crate) fn expect(&mut self, symbol: Symbol, message: &str) -> bool {
        if self.check(symbol) {
            self.advance();
            true
        } else {
            self.error(message);
            false
        }
    }

    pub(crate) fn skip_until(&mut self, stop: &[Symbol]) {
        self.tokens.skip_until(stop);
    }

    /// Skip to the next `;` and consume it. Stops short of a `}` or `class`
    /// so the enclosing block or class can still close.
    pub(crate) fn skip_statement(&mut self) {
        self.skip_until(&[Symbol::Semicolon, Symbol::RBrace, Symbol::Class]);
        if self.check(Symbol::Semicolon) {
            self.advance();
        }
    }

    // ===== Diagnostics =====

    /// Syntax error at the lookahead
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let location = self.location();
        let message = format!("{} (found {})", message.into(), self.current());
        self.session.diagnostics.syntax(message, location);
    }

    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: SourceLocation,
    ) {
        self.session.diagnostics.report(kind, message, location);
    }

    pub(crate) fn capacity(&self, source: CapacityError) -> Error {
        Error::Capacity {
            source,
            location: self.location(),
        }
    }

    // ===== Scope and symbol helpers =====

    /// Run `body` inside a fresh scope. The scope is closed on every path out.
    pub(crate) fn in_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.session
            .symbols
            .enter_scope()
            .map_err(|err| self.capacity(err))?;
        let result = body(self);
        self.session.symbols.leave_scope();
        result
    }

    /// Run `body` with the loop flag set to `in_loop`, restoring it afterwards
    pub(crate) fn with_loop<T>(
        &mut self,
        in_loop: bool,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = std::mem::replace(&mut self.in_loop, in_loop);
        let result = body(self);
        self.in_loop = saved;
        result
    }

    /// Insert a declaration into the current scope. A duplicate is reported
    /// and yields `None`; table exhaustion is fatal.
    pub(crate) fn declare(
        &mut self,
        name: &str,
        ty: Option<TypeId>,
        class: StorageClass,
        value: i64,
        location: SourceLocation,
    ) -> Result<Option<SymbolId>, Error> {
        let session = &mut self.session;
        match session
            .symbols
            .insert(name, ty, class, value, &session.types)
        {
            Ok(id) => Ok(Some(id)),
            Err(SymbolError::Duplicate { existing }) => {
                let first = session.symbols.entry(existing).location;
                log::debug!("'{}' collides with {:?} ({:?})", name, existing, first);
                self.report(
                    DiagnosticKind::Redeclaration,
                    format!("'{}' is already declared in this scope", name),
                    location,
                );
                Ok(None)
            }
            Err(SymbolError::Capacity(err)) => Err(self.capacity(err)),
        }
    }

    /// Type of a symbol entry
    pub(crate) fn symbol_type(&self, id: SymbolId) -> Option<TypeId> {
        self.session.symbols.entry(id).ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::NodeKind;

    fn parse_block(source: &str) -> (Session, NodeId) {
        let options = ParseOptions::new().with_dialect(Dialect::Block);
        let mut parser = Parser::new(source, options).unwrap();
        let root = parser.parse().unwrap();
        (parser.into_session(), root)
    }

    #[test]
    fn test_options_builder() {
        let options = ParseOptions::new()
            .with_dialect(Dialect::Block)
            .with_max_symbols(5)
            .with_max_scopes(2);
        assert_eq!(options.dialect, Dialect::Block);
        assert_eq!(options.max_symbols, 5);
        assert_eq!(options.max_scopes, 2);
        assert_eq!(ParseOptions::default().dialect, Dialect::Program);
    }

    #[test]
    fn test_empty_block() {
        let (session, root) = parse_block("{ }");
        assert!(session.diagnostics.is_empty());
        assert!(matches!(session.ast.kind(root), NodeKind::Block { .. }));
        assert_eq!(session.ast.render(root), "(block (vardecls) (stmts))");
    }

    #[test]
    fn test_scopes_are_closed_after_errors() {
        let (session, _) = parse_block("{ int x; { int y; y = ; } }");
        assert!(!session.diagnostics.is_empty());
        assert_eq!(session.symbols.depth(), 0);
        assert_eq!(session.symbols.lookup_all("x"), None);
        assert_eq!(session.symbols.lookup_all("y"), None);
    }

    #[test]
    fn test_scope_capacity_is_fatal() {
        let options = ParseOptions::new()
            .with_dialect(Dialect::Block)
            .with_max_scopes(2);
        let mut parser = Parser::new("{ { { } } }", options).unwrap();
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
    }

    #[test]
    fn test_symbol_capacity_is_fatal() {
        let options = ParseOptions::new()
            .with_dialect(Dialect::Block)
            .with_max_symbols(2);
        let mut parser = Parser::new("{ int a, b, c; }", options).unwrap();
        assert!(matches!(parser.parse(), Err(Error::Capacity { .. })));
    }

    #[test]
    fn test_lex_error_is_fatal() {
        let result = Parser::new("{ int x; x = 1 # 2; }", ParseOptions::new());
        assert!(matches!(result, Err(Error::Lex(_))));
    }
}
