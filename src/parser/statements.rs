//! Statement parsing implementation
//!
//! # Grammar
//!
//! ```text
//! stmt     ::= ifstmt | whilestmt | BREAK ';' | CONTINUE ';' | block
//!            | RETURN expr? ';'
//!            | asnstmt ';'                      (block dialect)
//!            | ID (asnop expr | exprs asnop expr | '(' argrefs ')') ';'   (program dialect)
//! asnstmt  ::= expr (asnop expr)?
//! ifstmt   ::= IF '(' bexpr ')' stmt (ELSE stmt)?
//! ```
//!
//! `else` binds to the nearest unmatched `if` because the inner `if`
//! consumes it first. `break` and `continue` are only legal lexically inside
//! a `while` body; `if` and nested blocks inherit that context, function
//! bodies reset it.

use crate::diagnostics::DiagnosticKind;
use crate::error::Error;
use crate::parser::ast::*;
use crate::parser::lexer::Symbol;
use crate::parser::parse::{Dialect, Parser};
use crate::symbols::{StorageClass, SymbolId};
use crate::types::TypeId;

impl Parser {
    fn starts_statement(&self) -> bool {
        match self.symbol() {
            Symbol::Ident
            | Symbol::If
            | Symbol::While
            | Symbol::Break
            | Symbol::Continue
            | Symbol::Return
            | Symbol::LBrace => true,
            Symbol::Dup(_)
            | Symbol::LParen
            | Symbol::IntLit
            | Symbol::CharLit
            | Symbol::FloatLit
            | Symbol::StringLit => self.dialect() == Dialect::Block,
            _ => false,
        }
    }

    /// Statements up to the closing `}`. A token that cannot start a
    /// statement is reported and skipped with the rest of its statement.
    pub(crate) fn stmts(&mut self) -> Result<NodeId, Error> {
        let list = self.session.ast.new_list(ListKind::Stmts, self.location());
        while !matches!(self.symbol(), Symbol::RBrace | Symbol::Class | Symbol::Eof) {
            if let Some(stmt) = self.stmt()? {
                self.session.ast.append(list, stmt);
            }
        }
        Ok(list)
    }

    /// One statement; `None` for statements that were reported and dropped
    pub(crate) fn stmt(&mut self) -> Result<Option<NodeId>, Error> {
        match self.symbol() {
            Symbol::If => self.if_stmt().map(Some),
            Symbol::While => self.while_stmt().map(Some),
            Symbol::Break => Ok(self.jump_stmt(NodeKind::Break, "break")),
            Symbol::Continue => Ok(self.jump_stmt(NodeKind::Continue, "continue")),
            Symbol::LBrace => self.block().map(Some),
            Symbol::Return => self.return_stmt().map(Some),
            Symbol::Ident if self.dialect() == Dialect::Program => self.name_stmt(),
            _ if self.starts_statement() => self.asn_stmt(),
            _ => {
                self.error("expected statement");
                self.skip_statement();
                Ok(None)
            }
        }
    }

    fn if_stmt(&mut self) -> Result<NodeId, Error> {
        let location = self.advance().location;
        self.expect(Symbol::LParen, "expected (");
        let cond = self.bexpr()?;
        self.expect(Symbol::RParen, "expected )");

        let zero = self.session.zero();
        let then_branch = self.stmt()?.unwrap_or(zero);
        let else_branch = if self.check(Symbol::Else) {
            self.advance();
            Some(self.stmt()?.unwrap_or(zero))
        } else {
            None
        };

        Ok(self.session.ast.add(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            location,
        ))
    }

    fn while_stmt(&mut self) -> Result<NodeId, Error> {
        let location = self.advance().location;
        self.expect(Symbol::LParen, "expected (");
        let cond = self.bexpr()?;
        self.expect(Symbol::RParen, "expected )");

        let zero = self.session.zero();
        let body = self.with_loop(true, |p| p.stmt())?.unwrap_or(zero);
        Ok(self.session.ast.add(NodeKind::While { cond, body }, location))
    }

    fn jump_stmt(&mut self, kind: NodeKind, keyword: &str) -> Option<NodeId> {
        let location = self.advance().location;
        if !self.in_loop {
            self.session.diagnostics.syntax(
                format!("{} is allowed inside while stmt only", keyword),
                location,
            );
            if self.check(Symbol::Semicolon) {
                self.advance();
            }
            return None;
        }
        let node = self.session.ast.add(kind, location);
        self.expect(Symbol::Semicolon, "expected ;");
        Some(node)
    }

    fn return_stmt(&mut self) -> Result<NodeId, Error> {
        let location = self.advance().location;
        let value = if self.check(Symbol::Semicolon) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(Symbol::Semicolon, "expected ;");

        match self.current_function {
            None => self
                .session
                .diagnostics
                .syntax("return is allowed inside a function only", location),
            Some(func) => self.check_return(func, value, location),
        }
        Ok(self.session.ast.add(NodeKind::Return { value }, location))
    }

    fn check_return(&mut self, func: SymbolId, value: Option<NodeId>, location: SourceLocation) {
        let Some(ret) = self
            .symbol_type(func)
            .and_then(|t| self.session.types.function_return(t))
        else {
            return;
        };
        let is_void = ret == self.session.types.void();
        match value {
            Some(_) if is_void => self.report(
                DiagnosticKind::TypeMismatch,
                "void function cannot return a value",
                location,
            ),
            Some(value) => {
                if let Some(ty) = self.session.type_of(value) {
                    if !self.session.types.equal(ty, ret) {
                        let message = format!(
                            "return value has type {}, expected {}",
                            self.session.types.display(ty),
                            self.session.types.display(ret)
                        );
                        self.report(DiagnosticKind::TypeMismatch, message, location);
                    }
                }
            }
            None if !is_void => self.report(
                DiagnosticKind::TypeMismatch,
                format!("missing return value of type {}", self.session.types.display(ret)),
                location,
            ),
            None => {}
        }
    }

    /// Block dialect: parse an expression, then decide between an
    /// expression statement and an assignment.
    fn asn_stmt(&mut self) -> Result<Option<NodeId>, Error> {
        let lhs = self.expr()?;
        match self.symbol() {
            Symbol::Semicolon => {
                self.advance();
                Ok(Some(lhs))
            }
            Symbol::Assign(op) => {
                if !self.session.ast.kind(lhs).is_lvalue() {
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        "Left hand side of the assignment must be a variable or an array element",
                        self.session.ast.location(lhs),
                    );
                }
                let node = self.assignment(op, lhs)?;
                self.expect(Symbol::Semicolon, "expected ;");
                Ok(Some(node))
            }
            _ => {
                self.error("asnop expected or missing ';'");
                self.skip_statement();
                Ok(Some(lhs))
            }
        }
    }

    /// `asnop expr` with the target already parsed
    fn assignment(&mut self, op: AssignOp, target: NodeId) -> Result<NodeId, Error> {
        let location = self.advance().location;
        let value = self.expr()?;
        if !self.session.equal_node_types(target, value) {
            self.report(DiagnosticKind::TypeMismatch, "Type mismatched", location);
        }
        Ok(self
            .session
            .ast
            .add(NodeKind::Assign { op, target, value }, location))
    }

    /// Program dialect statement starting with a name: assignment or call
    fn name_stmt(&mut self) -> Result<Option<NodeId>, Error> {
        let token = self.advance();
        let name = self.session.ast.add(
            NodeKind::Name {
                name: token.text.clone(),
            },
            token.location,
        );
        let symbol = self.session.symbols.lookup_all(&token.text);
        if symbol.is_none() && !self.check(Symbol::LParen) {
            self.report(
                DiagnosticKind::UndefinedReference,
                format!("Undefined symbol '{}'", token.text),
                token.location,
            );
        }

        let stmt = match self.symbol() {
            Symbol::Assign(_) | Symbol::LBracket => {
                let var_ref = self.session.ast.reclassify(
                    name,
                    NodeKind::VarRef {
                        name: token.text,
                        symbol,
                    },
                );
                let target = if self.check(Symbol::LBracket) {
                    let location = self.location();
                    let indices = self.exprs()?;
                    self.indexed(var_ref, indices, location)
                } else {
                    var_ref
                };
                match self.symbol() {
                    Symbol::Assign(op) => self.assignment(op, target)?,
                    _ => {
                        self.error("expected ASNOP");
                        self.skip_statement();
                        return Ok(None);
                    }
                }
            }
            Symbol::LParen => self.call(name, token.text)?,
            _ => {
                self.error("expected ASNOP or Funcall");
                self.skip_statement();
                return Ok(None);
            }
        };
        self.expect(Symbol::Semicolon, "expected ;");
        Ok(Some(stmt))
    }

    /// `'(' argrefs ')'` after a callee name; resolves the overload
    pub(crate) fn call(&mut self, name: NodeId, text: String) -> Result<NodeId, Error> {
        let location = self.session.ast.location(name);
        self.advance();
        let args = self.arg_refs()?;
        self.expect(Symbol::RParen, "expected )");

        let mut arg_types = Vec::new();
        let mut known = true;
        for arg in self.session.ast.items(args).to_vec() {
            match self.session.type_of(arg) {
                Some(ty) => arg_types.push(ty),
                None => known = false,
            }
        }

        let symbol = self.resolve_function(&text, &arg_types, known, location);
        let callee = self
            .session
            .ast
            .reclassify(name, NodeKind::FuncRef { name: text, symbol });
        Ok(self.session.ast.add(NodeKind::Call { callee, args }, location))
    }

    /// Class declaration order first, then every open scope. Without known
    /// argument types the first function of that name is taken unchecked.
    fn resolve_function(
        &mut self,
        name: &str,
        arg_types: &[TypeId],
        known: bool,
        location: SourceLocation,
    ) -> Option<SymbolId> {
        let symbols = &self.session.symbols;
        let types = &self.session.types;
        let Some(named) = symbols.lookup_all(name) else {
            self.report(
                DiagnosticKind::UndefinedReference,
                format!("Undefined function '{}'", name),
                location,
            );
            return None;
        };

        if symbols.entry(named).class != StorageClass::LocalFunc {
            self.report(
                DiagnosticKind::TypeMismatch,
                format!("'{}' is not a function", name),
                location,
            );
            return None;
        }
        if !known {
            return Some(named);
        }

        let resolved = self
            .class_functions
            .iter()
            .copied()
            .find(|&f| symbols.entry(f).name == name && symbols.accepts(f, arg_types, types))
            .or_else(|| symbols.lookup_function_all(name, arg_types, types));
        if resolved.is_none() {
            let shown: Vec<String> = arg_types
                .iter()
                .map(|&t| types.display(t).to_string())
                .collect();
            self.report(
                DiagnosticKind::TypeMismatch,
                format!("no function '{}' accepts ({})", name, shown.join(", ")),
                location,
            );
        }
        resolved
    }

    fn arg_refs(&mut self) -> Result<NodeId, Error> {
        let list = self.session.ast.new_list(ListKind::Args, self.location());
        while !self.check(Symbol::RParen) && !self.is_at_end() {
            let location = self.location();
            let expr = self.expr()?;
            let arg = self.session.ast.add(NodeKind::Arg { expr }, location);
            self.session.ast.append(list, arg);

            if self.check(Symbol::Comma) {
                self.advance();
            } else if !self.check(Symbol::RParen) {
                self.error("expected , or )");
                self.skip_until(&[
                    Symbol::Semicolon,
                    Symbol::RParen,
                    Symbol::Ari(AriOp::Add),
                ]);
                break;
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticKind;
    use crate::parser::parse::{Dialect, ParseOptions, Parser};
    use crate::session::Session;

    fn parse(source: &str, dialect: Dialect) -> (Session, String) {
        let mut parser = Parser::new(source, ParseOptions::new().with_dialect(dialect)).unwrap();
        let root = parser.parse().unwrap();
        let session = parser.into_session();
        let rendered = session.ast.render(root);
        (session, rendered)
    }

    fn block(source: &str) -> (Session, String) {
        parse(source, Dialect::Block)
    }

    #[test]
    fn test_while_with_break_and_continue() {
        let (session, ast) = block("{ int i; while (i < 10) { i += 1; if (i == 5) break; continue; } }");
        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
        assert!(ast.contains("(while (< i 10) (block (vardecls) (stmts (+= i 1) (if (== i 5) (break)) (continue))))"));
    }

    #[test]
    fn test_break_in_nested_block_inside_while() {
        let (session, _) = block("{ int i; while (true) { { break; } } }");
        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    }

    #[test]
    fn test_continue_outside_loop_is_dropped() {
        let (session, ast) = block("{ int i; continue; i = 1; }");
        assert_eq!(session.diagnostics.len(), 1);
        assert_eq!(ast, "(block (vardecls (vardecl (vars i))) (stmts (= i 1)))");
    }

    #[test]
    fn test_expression_statement() {
        let (session, ast) = block("{ int i; i++; }");
        assert!(session.diagnostics.is_empty());
        assert!(ast.contains("(stmts (post++ i))"));
    }

    #[test]
    fn test_assignment_to_non_lvalue() {
        let (session, _) = block("{ int i; i + 1 = 2; }");
        assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let (session, _) = block("{ int i; float f; i = f; i = 'c'; }");
        assert_eq!(session.diagnostics.len(), 1);
        assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
    }

    #[test]
    fn test_program_call_resolves_overload() {
        let source = "class A { \
                      void f(int a) { } \
                      void f(float a) { } \
                      void main() { f(1); f(2.5); f(1, 2); } }";
        let (session, ast) = parse(source, Dialect::Program);
        assert_eq!(session.diagnostics.len(), 1, "{:?}", session.diagnostics);
        assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 1);
        assert!(ast.contains("(call f (args 1))"));
    }

    #[test]
    fn test_program_undefined_symbol() {
        let (session, _) = parse("class A { void main() { x = 1; } }", Dialect::Program);
        assert_eq!(session.diagnostics.count(DiagnosticKind::UndefinedReference), 1);
    }

    #[test]
    fn test_program_indexed_assignment() {
        let source = "class A { int[4] v; void main() { v[2] = 7; } }";
        let (session, ast) = parse(source, Dialect::Program);
        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
        assert!(ast.contains("(= (index v (exprs 2)) 7)"));
    }

    #[test]
    fn test_return_checks() {
        let source = "class A { \
                      int f() { return 1; } \
                      int g() { return 1.5; } \
                      void h() { return 2; } \
                      int k() { return; } }";
        let (session, _) = parse(source, Dialect::Program);
        assert_eq!(session.diagnostics.count(DiagnosticKind::TypeMismatch), 3);
        assert_eq!(session.diagnostics.len(), 3);
    }

    #[test]
    fn test_return_outside_function() {
        let (session, _) = block("{ return; }");
        assert_eq!(session.diagnostics.count(DiagnosticKind::Syntax), 1);
    }

    #[test]
    fn test_recursive_call_resolves() {
        let source = "class A { int f(int n) { f(n); return n; } }";
        let (session, _) = parse(source, Dialect::Program);
        assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics);
    }
}
