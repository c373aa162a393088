//! Expression parsing implementation
//!
//! # Grammar
//!
//! ```text
//! expr   ::= term (('+' | '-') term)*
//! term   ::= factor (('*' | '/' | '%') factor)*
//! factor ::= DUPOP lval | lval DUPOP? | literal | '(' expr ')' | '*' factor
//!          | ('+' | '-') literal              (program dialect)
//!          | ID '(' argrefs ')'               (program dialect)
//! lval   ::= ID exprs?          exprs ::= ('[' expr ']')+
//! bexpr  ::= bsub ((LOGOP | RELOP) bsub)*
//! bsub   ::= TRUE | FALSE | '(' bexpr ')' | '!' bsub | expr (RELOP expr)?
//! ```
//!
//! In the block dialect `a+1` arrives as `ID<a> ILIT<+1>`; a signed literal
//! after a complete term is read as an implicit `+`.
//!
//! # Recovery
//!
//! - a token that can only follow a statement ends the expression; `expr`
//!   reports it as a probably missing `;`
//! - other unexpected tokens skip to `;` or an arithmetic operator
//! - a factor that cannot start skips to `;`, `)` or an arithmetic operator
//!   and yields the zero placeholder
//!
//! Dereference and indexing operands are type-checked once, as the node is
//! built, wherever the node ends up in the tree.

use crate::diagnostics::DiagnosticKind;
use crate::error::Error;
use crate::parser::ast::*;
use crate::parser::lexer::{Symbol, TokenValue};
use crate::parser::parse::{Dialect, Parser};
use crate::symbols::StorageClass;

/// Tokens that end an expression without being part of it
fn ends_expression(symbol: Symbol) -> bool {
    matches!(
        symbol,
        Symbol::Semicolon
            | Symbol::Comma
            | Symbol::RParen
            | Symbol::RBracket
            | Symbol::Assign(_)
            | Symbol::Rel(_)
            | Symbol::Log(_)
            | Symbol::Eof
    )
}

/// Tokens that may follow a statement, seen when its `;` is missing
fn follows_statement(symbol: Symbol) -> bool {
    symbol.is_prim_type()
        || matches!(
            symbol,
            Symbol::Ident
                | Symbol::If
                | Symbol::Else
                | Symbol::While
                | Symbol::Break
                | Symbol::Continue
                | Symbol::Return
                | Symbol::LBrace
                | Symbol::RBrace
        )
}

const ARITHMETIC: Symbol = Symbol::Ari(AriOp::Add);

impl Parser {
    pub(crate) fn expr(&mut self) -> Result<NodeId, Error> {
        if matches!(self.symbol(), Symbol::If | Symbol::Else) {
            return Ok(self.session.zero());
        }

        let mut lhs = self.term()?;
        loop {
            let symbol = self.symbol();
            if ends_expression(symbol) {
                break;
            }
            let location = self.location();
            let op = match symbol {
                Symbol::Ari(op @ (AriOp::Add | AriOp::Sub)) => {
                    self.advance();
                    op
                }
                Symbol::Ari(_) => {
                    self.error("expected + or -");
                    self.skip_until(&[Symbol::Semicolon]);
                    break;
                }
                s if s.is_literal() => {
                    if !self.current().is_signed_literal() {
                        self.error("expected + or -");
                    }
                    AriOp::Add
                }
                s if follows_statement(s) => {
                    self.error("perhaps missing ';'");
                    break;
                }
                _ => {
                    self.error("expected op");
                    self.skip_until(&[Symbol::Semicolon, ARITHMETIC]);
                    continue;
                }
            };

            let rhs = self.term()?;
            lhs = self.session.ast.add(
                NodeKind::Binary {
                    op: BinOp::Ari(op),
                    lhs,
                    rhs,
                },
                location,
            );
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<NodeId, Error> {
        let mut lhs = self.factor()?;
        loop {
            let symbol = self.symbol();
            if ends_expression(symbol) || symbol.is_literal() || follows_statement(symbol) {
                break;
            }
            let location = self.location();
            let op = match symbol {
                Symbol::Ari(AriOp::Add | AriOp::Sub) => break,
                Symbol::Ari(op) => {
                    self.advance();
                    op
                }
                Symbol::Dup(op) => {
                    self.error(format!(
                        "'{}' applies only to a variable or an array element",
                        op
                    ));
                    self.advance();
                    continue;
                }
                Symbol::LParen => {
                    self.error("perhaps missing * or /");
                    AriOp::Mul
                }
                _ => {
                    self.error("expected op");
                    self.skip_until(&[Symbol::Semicolon, ARITHMETIC]);
                    continue;
                }
            };

            let rhs = self.factor()?;
            lhs = self.session.ast.add(
                NodeKind::Binary {
                    op: BinOp::Ari(op),
                    lhs,
                    rhs,
                },
                location,
            );
        }
        Ok(lhs)
    }

    /// Always yields a node; the zero placeholder after an error
    fn factor(&mut self) -> Result<NodeId, Error> {
        let location = self.location();
        match self.symbol() {
            Symbol::Dup(op) => {
                self.advance();
                if !self.check(Symbol::Ident) {
                    self.error(format!(
                        "'{}' applies only to a variable or an array element",
                        op
                    ));
                    return Ok(self.session.zero());
                }
                let operand = self.lval()?;
                Ok(self.session.ast.add(
                    NodeKind::Prefix {
                        op: UnaryOp::Dup(op),
                        operand,
                    },
                    location,
                ))
            }
            Symbol::Ident => {
                if self.dialect() == Dialect::Program {
                    let token = self.advance();
                    if self.check(Symbol::LParen) {
                        let name = self
                            .session
                            .ast
                            .add(NodeKind::Name { name: token.text.clone() }, location);
                        return self.call(name, token.text);
                    }
                    let operand = self.lval_rest(token.text, location)?;
                    return Ok(self.postfix(operand));
                }
                let operand = self.lval()?;
                Ok(self.postfix(operand))
            }
            s if s.is_literal() => self.constant(None),
            Symbol::Ari(sign @ (AriOp::Add | AriOp::Sub)) if self.dialect() == Dialect::Program => {
                self.advance();
                if matches!(self.symbol(), Symbol::IntLit | Symbol::FloatLit) {
                    self.constant(Some(sign))
                } else {
                    self.error("expected LIT after sign");
                    Ok(self.session.zero())
                }
            }
            Symbol::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(Symbol::RParen, "expected )");
                Ok(inner)
            }
            Symbol::Ari(AriOp::Mul) => {
                self.advance();
                let operand = self.factor()?;
                Ok(self.deref(operand, location))
            }
            _ => {
                self.error("expected ID or LIT");
                self.skip_until(&[Symbol::Semicolon, Symbol::RParen, ARITHMETIC]);
                Ok(self.session.zero())
            }
        }
    }

    fn postfix(&mut self, operand: NodeId) -> NodeId {
        match self.symbol() {
            Symbol::Dup(op) if self.session.ast.kind(operand).is_lvalue() => {
                let location = self.advance().location;
                self.session
                    .ast
                    .add(NodeKind::Postfix { op, operand }, location)
            }
            _ => operand,
        }
    }

    /// `ID exprs?` with the identifier at the lookahead
    fn lval(&mut self) -> Result<NodeId, Error> {
        let token = self.advance();
        self.lval_rest(token.text, token.location)
    }

    fn lval_rest(&mut self, name: String, location: SourceLocation) -> Result<NodeId, Error> {
        let symbol = self.session.symbols.lookup_all(&name);
        if symbol.is_none() {
            self.report(
                DiagnosticKind::UndefinedReference,
                format!("Undefined variable '{}'", name),
                location,
            );
        }
        let base = self.session.ast.add(NodeKind::VarRef { name, symbol }, location);
        if !self.check(Symbol::LBracket) {
            return Ok(base);
        }
        let indices = self.exprs()?;
        Ok(self.indexed(base, indices, location))
    }

    /// Dereference node; the operand must have pointer type
    fn deref(&mut self, operand: NodeId, location: SourceLocation) -> NodeId {
        if let Some(ty) = self.session.type_of(operand) {
            if self.session.types.pointee(ty).is_none() {
                let message = format!(
                    "expected pointer type, found {}",
                    self.session.types.display(ty)
                );
                self.report(DiagnosticKind::TypeMismatch, message, location);
            }
        }
        self.session.ast.add(NodeKind::Deref { operand }, location)
    }

    /// Indexed lvalue; the base must be an array for every index applied
    pub(crate) fn indexed(&mut self, base: NodeId, indices: NodeId, location: SourceLocation) -> NodeId {
        if let Some(ty) = self.session.type_of(base) {
            let levels = self.session.ast.items(indices).len();
            if let Err(found) = self.session.strip_indices(ty, levels) {
                let message = format!(
                    "expected array type, found {}",
                    self.session.types.display(found)
                );
                self.report(DiagnosticKind::TypeMismatch, message, location);
            }
        }
        self.session
            .ast
            .add(NodeKind::LValue { base, indices }, location)
    }

    /// `('[' expr ']')+`; every index must be an integer
    pub(crate) fn exprs(&mut self) -> Result<NodeId, Error> {
        let list = self.session.ast.new_list(ListKind::Exprs, self.location());
        while self.check(Symbol::LBracket) {
            self.advance();
            let index = self.expr()?;
            if let Some(ty) = self.session.type_of(index) {
                let int = self.session.types.int();
                if !self.session.types.equal(ty, int) {
                    let location = self.session.ast.location(index);
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        "Index of array must be integer",
                        location,
                    );
                }
            }
            self.session.ast.append(list, index);
            self.expect(Symbol::RBracket, "expected ]");
        }
        Ok(list)
    }

    /// Literal at the lookahead, registered as a generated constant.
    /// Float and string lexemes go to the string table.
    fn constant(&mut self, sign: Option<AriOp>) -> Result<NodeId, Error> {
        let token = self.advance();
        let location = token.location;
        let negative = sign == Some(AriOp::Sub);
        let text = if negative {
            format!("-{}", token.text)
        } else {
            token.text.clone()
        };

        let types = &self.session.types;
        let (ty, value) = match token.symbol {
            Symbol::IntLit => {
                let n = token.int_value();
                (types.int(), if negative { -n } else { n })
            }
            Symbol::CharLit => (types.char(), token.int_value()),
            Symbol::FloatLit => (types.float(), self.session.strings.insert(&text) as i64),
            _ => {
                let contents = match &token.value {
                    TokenValue::Str(s) => s.as_str(),
                    _ => token.text.as_str(),
                };
                (types.string(), self.session.strings.insert(contents) as i64)
            }
        };

        let label = self.session.next_constant_name();
        let symbol = self.declare(&label, Some(ty), StorageClass::LocalConst, value, location)?;
        let node = self.session.ast.add(
            NodeKind::Constant {
                label,
                text,
                value,
                symbol,
            },
            location,
        );
        self.session.ast.set_type(node, Some(ty));
        Ok(node)
    }

    pub(crate) fn bexpr(&mut self) -> Result<NodeId, Error> {
        let mut lhs = self.bexpr_operand()?;
        loop {
            let location = self.location();
            match self.symbol() {
                Symbol::RParen | Symbol::Semicolon | Symbol::Eof => break,
                Symbol::Log(op @ (LogOp::And | LogOp::Or)) => {
                    self.advance();
                    let rhs = self.bexpr_operand()?;
                    let op = BinOp::Log(op);
                    self.check_condition(lhs, op);
                    self.check_condition(rhs, op);
                    lhs = self.session.ast.add(NodeKind::Binary { op, lhs, rhs }, location);
                }
                Symbol::Rel(op) => {
                    self.advance();
                    let rhs = self.expr()?;
                    lhs = self.relation(op, lhs, rhs, location);
                }
                _ => {
                    self.error("Expected ')' or a logical operator");
                    break;
                }
            }
        }
        Ok(lhs)
    }

    fn bexpr_operand(&mut self) -> Result<NodeId, Error> {
        let location = self.location();
        match self.symbol() {
            Symbol::True | Symbol::False => {
                let token = self.advance();
                let value = i64::from(token.symbol == Symbol::True);
                let node = self.session.ast.add(
                    NodeKind::Constant {
                        label: token.text.clone(),
                        text: token.text,
                        value,
                        symbol: None,
                    },
                    location,
                );
                let int = self.session.types.int();
                self.session.ast.set_type(node, Some(int));
                Ok(node)
            }
            Symbol::LParen => {
                self.advance();
                let inner = self.bexpr()?;
                self.expect(Symbol::RParen, ") expected");
                Ok(inner)
            }
            Symbol::Log(LogOp::Not) => {
                self.advance();
                let operand = self.bexpr_operand()?;
                self.check_condition(operand, BinOp::Log(LogOp::Not));
                Ok(self.session.ast.add(
                    NodeKind::Prefix {
                        op: UnaryOp::Not,
                        operand,
                    },
                    location,
                ))
            }
            _ => {
                let lhs = self.expr()?;
                match self.symbol() {
                    Symbol::Rel(op) => {
                        let location = self.advance().location;
                        let rhs = self.expr()?;
                        Ok(self.relation(op, lhs, rhs, location))
                    }
                    _ => Ok(lhs),
                }
            }
        }
    }

    fn relation(&mut self, op: RelOp, lhs: NodeId, rhs: NodeId, location: SourceLocation) -> NodeId {
        let op = BinOp::Rel(op);
        if !self.session.equal_node_types(lhs, rhs) {
            self.report(
                DiagnosticKind::TypeMismatch,
                format!("operands of '{}' have different types", op),
                location,
            );
        }
        self.session.ast.add(NodeKind::Binary { op, lhs, rhs }, location)
    }

    fn is_condition(&self, node: NodeId) -> bool {
        matches!(
            self.session.ast.kind(node),
            NodeKind::Binary {
                op: BinOp::Rel(_) | BinOp::Log(_),
                ..
            } | NodeKind::Prefix {
                op: UnaryOp::Not,
                ..
            }
        )
    }

    /// Logical operands are conditions or integers
    fn check_condition(&mut self, node: NodeId, op: BinOp) {
        if self.is_condition(node) {
            return;
        }
        let Some(ty) = self.session.type_of(node) else {
            return;
        };
        let int = self.session.types.int();
        if !self.session.types.equal(ty, int) {
            let message = format!(
                "operand of '{}' must be a condition or an integer, found {}",
                op,
                self.session.types.display(ty)
            );
            let location = self.session.ast.location(node);
            self.report(DiagnosticKind::TypeMismatch, message, location);
        }
    }
}
