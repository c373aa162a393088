//! Declaration parsing
//!
//! # Grammar
//!
//! ```text
//! program    ::= block                                  (block dialect)
//!              | classdecl+                             (program dialect)
//! classdecl  ::= CLASS ID '{' structdecl* vardecl* funcdecl* '}'
//! structdecl ::= STRUCT ID '{' vardecl* '}' ';'
//! vardecl    ::= typedecl ID (',' ID)* ';'
//! funcdecl   ::= rettype ID '(' argdecls ')' block
//! argdecls   ::= (typedecl ID (',' typedecl ID)*)?
//! typedecl   ::= primtype mod*        rettype ::= (primtype | VOID) mod*
//! mod        ::= '[' ILIT ']' | '*'
//! block      ::= '{' vardecl* stmt* '}'
//! ```
//!
//! A program-dialect `vardecl` whose name is followed by `(` is really the
//! first function declaration: its name node is reclassified and the
//! declaration is routed into the class's function list.

use crate::constants::MAX_ARRAY_SIZE;
use crate::error::Error;
use crate::parser::ast::*;
use crate::parser::lexer::Symbol;
use crate::parser::parse::{Dialect, Parser};
use crate::symbols::StorageClass;
use crate::types::{Field, Primitive, TypeId};

/// Outcome of one `vardecl`
enum VarDeclOutcome {
    Vars(NodeId),
    /// `type ID (` turned out to start a function
    Function(NodeId),
}

impl Parser {
    pub(crate) fn program(&mut self) -> Result<NodeId, Error> {
        match self.dialect() {
            Dialect::Block => {
                let block = self.block()?;
                if !self.is_at_end() {
                    self.error("expected end of input");
                }
                Ok(block)
            }
            Dialect::Program => {
                let location = self.location();
                let classes = self.class_decls()?;
                Ok(self
                    .session
                    .ast
                    .add(NodeKind::Program { classes }, location))
            }
        }
    }

    fn class_decls(&mut self) -> Result<NodeId, Error> {
        let list = self.session.ast.new_list(ListKind::ClassDecls, self.location());
        if self.is_at_end() {
            self.error("expected class");
        }

        while !self.is_at_end() {
            if self.check(Symbol::Class) {
                let class = self.class_decl()?;
                self.session.ast.append(list, class);
            } else {
                self.error("expected class");
                self.skip_until(&[Symbol::Class]);
            }
        }
        Ok(list)
    }

    fn class_decl(&mut self) -> Result<NodeId, Error> {
        let location = self.advance().location;
        let name = self.name()?;
        if let NodeKind::Name { name: text } = self.session.ast.kind(name).clone() {
            self.declare(&text, None, StorageClass::Global, 0, location)?;
        }

        self.expect(Symbol::LBrace, "expected {");
        let (structs, vars, funcs) = self.in_scope(|p| {
            p.class_functions.clear();
            let ast = &mut p.session.ast;
            let structs = ast.new_list(ListKind::Structs, location);
            let vars = ast.new_list(ListKind::VarDecls, location);
            let funcs = ast.new_list(ListKind::FuncDecls, location);

            p.struct_decls(structs)?;
            p.var_decls(vars, Some(funcs))?;
            p.func_decls(funcs)?;
            Ok((structs, vars, funcs))
        })?;
        self.expect(Symbol::RBrace, "expected }");

        Ok(self.session.ast.add(
            NodeKind::ClassDecl {
                name,
                structs,
                vars,
                funcs,
            },
            location,
        ))
    }

    /// Plain identifier name; the zero placeholder when it is missing
    pub(crate) fn name(&mut self) -> Result<NodeId, Error> {
        if !self.check(Symbol::Ident) {
            self.error("expected ID");
            return Ok(self.session.zero());
        }
        let token = self.advance();
        Ok(self
            .session
            .ast
            .add(NodeKind::Name { name: token.text }, token.location))
    }

    fn struct_decls(&mut self, list: NodeId) -> Result<(), Error> {
        while self.check(Symbol::Struct) {
            let decl = self.struct_decl()?;
            self.session.ast.append(list, decl);
        }
        Ok(())
    }

    fn struct_decl(&mut self) -> Result<NodeId, Error> {
        let location = self.advance().location;
        let name = self.name()?;
        let fields = self.session.ast.new_list(ListKind::VarDecls, location);

        if self.expect(Symbol::LBrace, "expected {") {
            self.in_scope(|p| p.var_decls(fields, None))?;
            self.expect(Symbol::RBrace, "expected }");
            self.expect(Symbol::Semicolon, "expected ;");
        }

        let mut members = Vec::new();
        for &decl in self.session.ast.items(fields) {
            if let NodeKind::VarDecl { vars } = self.session.ast.kind(decl) {
                for &var in self.session.ast.items(*vars) {
                    if let (Some(field), Some(ty)) =
                        (self.session.ast.kind(var).name(), self.session.ast.ty(var))
                    {
                        members.push(Field {
                            name: field.to_string(),
                            ty,
                        });
                    }
                }
            }
        }
        let ty = self.session.types.struct_type(members);

        if let NodeKind::Name { name: text } = self.session.ast.kind(name).clone() {
            self.declare(&text, Some(ty), StorageClass::Global, 0, location)?;
        }
        let node = self
            .session
            .ast
            .add(NodeKind::StructDecl { name, fields }, location);
        self.session.ast.set_type(node, Some(ty));
        Ok(node)
    }

    /// `vardecl*`. With a function list, a declaration that turns out to be
    /// a function is appended there and ends the variable section.
    pub(crate) fn var_decls(&mut self, list: NodeId, funcs: Option<NodeId>) -> Result<(), Error> {
        while self.symbol().is_prim_type() {
            match self.var_decl(funcs.is_some())? {
                VarDeclOutcome::Vars(decl) => self.session.ast.append(list, decl),
                VarDeclOutcome::Function(func) => {
                    if let Some(funcs) = funcs {
                        self.session.ast.append(funcs, func);
                    }
                    return Ok(());
                }
            }

            if self.check(Symbol::Semicolon) {
                self.advance();
            } else {
                self.error("expected ;");
            }
        }
        Ok(())
    }

    fn var_decl(&mut self, allow_function: bool) -> Result<VarDeclOutcome, Error> {
        let location = self.location();
        let ty = self.type_decl(false);
        let vars = self.session.ast.new_list(ListKind::Vars, location);

        if self.check(Symbol::Ident) {
            let token = self.advance();
            let first = self.session.ast.add(
                NodeKind::Var {
                    name: token.text.clone(),
                    symbol: None,
                },
                token.location,
            );

            if allow_function && self.check(Symbol::LParen) {
                let func_name = self.session.ast.reclassify(
                    first,
                    NodeKind::FuncName {
                        name: token.text,
                        symbol: None,
                    },
                );
                let func = self.function_rest(func_name, ty, location)?;
                return Ok(VarDeclOutcome::Function(func));
            }

            self.bind_declared(first, ty, StorageClass::LocalVar)?;
            self.session.ast.append(vars, first);

            while self.check(Symbol::Comma) {
                self.advance();
                if !self.check(Symbol::Ident) {
                    self.error("expected ID");
                    break;
                }
                let var = self.var(StorageClass::LocalVar, ty)?;
                self.session.ast.append(vars, var);
            }
        } else {
            self.error("expected ID");
        }

        let node = self.session.ast.add(NodeKind::VarDecl { vars }, location);
        self.session.ast.set_type(node, Some(ty));
        Ok(VarDeclOutcome::Vars(node))
    }

    /// Declare the identifier at the lookahead
    fn var(&mut self, class: StorageClass, ty: TypeId) -> Result<NodeId, Error> {
        let token = self.advance();
        let node = self.session.ast.add(
            NodeKind::Var {
                name: token.text,
                symbol: None,
            },
            token.location,
        );
        self.bind_declared(node, ty, class)?;
        Ok(node)
    }

    fn bind_declared(&mut self, node: NodeId, ty: TypeId, class: StorageClass) -> Result<(), Error> {
        let name = self.session.ast.kind(node).name().unwrap_or_default().to_string();
        let location = self.session.ast.location(node);
        if let Some(symbol) = self.declare(&name, Some(ty), class, 0, location)? {
            self.session.ast.bind_symbol(node, symbol);
        }
        self.session.ast.set_type(node, Some(ty));
        Ok(())
    }

    /// `typedecl`, or `rettype` when `allow_void` is set. The lookahead is
    /// known to start a type.
    fn type_decl(&mut self, allow_void: bool) -> TypeId {
        let token = self.advance();
        let primitive = match token.symbol {
            Symbol::Int => Primitive::Int,
            Symbol::Char => Primitive::Char,
            Symbol::Float => Primitive::Float,
            Symbol::Str => Primitive::String,
            Symbol::Void if allow_void => Primitive::Void,
            _ => {
                self.session
                    .diagnostics
                    .syntax(format!("expected primtype (found {})", token), token.location);
                Primitive::Int
            }
        };
        let ty = self.session.types.primitive(primitive);
        self.type_modifiers(ty)
    }

    /// `mod*`: each `[n]` or `*` wraps the type built so far
    fn type_modifiers(&mut self, mut ty: TypeId) -> TypeId {
        loop {
            match self.symbol() {
                Symbol::LBracket => {
                    self.advance();
                    let mut size = 1;
                    if self.check(Symbol::IntLit) {
                        let value = self.advance().int_value();
                        match usize::try_from(value) {
                            Ok(0) | Err(_) => self.error("size must be positive"),
                            Ok(n) if n > MAX_ARRAY_SIZE => {
                                self.error(format!("size must not exceed {}", MAX_ARRAY_SIZE))
                            }
                            Ok(n) => size = n,
                        }
                    } else {
                        self.error("expected ILIT");
                    }
                    self.expect(Symbol::RBracket, "expected ]");
                    ty = self.session.types.array(ty, size);
                }
                Symbol::Ari(AriOp::Mul) => {
                    self.advance();
                    ty = self.session.types.pointer(ty);
                }
                _ => return ty,
            }
        }
    }

    fn func_decls(&mut self, list: NodeId) -> Result<(), Error> {
        while self.symbol().is_prim_type() || self.check(Symbol::Void) {
            if let Some(func) = self.func_decl()? {
                self.session.ast.append(list, func);
            }
        }
        Ok(())
    }

    fn func_decl(&mut self) -> Result<Option<NodeId>, Error> {
        let location = self.location();
        let ret = self.type_decl(true);
        if !self.check(Symbol::Ident) {
            self.error("expected ID");
            self.skip_statement();
            return Ok(None);
        }
        let token = self.advance();
        let name = self.session.ast.add(
            NodeKind::FuncName {
                name: token.text,
                symbol: None,
            },
            token.location,
        );
        if !self.check(Symbol::LParen) {
            self.error("expected (");
            self.skip_statement();
            return Ok(None);
        }
        self.function_rest(name, ret, location).map(Some)
    }

    /// Everything after the function name: the name is declared before the
    /// arguments so the body can call it recursively.
    fn function_rest(&mut self, name: NodeId, ret: TypeId, location: SourceLocation) -> Result<NodeId, Error> {
        let func_type = self.session.types.function(ret);
        let text = self.session.ast.kind(name).name().unwrap_or_default().to_string();
        let symbol = self.declare(
            &text,
            Some(func_type),
            StorageClass::LocalFunc,
            0,
            self.session.ast.location(name),
        )?;
        if let Some(symbol) = symbol {
            self.session.ast.bind_symbol(name, symbol);
            self.class_functions.push(symbol);
        }
        self.session.ast.set_type(name, Some(func_type));

        self.expect(Symbol::LParen, "expected (");
        self.session.symbols.mark_arguments();
        let args = self.arg_decls()?;
        let arg_types = self
            .session
            .ast
            .items(args)
            .iter()
            .filter_map(|&decl| self.session.ast.ty(decl))
            .collect();
        self.session.types.set_function_args(func_type, arg_types);
        self.expect(Symbol::RParen, "expected )");

        let saved = std::mem::replace(&mut self.current_function, symbol);
        let body = self.with_loop(false, |p| p.block());
        self.current_function = saved;
        self.session.symbols.unmark_arguments();
        let body = body?;

        Ok(self
            .session
            .ast
            .add(NodeKind::FuncDecl { name, args, body }, location))
    }

    fn arg_decls(&mut self) -> Result<NodeId, Error> {
        let list = self.session.ast.new_list(ListKind::ArgDecls, self.location());
        while self.symbol().is_prim_type() {
            let location = self.location();
            let ty = self.type_decl(false);
            if !self.check(Symbol::Ident) {
                self.error("expected ID");
                break;
            }
            let var = self.var(StorageClass::Argument, ty)?;
            let decl = self.session.ast.add(NodeKind::ArgDecl { var }, location);
            self.session.ast.set_type(decl, Some(ty));
            self.session.ast.append(list, decl);

            if !self.check(Symbol::Comma) {
                break;
            }
            self.advance();
        }
        Ok(list)
    }

    /// `'{' vardecl* stmt* '}'`, or the zero placeholder without `{`
    pub(crate) fn block(&mut self) -> Result<NodeId, Error> {
        let location = self.location();
        if !self.expect(Symbol::LBrace, "expected {") {
            return Ok(self.session.zero());
        }

        let block = self.in_scope(|p| {
            let vars = p.session.ast.new_list(ListKind::VarDecls, location);
            p.var_decls(vars, None)?;
            let stmts = p.stmts()?;
            Ok(p.session.ast.add(NodeKind::Block { vars, stmts }, location))
        })?;
        self.expect(Symbol::RBrace, "expected }");
        Ok(block)
    }
}
