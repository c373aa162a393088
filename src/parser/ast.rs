// AST (Abstract Syntax Tree) definitions for the tinyj front end

use crate::symbols::SymbolId;
use crate::types::TypeId;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Logical operators (`Not` is only ever a prefix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOp {
    And,
    Or,
    Not,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Increment/decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DupOp {
    Inc,
    Dec,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Ari(AriOp),
    Rel(RelOp),
    Log(LogOp),
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Dup(DupOp),
    Not,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Ari(AriOp::Add) => "+",
            BinOp::Ari(AriOp::Sub) => "-",
            BinOp::Ari(AriOp::Mul) => "*",
            BinOp::Ari(AriOp::Div) => "/",
            BinOp::Ari(AriOp::Mod) => "%",
            BinOp::Rel(RelOp::Eq) => "==",
            BinOp::Rel(RelOp::Ne) => "!=",
            BinOp::Rel(RelOp::Lt) => "<",
            BinOp::Rel(RelOp::Le) => "<=",
            BinOp::Rel(RelOp::Gt) => ">",
            BinOp::Rel(RelOp::Ge) => ">=",
            BinOp::Log(LogOp::And) => "&&",
            BinOp::Log(LogOp::Or) => "||",
            BinOp::Log(LogOp::Not) => "!",
        };
        f.write_str(s)
    }
}

impl fmt::Display for DupOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DupOp::Inc => f.write_str("++"),
            DupOp::Dec => f.write_str("--"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Dup(op) => write!(f, "{}", op),
            UnaryOp::Not => f.write_str("!"),
        }
    }
}

/// Handle of a node in the [`Ast`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a list node collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    ClassDecls,
    Structs,
    VarDecls,
    FuncDecls,
    Vars,
    ArgDecls,
    Stmts,
    Exprs,
    Args,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::ClassDecls => "classes",
            ListKind::Structs => "structs",
            ListKind::VarDecls => "vardecls",
            ListKind::FuncDecls => "funcdecls",
            ListKind::Vars => "vars",
            ListKind::ArgDecls => "argdecls",
            ListKind::Stmts => "stmts",
            ListKind::Exprs => "exprs",
            ListKind::Args => "args",
        }
    }
}

/// Node kinds. The payload of each variant is its fixed child layout.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Declarations
    Program {
        classes: NodeId,
    },
    ClassDecl {
        name: NodeId,
        structs: NodeId,
        vars: NodeId,
        funcs: NodeId,
    },
    StructDecl {
        name: NodeId,
        fields: NodeId,
    },
    VarDecl {
        vars: NodeId,
    },
    FuncDecl {
        name: NodeId,
        args: NodeId,
        body: NodeId,
    },
    ArgDecl {
        var: NodeId,
    },
    Block {
        vars: NodeId,
        stmts: NodeId,
    },

    // Statements
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Break,
    Continue,
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Call {
        callee: NodeId,
        args: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Arg {
        expr: NodeId,
    },

    // Expressions
    Binary {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Prefix {
        op: UnaryOp,
        operand: NodeId,
    },
    Postfix {
        op: DupOp,
        operand: NodeId,
    },
    Deref {
        operand: NodeId,
    },
    Constant {
        label: String,
        text: String,
        value: i64,
        symbol: Option<SymbolId>,
    },
    /// Identifier whose role is not known yet
    Name {
        name: String,
    },
    FuncName {
        name: String,
        symbol: Option<SymbolId>,
    },
    /// Declared variable or argument
    Var {
        name: String,
        symbol: Option<SymbolId>,
    },
    /// Resolved variable reference
    VarRef {
        name: String,
        symbol: Option<SymbolId>,
    },
    /// Resolved callee of a call
    FuncRef {
        name: String,
        symbol: Option<SymbolId>,
    },
    LValue {
        base: NodeId,
        indices: NodeId,
    },
    List {
        kind: ListKind,
        items: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Text of identifier-like nodes
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Name { name }
            | NodeKind::FuncName { name, .. }
            | NodeKind::Var { name, .. }
            | NodeKind::VarRef { name, .. }
            | NodeKind::FuncRef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Symbol bound to identifier-like and constant nodes
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            NodeKind::FuncName { symbol, .. }
            | NodeKind::Var { symbol, .. }
            | NodeKind::VarRef { symbol, .. }
            | NodeKind::FuncRef { symbol, .. }
            | NodeKind::Constant { symbol, .. } => *symbol,
            _ => None,
        }
    }

    /// Assignable storage: a variable reference or an indexed element
    pub fn is_lvalue(&self) -> bool {
        matches!(self, NodeKind::VarRef { .. } | NodeKind::LValue { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
}

/// Arena owning every node built during one compilation
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: NodeKind, location: SourceLocation) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            location,
            ty: None,
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn location(&self, id: NodeId) -> SourceLocation {
        self.nodes[id.index()].location
    }

    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.nodes[id.index()].ty
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a type annotation. Annotations are write-once.
    pub fn set_type(&mut self, id: NodeId, ty: Option<TypeId>) {
        let node = &mut self.nodes[id.index()];
        match (node.ty, ty) {
            (_, None) => {}
            (None, Some(_)) => node.ty = ty,
            (Some(old), Some(new)) if old != new => {
                log::warn!("node {:?} already annotated with {:?}, keeping it over {:?}", id, old, new)
            }
            _ => {}
        }
    }

    /// Bind the symbol of a declared name once the table entry exists
    pub fn bind_symbol(&mut self, id: NodeId, entry: SymbolId) {
        let slot = match &mut self.nodes[id.index()].kind {
            NodeKind::Var { symbol, .. }
            | NodeKind::VarRef { symbol, .. }
            | NodeKind::FuncName { symbol, .. }
            | NodeKind::FuncRef { symbol, .. } => symbol,
            other => {
                log::warn!("node {:?} cannot take symbol {:?}: {:?}", id, entry, other);
                return;
            }
        };
        if slot.is_none() {
            *slot = Some(entry);
        }
    }

    /// Build a replacement node of a new kind at the old node's position.
    /// The old node is left as it was.
    pub fn reclassify(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let location = self.location(id);
        let new_id = self.add(kind, location);
        log::debug!(
            "reclassified node {:?} as {:?} ({:?})",
            id,
            new_id,
            self.kind(new_id)
        );
        new_id
    }

    pub fn new_list(&mut self, kind: ListKind, location: SourceLocation) -> NodeId {
        self.add(
            NodeKind::List {
                kind,
                items: Vec::new(),
            },
            location,
        )
    }

    pub fn append(&mut self, list: NodeId, item: NodeId) {
        match &mut self.nodes[list.index()].kind {
            NodeKind::List { items, .. } => items.push(item),
            other => log::warn!("append to non-list node {:?}: {:?}", list, other),
        }
    }

    pub fn items(&self, list: NodeId) -> &[NodeId] {
        match self.kind(list) {
            NodeKind::List { items, .. } => items,
            _ => &[],
        }
    }

    /// S-expression rendering of a subtree
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        let open = |out: &mut String, tag: &str, children: &[NodeId]| {
            out.push('(');
            out.push_str(tag);
            for &child in children {
                out.push(' ');
                self.render_into(child, out);
            }
            out.push(')');
        };

        match self.kind(id) {
            NodeKind::Program { classes } => open(out, "program", &[*classes]),
            NodeKind::ClassDecl {
                name,
                structs,
                vars,
                funcs,
            } => open(out, "class", &[*name, *structs, *vars, *funcs]),
            NodeKind::StructDecl { name, fields } => open(out, "struct", &[*name, *fields]),
            NodeKind::VarDecl { vars } => open(out, "vardecl", &[*vars]),
            NodeKind::FuncDecl { name, args, body } => open(out, "func", &[*name, *args, *body]),
            NodeKind::ArgDecl { var } => open(out, "argdecl", &[*var]),
            NodeKind::Block { vars, stmts } => open(out, "block", &[*vars, *stmts]),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(e) => open(out, "if", &[*cond, *then_branch, *e]),
                None => open(out, "if", &[*cond, *then_branch]),
            },
            NodeKind::While { cond, body } => open(out, "while", &[*cond, *body]),
            NodeKind::Break => out.push_str("(break)"),
            NodeKind::Continue => out.push_str("(continue)"),
            NodeKind::Assign { op, target, value } => {
                open(out, &op.to_string(), &[*target, *value])
            }
            NodeKind::Call { callee, args } => open(out, "call", &[*callee, *args]),
            NodeKind::Return { value } => match value {
                Some(v) => open(out, "return", &[*v]),
                None => open(out, "return", &[]),
            },
            NodeKind::Arg { expr } => self.render_into(*expr, out),
            NodeKind::Binary { op, lhs, rhs } => open(out, &op.to_string(), &[*lhs, *rhs]),
            NodeKind::Prefix {
                op: UnaryOp::Not,
                operand,
            } => open(out, "!", &[*operand]),
            NodeKind::Prefix { op, operand } => open(out, &format!("{}pre", op), &[*operand]),
            NodeKind::Postfix { op, operand } => open(out, &format!("post{}", op), &[*operand]),
            NodeKind::Deref { operand } => open(out, "deref", &[*operand]),
            NodeKind::Constant { text, .. } => out.push_str(text),
            NodeKind::Name { name } => out.push_str(&format!("(name {})", name)),
            NodeKind::FuncName { name, .. } => out.push_str(&format!("(fn {})", name)),
            NodeKind::Var { name, .. } => out.push_str(name),
            NodeKind::VarRef { name, .. } => out.push_str(name),
            NodeKind::FuncRef { name, .. } => out.push_str(name),
            NodeKind::LValue { base, indices } => open(out, "index", &[*base, *indices]),
            NodeKind::List { kind, items } => open(out, kind.tag(), items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut ast = Ast::new();
        let list = ast.new_list(ListKind::Stmts, loc());
        let a = ast.add(NodeKind::Break, loc());
        let b = ast.add(NodeKind::Continue, loc());
        ast.append(list, a);
        ast.append(list, b);

        assert_eq!(ast.items(list), &[a, b]);
        assert_eq!(ast.render(list), "(stmts (break) (continue))");
    }

    #[test]
    fn test_reclassify_leaves_original_untouched() {
        let mut ast = Ast::new();
        let var = ast.add(
            NodeKind::Var {
                name: "f".to_string(),
                symbol: None,
            },
            SourceLocation::new(4, 5),
        );
        let func = ast.reclassify(
            var,
            NodeKind::FuncName {
                name: "f".to_string(),
                symbol: None,
            },
        );

        assert_ne!(var, func);
        assert!(matches!(ast.kind(var), NodeKind::Var { .. }));
        assert!(matches!(ast.kind(func), NodeKind::FuncName { .. }));
        assert_eq!(ast.location(func), SourceLocation::new(4, 5));
    }

    #[test]
    fn test_type_annotation_is_write_once() {
        let mut ast = Ast::new();
        let types = crate::types::TypeTable::new();
        let node = ast.add(NodeKind::Break, loc());

        ast.set_type(node, Some(types.int()));
        ast.set_type(node, Some(types.float()));
        ast.set_type(node, None);

        assert_eq!(ast.ty(node), Some(types.int()));
    }
}
