//! Type of an AST node
//!
//! - names resolve through the symbol table (innermost scope first)
//! - variables, references and function names take their symbol's type
//! - constants carry their annotation
//! - operator nodes take the type of their (left) operand
//! - a dereference requires a pointer operand and yields the pointee
//! - an indexed lvalue strips one array level per index
//!
//! An explicit annotation on the node wins over all of the above. A node
//! whose type cannot be resolved has no type, and checks against it are
//! skipped. `type_of` never reports: failed dereference and indexing are
//! diagnosed once, by the parser, when the node is built.

use crate::parser::ast::{NodeId, NodeKind};
use crate::session::Session;
use crate::types::TypeId;

impl Session {
    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        if let Some(ty) = self.ast.ty(node) {
            return Some(ty);
        }

        match self.ast.kind(node) {
            NodeKind::Name { name } => {
                let entry = self.symbols.lookup_all(name)?;
                self.symbols.entry(entry).ty
            }

            kind @ (NodeKind::Var { .. }
            | NodeKind::VarRef { .. }
            | NodeKind::FuncName { .. }
            | NodeKind::FuncRef { .. }
            | NodeKind::Constant { .. }) => self.symbols.entry(kind.symbol()?).ty,

            NodeKind::Binary { lhs, .. } => self.type_of(*lhs),
            NodeKind::Prefix { operand, .. } | NodeKind::Postfix { operand, .. } => {
                self.type_of(*operand)
            }
            NodeKind::Arg { expr } => self.type_of(*expr),
            NodeKind::Assign { target, .. } => self.type_of(*target),

            NodeKind::Call { callee, .. } => {
                let func = self.type_of(*callee)?;
                self.types.function_return(func)
            }

            NodeKind::Deref { operand } => self.types.pointee(self.type_of(*operand)?),

            NodeKind::LValue { base, indices } => {
                let levels = self.ast.items(*indices).len();
                self.strip_indices(self.type_of(*base)?, levels).ok()
            }

            _ => None,
        }
    }

    /// Element type after `levels` indexing steps, or the first non-array
    /// type met on the way
    pub(crate) fn strip_indices(&self, mut ty: TypeId, levels: usize) -> Result<TypeId, TypeId> {
        for _ in 0..levels {
            ty = self.types.array_element(ty).ok_or(ty)?;
        }
        Ok(ty)
    }

    /// Structural equality of two nodes' types. Unknown types compare equal
    /// so that an earlier failure is not reported again.
    pub fn equal_node_types(&self, a: NodeId, b: NodeId) -> bool {
        match (self.type_of(a), self.type_of(b)) {
            (Some(ta), Some(tb)) => self.types.equal(ta, tb),
            _ => true,
        }
    }
}
