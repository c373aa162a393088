//! Compilation context
//!
//! A [`Session`] owns every table one parse run reads and writes: the AST
//! arena, the symbol table (with its storage locations), the type arena,
//! the string table and the diagnostics sink. The parser holds the session
//! by value and hands it back when it finishes, so independent runs never
//! share state.

use crate::constants::CONSTANT_NAME_PREFIX;
use crate::diagnostics::Diagnostics;
use crate::parser::ast::{Ast, NodeId, NodeKind, SourceLocation};
use crate::strings::StringTable;
use crate::symbols::SymbolTable;
use crate::types::TypeTable;

#[derive(Debug)]
pub struct Session {
    pub ast: Ast,
    pub symbols: SymbolTable,
    pub types: TypeTable,
    pub strings: StringTable,
    pub diagnostics: Diagnostics,
    zero: NodeId,
    constant_seq: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SymbolTable::new())
    }
}

impl Session {
    pub fn new(symbols: SymbolTable) -> Self {
        let mut ast = Ast::new();
        let zero = ast.add(
            NodeKind::Constant {
                label: "0".to_string(),
                text: "0".to_string(),
                value: 0,
                symbol: None,
            },
            SourceLocation::default(),
        );
        Self {
            ast,
            symbols,
            types: TypeTable::new(),
            strings: StringTable::new(),
            diagnostics: Diagnostics::new(),
            zero,
            constant_seq: 0,
        }
    }

    /// Shared placeholder returned by productions that could not build a node
    pub fn zero(&self) -> NodeId {
        self.zero
    }

    /// Next generated constant name: `$C0001`, `$C0002`, ...
    pub fn next_constant_name(&mut self) -> String {
        self.constant_seq += 1;
        format!("${}{:04}", CONSTANT_NAME_PREFIX, self.constant_seq)
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
