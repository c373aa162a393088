//! Scoped symbol table
//!
//! Entries live in one flat arena addressed by [`SymbolId`] and are never
//! removed. A scope is a half-open range over that arena plus a link to its
//! parent; leaving a scope marks every entry it owns inactive, which makes
//! them unreachable by lookup while their ids stay valid for AST nodes that
//! captured them.
//!
//! # Storage
//!
//! [`SymbolTable::insert`] computes a storage location per class:
//!
//! - [`StorageClass::Global`]: fresh location at [`GLOBAL_OFFSET`]
//! - [`StorageClass::LocalFunc`]: fresh location at offset 0, size 0
//! - [`StorageClass::LocalVar`]: `(depth, next variable offset)`, the offset
//!   then advances by the type size
//! - [`StorageClass::Argument`]: the argument offset first moves down by the
//!   type size, the slot sits at `depth + 1` (the function body's depth)
//! - [`StorageClass::LocalConst`]: immediates, no location
//!
//! Variable and argument locations go through
//! [`LocationTable::shared`], so sibling scopes at one depth reuse slots.
//!
//! # Arguments
//!
//! A function's arguments are inserted into the enclosing (class) scope.
//! `mark_arguments`/`unmark_arguments` bracket one parameter list and body:
//! an argument entry is only visible while its index is at or above the
//! current mark, so the arguments of one function never leak into the next.

pub mod location;

use crate::constants::{GLOBAL_OFFSET, MAX_SCOPE_ENTRIES, MAX_SYMBOL_ENTRIES};
use crate::error::{CapacityError, Table};
use crate::types::{TypeId, TypeTable};
use location::{LocationId, LocationTable};
use std::fmt;

/// Handle of an entry in the [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Global,
    LocalVar,
    LocalConst,
    LocalFunc,
    Argument,
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageClass::Global => "global",
            StorageClass::LocalVar => "var",
            StorageClass::LocalConst => "const",
            StorageClass::LocalFunc => "func",
            StorageClass::Argument => "arg",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub ty: Option<TypeId>,
    pub class: StorageClass,
    /// Immediate value of constants (string table offset for float and string literals)
    pub value: i64,
    pub location: Option<LocationId>,
    pub active: bool,
    scope: usize,
}

#[derive(Debug)]
struct Scope {
    begin: usize,
    end: usize,
    parent: Option<usize>,
    depth: usize,
    var_offset: i64,
    arg_offset: i64,
}

impl Scope {
    fn new(begin: usize, parent: Option<usize>, depth: usize) -> Self {
        Self {
            begin,
            end: begin,
            parent,
            depth,
            var_offset: 0,
            arg_offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// An active entry with this name already exists in the current scope
    Duplicate { existing: SymbolId },
    Capacity(CapacityError),
}

impl From<CapacityError> for SymbolError {
    fn from(err: CapacityError) -> Self {
        SymbolError::Capacity(err)
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    entries: Vec<Entry>,
    scopes: Vec<Scope>,
    current: usize,
    arg_floor: usize,
    locations: LocationTable,
    max_symbols: usize,
    max_scopes: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_limits(MAX_SYMBOL_ENTRIES, MAX_SCOPE_ENTRIES)
    }

    pub fn with_limits(max_symbols: usize, max_scopes: usize) -> Self {
        Self {
            entries: Vec::new(),
            scopes: vec![Scope::new(0, None, 0)],
            current: 0,
            arg_floor: 0,
            locations: LocationTable::new(),
            max_symbols,
            max_scopes,
        }
    }

    /// Nesting depth of the current scope (0 for the root scope)
    pub fn depth(&self) -> usize {
        self.scopes[self.current].depth
    }

    pub fn enter_scope(&mut self) -> Result<(), CapacityError> {
        if self.scopes.len() >= self.max_scopes {
            return Err(CapacityError {
                table: Table::Scopes,
                limit: self.max_scopes,
            });
        }
        let depth = self.depth() + 1;
        self.scopes
            .push(Scope::new(self.entries.len(), Some(self.current), depth));
        self.current = self.scopes.len() - 1;
        log::debug!("entered scope {} at depth {}", self.current, depth);
        Ok(())
    }

    pub fn leave_scope(&mut self) {
        let closing = self.current;
        let Some(parent) = self.scopes[closing].parent else {
            log::warn!("leave_scope called on the root scope");
            return;
        };

        let Scope { begin, end, .. } = self.scopes[closing];
        for entry in &mut self.entries[begin..end] {
            if entry.scope == closing {
                entry.active = false;
            }
        }
        self.current = parent;
        log::debug!(
            "left scope {} ({} entries retired), depth now {}",
            closing,
            end - begin,
            self.depth()
        );
    }

    pub fn mark_arguments(&mut self) {
        self.arg_floor = self.entries.len();
        self.scopes[self.current].arg_offset = 0;
    }

    pub fn unmark_arguments(&mut self) {
        self.arg_floor = self.entries.len();
    }

    fn visible(&self, index: usize) -> bool {
        let entry = &self.entries[index];
        entry.active && (entry.class != StorageClass::Argument || index >= self.arg_floor)
    }

    fn conflicts(&self, index: usize, name: &str, class: StorageClass) -> bool {
        let existing = &self.entries[index];
        if existing.name != name || !self.visible(index) {
            return false;
        }
        match (class, existing.class) {
            (StorageClass::LocalConst, _) | (_, StorageClass::LocalConst) => false,
            (StorageClass::Argument, other) => other == StorageClass::Argument,
            (_, StorageClass::Argument) => false,
            (StorageClass::LocalFunc, StorageClass::LocalFunc) => false,
            _ => true,
        }
    }

    /// Add an entry to the current scope and assign its storage.
    pub fn insert(
        &mut self,
        name: &str,
        ty: Option<TypeId>,
        class: StorageClass,
        value: i64,
        types: &TypeTable,
    ) -> Result<SymbolId, SymbolError> {
        let scope = &self.scopes[self.current];
        if let Some(existing) =
            (scope.begin..scope.end)
                .rev()
                .find(|&i| self.entries[i].scope == self.current && self.conflicts(i, name, class))
        {
            return Err(SymbolError::Duplicate {
                existing: SymbolId(existing as u32),
            });
        }

        if self.entries.len() >= self.max_symbols {
            return Err(CapacityError {
                table: Table::Symbols,
                limit: self.max_symbols,
            }
            .into());
        }

        let depth = self.depth();
        let size = ty.map_or(1, |t| types.size_of(t));
        let width = i64::try_from(size).unwrap_or(i64::MAX);
        let scope = &mut self.scopes[self.current];
        let location = match class {
            StorageClass::Global => Some(self.locations.fresh(depth, GLOBAL_OFFSET, size)),
            StorageClass::LocalFunc => Some(self.locations.fresh(depth, 0, 0)),
            StorageClass::LocalVar => {
                let offset = scope.var_offset;
                scope.var_offset = scope.var_offset.saturating_add(width);
                Some(self.locations.shared(depth, offset, size))
            }
            StorageClass::Argument => {
                scope.arg_offset = scope.arg_offset.saturating_sub(width);
                let offset = scope.arg_offset;
                Some(self.locations.shared(depth + 1, offset, size))
            }
            StorageClass::LocalConst => None,
        };

        let id = SymbolId(self.entries.len() as u32);
        self.entries.push(Entry {
            name: name.to_string(),
            ty,
            class,
            value,
            location,
            active: true,
            scope: self.current,
        });
        self.scopes[self.current].end = self.entries.len();
        log::debug!(
            "inserted {} '{}' as {:?} at depth {} ({:?})",
            class,
            name,
            id,
            depth,
            location.map(|l| self.locations.get(l))
        );
        Ok(id)
    }

    fn find_in<F>(&self, scope: usize, mut accept: F) -> Option<SymbolId>
    where
        F: FnMut(usize, &Entry) -> bool,
    {
        let Scope { begin, end, .. } = self.scopes[scope];
        (begin..end)
            .rev()
            .find(|&i| {
                let entry = &self.entries[i];
                entry.scope == scope && self.visible(i) && accept(i, entry)
            })
            .map(|i| SymbolId(i as u32))
    }

    fn chain(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.current), |&s| self.scopes[s].parent)
    }

    /// Most recent visible entry named `name` in the current scope
    pub fn lookup_current(&self, name: &str) -> Option<SymbolId> {
        self.find_in(self.current, |_, e| e.name == name)
    }

    /// Innermost visible entry named `name` in any open scope
    pub fn lookup_all(&self, name: &str) -> Option<SymbolId> {
        self.chain()
            .find_map(|scope| self.find_in(scope, |_, e| e.name == name))
    }

    fn function_matches(&self, entry: &Entry, name: &str, args: &[TypeId], types: &TypeTable) -> bool {
        entry.class == StorageClass::LocalFunc
            && entry.name == name
            && entry
                .ty
                .is_some_and(|t| types.check_args(types.function_args(t), args))
    }

    /// Function in the current scope whose declared arguments match `args`
    pub fn lookup_function(&self, name: &str, args: &[TypeId], types: &TypeTable) -> Option<SymbolId> {
        self.find_in(self.current, |_, e| self.function_matches(e, name, args, types))
    }

    /// Function in any open scope whose declared arguments match `args`
    pub fn lookup_function_all(
        &self,
        name: &str,
        args: &[TypeId],
        types: &TypeTable,
    ) -> Option<SymbolId> {
        self.chain().find_map(|scope| {
            self.find_in(scope, |_, e| self.function_matches(e, name, args, types))
        })
    }

    /// Whether `id` names a function whose declared arguments match `args`
    pub fn accepts(&self, id: SymbolId, args: &[TypeId], types: &TypeTable) -> bool {
        let entry = self.entry(id);
        self.function_matches(entry, &entry.name, args, types)
    }

    pub fn entry(&self, id: SymbolId) -> &Entry {
        &self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (SymbolId(i as u32), e))
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    /// Table dump with types printed through `types`
    pub fn display<'a>(&'a self, types: &'a TypeTable) -> SymbolDump<'a> {
        SymbolDump {
            symbols: self,
            types,
        }
    }
}

pub struct SymbolDump<'a> {
    symbols: &'a SymbolTable,
    types: &'a TypeTable,
}

impl fmt::Display for SymbolDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SYM:cnt={}", self.symbols.len())?;
        for (id, entry) in self.symbols.iter() {
            let ty = entry
                .ty
                .map_or_else(|| "-".to_string(), |t| self.types.display(t).to_string());
            let loc = entry
                .location
                .map_or_else(|| "-".to_string(), |l| l.index().to_string());
            writeln!(
                f,
                "{:4}:{:<10} {:>6} {:6} loc={:<4} {}",
                id.index(),
                entry.name,
                entry.class,
                entry.value,
                loc,
                ty
            )?;
        }
        Ok(())
    }
}
