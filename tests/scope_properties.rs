// Property tests for scope nesting in the symbol table

use proptest::prelude::*;
use tinyj::symbols::{StorageClass, SymbolError, SymbolId, SymbolTable};
use tinyj::types::TypeTable;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
enum Op {
    Enter,
    Leave,
    Insert(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Enter),
        2 => Just(Op::Leave),
        5 => (0..NAMES.len()).prop_map(Op::Insert),
    ]
}

/// Open scopes, innermost last, with the entries each one declared
struct Model {
    scopes: Vec<Vec<(usize, SymbolId)>>,
}

impl Model {
    fn lookup(&self, name: usize) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().rev().find(|(n, _)| *n == name).map(|(_, id)| *id))
    }

    fn declared_here(&self, name: usize) -> Option<SymbolId> {
        self.scopes
            .last()
            .and_then(|scope| scope.iter().find(|(n, _)| *n == name).map(|(_, id)| *id))
    }
}

proptest! {
    #[test]
    fn lookup_sees_only_open_scopes_innermost_first(ops in prop::collection::vec(op(), 0..64)) {
        let types = TypeTable::new();
        let mut symbols = SymbolTable::with_limits(10_000, 10_000);
        let mut model = Model { scopes: vec![Vec::new()] };
        let mut inserted = 0;

        for op in ops {
            match op {
                Op::Enter => {
                    symbols.enter_scope().unwrap();
                    model.scopes.push(Vec::new());
                }
                Op::Leave => {
                    symbols.leave_scope();
                    if model.scopes.len() > 1 {
                        model.scopes.pop();
                    }
                }
                Op::Insert(name) => {
                    let result = symbols.insert(
                        NAMES[name],
                        Some(types.int()),
                        StorageClass::LocalVar,
                        0,
                        &types,
                    );
                    match model.declared_here(name) {
                        Some(existing) => {
                            prop_assert!(matches!(
                                result,
                                Err(SymbolError::Duplicate { existing: e }) if e == existing
                            ), "expected Duplicate error naming the existing symbol");
                        }
                        None => {
                            let id = result.unwrap();
                            inserted += 1;
                            model.scopes.last_mut().unwrap().push((name, id));
                        }
                    }
                }
            }

            prop_assert_eq!(symbols.depth(), model.scopes.len() - 1);
            prop_assert_eq!(symbols.len(), inserted);
            for (name, text) in NAMES.iter().enumerate() {
                prop_assert_eq!(symbols.lookup_all(text), model.lookup(name));
            }
        }
    }

    #[test]
    fn closed_scopes_keep_their_entries(depth in 1usize..8) {
        let types = TypeTable::new();
        let mut symbols = SymbolTable::new();
        for level in 0..depth {
            symbols.enter_scope().unwrap();
            symbols
                .insert(NAMES[level % NAMES.len()], Some(types.int()), StorageClass::LocalVar, 0, &types)
                .unwrap();
        }
        for _ in 0..depth {
            symbols.leave_scope();
        }

        prop_assert_eq!(symbols.depth(), 0);
        prop_assert_eq!(symbols.len(), depth);
        prop_assert!(symbols.iter().all(|(_, entry)| !entry.active));
        for name in NAMES {
            prop_assert_eq!(symbols.lookup_all(name), None);
        }
    }
}
