//! Structural type system
//!
//! Types live in a [`TypeTable`] arena and are referred to by [`TypeId`].
//! The five primitive types are interned once when the table is created;
//! every array, pointer, function and struct mention allocates a fresh
//! composite type, so two declarations of `int[3]` get two ids that compare
//! equal structurally.
//!
//! # Equality
//!
//! - primitives: equal iff they are the same primitive, except that `int`
//!   and `char` are mutually equal (implicit conversion allowance)
//! - arrays: same size and equal element types
//! - pointers: equal element types
//! - every other pair, including any cross-kind pair, is unequal
//!
//! # Sizes
//!
//! Sizes are counted in frame slots: 1 for scalars, pointers and structs,
//! 0 for functions, `count * size(element)` for arrays. Array sizes saturate
//! at [`MAX_TYPE_SIZE`].

pub mod infer;

use crate::constants::MAX_TYPE_SIZE;
use std::fmt;

/// Handle of a type in the [`TypeTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive types, interned at fixed ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Char,
    Float,
    String,
    Void,
}

impl Primitive {
    const ALL: [Primitive; 5] = [
        Primitive::Int,
        Primitive::Char,
        Primitive::Float,
        Primitive::String,
        Primitive::Void,
    ];

    fn id(self) -> TypeId {
        TypeId(self as u32)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Primitive::Int => "int",
            Primitive::Char => "char",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Void => "void",
        };
        f.write_str(s)
    }
}

/// A named struct field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    Array {
        element: TypeId,
        size: usize,
    },
    Pointer {
        element: TypeId,
    },
    /// `args` stays `None` until the parameter list has been parsed
    Function {
        ret: TypeId,
        args: Option<Vec<TypeId>>,
    },
    Struct {
        fields: Vec<Field>,
    },
}

/// Arena of every type built during one compilation
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let types = Primitive::ALL.iter().map(|&p| Type::Primitive(p)).collect();
        Self { types }
    }

    pub fn primitive(&self, p: Primitive) -> TypeId {
        p.id()
    }

    pub fn int(&self) -> TypeId {
        Primitive::Int.id()
    }

    pub fn char(&self) -> TypeId {
        Primitive::Char.id()
    }

    pub fn float(&self) -> TypeId {
        Primitive::Float.id()
    }

    pub fn string(&self) -> TypeId {
        Primitive::String.id()
    }

    pub fn void(&self) -> TypeId {
        Primitive::Void.id()
    }

    fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Fixed-size array type. The size must be positive.
    pub fn array(&mut self, element: TypeId, size: usize) -> TypeId {
        debug_assert!(size > 0, "array size must be positive");
        self.alloc(Type::Array { element, size })
    }

    pub fn pointer(&mut self, element: TypeId) -> TypeId {
        self.alloc(Type::Pointer { element })
    }

    /// Function type whose argument list is attached later with [`TypeTable::set_function_args`]
    pub fn function(&mut self, ret: TypeId) -> TypeId {
        self.alloc(Type::Function { ret, args: None })
    }

    /// Attach the declared argument types to a function type. Only the
    /// first call has an effect; returns whether it did.
    pub fn set_function_args(&mut self, func: TypeId, arg_types: Vec<TypeId>) -> bool {
        match &mut self.types[func.index()] {
            Type::Function { args: slot @ None, .. } => {
                *slot = Some(arg_types);
                true
            }
            other => {
                log::warn!("cannot attach arguments to {:?}", other);
                false
            }
        }
    }

    pub fn struct_type(&mut self, fields: Vec<Field>) -> TypeId {
        self.alloc(Type::Struct { fields })
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declared argument types of a function type (empty until attached)
    pub fn function_args(&self, id: TypeId) -> &[TypeId] {
        match self.get(id) {
            Type::Function { args: Some(args), .. } => args,
            _ => &[],
        }
    }

    pub fn function_return(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    /// Element type of an array
    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// Pointee of a pointer
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Pointer { element } => Some(*element),
            _ => None,
        }
    }

    /// Structural equality
    pub fn equal(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Type::Primitive(x), Type::Primitive(y)) => {
                x == y
                    || matches!(
                        (x, y),
                        (Primitive::Int, Primitive::Char) | (Primitive::Char, Primitive::Int)
                    )
            }
            (
                Type::Array {
                    element: ea,
                    size: sa,
                },
                Type::Array {
                    element: eb,
                    size: sb,
                },
            ) => sa == sb && self.equal(*ea, *eb),
            (Type::Pointer { element: ea }, Type::Pointer { element: eb }) => self.equal(*ea, *eb),
            _ => false,
        }
    }

    /// Positional argument match: both lists must have the same length and
    /// every pair must be structurally equal.
    pub fn check_args(&self, declared: &[TypeId], actual: &[TypeId]) -> bool {
        declared.len() == actual.len()
            && declared
                .iter()
                .zip(actual)
                .all(|(&d, &a)| self.equal(d, a))
    }

    /// Size of a type in frame slots, saturating at [`MAX_TYPE_SIZE`]
    pub fn size_of(&self, id: TypeId) -> usize {
        match self.get(id) {
            Type::Function { .. } => 0,
            Type::Array { element, size } => size
                .saturating_mul(self.size_of(*element))
                .min(MAX_TYPE_SIZE),
            _ => 1,
        }
    }

    /// Printable form, e.g. `array(3)<prim<int>>`
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, id }
    }
}

pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    id: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |id| self.table.display(id);
        match self.table.get(self.id) {
            Type::Primitive(p) => write!(f, "prim<{}>", p),
            Type::Array { element, size } => write!(f, "array({})<{}>", size, show(*element)),
            Type::Pointer { element } => write!(f, "pointer<{}>", show(*element)),
            Type::Function { ret, args } => {
                write!(f, "function<{}>(", show(*ret))?;
                for (i, arg) in args.iter().flatten().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", show(*arg))?;
                }
                write!(f, ")")
            }
            Type::Struct { fields } => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", field.name, show(field.ty))?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_primitives_are_interned() {
        let types = TypeTable::new();
        assert_eq!(types.int(), types.primitive(Primitive::Int));
        assert_ne!(types.int(), types.float());
        assert_eq!(types.len(), 5);
    }

    #[test]
    fn test_array_equality_is_structural() {
        let mut types = TypeTable::new();
        let int = types.int();
        let a = types.array(int, 3);
        let b = types.array(int, 3);
        let c = types.array(int, 4);

        assert_ne!(a, b);
        assert!(types.equal(a, b));
        assert!(!types.equal(a, c));
    }

    #[test]
    fn test_nested_arrays_compare_recursively() {
        let mut types = TypeTable::new();
        let int = types.int();
        let float = types.float();
        let inner_a = types.array(int, 2);
        let inner_b = types.array(float, 2);
        let a = types.array(inner_a, 5);
        let b = types.array(inner_b, 5);
        let inner_c = types.array(int, 2);
        let c = types.array(inner_c, 5);

        assert!(!types.equal(a, b));
        assert!(types.equal(a, c));
    }

    #[rstest]
    #[case(Primitive::Int, Primitive::Char, true)]
    #[case(Primitive::Char, Primitive::Int, true)]
    #[case(Primitive::Int, Primitive::Int, true)]
    #[case(Primitive::Int, Primitive::Float, false)]
    #[case(Primitive::Float, Primitive::String, false)]
    #[case(Primitive::Char, Primitive::Void, false)]
    fn test_primitive_equality(#[case] a: Primitive, #[case] b: Primitive, #[case] expected: bool) {
        let types = TypeTable::new();
        assert_eq!(types.equal(types.primitive(a), types.primitive(b)), expected);
    }

    #[test]
    fn test_cross_kind_is_unequal() {
        let mut types = TypeTable::new();
        let int = types.int();
        let ptr = types.pointer(int);
        let arr = types.array(int, 1);
        let func = types.function(int);

        assert!(!types.equal(ptr, arr));
        assert!(!types.equal(arr, int));
        assert!(!types.equal(func, int));
        assert!(!types.equal(func, func));
    }

    #[test]
    fn test_pointer_equality() {
        let mut types = TypeTable::new();
        let int = types.int();
        let char = types.char();
        let float = types.float();
        let p = types.pointer(int);
        let q = types.pointer(char);
        let r = types.pointer(float);

        assert!(types.equal(p, q));
        assert!(!types.equal(p, r));
    }

    #[test]
    fn test_struct_types_never_compare_equal() {
        let mut types = TypeTable::new();
        let int = types.int();
        let s = types.struct_type(vec![Field {
            name: "x".to_string(),
            ty: int,
        }]);
        assert!(!types.equal(s, s));
        assert_eq!(types.size_of(s), 1);
    }

    #[rstest]
    #[case(&[Primitive::Int, Primitive::Float], &[Primitive::Int, Primitive::Float], true)]
    #[case(&[Primitive::Int], &[Primitive::Int, Primitive::Float], false)]
    #[case(&[Primitive::Int, Primitive::Float], &[Primitive::Int], false)]
    #[case(&[Primitive::Int], &[Primitive::Char], true)]
    #[case(&[], &[], true)]
    #[case(&[Primitive::String], &[Primitive::Float], false)]
    fn test_check_args(
        #[case] declared: &[Primitive],
        #[case] actual: &[Primitive],
        #[case] expected: bool,
    ) {
        let types = TypeTable::new();
        let declared: Vec<_> = declared.iter().map(|&p| types.primitive(p)).collect();
        let actual: Vec<_> = actual.iter().map(|&p| types.primitive(p)).collect();
        assert_eq!(types.check_args(&declared, &actual), expected);
    }

    #[test]
    fn test_sizes() {
        let mut types = TypeTable::new();
        let int = types.int();
        let row = types.array(int, 4);
        let grid = types.array(row, 3);
        let func = types.function(int);
        let ptr = types.pointer(grid);

        assert_eq!(types.size_of(int), 1);
        assert_eq!(types.size_of(row), 4);
        assert_eq!(types.size_of(grid), 12);
        assert_eq!(types.size_of(func), 0);
        assert_eq!(types.size_of(ptr), 1);
    }

    #[test]
    fn test_nested_array_size_saturates() {
        let mut types = TypeTable::new();
        let mut ty = types.int();
        for _ in 0..4 {
            ty = types.array(ty, 1 << 20);
        }
        assert_eq!(types.size_of(ty), MAX_TYPE_SIZE);
    }

    #[test]
    fn test_function_args_attach_once() {
        let mut types = TypeTable::new();
        let void = types.void();
        let int = types.int();
        let float = types.float();
        let f = types.function(void);

        assert!(types.function_args(f).is_empty());
        assert!(types.set_function_args(f, vec![int, float]));
        assert!(!types.set_function_args(f, vec![int]));
        assert_eq!(types.function_args(f), &[int, float]);
        assert_eq!(types.function_return(f), Some(void));
        assert_eq!(
            types.display(f).to_string(),
            "function<prim<void>>(prim<int>, prim<float>)"
        );
    }

    #[test]
    fn test_display() {
        let mut types = TypeTable::new();
        let char = types.char();
        let arr = types.array(char, 8);
        let p = types.pointer(arr);
        assert_eq!(types.display(p).to_string(), "pointer<array(8)<prim<char>>>");
    }
}
