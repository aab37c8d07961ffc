//! The recursive type grammar.
//!
//! Types are immutable value objects: no pass mutates a `Type` in place,
//! and composite nodes share children through `Arc` so rewrites can
//! reuse unchanged subtrees.

use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use prism_ir::{Name, Span, StringInterner};

use crate::registry::ProtocolId;

/// Scalar types built into the language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Native {
    Void,
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    Uint,
    Float,
    Double,
}

impl Native {
    /// Source-level spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Native::Void => "void",
            Native::Bool => "bool",
            Native::Int => "int",
            Native::Uint => "uint",
            Native::Float => "float",
            Native::Double => "double",
        }
    }

    /// Whether the scalar is numeric.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Native::Int | Native::Uint | Native::Float | Native::Double
        )
    }
}

/// Address space of pointer-shaped types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AddressSpace {
    Constant,
    Device,
    Threadgroup,
    Thread,
}

impl AddressSpace {
    /// Source-level spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            AddressSpace::Constant => "constant",
            AddressSpace::Device => "device",
            AddressSpace::Threadgroup => "threadgroup",
            AddressSpace::Thread => "thread",
        }
    }
}

/// Generic type variable.
///
/// Equality and hashing use the `id` alone: a variable is a binder
/// identity, not a name. Two variables spelled `T` in nested generic
/// scopes are distinct variables and must never compare equal, so ids
/// are allocated uniquely per program.
#[derive(Copy, Clone, Debug)]
pub struct TypeVar {
    /// Identity, unique per variable within a program.
    pub id: u32,
    /// Source-level spelling, for diagnostics.
    pub name: Name,
    /// Declaration site, for diagnostics.
    pub origin: Span,
    /// Protocol bound (`T : P`), if any.
    pub constraint: Option<ProtocolId>,
}

impl TypeVar {
    /// An unconstrained variable.
    pub const fn new(id: u32, name: Name, origin: Span) -> Self {
        TypeVar {
            id,
            name,
            origin,
            constraint: None,
        }
    }

    /// A variable bounded by a protocol.
    pub const fn constrained(id: u32, name: Name, origin: Span, protocol: ProtocolId) -> Self {
        TypeVar {
            id,
            name,
            origin,
            constraint: Some(protocol),
        }
    }
}

impl PartialEq for TypeVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeVar {}

impl Hash for TypeVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A named field of a struct type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructField {
    pub name: Name,
    pub ty: Type,
    /// Declaration site, for diagnostics.
    pub origin: Span,
}

/// A struct type.
///
/// Equality and hashing are nominal (by name): after name resolution
/// there is exactly one struct declaration per name, and pointer-linked
/// fields may refer back to the struct itself.
#[derive(Clone, Debug)]
pub struct StructType {
    pub name: Name,
    /// Fields in declaration order.
    pub fields: Arc<[StructField]>,
}

impl StructType {
    pub fn new(name: Name, fields: Vec<StructField>) -> Self {
        StructType {
            name,
            fields: fields.into(),
        }
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for StructType {}

impl Hash for StructType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// An enum type. Nominal equality, like structs.
#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: Name,
    /// Member names in declaration order.
    pub members: Arc<[Name]>,
}

impl EnumType {
    pub fn new(name: Name, members: Vec<Name>) -> Self {
        EnumType {
            name,
            members: members.into(),
        }
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    /// Built-in scalar.
    Native(Native),

    /// Nominal struct.
    Struct(StructType),

    /// Nominal enum.
    Enum(EnumType),

    /// Pointer into an address space.
    Ptr {
        space: AddressSpace,
        inner: Arc<Type>,
    },

    /// Fixed-size array.
    Array { elem: Arc<Type>, size: u32 },

    /// Bounds-carrying reference to an array in an address space.
    ArrayRef {
        space: AddressSpace,
        elem: Arc<Type>,
    },

    /// Column-major matrix.
    Matrix {
        rows: u8,
        cols: u8,
        elem: Arc<Type>,
    },

    /// Short vector.
    Vector { size: u8, elem: Arc<Type> },

    /// Generic type variable; compared by identity.
    Var(TypeVar),

    /// Unresolved reference, awaiting name resolution. Reaching the
    /// resolver or unifier is a fatal error.
    Ref { name: Name, args: Arc<[Type]> },

    /// Placeholder for an int literal awaiting inference.
    IntLiteral,

    /// Placeholder for a uint literal awaiting inference.
    UintLiteral,

    /// Placeholder for a float literal awaiting inference.
    FloatLiteral,
}

impl Type {
    /// Pointer to `inner` in `space`.
    pub fn ptr(space: AddressSpace, inner: Type) -> Type {
        Type::Ptr {
            space,
            inner: Arc::new(inner),
        }
    }

    /// Fixed-size array of `elem`.
    pub fn array(elem: Type, size: u32) -> Type {
        Type::Array {
            elem: Arc::new(elem),
            size,
        }
    }

    /// Array reference to `elem` in `space`.
    pub fn array_ref(space: AddressSpace, elem: Type) -> Type {
        Type::ArrayRef {
            space,
            elem: Arc::new(elem),
        }
    }

    /// Matrix of `elem` with the given shape.
    pub fn matrix(rows: u8, cols: u8, elem: Type) -> Type {
        Type::Matrix {
            rows,
            cols,
            elem: Arc::new(elem),
        }
    }

    /// Vector of `elem` with the given length.
    pub fn vector(size: u8, elem: Type) -> Type {
        Type::Vector {
            size,
            elem: Arc::new(elem),
        }
    }

    /// Unresolved reference with type arguments.
    pub fn reference(name: Name, args: Vec<Type>) -> Type {
        Type::Ref {
            name,
            args: args.into(),
        }
    }

    /// Whether this is a numeric-literal inference placeholder.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Type::IntLiteral | Type::UintLiteral | Type::FloatLiteral
        )
    }

    /// The scalar a literal placeholder collapses to when inference
    /// finds no stronger requirement.
    pub fn preferred_native(&self) -> Option<Native> {
        match self {
            Type::IntLiteral => Some(Native::Int),
            Type::UintLiteral => Some(Native::Uint),
            Type::FloatLiteral => Some(Native::Float),
            _ => None,
        }
    }

    /// Whether a literal placeholder may collapse to `native`.
    pub fn literal_accepts(&self, native: Native) -> bool {
        match self {
            Type::IntLiteral => matches!(
                native,
                Native::Int | Native::Uint | Native::Float | Native::Double
            ),
            Type::UintLiteral => matches!(native, Native::Uint | Native::Float | Native::Double),
            Type::FloatLiteral => matches!(native, Native::Float | Native::Double),
            _ => false,
        }
    }

    /// Whether the variable with `id` occurs anywhere in this type.
    ///
    /// Struct fields are not traversed: nominal types cannot capture a
    /// generic variable from an enclosing signature.
    pub fn contains_var(&self, id: u32) -> bool {
        match self {
            Type::Var(v) => v.id == id,
            Type::Ptr { inner, .. } => inner.contains_var(id),
            Type::Array { elem, .. }
            | Type::ArrayRef { elem, .. }
            | Type::Matrix { elem, .. }
            | Type::Vector { elem, .. } => elem.contains_var(id),
            Type::Ref { args, .. } => args.iter().any(|a| a.contains_var(id)),
            Type::Native(_)
            | Type::Struct(_)
            | Type::Enum(_)
            | Type::IntLiteral
            | Type::UintLiteral
            | Type::FloatLiteral => false,
        }
    }

    /// Render for diagnostics.
    pub fn display(&self, interner: &StringInterner) -> String {
        match self {
            Type::Native(n) => n.as_str().to_owned(),
            Type::Struct(s) => interner.lookup(s.name).to_owned(),
            Type::Enum(e) => interner.lookup(e.name).to_owned(),
            Type::Ptr { space, inner } => {
                format!("{} {}^", space.as_str(), inner.display(interner))
            }
            Type::Array { elem, size } => format!("{}[{}]", elem.display(interner), size),
            Type::ArrayRef { space, elem } => {
                format!("{} {}[]", space.as_str(), elem.display(interner))
            }
            Type::Matrix { rows, cols, elem } => {
                format!("matrix<{}, {}, {}>", elem.display(interner), rows, cols)
            }
            Type::Vector { size, elem } => {
                format!("vector<{}, {}>", elem.display(interner), size)
            }
            Type::Var(v) => interner.lookup(v.name).to_owned(),
            Type::Ref { name, args } => {
                let mut out = interner.lookup(*name).to_owned();
                if !args.is_empty() {
                    out.push('<');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{}", arg.display(interner));
                    }
                    out.push('>');
                }
                out
            }
            Type::IntLiteral => "int literal".to_owned(),
            Type::UintLiteral => "uint literal".to_owned(),
            Type::FloatLiteral => "float literal".to_owned(),
        }
    }
}
