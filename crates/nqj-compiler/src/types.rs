//! Semantic types and the subtype relation.
//!
//! ```text
//!                 any
//!        ┌───────┬──┴────┬──────────┐
//!       int   boolean  T[] ...   classes (by inheritance)
//!                        └────┬─────┘
//!                            null
//! ```
//!
//! `any` is the error-recovery sentinel: it is both a supertype and a
//! subtype of everything, so an expression that already failed to check
//! never causes a second diagnostic.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A semantic type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Null,
    Any,
    Array(ArrayType),
    Class(ClassType),
}

impl Type {
    /// The only relation between types; equality is mutual subtyping.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Int, Type::Int) | (Type::Bool, Type::Bool) | (Type::Null, Type::Null) => true,
            (Type::Null, Type::Array(_) | Type::Class(_)) => true,
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Class(c), Type::Class(d)) => c.is_subclass_of(d),
            _ => false,
        }
    }

    pub fn is_equal_to(&self, other: &Type) -> bool {
        self.is_subtype_of(other) && other.is_subtype_of(self)
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Type::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("boolean"),
            Type::Null => f.write_str("null"),
            Type::Any => f.write_str("any"),
            Type::Array(array) => write!(f, "{}[]", array.component()),
            Type::Class(class) => f.write_str(class.name()),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
// Array Types
// ============================================================================

/// `T[]`. Instances are memoized per component by
/// [`NameTable::array_of`](crate::NameTable::array_of) and compared by identity.
#[derive(Clone)]
pub struct ArrayType(Rc<Type>);

impl ArrayType {
    pub(crate) fn new(component: Type) -> Self {
        Self(Rc::new(component))
    }

    pub fn component(&self) -> &Type {
        &self.0
    }
}

impl PartialEq for ArrayType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ArrayType {}

impl Hash for ArrayType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[]", self.component())
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Immutable descriptor of a declared class.
#[derive(Debug)]
pub struct ClassRef {
    name: String,
    /// Index of the declaration in the program's class list.
    decl_index: usize,
    superclass: Option<ClassType>,
}

impl ClassRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decl_index(&self) -> usize {
        self.decl_index
    }

    pub fn superclass(&self) -> Option<&ClassType> {
        self.superclass.as_ref()
    }
}

/// The type of instances of a class. Equality is by class name.
#[derive(Clone)]
pub struct ClassType(Rc<ClassRef>);

impl ClassType {
    pub(crate) fn new(name: impl Into<String>, decl_index: usize, superclass: Option<ClassType>) -> Self {
        Self(Rc::new(ClassRef {
            name: name.into(),
            decl_index,
            superclass,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn class_ref(&self) -> &ClassRef {
        &self.0
    }

    pub fn decl_index(&self) -> usize {
        self.0.decl_index
    }

    pub fn superclass(&self) -> Option<&ClassType> {
        self.0.superclass.as_ref()
    }

    /// This class followed by its superclass chain.
    pub fn ancestors(&self) -> impl Iterator<Item = &ClassType> {
        std::iter::successors(Some(self), |class| class.superclass())
    }

    pub fn is_subclass_of(&self, other: &ClassType) -> bool {
        self.ancestors().any(|class| class == other)
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for ClassType {}

impl Hash for ClassType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.superclass() {
            Some(superclass) => write!(f, "{} extends {}", self.name(), superclass.name()),
            None => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (ClassType, ClassType, ClassType) {
        let a = ClassType::new("A", 0, None);
        let b = ClassType::new("B", 1, Some(a.clone()));
        let c = ClassType::new("C", 2, Some(b.clone()));
        (a, b, c)
    }

    #[test]
    fn subtyping_is_reflexive() {
        let (a, _, _) = chain();
        let array = Type::Array(ArrayType::new(Type::Int));
        for ty in [Type::Int, Type::Bool, Type::Null, Type::Any, array, Type::Class(a)] {
            assert!(ty.is_subtype_of(&ty), "{ty} <: {ty}");
            assert!(ty.is_equal_to(&ty));
        }
    }

    #[test]
    fn any_is_top_and_bottom() {
        let (a, _, _) = chain();
        for ty in [Type::Int, Type::Bool, Type::Null, Type::Class(a)] {
            assert!(ty.is_subtype_of(&Type::Any));
            assert!(Type::Any.is_subtype_of(&ty));
        }
    }

    #[test]
    fn null_is_subtype_of_references_only() {
        let (a, _, _) = chain();
        let array = Type::Array(ArrayType::new(Type::Bool));
        assert!(Type::Null.is_subtype_of(&Type::Class(a.clone())));
        assert!(Type::Null.is_subtype_of(&array));
        assert!(!Type::Null.is_subtype_of(&Type::Int));
        assert!(!Type::Null.is_subtype_of(&Type::Bool));
        assert!(!Type::Class(a).is_subtype_of(&Type::Null));
        assert!(!array.is_subtype_of(&Type::Null));
    }

    #[test]
    fn class_chain() {
        let (a, b, c) = chain();
        assert!(Type::Class(c.clone()).is_subtype_of(&Type::Class(a.clone())));
        assert!(Type::Class(c.clone()).is_subtype_of(&Type::Class(b.clone())));
        assert!(!Type::Class(a.clone()).is_subtype_of(&Type::Class(c.clone())));
        assert!(!Type::Class(b).is_equal_to(&Type::Class(c)));
        assert!(!Type::Class(a).is_subtype_of(&Type::Int));
    }

    #[test]
    fn class_equality_is_by_name() {
        let first = ClassType::new("A", 0, None);
        let second = ClassType::new("A", 3, None);
        assert_eq!(first, second);
    }

    #[test]
    fn arrays_compare_by_identity() {
        let ints = ArrayType::new(Type::Int);
        let other_ints = ArrayType::new(Type::Int);
        assert!(Type::Array(ints.clone()).is_subtype_of(&Type::Array(ints.clone())));
        assert!(!Type::Array(ints).is_subtype_of(&Type::Array(other_ints)));
    }

    #[test]
    fn display() {
        let (a, _, _) = chain();
        let nested = ArrayType::new(Type::Array(ArrayType::new(Type::Class(a))));
        assert_eq!(Type::Array(nested).to_string(), "A[][]");
        assert_eq!(Type::Bool.to_string(), "boolean");
        assert_eq!(Type::Any.to_string(), "any");
    }

    #[test]
    fn debug_names_array_types() {
        let ints = ArrayType::new(Type::Int);
        assert_eq!(format!("{ints:?}"), "int[]");
        assert_eq!(format!("{:?}", Type::Array(ints)), "int[]");
    }
}
