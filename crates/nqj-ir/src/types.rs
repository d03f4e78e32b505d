//! IR value types and entity identifiers.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A struct type registered in a [`Module`](crate::Module).
    StructId, "struct"
);
define_id!(
    /// A procedure registered in a [`Module`](crate::Module).
    ProcId, "proc"
);
define_id!(
    /// A basic block registered in a [`Procedure`](crate::Procedure).
    BlockId, "bb"
);
define_id!(
    /// A typed temporary of a [`Procedure`](crate::Procedure).
    TempId, "%t"
);

/// Byte size of an `int`.
pub const INT_SIZE: u32 = 4;
/// Byte size of a `bool` or byte.
pub const BOOL_SIZE: u32 = 1;
/// Byte size of any pointer.
pub const POINTER_SIZE: u32 = 8;

/// The type of an IR value or memory location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    /// 32-bit signed integer.
    Int,
    Bool,
    /// Untyped memory unit; raw allocations are byte pointers.
    Byte,
    Pointer(Box<IrType>),
    Struct(StructId),
    /// Fixed-length inline array; length 0 marks a trailing flexible member.
    Array { element: Box<IrType>, len: u32 },
    /// The type of the `null` constant; converts to any pointer.
    NullPointer,
    Void,
}

impl IrType {
    pub fn pointer_to(ty: IrType) -> IrType {
        IrType::Pointer(Box::new(ty))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Pointer(_) | IrType::NullPointer)
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Int => f.write_str("i32"),
            IrType::Bool => f.write_str("i1"),
            IrType::Byte => f.write_str("i8"),
            IrType::Pointer(inner) => write!(f, "{inner}*"),
            IrType::Struct(id) => write!(f, "%{id}"),
            IrType::Array { element, len } => write!(f, "[{len} x {element}]"),
            IrType::NullPointer => f.write_str("null"),
            IrType::Void => f.write_str("void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let array = IrType::Array {
            element: Box::new(IrType::Int),
            len: 0,
        };
        assert_eq!(array.to_string(), "[0 x i32]");
        assert_eq!(IrType::pointer_to(IrType::Struct(StructId(2))).to_string(), "%struct2*");
        assert_eq!(TempId(7).to_string(), "%t7");
    }

    #[test]
    fn pointee() {
        let ptr = IrType::pointer_to(IrType::Bool);
        assert_eq!(ptr.pointee(), Some(&IrType::Bool));
        assert!(ptr.is_pointer());
        assert!(IrType::NullPointer.is_pointer());
        assert_eq!(IrType::Int.pointee(), None);
    }
}
