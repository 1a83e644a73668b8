//! Program-level types
//!
//! These are the C-like types carried by expressions handed to the decision
//! procedure: booleans, fixed-width bitvectors (signed and unsigned kept
//! distinct), struct tags resolved through a [`crate::Namespace`], arrays,
//! and pointers.

use std::fmt;

/// A program-level type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean type
    Bool,
    /// Unsigned bitvector with the given bit width
    UnsignedBv(u32),
    /// Signed (two's complement) bitvector with the given bit width
    SignedBv(u32),
    /// Reference to a struct declaration by tag name
    StructTag(String),
    /// Fixed-size array
    Array {
        /// Element type
        element: Box<Type>,
        /// Number of elements
        size: u64,
    },
    /// Pointer to a base type
    Pointer(Box<Type>),
    /// The void type; only meaningful as a pointer base
    Empty,
}

impl Type {
    /// Construct an array type.
    pub fn array(element: Type, size: u64) -> Self {
        Type::Array {
            element: Box::new(element),
            size,
        }
    }

    /// Construct a pointer type.
    pub fn pointer(base: Type) -> Self {
        Type::Pointer(Box::new(base))
    }

    /// The type used for object sizes and pointer offsets.
    pub fn size_type() -> Self {
        Type::UnsignedBv(64)
    }

    /// The type of pointer differences.
    pub fn pointer_difference_type() -> Self {
        Type::SignedBv(64)
    }

    /// Whether this is a pointer type.
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Whether this is a struct tag type.
    pub fn is_struct_tag(&self) -> bool {
        matches!(self, Type::StructTag(_))
    }

    /// Whether this is a signed or unsigned bitvector type.
    pub fn is_bitvector(&self) -> bool {
        matches!(self, Type::UnsignedBv(_) | Type::SignedBv(_))
    }

    /// Whether arithmetic on this type is signed.
    pub fn is_signed(&self) -> bool {
        matches!(self, Type::SignedBv(_))
    }

    /// The bit width of a bitvector type, `None` otherwise.
    pub fn bv_width(&self) -> Option<u32> {
        match self {
            Type::UnsignedBv(width) | Type::SignedBv(width) => Some(*width),
            _ => None,
        }
    }

    /// The base type of a pointer type, `None` otherwise.
    pub fn pointer_base(&self) -> Option<&Type> {
        match self {
            Type::Pointer(base) => Some(base),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::UnsignedBv(width) => write!(f, "u{width}"),
            Type::SignedBv(width) => write!(f, "i{width}"),
            Type::StructTag(tag) => write!(f, "struct {tag}"),
            Type::Array { element, size } => write!(f, "{element}[{size}]"),
            Type::Pointer(base) => write!(f, "{base}*"),
            Type::Empty => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_type_is_unsigned_64() {
        assert_eq!(Type::size_type(), Type::UnsignedBv(64));
        assert!(!Type::size_type().is_signed());
    }

    #[test]
    fn test_bv_width() {
        assert_eq!(Type::UnsignedBv(8).bv_width(), Some(8));
        assert_eq!(Type::SignedBv(32).bv_width(), Some(32));
        assert_eq!(Type::Bool.bv_width(), None);
        assert_eq!(Type::pointer(Type::Bool).bv_width(), None);
    }

    #[test]
    fn test_pointer_base() {
        let ptr = Type::pointer(Type::SignedBv(32));
        assert_eq!(ptr.pointer_base(), Some(&Type::SignedBv(32)));
        assert!(ptr.is_pointer());
        assert_eq!(Type::Bool.pointer_base(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::UnsignedBv(8).to_string(), "u8");
        assert_eq!(Type::array(Type::SignedBv(32), 4).to_string(), "i32[4]");
        assert_eq!(
            Type::pointer(Type::StructTag("point".into())).to_string(),
            "struct point*"
        );
        assert_eq!(Type::pointer(Type::Empty).to_string(), "void*");
    }
}
