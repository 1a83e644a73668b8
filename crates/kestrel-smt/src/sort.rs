//! Solver-level sorts
//!
//! Sorts are the types of terms in SMT-LIB. The incremental layer only ever
//! produces booleans, fixed-width bitvectors and arrays over them;
//! uninterpreted-function signatures live on the function identifier.

use std::fmt;

/// A sort in the solver-facing term algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Bitvector sort with width
    BitVec(u32),
    /// Array sort with index and element sorts
    Array(Box<Sort>, Box<Sort>),
}

impl Sort {
    /// Construct an array sort.
    pub fn array(index: Sort, element: Sort) -> Self {
        Sort::Array(Box::new(index), Box::new(element))
    }

    /// The bit width of a bitvector sort, `None` otherwise.
    pub fn bv_width(&self) -> Option<u32> {
        match self {
            Sort::BitVec(width) => Some(*width),
            _ => None,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::BitVec(width) => write!(f, "(_ BitVec {width})"),
            Sort::Array(index, element) => write!(f, "(Array {index} {element})"),
        }
    }
}
