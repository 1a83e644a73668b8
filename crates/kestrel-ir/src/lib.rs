//! Kestrel IR - typed program representation consumed by the solver layer
//!
//! This crate provides the slice of the program representation the decision
//! procedure operates on:
//! - Types (booleans, signed/unsigned bitvectors, structs, arrays, pointers)
//! - Expressions with embedded types and structural equality
//! - The namespace resolving struct tags to declarations
//! - Bit-level layout and byte-size computation

#![warn(missing_docs)]

pub mod expr;
pub mod layout;
pub mod namespace;
pub mod types;

pub use expr::{ArithOp, CompareOp, Expr, ExprKind};
pub use layout::{bit_width, size_of_expr};
pub use namespace::{Namespace, StructComponent, StructDefinition};
pub use types::Type;
