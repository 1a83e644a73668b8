//! Bit-level layout of program types
//!
//! Width computation for flattening aggregates, and byte-size expressions for
//! pointer arithmetic. The first declared struct member occupies the highest
//! bits of the flattened representation.

use num_bigint::BigUint;

use crate::expr::Expr;
use crate::namespace::Namespace;
use crate::types::Type;

/// Total width in bits of a type once flattened, or `None` when the type has
/// no bit-level representation (void).
pub fn bit_width(ty: &Type, ns: &Namespace) -> Option<u64> {
    match ty {
        Type::Bool => Some(1),
        Type::UnsignedBv(width) | Type::SignedBv(width) => Some(u64::from(*width)),
        Type::Pointer(_) => Some(64),
        Type::Array { element, size } => Some(bit_width(element, ns)? * size),
        Type::StructTag(tag) => {
            let definition = ns.follow_tag(tag);
            let mut total = 0u64;
            for component in &definition.components {
                total += bit_width(&component.ty, ns)?;
            }
            Some(total)
        }
        Type::Empty => None,
    }
}

/// Size of a type in bytes as a program expression of the size type, rounding
/// partial bytes up. `None` when the size is not statically computable.
pub fn size_of_expr(ty: &Type, ns: &Namespace) -> Option<Expr> {
    let bits = bit_width(ty, ns)?;
    let bytes = bits.div_ceil(8);
    Some(Expr::bv_literal(BigUint::from(bytes), Type::size_type()))
}
