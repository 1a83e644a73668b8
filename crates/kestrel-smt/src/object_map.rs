//! Pointer and object tracking
//!
//! Pointers lower to one bitvector split into an object id in the highest
//! bits and a byte offset below it. Object ids are handed out per
//! address-taken object. Two memoized maps support the lowering: the
//! pointer-size map holds one byte-size term per pointed-to base type, and
//! the object-size model constrains an uninterpreted `size_of_object`
//! function once per object id.

use num_bigint::BigUint;
use rustc_hash::FxHashMap;

use kestrel_ir::{bit_width, Expr, Namespace, Type};

use crate::error::{SmtError, SmtResult};
use crate::smtlib::Command;
use crate::sort::Sort;
use crate::struct_encoding::POINTER_WIDTH;
use crate::term::{Identifier, Term};

/// Bits of a pointer holding the object id.
pub const OBJECT_ID_BITS: u32 = 8;

/// Bits of a pointer holding the byte offset into the object.
pub const OBJECT_OFFSET_BITS: u32 = POINTER_WIDTH - OBJECT_ID_BITS;

/// The object id held in the highest bits of an encoded pointer.
pub fn object_id_of(pointer: Term) -> Term {
    Term::extract(POINTER_WIDTH - 1, OBJECT_OFFSET_BITS, pointer)
}

/// The byte offset held in the lower bits of an encoded pointer.
pub fn object_offset_of(pointer: Term) -> Term {
    Term::extract(OBJECT_OFFSET_BITS - 1, 0, pointer)
}

/// Build an encoded pointer from an object id and a byte offset.
pub fn pointer_from_parts(id: u64, offset: u64) -> Term {
    let value = (BigUint::from(id) << OBJECT_OFFSET_BITS) | BigUint::from(offset);
    Term::bv_literal(value, POINTER_WIDTH)
}

/// Numbering of address-taken objects. Ids are stable for the lifetime of
/// the map; id 0 is reserved for the null object.
#[derive(Debug, Default)]
pub struct ObjectMap {
    ids: FxHashMap<Expr, u64>,
}

impl ObjectMap {
    /// An empty object numbering.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of `object`, assigning the next free one on first sight.
    pub fn id_of(&mut self, object: &Expr) -> u64 {
        if let Some(id) = self.ids.get(object) {
            return *id;
        }
        let id = self.ids.len() as u64 + 1;
        assert!(
            id < 1 << OBJECT_ID_BITS,
            "more than {} distinct objects",
            (1u64 << OBJECT_ID_BITS) - 1
        );
        self.ids.insert(object.clone(), id);
        id
    }

    /// Number of objects tracked so far, the null object excluded.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no object has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Byte-size terms per pointed-to base type, computed lazily and at most
/// once per type. The first computed term stays, so every later use of the
/// same base type refers to the identical term.
#[derive(Debug, Default)]
pub struct PointerSizeMap {
    sizes: FxHashMap<Type, Term>,
}

impl PointerSizeMap {
    /// An empty size map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The byte-size term for values of `base`, computing and recording it
    /// on first request. A `void` target has no layout, so `void*`
    /// arithmetic steps a single byte.
    pub fn size_for(&mut self, base: &Type, ns: &Namespace) -> SmtResult<Term> {
        if let Some(size) = self.sizes.get(base) {
            return Ok(size.clone());
        }
        let bytes = match base {
            Type::Empty => 1,
            other => bit_width(other, ns)
                .ok_or_else(|| {
                    SmtError::Unsupported(format!("no byte size for pointed-to type {other}"))
                })?
                .div_ceil(8),
        };
        let size = Term::bv_literal(bytes, POINTER_WIDTH);
        self.sizes.insert(base.clone(), size.clone());
        Ok(size)
    }

    /// The recorded size term for `base`, if one was computed already.
    pub fn get(&self, base: &Type) -> Option<&Term> {
        self.sizes.get(base)
    }

    /// Number of base types with a recorded size.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether no size has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Record size terms for every pointer-typed immediate operand of `expr`.
/// A no-op for expressions without pointer operands.
pub fn associate_pointer_sizes(
    expr: &Expr,
    sizes: &mut PointerSizeMap,
    ns: &Namespace,
) -> SmtResult<()> {
    for operand in expr.operands() {
        if let Some(base) = operand.ty.pointer_base() {
            sizes.size_for(base, ns)?;
        }
    }
    Ok(())
}

/// The uninterpreted `size_of_object` function, constrained at most once
/// per object id.
#[derive(Debug)]
pub struct ObjectSizeModel {
    size_of_object: Identifier,
    constrained: FxHashMap<Term, Term>,
}

impl Default for ObjectSizeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSizeModel {
    /// A model with no objects constrained yet.
    pub fn new() -> Self {
        Self {
            size_of_object: Identifier::new("size_of_object", Sort::BitVec(POINTER_WIDTH)),
            constrained: FxHashMap::default(),
        }
    }

    /// Declaration of the `size_of_object` function.
    pub fn declaration(&self) -> Command {
        Command::DeclareFun {
            identifier: self.size_of_object.clone(),
            parameters: vec![Sort::BitVec(OBJECT_ID_BITS)],
        }
    }

    /// `size_of_object` applied to the object id of `pointer`.
    pub fn size_of(&self, pointer: Term) -> Term {
        Term::apply(self.size_of_object.clone(), vec![object_id_of(pointer)])
    }

    /// Constrain the size of the object behind `pointer` to `size`.
    /// Returns the constraint on first sight of the object id and `None`
    /// when it is already constrained.
    pub fn constrain(&mut self, pointer: &Term, size: Term) -> Option<Term> {
        let id = object_id_of(pointer.clone());
        if self.constrained.contains_key(&id) {
            return None;
        }
        self.constrained.insert(id.clone(), size.clone());
        Some(Term::equal(
            Term::apply(self.size_of_object.clone(), vec![id]),
            size,
        ))
    }
}
