//! Expression-to-term conversion
//!
//! Lowers struct-free program expressions onto the solver term algebra.
//! Signedness lives in the expression types, so one arithmetic operator
//! fans out to the signed or unsigned bitvector operation here. Pointer
//! operations lower onto the object-id/offset encoding, emitting side
//! constraints on `size_of_object` as pointers are first seen.
//!
//! Aggregate constructs must not reach this layer; the struct encoding runs
//! first and a leftover aggregate node is a bug in the caller.

use kestrel_ir::{ArithOp, CompareOp, Expr, ExprKind, Namespace, Type};

use crate::error::{SmtError, SmtResult};
use crate::object_map::{
    associate_pointer_sizes, pointer_from_parts, ObjectMap, ObjectSizeModel, PointerSizeMap,
};
use crate::sort::Sort;
use crate::struct_encoding::POINTER_WIDTH;
use crate::term::{BvBinaryOp, BvPredicate, BvUnaryOp, Connective, Identifier, Term};

/// Lower a struct-free type to its solver sort.
pub fn convert_type(ty: &Type) -> SmtResult<Sort> {
    match ty {
        Type::Bool => Ok(Sort::Bool),
        Type::UnsignedBv(width) | Type::SignedBv(width) => Ok(Sort::BitVec(*width)),
        Type::Pointer(_) => Ok(Sort::BitVec(POINTER_WIDTH)),
        Type::Array { element, .. } => Ok(Sort::array(
            Sort::BitVec(POINTER_WIDTH),
            convert_type(element)?,
        )),
        Type::StructTag(tag) => panic!("struct tag {tag} reached term conversion unencoded"),
        Type::Empty => Err(SmtError::Unsupported(
            "void-typed value has no solver sort".to_string(),
        )),
    }
}

/// Conversion state shared across one solver session: object numbering and
/// the pointer size constraints already emitted.
#[derive(Debug, Default)]
pub struct ConversionContext {
    objects: ObjectMap,
    pointer_sizes: PointerSizeMap,
    object_sizes: ObjectSizeModel,
    side_constraints: Vec<Term>,
    uses_object_sizes: bool,
}

impl ConversionContext {
    /// A fresh context with no objects tracked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any conversion so far referred to `size_of_object`, meaning
    /// its declaration must be sent before the converted terms.
    pub fn uses_object_sizes(&self) -> bool {
        self.uses_object_sizes
    }

    /// Declaration of the `size_of_object` function.
    pub fn object_size_declaration(&self) -> crate::smtlib::Command {
        self.object_sizes.declaration()
    }

    /// The pointer-size map accumulated so far.
    pub fn pointer_sizes(&self) -> &PointerSizeMap {
        &self.pointer_sizes
    }

    /// Constraints emitted since the last call, to be asserted alongside
    /// the converted terms.
    pub fn take_side_constraints(&mut self) -> Vec<Term> {
        std::mem::take(&mut self.side_constraints)
    }

    /// Lower one struct-free expression to a term.
    pub fn convert_expr_to_term(&mut self, expr: &Expr, ns: &Namespace) -> SmtResult<Term> {
        associate_pointer_sizes(expr, &mut self.pointer_sizes, ns)?;
        match &expr.kind {
            ExprKind::Symbol(name) => {
                Ok(Term::identifier(Identifier::new(name, convert_type(&expr.ty)?)))
            }
            ExprKind::BvLiteral(value) => {
                let width = expr
                    .ty
                    .bv_width()
                    .unwrap_or_else(|| panic!("bitvector literal of type {}", expr.ty));
                Ok(Term::bv_literal(value.clone(), width))
            }
            ExprKind::BoolLiteral(value) => Ok(Term::bool_literal(*value)),
            ExprKind::Not(operand) => Ok(Term::not(self.convert_expr_to_term(operand, ns)?)),
            ExprKind::And(parts) => self.convert_connective(Connective::And, true, parts, ns),
            ExprKind::Or(parts) => self.convert_connective(Connective::Or, false, parts, ns),
            ExprKind::Implies(lhs, rhs) => Ok(Term::connective(
                Connective::Implies,
                vec![
                    self.convert_expr_to_term(lhs, ns)?,
                    self.convert_expr_to_term(rhs, ns)?,
                ],
            )),
            ExprKind::Equal(lhs, rhs) => Ok(Term::equal(
                self.convert_expr_to_term(lhs, ns)?,
                self.convert_expr_to_term(rhs, ns)?,
            )),
            ExprKind::NotEqual(lhs, rhs) => Ok(Term::distinct(
                self.convert_expr_to_term(lhs, ns)?,
                self.convert_expr_to_term(rhs, ns)?,
            )),
            ExprKind::Arith { op, lhs, rhs } => {
                let signed = lhs.ty.is_signed();
                let op = arith_op(*op, signed);
                Ok(Term::bv_binary(
                    op,
                    self.convert_expr_to_term(lhs, ns)?,
                    self.convert_expr_to_term(rhs, ns)?,
                ))
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let signed = lhs.ty.is_signed();
                let op = compare_op(*op, signed);
                Ok(Term::bv_predicate(
                    op,
                    self.convert_expr_to_term(lhs, ns)?,
                    self.convert_expr_to_term(rhs, ns)?,
                ))
            }
            ExprKind::Negate(operand) => Ok(Term::bv_unary(
                BvUnaryOp::Neg,
                self.convert_expr_to_term(operand, ns)?,
            )),
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => Ok(Term::if_then_else(
                self.convert_expr_to_term(cond, ns)?,
                self.convert_expr_to_term(then, ns)?,
                self.convert_expr_to_term(otherwise, ns)?,
            )),
            ExprKind::Index { array, index } => {
                let array = self.convert_expr_to_term(array, ns)?;
                let index = self.index_term(index, ns)?;
                Ok(Term::select(array, index))
            }
            ExprKind::ArrayUpdate {
                array,
                index,
                value,
            } => {
                let array = self.convert_expr_to_term(array, ns)?;
                let index = self.index_term(index, ns)?;
                let value = self.convert_expr_to_term(value, ns)?;
                Ok(Term::store(array, index, value))
            }
            ExprKind::Concat(parts) => {
                let mut terms = parts.iter().map(|part| self.convert_expr_to_term(part, ns));
                let first = terms.next().expect("concatenation has operands")?;
                terms.try_fold(first, |acc, term| Ok(Term::concat(acc, term?)))
            }
            ExprKind::ExtractBits { src, upper, lower } => Ok(Term::extract(
                *upper,
                *lower,
                self.convert_expr_to_term(src, ns)?,
            )),
            ExprKind::TypeCast(src) => self.convert_cast(src, &expr.ty, ns),
            ExprKind::AddressOf(object) => {
                let id = self.objects.id_of(object);
                let pointer = pointer_from_parts(id, 0);
                let size = self.pointer_sizes.size_for(&object.ty, ns)?;
                if let Some(constraint) = self.object_sizes.constrain(&pointer, size) {
                    self.uses_object_sizes = true;
                    self.side_constraints.push(constraint);
                }
                Ok(pointer)
            }
            ExprKind::PointerOffset { pointer, offset } => {
                let base = pointer
                    .ty
                    .pointer_base()
                    .unwrap_or_else(|| panic!("pointer offset over {}", pointer.ty));
                let element_size = self.pointer_sizes.size_for(base, ns)?;
                let pointer_term = self.convert_expr_to_term(pointer, ns)?;
                let offset_term = self.convert_expr_to_term(offset, ns)?;
                let count = self.cast_to_width(offset_term, offset.ty.is_signed(), POINTER_WIDTH);
                Ok(Term::bv_binary(
                    BvBinaryOp::Add,
                    pointer_term,
                    Term::bv_binary(BvBinaryOp::Mul, count, element_size),
                ))
            }
            ExprKind::PointerDifference { lhs, rhs } => {
                let base = lhs
                    .ty
                    .pointer_base()
                    .unwrap_or_else(|| panic!("pointer difference over {}", lhs.ty));
                let element_size = self.pointer_sizes.size_for(base, ns)?;
                let lhs = self.convert_expr_to_term(lhs, ns)?;
                let rhs = self.convert_expr_to_term(rhs, ns)?;
                Ok(Term::bv_binary(
                    BvBinaryOp::SignedDivide,
                    Term::bv_binary(BvBinaryOp::Sub, lhs, rhs),
                    element_size,
                ))
            }
            ExprKind::ObjectSize(pointer) => {
                let pointer_term = self.convert_expr_to_term(pointer, ns)?;
                self.uses_object_sizes = true;
                Ok(self.object_sizes.size_of(pointer_term))
            }
            ExprKind::Member { .. } | ExprKind::StructLiteral(_) | ExprKind::Update { .. } => {
                panic!("aggregate expression reached term conversion unencoded: {expr}")
            }
        }
    }

    fn convert_connective(
        &mut self,
        op: Connective,
        identity: bool,
        parts: &[Expr],
        ns: &Namespace,
    ) -> SmtResult<Term> {
        let mut terms = Vec::with_capacity(parts.len());
        for part in parts {
            terms.push(self.convert_expr_to_term(part, ns)?);
        }
        match terms.len() {
            0 => Ok(Term::bool_literal(identity)),
            1 => Ok(terms.into_iter().next().unwrap()),
            _ => Ok(Term::connective(op, terms)),
        }
    }

    fn index_term(&mut self, index: &Expr, ns: &Namespace) -> SmtResult<Term> {
        let signed = index.ty.is_signed();
        let term = self.convert_expr_to_term(index, ns)?;
        Ok(self.cast_to_width(term, signed, POINTER_WIDTH))
    }

    /// Widen or narrow a bitvector term to `target` bits, extending by the
    /// signedness of its source type.
    fn cast_to_width(&self, term: Term, source_signed: bool, target: u32) -> Term {
        let width = term
            .sort()
            .bv_width()
            .unwrap_or_else(|| panic!("width cast over sort {}", term.sort()));
        match width.cmp(&target) {
            std::cmp::Ordering::Equal => term,
            std::cmp::Ordering::Less if source_signed => {
                Term::sign_extend(target - width, term)
            }
            std::cmp::Ordering::Less => Term::zero_extend(target - width, term),
            std::cmp::Ordering::Greater => Term::extract(target - 1, 0, term),
        }
    }

    fn convert_cast(&mut self, src: &Expr, target: &Type, ns: &Namespace) -> SmtResult<Term> {
        let source_signed = src.ty.is_signed();
        let term = self.convert_expr_to_term(src, ns)?;
        match (term.sort(), convert_type(target)?) {
            (Sort::Bool, Sort::Bool) => Ok(term),
            (Sort::Bool, Sort::BitVec(width)) => Ok(Term::if_then_else(
                term,
                Term::bv_literal(1u8, width),
                Term::bv_literal(0u8, width),
            )),
            (Sort::BitVec(width), Sort::Bool) => Ok(Term::distinct(
                term,
                Term::bv_literal(0u8, width),
            )),
            (Sort::BitVec(_), Sort::BitVec(target_width)) => {
                Ok(self.cast_to_width(term, source_signed, target_width))
            }
            (from, to) => Err(SmtError::Unsupported(format!(
                "no conversion from sort {from} to sort {to}"
            ))),
        }
    }

}

fn arith_op(op: ArithOp, signed: bool) -> BvBinaryOp {
    match (op, signed) {
        (ArithOp::Add, _) => BvBinaryOp::Add,
        (ArithOp::Sub, _) => BvBinaryOp::Sub,
        (ArithOp::Mul, _) => BvBinaryOp::Mul,
        (ArithOp::Div, false) => BvBinaryOp::UnsignedDivide,
        (ArithOp::Div, true) => BvBinaryOp::SignedDivide,
        (ArithOp::Rem, false) => BvBinaryOp::UnsignedRemainder,
        (ArithOp::Rem, true) => BvBinaryOp::SignedRemainder,
    }
}

fn compare_op(op: CompareOp, signed: bool) -> BvPredicate {
    match (op, signed) {
        (CompareOp::Lt, false) => BvPredicate::UnsignedLess,
        (CompareOp::Le, false) => BvPredicate::UnsignedLessOrEqual,
        (CompareOp::Gt, false) => BvPredicate::UnsignedGreater,
        (CompareOp::Ge, false) => BvPredicate::UnsignedGreaterOrEqual,
        (CompareOp::Lt, true) => BvPredicate::SignedLess,
        (CompareOp::Le, true) => BvPredicate::SignedLessOrEqual,
        (CompareOp::Gt, true) => BvPredicate::SignedGreater,
        (CompareOp::Ge, true) => BvPredicate::SignedGreaterOrEqual,
    }
}
