//! Solver-level terms
//!
//! A closed, statically validated term algebra over the core boolean theory,
//! the fixed-size bitvector theory and the array theory. Terms are immutable
//! values with structural equality; every constructor checks the sort
//! compatibility rule of its operator and panics on violation, since all
//! terms are produced from already-type-checked program expressions. Each
//! operator computes its result sort as a pure function of its operands;
//! there is no global operator-to-sort table.

use std::fmt;

use num_bigint::BigUint;

use crate::sort::Sort;

/// A named solver-level constant or function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// Solver-side name
    pub name: String,
    /// Sort of the constant, or return sort for a function
    pub sort: Sort,
}

impl Identifier {
    /// Create an identifier.
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }
}

/// Boolean connectives of the core theory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    /// Conjunction
    And,
    /// Disjunction
    Or,
    /// Exclusive or
    Xor,
    /// Implication
    Implies,
}

impl Connective {
    /// SMT-LIB mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
            Connective::Xor => "xor",
            Connective::Implies => "=>",
        }
    }
}

/// Bitvector predicates; always yield `Bool`. Signed and unsigned variants
/// are distinct operators, never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvPredicate {
    /// `bvult`
    UnsignedLess,
    /// `bvule`
    UnsignedLessOrEqual,
    /// `bvugt`
    UnsignedGreater,
    /// `bvuge`
    UnsignedGreaterOrEqual,
    /// `bvslt`
    SignedLess,
    /// `bvsle`
    SignedLessOrEqual,
    /// `bvsgt`
    SignedGreater,
    /// `bvsge`
    SignedGreaterOrEqual,
}

impl BvPredicate {
    /// SMT-LIB mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BvPredicate::UnsignedLess => "bvult",
            BvPredicate::UnsignedLessOrEqual => "bvule",
            BvPredicate::UnsignedGreater => "bvugt",
            BvPredicate::UnsignedGreaterOrEqual => "bvuge",
            BvPredicate::SignedLess => "bvslt",
            BvPredicate::SignedLessOrEqual => "bvsle",
            BvPredicate::SignedGreater => "bvsgt",
            BvPredicate::SignedGreaterOrEqual => "bvsge",
        }
    }
}

/// Binary bitvector operators yielding a bitvector of the operand width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvBinaryOp {
    /// `bvadd`
    Add,
    /// `bvsub`
    Sub,
    /// `bvmul`
    Mul,
    /// `bvudiv`
    UnsignedDivide,
    /// `bvsdiv`
    SignedDivide,
    /// `bvurem`
    UnsignedRemainder,
    /// `bvsrem`
    SignedRemainder,
    /// `bvand`
    BitAnd,
    /// `bvor`
    BitOr,
    /// `bvxor`
    BitXor,
    /// `bvshl`
    ShiftLeft,
    /// `bvlshr`
    LogicalShiftRight,
    /// `bvashr`
    ArithmeticShiftRight,
}

impl BvBinaryOp {
    /// SMT-LIB mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BvBinaryOp::Add => "bvadd",
            BvBinaryOp::Sub => "bvsub",
            BvBinaryOp::Mul => "bvmul",
            BvBinaryOp::UnsignedDivide => "bvudiv",
            BvBinaryOp::SignedDivide => "bvsdiv",
            BvBinaryOp::UnsignedRemainder => "bvurem",
            BvBinaryOp::SignedRemainder => "bvsrem",
            BvBinaryOp::BitAnd => "bvand",
            BvBinaryOp::BitOr => "bvor",
            BvBinaryOp::BitXor => "bvxor",
            BvBinaryOp::ShiftLeft => "bvshl",
            BvBinaryOp::LogicalShiftRight => "bvlshr",
            BvBinaryOp::ArithmeticShiftRight => "bvashr",
        }
    }
}

/// Unary bitvector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvUnaryOp {
    /// `bvneg` (two's complement negation)
    Neg,
    /// `bvnot` (bitwise complement)
    Not,
}

impl BvUnaryOp {
    /// SMT-LIB mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BvUnaryOp::Neg => "bvneg",
            BvUnaryOp::Not => "bvnot",
        }
    }
}

/// A node in the solver-facing term algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Boolean literal
    BoolLiteral(bool),
    /// Bitvector literal
    BvLiteral {
        /// Unsigned value, below `2^width`
        value: BigUint,
        /// Bit width
        width: u32,
    },
    /// Reference to a declared constant
    Identifier(Identifier),
    /// Boolean negation
    Not(Box<Term>),
    /// N-ary boolean connective
    Connective {
        /// Operator
        op: Connective,
        /// Boolean operands
        args: Vec<Term>,
    },
    /// Equality between operands of identical sort
    Equal(Box<Term>, Box<Term>),
    /// Disequality between operands of identical sort
    Distinct(Box<Term>, Box<Term>),
    /// Conditional term
    IfThenElse {
        /// Boolean condition
        cond: Box<Term>,
        /// Value if the condition holds
        then: Box<Term>,
        /// Value otherwise
        otherwise: Box<Term>,
    },
    /// Bitvector predicate application
    BvPredicate {
        /// Operator
        op: BvPredicate,
        /// Left operand
        lhs: Box<Term>,
        /// Right operand
        rhs: Box<Term>,
    },
    /// Binary bitvector operator application
    BvBinary {
        /// Operator
        op: BvBinaryOp,
        /// Left operand
        lhs: Box<Term>,
        /// Right operand
        rhs: Box<Term>,
    },
    /// Unary bitvector operator application
    BvUnary {
        /// Operator
        op: BvUnaryOp,
        /// Operand
        operand: Box<Term>,
    },
    /// Bit-range extraction, bounds inclusive
    Extract {
        /// Highest extracted bit index
        upper: u32,
        /// Lowest extracted bit index
        lower: u32,
        /// Bitvector operand
        operand: Box<Term>,
    },
    /// Bit concatenation; the left operand occupies the highest bits
    Concat(Box<Term>, Box<Term>),
    /// Zero extension by a number of bits
    ZeroExtend {
        /// Bits to prepend
        bits: u32,
        /// Bitvector operand
        operand: Box<Term>,
    },
    /// Sign extension by a number of bits
    SignExtend {
        /// Bits to prepend
        bits: u32,
        /// Bitvector operand
        operand: Box<Term>,
    },
    /// Array element read
    Select {
        /// Array operand
        array: Box<Term>,
        /// Index operand
        index: Box<Term>,
    },
    /// Functional array element update
    Store {
        /// Array operand
        array: Box<Term>,
        /// Index operand
        index: Box<Term>,
        /// New element value
        value: Box<Term>,
    },
    /// Uninterpreted function application
    Apply {
        /// Function identifier; its sort is the return sort
        function: Identifier,
        /// Argument terms
        args: Vec<Term>,
    },
}

fn expect_bool(term: &Term, context: &str) {
    assert_eq!(
        term.sort(),
        Sort::Bool,
        "{context} requires a boolean operand"
    );
}

fn expect_matching_bv_widths(lhs: &Term, rhs: &Term, mnemonic: &str) -> u32 {
    let left_width = lhs
        .sort()
        .bv_width()
        .unwrap_or_else(|| panic!("left operand of {mnemonic} must have bitvector sort"));
    let right_width = rhs
        .sort()
        .bv_width()
        .unwrap_or_else(|| panic!("right operand of {mnemonic} must have bitvector sort"));
    assert_eq!(
        left_width, right_width,
        "operands of {mnemonic} must have the same bit width"
    );
    left_width
}

impl Term {
    /// A boolean literal.
    pub fn bool_literal(value: bool) -> Self {
        Term::BoolLiteral(value)
    }

    /// A bitvector literal; the value must fit in the width.
    pub fn bv_literal(value: impl Into<BigUint>, width: u32) -> Self {
        let value = value.into();
        assert!(
            value.bits() <= u64::from(width),
            "literal {value} does not fit in {width} bits"
        );
        Term::BvLiteral { value, width }
    }

    /// A reference to a declared constant.
    pub fn identifier(identifier: Identifier) -> Self {
        Term::Identifier(identifier)
    }

    /// Boolean negation.
    pub fn not(operand: Term) -> Self {
        expect_bool(&operand, "not");
        Term::Not(Box::new(operand))
    }

    /// N-ary boolean connective over boolean operands.
    pub fn connective(op: Connective, args: Vec<Term>) -> Self {
        assert!(args.len() >= 2, "{} needs two or more operands", op.mnemonic());
        for arg in &args {
            expect_bool(arg, op.mnemonic());
        }
        Term::Connective { op, args }
    }

    /// Equality between operands of identical sort.
    pub fn equal(lhs: Term, rhs: Term) -> Self {
        assert_eq!(
            lhs.sort(),
            rhs.sort(),
            "operands of = must have the same sort"
        );
        Term::Equal(Box::new(lhs), Box::new(rhs))
    }

    /// Disequality between operands of identical sort.
    pub fn distinct(lhs: Term, rhs: Term) -> Self {
        assert_eq!(
            lhs.sort(),
            rhs.sort(),
            "operands of distinct must have the same sort"
        );
        Term::Distinct(Box::new(lhs), Box::new(rhs))
    }

    /// Conditional term over branches of identical sort.
    pub fn if_then_else(cond: Term, then: Term, otherwise: Term) -> Self {
        expect_bool(&cond, "ite");
        assert_eq!(
            then.sort(),
            otherwise.sort(),
            "branches of ite must have the same sort"
        );
        Term::IfThenElse {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Bitvector predicate over operands of identical width.
    pub fn bv_predicate(op: BvPredicate, lhs: Term, rhs: Term) -> Self {
        expect_matching_bv_widths(&lhs, &rhs, op.mnemonic());
        Term::BvPredicate {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Binary bitvector operator over operands of identical width.
    pub fn bv_binary(op: BvBinaryOp, lhs: Term, rhs: Term) -> Self {
        expect_matching_bv_widths(&lhs, &rhs, op.mnemonic());
        Term::BvBinary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Unary bitvector operator.
    pub fn bv_unary(op: BvUnaryOp, operand: Term) -> Self {
        assert!(
            operand.sort().bv_width().is_some(),
            "operand of {} must have bitvector sort",
            op.mnemonic()
        );
        Term::BvUnary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Extraction of bits `[upper, lower]`, both inclusive.
    pub fn extract(upper: u32, lower: u32, operand: Term) -> Self {
        let width = operand
            .sort()
            .bv_width()
            .unwrap_or_else(|| panic!("operand of extract must have bitvector sort"));
        assert!(lower <= upper, "extract bounds are reversed");
        assert!(upper < width, "extract exceeds the operand width");
        Term::Extract {
            upper,
            lower,
            operand: Box::new(operand),
        }
    }

    /// Concatenation of two bitvector operands.
    pub fn concat(lhs: Term, rhs: Term) -> Self {
        assert!(
            lhs.sort().bv_width().is_some() && rhs.sort().bv_width().is_some(),
            "operands of concat must have bitvector sort"
        );
        Term::Concat(Box::new(lhs), Box::new(rhs))
    }

    /// Zero extension by `bits` bits.
    pub fn zero_extend(bits: u32, operand: Term) -> Self {
        assert!(
            operand.sort().bv_width().is_some(),
            "operand of zero_extend must have bitvector sort"
        );
        Term::ZeroExtend {
            bits,
            operand: Box::new(operand),
        }
    }

    /// Sign extension by `bits` bits.
    pub fn sign_extend(bits: u32, operand: Term) -> Self {
        assert!(
            operand.sort().bv_width().is_some(),
            "operand of sign_extend must have bitvector sort"
        );
        Term::SignExtend {
            bits,
            operand: Box::new(operand),
        }
    }

    /// Array element read; the index must have the array's index sort.
    pub fn select(array: Term, index: Term) -> Self {
        let Sort::Array(index_sort, _) = array.sort() else {
            panic!("operand of select must have array sort");
        };
        assert_eq!(
            *index_sort,
            index.sort(),
            "select index must have the array's index sort"
        );
        Term::Select {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    /// Functional array element update.
    pub fn store(array: Term, index: Term, value: Term) -> Self {
        let Sort::Array(index_sort, element_sort) = array.sort() else {
            panic!("operand of store must have array sort");
        };
        assert_eq!(
            *index_sort,
            index.sort(),
            "store index must have the array's index sort"
        );
        assert_eq!(
            *element_sort,
            value.sort(),
            "store value must have the array's element sort"
        );
        Term::Store {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
        }
    }

    /// Application of an uninterpreted function.
    pub fn apply(function: Identifier, args: Vec<Term>) -> Self {
        Term::Apply { function, args }
    }

    /// The sort of this term, computed from its constructor arguments.
    pub fn sort(&self) -> Sort {
        match self {
            Term::BoolLiteral(_) => Sort::Bool,
            Term::BvLiteral { width, .. } => Sort::BitVec(*width),
            Term::Identifier(identifier) => identifier.sort.clone(),
            Term::Not(_) | Term::Connective { .. } | Term::Equal(..) | Term::Distinct(..) => {
                Sort::Bool
            }
            Term::IfThenElse { then, .. } => then.sort(),
            Term::BvPredicate { .. } => Sort::Bool,
            Term::BvBinary { lhs, .. } => lhs.sort(),
            Term::BvUnary { operand, .. } => operand.sort(),
            Term::Extract { upper, lower, .. } => Sort::BitVec(upper - lower + 1),
            Term::Concat(lhs, rhs) => {
                // Validated at construction.
                let left = lhs.sort().bv_width().expect("concat operand sort");
                let right = rhs.sort().bv_width().expect("concat operand sort");
                Sort::BitVec(left + right)
            }
            Term::ZeroExtend { bits, operand } | Term::SignExtend { bits, operand } => {
                let width = operand.sort().bv_width().expect("extension operand sort");
                Sort::BitVec(width + bits)
            }
            Term::Select { array, .. } => {
                let Sort::Array(_, element) = array.sort() else {
                    unreachable!("select operand validated at construction");
                };
                *element
            }
            Term::Store { array, .. } => array.sort(),
            Term::Apply { function, .. } => function.sort.clone(),
        }
    }

    /// Visit every constant identifier referenced by this term, excluding
    /// applied function identifiers, which are declared separately.
    pub fn for_each_identifier(&self, f: &mut impl FnMut(&Identifier)) {
        match self {
            Term::BoolLiteral(_) | Term::BvLiteral { .. } => {}
            Term::Identifier(identifier) => f(identifier),
            Term::Not(a) | Term::BvUnary { operand: a, .. } => a.for_each_identifier(f),
            Term::Extract { operand, .. }
            | Term::ZeroExtend { operand, .. }
            | Term::SignExtend { operand, .. } => operand.for_each_identifier(f),
            Term::Connective { args, .. } => {
                for arg in args {
                    arg.for_each_identifier(f);
                }
            }
            Term::Equal(a, b)
            | Term::Distinct(a, b)
            | Term::Concat(a, b)
            | Term::BvPredicate { lhs: a, rhs: b, .. }
            | Term::BvBinary { lhs: a, rhs: b, .. }
            | Term::Select { array: a, index: b } => {
                a.for_each_identifier(f);
                b.for_each_identifier(f);
            }
            Term::IfThenElse {
                cond,
                then,
                otherwise,
            } => {
                cond.for_each_identifier(f);
                then.for_each_identifier(f);
                otherwise.for_each_identifier(f);
            }
            Term::Store {
                array,
                index,
                value,
            } => {
                array.for_each_identifier(f);
                index.for_each_identifier(f);
                value.for_each_identifier(f);
            }
            Term::Apply { args, .. } => {
                for arg in args {
                    arg.for_each_identifier(f);
                }
            }
        }
    }
}

impl fmt::Display for Term {
    /// SMT-LIB 2 concrete syntax; used verbatim on the solver pipe.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::BoolLiteral(value) => write!(f, "{value}"),
            Term::BvLiteral { value, width } => write!(f, "(_ bv{value} {width})"),
            Term::Identifier(identifier) => write_symbol(f, &identifier.name),
            Term::Not(a) => write!(f, "(not {a})"),
            Term::Connective { op, args } => {
                write!(f, "({}", op.mnemonic())?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Term::Equal(a, b) => write!(f, "(= {a} {b})"),
            Term::Distinct(a, b) => write!(f, "(distinct {a} {b})"),
            Term::IfThenElse {
                cond,
                then,
                otherwise,
            } => write!(f, "(ite {cond} {then} {otherwise})"),
            Term::BvPredicate { op, lhs, rhs } => {
                write!(f, "({} {lhs} {rhs})", op.mnemonic())
            }
            Term::BvBinary { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.mnemonic()),
            Term::BvUnary { op, operand } => write!(f, "({} {operand})", op.mnemonic()),
            Term::Extract {
                upper,
                lower,
                operand,
            } => write!(f, "((_ extract {upper} {lower}) {operand})"),
            Term::Concat(a, b) => write!(f, "(concat {a} {b})"),
            Term::ZeroExtend { bits, operand } => {
                write!(f, "((_ zero_extend {bits}) {operand})")
            }
            Term::SignExtend { bits, operand } => {
                write!(f, "((_ sign_extend {bits}) {operand})")
            }
            Term::Select { array, index } => write!(f, "(select {array} {index})"),
            Term::Store {
                array,
                index,
                value,
            } => write!(f, "(store {array} {index} {value})"),
            Term::Apply { function, args } => {
                write!(f, "(")?;
                write_symbol(f, &function.name)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Write a symbol, quoting it when it is not a simple SMT-LIB symbol.
pub(crate) fn write_symbol(f: &mut impl fmt::Write, name: &str) -> fmt::Result {
    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "~!@$%^&*_+=<>.?/-".contains(c));
    if simple {
        write!(f, "{name}")
    } else {
        assert!(
            !name.contains('|') && !name.contains('\\'),
            "symbol `{name}` cannot be quoted"
        );
        write!(f, "|{name}|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bv(name: &str, width: u32) -> Term {
        Term::identifier(Identifier::new(name, Sort::BitVec(width)))
    }

    // ==================== Sort Rule Tests ====================

    #[test]
    fn test_predicate_yields_bool() {
        let term = Term::bv_predicate(BvPredicate::UnsignedLess, bv("a", 8), bv("b", 8));
        assert_eq!(term.sort(), Sort::Bool);
    }

    #[test]
    fn test_arithmetic_yields_operand_width() {
        let term = Term::bv_binary(BvBinaryOp::Add, bv("a", 16), bv("b", 16));
        assert_eq!(term.sort(), Sort::BitVec(16));
    }

    #[test]
    fn test_unary_preserves_width() {
        let term = Term::bv_unary(BvUnaryOp::Neg, bv("a", 12));
        assert_eq!(term.sort(), Sort::BitVec(12));
    }

    #[test]
    fn test_extract_sort() {
        let term = Term::extract(15, 8, bv("a", 32));
        assert_eq!(term.sort(), Sort::BitVec(8));
    }

    #[test]
    fn test_concat_sort_is_summed() {
        let term = Term::concat(bv("a", 8), bv("b", 24));
        assert_eq!(term.sort(), Sort::BitVec(32));
    }

    #[test]
    fn test_extension_sorts() {
        assert_eq!(
            Term::zero_extend(8, bv("a", 8)).sort(),
            Sort::BitVec(16)
        );
        assert_eq!(
            Term::sign_extend(24, bv("a", 8)).sort(),
            Sort::BitVec(32)
        );
    }

    #[test]
    fn test_select_yields_element_sort() {
        let array = Term::identifier(Identifier::new(
            "a",
            Sort::array(Sort::BitVec(64), Sort::BitVec(8)),
        ));
        let term = Term::select(array, bv("i", 64));
        assert_eq!(term.sort(), Sort::BitVec(8));
    }

    #[test]
    fn test_store_yields_array_sort() {
        let array_sort = Sort::array(Sort::BitVec(64), Sort::BitVec(8));
        let array = Term::identifier(Identifier::new("a", array_sort.clone()));
        let term = Term::store(array, bv("i", 64), bv("v", 8));
        assert_eq!(term.sort(), array_sort);
    }

    // ==================== Validation Tests ====================

    #[test]
    #[should_panic(expected = "same bit width")]
    fn test_binary_op_rejects_mismatched_widths() {
        Term::bv_binary(BvBinaryOp::Add, bv("a", 8), bv("b", 16));
    }

    #[test]
    #[should_panic(expected = "same bit width")]
    fn test_predicate_rejects_mismatched_widths() {
        Term::bv_predicate(BvPredicate::SignedLessOrEqual, bv("a", 32), bv("b", 31));
    }

    #[test]
    #[should_panic(expected = "bitvector sort")]
    fn test_binary_op_rejects_boolean_operand() {
        Term::bv_binary(BvBinaryOp::Mul, Term::bool_literal(true), bv("b", 8));
    }

    #[test]
    #[should_panic(expected = "same sort")]
    fn test_equal_rejects_mismatched_sorts() {
        Term::equal(bv("a", 8), Term::bool_literal(false));
    }

    #[test]
    #[should_panic(expected = "exceeds the operand width")]
    fn test_extract_rejects_out_of_range() {
        Term::extract(8, 0, bv("a", 8));
    }

    #[test]
    #[should_panic(expected = "index sort")]
    fn test_select_rejects_wrong_index_sort() {
        let array = Term::identifier(Identifier::new(
            "a",
            Sort::array(Sort::BitVec(64), Sort::BitVec(8)),
        ));
        Term::select(array, bv("i", 32));
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_literal_must_fit_width() {
        Term::bv_literal(16u8, 4);
    }

    // ==================== Serialization Tests ====================

    #[test]
    fn test_display_smtlib_forms() {
        let a = bv("a", 8);
        let b = bv("b", 8);
        assert_eq!(
            Term::bv_binary(BvBinaryOp::Add, a.clone(), b.clone()).to_string(),
            "(bvadd a b)"
        );
        assert_eq!(
            Term::bv_predicate(BvPredicate::SignedLess, a.clone(), b).to_string(),
            "(bvslt a b)"
        );
        assert_eq!(Term::bv_literal(3u8, 8).to_string(), "(_ bv3 8)");
        assert_eq!(Term::extract(7, 4, a).to_string(), "((_ extract 7 4) a)");
    }

    #[test]
    fn test_display_quotes_nonsimple_symbols() {
        let term = Term::identifier(Identifier::new("main::1::x#3", Sort::Bool));
        assert_eq!(term.to_string(), "|main::1::x#3|");
    }

    #[test]
    fn test_for_each_identifier_skips_function_names() {
        let function = Identifier::new("size_of_object", Sort::BitVec(64));
        let term = Term::apply(function, vec![bv("id", 8)]);
        let mut seen = Vec::new();
        term.for_each_identifier(&mut |identifier| seen.push(identifier.name.clone()));
        assert_eq!(seen, vec!["id"]);
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_binary_ops_preserve_width(width in 1u32..=128) {
            let ops = [
                BvBinaryOp::Add,
                BvBinaryOp::Sub,
                BvBinaryOp::Mul,
                BvBinaryOp::UnsignedDivide,
                BvBinaryOp::SignedRemainder,
                BvBinaryOp::BitXor,
                BvBinaryOp::ShiftLeft,
            ];
            for op in ops {
                let term = Term::bv_binary(op, bv("a", width), bv("b", width));
                prop_assert_eq!(term.sort(), Sort::BitVec(width));
            }
        }

        #[test]
        fn prop_predicates_yield_bool(width in 1u32..=128) {
            let ops = [
                BvPredicate::UnsignedLess,
                BvPredicate::UnsignedGreaterOrEqual,
                BvPredicate::SignedLess,
                BvPredicate::SignedGreaterOrEqual,
            ];
            for op in ops {
                let term = Term::bv_predicate(op, bv("a", width), bv("b", width));
                prop_assert_eq!(term.sort(), Sort::Bool);
            }
        }

        #[test]
        fn prop_extract_width_matches_bounds(
            (width, upper, lower) in (2u32..=128).prop_flat_map(|w| {
                (Just(w), 0..w).prop_flat_map(|(w, u)| (Just(w), Just(u), 0..=u))
            })
        ) {
            let term = Term::extract(upper, lower, bv("a", width));
            prop_assert_eq!(term.sort(), Sort::BitVec(upper - lower + 1));
        }
    }
}
