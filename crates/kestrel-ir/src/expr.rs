//! Typed program expressions
//!
//! Expressions are immutable values with structural equality and hashing;
//! every node carries its type. Constructors validate operand types and panic
//! on violations, since expressions reaching this layer have already been
//! type checked by the front end; a mismatch here is a bug upstream, not a
//! recoverable condition.

use std::fmt;

use num_bigint::BigUint;

use crate::namespace::Namespace;
use crate::types::Type;

/// Binary arithmetic operator. Signedness is taken from the operand type at
/// lowering time, not from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder
    Rem,
}

/// Binary comparison operator. Signedness is taken from the operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

/// A typed program expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    /// Node kind and operands
    pub kind: ExprKind,
    /// Static type of the node
    pub ty: Type,
}

/// Expression node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Named symbol (program variable)
    Symbol(String),
    /// Bitvector literal; the node type gives width and signedness
    BvLiteral(BigUint),
    /// Boolean literal
    BoolLiteral(bool),
    /// Logical negation
    Not(Box<Expr>),
    /// N-ary conjunction
    And(Vec<Expr>),
    /// N-ary disjunction
    Or(Vec<Expr>),
    /// Implication
    Implies(Box<Expr>, Box<Expr>),
    /// Equality
    Equal(Box<Expr>, Box<Expr>),
    /// Disequality
    NotEqual(Box<Expr>, Box<Expr>),
    /// Binary bitvector arithmetic
    Arith {
        /// Operator
        op: ArithOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Binary comparison yielding bool
    Compare {
        /// Operator
        op: CompareOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Arithmetic negation
    Negate(Box<Expr>),
    /// Conditional expression
    If {
        /// Condition
        cond: Box<Expr>,
        /// Value if the condition holds
        then: Box<Expr>,
        /// Value otherwise
        otherwise: Box<Expr>,
    },
    /// Array element read
    Index {
        /// Array operand
        array: Box<Expr>,
        /// Index operand
        index: Box<Expr>,
    },
    /// Functional array element update
    ArrayUpdate {
        /// Array operand
        array: Box<Expr>,
        /// Index operand
        index: Box<Expr>,
        /// New element value
        value: Box<Expr>,
    },
    /// Struct member read
    Member {
        /// Struct-typed operand
        base: Box<Expr>,
        /// Member name
        component: String,
    },
    /// Aggregate construction; operands in declaration order
    StructLiteral(Vec<Expr>),
    /// Functional update of one or more struct members
    Update {
        /// Struct-typed operand
        base: Box<Expr>,
        /// Updated members, by name
        updates: Vec<(String, Expr)>,
    },
    /// Bit concatenation; the first operand occupies the highest bits
    Concat(Vec<Expr>),
    /// Bit-range extraction, bounds inclusive
    ExtractBits {
        /// Source operand
        src: Box<Expr>,
        /// Highest extracted bit index
        upper: u32,
        /// Lowest extracted bit index
        lower: u32,
    },
    /// Conversion to the node type
    TypeCast(Box<Expr>),
    /// Address of an addressable object
    AddressOf(Box<Expr>),
    /// Pointer plus element offset
    PointerOffset {
        /// Pointer operand
        pointer: Box<Expr>,
        /// Element count to advance by
        offset: Box<Expr>,
    },
    /// Difference of two pointers of the same type, in elements
    PointerDifference {
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Size in bytes of the object a pointer refers to
    ObjectSize(Box<Expr>),
}

impl Expr {
    /// A named symbol of the given type.
    pub fn symbol(name: impl Into<String>, ty: Type) -> Self {
        Self {
            kind: ExprKind::Symbol(name.into()),
            ty,
        }
    }

    /// A bitvector literal. The value must fit in the type's width.
    pub fn bv_literal(value: impl Into<BigUint>, ty: Type) -> Self {
        let value = value.into();
        let width = ty
            .bv_width()
            .unwrap_or_else(|| panic!("bitvector literal requires a bitvector type, got {ty}"));
        assert!(
            value.bits() <= u64::from(width),
            "literal {value} does not fit in {width} bits"
        );
        Self {
            kind: ExprKind::BvLiteral(value),
            ty,
        }
    }

    /// A boolean literal.
    pub fn bool_literal(value: bool) -> Self {
        Self {
            kind: ExprKind::BoolLiteral(value),
            ty: Type::Bool,
        }
    }

    /// Logical negation of a boolean operand.
    pub fn not(operand: Expr) -> Self {
        assert_eq!(operand.ty, Type::Bool, "operand of `not` must be boolean");
        Self {
            kind: ExprKind::Not(Box::new(operand)),
            ty: Type::Bool,
        }
    }

    /// Conjunction of boolean operands.
    pub fn and(operands: Vec<Expr>) -> Self {
        for operand in &operands {
            assert_eq!(operand.ty, Type::Bool, "operand of `and` must be boolean");
        }
        Self {
            kind: ExprKind::And(operands),
            ty: Type::Bool,
        }
    }

    /// Disjunction of boolean operands.
    pub fn or(operands: Vec<Expr>) -> Self {
        for operand in &operands {
            assert_eq!(operand.ty, Type::Bool, "operand of `or` must be boolean");
        }
        Self {
            kind: ExprKind::Or(operands),
            ty: Type::Bool,
        }
    }

    /// Implication between boolean operands.
    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        assert_eq!(lhs.ty, Type::Bool, "operand of `implies` must be boolean");
        assert_eq!(rhs.ty, Type::Bool, "operand of `implies` must be boolean");
        Self {
            kind: ExprKind::Implies(Box::new(lhs), Box::new(rhs)),
            ty: Type::Bool,
        }
    }

    /// Equality between operands of identical type.
    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        assert_eq!(
            lhs.ty, rhs.ty,
            "equality requires identical operand types, got {} and {}",
            lhs.ty, rhs.ty
        );
        Self {
            kind: ExprKind::Equal(Box::new(lhs), Box::new(rhs)),
            ty: Type::Bool,
        }
    }

    /// Disequality between operands of identical type.
    pub fn not_equal(lhs: Expr, rhs: Expr) -> Self {
        assert_eq!(
            lhs.ty, rhs.ty,
            "disequality requires identical operand types, got {} and {}",
            lhs.ty, rhs.ty
        );
        Self {
            kind: ExprKind::NotEqual(Box::new(lhs), Box::new(rhs)),
            ty: Type::Bool,
        }
    }

    /// Binary arithmetic over bitvector operands of identical type.
    pub fn arith(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
        assert!(
            lhs.ty.is_bitvector(),
            "arithmetic requires bitvector operands, got {}",
            lhs.ty
        );
        assert_eq!(
            lhs.ty, rhs.ty,
            "arithmetic requires identical operand types, got {} and {}",
            lhs.ty, rhs.ty
        );
        let ty = lhs.ty.clone();
        Self {
            kind: ExprKind::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        }
    }

    /// Comparison over bitvector operands of identical type.
    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Self {
        assert!(
            lhs.ty.is_bitvector(),
            "comparison requires bitvector operands, got {}",
            lhs.ty
        );
        assert_eq!(
            lhs.ty, rhs.ty,
            "comparison requires identical operand types, got {} and {}",
            lhs.ty, rhs.ty
        );
        Self {
            kind: ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty: Type::Bool,
        }
    }

    /// Arithmetic negation of a bitvector operand.
    pub fn negate(operand: Expr) -> Self {
        assert!(
            operand.ty.is_bitvector(),
            "negation requires a bitvector operand, got {}",
            operand.ty
        );
        let ty = operand.ty.clone();
        Self {
            kind: ExprKind::Negate(Box::new(operand)),
            ty,
        }
    }

    /// Conditional expression.
    pub fn if_then_else(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        assert_eq!(cond.ty, Type::Bool, "condition must be boolean");
        assert_eq!(
            then.ty, otherwise.ty,
            "conditional branches require identical types, got {} and {}",
            then.ty, otherwise.ty
        );
        let ty = then.ty.clone();
        Self {
            kind: ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            ty,
        }
    }

    /// Array element read.
    pub fn index(array: Expr, index: Expr) -> Self {
        let Type::Array { element, .. } = &array.ty else {
            panic!("indexing requires an array operand, got {}", array.ty);
        };
        assert!(
            index.ty.is_bitvector(),
            "array index must be a bitvector, got {}",
            index.ty
        );
        let ty = (**element).clone();
        Self {
            kind: ExprKind::Index {
                array: Box::new(array),
                index: Box::new(index),
            },
            ty,
        }
    }

    /// Functional array element update.
    pub fn array_update(array: Expr, index: Expr, value: Expr) -> Self {
        let Type::Array { element, .. } = &array.ty else {
            panic!("array update requires an array operand, got {}", array.ty);
        };
        assert_eq!(
            **element, value.ty,
            "array update value must have the element type"
        );
        assert!(
            index.ty.is_bitvector(),
            "array index must be a bitvector, got {}",
            index.ty
        );
        let ty = array.ty.clone();
        Self {
            kind: ExprKind::ArrayUpdate {
                array: Box::new(array),
                index: Box::new(index),
                value: Box::new(value),
            },
            ty,
        }
    }

    /// Struct member read, typed against the namespace.
    pub fn member(base: Expr, component: impl Into<String>, ns: &Namespace) -> Self {
        let component = component.into();
        let Type::StructTag(tag) = &base.ty else {
            panic!("member access requires a struct operand, got {}", base.ty);
        };
        let definition = ns.follow_tag(tag);
        let ty = definition
            .component(&component)
            .unwrap_or_else(|| panic!("struct {tag} has no member `{component}`"))
            .ty
            .clone();
        Self {
            kind: ExprKind::Member {
                base: Box::new(base),
                component,
            },
            ty,
        }
    }

    /// Aggregate construction with operands in declaration order.
    pub fn struct_literal(tag: impl Into<String>, fields: Vec<Expr>, ns: &Namespace) -> Self {
        let tag = tag.into();
        let definition = ns.follow_tag(&tag);
        assert_eq!(
            fields.len(),
            definition.components.len(),
            "struct {tag} literal must provide every member"
        );
        for (field, component) in fields.iter().zip(&definition.components) {
            assert_eq!(
                field.ty, component.ty,
                "struct {tag} member `{}` expects {}, got {}",
                component.name, component.ty, field.ty
            );
        }
        Self {
            kind: ExprKind::StructLiteral(fields),
            ty: Type::StructTag(tag),
        }
    }

    /// Functional update of struct members.
    pub fn update(base: Expr, updates: Vec<(String, Expr)>, ns: &Namespace) -> Self {
        let Type::StructTag(tag) = &base.ty else {
            panic!("member update requires a struct operand, got {}", base.ty);
        };
        let definition = ns.follow_tag(tag);
        for (name, value) in &updates {
            let component = definition
                .component(name)
                .unwrap_or_else(|| panic!("struct {tag} has no member `{name}`"));
            assert_eq!(
                component.ty, value.ty,
                "struct {tag} member `{name}` expects {}, got {}",
                component.ty, value.ty
            );
        }
        let ty = base.ty.clone();
        Self {
            kind: ExprKind::Update {
                base: Box::new(base),
                updates,
            },
            ty,
        }
    }

    /// Bit concatenation of bitvector operands; the first occupies the
    /// highest bits of the result.
    pub fn concat(operands: Vec<Expr>) -> Self {
        assert!(operands.len() >= 2, "concatenation needs two or more operands");
        let mut width = 0u32;
        for operand in &operands {
            let operand_width = operand
                .ty
                .bv_width()
                .unwrap_or_else(|| panic!("cannot concatenate {}", operand.ty));
            width = width
                .checked_add(operand_width)
                .unwrap_or_else(|| panic!("concatenation width overflows"));
        }
        Self {
            kind: ExprKind::Concat(operands),
            ty: Type::UnsignedBv(width),
        }
    }

    /// Extraction of bits `[upper, lower]`, both inclusive.
    pub fn extract_bits(src: Expr, upper: u32, lower: u32, ty: Type) -> Self {
        let src_width = src
            .ty
            .bv_width()
            .unwrap_or_else(|| panic!("cannot extract bits from {}", src.ty));
        assert!(lower <= upper, "extraction bounds are reversed");
        assert!(upper < src_width, "extraction exceeds the source width");
        let width = ty
            .bv_width()
            .unwrap_or_else(|| panic!("extraction requires a bitvector result type, got {ty}"));
        assert_eq!(
            width,
            upper - lower + 1,
            "extraction width disagrees with the result type"
        );
        Self {
            kind: ExprKind::ExtractBits {
                src: Box::new(src),
                upper,
                lower,
            },
            ty,
        }
    }

    /// Conversion of the operand to the given type.
    pub fn type_cast(src: Expr, ty: Type) -> Self {
        Self {
            kind: ExprKind::TypeCast(Box::new(src)),
            ty,
        }
    }

    /// Address of an addressable object.
    pub fn address_of(object: Expr) -> Self {
        let ty = Type::pointer(object.ty.clone());
        Self {
            kind: ExprKind::AddressOf(Box::new(object)),
            ty,
        }
    }

    /// Pointer advanced by an element count.
    pub fn pointer_offset(pointer: Expr, offset: Expr) -> Self {
        assert!(
            pointer.ty.is_pointer(),
            "pointer offset requires a pointer operand, got {}",
            pointer.ty
        );
        assert!(
            offset.ty.is_bitvector(),
            "pointer offset count must be a bitvector, got {}",
            offset.ty
        );
        let ty = pointer.ty.clone();
        Self {
            kind: ExprKind::PointerOffset {
                pointer: Box::new(pointer),
                offset: Box::new(offset),
            },
            ty,
        }
    }

    /// Difference of two pointers of identical type, in elements.
    pub fn pointer_difference(lhs: Expr, rhs: Expr) -> Self {
        assert!(
            lhs.ty.is_pointer(),
            "pointer difference requires pointer operands, got {}",
            lhs.ty
        );
        assert_eq!(
            lhs.ty, rhs.ty,
            "pointer difference requires identical operand types"
        );
        Self {
            kind: ExprKind::PointerDifference {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty: Type::pointer_difference_type(),
        }
    }

    /// Size in bytes of the object the pointer refers to.
    pub fn object_size(pointer: Expr) -> Self {
        assert!(
            pointer.ty.is_pointer(),
            "object size requires a pointer operand, got {}",
            pointer.ty
        );
        Self {
            kind: ExprKind::ObjectSize(Box::new(pointer)),
            ty: Type::size_type(),
        }
    }

    /// The literal value if this is a bitvector literal small enough for u64.
    pub fn to_u64(&self) -> Option<u64> {
        match &self.kind {
            ExprKind::BvLiteral(value) => u64::try_from(value).ok(),
            _ => None,
        }
    }

    /// Immediate operands of this node, in order.
    pub fn operands(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Symbol(_) | ExprKind::BvLiteral(_) | ExprKind::BoolLiteral(_) => vec![],
            ExprKind::Not(a)
            | ExprKind::Negate(a)
            | ExprKind::TypeCast(a)
            | ExprKind::AddressOf(a)
            | ExprKind::ObjectSize(a) => vec![a],
            ExprKind::ExtractBits { src, .. } => vec![src],
            ExprKind::And(parts) | ExprKind::Or(parts) | ExprKind::Concat(parts) => {
                parts.iter().collect()
            }
            ExprKind::StructLiteral(fields) => fields.iter().collect(),
            ExprKind::Implies(a, b)
            | ExprKind::Equal(a, b)
            | ExprKind::NotEqual(a, b)
            | ExprKind::PointerDifference { lhs: a, rhs: b } => vec![a, b],
            ExprKind::Arith { lhs, rhs, .. } | ExprKind::Compare { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
            ExprKind::PointerOffset { pointer, offset } => vec![pointer, offset],
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => vec![cond, then, otherwise],
            ExprKind::Index { array, index } => vec![array, index],
            ExprKind::ArrayUpdate {
                array,
                index,
                value,
            } => vec![array, index, value],
            ExprKind::Member { base, .. } => vec![base],
            ExprKind::Update { base, updates } => {
                let mut out = vec![base.as_ref()];
                out.extend(updates.iter().map(|(_, value)| value));
                out
            }
        }
    }

    /// Rebuild this node with every immediate operand passed through `f`,
    /// keeping the node kind and type.
    pub fn try_map_operands<E>(
        &self,
        mut f: impl FnMut(&Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let map_box = |f: &mut dyn FnMut(&Expr) -> Result<Expr, E>,
                       e: &Expr|
         -> Result<Box<Expr>, E> { Ok(Box::new(f(e)?)) };
        let kind = match &self.kind {
            kind @ (ExprKind::Symbol(_) | ExprKind::BvLiteral(_) | ExprKind::BoolLiteral(_)) => {
                kind.clone()
            }
            ExprKind::Not(a) => ExprKind::Not(map_box(&mut f, a)?),
            ExprKind::Negate(a) => ExprKind::Negate(map_box(&mut f, a)?),
            ExprKind::TypeCast(a) => ExprKind::TypeCast(map_box(&mut f, a)?),
            ExprKind::AddressOf(a) => ExprKind::AddressOf(map_box(&mut f, a)?),
            ExprKind::ObjectSize(a) => ExprKind::ObjectSize(map_box(&mut f, a)?),
            ExprKind::ExtractBits { src, upper, lower } => ExprKind::ExtractBits {
                src: map_box(&mut f, src)?,
                upper: *upper,
                lower: *lower,
            },
            ExprKind::And(parts) => {
                ExprKind::And(parts.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            ExprKind::Or(parts) => {
                ExprKind::Or(parts.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            ExprKind::Concat(parts) => {
                ExprKind::Concat(parts.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            ExprKind::StructLiteral(fields) => {
                ExprKind::StructLiteral(fields.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            ExprKind::Implies(a, b) => {
                ExprKind::Implies(map_box(&mut f, a)?, map_box(&mut f, b)?)
            }
            ExprKind::Equal(a, b) => ExprKind::Equal(map_box(&mut f, a)?, map_box(&mut f, b)?),
            ExprKind::NotEqual(a, b) => {
                ExprKind::NotEqual(map_box(&mut f, a)?, map_box(&mut f, b)?)
            }
            ExprKind::Arith { op, lhs, rhs } => ExprKind::Arith {
                op: *op,
                lhs: map_box(&mut f, lhs)?,
                rhs: map_box(&mut f, rhs)?,
            },
            ExprKind::Compare { op, lhs, rhs } => ExprKind::Compare {
                op: *op,
                lhs: map_box(&mut f, lhs)?,
                rhs: map_box(&mut f, rhs)?,
            },
            ExprKind::PointerOffset { pointer, offset } => ExprKind::PointerOffset {
                pointer: map_box(&mut f, pointer)?,
                offset: map_box(&mut f, offset)?,
            },
            ExprKind::PointerDifference { lhs, rhs } => ExprKind::PointerDifference {
                lhs: map_box(&mut f, lhs)?,
                rhs: map_box(&mut f, rhs)?,
            },
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => ExprKind::If {
                cond: map_box(&mut f, cond)?,
                then: map_box(&mut f, then)?,
                otherwise: map_box(&mut f, otherwise)?,
            },
            ExprKind::Index { array, index } => ExprKind::Index {
                array: map_box(&mut f, array)?,
                index: map_box(&mut f, index)?,
            },
            ExprKind::ArrayUpdate {
                array,
                index,
                value,
            } => ExprKind::ArrayUpdate {
                array: map_box(&mut f, array)?,
                index: map_box(&mut f, index)?,
                value: map_box(&mut f, value)?,
            },
            ExprKind::Member { base, component } => ExprKind::Member {
                base: map_box(&mut f, base)?,
                component: component.clone(),
            },
            ExprKind::Update { base, updates } => ExprKind::Update {
                base: map_box(&mut f, base)?,
                updates: updates
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), f(value)?)))
                    .collect::<Result<_, E>>()?,
            },
        };
        Ok(Expr {
            kind,
            ty: self.ty.clone(),
        })
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        };
        write!(f, "{symbol}")
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Symbol(name) => write!(f, "{name}"),
            ExprKind::BvLiteral(value) => write!(f, "{value}"),
            ExprKind::BoolLiteral(value) => write!(f, "{value}"),
            ExprKind::Not(a) => write!(f, "!{a}"),
            ExprKind::And(parts) => write_infix_list(f, parts, " && "),
            ExprKind::Or(parts) => write_infix_list(f, parts, " || "),
            ExprKind::Implies(a, b) => write!(f, "({a} ==> {b})"),
            ExprKind::Equal(a, b) => write!(f, "({a} == {b})"),
            ExprKind::NotEqual(a, b) => write!(f, "({a} != {b})"),
            ExprKind::Arith { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Compare { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Negate(a) => write!(f, "-{a}"),
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => write!(f, "({cond} ? {then} : {otherwise})"),
            ExprKind::Index { array, index } => write!(f, "{array}[{index}]"),
            ExprKind::ArrayUpdate {
                array,
                index,
                value,
            } => write!(f, "({array} with [{index}] := {value})"),
            ExprKind::Member { base, component } => write!(f, "{base}.{component}"),
            ExprKind::StructLiteral(fields) => {
                write!(f, "({}){{", self.ty)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}")
            }
            ExprKind::Update { base, updates } => {
                write!(f, "({base} with ")?;
                for (i, (name, value)) in updates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, ".{name} := {value}")?;
                }
                write!(f, ")")
            }
            ExprKind::Concat(parts) => {
                write!(f, "concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
            ExprKind::ExtractBits { src, upper, lower } => {
                write!(f, "{src}[{upper}:{lower}]")
            }
            ExprKind::TypeCast(a) => write!(f, "({}){a}", self.ty),
            ExprKind::AddressOf(a) => write!(f, "&{a}"),
            ExprKind::PointerOffset { pointer, offset } => write!(f, "({pointer} + {offset})"),
            ExprKind::PointerDifference { lhs, rhs } => write!(f, "({lhs} - {rhs})"),
            ExprKind::ObjectSize(a) => write!(f, "object_size({a})"),
        }
    }
}

fn write_infix_list(f: &mut fmt::Formatter<'_>, parts: &[Expr], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{part}")?;
    }
    write!(f, ")")
}
