//! Struct-to-bitvector encoding
//!
//! Lowers aggregate types and operations onto the bitvector theory before
//! expressions reach the term converter. A struct value becomes one wide
//! bitvector holding its members in declaration order, first member in the
//! highest bits. Member reads become bit extractions, aggregate construction
//! becomes concatenation, and member updates are flattened to aggregate
//! construction before any type is rewritten.
//!
//! The pass is idempotent: an expression it has produced contains no
//! aggregate construct, so encoding it again is the identity.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use kestrel_ir::{Expr, ExprKind, Namespace, Type};

use crate::error::{SmtError, SmtResult};

/// Width in bits of an encoded pointer.
pub const POINTER_WIDTH: u32 = 64;

/// Struct-to-bitvector encoder over one namespace. Struct widths are
/// memoized across calls.
#[derive(Debug)]
pub struct StructEncoding<'ns> {
    ns: &'ns Namespace,
    widths: RefCell<FxHashMap<String, u32>>,
}

impl<'ns> StructEncoding<'ns> {
    /// Create an encoder resolving struct tags against `ns`.
    pub fn new(ns: &'ns Namespace) -> Self {
        Self {
            ns,
            widths: RefCell::new(FxHashMap::default()),
        }
    }

    /// Width in bits of an encoded value of type `ty`.
    pub fn encoded_width(&self, ty: &Type) -> SmtResult<u32> {
        match ty {
            Type::Bool => Ok(1),
            Type::UnsignedBv(width) | Type::SignedBv(width) => Ok(*width),
            Type::Pointer(_) => Ok(POINTER_WIDTH),
            Type::Array { element, size } => {
                let element_width = self.encoded_width(element)?;
                u32::try_from(*size)
                    .ok()
                    .and_then(|size| element_width.checked_mul(size))
                    .ok_or_else(|| {
                        SmtError::Unsupported(format!("array type too wide to encode: {ty}"))
                    })
            }
            Type::StructTag(tag) => self.struct_width(tag),
            Type::Empty => Err(SmtError::Unsupported(
                "void-typed value has no encoding".to_string(),
            )),
        }
    }

    fn struct_width(&self, tag: &str) -> SmtResult<u32> {
        if let Some(width) = self.widths.borrow().get(tag) {
            return Ok(*width);
        }
        let definition = self.ns.follow_tag(tag);
        let mut width = 0u32;
        for component in &definition.components {
            width = width
                .checked_add(self.encoded_width(&component.ty)?)
                .ok_or_else(|| {
                    SmtError::Unsupported(format!("struct {tag} too wide to encode"))
                })?;
        }
        if width == 0 {
            return Err(SmtError::ZeroWidthStruct(tag.to_string()));
        }
        self.widths.borrow_mut().insert(tag.to_string(), width);
        Ok(width)
    }

    /// Rewrite `ty` so no struct tag remains.
    pub fn encode_type(&self, ty: &Type) -> SmtResult<Type> {
        match ty {
            Type::StructTag(tag) => Ok(Type::UnsignedBv(self.struct_width(tag)?)),
            Type::Array { element, size } => Ok(Type::Array {
                element: Box::new(self.encode_type(element)?),
                size: *size,
            }),
            other => Ok(other.clone()),
        }
    }

    /// Rewrite `expr` so no aggregate type or operation remains.
    pub fn encode_expr(&self, expr: &Expr) -> SmtResult<Expr> {
        match &expr.kind {
            // Flattened before anything else, so the synthesized aggregate
            // construction goes through the ordinary lowering below.
            ExprKind::Update { base, updates } => {
                let flattened = self.flatten_update(base, updates);
                self.encode_expr(&flattened)
            }
            ExprKind::Member { base, component } => {
                let (upper, lower) = self.member_bounds(&base.ty, component)?;
                let encoded_base = self.encode_expr(base)?;
                let extraction = Expr::extract_bits(
                    encoded_base,
                    upper,
                    lower,
                    Type::UnsignedBv(upper - lower + 1),
                );
                self.from_field_encoding(extraction, &expr.ty)
            }
            ExprKind::StructLiteral(fields) => {
                let mut encoded = Vec::with_capacity(fields.len());
                for field in fields {
                    encoded.push(self.to_field_encoding(field)?);
                }
                // A single member needs no concatenation.
                if encoded.len() == 1 {
                    Ok(encoded.into_iter().next().unwrap())
                } else {
                    Ok(Expr::concat(encoded))
                }
            }
            _ => {
                let mapped = expr.try_map_operands(|operand| self.encode_expr(operand))?;
                Ok(Expr {
                    kind: mapped.kind,
                    ty: self.encode_type(&expr.ty)?,
                })
            }
        }
    }

    /// Inclusive extraction bounds of `component` within the encoding of a
    /// value of struct type `base_ty`. Members after the selected one occupy
    /// the bits below it.
    fn member_bounds(&self, base_ty: &Type, component: &str) -> SmtResult<(u32, u32)> {
        let Type::StructTag(tag) = base_ty else {
            panic!("member access on non-struct type {base_ty}");
        };
        let definition = self.ns.follow_tag(tag);
        let mut lower = 0u32;
        for candidate in definition.components.iter().rev() {
            let width = self.encoded_width(&candidate.ty)?;
            if candidate.name == component {
                if width == 0 {
                    return Err(SmtError::Unsupported(format!(
                        "zero-width member `{component}` of struct {tag}"
                    )));
                }
                return Ok((lower + width - 1, lower));
            }
            lower += width;
        }
        panic!("struct {tag} has no member `{component}`");
    }

    /// Rewrite one member-update expression as aggregate construction, with
    /// unchanged members read out of the base value.
    fn flatten_update(&self, base: &Expr, updates: &[(String, Expr)]) -> Expr {
        let Type::StructTag(tag) = &base.ty else {
            panic!("member update on non-struct type {}", base.ty);
        };
        let definition = self.ns.follow_tag(tag);
        let fields = definition
            .components
            .iter()
            .map(|component| {
                updates
                    .iter()
                    .rev()
                    .find(|(name, _)| *name == component.name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| Expr::member(base.clone(), &component.name, self.ns))
            })
            .collect();
        Expr::struct_literal(tag.clone(), fields, self.ns)
    }

    /// Encode a member value into its in-struct bitvector form. Booleans
    /// widen to a single bit.
    fn to_field_encoding(&self, field: &Expr) -> SmtResult<Expr> {
        let encoded = self.encode_expr(field)?;
        if encoded.ty == Type::Bool {
            Ok(Expr::if_then_else(
                encoded,
                Expr::bv_literal(1u8, Type::UnsignedBv(1)),
                Expr::bv_literal(0u8, Type::UnsignedBv(1)),
            ))
        } else if encoded.ty.bv_width().is_some() {
            Ok(encoded)
        } else {
            Err(SmtError::Unsupported(format!(
                "aggregate construction over non-bitvector member: {field}"
            )))
        }
    }

    /// Recover a member value from its in-struct bitvector form.
    fn from_field_encoding(&self, extraction: Expr, member_ty: &Type) -> SmtResult<Expr> {
        match member_ty {
            Type::Bool => Ok(Expr::equal(
                extraction,
                Expr::bv_literal(1u8, Type::UnsignedBv(1)),
            )),
            other => {
                let ty = self.encode_type(other)?;
                if extraction.ty == ty {
                    Ok(extraction)
                } else {
                    Ok(Expr::type_cast(extraction, ty))
                }
            }
        }
    }
}
