//! Dominant type promotion and implicit widening

use crate::types::{PrimitiveKind, Type, TypeFlags};
use crate::utils::{Error, Result};

/// The common type two operands are unified to.
///
/// Pointers win over non-pointers. Two integers or two floats promote to the
/// wider one; an integer mixed with a float promotes to a float of the wider
/// width. Anything else, including a struct mixed with a primitive, is a
/// Type error.
pub fn dominant_type(lhs: &Type, rhs: &Type) -> Result<Type> {
    if lhs.is_pointer() && !rhs.is_pointer() {
        return Ok(rvalue(lhs));
    }
    if rhs.is_pointer() && !lhs.is_pointer() {
        return Ok(rvalue(rhs));
    }

    match (lhs, rhs) {
        (Type::Named { .. }, Type::Primitive { .. })
        | (Type::Primitive { .. }, Type::Named { .. }) => {
            Err(Error::type_error(format!(
                "Cannot mix primitive type with named type ('{}' and '{}')",
                lhs, rhs
            )))
        }
        (Type::Named { name: a, .. }, Type::Named { name: b, .. }) if a == b => Ok(rvalue(lhs)),
        (Type::Primitive { kind: a, .. }, Type::Primitive { kind: b, .. }) => {
            let (a, b) = (*a, *b);
            if (a.is_integer() && b.is_integer()) || (a.is_float() && b.is_float()) {
                if rhs.bit_width() > lhs.bit_width() {
                    Ok(rvalue(rhs))
                } else {
                    Ok(rvalue(lhs))
                }
            } else if (a.is_float() && b.is_integer()) || (a.is_integer() && b.is_float()) {
                let bits = lhs.bit_width().max(rhs.bit_width());
                Ok(Type::primitive(PrimitiveKind::float_of_width(bits)))
            } else if a == b {
                Ok(rvalue(lhs))
            } else {
                Err(Error::type_error(format!(
                    "Cannot compute dominant type for incompatible primitive types '{}' and '{}'",
                    lhs, rhs
                )))
            }
        }
        _ => Err(Error::type_error(format!(
            "Cannot compute dominant type of '{}' and '{}'",
            lhs, rhs
        ))),
    }
}

/// Whether a value of type `actual` may be stored where `target` is expected
/// without an explicit conversion: equal types, or same-category primitive
/// widening into a strictly wider type.
pub fn is_assignable(target: &Type, actual: &Type) -> bool {
    if target.equals(actual) {
        return true;
    }
    match (target.primitive_kind(), actual.primitive_kind()) {
        (Some(t), Some(a)) if !target.is_pointer() && !actual.is_pointer() => {
            let same_category =
                (t.is_integer() && a.is_integer()) || (t.is_float() && a.is_float());
            same_category && actual.bit_width() < target.bit_width()
        }
        _ => false,
    }
}

/// Operand types become plain values once combined
fn rvalue(ty: &Type) -> Type {
    ty.clone().without_flags(TypeFlags::MUTABLE | TypeFlags::GLOBAL)
}
