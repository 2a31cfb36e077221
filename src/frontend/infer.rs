//! Static type inference for expressions
//!
//! Inference runs during parsing: call sites need their argument types to pick
//! an overload, and declarations need their initializer's type to validate.

use crate::frontend::ast::{
    Binding, Call, CallTarget, Expr, Identifier, Literal, Member, UnaryOp, VarDecl,
};
use crate::frontend::mangle;
use crate::frontend::semantic::{ScopeId, SymbolDef, SymbolTable};
use crate::types::{dominant_type, PrimitiveKind, Type, TypeFlags};
use crate::utils::{Error, Result};

/// Primitive type of a literal.
///
/// Unsuffixed integers take the narrowest of i32, i64 and u64 that holds the
/// value; an `L` suffix forces i64. Floats are f32 unless suffixed with `D`.
pub fn literal_type(literal: &Literal) -> Type {
    let kind = match literal {
        Literal::Integer { long: true, .. } => PrimitiveKind::Int64,
        Literal::Integer { value, .. } => {
            if *value <= i32::MAX as u64 {
                PrimitiveKind::Int32
            } else if *value <= i64::MAX as u64 {
                PrimitiveKind::Int64
            } else {
                PrimitiveKind::UInt64
            }
        }
        Literal::Float { double: true, .. } => PrimitiveKind::Float64,
        Literal::Float { .. } => PrimitiveKind::Float32,
        Literal::String(_) => PrimitiveKind::String,
        Literal::Char(_) => PrimitiveKind::Char,
        Literal::Bool(_) => PrimitiveKind::Bool,
        Literal::Nil => PrimitiveKind::Nil,
    };
    Type::primitive(kind)
}

pub fn infer_expression_type(table: &SymbolTable, scope: ScopeId, expr: &Expr) -> Result<Type> {
    match expr {
        Expr::Literal { value, .. } => Ok(literal_type(value)),

        Expr::Identifier(ident) => binding_type(table, ident),

        Expr::VariadicReference { .. } => {
            Ok(Type::primitive(PrimitiveKind::Int8).with_flags(TypeFlags::POINTER))
        }

        Expr::MemberAccess { base, members, .. } => {
            let base_ty = binding_type(table, base)?;
            member_chain_type(table, scope, &base.name, base_ty, members)
        }

        Expr::Index { array, .. } => {
            let array_ty = infer_expression_type(table, scope, array)?;
            element_type(&array_ty).ok_or_else(|| {
                Error::semantic(format!(
                    "Array member accessor used on non-array type '{}'",
                    array_ty
                ))
            })
        }

        Expr::Call(call) => call_return_type(table, scope, call),

        Expr::Binary { lhs, rhs, .. } => {
            let lt = infer_expression_type(table, scope, lhs)?;
            let rt = infer_expression_type(table, scope, rhs)?;
            if lt.equals(&rt) && lt.is_pointer() == rt.is_pointer() {
                return Ok(lt);
            }
            dominant_type(&lt, &rt)
        }

        Expr::Comparison { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
            infer_expression_type(table, scope, lhs)?;
            infer_expression_type(table, scope, rhs)?;
            Ok(Type::bool())
        }

        Expr::Unary { op, operand, .. } => {
            let ty = infer_expression_type(table, scope, operand)?;
            match op {
                UnaryOp::Not => Ok(Type::bool()),
                UnaryOp::AddressOf => Ok(ty.with_flags(TypeFlags::POINTER)),
                UnaryOp::Dereference => {
                    if !ty.is_pointer() {
                        return Err(Error::type_error("Cannot dereference non-pointer type"));
                    }
                    Ok(ty.without_flags(TypeFlags::POINTER))
                }
                _ => Ok(ty),
            }
        }

        Expr::Assign { value, .. } => infer_expression_type(table, scope, value),

        Expr::StructInit { internal_name, .. } => Ok(Type::named(internal_name.clone())),

        Expr::Array { elements, .. } => {
            let element = match elements.first() {
                Some(first) => infer_expression_type(table, scope, first)?,
                None => Type::unknown(),
            };
            Ok(Type::array(element, elements.len()))
        }

        Expr::Lambda(decl) => Ok(Type::function(decl.param_types(), decl.ret.clone())),
    }
}

/// Type a declaration contributes: the declared type when the initializer
/// already has it, the dominant of the two otherwise.
pub fn infer_declaration_type(table: &SymbolTable, decl: &VarDecl) -> Result<Type> {
    let value = match &decl.value {
        Some(value) => value,
        None => return Ok(decl.ty.clone()),
    };
    let actual = infer_expression_type(table, decl.scope, value)?;
    if decl.ty.equals(&actual) {
        Ok(decl.ty.clone())
    } else {
        dominant_type(&decl.ty, &actual)
    }
}

fn binding_type(table: &SymbolTable, ident: &Identifier) -> Result<Type> {
    match &ident.binding {
        Binding::Variable { internal_name, scope } => table
            .variable_in(*scope, internal_name)
            .map(|field| field.ty.clone())
            .ok_or_else(|| Error::semantic(format!("Undefined variable '{}'", ident.name))),
        Binding::Function { internal_name } => table
            .get_function_def(table.global(), internal_name)
            .map(|f| f.as_type())
            .ok_or_else(|| {
                Error::semantic(format!(
                    "Unable to resolve return type for function '{}'",
                    ident.name
                ))
            }),
    }
}

/// Walk `a.b.c` through the struct field tables
pub fn member_chain_type(
    table: &SymbolTable,
    scope: ScopeId,
    base_name: &str,
    base_ty: Type,
    members: &[Member],
) -> Result<Type> {
    let mut current = base_ty;
    let mut owner = base_name.to_string();

    for member in members {
        let struct_name = match current.struct_name() {
            Some(name) => name.to_string(),
            None => {
                return Err(Error::type_error(format!(
                    "Cannot access member of non-struct type '{}'",
                    current
                )))
            }
        };

        let fields = table
            .get_struct_fields(scope, &struct_name)?
            .ok_or_else(|| Error::semantic(format!("Undefined struct '{}'", struct_name)))?;

        let field_ty = fields
            .iter()
            .find(|(name, _)| *name == member.name)
            .map(|(_, ty)| ty.clone())
            .ok_or_else(|| {
                Error::type_error(format!(
                    "Variable '{}' of type '{}' has no member named '{}'",
                    owner, struct_name, member.name
                ))
            })?;

        owner = member.name.clone();
        current = field_ty;
    }

    Ok(current)
}

/// Element type produced by indexing
pub fn element_type(ty: &Type) -> Option<Type> {
    match ty {
        Type::Array { element, .. } => Some((**element).clone()),
        _ if ty.is_pointer() => Some(ty.clone().without_flags(TypeFlags::POINTER)),
        _ if ty.is_kind(PrimitiveKind::String) => Some(Type::primitive(PrimitiveKind::Char)),
        _ => None,
    }
}

pub fn call_return_type(table: &SymbolTable, scope: ScopeId, call: &Call) -> Result<Type> {
    match &call.target {
        CallTarget::Function { internal_name } => table
            .get_function_def(scope, internal_name)
            .map(|f| f.ret.clone())
            .ok_or_else(|| {
                Error::semantic(format!(
                    "Unable to resolve return type for function '{}'",
                    call.name
                ))
            }),
        CallTarget::Variable { internal_name, scope } => {
            match table.variable_in(*scope, internal_name).map(|f| &f.ty) {
                Some(Type::Function { ret, .. }) => Ok((**ret).clone()),
                _ => Err(Error::semantic(format!(
                    "Unable to resolve return type for function '{}'",
                    call.name
                ))),
            }
        }
        CallTarget::Deferred => Err(function_not_found(table, call)),
    }
}

/// Semantic error for a call with no matching function, with a suggestion
/// when a similarly named symbol exists
pub fn function_not_found(table: &SymbolTable, call: &Call) -> Error {
    let error = Error::semantic(format!(
        "Function '{}' was not found in this scope",
        mangle::display_signature(&call.name, &call.arg_types)
    ));

    let query = mangle::resolve_internal_function_name(&call.qualified, &call.arg_types, false);
    match table.fuzzy_find(call.scope, &query) {
        Some(SymbolDef::Function(f)) => error.with_suggestion(format!(
            "Did you mean '{}'?",
            mangle::display_signature(&mangle::display_path(&f.symbol.name), &f.params)
        )),
        Some(other) => error.with_suggestion(format!("Did you mean '{}'?", other.symbol().name)),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    fn int(value: u64) -> Expr {
        Expr::Literal {
            value: Literal::Integer { value, long: false },
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_integer_literal_widths() {
        let ty = |value, long| literal_type(&Literal::Integer { value, long }).to_string();
        assert_eq!(ty(10, false), "i32");
        assert_eq!(ty(10, true), "i64");
        assert_eq!(ty(i32::MAX as u64 + 1, false), "i64");
        assert_eq!(ty(u64::MAX, false), "u64");
    }

    #[test]
    fn test_other_literals() {
        assert_eq!(literal_type(&Literal::Float { value: 1.0, double: false }).to_string(), "f32");
        assert_eq!(literal_type(&Literal::Float { value: 1.0, double: true }).to_string(), "f64");
        assert_eq!(literal_type(&Literal::Bool(true)).bit_width(), 1);
        assert!(literal_type(&Literal::Nil).is_nil());
        assert_eq!(literal_type(&Literal::String("a".into())).to_string(), "string");
    }

    #[test]
    fn test_binary_promotes() {
        let table = SymbolTable::new();
        let expr = Expr::Binary {
            op: crate::frontend::ast::BinaryOp::Add,
            lhs: Box::new(int(1)),
            rhs: Box::new(Expr::Literal {
                value: Literal::Float { value: 2.0, double: true },
                span: Span::dummy(),
            }),
            span: Span::dummy(),
        };
        let ty = infer_expression_type(&table, table.global(), &expr).unwrap();
        assert_eq!(ty.to_string(), "f64");
    }

    #[test]
    fn test_dereference_requires_pointer() {
        let table = SymbolTable::new();
        let expr = Expr::Unary {
            op: UnaryOp::Dereference,
            operand: Box::new(int(1)),
            span: Span::dummy(),
        };
        let err = infer_expression_type(&table, table.global(), &expr).unwrap_err();
        assert_eq!(err.message(), "Cannot dereference non-pointer type");
    }

    #[test]
    fn test_empty_array_is_unknown() {
        let table = SymbolTable::new();
        let expr = Expr::Array {
            elements: vec![],
            span: Span::dummy(),
        };
        let ty = infer_expression_type(&table, table.global(), &expr).unwrap();
        assert_eq!(ty.to_string(), "unknown[]");
    }

    fn declaration(ty: PrimitiveKind, value: Expr) -> VarDecl {
        let table = SymbolTable::new();
        VarDecl {
            name: "a".into(),
            internal_name: "a".into(),
            ty: Type::primitive(ty),
            value: Some(value),
            mutable: true,
            visibility: Default::default(),
            scope: table.global(),
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_declaration_type_matches_annotation() {
        let table = SymbolTable::new();
        let long = Expr::Literal {
            value: Literal::Integer { value: 1, long: true },
            span: Span::dummy(),
        };
        let decl = declaration(PrimitiveKind::Int64, long);
        assert_eq!(infer_declaration_type(&table, &decl).unwrap().to_string(), "i64");

        let decl = VarDecl { value: None, ..decl };
        assert_eq!(infer_declaration_type(&table, &decl).unwrap().to_string(), "i64");
    }

    #[test]
    fn test_declaration_type_takes_dominant() {
        let table = SymbolTable::new();
        let decl = declaration(PrimitiveKind::Float64, int(1));
        assert_eq!(infer_declaration_type(&table, &decl).unwrap().to_string(), "f64");

        let decl = declaration(PrimitiveKind::Int8, int(1));
        assert_eq!(infer_declaration_type(&table, &decl).unwrap().to_string(), "i32");
    }

    #[test]
    fn test_element_type() {
        let arr = Type::array(Type::primitive(PrimitiveKind::Int64), 2);
        assert_eq!(element_type(&arr).unwrap().to_string(), "i64");
        let ptr = Type::primitive(PrimitiveKind::Int8).with_flags(TypeFlags::POINTER);
        assert_eq!(element_type(&ptr).unwrap().to_string(), "i8");
        assert!(element_type(&Type::primitive(PrimitiveKind::Int32)).is_none());
    }
}
