//! Semantic checks run while parsing
//!
//! Each check reports the first problem it finds, pointing at the offending
//! source range.

use std::sync::Arc;

use crate::frontend::ast::{Binding, Block, Expr, FieldInit, Stmt};
use crate::frontend::infer::infer_expression_type;
use crate::frontend::semantic::{ScopeId, SymbolTable};
use crate::types::{is_assignable, Type};
use crate::utils::{Error, Result, SourceFile, Span};

/// Whether `value` may initialize or be assigned to a slot of type `target`.
///
/// Beyond plain assignability, unsuffixed integer literals fit any integer
/// type whose range holds them, and array literals are checked element-wise.
pub fn coerces(table: &SymbolTable, scope: ScopeId, target: &Type, value: &Expr) -> Result<bool> {
    if let Some(literal) = value.integer_literal_value() {
        if !target.is_pointer() {
            if let Some((min, max)) = target.primitive_kind().and_then(|k| k.integer_range()) {
                return Ok(literal >= min && literal <= max);
            }
        }
    }

    if let (Type::Array { element, .. }, Expr::Array { elements, .. }) = (target, value) {
        if !elements.is_empty() {
            for item in elements {
                if !coerces(table, scope, element, item)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
    }

    let actual = infer_expression_type(table, scope, value)?;
    Ok(is_assignable(target, &actual))
}

/// Declared type against initializer
pub fn check_declaration(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    declared: &Type,
    declared_span: Span,
    value: &Expr,
) -> Result<()> {
    let actual = infer_expression_type(table, scope, value)
        .map_err(|e| e.or_reference(file, value.span()))?;
    if coerces(table, scope, declared, value)? {
        return Ok(());
    }
    Err(Error::type_error(format!(
        "Type mismatch in variable declaration; expected type '{}', got '{}'",
        declared, actual
    ))
    .with_reference(file, declared_span)
    .with_reference(file, value.span()))
}

/// Struct initializer members against the struct's declared members:
/// count first, then each member's name, position and type.
pub fn check_struct_initializer(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    struct_name: &str,
    internal_name: &str,
    fields: &[FieldInit],
    span: Span,
) -> Result<()> {
    let expected = table
        .get_struct_fields(scope, internal_name)
        .map_err(|e| e.or_reference(file, span))?
        .ok_or_else(|| {
            Error::semantic(format!("Undefined struct '{}'", struct_name))
                .with_reference(file, span)
        })?;

    if fields.len() > expected.len() {
        return Err(Error::semantic(format!(
            "Too many members found in struct '{}': expected {}, got {}",
            struct_name,
            expected.len(),
            fields.len()
        ))
        .with_reference(file, span));
    }
    if fields.len() < expected.len() {
        return Err(Error::semantic(format!(
            "Too few members found in struct '{}': expected {}, got {}",
            struct_name,
            expected.len(),
            fields.len()
        ))
        .with_reference(file, span));
    }

    for (index, field) in fields.iter().enumerate() {
        let member_ty = match expected.iter().find(|(name, _)| *name == field.name) {
            Some((_, ty)) => ty,
            None => {
                return Err(Error::semantic(format!(
                    "Struct '{}' has no member named '{}'",
                    struct_name, field.name
                ))
                .with_reference(file, field.span))
            }
        };

        let (expected_name, _) = &expected[index];
        if *expected_name != field.name {
            return Err(Error::semantic(format!(
                "Struct member order mismatch at index {}: expected '{}', got '{}'",
                index, expected_name, field.name
            ))
            .with_reference(file, field.span));
        }

        let accepted = coerces(table, scope, member_ty, &field.value)
            .map_err(|e| e.or_reference(file, field.value.span()))?;
        if !accepted {
            let actual = infer_expression_type(table, scope, &field.value)?;
            return Err(Error::type_error(format!(
                "Type mismatch for member '{}' in struct initializer '{}': expected '{}', got '{}'",
                field.name, struct_name, member_ty, actual
            ))
            .with_reference(file, field.value.span()));
        }
    }

    Ok(())
}

/// A `return` against the enclosing function's signature
pub fn check_return(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    function: &str,
    ret: &Type,
    value: Option<&Expr>,
    span: Span,
) -> Result<()> {
    match value {
        Some(value) if ret.is_void() => Err(Error::type_error(format!(
            "Function '{}' has return type 'void' and cannot return a value.",
            function
        ))
        .with_reference(file, value.span())),
        Some(value) => {
            if coerces(table, scope, ret, value).map_err(|e| e.or_reference(file, value.span()))? {
                return Ok(());
            }
            let actual = infer_expression_type(table, scope, value)?;
            Err(Error::type_error(format!(
                "Function '{}' expected a return type of '{}', but received '{}'.",
                function, ret, actual
            ))
            .with_reference(file, value.span()))
        }
        None if !ret.is_void() => Err(Error::type_error(format!(
            "Function '{}' expected a return type of '{}', but received 'void'.",
            function, ret
        ))
        .with_reference(file, span)),
        None => Ok(()),
    }
}

/// Whether every path through `block` ends in a `return`
pub fn always_returns(block: &Block) -> bool {
    block.stmts.iter().any(stmt_returns)
}

fn stmt_returns(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::Block(block) => always_returns(block),
        Stmt::If {
            then_block,
            else_block: Some(else_block),
            ..
        } => always_returns(then_block) && always_returns(else_block),
        _ => false,
    }
}

/// Name and current type of the variable an assignment or `++`/`--` writes to
fn target_binding(
    table: &SymbolTable,
    scope: ScopeId,
    target: &Expr,
) -> Result<Option<(String, Type, Type)>> {
    let (ident, slot_ty) = match target {
        Expr::Identifier(ident) => (ident, None),
        Expr::MemberAccess { base, .. } => {
            (base, Some(infer_expression_type(table, scope, target)?))
        }
        Expr::Index { array, .. } => match array.as_ref() {
            Expr::Identifier(ident) => (ident, Some(infer_expression_type(table, scope, target)?)),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };

    match &ident.binding {
        Binding::Variable { internal_name, scope } => {
            let field = match table.variable_in(*scope, internal_name) {
                Some(field) => field,
                None => return Ok(None),
            };
            let slot = slot_ty.unwrap_or_else(|| field.ty.clone());
            Ok(Some((ident.name.clone(), field.ty.clone(), slot)))
        }
        Binding::Function { .. } => Ok(None),
    }
}

/// A reassignment needs a mutable binding and a compatible value
pub fn check_reassignment(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    target: &Expr,
    value: &Expr,
    span: Span,
) -> Result<()> {
    let binding = target_binding(table, scope, target)
        .map_err(|e| e.or_reference(file, target.span()))?;
    let (name, binding_ty, slot_ty) = match binding {
        Some(found) => found,
        None => {
            return Err(
                Error::syntax("Invalid assignment target").with_reference(file, target.span())
            )
        }
    };

    if !binding_ty.is_mutable() {
        return Err(Error::semantic(format!(
            "Variable '{}' is immutable and cannot be reassigned",
            name
        ))
        .with_reference(file, span));
    }

    if !coerces(table, scope, &slot_ty, value).map_err(|e| e.or_reference(file, value.span()))? {
        let actual = infer_expression_type(table, scope, value)?;
        return Err(Error::type_error(format!(
            "Type mismatch when reassigning variable '{}', expected type '{}', got type '{}'",
            name, slot_ty, actual
        ))
        .with_reference(file, value.span()));
    }
    Ok(())
}

/// `++`/`--` need a mutable binding
pub fn check_mutation(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    target: &Expr,
) -> Result<()> {
    match target_binding(table, scope, target).map_err(|e| e.or_reference(file, target.span()))? {
        Some((name, ty, _)) if !ty.is_mutable() => Err(Error::semantic(format!(
            "Variable '{}' is immutable and cannot be reassigned",
            name
        ))
        .with_reference(file, target.span())),
        Some(_) => Ok(()),
        None => Err(Error::syntax("Increment and decrement require a variable")
            .with_reference(file, target.span())),
    }
}

/// Index expressions must be integers
pub fn check_index(
    table: &SymbolTable,
    scope: ScopeId,
    file: &Arc<SourceFile>,
    index: &Expr,
) -> Result<()> {
    let ty = infer_expression_type(table, scope, index)
        .map_err(|e| e.or_reference(file, index.span()))?;
    if ty.is_integer() && !ty.is_pointer() {
        return Ok(());
    }
    Err(Error::semantic(format!(
        "Array index accessor must be of type int, got '{}'",
        ty
    ))
    .with_reference(file, index.span()))
}

/// Whether arguments fit a parameter list
pub fn arguments_accept(
    table: &SymbolTable,
    scope: ScopeId,
    params: &[Type],
    is_variadic: bool,
    args: &[Expr],
) -> Result<bool> {
    let count_ok = if is_variadic {
        args.len() >= params.len()
    } else {
        args.len() == params.len()
    };
    if !count_ok {
        return Ok(false);
    }
    for (param, arg) in params.iter().zip(args) {
        if !coerces(table, scope, param, arg)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Literal, Program};
    use crate::frontend::parser::parse_source;
    use crate::types::PrimitiveKind;

    fn parse(source: &str) -> Program {
        let mut table = SymbolTable::new();
        let file = SourceFile::new(0, "validate.sr", source);
        parse_source(&mut table, &file).unwrap_or_else(|e| panic!("{}", e.render()))
    }

    fn function_body(program: &Program) -> &Block {
        program
            .body
            .stmts
            .iter()
            .find_map(|s| match s {
                Stmt::Function(f) => f.body.as_ref(),
                _ => None,
            })
            .expect("no function body")
    }

    fn int(value: u64) -> Expr {
        Expr::Literal {
            value: Literal::Integer { value, long: false },
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_always_returns() {
        let both = parse("fn f(x: i32): i32 { if (x > 0) { return 1; } else { return 2; } }");
        assert!(always_returns(function_body(&both)));

        let nested = parse("fn f(): i32 { { return 1; } }");
        assert!(always_returns(function_body(&nested)));

        let loop_only = parse("fn f(): void { while (true) { return; } }");
        assert!(!always_returns(function_body(&loop_only)));
    }

    #[test]
    fn test_literal_coercion() {
        let table = SymbolTable::new();
        let global = table.global();
        let u8_ty = Type::primitive(PrimitiveKind::UInt8);
        assert!(coerces(&table, global, &u8_ty, &int(255)).unwrap());
        assert!(!coerces(&table, global, &u8_ty, &int(256)).unwrap());

        let array = Expr::Array {
            elements: vec![int(1), int(300)],
            span: Span::dummy(),
        };
        let i16_array = Type::array(Type::primitive(PrimitiveKind::Int16), 2);
        assert!(coerces(&table, global, &i16_array, &array).unwrap());
        let u8_array = Type::array(u8_ty, 2);
        assert!(!coerces(&table, global, &u8_array, &array).unwrap());
    }

    #[test]
    fn test_arguments_accept() {
        let table = SymbolTable::new();
        let global = table.global();
        let params = vec![Type::primitive(PrimitiveKind::Int64)];
        assert!(arguments_accept(&table, global, &params, false, &[int(1)]).unwrap());
        assert!(!arguments_accept(&table, global, &params, false, &[int(1), int(2)]).unwrap());
        assert!(arguments_accept(&table, global, &params, true, &[int(1), int(2)]).unwrap());
        assert!(!arguments_accept(&table, global, &params, true, &[]).unwrap());
    }
}
