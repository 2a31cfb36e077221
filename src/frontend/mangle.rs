//! Internal name derivation
//!
//! Items declared inside modules are qualified with the module path joined by
//! [`MODULE_DELIMITER`]. Functions additionally carry their parameter types as
//! a readable tuple key, so overloads never collide: `add(i32,i32)`.

use crate::frontend::semantic::{ScopeId, SymbolTable};
use crate::types::Type;

pub const MODULE_DELIMITER: &str = "__";

/// Join path segments into a qualified name
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(MODULE_DELIMITER)
}

/// Prefix `name` with the module path of `scope`
pub fn qualify(table: &SymbolTable, scope: ScopeId, name: &str) -> String {
    let mut path = table.module_path(scope);
    if path.is_empty() {
        return name.to_string();
    }
    path.push(name.to_string());
    join_segments(&path)
}

/// Mangled name of a function. `main` and extern functions keep their
/// qualified name so the linker and the runtime can find them.
pub fn resolve_internal_function_name(qualified: &str, params: &[Type], is_extern: bool) -> String {
    if is_extern || qualified == "main" {
        return qualified.to_string();
    }
    let key: Vec<String> = params.iter().map(Type::internal_name).collect();
    format!("{}({})", qualified, key.join(","))
}

pub fn resolve_internal_struct_name(qualified: &str) -> String {
    qualified.to_string()
}

/// `name(T1, T2)` as shown in diagnostics
pub fn display_signature(name: &str, params: &[Type]) -> String {
    let key: Vec<String> = params.iter().map(Type::internal_name).collect();
    format!("{}({})", name, key.join(", "))
}

/// Source form of a qualified name (`Outer::Inner::f`)
pub fn display_path(qualified: &str) -> String {
    qualified.replace(MODULE_DELIMITER, "::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeFlags};
    use pretty_assertions::assert_eq;

    fn prim(kind: PrimitiveKind) -> Type {
        Type::primitive(kind)
    }

    #[test]
    fn test_mangling_is_deterministic() {
        let params = vec![prim(PrimitiveKind::Int32), prim(PrimitiveKind::Int64)];
        let a = resolve_internal_function_name("add", &params, false);
        let b = resolve_internal_function_name("add", &params.clone(), false);
        assert_eq!(a, b);
        assert_eq!(a, "add(i32,i64)");
    }

    #[test]
    fn test_overloads_differ() {
        let a = resolve_internal_function_name("add", &[prim(PrimitiveKind::Int32)], false);
        let b = resolve_internal_function_name("add", &[prim(PrimitiveKind::Float64)], false);
        let c = resolve_internal_function_name(
            "add",
            &[prim(PrimitiveKind::Int32).with_flags(TypeFlags::POINTER)],
            false,
        );
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_main_and_extern_are_not_mangled() {
        assert_eq!(resolve_internal_function_name("main", &[], false), "main");
        assert_eq!(
            resolve_internal_function_name("printf", &[prim(PrimitiveKind::String)], true),
            "printf"
        );
    }

    #[test]
    fn test_qualify_with_modules() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let outer = table.create_module_scope(global, "Outer");
        let inner = table.create_module_scope(outer, "Inner");

        assert_eq!(qualify(&table, global, "f"), "f");
        assert_eq!(qualify(&table, inner, "nested"), "Outer__Inner__nested");
        assert_eq!(display_path("Outer__Inner__nested"), "Outer::Inner::nested");
    }

    #[test]
    fn test_display_signature() {
        let params = [prim(PrimitiveKind::Int64), prim(PrimitiveKind::Int64)];
        assert_eq!(display_signature("add", &params), "add(i64, i64)");
    }
}
