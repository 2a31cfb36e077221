//! Symbol registry for Stride
//!
//! Scopes live in an arena and refer to their parent by index. There is exactly
//! one Global root; following parents from any scope always ends there.
//! Functions and structs are always registered in the Global scope, while
//! variables go into the scope they are declared in.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::Type;
use crate::utils::{Error, Result, Span};

// ==================== Scopes ====================

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Class,
    Block,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Module => "module",
            ScopeKind::Function => "function",
            ScopeKind::Class => "class",
            ScopeKind::Block => "block",
        }
    }

    /// Scopes that may hold or expose functions and structs
    pub fn is_declaration_root(&self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Module)
    }
}

// ==================== Symbols ====================

/// Symbol identity: the name as written and the name used for lookup and codegen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub internal_name: String,
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, internal_name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            internal_name: internal_name.into(),
            span,
        }
    }

    /// A symbol whose internal name equals its display name
    pub fn plain(name: impl Into<String>, span: Span) -> Self {
        let name = name.into();
        Self {
            internal_name: name.clone(),
            name,
            span,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.name == name || self.internal_name == name
    }
}

/// A variable or struct member
#[derive(Debug, Clone, Serialize)]
pub struct FieldSymbol {
    pub symbol: Symbol,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FunctionFlags {
    pub is_extern: bool,
    pub is_async: bool,
    pub is_variadic: bool,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSymbol {
    pub symbol: Symbol,
    pub params: Vec<Type>,
    pub ret: Type,
    pub flags: FunctionFlags,
}

impl FunctionSymbol {
    /// The callable's signature as a value type
    pub fn as_type(&self) -> Type {
        Type::function(self.params.clone(), self.ret.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum StructLayout {
    /// Ordered member list
    Fields(Vec<(String, Type)>),
    /// Alias of another struct's layout
    Reference(Symbol),
}

#[derive(Debug, Clone, Serialize)]
pub struct StructSymbol {
    pub symbol: Symbol,
    pub layout: StructLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentifiableKind {
    Class,
    Enum,
    EnumMember,
}

/// Marker-only symbol
#[derive(Debug, Clone, Serialize)]
pub struct IdentifiableSymbol {
    pub symbol: Symbol,
    pub kind: IdentifiableKind,
}

#[derive(Debug, Clone, Serialize)]
pub enum SymbolDef {
    Field(FieldSymbol),
    Function(FunctionSymbol),
    Struct(StructSymbol),
    Identifiable(IdentifiableSymbol),
}

impl SymbolDef {
    pub fn symbol(&self) -> &Symbol {
        match self {
            SymbolDef::Field(f) => &f.symbol,
            SymbolDef::Function(f) => &f.symbol,
            SymbolDef::Struct(s) => &s.symbol,
            SymbolDef::Identifiable(i) => &i.symbol,
        }
    }
}

/// A scope containing symbols
#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Segment name of module scopes
    pub name: Option<String>,
    symbols: Vec<SymbolDef>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, name: Option<String>) -> Self {
        Self {
            kind,
            parent,
            name,
            symbols: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &[SymbolDef] {
        &self.symbols
    }

    fn field(&self, name: &str) -> Option<&FieldSymbol> {
        self.symbols.iter().find_map(|def| match def {
            SymbolDef::Field(field) if field.symbol.matches(name) => Some(field),
            _ => None,
        })
    }
}

// ==================== Symbol Table ====================

/// Arena of nested scopes rooted at one Global scope
#[derive(Debug, Clone, Serialize)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    global: ScopeId,
    /// Module scopes by `__`-joined path
    modules: HashMap<String, ScopeId>,
    anonymous_functions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
            global: ScopeId(0),
            modules: HashMap::new(),
            anonymous_functions: 0,
        }
    }

    /// Next free `__anonymous_N` name for a lambda
    pub fn next_anonymous_name(&mut self) -> String {
        let name = format!("__anonymous_{}", self.anonymous_functions);
        self.anonymous_functions += 1;
        name
    }

    pub fn global(&self) -> ScopeId {
        self.global
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.0].kind
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Open a child scope
    pub fn create_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(parent), None));
        log::trace!("scope {:?} ({}) opened under {:?}", id, kind.as_str(), parent);
        id
    }

    /// Open (or re-open) a named module scope
    pub fn create_module_scope(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let mut path = self.module_path(parent);
        path.push(name.to_string());
        let key = path.join(crate::frontend::mangle::MODULE_DELIMITER);

        if let Some(existing) = self.modules.get(&key) {
            return *existing;
        }

        let id = ScopeId(self.scopes.len());
        self.scopes
            .push(Scope::new(ScopeKind::Module, Some(parent), Some(name.to_string())));
        self.modules.insert(key, id);
        log::debug!("module scope {:?} opened for {}", id, name);
        id
    }

    /// Module scope registered under a `__`-joined path
    pub fn module_scope(&self, path: &str) -> Option<ScopeId> {
        self.modules.get(path).copied()
    }

    /// Scope ids from `id` up to and including Global
    pub fn ancestors(&self, id: ScopeId) -> Ancestors<'_> {
        Ancestors {
            table: self,
            next: Some(id),
        }
    }

    /// Names of the enclosing module scopes, outermost first
    pub fn module_path(&self, id: ScopeId) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(id)
            .filter_map(|s| {
                let scope = self.scope(s);
                match scope.kind {
                    ScopeKind::Module => scope.name.clone(),
                    _ => None,
                }
            })
            .collect();
        path.reverse();
        path
    }

    /// Nearest scope of the given kind, starting at `id` itself
    pub fn enclosing(&self, id: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        self.ancestors(id).find(|s| self.kind(*s) == kind)
    }

    // ==================== Definitions ====================

    /// Define a variable in `scope`. Inner scopes may shadow outer variables,
    /// but a name can only be defined once per scope.
    pub fn define_variable(&mut self, scope: ScopeId, symbol: Symbol, ty: Type) -> Result<()> {
        let target = &self.scopes[scope.0];
        if target.field(&symbol.name).is_some() || target.field(&symbol.internal_name).is_some() {
            let place = if target.kind == ScopeKind::Global {
                "global scope"
            } else {
                "this scope"
            };
            return Err(Error::semantic(format!(
                "Field '{}' is already defined in {}",
                symbol.name, place
            )));
        }

        log::trace!("variable {} defined in {:?}", symbol.internal_name, scope);
        self.scopes[scope.0]
            .symbols
            .push(SymbolDef::Field(FieldSymbol { symbol, ty }));
        Ok(())
    }

    /// Register a function at Global. Overloads differ by internal name.
    pub fn define_function(
        &mut self,
        symbol: Symbol,
        params: Vec<Type>,
        ret: Type,
        flags: FunctionFlags,
    ) -> Result<()> {
        let global = self.global;
        let exists = self.scopes[global.0].symbols.iter().any(|def| {
            matches!(def, SymbolDef::Function(f) if f.symbol.internal_name == symbol.internal_name)
        });
        if exists {
            return Err(Error::semantic(format!(
                "Function '{}' is already defined",
                symbol.internal_name
            )));
        }

        log::debug!("function {} registered", symbol.internal_name);
        self.scopes[global.0]
            .symbols
            .push(SymbolDef::Function(FunctionSymbol {
                symbol,
                params,
                ret,
                flags,
            }));
        Ok(())
    }

    /// Register a struct with its own member list
    pub fn define_struct(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
        fields: Vec<(String, Type)>,
    ) -> Result<()> {
        if !self.kind(scope).is_declaration_root() {
            return Err(Error::semantic(
                "Struct declarations are only allowed in global or module scope",
            ));
        }
        self.insert_struct(StructSymbol {
            symbol,
            layout: StructLayout::Fields(fields),
        })
    }

    /// Register a struct that aliases another struct's layout
    pub fn define_struct_reference(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
        reference: Symbol,
    ) -> Result<()> {
        if !self.kind(scope).is_declaration_root() {
            return Err(Error::semantic(
                "Reference structs can only be defined in the global or module scope",
            ));
        }
        self.insert_struct(StructSymbol {
            symbol,
            layout: StructLayout::Reference(reference),
        })
    }

    fn insert_struct(&mut self, def: StructSymbol) -> Result<()> {
        let global = self.global;
        let exists = self.scopes[global.0].symbols.iter().any(|existing| {
            matches!(
                existing,
                SymbolDef::Struct(s) if s.symbol.internal_name == def.symbol.internal_name
            )
        });
        if exists {
            return Err(Error::semantic(format!(
                "Struct '{}' is already defined in this scope",
                def.symbol.name
            )));
        }

        log::debug!("struct {} registered", def.symbol.internal_name);
        self.scopes[global.0].symbols.push(SymbolDef::Struct(def));
        Ok(())
    }

    /// Register a marker symbol (enum, enum member, class) in `scope`
    pub fn define_symbol(
        &mut self,
        scope: ScopeId,
        symbol: Symbol,
        kind: IdentifiableKind,
    ) -> Result<()> {
        let exists = self.scopes[scope.0].symbols.iter().any(|def| {
            matches!(
                def,
                SymbolDef::Identifiable(i) if i.symbol.internal_name == symbol.internal_name
            )
        });
        if exists {
            return Err(Error::semantic(format!(
                "Symbol '{}' is already defined in this scope",
                symbol.name
            )));
        }

        self.scopes[scope.0]
            .symbols
            .push(SymbolDef::Identifiable(IdentifiableSymbol { symbol, kind }));
        Ok(())
    }

    // ==================== Lookup ====================

    /// Find a variable by display or internal name, innermost scope first
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<&FieldSymbol> {
        self.resolve_variable(scope, name).map(|(_, field)| field)
    }

    /// Like [`SymbolTable::lookup_variable`], also returning the defining scope
    pub fn resolve_variable(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &FieldSymbol)> {
        let found = self
            .ancestors(scope)
            .find_map(|id| self.scope(id).field(name).map(|field| (id, field)));
        log::trace!("lookup {} from {:?}: {}", name, scope, found.is_some());
        found
    }

    /// Variable defined directly in `scope`
    pub fn variable_in(&self, scope: ScopeId, name: &str) -> Option<&FieldSymbol> {
        self.scope(scope).field(name)
    }

    /// Find a function by internal name
    pub fn get_function_def(&self, scope: ScopeId, internal_name: &str) -> Option<&FunctionSymbol> {
        self.declaration_roots(scope).find_map(|id| {
            self.scope(id).symbols.iter().find_map(|def| match def {
                SymbolDef::Function(f) if f.symbol.internal_name == internal_name => Some(f),
                _ => None,
            })
        })
    }

    /// All overloads sharing a display name
    pub fn functions_named(&self, scope: ScopeId, name: &str) -> Vec<&FunctionSymbol> {
        self.declaration_roots(scope)
            .flat_map(|id| self.scope(id).symbols.iter())
            .filter_map(|def| match def {
                SymbolDef::Function(f) if f.symbol.name == name => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Find a struct by internal name
    pub fn get_struct_def(&self, scope: ScopeId, internal_name: &str) -> Option<&StructSymbol> {
        self.declaration_roots(scope).find_map(|id| {
            self.scope(id).symbols.iter().find_map(|def| match def {
                SymbolDef::Struct(s) if s.symbol.internal_name == internal_name => Some(s),
                _ => None,
            })
        })
    }

    /// Member list of a struct, following reference aliases to the struct that
    /// declares the members. `Ok(None)` if `name` is not a struct at all.
    pub fn get_struct_fields(
        &self,
        scope: ScopeId,
        name: &str,
    ) -> Result<Option<&[(String, Type)]>> {
        let mut current = match self.get_struct_def(scope, name) {
            Some(def) => def,
            None => return Ok(None),
        };

        let mut visited = HashSet::new();
        loop {
            if !visited.insert(current.symbol.internal_name.as_str()) {
                return Err(Error::semantic(format!(
                    "Cyclic struct reference detected while resolving '{}'",
                    name
                )));
            }

            match &current.layout {
                StructLayout::Fields(fields) => return Ok(Some(fields)),
                StructLayout::Reference(target) => {
                    current = self.get_struct_def(scope, &target.internal_name).ok_or_else(|| {
                        Error::semantic(format!(
                            "Unable to determine type of struct '{}': \
                             referenced struct type '{}' is undefined",
                            current.symbol.name, target.name
                        ))
                    })?;
                }
            }
        }
    }

    /// Any symbol by name, innermost scope first
    pub fn lookup_symbol(&self, scope: ScopeId, name: &str) -> Option<&SymbolDef> {
        self.ancestors(scope)
            .find_map(|id| self.scope(id).symbols.iter().find(|def| def.symbol().matches(name)))
    }

    /// Scopes that may hold functions and structs, innermost first
    fn declaration_roots(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.ancestors(scope)
            .filter(move |id| self.kind(*id).is_declaration_root())
    }

    // ==================== Suggestions ====================

    /// Closest symbol visible from `scope`, for "did you mean" hints only.
    ///
    /// Candidates are scored by Levenshtein distance against their internal
    /// name. A distance equal to the length difference means the query is a
    /// truncation of the candidate and counts as zero. Ties prefer the closer
    /// length; matches further than 4 edits are rejected.
    pub fn fuzzy_find(&self, scope: ScopeId, query: &str) -> Option<&SymbolDef> {
        const MAX_DISTANCE: usize = 4;

        let query_len = query.chars().count();
        let mut best: Option<(&SymbolDef, usize, usize)> = None;

        for id in self.ancestors(scope) {
            for def in &self.scope(id).symbols {
                let candidate = &def.symbol().internal_name;
                let distance = strsim::levenshtein(query, candidate);
                let len_diff = query_len.abs_diff(candidate.chars().count());
                let effective = if distance == len_diff { 0 } else { distance };

                let better = match best {
                    None => true,
                    Some((_, best_distance, best_diff)) => {
                        effective < best_distance
                            || (effective == best_distance && len_diff < best_diff)
                    }
                };
                if better {
                    best = Some((def, effective, len_diff));
                }
            }
        }

        best.filter(|(_, distance, _)| *distance <= MAX_DISTANCE)
            .map(|(def, _, _)| def)
    }

    /// Symbols registered directly in the Global scope
    pub fn global_symbols(&self) -> &[SymbolDef] {
        &self.scopes[self.global.0].symbols
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a scope and its parents
pub struct Ancestors<'a> {
    table: &'a SymbolTable,
    next: Option<ScopeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let current = self.next?;
        self.next = self.table.scope(current).parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    fn i32_() -> Type {
        Type::primitive(PrimitiveKind::Int32)
    }

    fn sym(name: &str) -> Symbol {
        Symbol::plain(name, Span::dummy())
    }

    #[test]
    fn test_every_scope_reaches_global() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let module = table.create_module_scope(global, "Foo");
        let function = table.create_scope(module, ScopeKind::Function);
        let block = table.create_scope(function, ScopeKind::Block);

        let chain: Vec<ScopeId> = table.ancestors(block).collect();
        assert_eq!(chain, vec![block, function, module, global]);
        assert_eq!(table.module_path(block), vec!["Foo".to_string()]);
        assert_eq!(table.enclosing(block, ScopeKind::Function), Some(function));
    }

    #[test]
    fn test_shadowing_in_nested_block() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let function = table.create_scope(global, ScopeKind::Function);
        let block = table.create_scope(function, ScopeKind::Block);

        table.define_variable(function, sym("x"), i32_()).unwrap();
        table
            .define_variable(block, sym("x"), Type::primitive(PrimitiveKind::Int64))
            .unwrap();

        assert_eq!(table.lookup_variable(block, "x").unwrap().ty.to_string(), "i64");
        assert_eq!(table.lookup_variable(function, "x").unwrap().ty.to_string(), "i32");
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let function = table.create_scope(global, ScopeKind::Function);

        table.define_variable(function, sym("x"), i32_()).unwrap();
        let err = table.define_variable(function, sym("x"), i32_()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
        assert_eq!(err.message(), "Field 'x' is already defined in this scope");

        table.define_variable(global, sym("g"), i32_()).unwrap();
        let err = table.define_variable(global, sym("g"), i32_()).unwrap_err();
        assert_eq!(err.message(), "Field 'g' is already defined in global scope");
    }

    #[test]
    fn test_functions_live_at_global() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let function = table.create_scope(global, ScopeKind::Function);
        let block = table.create_scope(function, ScopeKind::Block);

        table
            .define_function(
                Symbol::new("add", "add(i32,i32)", Span::dummy()),
                vec![i32_(), i32_()],
                i32_(),
                FunctionFlags::default(),
            )
            .unwrap();

        assert!(table.get_function_def(block, "add(i32,i32)").is_some());
        assert_eq!(table.functions_named(block, "add").len(), 1);
        assert!(matches!(table.global_symbols()[0], SymbolDef::Function(_)));

        let err = table
            .define_function(
                Symbol::new("add", "add(i32,i32)", Span::dummy()),
                vec![i32_(), i32_()],
                i32_(),
                FunctionFlags::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
    }

    #[test]
    fn test_struct_only_in_global_or_module() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let function = table.create_scope(global, ScopeKind::Function);

        let err = table
            .define_struct(function, sym("P"), vec![("x".into(), i32_())])
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));

        let err = table
            .define_struct_reference(function, sym("Q"), sym("P"))
            .unwrap_err();
        assert!(err.message().contains("Reference structs"));

        table.define_struct(global, sym("P"), vec![("x".into(), i32_())]).unwrap();
        assert!(table.get_struct_def(function, "P").is_some());
    }

    #[test]
    fn test_struct_lookup_uses_internal_name() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let geo = table.create_module_scope(global, "Geo");
        table
            .define_struct(
                geo,
                Symbol::new("Point", "Geo__Point", Span::dummy()),
                vec![("x".into(), i32_())],
            )
            .unwrap();

        assert!(table.get_struct_def(global, "Geo__Point").is_some());
        assert!(table.get_struct_def(global, "Point").is_none());
        assert!(table.get_struct_fields(geo, "Point").unwrap().is_none());
    }

    #[test]
    fn test_struct_alias_chain_resolves() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table
            .define_struct(global, sym("Point"), vec![("x".into(), i32_()), ("y".into(), i32_())])
            .unwrap();
        table.define_struct_reference(global, sym("Vec2"), sym("Point")).unwrap();
        table.define_struct_reference(global, sym("Pos"), sym("Vec2")).unwrap();

        let fields = table.get_struct_fields(global, "Pos").unwrap().unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(table.get_struct_fields(global, "Nope").unwrap().is_none());
    }

    #[test]
    fn test_struct_alias_cycle_is_detected() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define_struct_reference(global, sym("A"), sym("B")).unwrap();
        table.define_struct_reference(global, sym("B"), sym("A")).unwrap();

        let err = table.get_struct_fields(global, "A").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
        assert!(err.message().contains("Cyclic struct reference"));
    }

    #[test]
    fn test_struct_alias_to_missing_struct() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define_struct_reference(global, sym("A"), sym("Missing")).unwrap();
        let err = table.get_struct_fields(global, "A").unwrap_err();
        assert!(err.message().contains("'Missing' is undefined"));
    }

    #[test]
    fn test_duplicate_struct() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define_struct(global, sym("P"), vec![("x".into(), i32_())]).unwrap();
        let err = table.define_struct(global, sym("P"), vec![("y".into(), i32_())]).unwrap_err();
        assert_eq!(err.message(), "Struct 'P' is already defined in this scope");
    }

    #[test]
    fn test_fuzzy_find() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define_variable(global, sym("factorial"), i32_()).unwrap();
        table.define_variable(global, sym("result"), i32_()).unwrap();

        let found = table.fuzzy_find(global, "fatorial").map(|d| d.symbol().name.as_str());
        assert_eq!(found, Some("factorial"));
        assert!(table.fuzzy_find(global, "zzzzzzzzzz").is_none());
    }

    #[test]
    fn test_fuzzy_find_prefers_truncation() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let function = table.create_scope(global, ScopeKind::Function);
        table.define_variable(global, sym("counter_total"), i32_()).unwrap();

        let found = table.fuzzy_find(function, "counter").map(|d| d.symbol().name.as_str());
        assert_eq!(found, Some("counter_total"));
    }

    #[test]
    fn test_module_scope_is_reopened() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let first = table.create_module_scope(global, "Foo");
        let again = table.create_module_scope(global, "Foo");
        let inner = table.create_module_scope(first, "Bar");
        assert_eq!(first, again);
        assert_eq!(table.module_scope("Foo__Bar"), Some(inner));
    }

    #[test]
    fn test_identifiable_symbols() {
        let mut table = SymbolTable::new();
        let global = table.global();
        table.define_symbol(global, sym("Color"), IdentifiableKind::Enum).unwrap();
        assert!(table.define_symbol(global, sym("Color"), IdentifiableKind::Enum).is_err());
        assert!(matches!(
            table.lookup_symbol(global, "Color"),
            Some(SymbolDef::Identifiable(IdentifiableSymbol { kind: IdentifiableKind::Enum, .. }))
        ));
    }
}
