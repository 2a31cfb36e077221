//! Declaration parsing: imports, modules, functions, structs, enums,
//! variables and type annotations

use std::collections::HashSet;

use crate::frontend::ast::*;
use crate::frontend::mangle;
use crate::frontend::parser::{
    FunctionContext, Parser, MAX_FUNCTION_PARAMETERS, MAX_IDENTIFIER_CHAIN,
};
use crate::frontend::semantic::{
    FunctionFlags, IdentifiableKind, ScopeId, ScopeKind, Symbol, SymbolDef,
};
use crate::frontend::stream::TokenStream;
use crate::frontend::token::TokenKind;
use crate::frontend::validate;
use crate::types::{PrimitiveKind, Type, TypeFlags};
use crate::utils::{Error, Result, Span};

impl Parser<'_> {
    /// Ident (`::` Ident)*, stopping before `::{`
    pub(crate) fn parse_path(
        &mut self,
        stream: &mut TokenStream,
        message: &str,
    ) -> Result<(Vec<String>, Span)> {
        let first = stream.expect_msg(TokenKind::Ident, message)?;
        let mut segments = vec![first.lexeme];
        while stream.peek_next_eq(TokenKind::ColonColon) && stream.peek_eq(TokenKind::Ident, 1) {
            stream.next();
            segments.push(stream.next().lexeme);
            if segments.len() > MAX_IDENTIFIER_CHAIN {
                return Err(stream.error(format!(
                    "Identifier chain exceeds the maximum of {} segments",
                    MAX_IDENTIFIER_CHAIN
                )));
            }
        }
        Ok((segments, stream.span_from(first.span)))
    }

    fn require_declaration_root(&self, scope: ScopeId, message: &str, span: Span) -> Result<()> {
        if self.table.kind(scope).is_declaration_root() {
            Ok(())
        } else {
            Err(self.semantic_error(message, span))
        }
    }

    // ==================== Imports and Modules ====================

    /// import a::b::{X, Y};   import a::b::X;
    pub(crate) fn parse_import(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Stmt> {
        let keyword = stream.expect(TokenKind::Import)?;
        if scope != self.table.global() {
            return Err(self.semantic_error(
                "Import statements are only allowed in global scope",
                keyword.span,
            ));
        }

        let (mut path, _) = self.parse_path(stream, "Expected module name after 'import'")?;
        let items = if stream.consume(TokenKind::ColonColon) {
            let mut list = stream.collect_braces()?;
            let mut items = Vec::new();
            while list.has_next() {
                items.push(list.expect_msg(TokenKind::Ident, "Expected an imported name")?.lexeme);
                if !list.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.finish(&list)?;
            if items.is_empty() {
                return Err(Error::syntax("Import list cannot be empty")
                    .with_reference(&self.file, stream.previous_span()));
            }
            items
        } else {
            if path.len() < 2 {
                return Err(Error::syntax("Expected '::' after module name")
                    .with_reference(&self.file, stream.previous_span()));
            }
            path.pop().into_iter().collect()
        };
        stream.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Import {
            path,
            items,
            span: stream.span_from(keyword.span),
        })
    }

    /// module A::B { ... }
    pub(crate) fn parse_module(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Stmt> {
        let keyword = stream.expect(TokenKind::Module)?;
        self.require_declaration_root(
            scope,
            "Module declarations are only allowed in global or module scope",
            keyword.span,
        )?;

        let (path, _) = self.parse_path(stream, "Expected module name")?;
        let mut module = scope;
        for segment in &path {
            module = self.table.create_module_scope(module, segment);
        }

        let start = stream.peek_next().span;
        let mut body = stream.collect_braces()?;
        let stmts = self.parse_block_body(&mut body, module)?;

        Ok(Stmt::Module {
            path,
            body: Block {
                stmts,
                scope: module,
                span: stream.span_from(start),
            },
            span: stream.span_from(keyword.span),
        })
    }

    // ==================== Functions ====================

    /// [extern] [async] fn NAME(params): TYPE { ... }
    pub(crate) fn parse_function_declaration(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        visibility: Visibility,
    ) -> Result<Stmt> {
        let start = stream.peek_next().span;
        let mut flags = FunctionFlags::default();
        loop {
            if stream.consume(TokenKind::Extern) {
                flags.is_extern = true;
            } else if stream.consume(TokenKind::Async) {
                flags.is_async = true;
            } else {
                break;
            }
        }
        stream.expect(TokenKind::Fn)?;
        self.require_declaration_root(
            scope,
            "Function declarations are only allowed in global or module scope",
            start,
        )?;

        let name_token = stream.expect_msg(TokenKind::Ident, "Expected function name after 'fn'")?;
        let function_scope = self.table.create_scope(scope, ScopeKind::Function);
        let mut header = stream.collect_parens()?;
        let (params, is_variadic) = self.parse_parameters(&mut header, function_scope)?;
        flags.is_variadic = is_variadic;

        stream.expect_msg(
            TokenKind::Colon,
            "Expected ':' and a return type after function parameters",
        )?;
        let ret = self.parse_type(stream, scope, "Expected return type")?;

        let qualified = mangle::qualify(self.table, scope, &name_token.lexeme);
        let param_types: Vec<Type> = params.iter().map(|p| p.ty.clone()).collect();
        let internal_name =
            mangle::resolve_internal_function_name(&qualified, &param_types, flags.is_extern);

        // registered before the body so the body may recurse
        self.table
            .define_function(
                Symbol::new(qualified, internal_name.clone(), name_token.span),
                param_types,
                ret.clone(),
                flags,
            )
            .map_err(|e| e.or_reference(&self.file, name_token.span))?;

        let body = if flags.is_extern {
            stream.expect(TokenKind::Semicolon)?;
            None
        } else {
            Some(self.parse_function_body(
                stream,
                function_scope,
                &name_token.lexeme,
                &ret,
                is_variadic,
            )?)
        };

        Ok(Stmt::Function(FunctionDecl {
            name: name_token.lexeme,
            internal_name,
            params,
            ret,
            body,
            flags,
            visibility,
            span: stream.span_from(start),
        }))
    }

    /// Body of a function or lambda, checked for a missing `return`
    pub(crate) fn parse_function_body(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        name: &str,
        ret: &Type,
        is_variadic: bool,
    ) -> Result<Block> {
        self.functions.push(FunctionContext {
            name: name.to_string(),
            ret: ret.clone(),
            is_variadic,
            outer_loops: self.loop_depth,
        });
        self.loop_depth = 0;

        let body = self.parse_block_in(stream, scope);

        if let Some(context) = self.functions.pop() {
            self.loop_depth = context.outer_loops;
        }
        let body = body?;

        if !ret.is_void() && !validate::always_returns(&body) {
            return Err(self.semantic_error(
                format!("Function '{}' is missing a return statement.", name),
                body.span,
            ));
        }
        Ok(body)
    }

    /// `name: Type, ...` with an optional trailing `...`
    pub(crate) fn parse_parameters(
        &mut self,
        header: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        let mut is_variadic = false;

        while header.has_next() {
            if is_variadic {
                return Err(header.error("Variadic parameter must be the last parameter"));
            }
            if header.consume(TokenKind::DotDotDot) {
                is_variadic = true;
            } else {
                let name = header.expect_msg(TokenKind::Ident, "Expected parameter name")?;
                header.expect_msg(TokenKind::Colon, "Expected ':' after parameter name")?;
                let ty = self.parse_type(header, scope, "Expected parameter type")?;

                if !seen.insert(name.lexeme.clone()) {
                    return Err(self.semantic_error(
                        format!(
                            "Duplicate parameter name \"{}\" in function definition",
                            name.lexeme
                        ),
                        name.span,
                    ));
                }
                if params.len() == MAX_FUNCTION_PARAMETERS {
                    return Err(Error::syntax(format!(
                        "Functions cannot have more than {} parameters",
                        MAX_FUNCTION_PARAMETERS
                    ))
                    .with_reference(&self.file, name.span));
                }

                self.table
                    .define_variable(
                        scope,
                        Symbol::plain(name.lexeme.clone(), name.span),
                        ty.clone(),
                    )
                    .map_err(|e| e.or_reference(&self.file, name.span))?;
                params.push(Param {
                    internal_name: name.lexeme.clone(),
                    name: name.lexeme,
                    ty,
                    span: header.span_from(name.span),
                });
            }

            if !header.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(header)?;
        Ok((params, is_variadic))
    }

    // ==================== Structs and Enums ====================

    /// struct NAME { field: Type; ... }   struct NAME = Other;
    pub(crate) fn parse_struct_declaration(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        visibility: Visibility,
    ) -> Result<Stmt> {
        let keyword = stream.expect(TokenKind::Struct)?;
        self.require_declaration_root(
            scope,
            "Struct declarations are only allowed in global or module scope",
            keyword.span,
        )?;

        let name = stream.expect_msg(TokenKind::Ident, "Expected struct name after 'struct'")?;
        let qualified = mangle::qualify(self.table, scope, &name.lexeme);
        let internal_name = mangle::resolve_internal_struct_name(&qualified);
        let symbol = Symbol::new(name.lexeme.clone(), internal_name.clone(), name.span);

        let body = if stream.consume(TokenKind::Eq) {
            let (path, path_span) = self.parse_path(stream, "Expected struct name after '='")?;
            stream.expect(TokenKind::Semicolon)?;
            // the target may be declared further down
            let written = mangle::join_segments(&path);
            let target = self
                .resolve_struct_name(scope, &written)
                .unwrap_or_else(|| mangle::qualify(self.table, scope, &written));
            let referenced = Symbol::new(path.join("::"), target.clone(), path_span);
            self.table
                .define_struct_reference(scope, symbol, referenced)
                .map_err(|e| e.or_reference(&self.file, name.span))?;
            StructBody::Reference(target)
        } else {
            let mut block = stream.collect_braces()?;
            self.declaring_struct = Some(internal_name.clone());
            let fields = self.parse_struct_fields(&mut block, scope);
            self.declaring_struct = None;
            let fields = fields?;
            if fields.is_empty() {
                return Err(self.semantic_error("A struct must have at least 1 member", name.span));
            }

            let layout = fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect();
            self.table
                .define_struct(scope, symbol, layout)
                .map_err(|e| e.or_reference(&self.file, name.span))?;
            StructBody::Fields(fields)
        };

        Ok(Stmt::Struct(StructDecl {
            name: name.lexeme,
            internal_name,
            body,
            visibility,
            span: stream.span_from(keyword.span),
        }))
    }

    /// `name: Type;` members. A member may point at the struct being declared.
    fn parse_struct_fields(
        &mut self,
        block: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Vec<StructField>> {
        let mut fields: Vec<StructField> = Vec::new();
        while block.has_next() {
            let field = block.expect_msg(TokenKind::Ident, "Expected struct member name")?;
            block.expect_msg(TokenKind::Colon, "Expected ':' after struct member name")?;
            let ty = self.parse_type(block, scope, "Expected struct member type")?;
            let terminated =
                block.consume(TokenKind::Semicolon) || block.consume(TokenKind::Comma);
            if !terminated && block.has_next() {
                let found = block.peek_next().lexeme.clone();
                return Err(block.error(format!("Expected ';' but found '{}'", found)));
            }

            if fields.iter().any(|f| f.name == field.lexeme) {
                return Err(self.semantic_error(
                    format!("Field '{}' is already defined in this scope", field.lexeme),
                    field.span,
                ));
            }
            fields.push(StructField {
                span: block.span_from(field.span),
                name: field.lexeme,
                ty,
            });
        }
        Ok(fields)
    }

    /// enum NAME { MEMBER: literal, ... }
    pub(crate) fn parse_enum_declaration(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Stmt> {
        let keyword = stream.expect(TokenKind::Enum)?;
        let name = stream.expect_msg(TokenKind::Ident, "Expected enum name after 'enum'")?;
        let internal_name = mangle::qualify(self.table, scope, &name.lexeme);
        self.table
            .define_symbol(
                scope,
                Symbol::new(name.lexeme.clone(), internal_name.clone(), name.span),
                IdentifiableKind::Enum,
            )
            .map_err(|e| e.or_reference(&self.file, name.span))?;

        let member_scope = self.table.create_scope(scope, ScopeKind::Block);
        let mut block = stream.collect_braces()?;
        let mut members = Vec::new();
        while block.has_next() {
            let member = block.expect_msg(TokenKind::Ident, "Expected enum member name")?;
            block.expect_msg(TokenKind::Colon, "Expected ':' after enum member name")?;
            if !block.peek_next().kind.is_literal() && !block.peek_next_eq(TokenKind::Minus) {
                return Err(block.error(format!(
                    "Enum member '{}' must be initialized with a literal",
                    member.lexeme
                )));
            }
            let value = self.parse_unary(&mut block, member_scope)?;

            self.table
                .define_symbol(
                    member_scope,
                    Symbol::new(
                        member.lexeme.clone(),
                        format!("{}{}{}", internal_name, mangle::MODULE_DELIMITER, member.lexeme),
                        member.span,
                    ),
                    IdentifiableKind::EnumMember,
                )
                .map_err(|e| e.or_reference(&self.file, member.span))?;
            members.push(EnumMember {
                span: block.span_from(member.span),
                name: member.lexeme,
                value,
            });

            if !block.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(&block)?;

        Ok(Stmt::Enum(EnumDecl {
            name: name.lexeme,
            internal_name,
            members,
            scope: member_scope,
            span: stream.span_from(keyword.span),
        }))
    }

    // ==================== Variables ====================

    /// let/const NAME [: Type] [= expr], without the trailing `;`
    pub(crate) fn parse_variable_declaration(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        visibility: Visibility,
    ) -> Result<VarDecl> {
        let keyword = stream.next();
        let mutable = keyword.kind == TokenKind::Let;
        let name = stream.expect_msg(TokenKind::Ident, "Expected variable name")?;

        let annotation = if stream.consume(TokenKind::Colon) {
            let start = stream.peek_next().span;
            let ty = self.parse_type(stream, scope, "Expected type after ':'")?;
            Some((ty, stream.span_from(start)))
        } else {
            None
        };

        let value = if stream.consume(TokenKind::Eq) {
            Some(self.parse_expression(stream, scope)?)
        } else {
            None
        };

        let mut ty = match (&annotation, &value) {
            (Some((declared, declared_span)), Some(value)) => {
                validate::check_declaration(
                    self.table,
                    scope,
                    &self.file,
                    declared,
                    *declared_span,
                    value,
                )?;
                declared.clone()
            }
            (Some(_), None) if !mutable => {
                return Err(Error::syntax(format!("Constant '{}' must be initialized", name.lexeme))
                    .with_reference(&self.file, name.span));
            }
            (Some((declared, _)), None) => declared.clone(),
            (None, Some(value)) => {
                let inferred = self.infer(scope, value)?;
                let unknown = match &inferred {
                    Type::Array { element, .. } => element.is_kind(PrimitiveKind::Unknown),
                    other => other.is_kind(PrimitiveKind::Unknown),
                };
                if unknown || inferred.is_nil() || inferred.is_void() {
                    return Err(self.semantic_error(
                        format!("Unable to infer type of variable '{}'", name.lexeme),
                        value.span(),
                    ));
                }
                inferred.without_flags(TypeFlags::MUTABLE | TypeFlags::GLOBAL)
            }
            (None, None) => {
                return Err(Error::syntax(format!(
                    "Variable '{}' needs a type annotation or an initializer",
                    name.lexeme
                ))
                .with_reference(&self.file, name.span));
            }
        };

        if mutable {
            ty.flags_mut().insert(TypeFlags::MUTABLE);
        }
        let is_global = self.table.kind(scope).is_declaration_root();
        if is_global {
            ty.flags_mut().insert(TypeFlags::GLOBAL);
        }

        let internal_name = if is_global {
            mangle::qualify(self.table, scope, &name.lexeme)
        } else {
            name.lexeme.clone()
        };

        // defined after the initializer, which still sees any outer binding
        self.table
            .define_variable(
                scope,
                Symbol::new(name.lexeme.clone(), internal_name.clone(), name.span),
                ty.clone(),
            )
            .map_err(|e| e.or_reference(&self.file, name.span))?;

        Ok(VarDecl {
            name: name.lexeme,
            internal_name,
            ty,
            value,
            mutable,
            visibility,
            scope,
            span: stream.span_from(keyword.span),
        })
    }

    // ==================== Types ====================

    /// `[*|&] base [[]]* [?]`
    pub(crate) fn parse_type(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        message: &str,
    ) -> Result<Type> {
        let mut flags = TypeFlags::NONE;
        if stream.consume(TokenKind::Star) {
            flags.insert(TypeFlags::POINTER);
        } else if stream.consume(TokenKind::And) {
            flags.insert(TypeFlags::REFERENCE);
        }

        let mut ty = match stream.peek_next().kind {
            TokenKind::PrimitiveType => {
                let token = stream.next();
                let kind = PrimitiveKind::from_keyword(&token.lexeme)
                    .ok_or_else(|| {
                        Error::syntax(format!("Unknown primitive type '{}'", token.lexeme))
                    })?;
                Type::primitive(kind)
            }
            TokenKind::Ident => {
                let (path, path_span) = self.parse_path(stream, message)?;
                let written = mangle::join_segments(&path);
                match self
                    .resolve_struct_name(scope, &written)
                    .or_else(|| self.resolve_marker_type(scope, &written))
                {
                    Some(internal_name) => Type::named(internal_name),
                    None => {
                        return Err(self.semantic_error(
                            format!("Undefined struct '{}'", path.join("::")),
                            path_span,
                        ))
                    }
                }
            }
            TokenKind::LParen => {
                let mut params_stream = stream.collect_parens()?;
                let mut params = Vec::new();
                while params_stream.has_next() {
                    let param =
                        self.parse_type(&mut params_stream, scope, "Expected parameter type")?;
                    params.push(param);
                    if !params_stream.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.finish(&params_stream)?;
                stream.expect_msg(TokenKind::Arrow, "Expected '->' in function type")?;
                let ret = self.parse_type(stream, scope, "Expected return type after '->'")?;
                Type::function(params, ret)
            }
            _ => return Err(stream.error(message)),
        };

        while stream.peek_next_eq(TokenKind::LBracket) {
            let length = if stream.peek_eq(TokenKind::RBracket, 1) {
                stream.skip(2);
                0
            } else if stream.peek_eq(TokenKind::IntLit, 1)
                && stream.peek_eq(TokenKind::RBracket, 2)
            {
                stream.next();
                let token = stream.next();
                stream.next();
                token
                    .lexeme
                    .parse::<usize>()
                    .map_err(|_| {
                        Error::syntax("Invalid array length").with_reference(&self.file, token.span)
                    })?
            } else {
                break;
            };
            ty = Type::array(ty, length);
        }

        if stream.consume(TokenKind::Question) {
            flags.insert(TypeFlags::OPTIONAL);
        }
        Ok(ty.with_flags(flags))
    }

    /// Struct names resolve against the enclosing modules, innermost first,
    /// then as written from Global
    pub(crate) fn resolve_struct_name(&self, scope: ScopeId, written: &str) -> Option<String> {
        let path = self.table.module_path(scope);
        (0..=path.len())
            .rev()
            .map(|depth| {
                let mut segments = path[..depth].to_vec();
                segments.push(written.to_string());
                mangle::join_segments(&segments)
            })
            .find(|candidate| {
                self.declaring_struct.as_deref() == Some(candidate.as_str())
                    || self.table.get_struct_def(scope, candidate).is_some()
            })
    }

    /// Enums and classes also name types
    fn resolve_marker_type(&self, scope: ScopeId, written: &str) -> Option<String> {
        match self.table.lookup_symbol(scope, written)? {
            SymbolDef::Identifiable(def) if def.kind != IdentifiableKind::EnumMember => {
                Some(def.symbol.internal_name.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::*;
    use crate::frontend::parser::parse_source;
    use crate::frontend::semantic::{StructLayout, SymbolDef, SymbolTable};
    use crate::utils::{Error, ErrorKind, Result, SourceFile};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<(Program, SymbolTable)> {
        let mut table = SymbolTable::new();
        let file = SourceFile::new(0, "decl.sr", source);
        let program = parse_source(&mut table, &file)?;
        Ok((program, table))
    }

    fn parse_err(source: &str) -> Error {
        parse(source).err().expect("expected a parse error")
    }

    fn first_var(program: &Program) -> &VarDecl {
        program
            .body
            .stmts
            .iter()
            .find_map(|s| match s {
                Stmt::Variable(v) => Some(v),
                _ => None,
            })
            .expect("no declaration")
    }

    #[test]
    fn test_type_syntax() {
        let cases = [
            ("let a: i32[] = [1, 2];", "i32[]"),
            ("let a: i32? = nil;", "i32?"),
            ("let a: i32[]? = nil;", "i32[]?"),
            (
                "let a: (i32, i32) -> i32 = (x: i32, y: i32): i32 -> { return x + y; };",
                "(i32, i32) -> i32",
            ),
        ];
        for (source, expected) in cases {
            let (program, _) =
                parse(source).unwrap_or_else(|e| panic!("{}: {}", source, e.render()));
            assert_eq!(first_var(&program).ty.to_string(), expected, "{}", source);
        }
    }

    #[test]
    fn test_pointer_and_reference_parameters() {
        let (program, _) = parse("extern fn f(a: *i8, b: &u8, c: i64[4]): void;").unwrap();
        match &program.body.stmts[0] {
            Stmt::Function(f) => {
                let types: Vec<String> = f.params.iter().map(|p| p.ty.to_string()).collect();
                assert_eq!(types, vec!["*i8", "&u8", "i64[]"]);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_nil_needs_optional() {
        let err = parse_err("let a: i32 = nil;");
        assert_eq!(err.kind(), Some(ErrorKind::Type));
    }

    #[test]
    fn test_inferred_declaration_type() {
        let (program, _) = parse("let a = 5L;").unwrap();
        assert_eq!(first_var(&program).ty.to_string(), "i64");

        let err = parse_err("let a = [];");
        assert!(err.message().contains("Unable to infer type"));
    }

    #[test]
    fn test_const_requires_initializer() {
        let err = parse_err("const a: i32;");
        assert_eq!(err.kind(), Some(ErrorKind::Syntax));
        assert!(parse("let a: i32;").is_ok());
    }

    #[test]
    fn test_literal_fits_narrow_integer() {
        assert!(parse("let a: u8 = 255;").is_ok());
        assert!(parse("let a: i8 = -128;").is_ok());
        let err = parse_err("let a: u8 = 256;");
        assert!(err.message().contains("expected type 'u8', got 'i32'"));
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = parse_err("fn f(a: i32, a: i32): void { }");
        assert_eq!(err.message(), "Duplicate parameter name \"a\" in function definition");
    }

    #[test]
    fn test_parameter_limit() {
        let params: Vec<String> = (0..33).map(|i| format!("p{}: i32", i)).collect();
        let err = parse_err(&format!("fn f({}): void {{ }}", params.join(", ")));
        assert_eq!(err.kind(), Some(ErrorKind::Syntax));
    }

    #[test]
    fn test_variadic_extern() {
        let source = "extern fn printf(format: string, ...): i32; \
                      fn main(): void { printf(\"%d\", 1, 2); }";
        let (_, table) = parse(source).unwrap();
        let printf = table.get_function_def(table.global(), "printf").unwrap();
        assert!(printf.flags.is_extern);
        assert!(printf.flags.is_variadic);

        let err = parse_err("fn f(..., a: i32): void { }");
        assert_eq!(err.message(), "Variadic parameter must be the last parameter");
    }

    #[test]
    fn test_struct_declarations() {
        let (_, table) = parse("struct Point { x: i32; y: i32; } struct Vec2 = Point;").unwrap();
        let fields = table.get_struct_fields(table.global(), "Vec2").unwrap().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(matches!(
            table.get_struct_def(table.global(), "Vec2").map(|s| &s.layout),
            Some(StructLayout::Reference(_))
        ));

        let err = parse_err("struct Empty { }");
        assert_eq!(err.message(), "A struct must have at least 1 member");

        let err = parse_err("struct P { x: i32; x: i64; }");
        assert_eq!(err.message(), "Field 'x' is already defined in this scope");

        let err = parse_err("fn f(): void { struct Inner { x: i32; } }");
        assert!(err.message().contains("only allowed in global or module scope"));
    }

    #[test]
    fn test_cyclic_struct_alias() {
        let err = parse_err("struct A = B; struct B = A; fn f(a: A): i32 { return a.x; }");
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
        assert!(err.message().contains("Cyclic struct reference"));
    }

    #[test]
    fn test_modules_qualify_names() {
        let source = "
            module Outer::Inner {
                fn nested(): i32 { return 1; }
                let counter: i32 = 0;
            }
            fn main(): void {
                const a: i32 = Outer::Inner::nested();
                const b: i32 = Outer::Inner::counter;
            }
        ";
        let (_, table) = parse(source).unwrap();
        assert!(table.get_function_def(table.global(), "Outer__Inner__nested()").is_some());
        let module = table.module_scope("Outer__Inner").unwrap();
        assert_eq!(
            table.variable_in(module, "counter").unwrap().symbol.internal_name,
            "Outer__Inner__counter"
        );
    }

    #[test]
    fn test_module_struct_resolution() {
        let source = "
            module Geo {
                struct Point { x: i32; y: i32; }
                fn origin(): Point { return Point::{ x: 0, y: 0 }; }
            }
        ";
        let (_, table) = parse(source).unwrap();
        let origin = table.get_function_def(table.global(), "Geo__origin()").unwrap();
        assert_eq!(origin.ret.to_string(), "Geo__Point");
    }

    #[test]
    fn test_module_structs_are_not_visible_unqualified() {
        let err =
            parse_err("module Geo { struct Point { x: i32; } } const p: Point = Point::{ x: 1 };");
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));
        assert_eq!(err.message(), "Undefined struct 'Point'");

        let err = parse_err(
            "module A { struct Point { x: i32; } } module B { struct Point { y: f64; } } \
             const p: Point = Point::{ x: 1 };",
        );
        assert_eq!(err.message(), "Undefined struct 'Point'");

        let err = parse_err("module Geo { struct Point { x: i32; } } fn f(p: Point): void { }");
        assert_eq!(err.message(), "Undefined struct 'Point'");

        let source =
            "module Geo { struct Point { x: i32; } } const p: Geo::Point = Geo::Point::{ x: 1 };";
        let (program, _) = parse(source).unwrap();
        match &program.body.stmts[1] {
            Stmt::Variable(decl) => assert_eq!(decl.ty.to_string(), "Geo__Point"),
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_self_referential_struct() {
        let (_, table) = parse("module List { struct Node { value: i32; next: *Node; } }").unwrap();
        let fields = table.get_struct_fields(table.global(), "List__Node").unwrap().unwrap();
        assert_eq!(fields[1].1.to_string(), "*List__Node");

        let err = parse_err("struct Node { value: i32; next: *Missing; }");
        assert_eq!(err.message(), "Undefined struct 'Missing'");
    }

    #[test]
    fn test_enum_members() {
        let (program, table) = parse("enum Color { Red: 1, Green: 2, Blue: -3 }").unwrap();
        assert!(matches!(
            table.lookup_symbol(table.global(), "Color"),
            Some(SymbolDef::Identifiable(_))
        ));
        match &program.body.stmts[0] {
            Stmt::Enum(e) => assert_eq!(e.members.len(), 3),
            other => panic!("expected enum, got {:?}", other),
        }

        let err = parse_err("enum Color { Red: foo }");
        assert!(err.message().contains("must be initialized with a literal"));
        let err = parse_err("enum Color { Red: 1, Red: 2 }");
        assert_eq!(err.kind(), Some(ErrorKind::Semantic));

        assert!(parse("enum Color { Red: 1 } fn paint(c: Color): void { }").is_ok());
    }

    #[test]
    fn test_imports() {
        let (program, _) = parse("import std::io::{print, read}; use std::math::sqrt;").unwrap();
        match &program.body.stmts[0] {
            Stmt::Import { path, items, .. } => {
                assert_eq!(path, &vec!["std".to_string(), "io".to_string()]);
                assert_eq!(items, &vec!["print".to_string(), "read".to_string()]);
            }
            other => panic!("expected import, got {:?}", other),
        }
        match &program.body.stmts[1] {
            Stmt::Import { path, items, .. } => {
                assert_eq!(path, &vec!["std".to_string(), "math".to_string()]);
                assert_eq!(items, &vec!["sqrt".to_string()]);
            }
            other => panic!("expected import, got {:?}", other),
        }

        let err = parse_err("fn f(): void { import a::b; }");
        assert!(err.message().contains("only allowed in global scope"));
    }
}
