//! Expression parsing
//!
//! Tiers, loosest first: assignment, logical (`&&` `||`), comparison,
//! arithmetic by precedence climbing (`**` binds tightest and associates to
//! the right), prefix unary, postfix, atoms.

use crate::frontend::ast::*;
use crate::frontend::mangle;
use crate::frontend::parser::{Parser, MAX_FUNCTION_PARAMETERS, MAX_IDENTIFIER_CHAIN};
use crate::frontend::semantic::{FunctionFlags, ScopeId, ScopeKind, Symbol, SymbolTable};
use crate::frontend::stream::TokenStream;
use crate::frontend::token::TokenKind;
use crate::frontend::validate;
use crate::types::Type;
use crate::utils::{Error, Result, Span};

impl Parser<'_> {
    pub(crate) fn parse_expression(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Expr> {
        self.descend(stream)?;
        let result = self.parse_assignment(stream, scope);
        self.ascend();
        result
    }

    fn parse_assignment(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        if is_lambda(stream) {
            return self.parse_lambda(stream, scope);
        }

        let start = stream.peek_next().span;
        let target = self.parse_logical(stream, scope)?;
        let kind = stream.peek_next().kind;
        if !kind.is_assignment() {
            return Ok(target);
        }

        let operator = stream.next();
        if !matches!(target, Expr::Identifier(_) | Expr::MemberAccess { .. } | Expr::Index { .. }) {
            return Err(
                Error::syntax("Invalid assignment target").with_reference(&self.file, operator.span)
            );
        }
        let value = self.parse_expression(stream, scope)?;
        let span = stream.span_from(start);
        validate::check_reassignment(self.table, scope, &self.file, &target, &value, span)?;

        Ok(Expr::Assign {
            target: Box::new(target),
            op: assign_op(kind),
            value: Box::new(value),
            span,
        })
    }

    fn parse_logical(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let start = stream.peek_next().span;
        let mut lhs = self.parse_comparison(stream, scope)?;
        while stream.peek_next().kind.is_logical() {
            let op = match stream.next().kind {
                TokenKind::AndAnd => LogicalOp::And,
                _ => LogicalOp::Or,
            };
            let rhs = self.parse_comparison(stream, scope)?;
            lhs = Expr::Logical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span: stream.span_from(start),
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let start = stream.peek_next().span;
        let mut lhs = self.parse_arithmetic(stream, scope, 1)?;
        while stream.peek_next().kind.is_comparison() {
            let op = match stream.next().kind {
                TokenKind::EqEq => ComparisonOp::Eq,
                TokenKind::Ne => ComparisonOp::Ne,
                TokenKind::Lt => ComparisonOp::Lt,
                TokenKind::Le => ComparisonOp::Le,
                TokenKind::Gt => ComparisonOp::Gt,
                _ => ComparisonOp::Ge,
            };
            let rhs = self.parse_arithmetic(stream, scope, 1)?;
            lhs = Expr::Comparison {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span: stream.span_from(start),
            };
        }
        Ok(lhs)
    }

    /// Precedence climbing over `+ - * / % **`
    fn parse_arithmetic(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        min_precedence: u8,
    ) -> Result<Expr> {
        let start = stream.peek_next().span;
        let mut lhs = self.parse_unary(stream, scope)?;

        loop {
            let kind = stream.peek_next().kind;
            let precedence = match kind.arithmetic_precedence() {
                Some(p) if p >= min_precedence => p,
                _ => break,
            };
            stream.next();

            let next_min = if kind == TokenKind::StarStar {
                precedence
            } else {
                precedence + 1
            };
            let rhs = self.parse_arithmetic(stream, scope, next_min)?;
            lhs = Expr::Binary {
                op: binary_op(kind),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span: stream.span_from(start),
            };
        }
        Ok(lhs)
    }

    pub(crate) fn parse_unary(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let op = match stream.peek_next().kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::PlusPlus => UnaryOp::PreIncrement,
            TokenKind::MinusMinus => UnaryOp::PreDecrement,
            TokenKind::Star => UnaryOp::Dereference,
            TokenKind::And => UnaryOp::AddressOf,
            _ => return self.parse_postfix(stream, scope),
        };

        let start = stream.next().span;
        self.descend(stream)?;
        let operand = self.parse_unary(stream, scope);
        self.ascend();
        let operand = operand?;

        if op.mutates() {
            validate::check_mutation(self.table, scope, &self.file, &operand)?;
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span: stream.span_from(start),
        })
    }

    /// Indexing and postfix `++`/`--`
    fn parse_postfix(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let start = stream.peek_next().span;
        let mut expr = self.parse_primary(stream, scope)?;

        loop {
            match stream.peek_next().kind {
                TokenKind::LBracket => {
                    let mut region =
                        stream.collect_block(TokenKind::LBracket, TokenKind::RBracket)?;
                    if !region.has_next() {
                        return Err(Error::syntax("Expected array index accessor after '['")
                            .with_reference(&self.file, stream.previous_span()));
                    }
                    let index = self.parse_expression(&mut region, scope)?;
                    self.finish(&region)?;
                    validate::check_index(self.table, scope, &self.file, &index)?;

                    expr = Expr::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                        span: stream.span_from(start),
                    };
                    self.infer(scope, &expr)?;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if stream.next().kind == TokenKind::PlusPlus {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    validate::check_mutation(self.table, scope, &self.file, &expr)?;
                    expr = Expr::Unary {
                        op,
                        operand: Box::new(expr),
                        span: stream.span_from(start),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let token = stream.peek_next().clone();
        match token.kind {
            kind if kind.is_literal() => {
                stream.next();
                let value = self.parse_literal(&token.lexeme, kind, token.span)?;
                Ok(Expr::Literal { value, span: token.span })
            }
            TokenKind::Ident => self.parse_identifier_expression(stream, scope),
            TokenKind::LParen => {
                let mut inner = stream.collect_parens()?;
                if !inner.has_next() {
                    return Err(Error::syntax("Expected expression inside parentheses")
                        .with_reference(&self.file, token.span));
                }
                let expr = self.parse_expression(&mut inner, scope)?;
                self.finish(&inner)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(stream, scope),
            TokenKind::DotDotDot => {
                stream.next();
                let variadic = self.functions.last().map_or(false, |f| f.is_variadic);
                if !variadic {
                    return Err(self.semantic_error(
                        "Variadic argument reference used outside of a variadic function",
                        token.span,
                    ));
                }
                Ok(Expr::VariadicReference { span: token.span })
            }
            TokenKind::Eof => Err(stream.error("Expected expression, but reached end of block")),
            _ => Err(stream.error(format!("Expected expression but found '{}'", token.lexeme))),
        }
    }

    fn parse_literal(&self, lexeme: &str, kind: TokenKind, span: Span) -> Result<Literal> {
        let out_of_range = || {
            Error::syntax(format!("Integer literal '{}' is out of range", lexeme))
                .with_reference(&self.file, span)
        };
        let integer = |text: &str| -> Option<u64> {
            match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => text.parse::<u64>().ok(),
            }
        };
        let float = |text: &str| {
            text.parse::<f64>().map_err(|_| {
                Error::syntax(format!("Invalid float literal '{}'", text))
                    .with_reference(&self.file, span)
            })
        };

        Ok(match kind {
            TokenKind::IntLit => Literal::Integer {
                value: integer(lexeme).ok_or_else(out_of_range)?,
                long: false,
            },
            TokenKind::LongLit => Literal::Integer {
                value: integer(lexeme).ok_or_else(out_of_range)?,
                long: true,
            },
            TokenKind::FloatLit => Literal::Float {
                value: float(lexeme)?,
                double: false,
            },
            TokenKind::DoubleLit => Literal::Float {
                value: float(lexeme)?,
                double: true,
            },
            TokenKind::StringLit => Literal::String(lexeme.to_string()),
            TokenKind::CharLit => Literal::Char(lexeme.chars().next().unwrap_or('\0')),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            _ => Literal::Nil,
        })
    }

    // ==================== Names ====================

    /// Variable, module variable, member chain, call or struct initializer
    fn parse_identifier_expression(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Expr> {
        let start = stream.peek_next().span;
        let (segments, path_span) = self.parse_path(stream, "Expected identifier")?;

        if stream.peek_next_eq(TokenKind::ColonColon) && stream.peek_eq(TokenKind::LBrace, 1) {
            return self.parse_struct_initializer(stream, scope, &segments, start);
        }
        if stream.peek_next_eq(TokenKind::LParen) {
            return self.parse_call(stream, scope, &segments, start);
        }

        let ident = self.resolve_identifier(scope, &segments, path_span)?;
        if !stream.peek_next_eq(TokenKind::Dot) {
            return Ok(Expr::Identifier(ident));
        }

        let mut members = Vec::new();
        while stream.consume(TokenKind::Dot) {
            let member = stream.expect_msg(TokenKind::Ident, "Expected member name after '.'")?;
            members.push(Member {
                name: member.lexeme,
                span: member.span,
            });
            if segments.len() + members.len() > MAX_IDENTIFIER_CHAIN {
                return Err(stream.error(format!(
                    "Identifier chain exceeds the maximum of {} segments",
                    MAX_IDENTIFIER_CHAIN
                )));
            }
        }

        let expr = Expr::MemberAccess {
            base: ident,
            members,
            span: stream.span_from(start),
        };
        self.infer(scope, &expr)?;
        Ok(expr)
    }

    fn resolve_identifier(
        &self,
        scope: ScopeId,
        segments: &[String],
        span: Span,
    ) -> Result<Identifier> {
        let display = segments.join("::");
        let identifier = |binding| Identifier {
            name: display.clone(),
            binding,
            span,
        };

        if let [name] = segments {
            if let Some((defined_in, field)) = self.table.resolve_variable(scope, name) {
                return Ok(identifier(Binding::Variable {
                    internal_name: field.symbol.internal_name.clone(),
                    scope: defined_in,
                }));
            }
        } else if let Some((name, path)) = segments.split_last() {
            let module = mangle::join_segments(path);
            for candidate in [mangle::qualify(self.table, scope, &module), module.clone()] {
                let found = self
                    .table
                    .module_scope(&candidate)
                    .and_then(|m| self.table.variable_in(m, name).map(|field| (m, field)));
                if let Some((module_scope, field)) = found {
                    return Ok(identifier(Binding::Variable {
                        internal_name: field.symbol.internal_name.clone(),
                        scope: module_scope,
                    }));
                }
            }
        }

        // a function used as a value
        let joined = mangle::join_segments(segments);
        for candidate in [mangle::qualify(self.table, scope, &joined), joined.clone()] {
            if let [function] = self.table.functions_named(scope, &candidate).as_slice() {
                return Ok(identifier(Binding::Function {
                    internal_name: function.symbol.internal_name.clone(),
                }));
            }
        }

        let error = self.semantic_error(format!("Undefined variable '{}'", display), span);
        Err(match self.table.fuzzy_find(scope, &joined) {
            Some(found) => error.with_suggestion(format!(
                "Did you mean '{}'?",
                mangle::display_path(&found.symbol().name)
            )),
            None => error,
        })
    }

    fn parse_call(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        segments: &[String],
        start: Span,
    ) -> Result<Expr> {
        let mut region = stream.collect_parens()?;
        let mut args = Vec::new();
        while region.has_next() {
            if args.len() == MAX_FUNCTION_PARAMETERS {
                return Err(region.error(format!(
                    "Function calls cannot have more than {} arguments",
                    MAX_FUNCTION_PARAMETERS
                )));
            }
            args.push(self.parse_expression(&mut region, scope)?);
            if !region.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(&region)?;

        let arg_types = args
            .iter()
            .map(|arg| self.infer(scope, arg))
            .collect::<Result<Vec<Type>>>()?;

        let mut call = Call {
            name: segments.join("::"),
            qualified: mangle::join_segments(segments),
            args,
            arg_types,
            target: CallTarget::Deferred,
            scope,
            span: stream.span_from(start),
        };
        let resolved = resolve_call_target(self.table, &call)
            .map_err(|e| e.or_reference(&self.file, call.span))?;
        if let Some(target) = resolved {
            call.target = target;
        } else {
            log::trace!("call to {} deferred until the end of the unit", call.name);
        }
        Ok(Expr::Call(call))
    }

    /// Name::{ member: value, ... }
    fn parse_struct_initializer(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
        segments: &[String],
        start: Span,
    ) -> Result<Expr> {
        stream.expect(TokenKind::ColonColon)?;
        let mut body = stream.collect_braces()?;

        let mut fields = Vec::new();
        while body.has_next() {
            let member = body.expect_msg(TokenKind::Ident, "Expected struct member name")?;
            body.expect_msg(TokenKind::Colon, "Expected ':' after struct member name")?;
            let value = self.parse_expression(&mut body, scope)?;
            fields.push(FieldInit {
                name: member.lexeme,
                value,
                span: body.span_from(member.span),
            });
            if !body.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(&body)?;

        let name = segments.join("::");
        let span = stream.span_from(start);
        let written = mangle::join_segments(segments);
        let internal_name = match self.resolve_struct_name(scope, &written) {
            Some(internal_name) => internal_name,
            None => return Err(self.semantic_error(format!("Undefined struct '{}'", name), span)),
        };
        validate::check_struct_initializer(
            self.table,
            scope,
            &self.file,
            &name,
            &internal_name,
            &fields,
            span,
        )?;

        Ok(Expr::StructInit {
            name,
            internal_name,
            fields,
            span,
        })
    }

    fn parse_array_literal(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let start = stream.peek_next().span;
        let mut region = stream.collect_block(TokenKind::LBracket, TokenKind::RBracket)?;
        let mut elements = Vec::new();
        while region.has_next() {
            elements.push(self.parse_expression(&mut region, scope)?);
            if !region.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(&region)?;
        Ok(Expr::Array {
            elements,
            span: stream.span_from(start),
        })
    }

    /// (x: T, ...): R -> { ... }
    fn parse_lambda(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let start = stream.peek_next().span;
        let name = self.table.next_anonymous_name();
        let function_scope = self.table.create_scope(scope, ScopeKind::Function);

        let mut header = stream.collect_parens()?;
        let (params, is_variadic) = self.parse_parameters(&mut header, function_scope)?;
        stream.expect_msg(
            TokenKind::Colon,
            "Expected ':' and a return type after lambda parameters",
        )?;
        let ret = self.parse_type(
            stream,
            scope,
            "Expected type after anonymous function header definition",
        )?;
        stream.expect_msg(TokenKind::Arrow, "Expected '->' after lambda parameters")?;

        let flags = FunctionFlags {
            is_variadic,
            is_anonymous: true,
            ..FunctionFlags::default()
        };
        let param_types: Vec<Type> = params.iter().map(|p| p.ty.clone()).collect();
        self.table
            .define_function(Symbol::plain(name.clone(), start), param_types, ret.clone(), flags)
            .map_err(|e| e.or_reference(&self.file, start))?;

        let body = self.parse_function_body(stream, function_scope, &name, &ret, is_variadic)?;
        Ok(Expr::Lambda(Box::new(FunctionDecl {
            internal_name: name.clone(),
            name,
            params,
            ret,
            body: Some(body),
            flags,
            visibility: Visibility::Inherited,
            span: stream.span_from(start),
        })))
    }
}

/// `(` IDENT `:` or `(` `)` `:` opens a lambda
fn is_lambda(stream: &TokenStream) -> bool {
    stream.peek_next_eq(TokenKind::LParen)
        && ((stream.peek_eq(TokenKind::Ident, 1) && stream.peek_eq(TokenKind::Colon, 2))
            || (stream.peek_eq(TokenKind::RParen, 1) && stream.peek_eq(TokenKind::Colon, 2)))
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => BinaryOp::Pow,
    }
}

fn assign_op(kind: TokenKind) -> AssignOp {
    match kind {
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Mod,
        TokenKind::AndEq => AssignOp::BitAnd,
        TokenKind::OrEq => AssignOp::BitOr,
        TokenKind::CaretEq => AssignOp::BitXor,
        _ => AssignOp::Assign,
    }
}

/// Pick the function a call refers to.
///
/// In order: the exact mangled name, the bare name (extern functions and
/// `main`), a variable holding a function, and finally the single overload
/// whose parameters accept the arguments. `Ok(None)` when nothing matches yet.
pub(crate) fn resolve_call_target(table: &SymbolTable, call: &Call) -> Result<Option<CallTarget>> {
    let scope = call.scope;
    let mut candidates = vec![mangle::qualify(table, scope, &call.qualified)];
    if candidates[0] != call.qualified {
        candidates.push(call.qualified.clone());
    }

    for qualified in &candidates {
        let mangled = mangle::resolve_internal_function_name(qualified, &call.arg_types, false);
        if table.get_function_def(scope, &mangled).is_some() {
            return Ok(Some(CallTarget::Function { internal_name: mangled }));
        }
        if let Some(bare) = table.get_function_def(scope, qualified) {
            let variadic = bare.flags.is_variadic;
            if validate::arguments_accept(table, scope, &bare.params, variadic, &call.args)? {
                return Ok(Some(CallTarget::Function {
                    internal_name: qualified.clone(),
                }));
            }
        }
    }

    if !call.qualified.contains(mangle::MODULE_DELIMITER) {
        if let Some((defined_in, field)) = table.resolve_variable(scope, &call.qualified) {
            if let Type::Function { params, .. } = &field.ty {
                if validate::arguments_accept(table, scope, params, false, &call.args)? {
                    return Ok(Some(CallTarget::Variable {
                        internal_name: field.symbol.internal_name.clone(),
                        scope: defined_in,
                    }));
                }
            }
        }
    }

    for qualified in &candidates {
        let mut accepted = Vec::new();
        for function in table.functions_named(scope, qualified) {
            let variadic = function.flags.is_variadic;
            if validate::arguments_accept(table, scope, &function.params, variadic, &call.args)? {
                accepted.push(function.symbol.internal_name.clone());
            }
        }
        match accepted.len() {
            0 => continue,
            1 => {
                return Ok(accepted
                    .pop()
                    .map(|internal_name| CallTarget::Function { internal_name }));
            }
            count => {
                return Err(Error::semantic(format!(
                    "Call to '{}' is ambiguous between {} overloads",
                    mangle::display_signature(&call.name, &call.arg_types),
                    count
                )))
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::*;
    use crate::frontend::parser::parse_source;
    use crate::frontend::semantic::SymbolTable;
    use crate::utils::{Error, ErrorKind, Result, SourceFile};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program> {
        let mut table = SymbolTable::new();
        let file = SourceFile::new(0, "expr.sr", source);
        parse_source(&mut table, &file)
    }

    fn parse_err(source: &str) -> Error {
        parse(source).err().expect("expected a parse error")
    }

    /// Initializer of the last declaration in `main`
    fn initializer(source: &str) -> Expr {
        let program = parse(source).unwrap_or_else(|e| panic!("{}", e.render()));
        let main = program
            .body
            .stmts
            .iter()
            .find_map(|s| match s {
                Stmt::Function(f) if f.name == "main" => Some(f.clone()),
                _ => None,
            })
            .expect("no main");
        main.body
            .expect("main has a body")
            .stmts
            .into_iter()
            .rev()
            .find_map(|s| match s {
                Stmt::Variable(v) => v.value,
                _ => None,
            })
            .expect("no initializer")
    }

    #[test]
    fn test_arithmetic_precedence() {
        let expr = initializer("fn main(): void { const a: i32 = 1 + 2 * 3; }");
        match expr {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = initializer("fn main(): void { const a: i32 = 2 ** 3 ** 2; }");
        match expr {
            Expr::Binary { op: BinaryOp::Pow, lhs, rhs, .. } => {
                assert!(matches!(*lhs, Expr::Literal { .. }));
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_logical_over_comparison() {
        let expr = initializer("fn main(): void { const a: bool = 1 < 2 && 3 >= 4 || false; }");
        match expr {
            Expr::Logical { op: LogicalOp::Or, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Logical { op: LogicalOp::And, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unary_operators() {
        let expr = initializer(
            "fn main(): void { let x: i32 = 1; const p: *i32 = &x; const y: i32 = *p; }",
        );
        assert!(matches!(expr, Expr::Unary { op: UnaryOp::Dereference, .. }));

        let err = parse_err("fn main(): void { let x: i32 = 1; const y: i32 = *x; }");
        assert_eq!(err.kind(), Some(ErrorKind::Type));
        assert_eq!(err.message(), "Cannot dereference non-pointer type");
    }

    #[test]
    fn test_increment_needs_mutable() {
        assert!(parse("fn main(): void { let x: i32 = 1; x++; ++x; }").is_ok());
        let err = parse_err("fn main(): void { const x: i32 = 1; x++; }");
        assert_eq!(err.message(), "Variable 'x' is immutable and cannot be reassigned");
    }

    #[test]
    fn test_struct_initializer_checks() {
        let decl = "struct P { x: i32; y: i32; } ";
        let err = parse_err(&format!("{}const a: P = P::{{ x: 1, y: 2, z: 3 }};", decl));
        assert_eq!(err.message(), "Too many members found in struct 'P': expected 2, got 3");

        let err = parse_err(&format!("{}const a: P = P::{{ x: 1 }};", decl));
        assert_eq!(err.message(), "Too few members found in struct 'P': expected 2, got 1");

        let err = parse_err(&format!("{}const a: P = P::{{ x: 1, z: 2 }};", decl));
        assert_eq!(err.message(), "Struct 'P' has no member named 'z'");

        let err = parse_err(&format!("{}const a: P = P::{{ y: 1, x: 2 }};", decl));
        assert_eq!(err.message(), "Struct member order mismatch at index 0: expected 'x', got 'y'");

        let err = parse_err(&format!("{}const a: P = P::{{ x: 1, y: 2.5D }};", decl));
        assert_eq!(err.kind(), Some(ErrorKind::Type));
        assert_eq!(
            err.message(),
            "Type mismatch for member 'y' in struct initializer 'P': expected 'i32', got 'f64'"
        );

        let err = parse_err("const a = Nope::{ x: 1 };");
        assert_eq!(err.message(), "Undefined struct 'Nope'");
    }

    #[test]
    fn test_member_chains() {
        let source = "
            struct Inner { value: i64; }
            struct Outer { inner: Inner; }
            fn main(): void {
                const o: Outer = Outer::{ inner: Inner::{ value: 1L } };
                const v: i64 = o.inner.value;
            }
        ";
        let expr = initializer(source);
        match expr {
            Expr::MemberAccess { base, members, .. } => {
                assert_eq!(base.name, "o");
                let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["inner", "value"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = parse_err(
            "struct S { a: i32; } \
             fn main(): void { const s: S = S::{ a: 1 }; const b: i32 = s.missing; }",
        );
        assert_eq!(err.kind(), Some(ErrorKind::Type));
        assert_eq!(err.message(), "Variable 's' of type 'S' has no member named 'missing'");

        let err = parse_err("fn main(): void { const n: i32 = 1; const b: i32 = n.field; }");
        assert_eq!(err.message(), "Cannot access member of non-struct type 'i32'");
    }

    #[test]
    fn test_array_literals_and_indexing() {
        let expr =
            initializer("fn main(): void { const a: i64[] = [1, 2, 3]; const b: i64 = a[0]; }");
        assert!(matches!(expr, Expr::Index { .. }));

        let err = parse_err("fn main(): void { const a: i32[] = [1]; const b: i32 = a[1.5D]; }");
        assert_eq!(err.message(), "Array index accessor must be of type int, got 'f64'");
    }

    #[test]
    fn test_lambda_through_variable() {
        let source = "
            fn main(): void {
                const add: (i32, i32) -> i32 = (a: i32, b: i32): i32 -> { return a + b; };
                const r: i32 = add(1, 2);
            }
        ";
        match initializer(source) {
            Expr::Call(call) => assert!(matches!(call.target, CallTarget::Variable { .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_function_as_value() {
        let source = "fn twice(x: i32): i32 { return x * 2; } \
                      fn main(): void { const f: (i32) -> i32 = twice; }";
        match initializer(source) {
            Expr::Identifier(ident) => assert!(matches!(ident.binding, Binding::Function { .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_variadic_reference() {
        let source = "extern fn vprint(format: string, ...): void; \
                      fn log(format: string, ...): void { vprint(format, ...); }";
        assert!(parse(source).is_ok());
        let err = parse_err("fn f(): void { g(...); }");
        assert!(err.message().contains("outside of a variadic function"));
    }

    #[test]
    fn test_ambiguous_overload() {
        let source = "
            fn f(x: i64): void { }
            fn f(x: u64): void { }
            fn main(): void { f(1); }
        ";
        let err = parse_err(source);
        assert!(err.message().contains("ambiguous"));
    }

    #[test]
    fn test_literal_range() {
        let err = parse_err("let a: u64 = 99999999999999999999999;");
        assert_eq!(err.kind(), Some(ErrorKind::Syntax));
        let expr_ok =
            parse("let a: i64 = 0xFF; let b: f32 = 1.5; let c: char = 'x'; let d: bool = !true;");
        assert!(expr_ok.is_ok());
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("fn main(): void { 1 = 2; }");
        assert_eq!(err.message(), "Invalid assignment target");
    }
}
