//! Parser for Stride
//!
//! Recursive descent over [`TokenStream`]s, fused with symbol registration and
//! type checking: every declaration is registered while it is parsed, so the
//! statements after it already see it.

use std::sync::Arc;

use crate::frontend::ast::*;
use crate::frontend::infer::{function_not_found, infer_expression_type};
use crate::frontend::lexer::Lexer;
use crate::frontend::parser_expr::resolve_call_target;
use crate::frontend::semantic::{ScopeId, ScopeKind, SymbolTable};
use crate::frontend::stream::TokenStream;
use crate::frontend::token::{Token, TokenKind};
use crate::frontend::validate;
use crate::types::Type;
use crate::utils::{Error, Result, SourceFile, Span};

pub const MAX_FUNCTION_PARAMETERS: usize = 32;
pub const MAX_IDENTIFIER_CHAIN: usize = 100;
pub const MAX_RECURSION_DEPTH: usize = 256;

/// Tokenize and parse one compilation unit against `table`
pub fn parse_source(table: &mut SymbolTable, file: &Arc<SourceFile>) -> Result<Program> {
    let tokens = Lexer::new(file).tokenize()?;
    parse_tokens(table, file, tokens)
}

/// Parse an already tokenized unit
pub fn parse_tokens(
    table: &mut SymbolTable,
    file: &Arc<SourceFile>,
    tokens: Vec<Token>,
) -> Result<Program> {
    let stream = TokenStream::new(Arc::clone(file), tokens);
    Parser::new(table, Arc::clone(file)).parse_program(stream)
}

/// Signature of the function whose body is being parsed
pub(crate) struct FunctionContext {
    pub name: String,
    pub ret: Type,
    pub is_variadic: bool,
    /// Loop nesting outside the function, restored when the body ends
    pub outer_loops: usize,
}

/// The parser
pub struct Parser<'t> {
    pub(crate) table: &'t mut SymbolTable,
    pub(crate) file: Arc<SourceFile>,
    pub(crate) functions: Vec<FunctionContext>,
    pub(crate) loop_depth: usize,
    /// Internal name of the struct whose members are being parsed
    pub(crate) declaring_struct: Option<String>,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(table: &'t mut SymbolTable, file: Arc<SourceFile>) -> Self {
        Self {
            table,
            file,
            functions: Vec::new(),
            loop_depth: 0,
            declaring_struct: None,
            depth: 0,
        }
    }

    // ==================== Helper Methods ====================

    pub(crate) fn descend(&mut self, stream: &TokenStream) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            return Err(stream.error(format!(
                "Maximum nesting depth of {} exceeded",
                MAX_RECURSION_DEPTH
            )));
        }
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// A carved-out region must be consumed completely
    pub(crate) fn finish(&self, stream: &TokenStream) -> Result<()> {
        if stream.has_next() {
            return Err(stream.error(format!("Unexpected token '{}'", stream.peek_next().lexeme)));
        }
        Ok(())
    }

    pub(crate) fn semantic_error(&self, message: impl Into<String>, span: Span) -> Error {
        Error::semantic(message).with_reference(&self.file, span)
    }

    /// Infer a type, pointing any failure at the expression
    pub(crate) fn infer(&self, scope: ScopeId, expr: &Expr) -> Result<Type> {
        infer_expression_type(self.table, scope, expr)
            .map_err(|e| e.or_reference(&self.file, expr.span()))
    }

    fn parse_visibility(&self, stream: &mut TokenStream) -> Visibility {
        if stream.consume(TokenKind::Public) {
            Visibility::Public
        } else if stream.consume(TokenKind::Private) {
            Visibility::Private
        } else {
            Visibility::Inherited
        }
    }

    // ==================== Units and Blocks ====================

    pub fn parse_program(&mut self, mut stream: TokenStream) -> Result<Program> {
        let global = self.table.global();
        let start = stream.peek_next().span;

        let mut stmts = Vec::new();
        let mut package = None;
        if stream.peek_next_eq(TokenKind::Package) {
            let (name, span) = self.parse_package(&mut stream)?;
            package = Some(name.clone());
            stmts.push(Stmt::Package { name, span });
        }
        stmts.extend(self.parse_block_body(&mut stream, global)?);

        let mut body = Block {
            stmts,
            scope: global,
            span: stream.span_from(start),
        };
        self.resolve_deferred_calls(&mut body)?;

        log::debug!("parsed unit {} ({} statements)", self.file.path, body.stmts.len());
        Ok(Program {
            path: self.file.path.clone(),
            package,
            body,
        })
    }

    /// package NAME;
    fn parse_package(&mut self, stream: &mut TokenStream) -> Result<(String, Span)> {
        let start = stream.expect(TokenKind::Package)?.span;
        let first = stream.expect_msg(TokenKind::Ident, "Expected package name")?;
        let mut segments = vec![first.lexeme];
        while stream.consume(TokenKind::ColonColon) {
            segments.push(stream.expect_msg(TokenKind::Ident, "Expected package name")?.lexeme);
        }
        stream.expect(TokenKind::Semicolon)?;
        Ok((segments.join("::"), stream.span_from(start)))
    }

    /// Calls to functions declared further down the unit are resolved once
    /// the whole unit has been registered.
    fn resolve_deferred_calls(&mut self, body: &mut Block) -> Result<()> {
        let table: &SymbolTable = self.table;
        let file = &self.file;
        body.walk_calls_mut(&mut |call: &mut Call| {
            if call.target != CallTarget::Deferred {
                return Ok(());
            }
            match resolve_call_target(table, call).map_err(|e| e.or_reference(file, call.span))? {
                Some(target) => {
                    log::trace!("deferred call to {} resolved", call.name);
                    call.target = target;
                    Ok(())
                }
                None => Err(function_not_found(table, call).with_reference(file, call.span)),
            }
        })
    }

    /// Statements until the stream is exhausted
    pub(crate) fn parse_block_body(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while stream.has_next() {
            if stream.consume(TokenKind::Semicolon) {
                continue;
            }
            stmts.push(self.parse_statement(stream, scope)?);
        }
        Ok(stmts)
    }

    /// `{ ... }` in a fresh child scope
    pub(crate) fn parse_block(
        &mut self,
        stream: &mut TokenStream,
        parent: ScopeId,
        kind: ScopeKind,
    ) -> Result<Block> {
        let scope = self.table.create_scope(parent, kind);
        self.parse_block_in(stream, scope)
    }

    /// `{ ... }` in an already opened scope
    pub(crate) fn parse_block_in(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Block> {
        let start = stream.peek_next().span;
        let mut body = stream.collect_braces()?;
        let stmts = self.parse_block_body(&mut body, scope)?;
        Ok(Block {
            stmts,
            scope,
            span: stream.span_from(start),
        })
    }

    /// A braced block, or a single statement wrapped in its own scope
    fn parse_branch(&mut self, stream: &mut TokenStream, parent: ScopeId) -> Result<Block> {
        if stream.peek_next_eq(TokenKind::LBrace) {
            return self.parse_block(stream, parent, ScopeKind::Block);
        }
        let scope = self.table.create_scope(parent, ScopeKind::Block);
        let start = stream.peek_next().span;
        let stmt = self.parse_statement(stream, scope)?;
        Ok(Block {
            stmts: vec![stmt],
            scope,
            span: stream.span_from(start),
        })
    }

    // ==================== Statements ====================

    pub(crate) fn parse_statement(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Stmt> {
        self.descend(stream)?;
        let result = self.parse_statement_kind(stream, scope);
        self.ascend();
        result
    }

    fn parse_statement_kind(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Stmt> {
        let modifier_span = stream.peek_next().span;
        let visibility = self.parse_visibility(stream);

        match stream.peek_next().kind {
            TokenKind::Fn | TokenKind::Extern | TokenKind::Async => {
                return self.parse_function_declaration(stream, scope, visibility);
            }
            TokenKind::Struct => return self.parse_struct_declaration(stream, scope, visibility),
            TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_variable_declaration(stream, scope, visibility)?;
                stream.expect(TokenKind::Semicolon)?;
                return Ok(Stmt::Variable(decl));
            }
            _ => {}
        }

        if visibility != Visibility::Inherited {
            return Err(Error::syntax("Visibility modifiers are only allowed before declarations")
                .with_reference(&self.file, modifier_span));
        }

        match stream.peek_next().kind {
            TokenKind::Package => Err(self.semantic_error(
                "Package declarations are only allowed as the first statement of a unit",
                stream.peek_next().span,
            )),
            TokenKind::Import => self.parse_import(stream, scope),
            TokenKind::Module => self.parse_module(stream, scope),
            TokenKind::Enum => self.parse_enum_declaration(stream, scope),
            TokenKind::If => self.parse_if(stream, scope),
            TokenKind::While => self.parse_while(stream, scope),
            TokenKind::For => self.parse_for(stream, scope),
            TokenKind::Return => self.parse_return(stream, scope),
            TokenKind::Break | TokenKind::Continue => self.parse_loop_control(stream),
            TokenKind::LBrace => {
                Ok(Stmt::Block(self.parse_block(stream, scope, ScopeKind::Block)?))
            }
            _ => {
                let expr = self.parse_expression_statement(stream, scope)?;
                stream.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// An expression used as a statement. Calls may refer to functions that
    /// are declared later, so they are not typed here.
    fn parse_expression_statement(
        &mut self,
        stream: &mut TokenStream,
        scope: ScopeId,
    ) -> Result<Expr> {
        let expr = self.parse_expression(stream, scope)?;
        if !matches!(expr, Expr::Call(_)) {
            self.infer(scope, &expr)?;
        }
        Ok(expr)
    }

    /// Parenthesized condition
    fn parse_condition(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Expr> {
        let mut header = stream.collect_parens()?;
        if !header.has_next() {
            return Err(Error::syntax("Expected a condition")
                .with_reference(&self.file, stream.previous_span()));
        }
        let cond = self.parse_expression(&mut header, scope)?;
        self.finish(&header)?;
        self.infer(scope, &cond)?;
        Ok(cond)
    }

    fn parse_if(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Stmt> {
        let start = stream.expect(TokenKind::If)?.span;
        let cond = self.parse_condition(stream, scope)?;
        let then_block = self.parse_branch(stream, scope)?;
        let else_block = if stream.consume(TokenKind::Else) {
            Some(self.parse_branch(stream, scope)?)
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span: stream.span_from(start),
        })
    }

    fn parse_while(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Stmt> {
        let start = stream.expect(TokenKind::While)?.span;
        let cond = self.parse_condition(stream, scope)?;

        self.loop_depth += 1;
        let body = self.parse_block(stream, scope, ScopeKind::Block);
        self.loop_depth -= 1;

        Ok(Stmt::While {
            cond,
            body: body?,
            span: stream.span_from(start),
        })
    }

    /// for (init; cond; step) { ... }
    fn parse_for(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Stmt> {
        let start = stream.expect(TokenKind::For)?.span;
        let mut header = stream.collect_parens()?;
        let for_scope = self.table.create_scope(scope, ScopeKind::Block);

        let init = match header.collect_until(TokenKind::Semicolon)? {
            Some(mut region) => {
                let stmt = if matches!(region.peek_next().kind, TokenKind::Let | TokenKind::Const) {
                    Stmt::Variable(self.parse_variable_declaration(
                        &mut region,
                        for_scope,
                        Visibility::Inherited,
                    )?)
                } else {
                    Stmt::Expr(self.parse_expression_statement(&mut region, for_scope)?)
                };
                self.finish(&region)?;
                Some(Box::new(stmt))
            }
            None => None,
        };

        let cond = match header.collect_until(TokenKind::Semicolon)? {
            Some(mut region) => {
                let cond = self.parse_expression(&mut region, for_scope)?;
                self.finish(&region)?;
                self.infer(for_scope, &cond)?;
                Some(cond)
            }
            None => None,
        };

        let step = if header.has_next() {
            let step = self.parse_expression_statement(&mut header, for_scope)?;
            self.finish(&header)?;
            Some(step)
        } else {
            None
        };

        self.loop_depth += 1;
        let body = self.parse_block(stream, for_scope, ScopeKind::Block);
        self.loop_depth -= 1;

        Ok(Stmt::For {
            init,
            cond,
            step,
            body: body?,
            scope: for_scope,
            span: stream.span_from(start),
        })
    }

    fn parse_return(&mut self, stream: &mut TokenStream, scope: ScopeId) -> Result<Stmt> {
        let keyword = stream.expect(TokenKind::Return)?;
        if self.functions.is_empty() {
            return Err(self.semantic_error(
                "Return statements are not allowed outside of functions",
                keyword.span,
            ));
        }

        let value = if stream.peek_next_eq(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(stream, scope)?)
        };
        stream.expect(TokenKind::Semicolon)?;
        let span = stream.span_from(keyword.span);

        if let Some(function) = self.functions.last() {
            validate::check_return(
                self.table,
                scope,
                &self.file,
                &function.name,
                &function.ret,
                value.as_ref(),
                span,
            )?;
        }
        Ok(Stmt::Return { value, span })
    }

    fn parse_loop_control(&mut self, stream: &mut TokenStream) -> Result<Stmt> {
        let keyword = stream.next();
        stream.expect(TokenKind::Semicolon)?;
        let span = stream.span_from(keyword.span);

        if self.loop_depth == 0 {
            return Err(self.semantic_error(
                format!("'{}' statements are only allowed inside loops", keyword.lexeme),
                keyword.span,
            ));
        }
        Ok(match keyword.kind {
            TokenKind::Break => Stmt::Break { span },
            _ => Stmt::Continue { span },
        })
    }
}
