//! Token stream with a forward-only cursor
//!
//! A stream is a window over a shared token buffer. Balanced regions
//! (argument lists, block bodies) are carved out with [`TokenStream::create_subset`]
//! into independent streams whose cursor starts at zero, so nested parses never
//! disturb the parent's cursor beyond the single skip over the region.

use std::sync::Arc;

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, ErrorKind, Result, SourceFile, Span};

#[derive(Debug, Clone)]
pub struct TokenStream {
    file: Arc<SourceFile>,
    tokens: Arc<[Token]>,
    /// Window bounds into `tokens` (end exclusive, never covers the file's Eof)
    start: usize,
    end: usize,
    /// Absolute index; always rests on a significant token or on `end`
    cursor: usize,
    /// Sentinel returned once the window is exhausted
    eof: Token,
    previous: Span,
}

impl TokenStream {
    /// Wrap the full output of the tokenizer
    pub fn new(file: Arc<SourceFile>, tokens: Vec<Token>) -> Self {
        let end = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Eof)
            .unwrap_or(tokens.len());
        let eof = tokens
            .get(end)
            .cloned()
            .unwrap_or_else(|| Token::eof(Span::at(file.text.len(), 0, file.id)));
        let previous = Span::at(0, 0, file.id);

        let mut stream = Self {
            file,
            tokens: tokens.into(),
            start: 0,
            end,
            cursor: 0,
            eof,
            previous,
        };
        stream.settle();
        stream
    }

    /// Move the cursor past ignorable tokens
    fn settle(&mut self) {
        while self.cursor < self.end && self.tokens[self.cursor].is_ignorable() {
            self.cursor += 1;
        }
    }

    /// Absolute index of the significant token `offset` positions ahead
    fn index_of(&self, offset: usize) -> Option<usize> {
        let mut remaining = offset;
        let mut index = self.cursor;
        while index < self.end {
            if !self.tokens[index].is_ignorable() {
                if remaining == 0 {
                    return Some(index);
                }
                remaining -= 1;
            }
            index += 1;
        }
        None
    }

    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    /// Number of significant tokens consumed so far
    pub fn position(&self) -> usize {
        self.tokens[self.start..self.cursor]
            .iter()
            .filter(|t| !t.is_ignorable())
            .count()
    }

    /// Number of significant tokens left
    pub fn remaining(&self) -> usize {
        self.tokens[self.cursor..self.end]
            .iter()
            .filter(|t| !t.is_ignorable())
            .count()
    }

    // ==================== Lookahead ====================

    /// Token `offset` significant positions ahead, or the Eof sentinel
    pub fn peek(&self, offset: usize) -> &Token {
        match self.index_of(offset) {
            Some(index) => &self.tokens[index],
            None => &self.eof,
        }
    }

    pub fn peek_next(&self) -> &Token {
        self.peek(0)
    }

    pub fn peek_eq(&self, kind: TokenKind, offset: usize) -> bool {
        self.peek(offset).kind == kind
    }

    pub fn peek_next_eq(&self, kind: TokenKind) -> bool {
        self.peek_eq(kind, 0)
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.end && self.tokens[self.cursor].kind != TokenKind::Eof
    }

    // ==================== Consumption ====================

    /// Consume one significant token
    pub fn next(&mut self) -> Token {
        if !self.has_next() {
            return self.eof.clone();
        }
        let token = self.tokens[self.cursor].clone();
        self.previous = token.span;
        self.cursor += 1;
        self.settle();
        token
    }

    pub fn skip(&mut self, count: usize) {
        for _ in 0..count {
            if !self.has_next() {
                break;
            }
            self.next();
        }
    }

    /// Consume the next token if it has the given kind
    pub fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek_next_eq(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_next_eq(kind) {
            return Ok(self.next());
        }

        let message = if self.has_next() {
            format!("Expected '{}' but found '{}'", kind, describe(self.peek_next()))
        } else {
            format!("Expected '{}', but reached end of block", kind)
        };
        Err(self.error(message))
    }

    /// Like [`TokenStream::expect`] with a caller-provided message
    pub fn expect_msg(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.peek_next_eq(kind) {
            Ok(self.next())
        } else {
            Err(self.error(message))
        }
    }

    /// Span of the last consumed token
    pub fn previous_span(&self) -> Span {
        self.previous
    }

    /// Span from `start` to the last consumed token
    pub fn span_from(&self, start: Span) -> Span {
        start.merge(&self.previous)
    }

    // ==================== Subsets ====================

    /// Slice `length` significant tokens starting `offset` positions ahead into
    /// an independent stream. The parent cursor does not move.
    pub fn create_subset(&self, offset: usize, length: usize) -> Result<TokenStream> {
        let available = self.remaining();
        if offset + length > available {
            return Err(self.error(format!(
                "Cannot create a subset of {} tokens at offset {}; only {} remain",
                length, offset, available
            )));
        }

        let start = self.index_of(offset).unwrap_or(self.end);
        let end = if length == 0 {
            start
        } else {
            self.index_of(offset + length - 1).map(|i| i + 1).unwrap_or(self.end)
        };

        log::trace!("subset of {} tokens at offset {}", length, offset);
        Ok(self.window(start, end))
    }

    /// Independent stream over the absolute range `start..end`
    fn window(&self, start: usize, end: usize) -> TokenStream {
        // The token right after the region (usually its closing delimiter)
        // anchors "reached end of block" diagnostics.
        let eof_span = self
            .tokens
            .get(end)
            .filter(|_| end < self.end)
            .map(|t| Span::at(t.span.start, 0, t.span.file_id))
            .unwrap_or(Span::at(self.eof.span.start, 0, self.eof.span.file_id));
        let previous = self
            .tokens
            .get(start)
            .map(|t| Span::at(t.span.start, 0, t.span.file_id))
            .unwrap_or(eof_span);

        let mut subset = TokenStream {
            file: Arc::clone(&self.file),
            tokens: Arc::clone(&self.tokens),
            start,
            end,
            cursor: start,
            eof: Token::eof(eof_span),
            previous,
        };
        subset.settle();
        subset
    }

    /// Consume everything up to and including the token at absolute `index`
    fn advance_past(&mut self, index: usize) {
        self.previous = self.tokens[index].span;
        self.cursor = index + 1;
        self.settle();
    }

    /// Carve out the region between `open` and its matching `close`,
    /// then move past the closing token.
    pub fn collect_block(&mut self, open: TokenKind, close: TokenKind) -> Result<TokenStream> {
        let opening = self.expect(open)?;

        let mut depth = 1usize;
        let mut index = self.cursor;
        loop {
            if index >= self.end || self.tokens[index].kind == TokenKind::Eof {
                return Err(Error::syntax(format!(
                    "Unmatched '{}'; expected a closing '{}'",
                    open, close
                ))
                .with_reference(&self.file, opening.span));
            }
            let kind = self.tokens[index].kind;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            index += 1;
        }

        log::trace!("block of {} tokens", index - self.cursor);
        let block = self.window(self.cursor, index);
        self.advance_past(index);
        Ok(block)
    }

    pub fn collect_braces(&mut self) -> Result<TokenStream> {
        self.collect_block(TokenKind::LBrace, TokenKind::RBrace)
    }

    pub fn collect_parens(&mut self) -> Result<TokenStream> {
        self.collect_block(TokenKind::LParen, TokenKind::RParen)
    }

    /// Carve out the tokens before the next top-level `terminator` and consume
    /// the terminator. Returns `None` when the region is empty.
    pub fn collect_until(&mut self, terminator: TokenKind) -> Result<Option<TokenStream>> {
        let mut depth = 0usize;
        let mut index = self.cursor;
        loop {
            if index >= self.end || self.tokens[index].kind == TokenKind::Eof {
                return Err(self.error(format!(
                    "Expected '{}', but reached end of block",
                    terminator
                )));
            }
            match self.tokens[index].kind {
                kind if kind == terminator && depth == 0 => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            index += 1;
        }

        let region = if index == self.cursor {
            None
        } else {
            Some(self.window(self.cursor, index))
        };
        self.advance_past(index);
        Ok(region)
    }

    // ==================== Diagnostics ====================

    /// Syntax error pointing at the next token
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message).with_reference(&self.file, self.peek_next().span)
    }

    pub fn error_at(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> Error {
        Error::new(kind, message).with_reference(&self.file, span)
    }
}

/// Text shown for a token in "found" positions
fn describe(token: &Token) -> String {
    if token.lexeme.is_empty() {
        token.kind.to_string()
    } else {
        token.lexeme.clone()
    }
}
