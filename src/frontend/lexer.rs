//! Lexer for Stride
//!
//! Converts source code into a flat token sequence terminated by `Eof`.
//! Comments are kept as ignorable tokens so spans stay faithful to the text.

use std::sync::Arc;

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, SourceFile, Span};

/// The lexer state
pub struct Lexer {
    file: Arc<SourceFile>,
    /// Characters paired with their byte offsets
    source: Vec<(usize, char)>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
}

impl Lexer {
    /// Create a new lexer for the given source file
    pub fn new(file: &Arc<SourceFile>) -> Self {
        Self {
            file: Arc::clone(file),
            source: file.text.char_indices().collect(),
            pos: 0,
            start: 0,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).map(|(_, c)| *c)
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).map(|(_, c)| *c)
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.source
            .get(pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.file.text.len())
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.byte_offset(self.start), self.byte_offset(self.pos), self.file.id)
    }

    fn text(&self) -> String {
        self.source[self.start..self.pos.min(self.source.len())]
            .iter()
            .map(|(_, c)| *c)
            .collect()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.text(), self.make_span())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message).with_reference(&self.file, self.make_span())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_line_comment(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.make_token(TokenKind::Comment)
    }

    fn read_block_comment(&mut self) -> Result<Token> {
        self.advance(); // skip /
        self.advance(); // skip *
        loop {
            match (self.peek(), self.peek_next()) {
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    return Ok(self.make_token(TokenKind::Comment));
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => return Err(self.error("Unterminated block comment")),
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, self.make_span())
    }

    /// Read a number literal; the lexeme keeps the digits without suffix
    fn read_number(&mut self) -> Result<Token> {
        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('X')) {
            self.advance(); // 0
            self.advance(); // x

            let digits_start = self.pos;
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.pos == digits_start {
                return Err(self.error("Expected hexadecimal digits after '0x'"));
            }

            let text = self.text();
            return Ok(self.suffixed_integer(text));
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // Decimal point must be followed by a digit; `1.foo` stays an integer
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }

            let text = self.text();
            if matches!(self.peek(), Some('D') | Some('d')) {
                self.advance();
                return Ok(Token::new(TokenKind::DoubleLit, text, self.make_span()));
            }
            return Ok(Token::new(TokenKind::FloatLit, text, self.make_span()));
        }

        let text = self.text();
        Ok(self.suffixed_integer(text))
    }

    fn suffixed_integer(&mut self, text: String) -> Token {
        if matches!(self.peek(), Some('L') | Some('l')) {
            self.advance();
            Token::new(TokenKind::LongLit, text, self.make_span())
        } else {
            Token::new(TokenKind::IntLit, text, self.make_span())
        }
    }

    fn read_escape(&mut self) -> Result<char> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('0') => Ok('\0'),
            Some(c) => Err(self.error(format!("Unknown escape sequence '\\{}'", c))),
            None => Err(self.error("Unterminated escape sequence")),
        }
    }

    /// Read a string literal, decoding escapes into the lexeme
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // consume opening quote

        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => value.push(self.read_escape()?),
                Some('\n') | None => return Err(self.error("Unterminated string literal")),
                Some(c) => value.push(c),
            }
        }

        Ok(Token::new(TokenKind::StringLit, value, self.make_span()))
    }

    fn read_char(&mut self) -> Result<Token> {
        self.advance(); // consume opening quote

        let c = match self.advance() {
            Some('\\') => self.read_escape()?,
            Some('\'') | Some('\n') | None => {
                return Err(self.error("Empty or unterminated char literal"))
            }
            Some(c) => c,
        };

        if self.advance() != Some('\'') {
            return Err(self.error("Unterminated char literal"));
        }

        Ok(Token::new(TokenKind::CharLit, c.to_string(), self.make_span()))
    }

    /// Pick between a one-character operator and its `=`-suffixed form
    fn with_eq(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            assign
        } else {
            plain
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::eof(self.make_span())),
        };

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return Ok(self.read_identifier());
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }
        if c == '\'' {
            return self.read_char();
        }
        if c == '/' && self.peek_next() == Some('/') {
            return Ok(self.read_line_comment());
        }
        if c == '/' && self.peek_next() == Some('*') {
            return self.read_block_comment();
        }

        self.advance();
        let kind = match c {
            '+' => match self.peek() {
                Some('+') => {
                    self.advance();
                    TokenKind::PlusPlus
                }
                _ => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            },
            '-' => match self.peek() {
                Some('-') => {
                    self.advance();
                    TokenKind::MinusMinus
                }
                Some('>') => {
                    self.advance();
                    TokenKind::Arrow
                }
                _ => self.with_eq(TokenKind::Minus, TokenKind::MinusEq),
            },
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    self.with_eq(TokenKind::Star, TokenKind::StarEq)
                }
            }
            '/' => self.with_eq(TokenKind::Slash, TokenKind::SlashEq),
            '%' => self.with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '!' => self.with_eq(TokenKind::Not, TokenKind::Ne),
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    TokenKind::Shl
                } else {
                    self.with_eq(TokenKind::Lt, TokenKind::Le)
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Shr
                } else {
                    self.with_eq(TokenKind::Gt, TokenKind::Ge)
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    self.with_eq(TokenKind::And, TokenKind::AndEq)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    self.with_eq(TokenKind::Or, TokenKind::OrEq)
                }
            }
            '^' => self.with_eq(TokenKind::Caret, TokenKind::CaretEq),
            '~' => TokenKind::Tilde,
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '?' => TokenKind::Question,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            other => return Err(self.error(format!("Unexpected character '{}'", other))),
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::trace!("tokenized {} into {} tokens", self.file.path, tokens.len());
        Ok(tokens)
    }
}
