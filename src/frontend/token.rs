//! Token definitions for Stride

use std::fmt;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text, or the decoded value for string and char literals
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span,
        }
    }

    /// Comments never reach the parser's cursor
    pub fn is_ignorable(&self) -> bool {
        self.kind == TokenKind::Comment
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ============ Keywords ============
    /// fn
    Fn,
    /// let
    Let,
    /// const
    Const,
    /// if
    If,
    /// else
    Else,
    /// for
    For,
    /// while
    While,
    /// return
    Return,
    /// break
    Break,
    /// continue
    Continue,
    /// struct
    Struct,
    /// enum
    Enum,
    /// module
    Module,
    /// package
    Package,
    /// import / use
    Import,
    /// extern
    Extern,
    /// async
    Async,
    /// public
    Public,
    /// private
    Private,
    /// true
    True,
    /// false
    False,
    /// nil
    Nil,
    /// Primitive type name (i32, float64, string, ...)
    PrimitiveType,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name, function name, etc.)
    Ident,
    /// Integer literal
    IntLit,
    /// Integer literal with an `L` suffix
    LongLit,
    /// Floating-point literal
    FloatLit,
    /// Floating-point literal with a `D` suffix
    DoubleLit,
    /// String literal
    StringLit,
    /// Character literal
    CharLit,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// **
    StarStar,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Not,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// ~
    Tilde,
    /// <<
    Shl,
    /// >>
    Shr,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,
    /// %=
    PercentEq,
    /// &=
    AndEq,
    /// |=
    OrEq,
    /// ^=
    CaretEq,
    /// ->
    Arrow,
    /// .
    Dot,
    /// ...
    DotDotDot,
    /// ::
    ColonColon,
    /// ?
    Question,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,

    // ============ Special ============
    /// Line or block comment
    Comment,
    /// End of file
    Eof,
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "fn" => Some(TokenKind::Fn),
            "let" => Some(TokenKind::Let),
            "const" => Some(TokenKind::Const),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "struct" => Some(TokenKind::Struct),
            "enum" => Some(TokenKind::Enum),
            "module" => Some(TokenKind::Module),
            "package" => Some(TokenKind::Package),
            "import" | "use" => Some(TokenKind::Import),
            "extern" => Some(TokenKind::Extern),
            "async" => Some(TokenKind::Async),
            "public" => Some(TokenKind::Public),
            "private" => Some(TokenKind::Private),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "nil" => Some(TokenKind::Nil),
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "f32" | "f64"
            | "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32"
            | "uint64" | "float32" | "float64" | "bool" | "char" | "string" | "void" => {
                Some(TokenKind::PrimitiveType)
            }
            _ => None,
        }
    }

    /// Binding strength of an arithmetic operator (for precedence climbing)
    /// Returns None if not an arithmetic operator
    pub fn arithmetic_precedence(&self) -> Option<u8> {
        match self {
            TokenKind::Plus | TokenKind::Minus => Some(1),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(2),
            TokenKind::StarStar => Some(3),
            _ => None,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, TokenKind::AndAnd | TokenKind::OrOr)
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::AndEq
                | TokenKind::OrEq
                | TokenKind::CaretEq
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::LongLit
                | TokenKind::FloatLit
                | TokenKind::DoubleLit
                | TokenKind::StringLit
                | TokenKind::CharLit
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
        )
    }

    /// Spelling used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Fn => "fn",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Struct => "struct",
            TokenKind::Enum => "enum",
            TokenKind::Module => "module",
            TokenKind::Package => "package",
            TokenKind::Import => "import",
            TokenKind::Extern => "extern",
            TokenKind::Async => "async",
            TokenKind::Public => "public",
            TokenKind::Private => "private",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            TokenKind::PrimitiveType => "type",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit | TokenKind::LongLit => "integer literal",
            TokenKind::FloatLit | TokenKind::DoubleLit => "float literal",
            TokenKind::StringLit => "string literal",
            TokenKind::CharLit => "char literal",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AndEq => "&=",
            TokenKind::OrEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::Arrow => "->",
            TokenKind::Dot => ".",
            TokenKind::DotDotDot => "...",
            TokenKind::ColonColon => "::",
            TokenKind::Question => "?",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_type_names() {
        assert_eq!(TokenKind::keyword_from_str("module"), Some(TokenKind::Module));
        assert_eq!(TokenKind::keyword_from_str("use"), Some(TokenKind::Import));
        assert_eq!(TokenKind::keyword_from_str("float64"), Some(TokenKind::PrimitiveType));
        assert_eq!(TokenKind::keyword_from_str("u8"), Some(TokenKind::PrimitiveType));
        assert_eq!(TokenKind::keyword_from_str("Point"), None);
    }

    #[test]
    fn test_precedence_tiers() {
        let tier = |kind: TokenKind| kind.arithmetic_precedence();
        assert!(tier(TokenKind::StarStar) > tier(TokenKind::Star));
        assert!(tier(TokenKind::Slash) > tier(TokenKind::Minus));
        assert_eq!(TokenKind::EqEq.arithmetic_precedence(), None);
        assert!(TokenKind::Le.is_comparison());
        assert!(TokenKind::OrOr.is_logical());
        assert!(TokenKind::CaretEq.is_assignment());
    }
}
