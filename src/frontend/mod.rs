//! Frontend module - Tokens, Parser, Symbol Registry

pub mod token;
pub mod lexer;
pub mod stream;
pub mod ast;
pub mod semantic;
pub mod mangle;
pub mod infer;
pub mod validate;
pub mod parser;
mod parser_decl;
mod parser_expr;
pub mod session;

pub use parser::{parse_source, parse_tokens};
pub use semantic::SymbolTable;
pub use session::{Session, Unit};
