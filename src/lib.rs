//! Stride front end
//!
//! A single-pass parser fused with semantic resolution: declarations are
//! registered, types inferred and checked while the source is parsed.

pub mod frontend;
pub mod types;
pub mod utils;

pub use frontend::{parse_source, Session, SymbolTable};
pub use utils::{Error, ErrorKind, Result, SourceFile, Span};
