//! Utility module

mod span;
mod source;
mod error;

pub use span::Span;
pub use source::SourceFile;
pub use error::{Diagnostic, Error, ErrorKind, Report, Result, SourceReference};
