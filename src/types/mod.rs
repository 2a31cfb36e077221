//! Types module

mod type_system;
mod promotion;

pub use type_system::{PrimitiveKind, Type, TypeFlags};
pub use promotion::{dominant_type, is_assignable};
