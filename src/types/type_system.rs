//! Type System for Stride
//!
//! Types are plain values. They are cloned whenever they are stored into a
//! symbol or propagated to another node, because flags are per occurrence
//! (the same struct used as a pointer in one place and a value in another).

use std::fmt;
use std::ops::BitOr;

use serde::Serialize;

/// Primitive type kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    Char,
    String,
    Void,
    Nil,
    Unknown,
}

impl PrimitiveKind {
    /// Resolve a primitive type keyword (both `i32` and `int32` spellings)
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "i8" | "int8" => Some(Self::Int8),
            "i16" | "int16" => Some(Self::Int16),
            "i32" | "int32" => Some(Self::Int32),
            "i64" | "int64" => Some(Self::Int64),
            "u8" | "uint8" => Some(Self::UInt8),
            "u16" | "uint16" => Some(Self::UInt16),
            "u32" | "uint32" => Some(Self::UInt32),
            "u64" | "uint64" => Some(Self::UInt64),
            "f32" | "float32" => Some(Self::Float32),
            "f64" | "float64" => Some(Self::Float64),
            "bool" => Some(Self::Bool),
            "char" => Some(Self::Char),
            "string" => Some(Self::String),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    /// Canonical spelling
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::UInt8 => "u8",
            Self::UInt16 => "u16",
            Self::UInt32 => "u32",
            Self::UInt64 => "u64",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::String => "string",
            Self::Void => "void",
            Self::Nil => "nil",
            Self::Unknown => "unknown",
        }
    }

    /// Width in bits. Strings report the width of their byte pointee.
    pub fn bit_width(&self) -> u32 {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char | Self::String => 8,
            Self::Int16 | Self::UInt16 => 16,
            Self::Int32 | Self::UInt32 | Self::Float32 => 32,
            Self::Int64 | Self::UInt64 | Self::Float64 => 64,
            Self::Bool => 1,
            Self::Void | Self::Nil | Self::Unknown => 0,
        }
    }

    /// Get the size in bytes
    pub fn size_of(&self) -> usize {
        match self {
            Self::Bool => 1,
            other => (other.bit_width() / 8) as usize,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Inclusive value range of an integer kind
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::UInt8 => Some((0, u8::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    pub fn float_of_width(bits: u32) -> Self {
        if bits > 32 {
            Self::Float64
        } else {
            Self::Float32
        }
    }
}

/// Per-occurrence type modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TypeFlags(u16);

impl TypeFlags {
    pub const NONE: TypeFlags = TypeFlags(0);
    pub const POINTER: TypeFlags = TypeFlags(0x1);
    pub const REFERENCE: TypeFlags = TypeFlags(0x2);
    pub const MUTABLE: TypeFlags = TypeFlags(0x4);
    pub const OPTIONAL: TypeFlags = TypeFlags(0x8);
    pub const GLOBAL: TypeFlags = TypeFlags(0x10);
    pub const VARIADIC: TypeFlags = TypeFlags(0x20);

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, other: TypeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TypeFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: TypeFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TypeFlags {
    type Output = TypeFlags;

    fn bitor(self, rhs: TypeFlags) -> TypeFlags {
        TypeFlags(self.0 | rhs.0)
    }
}

/// A Stride type
#[derive(Debug, Clone, Serialize)]
pub enum Type {
    Primitive {
        kind: PrimitiveKind,
        bits: u32,
        flags: TypeFlags,
    },
    /// Struct type referenced by name
    Named { name: String, flags: TypeFlags },
    Array {
        element: Box<Type>,
        length: usize,
        flags: TypeFlags,
    },
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
        flags: TypeFlags,
    },
}

impl Type {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Type::Primitive {
            kind,
            bits: kind.bit_width(),
            flags: TypeFlags::NONE,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::Named {
            name: name.into(),
            flags: TypeFlags::NONE,
        }
    }

    pub fn array(element: Type, length: usize) -> Self {
        Type::Array {
            element: Box::new(element),
            length,
            flags: TypeFlags::NONE,
        }
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function {
            params,
            ret: Box::new(ret),
            flags: TypeFlags::NONE,
        }
    }

    pub fn unknown() -> Self {
        Self::primitive(PrimitiveKind::Unknown)
    }

    pub fn void() -> Self {
        Self::primitive(PrimitiveKind::Void)
    }

    pub fn bool() -> Self {
        Self::primitive(PrimitiveKind::Bool)
    }

    pub fn nil() -> Self {
        Self::primitive(PrimitiveKind::Nil)
    }

    // ==================== Flags ====================

    pub fn flags(&self) -> TypeFlags {
        match self {
            Type::Primitive { flags, .. }
            | Type::Named { flags, .. }
            | Type::Array { flags, .. }
            | Type::Function { flags, .. } => *flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut TypeFlags {
        match self {
            Type::Primitive { flags, .. }
            | Type::Named { flags, .. }
            | Type::Array { flags, .. }
            | Type::Function { flags, .. } => flags,
        }
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags_mut().insert(flags);
        self
    }

    pub fn without_flags(mut self, flags: TypeFlags) -> Self {
        self.flags_mut().remove(flags);
        self
    }

    pub fn is_pointer(&self) -> bool {
        self.flags().contains(TypeFlags::POINTER)
    }

    pub fn is_reference(&self) -> bool {
        self.flags().contains(TypeFlags::REFERENCE)
    }

    pub fn is_optional(&self) -> bool {
        self.flags().contains(TypeFlags::OPTIONAL)
    }

    pub fn is_mutable(&self) -> bool {
        self.flags().contains(TypeFlags::MUTABLE)
    }

    pub fn is_global(&self) -> bool {
        self.flags().contains(TypeFlags::GLOBAL)
    }

    pub fn is_variadic(&self) -> bool {
        self.flags().contains(TypeFlags::VARIADIC)
    }

    // ==================== Kind queries ====================

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn bit_width(&self) -> u32 {
        match self {
            Type::Primitive { bits, .. } => *bits,
            _ => 0,
        }
    }

    pub fn is_kind(&self, kind: PrimitiveKind) -> bool {
        self.primitive_kind() == Some(kind)
    }

    pub fn is_void(&self) -> bool {
        self.is_kind(PrimitiveKind::Void) && !self.is_pointer()
    }

    pub fn is_nil(&self) -> bool {
        self.is_kind(PrimitiveKind::Nil)
    }

    pub fn is_integer(&self) -> bool {
        self.primitive_kind().map_or(false, |k| k.is_integer())
    }

    pub fn is_float(&self) -> bool {
        self.primitive_kind().map_or(false, |k| k.is_float())
    }

    /// Struct name of a named type
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    // ==================== Identity ====================

    /// Type compatibility used by declarations, overloads and returns.
    ///
    /// Primitives compare by kind, named types by name, arrays by element
    /// type (length is not part of identity) and functions structurally.
    /// `nil` equals any optional type.
    pub fn equals(&self, other: &Type) -> bool {
        let same = match (self, other) {
            (Type::Primitive { kind: a, .. }, Type::Primitive { kind: b, .. }) => a == b,
            (Type::Named { name: a, .. }, Type::Named { name: b, .. }) => a == b,
            (Type::Array { element: a, .. }, Type::Array { element: b, .. }) => a.equals(b),
            (
                Type::Function { params: pa, ret: ra, .. },
                Type::Function { params: pb, ret: rb, .. },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(a, b)| a.equals(b))
                    && ra.equals(rb)
            }
            _ => false,
        };
        same || self.nil_compatible(other)
    }

    fn nil_compatible(&self, other: &Type) -> bool {
        (self.is_nil() && other.is_optional()) || (other.is_nil() && self.is_optional())
    }

    /// Name used for overload mangling and diagnostics
    pub fn internal_name(&self) -> String {
        self.to_string()
    }

    /// Layout of an optional value as agreed with the code generator:
    /// a two-field record `{ has_value: i1, payload }`.
    pub fn optional_layout(&self) -> Option<(Type, Type)> {
        if !self.is_optional() {
            return None;
        }
        let has_value = Type::Primitive {
            kind: PrimitiveKind::Bool,
            bits: 1,
            flags: TypeFlags::NONE,
        };
        let payload = self
            .clone()
            .without_flags(TypeFlags::OPTIONAL | TypeFlags::MUTABLE | TypeFlags::GLOBAL);
        Some((has_value, payload))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = self.flags();
        if flags.contains(TypeFlags::VARIADIC) {
            f.write_str("...")?;
        }
        if flags.contains(TypeFlags::REFERENCE) {
            f.write_str("&")?;
        }
        if flags.contains(TypeFlags::POINTER) {
            f.write_str("*")?;
        }

        let wrap_function = matches!(self, Type::Function { .. })
            && (flags.contains(TypeFlags::POINTER)
                || flags.contains(TypeFlags::REFERENCE)
                || flags.contains(TypeFlags::OPTIONAL));
        if wrap_function {
            f.write_str("(")?;
        }

        match self {
            Type::Primitive { kind, .. } => f.write_str(kind.name())?,
            Type::Named { name, .. } => f.write_str(name)?,
            Type::Array { element, .. } => {
                if matches!(**element, Type::Function { .. }) && element.flags().is_empty() {
                    write!(f, "({})[]", element)?;
                } else {
                    write!(f, "{}[]", element)?;
                }
            }
            Type::Function { params, ret, .. } => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)?;
            }
        }

        if wrap_function {
            f.write_str(")")?;
        }
        if flags.contains(TypeFlags::OPTIONAL) {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prim(kind: PrimitiveKind) -> Type {
        Type::primitive(kind)
    }

    #[test]
    fn test_keyword_spellings() {
        assert_eq!(PrimitiveKind::from_keyword("int32"), Some(PrimitiveKind::Int32));
        assert_eq!(PrimitiveKind::from_keyword("i32"), Some(PrimitiveKind::Int32));
        assert_eq!(PrimitiveKind::from_keyword("float64"), Some(PrimitiveKind::Float64));
        assert_eq!(PrimitiveKind::from_keyword("Point"), None);
    }

    #[test]
    fn test_widths() {
        assert_eq!(PrimitiveKind::Int64.bit_width(), 64);
        assert_eq!(PrimitiveKind::Bool.bit_width(), 1);
        assert_eq!(PrimitiveKind::Bool.size_of(), 1);
        assert_eq!(PrimitiveKind::UInt16.size_of(), 2);
        assert_eq!(PrimitiveKind::Void.size_of(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(prim(PrimitiveKind::Int32).to_string(), "i32");
        assert_eq!(prim(PrimitiveKind::Int8).with_flags(TypeFlags::POINTER).to_string(), "*i8");
        assert_eq!(Type::named("Point").with_flags(TypeFlags::OPTIONAL).to_string(), "Point?");
        assert_eq!(Type::array(prim(PrimitiveKind::Int64), 3).to_string(), "i64[]");

        let f = Type::function(
            vec![prim(PrimitiveKind::Int32), prim(PrimitiveKind::Int32)],
            prim(PrimitiveKind::Int32),
        );
        assert_eq!(f.to_string(), "(i32, i32) -> i32");
        assert_eq!(Type::array(f, 1).to_string(), "((i32, i32) -> i32)[]");
    }

    #[test]
    fn test_mutable_flag_is_not_rendered() {
        let t = prim(PrimitiveKind::Int32).with_flags(TypeFlags::MUTABLE | TypeFlags::GLOBAL);
        assert_eq!(t.internal_name(), "i32");
        assert!(t.is_mutable());
        assert!(t.is_global());
    }

    #[test]
    fn test_equality_by_kind() {
        assert!(prim(PrimitiveKind::Int32).equals(&prim(PrimitiveKind::Int32)));
        assert!(!prim(PrimitiveKind::Int32).equals(&prim(PrimitiveKind::Int64)));
        assert!(Type::named("P").equals(&Type::named("P")));
        assert!(!Type::named("P").equals(&Type::named("Q")));
        assert!(!Type::named("P").equals(&prim(PrimitiveKind::Int32)));
    }

    #[test]
    fn test_array_length_is_not_identity() {
        let a = Type::array(prim(PrimitiveKind::Int32), 3);
        let b = Type::array(prim(PrimitiveKind::Int32), 7);
        let c = Type::array(prim(PrimitiveKind::Int64), 3);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn test_function_equality() {
        let a = Type::function(vec![prim(PrimitiveKind::Int32)], prim(PrimitiveKind::Int32));
        let b = Type::function(vec![prim(PrimitiveKind::Int32)], prim(PrimitiveKind::Int32));
        let c = Type::function(
            vec![prim(PrimitiveKind::Int32), prim(PrimitiveKind::Int32)],
            prim(PrimitiveKind::Int32),
        );
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn test_nil_equals_only_optionals() {
        let nil = Type::nil();
        let kinds = [
            PrimitiveKind::Int8,
            PrimitiveKind::Int32,
            PrimitiveKind::UInt64,
            PrimitiveKind::Float64,
            PrimitiveKind::Bool,
            PrimitiveKind::String,
        ];
        for kind in kinds {
            let plain = prim(kind);
            let optional = prim(kind).with_flags(TypeFlags::OPTIONAL);
            assert!(nil.equals(&optional), "nil should equal {}", optional);
            assert!(optional.equals(&nil));
            assert!(!nil.equals(&plain), "nil should not equal {}", plain);
            assert!(!plain.equals(&nil));
        }

        let named = Type::named("Point");
        assert!(nil.equals(&named.clone().with_flags(TypeFlags::OPTIONAL)));
        assert!(!nil.equals(&named));
    }

    #[test]
    fn test_optional_layout() {
        let t = Type::named("Point").with_flags(TypeFlags::OPTIONAL);
        let (flag, payload) = t.optional_layout().unwrap();
        assert_eq!(flag.bit_width(), 1);
        assert_eq!(payload.to_string(), "Point");
        assert!(prim(PrimitiveKind::Int32).optional_layout().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Type::named("Point");
        let mut copy = original.clone();
        copy.flags_mut().insert(TypeFlags::POINTER);
        assert!(!original.is_pointer());
        assert!(copy.is_pointer());
    }
}
