//! Abstract Syntax Tree definitions for Stride
//!
//! Every node is produced already resolved: identifiers carry the binding they
//! refer to, calls carry their target's internal name, and blocks carry the
//! scope they were parsed in.

use serde::Serialize;

use crate::frontend::semantic::{FunctionFlags, ScopeId};
use crate::types::Type;
use crate::utils::{Result, Span};

/// A complete compilation unit
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub path: String,
    pub package: Option<String>,
    pub body: Block,
}

/// Statement list parsed in one scope
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[default]
    Inherited,
    Public,
    Private,
}

// ==================== Statements ====================

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// package NAME;
    Package { name: String, span: Span },
    /// import a::b::{X, Y};
    Import {
        path: Vec<String>,
        items: Vec<String>,
        span: Span,
    },
    /// module A::B { ... }
    Module {
        path: Vec<String>,
        body: Block,
        span: Span,
    },
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    /// let/const declaration
    Variable(VarDecl),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    /// for (init; cond; step) { ... }
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Block,
        scope: ScopeId,
        span: Span,
    },
    Return { value: Option<Expr>, span: Span },
    Break { span: Span },
    Continue { span: Span },
    Block(Block),
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Package { span, .. }
            | Stmt::Import { span, .. }
            | Stmt::Module { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span } => *span,
            Stmt::Function(f) => f.span,
            Stmt::Struct(s) => s.span,
            Stmt::Enum(e) => e.span,
            Stmt::Variable(v) => v.span,
            Stmt::Block(b) => b.span,
            Stmt::Expr(e) => e.span(),
        }
    }
}

/// Function definition, extern declaration or lambda
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub internal_name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    /// None for extern declarations
    pub body: Option<Block>,
    pub flags: FunctionFlags,
    pub visibility: Visibility,
    pub span: Span,
}

impl FunctionDecl {
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub internal_name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub internal_name: String,
    pub body: StructBody,
    pub visibility: Visibility,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum StructBody {
    Fields(Vec<StructField>),
    /// `struct A = B;`
    Reference(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub internal_name: String,
    pub members: Vec<EnumMember>,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub internal_name: String,
    /// Declared type, or the initializer's type when not annotated
    pub ty: Type,
    pub value: Option<Expr>,
    pub mutable: bool,
    pub visibility: Visibility,
    pub scope: ScopeId,
    pub span: Span,
}

// ==================== Expressions ====================

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Literal { value: Literal, span: Span },
    Identifier(Identifier),
    /// `...` inside a variadic function
    VariadicReference { span: Span },
    /// a.b.c
    MemberAccess {
        base: Identifier,
        members: Vec<Member>,
        span: Span,
    },
    /// a[i]
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Call(Call),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Comparison {
        op: ComparisonOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// Reassignment, possibly compound
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
        span: Span,
    },
    /// Name::{ field: value, ... }
    StructInit {
        name: String,
        internal_name: String,
        fields: Vec<FieldInit>,
        span: Span,
    },
    Array { elements: Vec<Expr>, span: Span },
    Lambda(Box<FunctionDecl>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::VariadicReference { span }
            | Expr::MemberAccess { span, .. }
            | Expr::Index { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Comparison { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::StructInit { span, .. }
            | Expr::Array { span, .. } => *span,
            Expr::Identifier(id) => id.span,
            Expr::Call(call) => call.span,
            Expr::Lambda(f) => f.span,
        }
    }

    /// Unsuffixed integer literal value, looking through unary minus
    pub fn integer_literal_value(&self) -> Option<i128> {
        match self {
            Expr::Literal {
                value: Literal::Integer { value, long: false },
                ..
            } => Some(*value as i128),
            Expr::Unary {
                op: UnaryOp::Negate,
                operand,
                ..
            } => operand.integer_literal_value().map(|v| -v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// `long` is set by the `L` suffix
    Integer { value: u64, long: bool },
    /// `double` is set by the `D` suffix
    Float { value: f64, double: bool },
    String(String),
    Char(char),
    Bool(bool),
    Nil,
}

/// Identifier resolved at parse time
#[derive(Debug, Clone, Serialize)]
pub struct Identifier {
    pub name: String,
    pub binding: Binding,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Binding {
    Variable { internal_name: String, scope: ScopeId },
    Function { internal_name: String },
}

impl Binding {
    pub fn internal_name(&self) -> &str {
        match self {
            Binding::Variable { internal_name, .. } | Binding::Function { internal_name } => {
                internal_name
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Call {
    /// Name as written (`A::B::f`)
    pub name: String,
    /// Module-qualified name without parameter key
    pub qualified: String,
    pub args: Vec<Expr>,
    pub arg_types: Vec<Type>,
    pub target: CallTarget,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CallTarget {
    Function { internal_name: String },
    /// Call through a function-typed variable
    Variable { internal_name: String, scope: ScopeId },
    /// Callee declared later in the unit
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// !
    Not,
    /// -
    Negate,
    /// ~
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    /// *
    Dereference,
    /// &
    AddressOf,
}

impl UnaryOp {
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
}

// ==================== Traversal ====================

impl Block {
    /// Visit every call in this block, depth first in source order
    pub fn walk_calls_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Call) -> Result<()>,
    {
        for stmt in &mut self.stmts {
            stmt.walk_calls_mut(f)?;
        }
        Ok(())
    }
}

impl Stmt {
    pub fn walk_calls_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Call) -> Result<()>,
    {
        match self {
            Stmt::Package { .. }
            | Stmt::Import { .. }
            | Stmt::Struct(_)
            | Stmt::Break { .. }
            | Stmt::Continue { .. } => Ok(()),
            Stmt::Module { body, .. } | Stmt::Block(body) => body.walk_calls_mut(f),
            Stmt::Function(decl) => match &mut decl.body {
                Some(body) => body.walk_calls_mut(f),
                None => Ok(()),
            },
            Stmt::Enum(decl) => {
                for member in &mut decl.members {
                    member.value.walk_calls_mut(f)?;
                }
                Ok(())
            }
            Stmt::Variable(decl) => match &mut decl.value {
                Some(value) => value.walk_calls_mut(f),
                None => Ok(()),
            },
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                cond.walk_calls_mut(f)?;
                then_block.walk_calls_mut(f)?;
                if let Some(block) = else_block {
                    block.walk_calls_mut(f)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                cond.walk_calls_mut(f)?;
                body.walk_calls_mut(f)
            }
            Stmt::For {
                init, cond, step, body, ..
            } => {
                if let Some(init) = init {
                    init.walk_calls_mut(f)?;
                }
                if let Some(cond) = cond {
                    cond.walk_calls_mut(f)?;
                }
                if let Some(step) = step {
                    step.walk_calls_mut(f)?;
                }
                body.walk_calls_mut(f)
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => value.walk_calls_mut(f),
                None => Ok(()),
            },
            Stmt::Expr(expr) => expr.walk_calls_mut(f),
        }
    }
}

impl Expr {
    pub fn walk_calls_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Call) -> Result<()>,
    {
        match self {
            Expr::Literal { .. }
            | Expr::Identifier(_)
            | Expr::VariadicReference { .. }
            | Expr::MemberAccess { .. } => Ok(()),
            Expr::Index { array, index, .. } => {
                array.walk_calls_mut(f)?;
                index.walk_calls_mut(f)
            }
            Expr::Call(call) => {
                for arg in &mut call.args {
                    arg.walk_calls_mut(f)?;
                }
                f(call)
            }
            Expr::Binary { lhs, rhs, .. }
            | Expr::Comparison { lhs, rhs, .. }
            | Expr::Logical { lhs, rhs, .. } => {
                lhs.walk_calls_mut(f)?;
                rhs.walk_calls_mut(f)
            }
            Expr::Unary { operand, .. } => operand.walk_calls_mut(f),
            Expr::Assign { target, value, .. } => {
                target.walk_calls_mut(f)?;
                value.walk_calls_mut(f)
            }
            Expr::StructInit { fields, .. } => {
                for field in fields {
                    field.value.walk_calls_mut(f)?;
                }
                Ok(())
            }
            Expr::Array { elements, .. } => {
                for element in elements {
                    element.walk_calls_mut(f)?;
                }
                Ok(())
            }
            Expr::Lambda(decl) => match &mut decl.body {
                Some(body) => body.walk_calls_mut(f),
                None => Ok(()),
            },
        }
    }
}
