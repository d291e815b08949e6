use std::fmt;

use super::{Ident, Span};
use crate::types::Type;
use crate::types::deferred::DeferredId;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(Integer),
    Bool(Boolean),
    Char(Character),
    Variable(Variable),
    Tuple(Tuple),
    EmptyList(EmptyList),
    Range(ListRange),
    BinaryOp(BinaryOp),
    UnaryOp(UnaryOp),
    Call(FunCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Integer {
    pub value: i64,
    pub position: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boolean {
    pub value: bool,
    pub position: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub value: char,
    pub position: Span,
    pub ty: Option<Type>,
}

/// A variable reference with an optional field/index chain: `x`, `xs.hd`,
/// `p.fst.tl`, `xs[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub position: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Hd,
    Tl,
    Fst,
    Snd,
    Index(Expr),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Hd => write!(f, ".hd"),
            Field::Tl => write!(f, ".tl"),
            Field::Fst => write!(f, ".fst"),
            Field::Snd => write!(f, ".snd"),
            Field::Index(_) => write!(f, "[..]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub position: Span,
    pub ty: Option<Type>,
}

/// `[]`. Element types are only ever introduced through `:`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyList {
    pub position: Span,
    pub ty: Option<Type>,
}

/// `[a..b]`
#[derive(Debug, Clone, PartialEq)]
pub struct ListRange {
    pub from: Box<Expr>,
    pub to: Box<Expr>,
    pub position: Span,
    pub ty: Option<Type>,
}

/// Binary operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Cons,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Eq,
    NotEq,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinOpKind::Cons => ":",
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::Lt => "<",
            BinOpKind::Gt => ">",
            BinOpKind::LtEq => "<=",
            BinOpKind::GtEq => ">=",
            BinOpKind::And => "&&",
            BinOpKind::Or => "||",
            BinOpKind::Eq => "==",
            BinOpKind::NotEq => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// Unary operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Not,
    Neg,
}

impl fmt::Display for UnaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOpKind::Not => write!(f, "!"),
            UnaryOpKind::Neg => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: BinOpKind,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub position: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOpKind,
    pub operand: Box<Expr>,
    pub position: Span,
    pub ty: Option<Type>,
}

/// A call to a named top-level function.
///
/// `ty` receives the instantiated function type at this call site
/// (argument types and return type), which code generation uses to pick a
/// specialization. `deferred` is stamped by the typer when the callee has
/// not been declared yet at the time the call is seen.
#[derive(Debug, Clone, PartialEq)]
pub struct FunCall {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub position: Span,
    pub ty: Option<Type>,
    pub deferred: Option<DeferredId>,
}

impl Expr {
    pub fn position(&self) -> Span {
        match self {
            Expr::Int(i) => i.position,
            Expr::Bool(b) => b.position,
            Expr::Char(c) => c.position,
            Expr::Variable(v) => v.position,
            Expr::Tuple(t) => t.position,
            Expr::EmptyList(l) => l.position,
            Expr::Range(r) => r.position,
            Expr::BinaryOp(b) => b.position,
            Expr::UnaryOp(u) => u.position,
            Expr::Call(c) => c.position,
        }
    }

    /// The type stored on this node. For calls this is the return type, not
    /// the instantiated function type.
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Expr::Int(i) => i.ty.as_ref(),
            Expr::Bool(b) => b.ty.as_ref(),
            Expr::Char(c) => c.ty.as_ref(),
            Expr::Variable(v) => v.ty.as_ref(),
            Expr::Tuple(t) => t.ty.as_ref(),
            Expr::EmptyList(l) => l.ty.as_ref(),
            Expr::Range(r) => r.ty.as_ref(),
            Expr::BinaryOp(b) => b.ty.as_ref(),
            Expr::UnaryOp(u) => u.ty.as_ref(),
            Expr::Call(c) => match &c.ty {
                Some(Type::Function(_, ret)) => Some(ret.as_ref()),
                other => other.as_ref(),
            },
        }
    }
}
