use super::expression::{Expr, FunCall, Variable};
use super::{Ident, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    If(If),
    While(While),
    For(For),
    Assign(Assign),
    /// A bare call whose result, if any, is discarded.
    Call(FunCall),
    Return(Return),
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Vec<Stmt>,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub position: Span,
}

/// `for x in xs { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub var: Ident,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub position: Span,
}

/// `target = value;` where the target may carry a field/index chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Variable,
    pub value: Expr,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expr>,
    pub position: Span,
}

impl Stmt {
    pub fn position(&self) -> Span {
        match self {
            Stmt::If(s) => s.position,
            Stmt::While(s) => s.position,
            Stmt::For(s) => s.position,
            Stmt::Assign(s) => s.position,
            Stmt::Call(s) => s.position,
            Stmt::Return(s) => s.position,
        }
    }
}
