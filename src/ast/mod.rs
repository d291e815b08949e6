//! # SPL Abstract Syntax Tree
//!
//! The tree handed to the type checker by the parser. Parsing itself lives
//! outside this crate; these types are the contract between the two.
//!
//! Every node that denotes a value (or a declared signature) carries a
//! `ty: Option<Type>` slot. The parser leaves it `None`; the typer fills it
//! exactly once, either with a concrete type or a still-unresolved type
//! variable.
//!
//! ## Example
//!
//! ```text
//! f(n) :: Int -> Int {
//!     return n + 1;
//! }
//!
//! main() {
//!     var x = f(5);
//! }
//! ```
//!
//! parses to a [`Program`] with two [`Decl::Fun`] entries; `main` has one
//! local [`VarDecl`] whose value is an [`Expr::Call`].

pub mod annotation;
pub mod expression;
pub mod statement;

pub use annotation::{FunSignature, TypeAnnotation};
pub use expression::{BinOpKind, Expr, Field, FunCall, UnaryOpKind, Variable};
pub use statement::Stmt;

use crate::types::Type;

/// A 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Source range of a node. `end` is exclusive in its column.
///
/// The default span (line 0) means "no location"; diagnostics for such spans
/// are rendered without a source excerpt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_unknown(&self) -> bool {
        self.start.line == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub value: String,
    pub position: Span,
}

impl Ident {
    pub fn new(value: impl Into<String>, position: Span) -> Self {
        Self {
            value: value.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Fun(FunDecl),
}

/// `var x = e;` (no annotation) or `[Int] x = e;`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub annotation: Option<TypeAnnotation>,
    pub name: Ident,
    pub value: Expr,
    pub position: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: Ident,
    pub args: Vec<Ident>,
    pub signature: Option<FunSignature>,
    pub var_decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
    pub position: Span,
    pub ty: Option<Type>,
}

impl Program {
    pub fn fun_decl(&self, name: &str) -> Option<&FunDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Fun(fun) if fun.name.value == name => Some(fun),
            _ => None,
        })
    }

    pub fn var_decl(&self, name: &str) -> Option<&VarDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Var(var) if var.name.value == name => Some(var),
            _ => None,
        })
    }
}

impl FunDecl {
    pub fn local(&self, name: &str) -> Option<&VarDecl> {
        self.var_decls.iter().find(|decl| decl.name.value == name)
    }
}
