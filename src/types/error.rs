//! # Type Error Definitions
//!
//! Everything the typer can report. Errors are collected, not thrown: the
//! typer records one of these and carries on with an empty substitution so
//! that sibling subtrees still get checked in the same run.
//!
//! ## Error Factories
//!
//! A failed unification does not know *why* it was attempted. Each call site
//! in the typer hands [`unify`](super::unify::unify)'s error to an
//! [`ErrorFactory`] that knows the site (an `if` condition, an operand of `+`,
//! the third argument of `f`, ...) and builds the contextual message.
//!
//! ## Example Error Messages
//!
//! ```text
//! error: condition of `if` must be Bool: cannot unify Int with Bool
//! error: call to undefined function `g`
//! error: `f` declares (a, b) -> a but its body infers ('t0, 't1) -> 't1
//! ```

use thiserror::Error;

use super::ty::Type;
use super::unify::UnifyError;
use crate::ast::{BinOpKind, Span, UnaryOpKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Two types that had to be equal could not be unified.
    #[error("{site}: cannot unify {expected} with {found}")]
    Mismatch {
        site: MismatchSite,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("unknown variable `{name}`")]
    UndefinedVariable { name: String, span: Span },

    /// A deferred call whose callee was never declared.
    #[error("call to undefined function `{name}`")]
    UndefinedFunction { name: String, span: Span },

    #[error("{kind} `{name}` is already defined")]
    Redefinition {
        kind: Redefinition,
        name: String,
        span: Span,
    },

    #[error("{site} `{name}` expects {expected} argument(s) but {found} were given")]
    ArityMismatch {
        site: AritySite,
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{site}: Void is not a value")]
    VoidMisuse { site: VoidSite, span: Span },

    /// The declared signature shares type variables differently from what the
    /// body actually allows.
    #[error(
        "`{name}` declares {declared} but its body infers {inferred}: type variables are not used consistently"
    )]
    PolymorphismInconsistency {
        name: String,
        declared: Type,
        inferred: Type,
        span: Span,
    },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::UndefinedVariable { span, .. }
            | TypeError::UndefinedFunction { span, .. }
            | TypeError::Redefinition { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::VoidMisuse { span, .. }
            | TypeError::PolymorphismInconsistency { span, .. } => *span,
        }
    }

    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        TypeError::UndefinedVariable {
            name: name.into(),
            span,
        }
    }

    pub fn undefined_function(name: impl Into<String>, span: Span) -> Self {
        TypeError::UndefinedFunction {
            name: name.into(),
            span,
        }
    }

    pub fn redefinition(kind: Redefinition, name: impl Into<String>, span: Span) -> Self {
        TypeError::Redefinition {
            kind,
            name: name.into(),
            span,
        }
    }

    pub fn void_misuse(site: VoidSite, span: Span) -> Self {
        TypeError::VoidMisuse { site, span }
    }
}

/// Where a unification was attempted; drives the message of a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MismatchSite {
    #[error("type mismatch")]
    General,
    #[error("operand of `{0}` has the wrong type")]
    BinaryOperator(BinOpKind),
    #[error("operand of `{0}` has the wrong type")]
    UnaryOperator(UnaryOpKind),
    #[error("condition of `if` must be Bool")]
    IfCondition,
    #[error("condition of `while` must be Bool")]
    WhileCondition,
    #[error("`for` must iterate over a list")]
    ForIterable,
    #[error("returned value does not match the return type")]
    Return,
    #[error("signature of `{0}` does not match its definition")]
    FunctionSignature(String),
    #[error("field `{field}` cannot be applied to `{variable}`")]
    FieldAccess { variable: String, field: String },
    #[error("list index must be Int")]
    Index,
    #[error("bounds of a list range must be Int or Char")]
    ListRange,
    #[error("initializer of `{0}` does not match its declaration")]
    VariableDeclaration(String),
    #[error("value assigned to `{0}` does not match its type")]
    VariableAssignment(String),
    #[error("argument {index} of `{function}` has the wrong type")]
    Argument { function: String, index: usize },
    #[error("result of `{0}` used at the wrong type")]
    CallResult(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Redefinition {
    #[error("variable")]
    Variable,
    #[error("function")]
    Function,
    #[error("loop variable")]
    LoopVariable,
    #[error("argument")]
    Argument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AritySite {
    #[error("function")]
    Call,
    #[error("signature of")]
    Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoidSite {
    #[error("cannot assign Void to `{0}`")]
    Assignment(String),
    #[error("cannot initialize `{0}` with Void")]
    Declaration(String),
    #[error("tuple component cannot be Void")]
    TupleComponent,
    #[error("operand of `{0}` cannot be Void")]
    Operand(BinOpKind),
    #[error("argument {index} of `{function}` cannot be Void")]
    Argument { function: String, index: usize },
    #[error("cannot return Void")]
    Return,
}

/// Turns a [`UnifyError`] into a located, contextual [`TypeError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFactory {
    pub site: MismatchSite,
    pub span: Span,
    /// Function name reported for arity errors.
    pub subject: String,
}

impl ErrorFactory {
    pub fn new(site: MismatchSite, span: Span) -> Self {
        Self {
            site,
            span,
            subject: String::new(),
        }
    }

    pub fn signature(name: &str, span: Span) -> Self {
        Self {
            site: MismatchSite::FunctionSignature(name.to_string()),
            span,
            subject: name.to_string(),
        }
    }

    /// `left` is the side the typer expected, `right` the one it found.
    pub fn build(&self, err: UnifyError) -> TypeError {
        match err {
            UnifyError::Mismatch { left, right } => TypeError::Mismatch {
                site: self.site.clone(),
                expected: left,
                found: right,
                span: self.span,
            },
            UnifyError::Arity { expected, found } => TypeError::ArityMismatch {
                site: AritySite::Signature,
                name: self.subject.clone(),
                expected,
                found,
                span: self.span,
            },
        }
    }
}
