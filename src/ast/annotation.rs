use std::fmt;

use super::Span;

/// A type as written by the programmer.
///
/// `Var` holds a source-level type variable name such as `a`; the typer maps
/// every mention of the same name within one declaration to a single
/// type variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    Int,
    Bool,
    Char,
    Void,
    List(Box<TypeAnnotation>),
    Tuple(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Var(String),
}

impl TypeAnnotation {
    pub fn list(element: TypeAnnotation) -> Self {
        TypeAnnotation::List(Box::new(element))
    }

    pub fn tuple(left: TypeAnnotation, right: TypeAnnotation) -> Self {
        TypeAnnotation::Tuple(Box::new(left), Box::new(right))
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeAnnotation::Var(name.into())
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeAnnotation::Int => write!(f, "Int"),
            TypeAnnotation::Bool => write!(f, "Bool"),
            TypeAnnotation::Char => write!(f, "Char"),
            TypeAnnotation::Void => write!(f, "Void"),
            TypeAnnotation::List(element) => write!(f, "[{}]", element),
            TypeAnnotation::Tuple(left, right) => write!(f, "({}, {})", left, right),
            TypeAnnotation::Var(name) => write!(f, "{}", name),
        }
    }
}

/// `:: Int Bool -> Int`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunSignature {
    pub params: Vec<TypeAnnotation>,
    pub ret: TypeAnnotation,
    pub position: Span,
}

impl FunSignature {
    pub fn new(params: Vec<TypeAnnotation>, ret: TypeAnnotation) -> Self {
        Self {
            params,
            ret,
            position: Span::default(),
        }
    }
}

impl fmt::Display for FunSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for param in &self.params {
            write!(f, "{} ", param)?;
        }
        write!(f, "-> {}", self.ret)
    }
}
