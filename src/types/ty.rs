use std::fmt;

/// A type variable. Two variables are the same variable iff their ids match;
/// ids come from a counter owned by the [`Typer`](super::infer::Typer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar(pub u64);

impl TypeVar {
    pub fn new(id: u64) -> Self {
        TypeVar(id)
    }
}

/// What the function namespace binds: parameter types and a return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Signature { params, ret }
    }

    pub fn to_type(&self) -> Type {
        Type::function(self.params.clone(), self.ret.clone())
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'t{}", self.0)
    }
}

/// A monotype. There are no quantifiers; sharing a [`TypeVar`] between
/// positions is the only form of polymorphism.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Char,
    Void,
    List(Box<Type>),
    Tuple(Box<Type>, Box<Type>),
    Function(Vec<Type>, Box<Type>),
    Var(TypeVar),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn tuple(left: Type, right: Type) -> Self {
        Type::Tuple(Box::new(left), Box::new(right))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(params, Box::new(ret))
    }

    pub fn var(id: u64) -> Self {
        Type::Var(TypeVar(id))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(_))
    }

    /// Whether `other` occurs anywhere inside `self`, including `self` itself.
    pub fn contains(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match self {
            Type::Int | Type::Bool | Type::Char | Type::Void | Type::Var(_) => false,
            Type::List(element) => element.contains(other),
            Type::Tuple(left, right) => left.contains(other) || right.contains(other),
            Type::Function(params, ret) => {
                params.iter().any(|param| param.contains(other)) || ret.contains(other)
            }
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Type::Int => "Int".to_string(),
            Type::Bool => "Bool".to_string(),
            Type::Char => "Char".to_string(),
            Type::Void => "Void".to_string(),
            Type::Var(v) => v.to_string(),
            Type::List(element) => format!("[{}]", element.pretty()),
            Type::Tuple(left, right) => format!("({}, {})", left.pretty(), right.pretty()),
            Type::Function(params, ret) => {
                let params = params
                    .iter()
                    .map(|param| param.pretty())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({}) -> {}", params, ret.pretty())
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}
