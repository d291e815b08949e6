use super::ty::{Type, TypeVar};

/// Which way a binding flowed during call-site unification.
///
/// `Local` bindings came from a function's declared parameter type flowing
/// into the call site; they only matter for the rest of that one call.
/// Everything else is `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Global,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub var: TypeVar,
    pub ty: Type,
    pub flow: Flow,
}

/// Bindings in order of discovery. Not deduplicated.
///
/// Applying a substitution behaves like applying each binding in turn: a
/// variable is replaced by the first binding that names it, and only the
/// bindings after that one are applied to the replacement. Applying
/// `s1 ++ s2` is therefore the same as applying `s1` and then `s2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution(pub Vec<Binding>);

impl Substitution {
    pub fn empty() -> Self {
        Substitution(Vec::new())
    }

    pub fn singleton(var: TypeVar, ty: Type) -> Self {
        Substitution(vec![Binding {
            var,
            ty,
            flow: Flow::Global,
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, var: TypeVar, ty: Type, flow: Flow) {
        self.0.push(Binding { var, ty, flow });
    }

    /// Concatenate `other` after `self`.
    pub fn extend(&mut self, other: Substitution) {
        self.0.extend(other.0);
    }

    pub fn then(mut self, other: Substitution) -> Substitution {
        self.extend(other);
        self
    }

    pub fn apply(&self, ty: &Type) -> Type {
        self.apply_from(ty, 0)
    }

    fn apply_from(&self, ty: &Type, from: usize) -> Type {
        match ty {
            Type::Int | Type::Bool | Type::Char | Type::Void => ty.clone(),
            Type::Var(v) => {
                let found = self.0[from..]
                    .iter()
                    .position(|binding| binding.var == *v)
                    .map(|offset| from + offset);
                match found {
                    Some(index) => self.apply_from(&self.0[index].ty, index + 1),
                    None => ty.clone(),
                }
            }
            Type::List(element) => Type::list(self.apply_from(element, from)),
            Type::Tuple(left, right) => {
                Type::tuple(self.apply_from(left, from), self.apply_from(right, from))
            }
            Type::Function(params, ret) => Type::function(
                params
                    .iter()
                    .map(|param| self.apply_from(param, from))
                    .collect(),
                self.apply_from(ret, from),
            ),
        }
    }

    /// Separate globally visible bindings from call-local ones, keeping order.
    pub fn split_flow(self) -> (Substitution, Substitution) {
        let (global, local): (Vec<_>, Vec<_>) = self
            .0
            .into_iter()
            .partition(|binding| binding.flow == Flow::Global);
        (Substitution(global), Substitution(local))
    }
}
