use std::fmt;

use log::trace;

use super::subst::{Flow, Substitution};
use super::ty::Type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    Mismatch { left: Type, right: Type },
    Arity { expected: usize, found: usize },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnifyError::Mismatch { left, right } => {
                write!(f, "cannot unify {} with {}", left.pretty(), right.pretty())
            }
            UnifyError::Arity { expected, found } => {
                write!(f, "expected {} parameters, found {}", expected, found)
            }
        }
    }
}

/// Unify two types, finding a substitution that makes them equal.
///
/// Cases are tried in this order:
///
/// ```text
/// unify(t, t)                          = ∅
/// unify('a, t)     if t does not contain 'a = ['a := t]     (Local when flow is Local)
/// unify(t, 'a)     if t does not contain 'a = ['a := t]
/// unify([a], [b])                      = unify(a, b)
/// unify((a, b), (c, d))                = S1 ++ unify(S1 b, S1 d)   where S1 = unify(a, c)
/// unify((p..) -> r, (q..) -> s)        = pairwise over params, then the returns
/// anything else                        = Mismatch
/// ```
///
/// The occurs check is a containment test on the types as given. Callers are
/// expected to pass types with every known binding already applied.
///
/// `flow` tags bindings of a variable on the *left* side. Call sites pass
/// `Flow::Local` with the argument type on the left and the declared
/// parameter type on the right, so that generic parameter information flowing
/// into the argument stays local to that call while the argument
/// concretizing the parameter is returned as a normal, global binding.
///
/// A failure anywhere inside a compound type fails the whole unification.
pub fn unify(t1: &Type, t2: &Type, flow: Flow) -> Result<Substitution, UnifyError> {
    trace!("unify {} ~ {}", t1, t2);

    if t1 == t2 {
        return Ok(Substitution::empty());
    }

    match (t1, t2) {
        (Type::Var(v), t) if !t.contains(t1) => {
            let mut subst = Substitution::empty();
            subst.push(*v, t.clone(), flow);
            Ok(subst)
        }
        (t, Type::Var(v)) if !t.contains(t2) => {
            let mut subst = Substitution::empty();
            subst.push(*v, t.clone(), Flow::Global);
            Ok(subst)
        }
        (Type::List(a), Type::List(b)) => unify(a, b, flow),
        (Type::Tuple(a, b), Type::Tuple(c, d)) => {
            let s1 = unify(a, c, flow)?;
            let s2 = unify(&s1.apply(b), &s1.apply(d), flow)?;
            Ok(s1.then(s2))
        }
        (Type::Function(params1, ret1), Type::Function(params2, ret2)) => {
            if params1.len() != params2.len() {
                return Err(UnifyError::Arity {
                    expected: params2.len(),
                    found: params1.len(),
                });
            }

            let mut subst = Substitution::empty();
            for (p1, p2) in params1.iter().zip(params2) {
                let s = unify(&subst.apply(p1), &subst.apply(p2), flow)?;
                subst.extend(s);
            }
            let s = unify(&subst.apply(ret1), &subst.apply(ret2), flow)?;
            subst.extend(s);
            Ok(subst)
        }
        _ => Err(UnifyError::Mismatch {
            left: t1.clone(),
            right: t2.clone(),
        }),
    }
}
