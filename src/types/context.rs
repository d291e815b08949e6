use std::collections::HashMap;

use super::subst::Substitution;
use super::ty::{Signature, Type};

/// Names in scope and their current types, in two namespaces.
///
/// A context is cloned before typing a branch (`if`/`while`/`for` bodies,
/// tuple sides). Mutations inside the clone never reach the original; the
/// only thing that flows back is the branch's substitution, applied to the
/// pre-branch copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub vars: HashMap<String, Type>,
    pub funs: HashMap<String, Signature>,
}

impl Context {
    pub fn empty() -> Self {
        Context::default()
    }

    pub fn lookup_var(&self, name: &str) -> Option<&Type> {
        self.vars.get(name)
    }

    pub fn lookup_fun(&self, name: &str) -> Option<&Signature> {
        self.funs.get(name)
    }

    pub fn bind_var(&mut self, name: impl Into<String>, ty: Type) {
        self.vars.insert(name.into(), ty);
    }

    pub fn bind_fun(&mut self, name: impl Into<String>, signature: Signature) {
        self.funs.insert(name.into(), signature);
    }

    /// Rewrite every bound type in place.
    pub fn apply(&mut self, subst: &Substitution) {
        if subst.is_empty() {
            return;
        }
        for ty in self.vars.values_mut() {
            *ty = subst.apply(ty);
        }
        for signature in self.funs.values_mut() {
            for param in signature.params.iter_mut() {
                *param = subst.apply(param);
            }
            signature.ret = subst.apply(&signature.ret);
        }
    }

    pub fn apply_subst(&self, subst: &Substitution) -> Context {
        let mut ctx = self.clone();
        ctx.apply(subst);
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeVar;

    #[test]
    fn test_empty_context() {
        let ctx = Context::empty();
        assert!(ctx.lookup_var("x").is_none());
        assert!(ctx.lookup_fun("f").is_none());
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut ctx = Context::empty();
        ctx.bind_var("x", Type::Int);
        assert!(ctx.lookup_fun("x").is_none());
        ctx.bind_fun("x", Signature::new(vec![], Type::Void));
        assert_eq!(ctx.lookup_var("x"), Some(&Type::Int));
    }

    #[test]
    fn test_apply_rewrites_both_maps() {
        let var = TypeVar::new(0);
        let mut ctx = Context::empty();
        ctx.bind_var("xs", Type::list(Type::Var(var)));
        ctx.bind_fun("f", Signature::new(vec![Type::Var(var)], Type::Var(var)));

        ctx.apply(&Substitution::singleton(var, Type::Char));
        assert_eq!(ctx.lookup_var("xs"), Some(&Type::list(Type::Char)));
        assert_eq!(
            ctx.lookup_fun("f"),
            Some(&Signature::new(vec![Type::Char], Type::Char))
        );
    }

    #[test]
    fn test_branch_copy_is_isolated() {
        let mut outer = Context::empty();
        outer.bind_var("x", Type::Int);

        let mut branch = outer.clone();
        branch.bind_var("i", Type::Int);
        branch.bind_var("x", Type::Bool);

        assert!(outer.lookup_var("i").is_none());
        assert_eq!(outer.lookup_var("x"), Some(&Type::Int));
    }

    #[test]
    fn test_apply_subst_leaves_original() {
        let var = TypeVar::new(0);
        let mut ctx = Context::empty();
        ctx.bind_var("x", Type::Var(var));

        let narrowed = ctx.apply_subst(&Substitution::singleton(var, Type::Bool));
        assert_eq!(narrowed.lookup_var("x"), Some(&Type::Bool));
        assert_eq!(ctx.lookup_var("x"), Some(&Type::Var(var)));
    }
}
