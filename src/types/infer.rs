use std::collections::{HashMap, HashSet};

use log::debug;

use super::context::Context;
use super::deferred::{DeferredCalls, DeferredId, VoidGuard};
use super::error::{AritySite, ErrorFactory, MismatchSite, Redefinition, TypeError, VoidSite};
use super::names::TypeVarNameCache;
use super::subst::{Flow, Substitution};
use super::ty::{Signature, Type, TypeVar};
use super::unify::{UnifyError, unify};
use crate::ast::expression::{BinaryOp, EmptyList, ListRange, Tuple as TupleExpr, UnaryOp};
use crate::ast::statement::{Assign, For, If, Return, While};
use crate::ast::{
    BinOpKind, Decl, Expr, Field, FunCall, FunDecl, FunSignature, Program, Span, Stmt,
    TypeAnnotation, UnaryOpKind, VarDecl, Variable,
};
use crate::diagnostics::Diagnostics;

/// The recursive typer.
///
/// Each `infer_*` method takes a node, the context it is typed in, and the
/// type the surrounding construct expects of it. It records the node's type on
/// the node, reports problems into its [`Diagnostics`], and returns the
/// substitution it discovered. Callers apply that substitution to their own
/// context and expected types before moving on.
///
/// Errors never stop the traversal: the failing node contributes an empty
/// substitution and typing continues with its siblings.
///
/// All state is per run. A fresh `Typer` starts its type variable counter and
/// name cache from scratch, so independent programs can be checked side by
/// side.
///
/// The typer recurses once per level of AST nesting. The parser bounds
/// nesting depth; a tree deep enough to exhaust the stack has to be rejected
/// before it gets here.
#[derive(Debug, Default)]
pub struct Typer {
    next_var: u64,
    names: TypeVarNameCache,
    deferred: DeferredCalls,
    resolved: HashMap<DeferredId, FunCall>,
    settled: Substitution,
    diagnostics: Diagnostics,
}

/// What a typing run leaves behind besides the annotated tree.
#[derive(Debug)]
pub struct TyperOutput {
    pub diagnostics: Diagnostics,
    pub resolved: HashMap<DeferredId, FunCall>,
}

impl Typer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_var(&mut self) -> TypeVar {
        let var = TypeVar::new(self.next_var);
        self.next_var += 1;
        var
    }

    pub fn fresh(&mut self) -> Type {
        Type::Var(self.fresh_var())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn pending_calls(&self) -> usize {
        self.deferred.len()
    }

    /// Report every call still waiting on a callee. Run once the whole
    /// program has been typed.
    pub fn report_unresolved(&mut self) {
        for pending in self.deferred.drain_unresolved() {
            self.diagnostics.report(TypeError::undefined_function(
                pending.call.name.value,
                pending.call.position,
            ));
        }
    }

    pub fn finish(self) -> TyperOutput {
        TyperOutput {
            diagnostics: self.diagnostics,
            resolved: self.resolved,
        }
    }

    fn unify_reporting(
        &mut self,
        t1: &Type,
        t2: &Type,
        flow: Flow,
        factory: &ErrorFactory,
    ) -> Substitution {
        match unify(t1, t2, flow) {
            Ok(subst) => subst,
            Err(err) => {
                self.diagnostics.report(factory.build(err));
                Substitution::empty()
            }
        }
    }

    /// Unify what the context expects with what a node produced.
    fn constrain(
        &mut self,
        expected: &Type,
        found: &Type,
        site: &MismatchSite,
        span: Span,
    ) -> Substitution {
        let factory = ErrorFactory::new(site.clone(), span);
        self.unify_reporting(expected, found, Flow::Global, &factory)
    }

    /// Turn a source-level annotation into a monotype, sharing type variables
    /// by name through the current declaration's cache.
    pub fn monotype(&mut self, annotation: &TypeAnnotation) -> Type {
        match annotation {
            TypeAnnotation::Int => Type::Int,
            TypeAnnotation::Bool => Type::Bool,
            TypeAnnotation::Char => Type::Char,
            TypeAnnotation::Void => Type::Void,
            TypeAnnotation::List(element) => Type::list(self.monotype(element)),
            TypeAnnotation::Tuple(left, right) => {
                Type::tuple(self.monotype(left), self.monotype(right))
            }
            TypeAnnotation::Var(name) => match self.names.get(name) {
                Some(var) => Type::Var(var),
                None => {
                    let var = self.fresh_var();
                    self.names.bind(name, var);
                    Type::Var(var)
                }
            },
        }
    }

    fn signature_type(&mut self, signature: &FunSignature) -> Type {
        let params = signature
            .params
            .iter()
            .map(|param| self.monotype(param))
            .collect();
        let ret = self.monotype(&signature.ret);
        Type::function(params, ret)
    }

    /// Type a whole program. Global variables are typed before functions,
    /// whatever their order in the source, so function bodies can use globals
    /// declared anywhere.
    pub fn infer_program(&mut self, program: &mut Program, ctx: &mut Context) -> Substitution {
        let (vars, funs): (Vec<_>, Vec<_>) = program
            .decls
            .iter_mut()
            .partition(|decl| matches!(decl, Decl::Var(_)));

        for decl in vars.into_iter().chain(funs) {
            let expected = self.fresh();
            let subst = match decl {
                Decl::Var(var) => {
                    self.names.reset();
                    self.infer_var_decl(var, ctx, &expected)
                }
                Decl::Fun(fun) => self.infer_fun_decl(fun, ctx, &expected),
            };
            ctx.apply(&subst);
            self.settled.extend(subst);
        }

        self.settled.clone()
    }

    pub fn infer_var_decl(
        &mut self,
        decl: &mut VarDecl,
        ctx: &mut Context,
        expected: &Type,
    ) -> Substitution {
        let name = decl.name.value.clone();
        if ctx.lookup_var(&name).is_some() {
            self.diagnostics.report(TypeError::redefinition(
                Redefinition::Variable,
                name,
                decl.name.position,
            ));
            return Substitution::empty();
        }

        let declared = match &decl.annotation {
            Some(annotation) => self.monotype(annotation),
            None => self.fresh(),
        };

        let site = MismatchSite::VariableDeclaration(name.clone());
        let guard = VoidGuard::new(VoidSite::Declaration(name.clone()), decl.position);
        let mut subst = self.infer_guarded(&mut decl.value, ctx, &declared, &site, guard);
        let ty = subst.apply(&declared);
        if ty.contains(&Type::Void) {
            self.diagnostics.report(TypeError::void_misuse(
                VoidSite::Declaration(name),
                decl.position,
            ));
            return Substitution::empty();
        }

        let s = self.constrain(&subst.apply(expected), &ty, &MismatchSite::General, decl.position);
        subst.extend(s);

        let ty = subst.apply(&declared);
        ctx.bind_var(name, ty.clone());
        decl.ty = Some(ty);
        subst
    }

    pub fn infer_fun_decl(
        &mut self,
        decl: &mut FunDecl,
        ctx: &mut Context,
        expected: &Type,
    ) -> Substitution {
        // Before anything that can bail out, so names never leak between
        // declarations.
        self.names.reset();

        let name = decl.name.value.clone();
        debug!("Type-checking function `{}`", name);

        if ctx.lookup_fun(&name).is_some() {
            self.diagnostics.report(TypeError::redefinition(
                Redefinition::Function,
                name,
                decl.name.position,
            ));
            return Substitution::empty();
        }

        let mut seen = HashSet::new();
        for arg in &decl.args {
            if !seen.insert(arg.value.as_str()) {
                self.diagnostics.report(TypeError::redefinition(
                    Redefinition::Argument,
                    arg.value.clone(),
                    arg.position,
                ));
                return Substitution::empty();
            }
        }

        let arg_types: Vec<Type> = decl.args.iter().map(|_| self.fresh()).collect();
        let ret = self.fresh();
        let shape = Signature::new(arg_types, ret.clone());
        let fun_ty = shape.to_type();

        let outer_vars = ctx.vars.clone();
        let mut local = ctx.clone();
        for (arg, ty) in decl.args.iter().zip(&shape.params) {
            local.bind_var(arg.value.clone(), ty.clone());
        }
        // Bound before the body so the function can call itself.
        local.bind_fun(name.clone(), shape.clone());

        let mut subst = Substitution::empty();
        for var_decl in decl.var_decls.iter_mut() {
            let expected = self.fresh();
            let s = self.infer_var_decl(var_decl, &mut local, &expected);
            local.apply(&s);
            subst.extend(s);
        }

        let s = self.infer_block(&mut decl.stmts, &local, &subst.apply(&ret));
        local.apply(&s);
        subst.extend(s);

        let inferred = subst.apply(&fun_ty);
        let s = self.constrain(
            &subst.apply(expected),
            &inferred,
            &MismatchSite::General,
            decl.position,
        );
        local.apply(&s);
        subst.extend(s);

        if let Some(signature) = &decl.signature {
            let declared = self.signature_type(signature);
            let inferred = subst.apply(&fun_ty);
            if !sharing_is_consistent(&declared, &inferred) {
                self.diagnostics.report(TypeError::PolymorphismInconsistency {
                    name: name.clone(),
                    declared: declared.clone(),
                    inferred: inferred.clone(),
                    span: decl.name.position,
                });
            }

            let span = if signature.position.is_unknown() {
                decl.name.position
            } else {
                signature.position
            };
            let factory = ErrorFactory::signature(&name, span);
            let s = self.unify_reporting(&declared, &inferred, Flow::Global, &factory);
            local.apply(&s);
            subst.extend(s);
        }

        let final_signature = Signature::new(
            shape.params.iter().map(|param| subst.apply(param)).collect(),
            subst.apply(&shape.ret),
        );
        let final_ty = final_signature.to_type();
        debug!("`{}` : {}", name, final_ty);
        decl.ty = Some(final_ty);

        // Locals and arguments go out of scope; globals they shadowed come back.
        ctx.vars = outer_vars;
        ctx.apply(&subst);
        ctx.funs = local.funs;
        ctx.bind_fun(name.clone(), final_signature);

        for pending in self.deferred.take(&name) {
            debug!("Resolving deferred call to `{}`", name);
            let mut context = pending.context.apply_subst(&self.settled);
            context.apply(&subst);
            context.funs = ctx.funs.clone();
            let expected = subst.apply(&self.settled.apply(&pending.expected));

            let mut call = pending.call;
            let site = MismatchSite::CallResult(name.clone());
            let s = self.infer_call(&mut call, &context, &expected, &site);
            self.resolved.insert(pending.id, call);

            if let Some(guard) = pending.void_guard {
                if s.apply(&expected).contains(&Type::Void) {
                    self.diagnostics
                        .report(TypeError::void_misuse(guard.site, guard.span));
                    continue;
                }
            }
            ctx.apply(&s);
            subst.extend(s);
        }

        subst
    }

    /// Type statements in order, each seeing the narrowing of the ones
    /// before it.
    fn infer_block(&mut self, stmts: &mut [Stmt], ctx: &Context, expected: &Type) -> Substitution {
        let mut ctx = ctx.clone();
        let mut subst = Substitution::empty();
        for stmt in stmts {
            let s = self.infer_stmt(stmt, &ctx, &subst.apply(expected));
            ctx.apply(&s);
            subst.extend(s);
        }
        subst
    }

    /// `expected` is the return type of the enclosing function.
    pub fn infer_stmt(&mut self, stmt: &mut Stmt, ctx: &Context, expected: &Type) -> Substitution {
        match stmt {
            Stmt::If(stmt) => self.infer_if(stmt, ctx, expected),
            Stmt::While(stmt) => self.infer_while(stmt, ctx, expected),
            Stmt::For(stmt) => self.infer_for(stmt, ctx, expected),
            Stmt::Assign(stmt) => self.infer_assign(stmt, ctx),
            Stmt::Call(call) => {
                // A bare call's result is discarded and must not constrain
                // the function's return type.
                let discarded = self.fresh();
                let site = MismatchSite::CallResult(call.name.value.clone());
                self.infer_call(call, ctx, &discarded, &site)
            }
            Stmt::Return(stmt) => self.infer_return(stmt, ctx, expected),
        }
    }

    /// Both branches first, the condition last, so the condition benefits
    /// from whatever the branches found out.
    fn infer_if(&mut self, stmt: &mut If, ctx: &Context, expected: &Type) -> Substitution {
        let mut subst = self.infer_block(&mut stmt.then_body, ctx, expected);

        let else_ctx = ctx.apply_subst(&subst);
        let s = self.infer_block(&mut stmt.else_body, &else_ctx, &subst.apply(expected));
        subst.extend(s);

        let merged = ctx.apply_subst(&subst);
        let s = self.infer_expr(
            &mut stmt.condition,
            &merged,
            &Type::Bool,
            &MismatchSite::IfCondition,
        );
        subst.extend(s);
        subst
    }

    fn infer_while(&mut self, stmt: &mut While, ctx: &Context, expected: &Type) -> Substitution {
        let mut subst = self.infer_block(&mut stmt.body, ctx, expected);

        let narrowed = ctx.apply_subst(&subst);
        let s = self.infer_expr(
            &mut stmt.condition,
            &narrowed,
            &Type::Bool,
            &MismatchSite::WhileCondition,
        );
        subst.extend(s);
        subst
    }

    fn infer_for(&mut self, stmt: &mut For, ctx: &Context, expected: &Type) -> Substitution {
        let element = self.fresh();
        let mut subst = self.infer_expr(
            &mut stmt.iterable,
            ctx,
            &Type::list(element.clone()),
            &MismatchSite::ForIterable,
        );

        let mut body_ctx = ctx.apply_subst(&subst);
        let name = &stmt.var.value;
        if body_ctx.lookup_var(name).is_some() {
            self.diagnostics.report(TypeError::redefinition(
                Redefinition::LoopVariable,
                name.clone(),
                stmt.var.position,
            ));
            return subst;
        }

        // The loop variable only lives in the body's copy of the context.
        body_ctx.bind_var(name.clone(), subst.apply(&element));
        let s = self.infer_block(&mut stmt.body, &body_ctx, &subst.apply(expected));
        subst.extend(s);
        subst
    }

    fn infer_assign(&mut self, stmt: &mut Assign, ctx: &Context) -> Substitution {
        let name = stmt.target.name.value.clone();
        let site = MismatchSite::VariableAssignment(name.clone());

        let value_ty = self.fresh();
        let guard = VoidGuard::new(VoidSite::Assignment(name.clone()), stmt.position);
        let mut subst =
            self.infer_guarded(&mut stmt.value, ctx, &value_ty, &MismatchSite::General, guard);

        let target_ty = self.fresh();
        let target_ctx = ctx.apply_subst(&subst);
        let s = self.infer_variable(&mut stmt.target, &target_ctx, &target_ty, &site);
        subst.extend(s);

        let value_ty = subst.apply(&value_ty);
        let target_ty = subst.apply(&target_ty);
        if value_ty.contains(&Type::Void) || target_ty.contains(&Type::Void) {
            self.diagnostics
                .report(TypeError::void_misuse(VoidSite::Assignment(name), stmt.position));
            return Substitution::empty();
        }

        let s = self.constrain(&target_ty, &value_ty, &site, stmt.position);
        subst.extend(s);
        subst
    }

    fn infer_return(&mut self, stmt: &mut Return, ctx: &Context, expected: &Type) -> Substitution {
        match &mut stmt.value {
            Some(value) => {
                // Typed on its own first: a Void value is a misuse, while a
                // value in a Void function is a plain mismatch.
                let found = self.fresh();
                let guard = VoidGuard::new(VoidSite::Return, stmt.position);
                let mut subst =
                    self.infer_guarded(value, ctx, &found, &MismatchSite::General, guard);
                let found = subst.apply(&found);
                if found.contains(&Type::Void) {
                    self.diagnostics
                        .report(TypeError::void_misuse(VoidSite::Return, stmt.position));
                    return Substitution::empty();
                }

                let s = self.constrain(
                    &subst.apply(expected),
                    &found,
                    &MismatchSite::Return,
                    stmt.position,
                );
                subst.extend(s);
                subst
            }
            None => self.constrain(expected, &Type::Void, &MismatchSite::Return, stmt.position),
        }
    }

    /// `site` describes the constraint between this expression and
    /// `expected`; mismatches inside sub-expressions use their own sites.
    pub fn infer_expr(
        &mut self,
        expr: &mut Expr,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        match expr {
            Expr::Int(lit) => {
                lit.ty = Some(Type::Int);
                self.constrain(expected, &Type::Int, site, lit.position)
            }
            Expr::Bool(lit) => {
                lit.ty = Some(Type::Bool);
                self.constrain(expected, &Type::Bool, site, lit.position)
            }
            Expr::Char(lit) => {
                lit.ty = Some(Type::Char);
                self.constrain(expected, &Type::Char, site, lit.position)
            }
            Expr::Variable(var) => self.infer_variable(var, ctx, expected, site),
            Expr::Tuple(tuple) => self.infer_tuple(tuple, ctx, expected, site),
            Expr::EmptyList(list) => self.infer_empty_list(list, expected, site),
            Expr::Range(range) => self.infer_range(range, ctx, expected, site),
            Expr::BinaryOp(binop) => self.infer_binop(binop, ctx, expected, site),
            Expr::UnaryOp(unop) => self.infer_unop(unop, ctx, expected, site),
            Expr::Call(call) => self.infer_call(call, ctx, expected, site),
        }
    }

    /// [`Typer::infer_expr`] for a position that must not hold Void. Callers
    /// still check the result themselves; `guard` only matters for a call
    /// that has to wait for its callee, which checks it once resolved.
    fn infer_guarded(
        &mut self,
        expr: &mut Expr,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
        guard: VoidGuard,
    ) -> Substitution {
        match expr {
            Expr::Call(call) => self.infer_call_guarded(call, ctx, expected, site, Some(guard)),
            _ => self.infer_expr(expr, ctx, expected, site),
        }
    }

    /// A variable and its field chain, walked left to right. Each step
    /// requires the current type to have the field's shape and narrows to the
    /// selected component.
    fn infer_variable(
        &mut self,
        var: &mut Variable,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let name = var.name.value.clone();
        let Some(base) = ctx.lookup_var(&name) else {
            self.diagnostics
                .report(TypeError::undefined_variable(name, var.name.position));
            return Substitution::empty();
        };

        let mut subst = Substitution::empty();
        let mut current = base.clone();

        for field in var.fields.iter_mut() {
            let field_site = MismatchSite::FieldAccess {
                variable: name.clone(),
                field: field.to_string(),
            };
            match field {
                Field::Hd | Field::Tl => {
                    let element = self.fresh();
                    let shape = Type::list(element.clone());
                    let s = self.constrain(&shape, &current, &field_site, var.position);
                    subst.extend(s);
                    current = match field {
                        Field::Hd => subst.apply(&element),
                        _ => subst.apply(&shape),
                    };
                }
                Field::Fst | Field::Snd => {
                    let left = self.fresh();
                    let right = self.fresh();
                    let shape = Type::tuple(left.clone(), right.clone());
                    let s = self.constrain(&shape, &current, &field_site, var.position);
                    subst.extend(s);
                    current = match field {
                        Field::Fst => subst.apply(&left),
                        _ => subst.apply(&right),
                    };
                }
                Field::Index(index) => {
                    let element = self.fresh();
                    let shape = Type::list(element.clone());
                    let s = self.constrain(&shape, &current, &field_site, var.position);
                    subst.extend(s);

                    let index_ctx = ctx.apply_subst(&subst);
                    let s = self.infer_expr(index, &index_ctx, &Type::Int, &MismatchSite::Index);
                    subst.extend(s);
                    current = subst.apply(&element);
                }
            }
        }

        let s = self.constrain(&subst.apply(expected), &current, site, var.position);
        subst.extend(s);
        var.ty = Some(subst.apply(&current));
        subst
    }

    fn infer_tuple(
        &mut self,
        tuple: &mut TupleExpr,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let left = self.fresh();
        let right = self.fresh();

        let guard = VoidGuard::new(VoidSite::TupleComponent, tuple.position);
        let mut subst = self.infer_guarded(
            &mut tuple.left,
            ctx,
            &left,
            &MismatchSite::General,
            guard.clone(),
        );
        let right_ctx = ctx.apply_subst(&subst);
        let s = self.infer_guarded(
            &mut tuple.right,
            &right_ctx,
            &right,
            &MismatchSite::General,
            guard,
        );
        subst.extend(s);

        let left = subst.apply(&left);
        let right = subst.apply(&right);
        if left.contains(&Type::Void) || right.contains(&Type::Void) {
            self.diagnostics
                .report(TypeError::void_misuse(VoidSite::TupleComponent, tuple.position));
            return Substitution::empty();
        }

        let ty = Type::tuple(left, right);
        let s = self.constrain(&subst.apply(expected), &ty, site, tuple.position);
        subst.extend(s);
        tuple.ty = Some(subst.apply(&ty));
        subst
    }

    fn infer_empty_list(
        &mut self,
        list: &mut EmptyList,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let ty = Type::list(self.fresh());
        let subst = self.constrain(expected, &ty, site, list.position);
        list.ty = Some(subst.apply(&ty));
        subst
    }

    /// `[a..b]` over Int or Char.
    fn infer_range(
        &mut self,
        range: &mut ListRange,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let from = self.fresh();
        let mut subst = self.infer_expr(&mut range.from, ctx, &from, &MismatchSite::ListRange);

        let bound = match subst.apply(&from) {
            ty @ (Type::Int | Type::Char) => ty,
            Type::Var(var) => {
                subst.push(var, Type::Int, Flow::Global);
                Type::Int
            }
            other => {
                self.diagnostics.report(TypeError::Mismatch {
                    site: MismatchSite::ListRange,
                    expected: Type::Int,
                    found: other,
                    span: range.from.position(),
                });
                Type::Int
            }
        };

        let to_ctx = ctx.apply_subst(&subst);
        let s = self.infer_expr(&mut range.to, &to_ctx, &bound, &MismatchSite::ListRange);
        subst.extend(s);

        let ty = Type::list(bound);
        let s = self.constrain(&subst.apply(expected), &ty, site, range.position);
        subst.extend(s);
        range.ty = Some(ty);
        subst
    }

    /// Operand and result types for each binary operator.
    fn operator_signature(&mut self, op: BinOpKind) -> (Type, Type, Type) {
        match op {
            BinOpKind::Cons => {
                let element = self.fresh();
                let list = Type::list(element.clone());
                (element, list.clone(), list)
            }
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div | BinOpKind::Mod => {
                (Type::Int, Type::Int, Type::Int)
            }
            BinOpKind::Lt | BinOpKind::Gt | BinOpKind::LtEq | BinOpKind::GtEq => {
                (Type::Int, Type::Int, Type::Bool)
            }
            BinOpKind::And | BinOpKind::Or => (Type::Bool, Type::Bool, Type::Bool),
            BinOpKind::Eq | BinOpKind::NotEq => {
                let operand = self.fresh();
                (operand.clone(), operand, Type::Bool)
            }
        }
    }

    fn infer_binop(
        &mut self,
        binop: &mut BinaryOp,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let (left, right, result) = self.operator_signature(binop.op);
        let operand_site = MismatchSite::BinaryOperator(binop.op);

        let guard = VoidGuard::new(VoidSite::Operand(binop.op), binop.position);
        let mut subst =
            self.infer_guarded(&mut binop.left, ctx, &left, &operand_site, guard.clone());
        if subst.apply(&left).contains(&Type::Void) {
            self.diagnostics
                .report(TypeError::void_misuse(VoidSite::Operand(binop.op), binop.position));
            return Substitution::empty();
        }

        let right_ctx = ctx.apply_subst(&subst);
        let s = self.infer_guarded(
            &mut binop.right,
            &right_ctx,
            &subst.apply(&right),
            &operand_site,
            guard,
        );
        subst.extend(s);
        if subst.apply(&right).contains(&Type::Void) {
            self.diagnostics
                .report(TypeError::void_misuse(VoidSite::Operand(binop.op), binop.position));
            return Substitution::empty();
        }

        let result = subst.apply(&result);
        let s = self.constrain(&subst.apply(expected), &result, site, binop.position);
        subst.extend(s);
        binop.ty = Some(subst.apply(&result));
        subst
    }

    fn infer_unop(
        &mut self,
        unop: &mut UnaryOp,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        let ty = match unop.op {
            UnaryOpKind::Not => Type::Bool,
            UnaryOpKind::Neg => Type::Int,
        };

        let operand_site = MismatchSite::UnaryOperator(unop.op);
        let mut subst = self.infer_expr(&mut unop.operand, ctx, &ty, &operand_site);
        let s = self.constrain(&subst.apply(expected), &ty, site, unop.position);
        subst.extend(s);
        unop.ty = Some(ty);
        subst
    }

    /// Type a call against the callee's current signature, or queue it if the
    /// callee has not been declared yet.
    ///
    /// Arguments are unified with the declared parameters with the argument on
    /// the left and [`Flow::Local`]: bindings that specialize the argument
    /// from the (possibly generic) parameter only apply to the rest of this
    /// call, while bindings that concretize the parameter are returned and
    /// therefore narrow the callee for every other caller too.
    ///
    /// An argument that is still unconstrained after typing, such as a call
    /// that was deferred, is unified with [`Flow::Global`] instead. Its
    /// variable is what the deferred call is later checked against.
    pub fn infer_call(
        &mut self,
        call: &mut FunCall,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
    ) -> Substitution {
        self.infer_call_guarded(call, ctx, expected, site, None)
    }

    fn infer_call_guarded(
        &mut self,
        call: &mut FunCall,
        ctx: &Context,
        expected: &Type,
        site: &MismatchSite,
        void_guard: Option<VoidGuard>,
    ) -> Substitution {
        let name = call.name.value.clone();
        let Some(Signature { params, ret }) = ctx.lookup_fun(&name).cloned() else {
            debug!("Deferring call to `{}`", name);
            self.deferred
                .defer(call, ctx.clone(), expected.clone(), void_guard);
            return Substitution::empty();
        };

        if call.args.len() != params.len() {
            self.diagnostics.report(TypeError::ArityMismatch {
                site: AritySite::Call,
                name,
                expected: params.len(),
                found: call.args.len(),
                span: call.position,
            });
            return Substitution::empty();
        }

        // `global` is returned to the caller; `view` additionally holds the
        // call-local bindings and is what this call's own types are read
        // through.
        let mut global = Substitution::empty();
        let mut view = Substitution::empty();
        let mut arg_ctx = ctx.clone();
        let mut arg_types = Vec::with_capacity(params.len());

        for (index, (arg, param)) in call.args.iter_mut().zip(&params).enumerate() {
            let void_site = VoidSite::Argument {
                function: name.clone(),
                index: index + 1,
            };
            let span = arg.position();

            let arg_var = self.fresh();
            let guard = VoidGuard::new(void_site.clone(), span);
            let s = self.infer_guarded(arg, &arg_ctx, &arg_var, &MismatchSite::General, guard);
            arg_ctx.apply(&s);
            view.extend(s.clone());
            global.extend(s);

            let arg_ty = view.apply(&arg_var);
            if arg_ty.contains(&Type::Void) {
                self.diagnostics.report(TypeError::void_misuse(void_site, span));
                return Substitution::empty();
            }

            let flow = if arg_ty == arg_var {
                Flow::Global
            } else {
                Flow::Local
            };
            let param_ty = view.apply(param);
            let s = match unify(&arg_ty, &param_ty, flow) {
                Ok(s) => s,
                Err(err) => {
                    self.report_argument_mismatch(err, &name, index, span);
                    Substitution::empty()
                }
            };
            view.extend(s.clone());
            let (s, _local) = s.split_flow();
            arg_ctx.apply(&s);
            global.extend(s);

            arg_types.push(arg_ty);
        }

        let ret = view.apply(&ret);
        let s = self.constrain(&view.apply(expected), &ret, site, call.position);
        view.extend(s.clone());
        global.extend(s);

        let instantiated = Type::function(
            arg_types.iter().map(|ty| view.apply(ty)).collect(),
            view.apply(&ret),
        );
        debug!("call to `{}` instantiated as {}", name, instantiated);
        call.ty = Some(instantiated);
        global
    }

    fn report_argument_mismatch(&mut self, err: UnifyError, function: &str, index: usize, span: Span) {
        let site = MismatchSite::Argument {
            function: function.to_string(),
            index: index + 1,
        };
        let error = match err {
            // The parameter is what the call site is checked against.
            UnifyError::Mismatch { left, right } => TypeError::Mismatch {
                site,
                expected: right,
                found: left,
                span,
            },
            arity => ErrorFactory::new(site, span).build(arity),
        };
        self.diagnostics.report(error);
    }
}

/// Whether `declared` and `inferred` share type variables the same way.
///
/// Walks both types in parallel. Every declared variable must line up with a
/// single inferred type, and every inferred variable with a single declared
/// variable. Shape differences are left to unification.
fn sharing_is_consistent(declared: &Type, inferred: &Type) -> bool {
    fn walk(
        declared: &Type,
        inferred: &Type,
        forward: &mut HashMap<TypeVar, Type>,
        backward: &mut HashMap<TypeVar, TypeVar>,
    ) -> bool {
        match (declared, inferred) {
            (Type::Var(d), _) => {
                if let Some(seen) = forward.get(d) {
                    if seen != inferred {
                        return false;
                    }
                } else {
                    forward.insert(*d, inferred.clone());
                }

                if let Type::Var(i) = inferred {
                    if let Some(seen) = backward.get(i) {
                        if seen != d {
                            return false;
                        }
                    } else {
                        backward.insert(*i, *d);
                    }
                }
                true
            }
            (Type::List(d), Type::List(i)) => walk(d, i, forward, backward),
            (Type::Tuple(dl, dr), Type::Tuple(il, ir)) => {
                walk(dl, il, forward, backward) && walk(dr, ir, forward, backward)
            }
            (Type::Function(dp, dr), Type::Function(ip, ir)) if dp.len() == ip.len() => {
                dp.iter()
                    .zip(ip)
                    .all(|(d, i)| walk(d, i, forward, backward))
                    && walk(dr, ir, forward, backward)
            }
            _ => true,
        }
    }

    walk(declared, inferred, &mut HashMap::new(), &mut HashMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expression::{Boolean, Character, Integer};
    use crate::ast::Ident;

    fn sp() -> Span {
        Span::default()
    }

    fn int(value: i64) -> Expr {
        Expr::Int(Integer {
            value,
            position: sp(),
            ty: None,
        })
    }

    fn boolean(value: bool) -> Expr {
        Expr::Bool(Boolean {
            value,
            position: sp(),
            ty: None,
        })
    }

    fn chr(value: char) -> Expr {
        Expr::Char(Character {
            value,
            position: sp(),
            ty: None,
        })
    }

    fn var(name: &str, fields: Vec<Field>) -> Expr {
        Expr::Variable(Variable {
            name: Ident::new(name, sp()),
            fields,
            position: sp(),
            ty: None,
        })
    }

    fn binop(op: BinOpKind, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp(BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            position: sp(),
            ty: None,
        })
    }

    fn range(from: Expr, to: Expr) -> Expr {
        Expr::Range(ListRange {
            from: Box::new(from),
            to: Box::new(to),
            position: sp(),
            ty: None,
        })
    }

    fn call(name: &str, args: Vec<Expr>) -> FunCall {
        FunCall {
            name: Ident::new(name, sp()),
            args,
            position: sp(),
            ty: None,
            deferred: None,
        }
    }

    fn infer(typer: &mut Typer, expr: &mut Expr, ctx: &Context) -> Type {
        let expected = typer.fresh();
        let subst = typer.infer_expr(expr, ctx, &expected, &MismatchSite::General);
        subst.apply(&expected)
    }

    #[test]
    fn test_fresh_vars_are_distinct() {
        let mut typer = Typer::new();
        let a = typer.fresh_var();
        let b = typer.fresh_var();
        assert_ne!(a, b);
    }

    #[test]
    fn test_literals() {
        let mut typer = Typer::new();
        let ctx = Context::empty();
        assert_eq!(infer(&mut typer, &mut int(1), &ctx), Type::Int);
        assert_eq!(infer(&mut typer, &mut boolean(true), &ctx), Type::Bool);
        assert_eq!(infer(&mut typer, &mut chr('a'), &ctx), Type::Char);
        assert!(!typer.diagnostics().has_errors());
    }

    #[test]
    fn test_literal_against_wrong_type_reports_once() {
        let mut typer = Typer::new();
        let subst = typer.infer_expr(
            &mut int(42),
            &Context::empty(),
            &Type::Bool,
            &MismatchSite::General,
        );
        assert!(subst.is_empty());
        assert_eq!(typer.diagnostics().error_count(), 1);
        assert!(matches!(
            &typer.diagnostics().errors()[0],
            TypeError::Mismatch {
                expected: Type::Bool,
                found: Type::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_tuple_of_literals() {
        let mut typer = Typer::new();
        let mut expr = Expr::Tuple(TupleExpr {
            left: Box::new(int(1)),
            right: Box::new(chr('c')),
            position: sp(),
            ty: None,
        });
        let ty = infer(&mut typer, &mut expr, &Context::empty());
        assert_eq!(ty, Type::tuple(Type::Int, Type::Char));
    }

    #[test]
    fn test_cons_onto_empty_list() {
        let mut typer = Typer::new();
        let empty = Expr::EmptyList(EmptyList {
            position: sp(),
            ty: None,
        });
        let mut expr = binop(BinOpKind::Cons, int(1), empty);
        let ty = infer(&mut typer, &mut expr, &Context::empty());
        assert_eq!(ty, Type::list(Type::Int));
        assert_eq!(expr.ty(), Some(&Type::list(Type::Int)));
    }

    #[test]
    fn test_equality_requires_same_operand_types() {
        let mut typer = Typer::new();
        let mut expr = binop(BinOpKind::Eq, int(1), chr('c'));
        let ty = infer(&mut typer, &mut expr, &Context::empty());
        assert_eq!(ty, Type::Bool);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::Mismatch {
                site: MismatchSite::BinaryOperator(BinOpKind::Eq),
                ..
            }]
        ));
    }

    #[test]
    fn test_char_range() {
        let mut typer = Typer::new();
        let mut expr = range(chr('a'), chr('z'));
        let ty = infer(&mut typer, &mut expr, &Context::empty());
        assert_eq!(ty, Type::list(Type::Char));
    }

    #[test]
    fn test_range_over_bools_is_rejected() {
        let mut typer = Typer::new();
        let mut expr = range(boolean(true), boolean(false));
        let ty = infer(&mut typer, &mut expr, &Context::empty());
        assert_eq!(ty, Type::list(Type::Int));
        assert!(typer.diagnostics().errors().iter().all(|err| matches!(
            err,
            TypeError::Mismatch {
                site: MismatchSite::ListRange,
                ..
            }
        )));
        assert!(typer.diagnostics().has_errors());
    }

    #[test]
    fn test_range_over_unknown_defaults_to_int() {
        let mut typer = Typer::new();
        let n = typer.fresh();
        let mut ctx = Context::empty();
        ctx.bind_var("n", n.clone());

        let expected = typer.fresh();
        let mut expr = range(var("n", vec![]), int(10));
        let subst = typer.infer_expr(&mut expr, &ctx, &expected, &MismatchSite::General);
        assert_eq!(subst.apply(&n), Type::Int);
        assert_eq!(subst.apply(&expected), Type::list(Type::Int));
        assert!(!typer.diagnostics().has_errors());
    }

    #[test]
    fn test_field_chain() {
        let mut typer = Typer::new();
        let mut ctx = Context::empty();
        ctx.bind_var("p", Type::tuple(Type::list(Type::Int), Type::Bool));

        let ty = infer(&mut typer, &mut var("p", vec![Field::Fst, Field::Hd]), &ctx);
        assert_eq!(ty, Type::Int);
        let ty = infer(&mut typer, &mut var("p", vec![Field::Fst, Field::Tl]), &ctx);
        assert_eq!(ty, Type::list(Type::Int));
        let ty = infer(&mut typer, &mut var("p", vec![Field::Snd]), &ctx);
        assert_eq!(ty, Type::Bool);
        assert!(!typer.diagnostics().has_errors());
    }

    #[test]
    fn test_field_access_narrows_unknown_variable() {
        let mut typer = Typer::new();
        let xs = typer.fresh();
        let mut ctx = Context::empty();
        ctx.bind_var("xs", xs.clone());

        let expected = typer.fresh();
        let mut expr = var("xs", vec![Field::Index(int(0))]);
        let subst = typer.infer_expr(&mut expr, &ctx, &expected, &MismatchSite::General);

        let element = subst.apply(&expected);
        assert_eq!(subst.apply(&xs), Type::list(element));
    }

    #[test]
    fn test_field_on_wrong_shape() {
        let mut typer = Typer::new();
        let mut ctx = Context::empty();
        ctx.bind_var("n", Type::Int);

        infer(&mut typer, &mut var("n", vec![Field::Hd]), &ctx);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::Mismatch {
                site: MismatchSite::FieldAccess { .. },
                ..
            }]
        ));
    }

    #[test]
    fn test_undefined_variable() {
        let mut typer = Typer::new();
        infer(&mut typer, &mut var("ghost", vec![]), &Context::empty());
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::UndefinedVariable { name, .. }] if name == "ghost"
        ));
    }

    #[test]
    fn test_void_operand() {
        let mut typer = Typer::new();
        let mut ctx = Context::empty();
        ctx.bind_fun("v", Signature::new(vec![], Type::Void));

        let mut expr = binop(BinOpKind::Eq, Expr::Call(call("v", vec![])), int(1));
        infer(&mut typer, &mut expr, &ctx);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::VoidMisuse {
                site: VoidSite::Operand(BinOpKind::Eq),
                ..
            }]
        ));
    }

    #[test]
    fn test_call_narrows_generic_callee() {
        let mut typer = Typer::new();
        let a = typer.fresh();
        let mut ctx = Context::empty();
        ctx.bind_fun("id", Signature::new(vec![a.clone()], a.clone()));

        let mut expr = Expr::Call(call("id", vec![int(1)]));
        let expected = typer.fresh();
        let subst = typer.infer_expr(&mut expr, &ctx, &expected, &MismatchSite::General);

        assert_eq!(subst.apply(&a), Type::Int);
        assert_eq!(subst.apply(&expected), Type::Int);
        match &expr {
            Expr::Call(call) => {
                assert_eq!(call.ty, Some(Type::function(vec![Type::Int], Type::Int)))
            }
            other => panic!("unexpected expression {:?}", other),
        }
    }

    #[test]
    fn test_generic_parameter_stays_local_to_call() {
        let mut typer = Typer::new();
        let a = typer.fresh();
        let x = typer.fresh();
        let mut ctx = Context::empty();
        ctx.bind_fun("id", Signature::new(vec![a.clone()], a.clone()));
        ctx.bind_var("x", x.clone());

        let mut expr = Expr::Call(call("id", vec![var("x", vec![])]));
        let expected = typer.fresh();
        let subst = typer.infer_expr(&mut expr, &ctx, &expected, &MismatchSite::General);

        assert_eq!(subst.apply(&x), x);
        assert!(!typer.diagnostics().has_errors());
    }

    #[test]
    fn test_call_arity() {
        let mut typer = Typer::new();
        let mut ctx = Context::empty();
        ctx.bind_fun("f", Signature::new(vec![Type::Int], Type::Int));

        let mut expr = Expr::Call(call("f", vec![int(1), int(2)]));
        infer(&mut typer, &mut expr, &ctx);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::ArityMismatch {
                site: AritySite::Call,
                expected: 1,
                found: 2,
                ..
            }]
        ));
    }

    #[test]
    fn test_argument_mismatch_reports_parameter_as_expected() {
        let mut typer = Typer::new();
        let mut ctx = Context::empty();
        ctx.bind_fun("f", Signature::new(vec![Type::Int], Type::Int));

        let mut expr = Expr::Call(call("f", vec![boolean(true)]));
        infer(&mut typer, &mut expr, &ctx);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::Mismatch {
                site: MismatchSite::Argument { index: 1, .. },
                expected: Type::Int,
                found: Type::Bool,
                ..
            }]
        ));
    }

    #[test]
    fn test_unknown_callee_is_deferred() {
        let mut typer = Typer::new();
        let mut expr = Expr::Call(call("later", vec![]));
        let expected = typer.fresh();
        let subst = typer.infer_expr(&mut expr, &Context::empty(), &expected, &MismatchSite::General);

        assert!(subst.is_empty());
        assert_eq!(typer.pending_calls(), 1);
        assert!(matches!(&expr, Expr::Call(call) if call.deferred.is_some()));

        typer.report_unresolved();
        assert_eq!(typer.pending_calls(), 0);
        assert!(matches!(
            &typer.diagnostics().errors()[..],
            [TypeError::UndefinedFunction { name, .. }] if name == "later"
        ));
    }

    #[test]
    fn test_monotype_shares_names_within_declaration() {
        let mut typer = Typer::new();
        let a1 = typer.monotype(&TypeAnnotation::var("a"));
        let a2 = typer.monotype(&TypeAnnotation::list(TypeAnnotation::var("a")));
        assert_eq!(Type::list(a1.clone()), a2);

        typer.names.reset();
        let a3 = typer.monotype(&TypeAnnotation::var("a"));
        assert_ne!(a1, a3);
    }

    #[test]
    fn test_sharing_consistency() {
        let (d0, d1) = (Type::var(100), Type::var(101));
        let (t0, t1) = (Type::var(0), Type::var(1));

        let declared = Type::function(vec![d0.clone(), d1.clone()], d0.clone());
        let same = Type::function(vec![t0.clone(), t1.clone()], t0.clone());
        let collapsed = Type::function(vec![t0.clone(), t1.clone()], t1.clone());
        assert!(sharing_is_consistent(&declared, &same));
        assert!(!sharing_is_consistent(&declared, &collapsed));

        let concrete = Type::function(vec![Type::Int, Type::Bool], Type::Int);
        assert!(sharing_is_consistent(&declared, &concrete));

        let too_general = Type::function(vec![d0.clone()], d1.clone());
        let identity = Type::function(vec![t0.clone()], t0.clone());
        assert!(!sharing_is_consistent(&too_general, &identity));
    }
}
