use std::collections::HashMap;

use super::deferred::DeferredId;
use super::subst::Substitution;
use super::ty::Type;
use crate::ast::{Decl, Expr, Field, FunCall, FunDecl, Program, Stmt, VarDecl, Variable};

/// Writes the outcome of a typing run back into the tree.
///
/// Calls that were typed late live in `resolved` as typed copies; they replace
/// their placeholders in the tree. Then every `ty` slot is rewritten through
/// the final substitution, so nodes typed early see what was learned later.
pub struct Annotator<'a> {
    subst: &'a Substitution,
    resolved: HashMap<DeferredId, FunCall>,
}

impl<'a> Annotator<'a> {
    pub fn new(subst: &'a Substitution, resolved: HashMap<DeferredId, FunCall>) -> Self {
        Self { subst, resolved }
    }

    pub fn annotate_program(&mut self, program: &mut Program) {
        for decl in program.decls.iter_mut() {
            match decl {
                Decl::Var(var) => self.annotate_var_decl(var),
                Decl::Fun(fun) => self.annotate_fun_decl(fun),
            }
        }
    }

    fn apply(&self, ty: &mut Option<Type>) {
        if let Some(inner) = ty {
            *inner = self.subst.apply(inner);
        }
    }

    fn annotate_var_decl(&mut self, decl: &mut VarDecl) {
        self.apply(&mut decl.ty);
        self.annotate_expr(&mut decl.value);
    }

    fn annotate_fun_decl(&mut self, decl: &mut FunDecl) {
        self.apply(&mut decl.ty);
        for var in decl.var_decls.iter_mut() {
            self.annotate_var_decl(var);
        }
        self.annotate_block(&mut decl.stmts);
    }

    fn annotate_block(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.annotate_stmt(stmt);
        }
    }

    fn annotate_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::If(stmt) => {
                self.annotate_expr(&mut stmt.condition);
                self.annotate_block(&mut stmt.then_body);
                self.annotate_block(&mut stmt.else_body);
            }
            Stmt::While(stmt) => {
                self.annotate_expr(&mut stmt.condition);
                self.annotate_block(&mut stmt.body);
            }
            Stmt::For(stmt) => {
                self.annotate_expr(&mut stmt.iterable);
                self.annotate_block(&mut stmt.body);
            }
            Stmt::Assign(stmt) => {
                self.annotate_variable(&mut stmt.target);
                self.annotate_expr(&mut stmt.value);
            }
            Stmt::Call(call) => self.annotate_call(call),
            Stmt::Return(stmt) => {
                if let Some(value) = &mut stmt.value {
                    self.annotate_expr(value);
                }
            }
        }
    }

    fn annotate_variable(&mut self, var: &mut Variable) {
        self.apply(&mut var.ty);
        for field in var.fields.iter_mut() {
            if let Field::Index(index) = field {
                self.annotate_expr(index);
            }
        }
    }

    fn annotate_call(&mut self, call: &mut FunCall) {
        if let Some(id) = call.deferred {
            if let Some(typed) = self.resolved.remove(&id) {
                *call = typed;
            }
        }

        self.apply(&mut call.ty);
        for arg in call.args.iter_mut() {
            self.annotate_expr(arg);
        }
    }

    fn annotate_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Int(lit) => self.apply(&mut lit.ty),
            Expr::Bool(lit) => self.apply(&mut lit.ty),
            Expr::Char(lit) => self.apply(&mut lit.ty),
            Expr::Variable(var) => self.annotate_variable(var),
            Expr::Tuple(tuple) => {
                self.apply(&mut tuple.ty);
                self.annotate_expr(&mut tuple.left);
                self.annotate_expr(&mut tuple.right);
            }
            Expr::EmptyList(list) => self.apply(&mut list.ty),
            Expr::Range(range) => {
                self.apply(&mut range.ty);
                self.annotate_expr(&mut range.from);
                self.annotate_expr(&mut range.to);
            }
            Expr::BinaryOp(binop) => {
                self.apply(&mut binop.ty);
                self.annotate_expr(&mut binop.left);
                self.annotate_expr(&mut binop.right);
            }
            Expr::UnaryOp(unop) => {
                self.apply(&mut unop.ty);
                self.annotate_expr(&mut unop.operand);
            }
            Expr::Call(call) => self.annotate_call(call),
        }
    }
}
