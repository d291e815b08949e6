//! AST builders for the integration tests. Parsing is not part of this crate,
//! so test programs are assembled by hand.

#![allow(dead_code)]

use splc::ast::expression::{
    BinaryOp, Boolean, Character, EmptyList, Integer, ListRange, Tuple, UnaryOp,
};
use splc::ast::statement::{Assign, For, If, Return, While};
use splc::ast::{
    BinOpKind, Decl, Expr, Field, FunCall, FunDecl, FunSignature, Ident, Position, Program, Span,
    Stmt, TypeAnnotation, UnaryOpKind, VarDecl, Variable,
};
use splc::diagnostics::{CheckFailure, Config};
use splc::types::{Type, Typed, type_check};

pub fn none() -> Span {
    Span::default()
}

/// A span on one line, `len` columns wide.
pub fn at(line: usize, column: usize, len: usize) -> Span {
    Span::new(Position::new(line, column), Position::new(line, column + len))
}

pub fn ident(name: &str) -> Ident {
    Ident::new(name, none())
}

pub fn int(value: i64) -> Expr {
    Expr::Int(Integer {
        value,
        position: none(),
        ty: None,
    })
}

pub fn boolean(value: bool) -> Expr {
    Expr::Bool(Boolean {
        value,
        position: none(),
        ty: None,
    })
}

pub fn chr(value: char) -> Expr {
    Expr::Char(Character {
        value,
        position: none(),
        ty: None,
    })
}

pub fn variable(name: &str, fields: Vec<Field>) -> Variable {
    Variable {
        name: ident(name),
        fields,
        position: none(),
        ty: None,
    }
}

pub fn var(name: &str) -> Expr {
    Expr::Variable(variable(name, vec![]))
}

pub fn path(name: &str, fields: Vec<Field>) -> Expr {
    Expr::Variable(variable(name, fields))
}

pub fn tuple(left: Expr, right: Expr) -> Expr {
    Expr::Tuple(Tuple {
        left: Box::new(left),
        right: Box::new(right),
        position: none(),
        ty: None,
    })
}

pub fn nil() -> Expr {
    Expr::EmptyList(EmptyList {
        position: none(),
        ty: None,
    })
}

pub fn range(from: Expr, to: Expr) -> Expr {
    Expr::Range(ListRange {
        from: Box::new(from),
        to: Box::new(to),
        position: none(),
        ty: None,
    })
}

pub fn binop(op: BinOpKind, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp(BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
        position: none(),
        ty: None,
    })
}

pub fn unop(op: UnaryOpKind, operand: Expr) -> Expr {
    Expr::UnaryOp(UnaryOp {
        op,
        operand: Box::new(operand),
        position: none(),
        ty: None,
    })
}

pub fn fun_call(name: &str, args: Vec<Expr>, position: Span) -> FunCall {
    FunCall {
        name: ident(name),
        args,
        position,
        ty: None,
        deferred: None,
    }
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(fun_call(name, args, none()))
}

pub fn call_at(name: &str, args: Vec<Expr>, position: Span) -> Expr {
    Expr::Call(fun_call(name, args, position))
}

pub fn call_stmt(name: &str, args: Vec<Expr>) -> Stmt {
    Stmt::Call(fun_call(name, args, none()))
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(Return {
        value: Some(value),
        position: none(),
    })
}

pub fn ret_void() -> Stmt {
    Stmt::Return(Return {
        value: None,
        position: none(),
    })
}

pub fn assign(target: Variable, value: Expr) -> Stmt {
    Stmt::Assign(Assign {
        target,
        value,
        position: none(),
    })
}

pub fn if_else(condition: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Stmt {
    Stmt::If(If {
        condition,
        then_body,
        else_body,
        position: none(),
    })
}

pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While(While {
        condition,
        body,
        position: none(),
    })
}

pub fn for_loop(name: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::For(For {
        var: ident(name),
        iterable,
        body,
        position: none(),
    })
}

pub fn var_decl(name: &str, value: Expr) -> VarDecl {
    VarDecl {
        annotation: None,
        name: ident(name),
        value,
        position: none(),
        ty: None,
    }
}

pub fn typed_var_decl(annotation: TypeAnnotation, name: &str, value: Expr) -> VarDecl {
    VarDecl {
        annotation: Some(annotation),
        ..var_decl(name, value)
    }
}

pub fn global(name: &str, value: Expr) -> Decl {
    Decl::Var(var_decl(name, value))
}

pub fn fun(name: &str, args: &[&str], var_decls: Vec<VarDecl>, stmts: Vec<Stmt>) -> Decl {
    Decl::Fun(FunDecl {
        name: ident(name),
        args: args.iter().map(|arg| ident(arg)).collect(),
        signature: None,
        var_decls,
        stmts,
        position: none(),
        ty: None,
    })
}

pub fn fun_with_signature(
    name: &str,
    args: &[&str],
    params: Vec<TypeAnnotation>,
    ret: TypeAnnotation,
    var_decls: Vec<VarDecl>,
    stmts: Vec<Stmt>,
) -> Decl {
    match fun(name, args, var_decls, stmts) {
        Decl::Fun(decl) => Decl::Fun(FunDecl {
            signature: Some(FunSignature::new(params, ret)),
            ..decl
        }),
        other => other,
    }
}

pub fn program(decls: Vec<Decl>) -> Program {
    Program { decls }
}

pub fn check(program: &mut Program) -> Result<Typed, CheckFailure> {
    check_source(program, "")
}

pub fn check_source(program: &mut Program, source: &str) -> Result<Typed, CheckFailure> {
    type_check(program, source, &Config::plain())
}

/// Type recorded on a function declaration after checking.
pub fn fun_type(program: &Program, name: &str) -> Option<Type> {
    program.fun_decl(name).and_then(|decl| decl.ty.clone())
}

/// Type recorded on a local variable declaration after checking.
pub fn local_type(program: &Program, function: &str, name: &str) -> Option<Type> {
    program
        .fun_decl(function)
        .and_then(|decl| decl.local(name))
        .and_then(|decl| decl.ty.clone())
}

pub fn int_to_int() -> Type {
    Type::function(vec![Type::Int], Type::Int)
}
