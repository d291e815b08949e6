use log::debug;

use super::annotate::Annotator;
use super::context::Context;
use super::infer::Typer;
use crate::ast::Program;
use crate::diagnostics::{CheckFailure, Config, Warning};

/// Result of a successful check.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed {
    /// Signatures of every global variable and function.
    pub context: Context,
    pub warnings: Vec<Warning>,
}

/// Type check a program
///
/// This performs:
/// 1. Inference over every declaration, globals first
/// 2. Reporting of calls to functions that were never declared
/// 3. Write-back of the final types into `program`
///
/// The tree is annotated even when checking fails, so callers can inspect the
/// partial result. Errors are collected over the whole run and returned
/// together as one [`CheckFailure`], rendered against `source`.
pub fn type_check(
    program: &mut Program,
    source: &str,
    config: &Config,
) -> Result<Typed, CheckFailure> {
    let mut typer = Typer::new();
    let mut context = Context::empty();

    let subst = typer.infer_program(program, &mut context);
    typer.report_unresolved();

    let output = typer.finish();
    Annotator::new(&subst, output.resolved).annotate_program(program);
    debug!(
        "type checking finished with {} error(s)",
        output.diagnostics.error_count()
    );

    let warnings = output.diagnostics.finish(source, config)?;
    Ok(Typed { context, warnings })
}
