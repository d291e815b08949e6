//! # splc - type inference for SPL
//!
//! SPL is a small imperative teaching language with integers, booleans,
//! characters, lists, pairs and functions. This crate is the typing stage of
//! its compiler: it takes a parsed program, infers a monotype for every
//! declaration and expression, and writes those types back into the tree for
//! the code generator.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Parsed AST (ast::Program, all `ty` slots empty)
//!     ↓
//! [Typer] → Substitution + collected errors
//!     ↓
//! [Annotator] → Typed AST (ast::Program, `ty` slots filled)
//!     ↓
//! [Diagnostics] → Ok(Typed) or one aggregated CheckFailure
//! ```
//!
//! ## Key Design Decisions
//!
//! ### Monotypes only
//! There is no generalization. A function without a signature starts out with
//! fresh type variables for its arguments and return type, and every call that
//! passes a concrete type narrows those variables for the rest of the program.
//! A declared signature such as `(a, b) -> a` is checked for consistent sharing
//! of its type variables against what the body allows.
//!
//! ### Calls before declarations
//! A call to a function that has not been typed yet is put aside together with
//! its context and resolved as soon as the callee's declaration is typed. Calls
//! that are still pending at the end are reported as undefined.
//!
//! ### Keep going after errors
//! Errors are recorded and typing carries on, so one run reports as many
//! problems as it can find. See [`diagnostics`] for how they are rendered.
//!
//! ## Module Structure
//!
//! - [`ast`] - The tree produced by the parser and annotated by the typer
//! - [`types`] - Type representation, unification and inference
//! - [`diagnostics`] - Error collection and rendering
//!
//! ## Getting Started
//!
//! Build or parse an [`ast::Program`], then call [`types::type_check()`]
//! with the source text (used for error excerpts) and a
//! [`diagnostics::Config`].

pub mod ast;
pub mod diagnostics;
pub mod types;
