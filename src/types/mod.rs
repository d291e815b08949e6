pub mod annotate;
pub mod check;
pub mod context;
pub mod deferred;
pub mod error;
pub mod infer;
pub mod names;
pub mod subst;
pub mod ty;
pub mod unify;

pub use check::{Typed, type_check};
pub use context::Context;
pub use error::TypeError;
pub use infer::Typer;
pub use subst::{Flow, Substitution};
pub use ty::{Signature, Type, TypeVar};
