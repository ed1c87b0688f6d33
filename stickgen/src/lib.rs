//! Compiles Twig-style templates into Rust render functions.
//!
//! A [`Generator`] loads a template through a [`stick_syntax::Loader`],
//! resolves its `extends` and `include` references and returns a
//! [`CompiledUnit`] whose source text calls into `stick-runtime`.

pub mod error;
pub mod expr;
pub mod generator;
pub mod naming;
pub mod output;

pub use error::{GenerateError, ReferenceKind};
pub use expr::{Evaluated, Scope, translate};
pub use generator::{Generator, GeneratorConfig};
pub use naming::titleize;
pub use output::{BlockKey, CompiledUnit, RenderFunction};
