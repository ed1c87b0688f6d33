//! Runtime support for render functions generated by `stickgen`.
//!
//! Generated code imports this crate as `stick` and only touches the items
//! re-exported here.

pub mod env;
pub mod error;
pub mod ops;
pub mod value;

pub use env::{Context, Env, Function, Loop};
pub use error::RuntimeError;
pub use ops::{coerce_bool, equal, get_attr, iterate, lookup};
pub use value::Value;
