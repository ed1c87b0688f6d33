use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

/// Per-invocation variables passed to a render function.
pub type Context = HashMap<String, Value>;

/// A template function: receives the calling context (generated code
/// passes `None`) and its single argument.
pub type Function = Box<dyn Fn(Option<&Context>, &Value) -> Value + Send + Sync>;

/// The environment shared by every render call.
#[derive(Default)]
pub struct Env {
    pub functions: HashMap<String, Function>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(Option<&Context>, &Value) -> Value + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Option<&Context>, &Value) -> Value + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Env").field("functions", &names).finish()
    }
}

/// Position of the current iteration, handed to every loop body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loop {
    /// 1-based.
    pub index: usize,
    pub index0: usize,
    pub revindex: usize,
    pub revindex0: usize,
    pub first: bool,
    pub last: bool,
    pub length: usize,
}

impl Loop {
    pub(crate) fn new(index0: usize, length: usize) -> Self {
        Loop {
            index: index0 + 1,
            index0,
            revindex: length - index0,
            revindex0: length - index0 - 1,
            first: index0 == 0,
            last: index0 + 1 == length,
            length,
        }
    }
}

/// Exposes the loop state to templates as the `loop` variable.
impl From<Loop> for Value {
    fn from(state: Loop) -> Self {
        Value::map([
            ("index", Value::from(state.index)),
            ("index0", Value::from(state.index0)),
            ("revindex", Value::from(state.revindex)),
            ("revindex0", Value::from(state.revindex0)),
            ("first", Value::from(state.first)),
            ("last", Value::from(state.last)),
            ("length", Value::from(state.length)),
        ])
    }
}
