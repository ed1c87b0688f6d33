use std::collections::HashMap;

use stick_syntax::{BinaryOperator, Expr};

use crate::error::GenerateError;
use crate::naming::local_ident;

/// The Rust code an expression translates to.
///
/// Statements in a preamble must run, in order, before the result is
/// referenced. A fallible result is bound to a `Result<Value, RuntimeError>`
/// and may only be used as a value behind an `Ok` guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    /// A self-contained Rust expression of type `Value`.
    Value(String),
    Scoped { preamble: Vec<String>, value: String },
    Fallible { preamble: Vec<String>, binding: String },
}

impl Evaluated {
    pub fn preamble(&self) -> &[String] {
        match self {
            Evaluated::Value(_) => &[],
            Evaluated::Scoped { preamble, .. } | Evaluated::Fallible { preamble, .. } => preamble,
        }
    }

    /// The expression naming the result. For a fallible result this is the
    /// binding holding the `Result`.
    pub fn result_ref(&self) -> &str {
        match self {
            Evaluated::Value(value) | Evaluated::Scoped { value, .. } => value,
            Evaluated::Fallible { binding, .. } => binding,
        }
    }

    /// Split into a preamble and a plain value reference, dropping the
    /// success signal of a fallible result: a failed lookup becomes `Null`.
    fn into_value_parts(self) -> (Vec<String>, String) {
        match self {
            Evaluated::Value(value) => (Vec::new(), value),
            Evaluated::Scoped { preamble, value } => (preamble, value),
            Evaluated::Fallible {
                mut preamble,
                binding,
            } => {
                preamble.push(format!("let {0} = {0}.unwrap_or_default();", binding));
                (preamble, binding)
            }
        }
    }
}

/// Loop variables in effect and the counter for fresh bindings.
///
/// One scope lives for a whole generate call, so identical inputs always
/// produce identical names.
#[derive(Debug, Default)]
pub struct Scope {
    /// Loop variable names with their nesting count.
    locals: HashMap<String, usize>,
    next_id: usize,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn bind(&mut self, name: &str) {
        *self.locals.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Undo one `bind`. The name stays local while an outer loop still
    /// binds it.
    pub fn unbind(&mut self, name: &str) {
        if let Some(count) = self.locals.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.locals.remove(name);
            }
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    /// A new identifier, unique within this scope. Template locals are
    /// always `l_`-prefixed, so the leading `__` keeps these apart.
    pub fn fresh(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("__{}_{}", prefix, self.next_id)
    }

    pub(crate) fn take_locals(&mut self) -> HashMap<String, usize> {
        std::mem::take(&mut self.locals)
    }

    pub(crate) fn restore_locals(&mut self, locals: HashMap<String, usize>) {
        self.locals = locals;
    }
}

/// Translate a template expression into Rust code.
pub fn translate(expr: &Expr, scope: &mut Scope) -> Result<Evaluated, GenerateError> {
    match expr {
        Expr::Name(name) if scope.is_local(name) => Ok(Evaluated::Value(local_ident(name))),
        Expr::Name(name) => Ok(Evaluated::Value(format!("stick::lookup(ctx, {:?})", name))),
        Expr::StringLiteral(text) => Ok(Evaluated::Value(format!("stick::Value::from({:?})", text))),
        Expr::GetAttr { base, attr, args } => {
            if !args.is_empty() {
                return Err(unsupported(format!("method call `{}`", expr)));
            }
            translate_attr(base, attr, scope)
        }
        Expr::FuncCall { name, args } => match args.as_slice() {
            [arg] => translate_call(name, arg, scope),
            _ => Err(unsupported(format!(
                "call to `{}` with {} arguments (exactly one is supported)",
                name,
                args.len()
            ))),
        },
        Expr::BinaryOp {
            op: BinaryOperator::Equal,
            left,
            right,
        } => translate_equal(left, right, scope),
        Expr::BinaryOp { op, .. } => Err(unsupported(format!("binary operator `{}`", op))),
    }
}

fn unsupported(construct: String) -> GenerateError {
    GenerateError::UnsupportedConstruct { construct }
}

fn translate_attr(base: &Expr, attr: &Expr, scope: &mut Scope) -> Result<Evaluated, GenerateError> {
    let (mut preamble, key) = translate(attr, scope)?.into_value_parts();
    let base = translate(base, scope)?;
    let binding = scope.fresh("val");
    match base {
        Evaluated::Fallible {
            preamble: base_preamble,
            binding: base_binding,
        } => {
            let param = scope.fresh("base");
            preamble.extend(base_preamble);
            preamble.push(format!(
                "let {} = {}.and_then(|{}| stick::get_attr(&{}, &{}));",
                binding, base_binding, param, param, key
            ));
        }
        resolved => {
            let (base_preamble, base_ref) = resolved.into_value_parts();
            preamble.extend(base_preamble);
            preamble.push(format!(
                "let {} = stick::get_attr(&{}, &{});",
                binding, base_ref, key
            ));
        }
    }
    Ok(Evaluated::Fallible { preamble, binding })
}

fn translate_call(name: &str, arg: &Expr, scope: &mut Scope) -> Result<Evaluated, GenerateError> {
    let (mut preamble, arg) = translate(arg, scope)?.into_value_parts();
    let result = scope.fresh("fnval");
    let func = scope.fresh("func");
    preamble.push(format!("let mut {} = stick::Value::from(\"\");", result));
    preamble.push(format!("if let Some({}) = env.functions.get({:?}) {{", func, name));
    preamble.push(format!("    {} = {}(None, &{});", result, func, arg));
    preamble.push("}".to_string());
    Ok(Evaluated::Scoped {
        preamble,
        value: result,
    })
}

fn translate_equal(left: &Expr, right: &Expr, scope: &mut Scope) -> Result<Evaluated, GenerateError> {
    let (mut preamble, left) = translate(left, scope)?.into_value_parts();
    let (right_preamble, right) = translate(right, scope)?.into_value_parts();
    preamble.extend(right_preamble);
    let value = format!("stick::Value::from(stick::equal(&{}, &{}))", left, right);
    if preamble.is_empty() {
        Ok(Evaluated::Value(value))
    } else {
        Ok(Evaluated::Scoped { preamble, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stick_syntax::parser::parse_expression;

    fn translated(source: &str, scope: &mut Scope) -> Evaluated {
        let expr = parse_expression(source, 0).unwrap();
        translate(&expr, scope).unwrap()
    }

    #[test]
    fn names_resolve_against_locals() {
        let mut scope = Scope::new();
        assert_eq!(
            translated("user", &mut scope),
            Evaluated::Value("stick::lookup(ctx, \"user\")".into())
        );
        scope.bind("user");
        assert_eq!(translated("user", &mut scope), Evaluated::Value("l_user".into()));
        scope.bind("user");
        scope.unbind("user");
        assert!(scope.is_local("user"));
        scope.unbind("user");
        assert!(!scope.is_local("user"));
    }

    #[test]
    fn string_literals_are_escaped() {
        let mut scope = Scope::new();
        assert_eq!(
            translated("'say \"hi\"'", &mut scope),
            Evaluated::Value("stick::Value::from(\"say \\\"hi\\\"\")".into())
        );
    }

    #[test]
    fn attribute_access_is_fallible() {
        let mut scope = Scope::new();
        let result = translated("user.name", &mut scope);
        assert_eq!(
            result,
            Evaluated::Fallible {
                preamble: vec![
                    "let __val_1 = stick::get_attr(&stick::lookup(ctx, \"user\"), &stick::Value::from(\"name\"));"
                        .into()
                ],
                binding: "__val_1".into(),
            }
        );
        assert_eq!(result.result_ref(), "__val_1");
    }

    #[test]
    fn chained_attributes_short_circuit() {
        let mut scope = Scope::new();
        let result = translated("a.b.c", &mut scope);
        assert_eq!(
            result.preamble(),
            &[
                "let __val_1 = stick::get_attr(&stick::lookup(ctx, \"a\"), &stick::Value::from(\"b\"));".to_string(),
                "let __val_2 = __val_1.and_then(|__base_3| stick::get_attr(&__base_3, &stick::Value::from(\"c\")));"
                    .to_string(),
            ]
        );
        assert_eq!(result.result_ref(), "__val_2");
    }

    #[test]
    fn failed_lookups_become_null_as_values() {
        let mut scope = Scope::new();
        let (preamble, value) = translated("user.name", &mut scope).into_value_parts();
        assert_eq!(value, "__val_1");
        assert_eq!(
            preamble.last().map(String::as_str),
            Some("let __val_1 = __val_1.unwrap_or_default();")
        );
    }

    #[test]
    fn locals_cannot_capture_temporaries() {
        let mut scope = Scope::new();
        scope.bind("val_1");
        scope.bind("__val_1");
        let result = translated("user.role == val_1", &mut scope);
        assert_eq!(
            result.result_ref(),
            "stick::Value::from(stick::equal(&__val_1, &l_val_1))"
        );
        let result = translated("__val_1", &mut scope);
        assert_eq!(result, Evaluated::Value("l___val_1".into()));
    }

    #[test]
    fn function_call_defaults_to_empty_string() {
        let mut scope = Scope::new();
        let result = translated("upper(name)", &mut scope);
        assert_eq!(
            result,
            Evaluated::Scoped {
                preamble: vec![
                    "let mut __fnval_1 = stick::Value::from(\"\");".into(),
                    "if let Some(__func_2) = env.functions.get(\"upper\") {".into(),
                    "    __fnval_1 = __func_2(None, &stick::lookup(ctx, \"name\"));".into(),
                    "}".into(),
                ],
                value: "__fnval_1".into(),
            }
        );
    }

    #[test]
    fn equality_hoists_both_preambles() {
        let mut scope = Scope::new();
        let plain = translated("role == 'admin'", &mut scope);
        assert_eq!(
            plain,
            Evaluated::Value(
                "stick::Value::from(stick::equal(&stick::lookup(ctx, \"role\"), &stick::Value::from(\"admin\")))"
                    .into()
            )
        );

        let mut scope = Scope::new();
        let hoisted = translated("user.role == other.role", &mut scope);
        assert_eq!(hoisted.preamble().len(), 4);
        assert_eq!(
            hoisted.result_ref(),
            "stick::Value::from(stick::equal(&__val_1, &__val_2))"
        );
    }

    #[test]
    fn unsupported_constructs_are_named() {
        let cases = [
            ("a + b", "unsupported construct: binary operator `+`"),
            ("a and b", "unsupported construct: binary operator `and`"),
            ("user.greet('x')", "unsupported construct: method call `user.greet(\"x\")`"),
            ("f()", "unsupported construct: call to `f` with 0 arguments (exactly one is supported)"),
        ];
        for (source, message) in cases {
            let expr = parse_expression(source, 0).unwrap();
            let err = translate(&expr, &mut Scope::new()).unwrap_err();
            assert_eq!(err.to_string(), message, "{}", source);
        }
    }
}
