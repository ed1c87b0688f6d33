use crate::env::{Context, Loop};
use crate::error::RuntimeError;
use crate::value::Value;

/// Look up a context entry; absent names are `Null`.
pub fn lookup(ctx: &Context, name: &str) -> Value {
    ctx.get(name).cloned().unwrap_or_default()
}

/// Resolve `value.key` (or `value[key]`).
pub fn get_attr(value: &Value, key: &Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Map(entries) => {
            let attribute = key.to_string();
            entries
                .get(&attribute)
                .cloned()
                .ok_or_else(|| RuntimeError::NoSuchAttribute {
                    attribute,
                    type_name: value.type_name().to_string(),
                })
        }
        Value::Array(items) => {
            let index = as_index(key)?;
            items
                .get(index)
                .cloned()
                .ok_or(RuntimeError::IndexOutOfBounds(index))
        }
        other => Err(RuntimeError::NoSuchAttribute {
            attribute: key.to_string(),
            type_name: other.type_name().to_string(),
        }),
    }
}

fn as_index(key: &Value) -> Result<usize, RuntimeError> {
    let number = match key {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n >= 0.0 && n == n.floor() => Ok(n as usize),
        _ => Err(RuntimeError::TypeError {
            expected: "array index".to_string(),
            got: key.type_name().to_string(),
        }),
    }
}

pub fn coerce_bool(value: &Value) -> bool {
    value.is_truthy()
}

/// Call `body(key, value, loop)` for every entry of an array (keys are
/// indices) or map (keys in sorted order). The body returns `Ok(true)` to
/// stop early. `Null` iterates zero times.
pub fn iterate<F>(value: &Value, mut body: F) -> Result<(), RuntimeError>
where
    F: FnMut(Value, Value, Loop) -> Result<bool, RuntimeError>,
{
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => {
            let length = items.len();
            for (i, item) in items.iter().enumerate() {
                if body(Value::from(i), item.clone(), Loop::new(i, length))? {
                    break;
                }
            }
            Ok(())
        }
        Value::Map(entries) => {
            let length = entries.len();
            for (i, (key, item)) in entries.iter().enumerate() {
                if body(Value::from(key.as_str()), item.clone(), Loop::new(i, length))? {
                    break;
                }
            }
            Ok(())
        }
        other => Err(RuntimeError::NotIterable(other.type_name().to_string())),
    }
}

/// Loose template equality: booleans compare by truthiness, numbers and
/// numeric strings compare numerically, `Null` equals the empty string.
pub fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(b), other) | (other, Value::Boolean(b)) => *b == other.is_truthy(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
        }
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        _ => left == right,
    }
}
