use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    TypeError { expected: String, got: String },
    NoSuchAttribute { attribute: String, type_name: String },
    IndexOutOfBounds(usize),
    NotIterable(String),
    Custom(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError { expected, got } => {
                write!(f, "type error: expected {}, got {}", expected, got)
            }
            RuntimeError::NoSuchAttribute {
                attribute,
                type_name,
            } => write!(f, "{} has no attribute '{}'", type_name, attribute),
            RuntimeError::IndexOutOfBounds(idx) => write!(f, "index {} out of bounds", idx),
            RuntimeError::NotIterable(type_name) => write!(f, "{} is not iterable", type_name),
            RuntimeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
