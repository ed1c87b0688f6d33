pub mod ast;
pub mod loader;
pub mod parser;

pub use ast::{BinaryOperator, Body, Expr, Module, Node, Pos};
pub use loader::{FilesystemLoader, LoadError, Loader, MemoryLoader};
pub use parser::{ParseError, Parser};

/// Parse template source with file id 0.
pub fn parse(source: &str) -> Result<Module, ParseError> {
    Parser::new(source.to_string(), 0).parse()
}
