pub mod error;
pub mod expression;
mod lexer;
mod structural;

pub use error::ParseError;
pub use expression::parse_expression;

use crate::ast::Module;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the template source into a complete Module.
    pub fn parse(&self) -> Result<Module, ParseError> {
        structural::parse_module(&self.source, self.file_id)
    }
}
