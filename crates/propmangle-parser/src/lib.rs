//! propmangle-parser: JavaScript script parser and printer.
//!
//! The tree is a flat arena of nodes addressed by [`NodeId`], which lets the
//! mangling passes rename identifiers in place while tracking which nodes
//! they have already visited.
//!
//! # Example
//!
//! ```
//! use propmangle_parser::{parse, Codegen, CodegenOptions};
//!
//! let ast = parse("var o = {foo: 1};").unwrap();
//! let output = Codegen::new(&ast, CodegenOptions::default()).generate();
//! assert_eq!(output, "var o = {foo: 1};\n");
//! ```

mod ast;
mod codegen;
mod lexer;
mod parser;
mod span;
mod token;

pub use ast::*;
pub use codegen::{Codegen, CodegenOptions};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use span::{LineIndex, Span};
pub use token::{is_reserved_word, Token, TokenKind};

/// Parse a script into a tree.
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    Parser::new(source).parse()
}
