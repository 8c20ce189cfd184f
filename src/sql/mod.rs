pub mod ast;
pub mod display;
pub mod functions;
pub mod lexer;
pub mod literal;
pub mod parser;
