pub mod context;
pub mod evaluator;
mod lexer;
mod parser;
