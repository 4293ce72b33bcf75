//! Band algebra.
//!
//! Expressions are small array programs whose free variables are band
//! identifiers, e.g. `(nir - red) / (nir + red)` or
//! `(where (> B08 B04) B08 nan)`.

pub mod eval;
pub mod identifiers;
pub mod lexer;
pub mod parser;
pub mod vocabulary;

use ndarray::Array2;

pub use eval::{Algebra, Context, Value};
pub use identifiers::identifiers;
pub use vocabulary::{Builtin, Vocabulary, ALGEBRA};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("Identifier {0} is not bound to any band")]
    UnknownIdentifier(String),
    #[error("Arrays of shape {lhs:?} and {rhs:?} can not be combined")]
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    #[error("{function} does not take {found} arguments")]
    Arity { function: String, found: usize },
    #[error("{function} expected {expected}, got {found}")]
    Type {
        function: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Expression evaluated to a {0}, not an array")]
    NotAnArray(&'static str),
}

/// Evaluates expressions against named arrays.
pub trait Evaluate {
    /// Words and symbols that are never band identifiers.
    fn vocabulary(&self) -> &Vocabulary;

    /// Evaluate `expression` elementwise over the arrays in `context`.
    fn evaluate(
        &self,
        expression: &str,
        context: &Context,
    ) -> std::result::Result<Array2<f64>, ExpressionError>;

    fn identifiers(&self, expression: &str) -> Vec<String> {
        identifiers(expression, self.vocabulary())
    }
}
