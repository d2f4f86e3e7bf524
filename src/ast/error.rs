use crate::fixed::LiteralError;
use thiserror::Error;

/// Why an expression could not be turned into a syntax tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Parse error: {0}")]
    Grammar(String),
    #[error("Invalid numeric literal '{literal}': {source}")]
    InvalidLiteral {
        literal: String,
        #[source]
        source: LiteralError,
    },
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Expression is not valid ASCII text")]
    InvalidEncoding,
    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}
