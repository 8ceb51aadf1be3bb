//! Value-transform expressions attached to hysds-io parameters.
//!
//! An expression is a one-argument `lambda x: ...` written in a small
//! Python-flavoured language. It is parsed and interpreted here; no host
//! evaluator is involved and the only names in scope are the lambda's
//! parameter and the allow-list in `builtins`.
//!
//! Validation smoke-tests the expression once against a fixed string.
//! Referencing a name outside the allow-list fails validation; any other
//! runtime failure is tolerated because real inputs may differ from the
//! sentinel.

pub mod builtins;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod value;

use thiserror::Error;
use value::Value;

pub const SMOKE_TEST_VALUE: &str = "Some test value";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (column {column})")]
pub struct ParseError {
    pub message: String,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, column: usize) -> Self {
        Self {
            message: message.into(),
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("NameError: name '{0}' is not defined")]
    Unresolved(String),

    #[error("{kind}: {message}")]
    Runtime { kind: &'static str, message: String },
}

impl EvalError {
    pub fn runtime(kind: &'static str, message: impl Into<String>) -> Self {
        EvalError::Runtime {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::runtime("ValueError", message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::runtime("AttributeError", message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::runtime("ZeroDivisionError", message)
    }

    pub fn memory_error() -> Self {
        Self::runtime("MemoryError", "sequence too large")
    }
}

/// Why an expression was rejected. Rendered after "... for parameter, <name>, which".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LambdaError {
    #[error("does not equate to a lambda function")]
    NotALambda,

    #[error("errors on compile. SyntaxError: {0}")]
    Syntax(#[from] ParseError),

    #[error("does not accept exactly 1 argument (declares {0})")]
    Arity(usize),

    #[error("references name '{name}', which is not defined (allowed names: {allowed})")]
    Unresolved { name: String, allowed: String },
}

fn has_marker(src: &str) -> bool {
    src.trim_start()
        .strip_prefix("lambda")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_whitespace() || c == ':')
}

pub fn validate_lambda(src: &str) -> Result<(), LambdaError> {
    if !has_marker(src) {
        return Err(LambdaError::NotALambda);
    }

    let lambda = parse::parse_lambda(src)?;
    if lambda.params.len() != 1 {
        return Err(LambdaError::Arity(lambda.params.len()));
    }

    match eval::call(&lambda, vec![Value::Str(SMOKE_TEST_VALUE.to_string())]) {
        Ok(result) => {
            tracing::trace!(result = %result.repr(), "lambda smoke test passed");
            Ok(())
        }
        Err(EvalError::Unresolved(name)) => Err(LambdaError::Unresolved {
            name,
            allowed: builtins::names().collect::<Vec<_>>().join(", "),
        }),
        Err(err) => {
            tracing::debug!(error = %err, "tolerated lambda smoke-test failure");
            Ok(())
        }
    }
}
