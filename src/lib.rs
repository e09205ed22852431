//! A small query language for searching satellite payload configuration
//! records.
//!
//! Operators type expressions like `h1 and submitted by admin` or
//! `(h1 or h2) and not uplinked`; the pipeline lexes the text, parses it by
//! recursive descent into an expression tree and lowers the tree into a
//! composable [`Predicate`] the persistence layer turns into a storage
//! query.
//!
//! ```rust
//! use config_search::interpret_search_query;
//!
//! let predicate = interpret_search_query("h1 and not uplinked").unwrap();
//! ```
//!
//! Failures short-circuit the whole pipeline: a malformed token sequence is
//! a [`ParseError`], a query leaf outside the interpretation table is an
//! [`InterpreterError`]. Both reject the query outright.
//!
//! [`ParseError`]: parser::ParseError
//! [`InterpreterError`]: interpreter::InterpreterError

pub mod ast;
pub mod config;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod sql_compiler;
pub mod token;

use crate::config::SearchSettings;
use crate::interpreter::{Interpreter, InterpreterError};
use crate::parser::{ParseError, Parser};

pub use crate::predicate::Predicate;

/// A rejected search query: either the token sequence violates the grammar,
/// or a structurally valid tree carries a leaf the interpreter has no
/// mapping for.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    Parse(ParseError),
    Interpret(InterpreterError),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Parse(e) => write!(f, "parse error: {}", e),
            SearchError::Interpret(e) => write!(f, "interpreter error: {}", e),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Parse(e) => Some(e),
            SearchError::Interpret(e) => Some(e),
        }
    }
}

impl From<ParseError> for SearchError {
    fn from(e: ParseError) -> Self {
        SearchError::Parse(e)
    }
}

impl From<InterpreterError> for SearchError {
    fn from(e: InterpreterError) -> Self {
        SearchError::Interpret(e)
    }
}

/// Interprets a search query string into a filter predicate, using the
/// default settings (UTC default timezone, default input caps).
pub fn interpret_search_query(text: &str) -> Result<Predicate, SearchError> {
    interpret_search_query_with(text, &SearchSettings::default())
}

/// Interprets a search query string into a filter predicate.
pub fn interpret_search_query_with(
    text: &str,
    settings: &SearchSettings,
) -> Result<Predicate, SearchError> {
    if text.len() > settings.max_query_bytes {
        return Err(SearchError::Parse(ParseError::new(
            format!(
                "Query is {} bytes long, the limit is {}",
                text.len(),
                settings.max_query_bytes
            ),
            None,
        )));
    }

    let tokens = lexer::scan(text);
    let expr = Parser::with_depth_limit(&tokens, settings.max_group_depth).parse()?;
    let predicate = Interpreter::new(settings.default_offset()).evaluate(&expr)?;
    Ok(predicate)
}
