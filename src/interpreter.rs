//! Lowers an expression tree into a [`Predicate`] the persistence layer can
//! turn into a storage query.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

use crate::ast::Expr;
use crate::predicate::{CompareOp, Field, FieldValue, Predicate, Relation};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterError {
    pub message: String,
}

impl InterpreterError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InterpreterError {}

/// Walks an expression tree and emits the matching predicate.
///
/// The query leaves a successful parse can produce are a closed set; a leaf
/// outside that set means the grammar and this table drifted apart, and is
/// reported as an [`InterpreterError`].
pub struct Interpreter {
    /// Offset attached to datetime literals that carry no timezone.
    default_offset: FixedOffset,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Interpreter {
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Predicate, InterpreterError> {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::And => Ok(Predicate::and(left, right)),
                    TokenKind::Or => Ok(Predicate::or(left, right)),
                    _ => Err(InterpreterError::new(format!(
                        "Invalid binary operator '{}'",
                        operator.lexeme
                    ))),
                }
            }
            Expr::Unary { operator, operand } => {
                let inner = self.evaluate(operand)?;
                match operator.kind {
                    TokenKind::Not => Ok(Predicate::not(inner)),
                    _ => Err(InterpreterError::new(format!(
                        "Invalid unary operator '{}'",
                        operator.lexeme
                    ))),
                }
            }
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Query {
                key,
                operator,
                value,
            } => self.evaluate_query(key, operator, value),
        }
    }

    fn evaluate_query(
        &self,
        key: &Token,
        operator: &Token,
        value: &Token,
    ) -> Result<Predicate, InterpreterError> {
        if key.kind == TokenKind::Model {
            if operator.kind == TokenKind::Eq {
                if let Some(code) = model_code(value.kind) {
                    return Ok(Predicate::FieldEquals {
                        field: Field::Model,
                        value: FieldValue::Text(code.to_string()),
                    });
                }
            }
            return Err(InterpreterError::new("Invalid model query".to_string()));
        }

        if let Some(field) = config_field(key.kind) {
            if operator.kind == TokenKind::IsNull && value.kind == TokenKind::IsNull {
                return Ok(Predicate::FieldIsNotNull { field });
            }
            return Err(InterpreterError::new(
                "Invalid configuration query".to_string(),
            ));
        }

        if key.kind.is_status_word() {
            if let Some(op) = compare_op(operator.kind) {
                let field = match key.kind {
                    TokenKind::Submitted => Field::SubmitTime,
                    _ => Field::UplinkTime,
                };
                let at = self.parse_datetime(value.lexeme)?;
                return Ok(Predicate::FieldCompare { field, op, at });
            }

            if operator.kind == TokenKind::By {
                let relation = match key.kind {
                    TokenKind::Submitted => Relation::Author,
                    _ => Relation::UplinkedBy,
                };
                return Ok(Predicate::FieldEqualsRelationUsername {
                    relation,
                    username: value.lexeme.to_string(),
                });
            }

            if operator.kind == TokenKind::IsNull && value.kind == TokenKind::IsNull {
                let field = match key.kind {
                    TokenKind::Submitted => Field::Submitted,
                    _ => Field::Uplinked,
                };
                return Ok(Predicate::FieldEquals {
                    field,
                    value: FieldValue::Bool(true),
                });
            }

            return Err(InterpreterError::new("Invalid status query".to_string()));
        }

        Err(InterpreterError::new(format!(
            "Invalid query key '{}'",
            key.lexeme
        )))
    }

    /// Parses one of the five datetime literal shapes. A trailing `Z` marks
    /// UTC; a value without it gets the configured default offset.
    fn parse_datetime(&self, lexeme: &str) -> Result<DateTime<FixedOffset>, InterpreterError> {
        let (body, offset) = match lexeme.strip_suffix('Z') {
            Some(body) => (body, Utc.fix()),
            None => (lexeme, self.default_offset),
        };

        let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M"))
            .or_else(|_| {
                NaiveDate::parse_from_str(body, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
            })
            .map_err(|_| {
                InterpreterError::new(format!("'{}' is not a valid datetime", lexeme))
            })?;

        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| InterpreterError::new(format!("'{}' is not a valid datetime", lexeme)))
    }
}

fn model_code(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::ModelH1 => Some("H1"),
        TokenKind::ModelH2 => Some("H2"),
        TokenKind::ModelH3 => Some("H3"),
        TokenKind::ModelH4 => Some("H4"),
        TokenKind::ModelH5 => Some("H5"),
        TokenKind::ModelH6 => Some("H6"),
        _ => None,
    }
}

fn config_field(kind: TokenKind) -> Option<Field> {
    match kind {
        TokenKind::ConfigAcq => Some(Field::Acq),
        TokenKind::ConfigAcq0 => Some(Field::Acq0),
        TokenKind::ConfigAsic0 => Some(Field::Asic0),
        TokenKind::ConfigAsic1 => Some(Field::Asic1),
        TokenKind::ConfigBee => Some(Field::Bee),
        TokenKind::ConfigLiktrg => Some(Field::Liktrg),
        TokenKind::ConfigObs => Some(Field::Obs),
        _ => None,
    }
}

fn compare_op(kind: TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::Gte => Some(CompareOp::Gte),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::Lte => Some(CompareOp::Lte),
        TokenKind::Eq => Some(CompareOp::Eq),
        TokenKind::NotEq => Some(CompareOp::NotEq),
        _ => None,
    }
}
