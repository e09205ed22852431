//! SQL compiler that lowers predicate trees into SQL using sea-query.
//!
//! This is the demonstration consumer of [`Predicate`]: the record store
//! behind the web application performs the same lowering against its own
//! schema. Nothing here executes queries.

use sea_query::{
    Asterisk, Expr as SqlExpr, Iden, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
    Value,
};

use crate::config::SearchSettings;
use crate::predicate::{CompareOp, Field, FieldValue, Predicate, Relation};
use crate::SearchError;

/// Table identifiers of the record store.
#[derive(Debug, Clone, Copy)]
pub enum SearchTable {
    Configurations,
    Users,
}

impl Iden for SearchTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let name = match self {
            SearchTable::Configurations => "configurations",
            SearchTable::Users => "users",
        };
        write!(s, "{}", name).unwrap();
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone, Copy)]
pub struct ColumnName(pub &'static str);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Lowers a predicate into the WHERE-clause expression.
pub fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    match predicate {
        Predicate::FieldEquals { field, value } => {
            record_column(*field).eq(field_value(value))
        }
        Predicate::FieldIsNotNull { field } => record_column(*field).is_not_null(),
        Predicate::FieldCompare { field, op, at } => {
            let col = record_column(*field);
            let at = Value::from(*at);
            match op {
                CompareOp::Gt => col.gt(at),
                CompareOp::Gte => col.gte(at),
                CompareOp::Lt => col.lt(at),
                CompareOp::Lte => col.lte(at),
                CompareOp::Eq => col.eq(at),
                CompareOp::NotEq => col.ne(at),
            }
        }
        Predicate::FieldEqualsRelationUsername { relation, username } => {
            // the user reference resolves through a sub-select on the users table
            let mut sub = Query::select();
            sub.column(ColumnName("id"))
                .from(SearchTable::Users)
                .and_where(
                    SqlExpr::col((SearchTable::Users, ColumnName("username")))
                        .eq(username.clone()),
                );
            record_relation_column(*relation).in_subquery(sub)
        }
        Predicate::And(left, right) => predicate_expr(left).and(predicate_expr(right)),
        Predicate::Or(left, right) => predicate_expr(left).or(predicate_expr(right)),
        Predicate::Not(inner) => predicate_expr(inner).not(),
    }
}

/// Builds the full record SELECT for a predicate.
pub fn build_search_select(predicate: &Predicate) -> SelectStatement {
    let mut select = Query::select();
    select
        .column(Asterisk)
        .from(SearchTable::Configurations)
        .and_where(predicate_expr(predicate));
    select
}

/// Renders the record SELECT for a predicate as Postgres SQL text.
pub fn render_sql(predicate: &Predicate) -> String {
    build_search_select(predicate).to_string(PostgresQueryBuilder)
}

/// Compiles a raw search expression all the way down to SQL text.
pub fn compile_search_query(text: &str, settings: &SearchSettings) -> Result<String, SearchError> {
    let predicate = crate::interpret_search_query_with(text, settings)?;
    Ok(render_sql(&predicate))
}

fn record_column(field: Field) -> SqlExpr {
    SqlExpr::col((SearchTable::Configurations, ColumnName(field.as_str())))
}

fn record_relation_column(relation: Relation) -> SqlExpr {
    SqlExpr::col((SearchTable::Configurations, ColumnName(relation.as_str())))
}

fn field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(Some(Box::new(s.clone()))),
        FieldValue::Bool(b) => Value::Bool(Some(*b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> String {
        compile_search_query(text, &SearchSettings::default()).unwrap()
    }

    #[test]
    fn test_model_query_sql() {
        let sql = compile("h1");
        assert!(sql.starts_with(r#"SELECT * FROM "configurations""#), "got: {}", sql);
        assert!(sql.contains("model"), "got: {}", sql);
        assert!(sql.contains("H1"), "got: {}", sql);
    }

    #[test]
    fn test_config_presence_sql() {
        let sql = compile("acq");
        assert!(sql.contains("IS NOT NULL"), "got: {}", sql);
        assert!(sql.contains("acq"), "got: {}", sql);
    }

    #[test]
    fn test_status_flag_sql() {
        let sql = compile("uplinked");
        assert!(sql.contains("uplinked"), "got: {}", sql);
    }

    #[test]
    fn test_attribution_sql_uses_subselect() {
        let sql = compile("submitted by admin");
        assert!(sql.contains("IN (SELECT"), "got: {}", sql);
        assert!(sql.contains("username"), "got: {}", sql);
        assert!(sql.contains("author"), "got: {}", sql);
        assert!(sql.contains("admin"), "got: {}", sql);

        let sql = compile("uplinked by testuser");
        assert!(sql.contains("uplinked_by"), "got: {}", sql);
    }

    #[test]
    fn test_datetime_comparison_sql() {
        let sql = compile("submitted >= 2023-01-01");
        assert!(sql.contains("submit_time"), "got: {}", sql);
        assert!(sql.contains(">="), "got: {}", sql);
        assert!(sql.contains("2023-01-01"), "got: {}", sql);
    }

    #[test]
    fn test_logical_composition_sql() {
        let sql = compile("(h1 or h2) and not uplinked");
        assert!(sql.contains("OR"), "got: {}", sql);
        assert!(sql.contains("AND"), "got: {}", sql);
        assert!(sql.contains("NOT"), "got: {}", sql);
    }

    #[test]
    fn test_malformed_query_is_rejected() {
        let result = compile_search_query("submitted >", &SearchSettings::default());
        assert!(result.is_err());
    }
}
