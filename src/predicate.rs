//! The backend-agnostic filter predicate produced by the interpreter.

use chrono::{DateTime, FixedOffset};

/// A composable boolean filter over configuration records.
///
/// The persistence layer is responsible for lowering this tree into a
/// storage-level query; the search pipeline itself never touches storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The field holds exactly this value.
    FieldEquals { field: Field, value: FieldValue },
    /// The nullable field is present.
    FieldIsNotNull { field: Field },
    /// The timestamp field compares against an instant.
    FieldCompare {
        field: Field,
        op: CompareOp,
        at: DateTime<FixedOffset>,
    },
    /// The related user's username matches.
    FieldEqualsRelationUsername { relation: Relation, username: String },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(left: Predicate, right: Predicate) -> Predicate {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Predicate {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Predicate) -> Predicate {
        Predicate::Not(Box::new(inner))
    }
}

/// Columns of the configuration record reachable from the search language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Model,
    Acq,
    Acq0,
    Asic0,
    Asic1,
    Bee,
    Liktrg,
    Obs,
    Submitted,
    Uplinked,
    SubmitTime,
    UplinkTime,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Model => "model",
            Field::Acq => "acq",
            Field::Acq0 => "acq0",
            Field::Asic0 => "asic0",
            Field::Asic1 => "asic1",
            Field::Bee => "bee",
            Field::Liktrg => "liktrg",
            Field::Obs => "obs",
            Field::Submitted => "submitted",
            Field::Uplinked => "uplinked",
            Field::SubmitTime => "submit_time",
            Field::UplinkTime => "uplink_time",
        }
    }
}

/// User-reference columns reachable through an attribution (`by`) query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Author,
    UplinkedBy,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Author => "author",
            Relation::UplinkedBy => "uplinked_by",
        }
    }
}

/// Comparison operators on timestamp fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    NotEq,
}

/// A concrete value in an equality condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}
