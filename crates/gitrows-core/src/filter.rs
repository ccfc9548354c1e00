//! Row predicates pushed down to index lookups
//!
//! Only the predicate shapes an index can answer are modelled: column
//! equality combined with `AND` and `OR`.

use std::fmt;

use crate::error::SchemaError;
use crate::row::{Column, Row, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(Column, Value),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    /// `column = value`, rejecting values of the wrong type for the column
    pub fn eq(column: Column, value: impl Into<Value>) -> Result<Self, SchemaError> {
        let value = value.into();
        check_type(column, &value)?;
        Ok(Filter::Eq(column, value))
    }

    /// Checks every term against the column types of the schema
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            Filter::Eq(column, value) => check_type(*column, value),
            Filter::And(a, b) | Filter::Or(a, b) => {
                a.validate()?;
                b.validate()
            }
        }
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    /// Evaluates the predicate against a row
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(column, value) => row.get(*column) == *value,
            Filter::And(a, b) => a.matches(row) && b.matches(row),
            Filter::Or(a, b) => a.matches(row) || b.matches(row),
        }
    }
}

fn check_type(column: Column, value: &Value) -> Result<(), SchemaError> {
    let is_integer = matches!(value, Value::Integer(_));
    if is_integer != column.is_integer() {
        return Err(SchemaError::Type {
            column: column.name(),
            expected: if column.is_integer() { "integer" } else { "text" },
        });
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq(column, Value::Text(s)) => write!(f, "{} = {:?}", column, s),
            Filter::Eq(column, Value::Integer(n)) => write!(f, "{} = {}", column, n),
            Filter::And(a, b) => write!(f, "({} AND {})", a, b),
            Filter::Or(a, b) => write!(f, "({} OR {})", a, b),
        }
    }
}
