//! Filter matching, sorting, and projection for the in-memory driver.

use bson::{Bson, Document};
use std::cmp::Ordering;

/// Type-erased, comparable view over BSON values used when sorting.
///
/// Numeric types are normalized to f64. Values of different kinds compare
/// as equal, which keeps sorts stable over mixed collections.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            _ => Comparable::Null,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Whether `document` matches every top-level field of `filter` by
/// equality. An empty filter matches everything.
pub(crate) fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

/// Compares two documents field by field per a field → direction sort
/// document (`1` ascending, anything else descending).
pub(crate) fn compare(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let left = a.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = b.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match direction.as_i32() {
            Some(d) if d < 0 => right.partial_cmp(&left),
            _ => left.partial_cmp(&right),
        }
        .unwrap_or(Ordering::Equal);

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Applies an inclusion projection. The primary key is retained unless the
/// projection excludes it explicitly with `_id: 0`.
pub(crate) fn project(document: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return document.clone();
    };
    if projection.is_empty() {
        return document.clone();
    }

    let keep_id = projection.get("_id").and_then(Bson::as_i32) != Some(0);

    document
        .iter()
        .filter(|(field, _)| {
            if *field == "_id" {
                keep_id
            } else {
                projection.get(field).and_then(Bson::as_i32).unwrap_or(0) != 0
            }
        })
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
