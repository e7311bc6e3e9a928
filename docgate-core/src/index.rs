//! Index declarations consumed by the reconciliation pass.
//!
//! An [`IndexSpec`] describes one lookup structure the store should
//! maintain: the indexed fields with their directions, and the options the
//! driver forwards to the store. The `name` inside [`IndexOptions`] is the
//! reconciliation key — [`crate::repo::Repository::ensure_indexes`] checks
//! existence by name and creates only the declarations the store is
//! missing.

use bson::{Document, doc};

/// Sort direction of one indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDirection {
    /// Ascending key order.
    Asc,
    /// Descending key order.
    Desc,
}

impl IndexDirection {
    /// Numeric form used in store-level key documents (`1` / `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            IndexDirection::Asc => 1,
            IndexDirection::Desc => -1,
        }
    }
}

/// Options forwarded to the store when an index is created.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOptions {
    /// Store-side index name; the reconciliation key.
    pub name: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexOptions {
    /// Creates non-unique options with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), unique: false }
    }

    /// Marks the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// One declared index: field-to-direction keys plus creation options.
///
/// Declarations are ordered, fixed at facade construction time, and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Field → direction mapping in declaration order.
    pub keys: Document,
    /// Creation options; `options.name` identifies the index on the store.
    pub options: IndexOptions,
}

impl IndexSpec {
    /// Creates a declaration from an explicit key document.
    pub fn new(keys: Document, options: IndexOptions) -> Self {
        Self { keys, options }
    }

    /// Single-field declaration named after the field.
    pub fn on_field(field: impl Into<String>, direction: IndexDirection) -> Self {
        let field = field.into();
        Self {
            keys: doc! { field.as_str(): direction.as_i32() },
            options: IndexOptions::named(field),
        }
    }

    /// The store-side index name used as the reconciliation key.
    pub fn name(&self) -> &str {
        &self.options.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_field_names_index_after_field() {
        let spec = IndexSpec::on_field("email", IndexDirection::Asc);
        assert_eq!(spec.name(), "email");
        assert_eq!(spec.keys, doc! { "email": 1 });
        assert!(!spec.options.unique);
    }

    #[test]
    fn unique_option_is_composable() {
        let spec = IndexSpec::new(
            doc! { "email": 1, "tenant": -1 },
            IndexOptions::named("email_tenant").unique(),
        );
        assert!(spec.options.unique);
        assert_eq!(spec.name(), "email_tenant");
    }
}
