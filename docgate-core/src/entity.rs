//! Typed entity layer over raw BSON documents.
//!
//! Application types that implement [`Entity`] declare their identifier and
//! home collection; [`EntityExt`] provides the BSON round-trips used when
//! feeding them through the facade. Raw pages convert with
//! [`crate::page::Page::decode`].

use bson::{Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Deserialize, Serialize};

use crate::error::DocGateResult;

/// A document type with a client-supplied identifier and a fixed home
/// collection.
///
/// The identifier lives under the `id` field of the serialized form; the
/// facade copies it into the store's primary key on insertion.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> String {
///         self.id.clone()
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// This entity's identifier.
    fn id(&self) -> String;

    /// The collection this entity type is stored in.
    fn collection_name() -> &'static str;
}

/// BSON conversion helpers, implemented for every [`Entity`].
pub trait EntityExt: Entity {
    /// Serializes the entity into a BSON document.
    fn to_document(&self) -> DocGateResult<Document>;

    /// Deserializes an entity from a BSON document.
    fn from_document(document: Document) -> DocGateResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> DocGateResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> DocGateResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        label: String,
    }

    impl Entity for Widget {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn collection_name() -> &'static str {
            "widgets"
        }
    }

    #[test]
    fn round_trips_through_bson() {
        let widget = Widget { id: "w-1".into(), label: "gear".into() };
        let document = widget.to_document().unwrap();
        assert_eq!(document, doc! { "id": "w-1", "label": "gear" });
        assert_eq!(Widget::from_document(document).unwrap(), widget);
    }

    #[test]
    fn malformed_document_is_a_serialization_error() {
        let err = Widget::from_document(doc! { "label": 3 }).unwrap_err();
        assert_eq!(err.code(), "SERIALIZATION");
    }
}
