//! A data-access facade between application code and a document-oriented
//! data store.
//!
//! This crate is the core of the docgate project and provides:
//!
//! - **Store driver abstraction** ([`driver`]) - The capability surface a
//!   document store must implement
//! - **CRUD facade** ([`repo`]) - Bound-collection operations, error
//!   normalization, and two-phase index reconciliation
//! - **Lazy query chain** ([`query`]) - Deferred filter/sort/pagination
//!   composition with a concurrent count-and-fetch terminal step
//! - **Instrumentation** ([`instrument`]) - Per-operation timing records
//!   delivered to an injectable sink
//! - **Typed entities** ([`entity`]) - Serde-backed document types
//! - **Pagination** ([`page`]) - Page results carrying the full filtered
//!   count
//! - **Error handling** ([`error`]) - Stable application error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use docgate_core::repo::Repository;
//! use docgate_core::index::{IndexDirection, IndexSpec};
//! use bson::doc;
//!
//! let mut repo = Repository::builder(driver)
//!     .collection("users")
//!     .index(IndexSpec::on_field("email", IndexDirection::Asc))
//!     .build();
//!
//! repo.init().await?;
//! repo.ensure_indexes().await?;
//!
//! let page = repo
//!     .find(doc! { "active": true }, None)?
//!     .sort(doc! { "email": 1 })
//!     .limit(20)
//!     .run()
//!     .await?;
//! ```

pub mod driver;
pub mod entity;
pub mod error;
pub mod index;
pub mod instrument;
pub mod page;
pub mod query;
pub mod repo;
