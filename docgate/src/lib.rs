//! Main docgate crate: a data-access facade for document stores.
//!
//! Re-exports the core modules and the in-memory driver, and provides a
//! [`prelude`] with the types most applications need.
//!
//! # Quick Start
//!
//! ```ignore
//! use docgate::{prelude::*, memory::MemoryDriver};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocGateResult<()> {
//!     let mut repo = Repository::builder(MemoryDriver::new())
//!         .collection("users")
//!         .index(IndexSpec::on_field("email", IndexDirection::Asc))
//!         .build();
//!
//!     repo.init().await?;
//!     repo.ensure_indexes().await?;
//!
//!     repo.insert_one(doc! { "id": "u-1", "name": "Alice" }).await?;
//!
//!     let page = repo
//!         .find(doc! {}, None)?
//!         .sort(doc! { "name": 1 })
//!         .limit(10)
//!         .run()
//!         .await?;
//!
//!     println!("{} of {} users", page.docs.len(), page.total);
//!     Ok(())
//! }
//! ```
//!
//! # Instrumentation
//!
//! Every facade operation delivers one timing record to the installed
//! [`instrument::InstrumentSink`]; with no sink installed, records are
//! dropped silently. Install one at construction time with
//! `RepositoryBuilder::debugger` or later with `Repository::set_debugger`.

pub mod prelude;

pub use docgate_core::{driver, entity, error, index, instrument, page, query, repo};

// Re-export BSON types for convenience
pub use bson;

/// In-memory driver, suitable for tests and development.
pub mod memory {
    pub use docgate_memory::MemoryDriver;
}
