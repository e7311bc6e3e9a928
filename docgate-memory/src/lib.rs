//! In-memory store driver for docgate.
//!
//! Implements [`docgate_core::driver::StoreDriver`] over plain vectors of
//! BSON documents guarded by async read-write locks, with just enough query
//! surface (equality filters, sorting, projection, pagination, a named
//! index registry, duplicate-key detection) to stand in for a real store
//! in tests and development.

mod matcher;
mod store;

pub use store::MemoryDriver;
