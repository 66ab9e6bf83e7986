//! Relational backend for Trellis.
//!
//! Implements the core adapter contract with SQL joins: link-chain
//! constraints become `INNER JOIN`/`WHERE` clauses, forward-relation
//! projections become `IN (SELECT ...)` subselects, and pagination renders
//! `COUNT(*)` plus `LIMIT`/`OFFSET`. Statement execution is delegated to an
//! injected [`SqlDriver`].

pub mod adapter;
pub mod builder;
pub mod driver;

pub use adapter::SqlAdapter;
pub use builder::{SqlQuery, SqlQueryBuilder};
pub use driver::SqlDriver;

use trellis_core::provider::{CollectionProvider, ItemProvider};

/// Single-item provider backed by the relational adapter.
pub type SqlItemProvider = ItemProvider<SqlAdapter>;

/// Collection provider backed by the relational adapter.
pub type SqlCollectionProvider = CollectionProvider<SqlAdapter>;
