//! Document backend for Trellis.
//!
//! Implements the core adapter contract with aggregation pipelines:
//! link-chain constraints become `$lookup` and `$match` stages, forward-
//! relation projections materialize the inner aggregation and splice an
//! `$in` match, and pagination renders `$count` plus `$skip`/`$limit`.
//! Pipeline execution is delegated to an injected [`DocumentDriver`].

pub mod adapter;
pub mod builder;
pub mod driver;
pub mod stage;

pub use adapter::DocumentAdapter;
pub use builder::AggregationBuilder;
pub use driver::DocumentDriver;
pub use stage::Stage;

use trellis_core::provider::{CollectionProvider, ItemProvider};

/// Single-item provider backed by the document adapter.
pub type DocumentItemProvider = ItemProvider<DocumentAdapter>;

/// Collection provider backed by the document adapter.
pub type DocumentCollectionProvider = CollectionProvider<DocumentAdapter>;
