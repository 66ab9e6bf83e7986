//! Core resolution engine for Trellis.
//!
//! Trellis resolves a typed graph of resource relationships into an
//! executable query against either a relational store (joins) or a document
//! store (aggregation pipeline), given identifier values taken from a
//! request path, and produces the final result through an ordered chain of
//! pluggable extensions.
//!
//! This crate is backend-agnostic: it owns the metadata model, the
//! identifier codec, the link-chain resolver, the extension pipeline and
//! the provider chain, all written against the [`adapter::QueryAdapter`]
//! contract. The `trellis-sql` and `trellis-aggregation` crates supply the
//! two backend implementations.

pub mod adapter;
pub mod config;
pub mod context;
pub mod error;
pub mod extension;
pub mod identifier;
pub mod link;
pub mod metadata;
pub mod namegen;
pub mod operation;
pub mod provider;
pub mod resolver;
pub mod test_support;

pub use adapter::{ExecuteOptions, Item, JoinKind, QueryAdapter};
pub use config::PaginationConfig;
pub use context::{BoundLink, QueryContext, RequestContext, UriVariables};
pub use error::{ProvideError, ProvideResult};
pub use extension::{
    CollectionExtension, CollectionPipeline, FilterExtension, ItemExtension, ItemPipeline,
    OrderExtension, PaginationExtension, ResultCollectionExtension, ResultItemExtension,
};
pub use identifier::{compose, decompose, Identifier, IdentifierError};
pub use link::Link;
pub use metadata::{
    RelationKind, RelationMetadata, ResourceClass, ResourceMetadata, ResourceRegistry,
};
pub use namegen::NameGenerator;
pub use operation::{Operation, OperationKind, OrderDirection};
pub use provider::{
    CollectionProvider, ItemProvider, Paginator, ProviderChain, ProviderResult, StateProvider,
};
pub use resolver::LinkChainResolver;
