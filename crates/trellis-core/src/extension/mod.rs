//! Extension pipeline.
//!
//! Extensions are ordered, pluggable stages that mutate the builder before
//! execution. A stage is either a plain mutator or a mutator that can also
//! produce the final result; the capability is resolved once when the
//! pipeline is constructed, not per call. Execution is strictly in
//! registration order, and the first result-capable stage whose
//! `supports_result` returns true short-circuits the pipeline; the base
//! query never executes directly.
//!
//! Stage ordering is a configuration concern: a result extension such as
//! pagination must be registered last, which the pipeline documents but
//! does not enforce.

mod filter;
mod order;
mod pagination;

pub use filter::FilterExtension;
pub use order::OrderExtension;
pub use pagination::PaginationExtension;

use crate::adapter::QueryAdapter;
use crate::context::{QueryContext, UriVariables};
use crate::error::ProvideResult;
use crate::metadata::ResourceMetadata;
use crate::operation::Operation;
use crate::provider::ProviderResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Mutating stage applied while building a collection query.
pub trait CollectionExtension<A: QueryAdapter>: Send + Sync {
    fn apply_to_collection(
        &self,
        adapter: &A,
        builder: &mut A::Builder,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<()>;
}

/// Mutating stage applied while building an item query.
pub trait ItemExtension<A: QueryAdapter>: Send + Sync {
    fn apply_to_item(
        &self,
        adapter: &A,
        builder: &mut A::Builder,
        metadata: &ResourceMetadata,
        uri_variables: &UriVariables,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<()>;
}

/// A collection stage that can terminate the pipeline with the final
/// result.
#[async_trait]
pub trait ResultCollectionExtension<A: QueryAdapter>: CollectionExtension<A> {
    fn supports_result(
        &self,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> bool;

    async fn result(
        &self,
        adapter: &A,
        builder: A::Builder,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<ProviderResult>;
}

/// An item stage that can terminate the pipeline with the final result.
#[async_trait]
pub trait ResultItemExtension<A: QueryAdapter>: ItemExtension<A> {
    fn supports_result(
        &self,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> bool;

    async fn result(
        &self,
        adapter: &A,
        builder: A::Builder,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<ProviderResult>;
}

/// Stage capability, resolved at construction.
enum CollectionStage<A: QueryAdapter> {
    Mutate(Arc<dyn CollectionExtension<A>>),
    MutateWithResult(Arc<dyn ResultCollectionExtension<A>>),
}

enum ItemStage<A: QueryAdapter> {
    Mutate(Arc<dyn ItemExtension<A>>),
    MutateWithResult(Arc<dyn ResultItemExtension<A>>),
}

/// Ordered extension pipeline for collection operations.
pub struct CollectionPipeline<A: QueryAdapter> {
    stages: Vec<CollectionStage<A>>,
}

impl<A: QueryAdapter> Default for CollectionPipeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: QueryAdapter> CollectionPipeline<A> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_extension(mut self, extension: impl CollectionExtension<A> + 'static) -> Self {
        self.stages.push(CollectionStage::Mutate(Arc::new(extension)));
        self
    }

    pub fn with_result_extension(
        mut self,
        extension: impl ResultCollectionExtension<A> + 'static,
    ) -> Self {
        self.stages
            .push(CollectionStage::MutateWithResult(Arc::new(extension)));
        self
    }

    /// Run every stage in order; the first stage owning the result ends the
    /// pipeline, otherwise the base query executes after the last stage.
    pub async fn run(
        &self,
        adapter: &A,
        mut builder: A::Builder,
        metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<ProviderResult> {
        for stage in &self.stages {
            match stage {
                CollectionStage::Mutate(extension) => {
                    extension.apply_to_collection(adapter, &mut builder, metadata, operation, context)?;
                }
                CollectionStage::MutateWithResult(extension) => {
                    extension.apply_to_collection(adapter, &mut builder, metadata, operation, context)?;
                    if extension.supports_result(metadata, operation, context) {
                        debug!(operation = operation.name(), "result extension short-circuits pipeline");
                        return extension
                            .result(adapter, builder, metadata, operation, context)
                            .await;
                    }
                }
            }
        }
        let items = adapter.execute(builder, context.execute_options()).await?;
        Ok(ProviderResult::Collection(items))
    }
}

/// Ordered extension pipeline for item operations.
pub struct ItemPipeline<A: QueryAdapter> {
    stages: Vec<ItemStage<A>>,
}

impl<A: QueryAdapter> Default for ItemPipeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: QueryAdapter> ItemPipeline<A> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_extension(mut self, extension: impl ItemExtension<A> + 'static) -> Self {
        self.stages.push(ItemStage::Mutate(Arc::new(extension)));
        self
    }

    pub fn with_result_extension(
        mut self,
        extension: impl ResultItemExtension<A> + 'static,
    ) -> Self {
        self.stages
            .push(ItemStage::MutateWithResult(Arc::new(extension)));
        self
    }

    /// Run every stage in order, then execute unless a stage owned the
    /// result. Zero matching rows is `Item(None)`, not an error.
    pub async fn run(
        &self,
        adapter: &A,
        mut builder: A::Builder,
        metadata: &ResourceMetadata,
        uri_variables: &UriVariables,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<ProviderResult> {
        for stage in &self.stages {
            match stage {
                ItemStage::Mutate(extension) => {
                    extension.apply_to_item(
                        adapter,
                        &mut builder,
                        metadata,
                        uri_variables,
                        operation,
                        context,
                    )?;
                }
                ItemStage::MutateWithResult(extension) => {
                    extension.apply_to_item(
                        adapter,
                        &mut builder,
                        metadata,
                        uri_variables,
                        operation,
                        context,
                    )?;
                    if extension.supports_result(metadata, operation, context) {
                        debug!(operation = operation.name(), "result extension short-circuits pipeline");
                        return extension
                            .result(adapter, builder, metadata, operation, context)
                            .await;
                    }
                }
            }
        }
        let items = adapter.execute(builder, context.execute_options()).await?;
        Ok(ProviderResult::Item(items.into_iter().next()))
    }
}
