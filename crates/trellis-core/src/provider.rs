//! State providers and the provider chain.
//!
//! A provider turns `(operation, uri variables, request context)` into a
//! final result by resolving the link chain, running the extension pipeline
//! and executing through its adapter. Providers are tried in order by an
//! explicit [`ProviderChain`]: the first one whose `supports` predicate
//! accepts the request handles it, and an exhausted chain reports the class
//! as unsupported.

use crate::adapter::{Item, QueryAdapter};
use crate::context::{QueryContext, RequestContext, UriVariables};
use crate::error::{ProvideError, ProvideResult};
use crate::extension::{CollectionPipeline, ItemPipeline};
use crate::operation::{Operation, OperationKind};
use crate::resolver::LinkChainResolver;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Windowed collection result produced by the pagination extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginator {
    pub items: Vec<Item>,
    pub current_page: u64,
    pub items_per_page: u64,
    pub total_items: u64,
}

impl Paginator {
    /// Last page number, never below 1.
    pub fn last_page(&self) -> u64 {
        if self.total_items == 0 {
            return 1;
        }
        self.total_items.div_ceil(self.items_per_page.max(1))
    }
}

/// Final outcome of a provide call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    /// Single-item read; `None` means the query matched nothing.
    Item(Option<Item>),
    /// Plain collection read.
    Collection(Vec<Item>),
    /// Collection read short-circuited by the pagination extension.
    Paginator(Paginator),
}

/// One source of state for a set of resource classes.
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Unique name for this provider, used in logs.
    fn name(&self) -> &str;

    /// Cheap predicate: whether this provider can answer the operation.
    fn supports(&self, operation: &Operation, context: &RequestContext) -> bool;

    async fn provide(
        &self,
        operation: &Operation,
        uri_variables: &UriVariables,
        context: &RequestContext,
    ) -> ProvideResult<ProviderResult>;
}

/// Generic single-item provider over any backend adapter.
pub struct ItemProvider<A: QueryAdapter> {
    adapter: Arc<A>,
    pipeline: ItemPipeline<A>,
    name: String,
}

impl<A: QueryAdapter> ItemProvider<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            pipeline: ItemPipeline::new(),
            name: "item".to_string(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: ItemPipeline<A>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<A: QueryAdapter + 'static> StateProvider for ItemProvider<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, operation: &Operation, _context: &RequestContext) -> bool {
        operation.kind() == OperationKind::Item && self.adapter.can_handle(operation.class())
    }

    async fn provide(
        &self,
        operation: &Operation,
        uri_variables: &UriVariables,
        context: &RequestContext,
    ) -> ProvideResult<ProviderResult> {
        let query_context = QueryContext::build(operation, uri_variables, context)?;
        let metadata = self.adapter.metadata(operation.class())?;
        let builder = LinkChainResolver::new(self.adapter.as_ref())
            .resolve(&query_context)
            .await?;
        self.pipeline
            .run(
                self.adapter.as_ref(),
                builder,
                metadata,
                uri_variables,
                operation,
                &query_context,
            )
            .await
    }
}

/// Generic collection provider over any backend adapter.
pub struct CollectionProvider<A: QueryAdapter> {
    adapter: Arc<A>,
    pipeline: CollectionPipeline<A>,
    name: String,
}

impl<A: QueryAdapter> CollectionProvider<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            pipeline: CollectionPipeline::new(),
            name: "collection".to_string(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: CollectionPipeline<A>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<A: QueryAdapter + 'static> StateProvider for CollectionProvider<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, operation: &Operation, _context: &RequestContext) -> bool {
        operation.kind() == OperationKind::Collection && self.adapter.can_handle(operation.class())
    }

    async fn provide(
        &self,
        operation: &Operation,
        uri_variables: &UriVariables,
        context: &RequestContext,
    ) -> ProvideResult<ProviderResult> {
        let query_context = QueryContext::build(operation, uri_variables, context)?;
        let metadata = self.adapter.metadata(operation.class())?;
        let builder = LinkChainResolver::new(self.adapter.as_ref())
            .resolve(&query_context)
            .await?;
        self.pipeline
            .run(
                self.adapter.as_ref(),
                builder,
                metadata,
                operation,
                &query_context,
            )
            .await
    }
}

/// Ordered providers tried in sequence until one declares support.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn StateProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl StateProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn register(&mut self, provider: Arc<dyn StateProvider>) {
        self.providers.push(provider);
    }

    /// Dispatch to the first supporting provider.
    pub async fn provide(
        &self,
        operation: &Operation,
        uri_variables: &UriVariables,
        context: &RequestContext,
    ) -> ProvideResult<ProviderResult> {
        for provider in &self.providers {
            if provider.supports(operation, context) {
                debug!(provider = provider.name(), operation = operation.name(), "dispatching");
                return provider.provide(operation, uri_variables, context).await;
            }
        }
        Err(ProvideError::ResourceClassNotSupported(
            operation.class().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::metadata::ResourceClass;
    use crate::test_support::RecordingAdapter;
    use serde_json::json;

    fn class(name: &str) -> ResourceClass {
        ResourceClass::new(name)
    }

    #[test]
    fn test_paginator_last_page() {
        let paginator = Paginator {
            items: Vec::new(),
            current_page: 1,
            items_per_page: 30,
            total_items: 61,
        };
        assert_eq!(paginator.last_page(), 3);

        let empty = Paginator {
            items: Vec::new(),
            current_page: 1,
            items_per_page: 30,
            total_items: 0,
        };
        assert_eq!(empty.last_page(), 1);
    }

    #[tokio::test]
    async fn test_item_provider_returns_first_match() {
        let adapter =
            Arc::new(RecordingAdapter::sample().with_items(vec![json!({"isbn": "978"})]));
        let provider = ItemProvider::new(adapter);
        let operation = Operation::item("book_get", class("Book")).with_uri_variable(
            Link::identity("id", class("Book"), vec!["isbn".into()]),
        );
        let vars = UriVariables::new().with("id", "978");

        let result = provider
            .provide(&operation, &vars, &RequestContext::new())
            .await
            .unwrap();
        assert!(matches!(result, ProviderResult::Item(Some(_))));
    }

    #[tokio::test]
    async fn test_chain_dispatches_to_first_supporting_provider() {
        let adapter = Arc::new(RecordingAdapter::sample());
        let chain = ProviderChain::new()
            .with_provider(ItemProvider::new(adapter.clone()).with_name("items"))
            .with_provider(CollectionProvider::new(adapter).with_name("collections"));

        let operation = Operation::collection("books", class("Book"));
        let result = chain
            .provide(&operation, &UriVariables::new(), &RequestContext::new())
            .await
            .unwrap();
        assert!(matches!(result, ProviderResult::Collection(_)));
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_unsupported_class() {
        let adapter = Arc::new(RecordingAdapter::sample());
        let chain = ProviderChain::new().with_provider(ItemProvider::new(adapter));

        // No registered provider handles an unknown class.
        let operation = Operation::item("movie_get", class("Movie"));
        let err = chain
            .provide(&operation, &UriVariables::new(), &RequestContext::new())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
