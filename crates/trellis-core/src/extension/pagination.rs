//! Pagination as a result extension.
//!
//! Applies the result window while the builder is being mutated, then owns
//! the final result: a count query plus the windowed query, wrapped in a
//! [`Paginator`]. Register it last: a stage running after it would mutate
//! a builder whose result is already spoken for.

use crate::adapter::QueryAdapter;
use crate::config::PaginationConfig;
use crate::context::QueryContext;
use crate::error::ProvideResult;
use crate::extension::{CollectionExtension, ResultCollectionExtension};
use crate::metadata::ResourceMetadata;
use crate::operation::Operation;
use crate::provider::{Paginator, ProviderResult};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PaginationExtension {
    config: PaginationConfig,
}

impl PaginationExtension {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    fn enabled_for(&self, operation: &Operation) -> bool {
        operation.pagination_enabled().unwrap_or(self.config.enabled)
    }

    /// Requested page, starting at 1. Absent or unreadable values fall back
    /// to the first page.
    fn page(&self, context: &QueryContext) -> u64 {
        context
            .filters()
            .get(&self.config.page_parameter)
            .and_then(parse_positive)
            .unwrap_or(1)
    }

    /// Page size: the configured default, or the client-requested size when
    /// the parameter is enabled, clamped to the configured maximum.
    fn items_per_page(&self, context: &QueryContext) -> u64 {
        let requested = self
            .config
            .items_per_page_parameter
            .as_ref()
            .and_then(|parameter| context.filters().get(parameter))
            .and_then(parse_positive);
        let size = requested.unwrap_or(self.config.items_per_page);
        match self.config.maximum_items_per_page {
            Some(maximum) => size.min(maximum),
            None => size,
        }
        .max(1)
    }
}

fn parse_positive(value: &Value) -> Option<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.filter(|n| *n > 0)
}

impl<A: QueryAdapter> CollectionExtension<A> for PaginationExtension {
    fn apply_to_collection(
        &self,
        adapter: &A,
        builder: &mut A::Builder,
        _metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<()> {
        if !self.enabled_for(operation) {
            return Ok(());
        }
        let page = self.page(context);
        let items_per_page = self.items_per_page(context);
        debug!(page, items_per_page, "applying result window");
        adapter.set_window(builder, (page - 1) * items_per_page, items_per_page);
        Ok(())
    }
}

#[async_trait]
impl<A: QueryAdapter> ResultCollectionExtension<A> for PaginationExtension {
    fn supports_result(
        &self,
        _metadata: &ResourceMetadata,
        operation: &Operation,
        _context: &QueryContext,
    ) -> bool {
        self.enabled_for(operation)
    }

    async fn result(
        &self,
        adapter: &A,
        builder: A::Builder,
        _metadata: &ResourceMetadata,
        operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<ProviderResult> {
        let total_items = adapter.count(&builder, context.execute_options()).await?;
        let items = adapter.execute(builder, context.execute_options()).await?;
        debug!(
            operation = operation.name(),
            total_items,
            returned = items.len(),
            "paginated collection"
        );
        Ok(ProviderResult::Paginator(Paginator {
            items,
            current_page: self.page(context),
            items_per_page: self.items_per_page(context),
            total_items,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContext, UriVariables};
    use crate::metadata::ResourceClass;
    use crate::test_support::RecordingAdapter;
    use serde_json::json;

    fn fixture(request: RequestContext) -> (RecordingAdapter, ResourceMetadata, Operation, QueryContext) {
        let adapter = RecordingAdapter::sample()
            .with_items(vec![json!({"isbn": "a"}), json!({"isbn": "b"})])
            .with_total(45);
        let class = ResourceClass::new("Book");
        let metadata = adapter.metadata(&class).unwrap().clone();
        let operation = Operation::collection("books", class);
        let context = QueryContext::build(&operation, &UriVariables::new(), &request).unwrap();
        (adapter, metadata, operation, context)
    }

    #[test]
    fn test_window_uses_page_parameter() {
        let (adapter, metadata, operation, context) =
            fixture(RequestContext::new().with_filter("page", json!("3")));
        let extension = PaginationExtension::new(PaginationConfig::default());

        let mut builder = adapter.new_query(&metadata);
        extension
            .apply_to_collection(&adapter, &mut builder, &metadata, &operation, &context)
            .unwrap();

        assert_eq!(builder.ops, vec!["window offset=60 limit=30".to_string()]);
    }

    #[test]
    fn test_client_page_size_is_clamped() {
        let config = PaginationConfig {
            items_per_page_parameter: Some("itemsPerPage".to_string()),
            maximum_items_per_page: Some(50),
            ..PaginationConfig::default()
        };
        let (_, _, _, context) = fixture(
            RequestContext::new().with_filter("itemsPerPage", json!("500")),
        );

        let extension = PaginationExtension::new(config);
        assert_eq!(extension.items_per_page(&context), 50);
    }

    #[test]
    fn test_unreadable_page_falls_back_to_first() {
        let (_, _, _, context) =
            fixture(RequestContext::new().with_filter("page", json!("last")));
        let extension = PaginationExtension::new(PaginationConfig::default());
        assert_eq!(extension.page(&context), 1);
    }

    #[tokio::test]
    async fn test_result_counts_then_executes() {
        let (adapter, metadata, operation, context) = fixture(RequestContext::new());
        let extension = PaginationExtension::new(PaginationConfig::default());

        let builder = adapter.new_query(&metadata);
        let result = extension
            .result(&adapter, builder, &metadata, &operation, &context)
            .await
            .unwrap();

        let ProviderResult::Paginator(paginator) = result else {
            panic!("expected a paginator");
        };
        assert_eq!(paginator.total_items, 45);
        assert_eq!(paginator.items.len(), 2);
        assert_eq!(paginator.current_page, 1);
        assert_eq!(paginator.last_page(), 2);
    }

    #[test]
    fn test_operation_override_disables_result_ownership() {
        let (adapter, metadata, mut operation, context) = fixture(RequestContext::new());
        operation = operation.with_pagination(false);
        let extension = PaginationExtension::new(PaginationConfig::default());

        let mut builder = adapter.new_query(&metadata);
        extension
            .apply_to_collection(&adapter, &mut builder, &metadata, &operation, &context)
            .unwrap();

        assert!(builder.ops.is_empty());
        assert!(
            !<PaginationExtension as ResultCollectionExtension<RecordingAdapter>>::supports_result(
                &extension, &metadata, &operation, &context
            )
        );
    }
}
