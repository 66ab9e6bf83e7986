//! Document adapter.

use crate::builder::AggregationBuilder;
use crate::driver::DocumentDriver;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use trellis_core::adapter::{count_from_items, ExecuteOptions, Item, JoinKind, QueryAdapter};
use trellis_core::error::{ProvideError, ProvideResult};
use trellis_core::metadata::{RelationMetadata, ResourceClass, ResourceMetadata, ResourceRegistry};
use trellis_core::operation::OrderDirection;

/// Aggregation-pipeline adapter over an injected document driver.
pub struct DocumentAdapter {
    registry: Arc<ResourceRegistry>,
    driver: Arc<dyn DocumentDriver>,
}

impl DocumentAdapter {
    pub fn new(registry: Arc<ResourceRegistry>, driver: Arc<dyn DocumentDriver>) -> Self {
        Self { registry, driver }
    }
}

/// Pull the distinct key values out of materialized inner documents: each
/// carries the looked-up documents under the lookup alias.
fn extract_keys(items: &[Item], via_alias: &str, key_property: &str) -> Vec<Value> {
    let mut keys: Vec<Value> = Vec::new();
    let mut push = |key: &Value| {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    };
    for item in items {
        match item.get(via_alias) {
            Some(Value::Array(related)) => {
                for document in related {
                    if let Some(key) = document.get(key_property) {
                        push(key);
                    }
                }
            }
            Some(Value::Object(document)) => {
                if let Some(key) = document.get(key_property) {
                    push(key);
                }
            }
            _ => {}
        }
    }
    keys
}

#[async_trait]
impl QueryAdapter for DocumentAdapter {
    type Builder = AggregationBuilder;

    fn can_handle(&self, class: &ResourceClass) -> bool {
        self.registry.contains(class)
    }

    fn metadata(&self, class: &ResourceClass) -> ProvideResult<&ResourceMetadata> {
        self.registry
            .get(class)
            .ok_or_else(|| ProvideError::ResourceClassNotSupported(class.clone()))
    }

    fn new_query(&self, metadata: &ResourceMetadata) -> AggregationBuilder {
        AggregationBuilder::new(metadata)
    }

    fn root_alias<'a>(&self, builder: &'a AggregationBuilder) -> &'a str {
        builder.root_alias()
    }

    fn add_join(
        &self,
        builder: &mut AggregationBuilder,
        parent_alias: &str,
        relation: &RelationMetadata,
        _kind: JoinKind,
    ) -> ProvideResult<String> {
        let target = self.metadata(&relation.target)?;
        Ok(builder.add_lookup(parent_alias, relation, &target.source))
    }

    fn add_equals(
        &self,
        builder: &mut AggregationBuilder,
        alias: &str,
        property: &str,
        value: Value,
    ) {
        builder.add_equals(alias, property, value);
    }

    fn restrict_by_keys_in(
        &self,
        builder: &mut AggregationBuilder,
        alias: &str,
        property: &str,
        keys: Vec<Value>,
    ) {
        builder.add_in(alias, property, keys);
    }

    /// The store cannot correlate two collections lazily inside one
    /// pipeline, so the inner aggregation runs first and its extracted keys
    /// are spliced into the outer match.
    async fn restrict_by_inner(
        &self,
        outer: &mut AggregationBuilder,
        outer_alias: &str,
        key_property: &str,
        inner: AggregationBuilder,
        via_alias: &str,
        options: &ExecuteOptions,
    ) -> ProvideResult<()> {
        let pipeline = inner.pipeline_for_keys(via_alias, key_property);
        debug!(collection = inner.collection(), "materializing inner aggregation");
        let documents = self
            .driver
            .aggregate(inner.collection(), &pipeline, options)
            .await?;
        let keys = extract_keys(&documents, via_alias, key_property);
        self.restrict_by_keys_in(outer, outer_alias, key_property, keys);
        Ok(())
    }

    fn set_order(
        &self,
        builder: &mut AggregationBuilder,
        property: &str,
        direction: OrderDirection,
    ) {
        builder.set_order(property, direction);
    }

    fn set_window(&self, builder: &mut AggregationBuilder, offset: u64, limit: u64) {
        builder.set_window(offset, limit);
    }

    async fn count(
        &self,
        builder: &AggregationBuilder,
        options: &ExecuteOptions,
    ) -> ProvideResult<u64> {
        let pipeline = builder.pipeline_for_count();
        debug!(collection = builder.collection(), "executing count pipeline");
        let documents = self
            .driver
            .aggregate(builder.collection(), &pipeline, options)
            .await?;
        count_from_items(&documents)
    }

    async fn execute(
        &self,
        builder: AggregationBuilder,
        options: &ExecuteOptions,
    ) -> ProvideResult<Vec<Item>> {
        let pipeline = builder.pipeline();
        debug!(collection = builder.collection(), stages = pipeline.len(), "executing pipeline");
        self.driver
            .aggregate(builder.collection(), &pipeline, options)
            .await
    }
}
