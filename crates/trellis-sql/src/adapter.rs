//! Relational adapter.

use crate::builder::SqlQueryBuilder;
use crate::driver::SqlDriver;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use trellis_core::adapter::{count_from_items, ExecuteOptions, Item, JoinKind, QueryAdapter};
use trellis_core::error::{ProvideError, ProvideResult};
use trellis_core::metadata::{RelationMetadata, ResourceClass, ResourceMetadata, ResourceRegistry};
use trellis_core::operation::OrderDirection;

/// Join-based adapter over an injected SQL driver.
pub struct SqlAdapter {
    registry: Arc<ResourceRegistry>,
    driver: Arc<dyn SqlDriver>,
}

impl SqlAdapter {
    pub fn new(registry: Arc<ResourceRegistry>, driver: Arc<dyn SqlDriver>) -> Self {
        Self { registry, driver }
    }
}

#[async_trait]
impl QueryAdapter for SqlAdapter {
    type Builder = SqlQueryBuilder;

    fn can_handle(&self, class: &ResourceClass) -> bool {
        self.registry.contains(class)
    }

    fn metadata(&self, class: &ResourceClass) -> ProvideResult<&ResourceMetadata> {
        self.registry
            .get(class)
            .ok_or_else(|| ProvideError::ResourceClassNotSupported(class.clone()))
    }

    fn new_query(&self, metadata: &ResourceMetadata) -> SqlQueryBuilder {
        SqlQueryBuilder::new(metadata)
    }

    fn root_alias<'a>(&self, builder: &'a SqlQueryBuilder) -> &'a str {
        builder.root_alias()
    }

    fn add_join(
        &self,
        builder: &mut SqlQueryBuilder,
        parent_alias: &str,
        relation: &RelationMetadata,
        kind: JoinKind,
    ) -> ProvideResult<String> {
        let target = self.metadata(&relation.target)?;
        Ok(builder.add_join(parent_alias, relation, kind, &target.source))
    }

    fn add_equals(&self, builder: &mut SqlQueryBuilder, alias: &str, property: &str, value: Value) {
        builder.add_equals(alias, property, value);
    }

    fn restrict_by_keys_in(
        &self,
        builder: &mut SqlQueryBuilder,
        alias: &str,
        property: &str,
        keys: Vec<Value>,
    ) {
        builder.add_in(alias, property, keys);
    }

    /// A relational store correlates lazily, so the inner query is spliced
    /// in as a subselect instead of being materialized.
    async fn restrict_by_inner(
        &self,
        outer: &mut SqlQueryBuilder,
        outer_alias: &str,
        key_property: &str,
        inner: SqlQueryBuilder,
        via_alias: &str,
        _options: &ExecuteOptions,
    ) -> ProvideResult<()> {
        let subquery = inner.render_keys(via_alias, key_property);
        outer.add_in_subquery(outer_alias, key_property, subquery);
        Ok(())
    }

    fn set_order(&self, builder: &mut SqlQueryBuilder, property: &str, direction: OrderDirection) {
        builder.set_order(property, direction);
    }

    fn set_window(&self, builder: &mut SqlQueryBuilder, offset: u64, limit: u64) {
        builder.set_window(offset, limit);
    }

    async fn count(
        &self,
        builder: &SqlQueryBuilder,
        options: &ExecuteOptions,
    ) -> ProvideResult<u64> {
        let query = builder.render_count();
        debug!(sql = %query.sql, "executing count");
        let rows = self.driver.fetch(&query, options).await?;
        count_from_items(&rows)
    }

    async fn execute(
        &self,
        builder: SqlQueryBuilder,
        options: &ExecuteOptions,
    ) -> ProvideResult<Vec<Item>> {
        let query = builder.render();
        debug!(sql = %query.sql, "executing query");
        self.driver.fetch(&query, options).await
    }
}
