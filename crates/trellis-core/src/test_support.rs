//! Test doubles for exercising resolution without a real backend.
//!
//! [`RecordingAdapter`] implements the adapter contract over a flat op log,
//! so tests can assert the exact sequence of joins and constraints a walk
//! produced. Kept as a public module so backend crates can reuse it in
//! their own tests.

use crate::adapter::{ExecuteOptions, Item, JoinKind, QueryAdapter};
use crate::error::{ProvideError, ProvideResult};
use crate::metadata::{
    RelationMetadata, ResourceClass, ResourceMetadata, ResourceRegistry,
};
use crate::namegen::NameGenerator;
use crate::operation::OrderDirection;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builder used by [`RecordingAdapter`]: a flat, human-readable op log.
#[derive(Debug)]
pub struct RecordingBuilder {
    root: String,
    pub ops: Vec<String>,
    joined: HashMap<(String, String), String>,
    names: NameGenerator,
}

/// Adapter that records every call instead of building a real query.
pub struct RecordingAdapter {
    registry: ResourceRegistry,
    /// Items every `execute` call returns.
    pub items: Vec<Item>,
    /// Total every `count` call returns.
    pub total: u64,
    executions: AtomicUsize,
}

impl RecordingAdapter {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            items: Vec::new(),
            total: 0,
            executions: AtomicUsize::new(0),
        }
    }

    /// Adapter over [`sample_registry`].
    pub fn sample() -> Self {
        Self::new(sample_registry())
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// How many times `execute` ran.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryAdapter for RecordingAdapter {
    type Builder = RecordingBuilder;

    fn can_handle(&self, class: &ResourceClass) -> bool {
        self.registry.contains(class)
    }

    fn metadata(&self, class: &ResourceClass) -> ProvideResult<&ResourceMetadata> {
        self.registry
            .get(class)
            .ok_or_else(|| ProvideError::ResourceClassNotSupported(class.clone()))
    }

    fn new_query(&self, metadata: &ResourceMetadata) -> RecordingBuilder {
        let mut names = NameGenerator::new();
        let root = names.join_alias(&metadata.source);
        RecordingBuilder {
            root,
            ops: Vec::new(),
            joined: HashMap::new(),
            names,
        }
    }

    fn root_alias<'a>(&self, builder: &'a RecordingBuilder) -> &'a str {
        &builder.root
    }

    fn add_join(
        &self,
        builder: &mut RecordingBuilder,
        parent_alias: &str,
        relation: &RelationMetadata,
        _kind: JoinKind,
    ) -> ProvideResult<String> {
        let key = (parent_alias.to_string(), relation.property.clone());
        if let Some(alias) = builder.joined.get(&key) {
            return Ok(alias.clone());
        }
        let alias = builder.names.join_alias(&relation.property);
        builder
            .ops
            .push(format!("join {parent_alias}.{} as {alias}", relation.property));
        builder.joined.insert(key, alias.clone());
        Ok(alias)
    }

    fn add_equals(&self, builder: &mut RecordingBuilder, alias: &str, property: &str, value: Value) {
        let rendered = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        builder.ops.push(format!("eq {alias}.{property} = {rendered}"));
    }

    fn restrict_by_keys_in(
        &self,
        builder: &mut RecordingBuilder,
        alias: &str,
        property: &str,
        keys: Vec<Value>,
    ) {
        builder
            .ops
            .push(format!("in {alias}.{property} <- {} key(s)", keys.len()));
    }

    async fn restrict_by_inner(
        &self,
        outer: &mut RecordingBuilder,
        outer_alias: &str,
        key_property: &str,
        inner: RecordingBuilder,
        via_alias: &str,
        _options: &ExecuteOptions,
    ) -> ProvideResult<()> {
        outer.ops.push(format!(
            "in {outer_alias}.{key_property} <- inner[{via_alias}]({})",
            inner.ops.join("; ")
        ));
        Ok(())
    }

    fn set_order(&self, builder: &mut RecordingBuilder, property: &str, direction: OrderDirection) {
        let dir = match direction {
            OrderDirection::Ascending => "asc",
            OrderDirection::Descending => "desc",
        };
        builder.ops.push(format!("order {property} {dir}"));
    }

    fn set_window(&self, builder: &mut RecordingBuilder, offset: u64, limit: u64) {
        builder.ops.push(format!("window offset={offset} limit={limit}"));
    }

    async fn count(
        &self,
        _builder: &RecordingBuilder,
        _options: &ExecuteOptions,
    ) -> ProvideResult<u64> {
        Ok(self.total)
    }

    async fn execute(
        &self,
        _builder: RecordingBuilder,
        _options: &ExecuteOptions,
    ) -> ProvideResult<Vec<Item>> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

/// A small library/HR schema shared by the core tests.
pub fn sample_registry() -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();
    registry.register(
        ResourceMetadata::new(ResourceClass::new("Book"), "books")
            .with_identifier("isbn")
            .with_filterable("title"),
    );
    registry.register(
        ResourceMetadata::new(ResourceClass::new("OrderLine"), "order_lines")
            .with_identifier("orderId")
            .with_identifier("lineNo"),
    );
    registry.register(
        ResourceMetadata::new(ResourceClass::new("Country"), "countries").with_identifier("id"),
    );
    registry.register(
        ResourceMetadata::new(ResourceClass::new("Company"), "companies")
            .with_identifier("id")
            .with_relation(RelationMetadata::many_to_one(
                "country",
                ResourceClass::new("Country"),
                "country_id",
                "id",
            )),
    );
    registry.register(
        ResourceMetadata::new(ResourceClass::new("Employee"), "employees")
            .with_identifier("id")
            .with_relation(RelationMetadata::many_to_one(
                "company",
                ResourceClass::new("Company"),
                "company_id",
                "id",
            )),
    );
    registry
}
