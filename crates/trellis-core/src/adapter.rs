//! Backend adapter contract.
//!
//! One trait, two implementations: the relational adapter builds join-based
//! SQL, the document adapter builds an aggregation stage list. The resolver
//! and the stock extensions are written against this contract only.

use crate::error::{ProvideError, ProvideResult};
use crate::metadata::{RelationMetadata, ResourceClass, ResourceMetadata};
use crate::operation::OrderDirection;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// One hydrated record, as returned by a store driver.
pub type Item = Value;

/// Arbitrary store-specific execution options (read preference, hints),
/// passed through to the driver unchanged.
pub type ExecuteOptions = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Contract shared by the relational and document backends.
///
/// Builders are exclusively owned by one query-construction pass; nothing
/// here is shared across requests.
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    type Builder: Send;

    /// Whether this adapter has a store binding for the class.
    fn can_handle(&self, class: &ResourceClass) -> bool;

    /// Metadata for a class, or `ResourceClassNotSupported`.
    fn metadata(&self, class: &ResourceClass) -> ProvideResult<&ResourceMetadata>;

    /// Start a new query/aggregation rooted at the resource.
    fn new_query(&self, metadata: &ResourceMetadata) -> Self::Builder;

    /// Alias addressing the root of the builder. The document backend uses
    /// the empty string: root fields are unqualified.
    fn root_alias<'a>(&self, builder: &'a Self::Builder) -> &'a str;

    /// Add a join/lookup for `relation` starting at `parent_alias` and
    /// return the alias of the joined target. Idempotent: an identical
    /// `(parent_alias, property)` pair returns the alias created by the
    /// first call without adding a second join.
    fn add_join(
        &self,
        builder: &mut Self::Builder,
        parent_alias: &str,
        relation: &RelationMetadata,
        kind: JoinKind,
    ) -> ProvideResult<String>;

    /// Constrain `alias.property` to equal `value`.
    fn add_equals(&self, builder: &mut Self::Builder, alias: &str, property: &str, value: Value);

    /// Constrain `alias.property` to one of `keys`.
    fn restrict_by_keys_in(
        &self,
        builder: &mut Self::Builder,
        alias: &str,
        property: &str,
        keys: Vec<Value>,
    );

    /// Project the `via_alias` keys of `inner` into `outer` as an `IN`
    /// restriction on `outer_alias.key_property`.
    ///
    /// The relational backend splices a subselect; the document backend
    /// must materialize the inner aggregation first (cross-collection
    /// correlation cannot stay lazy within one pipeline) and splice the
    /// extracted key list.
    async fn restrict_by_inner(
        &self,
        outer: &mut Self::Builder,
        outer_alias: &str,
        key_property: &str,
        inner: Self::Builder,
        via_alias: &str,
        options: &ExecuteOptions,
    ) -> ProvideResult<()>;

    /// Append an order pair on a root property.
    fn set_order(&self, builder: &mut Self::Builder, property: &str, direction: OrderDirection);

    /// Restrict the result window. Counting ignores the window.
    fn set_window(&self, builder: &mut Self::Builder, offset: u64, limit: u64);

    /// Total matching items, ignoring any window or ordering.
    async fn count(&self, builder: &Self::Builder, options: &ExecuteOptions)
        -> ProvideResult<u64>;

    /// Execute the built query and hydrate the matching items.
    async fn execute(
        &self,
        builder: Self::Builder,
        options: &ExecuteOptions,
    ) -> ProvideResult<Vec<Item>>;
}

/// Interpret a driver row produced by a count query.
///
/// Accepts either a bare number or an object carrying a `total` field, so
/// both backends can reuse it.
pub fn count_from_items(items: &[Item]) -> ProvideResult<u64> {
    let Some(first) = items.first() else {
        return Ok(0);
    };
    let total = match first {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map.get("total").and_then(Value::as_u64),
        _ => None,
    };
    total.ok_or_else(|| ProvideError::driver("count query returned an unreadable total"))
}
