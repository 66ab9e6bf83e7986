//! Equality filtering from request parameters.

use crate::adapter::QueryAdapter;
use crate::context::QueryContext;
use crate::error::ProvideResult;
use crate::extension::CollectionExtension;
use crate::metadata::ResourceMetadata;
use crate::operation::Operation;
use tracing::trace;

/// Binds request filter parameters to root equality constraints.
///
/// Only properties the resource declares as filterable are consulted;
/// anything else in the parameter map (pagination controls, unknown keys)
/// is ignored. Keys are applied in sorted order so the produced query is
/// deterministic.
#[derive(Debug, Default)]
pub struct FilterExtension;

impl FilterExtension {
    pub fn new() -> Self {
        Self
    }
}

impl<A: QueryAdapter> CollectionExtension<A> for FilterExtension {
    fn apply_to_collection(
        &self,
        adapter: &A,
        builder: &mut A::Builder,
        metadata: &ResourceMetadata,
        _operation: &Operation,
        context: &QueryContext,
    ) -> ProvideResult<()> {
        let alias = adapter.root_alias(builder).to_string();
        let mut properties: Vec<&String> = context
            .filters()
            .keys()
            .filter(|key| metadata.filterable_properties.contains(*key))
            .collect();
        properties.sort();

        for property in properties {
            trace!(property = %property, "applying filter parameter");
            let value = context.filters()[property].clone();
            adapter.add_equals(builder, &alias, property, value);
        }
        Ok(())
    }
}
