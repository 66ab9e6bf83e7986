//! Default ordering.

use crate::adapter::QueryAdapter;
use crate::context::QueryContext;
use crate::error::ProvideResult;
use crate::extension::CollectionExtension;
use crate::metadata::ResourceMetadata;
use crate::operation::Operation;

/// Applies the operation's declared default order pairs.
#[derive(Debug, Default)]
pub struct OrderExtension;

impl OrderExtension {
    pub fn new() -> Self {
        Self
    }
}

impl<A: QueryAdapter> CollectionExtension<A> for OrderExtension {
    fn apply_to_collection(
        &self,
        adapter: &A,
        builder: &mut A::Builder,
        _metadata: &ResourceMetadata,
        operation: &Operation,
        _context: &QueryContext,
    ) -> ProvideResult<()> {
        for (property, direction) in operation.order() {
            adapter.set_order(builder, property, *direction);
        }
        Ok(())
    }
}
