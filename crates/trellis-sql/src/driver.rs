//! Store driver seam.
//!
//! Execution, connection pooling and row hydration live outside this crate;
//! the adapter only hands a rendered statement to whatever driver the
//! deployment wires in. Execution failures pass through unmodified.

use crate::builder::SqlQuery;
use async_trait::async_trait;
use trellis_core::adapter::{ExecuteOptions, Item};
use trellis_core::error::ProvideResult;

/// Executes rendered SQL and hydrates rows as JSON objects.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    async fn fetch(&self, query: &SqlQuery, options: &ExecuteOptions) -> ProvideResult<Vec<Item>>;
}
