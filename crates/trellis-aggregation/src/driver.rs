//! Store driver seam.
//!
//! The adapter builds pipelines; running them against a collection, along
//! with connection handling and hydration, is the deployment's concern.
//! Execution failures pass through unmodified.

use async_trait::async_trait;
use serde_json::Value;
use trellis_core::adapter::{ExecuteOptions, Item};
use trellis_core::error::ProvideResult;

/// Runs an aggregation pipeline against a collection and hydrates the
/// resulting documents.
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Value],
        options: &ExecuteOptions,
    ) -> ProvideResult<Vec<Item>>;
}
