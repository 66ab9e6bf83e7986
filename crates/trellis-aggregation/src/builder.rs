//! Aggregation pipeline builder.
//!
//! Accumulates lookup and match stages for one query-construction pass.
//! Root fields are addressed with an empty alias; looked-up fields are
//! addressed through the alias the lookup stage introduced. Ordering and
//! window are kept aside so the counting variant can exclude them.

use crate::stage::Stage;
use serde_json::Value;
use std::collections::HashMap;
use trellis_core::metadata::{RelationKind, RelationMetadata, ResourceMetadata};
use trellis_core::namegen::NameGenerator;
use trellis_core::operation::OrderDirection;

/// In-progress aggregation, exclusively owned by one pass.
#[derive(Debug, Clone)]
pub struct AggregationBuilder {
    collection: String,
    stages: Vec<Stage>,
    /// `(parent_alias, property)` pairs already looked up, for idempotence.
    joined: HashMap<(String, String), String>,
    order: Vec<(String, OrderDirection)>,
    window: Option<(u64, u64)>,
    names: NameGenerator,
}

/// Qualify a field path with its alias; root fields are unqualified.
fn qualify(alias: &str, property: &str) -> String {
    if alias.is_empty() {
        property.to_string()
    } else {
        format!("{alias}.{property}")
    }
}

impl AggregationBuilder {
    pub fn new(metadata: &ResourceMetadata) -> Self {
        Self {
            collection: metadata.source.clone(),
            stages: Vec::new(),
            joined: HashMap::new(),
            order: Vec::new(),
            window: None,
            names: NameGenerator::new(),
        }
    }

    /// Collection this aggregation runs against.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Root alias: the document root is unqualified.
    pub fn root_alias(&self) -> &str {
        ""
    }

    /// Add a lookup stage for `relation` and return its alias. Looking up
    /// the same relationship twice from the same parent reuses the first
    /// stage instead of duplicating it.
    pub fn add_lookup(
        &mut self,
        parent_alias: &str,
        relation: &RelationMetadata,
        target_collection: &str,
    ) -> String {
        let key = (parent_alias.to_string(), relation.property.clone());
        if let Some(alias) = self.joined.get(&key) {
            return alias.clone();
        }

        let alias = self.names.join_alias(&relation.property);
        let (local, foreign) = match relation.kind {
            RelationKind::ManyToOne => {
                (relation.owning_field.clone(), relation.referenced_field.clone())
            }
            RelationKind::OneToMany => {
                (relation.referenced_field.clone(), relation.owning_field.clone())
            }
        };
        self.stages.push(Stage::Lookup {
            from: target_collection.to_string(),
            local_field: qualify(parent_alias, &local),
            foreign_field: foreign,
            alias: alias.clone(),
        });
        self.joined.insert(key, alias.clone());
        alias
    }

    pub fn add_equals(&mut self, alias: &str, property: &str, value: Value) {
        self.stages.push(Stage::MatchEquals {
            field: qualify(alias, property),
            value,
        });
    }

    pub fn add_in(&mut self, alias: &str, property: &str, values: Vec<Value>) {
        self.stages.push(Stage::MatchIn {
            field: qualify(alias, property),
            values,
        });
    }

    pub fn set_order(&mut self, property: &str, direction: OrderDirection) {
        self.order.push((property.to_string(), direction));
    }

    pub fn set_window(&mut self, offset: u64, limit: u64) {
        self.window = Some((offset, limit));
    }

    /// Full pipeline: stages, then sort, then window.
    pub fn pipeline(&self) -> Vec<Value> {
        let mut documents: Vec<Value> = self.stages.iter().map(Stage::to_document).collect();
        if !self.order.is_empty() {
            documents.push(Stage::Sort(self.order.clone()).to_document());
        }
        if let Some((offset, limit)) = self.window {
            if offset > 0 {
                documents.push(Stage::Skip(offset).to_document());
            }
            documents.push(Stage::Limit(limit).to_document());
        }
        documents
    }

    /// Counting variant: ordering and window do not apply.
    pub fn pipeline_for_count(&self) -> Vec<Value> {
        let mut documents: Vec<Value> = self.stages.iter().map(Stage::to_document).collect();
        documents.push(
            Stage::Count {
                field: "total".to_string(),
            }
            .to_document(),
        );
        documents
    }

    /// Key-projection variant used before an `IN` splice: trims each
    /// matched document to the alias field carrying the keys.
    pub fn pipeline_for_keys(&self, via_alias: &str, key_property: &str) -> Vec<Value> {
        let mut documents: Vec<Value> = self.stages.iter().map(Stage::to_document).collect();
        documents.push(
            Stage::Project {
                fields: vec![qualify(via_alias, key_property)],
            }
            .to_document(),
        );
        documents
    }
}
