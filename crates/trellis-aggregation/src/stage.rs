//! Typed aggregation stages.
//!
//! Stages are assembled by the builder and serialized to JSON documents in
//! the shape the document store's aggregate entry point expects. Lookup
//! stages leave the looked-up documents in an array field named by the
//! join alias; match stages address fields through that alias path.

use serde_json::{json, Map, Value};
use trellis_core::operation::OrderDirection;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Join-equivalent: embeds matching `from` documents as `alias`.
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        alias: String,
    },
    /// Equality match on a (possibly alias-qualified) field path.
    MatchEquals { field: String, value: Value },
    /// Membership match on a (possibly alias-qualified) field path.
    MatchIn { field: String, values: Vec<Value> },
    /// Multi-key sort; pairs keep their priority order.
    Sort(Vec<(String, OrderDirection)>),
    Skip(u64),
    Limit(u64),
    /// Collapses the pipeline to a single `{field: n}` document.
    Count { field: String },
    /// Projects the listed field paths (plus the implicit `_id`).
    Project { fields: Vec<String> },
}

impl Stage {
    /// Serialize to the stage document the driver sends to the store.
    pub fn to_document(&self) -> Value {
        match self {
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                alias,
            } => json!({
                "$lookup": {
                    "from": from,
                    "localField": local_field,
                    "foreignField": foreign_field,
                    "as": alias,
                }
            }),
            Stage::MatchEquals { field, value } => {
                let mut criteria = Map::new();
                criteria.insert(field.clone(), value.clone());
                json!({ "$match": Value::Object(criteria) })
            }
            Stage::MatchIn { field, values } => {
                let mut criteria = Map::new();
                criteria.insert(field.clone(), json!({ "$in": values.clone() }));
                json!({ "$match": Value::Object(criteria) })
            }
            Stage::Sort(pairs) => {
                let mut sort = Map::new();
                for (field, direction) in pairs {
                    let keyword = match direction {
                        OrderDirection::Ascending => 1,
                        OrderDirection::Descending => -1,
                    };
                    sort.insert(field.clone(), json!(keyword));
                }
                json!({ "$sort": Value::Object(sort) })
            }
            Stage::Skip(n) => json!({ "$skip": n }),
            Stage::Limit(n) => json!({ "$limit": n }),
            Stage::Count { field } => json!({ "$count": field }),
            Stage::Project { fields } => {
                let mut projection = Map::new();
                for field in fields {
                    projection.insert(field.clone(), json!(1));
                }
                json!({ "$project": Value::Object(projection) })
            }
        }
    }
}
