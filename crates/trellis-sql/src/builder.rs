//! SQL query builder.
//!
//! Accumulates the join tree, predicates and bound parameters for one
//! query-construction pass, then renders a parameterized statement. Values
//! never land in the SQL text: every constraint binds a named `:parameter`
//! the driver substitutes at execution time.

use serde_json::Value;
use std::collections::HashMap;
use trellis_core::adapter::JoinKind;
use trellis_core::metadata::{RelationKind, RelationMetadata, ResourceMetadata};
use trellis_core::namegen::NameGenerator;
use trellis_core::operation::OrderDirection;

/// A rendered SQL statement with its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
struct SqlJoin {
    kind: JoinKind,
    table: String,
    alias: String,
    on: String,
}

/// In-progress relational query, exclusively owned by one pass.
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    table: String,
    root_alias: String,
    joins: Vec<SqlJoin>,
    /// `(parent_alias, property)` pairs already joined, for idempotence.
    joined: HashMap<(String, String), String>,
    predicates: Vec<String>,
    params: HashMap<String, Value>,
    order: Vec<(String, OrderDirection)>,
    window: Option<(u64, u64)>,
    names: NameGenerator,
}

impl SqlQueryBuilder {
    pub fn new(metadata: &ResourceMetadata) -> Self {
        let mut names = NameGenerator::new();
        let root_alias = names.join_alias(&metadata.source);
        Self {
            table: metadata.source.clone(),
            root_alias,
            joins: Vec::new(),
            joined: HashMap::new(),
            predicates: Vec::new(),
            params: HashMap::new(),
            order: Vec::new(),
            window: None,
            names,
        }
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    /// Join `relation` from `parent_alias` toward `target_table`. Joining
    /// the same relationship twice from the same alias reuses the first
    /// join instead of duplicating it.
    pub fn add_join(
        &mut self,
        parent_alias: &str,
        relation: &RelationMetadata,
        kind: JoinKind,
        target_table: &str,
    ) -> String {
        let key = (parent_alias.to_string(), relation.property.clone());
        if let Some(alias) = self.joined.get(&key) {
            return alias.clone();
        }

        let alias = self.names.join_alias(&relation.property);
        let on = match relation.kind {
            RelationKind::ManyToOne => format!(
                "{alias}.{} = {parent_alias}.{}",
                relation.referenced_field, relation.owning_field
            ),
            RelationKind::OneToMany => format!(
                "{alias}.{} = {parent_alias}.{}",
                relation.owning_field, relation.referenced_field
            ),
        };
        self.joins.push(SqlJoin {
            kind,
            table: target_table.to_string(),
            alias: alias.clone(),
            on,
        });
        self.joined.insert(key, alias.clone());
        alias
    }

    pub fn add_equals(&mut self, alias: &str, property: &str, value: Value) {
        let parameter = self.names.parameter(property);
        self.predicates
            .push(format!("{alias}.{property} = :{parameter}"));
        self.params.insert(parameter, value);
    }

    /// Constrain `alias.property` to an explicit key list. The driver
    /// expands the array parameter into a placeholder list.
    pub fn add_in(&mut self, alias: &str, property: &str, keys: Vec<Value>) {
        let parameter = self.names.parameter(property);
        self.predicates
            .push(format!("{alias}.{property} IN (:{parameter})"));
        self.params.insert(parameter, Value::Array(keys));
    }

    /// Constrain `alias.property` to the rows of a rendered subselect.
    ///
    /// The subselect's parameters are re-prefixed before merging so two
    /// independently named passes cannot collide inside one statement.
    pub fn add_in_subquery(&mut self, alias: &str, property: &str, subquery: SqlQuery) {
        let prefix = self.names.parameter("sub");
        let mut sql = subquery.sql;

        // Longest names first, so `x_p1` cannot clobber part of `x_p10`.
        let mut names: Vec<&String> = subquery.params.keys().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        for name in names {
            sql = sql.replace(&format!(":{name}"), &format!(":{prefix}_{name}"));
        }
        for (name, value) in subquery.params {
            self.params.insert(format!("{prefix}_{name}"), value);
        }

        self.predicates
            .push(format!("{alias}.{property} IN ({sql})"));
    }

    pub fn set_order(&mut self, property: &str, direction: OrderDirection) {
        self.order.push((property.to_string(), direction));
    }

    pub fn set_window(&mut self, offset: u64, limit: u64) {
        self.window = Some((offset, limit));
    }

    /// Render the full statement selecting the root entity.
    pub fn render(&self) -> SqlQuery {
        let mut sql = format!(
            "SELECT {}.*\nFROM {}{}",
            self.root_alias,
            self.render_from(),
            self.render_where()
        );

        if !self.order.is_empty() {
            let pairs: Vec<String> = self
                .order
                .iter()
                .map(|(property, direction)| {
                    let keyword = match direction {
                        OrderDirection::Ascending => "ASC",
                        OrderDirection::Descending => "DESC",
                    };
                    format!("{}.{property} {keyword}", self.root_alias)
                })
                .collect();
            sql.push_str(&format!("\nORDER BY {}", pairs.join(", ")));
        }

        if let Some((offset, limit)) = self.window {
            sql.push_str(&format!("\nLIMIT {limit} OFFSET {offset}"));
        }

        SqlQuery {
            sql,
            params: self.params.clone(),
        }
    }

    /// Render a key-projection variant selecting `alias.property`, used as
    /// the inner side of an `IN` restriction. Ordering and window do not
    /// apply.
    pub fn render_keys(&self, alias: &str, property: &str) -> SqlQuery {
        SqlQuery {
            sql: format!(
                "SELECT {alias}.{property}\nFROM {}{}",
                self.render_from(),
                self.render_where()
            ),
            params: self.params.clone(),
        }
    }

    /// Render the counting variant. Ordering and window do not apply.
    pub fn render_count(&self) -> SqlQuery {
        SqlQuery {
            sql: format!(
                "SELECT COUNT(*) AS total\nFROM {}{}",
                self.render_from(),
                self.render_where()
            ),
            params: self.params.clone(),
        }
    }

    fn render_from(&self) -> String {
        let mut from = format!("{} {}", self.table, self.root_alias);
        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            from.push_str(&format!(
                "\n{keyword} {} {} ON {}",
                join.table, join.alias, join.on
            ));
        }
        from
    }

    fn render_where(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!("\nWHERE {}", self.predicates.join("\n  AND "))
        }
    }
}
