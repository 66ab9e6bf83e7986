//! Link-chain resolution.
//!
//! Walks the relationship hops bound by a request path and drives a backend
//! adapter to build the base query for the target resource. Hops are
//! consumed nearest-the-resource first (the reverse of URI order): an
//! inverse hop extends the current query through the relationship that owns
//! the key, while a forward hop roots a new query at its source class and,
//! on unwind, projects the matched keys back into the downstream query as
//! an `IN` restriction.
//!
//! Each recursion frame returns the (possibly new) builder instead of
//! mutating shared state, so every hop can be exercised in isolation.

use crate::adapter::{JoinKind, QueryAdapter};
use crate::context::{BoundLink, QueryContext};
use crate::error::{ProvideError, ProvideResult};
use crate::identifier::{decompose, Identifier, IdentifierError};
use crate::metadata::{RelationKind, RelationMetadata, ResourceClass};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, trace};

/// Where the previous hop left the walk inside the active builder.
#[derive(Debug, Clone)]
enum Place {
    /// A concrete alias in the active builder.
    Alias(String),
    /// Reachable by joining `relation` from `parent_alias`; the join is
    /// added only if a later hop actually needs fields of that class.
    Deferred {
        parent_alias: String,
        relation: RelationMetadata,
    },
}

#[derive(Debug, Clone)]
struct Cursor {
    class: ResourceClass,
    place: Place,
}

/// Drives a backend adapter through the bound link chain of one request.
pub struct LinkChainResolver<'a, A: QueryAdapter> {
    adapter: &'a A,
}

impl<'a, A: QueryAdapter> LinkChainResolver<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Build the base query for `context`, rooted at the target resource.
    pub async fn resolve(&self, context: &QueryContext) -> ProvideResult<A::Builder> {
        let metadata = self.adapter.metadata(context.class())?;
        let builder = self.adapter.new_query(metadata);
        let root = self.adapter.root_alias(&builder).to_string();
        let cursor = Cursor {
            class: context.class().clone(),
            place: Place::Alias(root),
        };

        let hops: Vec<BoundLink> = context.bound_links().iter().rev().cloned().collect();
        debug!(class = %context.class(), hops = hops.len(), "resolving link chain");
        self.walk(hops, cursor, builder, context).await
    }

    /// Consume one hop per frame, threading the builder forward.
    fn walk<'s>(
        &'s self,
        hops: Vec<BoundLink>,
        mut cursor: Cursor,
        mut builder: A::Builder,
        context: &'s QueryContext,
    ) -> BoxFuture<'s, ProvideResult<A::Builder>> {
        Box::pin(async move {
            let mut remaining = hops;
            if remaining.is_empty() {
                return Ok(builder);
            }
            let hop = remaining.remove(0);
            let link = &hop.link;
            trace!(parameter = link.parameter_name(), "processing hop");

            let Some(from_property) = link.from_property() else {
                self.apply_at_cursor(&mut builder, &mut cursor, &hop)?;
                return self.walk(remaining, cursor, builder, context).await;
            };

            // Forward hop: the bound entity sits upstream of the result, so
            // it cannot extend the current join chain. Root a new query at
            // the source class; the remaining outer hops continue on it.
            if link.to_class() != &cursor.class {
                return Err(non_contiguous(link.parameter_name(), &cursor.class));
            }
            let from_meta = self.adapter.metadata(link.from_class())?;
            let relation = from_meta
                .relation(from_property)
                .cloned()
                .ok_or_else(|| unknown_relation(link.from_class(), from_property))?;

            let mut inner = self.adapter.new_query(from_meta);
            let inner_root = self.adapter.root_alias(&inner).to_string();
            // The forward relation always joins: its alias carries the keys
            // back out of the inner query.
            let via_alias =
                self.adapter
                    .add_join(&mut inner, &inner_root, &relation, JoinKind::Inner)?;
            // Identifiers of a forward hop are source-class properties,
            // bound at the new root.
            if link.expanded_value().is_none() {
                let identifier = decompose_hop(&hop)?;
                for (property, value) in identifier.iter() {
                    self.adapter.add_equals(
                        &mut inner,
                        &inner_root,
                        property,
                        Value::String(value.to_string()),
                    );
                }
            }
            let inner_cursor = Cursor {
                class: link.from_class().clone(),
                place: Place::Alias(inner_root),
            };
            let inner = self.walk(remaining, inner_cursor, inner, context).await?;

            // Project the inner keys into the downstream query.
            let outer_meta = self.adapter.metadata(&cursor.class)?;
            let key_property = outer_meta
                .primary_identifier()
                .ok_or_else(|| {
                    ProvideError::runtime(format!(
                        "class `{}` declares a composite identifier and cannot receive an IN restriction",
                        cursor.class
                    ))
                })?
                .to_string();
            let outer_alias = self.materialize(&mut builder, &mut cursor)?;
            debug!(via = %via_alias, key = %key_property, "projecting inner chain into outer query");
            self.adapter
                .restrict_by_inner(
                    &mut builder,
                    &outer_alias,
                    &key_property,
                    inner,
                    &via_alias,
                    context.execute_options(),
                )
                .await?;
            Ok(builder)
        })
    }

    /// Apply an inverse or identity hop to the active builder.
    fn apply_at_cursor(
        &self,
        builder: &mut A::Builder,
        cursor: &mut Cursor,
        hop: &BoundLink,
    ) -> ProvideResult<()> {
        let link = &hop.link;
        let Some(to_property) = link.to_property() else {
            // Identity hop: constrain the class itself at the cursor.
            if link.to_class() != &cursor.class {
                return Err(non_contiguous(link.parameter_name(), &cursor.class));
            }
            if link.expanded_value().is_some() {
                return Ok(());
            }
            let identifier = decompose_hop(hop)?;
            let alias = self.materialize(builder, cursor)?;
            for (property, value) in identifier.iter() {
                self.adapter
                    .add_equals(builder, &alias, property, Value::String(value.to_string()));
            }
            return Ok(());
        };

        // Inverse hop: the target class owns the key pointing back, so the
        // current query is extended in place.
        if link.to_class() != &cursor.class {
            return Err(non_contiguous(link.parameter_name(), &cursor.class));
        }
        let metadata = self.adapter.metadata(&cursor.class)?;
        let relation = metadata
            .relation(to_property)
            .cloned()
            .ok_or_else(|| unknown_relation(&cursor.class, to_property))?;

        if link.expanded_value().is_some() {
            // Fixed-word hop: may join, binds nothing.
            let parent = self.materialize(builder, cursor)?;
            let alias = self
                .adapter
                .add_join(builder, &parent, &relation, JoinKind::Inner)?;
            *cursor = Cursor {
                class: link.from_class().clone(),
                place: Place::Alias(alias),
            };
            return Ok(());
        }

        let identifier = decompose_hop(hop)?;
        let binds_referenced_key = relation.kind == RelationKind::ManyToOne
            && link.identifiers().len() == 1
            && link.identifiers()[0] == relation.referenced_field;

        if binds_referenced_key {
            // The bound value is the related identity itself, so the owning
            // key field stands in for the join.
            let parent = self.materialize(builder, cursor)?;
            let (_, value) = identifier.iter().next().ok_or(IdentifierError::Empty)?;
            self.adapter.add_equals(
                builder,
                &parent,
                &relation.owning_field,
                Value::String(value.to_string()),
            );
            *cursor = Cursor {
                class: link.from_class().clone(),
                place: Place::Deferred {
                    parent_alias: parent,
                    relation,
                },
            };
        } else {
            let parent = self.materialize(builder, cursor)?;
            let alias = self
                .adapter
                .add_join(builder, &parent, &relation, JoinKind::Inner)?;
            for (property, value) in identifier.iter() {
                self.adapter
                    .add_equals(builder, &alias, property, Value::String(value.to_string()));
            }
            *cursor = Cursor {
                class: link.from_class().clone(),
                place: Place::Alias(alias),
            };
        }
        Ok(())
    }

    /// Resolve the cursor to a concrete alias, adding the deferred join if
    /// one is pending.
    fn materialize(&self, builder: &mut A::Builder, cursor: &mut Cursor) -> ProvideResult<String> {
        match cursor.place.clone() {
            Place::Alias(alias) => Ok(alias),
            Place::Deferred {
                parent_alias,
                relation,
            } => {
                let alias =
                    self.adapter
                        .add_join(builder, &parent_alias, &relation, JoinKind::Inner)?;
                cursor.place = Place::Alias(alias.clone());
                Ok(alias)
            }
        }
    }
}

fn decompose_hop(hop: &BoundLink) -> ProvideResult<Identifier> {
    let link = &hop.link;
    let raw = hop.raw.as_deref().ok_or_else(|| IdentifierError::MissingVariable {
        parameter: link.parameter_name().to_string(),
    })?;
    Ok(decompose(raw, link.identifiers())?)
}

fn non_contiguous(parameter: &str, current: &ResourceClass) -> ProvideError {
    ProvideError::runtime(format!(
        "link chain is not contiguous: hop `{parameter}` does not connect to `{current}`"
    ))
}

fn unknown_relation(class: &ResourceClass, property: &str) -> ProvideError {
    ProvideError::runtime(format!(
        "class `{class}` has no relationship property `{property}`"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContext, UriVariables};
    use crate::link::Link;
    use crate::operation::Operation;
    use crate::test_support::{RecordingAdapter, RecordingBuilder};

    fn class(name: &str) -> ResourceClass {
        ResourceClass::new(name)
    }

    fn adapter() -> RecordingAdapter {
        RecordingAdapter::sample()
    }

    async fn resolve(
        adapter: &RecordingAdapter,
        operation: Operation,
        vars: UriVariables,
    ) -> ProvideResult<RecordingBuilder> {
        let context = QueryContext::build(&operation, &vars, &RequestContext::new())?;
        LinkChainResolver::new(adapter).resolve(&context).await
    }

    // =========================================================================
    // Hop shapes
    // =========================================================================

    #[tokio::test]
    async fn test_identity_hop_constrains_root() {
        let adapter = adapter();
        let operation = Operation::item("book_get", class("Book")).with_uri_variable(
            Link::identity("id", class("Book"), vec!["isbn".into()]),
        );
        let vars = UriVariables::new().with("id", "978-0-13-468599-1");

        let builder = resolve(&adapter, operation, vars).await.unwrap();
        assert_eq!(
            builder.ops,
            vec!["eq books_a1.isbn = 978-0-13-468599-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_inverse_hop_binding_referenced_key_skips_join() {
        let adapter = adapter();
        let operation = Operation::collection("company_employees", class("Employee"))
            .with_uri_variable(Link::inverse(
                "companyId",
                class("Company"),
                class("Employee"),
                "company",
                vec!["id".into()],
            ));
        let vars = UriVariables::new().with("companyId", "42");

        let builder = resolve(&adapter, operation, vars).await.unwrap();
        assert_eq!(
            builder.ops,
            vec!["eq employees_a1.company_id = 42".to_string()]
        );
    }

    #[tokio::test]
    async fn test_chained_inverse_hops_materialize_deferred_join() {
        // /countries/{countryId}/companies/{companyId}/employees
        let adapter = adapter();
        let operation = Operation::collection("country_company_employees", class("Employee"))
            .with_uri_variable(Link::inverse(
                "countryId",
                class("Country"),
                class("Company"),
                "country",
                vec!["id".into()],
            ))
            .with_uri_variable(Link::inverse(
                "companyId",
                class("Company"),
                class("Employee"),
                "company",
                vec!["id".into()],
            ));
        let vars = UriVariables::new()
            .with("countryId", "fr")
            .with("companyId", "42");

        let builder = resolve(&adapter, operation, vars).await.unwrap();
        assert_eq!(
            builder.ops,
            vec![
                "eq employees_a1.company_id = 42".to_string(),
                "join employees_a1.company as company_a2".to_string(),
                "eq company_a2.country_id = fr".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_forward_hop_projects_inner_into_outer() {
        // /employees/{id}/company
        let adapter = adapter();
        let operation = Operation::item("employee_company", class("Company")).with_uri_variable(
            Link::forward(
                "id",
                class("Employee"),
                "company",
                class("Company"),
                vec!["id".into()],
            ),
        );
        let vars = UriVariables::new().with("id", "7");

        let builder = resolve(&adapter, operation, vars).await.unwrap();
        assert_eq!(
            builder.ops,
            vec![
                "in companies_a1.id <- inner[company_a2](join employees_a1.company as company_a2; eq employees_a1.id = 7)"
                    .to_string(),
            ]
        );
    }

    // =========================================================================
    // Error conditions
    // =========================================================================

    #[tokio::test]
    async fn test_unknown_relation_is_runtime_error() {
        let adapter = adapter();
        let operation = Operation::collection("book_reviews", class("Book")).with_uri_variable(
            Link::inverse(
                "authorId",
                class("Company"),
                class("Book"),
                "writer",
                vec!["id".into()],
            ),
        );
        let vars = UriVariables::new().with("authorId", "1");

        let err = resolve(&adapter, operation, vars).await.unwrap_err();
        assert!(matches!(err, ProvideError::Runtime(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_non_contiguous_chain_is_runtime_error() {
        let adapter = adapter();
        // Hop claims to target Country while the query is rooted at Book.
        let operation = Operation::collection("broken", class("Book")).with_uri_variable(
            Link::inverse(
                "countryId",
                class("Company"),
                class("Country"),
                "country",
                vec!["id".into()],
            ),
        );
        let vars = UriVariables::new().with("countryId", "fr");

        let err = resolve(&adapter, operation, vars).await.unwrap_err();
        assert!(matches!(err, ProvideError::Runtime(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_arity_mismatch_is_invalid_identifier() {
        let adapter = adapter();
        let operation = Operation::item("book_get", class("Book")).with_uri_variable(
            Link::identity("id", class("Book"), vec!["isbn".into(), "edition".into()]),
        );
        let vars = UriVariables::new().with("id", "isbn-only");

        let err = resolve(&adapter, operation, vars).await.unwrap_err();
        assert!(err.is_client_error(), "{err:?}");
    }

    #[tokio::test]
    async fn test_expanded_hop_binds_nothing() {
        let adapter = adapter();
        let operation = Operation::collection("featured", class("Book")).with_uri_variable(
            Link::identity("featured", class("Book"), Vec::new()).with_expanded_value("featured"),
        );

        let builder = resolve(&adapter, operation, UriVariables::new())
            .await
            .unwrap();
        assert!(builder.ops.is_empty());
    }
}
