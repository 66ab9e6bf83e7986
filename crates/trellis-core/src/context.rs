//! Per-request context types.
//!
//! [`QueryContext`] is built once per request from the operation, the raw
//! path variables and the caller-supplied request context, and is immutable
//! afterwards.

use crate::adapter::ExecuteOptions;
use crate::error::ProvideResult;
use crate::identifier::IdentifierError;
use crate::link::Link;
use crate::metadata::ResourceClass;
use crate::operation::Operation;
use serde_json::Value;
use std::collections::HashMap;

/// Ordered raw path variables, exactly as extracted from the request path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UriVariables(Vec<(String, String)>);

impl UriVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for UriVariables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Caller-supplied request state: free-form filter parameters plus
/// store-specific execution options.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub filters: HashMap<String, Value>,
    pub execute_options: ExecuteOptions,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.filters.insert(name.into(), value);
        self
    }

    pub fn with_execute_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.execute_options.insert(name.into(), value);
        self
    }
}

/// A link paired with the raw path value bound to it, if any. Expanded
/// (fixed-word) hops carry no value.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundLink {
    pub link: Link,
    pub raw: Option<String>,
}

/// Immutable description of one query to build: target class, bound link
/// chain (outermost URI segment first), filters and execution options.
#[derive(Debug, Clone)]
pub struct QueryContext {
    class: ResourceClass,
    bound_links: Vec<BoundLink>,
    filters: HashMap<String, Value>,
    execute_options: ExecuteOptions,
}

impl QueryContext {
    /// Pair the operation's declared links with the raw path values.
    ///
    /// Every non-expanded link must have a value among the URI variables;
    /// a missing one is a client-input error raised before any builder
    /// state exists.
    pub fn build(
        operation: &Operation,
        uri_variables: &UriVariables,
        request: &RequestContext,
    ) -> ProvideResult<Self> {
        let mut bound_links = Vec::with_capacity(operation.uri_variables().len());
        for link in operation.uri_variables() {
            let raw = if link.expanded_value().is_some() {
                None
            } else {
                match uri_variables.get(link.parameter_name()) {
                    Some(value) => Some(value.to_string()),
                    None => {
                        return Err(IdentifierError::MissingVariable {
                            parameter: link.parameter_name().to_string(),
                        }
                        .into())
                    }
                }
            };
            bound_links.push(BoundLink {
                link: link.clone(),
                raw,
            });
        }

        Ok(Self {
            class: operation.class().clone(),
            bound_links,
            filters: request.filters.clone(),
            execute_options: request.execute_options.clone(),
        })
    }

    pub fn class(&self) -> &ResourceClass {
        &self.class
    }

    /// Bound hops, outermost URI segment first.
    pub fn bound_links(&self) -> &[BoundLink] {
        &self.bound_links
    }

    pub fn filters(&self) -> &HashMap<String, Value> {
        &self.filters
    }

    pub fn execute_options(&self) -> &ExecuteOptions {
        &self.execute_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvideError;

    fn book_operation() -> Operation {
        let book = ResourceClass::new("Book");
        Operation::item("book_get", book.clone())
            .with_uri_variable(Link::identity("id", book, vec!["isbn".into()]))
    }

    #[test]
    fn test_build_binds_declared_variables() {
        let vars = UriVariables::new().with("id", "978-0-13-468599-1");
        let context =
            QueryContext::build(&book_operation(), &vars, &RequestContext::new()).unwrap();

        assert_eq!(context.bound_links().len(), 1);
        assert_eq!(
            context.bound_links()[0].raw.as_deref(),
            Some("978-0-13-468599-1")
        );
    }

    #[test]
    fn test_build_fails_fast_on_missing_variable() {
        let err = QueryContext::build(
            &book_operation(),
            &UriVariables::new(),
            &RequestContext::new(),
        )
        .unwrap_err();

        assert!(err.is_client_error());
        assert!(matches!(
            err,
            ProvideError::InvalidIdentifier(IdentifierError::MissingVariable { .. })
        ));
    }

    #[test]
    fn test_expanded_links_need_no_value() {
        let book = ResourceClass::new("Book");
        let operation = Operation::collection("featured_books", book.clone()).with_uri_variable(
            Link::identity("featured", book, Vec::new()).with_expanded_value("featured"),
        );

        let context =
            QueryContext::build(&operation, &UriVariables::new(), &RequestContext::new()).unwrap();
        assert_eq!(context.bound_links()[0].raw, None);
    }
}
