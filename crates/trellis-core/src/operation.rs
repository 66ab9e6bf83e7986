//! Operation descriptors.
//!
//! An operation names one exposed read on a resource: an item lookup or a
//! collection listing, together with the ordered links its URI variables
//! bind (outermost URI segment first) and optional default ordering and
//! pagination overrides.

use crate::link::Link;
use crate::metadata::ResourceClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Item,
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// Describes one exposed read operation on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    name: String,
    kind: OperationKind,
    class: ResourceClass,
    uri_variables: Vec<Link>,
    order: Vec<(String, OrderDirection)>,
    pagination_enabled: Option<bool>,
}

impl Operation {
    pub fn item(name: impl Into<String>, class: ResourceClass) -> Self {
        Self::new(name, OperationKind::Item, class)
    }

    pub fn collection(name: impl Into<String>, class: ResourceClass) -> Self {
        Self::new(name, OperationKind::Collection, class)
    }

    fn new(name: impl Into<String>, kind: OperationKind, class: ResourceClass) -> Self {
        Self {
            name: name.into(),
            kind,
            class,
            uri_variables: Vec::new(),
            order: Vec::new(),
            pagination_enabled: None,
        }
    }

    /// Append a URI variable link; call in URI order, outermost first.
    pub fn with_uri_variable(mut self, link: Link) -> Self {
        self.uri_variables.push(link);
        self
    }

    /// Append a default order pair applied to collection results.
    pub fn with_order(mut self, property: impl Into<String>, direction: OrderDirection) -> Self {
        self.order.push((property.into(), direction));
        self
    }

    /// Override the configured pagination default for this operation.
    pub fn with_pagination(mut self, enabled: bool) -> Self {
        self.pagination_enabled = Some(enabled);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn class(&self) -> &ResourceClass {
        &self.class
    }

    pub fn uri_variables(&self) -> &[Link] {
        &self.uri_variables
    }

    pub fn order(&self) -> &[(String, OrderDirection)] {
        &self.order
    }

    pub fn pagination_enabled(&self) -> Option<bool> {
        self.pagination_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_in_order() {
        let book = ResourceClass::new("Book");
        let operation = Operation::collection("books_by_author", book.clone())
            .with_uri_variable(Link::inverse(
                "authorId",
                ResourceClass::new("Author"),
                book,
                "author",
                vec!["id".into()],
            ))
            .with_order("title", OrderDirection::Ascending)
            .with_pagination(false);

        assert_eq!(operation.kind(), OperationKind::Collection);
        assert_eq!(operation.uri_variables().len(), 1);
        assert_eq!(operation.order().len(), 1);
        assert_eq!(operation.pagination_enabled(), Some(false));
    }
}
