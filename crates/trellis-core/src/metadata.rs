//! Resource metadata model.
//!
//! Describes what the upstream metadata layer knows about each resource
//! type: its backing table or collection, its identifier properties in
//! declaration order, and its navigable relationships. Metadata is computed
//! once upstream and registered in a read-only [`ResourceRegistry`] for the
//! lifetime of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque handle naming a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceClass(String);

impl ResourceClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceClass {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Which side of a relationship stores the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// The declaring class stores the key (`owning_field` lives on it).
    ManyToOne,
    /// The target class stores the key (`owning_field` lives on it).
    OneToMany,
}

/// A declared navigable relationship property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMetadata {
    /// Property name on the declaring class.
    pub property: String,
    /// Class the relationship points at.
    pub target: ResourceClass,
    pub kind: RelationKind,
    /// Column/field on the owning side that stores the key.
    pub owning_field: String,
    /// Key field referenced on the other side.
    pub referenced_field: String,
}

impl RelationMetadata {
    /// Relationship whose key is stored on the declaring class.
    pub fn many_to_one(
        property: impl Into<String>,
        target: ResourceClass,
        owning_field: impl Into<String>,
        referenced_field: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            target,
            kind: RelationKind::ManyToOne,
            owning_field: owning_field.into(),
            referenced_field: referenced_field.into(),
        }
    }

    /// Relationship whose key is stored on the target class.
    pub fn one_to_many(
        property: impl Into<String>,
        target: ResourceClass,
        owning_field: impl Into<String>,
        referenced_field: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            target,
            kind: RelationKind::OneToMany,
            owning_field: owning_field.into(),
            referenced_field: referenced_field.into(),
        }
    }
}

/// Storage-facing description of one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub class: ResourceClass,
    /// Backing table (relational) or collection (document).
    pub source: String,
    /// Identifier property names in declaration order.
    pub identifier_properties: Vec<String>,
    pub relations: Vec<RelationMetadata>,
    /// Properties the filter extension may bind from request parameters.
    pub filterable_properties: Vec<String>,
}

impl ResourceMetadata {
    pub fn new(class: ResourceClass, source: impl Into<String>) -> Self {
        Self {
            class,
            source: source.into(),
            identifier_properties: Vec::new(),
            relations: Vec::new(),
            filterable_properties: Vec::new(),
        }
    }

    /// Append an identifier property (declaration order is preserved).
    pub fn with_identifier(mut self, property: impl Into<String>) -> Self {
        self.identifier_properties.push(property.into());
        self
    }

    pub fn with_relation(mut self, relation: RelationMetadata) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn with_filterable(mut self, property: impl Into<String>) -> Self {
        self.filterable_properties.push(property.into());
        self
    }

    /// More than one declared identifier property.
    pub fn is_composite(&self) -> bool {
        self.identifier_properties.len() > 1
    }

    pub fn relation(&self, property: &str) -> Option<&RelationMetadata> {
        self.relations.iter().find(|r| r.property == property)
    }

    /// The single key property an `IN` restriction can target, if the
    /// resource is not composite.
    pub fn primary_identifier(&self) -> Option<&str> {
        match self.identifier_properties.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }
}

/// Read-only registry of resource metadata.
///
/// Populated once at startup, then shared and read for the lifetime of the
/// process. Missing classes are how a provider discovers it has no store
/// binding for a request.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<ResourceClass, ResourceMetadata>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    pub fn register(&mut self, metadata: ResourceMetadata) {
        self.resources.insert(metadata.class.clone(), metadata);
    }

    pub fn get(&self, class: &ResourceClass) -> Option<&ResourceMetadata> {
        self.resources.get(class)
    }

    pub fn contains(&self, class: &ResourceClass) -> bool {
        self.resources.contains_key(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> ResourceMetadata {
        ResourceMetadata::new(ResourceClass::new("Book"), "books")
            .with_identifier("isbn")
            .with_relation(RelationMetadata::many_to_one(
                "author",
                ResourceClass::new("Author"),
                "author_id",
                "id",
            ))
    }

    #[test]
    fn test_primary_identifier_single() {
        assert_eq!(book().primary_identifier(), Some("isbn"));
    }

    #[test]
    fn test_primary_identifier_composite_is_none() {
        let meta = ResourceMetadata::new(ResourceClass::new("OrderLine"), "order_lines")
            .with_identifier("orderId")
            .with_identifier("lineNo");
        assert!(meta.is_composite());
        assert_eq!(meta.primary_identifier(), None);
    }

    #[test]
    fn test_relation_lookup() {
        let meta = book();
        assert_eq!(
            meta.relation("author").map(|r| r.target.as_str()),
            Some("Author")
        );
        assert!(meta.relation("publisher").is_none());
    }

    #[test]
    fn test_registry_membership() {
        let mut registry = ResourceRegistry::new();
        registry.register(book());

        assert!(registry.contains(&ResourceClass::new("Book")));
        assert!(!registry.contains(&ResourceClass::new("Author")));
        assert_eq!(
            registry.get(&ResourceClass::new("Book")).map(|m| m.source.as_str()),
            Some("books")
        );
    }
}
