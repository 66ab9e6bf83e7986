//! Relationship links between resource classes.
//!
//! A [`Link`] describes one hop used to resolve a URI path segment into a
//! query constraint. Constructors enforce the shape invariant: at most one
//! of `from_property`/`to_property` is set, and an identity hop sets
//! neither.

use crate::metadata::ResourceClass;
use serde::{Deserialize, Serialize};

/// One declared relationship hop between two resource types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    parameter_name: String,
    from_class: ResourceClass,
    to_class: ResourceClass,
    from_property: Option<String>,
    to_property: Option<String>,
    identifiers: Vec<String>,
    expanded_value: Option<String>,
}

impl Link {
    /// Identity hop: the URI variable binds identifiers of the class itself.
    pub fn identity(
        parameter_name: impl Into<String>,
        class: ResourceClass,
        identifiers: Vec<String>,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            from_class: class.clone(),
            to_class: class,
            from_property: None,
            to_property: None,
            identifiers,
            expanded_value: None,
        }
    }

    /// Forward hop: `from_class` declares the relationship property, and
    /// the URI variable binds `from_class` identifiers.
    pub fn forward(
        parameter_name: impl Into<String>,
        from_class: ResourceClass,
        from_property: impl Into<String>,
        to_class: ResourceClass,
        identifiers: Vec<String>,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            from_class,
            to_class,
            from_property: Some(from_property.into()),
            to_property: None,
            identifiers,
            expanded_value: None,
        }
    }

    /// Inverse hop: `to_class` declares the relationship property pointing
    /// back at `from_class`, and the URI variable binds `from_class`
    /// identifiers.
    pub fn inverse(
        parameter_name: impl Into<String>,
        from_class: ResourceClass,
        to_class: ResourceClass,
        to_property: impl Into<String>,
        identifiers: Vec<String>,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            from_class,
            to_class,
            from_property: None,
            to_property: Some(to_property.into()),
            identifiers,
            expanded_value: None,
        }
    }

    /// Mark this hop as a fixed URI word rather than a variable placeholder.
    /// Expanded hops contribute no identifier binding.
    pub fn with_expanded_value(mut self, value: impl Into<String>) -> Self {
        self.expanded_value = Some(value.into());
        self
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn from_class(&self) -> &ResourceClass {
        &self.from_class
    }

    pub fn to_class(&self) -> &ResourceClass {
        &self.to_class
    }

    pub fn from_property(&self) -> Option<&str> {
        self.from_property.as_deref()
    }

    pub fn to_property(&self) -> Option<&str> {
        self.to_property.as_deref()
    }

    /// Identifier properties the bound path value decomposes into.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn expanded_value(&self) -> Option<&str> {
        self.expanded_value.as_deref()
    }

    /// The relationship property this hop navigates, regardless of
    /// direction.
    pub fn lookup_property(&self) -> Option<&str> {
        self.to_property.as_deref().or(self.from_property.as_deref())
    }

    pub fn is_identity(&self) -> bool {
        self.from_property.is_none() && self.to_property.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_hop_shape() {
        let link = Link::identity("id", ResourceClass::new("Book"), vec!["isbn".into()]);
        assert!(link.is_identity());
        assert_eq!(link.lookup_property(), None);
        assert_eq!(link.from_class(), link.to_class());
    }

    #[test]
    fn test_lookup_property_prefers_to_property() {
        let inverse = Link::inverse(
            "companyId",
            ResourceClass::new("Company"),
            ResourceClass::new("Employee"),
            "company",
            vec!["id".into()],
        );
        assert_eq!(inverse.lookup_property(), Some("company"));

        let forward = Link::forward(
            "id",
            ResourceClass::new("Employee"),
            "company",
            ResourceClass::new("Company"),
            vec!["id".into()],
        );
        assert_eq!(forward.lookup_property(), Some("company"));
        assert!(forward.to_property().is_none());
    }
}
