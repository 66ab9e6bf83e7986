//! Identifier decomposition and composition.
//!
//! Raw path values arrive as strings exactly as extracted from the request
//! path. Single-property resources take the value verbatim; composite
//! resources encode `prop1=val1;prop2=val2` pairs. Decomposition always
//! yields the declared property order, regardless of the order found in the
//! raw string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between `property=value` pairs of a composite identifier.
pub const PAIR_SEPARATOR: char = ';';
/// Separator between property and value inside one pair.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Errors raised while decomposing a raw identifier string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier value is empty")]
    Empty,

    #[error("identifier segment `{segment}` is not a single `property=value` pair")]
    MalformedSegment { segment: String },

    #[error("declared identifier property `{property}` is missing from the value")]
    MissingProperty { property: String },

    #[error("identifier property `{property}` appears more than once")]
    DuplicateProperty { property: String },

    #[error("identifier property `{property}` is not declared for this resource")]
    UndeclaredProperty { property: String },

    #[error("expected {expected} identifier value(s), got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("no value bound for URI variable `{parameter}`")]
    MissingVariable { parameter: String },
}

/// Ordered identifier property/value pairs.
///
/// The property set and order always match the declaration on the owning
/// resource, never the order found in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier(Vec<(String, String)>);

impl Identifier {
    pub fn single(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![(property.into(), value.into())])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decompose a raw path value against the declared identifier properties.
///
/// Single-property resources take the raw value verbatim (no delimiter
/// parsing). Composite resources are parsed as `;`-separated `prop=value`
/// pairs; every declared property must be present exactly once and no
/// undeclared property may appear. A segment that does not split into
/// exactly one `=` pair fails: values containing the delimiters are
/// unsupported by the composite encoding.
pub fn decompose(raw: &str, declared: &[String]) -> Result<Identifier, IdentifierError> {
    if raw.is_empty() {
        return Err(IdentifierError::Empty);
    }
    match declared.len() {
        0 => Err(IdentifierError::Arity {
            expected: 0,
            actual: 1,
        }),
        1 => Ok(Identifier::single(declared[0].clone(), raw)),
        _ => decompose_composite(raw, declared),
    }
}

fn decompose_composite(raw: &str, declared: &[String]) -> Result<Identifier, IdentifierError> {
    let mut found: Vec<(String, String)> = Vec::with_capacity(declared.len());

    for segment in raw.split(PAIR_SEPARATOR) {
        let mut parts = segment.split(KEY_VALUE_SEPARATOR);
        let (property, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(v), None) if !p.is_empty() => (p, v),
            _ => {
                return Err(IdentifierError::MalformedSegment {
                    segment: segment.to_string(),
                })
            }
        };
        if !declared.iter().any(|d| d == property) {
            return Err(IdentifierError::UndeclaredProperty {
                property: property.to_string(),
            });
        }
        if found.iter().any(|(p, _)| p == property) {
            return Err(IdentifierError::DuplicateProperty {
                property: property.to_string(),
            });
        }
        found.push((property.to_string(), value.to_string()));
    }

    // Declared order wins over the order found in the raw string.
    let mut ordered = Vec::with_capacity(declared.len());
    for property in declared {
        match found.iter().find(|(p, _)| p == property) {
            Some((_, value)) => ordered.push((property.clone(), value.clone())),
            None => {
                return Err(IdentifierError::MissingProperty {
                    property: property.clone(),
                })
            }
        }
    }

    Ok(Identifier(ordered))
}

/// Compose an identifier back into its raw path form.
///
/// The inverse of [`decompose`]: a single-property identifier is the value
/// verbatim, a composite identifier joins declared-order `prop=value` pairs
/// with `;`.
pub fn compose(identifier: &Identifier) -> String {
    match identifier.0.as_slice() {
        [(_, value)] => value.clone(),
        pairs => pairs
            .iter()
            .map(|(p, v)| format!("{p}{KEY_VALUE_SEPARATOR}{v}"))
            .collect::<Vec<_>>()
            .join(&PAIR_SEPARATOR.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn declared(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    // =========================================================================
    // Single-property identifiers
    // =========================================================================

    #[test]
    fn test_single_property_verbatim() {
        let id = decompose("978-0-13-468599-1", &declared(&["isbn"])).unwrap();
        assert_eq!(id.get("isbn"), Some("978-0-13-468599-1"));
        assert_eq!(id.len(), 1);
    }

    #[test]
    fn test_single_property_no_delimiter_parsing() {
        // A single-property value is never parsed, even with delimiters in it.
        let id = decompose("a=1;b=2", &declared(&["code"])).unwrap();
        assert_eq!(id.get("code"), Some("a=1;b=2"));
    }

    #[test]
    fn test_empty_raw_fails() {
        assert_eq!(
            decompose("", &declared(&["isbn"])),
            Err(IdentifierError::Empty)
        );
    }

    proptest! {
        #[test]
        fn prop_single_property_roundtrip(raw in "[^;=]{1,40}") {
            let decl = declared(&["id"]);
            let id = decompose(&raw, &decl).unwrap();
            prop_assert_eq!(id.get("id"), Some(raw.as_str()));
            prop_assert_eq!(compose(&id), raw);
        }
    }

    // =========================================================================
    // Composite identifiers
    // =========================================================================

    #[test]
    fn test_composite_declared_order_wins() {
        let id = decompose("b=2;a=1", &declared(&["a", "b"])).unwrap();
        let pairs: Vec<_> = id.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_composite_order_line() {
        let id = decompose("orderId=42;lineNo=3", &declared(&["orderId", "lineNo"])).unwrap();
        assert_eq!(id.get("orderId"), Some("42"));
        assert_eq!(id.get("lineNo"), Some("3"));
    }

    #[test_case("a" ; "first property omitted")]
    #[test_case("b" ; "second property omitted")]
    fn test_composite_missing_property_fails(omitted: &str) {
        let kept = if omitted == "a" { "b" } else { "a" };
        let raw = format!("{kept}=1");
        let err = decompose(&raw, &declared(&["a", "b"])).unwrap_err();
        assert_eq!(
            err,
            IdentifierError::MissingProperty {
                property: omitted.to_string()
            }
        );
    }

    #[test]
    fn test_composite_undeclared_property_fails() {
        let err = decompose("a=1;b=2;c=3", &declared(&["a", "b"])).unwrap_err();
        assert!(matches!(err, IdentifierError::UndeclaredProperty { .. }));
    }

    #[test]
    fn test_composite_duplicate_property_fails() {
        let err = decompose("a=1;a=2", &declared(&["a", "b"])).unwrap_err();
        assert!(matches!(err, IdentifierError::DuplicateProperty { .. }));
    }

    #[test_case("a=1=2;b=2" ; "value containing equals")]
    #[test_case("a=1;;b=2" ; "empty segment from stray separator")]
    #[test_case("a;b=2" ; "segment without pair")]
    #[test_case("=1;b=2" ; "empty property name")]
    fn test_composite_malformed_segment_fails(raw: &str) {
        let err = decompose(raw, &declared(&["a", "b"])).unwrap_err();
        assert!(matches!(err, IdentifierError::MalformedSegment { .. }), "{err:?}");
    }

    #[test]
    fn test_compose_composite() {
        let id = decompose("b=2;a=1", &declared(&["a", "b"])).unwrap();
        assert_eq!(compose(&id), "a=1;b=2");
    }

    #[test]
    fn test_compose_then_decompose_is_identity() {
        let decl = declared(&["a", "b", "c"]);
        let id = decompose("c=z;a=x;b=y", &decl).unwrap();
        assert_eq!(decompose(&compose(&id), &decl).unwrap(), id);
    }
}
