//! Pagination configuration.

use serde::{Deserialize, Serialize};

/// Process-wide pagination defaults, overridable per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Whether collections paginate unless an operation opts out.
    pub enabled: bool,
    /// Default page size.
    pub items_per_page: u64,
    /// Hard cap on the page size, applied after any client request.
    pub maximum_items_per_page: Option<u64>,
    /// Request parameter carrying the page number.
    pub page_parameter: String,
    /// Request parameter letting clients pick a page size; `None` keeps the
    /// size server-controlled.
    pub items_per_page_parameter: Option<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            items_per_page: 30,
            maximum_items_per_page: Some(100),
            page_parameter: "page".to_string(),
            items_per_page_parameter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_server_controlled() {
        let config = PaginationConfig::default();
        assert!(config.enabled);
        assert_eq!(config.items_per_page, 30);
        assert!(config.items_per_page_parameter.is_none());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: PaginationConfig = serde_json::from_str(r#"{"items_per_page": 10}"#).unwrap();
        assert_eq!(config.items_per_page, 10);
        assert_eq!(config.page_parameter, "page");
    }
}
