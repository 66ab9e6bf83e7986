//! Join-alias and parameter-name generation.
//!
//! One generator lives inside each builder and is discarded with it, so
//! names are unique within one query-construction pass even when the same
//! base repeats. Correctness of joins depends only on aliases being
//! distinct, not predictable.

/// Produces collision-free symbolic names for one query-construction pass.
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    aliases: usize,
    parameters: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique join alias, e.g. `author_a1`.
    pub fn join_alias(&mut self, base: &str) -> String {
        self.aliases += 1;
        format!("{}_a{}", sanitize(base), self.aliases)
    }

    /// Next unique bind-parameter name, e.g. `isbn_p1`.
    pub fn parameter(&mut self, base: &str) -> String {
        self.parameters += 1;
        format!("{}_p{}", sanitize(base), self.parameters)
    }
}

/// Reduce a base to identifier characters so it is safe inside SQL text and
/// field paths.
fn sanitize(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    match cleaned.chars().next() {
        None => "x".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{cleaned}"),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_repeated_base_stays_unique() {
        let mut names = NameGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..10 {
            assert!(seen.insert(names.join_alias("author")));
            assert!(seen.insert(names.parameter("author")));
        }
    }

    #[test]
    fn test_sanitizes_non_identifier_characters() {
        let mut names = NameGenerator::new();
        let alias = names.join_alias("order.line-no");
        assert!(alias.starts_with("order_line_no_a"));
    }

    #[test]
    fn test_leading_digit_and_empty_base() {
        let mut names = NameGenerator::new();
        assert!(names.parameter("1st").starts_with("_1st_p"));
        assert!(names.parameter("").starts_with("x_p"));
    }
}
