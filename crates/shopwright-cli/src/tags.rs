//! Tag expressions for selecting scenarios.
//!
//! Parsing and evaluation are gherkin's [`TagOperation`]. On top of it the
//! leading `@` is optional and the keywords are case-insensitive, so
//! `@cart AND not logout` and `cart and not @logout` mean the same thing.

use crate::error::{CliError, CliResult};
use cucumber::gherkin::tagexpr::TagOperation;
use cucumber::tag::Ext as _;
use std::fmt;
use std::str::FromStr;

/// Parsed tag expression
#[derive(Debug, Clone)]
pub struct TagExpr {
    op: TagOperation,
    source: String,
}

/// Rewrite `input` into gherkin syntax: `@` on every tag, lowercase
/// keywords, no blanks just inside parentheses.
fn normalize(input: &str) -> String {
    let spaced = input.replace('(', " ( ").replace(')', " ) ");
    let mut out = String::new();
    for word in spaced.split_whitespace() {
        let word = match word.to_ascii_lowercase().as_str() {
            kw @ ("and" | "or" | "not") => kw.to_string(),
            "(" | ")" => word.to_string(),
            _ if word.starts_with('@') => word.to_string(),
            _ => format!("@{word}"),
        };
        if !(out.is_empty() || out.ends_with('(') || word == ")") {
            out.push(' ');
        }
        out.push_str(&word);
    }
    out
}

impl TagExpr {
    /// Parse an expression such as `@cart and not (@logout or wip)`
    pub fn parse(input: &str) -> CliResult<Self> {
        let source = normalize(input);
        let op = source
            .parse::<TagOperation>()
            .map_err(|e| CliError::invalid_argument(format!("tag expression '{input}': {e}")))?;
        Ok(Self { op, source })
    }

    /// `a or b or ...` over `tags`; `None` when the list is empty
    #[must_use]
    pub fn any_of<S: AsRef<str>>(tags: &[S]) -> Option<Self> {
        let tags: Vec<&str> = tags
            .iter()
            .map(|t| t.as_ref().trim().trim_start_matches('@'))
            .filter(|t| !t.is_empty())
            .collect();
        let op = tags
            .iter()
            .map(|t| TagOperation::Tag((*t).to_string()))
            .reduce(|left, right| TagOperation::Or(Box::new(left), Box::new(right)))?;
        let source = tags.iter().map(|t| format!("@{t}")).collect::<Vec<_>>().join(" or ");
        Some(Self { op, source })
    }

    /// Evaluate against a scenario's tags (with or without `@`)
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.op
            .eval(tags.iter().map(|t| t.as_ref().trim_start_matches('@')))
    }
}

impl FromStr for TagExpr {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| (*t).to_string()).collect()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_normalize() {
            assert_eq!(normalize("cart and NOT ( @logout or wip )"), "@cart and not (@logout or @wip)");
            assert_eq!(normalize("not(a)"), "not (@a)");
        }

        #[test]
        fn test_single_tag_with_or_without_at() {
            for input in ["@cart", "cart"] {
                let expr = TagExpr::parse(input).unwrap();
                assert!(expr.matches(&tags(&["cart"])));
                assert_eq!(expr.to_string(), "@cart");
            }
        }

        #[test]
        fn test_parentheses() {
            let expr = TagExpr::parse("( a or b ) and not(c)").unwrap();
            assert!(expr.matches(&tags(&["a"])));
            assert!(expr.matches(&tags(&["b", "x"])));
            assert!(!expr.matches(&tags(&["a", "c"])));
            assert!(!expr.matches(&tags(&["c"])));
        }

        #[test]
        fn test_keywords_case_insensitive() {
            let expr = TagExpr::parse("a AND NOT b").unwrap();
            assert!(expr.matches(&tags(&["a"])));
            assert!(!expr.matches(&tags(&["a", "b"])));
        }

        #[test]
        fn test_errors() {
            for input in ["", "a and", "(a or b", "a b", "@", ")"] {
                let err = TagExpr::parse(input).unwrap_err();
                assert!(err.to_string().contains("tag expression"), "{input}: {err}");
            }
        }
    }

    mod match_tests {
        use super::*;

        #[test]
        fn test_matches() {
            let expr: TagExpr = "@cart and not @logout".parse().unwrap();
            assert!(expr.matches(&tags(&["cart", "otpSession"])));
            assert!(expr.matches(&tags(&["@cart"])));
            assert!(!expr.matches(&tags(&["cart", "logout"])));
            assert!(!expr.matches(&tags(&["order"])));
        }

        #[test]
        fn test_any_of() {
            let expr = TagExpr::any_of(&["@cart", "logout", " "]).unwrap();
            assert_eq!(expr.to_string(), "@cart or @logout");
            assert!(expr.matches(&tags(&["logout"])));
            assert!(!expr.matches(&tags(&["order"])));
            assert!(TagExpr::any_of::<&str>(&[]).is_none());
        }

        #[test]
        fn test_tags_are_case_sensitive() {
            let expr = TagExpr::parse("guestSession").unwrap();
            assert!(!expr.matches(&tags(&["guestsession"])));
        }
    }
}
