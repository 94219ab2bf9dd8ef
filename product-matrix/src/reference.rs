//! Business-reference extraction.
//!
//! A business reference is a tenant-defined key derived from the output
//! document. Each configured expression is a dot path such as
//! `Products.Identifiers.Sku`; navigating through an array maps the rest of
//! the path over its elements. Segments may be backtick-quoted to contain dots
//! and may carry `[n]` index suffixes.
//!
//! Evaluation renders every expression to a string (multiple matches joined
//! with `,`, no match as the empty string) and joins the per-expression
//! strings with `.`.
//!
//! # Examples
//!
//! ```
//! use product_matrix::reference::{PathExtractor, ReferenceExtractor};
//! use serde_json::json;
//!
//! let doc = json!({ "Slug": "case", "Products": [{ "Sku": "A" }, { "Sku": "B" }] });
//! let expressions = vec!["Slug".to_owned(), "Products.Sku".to_owned()];
//! assert_eq!(PathExtractor.extract(&expressions, &doc).unwrap(), "case.A,B");
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::{ConnectorError, Result};

/// Separator between the values of consecutive expressions.
pub const EXPRESSION_SEPARATOR: &str = ".";

/// Separator between multiple matches of one expression.
pub const MATCH_SEPARATOR: &str = ",";

/// Reasons a path expression fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    /// The expression is empty or whitespace.
    #[error("expression is empty")]
    Empty,
    /// A segment between dots has no name.
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    /// A backtick-quoted segment is never closed.
    #[error("unterminated quoted segment starting at position {0}")]
    UnterminatedQuote(usize),
    /// An index suffix is not a non-negative integer.
    #[error("invalid array index '{0}'")]
    InvalidIndex(String),
    /// A character appeared where a separator was expected.
    #[error("unexpected '{0}' at position {1}")]
    Unexpected(char, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    field: String,
    indexes: Vec<usize>,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    segments: Vec<Segment>,
}

impl PathExpression {
    /// Parses a path expression.
    ///
    /// # Errors
    ///
    /// Returns a [`PathParseError`] describing the first syntax problem.
    pub fn parse(expression: &str) -> std::result::Result<Self, PathParseError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(PathParseError::Empty);
        }

        let chars: Vec<char> = expression.chars().collect();
        let mut segments = Vec::new();
        let mut pos = 0;

        loop {
            let start = pos;
            let field = if chars.get(pos) == Some(&'`') {
                let close = chars[pos + 1..]
                    .iter()
                    .position(|&c| c == '`')
                    .ok_or(PathParseError::UnterminatedQuote(start))?;
                let field: String = chars[pos + 1..pos + 1 + close].iter().collect();
                pos += close + 2;
                field
            } else {
                let len = chars[pos..].iter().take_while(|&&c| c != '.' && c != '[').count();
                let field: String = chars[pos..pos + len].iter().collect();
                pos += len;
                field.trim().to_owned()
            };

            if field.is_empty() {
                return Err(PathParseError::EmptySegment(start));
            }

            let mut indexes = Vec::new();
            while chars.get(pos) == Some(&'[') {
                let close = chars[pos + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| {
                        PathParseError::InvalidIndex(chars[pos + 1..].iter().collect())
                    })?;
                let raw: String = chars[pos + 1..pos + 1 + close].iter().collect();
                let index = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(raw.clone()))?;
                indexes.push(index);
                pos += close + 2;
            }

            segments.push(Segment { field, indexes });

            match chars.get(pos) {
                None => break,
                Some('.') => {
                    pos += 1;
                    if pos == chars.len() {
                        return Err(PathParseError::EmptySegment(pos));
                    }
                }
                Some(&other) => return Err(PathParseError::Unexpected(other, pos)),
            }
        }

        Ok(Self { segments })
    }

    /// Evaluates the expression against `doc`, returning every match in document order.
    #[must_use]
    pub fn evaluate<'a>(&self, doc: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![doc];

        for segment in &self.segments {
            let mut next = Vec::new();
            for value in flatten(current) {
                let Some(mut found) = value.get(&segment.field) else {
                    continue;
                };
                let mut in_range = true;
                for &index in &segment.indexes {
                    match found.get(index) {
                        Some(element) => found = element,
                        None => {
                            in_range = false;
                            break;
                        }
                    }
                }
                if in_range {
                    next.push(found);
                }
            }
            current = next;
        }

        flatten(current)
    }

    /// Evaluates and renders the matches as one string.
    #[must_use]
    pub fn render(&self, doc: &Value) -> String {
        self.evaluate(doc)
            .into_iter()
            .filter_map(render_scalar)
            .collect::<Vec<_>>()
            .join(MATCH_SEPARATOR)
    }
}

fn flatten(values: Vec<&Value>) -> Vec<&Value> {
    values
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(elements) => elements.iter().collect(),
            other => vec![other],
        })
        .collect()
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Computes the business reference of an output document.
pub trait ReferenceExtractor: Send + Sync {
    /// Evaluates `expressions` against `doc` and joins the results.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ReferenceError`] when the document is not an
    /// object or an expression cannot be evaluated.
    fn extract(&self, expressions: &[String], doc: &Value) -> Result<String>;
}

/// The built-in dot-path evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathExtractor;

impl ReferenceExtractor for PathExtractor {
    fn extract(&self, expressions: &[String], doc: &Value) -> Result<String> {
        if !doc.is_object() {
            return Err(ConnectorError::ReferenceError("doc must be an object.".to_owned()));
        }

        let values = expressions
            .iter()
            .map(|expression| {
                PathExpression::parse(expression)
                    .map(|path| path.render(doc))
                    .map_err(|e| ConnectorError::ReferenceError(format!("'{expression}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(values.join(EXPRESSION_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc() -> Value {
        json!({
            "CatalogItemId": "c-1",
            "Slug": "phone-case",
            "Identifiers": [
                { "SkuType": "VendorSKU", "Sku": "VC-1" },
                { "SkuType": "UPC", "Sku": "0123" }
            ],
            "Products": [
                { "Slug": "red", "Identifiers": [{ "Sku": "R-1" }] },
                { "Slug": "blue", "Identifiers": [{ "Sku": "B-1" }, { "Sku": "B-2" }] }
            ],
            "a.b": { "Count": 3 },
            "Active": true
        })
    }

    fn extract(expressions: &[&str]) -> String {
        let expressions: Vec<String> = expressions.iter().map(|&e| e.to_owned()).collect();
        PathExtractor.extract(&expressions, &doc()).unwrap()
    }

    #[test]
    fn test_single_field() {
        assert_eq!(extract(&["CatalogItemId"]), "c-1");
    }

    #[test]
    fn test_expressions_join_with_dot() {
        assert_eq!(extract(&["CatalogItemId", "Slug"]), "c-1.phone-case");
    }

    #[test]
    fn test_implicit_array_mapping() {
        assert_eq!(extract(&["Identifiers.Sku"]), "VC-1,0123");
        assert_eq!(extract(&["Products.Identifiers.Sku"]), "R-1,B-1,B-2");
    }

    #[test]
    fn test_index_suffix() {
        assert_eq!(extract(&["Identifiers[1].Sku"]), "0123");
        assert_eq!(extract(&["Products[1].Identifiers[0].Sku"]), "B-1");
        assert_eq!(extract(&["Identifiers[9].Sku"]), "");
    }

    #[test]
    fn test_quoted_segment_and_scalars() {
        assert_eq!(extract(&["`a.b`.Count", "Active"]), "3.true");
    }

    #[test]
    fn test_missing_path_renders_empty() {
        assert_eq!(extract(&["Missing", "Slug"]), ".phone-case");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PathExpression::parse("  "), Err(PathParseError::Empty));
        assert_eq!(PathExpression::parse("a..b"), Err(PathParseError::EmptySegment(2)));
        assert_eq!(PathExpression::parse("a."), Err(PathParseError::EmptySegment(2)));
        assert_eq!(PathExpression::parse("`a.b"), Err(PathParseError::UnterminatedQuote(0)));
        assert_eq!(
            PathExpression::parse("Identifiers[x].Sku"),
            Err(PathParseError::InvalidIndex("x".to_owned()))
        );
        assert_eq!(PathExpression::parse("a[0]b"), Err(PathParseError::Unexpected('b', 4)));
    }

    #[test]
    fn test_extract_rejects_non_object_doc() {
        let err = PathExtractor.extract(&["Slug".to_owned()], &json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConnectorError::ReferenceError(_)));
    }

    #[test]
    fn test_extract_rejects_bad_expression() {
        let err = PathExtractor.extract(&["a..b".to_owned()], &doc()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Business reference extraction failed: 'a..b': empty segment at position 2"
        );
    }
}
