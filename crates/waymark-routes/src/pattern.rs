//! Route template compilation
//!
//! A template such as `/users/:id` compiles into an anchored matcher:
//!
//! ```text
//! /users/:id      →  ^/users/([^/]+)(?:/$|$)
//! /files/*rest    →  ^/files/([^/]+)(?s:/.*)?$
//! /about          →  ^/about(?:/$|$)
//! ```
//!
//! `:name` and `*name` capture the same thing: one segment, never a
//! separator. A `*name` that closes the template additionally lets the
//! path continue past the captured segment.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PatternError;
use crate::{PathParams, Result};

/// `:name` or `*name`, where name is one or more ASCII word characters
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:*][A-Za-z0-9_]+").expect("placeholder regex is valid"));

/// One path segment
const SEGMENT_CAPTURE: &str = "([^/]+)";
/// Optional trailing separator, then end of input
const FOLLOWED_BY_SLASH: &str = "(?:/$|$)";
/// Anything after a closing `*name`
const TRAILING_REMAINDER: &str = "(?s:/.*)?$";

/// A route template compiled into a matcher
///
/// Immutable once built. Parameter names are kept in declaration order so
/// capture group `n + 1` always belongs to `param_names()[n]`.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    template: String,
    params: Vec<String>,
    matcher: Regex,
}

impl CompiledRoute {
    pub fn compile(template: &str) -> Result<Self> {
        let mut source = String::with_capacity(template.len() + 16);
        source.push('^');

        let mut params: Vec<String> = Vec::new();
        let mut cursor = 0;
        let mut closing_splat = false;

        for placeholder in PLACEHOLDER.find_iter(template) {
            source.push_str(&regex::escape(&template[cursor..placeholder.start()]));

            let (sigil, name) = placeholder.as_str().split_at(1);
            if params.iter().any(|existing| existing == name) {
                return Err(PatternError::DuplicateParameterName {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            params.push(name.to_string());
            source.push_str(SEGMENT_CAPTURE);
            cursor = placeholder.end();
            closing_splat = sigil == "*" && cursor == template.len();
        }

        source.push_str(&regex::escape(&template[cursor..]));
        source.push_str(if closing_splat {
            TRAILING_REMAINDER
        } else {
            FOLLOWED_BY_SLASH
        });

        let matcher = Regex::new(&source).map_err(|e| PatternError::Matcher {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            params,
            matcher,
        })
    }

    /// The template this route was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in declaration order
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Match `path` and collect the captured parameters.
    ///
    /// Returns `None` when the path is rejected. A capture group that did
    /// not participate in the match is left out of the map rather than
    /// stored as an empty string.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let caps = self.matcher.captures(path)?;

        Some(
            self.params
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    caps.get(index + 1)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Compile a route template
pub fn compile(template: &str) -> Result<CompiledRoute> {
    CompiledRoute::compile(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_param() {
        let route = compile("/users/:id").unwrap();
        assert_eq!(route.param_names(), ["id".to_string()]);

        let params = route.captures("/users/42").unwrap();
        assert_eq!(params.get("id"), Some(&"42".to_string()));
        assert_eq!(params.len(), 1);

        assert!(route.captures("/users/42/edit").is_none());
        assert!(route.captures("/users/").is_none());
        assert!(route.captures("/accounts/42").is_none());
    }

    #[test]
    fn test_trailing_separator_tolerated() {
        let route = compile("/a").unwrap();
        assert!(route.is_match("/a"));
        assert!(route.is_match("/a/"));
        assert!(!route.is_match("/ab"));
        assert!(!route.is_match("/a//"));
    }

    #[test]
    fn test_literal_template_requires_exact_match() {
        let route = compile("/about/team").unwrap();
        assert!(route.param_names().is_empty());
        assert!(route.captures("/about/team").unwrap().is_empty());
        assert!(!route.is_match("/about"));
        assert!(!route.is_match("/x/about/team"));
    }

    #[test]
    fn test_substituted_templates_round_trip() {
        let cases: &[(&str, &[(&str, &str)])] = &[
            ("/users/:id", &[("id", "42")]),
            ("/:org/:repo/issues/:number", &[("org", "rust-lang"), ("repo", "rust"), ("number", "1")]),
            ("/files/*path", &[("path", "report.pdf")]),
            ("/a/:x/b/*y/c", &[("x", "héllo wörld"), ("y", "q=1&z")]),
            ("/:only", &[("only", "...")]),
        ];

        for (template, values) in cases {
            let route = compile(template).unwrap();

            let mut path = template.to_string();
            for (name, value) in values.iter() {
                path = path
                    .replacen(&format!(":{}", name), value, 1)
                    .replacen(&format!("*{}", name), value, 1);
            }

            let params = route.captures(&path).unwrap_or_else(|| {
                panic!("{} should match {}", template, path);
            });
            assert_eq!(params.len(), values.len());
            for (name, value) in values.iter() {
                assert_eq!(params.get(*name).map(String::as_str), Some(*value));
            }
        }
    }

    #[test]
    fn test_closing_splat_captures_one_segment() {
        let route = compile("/files/*rest").unwrap();

        let params = route.captures("/files/a/b").unwrap();
        assert_eq!(params.get("rest"), Some(&"a".to_string()));

        let params = route.captures("/files/a").unwrap();
        assert_eq!(params.get("rest"), Some(&"a".to_string()));

        assert!(route.captures("/files/").is_none());
    }

    #[test]
    fn test_inner_splat_behaves_like_param() {
        let route = compile("/docs/*section/edit").unwrap();
        assert!(route.is_match("/docs/intro/edit"));
        assert!(!route.is_match("/docs/intro/more/edit"));
        assert!(!route.is_match("/docs/intro/edit/extra"));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = compile("/users/:id/friends/:id").unwrap_err();
        assert_eq!(
            err,
            PatternError::DuplicateParameterName {
                template: "/users/:id/friends/:id".to_string(),
                name: "id".to_string(),
            }
        );

        // Sigil does not make the name distinct
        assert!(compile("/a/:name/*name").is_err());
    }

    #[test]
    fn test_literal_metacharacters_escaped() {
        let route = compile("/v1.0/items(:id)").unwrap();
        assert!(route.is_match("/v1.0/items(7)"));
        assert!(!route.is_match("/v1x0/items(7)"));
    }

    #[test]
    fn test_root_template() {
        let route = compile("/").unwrap();
        assert!(route.is_match("/"));
        assert!(!route.is_match("/home"));
    }
}
