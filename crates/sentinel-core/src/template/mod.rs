//! Placeholder rendering for pipeline and policy templates.
//!
//! Templates use `__KEY__` placeholders. Text inside `${{ ... }}` belongs to
//! the CI platform's expression language and is copied through untouched.

pub mod source;

use std::collections::BTreeMap;

pub use source::{EmbeddedTemplates, LayeredTemplates, TemplateSource};

/// Flat substitution map. Keys are written without the surrounding underscores.
pub type TemplateVars = BTreeMap<String, String>;

const EXPR_OPEN: &str = "${{";
const EXPR_CLOSE: &str = "}}";
const DELIM: &str = "__";

/// Replace every `__KEY__` whose key is in `vars`; unknown placeholders are
/// left verbatim. Substituted values are not scanned again.
///
/// Any non-empty key is accepted, including keys containing `-`, `.` or `__`.
/// Where two keys match at the same position the longer one wins.
pub fn render_template(template: &str, vars: &TemplateVars) -> String {
    let mut keys: Vec<&str> = vars
        .keys()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(EXPR_OPEN) {
        substitute(&mut out, &rest[..open], &keys, vars);
        let expr = &rest[open..];
        match expr[EXPR_OPEN.len()..].find(EXPR_CLOSE) {
            Some(close) => {
                let end = EXPR_OPEN.len() + close + EXPR_CLOSE.len();
                out.push_str(&expr[..end]);
                rest = &expr[end..];
            }
            None => {
                // Unterminated expression: protect everything after it.
                out.push_str(expr);
                return out;
            }
        }
    }

    substitute(&mut out, rest, &keys, vars);
    out
}

fn substitute(out: &mut String, text: &str, keys: &[&str], vars: &TemplateVars) {
    let mut rest = text;
    while let Some(at) = rest.find(DELIM) {
        out.push_str(&rest[..at]);
        let body = &rest[at + DELIM.len()..];
        let hit = keys
            .iter()
            .find(|key| body.strip_prefix(**key).is_some_and(|tail| tail.starts_with(DELIM)));
        match hit.and_then(|key| vars.get(*key).map(|value| (*key, value))) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &body[key.len() + DELIM.len()..];
            }
            None => {
                // Slide by one underscore so `___KEY__` still matches.
                out.push('_');
                rest = &rest[at + 1..];
            }
        }
    }
    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_known_and_keeps_expressions() {
        let out = render_template("node: __V__, expr: ${{ a.b }}", &vars(&[("V", "20")]));
        assert_eq!(out, "node: 20, expr: ${{ a.b }}");
    }

    #[test]
    fn test_render_keeps_unknown_placeholder() {
        let out = render_template("a __X__ b __V__", &vars(&[("V", "1")]));
        assert_eq!(out, "a __X__ b 1");
    }

    #[test]
    fn test_render_never_touches_placeholder_inside_expression() {
        let out = render_template(
            "${{ secrets.__V__ }} and __V__",
            &vars(&[("V", "value")]),
        );
        assert_eq!(out, "${{ secrets.__V__ }} and value");
    }

    #[test]
    fn test_render_unterminated_expression_is_protected() {
        let out = render_template("__V__ ${{ __V__", &vars(&[("V", "x")]));
        assert_eq!(out, "x ${{ __V__");
    }

    #[test]
    fn test_render_multiline_expression() {
        let template = "run: ${{\n  __V__\n}}\nwith: __V__";
        let out = render_template(template, &vars(&[("V", "ok")]));
        assert_eq!(out, "run: ${{\n  __V__\n}}\nwith: ok");
    }

    #[test]
    fn test_render_values_are_not_rescanned() {
        let out = render_template("__A__", &vars(&[("A", "__B__"), ("B", "nope")]));
        assert_eq!(out, "__B__");
    }

    #[test]
    fn test_render_keys_with_underscores() {
        let out = render_template(
            "paths: __ALLOWED_PATHS__",
            &vars(&[("ALLOWED_PATHS", "src/")]),
        );
        assert_eq!(out, "paths: src/");
    }

    #[test]
    fn test_render_keys_outside_identifier_charset() {
        let out = render_template("v: __node-version__", &vars(&[("node-version", "20")]));
        assert_eq!(out, "v: 20");

        let out = render_template("name: __app.name__", &vars(&[("app.name", "svc")]));
        assert_eq!(out, "name: svc");
    }

    #[test]
    fn test_render_key_containing_delimiter_prefers_longest() {
        let out = render_template("__A__B__", &vars(&[("A__B", "long")]));
        assert_eq!(out, "long");

        let out = render_template("__A__B__", &vars(&[("A", "short"), ("A__B", "long")]));
        assert_eq!(out, "long");

        let out = render_template("__A__B__", &vars(&[("A", "short")]));
        assert_eq!(out, "shortB__");
    }

    #[test]
    fn test_render_extra_leading_underscore() {
        let out = render_template("___V__", &vars(&[("V", "1")]));
        assert_eq!(out, "_1");
    }

    #[test]
    fn test_render_repeated_occurrences() {
        let out = render_template("__V__-__V__", &vars(&[("V", "1")]));
        assert_eq!(out, "1-1");
    }
}
