//! Rendering value trees back to HOCON or JSON text.

use std::cmp::Ordering;

use crate::path::{render_json_string, render_string_unquoted_if_possible};
use crate::{Value, ValueKind};

const INDENT: &str = "    ";

/// Options for rendering a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Newlines and indentation (default: true)
    pub formatted: bool,

    /// Emit comments attached to values (default: true)
    pub comments: bool,

    /// Emit a comment naming where each value came from (default: true)
    pub origin_comments: bool,

    /// Plain JSON: quoted keys, `:` separators, braces at the root
    /// (default: true). Comments still make the output invalid JSON.
    pub json: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            formatted: true,
            comments: true,
            origin_comments: true,
            json: true,
        }
    }
}

impl RenderOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatted JSON with comments and origin comments.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Single-line JSON with no comments.
    pub fn concise() -> Self {
        Self {
            formatted: false,
            comments: false,
            origin_comments: false,
            json: true,
        }
    }

    pub fn formatted(mut self, value: bool) -> Self {
        self.formatted = value;
        self
    }

    pub fn comments(mut self, value: bool) -> Self {
        self.comments = value;
        self
    }

    pub fn origin_comments(mut self, value: bool) -> Self {
        self.origin_comments = value;
        self
    }

    pub fn json(mut self, value: bool) -> Self {
        self.json = value;
        self
    }
}

impl Value {
    /// Render this value as text.
    pub fn render(&self, options: &RenderOptions) -> String {
        let mut renderer = Renderer {
            out: String::new(),
            options,
        };
        renderer.value(self, 0, true, None);
        if options.formatted && self.as_object().is_some() && !renderer.out.ends_with('\n') {
            renderer.out.push('\n');
        }
        renderer.out
    }
}

struct Renderer<'a> {
    out: String,
    options: &'a RenderOptions,
}

impl Renderer<'_> {
    fn indent(&mut self, depth: usize) {
        if self.options.formatted {
            for _ in 0..depth {
                self.out.push_str(INDENT);
            }
        }
    }

    fn comment_lines(&mut self, value: &Value, depth: usize) {
        if self.options.origin_comments {
            for line in value.origin().description().lines() {
                self.indent(depth);
                self.out.push('#');
                if !line.is_empty() {
                    self.out.push(' ');
                }
                self.out.push_str(line);
                self.out.push('\n');
            }
        }
        if self.options.comments {
            for comment in value.origin().comments() {
                self.indent(depth);
                self.out.push('#');
                if !comment.starts_with(' ') {
                    self.out.push(' ');
                }
                self.out.push_str(comment);
                self.out.push('\n');
            }
        }
    }

    fn key(&mut self, key: &str, value: &Value) {
        if self.options.json {
            self.out.push_str(&render_json_string(key));
            self.out.push_str(if self.options.formatted { " : " } else { ":" });
        } else {
            self.out.push_str(&render_string_unquoted_if_possible(key));
            if value.as_object().is_some() {
                // no separator needed before an object
                if self.options.formatted {
                    self.out.push(' ');
                }
            } else {
                self.out.push('=');
            }
        }
    }

    fn value(&mut self, value: &Value, depth: usize, at_root: bool, at_key: Option<&str>) {
        if let ValueKind::DelayedMerge(stack) | ValueKind::DelayedMergeObject(stack) =
            value.kind()
        {
            self.delayed_merge(stack, depth, at_root, at_key);
            return;
        }
        if let Some(key) = at_key {
            self.key(key, value);
        }
        match value.kind() {
            ValueKind::Object(object) => {
                if object.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                let braces = self.options.json || !at_root;
                let inner = if braces { depth + 1 } else { depth };
                if braces {
                    self.out.push('{');
                    if self.options.formatted {
                        self.out.push('\n');
                    }
                }
                let mut keys: Vec<&str> = object.keys().collect();
                keys.sort_by(|a, b| render_order(a, b));
                let mut separator_len = 0;
                for key in keys {
                    let Some(child) = object.get(key) else {
                        continue;
                    };
                    self.comment_lines(child, inner);
                    self.indent(inner);
                    self.value(child, inner, false, Some(key));
                    if self.options.formatted {
                        if self.options.json {
                            self.out.push(',');
                            separator_len = 2;
                        } else {
                            separator_len = 1;
                        }
                        self.out.push('\n');
                    } else {
                        self.out.push(',');
                        separator_len = 1;
                    }
                }
                self.out.truncate(self.out.len() - separator_len);
                if braces {
                    if self.options.formatted {
                        self.out.push('\n');
                        self.indent(depth);
                    }
                    self.out.push('}');
                }
            }
            ValueKind::List(list) => {
                if list.is_empty() {
                    self.out.push_str("[]");
                    return;
                }
                self.out.push('[');
                if self.options.formatted {
                    self.out.push('\n');
                }
                for item in list.items() {
                    self.comment_lines(item, depth + 1);
                    self.indent(depth + 1);
                    self.value(item, depth + 1, false, None);
                    self.out.push(',');
                    if self.options.formatted {
                        self.out.push('\n');
                    }
                }
                // the trailing comma, and its newline when formatted
                let chop = if self.options.formatted { 2 } else { 1 };
                self.out.truncate(self.out.len() - chop);
                if self.options.formatted {
                    self.out.push('\n');
                    self.indent(depth);
                }
                self.out.push(']');
            }
            ValueKind::String { text, .. } => self.out.push_str(&render_json_string(text)),
            ValueKind::Reference(reference) => self.out.push_str(&reference.expr.to_string()),
            ValueKind::Concatenation(pieces) => {
                for piece in pieces {
                    self.value(piece, depth, false, None);
                }
            }
            _ => {
                if let Some(text) = value.transform_to_string() {
                    self.out.push_str(&text);
                }
            }
        }
    }

    fn delayed_merge(&mut self, stack: &[Value], depth: usize, at_root: bool, at_key: Option<&str>) {
        let comment = self.options.comments;
        if comment {
            self.out.push_str(&format!(
                "# unresolved merge of {} values follows (\n",
                stack.len()
            ));
        }
        for (i, layer) in stack.iter().rev().enumerate() {
            if comment {
                self.indent(depth);
                match at_key {
                    Some(key) => self.out.push_str(&format!(
                        "#     unmerged value {} for key {} from {}\n",
                        i,
                        render_json_string(key),
                        layer.origin()
                    )),
                    None => self.out.push_str(&format!(
                        "#     unmerged value {} from {}\n",
                        i,
                        layer.origin()
                    )),
                }
            }
            self.indent(depth);
            if let Some(key) = at_key {
                self.out.push_str(&render_json_string(key));
                self.out.push_str(if self.options.formatted { " : " } else { ":" });
            }
            self.value(layer, depth, at_root, None);
            self.out.push(',');
            if self.options.formatted {
                self.out.push('\n');
            }
        }
        let chop = if self.options.formatted { 2 } else { 1 };
        self.out.truncate(self.out.len() - chop);
        if self.options.formatted {
            self.out.push('\n');
        }
        if comment {
            self.indent(depth);
            self.out.push_str("# ) end of unresolved merge\n");
        }
    }
}

/// All-digit keys first in numeric order, then everything else.
fn render_order(a: &str, b: &str) -> Ordering {
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match (digits(a), digits(b)) {
        (true, true) => match (a.parse::<u128>(), b.parse::<u128>()) {
            (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            _ => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        },
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Origin, Path, SubstitutionExpression};
    use facet_testhelpers::test;

    fn o() -> Origin {
        Origin::new("test")
    }

    fn sample() -> Value {
        Value::object(
            o(),
            [
                ("b".to_string(), Value::list(o(), vec![Value::int(o(), 1, None), Value::boolean(o(), true)])),
                ("a".to_string(), Value::string(o(), "x\"y")),
                (
                    "10".to_string(),
                    Value::object(o(), [("k".to_string(), Value::null(o()))].into_iter().collect()),
                ),
                ("9".to_string(), Value::empty_object(o())),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_concise_json() {
        insta::assert_snapshot!(
            sample().render(&RenderOptions::concise()),
            @r#"{"9":{},"10":{"k":null},"a":"x\"y","b":[1,true]}"#
        );
    }

    #[test]
    fn test_formatted_hocon() {
        let options = RenderOptions::new()
            .json(false)
            .comments(false)
            .origin_comments(false);
        let rendered = sample().render(&options);
        assert_eq!(
            rendered,
            "\"9\" {}\n\"10\" {\n    k=null\n}\na=\"x\\\"y\"\nb=[\n    1,\n    true\n]\n"
        );
    }

    #[test]
    fn test_comments_are_rendered() {
        let commented = Value::int(o().with_comments(vec![" the answer".into()]), 42, None);
        let root = Value::object(o(), [("x".to_string(), commented)].into_iter().collect());
        let rendered = root.render(&RenderOptions::new().origin_comments(false));
        assert_eq!(rendered, "{\n    # the answer\n    \"x\" : 42\n}\n");
    }

    #[test]
    fn test_reference_renders_as_substitution() {
        let reference = Value::reference(
            o(),
            SubstitutionExpression::new(Path::from_keys(["a", "b"]).unwrap(), true),
        );
        assert_eq!(reference.render(&RenderOptions::concise()), "${?a.b}");
    }

    #[test]
    fn test_number_keeps_original_text() {
        let number = Value::double(o(), 1.0, Some("1.0".into()));
        assert_eq!(number.render(&RenderOptions::concise()), "1.0");
    }
}
