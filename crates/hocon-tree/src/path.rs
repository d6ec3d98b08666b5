//! Paths into the value tree and substitution expressions.

use std::fmt;

/// A non-empty sequence of keys addressing a value in nested objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    /// A single-element path.
    pub fn key(key: impl Into<String>) -> Self {
        Path(vec![key.into()])
    }

    /// A path from its elements; `None` if `keys` is empty.
    pub fn from_keys<I, S>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() { None } else { Some(Path(keys)) }
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Everything after the first element.
    pub fn remainder(&self) -> Option<Path> {
        Path::from_keys(self.0[1..].iter().cloned())
    }

    /// Everything before the last element.
    pub fn parent(&self) -> Option<Path> {
        Path::from_keys(self.0[..self.0.len() - 1].iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; paths have at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The path with its first `n` elements dropped.
    pub fn sub_path(&self, n: usize) -> Option<Path> {
        Path::from_keys(self.0.iter().skip(n).cloned())
    }

    /// `prefix` followed by this path.
    pub fn prepend(&self, prefix: &Path) -> Path {
        let mut keys = prefix.0.clone();
        keys.extend(self.0.iter().cloned());
        Path(keys)
    }

    /// This path followed by `key`.
    pub fn child(&self, key: impl Into<String>) -> Path {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Path(keys)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Render as a path expression, quoting elements that need it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if key.is_empty() || has_funky_chars(key) {
                out.push_str(&render_json_string(key));
            } else {
                out.push_str(key);
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn has_funky_chars(s: &str) -> bool {
    !s.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Render `s` as a JSON string literal.
pub fn render_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render `s` bare when it would read back as the same string, quoted
/// otherwise.
pub fn render_string_unquoted_if_possible(s: &str) -> String {
    let Some(first) = s.chars().next() else {
        return render_json_string(s);
    };
    if first.is_ascii_digit() || first == '-' {
        return render_json_string(s);
    }
    if ["include", "true", "false", "null"]
        .iter()
        .any(|w| s.starts_with(w))
        || s.contains("//")
    {
        return render_json_string(s);
    }
    if s.chars().all(|c| c.is_alphanumeric() || c == '-') {
        s.to_string()
    } else {
        render_json_string(s)
    }
}

/// A `${path}` or `${?path}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionExpression {
    pub path: Path,
    pub optional: bool,
}

impl SubstitutionExpression {
    pub fn new(path: Path, optional: bool) -> Self {
        Self { path, optional }
    }

    pub fn with_path(&self, path: Path) -> Self {
        Self {
            path,
            optional: self.optional,
        }
    }
}

impl fmt::Display for SubstitutionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${{{}{}}}",
            if self.optional { "?" } else { "" },
            self.path.render()
        )
    }
}
