//! Java-style `.properties` documents, and trees built from flat path maps.

use std::collections::HashSet;

use indexmap::IndexMap;

use hocon_tree::{ConfigError, Origin, Path, Result, Value};

/// Parse a properties document. Keys are split on `.` into paths and every
/// value is a string.
pub fn parse(text: &str, origin: &Origin) -> Result<Value> {
    let mut entries: IndexMap<String, String> = IndexMap::new();
    for line in logical_lines(text) {
        let (key, value) = split_entry(&line);
        entries.insert(key, value);
    }
    let paths = entries.into_iter().filter_map(|(key, value)| {
        let path = Path::from_keys(key.split('.'))?;
        Some((path, Value::string(origin.clone(), value)))
    });
    from_path_map(origin, paths, true)
}

/// Joins continuation lines and drops comments and blank lines.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let line = match current.take() {
            Some(mut pending) => {
                pending.push_str(trimmed);
                pending
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };
        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            let mut line = line;
            line.pop();
            current = Some(line);
        } else {
            lines.push(line);
        }
    }
    if let Some(line) = current {
        lines.push(line);
    }
    lines
}

fn split_entry(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_escaped(&mut key, escaped, &mut chars);
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=' | ':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                push_escaped(&mut value, escaped, &mut chars);
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn push_escaped(out: &mut String, escaped: char, rest: &mut impl Iterator<Item = char>) {
    match escaped {
        't' => out.push('\t'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        'f' => out.push('\u{000C}'),
        'u' => {
            let hex: String = rest.take(4).collect();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(c) => out.push(c),
                None => {
                    out.push('u');
                    out.push_str(&hex);
                }
            }
        }
        other => out.push(other),
    }
}

enum Node {
    Leaf(Value),
    Branch(IndexMap<String, Node>),
}

impl Node {
    fn into_value(self, origin: &Origin) -> Value {
        match self {
            Node::Leaf(value) => value,
            Node::Branch(children) => Value::object(
                origin.clone(),
                children
                    .into_iter()
                    .map(|(key, child)| (key, child.into_value(origin)))
                    .collect(),
            ),
        }
    }
}

/// Build an object tree from `(path, value)` pairs.
///
/// A path that is also the parent of another path is a conflict. With
/// `objects_win` the value is dropped in favor of the object; otherwise the
/// map is rejected.
pub fn from_path_map(
    origin: &Origin,
    entries: impl IntoIterator<Item = (Path, Value)>,
    objects_win: bool,
) -> Result<Value> {
    let entries: Vec<(Path, Value)> = entries.into_iter().collect();
    let mut scopes = HashSet::new();
    for (path, _) in &entries {
        let mut parent = path.parent();
        while let Some(scope) = parent {
            parent = scope.parent();
            scopes.insert(scope);
        }
    }

    let mut root: IndexMap<String, Node> = IndexMap::new();
    for (path, value) in entries {
        if scopes.contains(&path) {
            if objects_win {
                continue;
            }
            return Err(ConfigError::bug(format!(
                "In the map, path '{}' occurs as both the parent object of a value and as a value",
                path.render()
            )));
        }
        let mut children = &mut root;
        for key in &path.keys()[..path.len() - 1] {
            let node = children
                .entry(key.clone())
                .or_insert_with(|| Node::Branch(IndexMap::new()));
            children = match node {
                Node::Branch(inner) => inner,
                Node::Leaf(_) => {
                    return Err(ConfigError::bug(format!(
                        "path '{}' runs through a value",
                        path.render()
                    )));
                }
            };
        }
        children.insert(path.last().to_string(), Node::Leaf(value));
    }
    Ok(Node::Branch(root).into_value(origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn parsed(text: &str) -> Value {
        parse(text, &Origin::new("props")).unwrap()
    }

    fn get<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
        let path = Path::from_keys(path.split('.')).unwrap();
        value.as_object()?.peek_path(&path)?.as_str()
    }

    #[test]
    fn test_separators_and_comments() {
        let value = parsed("# comment\n! also\na.b=1\nc : two\nd three\n\ne=");
        assert_eq!(get(&value, "a.b"), Some("1"));
        assert_eq!(get(&value, "c"), Some("two"));
        assert_eq!(get(&value, "d"), Some("three"));
        assert_eq!(get(&value, "e"), Some(""));
    }

    #[test]
    fn test_continuation_and_escapes() {
        let value = parsed("long = one \\\n    two\ntab=a\\tb\nuni=\\u0041\nkey\\ with\\ spaces=x");
        assert_eq!(get(&value, "long"), Some("one two"));
        assert_eq!(get(&value, "tab"), Some("a\tb"));
        assert_eq!(get(&value, "uni"), Some("A"));
        assert_eq!(get(&value, "key with spaces"), Some("x"));
    }

    #[test]
    fn test_objects_win_over_values() {
        let value = parsed("a=1\na.b=2");
        assert_eq!(get(&value, "a.b"), Some("2"));
        assert!(value.as_object().unwrap().get("a").unwrap().as_object().is_some());
    }

    #[test]
    fn test_conflict_is_an_error_for_plain_maps() {
        let o = Origin::new("map");
        let entries = vec![
            (Path::key("a"), Value::int(o.clone(), 1, None)),
            (Path::from_keys(["a", "b"]).unwrap(), Value::int(o.clone(), 2, None)),
        ];
        assert!(from_path_map(&o, entries, false).is_err());
    }
}
