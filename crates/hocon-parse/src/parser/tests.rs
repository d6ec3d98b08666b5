use std::sync::Arc;

use super::*;
use crate::{ParseOptions, parse_file, parse_path, parse_string};
use facet_testhelpers::test;
use hocon_tree::{RenderOptions, ResolveOptions, ValueKind, resolve};

fn parse(source: &str) -> Value {
    parse_string(source, &ParseOptions::new()).unwrap()
}

fn parse_json(source: &str) -> Result<Value> {
    parse_string(source, &ParseOptions::new().with_syntax(Some(Syntax::Json)))
}

fn parse_err(source: &str) -> ConfigError {
    parse_string(source, &ParseOptions::new()).unwrap_err()
}

fn resolved(source: &str) -> Value {
    resolve(&parse(source), &ResolveOptions::no_system()).unwrap()
}

fn at<'v>(value: &'v Value, path: &str) -> &'v Value {
    value
        .as_object()
        .and_then(|o| o.peek_path(&parse_path(path).unwrap()))
        .unwrap_or_else(|| panic!("no value at {path}"))
}

fn int(value: &Value) -> Option<i64> {
    value.as_number().map(|n| n.as_i64())
}

#[test]
fn test_braceless_root() {
    let value = parse("a = 1\nb : \"two\"\nc { d = true }\ne = null");
    assert_eq!(int(at(&value, "a")), Some(1));
    assert_eq!(at(&value, "b").as_str(), Some("two"));
    assert_eq!(at(&value, "c.d").as_bool(), Some(true));
    assert!(at(&value, "e").is_null());
}

#[test]
fn test_braced_root_with_trailing_comma() {
    let value = parse(r#"{ "a": 1, "b": [1, 2, 3], }"#);
    assert_eq!(int(at(&value, "a")), Some(1));
    assert_eq!(at(&value, "b").as_list().unwrap().len(), 3);
}

#[test]
fn test_empty_document_is_empty_object() {
    assert!(parse("").as_object().unwrap().is_empty());
    assert!(parse("\n\n# only a comment\n").as_object().unwrap().is_empty());
}

#[test]
fn test_json_is_strict() {
    let value = parse_json(r#"{"a": {"b": [1, 2.5, "x", null, false]}}"#).unwrap();
    assert_eq!(at(&value, "a.b").as_list().unwrap().len(), 5);

    let cases = [
        (r#"{"a": 1,}"#, "expecting a field name after a comma"),
        (r#"{"a": foo}"#, "Token not allowed in valid JSON"),
        (r#"{"a": 1, "a": 2}"#, "JSON does not allow duplicate fields"),
        (r#"{"a": [1,]}"#, "List should have had new element after a comma"),
        ("", "Empty document"),
        ("1", "Document must have an object or array at root"),
    ];
    for (source, expected) in cases {
        let err = parse_json(source).unwrap_err();
        assert!(err.to_string().contains(expected), "{source:?}: {err}");
    }
}

#[test]
fn test_dotted_keys_merge_into_objects() {
    let value = parse("a.b = 1\na.c = 2\na { d = 3 }");
    assert_eq!(int(at(&value, "a.b")), Some(1));
    assert_eq!(int(at(&value, "a.c")), Some(2));
    assert_eq!(int(at(&value, "a.d")), Some(3));
}

#[test]
fn test_duplicate_keys() {
    assert_eq!(int(at(&parse("a = 1\na = 2"), "a")), Some(2));
    assert_eq!(int(at(&parse("a { x = 1 }\na = 5"), "a")), Some(5));
    assert_eq!(int(at(&parse("a = 5\na { x = 1 }"), "a.x")), Some(1));

    let merged = parse("a { x = 1 }\na { y = 2 }");
    assert_eq!(int(at(&merged, "a.x")), Some(1));
    assert_eq!(int(at(&merged, "a.y")), Some(2));
}

#[test]
fn test_quoted_and_numeric_keys() {
    let value = parse("\"a.b\" = 1\n10.0foo = 2");
    let root = value.as_object().unwrap();
    assert_eq!(int(root.get("a.b").unwrap()), Some(1));
    let ten = root.get("10").unwrap().as_object().unwrap();
    assert_eq!(int(ten.get("0foo").unwrap()), Some(2));
}

#[test]
fn test_value_concatenation() {
    let value = parse("a = foo bar 10\nb = \"x\" y\nc = [1, 2] [3]\nd = { x = 1 } { y = 2 }");
    assert_eq!(at(&value, "a").as_str(), Some("foo bar 10"));
    assert_eq!(at(&value, "b").as_str(), Some("x y"));
    assert_eq!(at(&value, "c").as_list().unwrap().len(), 3);
    assert_eq!(int(at(&value, "d.x")), Some(1));
    assert_eq!(int(at(&value, "d.y")), Some(2));
}

#[test]
fn test_substitutions_stay_unresolved() {
    let value = parse("a = ${b.c}\ne = ${?x}\nf = foo ${b}");
    match at(&value, "a").kind() {
        ValueKind::Reference(r) => {
            assert_eq!(r.expr.path.keys(), ["b", "c"]);
            assert!(!r.expr.optional);
        }
        other => panic!("expected a reference, got {other:?}"),
    }
    match at(&value, "e").kind() {
        ValueKind::Reference(r) => assert!(r.expr.optional),
        other => panic!("expected a reference, got {other:?}"),
    }
    assert!(matches!(at(&value, "f").kind(), ValueKind::Concatenation(_)));
    assert!(!value.is_resolved());
}

#[test]
fn test_plus_equals_appends() {
    let value = parse("a += 1");
    assert!(matches!(at(&value, "a").kind(), ValueKind::Concatenation(_)));

    let value = resolved("a = [1]\na += 2");
    let items: Vec<_> = at(&value, "a").as_list().unwrap().iter().map(int).collect();
    assert_eq!(items, [Some(1), Some(2)]);

    let value = resolved("a += 1");
    assert_eq!(at(&value, "a").as_list().unwrap().len(), 1);
}

#[test]
fn test_arrays_with_newlines() {
    let value = parse("a = [\n  1\n  2,\n  3,\n]\nb = []");
    assert_eq!(at(&value, "a").as_list().unwrap().len(), 3);
    assert!(at(&value, "b").as_list().unwrap().is_empty());
}

#[test]
fn test_comments_attach_to_the_next_field() {
    let value = parse("# hello\na = 1");
    assert_eq!(at(&value, "a").origin().comments(), [" hello"]);

    let value = parse("// one\n// two\nx = 1");
    assert_eq!(at(&value, "x").origin().comments(), [" one", " two"]);

    let value = parse("# lost\n\na = 1");
    assert!(at(&value, "a").origin().comments().is_empty());

    let value = parse("a = 1 # trailing\nb = 2");
    assert!(at(&value, "a").origin().comments().is_empty());
    assert!(at(&value, "b").origin().comments().is_empty());
}

#[test]
fn test_values_record_their_line() {
    let value = parse("a = 1\n\nb = 2");
    assert_eq!(at(&value, "a").origin().line(), Some(1));
    assert_eq!(at(&value, "b").origin().line(), Some(3));
}

#[test]
fn test_error_messages() {
    let err = parse_err("a = [1, 2");
    assert!(err.to_string().contains("List should have ended with ] or had a comma"), "{err}");
    assert!(err.span().is_some());

    let err = parse_err("a = 1 }");
    assert!(err.to_string().contains("unbalanced close brace"), "{err}");

    let err = parse_err("a b");
    assert!(err.to_string().contains("may not be followed by token"), "{err}");

    let err = parse_err("a = $");
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");

    assert!(parse_string("a = ${}", &ParseOptions::new()).is_err());
}

#[test]
fn test_render_parsed_document() {
    let value = parse("a { b = 1, c = [x, y] }\nd = \"q\"");
    insta::assert_snapshot!(
        value.render(&RenderOptions::concise()),
        @r#"{"a":{"b":1,"c":["x","y"]},"d":"q"}"#
    );
}

fn write(dir: &std::path::Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_include_relativizes_substitutions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "other.conf", "x = 5\ny = ${x}");
    let main = write(
        dir.path(),
        "main.conf",
        "include \"other\"\nsub { include \"other.conf\" }\na = ${x}",
    );

    let value = parse_file(&main, &ParseOptions::new()).unwrap();
    let value = resolve(&value, &ResolveOptions::no_system()).unwrap();
    assert_eq!(int(at(&value, "a")), Some(5));
    assert_eq!(int(at(&value, "y")), Some(5));
    assert_eq!(int(at(&value, "sub.x")), Some(5));
    assert_eq!(int(at(&value, "sub.y")), Some(5));
}

#[test]
fn test_missing_includes() {
    let dir = tempfile::tempdir().unwrap();
    let optional = write(dir.path(), "optional.conf", "include \"missing\"\na = 1");
    let value = parse_file(&optional, &ParseOptions::new()).unwrap();
    assert_eq!(int(at(&value, "a")), Some(1));

    let required = write(dir.path(), "required.conf", "include required(\"missing\")\na = 1");
    let err = parse_file(&required, &ParseOptions::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Include { .. }), "{err}");
}

#[test]
fn test_include_file_and_required_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = write(dir.path(), "target.conf", "t = yes");
    let target = target.to_str().unwrap();
    let value = parse(&format!(
        "include file(\"{0}\")\nnested {{ include required(file(\"{0}\")) }}",
        target
    ));
    assert_eq!(at(&value, "t").as_str(), Some("yes"));
    assert_eq!(at(&value, "nested.t").as_str(), Some("yes"));
}

#[test]
fn test_include_cycle_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let looping = write(dir.path(), "loop.conf", "include \"loop.conf\"\na = 1");
    let err = parse_file(&looping, &ParseOptions::new()).unwrap_err();
    assert!(err.to_string().contains("nested more than 50 times"), "{err}");
}

struct Fixed;

impl Includer for Fixed {
    fn include(&self, _context: &IncludeContext, name: &str) -> Result<Value> {
        Ok(Value::string(Origin::new("fixed"), name).at_key("from"))
    }
}

#[test]
fn test_custom_includer_is_consulted() {
    let options = ParseOptions::new().with_includer(Arc::new(Fixed));
    let value = parse_string("include \"no-such-thing\"\nb = 2", &options).unwrap();
    assert_eq!(at(&value, "from").as_str(), Some("no-such-thing"));
    assert_eq!(int(at(&value, "b")), Some(2));
}
