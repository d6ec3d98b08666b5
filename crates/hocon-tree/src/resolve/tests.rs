use super::*;
use facet_testhelpers::test;

fn o() -> Origin {
    Origin::new("test")
}

fn int(i: i64) -> Value {
    Value::int(o(), i, None)
}

fn obj(entries: Vec<(&str, Value)>) -> Value {
    Value::object(
        o(),
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    )
}

fn path(s: &str) -> Path {
    Path::from_keys(s.split('.')).unwrap()
}

fn subst(p: &str) -> Value {
    Value::reference(o(), SubstitutionExpression::new(path(p), false))
}

fn optional(p: &str) -> Value {
    Value::reference(o(), SubstitutionExpression::new(path(p), true))
}

fn get(value: &Value, p: &str) -> Option<Value> {
    value.as_object()?.peek_path(&path(p)).cloned()
}

fn options() -> ResolveOptions {
    ResolveOptions::no_system()
}

#[test]
fn test_simple_reference() {
    let root = obj(vec![
        ("a", obj(vec![("x", int(1))])),
        ("b", subst("a.x")),
        ("c", subst("a")),
    ]);
    let resolved = resolve(&root, &options()).unwrap();
    assert!(resolved.is_resolved());
    assert_eq!(get(&resolved, "b"), Some(int(1)));
    assert_eq!(get(&resolved, "c.x"), Some(int(1)));
}

#[test]
fn test_chained_references() {
    let root = obj(vec![("a", subst("b")), ("b", subst("c")), ("c", int(3))]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "a"), Some(int(3)));
    assert_eq!(get(&resolved, "b"), Some(int(3)));
}

#[test]
fn test_reference_through_reference() {
    // y = ${x}, lookup of y.z goes through the partially resolved x
    let root = obj(vec![
        ("x", obj(vec![("z", int(5))])),
        ("y", subst("x")),
        ("w", subst("y.z")),
    ]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "w"), Some(int(5)));
}

#[test]
fn test_cycle_is_reported() {
    let root = obj(vec![("a", subst("b")), ("b", subst("a"))]);
    let err = resolve(&root, &options()).unwrap_err();
    assert!(matches!(err, ConfigError::UnresolvedSubstitution { .. }));
    assert!(err.to_string().contains("cycle"), "{}", err);
}

#[test]
fn test_self_cycle_is_reported() {
    let root = obj(vec![("a", subst("a"))]);
    let err = resolve(&root, &options()).unwrap_err();
    assert!(err.to_string().contains("cycle"), "{}", err);
}

#[test]
fn test_missing_reference_fails() {
    let root = obj(vec![("a", subst("nope"))]);
    let err = resolve(&root, &options()).unwrap_err();
    match err {
        ConfigError::UnresolvedSubstitution { detail, .. } => assert_eq!(detail, "${nope}"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_optional_vanishes() {
    let root = obj(vec![
        ("a", optional("NOT_HERE")),
        ("b", int(1)),
        (
            "c",
            Value::list(o(), vec![int(1), int(2), optional("NOT_HERE")]),
        ),
    ]);
    let resolved = resolve(&root, &options()).unwrap();
    let object = resolved.as_object().unwrap();
    assert!(!object.contains_key("a"));
    assert_eq!(get(&resolved, "b"), Some(int(1)));
    assert_eq!(get(&resolved, "c"), Some(Value::list(o(), vec![int(1), int(2)])));
}

#[test]
fn test_allow_unresolved_keeps_reference() {
    let root = obj(vec![("a", subst("nope")), ("b", int(1))]);
    let resolved = resolve(&root, &options().allow_unresolved(true)).unwrap();
    assert!(!resolved.is_resolved());
    assert_eq!(get(&resolved, "a"), Some(subst("nope")));
}

#[test]
fn test_self_referential_append() {
    // a = [1], a = ${a} [2]
    let appended = Value::concatenation(o(), vec![subst("a"), Value::list(o(), vec![int(2)])]);
    let a = appended.with_fallback(&Value::list(o(), vec![int(1)]));
    assert!(matches!(a.kind(), ValueKind::DelayedMerge(_)));
    let root = obj(vec![("a", a)]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "a"), Some(Value::list(o(), vec![int(1), int(2)])));
}

#[test]
fn test_self_referential_object_merge() {
    // foo = { a: 1 }, foo = ${foo} { b: 2 }
    let extended = Value::concatenation(o(), vec![subst("foo"), obj(vec![("b", int(2))])]);
    let foo = extended.with_fallback(&obj(vec![("a", int(1))]));
    let root = obj(vec![("foo", foo)]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "foo.a"), Some(int(1)));
    assert_eq!(get(&resolved, "foo.b"), Some(int(2)));
}

#[test]
fn test_optional_self_reference_without_prior_value() {
    // a += 1 with no earlier a
    let a = Value::concatenation(o(), vec![optional("a"), Value::list(o(), vec![int(1)])]);
    let root = obj(vec![("a", a)]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "a"), Some(Value::list(o(), vec![int(1)])));
}

#[test]
fn test_concatenation_with_null_reference() {
    let greeting = Value::concatenation(
        o(),
        vec![
            Value::unquoted(o(), "hello"),
            Value::unquoted(o(), " "),
            subst("name"),
        ],
    );
    let root = obj(vec![("name", Value::null(o())), ("greeting", greeting)]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "greeting").unwrap().as_str(), Some("hello "));
}

#[test]
fn test_later_duplicate_is_seen_by_reference() {
    // a=1, b=${a}, a=2: the reference sees the final value of a
    let root = obj(vec![("a", int(2)), ("b", subst("a"))]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "b"), Some(int(2)));
}

#[test]
fn test_relativized_reference_falls_back_to_root() {
    // an included document refers to ${top}, which only exists at the root
    let included = obj(vec![("x", subst("top"))]).relativized(&Path::key("inc"));
    let root = obj(vec![("top", int(9)), ("inc", included)]);
    let resolved = resolve(&root, &options()).unwrap();
    assert_eq!(get(&resolved, "inc.x"), Some(int(9)));
}

#[test]
fn test_resolve_with_other_source() {
    let value = obj(vec![("a", subst("b"))]);
    let source = obj(vec![("b", int(4))]);
    let resolved = resolve_with(&value, &source, &options()).unwrap();
    assert_eq!(get(&resolved, "a"), Some(int(4)));
}

#[test]
fn test_resolved_tree_is_returned_as_is() {
    let root = obj(vec![("a", int(1))]);
    let resolved = resolve(&root, &options()).unwrap();
    assert!(resolved.ptr_eq(&root));
}
