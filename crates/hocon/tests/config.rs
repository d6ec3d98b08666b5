//! End-to-end behavior of parsing, merging and resolving configs.

use facet_testhelpers::test;
use hocon::{Config, ConfigError, ParseOptions, ResolveOptions, Syntax, parse_path};

/// Parse and resolve without consulting the environment.
fn resolved(source: &str) -> Config {
    Config::parse_string(source)
        .expect("document should parse")
        .resolve_with_options(&ResolveOptions::no_system())
        .expect("document should resolve")
}

fn resolve_err(source: &str) -> ConfigError {
    Config::parse_string(source)
        .expect("document should parse")
        .resolve_with_options(&ResolveOptions::no_system())
        .unwrap_err()
}

#[test]
fn test_references_see_the_final_value() {
    let config = resolved("a=1,b=${a},a=2");
    assert_eq!(config.get_i32("b").unwrap(), 2);
    assert_eq!(config.get_i32("a").unwrap(), 2);
}

#[test]
fn test_newlines_separate_list_elements() {
    let commas = resolved("{ a : [ 1, 2, 3 ] }");
    let newlines = resolved("{ a : [ 1\n2\n3 ] }");
    assert_eq!(commas, newlines);
    assert_eq!(commas.get_list("a").unwrap().len(), 3);
}

#[test]
fn test_numbers_split_into_path_elements() {
    assert_eq!(parse_path("10.0foo").unwrap().keys(), ["10", "0foo"]);
    assert_eq!(parse_path("foo10.0").unwrap().keys(), ["foo10", "0"]);
    assert_eq!(parse_path("10.0").unwrap().keys(), ["10", "0"]);

    let config = resolved("10.0foo = 1\nfoo10.0 = 2\n10.0 = 3");
    assert_eq!(config.get_i32("\"10\".\"0foo\"").unwrap(), 1);
    assert_eq!(config.get_i32("foo10.0").unwrap(), 2);
    assert_eq!(config.get_i32("10.0").unwrap(), 3);
}

#[test]
fn test_objects_and_primitives_shadow_by_priority() {
    let object = Config::parse_string("{ a: { b : 42 } }").unwrap();
    let primitive = Config::parse_string("{ a : 1 }").unwrap();

    let merged = object.with_fallback(&primitive).resolve().unwrap();
    assert_eq!(merged.get_i32("a.b").unwrap(), 42);

    let merged = primitive.with_fallback(&object).resolve().unwrap();
    assert_eq!(merged.get_i32("a").unwrap(), 1);
}

#[test]
fn test_objects_merge_under_fallbacks() {
    let top = Config::parse_string("a { x = 1 }\nshared = top").unwrap();
    let middle = Config::parse_string("a { y = 2 }\nshared = middle").unwrap();
    let bottom = Config::parse_string("a { x = 9, z = 3 }\nonly = bottom").unwrap();

    let config = top
        .with_fallback(&middle)
        .with_fallback(&bottom)
        .resolve()
        .unwrap();
    assert_eq!(config.get_i32("a.x").unwrap(), 1);
    assert_eq!(config.get_i32("a.y").unwrap(), 2);
    assert_eq!(config.get_i32("a.z").unwrap(), 3);
    assert_eq!(config.get_string("shared").unwrap(), "top");
    assert_eq!(config.get_string("only").unwrap(), "bottom");
}

#[test]
fn test_fallbacks_are_seen_by_substitutions() {
    let app = Config::parse_string("url = ${host}\":\"${port}").unwrap();
    let defaults = Config::parse_string("host = localhost\nport = 80").unwrap();
    let config = app
        .with_fallback(&defaults)
        .resolve_with_options(&ResolveOptions::no_system())
        .unwrap();
    assert_eq!(config.get_string("url").unwrap(), "localhost:80");
}

#[test]
fn test_bad_substitution_syntax_is_a_parse_error() {
    for source in ["a = [${]", "[${]", "a = $", "$"] {
        let err = Config::parse_string(source).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{source:?}: {err}");
    }
}

#[test]
fn test_self_references() {
    assert_eq!(resolved("a=1\na=${a}").get_i32("a").unwrap(), 1);

    let err = resolve_err("a=${a}");
    assert!(matches!(err, ConfigError::UnresolvedSubstitution { .. }), "{err}");
    assert!(err.to_string().contains("cycle"), "{err}");

    let config = resolved("a=${?a}\nb=1");
    assert!(!config.has_path("a").unwrap());
    assert!(config.root().as_object().unwrap().get("a").is_none());
}

#[test]
fn test_cycles_are_reported() {
    let cycles = [
        "a:${b}, b:${a}",
        "a:${b}, b:${c}, c:${a}",
        "a:${b}, b:${c}, c:${d}, d:${a}",
    ];
    for source in cycles {
        let err = resolve_err(source);
        assert!(matches!(err, ConfigError::UnresolvedSubstitution { .. }), "{source}: {err}");
        let message = err.to_string();
        assert!(message.contains("cycle"), "{message}");
        assert!(message.contains("${a}"), "{message}");
    }
}

#[test]
fn test_optional_substitutions_vanish() {
    let config = resolved("{a:[1,2,3,${?NOT_HERE}]}");
    let items: Vec<i64> = config
        .get_list("a")
        .unwrap()
        .iter()
        .filter_map(|v| v.as_number().map(|n| n.as_i64()))
        .collect();
    assert_eq!(items, [1, 2, 3]);

    let config = resolved("{a: ${?NOT_HERE}, b: 1}");
    assert!(!config.has_path("a").unwrap());
    assert_eq!(config.entries().len(), 1);
}

#[test]
fn test_missing_substitution_fails() {
    let err = resolve_err("a = ${nope}");
    assert!(err.to_string().contains("${nope}"), "{err}");
}

#[test]
fn test_duplicate_keys() {
    assert_eq!(resolved(r#"{"a":10,"a":11}"#).get_i32("a").unwrap(), 11);

    let merged = resolved(r#"{"a":{"x":1},"a":{"y":2}}"#);
    assert_eq!(merged.get_i32("a.x").unwrap(), 1);
    assert_eq!(merged.get_i32("a.y").unwrap(), 2);

    let reset = resolved("{a:{b:1}, a:null, a:{c:2}}");
    assert!(!reset.has_path("a.b").unwrap());
    assert_eq!(reset.get_i32("a.c").unwrap(), 2);
}

#[test]
fn test_self_referential_extension() {
    let config = resolved("path = [a]\npath = ${path} [b]\nlist = [1]\nlist += 2");
    assert_eq!(config.get_string_list("path").unwrap(), ["a", "b"]);
    assert_eq!(config.get_string_list("list").unwrap(), ["1", "2"]);

    let config = resolved("foo { a = 1 }\nfoo = ${foo} { b = 2 }");
    assert_eq!(config.get_i32("foo.a").unwrap(), 1);
    assert_eq!(config.get_i32("foo.b").unwrap(), 2);
}

#[test]
fn test_getter_coercions() {
    let config = resolved(
        "int = \"57\"\nyes = yes\non = on\nno = no\noff = off\nnum = 4.5\nobj { a = 1 }\nlist = [1]",
    );
    assert_eq!(config.get_i32("int").unwrap(), 57);
    assert!(config.get_bool("yes").unwrap());
    assert!(config.get_bool("on").unwrap());
    assert!(!config.get_bool("no").unwrap());
    assert!(!config.get_bool("off").unwrap());
    assert_eq!(config.get_string("num").unwrap(), "4.5");

    for path in ["obj", "list"] {
        let err = config.get_string(path).unwrap_err();
        assert!(matches!(err, ConfigError::WrongType { .. }), "{path}: {err}");
    }
    let err = config.get_list("int").unwrap_err();
    assert!(matches!(err, ConfigError::WrongType { .. }), "{err}");
}

#[test]
fn test_environment_fallback() {
    let Ok(path) = std::env::var("PATH") else {
        return;
    };
    let config = Config::parse_string("p = ${PATH}").unwrap().resolve().unwrap();
    assert_eq!(config.get_string("p").unwrap(), path);

    let err = Config::parse_string("p = ${PATH}")
        .unwrap()
        .resolve_with_options(&ResolveOptions::no_system())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnresolvedSubstitution { .. }), "{err}");
}

#[test]
fn test_validation_against_reference() {
    let reference = resolved("server { port = 80, host = x }\nretries = 3");
    let good = resolved("server { port = \"8080\", host = example.com }\nretries = 5");
    good.check_valid(&reference, &[]).unwrap();

    let bad = resolved("server { port = [1] }");
    match bad.check_valid(&reference, &[]).unwrap_err() {
        ConfigError::Validation { problems } => {
            let paths: Vec<&str> = problems.iter().map(|p| p.path.as_str()).collect();
            assert_eq!(paths, ["server.port", "server.host", "retries"]);
        }
        other => panic!("expected a validation error, got {other}"),
    }
}

fn write(dir: &std::path::Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

#[test]
fn test_files_of_every_syntax_merge() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.conf", "a = 1\nshared = conf\ninclude \"extra\"");
    write(dir.path(), "app.json", r#"{"b": 2, "shared": "json"}"#);
    write(dir.path(), "app.properties", "c=3\nshared=props\nnested.key=value");
    write(dir.path(), "extra.conf", "d = ${a}");

    let config = Config::parse_file_any_syntax(dir.path().join("app"), &ParseOptions::new())
        .unwrap()
        .resolve_with_options(&ResolveOptions::no_system())
        .unwrap();
    assert_eq!(config.get_i32("a").unwrap(), 1);
    assert_eq!(config.get_i32("b").unwrap(), 2);
    assert_eq!(config.get_i32("c").unwrap(), 3);
    assert_eq!(config.get_i32("d").unwrap(), 1);
    assert_eq!(config.get_string("shared").unwrap(), "conf");
    assert_eq!(config.get_string("nested.key").unwrap(), "value");

    let json = Config::parse_file(dir.path().join("app.json")).unwrap();
    assert_eq!(json.get_string("shared").unwrap(), "json");

    let err = Config::parse_file_with(
        dir.path().join("nothing.conf"),
        &ParseOptions::new().with_allow_missing(false),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}

#[test]
fn test_explicit_syntax_overrides_extension() {
    let options = ParseOptions::new().with_syntax(Some(Syntax::Json));
    let err = Config::parse_string_with("a = 1", &options).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
}

#[test]
fn test_parse_error_report() {
    let source = "a {\n  b = [1, 2 }";
    let err = Config::parse_string(source).unwrap_err();
    assert!(err.span().is_some());
    let report = err.render("app.conf", source);
    let report = String::from_utf8(strip_ansi_escapes::strip(report)).unwrap();
    assert!(report.contains("app.conf"), "{report}");
    assert!(report.contains("List should have ended with ] or had a comma"), "{report}");

    // a newline separates elements, so the brace comes where one was expected
    let err = Config::parse_string("a {\n  b = [1, 2\n}").unwrap_err();
    assert!(
        err.to_string().contains("List should have had new element after a comma"),
        "{err}"
    );
}
