//! Checking a config against a reference config.

use hocon_parse::parse_path;
use hocon_tree::{
    ConfigError, ConfigObject, Origin, Path, Result, ValidationProblem, Value, ValueKind, ValueType,
};
use tracing::debug;

use crate::Config;
use crate::config::{coerce, describe};

impl Config {
    /// Check that every setting in `reference` is present here with a
    /// compatible type, restricted to `restrict_to_paths` when it is not
    /// empty.
    ///
    /// All problems are collected and reported together as
    /// [`ConfigError::Validation`]. Both configs must be resolved. Any
    /// setting may be null, strings stand in for numbers, booleans and
    /// other scalars, and list elements are checked against the first
    /// element of the reference list.
    pub fn check_valid(&self, reference: &Config, restrict_to_paths: &[&str]) -> Result<()> {
        if !reference.is_resolved() {
            return Err(ConfigError::bug(
                "do not call check_valid() with an unresolved reference config, call Config::resolve() first",
            ));
        }
        if !self.is_resolved() {
            return Err(ConfigError::NotResolved {
                message: "need to Config::resolve() each config before validating it".to_string(),
            });
        }

        let mut problems = Vec::new();
        if restrict_to_paths.is_empty() {
            if let (Some(reference), Some(value)) =
                (reference.root().as_object(), self.root().as_object())
            {
                check_object(None, reference, value, self.origin(), &mut problems);
            }
        } else {
            for path in restrict_to_paths {
                let path = parse_path(path)?;
                let Some(expected) = peek(reference.root(), &path) else {
                    continue;
                };
                match peek(self.root(), &path) {
                    Some(actual) => check_value(&path, expected, actual, &mut problems),
                    None => add_missing(&mut problems, expected, &path, self.origin()),
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            debug!(target: "hocon::validate", problems = problems.len(), "validation failed");
            Err(ConfigError::Validation { problems })
        }
    }
}

fn peek<'v>(root: &'v Value, path: &Path) -> Option<&'v Value> {
    root.as_object()?.peek_path(path)
}

fn check_object(
    path: Option<&Path>,
    reference: &ConfigObject,
    value: &ConfigObject,
    origin: &Origin,
    problems: &mut Vec<ValidationProblem>,
) {
    for (key, expected) in reference.iter() {
        let child_path = match path {
            Some(parent) => parent.child(key),
            None => Path::key(key),
        };
        match value.get(key) {
            Some(actual) => check_value(&child_path, expected, actual, problems),
            None => add_missing(problems, expected, &child_path, origin),
        }
    }
}

fn check_value(
    path: &Path,
    expected: &Value,
    actual: &Value,
    problems: &mut Vec<ValidationProblem>,
) {
    if !compatible(expected, actual) {
        problems.push(ValidationProblem {
            path: path.render(),
            origin: actual.origin().clone(),
            problem: format!(
                "Wrong value type at '{}', expecting: {} but got: {}",
                path.render(),
                description(expected),
                description(actual)
            ),
        });
        return;
    }
    match (expected.kind(), actual.kind()) {
        (ValueKind::Object(expected), ValueKind::Object(actual_object)) => {
            check_object(Some(path), expected, actual_object, actual.origin(), problems);
        }
        (ValueKind::List(expected), ValueKind::List(actual)) => {
            let (Some(first), false) = (expected.items().first(), actual.is_empty()) else {
                return;
            };
            // one problem per list is enough
            if let Some(wrong) = actual.items().iter().find(|item| !compatible(first, item)) {
                problems.push(ValidationProblem {
                    path: path.render(),
                    origin: wrong.origin().clone(),
                    problem: format!(
                        "List at '{}' contains wrong value type, expecting list of {} but got element of type {}",
                        path.render(),
                        description(first),
                        description(wrong)
                    ),
                });
            }
        }
        _ => {}
    }
}

fn add_missing(
    problems: &mut Vec<ValidationProblem>,
    expected: &Value,
    path: &Path,
    origin: &Origin,
) {
    problems.push(ValidationProblem {
        path: path.render(),
        origin: origin.clone(),
        problem: format!(
            "No setting at '{}', expecting: {}",
            path.render(),
            description(expected)
        ),
    });
}

/// Null, or the string `null`.
fn could_be_null(value: &Value) -> bool {
    coerce(value.clone(), ValueType::Null).is_null()
}

fn compatible(expected: &Value, actual: &Value) -> bool {
    if could_be_null(expected) || could_be_null(actual) {
        return true;
    }
    let is_collection = matches!(actual.value_type(), Some(ValueType::Object | ValueType::List));
    match expected.value_type() {
        Some(ValueType::Object) => actual.as_object().is_some(),
        Some(ValueType::List) => actual.as_list().is_some(),
        // any scalar can be read as a string
        Some(ValueType::String) => !is_collection,
        // and a string may hold any scalar
        _ if actual.as_str().is_some() => true,
        other => other == actual.value_type(),
    }
}

fn description(value: &Value) -> String {
    match value.as_object() {
        Some(object) if object.is_empty() => "object".to_string(),
        Some(object) => format!(
            "object with keys {}",
            object.keys().collect::<Vec<_>>().join(", ")
        ),
        None => describe(value.value_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use hocon_tree::ResolveOptions;

    fn config(source: &str) -> Config {
        Config::parse_string(source)
            .unwrap()
            .resolve_with_options(&ResolveOptions::no_system())
            .unwrap()
    }

    fn problems(err: ConfigError) -> Vec<String> {
        match err {
            ConfigError::Validation { problems } => {
                problems.into_iter().map(|p| p.problem).collect()
            }
            other => panic!("expected a validation error, got {other}"),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let reference = config("a = 1\nb { c = x, d = [1] }\nn = null");
        let value =
            config("a = \"2\"\nb { c = 3, d = [4, 5], extra = true }\nn = { any = thing }");
        value.check_valid(&reference, &[]).unwrap();
    }

    #[test]
    fn test_all_problems_are_reported() {
        let reference = config("a = 1\nb { c = x }\nl = [1]\no { p = 1 }");
        let value = config("b { c = [1] }\nl = [1, true, false]\no = 5");
        let found = problems(value.check_valid(&reference, &[]).unwrap_err());
        insta::assert_debug_snapshot!(found, @r#"
        [
            "No setting at 'a', expecting: number",
            "Wrong value type at 'b.c', expecting: string but got: list",
            "List at 'l' contains wrong value type, expecting list of number but got element of type boolean",
            "Wrong value type at 'o', expecting: object with keys p but got: number",
        ]
        "#);
    }

    #[test]
    fn test_restricted_paths() {
        let reference = config("a = 1\nb { c = 1 }");
        let value = config("a = wrong\nb { }");
        value.check_valid(&reference, &["a", "zzz"]).unwrap();
        let found = problems(value.check_valid(&reference, &["b.c"]).unwrap_err());
        assert_eq!(found, ["No setting at 'b.c', expecting: number"]);
    }

    #[test]
    fn test_unresolved_configs_are_rejected() {
        let unresolved = Config::parse_string("a = ${b}\nb = 1").unwrap();
        let resolved = config("a = 1");
        assert!(matches!(
            resolved.check_valid(&unresolved, &[]).unwrap_err(),
            ConfigError::BugOrBroken(_)
        ));
        assert!(matches!(
            unresolved.check_valid(&resolved, &[]).unwrap_err(),
            ConfigError::NotResolved { .. }
        ));
    }
}
