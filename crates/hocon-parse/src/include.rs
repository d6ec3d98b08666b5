//! Include statements and the documents they pull in.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use hocon_tokenizer::{Syntax, Tokenizer};
use hocon_tree::{ConfigError, Origin, Result, Value};
use tracing::debug;

use crate::ParseOptions;
use crate::parser::Parser;
use crate::properties;

/// How deep includes may nest before we assume a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 50;

/// Loads the documents named by `include` statements.
///
/// Both methods return the parsed root object of the included document.
pub trait Includer: Send + Sync {
    /// `include "name"`: resolved relative to the including document.
    fn include(&self, context: &IncludeContext, name: &str) -> Result<Value>;

    /// `include file("name")`.
    fn include_file(&self, context: &IncludeContext, name: &str) -> Result<Value> {
        self.include(context, name)
    }
}

/// Asks `primary`, then merges whatever `fallback` finds underneath.
pub struct FallbackIncluder {
    primary: Arc<dyn Includer>,
    fallback: Arc<dyn Includer>,
}

impl FallbackIncluder {
    pub fn new(primary: Arc<dyn Includer>, fallback: Arc<dyn Includer>) -> Self {
        Self { primary, fallback }
    }
}

impl Includer for FallbackIncluder {
    fn include(&self, context: &IncludeContext, name: &str) -> Result<Value> {
        let found = self.primary.include(context, name)?;
        Ok(found.with_fallback(&self.fallback.include(context, name)?))
    }

    fn include_file(&self, context: &IncludeContext, name: &str) -> Result<Value> {
        let found = self.primary.include_file(context, name)?;
        Ok(found.with_fallback(&self.fallback.include_file(context, name)?))
    }
}

/// The built-in includer: names are files, tried with each extension when
/// they have none.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileIncluder;

impl Includer for FileIncluder {
    fn include(&self, context: &IncludeContext, name: &str) -> Result<Value> {
        from_basename(name, context.parse_options(), |n| context.relative_to(n))
    }

    fn include_file(&self, context: &IncludeContext, name: &str) -> Result<Value> {
        // file() names are taken as given, not relative to the includer
        let parent = &context.current;
        from_basename(name, context.parse_options(), |n| {
            Some(parent.child(Source::File(PathBuf::from(n))))
        })
    }
}

/// What an includer needs to know about the document doing the including.
#[derive(Debug, Clone)]
pub struct IncludeContext {
    current: Parseable,
    options: ParseOptions,
}

impl IncludeContext {
    pub(crate) fn new(current: Parseable, options: ParseOptions) -> Self {
        Self { current, options }
    }

    /// A document named relative to the including one.
    pub fn relative_to(&self, filename: &str) -> Option<Parseable> {
        self.current.relative_to(filename)
    }

    /// Options to parse included documents with.
    pub fn parse_options(&self) -> &ParseOptions {
        &self.options
    }

    /// The same context with different parse options.
    pub fn with_parse_options(&self, options: ParseOptions) -> Self {
        Self {
            current: self.current.clone(),
            options,
        }
    }

    /// Documents currently being parsed, outermost first, ending with the
    /// including document.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = self.current.chain.clone();
        chain.push(self.current.description());
        chain
    }

    /// How many documents are open, including the current one.
    pub fn depth(&self) -> usize {
        self.current.chain.len() + 1
    }
}

#[derive(Debug, Clone)]
enum Source {
    Text { text: String, description: String },
    File(PathBuf),
}

/// A document that can be parsed: a string or a file.
#[derive(Debug, Clone)]
pub struct Parseable {
    source: Source,
    /// Descriptions of the documents that included this one.
    chain: Vec<String>,
}

impl Parseable {
    pub fn from_string(text: impl Into<String>) -> Self {
        Self {
            source: Source::Text {
                text: text.into(),
                description: "String".to_string(),
            },
            chain: Vec::new(),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            chain: Vec::new(),
        }
    }

    fn child(&self, source: Source) -> Self {
        let mut chain = self.chain.clone();
        chain.push(self.description());
        Self { source, chain }
    }

    /// A document named relative to this one. Relative names inside a file
    /// are siblings of that file; anything else is relative to the working
    /// directory.
    pub fn relative_to(&self, filename: &str) -> Option<Parseable> {
        let name = FsPath::new(filename);
        let path = match &self.source {
            Source::File(own) if name.is_relative() => match own.parent() {
                Some(dir) => dir.join(name),
                None => name.to_path_buf(),
            },
            _ => name.to_path_buf(),
        };
        Some(self.child(Source::File(path)))
    }

    pub fn description(&self) -> String {
        match &self.source {
            Source::Text { description, .. } => description.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn origin(&self, options: &ParseOptions) -> Origin {
        match (&options.origin_description, &self.source) {
            (Some(description), _) => Origin::new(description.clone()),
            (None, Source::File(path)) => Origin::file(path.display().to_string()),
            (None, Source::Text { description, .. }) => Origin::new(description.clone()),
        }
    }

    fn guess_syntax(&self) -> Option<Syntax> {
        match &self.source {
            Source::File(path) => path.to_str().and_then(Syntax::from_filename),
            Source::Text { .. } => None,
        }
    }

    /// Parse the document; the result is always an object.
    pub fn parse(&self, options: &ParseOptions) -> Result<Value> {
        let origin = self.origin(options);
        if self.chain.len() >= MAX_INCLUDE_DEPTH {
            return Err(ConfigError::parse(
                origin,
                format!(
                    "include statements nested more than {} times, you probably have a cycle in your includes. Trace: {}",
                    MAX_INCLUDE_DEPTH,
                    self.chain.join(", ")
                ),
            ));
        }

        let text = match &self.source {
            Source::Text { text, .. } => text.clone(),
            Source::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    if options.allow_missing {
                        debug!(target: "hocon::load", path = %path.display(), "skipping missing document");
                        return Ok(Value::empty_object(origin));
                    }
                    return Err(ConfigError::Io {
                        origin,
                        message: err.to_string(),
                    });
                }
            },
        };

        let syntax = options
            .syntax
            .or_else(|| self.guess_syntax())
            .unwrap_or(Syntax::Conf);
        debug!(target: "hocon::load", document = %self.description(), ?syntax, depth = self.chain.len(), "parsing");

        let root = match syntax {
            Syntax::Properties => properties::parse(&text, &origin)?,
            Syntax::Json | Syntax::Conf => {
                let context = IncludeContext::new(self.clone(), options.for_include());
                let tokens = Tokenizer::new(&text, syntax);
                Parser::new(tokens, syntax, origin.clone(), &context).parse()?
            }
        };
        if root.as_object().is_none() {
            let kind = root
                .value_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unresolved value".to_string());
            return Err(ConfigError::wrong_type(
                origin,
                format!("document root has type {} rather than object", kind),
            ));
        }
        Ok(root)
    }
}

/// Load `name`, or when it has no known extension, each of `name.conf`,
/// `name.json` and `name.properties` that exists, merged in that order.
pub(crate) fn from_basename(
    name: &str,
    options: &ParseOptions,
    source: impl Fn(&str) -> Option<Parseable>,
) -> Result<Value> {
    if Syntax::from_filename(name).is_some() {
        return match source(name) {
            Some(parseable) => parseable.parse(options),
            None => Ok(Value::empty_object(Origin::new(name))),
        };
    }

    let candidates = [
        (Syntax::Conf, "conf"),
        (Syntax::Json, "json"),
        (Syntax::Properties, "properties"),
    ];
    let mut merged: Option<Value> = None;
    let mut failures = Vec::new();
    for (syntax, extension) in candidates {
        if options.syntax.is_some_and(|wanted| wanted != syntax) {
            continue;
        }
        let Some(parseable) = source(&format!("{}.{}", name, extension)) else {
            continue;
        };
        let forced = options
            .clone()
            .with_allow_missing(false)
            .with_syntax(Some(syntax));
        match parseable.parse(&forced) {
            Ok(parsed) => {
                merged = Some(match merged {
                    Some(found) => found.with_fallback(&parsed),
                    None => parsed,
                });
            }
            Err(err @ ConfigError::Io { .. }) => failures.push(err),
            Err(err) => return Err(err),
        }
    }

    if let Some(found) = merged {
        return Ok(found);
    }
    if !options.allow_missing {
        let mut failures = failures.into_iter();
        return Err(match (failures.next(), failures.next()) {
            (None, _) => ConfigError::bug(format!("no include candidates tried for {}", name)),
            (Some(only), None) => only,
            (Some(first), Some(second)) => {
                let messages: Vec<String> = [first, second]
                    .into_iter()
                    .chain(failures)
                    .map(|e| e.to_string())
                    .collect();
                ConfigError::Io {
                    origin: Origin::new(name),
                    message: messages.join(", "),
                }
            }
        });
    }
    Ok(Value::empty_object(Origin::new(name)))
}
