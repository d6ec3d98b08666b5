//! Parser for HOCON documents, plus their JSON and `.properties` cousins.
//!
//! Parsing yields an unresolved [`Value`] tree: substitutions are kept as
//! references and duplicate keys as merges, to be settled by
//! [`hocon_tree::resolve`].

use std::path::Path as FsPath;

pub use hocon_tokenizer::{Syntax, Token, TokenKind, Tokenizer};
pub use hocon_tree::{ConfigError, Result, Value};

mod include;
pub use include::{
    FallbackIncluder, FileIncluder, IncludeContext, Includer, MAX_INCLUDE_DEPTH, Parseable,
};

mod options;
pub use options::ParseOptions;

mod parser;

mod path_parser;
pub use path_parser::parse_path;

pub mod properties;

/// Parse a document held in a string. The root is always an object.
pub fn parse_string(source: &str, options: &ParseOptions) -> Result<Value> {
    Parseable::from_string(source).parse(options)
}

/// Parse one file; the syntax is guessed from its extension unless set.
pub fn parse_file(path: impl AsRef<FsPath>, options: &ParseOptions) -> Result<Value> {
    Parseable::from_file(path.as_ref()).parse(options)
}

/// Parse `basename` if it has an extension, otherwise every one of
/// `basename.conf`, `basename.json` and `basename.properties` that exists,
/// merged in that order of priority.
pub fn parse_file_any_syntax(basename: impl AsRef<FsPath>, options: &ParseOptions) -> Result<Value> {
    let name = basename.as_ref().to_string_lossy().into_owned();
    include::from_basename(&name, options, |n| Some(Parseable::from_file(n)))
}
