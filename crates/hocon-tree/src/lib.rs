//! Value tree for HOCON configuration.
//!
//! This crate holds the immutable value model shared by the parser and the
//! high-level API: values and their origins, paths, merging with fallbacks,
//! substitution resolution and rendering.

mod diagnostic;
mod edit;
mod error;
mod json;
mod merge;
mod origin;
mod path;
mod render;
mod resolve;
mod value;

pub use error::{ConfigError, Result, ValidationProblem};
pub use hocon_tokenizer::{Span, Syntax};
pub use merge::concatenate;
pub use origin::{Origin, OriginKind};
pub use path::{Path, SubstitutionExpression, render_json_string};
pub use render::RenderOptions;
pub use resolve::{ResolveOptions, env_variables, resolve, resolve_with};
pub use value::{
    ConfigList, ConfigObject, Number, Reference, ResolveStatus, Value, ValueKind, ValueType,
};
