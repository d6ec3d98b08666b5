//! Options controlling how a document is parsed.

use std::fmt;
use std::sync::Arc;

use hocon_tokenizer::Syntax;

use crate::include::{FallbackIncluder, Includer};

/// Options for parsing a document.
#[derive(Clone)]
pub struct ParseOptions {
    /// Force a syntax instead of guessing from the file name (default: guess,
    /// then HOCON).
    pub syntax: Option<Syntax>,

    /// Description used in origins instead of the file name.
    pub origin_description: Option<String>,

    /// A missing file parses as an empty object instead of failing
    /// (default: true).
    pub allow_missing: bool,

    /// Extra includer consulted after the built-in file includer.
    pub includer: Option<Arc<dyn Includer>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            syntax: None,
            origin_description: None,
            allow_missing: true,
            includer: None,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("syntax", &self.syntax)
            .field("origin_description", &self.origin_description)
            .field("allow_missing", &self.allow_missing)
            .field("includer", &self.includer.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(mut self, syntax: Option<Syntax>) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_origin_description(mut self, description: Option<String>) -> Self {
        self.origin_description = description;
        self
    }

    pub fn with_allow_missing(mut self, allow_missing: bool) -> Self {
        self.allow_missing = allow_missing;
        self
    }

    /// Replace the includer.
    pub fn with_includer(mut self, includer: Arc<dyn Includer>) -> Self {
        self.includer = Some(includer);
        self
    }

    /// Consult `includer` before the current one.
    pub fn prepend_includer(mut self, includer: Arc<dyn Includer>) -> Self {
        self.includer = Some(match self.includer.take() {
            Some(existing) => Arc::new(FallbackIncluder::new(includer, existing)),
            None => includer,
        });
        self
    }

    /// Consult `includer` after the current one.
    pub fn append_includer(mut self, includer: Arc<dyn Includer>) -> Self {
        self.includer = Some(match self.includer.take() {
            Some(existing) => Arc::new(FallbackIncluder::new(existing, includer)),
            None => includer,
        });
        self
    }

    /// The options an included document inherits: syntax is guessed again
    /// and missing files are skipped.
    pub(crate) fn for_include(&self) -> Self {
        Self {
            syntax: None,
            origin_description: None,
            allow_missing: true,
            includer: self.includer.clone(),
        }
    }
}
