//! Where a value came from.

use std::fmt;
use std::sync::Arc;

const MERGE_OF_PREFIX: &str = "merge of ";

/// The kind of source an origin describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginKind {
    Generic,
    File,
    Env,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct OriginData {
    description: String,
    kind: OriginKind,
    filename: Option<String>,
    line: Option<u32>,
    end_line: Option<u32>,
    comments: Vec<String>,
}

/// Describes the source of a value: a description, optionally a file name
/// and line range, and the comments written right before it.
///
/// Origins are cheap to clone and never take part in value equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Origin(Arc<OriginData>);

impl Origin {
    /// A generic origin, e.g. "String" for documents parsed from a string.
    pub fn new(description: impl Into<String>) -> Self {
        Self::build(description.into(), OriginKind::Generic, None)
    }

    /// The origin of a document read from a file.
    pub fn file(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self::build(filename.clone(), OriginKind::File, Some(filename))
    }

    /// The origin of values taken from the process environment.
    pub fn env() -> Self {
        Self::build("env variables".to_string(), OriginKind::Env, None)
    }

    fn build(description: String, kind: OriginKind, filename: Option<String>) -> Self {
        Origin(Arc::new(OriginData {
            description,
            kind,
            filename,
            line: None,
            end_line: None,
            comments: Vec::new(),
        }))
    }

    fn with(&self, edit: impl FnOnce(&mut OriginData)) -> Self {
        let mut data = OriginData {
            description: self.0.description.clone(),
            kind: self.0.kind,
            filename: self.0.filename.clone(),
            line: self.0.line,
            end_line: self.0.end_line,
            comments: self.0.comments.clone(),
        };
        edit(&mut data);
        Origin(Arc::new(data))
    }

    /// This origin, narrowed to a single line.
    pub fn with_line(&self, line: u32) -> Self {
        if self.0.line == Some(line) && self.0.end_line == Some(line) {
            return self.clone();
        }
        self.with(|d| {
            d.line = Some(line);
            d.end_line = Some(line);
        })
    }

    /// This origin with its comments replaced.
    pub fn with_comments(&self, comments: Vec<String>) -> Self {
        if self.0.comments == comments {
            return self.clone();
        }
        self.with(|d| d.comments = comments)
    }

    /// This origin with `comments` placed before the existing ones.
    pub fn prepend_comments(&self, comments: &[String]) -> Self {
        if comments.is_empty() {
            return self.clone();
        }
        self.with(|d| {
            let mut all = comments.to_vec();
            all.append(&mut d.comments);
            d.comments = all;
        })
    }

    /// This origin with `comments` placed after the existing ones.
    pub fn append_comments(&self, comments: &[String]) -> Self {
        if comments.is_empty() {
            return self.clone();
        }
        self.with(|d| d.comments.extend_from_slice(comments))
    }

    /// Human-readable description including the line range, e.g.
    /// `app.conf: 3` or `String: 1-4`.
    pub fn description(&self) -> String {
        match (self.0.line, self.0.end_line) {
            (Some(line), Some(end)) if end != line => {
                format!("{}: {}-{}", self.0.description, line, end)
            }
            (Some(line), _) => format!("{}: {}", self.0.description, line),
            _ => self.0.description.clone(),
        }
    }

    pub fn kind(&self) -> OriginKind {
        self.0.kind
    }

    pub fn filename(&self) -> Option<&str> {
        self.0.filename.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.0.line
    }

    pub fn comments(&self) -> &[String] {
        &self.0.comments
    }

    /// Combine two origins into one describing both.
    ///
    /// Origins sharing a description keep it and widen the line range;
    /// otherwise the result is a "merge of" description with no lines.
    pub fn merge(&self, other: &Origin) -> Origin {
        if self == other {
            return self.clone();
        }
        let a = &self.0;
        let b = &other.0;
        let kind = if a.kind == b.kind {
            a.kind
        } else {
            OriginKind::Generic
        };

        let a_desc = a.description.strip_prefix(MERGE_OF_PREFIX).unwrap_or(&a.description);
        let b_desc = b.description.strip_prefix(MERGE_OF_PREFIX).unwrap_or(&b.description);

        let (description, line, end_line) = if a_desc == b_desc {
            let line = match (a.line, b.line) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            };
            let end_line = match (a.end_line, b.end_line) {
                (Some(x), Some(y)) => Some(x.max(y)),
                (x, y) => x.or(y),
            };
            (a_desc.to_string(), line, end_line)
        } else {
            let a_full = self.description();
            let b_full = other.description();
            let a_full = a_full.strip_prefix(MERGE_OF_PREFIX).unwrap_or(&a_full);
            let b_full = b_full.strip_prefix(MERGE_OF_PREFIX).unwrap_or(&b_full);
            (format!("{MERGE_OF_PREFIX}{a_full},{b_full}"), None, None)
        };

        let filename = if a.filename == b.filename {
            a.filename.clone()
        } else {
            None
        };

        let comments = if a.comments == b.comments {
            a.comments.clone()
        } else {
            a.comments.iter().chain(b.comments.iter()).cloned().collect()
        };

        Origin(Arc::new(OriginData {
            description,
            kind,
            filename,
            line,
            end_line,
            comments,
        }))
    }

    /// Merge a sequence of origins, skipping adjacent duplicates.
    pub fn merge_all<'a>(origins: impl IntoIterator<Item = &'a Origin>) -> Option<Origin> {
        let mut merged: Option<Origin> = None;
        for origin in origins {
            merged = Some(match merged {
                None => origin.clone(),
                Some(m) => m.merge(origin),
            });
        }
        merged
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin({})", self.description())
    }
}
