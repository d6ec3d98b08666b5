//! Token types produced by the tokenizer.

use std::fmt;

use crate::Span;

/// A scalar literal recognized directly by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    /// An integral number, with the text it was written as.
    Int { value: i64, text: String },
    /// A floating point number, with the text it was written as.
    Double { value: f64, text: String },
    /// A quoted string after escape processing.
    String(String),
}

impl Literal {
    /// The literal as it would appear inside a path expression or a
    /// concatenated string.
    pub fn as_text(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Int { text, .. } | Literal::Double { text, .. } => text.clone(),
            Literal::String(s) => s.clone(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "NULL",
            Literal::Boolean(_) => "BOOLEAN",
            Literal::Int { .. } | Literal::Double { .. } => "NUMBER",
            Literal::String(_) => "STRING",
        }
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Emitted once before anything else.
    Start,
    /// Emitted once at end of input.
    End,
    Comma,
    Equals,
    Colon,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
    PlusEquals,
    /// A line break. Separates fields and elements in HOCON.
    Newline,
    /// A number, boolean, null or quoted string.
    Value(Literal),
    /// A run of unquoted text, or whitespace preserved between two simple
    /// values so the parser can concatenate them.
    UnquotedText(String),
    /// `${path}` or `${?path}`; the expression is validated by the parser.
    Substitution { optional: bool, expression: Vec<Token> },
    /// `# ...` or `// ...`, text excludes the marker.
    Comment { text: String, double_slash: bool },
    /// Something the tokenizer could not make sense of. Reported when the
    /// parser reaches it.
    Problem {
        what: String,
        message: String,
        suggest_quotes: bool,
    },
}

impl TokenKind {
    /// Values that may be concatenated when separated only by spaces.
    pub fn is_simple_value(&self) -> bool {
        matches!(
            self,
            TokenKind::Value(_) | TokenKind::UnquotedText(_) | TokenKind::Substitution { .. }
        )
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, TokenKind::Newline)
    }

    /// Unquoted text consisting only of whitespace.
    pub fn is_unquoted_whitespace(&self) -> bool {
        match self {
            TokenKind::UnquotedText(s) => s.chars().all(is_whitespace),
            _ => false,
        }
    }

    pub fn unquoted_text(&self) -> Option<&str> {
        match self {
            TokenKind::UnquotedText(s) => Some(s),
            _ => None,
        }
    }

    pub fn quoted_string(&self) -> Option<&str> {
        match self {
            TokenKind::Value(Literal::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-based line. For a newline token this is the line it ended.
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, line: u32) -> Self {
        Self { kind, span, line }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Start => write!(f, "start of file"),
            TokenKind::End => write!(f, "end of file"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::OpenCurly => write!(f, "'{{'"),
            TokenKind::CloseCurly => write!(f, "'}}'"),
            TokenKind::OpenSquare => write!(f, "'['"),
            TokenKind::CloseSquare => write!(f, "']'"),
            TokenKind::PlusEquals => write!(f, "'+='"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Value(literal) => {
                write!(f, "'{}' ({})", literal.as_text(), literal.type_name())
            }
            TokenKind::UnquotedText(s) => write!(f, "'{}'", s),
            TokenKind::Substitution {
                optional,
                expression,
            } => {
                write!(f, "'${{{}", if *optional { "?" } else { "" })?;
                for token in expression {
                    match &token.kind {
                        TokenKind::UnquotedText(s) => write!(f, "{}", s)?,
                        TokenKind::Value(literal) => write!(f, "{}", literal.as_text())?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "}}'")
            }
            TokenKind::Comment { text, double_slash } => {
                write!(f, "'{}{}'", if *double_slash { "//" } else { "#" }, text)
            }
            TokenKind::Problem { what, .. } => write!(f, "'{}'", what),
        }
    }
}

/// Whitespace as understood by HOCON: Unicode whitespace plus the BOM and
/// the non-breaking spaces.
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{FEFF}' | '\u{00A0}' | '\u{2007}' | '\u{202F}')
}
