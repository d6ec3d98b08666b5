//! Tokenizer for HOCON and JSON source text.

use std::collections::VecDeque;

use crate::token::is_whitespace;
use crate::{Literal, Span, Token, TokenKind};
use tracing::trace;

/// Characters that end a run of unquoted text and may not start one.
const NOT_IN_UNQUOTED_TEXT: &str = "$\"{}[]:=,+#`^?!@*&\\";

/// Characters a number may start with.
const FIRST_NUMBER_CHARS: &str = "0123456789-";

/// Characters a number may continue with.
const NUMBER_CHARS: &str = "0123456789eE+-.";

/// The syntax flavor of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// Strict JSON: no comments, substitutions, unquoted text or `+=`.
    Json,
    /// HOCON.
    Conf,
    /// Flat Java-style `.properties`; never tokenized by [`Tokenizer`].
    Properties,
}

impl Syntax {
    /// Guess the syntax from a file name extension.
    pub fn from_filename(name: &str) -> Option<Syntax> {
        if name.ends_with(".json") {
            Some(Syntax::Json)
        } else if name.ends_with(".conf") {
            Some(Syntax::Conf)
        } else if name.ends_with(".properties") {
            Some(Syntax::Properties)
        } else {
            None
        }
    }
}

/// Create a tokenizer for the given source and syntax.
pub fn tokenize(source: &str, syntax: Syntax) -> Tokenizer<'_> {
    Tokenizer::new(source, syntax)
}

/// A problem found while pulling a token.
struct Problem {
    what: String,
    message: String,
    suggest_quotes: bool,
}

impl Problem {
    fn new(what: impl Into<String>, message: impl Into<String>, suggest_quotes: bool) -> Self {
        Self {
            what: what.into(),
            message: message.into(),
            suggest_quotes,
        }
    }

    fn reserved(c: char) -> Self {
        Problem::new(
            c.to_string(),
            format!("Reserved character '{}' is not allowed outside quotes", c),
            true,
        )
    }
}

/// Remembers whitespace between tokens, so that whitespace separating two
/// simple values can be handed to the parser as unquoted text.
#[derive(Debug, Default)]
struct WhitespaceSaver {
    whitespace: String,
    start: u32,
    line: u32,
    last_was_simple_value: bool,
}

impl WhitespaceSaver {
    fn add(&mut self, c: char, pos: u32, line: u32) {
        if self.whitespace.is_empty() {
            self.start = pos;
            self.line = line;
        }
        self.whitespace.push(c);
    }

    /// Called with every pulled token; returns a whitespace token to insert
    /// in front of it, if any.
    fn check(&mut self, token: &Token) -> Option<Token> {
        if token.kind.is_simple_value() {
            if self.last_was_simple_value {
                if self.whitespace.is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.whitespace);
                let span = Span::new(self.start, self.start + text.len() as u32);
                return Some(Token::new(TokenKind::UnquotedText(text), span, self.line));
            }
            self.last_was_simple_value = true;
        } else {
            self.last_was_simple_value = false;
        }
        self.whitespace.clear();
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeStart,
    Running,
    Done,
}

/// A single-pass tokenizer. Yields `Start`, the document tokens, then `End`.
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Current 1-based line.
    line: u32,
    allow_comments: bool,
    saver: WhitespaceSaver,
    queue: VecDeque<Token>,
    state: State,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str, syntax: Syntax) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line: 1,
            allow_comments: syntax != Syntax::Json,
            saver: WhitespaceSaver::default(),
            queue: VecDeque::new(),
            state: State::BeforeStart,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Advance by one character and return it, counting lines.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    fn starts_comment(&self) -> bool {
        self.allow_comments && (self.starts_with("#") || self.starts_with("//"))
    }

    fn token(&self, kind: TokenKind, start: u32, line: u32) -> Token {
        Token::new(kind, Span::new(start, self.pos), line)
    }

    fn queue_next_token(&mut self) {
        let mut saver = std::mem::take(&mut self.saver);
        let token = self.pull_next_token(&mut saver);
        if let Some(whitespace) = saver.check(&token) {
            self.queue.push_back(whitespace);
        }
        self.saver = saver;
        trace!("Token {} at {:?} line {}", token, token.span, token.line);
        self.queue.push_back(token);
    }

    fn pull_next_token(&mut self, saver: &mut WhitespaceSaver) -> Token {
        while let Some(c) = self.peek() {
            if c != '\n' && is_whitespace(c) {
                saver.add(c, self.pos, self.line);
                self.advance();
            } else {
                break;
            }
        }

        let start = self.pos;
        let line = self.line;
        let Some(c) = self.peek() else {
            return self.token(TokenKind::End, start, line);
        };

        if c == '\n' {
            // newline tokens carry the line that just ended
            self.advance();
            return self.token(TokenKind::Newline, start, line);
        }

        match self.pull_token_kind(c) {
            Ok(kind) => self.token(kind, start, line),
            Err(problem) => self.token(
                TokenKind::Problem {
                    what: problem.what,
                    message: problem.message,
                    suggest_quotes: problem.suggest_quotes,
                },
                start,
                line,
            ),
        }
    }

    fn pull_token_kind(&mut self, c: char) -> Result<TokenKind, Problem> {
        if self.starts_comment() {
            return Ok(self.pull_comment());
        }
        let structural = match c {
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '=' => Some(TokenKind::Equals),
            '{' => Some(TokenKind::OpenCurly),
            '}' => Some(TokenKind::CloseCurly),
            '[' => Some(TokenKind::OpenSquare),
            ']' => Some(TokenKind::CloseSquare),
            _ => None,
        };
        if let Some(kind) = structural {
            self.advance();
            return Ok(kind);
        }
        match c {
            '"' => self.pull_quoted_string(),
            '$' => self.pull_substitution(),
            '+' => self.pull_plus_equals(),
            c if FIRST_NUMBER_CHARS.contains(c) => self.pull_number(),
            c if NOT_IN_UNQUOTED_TEXT.contains(c) => {
                self.advance();
                Err(Problem::reserved(c))
            }
            _ => Ok(self.pull_unquoted_text()),
        }
    }

    fn pull_comment(&mut self) -> TokenKind {
        let double_slash = self.starts_with("//");
        self.advance();
        if double_slash {
            self.advance();
        }
        let start = self.pos as usize;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        let text = self.source[start..self.pos as usize].trim_end_matches('\r');
        TokenKind::Comment {
            text: text.to_string(),
            double_slash,
        }
    }

    fn pull_unquoted_text(&mut self) -> TokenKind {
        let start = self.pos as usize;
        while let Some(c) = self.peek() {
            if NOT_IN_UNQUOTED_TEXT.contains(c) || is_whitespace(c) || self.starts_comment() {
                break;
            }
            self.advance();

            // true/false/null win as soon as they are a prefix of the run
            match &self.source[start..self.pos as usize] {
                "true" => return TokenKind::Value(Literal::Boolean(true)),
                "false" => return TokenKind::Value(Literal::Boolean(false)),
                "null" => return TokenKind::Value(Literal::Null),
                _ => {}
            }
        }
        TokenKind::UnquotedText(self.source[start..self.pos as usize].to_string())
    }

    fn pull_number(&mut self) -> Result<TokenKind, Problem> {
        let start = self.pos as usize;
        let mut contained_decimal_or_e = false;
        self.advance();
        while let Some(c) = self.peek() {
            if !NUMBER_CHARS.contains(c) {
                break;
            }
            if matches!(c, '.' | 'e' | 'E') {
                contained_decimal_or_e = true;
            }
            self.advance();
        }
        let text = &self.source[start..self.pos as usize];

        let literal = if contained_decimal_or_e {
            text.parse::<f64>().ok().map(|value| Literal::Double {
                value,
                text: text.to_string(),
            })
        } else {
            text.parse::<i64>().ok().map(|value| Literal::Int {
                value,
                text: text.to_string(),
            })
        };
        match literal {
            Some(literal) => Ok(TokenKind::Value(literal)),
            None => {
                // not a number after all; treat as unquoted text if allowed
                if let Some(c) = text.chars().find(|c| NOT_IN_UNQUOTED_TEXT.contains(*c)) {
                    return Err(Problem::reserved(c));
                }
                Ok(TokenKind::UnquotedText(text.to_string()))
            }
        }
    }

    fn pull_quoted_string(&mut self) -> Result<TokenKind, Problem> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(Problem::new(
                        "\"",
                        "End of input but string quote was still open",
                        false,
                    ));
                }
                Some('\\') => self.pull_escape_sequence(&mut value)?,
                Some('"') => break,
                Some(c) if (c as u32) < 0x20 => {
                    return Err(Problem::new(
                        format!("{:?}", c),
                        format!(
                            "JSON does not allow unescaped {:?} in quoted strings, use a backslash escape",
                            c
                        ),
                        false,
                    ));
                }
                Some(c) => value.push(c),
            }
        }

        if value.is_empty() && self.peek() == Some('"') {
            self.advance();
            self.pull_triple_quoted_string(&mut value)?;
        }
        Ok(TokenKind::Value(Literal::String(value)))
    }

    /// Content of `"""..."""` after the opening quotes; no escapes apply.
    fn pull_triple_quoted_string(&mut self, value: &mut String) -> Result<(), Problem> {
        loop {
            match self.peek() {
                None => {
                    return Err(Problem::new(
                        "\"\"\"",
                        "End of input but triple-quoted string was still open",
                        false,
                    ));
                }
                Some('"') if self.starts_with("\"\"\"") => {
                    // the last three quotes of the run close the string
                    let run = self.remaining.chars().take_while(|c| *c == '"').count();
                    for _ in 0..run - 3 {
                        value.push('"');
                    }
                    for _ in 0..run {
                        self.advance();
                    }
                    return Ok(());
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    fn pull_escape_sequence(&mut self, value: &mut String) -> Result<(), Problem> {
        let Some(escaped) = self.advance() else {
            return Err(Problem::new(
                "\\",
                "End of input but backslash in string had nothing after it",
                false,
            ));
        };
        match escaped {
            '"' => value.push('"'),
            '\\' => value.push('\\'),
            '/' => value.push('/'),
            'b' => value.push('\u{0008}'),
            'f' => value.push('\u{000C}'),
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'u' => {
                let unit = self.pull_hex_escape()?;
                let c = if (0xD800..0xDC00).contains(&unit) && self.starts_with("\\u") {
                    self.advance();
                    self.advance();
                    let low = self.pull_hex_escape()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(Problem::new(
                            "\\u",
                            format!(
                                "Expected a low surrogate after \\u{:04x}, got \\u{:04x}",
                                unit, low
                            ),
                            false,
                        ));
                    }
                    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                } else {
                    char::from_u32(unit)
                };
                match c {
                    Some(c) => value.push(c),
                    None => {
                        return Err(Problem::new(
                            "\\u",
                            format!("Invalid unicode code point after \\u escape: {:04x}", unit),
                            false,
                        ));
                    }
                }
            }
            other => {
                return Err(Problem::new(
                    other.to_string(),
                    format!(
                        "backslash followed by '{}', this is not a valid escape sequence (quoted strings use JSON escaping, so use double-backslash \\\\ for literal backslash)",
                        other
                    ),
                    false,
                ));
            }
        }
        Ok(())
    }

    fn pull_hex_escape(&mut self) -> Result<u32, Problem> {
        let mut digits = String::new();
        for _ in 0..4 {
            match self.advance() {
                Some(c) => digits.push(c),
                None => {
                    return Err(Problem::new(
                        "\\u",
                        "End of input but expecting 4 hex digits for \\uXXXX escape",
                        false,
                    ));
                }
            }
        }
        // from_str_radix alone would take a leading sign
        let hex = digits.chars().all(|c| c.is_ascii_hexdigit());
        u32::from_str_radix(&digits, 16).ok().filter(|_| hex).ok_or_else(|| {
            Problem::new(
                digits.clone(),
                format!(
                    "Malformed hex digits after \\u escape in string: '{}'",
                    digits
                ),
                false,
            )
        })
    }

    fn pull_plus_equals(&mut self) -> Result<TokenKind, Problem> {
        self.advance(); // +
        match self.peek() {
            Some('=') => {
                self.advance();
                Ok(TokenKind::PlusEquals)
            }
            other => Err(Problem::new(
                "+",
                format!(
                    "'+' not followed by =, '{}' not allowed after '+'",
                    describe(other)
                ),
                true,
            )),
        }
    }

    fn pull_substitution(&mut self) -> Result<TokenKind, Problem> {
        self.advance(); // $
        match self.peek() {
            Some('{') => {
                self.advance();
            }
            other => {
                return Err(Problem::new(
                    "$",
                    format!(
                        "'$' not followed by {{, '{}' not allowed after '$'",
                        describe(other)
                    ),
                    true,
                ));
            }
        }

        let optional = self.peek() == Some('?');
        if optional {
            self.advance();
        }

        // the expression is validated by the parser, even nested
        // substitutions get through here
        let mut saver = WhitespaceSaver::default();
        let mut expression = Vec::new();
        loop {
            let token = self.pull_next_token(&mut saver);
            match token.kind {
                TokenKind::CloseCurly => break,
                TokenKind::End => {
                    return Err(Problem::new(
                        "${",
                        "Substitution ${ was not closed with a }",
                        false,
                    ));
                }
                TokenKind::Problem {
                    what,
                    message,
                    suggest_quotes,
                } => return Err(Problem::new(what, message, suggest_quotes)),
                _ => {}
            }
            if let Some(whitespace) = saver.check(&token) {
                expression.push(whitespace);
            }
            expression.push(token);
        }

        Ok(TokenKind::Substitution {
            optional,
            expression,
        })
    }
}

fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => c.to_string(),
        None => "end of file".to_string(),
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = match self.queue.pop_front() {
            Some(token) => token,
            None => match self.state {
                State::BeforeStart => {
                    self.state = State::Running;
                    return Some(Token::new(TokenKind::Start, Span::empty(0), 1));
                }
                State::Done => return None,
                State::Running => {
                    self.queue_next_token();
                    self.queue.pop_front()?
                }
            },
        };
        if token.kind == TokenKind::End {
            self.state = State::Done;
        }
        Some(token)
    }
}
