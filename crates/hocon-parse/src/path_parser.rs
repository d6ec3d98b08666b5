//! Path expressions: `a.b."c.d"`.

use hocon_tokenizer::{Literal, Syntax, Token, TokenKind, Tokenizer};
use hocon_tree::{ConfigError, Origin, Path, Result};

/// One element of a path while it is being assembled.
struct Element {
    text: String,
    /// Set once an empty quoted string has been seen in this element.
    can_be_empty: bool,
}

impl Element {
    fn new() -> Self {
        Self {
            text: String::new(),
            can_be_empty: false,
        }
    }
}

/// Parse a path given through the API, e.g. to a getter.
pub fn parse_path(text: &str) -> Result<Path> {
    if let Some(path) = fast_path(text) {
        return Ok(path);
    }
    let origin = Origin::new("path parameter");
    let tokens: Vec<Token> = Tokenizer::new(text, Syntax::Conf)
        .filter(|t| !matches!(t.kind, TokenKind::Start | TokenKind::End))
        .collect();
    parse_path_tokens(tokens.iter().map(|t| &t.kind), Some(&origin), text)
}

/// Plain dotted identifiers need no tokenizing.
fn fast_path(text: &str) -> Option<Path> {
    if text.is_empty() || text.starts_with('.') || text.ends_with('.') || text.contains("..") {
        return None;
    }
    let plain = text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    // a leading '-' may start a negative number token
    if !plain || text.starts_with('-') {
        return None;
    }
    Path::from_keys(text.split('.'))
}

/// Build a path from the tokens of a key or a substitution.
///
/// Quoted strings never split; periods in anything else do, including the
/// text of number tokens, so `10.0foo` is `["10", "0foo"]`.
pub(crate) fn parse_path_tokens<'a>(
    tokens: impl IntoIterator<Item = &'a TokenKind>,
    origin: Option<&Origin>,
    original_text: &str,
) -> Result<Path> {
    let bad_path = |message: String| ConfigError::BadPath {
        origin: origin.cloned(),
        path: original_text.to_string(),
        message,
    };

    let mut buf = vec![Element::new()];
    let mut saw_any = false;
    for kind in tokens {
        match kind {
            TokenKind::End => {}
            TokenKind::Value(Literal::String(s)) => {
                saw_any = true;
                add_path_text(&mut buf, true, s);
            }
            TokenKind::Value(literal) => {
                saw_any = true;
                add_path_text(&mut buf, false, &literal.as_text());
            }
            TokenKind::UnquotedText(s) => {
                saw_any = true;
                add_path_text(&mut buf, false, s);
            }
            other => {
                return Err(bad_path(format!(
                    "Token not allowed in path expression: {} (you can double-quote this token if you really want it here)",
                    other
                )));
            }
        }
    }
    if !saw_any {
        return Err(bad_path(
            "Expecting a field name or path here, but got nothing".to_string(),
        ));
    }

    let mut keys = Vec::with_capacity(buf.len());
    for element in buf {
        if element.text.is_empty() && !element.can_be_empty {
            return Err(bad_path(
                "path has a leading, trailing, or two adjacent period '.' (use quoted \"\" empty string if you want an empty element)"
                    .to_string(),
            ));
        }
        keys.push(element.text);
    }
    Path::from_keys(keys).ok_or_else(|| ConfigError::bug("empty path after parsing"))
}

fn add_path_text(buf: &mut Vec<Element>, was_quoted: bool, text: &str) {
    let split = if was_quoted { None } else { text.find('.') };
    let Some(current) = buf.last_mut() else {
        return;
    };
    match split {
        None => {
            current.text.push_str(text);
            if was_quoted && current.text.is_empty() {
                current.can_be_empty = true;
            }
        }
        Some(i) => {
            current.text.push_str(&text[..i]);
            buf.push(Element::new());
            add_path_text(buf, false, &text[i + 1..]);
        }
    }
}
