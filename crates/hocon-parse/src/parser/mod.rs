//! Recursive descent parser turning tokens into a value tree.

use std::sync::Arc;

use hocon_tokenizer::{Literal, Span, Syntax, Token, TokenKind, Tokenizer};
use hocon_tree::{
    ConfigError, Origin, Path, Result, SubstitutionExpression, Value, concatenate,
};
use indexmap::IndexMap;
use tracing::trace;

use crate::include::{FallbackIncluder, FileIncluder, IncludeContext, Includer};
use crate::path_parser::parse_path_tokens;

/// A token, or a value already built from a run of tokens.
enum Item {
    Token(TokenKind),
    Value(Value),
}

/// An item with the comments written on the lines right before it.
struct Pending {
    item: Item,
    span: Span,
    line: u32,
    comments: Vec<String>,
}

impl Pending {
    fn token(token: Token) -> Self {
        Self {
            item: Item::Token(token.kind),
            span: token.span,
            line: token.line,
            comments: Vec::new(),
        }
    }

    fn kind(&self) -> Option<&TokenKind> {
        match &self.item {
            Item::Token(kind) => Some(kind),
            Item::Value(_) => None,
        }
    }

    fn is(&self, kind: &TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    fn is_newline(&self) -> bool {
        self.is(&TokenKind::Newline)
    }

    fn is_unquoted_whitespace(&self) -> bool {
        self.kind().is_some_and(TokenKind::is_unquoted_whitespace)
    }

    fn is_include_keyword(&self) -> bool {
        self.kind().and_then(TokenKind::unquoted_text) == Some("include")
    }

    /// Whether this can begin a value in a list or after a separator.
    fn starts_value(&self) -> bool {
        match &self.item {
            Item::Value(_) => true,
            Item::Token(kind) => matches!(
                kind,
                TokenKind::Value(_) | TokenKind::OpenCurly | TokenKind::OpenSquare
            ),
        }
    }

    /// Whether this joins a run of concatenated values.
    fn continues_value_run(&self) -> bool {
        match &self.item {
            Item::Value(_) => true,
            Item::Token(kind) => {
                kind.is_simple_value()
                    || matches!(kind, TokenKind::OpenCurly | TokenKind::OpenSquare)
            }
        }
    }

    /// The token if it can be part of a key.
    fn key_piece(&self) -> Option<TokenKind> {
        match self.kind()? {
            kind @ (TokenKind::Value(_) | TokenKind::UnquotedText(_)) => Some(kind.clone()),
            _ => None,
        }
    }

    fn prepend_comments(mut self, mut comments: Vec<String>) -> Self {
        if !comments.is_empty() {
            comments.append(&mut self.comments);
            self.comments = comments;
        }
        self
    }

    fn describe(&self) -> String {
        match &self.item {
            Item::Token(kind) => kind.to_string(),
            Item::Value(value) => match value.transform_to_string() {
                Some(text) => format!("'{}'", text),
                None => "value".to_string(),
            },
        }
    }
}

/// Wraps the tokenizer with a push-back stack, attaching comment blocks to
/// the token that follows them.
struct TokenSource<'a> {
    tokens: Tokenizer<'a>,
    buffer: Vec<Pending>,
    /// Something other than a newline or comment was seen on this line.
    mid_line: bool,
    last_line: u32,
}

impl<'a> TokenSource<'a> {
    fn new(tokens: Tokenizer<'a>) -> Self {
        Self {
            tokens,
            buffer: Vec::new(),
            mid_line: false,
            last_line: 1,
        }
    }

    fn raw(&mut self) -> Token {
        loop {
            let Some(token) = self.tokens.next() else {
                let end = Span::empty(self.tokens.position());
                return Token::new(TokenKind::End, end, self.last_line);
            };
            self.last_line = token.line;
            match &token.kind {
                TokenKind::Newline => self.mid_line = false,
                // a comment after something on the same line goes with nothing
                TokenKind::Comment { .. } if self.mid_line => continue,
                TokenKind::Comment { .. } | TokenKind::Start => {}
                _ => self.mid_line = true,
            }
            return token;
        }
    }

    fn pop(&mut self) -> Pending {
        if let Some(pending) = self.buffer.pop() {
            return pending;
        }
        let token = self.raw();
        if matches!(token.kind, TokenKind::Comment { .. }) {
            self.comment_block(token)
        } else {
            Pending::token(token)
        }
    }

    fn push(&mut self, pending: Pending) {
        self.buffer.push(pending);
    }

    /// Collect a run of comments and newlines. The comments go with the
    /// token after them unless a blank line intervenes; the newlines are
    /// replayed first so separators still see them.
    fn comment_block(&mut self, first: Token) -> Pending {
        let mut newlines = Vec::new();
        let mut comments = Vec::new();
        let mut previous_newline = false;
        let mut next = first;
        loop {
            if next.kind.is_newline() {
                if previous_newline {
                    comments.clear();
                }
                previous_newline = true;
                newlines.push(next);
            } else if let TokenKind::Comment { text, .. } = &next.kind {
                comments.push(text.clone());
                previous_newline = false;
            } else {
                break;
            }
            next = self.raw();
        }

        let mut concluding = Pending::token(next);
        concluding.comments = comments;
        let mut newlines = newlines.into_iter().map(Pending::token);
        match newlines.next() {
            None => concluding,
            Some(first_newline) => {
                self.buffer.push(concluding);
                let rest: Vec<Pending> = newlines.collect();
                self.buffer.extend(rest.into_iter().rev());
                first_newline
            }
        }
    }
}

/// Parses one JSON or HOCON document.
pub(crate) struct Parser<'a> {
    source: TokenSource<'a>,
    syntax: Syntax,
    base_origin: Origin,
    /// Keys of the fields whose values are being parsed, outermost first.
    path_stack: Vec<Path>,
    /// How many `=` separators we are inside; hints at `.properties` files
    /// misnamed as `.conf`.
    equals_count: usize,
    context: &'a IncludeContext,
    includer: Arc<dyn Includer>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: Tokenizer<'a>,
        syntax: Syntax,
        base_origin: Origin,
        context: &'a IncludeContext,
    ) -> Self {
        let includer: Arc<dyn Includer> = match &context.parse_options().includer {
            Some(extra) => Arc::new(FallbackIncluder::new(Arc::new(FileIncluder), extra.clone())),
            None => Arc::new(FileIncluder),
        };
        Self {
            source: TokenSource::new(tokens),
            syntax,
            base_origin,
            path_stack: Vec::new(),
            equals_count: 0,
            context,
            includer,
        }
    }

    /// Parse the whole document. The root is an object or a list.
    pub(crate) fn parse(mut self) -> Result<Value> {
        let t = self.next_token_ignoring_newline()?;
        if !t.is(&TokenKind::Start) {
            return Err(ConfigError::bug(format!(
                "token stream did not begin with start, had {}",
                t.describe()
            )));
        }

        let t = self.next_token_ignoring_newline()?;
        let result = if t.is(&TokenKind::OpenCurly) || t.is(&TokenKind::OpenSquare) {
            self.parse_value(t)?
        } else if self.syntax == Syntax::Json {
            let message = if t.is(&TokenKind::End) {
                "Empty document".to_string()
            } else {
                format!(
                    "Document must have an object or array at root, unexpected token: {}",
                    t.describe()
                )
            };
            return Err(self.error_at(&t, message));
        } else {
            // the root object may omit its braces
            let line = t.line;
            self.put_back(t);
            self.parse_object(false, line)?
        };

        let t = self.next_token_ignoring_newline()?;
        if t.is(&TokenKind::End) {
            Ok(result)
        } else {
            let message = format!(
                "Document has trailing tokens after first object or array: {}",
                t.describe()
            );
            Err(self.error_at(&t, message))
        }
    }

    fn origin_at(&self, line: u32) -> Origin {
        self.base_origin.with_line(line)
    }

    fn error_at(&self, pending: &Pending, message: impl Into<String>) -> ConfigError {
        ConfigError::parse(self.origin_at(pending.line), message).with_span(pending.span)
    }

    fn put_back(&mut self, pending: Pending) {
        self.source.push(pending);
    }

    fn next_token(&mut self) -> Result<Pending> {
        let pending = self.source.pop();
        if let Some(TokenKind::Problem {
            message,
            suggest_quotes,
            ..
        }) = pending.kind()
        {
            let message = if *suggest_quotes {
                self.add_quote_suggestion(
                    None,
                    self.equals_count > 0,
                    &pending.describe(),
                    message,
                )
            } else {
                self.add_key_name(message)
            };
            return Err(self.error_at(&pending, message));
        }
        if self.syntax == Syntax::Json {
            let message = match pending.kind() {
                Some(TokenKind::UnquotedText(text)) => Some(self.add_key_name(&format!(
                    "Token not allowed in valid JSON: '{}'",
                    text
                ))),
                Some(TokenKind::Substitution { .. }) => Some(
                    self.add_key_name("Substitutions (${} syntax) not allowed in JSON"),
                ),
                _ => None,
            };
            if let Some(message) = message {
                return Err(self.error_at(&pending, message));
            }
        }
        Ok(pending)
    }

    fn next_token_ignoring_newline(&mut self) -> Result<Pending> {
        let mut t = self.next_token()?;
        while t.is_newline() {
            t = self.next_token()?;
        }
        Ok(t)
    }

    /// Consume a comma, or in HOCON one or more newlines optionally followed
    /// by a comma. Returns whether a separator was found.
    fn check_element_separator(&mut self) -> Result<bool> {
        if self.syntax == Syntax::Json {
            let t = self.next_token_ignoring_newline()?;
            if t.is(&TokenKind::Comma) {
                return Ok(true);
            }
            self.put_back(t);
            return Ok(false);
        }

        let mut saw_newline = false;
        loop {
            let t = self.next_token()?;
            if t.is_newline() {
                saw_newline = true;
            } else if t.is(&TokenKind::Comma) {
                return Ok(true);
            } else {
                self.put_back(t);
                return Ok(saw_newline);
            }
        }
    }

    /// Join a run of adjacent values on one line into a single value, which
    /// is pushed back for the caller to pick up.
    fn consolidate_value_tokens(&mut self) -> Result<()> {
        if self.syntax == Syntax::Json {
            return Ok(());
        }

        let mut pieces = Vec::new();
        let mut first: Option<(Span, u32, Vec<String>)> = None;
        let mut last_span = None;
        let mut t = self.next_token_ignoring_newline()?;
        while t.continues_value_run() {
            if first.is_none() {
                first = Some((t.span, t.line, std::mem::take(&mut t.comments)));
            }
            last_span = Some(t.span);
            pieces.push(self.parse_value(t)?);
            // objects and lists may span lines, but the run itself may not
            t = self.next_token()?;
        }
        self.put_back(t);

        let Some((span, line, comments)) = first else {
            return Ok(());
        };
        if let Some(value) = concatenate(pieces)? {
            let span = last_span.map_or(span, |last| span.join(last));
            self.put_back(Pending {
                item: Item::Value(value),
                span,
                line,
                comments,
            });
        }
        Ok(())
    }

    fn parse_value(&mut self, t: Pending) -> Result<Value> {
        let Pending {
            item,
            span,
            line,
            comments,
        } = t;
        let value = match item {
            Item::Value(value) => value,
            Item::Token(TokenKind::Value(literal)) => self.literal(literal, line),
            Item::Token(TokenKind::UnquotedText(text)) => {
                Value::unquoted(self.origin_at(line), text)
            }
            Item::Token(TokenKind::Substitution {
                optional,
                expression,
            }) => self.substitution(optional, &expression, line)?,
            Item::Token(TokenKind::OpenCurly) => self.parse_object(true, line)?,
            Item::Token(TokenKind::OpenSquare) => self.parse_array(line)?,
            Item::Token(other) => {
                let description = other.to_string();
                let message = self.add_quote_suggestion(
                    None,
                    self.equals_count > 0,
                    &description,
                    &format!("Expecting a value but got wrong token: {}", description),
                );
                return Err(ConfigError::parse(self.origin_at(line), message).with_span(span));
            }
        };
        if comments.is_empty() {
            Ok(value)
        } else {
            let origin = value.origin().prepend_comments(&comments);
            Ok(value.with_origin(origin))
        }
    }

    fn literal(&self, literal: Literal, line: u32) -> Value {
        let origin = self.origin_at(line);
        match literal {
            Literal::Null => Value::null(origin),
            Literal::Boolean(b) => Value::boolean(origin, b),
            Literal::Int { value, text } => Value::int(origin, value, Some(text)),
            Literal::Double { value, text } => Value::double(origin, value, Some(text)),
            Literal::String(text) => Value::string(origin, text),
        }
    }

    fn substitution(&self, optional: bool, expression: &[Token], line: u32) -> Result<Value> {
        let origin = self.origin_at(line);
        let text: String = expression.iter().map(|t| token_text(&t.kind)).collect();
        let path = parse_path_tokens(expression.iter().map(|t| &t.kind), Some(&origin), &text)?;
        Ok(Value::reference(origin, SubstitutionExpression::new(path, optional)))
    }

    fn parse_key(&mut self, t: Pending) -> Result<Path> {
        if self.syntax == Syntax::Json {
            if let Some(TokenKind::Value(Literal::String(key))) = t.kind() {
                return Ok(Path::key(key.clone()));
            }
            let message = self.add_key_name(&format!(
                "Expecting close brace }} or a field name here, got {}",
                t.describe()
            ));
            return Err(self.error_at(&t, message));
        }

        let line = t.line;
        let mut expression = Vec::new();
        let mut t = t;
        while let Some(kind) = t.key_piece() {
            expression.push(kind);
            // keys never span lines
            t = self.next_token()?;
        }
        if expression.is_empty() {
            let message = self.add_key_name(&format!(
                "expecting a close brace or a field name here, got {}",
                t.describe()
            ));
            return Err(self.error_at(&t, message));
        }
        self.put_back(t);
        let text: String = expression.iter().map(token_text).collect();
        parse_path_tokens(&expression, Some(&self.origin_at(line)), &text)
    }

    fn is_key_value_separator(&self, t: &Pending) -> bool {
        match self.syntax {
            Syntax::Json => t.is(&TokenKind::Colon),
            _ => {
                t.is(&TokenKind::Colon) || t.is(&TokenKind::Equals) || t.is(&TokenKind::PlusEquals)
            }
        }
    }

    /// `{ ... }`, called just after the open brace, or for a braceless
    /// root, at the first token.
    fn parse_object(&mut self, had_open_curly: bool, line: u32) -> Result<Value> {
        let origin = self.origin_at(line);
        let mut values: IndexMap<String, Value> = IndexMap::new();
        let mut after_comma = false;
        let mut last_path: Option<Path> = None;
        let mut last_inside_equals = false;

        loop {
            let mut t = self.next_token_ignoring_newline()?;
            if t.is(&TokenKind::CloseCurly) {
                if self.syntax == Syntax::Json && after_comma {
                    let message = self.add_quote_suggestion(
                        None,
                        self.equals_count > 0,
                        &t.describe(),
                        "expecting a field name after a comma, got a close brace } instead",
                    );
                    return Err(self.error_at(&t, message));
                } else if !had_open_curly {
                    let message = self.add_quote_suggestion(
                        None,
                        self.equals_count > 0,
                        &t.describe(),
                        "unbalanced close brace '}' with no open brace",
                    );
                    return Err(self.error_at(&t, message));
                }
                break;
            } else if t.is(&TokenKind::End) && !had_open_curly {
                self.put_back(t);
                break;
            } else if self.syntax != Syntax::Json && t.is_include_keyword() {
                self.parse_include(&mut values, &t)?;
            } else {
                let key_comments = std::mem::take(&mut t.comments);
                let key_span = t.span;
                let key_line = t.line;
                let path = self.parse_key(t)?;
                let after_key = self.next_token_ignoring_newline()?;
                let plus_equals = after_key.is(&TokenKind::PlusEquals);
                let mut inside_equals = false;
                self.path_stack.push(path.clone());

                let value_token = if self.syntax == Syntax::Conf
                    && after_key.is(&TokenKind::OpenCurly)
                {
                    // no separator needed before an object
                    after_key
                } else {
                    if !self.is_key_value_separator(&after_key) {
                        let message = self.add_quote_suggestion(
                            None,
                            self.equals_count > 0,
                            &after_key.describe(),
                            &format!(
                                "Key '{}' may not be followed by token: {}",
                                path.render(),
                                after_key.describe()
                            ),
                        );
                        return Err(self.error_at(&after_key, message));
                    }
                    if after_key.is(&TokenKind::Equals) {
                        inside_equals = true;
                        self.equals_count += 1;
                    }
                    self.consolidate_value_tokens()?;
                    let value_token = self.next_token_ignoring_newline()?;
                    value_token.prepend_comments(after_key.comments)
                };

                let mut new_value = self.parse_value(value_token.prepend_comments(key_comments))?;
                if plus_equals {
                    new_value = self.append_to_previous(new_value)?;
                }

                last_path = self.path_stack.pop();
                if inside_equals {
                    self.equals_count -= 1;
                }
                last_inside_equals = inside_equals;

                let key = path.first().to_string();
                match path.remainder() {
                    None => {
                        if let Some(existing) = values.get(&key) {
                            if self.syntax == Syntax::Json {
                                let message = format!(
                                    "JSON does not allow duplicate fields: '{}' was already seen at {}",
                                    key,
                                    existing.origin().description()
                                );
                                return Err(ConfigError::parse(self.origin_at(key_line), message)
                                    .with_span(key_span));
                            }
                            new_value = new_value.with_fallback(existing);
                        }
                        values.insert(key, new_value);
                    }
                    Some(remaining) => {
                        let mut nested = value_under_path(&remaining, new_value);
                        if let Some(existing) = values.get(&key) {
                            nested = nested.with_fallback(existing);
                        }
                        values.insert(key, nested);
                    }
                }
            }

            if self.check_element_separator()? {
                after_comma = true;
                continue;
            }
            let t = self.next_token_ignoring_newline()?;
            if t.is(&TokenKind::CloseCurly) {
                if !had_open_curly {
                    let message = self.add_quote_suggestion(
                        last_path.as_ref(),
                        last_inside_equals,
                        &t.describe(),
                        "unbalanced close brace '}' with no open brace",
                    );
                    return Err(self.error_at(&t, message));
                }
                break;
            } else if had_open_curly {
                let message = self.add_quote_suggestion(
                    last_path.as_ref(),
                    last_inside_equals,
                    &t.describe(),
                    &format!("Expecting close brace }} or a comma, got {}", t.describe()),
                );
                return Err(self.error_at(&t, message));
            } else if t.is(&TokenKind::End) {
                self.put_back(t);
                break;
            } else {
                let message = self.add_quote_suggestion(
                    last_path.as_ref(),
                    last_inside_equals,
                    &t.describe(),
                    &format!("Expecting end of input or a comma, got {}", t.describe()),
                );
                return Err(self.error_at(&t, message));
            }
        }

        Ok(Value::object(origin, values))
    }

    /// `a += x` means `a = ${?a} [x]`.
    fn append_to_previous(&self, value: Value) -> Result<Value> {
        let origin = value.origin().clone();
        let previous = Value::reference(
            origin.clone(),
            SubstitutionExpression::new(self.full_current_path()?, true),
        );
        let list = Value::list(origin, vec![value]);
        concatenate(vec![previous, list])?
            .ok_or_else(|| ConfigError::bug("appending produced no value"))
    }

    /// `[ ... ]`, called just after the open bracket.
    fn parse_array(&mut self, line: u32) -> Result<Value> {
        let origin = self.origin_at(line);
        let mut values = Vec::new();

        self.consolidate_value_tokens()?;
        let t = self.next_token_ignoring_newline()?;
        if t.is(&TokenKind::CloseSquare) {
            return Ok(Value::list(origin, values));
        } else if t.starts_value() {
            values.push(self.parse_value(t)?);
        } else {
            let message = self.add_key_name(&format!(
                "List should have ] or a first element after the open [, instead had token: {0} (if you want {0} to be part of a string value, then double-quote it)",
                t.describe()
            ));
            return Err(self.error_at(&t, message));
        }

        loop {
            if !self.check_element_separator()? {
                let t = self.next_token_ignoring_newline()?;
                if t.is(&TokenKind::CloseSquare) {
                    return Ok(Value::list(origin, values));
                }
                let message = self.add_key_name(&format!(
                    "List should have ended with ] or had a comma, instead had token: {0} (if you want {0} to be part of a string value, then double-quote it)",
                    t.describe()
                ));
                return Err(self.error_at(&t, message));
            }

            self.consolidate_value_tokens()?;
            let t = self.next_token_ignoring_newline()?;
            if t.starts_value() {
                values.push(self.parse_value(t)?);
            } else if self.syntax != Syntax::Json && t.is(&TokenKind::CloseSquare) {
                // one trailing comma is fine
                self.put_back(t);
            } else {
                let message = self.add_key_name(&format!(
                    "List should have had new element after a comma, instead had token: {0} (if you want the comma or {0} to be part of a string value, then double-quote it)",
                    t.describe()
                ));
                return Err(self.error_at(&t, message));
            }
        }
    }

    /// `include "name"`, `include file("name")` or
    /// `include required(...)`, called just after the keyword.
    fn parse_include(&mut self, values: &mut IndexMap<String, Value>, keyword: &Pending) -> Result<()> {
        let mut prefix = String::new();
        let mut t = self.next_token_ignoring_newline()?;
        let name = loop {
            if t.is_unquoted_whitespace() {
                t = self.next_token_ignoring_newline()?;
                continue;
            }
            match t.kind() {
                Some(TokenKind::Value(Literal::String(name))) => break name.clone(),
                Some(TokenKind::UnquotedText(text)) => {
                    prefix.push_str(text);
                    t = self.next_token_ignoring_newline()?;
                }
                _ => {
                    let message = if prefix.is_empty() {
                        format!(
                            "include keyword is not followed by a quoted string, but by: {}",
                            t.describe()
                        )
                    } else {
                        format!(
                            "expecting a quoted string inside file() or required(), rather than: {}",
                            t.describe()
                        )
                    };
                    return Err(self.error_at(&t, message));
                }
            }
        };

        let mut rest = prefix.as_str();
        let mut open = 0;
        let required = match rest.strip_prefix("required(") {
            Some(inner) => {
                rest = inner;
                open += 1;
                true
            }
            None => false,
        };
        let file = match rest {
            "" => false,
            "file(" => {
                open += 1;
                true
            }
            "url(" | "classpath(" => {
                let message = format!(
                    "include {}) is not supported, use file() or a plain quoted name",
                    rest
                );
                return Err(self.error_at(&t, message));
            }
            _ => {
                let message = format!(
                    "expecting include parameter to be quoted filename, file(), or required(). No spaces are allowed before the open paren. Not expecting: '{}'",
                    prefix
                );
                return Err(self.error_at(&t, message));
            }
        };

        let mut closed = 0;
        while closed < open {
            let t = self.next_token_ignoring_newline()?;
            if t.is_unquoted_whitespace() {
                continue;
            }
            match t.kind().and_then(TokenKind::unquoted_text) {
                Some(text)
                    if !text.is_empty()
                        && text.chars().all(|c| c == ')')
                        && closed + text.len() <= open =>
                {
                    closed += text.len();
                }
                _ => {
                    let message =
                        format!("expecting a close parentheses ')' here, not: {}", t.describe());
                    return Err(self.error_at(&t, message));
                }
            }
        }

        let context = if required {
            let options = self.context.parse_options().clone().with_allow_missing(false);
            self.context.with_parse_options(options)
        } else {
            self.context.clone()
        };
        trace!(target: "hocon::load", name = %name, required, file, "include");
        let included = if file {
            self.includer.include_file(&context, &name)
        } else {
            self.includer.include(&context, &name)
        };
        let included = match included {
            Ok(value) => value,
            Err(ConfigError::Io { message, .. }) if required => {
                return Err(ConfigError::Include {
                    origin: self.origin_at(keyword.line),
                    message: format!("required include '{}' could not be loaded: {}", name, message),
                });
            }
            Err(err) => return Err(err),
        };

        let included = if self.path_stack.is_empty() {
            included
        } else {
            included.relativized(&self.full_current_path()?)
        };
        let Some(object) = included.as_object() else {
            return Err(ConfigError::Include {
                origin: self.origin_at(keyword.line),
                message: format!("include of '{}' did not produce an object", name),
            });
        };
        for (key, value) in object.iter() {
            let merged = match values.get(key) {
                Some(existing) => value.with_fallback(existing),
                None => value.clone(),
            };
            values.insert(key.to_string(), merged);
        }
        Ok(())
    }

    fn full_current_path(&self) -> Result<Path> {
        Path::from_keys(self.path_stack.iter().flat_map(|p| p.keys().iter().cloned()))
            .ok_or_else(|| ConfigError::bug("asked for the current path at the root"))
    }

    fn previous_field_name(&self, last_path: Option<&Path>) -> Option<String> {
        last_path.or_else(|| self.path_stack.last()).map(Path::render)
    }

    fn add_key_name(&self, message: &str) -> String {
        match self.previous_field_name(None) {
            Some(name) => format!("in value for key '{}': {}", name, message),
            None => message.to_string(),
        }
    }

    fn add_quote_suggestion(
        &self,
        last_path: Option<&Path>,
        inside_equals: bool,
        bad_token: &str,
        message: &str,
    ) -> String {
        let previous = self.previous_field_name(last_path);
        let part = if bad_token == TokenKind::End.to_string() {
            match previous {
                Some(name) => format!(
                    "{} (if you intended '{}' to be part of a value, instead of a key, try adding double quotes around the whole value",
                    message, name
                ),
                None => return message.to_string(),
            }
        } else {
            match previous {
                Some(name) => format!(
                    "{} (if you intended {} to be part of the value for '{}', try enclosing the value in double quotes",
                    message, bad_token, name
                ),
                None => format!(
                    "{} (if you intended {} to be part of a key or string value, try enclosing the key or value in double quotes",
                    message, bad_token
                ),
            }
        };
        if inside_equals {
            format!(
                "{}, or you may be able to rename the file .properties rather than .conf)",
                part
            )
        } else {
            format!("{})", part)
        }
    }
}

/// `{a: {b: value}}` for the path `a.b`. Only the value keeps its comments.
fn value_under_path(path: &Path, value: Value) -> Value {
    let origin = value.origin().with_comments(Vec::new());
    path.keys().iter().rev().fold(value, |inner, key| {
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(key.clone(), inner);
        Value::object(origin.clone(), entries)
    })
}

fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::UnquotedText(text) => text.clone(),
        TokenKind::Value(Literal::String(text)) => format!("\"{}\"", text),
        TokenKind::Value(literal) => literal.as_text(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests;
