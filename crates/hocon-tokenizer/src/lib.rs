//! A tokenizer for HOCON and strict JSON.

mod span;
pub use span::Span;

mod token;
pub use token::{Literal, Token, TokenKind, is_whitespace};

mod tokenizer;
pub use tokenizer::{Syntax, Tokenizer, tokenize};
