//! Lexer implementation using logos

mod token;

pub use token::{KEYWORDS, Token, TokenKind};

use crate::ast::Span;
use logos::Logos;

/// Maps byte offsets to 1-based line/column pairs
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// Line and character column of `offset`
    pub fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line];
        let column = source
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        (line + 1, column + 1)
    }
}

/// Tokenize source code
///
/// Never fails: unrecognised input becomes an [`TokenKind::Illegal`] token
/// and the stream always ends with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Vec<Token> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let slice = lexer.slice();
        let (line, column) = index.position(source, range.start);
        let span = Span::from(range);

        let (kind, literal) = match result {
            Ok(TokenKind::StringLit) => (TokenKind::StringLit, &slice[1..slice.len() - 1]),
            Ok(TokenKind::CharLit) => (TokenKind::CharLit, &slice[1..slice.len() - 1]),
            Ok(kind) => (kind, slice),
            Err(()) => (TokenKind::Illegal, slice),
        };
        tokens.push(Token::new(kind, literal, line, column, span));
    }

    let (line, column) = index.position(source, source.len());
    tokens.push(Token::new(
        TokenKind::Eof,
        "",
        line,
        column,
        Span::new(source.len(), source.len()),
    ));
    tokens
}
