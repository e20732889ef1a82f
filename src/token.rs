use std::fmt;
use std::ops::{Index, Range};

/// A single lexical unit of a Buffalo program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any text that is not part of a recognised literal, whitespace-trimmed.
    Comment(String),
    /// `Buffalo`
    WordUpper,
    /// `buffalo`
    WordLower,
    /// `.`
    Output,
    /// `(`
    LoopBegin,
    /// `)`
    LoopEnd,
}

/// Payload-free discriminant of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    WordUpper,
    WordLower,
    Output,
    LoopBegin,
    LoopEnd,
}

impl TokenKind {
    /// The kinds that have a fixed source literal, in the order the tokenizer tries them.
    pub const LITERALS: [TokenKind; 5] = [
        TokenKind::WordUpper,
        TokenKind::WordLower,
        TokenKind::Output,
        TokenKind::LoopBegin,
        TokenKind::LoopEnd,
    ];

    /// The source literal for this kind; `None` for comments.
    pub fn literal(self) -> Option<&'static str> {
        match self {
            TokenKind::Comment => None,
            TokenKind::WordUpper => Some("Buffalo"),
            TokenKind::WordLower => Some("buffalo"),
            TokenKind::Output => Some("."),
            TokenKind::LoopBegin => Some("("),
            TokenKind::LoopEnd => Some(")"),
        }
    }

    /// Build the unit token for a literal kind.
    pub(crate) fn to_token(self) -> Option<Token> {
        match self {
            TokenKind::Comment => None,
            TokenKind::WordUpper => Some(Token::WordUpper),
            TokenKind::WordLower => Some(Token::WordLower),
            TokenKind::Output => Some(Token::Output),
            TokenKind::LoopBegin => Some(Token::LoopBegin),
            TokenKind::LoopEnd => Some(Token::LoopEnd),
        }
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Comment(_) => TokenKind::Comment,
            Token::WordUpper => TokenKind::WordUpper,
            Token::WordLower => TokenKind::WordLower,
            Token::Output => TokenKind::Output,
            Token::LoopBegin => TokenKind::LoopBegin,
            Token::LoopEnd => TokenKind::LoopEnd,
        }
    }

    /// The source text this token stands for.
    pub fn text(&self) -> &str {
        match self {
            Token::Comment(text) => text,
            other => other.kind().literal().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comment(text) => write!(f, "Comment {text:?}"),
            Token::WordUpper => write!(f, "WordUpper"),
            Token::WordLower => write!(f, "WordLower"),
            Token::Output => write!(f, "Output"),
            Token::LoopBegin => write!(f, "LoopBegin"),
            Token::LoopEnd => write!(f, "LoopEnd"),
        }
    }
}

/// An ordered sequence of tokens; insertion order is execution order.
///
/// Programs produced by [`crate::tokenize`] also remember the byte span of the
/// source each token came from. Programs assembled from a bare `Vec<Token>`
/// carry no spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    tokens: Vec<Token>,
    spans: Vec<Range<usize>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_spanned(&mut self, token: Token, span: Range<usize>) {
        self.tokens.push(token);
        self.spans.push(span);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn kind(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(Token::kind)
    }

    /// Byte range in the original source for the token at `index`, if known.
    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    /// True when at least one token does something other than comment.
    pub fn has_instructions(&self) -> bool {
        self.tokens.iter().any(|t| t.kind() != TokenKind::Comment)
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl From<Vec<Token>> for Program {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens, spans: Vec::new() }
    }
}

impl FromIterator<Token> for Program {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Index<usize> for Program {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Renders the program back to source by concatenating each token's text.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            f.write_str(token.text())?;
        }
        Ok(())
    }
}
