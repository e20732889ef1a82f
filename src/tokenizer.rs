//! Suffix-matching tokenizer for Buffalo source text.
//!
//! Characters accumulate in a buffer. After every character the buffer's
//! trailing edge is tested against each literal (`Buffalo`, `buffalo`, `.`,
//! `(`, `)`). On a match, whatever precedes the literal is trimmed and, when
//! non-empty, emitted as a comment before the literal's token; then the buffer
//! is cleared.
//!
//! Text left in the buffer when the input ends is dropped, not flushed as a
//! trailing comment.

use crate::token::{Program, Token, TokenKind};

/// Incremental tokenizer state. Feed characters with [`Tokenizer::push`].
#[derive(Debug, Default)]
pub struct Tokenizer {
    buffer: String,
    // Byte offset in the source where `buffer` starts.
    buffer_start: usize,
    program: Program,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `ch`, found at byte offset `offset` of the source, and test for a literal.
    pub fn push(&mut self, offset: usize, ch: char) {
        if self.buffer.is_empty() {
            self.buffer_start = offset;
        }
        self.buffer.push(ch);

        for kind in TokenKind::LITERALS {
            let Some(literal) = kind.literal() else { continue };
            if literal.len() > self.buffer.len() || !self.buffer.ends_with(literal) {
                continue;
            }

            let split = self.buffer.len() - literal.len();
            if split > 0 {
                let prefix = &self.buffer[..split];
                let comment = prefix.trim();
                if !comment.is_empty() {
                    let lead = prefix.len() - prefix.trim_start().len();
                    let start = self.buffer_start + lead;
                    self.program.push_spanned(
                        Token::Comment(comment.to_string()),
                        start..start + comment.len(),
                    );
                }
            }

            if let Some(token) = kind.to_token() {
                let start = self.buffer_start + split;
                self.program.push_spanned(token, start..start + literal.len());
            }
            self.buffer.clear();
            return;
        }
    }

    /// Text accumulated since the last recognised literal.
    pub fn pending_text(&self) -> &str {
        &self.buffer
    }

    /// Finish tokenizing. Any pending text is discarded.
    pub fn finish(self) -> Program {
        self.program
    }
}

/// Segment `source` into a [`Program`]. Never fails.
pub fn tokenize(source: &str) -> Program {
    let mut tokenizer = Tokenizer::new();
    for (offset, ch) in source.char_indices() {
        tokenizer.push(offset, ch);
    }
    tokenizer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).iter().map(Token::kind).collect()
    }

    #[test]
    fn whitespace_between_words_is_not_a_comment() {
        let program = tokenize("Buffalo Buffalo.");
        assert_eq!(
            program.tokens(),
            &[Token::WordUpper, Token::WordUpper, Token::Output]
        );
    }

    #[test]
    fn text_before_a_literal_becomes_a_trimmed_comment() {
        let program = tokenize("  hello world  buffalo");
        assert_eq!(
            program.tokens(),
            &[Token::Comment("hello world".to_string()), Token::WordLower]
        );
    }

    #[test]
    fn comment_spans_point_at_trimmed_text() {
        let source = "  note (";
        let program = tokenize(source);
        let span = program.span(0).expect("comment span");
        assert_eq!(&source[span], "note");
        let span = program.span(1).expect("loop span");
        assert_eq!(&source[span], "(");
    }

    #[test]
    fn literal_spans_cover_the_literal() {
        let source = "xx Buffalo yy buffalo.";
        let program = tokenize(source);
        let texts: Vec<&str> = (0..program.len())
            .map(|i| &source[program.span(i).unwrap()])
            .collect();
        assert_eq!(texts, vec!["xx", "Buffalo", "yy", "buffalo", "."]);
    }

    #[test]
    fn trailing_text_is_dropped() {
        assert_eq!(kinds("Buffalo trailing words"), vec![TokenKind::WordUpper]);
        assert!(tokenize("no literals here").is_empty());
    }

    #[test]
    fn only_trailing_edge_matches() {
        // "Buffal" never completes, so the `o` and the following text keep accumulating
        // until the `.` closes the buffer.
        let program = tokenize("Buffal o.");
        assert_eq!(
            program.tokens(),
            &[Token::Comment("Buffal o".to_string()), Token::Output]
        );
    }

    #[test]
    fn case_decides_the_word() {
        assert_eq!(
            kinds("buffaloBuffalo"),
            vec![TokenKind::WordLower, TokenKind::WordUpper]
        );
        assert_eq!(kinds("BUFFALO."), vec![TokenKind::Comment, TokenKind::Output]);
    }

    #[test]
    fn delimiters_are_recognised_without_separators() {
        assert_eq!(
            kinds("Buffalo Buffalo(buffalo buffalo)."),
            vec![
                TokenKind::WordUpper,
                TokenKind::WordUpper,
                TokenKind::LoopBegin,
                TokenKind::WordLower,
                TokenKind::WordLower,
                TokenKind::LoopEnd,
                TokenKind::Output,
            ]
        );
    }

    #[test]
    fn multibyte_comments_are_kept_intact() {
        let source = "héllo wörld.";
        let program = tokenize(source);
        assert_eq!(program[0], Token::Comment("héllo wörld".to_string()));
        assert_eq!(&source[program.span(1).unwrap()], ".");
    }

    #[test]
    fn rendering_and_retokenizing_keeps_structure() {
        let source = "Say Buffalo buffalo, then (Buffalo) and . done";
        let program = tokenize(source);
        let again = tokenize(&program.to_string());
        let kinds_of = |p: &Program| p.iter().map(Token::kind).collect::<Vec<_>>();
        assert_eq!(kinds_of(&program), kinds_of(&again));
    }

    #[test]
    fn pending_text_is_visible_before_finish() {
        let mut tokenizer = Tokenizer::new();
        for (offset, ch) in "Buffalo ab".char_indices() {
            tokenizer.push(offset, ch);
        }
        assert_eq!(tokenizer.pending_text(), " ab");
        assert_eq!(tokenizer.finish().len(), 1);
    }

    #[test]
    fn tokenize_never_fails_on_odd_input() {
        for source in ["", " ", ")))(((", "\u{0}\u{ffff}", "Buffalo\nbuffalo\t.\r\n"] {
            let _ = tokenize(source);
        }
    }
}
