//! Lexer/tokenizer for the query language.

use winnow::ascii::Caseless;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{any, literal, one_of, take_while};

use super::token::{Token, TokenKind};

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn skip_whitespace(input: &mut &str) -> PResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

/// Lex a number literal. `.` and `,` are kept as part of the literal; whether
/// it is a valid number is decided when it is compared.
fn lex_number(input: &mut &str) -> PResult<TokenKind> {
    (
        one_of(|c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| c.is_ascii_digit() || c == '.' || c == ','),
    )
        .value(TokenKind::Number)
        .parse_next(input)
}

/// Lex the AND/OR keywords.
/// Only the leading letters are tested, so `ORflag` yields OR and leaves `flag`.
fn lex_keyword(input: &mut &str) -> PResult<TokenKind> {
    alt((
        literal(Caseless("and")).value(TokenKind::And),
        literal(Caseless("or")).value(TokenKind::Or),
    ))
    .parse_next(input)
}

/// Lex an identifier: a letter followed by letters and colons.
fn lex_ident(input: &mut &str) -> PResult<TokenKind> {
    (
        one_of(|c: char| c.is_alphabetic()),
        take_while(0.., |c: char| c.is_alphabetic() || c == ':'),
    )
        .value(TokenKind::Ident)
        .parse_next(input)
}

/// Any other single character.
fn lex_illegal(input: &mut &str) -> PResult<TokenKind> {
    any.value(TokenKind::Illegal).parse_next(input)
}

/// Lex the kind of a single token.
fn lex_kind(input: &mut &str) -> PResult<TokenKind> {
    alt((
        // Two-character operators first
        "!=".value(TokenKind::NotEqual),
        "<=".value(TokenKind::LessOrEqual),
        ">=".value(TokenKind::GreaterOrEqual),
        // Single-character operators
        "=".value(TokenKind::Equals),
        "<".value(TokenKind::Less),
        ">".value(TokenKind::Greater),
        "!".value(TokenKind::Not),
        "(".value(TokenKind::LeftParen),
        ")".value(TokenKind::RightParen),
        lex_number,
        // Keywords before identifiers; a failed keyword match backtracks
        lex_keyword,
        lex_ident,
        lex_illegal,
    ))
    .parse_next(input)
}

/// Pull-based lexer over a query string.
///
/// [`Lexer::next_token`] hands out one token per call and keeps returning
/// [`TokenKind::Eof`] once the input is exhausted. As an [`Iterator`] it
/// stops after the first EOF token.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    rest: &'a str,
    exhausted: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            rest: input,
            exhausted: false,
        }
    }

    /// Byte offset of the cursor.
    pub fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    pub fn next_token(&mut self) -> Token<'a> {
        // Never fails: zero or more whitespace characters.
        let _ = skip_whitespace(&mut self.rest);

        if self.rest.is_empty() {
            return Token {
                kind: TokenKind::Eof,
                position: self.input.len(),
                text: "",
            };
        }

        let before = self.rest;
        let kind = match lex_kind(&mut self.rest) {
            Ok(kind) => kind,
            // lex_illegal accepts any character, so this only triggers on a
            // broken invariant; consume the rest rather than loop forever.
            Err(_) => {
                self.rest = "";
                TokenKind::Illegal
            }
        };

        Token {
            kind,
            position: self.offset(),
            text: &before[..before.len() - self.rest.len()],
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.exhausted = true;
        }
        Some(token)
    }
}

/// Tokenize the entire input, ending with a single EOF token.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds_and_texts(input: &str) -> (Vec<TokenKind>, Vec<&str>) {
        tokenize(input).into_iter().map(|t| (t.kind, t.text)).unzip()
    }

    fn assert_lexes(input: &str, kinds: &[TokenKind], texts: &[&str]) {
        let (got_kinds, got_texts) = kinds_and_texts(input);
        assert_eq!(got_kinds, kinds, "{}", input);
        assert_eq!(got_texts, texts, "{}", input);
    }

    #[test]
    fn test_identifiers() {
        assert_lexes("variableName", &[Ident, Eof], &["variableName", ""]);
        assert_lexes("q:variableName", &[Ident, Eof], &["q:variableName", ""]);
    }

    #[test]
    fn test_keywords() {
        assert_lexes(
            "variableName AND test",
            &[Ident, And, Ident, Eof],
            &["variableName", "AND", "test", ""],
        );
        assert_lexes(
            "variableName OR test",
            &[Ident, Or, Ident, Eof],
            &["variableName", "OR", "test", ""],
        );
        assert_lexes("a and b Or c", &[Ident, And, Ident, Or, Ident, Eof], &[
            "a", "and", "b", "Or", "c", "",
        ]);
    }

    #[test]
    fn test_keyword_prefix_splits_identifier() {
        assert_lexes("ORflag", &[Or, Ident, Eof], &["OR", "flag", ""]);
        assert_lexes("ANDy", &[And, Ident, Eof], &["AND", "y", ""]);
        assert_lexes("order", &[Or, Ident, Eof], &["or", "der", ""]);
        assert_lexes("android", &[And, Ident, Eof], &["and", "roid", ""]);
    }

    #[test]
    fn test_keyword_lookalikes_stay_identifiers() {
        assert_lexes("abc", &[Ident, Eof], &["abc", ""]);
        assert_lexes("an", &[Ident, Eof], &["an", ""]);
        assert_lexes("anything", &[Ident, Eof], &["anything", ""]);
        assert_lexes("o", &[Ident, Eof], &["o", ""]);
        assert_lexes("operator", &[Ident, Eof], &["operator", ""]);
    }

    #[test]
    fn test_operators() {
        let cases = [
            ("variableName=b", Equals, "="),
            ("variableName>b", Greater, ">"),
            ("variableName<b", Less, "<"),
            ("variableName>=b", GreaterOrEqual, ">="),
            ("variableName<=b", LessOrEqual, "<="),
            ("variableName!=b", NotEqual, "!="),
        ];
        for (input, kind, text) in cases {
            assert_lexes(input, &[Ident, kind, Ident, Eof], &[
                "variableName",
                text,
                "b",
                "",
            ]);
        }
    }

    #[test]
    fn test_not_without_equals() {
        assert_lexes("!a", &[Not, Ident, Eof], &["!", "a", ""]);
        assert_lexes("! =", &[Not, Equals, Eof], &["!", "=", ""]);
    }

    #[test]
    fn test_numbers() {
        assert_lexes("variableName<1234", &[Ident, Less, Number, Eof], &[
            "variableName",
            "<",
            "1234",
            "",
        ]);
        assert_lexes("variableName<12.34", &[Ident, Less, Number, Eof], &[
            "variableName",
            "<",
            "12.34",
            "",
        ]);
        assert_lexes("variableName<12,34", &[Ident, Less, Number, Eof], &[
            "variableName",
            "<",
            "12,34",
            "",
        ]);
    }

    #[test]
    fn test_digits_end_identifiers() {
        assert_lexes("var1", &[Ident, Number, Eof], &["var", "1", ""]);
    }

    #[test]
    fn test_implicit_clauses() {
        assert_lexes(
            "a=b g>123",
            &[Ident, Equals, Ident, Ident, Greater, Number, Eof],
            &["a", "=", "b", "g", ">", "123", ""],
        );
    }

    #[test]
    fn test_complex_expression() {
        assert_lexes(
            "a=b g>123 AND (bla OR f != b) OR g",
            &[
                Ident, Equals, Ident, Ident, Greater, Number, And, LeftParen, Ident, Or, Ident,
                NotEqual, Ident, RightParen, Or, Ident, Eof,
            ],
            &[
                "a", "=", "b", "g", ">", "123", "AND", "(", "bla", "OR", "f", "!=", "b", ")",
                "OR", "g", "",
            ],
        );
    }

    #[test]
    fn test_illegal_characters_do_not_abort() {
        assert_lexes(
            "vari.able,Na(m)e<.1234",
            &[
                Ident, Illegal, Ident, Illegal, Ident, LeftParen, Ident, RightParen, Ident, Less,
                Illegal, Number, Eof,
            ],
            &[
                "vari", ".", "able", ",", "Na", "(", "m", ")", "e", "<", ".", "1234", "",
            ],
        );
    }

    #[test]
    fn test_offset_tracks_cursor() {
        let mut lexer = Lexer::new("ab AND c");
        assert_eq!(lexer.offset(), 0);
        lexer.next_token();
        assert_eq!(lexer.offset(), 2);
        lexer.next_token();
        assert_eq!(lexer.offset(), 6);
        assert_eq!(lexer.next_token().position, lexer.offset());
    }

    #[test]
    fn test_positions_are_end_offsets() {
        let positions: Vec<usize> = tokenize("a >= 5").iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 4, 6, 6]);

        let positions: Vec<usize> = tokenize("größe").iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![7, 7]);
    }

    #[test]
    fn test_unicode_whitespace_is_skipped() {
        assert_lexes("a\u{3000}\tb\n", &[Ident, Ident, Eof], &["a", "b", ""]);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next_token().kind, Ident);
        for _ in 0..3 {
            let token = lexer.next_token();
            assert_eq!(token.kind, Eof);
            assert_eq!(token.position, 1);
            assert_eq!(token.text, "");
        }
    }

    #[test]
    fn test_empty_input() {
        assert_lexes("", &[Eof], &[""]);
        assert_lexes("   ", &[Eof], &[""]);
    }
}
