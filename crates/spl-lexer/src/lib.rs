//! SPL lexer: converts source text into tokens.
//!
//! The alphabet is deliberately small: seven punctuators, keyword words,
//! lowercase identifiers, unsigned integers without leading zeros, and
//! double-quoted strings of at most fifteen alphanumeric characters.

use spl_syntax::error::{error_at, Result};
use spl_syntax::token::{Token, TokenKind};

/// Longest allowed string literal body.
const MAX_STRING_LEN: usize = 15;

/// Streaming character scanner that produces tokens with positions.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn punct_kind(c: char) -> Option<TokenKind> {
        let kind = match c {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ';' => TokenKind::Semi,
            '=' => TokenKind::Assign,
            '>' => TokenKind::Gt,
            _ => return None,
        };
        Some(kind)
    }

    /// String literal: `"` already consumed by the caller's peek; reads the
    /// opening quote, 0..=15 alphanumeric characters, and the closing quote.
    fn read_string(&mut self, line: usize, col: usize) -> Result<Token> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(Token {
                        kind: TokenKind::Str(s.clone()),
                        lexeme: s,
                        line,
                        col,
                    });
                }
                Some(c) if c.is_ascii_alphanumeric() => {
                    if s.len() == MAX_STRING_LEN {
                        return error_at(
                            line,
                            col,
                            format!("String literal longer than {} characters", MAX_STRING_LEN),
                        );
                    }
                    s.push(c);
                    self.advance();
                }
                Some(c) => {
                    return error_at(
                        line,
                        col,
                        format!("Invalid character '{}' in string literal (alphanumeric only)", c),
                    );
                }
                None => return error_at(line, col, "Unterminated string literal"),
            }
        }
    }

    /// Number: a lone `0` or `[1-9][0-9]*`; `0` followed by a digit is an error.
    fn read_number(&mut self, line: usize, col: usize) -> Result<Token> {
        let mut s = String::new();
        let first = self.advance().unwrap_or('0');
        s.push(first);
        if first == '0' {
            if let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    return error_at(line, col, "Number may not start with a leading zero");
                }
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let val: i64 = s
            .parse()
            .map_err(|_| spl_syntax::Error::at(line, col, "Number out of range"))?;
        Ok(Token {
            kind: TokenKind::Number(val),
            lexeme: s,
            line,
            col,
        })
    }

    /// Identifier or keyword: `[a-z][a-z0-9]*`.
    fn read_ident_or_keyword(&mut self, line: usize, col: usize) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&s).unwrap_or_else(|| TokenKind::Ident(s.clone()));
        Token {
            kind,
            lexeme: s,
            line,
            col,
        }
    }

    /// Produce the next token. Returns `Eof` at end of input; the lexer may
    /// keep being called after that and will keep returning `Eof`.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let line = self.line;
        let col = self.col;
        match self.peek() {
            None => Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line,
                col,
            }),
            Some(c) => {
                if let Some(kind) = Self::punct_kind(c) {
                    self.advance();
                    return Ok(Token {
                        kind,
                        lexeme: c.to_string(),
                        line,
                        col,
                    });
                }
                if c == '"' {
                    return self.read_string(line, col);
                }
                if c.is_ascii_digit() {
                    return self.read_number(line, col);
                }
                if c.is_ascii_lowercase() {
                    return Ok(self.read_ident_or_keyword(line, col));
                }
                error_at(line, col, format!("Unknown character '{}'", c))
            }
        }
    }

    /// Tokenize the entire input into a vector of tokens ending with `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tk = self.next_token()?;
            let done = tk.kind == TokenKind::Eof;
            tokens.push(tk);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let ks = kinds("glob main var return if else while do until print halt");
        assert_eq!(ks[0], TokenKind::Glob);
        assert_eq!(ks[1], TokenKind::Main);
        assert_eq!(ks[2], TokenKind::Var);
        assert_eq!(ks[3], TokenKind::Return);
        assert_eq!(ks[ks.len() - 2], TokenKind::Halt);
        assert_eq!(ks[ks.len() - 1], TokenKind::Eof);

        // similar-looking words are plain identifiers
        let ks = kinds("globe var1 eqeq plus1");
        for k in &ks[..4] {
            assert!(matches!(k, TokenKind::Ident(_)), "expected ident, got {:?}", k);
        }
    }

    #[test]
    fn operator_words_and_gt() {
        let ks = kinds("neg not eq or and plus minus mult div >");
        assert_eq!(
            &ks[..10],
            &[
                TokenKind::Neg,
                TokenKind::Not,
                TokenKind::Eq,
                TokenKind::Or,
                TokenKind::And,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Mult,
                TokenKind::Div,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("{ } ( ) ; ="),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("0 7 42 999"),
            vec![
                TokenKind::Number(0),
                TokenKind::Number(7),
                TokenKind::Number(42),
                TokenKind::Number(999),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn leading_zero_is_rejected() {
        assert!(Lexer::new("01").tokenize().is_err());
        assert!(Lexer::new("10").tokenize().is_ok());
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds("\"OK\" \"abc123\" \"\""),
            vec![
                TokenKind::Str("OK".into()),
                TokenKind::Str("abc123".into()),
                TokenKind::Str("".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_limits() {
        let fifteen = "A".repeat(15);
        assert_eq!(
            kinds(&format!("\"{}\"", fifteen))[0],
            TokenKind::Str(fifteen)
        );
        // sixteen characters fails
        assert!(Lexer::new("\"ABCDEFGHIJKLMNOP\"").tokenize().is_err());
        // non-alphanumeric content fails
        assert!(Lexer::new("\"ab_cd\"").tokenize().is_err());
        assert!(Lexer::new("\"two words\"").tokenize().is_err());
        // unterminated fails
        assert!(Lexer::new("\"open").tokenize().is_err());
    }

    #[test]
    fn positions_are_tracked() {
        let toks = Lexer::new("glob  { \n  x   \n}\n").tokenize().unwrap();
        assert_eq!((toks[0].line, toks[0].col), (1, 1));
        assert_eq!(toks[1].kind, TokenKind::LBrace);
        assert_eq!(toks[1].line, 1);
        assert_eq!(toks[2].lexeme, "x");
        assert_eq!((toks[2].line, toks[2].col), (2, 3));
        assert_eq!(toks[3].kind, TokenKind::RBrace);
        assert_eq!((toks[3].line, toks[3].col), (3, 1));
    }

    #[test]
    fn unknown_character_reports_position() {
        let err = Lexer::new("x ?").tokenize().unwrap_err();
        assert!(err.msg.contains("Unknown character '?'"));
        assert_eq!(err.span, Some((1, 3)));
    }

    #[test]
    fn uppercase_cannot_start_identifiers() {
        assert!(Lexer::new("Xy").tokenize().is_err());
    }
}
