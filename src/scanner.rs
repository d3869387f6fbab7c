//! Module `scanner` implements a one‑pass lexer for the language.
//!
//! It transforms source text into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. The scanner
//! can be driven two ways:
//!
//! - as a `FusedIterator` yielding `Result<Token, LoxError>`, where scan errors
//!   are interleaved with tokens in source order;
//! - through [`Scanner::scan_tokens`], which drains the iterator once, caches the
//!   tokens, records every error in [`Scanner::errors`] and returns the cached
//!   slice on every later call.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `/`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - `//` comments run to end of line (skipped with `memchr`).
//! - String literals: `"` … `"`, may span lines, no escape sequences.
//! - Numeric literals: a digit followed by a maximal alphanumeric run, then an
//!   optional `.` and another maximal alphanumeric run. The whole lexeme must
//!   convert to `f64`, otherwise an error is recorded (`1a` is one bad lexeme,
//!   not a number followed by an identifier).
//! - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//! - Any other character is reported and skipped.
//!
//! # Example
//!
//! ```rust
//! use treelox::scanner::Scanner;
//!
//! let mut scanner = Scanner::new("print 123; // example");
//! for token in scanner.scan_tokens() {
//!     println!("{}", token);
//! }
//! assert!(!scanner.had_error());
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass scanner that converts source text into [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize,                                // index of the *first* byte of the current lexeme
    curr: usize,                                 // index *one past* the last byte examined
    line: usize,                                 // 1‑based line counter (\n increments)
    pending: Option<(TokenType, Option<Literal>)>, // recognised token waiting to be emitted
    tokens: Vec<Token>,
    errors: Vec<LoxError>,
    scanned: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            tokens: Vec::new(),
            errors: Vec::new(),
            scanned: false,
        }
    }

    // ───────────────────────────── batch API ────────────────────────────────

    /// Scan the whole source once and return the cached tokens.
    ///
    /// Errors do not stop the scan; they are collected in [`errors`](Self::errors).
    /// Calling this again returns the same slice without rescanning.
    pub fn scan_tokens(&mut self) -> &[Token] {
        if !self.scanned {
            while let Some(result) = self.next() {
                match result {
                    Ok(token) => self.tokens.push(token),
                    Err(e) => {
                        debug!("Recording scan error: {}", e);

                        self.errors.push(e);
                    }
                }
            }

            self.scanned = true;

            info!(
                "Scan finished: {} tokens, {} errors",
                self.tokens.len(),
                self.errors.len()
            );
        }

        &self.tokens
    }

    /// Errors recorded by [`scan_tokens`](Self::scan_tokens).
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Scan (if not done yet) and hand back the tokens and recorded errors.
    pub fn into_parts(mut self) -> (Vec<Token>, Vec<LoxError>) {
        self.scan_tokens();

        (self.tokens, self.errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn skip_alphanumeric(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.src[self.start..self.curr]
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  If it produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.pending = Some((TokenType::LEFT_PAREN, None)),
            b')' => self.pending = Some((TokenType::RIGHT_PAREN, None)),
            b'{' => self.pending = Some((TokenType::LEFT_BRACE, None)),
            b'}' => self.pending = Some((TokenType::RIGHT_BRACE, None)),
            b',' => self.pending = Some((TokenType::COMMA, None)),
            b'.' => self.pending = Some((TokenType::DOT, None)),
            b'-' => self.pending = Some((TokenType::MINUS, None)),
            b'+' => self.pending = Some((TokenType::PLUS, None)),
            b';' => self.pending = Some((TokenType::SEMICOLON, None)),
            b'*' => self.pending = Some((TokenType::STAR, None)),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some((tt, None));
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some((tt, None));
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.pending = Some((tt, None));
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.pending = Some((tt, None));
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // The newline itself is left for the main loop so the
                    // line counter stays in one place.
                    if let Some(pos) = memchr(b'\n', &self.bytes()[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                self.pending = Some((TokenType::SLASH, None));
            }

            b'"' => {
                return self.parse_string();
            }

            b'0'..=b'9' => {
                return self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                // Step over the whole character so multi‑byte input reports once.
                let ch: char = self.src[self.start..].chars().next().unwrap_or(b as char);
                self.curr = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        }

        Ok(())
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * On success `self.curr` points **past** the closing `"`.
    /// * Unterminated strings swallow the rest of the input.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let value: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some((TokenType::STRING, Some(Literal::Str(value.to_owned()))));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).
    fn parse_number(&mut self) -> Result<()> {
        self.skip_alphanumeric();

        if self.peek() == b'.' {
            self.advance();
            self.skip_alphanumeric();
        }

        let lexeme: &str = self.lexeme();

        match lexeme.parse::<f64>() {
            Ok(n) => {
                self.pending = Some((TokenType::NUMBER, Some(Literal::Number(n))));
                Ok(())
            }

            Err(_) => Err(LoxError::lex(
                self.line,
                format!("Invalid number literal: {}", lexeme),
            )),
        }
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        self.skip_alphanumeric();

        let tt: TokenType = KEYWORDS
            .get(self.lexeme().as_bytes())
            .copied()
            .unwrap_or(TokenType::IDENTIFIER);

        let literal: Option<Literal> = match tt {
            TokenType::TRUE => Some(Literal::Bool(true)),
            TokenType::FALSE => Some(Literal::Bool(false)),
            _ => None,
        };

        self.pending = Some((tt, literal));
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // Emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::eof(self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some((tt, literal)) = self.pending.take() {
                return Some(Ok(Token::new(tt, self.lexeme(), literal, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
