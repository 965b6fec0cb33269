//! The character-stream tokenizer: turns source text into an ordered
//! sequence of classified tokens under a configurable lexical policy.

use std::rc::Rc;

use crate::error::SyntaxError;
use crate::token::{Token, TokenClass};

/// The lexical policy in force. A real `evaluate` call always uses
/// [`LexPolicy::default`]; the struct exists so the tokenizer's contract
/// ("given source text and a lexical policy") is expressed literally
/// rather than hard-coded.
pub struct LexPolicy {
    pub blanks: &'static str,
    pub newlines: &'static str,
    pub single_char_ops: &'static str,
    pub word_ops: &'static [&'static str],
    pub string_delim: char,
    pub escape: char,
    pub line_comment: char,
}

impl Default for LexPolicy {
    fn default() -> Self {
        LexPolicy {
            blanks: " \t\r",
            newlines: "\n",
            single_char_ops: ".+-*/^,\\=\";:<>?'",
            word_ops: &[
                "bxor", "band", "bshr", "bshl", "bor", "mod", "div", "xor", "and", "or", "++",
                "--", "<>", "<=", ">=",
            ],
            string_delim: '"',
            escape: '\\',
            line_comment: '\'',
        }
    }
}

pub struct Lexer<'p> {
    chars: Vec<char>,
    pos: usize,
    source: Rc<str>,
    policy: &'p LexPolicy,
}

impl<'p> Lexer<'p> {
    pub fn new(source: &str, policy: &'p LexPolicy) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            source: Rc::from(source),
            policy,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        while self.pos < self.chars.len() {
            tokens.push(self.next_token()?);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let c = self.chars[start];

        if c == self.policy.string_delim {
            return self.scan_string(start);
        }
        if c == self.policy.line_comment {
            return Ok(self.scan_line_comment(start));
        }
        if let Some(tok) = self.try_word_operator(start) {
            return Ok(tok);
        }
        if self.policy.single_char_ops.contains(c) {
            self.pos += 1;
            return Ok(self.token(c.to_string(), TokenClass::Operator, start));
        }
        if c == '(' {
            self.pos += 1;
            return Ok(self.token("(", TokenClass::SubexpBegin, start));
        }
        if c == ')' {
            self.pos += 1;
            return Ok(self.token(")", TokenClass::SubexpEnd, start));
        }
        if c == '[' {
            self.pos += 1;
            return Ok(self.token("[", TokenClass::SubscrBegin, start));
        }
        if c == ']' {
            self.pos += 1;
            return Ok(self.token("]", TokenClass::SubscrEnd, start));
        }
        if c.is_ascii_digit() {
            return Ok(self.scan_number(start));
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier(start));
        }
        if self.policy.blanks.contains(c) {
            self.pos += 1;
            return Ok(self.token(c.to_string(), TokenClass::Blank, start));
        }
        if self.policy.newlines.contains(c) {
            self.pos += 1;
            return Ok(self.token(c.to_string(), TokenClass::Newline, start));
        }

        Err(SyntaxError::new(
            format!("unexpected character '{c}'"),
            start,
            self.source.as_ref(),
        ))
    }

    fn token(&self, text: impl Into<String>, class: TokenClass, position: usize) -> Token {
        Token::new(text, class, position, self.source.clone())
    }

    fn try_word_operator(&mut self, start: usize) -> Option<Token> {
        for word in self.policy.word_ops {
            let len = word.chars().count();
            if start + len > self.chars.len() {
                continue;
            }
            let candidate: String = self.chars[start..start + len].iter().collect();
            if !candidate.eq_ignore_ascii_case(word) {
                continue;
            }
            let is_word_like = word.chars().next().unwrap().is_alphabetic();
            if is_word_like {
                // Word-shaped operators (and, or, mod, ...) must not be a
                // prefix of a longer identifier (e.g. "andy").
                if let Some(&next) = self.chars.get(start + len) {
                    if next.is_alphanumeric() || next == '_' || next == '.' {
                        continue;
                    }
                }
            }
            self.pos = start + len;
            return Some(self.token(candidate, TokenClass::Operator, start));
        }
        None
    }

    fn scan_string(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let delim = self.policy.string_delim;
        let escape = self.policy.escape;
        let mut i = start + 1;
        let mut text = String::new();
        loop {
            match self.chars.get(i) {
                None => {
                    return Err(SyntaxError::new(
                        "unterminated string literal",
                        start,
                        self.source.as_ref(),
                    ))
                }
                Some(&c) if c == escape => {
                    i += 1;
                    match self.chars.get(i) {
                        Some(&next) => {
                            text.push(next);
                            i += 1;
                        }
                        None => {
                            return Err(SyntaxError::new(
                                "unterminated string literal",
                                start,
                                self.source.as_ref(),
                            ))
                        }
                    }
                }
                Some(&c) if c == delim => {
                    i += 1;
                    break;
                }
                Some(&c) => {
                    text.push(c);
                    i += 1;
                }
            }
        }
        self.pos = i;
        Ok(self.token(text, TokenClass::StringLiteral, start))
    }

    fn scan_line_comment(&mut self, start: usize) -> Token {
        let mut i = start + 1;
        while i < self.chars.len() && !self.policy.newlines.contains(self.chars[i]) {
            i += 1;
        }
        let text: String = self.chars[start..i].iter().collect();
        self.pos = i;
        self.token(text, TokenClass::LineComment, start)
    }

    /// Scans a numeric literal. Deliberately does not consume a sign after
    /// `E`/`e`: `1E-3` tokenizes as `1E`, `-`, `3`, repaired by the
    /// compiler's fix-real-numbers pass.
    fn scan_number(&mut self, start: usize) -> Token {
        let mut i = start;
        let mut is_real = false;
        while i < self.chars.len() && self.chars[i].is_ascii_digit() {
            i += 1;
        }
        if self.chars.get(i) == Some(&'.') {
            is_real = true;
            i += 1;
            while i < self.chars.len() && self.chars[i].is_ascii_digit() {
                i += 1;
            }
        }
        if matches!(self.chars.get(i), Some('e') | Some('E')) {
            is_real = true;
            i += 1;
            while i < self.chars.len() && self.chars[i].is_ascii_digit() {
                i += 1;
            }
        }
        let text: String = self.chars[start..i].iter().collect();
        self.pos = i;
        let class = if is_real { TokenClass::Real } else { TokenClass::Integral };
        self.token(text, class, start)
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        let mut i = start + 1;
        let mut seen_dot = false;
        while i < self.chars.len() {
            let c = self.chars[i];
            if c.is_alphanumeric() || c == '_' {
                i += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                i += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..i].iter().collect();
        self.pos = i;
        self.token(text, TokenClass::Identifier, start)
    }
}
