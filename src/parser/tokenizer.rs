// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer for parameter strings
//!
//! Splits the input into text runs and the structural characters of the
//! reference grammar. Whether a structural token is meaningful depends on
//! where the compiler is (top level, identifier, argument), so the tokenizer
//! never fails: every byte of the input belongs to exactly one token.
//!
//! All structural characters are ASCII, so text runs are always sliced on
//! UTF-8 boundaries.
//!
//! Backslash pairs are tokenized everywhere, but only inside function
//! arguments do they all act as escapes. At top level only `\${` does.

use super::span::Spanned;

/// Token with zero-copy text slices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'input> {
    /// Run of ordinary characters
    Text(&'input str),
    /// Backslash pair (`\$`, `\,`, `\\`); the compiler decides whether it escapes
    Escaped(char),
    /// Opening `${`
    ReferenceStart,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `}`
    RightBrace,
}

impl Token<'_> {
    /// First character of the token as written in the source
    pub fn first_char(&self) -> char {
        match self {
            Token::Text(text) => text.chars().next().unwrap_or(' '),
            Token::Escaped(_) => '\\',
            Token::ReferenceStart => '$',
            Token::LeftParen => '(',
            Token::RightParen => ')',
            Token::Comma => ',',
            Token::RightBrace => '}',
        }
    }
}

/// Characters that may follow a backslash to form an escape
#[inline]
fn is_escapable(b: u8) -> bool {
    matches!(b, b'$' | b',' | b'\\')
}

/// Tokenizer over one input string
pub struct Tokenizer<'input> {
    input: &'input str,
    position: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer
    pub fn new(input: &'input str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the whole input
    pub fn tokenize_all(input: &'input str) -> Vec<Spanned<Token<'input>>> {
        Tokenizer::new(input).collect()
    }

    /// Check whether a structural token starts at byte offset `at`
    #[inline]
    fn structural_at(&self, at: usize) -> bool {
        let bytes = self.input.as_bytes();
        match bytes[at] {
            b'(' | b')' | b',' | b'}' => true,
            b'$' => bytes.get(at + 1) == Some(&b'{'),
            b'\\' => bytes.get(at + 1).copied().is_some_and(is_escapable),
            _ => false,
        }
    }

    /// Produce the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Spanned<Token<'input>>> {
        let bytes = self.input.as_bytes();
        let start = self.position;
        if start >= bytes.len() {
            return None;
        }

        let (token, len) = match bytes[start] {
            b'(' => (Token::LeftParen, 1),
            b')' => (Token::RightParen, 1),
            b',' => (Token::Comma, 1),
            b'}' => (Token::RightBrace, 1),
            b'$' if bytes.get(start + 1) == Some(&b'{') => (Token::ReferenceStart, 2),
            b'\\' if bytes.get(start + 1).copied().is_some_and(is_escapable) => {
                (Token::Escaped(char::from(bytes[start + 1])), 2)
            }
            _ => {
                let mut end = start + 1;
                while end < bytes.len() && !self.structural_at(end) {
                    end += 1;
                }
                (Token::Text(&self.input[start..end]), end - start)
            }
        };

        self.position = start + len;
        Some(Spanned::new(token, start, start + len))
    }
}

impl<'input> Iterator for Tokenizer<'input> {
    type Item = Spanned<Token<'input>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
