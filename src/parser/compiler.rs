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

//! Recursive-descent compiler from raw strings to component sequences
//!
//! ```text
//! sequence  := (text | reference)*
//! reference := "${" identifier ( "(" argument ("," argument)* ")" )? "}"
//! argument  := (text | reference | "(" argument-text ")")*
//! ```
//!
//! Only bare identifiers may fall back to variable references; a call form
//! must name a registered function.

use super::span::Spanned;
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{Arguments, CompiledExpression, Component, FunctionCallData};
use crate::config::EngineConfig;
use crate::error::{CompileError, CompileResult};
use crate::registry::{FunctionInstance, FunctionRegistry};

const IDENTIFIER_EXPECTED: &str = "an identifier, '(' or '}'";

/// Compiles raw strings against a registry
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r FunctionRegistry,
    config: &'r EngineConfig,
}

impl<'r> Compiler<'r> {
    /// Create a compiler
    pub fn new(registry: &'r FunctionRegistry, config: &'r EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Compile `text`; empty or absent input yields an empty expression
    pub fn compile<'a>(
        &self,
        text: impl Into<Option<&'a str>>,
    ) -> CompileResult<CompiledExpression> {
        let text = text.into().unwrap_or_default();
        log::trace!("Compiling '{text}'");

        let mut parser = Parser {
            input: text,
            tokens: Tokenizer::tokenize_all(text),
            pos: 0,
            registry: self.registry,
            config: self.config,
        };
        let components = parser.parse_top_level()?;

        Ok(CompiledExpression::new(
            text.to_string(),
            components,
            self.config.static_caching,
        ))
    }
}

/// Accumulates adjacent literal runs into a single component
#[derive(Default)]
struct SequenceBuilder {
    components: Vec<Component>,
    literal: String,
}

impl SequenceBuilder {
    fn push_str(&mut self, text: &str) {
        self.literal.push_str(text);
    }

    fn push_char(&mut self, ch: char) {
        self.literal.push(ch);
    }

    fn push_component(&mut self, component: Component) {
        self.flush();
        self.components.push(component);
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.components
                .push(Component::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn finish(mut self) -> Vec<Component> {
        self.flush();
        self.components
    }
}

struct Parser<'r, 'input> {
    input: &'input str,
    tokens: Vec<Spanned<Token<'input>>>,
    pos: usize,
    registry: &'r FunctionRegistry,
    config: &'r EngineConfig,
}

impl<'input> Parser<'_, 'input> {
    fn peek(&self) -> Option<Spanned<Token<'input>>> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Spanned<Token<'input>>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset of the next token, or end of input
    fn offset(&self) -> usize {
        self.peek().map_or(self.input.len(), |t| t.start)
    }

    fn parse_top_level(&mut self) -> CompileResult<Vec<Component>> {
        let mut sequence = SequenceBuilder::default();

        while let Some(token) = self.advance() {
            match token.value {
                Token::ReferenceStart => {
                    let component = self.parse_reference(token.start, 1)?;
                    sequence.push_component(component);
                }
                Token::Text(text) => sequence.push_str(text),
                // Only `\${` is an escape here; other backslashes stay verbatim
                Token::Escaped('$') if self.input[token.end..].starts_with('{') => {
                    sequence.push_char('$')
                }
                Token::Escaped(ch) => {
                    sequence.push_char('\\');
                    sequence.push_char(ch);
                }
                // Structural characters are plain text outside a reference
                other => sequence.push_char(other.first_char()),
            }
        }

        Ok(sequence.finish())
    }

    /// Parse the reference whose `${` sits at `start`; `depth` counts enclosing references
    fn parse_reference(&mut self, start: usize, depth: usize) -> CompileResult<Component> {
        if depth > self.config.max_nesting_depth {
            return Err(CompileError::NestingTooDeep {
                limit: self.config.max_nesting_depth,
                position: start,
            });
        }

        let name = self.parse_identifier(start)?;
        match self.advance() {
            Some(Spanned {
                value: Token::RightBrace,
                ..
            }) => self.bare_reference(name, start),
            Some(Spanned {
                value: Token::LeftParen,
                start: paren,
                ..
            }) => self.call_reference(name, start, paren, depth),
            _ => Err(CompileError::UnterminatedReference { position: start }),
        }
    }

    /// Read the identifier up to (not including) the `(` or `}` that follows it
    fn parse_identifier(&mut self, start: usize) -> CompileResult<String> {
        let mut name = String::new();

        loop {
            let Some(token) = self.peek() else {
                return Err(CompileError::UnterminatedReference { position: start });
            };
            match token.value {
                Token::LeftParen | Token::RightBrace => break,
                Token::Text(text) => {
                    if let Some((i, found)) = text
                        .char_indices()
                        .find(|(_, c)| matches!(c, '$' | '{' | '\\'))
                    {
                        return Err(CompileError::UnexpectedCharacter {
                            found,
                            expected: IDENTIFIER_EXPECTED,
                            position: token.start + i,
                        });
                    }
                    name.push_str(text);
                }
                other => {
                    return Err(CompileError::UnexpectedCharacter {
                        found: other.first_char(),
                        expected: IDENTIFIER_EXPECTED,
                        position: token.start,
                    });
                }
            }
            self.pos += 1;
        }

        if name.is_empty() {
            return Err(CompileError::EmptyReference { position: start });
        }
        Ok(name)
    }

    /// `${name}`: a zero-argument call if registered, otherwise a variable
    fn bare_reference(&self, name: String, position: usize) -> CompileResult<Component> {
        let Some(factory) = self.registry.lookup(&name) else {
            return Ok(Component::VariableReference { name, position });
        };

        let instance = FunctionInstance::new(factory.create());
        instance.validate_arg_count(0, position)?;
        Ok(Component::FunctionCall(Box::new(FunctionCallData {
            key: name,
            arguments: Arguments::new(),
            instance,
            position,
        })))
    }

    /// `${name(...)}`: the opening `(` at `paren` has been consumed
    fn call_reference(
        &mut self,
        name: String,
        position: usize,
        paren: usize,
        depth: usize,
    ) -> CompileResult<Component> {
        let Some(factory) = self.registry.lookup(&name) else {
            return Err(CompileError::UnknownFunction { name, position });
        };

        let mut arguments = Arguments::new();
        loop {
            arguments.push(self.parse_argument(depth)?);
            match self.advance() {
                Some(Spanned {
                    value: Token::Comma,
                    ..
                }) => {}
                Some(Spanned {
                    value: Token::RightParen,
                    ..
                }) => break,
                _ => return Err(CompileError::UnbalancedParentheses { position: paren }),
            }
        }

        // `name()` is a call without arguments, not one empty argument
        if arguments.len() == 1 && arguments[0].raw_text().is_empty() {
            arguments.clear();
        }

        let instance = FunctionInstance::new(factory.create());
        instance.validate_arg_count(arguments.len(), position)?;

        match self.advance() {
            Some(Spanned {
                value: Token::RightBrace,
                ..
            }) => {}
            Some(token) => {
                return Err(CompileError::UnexpectedCharacter {
                    found: token.value.first_char(),
                    expected: "'}'",
                    position: token.start,
                });
            }
            None => return Err(CompileError::UnterminatedReference { position }),
        }

        Ok(Component::FunctionCall(Box::new(FunctionCallData {
            key: name,
            arguments,
            instance,
            position,
        })))
    }

    /// Parse one argument, stopping before the `,` or `)` that ends it
    fn parse_argument(&mut self, depth: usize) -> CompileResult<CompiledExpression> {
        let start = self.offset();
        let mut sequence = SequenceBuilder::default();
        let mut open_parens: Vec<usize> = Vec::new();

        while let Some(token) = self.peek() {
            match token.value {
                Token::Comma | Token::RightParen if open_parens.is_empty() => break,
                Token::ReferenceStart => {
                    self.pos += 1;
                    let component = self.parse_reference(token.start, depth + 1)?;
                    sequence.push_component(component);
                    continue;
                }
                Token::LeftParen => {
                    open_parens.push(token.start);
                    sequence.push_char('(');
                }
                Token::RightParen => {
                    open_parens.pop();
                    sequence.push_char(')');
                }
                Token::Text(text) => sequence.push_str(text),
                Token::Escaped(ch) => sequence.push_char(ch),
                Token::Comma => sequence.push_char(','),
                Token::RightBrace => sequence.push_char('}'),
            }
            self.pos += 1;
        }

        if let Some(&position) = open_parens.last() {
            return Err(CompileError::UnbalancedParentheses { position });
        }

        let end = self.offset();
        Ok(CompiledExpression::new(
            self.input[start..end].to_string(),
            sequence.finish(),
            self.config.static_caching,
        ))
    }
}
