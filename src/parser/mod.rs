//! Parameter string compiler
//!
//! A hand-written tokenizer feeding a recursive-descent compiler that turns a
//! raw string into a [`CompiledExpression`](crate::ast::CompiledExpression).

#![warn(missing_docs)]

pub mod compiler;
pub mod span;
pub mod tokenizer;

pub use compiler::Compiler;
pub use span::{Spanned, line_column};
pub use tokenizer::{Token, Tokenizer};

use crate::ast::CompiledExpression;
use crate::config::EngineConfig;
use crate::error::CompileResult;
use crate::registry::FunctionRegistry;

/// Compile `text` against `registry` with the default configuration
pub fn compile<'a>(
    text: impl Into<Option<&'a str>>,
    registry: &FunctionRegistry,
) -> CompileResult<CompiledExpression> {
    let config = EngineConfig::default();
    Compiler::new(registry, &config).compile(text)
}
