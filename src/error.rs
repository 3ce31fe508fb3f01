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

//! Error types for compiling and evaluating parameter expressions
//!
//! Compile errors are hard failures: no expression is produced. Invocation
//! errors are raised by function instances and absorbed by the evaluator.

use thiserror::Error;

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for function invocation
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Result type for registry configuration
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while compiling a raw string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// `${` was opened but never closed
    #[error("Unterminated reference starting at position {position}")]
    UnterminatedReference {
        /// Offset of the opening `${`
        position: usize,
    },

    /// An argument list or a parenthesis inside an argument was never closed
    #[error("Unbalanced parentheses: '(' at position {position} is never closed")]
    UnbalancedParentheses {
        /// Offset of the unmatched `(`
        position: usize,
    },

    /// A structural character appeared where it is not allowed
    #[error("Unexpected '{found}' at position {position}, expected {expected}")]
    UnexpectedCharacter {
        /// The offending character
        found: char,
        /// What the compiler was looking for
        expected: &'static str,
        /// Offset of the offending character
        position: usize,
    },

    /// `${}` or a call form without a name
    #[error("Empty reference at position {position}")]
    EmptyReference {
        /// Offset of the opening `${`
        position: usize,
    },

    /// Call form of a name that is not registered
    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction {
        /// Name used in the call form
        name: String,
        /// Offset of the opening `${`
        position: usize,
    },

    /// Argument count outside the function's declared bounds
    #[error("Function '{name}' expects {min}-{} arguments, got {actual} (position {position})", .max.map_or("∞".to_string(), |n| n.to_string()))]
    InvalidArity {
        /// Function reference key
        name: String,
        /// Minimum arguments
        min: usize,
        /// Maximum arguments (None for unlimited)
        max: Option<usize>,
        /// Arguments found in the source
        actual: usize,
        /// Offset of the opening `${`
        position: usize,
    },

    /// References nested deeper than the configured limit
    #[error("Reference nesting exceeds the limit of {limit} at position {position}")]
    NestingTooDeep {
        /// Configured maximum depth
        limit: usize,
        /// Offset of the `${` that crossed the limit
        position: usize,
    },
}

impl CompileError {
    /// Byte offset in the raw text the error points at
    pub fn position(&self) -> usize {
        match self {
            CompileError::UnterminatedReference { position }
            | CompileError::UnbalancedParentheses { position }
            | CompileError::UnexpectedCharacter { position, .. }
            | CompileError::EmptyReference { position }
            | CompileError::UnknownFunction { position, .. }
            | CompileError::InvalidArity { position, .. }
            | CompileError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Errors raised by a function instance at evaluation time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// A resolved argument could not be interpreted
    #[error("Function '{name}' argument {index} is invalid: {message}")]
    InvalidArgument {
        /// Function reference key
        name: String,
        /// Zero-based argument index
        index: usize,
        /// Error message
        message: String,
    },

    /// The function could not produce a value
    #[error("Function '{name}' evaluation error: {message}")]
    Evaluation {
        /// Function reference key
        name: String,
        /// Error message
        message: String,
    },

    /// An external resource (file, device) was not available
    #[error("Function '{name}' resource unavailable: {message}")]
    ResourceUnavailable {
        /// Function reference key
        name: String,
        /// Error message
        message: String,
    },

    /// The runtime context does not carry what the function needs
    #[error("Function '{name}' requires {what} from the runtime context")]
    MissingContext {
        /// Function reference key
        name: String,
        /// Missing piece of context
        what: &'static str,
    },
}

impl InvocationError {
    /// Shorthand for an invalid argument error
    pub fn invalid_argument(
        name: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        InvocationError::InvalidArgument {
            name: name.into(),
            index,
            message: message.into(),
        }
    }

    /// Shorthand for a generic evaluation error
    pub fn evaluation(name: impl Into<String>, message: impl Into<String>) -> Self {
        InvocationError::Evaluation {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while configuring a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An alias points at a key that is not registered
    #[error("Cannot alias '{alias}' to unregistered function '{target}'")]
    UnknownAliasTarget {
        /// The alias being declared
        alias: String,
        /// The missing target key
        target: String,
    },

    /// Registry configuration could not be parsed
    #[error("Invalid registry configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_unbounded() {
        let err = CompileError::InvalidArity {
            name: "__intSum".to_string(),
            min: 2,
            max: None,
            actual: 1,
            position: 4,
        };
        assert_eq!(
            err.to_string(),
            "Function '__intSum' expects 2-∞ arguments, got 1 (position 4)"
        );
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_invocation_shorthands() {
        let err = InvocationError::invalid_argument("__Random", 1, "not an integer");
        assert_eq!(
            err.to_string(),
            "Function '__Random' argument 1 is invalid: not an integer"
        );
    }
}
