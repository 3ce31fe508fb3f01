//! Parameter expressions in Rust
//!
//! Compiles strings such as `id=${__counter}&user=${name}` once into a reusable
//! component tree, then evaluates that tree many times against a runtime
//! context. Expressions that turn out to contain no function call or variable
//! reference memoise their output after the first evaluation.

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod registry;

// Re-export main types
pub use ast::{CacheState, CompiledExpression, Component, FunctionCallData};
pub use config::EngineConfig;
pub use engine::ExpressionEngine;
pub use error::{CompileError, CompileResult, InvocationError, InvocationResult, RegistryError};
pub use evaluator::{EvaluationContext, RuntimeContext, evaluate};
pub use parser::compile;
pub use registry::{
    Function, FunctionFactory, FunctionInstance, FunctionRegistry, FunctionSignature,
    ParameterInfo, RegistryConfig, create_standard_registry,
};
