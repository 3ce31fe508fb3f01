//! Expression evaluator
//!
//! Evaluates compiled expressions against a runtime context and owns the
//! static-caching transition of each expression.

#![warn(missing_docs)]

mod context;
mod engine;

pub use context::{EvaluationContext, RuntimeContext};
pub use engine::evaluate;
