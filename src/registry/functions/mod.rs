//! Built-in function implementations
//!
//! Reference keys follow the `__name` convention so that they never collide
//! with ordinary variable names.

pub mod arithmetic;
pub mod counter;
pub mod file;
pub mod random;
pub mod text;
pub mod time;
pub mod variables;

pub use arithmetic::IntSumFunction;
pub use counter::CounterFunction;
pub use file::StringFromFileFunction;
pub use random::{RandomFunction, RandomStringFunction, UuidFunction};
pub use text::{ChangeCaseFunction, CharFunction, UrlDecodeFunction, UrlEncodeFunction};
pub use time::TimeFunction;
pub use variables::{LogFunction, ThreadNumFunction, VariableFunction};

use crate::error::{InvocationError, InvocationResult};
use crate::registry::FunctionRegistry;

/// Register every built-in function
pub fn register_builtin_functions(registry: &mut FunctionRegistry) {
    registry.register::<CounterFunction>();
    registry.register::<RandomFunction>();
    registry.register::<RandomStringFunction>();
    registry.register::<UuidFunction>();
    registry.register::<TimeFunction>();
    registry.register::<IntSumFunction>();
    registry.register::<ChangeCaseFunction>();
    registry.register::<UrlEncodeFunction>();
    registry.register::<UrlDecodeFunction>();
    registry.register::<CharFunction>();
    registry.register::<VariableFunction>();
    registry.register::<LogFunction>();
    registry.register::<ThreadNumFunction>();
    registry.register::<StringFromFileFunction>();
}

/// Resolved argument at `index`, empty when absent
pub(crate) fn argument(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or_default()
}

/// Parse a resolved argument as a signed integer
pub(crate) fn parse_integer(name: &str, index: usize, value: &str) -> InvocationResult<i64> {
    value.trim().parse::<i64>().map_err(|e| {
        InvocationError::invalid_argument(name, index, format!("'{value}' is not an integer: {e}"))
    })
}
