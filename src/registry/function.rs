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

//! Function invocation contract and per-occurrence function instances

use crate::error::{CompileError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::signature::FunctionSignature;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A pluggable function callable from `${name(args)}`
///
/// Instances may carry mutable state (counters, file cursors); one instance is
/// bound to each syntactic occurrence of the function.
pub trait Function: FunctionClone + Send {
    /// Declared reference key and argument bounds
    fn signature(&self) -> &FunctionSignature;

    /// Produce a value from the resolved argument strings
    fn execute(&mut self, args: &[String], context: &dyn RuntimeContext)
    -> InvocationResult<String>;

    /// Reference key used in source text
    fn reference_key(&self) -> &str {
        &self.signature().name
    }

    /// Minimum number of arguments
    fn min_arg_count(&self) -> usize {
        self.signature().min_arity
    }

    /// Maximum number of arguments (None for unlimited)
    fn max_arg_count(&self) -> Option<usize> {
        self.signature().max_arity
    }

    /// Validate an argument count taken from source text at `position`
    fn validate_arg_count(&self, actual: usize, position: usize) -> Result<(), CompileError> {
        if self.signature().accepts(actual) {
            return Ok(());
        }
        Err(CompileError::InvalidArity {
            name: self.reference_key().to_string(),
            min: self.min_arg_count(),
            max: self.max_arg_count(),
            actual,
            position,
        })
    }
}

/// Deep copy of a boxed function, state included
pub trait FunctionClone {
    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn Function>;
}

impl<T> FunctionClone for T
where
    T: Function + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn Function> {
        Box::new(self.clone())
    }
}

/// Constructor of fresh, independently stateful function instances
pub trait FunctionFactory: Send + Sync {
    /// Create a new instance
    fn create(&self) -> Box<dyn Function>;
}

impl<F> FunctionFactory for F
where
    F: Fn() -> Box<dyn Function> + Send + Sync,
{
    fn create(&self) -> Box<dyn Function> {
        self()
    }
}

/// The function instance bound to one compiled occurrence
pub struct FunctionInstance {
    inner: Arc<Mutex<Box<dyn Function>>>,
}

impl FunctionInstance {
    /// Wrap a freshly created function
    pub fn new(function: Box<dyn Function>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(function)),
        }
    }

    /// Invoke the function
    pub fn execute(
        &self,
        args: &[String],
        context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        self.inner.lock().execute(args, context)
    }

    /// Reference key of the wrapped function
    pub fn reference_key(&self) -> String {
        self.inner.lock().reference_key().to_string()
    }

    /// Copy the function with its current state into an independent instance
    pub fn deep_clone(&self) -> Self {
        let copy = self.inner.lock().clone_box();
        Self::new(copy)
    }

    /// Another handle onto the same function state
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Check whether both handles drive the same function state
    pub fn shares_state_with(&self, other: &FunctionInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Validate an argument count against the wrapped function's signature
    pub(crate) fn validate_arg_count(
        &self,
        actual: usize,
        position: usize,
    ) -> Result<(), CompileError> {
        self.inner.lock().validate_arg_count(actual, position)
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInstance")
            .field("reference_key", &self.reference_key())
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationContext;
    use crate::registry::signature::ParameterInfo;
    use once_cell::sync::Lazy;

    static TALLY: Lazy<FunctionSignature> = Lazy::new(|| {
        FunctionSignature::new("tally", vec![ParameterInfo::optional("step", "increment")])
    });

    #[derive(Clone, Default)]
    struct Tally {
        total: u64,
    }

    impl Function for Tally {
        fn signature(&self) -> &FunctionSignature {
            &TALLY
        }

        fn execute(
            &mut self,
            args: &[String],
            _context: &dyn RuntimeContext,
        ) -> InvocationResult<String> {
            self.total += args.first().and_then(|s| s.parse().ok()).unwrap_or(1);
            Ok(self.total.to_string())
        }
    }

    #[test]
    fn test_deep_clone_copies_state() {
        let ctx = EvaluationContext::new();
        let original = FunctionInstance::new(Box::new(Tally::default()));
        original.execute(&[], &ctx).unwrap();

        let copy = original.deep_clone();
        assert!(!copy.shares_state_with(&original));
        assert_eq!(copy.execute(&[], &ctx).unwrap(), "2");
        assert_eq!(copy.execute(&[], &ctx).unwrap(), "3");
        assert_eq!(original.execute(&[], &ctx).unwrap(), "2");
    }

    #[test]
    fn test_share_observes_side_effects() {
        let ctx = EvaluationContext::new();
        let original = FunctionInstance::new(Box::new(Tally::default()));
        let shared = original.share();

        assert!(shared.shares_state_with(&original));
        shared.execute(&["5".to_string()], &ctx).unwrap();
        assert_eq!(original.execute(&[], &ctx).unwrap(), "6");
    }

    #[test]
    fn test_arity_validation() {
        let instance = FunctionInstance::new(Box::new(Tally::default()));
        assert!(instance.validate_arg_count(1, 0).is_ok());
        let err = instance.validate_arg_count(2, 7).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidArity {
                name: "tally".to_string(),
                min: 0,
                max: Some(1),
                actual: 2,
                position: 7,
            }
        );
    }

    #[test]
    fn test_closure_factory() {
        let factory = || Box::new(Tally::default()) as Box<dyn Function>;
        let a = factory.create();
        assert_eq!(a.reference_key(), "tally");
    }
}
