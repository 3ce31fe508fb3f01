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

//! __counter() function - increments on every evaluation

use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// __counter([per_copy]) - returns 1, 2, 3, ...
///
/// With no argument or `TRUE` every copy of the expression counts on its own
/// (copies made with deep function cloning start from the original's current
/// value). With `FALSE` all copies of this occurrence share one counter.
#[derive(Debug, Clone, Default)]
pub struct CounterFunction {
    local: u64,
    shared: Arc<AtomicU64>,
}

impl Function for CounterFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: std::sync::LazyLock<FunctionSignature> = std::sync::LazyLock::new(|| {
            FunctionSignature::new(
                "__counter",
                vec![ParameterInfo::optional(
                    "per_copy",
                    "TRUE (default) for a counter per expression copy, FALSE for a shared one",
                )],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        let per_copy = match args.first().map(|s| s.trim()) {
            None | Some("") => true,
            Some(mode) if mode.eq_ignore_ascii_case("true") => true,
            Some(mode) if mode.eq_ignore_ascii_case("false") => false,
            Some(mode) => {
                return Err(InvocationError::invalid_argument(
                    self.reference_key(),
                    0,
                    format!("expected TRUE or FALSE, got '{mode}'"),
                ));
            }
        };

        let value = if per_copy {
            self.local += 1;
            self.local
        } else {
            self.shared.fetch_add(1, Ordering::Relaxed) + 1
        };
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationContext;

    #[test]
    fn test_counts_from_one() {
        let ctx = EvaluationContext::new();
        let mut counter = CounterFunction::default();
        assert_eq!(counter.execute(&[], &ctx).unwrap(), "1");
        assert_eq!(counter.execute(&["TRUE".to_string()], &ctx).unwrap(), "2");
    }

    #[test]
    fn test_shared_mode_survives_clone() {
        let ctx = EvaluationContext::new();
        let shared = vec!["false".to_string()];
        let mut a = CounterFunction::default();
        let mut b = a.clone();

        assert_eq!(a.execute(&shared, &ctx).unwrap(), "1");
        assert_eq!(b.execute(&shared, &ctx).unwrap(), "2");
        // Per-copy counters stay independent
        assert_eq!(b.execute(&[], &ctx).unwrap(), "1");
        assert_eq!(a.execute(&[], &ctx).unwrap(), "1");
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let ctx = EvaluationContext::new();
        let mut counter = CounterFunction::default();
        assert!(counter.execute(&["maybe".to_string()], &ctx).is_err());
    }
}
