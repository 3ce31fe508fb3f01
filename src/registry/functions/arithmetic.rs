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

//! __intSum(a, b, ...) function

use super::parse_integer;
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use std::sync::LazyLock;

/// __intSum(a, b, ...) - sum of two or more integers
#[derive(Debug, Clone, Default)]
pub struct IntSumFunction;

impl Function for IntSumFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::variadic(
                "__intSum",
                vec![
                    ParameterInfo::required("first", "First addend"),
                    ParameterInfo::required("second", "Second addend"),
                ],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        let name = self.reference_key();
        let mut total: i64 = 0;
        for (index, value) in args.iter().enumerate() {
            let addend = parse_integer(name, index, value)?;
            total = total
                .checked_add(addend)
                .ok_or_else(|| InvocationError::evaluation(name, "integer overflow"))?;
        }
        Ok(total.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationContext;

    fn sum(values: &[&str]) -> InvocationResult<String> {
        let args: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        IntSumFunction.execute(&args, &EvaluationContext::new())
    }

    #[test]
    fn test_sums_all_arguments() {
        assert_eq!(sum(&["1", "2"]).unwrap(), "3");
        assert_eq!(sum(&["10", "-4", " 6 "]).unwrap(), "12");
    }

    #[test]
    fn test_reports_bad_argument_index() {
        let err = sum(&["1", "2", "x"]).unwrap_err();
        assert!(matches!(err, InvocationError::InvalidArgument { index: 2, .. }));
    }

    #[test]
    fn test_overflow() {
        let max = i64::MAX.to_string();
        assert!(matches!(
            sum(&[max.as_str(), "1"]),
            Err(InvocationError::Evaluation { .. })
        ));
    }
}
