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

//! Random value functions: __Random, __RandomString, __UUID

use super::{argument, parse_integer};
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::LazyLock;

/// __Random(min, max) - uniformly distributed integer in `[min, max]`
#[derive(Debug, Clone, Default)]
pub struct RandomFunction;

impl Function for RandomFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__Random",
                vec![
                    ParameterInfo::required("min", "Smallest value that may be returned"),
                    ParameterInfo::required("max", "Largest value that may be returned"),
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
        let min = parse_integer(name, 0, argument(args, 0))?;
        let max = parse_integer(name, 1, argument(args, 1))?;
        if min > max {
            return Err(InvocationError::invalid_argument(
                name,
                1,
                format!("max {max} is smaller than min {min}"),
            ));
        }
        Ok(rand::thread_rng().gen_range(min..=max).to_string())
    }
}

/// __RandomString(length[, characters]) - random string drawn from a character set
///
/// Without a character set the output is ASCII alphanumeric.
#[derive(Debug, Clone, Default)]
pub struct RandomStringFunction;

impl Function for RandomStringFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__RandomString",
                vec![
                    ParameterInfo::required("length", "Number of characters to generate"),
                    ParameterInfo::optional("characters", "Characters to choose from"),
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
        let length = parse_integer(name, 0, argument(args, 0))?;
        let length = usize::try_from(length).map_err(|_| {
            InvocationError::invalid_argument(name, 0, "length must not be negative")
        })?;

        let mut rng = rand::thread_rng();
        let alphabet: Vec<char> = args.get(1).map(|s| s.chars().collect()).unwrap_or_default();
        if alphabet.is_empty() {
            return Ok((&mut rng)
                .sample_iter(&Alphanumeric)
                .take(length)
                .map(char::from)
                .collect());
        }

        Ok((0..length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect())
    }
}

/// __UUID() - random version 4 UUID in hyphenated form
#[derive(Debug, Clone, Default)]
pub struct UuidFunction;

impl Function for UuidFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::nullary("__UUID"));
        &SIG
    }

    fn execute(
        &mut self,
        _args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationContext;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_random_stays_in_range() {
        let ctx = EvaluationContext::new();
        let mut f = RandomFunction;
        for _ in 0..200 {
            let value: i64 = f.execute(&args(&["3", "7"]), &ctx).unwrap().parse().unwrap();
            assert!((3..=7).contains(&value));
        }
        assert_eq!(f.execute(&args(&["5", "5"]), &ctx).unwrap(), "5");
    }

    #[test]
    fn test_random_rejects_inverted_range() {
        let ctx = EvaluationContext::new();
        let err = RandomFunction.execute(&args(&["9", "1"]), &ctx).unwrap_err();
        assert!(matches!(err, InvocationError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn test_random_string() {
        let ctx = EvaluationContext::new();
        let mut f = RandomStringFunction;

        let value = f.execute(&args(&["12"]), &ctx).unwrap();
        assert_eq!(value.len(), 12);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));

        let value = f.execute(&args(&["20", "ab"]), &ctx).unwrap();
        assert_eq!(value.chars().count(), 20);
        assert!(value.chars().all(|c| c == 'a' || c == 'b'));

        assert!(f.execute(&args(&["-1"]), &ctx).is_err());
    }

    #[test]
    fn test_uuid_format() {
        let ctx = EvaluationContext::new();
        let value = UuidFunction.execute(&[], &ctx).unwrap();
        let parsed = uuid::Uuid::parse_str(&value).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(value, UuidFunction.execute(&[], &ctx).unwrap());
    }
}
