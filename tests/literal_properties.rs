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

//! Property-based tests for inputs without any reference

use paramexpr::{EvaluationContext, ExpressionEngine};
use proptest::prelude::*;

mod strategies {
    use super::*;

    /// Text dense in the characters the grammar treats specially
    pub fn structural_text() -> impl Strategy<Value = String> {
        "[a-z \\\\$,(){}]{0,40}".prop_filter("no reference start", |s| !s.contains("${"))
    }

    /// Arbitrary unicode text
    pub fn any_text() -> impl Strategy<Value = String> {
        any::<String>().prop_filter("no reference start", |s| !s.contains("${"))
    }
}

fn assert_literal_round_trip(engine: &ExpressionEngine, text: &str) -> Result<(), TestCaseError> {
    let mut expr = engine
        .compile(text)
        .map_err(|e| TestCaseError::fail(format!("compile failed for {text:?}: {e}")))?;
    prop_assert!(expr.is_pure_literal());
    prop_assert_eq!(expr.function_count(), 0);

    let ctx = EvaluationContext::new();
    prop_assert_eq!(expr.evaluate(&ctx), text);
    prop_assert!(expr.is_cached());
    prop_assert_eq!(expr.evaluate(&ctx), text);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Structural characters and backslashes outside a reference are kept as written
    #[test]
    fn literal_structural_text_evaluates_to_itself(text in strategies::structural_text()) {
        assert_literal_round_trip(&ExpressionEngine::new(), &text)?;
    }

    /// Any text without `${` evaluates to itself and is cached after one pass
    #[test]
    fn literal_text_evaluates_to_itself(text in strategies::any_text()) {
        assert_literal_round_trip(&ExpressionEngine::new(), &text)?;
    }
}
