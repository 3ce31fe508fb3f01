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

//! Execution of compiled expressions

use super::context::RuntimeContext;
use crate::ast::{CacheState, CompiledExpression, Component};
use smallvec::SmallVec;

/// Evaluate `expr` against `context`, concatenating component outputs in order
///
/// A failing function contributes the empty string and evaluation continues
/// with the next component. When a pass observes no function call or variable
/// reference the output is memoised and every later call returns it without
/// touching any component.
pub fn evaluate(expr: &mut CompiledExpression, context: &dyn RuntimeContext) -> String {
    if let CacheState::Cached(value) = expr.cache_state() {
        return value.clone();
    }

    let mut output = String::with_capacity(expr.raw_text().len());
    let mut dynamic = false;

    for component in expr.components_mut() {
        match component {
            Component::Literal(text) => output.push_str(text),
            Component::FunctionCall(call) => {
                dynamic = true;
                // Arguments resolve before the owning call runs
                let args: SmallVec<[String; 2]> = call
                    .arguments
                    .iter_mut()
                    .map(|arg| evaluate(arg, context))
                    .collect();

                match call.instance.execute(&args, context) {
                    Ok(value) => output.push_str(&value),
                    Err(err) => {
                        log::warn!(
                            "Function '{}' at position {} failed, contributing nothing: {err}",
                            call.key,
                            call.position
                        );
                    }
                }
            }
            Component::VariableReference { name, .. } => {
                dynamic = true;
                if let Some(value) = context.get_variable(name) {
                    output.push_str(&value);
                }
            }
        }
    }

    if !dynamic && expr.caching_enabled() {
        log::trace!("Caching static result of '{}'", expr.raw_text());
        expr.store_cache(output.clone());
    }
    output
}
