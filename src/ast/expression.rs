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

//! Compiled expression and component definitions

use crate::evaluator::RuntimeContext;
use crate::registry::FunctionInstance;
use smallvec::SmallVec;
use std::fmt;

/// Arguments of a function call, each compiled independently
pub type Arguments = SmallVec<[CompiledExpression; 2]>;

/// One unit of a compiled expression
#[derive(Debug)]
pub enum Component {
    /// Static text, contributed verbatim
    Literal(String),

    /// Function invocation bound to its own instance (boxed for size optimization)
    FunctionCall(Box<FunctionCallData>),

    /// Identifier that did not match a registered function
    VariableReference {
        /// Variable name
        name: String,
        /// Offset of the opening `${`
        position: usize,
    },
}

/// Function call data
#[derive(Debug)]
pub struct FunctionCallData {
    /// Key the call was written with (may be an alias)
    pub key: String,
    /// Compiled argument expressions
    pub arguments: Arguments,
    /// Instance created for this occurrence
    pub instance: FunctionInstance,
    /// Offset of the opening `${`
    pub position: usize,
}

impl Component {
    /// Function calls and variable references are dynamic
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Component::Literal(_))
    }

    fn duplicate(&self, deep_functions: bool) -> Self {
        match self {
            Component::Literal(text) => Component::Literal(text.clone()),
            Component::FunctionCall(call) => Component::FunctionCall(Box::new(FunctionCallData {
                key: call.key.clone(),
                arguments: call
                    .arguments
                    .iter()
                    .map(|arg| arg.duplicate(deep_functions))
                    .collect(),
                instance: if deep_functions {
                    call.instance.deep_clone()
                } else {
                    call.instance.share()
                },
                position: call.position,
            })),
            Component::VariableReference { name, position } => Component::VariableReference {
                name: name.clone(),
                position: *position,
            },
        }
    }
}

/// Memoised output of an expression found to be free of dynamic components
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Every evaluation walks the components
    #[default]
    Uncached,
    /// Terminal: evaluation returns the stored value
    Cached(String),
}

/// Parsed, reusable representation of a raw parameter string
///
/// Deliberately not `Clone`: use [`CompiledExpression::duplicate`] and choose
/// whether function state is copied or shared.
#[derive(Debug)]
pub struct CompiledExpression {
    raw_text: String,
    components: Vec<Component>,
    is_pure_literal: bool,
    caching_enabled: bool,
    cache: CacheState,
}

impl CompiledExpression {
    pub(crate) fn new(raw_text: String, components: Vec<Component>, caching_enabled: bool) -> Self {
        let is_pure_literal = components.iter().all(|c| !c.is_dynamic());
        Self {
            raw_text,
            components,
            is_pure_literal,
            caching_enabled,
            cache: CacheState::Uncached,
        }
    }

    /// Expression compiled from empty or absent input
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new(), true)
    }

    /// The text this expression was compiled from
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Top-level components, in order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// True iff no function call or variable reference appears
    pub fn is_pure_literal(&self) -> bool {
        self.is_pure_literal
    }

    /// True once the static cache has been populated
    pub fn is_cached(&self) -> bool {
        matches!(self.cache, CacheState::Cached(_))
    }

    /// Current cache state
    pub fn cache_state(&self) -> &CacheState {
        &self.cache
    }

    pub(crate) fn caching_enabled(&self) -> bool {
        self.caching_enabled
    }

    pub(crate) fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub(crate) fn store_cache(&mut self, value: String) {
        self.cache = CacheState::Cached(value);
    }

    /// Number of function instances in the whole tree
    pub fn function_count(&self) -> usize {
        self.components
            .iter()
            .map(|c| match c {
                Component::FunctionCall(call) => {
                    1 + call
                        .arguments
                        .iter()
                        .map(CompiledExpression::function_count)
                        .sum::<usize>()
                }
                _ => 0,
            })
            .sum()
    }

    /// Evaluate against a runtime context
    pub fn evaluate(&mut self, context: &dyn RuntimeContext) -> String {
        crate::evaluator::evaluate(self, context)
    }

    /// Copy the component tree for another consumer
    ///
    /// With `deep_functions` every function instance is copied with its
    /// current state; otherwise the copy drives the same instances as `self`.
    /// The copy always starts uncached.
    pub fn duplicate(&self, deep_functions: bool) -> Self {
        Self {
            raw_text: self.raw_text.clone(),
            components: self
                .components
                .iter()
                .map(|c| c.duplicate(deep_functions))
                .collect(),
            is_pure_literal: self.is_pure_literal,
            caching_enabled: self.caching_enabled,
            cache: CacheState::Uncached,
        }
    }
}

impl Default for CompiledExpression {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_text)
    }
}
