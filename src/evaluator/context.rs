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

//! Runtime context consumed by evaluation

use rustc_hash::FxHashMap;
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;

/// Read accessor over the per-invocation state of the surrounding system
///
/// The evaluator only reads variables. The opaque handles are passed through
/// untouched to function instances that know how to downcast them.
pub trait RuntimeContext {
    /// Resolve a named variable
    fn get_variable(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Handle to the current unit of work (e.g. the request being built)
    fn current_unit(&self) -> Option<&dyn Any> {
        None
    }

    /// Handle to the result of the previous unit of work
    fn previous_result(&self) -> Option<&dyn Any> {
        None
    }

    /// Number of the worker thread evaluating the expression
    fn thread_num(&self) -> Option<usize> {
        None
    }
}

impl<S: BuildHasher> RuntimeContext for HashMap<String, String, S> {
    fn get_variable(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

type Handle = Arc<dyn Any + Send + Sync>;

/// Owned runtime context with a variable store and optional handles
#[derive(Clone, Default)]
pub struct EvaluationContext {
    /// Variables in scope
    pub variables: FxHashMap<String, String>,
    current_unit: Option<Handle>,
    previous_result: Option<Handle>,
    thread_num: Option<usize>,
}

impl EvaluationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Attach the current unit of work
    pub fn with_current_unit<T: Any + Send + Sync>(mut self, unit: T) -> Self {
        self.current_unit = Some(Arc::new(unit));
        self
    }

    /// Attach the previous result
    pub fn with_previous_result<T: Any + Send + Sync>(mut self, result: T) -> Self {
        self.previous_result = Some(Arc::new(result));
        self
    }

    /// Set the worker thread number
    pub fn with_thread_num(mut self, thread_num: usize) -> Self {
        self.thread_num = Some(thread_num);
        self
    }

    /// Set or replace a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Remove a variable, returning its previous value
    pub fn remove_variable(&mut self, name: &str) -> Option<String> {
        self.variables.remove(name)
    }
}

impl RuntimeContext for EvaluationContext {
    fn get_variable(&self, name: &str) -> Option<Cow<'_, str>> {
        self.variables.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }

    fn current_unit(&self) -> Option<&dyn Any> {
        self.current_unit.as_deref().map(|h| h as &dyn Any)
    }

    fn previous_result(&self) -> Option<&dyn Any> {
        self.previous_result.as_deref().map(|h| h as &dyn Any)
    }

    fn thread_num(&self) -> Option<usize> {
        self.thread_num
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("variables", &self.variables)
            .field("has_current_unit", &self.current_unit.is_some())
            .field("has_previous_result", &self.previous_result.is_some())
            .field("thread_num", &self.thread_num)
            .finish()
    }
}
