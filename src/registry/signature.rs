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

//! Function signatures used for arity validation and documentation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared shape of a function: its reference key and argument bounds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Reference key, e.g. `__counter`
    pub name: String,
    /// Parameter descriptions, in order
    pub parameters: Vec<ParameterInfo>,
    /// Minimum number of arguments
    pub min_arity: usize,
    /// Maximum number of arguments (None for variadic)
    pub max_arity: Option<usize>,
}

/// Description of one positional parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Whether this parameter may be omitted
    pub optional: bool,
}

impl FunctionSignature {
    /// Create a signature whose arity is derived from its parameters
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterInfo>) -> Self {
        let min_arity = parameters.iter().filter(|p| !p.optional).count();
        let max_arity = Some(parameters.len());

        Self {
            name: name.into(),
            parameters,
            min_arity,
            max_arity,
        }
    }

    /// Create a variadic signature: the last parameter may repeat
    pub fn variadic(name: impl Into<String>, parameters: Vec<ParameterInfo>) -> Self {
        let min_arity = parameters.iter().filter(|p| !p.optional).count();

        Self {
            name: name.into(),
            parameters,
            min_arity,
            max_arity: None,
        }
    }

    /// Signature of a function taking no arguments
    pub fn nullary(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Check whether `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_arity && self.max_arity.is_none_or(|max| count <= max)
    }
}

impl ParameterInfo {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional: false,
        }
    }

    /// Create an optional parameter
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional: true,
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.name)?;
            if param.optional {
                write!(f, "?")?;
            }
        }
        if self.max_arity.is_none() {
            write!(f, ", ...")?;
        }
        write!(f, ")")
    }
}
