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

//! Engine configuration options

use serde::{Deserialize, Serialize};

/// Default limit on nested `${...}` references
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Configuration for compilation and evaluation behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether expressions memoise their output once no dynamic component is seen
    pub static_caching: bool,

    /// Maximum depth of references nested inside function arguments
    pub max_nesting_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            static_caching: true,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with custom settings
    pub fn new(static_caching: bool, max_nesting_depth: usize) -> Self {
        Self {
            static_caching,
            max_nesting_depth,
        }
    }

    /// Enable or disable static caching
    pub fn with_static_caching(mut self, enabled: bool) -> Self {
        self.static_caching = enabled;
        self
    }

    /// Set the nesting limit
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
