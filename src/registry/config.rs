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

//! Registry configuration options

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};

/// One declared alias: `alias` resolves to the same factory as `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Historical or alternative key
    pub alias: String,
    /// Registered key the alias points at
    pub target: String,
}

/// Configuration data supplied by whoever populates the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Aliases applied after registration
    pub aliases: Vec<AliasEntry>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            // `__StringFromFile` was originally published with one underscore
            aliases: vec![AliasEntry::new("_StringFromFile", "__StringFromFile")],
        }
    }
}

impl AliasEntry {
    /// Create an alias entry
    pub fn new(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            target: target.into(),
        }
    }
}

impl RegistryConfig {
    /// Configuration without any alias
    pub fn empty() -> Self {
        Self {
            aliases: Vec::new(),
        }
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push(AliasEntry::new(alias, target));
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::InvalidConfig {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_carries_legacy_alias() {
        let config = RegistryConfig::default();
        assert_eq!(
            config.aliases,
            vec![AliasEntry::new("_StringFromFile", "__StringFromFile")]
        );
    }

    #[test]
    fn test_from_json() {
        let config =
            RegistryConfig::from_json(r#"{"aliases":[{"alias":"__rnd","target":"__Random"}]}"#)
                .unwrap();
        assert_eq!(config.aliases, vec![AliasEntry::new("__rnd", "__Random")]);

        // Missing field falls back to the defaults
        let config = RegistryConfig::from_json("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());

        assert!(matches!(
            RegistryConfig::from_json("[1, 2"),
            Err(RegistryError::InvalidConfig { .. })
        ));
    }
}
