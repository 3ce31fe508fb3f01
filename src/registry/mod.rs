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

//! Function registry
//!
//! Maps reference keys to factories. The registry is populated once by the
//! surrounding system, then shared read-only (`Arc<FunctionRegistry>`) by every
//! compiler and worker thread.

#![warn(missing_docs)]

pub mod config;
pub mod function;
pub mod functions;
pub mod signature;

pub use config::{AliasEntry, RegistryConfig};
pub use function::{Function, FunctionClone, FunctionFactory, FunctionInstance};
pub use signature::{FunctionSignature, ParameterInfo};

use crate::error::{RegistryError, RegistryResult};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Lookup table from reference key to function factory
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    factories: FxHashMap<String, Arc<dyn FunctionFactory>>,
    signatures: FxHashMap<String, FunctionSignature>,
    aliases: FxHashMap<String, String>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("keys", &self.keys())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function type constructed through `Default`
    pub fn register<F>(&mut self)
    where
        F: Function + Default + Clone + 'static,
    {
        let key = F::default().reference_key().to_string();
        self.register_factory(key, || Box::new(F::default()) as Box<dyn Function>);
    }

    /// Bind `key` to a factory, replacing any previous binding
    pub fn register_factory<K, F>(&mut self, key: K, factory: F)
    where
        K: Into<String>,
        F: FunctionFactory + 'static,
    {
        let key = key.into();
        let signature = factory.create().signature().clone();
        log::debug!("Registering function '{key}' as {signature}");

        self.aliases.remove(&key);
        self.signatures.insert(key.clone(), signature);
        self.factories.insert(key, Arc::new(factory));
    }

    /// Make `alias` resolve to the same factory as `target`
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> RegistryResult<()> {
        let alias = alias.into();
        let target = target.into();

        let Some(factory) = self.factories.get(&target).cloned() else {
            return Err(RegistryError::UnknownAliasTarget { alias, target });
        };
        if let Some(signature) = self.signatures.get(&target).cloned() {
            self.signatures.insert(alias.clone(), signature);
        }
        log::debug!("Registering alias '{alias}' for '{target}'");

        self.factories.insert(alias.clone(), factory);
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Apply alias data from configuration
    pub fn apply_config(&mut self, config: &RegistryConfig) -> RegistryResult<()> {
        for entry in &config.aliases {
            self.register_alias(entry.alias.clone(), entry.target.clone())?;
        }
        Ok(())
    }

    /// Find the factory registered for `key`
    pub fn lookup(&self, key: &str) -> Option<Arc<dyn FunctionFactory>> {
        self.factories.get(key).cloned()
    }

    /// Check if a key is registered (aliases included)
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Target of an alias, if `key` is one
    pub fn alias_target(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Declared signature of the function behind `key`
    ///
    /// For aliases this is the target's signature, whose `name` is the
    /// target key.
    pub fn signature(&self, key: &str) -> Option<&FunctionSignature> {
        self.signatures.get(key)
    }

    /// All registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Signatures keyed by registered key, sorted by key
    pub fn signatures(&self) -> Vec<(&str, &FunctionSignature)> {
        let mut entries: Vec<_> = self
            .signatures
            .iter()
            .map(|(k, s)| (k.as_str(), s))
            .collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }

    /// Number of registered keys (aliases included)
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Create a registry with every built-in function and the default aliases
pub fn create_standard_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    functions::register_builtin_functions(&mut registry);

    if let Err(err) = registry.apply_config(&RegistryConfig::default()) {
        log::error!("Default registry configuration rejected: {err}");
    }
    registry
}
