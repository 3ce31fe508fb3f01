//! Expression engine - the main entry point for compiling parameter strings

use crate::ast::CompiledExpression;
use crate::config::EngineConfig;
use crate::error::{CompileResult, RegistryResult};
use crate::evaluator::RuntimeContext;
use crate::parser::Compiler;
use crate::registry::{FunctionRegistry, RegistryConfig, create_standard_registry};
use std::sync::Arc;

/// Owns the shared registry and the configuration used for every compile
#[derive(Debug, Clone)]
pub struct ExpressionEngine {
    registry: Arc<FunctionRegistry>,
    config: EngineConfig,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    /// Create an engine over the standard function library
    pub fn new() -> Self {
        Self::with_registry(Arc::new(create_standard_registry()))
    }

    /// Create an engine over an externally populated registry
    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine over the standard library with extra registry configuration
    pub fn with_registry_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let mut registry = create_standard_registry();
        registry.apply_config(config)?;
        Ok(Self::with_registry(Arc::new(registry)))
    }

    /// Replace the engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry consulted at compile time
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a raw string; empty or absent input yields an empty expression
    pub fn compile<'a>(
        &self,
        text: impl Into<Option<&'a str>>,
    ) -> CompileResult<CompiledExpression> {
        Compiler::new(&self.registry, &self.config).compile(text)
    }

    /// Compile and evaluate once
    pub fn render(&self, text: &str, context: &dyn RuntimeContext) -> CompileResult<String> {
        let mut expr = self.compile(text)?;
        Ok(expr.evaluate(context))
    }
}
