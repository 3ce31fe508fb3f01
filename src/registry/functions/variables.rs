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

//! Context-aware functions: __V, __log, __threadNum

use super::argument;
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use std::sync::LazyLock;

/// __V(name) - value of a variable whose name is computed at runtime
///
/// `${__V(user_${n})}` looks up `user_1`, `user_2`, ... as `n` changes.
/// An undefined variable yields the empty string.
#[derive(Debug, Clone, Default)]
pub struct VariableFunction;

impl Function for VariableFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__V",
                vec![ParameterInfo::required("name", "Variable name to resolve")],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        Ok(context
            .get_variable(argument(args, 0).trim())
            .map(|value| value.into_owned())
            .unwrap_or_default())
    }
}

/// __log(message[, level]) - write a log record and return the message
#[derive(Debug, Clone, Default)]
pub struct LogFunction;

impl Function for LogFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__log",
                vec![
                    ParameterInfo::required("message", "Text to log and return"),
                    ParameterInfo::optional("level", "TRACE, DEBUG, INFO (default), WARN or ERROR"),
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
        let message = argument(args, 0);
        let level = match argument(args, 1).trim() {
            "" => log::Level::Info,
            name => name.parse::<log::Level>().map_err(|_| {
                InvocationError::invalid_argument(
                    self.reference_key(),
                    1,
                    format!("unknown log level '{name}'"),
                )
            })?,
        };
        log::log!(target: "paramexpr::log", level, "{message}");
        Ok(message.to_string())
    }
}

/// __threadNum() - number of the worker evaluating the expression
#[derive(Debug, Clone, Default)]
pub struct ThreadNumFunction;

impl Function for ThreadNumFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::nullary("__threadNum"));
        &SIG
    }

    fn execute(
        &mut self,
        _args: &[String],
        context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        context
            .thread_num()
            .map(|n| n.to_string())
            .ok_or_else(|| InvocationError::MissingContext {
                name: self.reference_key().to_string(),
                what: "thread number",
            })
    }
}
