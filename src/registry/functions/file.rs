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

//! __StringFromFile(path) function

use super::argument;
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone)]
struct LoadedFile {
    path: PathBuf,
    lines: Arc<Vec<String>>,
}

/// __StringFromFile(path) - successive lines of a text file
///
/// The file is read on first use and again whenever the resolved path
/// changes. After the last line the sequence starts over at the first.
/// A deep clone copies the read position, so each copy walks the file on its
/// own from wherever the original was.
#[derive(Debug, Clone, Default)]
pub struct StringFromFileFunction {
    file: Option<LoadedFile>,
    next_line: usize,
}

impl StringFromFileFunction {
    fn load(&mut self, path: PathBuf) -> InvocationResult<()> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            InvocationError::ResourceUnavailable {
                name: self.reference_key().to_string(),
                message: format!("cannot read '{}': {e}", path.display()),
            }
        })?;

        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        if lines.is_empty() {
            return Err(InvocationError::ResourceUnavailable {
                name: self.reference_key().to_string(),
                message: format!("'{}' is empty", path.display()),
            });
        }

        log::debug!("Loaded {} lines from {}", lines.len(), path.display());
        self.file = Some(LoadedFile {
            path,
            lines: Arc::new(lines),
        });
        self.next_line = 0;
        Ok(())
    }
}

impl Function for StringFromFileFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__StringFromFile",
                vec![ParameterInfo::required("path", "Text file to read lines from")],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        let path = PathBuf::from(argument(args, 0).trim());
        if self.file.as_ref().is_none_or(|file| file.path != path) {
            self.load(path)?;
        }

        let Some(file) = self.file.as_ref() else {
            return Err(InvocationError::evaluation(self.reference_key(), "no file loaded"));
        };
        let line = file.lines[self.next_line % file.lines.len()].clone();
        self.next_line = (self.next_line + 1) % file.lines.len();
        Ok(line)
    }
}
