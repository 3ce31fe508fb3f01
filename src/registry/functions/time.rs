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

//! __time([format]) function

use super::argument;
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Write;
use std::sync::LazyLock;

/// Named shortcuts accepted in place of a strftime pattern
const SHORTCUTS: &[(&str, &str)] = &[
    ("YMD", "%Y%m%d"),
    ("HMS", "%H%M%S"),
    ("YMDHMS", "%Y%m%d-%H%M%S"),
];

/// __time([format]) - current time
///
/// * empty format: milliseconds since the Unix epoch
/// * `/1000`: seconds since the Unix epoch
/// * `YMD`, `HMS`, `YMDHMS`: compact local date/time
/// * anything else: a chrono strftime pattern applied to local time
#[derive(Debug, Clone, Default)]
pub struct TimeFunction;

impl Function for TimeFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__time",
                vec![ParameterInfo::optional(
                    "format",
                    "strftime pattern, shortcut (YMD, HMS, YMDHMS) or /1000",
                )],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        format_time(&Local::now(), argument(args, 0))
            .map_err(|message| InvocationError::invalid_argument(self.reference_key(), 0, message))
    }
}

/// Render `now` according to a `__time` format argument
pub(crate) fn format_time<Tz>(now: &DateTime<Tz>, format: &str) -> Result<String, String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let format = format.trim();
    if format.is_empty() {
        return Ok(now.timestamp_millis().to_string());
    }
    if format == "/1000" {
        return Ok(now.timestamp().to_string());
    }

    let pattern = SHORTCUTS
        .iter()
        .find(|(name, _)| *name == format)
        .map_or(format, |(_, pattern)| *pattern);

    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid time format '{format}'"));
    }

    let mut out = String::new();
    write!(out, "{}", now.format_with_items(items.iter()))
        .map_err(|_| format!("time format '{format}' cannot be rendered"))?;
    Ok(out)
}
