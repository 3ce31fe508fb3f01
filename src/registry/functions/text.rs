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

//! Text transformation functions: __changeCase, __urlencode, __urldecode, __char

use super::argument;
use crate::error::{InvocationError, InvocationResult};
use crate::evaluator::RuntimeContext;
use crate::registry::function::Function;
use crate::registry::signature::{FunctionSignature, ParameterInfo};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::sync::LazyLock;

/// Characters left untouched by form encoding
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// __changeCase(text[, mode]) - UPPER (default), LOWER or CAPITALIZE
#[derive(Debug, Clone, Default)]
pub struct ChangeCaseFunction;

impl Function for ChangeCaseFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__changeCase",
                vec![
                    ParameterInfo::required("text", "Text to transform"),
                    ParameterInfo::optional("mode", "UPPER, LOWER or CAPITALIZE"),
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
        let text = argument(args, 0);
        let mode = argument(args, 1).trim();

        if mode.is_empty() || mode.eq_ignore_ascii_case("upper") {
            Ok(text.to_uppercase())
        } else if mode.eq_ignore_ascii_case("lower") {
            Ok(text.to_lowercase())
        } else if mode.eq_ignore_ascii_case("capitalize") {
            let mut chars = text.chars();
            Ok(match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            })
        } else {
            Err(InvocationError::invalid_argument(
                self.reference_key(),
                1,
                format!("unknown case mode '{mode}'"),
            ))
        }
    }
}

/// __urlencode(text) - application/x-www-form-urlencoded encoding
#[derive(Debug, Clone, Default)]
pub struct UrlEncodeFunction;

impl Function for UrlEncodeFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__urlencode",
                vec![ParameterInfo::required("text", "Text to encode")],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        Ok(utf8_percent_encode(argument(args, 0), FORM_ENCODE_SET)
            .to_string()
            .replace("%20", "+"))
    }
}

/// __urldecode(text) - inverse of __urlencode
#[derive(Debug, Clone, Default)]
pub struct UrlDecodeFunction;

impl Function for UrlDecodeFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::new(
                "__urldecode",
                vec![ParameterInfo::required("text", "Text to decode")],
            )
        });
        &SIG
    }

    fn execute(
        &mut self,
        args: &[String],
        _context: &dyn RuntimeContext,
    ) -> InvocationResult<String> {
        let plus_decoded = argument(args, 0).replace('+', " ");
        percent_decode_str(&plus_decoded)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|e| InvocationError::invalid_argument(self.reference_key(), 0, e.to_string()))
    }
}

/// __char(code, ...) - characters for decimal or `0x` hexadecimal code points
#[derive(Debug, Clone, Default)]
pub struct CharFunction;

impl Function for CharFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> = LazyLock::new(|| {
            FunctionSignature::variadic(
                "__char",
                vec![ParameterInfo::required(
                    "code",
                    "Unicode code point, decimal or 0x-prefixed hexadecimal",
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
        args.iter()
            .enumerate()
            .map(|(index, code)| {
                parse_code_point(code).ok_or_else(|| {
                    InvocationError::invalid_argument(
                        self.reference_key(),
                        index,
                        format!("'{code}' is not a valid character code"),
                    )
                })
            })
            .collect()
    }
}

fn parse_code_point(code: &str) -> Option<char> {
    let code = code.trim();
    let value = match code
        .strip_prefix("0x")
        .or_else(|| code.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(value)
}
