//! Component tree produced by compilation
//!
//! A compiled expression is a flat sequence of components; function calls
//! recursively own compiled argument expressions.

#![warn(missing_docs)]

mod expression;

pub use expression::*;
