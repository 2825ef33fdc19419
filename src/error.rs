// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error propagation (§7). A native method signals an exception by
//! returning `(Undefined, error)`; here that is `Err(JsError)`. The error
//! *is* a [`Value`] — almost always an Error-family object — never a
//! distinct Rust error enum.

use crate::value::Value;

pub type JsResult<T> = Result<T, JsError>;

#[derive(Debug, Clone)]
pub struct JsError(Value);

impl JsError {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(self) -> Value {
        self.0
    }

    pub fn value_ref(&self) -> &Value {
        &self.0
    }
}

/// `error.name` taxonomy (§7): each has a distinct prototype in an
/// inheritance chain rooted at `Error.prototype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    SyntaxError,
    ReferenceError,
    EvalError,
    UriError,
    AggregateError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::UriError => "URIError",
            ErrorKind::AggregateError => "AggregateError",
        }
    }
}
