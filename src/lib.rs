// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in initialization subsystem for Paserati.
//!
//! This crate owns the runtime value/object model, the property store, the
//! callable-object variants, the two-phase [`registry`], and one module per
//! ECMAScript intrinsic under [`builtins`]. It does not own the lexer,
//! parser, bytecode compiler, interpreter loop, or garbage collector: those
//! are external collaborators reached only through [`Vm`] and
//! [`types::TypeEnv`].

pub mod abstract_ops;
pub mod builtins;
pub mod error;
pub mod function;
pub mod object;
pub mod property;
pub mod registry;
pub mod symbol;
pub mod types;
pub mod value;
pub mod vm;

pub use error::{JsError, JsResult};
pub use registry::Registry;
pub use types::TypeEnv;
pub use value::Value;
pub use vm::Vm;

/// Constructs a fresh [`Vm`] and [`TypeEnv`], registers every builtin module
/// this crate ships, and runs both initialization phases. This is the
/// top-level entry point a host compiler+VM calls once at startup.
pub fn bootstrap() -> Result<(Vm, TypeEnv), registry::RegistryError> {
    let mut vm = Vm::new();
    let mut type_env = TypeEnv::new();
    let registry = builtins::default_registry();
    registry.run_type_phase(&mut type_env)?;
    registry.run_runtime_phase(&mut vm)?;
    Ok((vm, type_env))
}
