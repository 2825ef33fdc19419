// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The initializer registry (§4.D): a priority-ordered, two-phase
//! installer for builtin modules. `TypeContext` and `RuntimeContext` are
//! exactly the surfaces [`TypeEnv`] and [`Vm`] already expose (§4.D lists
//! `DefineGlobal`/`DefineTypeAlias`/`GetType`/`SetPrimitivePrototype` for
//! the former and the `VM` handle plus `DefineGlobal` plus intrinsic
//! prototype references for the latter) so no separate wrapper type is
//! introduced — a mutable reference to each is the context.

use std::fmt;

use crate::types::TypeEnv;
use crate::vm::Vm;

pub type TypeContext<'a> = &'a mut TypeEnv;
pub type RuntimeContext<'a> = &'a mut Vm;

#[derive(Debug)]
pub enum RegistryError {
    /// A module's `InitRuntime`/`InitTypes` ran before a dependency it
    /// needs had installed itself — e.g. installing `Array` before
    /// `Object` (§8 scenario 7: "Object.prototype is not yet available").
    MissingDependency {
        module: &'static str,
        dependency: &'static str,
    },
    /// A module's installer reported a setup failure of its own.
    InitFailed {
        module: &'static str,
        message: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::MissingDependency { module, dependency } => write!(
                f,
                "builtin module `{module}` requires `{dependency}` to already be installed; check registry priority ordering"
            ),
            RegistryError::InitFailed { module, message } => {
                write!(f, "builtin module `{module}` failed to initialize: {message}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// `BuiltinInitializer` (§4.D): `Name()`, `Priority()`, `InitTypes`,
/// `InitRuntime`.
pub trait BuiltinInitializer {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError>;
    fn init_runtime(&self, ctx: RuntimeContext<'_>) -> Result<(), RegistryError>;
}

/// Priority-ordered, two-phase composition of independent builtin modules
/// (§2 component D, §4.D). Single-use per VM: idempotency is not required
/// (§4.D).
#[derive(Default)]
pub struct Registry {
    modules: Vec<Box<dyn BuiltinInitializer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { modules: Vec::new() }
    }

    /// `register(initializer) -> registry`.
    pub fn register(mut self, module: impl BuiltinInitializer + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Stable sort on `Priority`, then on `Name` (§4.D canonical ordering).
    fn ordered_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.modules.len()).collect();
        indices.sort_by(|&a, &b| {
            let ma = &self.modules[a];
            let mb = &self.modules[b];
            ma.priority()
                .cmp(&mb.priority())
                .then_with(|| ma.name().cmp(mb.name()))
        });
        indices
    }

    /// `run_type_phase(type_env) -> result`: every module's `InitTypes` in
    /// priority order. Failures short-circuit and bubble up (§4.D).
    pub fn run_type_phase(&self, type_env: &mut TypeEnv) -> Result<(), RegistryError> {
        for idx in self.ordered_indices() {
            self.modules[idx].init_types(type_env)?;
        }
        Ok(())
    }

    /// `run_runtime_phase(vm) -> result`: every module's `InitRuntime` in
    /// priority order, after every `InitTypes` has run (§4.D two-phase
    /// execution).
    pub fn run_runtime_phase(&self, vm: &mut Vm) -> Result<(), RegistryError> {
        for idx in self.ordered_indices() {
            self.modules[idx].init_runtime(vm)?;
        }
        Ok(())
    }

    pub fn module_names_in_order(&self) -> Vec<&'static str> {
        self.ordered_indices()
            .into_iter()
            .map(|idx| self.modules[idx].name())
            .collect()
    }
}
