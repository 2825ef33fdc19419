// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry ordering tests (§8 scenario 7: "Object.prototype is not yet
//! available"). `bootstrap()` must come up clean with the shipped module
//! set, and a module installed ahead of its dependency must fail with
//! `RegistryError::MissingDependency` rather than panicking.

use paserati_builtins::registry::{BuiltinInitializer, Registry, RegistryError, RuntimeContext, TypeContext};
use paserati_builtins::types::Type;
use paserati_builtins::{TypeEnv, Vm};

#[test]
fn bootstrap_installs_every_module_without_error() {
    let result = paserati_builtins::bootstrap();
    assert!(result.is_ok(), "bootstrap() failed: {:?}", result.err());
    let (vm, _types) = result.unwrap();
    for name in ["Object", "Function", "Array", "Error", "TypeError", "Number", "String", "Math", "Temporal"] {
        assert!(vm.get_global(name).is_some(), "missing global `{name}` after bootstrap");
    }
}

/// A module declaring a dependency that never installs must fail loudly,
/// not silently produce a half-initialized VM.
struct NeedsPhantom;

impl BuiltinInitializer for NeedsPhantom {
    fn name(&self) -> &'static str {
        "NeedsPhantom"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn init_types(&self, _ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        Ok(())
    }

    fn init_runtime(&self, _ctx: RuntimeContext<'_>) -> Result<(), RegistryError> {
        Err(RegistryError::MissingDependency {
            module: "NeedsPhantom",
            dependency: "Phantom",
        })
    }
}

#[test]
fn missing_dependency_surfaces_as_an_error() {
    let registry = Registry::new().register(NeedsPhantom);
    let mut vm = Vm::new();
    let mut types = TypeEnv::new();
    registry.run_type_phase(&mut types).expect("type phase has no dependencies to miss");
    let err = registry.run_runtime_phase(&mut vm).expect_err("expected a MissingDependency error");
    match err {
        RegistryError::MissingDependency { module, dependency } => {
            assert_eq!(module, "NeedsPhantom");
            assert_eq!(dependency, "Phantom");
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

/// Two modules with the same priority break ties by name, not by
/// registration order (§2 component D: "stable `(priority, name)` sort").
struct RecordsOrder(&'static str, std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>);

impl BuiltinInitializer for RecordsOrder {
    fn name(&self) -> &'static str {
        self.0
    }

    fn priority(&self) -> i32 {
        42
    }

    fn init_types(&self, _ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        Ok(())
    }

    fn init_runtime(&self, _ctx: RuntimeContext<'_>) -> Result<(), RegistryError> {
        self.1.borrow_mut().push(self.0);
        Ok(())
    }
}

#[test]
fn same_priority_modules_install_in_name_order() {
    let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let registry = Registry::new()
        .register(RecordsOrder("Zeta", order.clone()))
        .register(RecordsOrder("Alpha", order.clone()));
    let mut vm = Vm::new();
    registry.run_runtime_phase(&mut vm).unwrap();
    assert_eq!(*order.borrow(), vec!["Alpha", "Zeta"]);
    let _ = Type::Any;
}
