// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `AsyncGenerator` (§4.D priority table "(late)", §9 Open Question 1).
//! [`crate::object::AsyncGeneratorData`] is a data-only record — there is
//! no bytecode-interpreter coupling in this crate, and no `Promise`
//! intrinsic in scope — so `next`/`return`/`throw` below replicate the
//! documented simplification exactly: every settlement is already
//! synchronous by the time a native sees it, so these wrappers just report
//! `{done, value}` off the record's own `done` flag rather than driving a
//! real suspend/resume machine.

use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct AsyncGeneratorModule;

impl BuiltinInitializer for AsyncGeneratorModule {
    fn name(&self) -> &'static str {
        "AsyncGenerator"
    }

    fn priority(&self) -> i32 {
        900
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.set_primitive_prototype("asyncgenerator", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "AsyncGenerator",
                dependency: "Object",
            })?;
        let prototype = new_plain_object(object_prototype);
        define_method(&prototype, "next", 1, false, next);
        define_method(&prototype, "return", 1, false, do_return);
        define_method(&prototype, "throw", 1, false, do_throw);
        let iterator_fn = crate::function::create_native_function(
            "[Symbol.asyncIterator]",
            0,
            false,
            self_iterator,
        );
        crate::builtins::util::well_known_symbol_accessor(
            &prototype,
            vm.well_known_symbols.async_iterator.clone(),
            Some(iterator_fn),
            None,
        );
        vm.intrinsics.async_generator_prototype = Some(prototype);
        Ok(())
    }
}

fn self_iterator(_vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(this)
}

fn this_generator(vm: &mut Vm, this: &Value) -> JsResult<crate::object::Gc<crate::object::AsyncGeneratorData>> {
    match this {
        Value::AsyncGeneratorObject(g) => Ok(g.clone()),
        _ => Err(vm.throw_type_error("receiver is not an AsyncGenerator")),
    }
}

fn settled_result(vm: &mut Vm, done: bool, value: Value) -> JsResult<Value> {
    let result = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    crate::builtins::util::define_value(&result, "done", Value::Boolean(done));
    crate::builtins::util::define_value(&result, "value", value);
    Ok(result)
}

/// Marks the generator done and returns `{done: true, value: undefined}` —
/// there is no suspended body to resume (§9 Open Question 1 decision (a)).
fn next(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let g = this_generator(vm, &this)?;
    g.borrow_mut().done = true;
    settled_result(vm, true, Value::Undefined)
}

fn do_return(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let g = this_generator(vm, &this)?;
    g.borrow_mut().done = true;
    settled_result(vm, true, arg(args, 0))
}

fn do_throw(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let g = this_generator(vm, &this)?;
    g.borrow_mut().done = true;
    Err(vm.throw_value(arg(args, 0)))
}
