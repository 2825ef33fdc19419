// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callable objects (§4.C). The four variants all satisfy the capability
//! set `{Call, Name, Arity, IsVariadic}`; this module provides the
//! uniform accessors and the constructors every builtin module uses to
//! mint native functions.

use std::rc::Rc;

use crate::object::{new_gc, NativeFn, NativeFunctionData, NativeFunctionWithPropsData};
use crate::value::Value;
use crate::vm::Vm;

/// A plain `NativeFunction`: callable without own properties (§4.C).
pub fn create_native_function(name: &str, arity: u32, variadic: bool, func: NativeFn) -> Value {
    Value::NativeFunction(new_gc(NativeFunctionData {
        name: Rc::from(name),
        arity,
        variadic,
        func,
    }))
}

/// A `NativeFunctionWithProps`: usable as a constructor, carries its own
/// property bag and a `prototype` slot (§4.C). `function_prototype` is the
/// `[[Prototype]]` of the function object itself (e.g. every constructor's
/// own prototype is `Function.prototype`, not the prototype it builds
/// instances from).
pub fn create_constructor_function(
    vm: &Vm,
    name: &str,
    arity: u32,
    variadic: bool,
    func: NativeFn,
) -> Value {
    let function_prototype = vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null);
    create_constructor_function_with_proto(function_prototype, name, arity, variadic, func)
}

pub fn create_constructor_function_with_proto(
    function_prototype: Value,
    name: &str,
    arity: u32,
    variadic: bool,
    func: NativeFn,
) -> Value {
    let call = NativeFunctionData {
        name: Rc::from(name),
        arity,
        variadic,
        func,
    };
    Value::NativeFunctionWithProps(new_gc(NativeFunctionWithPropsData::new(call, function_prototype)))
}

/// Links `constructor.prototype = prototype_object` (non-enumerable,
/// non-configurable, non-writable — standard for built-in constructors) and
/// `prototype_object.constructor = constructor` (non-enumerable).
pub fn link_constructor_and_prototype(constructor: &Value, prototype_object: &Value) {
    constructor.with_base_mut(|b| {
        b.slots
            .set_own_frozen("prototype", prototype_object.clone());
    });
    prototype_object.with_base_mut(|b| {
        b.slots.set_own_non_enumerable("constructor", constructor.clone());
    });
}

/// Sets `[[Prototype]]` of a constructor function object to another
/// constructor (e.g. `Object.getPrototypeOf(Int32Array) === TypedArray`,
/// §4.D).
pub fn set_constructor_prototype_link(constructor: &Value, parent_constructor: &Value) {
    constructor.with_base_mut(|b| {
        b.prototype = parent_constructor.clone();
    });
}

pub fn function_name(v: &Value) -> Option<Rc<str>> {
    match v {
        Value::NativeFunction(f) => Some(f.borrow().name.clone()),
        Value::NativeFunctionWithProps(f) => Some(f.borrow().call.name.clone()),
        Value::Closure(f) => Some(f.borrow().name.clone()),
        Value::BoundFunction(f) => Some(f.borrow().name.clone()),
        _ => None,
    }
}

pub fn function_arity(v: &Value) -> Option<u32> {
    match v {
        Value::NativeFunction(f) => Some(f.borrow().arity),
        Value::NativeFunctionWithProps(f) => Some(f.borrow().call.arity),
        Value::Closure(f) => Some(f.borrow().arity),
        Value::BoundFunction(f) => match &f.borrow().target {
            target @ (Value::NativeFunction(_) | Value::NativeFunctionWithProps(_) | Value::Closure(_)) => {
                function_arity(target).map(|a| a.saturating_sub(f.borrow().bound_args.len() as u32))
            }
            _ => Some(0),
        },
        _ => None,
    }
}

pub fn function_is_variadic(v: &Value) -> Option<bool> {
    match v {
        Value::NativeFunction(f) => Some(f.borrow().variadic),
        Value::NativeFunctionWithProps(f) => Some(f.borrow().call.variadic),
        Value::Closure(f) => Some(f.borrow().variadic),
        Value::BoundFunction(f) => function_is_variadic(&f.borrow().target),
        _ => None,
    }
}

/// `Function.prototype.call`/`apply`/`bind` dispatch through
/// [`Vm::call_function_directly`], which already dispatches on target kind
/// (native targets invoke `fn` directly, closures go through the VM's
/// direct-call entry) — §4.C.
pub fn call(vm: &mut Vm, target: &Value, this_arg: Value, args: &[Value]) -> crate::error::JsResult<Value> {
    if !target.is_callable() {
        return Err(vm.throw_type_error("value is not a function"));
    }
    vm.call_function_directly(target, this_arg, args)
}

