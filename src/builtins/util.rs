// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers every builtin module uses to allocate objects and wire up
//! methods. Factored out once everything started reaching for the same
//! three or four lines.

use crate::function::create_native_function;
use crate::object::{new_gc, ArrayData, NativeFn, ObjectData};
use crate::property::Key;
use crate::value::Value;
use crate::vm::Vm;

pub fn arg(args: &[Value], idx: usize) -> Value {
    args.get(idx).cloned().unwrap_or(Value::Undefined)
}

pub fn new_plain_object(prototype: Value) -> Value {
    Value::PlainObject(new_gc(ObjectData::new(prototype)))
}

pub fn new_array(prototype: Value, elements: Vec<Value>) -> Value {
    Value::Array(new_gc(ArrayData::from_elements(prototype, elements)))
}

/// Installs a non-enumerable, writable, configurable method — the standard
/// attribute set for built-in prototype/namespace methods (§6: "Each
/// prototype's `constructor` property is non-enumerable"; the same
/// convention applies to every other inherited method).
pub fn define_method(target: &Value, name: &str, arity: u32, variadic: bool, func: NativeFn) {
    let f = create_native_function(name, arity, variadic, func);
    target.with_base_mut(|b| b.slots.set_own_non_enumerable(name, f));
}

pub fn define_value(target: &Value, name: &str, value: Value) {
    target.with_base_mut(|b| b.slots.set_own_non_enumerable(name, value));
}

pub fn define_constant(target: &Value, name: &str, value: Value) {
    target.with_base_mut(|b| b.slots.set_own_frozen(name, value));
}

pub fn define_accessor(
    target: &Value,
    name: &str,
    getter: Option<Value>,
    setter: Option<Value>,
) {
    target.with_base_mut(|b| {
        b.slots
            .define_accessor_property(name, getter, setter, false, true)
    });
}

pub fn well_known_symbol_accessor(
    target: &Value,
    symbol: crate::symbol::Symbol,
    getter: Option<Value>,
    setter: Option<Value>,
) {
    target.with_base_mut(|b| {
        b.slots
            .define_accessor_property(symbol, getter, setter, false, true)
    });
}

/// `Symbol.toStringTag` on namespace objects (`Math`, `Atomics`,
/// `Temporal.*`): non-writable, non-enumerable, configurable (§6).
pub fn define_to_string_tag_symbol(vm: &Vm, target: &Value, tag: &str) {
    target.with_base_mut(|b| {
        b.slots.define_own_property(
            crate::property::Key::Symbol(vm.well_known_symbols.to_string_tag.clone()),
            Some(Value::string(tag)),
            crate::property::PropertyAttributes::all(false, false, true),
        )
    });
}

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::IntegerNumber(i) => *i != 0,
        Value::FloatNumber(f) => *f != 0.0 && !f.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub fn require_callable(vm: &mut Vm, v: &Value, what: &str) -> crate::error::JsResult<()> {
    if v.is_callable() {
        Ok(())
    } else {
        Err(vm.throw_type_error(&format!("{what} is not a function")))
    }
}

/// `GetIterator` (§5: "Iterator consumption... is strictly left-to-right"):
/// looks up `@@iterator`, calls it with `iterable` as `this`, returns the
/// resulting iterator object.
pub fn get_iterator(vm: &mut Vm, iterable: &Value) -> crate::error::JsResult<Value> {
    let key = Key::Symbol(vm.well_known_symbols.iterator.clone());
    let iter_fn = vm.get_property(iterable, &key)?;
    require_callable(vm, &iter_fn, "[Symbol.iterator]")?;
    vm.call_function_directly(&iter_fn, iterable.clone(), &[])
}

/// `IteratorStep`: calls `iterator.next()` and returns `Some(value)` unless
/// the result's `done` is truthy.
pub fn iterator_step(vm: &mut Vm, iterator: &Value) -> crate::error::JsResult<Option<Value>> {
    let next_fn = vm.get_property(iterator, &Key::from("next"))?;
    require_callable(vm, &next_fn, "iterator.next")?;
    let result = vm.call_function_directly(&next_fn, iterator.clone(), &[])?;
    if truthy(&vm.get_property(&result, &Key::from("done"))?) {
        Ok(None)
    } else {
        Ok(Some(vm.get_property(&result, &Key::from("value"))?))
    }
}

/// `IteratorClose` on the error path only: calls `iterator.return()` if
/// present, discarding whatever it returns or throws (§7: "the exception is
/// iterator cleanup in `Math.sumPrecise`, which... calls the iterator's
/// `return()` method (ignoring any error it throws)").
pub fn iterator_close(vm: &mut Vm, iterator: &Value) {
    if let Ok(return_fn) = vm.get_property(iterator, &Key::from("return")) {
        if return_fn.is_callable() {
            let _ = vm.call_function_directly(&return_fn, iterator.clone(), &[]);
        }
    }
}
