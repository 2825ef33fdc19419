// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The VM singleton (§3 "VM singleton") and the invocation protocol
//! (§4.C). "Process-wide" here means "single per `Vm` instance" (§9 design
//! notes): every piece of mutable state lives as a field on [`Vm`], not as
//! a true global, so embedding multiple VMs in one process is possible even
//! though a given script only ever runs against one.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ErrorKind, JsError, JsResult};
use crate::object::{ClosureData, ElementKind};
use crate::property::{Key, PropertyStore, SlotValue};
use crate::symbol::WellKnownSymbols;
use crate::value::Value;

/// A hook the host interpreter installs to drive [`ClosureData`] calls.
/// The compiler/interpreter are external collaborators (§1); this crate
/// never constructs a `Closure` itself, but natives like `Array.prototype.map`
/// must be able to call one if the host put one in a receiver's properties.
pub type ClosureInvoker = fn(&mut Vm, &ClosureData, Value, &[Value]) -> JsResult<Value>;

fn default_closure_invoker(vm: &mut Vm, _closure: &ClosureData, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("closure invocation requires a host interpreter"))
}

/// Pre-initialized intrinsic prototype slots (§3). Populated incrementally
/// during the runtime phase by each [`crate::registry::BuiltinInitializer`]
/// in priority order; later modules may assume earlier ones already ran.
#[derive(Debug, Default)]
pub struct Intrinsics {
    pub object_prototype: Option<Value>,
    pub function_prototype: Option<Value>,
    pub array_prototype: Option<Value>,
    pub number_prototype: Option<Value>,
    pub bigint_prototype: Option<Value>,
    pub boolean_prototype: Option<Value>,
    pub string_prototype: Option<Value>,
    pub symbol_prototype: Option<Value>,
    pub typed_array_prototype: Option<Value>,
    pub typed_array_prototypes: HashMap<u8, Value>,
    pub array_buffer_prototype: Option<Value>,
    pub shared_array_buffer_prototype: Option<Value>,
    pub error_prototypes: HashMap<ErrorKind, Value>,
    pub error_constructors: HashMap<ErrorKind, Value>,
    pub temporal_prototypes: HashMap<&'static str, Value>,
    pub generator_prototype: Option<Value>,
    pub async_generator_prototype: Option<Value>,
}

impl Intrinsics {
    pub fn typed_array_prototype_for(&self, kind: ElementKind) -> Option<&Value> {
        self.typed_array_prototypes.get(&element_kind_tag(kind))
    }

    pub fn set_typed_array_prototype_for(&mut self, kind: ElementKind, proto: Value) {
        self.typed_array_prototypes.insert(element_kind_tag(kind), proto);
    }
}

fn element_kind_tag(kind: ElementKind) -> u8 {
    match kind {
        ElementKind::Int8 => 0,
        ElementKind::Uint8 => 1,
        ElementKind::Uint8Clamped => 2,
        ElementKind::Int16 => 3,
        ElementKind::Uint16 => 4,
        ElementKind::Int32 => 5,
        ElementKind::Uint32 => 6,
        ElementKind::Float32 => 7,
        ElementKind::Float64 => 8,
        ElementKind::BigInt64 => 9,
        ElementKind::BigUint64 => 10,
    }
}

pub struct Vm {
    /// `this` register of the current call (§3).
    pub this_register: Value,
    /// Constructor-call flag, observable via [`Vm::is_constructor_call`]
    /// (§4.C point 5).
    constructor_call: bool,
    /// Unwinding flag: `true` after a native signals an exception and
    /// before a handler catches it (§7, glossary "Unwinding").
    unwinding: bool,
    pending_exception: Option<Value>,
    /// Helper-call depth counter bracketing native-to-VM re-entry (§4.C
    /// point 3, glossary "Helper-call depth").
    helper_call_depth: u32,
    pub intrinsics: Intrinsics,
    pub well_known_symbols: WellKnownSymbols,
    pub globals: PropertyStore,
    pub closure_invoker: ClosureInvoker,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            this_register: Value::Undefined,
            constructor_call: false,
            unwinding: false,
            pending_exception: None,
            helper_call_depth: 0,
            intrinsics: Intrinsics::default(),
            well_known_symbols: WellKnownSymbols::new(),
            globals: PropertyStore::new(),
            closure_invoker: default_closure_invoker,
        }
    }

    pub fn define_global(&mut self, name: impl Into<Rc<str>>, value: Value) {
        self.globals.set_own_non_enumerable(Key::String(name.into()), value);
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals
            .get_own(&Key::from(name))
            .and_then(|slot| match &slot.value {
                SlotValue::Data(v) => Some(v.clone()),
                SlotValue::Accessor { .. } => None,
            })
    }

    pub fn is_constructor_call(&self) -> bool {
        self.constructor_call
    }

    pub fn set_constructor_call(&mut self, flag: bool) {
        self.constructor_call = flag;
    }

    pub fn is_unwinding(&self) -> bool {
        self.unwinding
    }

    /// Whether a `try`/`catch` handler further up the (external) call stack
    /// has already claimed the pending exception. This crate has no
    /// interpreter of its own to track handler frames, so natives should
    /// treat "not unwinding" as "handled" and short-circuit purely on
    /// [`Vm::is_unwinding`] — this accessor exists to match the protocol
    /// vocabulary spec.md uses (glossary "Unwinding").
    pub fn is_handler_found(&self) -> bool {
        !self.unwinding
    }

    pub fn enter_helper_call(&mut self) {
        self.helper_call_depth += 1;
    }

    pub fn exit_helper_call(&mut self) {
        debug_assert!(self.helper_call_depth > 0);
        self.helper_call_depth = self.helper_call_depth.saturating_sub(1);
    }

    pub fn helper_call_depth(&self) -> u32 {
        self.helper_call_depth
    }

    fn raise(&mut self, value: Value) -> JsError {
        self.unwinding = true;
        self.pending_exception = Some(value.clone());
        JsError::new(value)
    }

    pub fn clear_unwinding(&mut self) {
        self.unwinding = false;
        self.pending_exception = None;
    }

    fn make_error(&mut self, kind: ErrorKind, message: &str) -> Value {
        let prototype = self
            .intrinsics
            .error_prototypes
            .get(&kind)
            .cloned()
            .unwrap_or(Value::Null);
        let mut base = crate::object::ObjectBase::new(prototype, "Error");
        base.slots.set_own("name", Value::string(kind.name()));
        base.slots.set_own("message", Value::string(message));
        base.slots
            .set_own_non_enumerable("stack", Value::string(format!("{}: {}", kind.name(), message)));
        Value::PlainObject(crate::object::new_gc(crate::object::ObjectData {
            base,
            extensible: true,
        }))
    }

    pub fn throw(&mut self, kind: ErrorKind, message: &str) -> JsError {
        let err = self.make_error(kind, message);
        self.raise(err)
    }

    pub fn throw_type_error(&mut self, message: &str) -> JsError {
        self.throw(ErrorKind::TypeError, message)
    }

    pub fn throw_range_error(&mut self, message: &str) -> JsError {
        self.throw(ErrorKind::RangeError, message)
    }

    pub fn throw_syntax_error(&mut self, message: &str) -> JsError {
        self.throw(ErrorKind::SyntaxError, message)
    }

    pub fn throw_reference_error(&mut self, message: &str) -> JsError {
        self.throw(ErrorKind::ReferenceError, message)
    }

    pub fn throw_value(&mut self, value: Value) -> JsError {
        self.raise(value)
    }

    /// The invocation protocol's re-entry point (§4.C point 3): call a
    /// `Value` as a function, bracketed by helper-call depth tracking so
    /// nested exceptions unwind past this native.
    pub fn call_function_directly(
        &mut self,
        callable: &Value,
        this_arg: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        self.enter_helper_call();
        let result = self.call_function_directly_inner(callable, this_arg, args);
        self.exit_helper_call();
        result
    }

    fn call_function_directly_inner(
        &mut self,
        callable: &Value,
        this_arg: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        match callable {
            Value::NativeFunction(f) => {
                let func = f.borrow().func;
                func(self, this_arg, args)
            }
            Value::NativeFunctionWithProps(f) => {
                let func = f.borrow().call.func;
                func(self, this_arg, args)
            }
            Value::BoundFunction(b) => {
                let (target, bound_this, prefix) = {
                    let data = b.borrow();
                    (data.target.clone(), data.bound_this.clone(), data.bound_args.clone())
                };
                let mut full_args = prefix;
                full_args.extend_from_slice(args);
                self.call_function_directly_inner(&target, bound_this, &full_args)
            }
            Value::Closure(c) => {
                let invoker = self.closure_invoker;
                let data = c.borrow();
                invoker(self, &data, this_arg, args)
            }
            _ => Err(self.throw_type_error("value is not callable")),
        }
    }

    /// `bind`: produces a `BoundFunction` (§4.C).
    pub fn bind_function(&mut self, target: Value, bound_this: Value, bound_args: Vec<Value>, name: Rc<str>) -> Value {
        let function_prototype = self.intrinsics.function_prototype.clone().unwrap_or(Value::Null);
        Value::BoundFunction(crate::object::new_gc(crate::object::BoundFunctionData {
            target,
            bound_this,
            bound_args,
            name,
            base: crate::object::ObjectBase::new(function_prototype, "Function"),
        }))
    }

    /// Generic `Get` (§4.B): walks the prototype chain; an accessor slot
    /// invokes the getter with `this` bound to the original receiver, not
    /// the holder.
    pub fn get_property(&mut self, receiver: &Value, key: &Key) -> JsResult<Value> {
        if let Some(v) = self.try_fast_path_get(receiver, key)? {
            return Ok(v);
        }
        let mut holder = receiver.clone();
        loop {
            let found = holder.with_base(|b| b.slots.get_own(key).cloned());
            match found {
                Some(Some(slot)) => {
                    return match slot.value {
                        SlotValue::Data(v) => Ok(v),
                        SlotValue::Accessor { get, .. } => match get {
                            Some(getter) if getter.is_callable() => {
                                self.call_function_directly(&getter, receiver.clone(), &[])
                            }
                            _ => Ok(Value::Undefined),
                        },
                    };
                }
                Some(None) => {
                    let proto = holder.prototype();
                    if proto.is_null() || proto.is_undefined() {
                        return Ok(Value::Undefined);
                    }
                    holder = proto;
                }
                None => return Ok(Value::Undefined),
            }
        }
    }

    /// `SetOwn`-style `Set` used by natives; does not walk the prototype
    /// chain for setters beyond the receiver's own accessor (sufficient for
    /// this crate's scope: builtin modules never install inherited
    /// setters that must be triggered through a subclass receiver).
    pub fn set_property(&mut self, receiver: &Value, key: Key, value: Value) -> JsResult<()> {
        if self.try_fast_path_set(receiver, &key, &value)? {
            return Ok(());
        }
        let accessor_setter = receiver.with_base(|b| match b.slots.get_own(&key) {
            Some(slot) => match &slot.value {
                SlotValue::Accessor { set, .. } => Some(set.clone()),
                SlotValue::Data(_) => None,
            },
            None => None,
        }).flatten();
        if let Some(setter) = accessor_setter {
            if let Some(setter) = setter {
                if setter.is_callable() {
                    self.call_function_directly(&setter, receiver.clone(), std::slice::from_ref(&value))?;
                    return Ok(());
                }
            }
            // setter-less accessor: writes fail silently (§4.B).
            return Ok(());
        }
        receiver.with_base_mut(|b| b.slots.set_own(key, value));
        Ok(())
    }

    fn try_fast_path_get(&mut self, receiver: &Value, key: &Key) -> JsResult<Option<Value>> {
        if let Key::String(s) = key {
            if let Value::Array(arr) = receiver {
                if s.as_ref() == "length" {
                    return Ok(Some(Value::number(arr.borrow().elements.len() as f64)));
                }
                if let Some(idx) = canonical_index(s) {
                    let elements = &arr.borrow().elements;
                    return Ok(Some(elements.get(idx).cloned().unwrap_or(Value::Undefined)));
                }
            }
            if let Value::TypedArray(ta) = receiver {
                if s.as_ref() == "length" {
                    return Ok(Some(Value::number(ta.borrow().length as f64)));
                }
                if let Some(idx) = canonical_index(s) {
                    let ta = ta.borrow();
                    if idx >= ta.length {
                        return Ok(Some(Value::Undefined));
                    }
                    let start = ta.byte_offset + idx * ta.kind.bytes_per_element();
                    let buffer = ta.buffer.borrow();
                    let bytes = buffer.bytes.borrow();
                    return Ok(Some(ta.kind.decode(&bytes[start..start + ta.kind.bytes_per_element()])));
                }
            }
        }
        Ok(None)
    }

    fn try_fast_path_set(&mut self, receiver: &Value, key: &Key, value: &Value) -> JsResult<bool> {
        if let Key::String(s) = key {
            if let Value::Array(arr) = receiver {
                if s.as_ref() == "length" {
                    let new_len = self.to_integer_usize(value)?;
                    arr.borrow_mut().elements.resize(new_len, Value::Undefined);
                    return Ok(true);
                }
                if let Some(idx) = canonical_index(s) {
                    let mut data = arr.borrow_mut();
                    if idx >= data.elements.len() {
                        data.elements.resize(idx + 1, Value::Undefined);
                    }
                    data.elements[idx] = value.clone();
                    return Ok(true);
                }
            }
            if let Value::TypedArray(ta) = receiver {
                if let Some(idx) = canonical_index(s) {
                    let (start, len, kind, buffer) = {
                        let ta_ref = ta.borrow();
                        (
                            ta_ref.byte_offset + idx * ta_ref.kind.bytes_per_element(),
                            ta_ref.length,
                            ta_ref.kind,
                            ta_ref.buffer.clone(),
                        )
                    };
                    // Integer-Indexed Exotic Object `[[Set]]`: an out-of-range
                    // index is a silent no-op, never a throw.
                    if idx >= len {
                        return Ok(true);
                    }
                    if kind.is_bigint() {
                        match value {
                            Value::BigInt(n) => {
                                let buf = buffer.borrow();
                                let mut bytes = buf.bytes.borrow_mut();
                                kind.encode_bigint(&mut bytes[start..start + kind.bytes_per_element()], n);
                            }
                            _ => {
                                return Err(self.throw_type_error(
                                    "Cannot convert value to a BigInt for a BigInt64Array/BigUint64Array element",
                                ))
                            }
                        }
                    } else {
                        if matches!(value, Value::BigInt(_)) {
                            return Err(self.throw_type_error("Cannot convert a BigInt value to a number"));
                        }
                        let n = crate::abstract_ops::to_number(self, value)?;
                        let buf = buffer.borrow();
                        let mut bytes = buf.bytes.borrow_mut();
                        kind.encode_number(&mut bytes[start..start + kind.bytes_per_element()], n);
                    }
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn to_integer_usize(&mut self, v: &Value) -> JsResult<usize> {
        let n = crate::abstract_ops::to_number(self, v)?;
        Ok(n.max(0.0) as usize)
    }

    /// `HasOwnProperty`/`Delete`/`OwnKeys` delegate straight to the
    /// receiver's own [`PropertyStore`]; only `Get`/`Set` need the fast
    /// paths and prototype walk above.
    pub fn has_own(&self, receiver: &Value, key: &Key) -> bool {
        if let Key::String(s) = key {
            if let Value::Array(arr) = receiver {
                if s.as_ref() == "length" {
                    return true;
                }
                if let Some(idx) = canonical_index(s) {
                    return idx < arr.borrow().elements.len();
                }
            }
            if let Value::TypedArray(ta) = receiver {
                if s.as_ref() == "length" {
                    return true;
                }
                if let Some(idx) = canonical_index(s) {
                    return idx < ta.borrow().length;
                }
            }
        }
        receiver.with_base(|b| b.slots.has_own(key)).unwrap_or(false)
    }
}

/// Parses a canonical array index string ("0", "1", "23", never "01",
/// "+1", or "-0").
pub fn canonical_index(s: &str) -> Option<usize> {
    if s == "0" {
        return Some(0);
    }
    if s.starts_with('0') || s.starts_with('+') || s.starts_with('-') {
        return None;
    }
    let idx: usize = s.parse().ok()?;
    if idx.to_string() == s {
        Some(idx)
    } else {
        None
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_index_rejects_leading_zero() {
        assert_eq!(canonical_index("0"), Some(0));
        assert_eq!(canonical_index("12"), Some(12));
        assert_eq!(canonical_index("01"), None);
        assert_eq!(canonical_index("-0"), None);
        assert_eq!(canonical_index("+1"), None);
    }

    #[test]
    fn helper_call_depth_balances() {
        let mut vm = Vm::new();
        assert_eq!(vm.helper_call_depth(), 0);
        vm.enter_helper_call();
        vm.enter_helper_call();
        assert_eq!(vm.helper_call_depth(), 2);
        vm.exit_helper_call();
        vm.exit_helper_call();
        assert_eq!(vm.helper_call_depth(), 0);
    }
}
