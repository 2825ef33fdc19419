// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Atomics` (§4.E "Atomics"). The VM is single-threaded (§5: "scheduling
//! model: single-threaded cooperative"), so every operation below is a
//! plain sequential read-modify-write; the module exists to give scripts
//! the same observable contract a truly atomic implementation would, not
//! to provide real memory-ordering guarantees.

use crate::abstract_ops::{to_integer, to_number};
use crate::builtins::util::{arg, define_method, define_to_string_tag_symbol, new_plain_object};
use crate::error::JsResult;
use crate::object::{Gc, TypedArrayData};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;
use num_bigint::BigInt;

pub struct AtomicsModule;

impl BuiltinInitializer for AtomicsModule {
    fn name(&self) -> &'static str {
        "Atomics"
    }

    fn priority(&self) -> i32 {
        500
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Atomics", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Atomics",
                dependency: "Object",
            })?;
        if vm.intrinsics.typed_array_prototype.is_none() {
            return Err(RegistryError::MissingDependency {
                module: "Atomics",
                dependency: "TypedArray",
            });
        }

        let atomics = new_plain_object(object_prototype);
        define_method(&atomics, "add", 3, false, |vm, _t, a| rmw(vm, a, |o, d| o + d, |o, d| o + d));
        define_method(&atomics, "sub", 3, false, |vm, _t, a| rmw(vm, a, |o, d| o - d, |o, d| o - d));
        define_method(&atomics, "and", 3, false, |vm, _t, a| {
            rmw(vm, a, |o, d| bitwise_i32(o, d, |x, y| x & y), |o, d| o & d)
        });
        define_method(&atomics, "or", 3, false, |vm, _t, a| {
            rmw(vm, a, |o, d| bitwise_i32(o, d, |x, y| x | y), |o, d| o | d)
        });
        define_method(&atomics, "xor", 3, false, |vm, _t, a| {
            rmw(vm, a, |o, d| bitwise_i32(o, d, |x, y| x ^ y), |o, d| o ^ d)
        });
        define_method(&atomics, "exchange", 3, false, |vm, _t, a| rmw(vm, a, |_o, d| d, |_o, d| d.clone()));
        define_method(&atomics, "compareExchange", 4, false, compare_exchange);
        define_method(&atomics, "isLockFree", 1, false, is_lock_free);
        define_method(&atomics, "wait", 4, false, wait);
        define_method(&atomics, "waitAsync", 4, false, wait_async);
        define_method(&atomics, "notify", 3, false, notify);
        define_method(&atomics, "pause", 1, false, pause);
        define_method(&atomics, "load", 2, false, load);
        define_method(&atomics, "store", 3, false, store);
        define_to_string_tag_symbol(vm, &atomics, "Atomics");
        vm.define_global("Atomics", atomics);
        Ok(())
    }
}

fn typed_array_arg(vm: &mut Vm, args: &[Value]) -> JsResult<Gc<TypedArrayData>> {
    match arg(args, 0) {
        Value::TypedArray(ta) => {
            if !ta.borrow().kind.atomics_allowed() {
                return Err(vm.throw_type_error(
                    "Atomics operations do not support Float32Array/Float64Array/Uint8ClampedArray",
                ));
            }
            Ok(ta)
        }
        _ => Err(vm.throw_type_error("Atomics operations require an integer typed array")),
    }
}

fn index_arg(vm: &mut Vm, ta: &Gc<TypedArrayData>, args: &[Value], pos: usize) -> JsResult<usize> {
    let idx = to_integer(vm, &arg(args, pos))?;
    let len = ta.borrow().length;
    if idx < 0.0 || idx as usize >= len {
        return Err(vm.throw_range_error("index out of range"));
    }
    Ok(idx as usize)
}

fn read_raw(ta: &Gc<TypedArrayData>, idx: usize) -> Value {
    let t = ta.borrow();
    let start = t.byte_offset + idx * t.kind.bytes_per_element();
    let buf = t.buffer.borrow();
    let bytes = buf.bytes.borrow();
    t.kind.decode(&bytes[start..start + t.kind.bytes_per_element()])
}

fn write_raw_number(ta: &Gc<TypedArrayData>, idx: usize, n: f64) {
    let t = ta.borrow();
    let start = t.byte_offset + idx * t.kind.bytes_per_element();
    let buf = t.buffer.borrow();
    let mut bytes = buf.bytes.borrow_mut();
    t.kind.encode_number(&mut bytes[start..start + t.kind.bytes_per_element()], n);
}

fn write_raw_bigint(ta: &Gc<TypedArrayData>, idx: usize, n: &BigInt) {
    let t = ta.borrow();
    let start = t.byte_offset + idx * t.kind.bytes_per_element();
    let buf = t.buffer.borrow();
    let mut bytes = buf.bytes.borrow_mut();
    t.kind.encode_bigint(&mut bytes[start..start + t.kind.bytes_per_element()], n);
}

/// `ToUint32`-based bitwise op (§4.E: `clz32`/`imul` go through `ToUint32`;
/// the same convention applies to `Atomics.and/or/xor` on 32-bit-and-under
/// element kinds — values outside 32 bits never occur since the largest
/// non-BigInt atomics-eligible kind is `Int32`/`Uint32`).
fn bitwise_i32(a: f64, b: f64, op: fn(i64, i64) -> i64) -> f64 {
    op(a as i64, b as i64) as f64
}

fn rmw(
    vm: &mut Vm,
    args: &[Value],
    combine_num: fn(f64, f64) -> f64,
    combine_big: fn(&BigInt, &BigInt) -> BigInt,
) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    let idx = index_arg(vm, &ta, args, 1)?;
    let kind = ta.borrow().kind;
    let old = read_raw(&ta, idx);
    if kind.is_bigint() {
        let delta = match arg(args, 2) {
            Value::BigInt(n) => n,
            _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt")),
        };
        let old_big = match &old {
            Value::BigInt(n) => n.as_ref().clone(),
            _ => unreachable!("bigint-kind typed array always decodes to Value::BigInt"),
        };
        write_raw_bigint(&ta, idx, &combine_big(&old_big, &delta));
    } else {
        let delta = to_number(vm, &arg(args, 2))?;
        let old_num = old.as_f64().unwrap_or(0.0);
        write_raw_number(&ta, idx, combine_num(old_num, delta));
    }
    Ok(old)
}

fn compare_exchange(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    let idx = index_arg(vm, &ta, args, 1)?;
    let kind = ta.borrow().kind;
    let old = read_raw(&ta, idx);
    if kind.is_bigint() {
        let expect = match arg(args, 2) {
            Value::BigInt(n) => n,
            _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt")),
        };
        let replacement = match arg(args, 3) {
            Value::BigInt(n) => n,
            _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt")),
        };
        let old_big = match &old {
            Value::BigInt(n) => n.as_ref().clone(),
            _ => unreachable!(),
        };
        if old_big == *expect {
            write_raw_bigint(&ta, idx, &replacement);
        }
    } else {
        let expect = to_number(vm, &arg(args, 2))?;
        let replacement = to_number(vm, &arg(args, 3))?;
        if old.as_f64() == Some(expect) {
            write_raw_number(&ta, idx, replacement);
        }
    }
    Ok(old)
}

fn load(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    let idx = index_arg(vm, &ta, args, 1)?;
    Ok(read_raw(&ta, idx))
}

fn store(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    let idx = index_arg(vm, &ta, args, 1)?;
    let kind = ta.borrow().kind;
    if kind.is_bigint() {
        let value = match arg(args, 2) {
            Value::BigInt(n) => n,
            _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt")),
        };
        write_raw_bigint(&ta, idx, &value);
        Ok(Value::BigInt(value))
    } else {
        let value = to_number(vm, &arg(args, 2))?;
        write_raw_number(&ta, idx, value);
        Ok(Value::number(value))
    }
}

/// `Atomics.isLockFree(size)`: `{1,2,4,8}` -> true, else false (§4.E).
fn is_lock_free(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let size = to_integer(vm, &arg(args, 0))?;
    Ok(Value::Boolean(matches!(size as i64, 1 | 2 | 4 | 8)))
}

/// `Atomics.wait` always throws on a non-shared, single-threaded VM: there
/// is no other agent that could ever wake this one up (§4.E).
fn wait(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Atomics.wait cannot be called on the main thread"))
}

/// `Atomics.waitAsync` in single-threaded mode returns a synchronous result
/// record comparing the current value against `expected` (§4.E) rather
/// than ever truly suspending.
fn wait_async(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    let idx = index_arg(vm, &ta, args, 1)?;
    let kind = ta.borrow().kind;
    let current = read_raw(&ta, idx);
    let matches_expected = if kind.is_bigint() {
        match (&current, arg(args, 2)) {
            (Value::BigInt(c), Value::BigInt(e)) => **c == *e,
            _ => false,
        }
    } else {
        let expected = to_number(vm, &arg(args, 2))?;
        current.as_f64() == Some(expected)
    };
    let result = new_plain_object(Value::Null);
    crate::builtins::util::define_value(&result, "async", Value::Boolean(false));
    crate::builtins::util::define_value(
        &result,
        "value",
        Value::string(if matches_expected { "timed-out" } else { "not-equal" }),
    );
    Ok(result)
}

/// `Atomics.notify` always returns 0: a single-threaded VM can never have
/// another agent actually waiting (§4.E).
fn notify(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = typed_array_arg(vm, args)?;
    index_arg(vm, &ta, args, 1)?;
    Ok(Value::number(0.0))
}

/// `Atomics.pause(n?)`: validates `n` is a non-negative integral Number,
/// otherwise a no-op (§4.E).
fn pause(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    match arg(args, 0) {
        Value::Undefined => Ok(Value::Undefined),
        v => {
            let n = to_number(vm, &v)?;
            if n.is_nan() || n < 0.0 || n.trunc() != n {
                return Err(vm.throw_type_error("Atomics.pause argument must be a non-negative integer"));
            }
            Ok(Value::Undefined)
        }
    }
}
