// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ArrayBuffer` / `SharedArrayBuffer` (§3 "ArrayBuffer / TypedArray", §12.3
//! Open Question 4). Both constructors build the same [`ArrayBufferData`]
//! record; `shared` only flips the `[[Prototype]]`/`@@toStringTag` and
//! which intrinsic slot the prototype is cached under — the byte storage
//! and every prototype method are identical (no separate byte-storage
//! type).

use crate::abstract_ops::to_integer;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, ArrayBufferData};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct ArrayBufferModule;

impl BuiltinInitializer for ArrayBufferModule {
    fn name(&self) -> &'static str {
        "ArrayBuffer"
    }

    fn priority(&self) -> i32 {
        410
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("ArrayBuffer", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "ArrayBuffer",
                dependency: "Object",
            })?;
        let constructor = install(vm, object_prototype, false, construct_array_buffer);
        vm.define_global("ArrayBuffer", constructor);
        Ok(())
    }
}

pub struct SharedArrayBufferModule;

impl BuiltinInitializer for SharedArrayBufferModule {
    fn name(&self) -> &'static str {
        "SharedArrayBuffer"
    }

    fn priority(&self) -> i32 {
        420
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("SharedArrayBuffer", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "SharedArrayBuffer",
                dependency: "Object",
            })?;
        let constructor = install(vm, object_prototype, true, construct_shared_array_buffer);
        vm.define_global("SharedArrayBuffer", constructor);
        Ok(())
    }
}

fn install(vm: &mut Vm, object_prototype: Value, shared: bool, construct: crate::object::NativeFn) -> Value {
    let name = if shared { "SharedArrayBuffer" } else { "ArrayBuffer" };
    let prototype = new_plain_object(object_prototype);

    let byte_length_getter = create_native_function("get byteLength", 0, false, byte_length_getter);
    crate::builtins::util::define_accessor(&prototype, "byteLength", Some(byte_length_getter), None);
    define_method(&prototype, "slice", 2, false, slice);
    let tag_getter = create_native_function("get [Symbol.toStringTag]", 0, false, to_string_tag_getter);
    crate::builtins::util::well_known_symbol_accessor(
        &prototype,
        vm.well_known_symbols.to_string_tag.clone(),
        Some(tag_getter),
        None,
    );

    if shared {
        vm.intrinsics.shared_array_buffer_prototype = Some(prototype.clone());
    } else {
        vm.intrinsics.array_buffer_prototype = Some(prototype.clone());
    }

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        name,
        1,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "isView", 1, false, is_view);
    constructor
}

fn to_buffer_length(vm: &mut Vm, v: &Value) -> JsResult<usize> {
    let n = to_integer(vm, v)?;
    if !(0.0..=u32::MAX as f64).contains(&n) {
        return Err(vm.throw_range_error("invalid array buffer length"));
    }
    Ok(n as usize)
}

fn construct_array_buffer(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let length = to_buffer_length(vm, &arg(args, 0))?;
    let prototype = vm.intrinsics.array_buffer_prototype.clone().unwrap_or(Value::Null);
    Ok(Value::ArrayBuffer(new_gc(ArrayBufferData::new(prototype, length, false))))
}

fn construct_shared_array_buffer(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let length = to_buffer_length(vm, &arg(args, 0))?;
    let prototype = vm
        .intrinsics
        .shared_array_buffer_prototype
        .clone()
        .unwrap_or(Value::Null);
    Ok(Value::ArrayBuffer(new_gc(ArrayBufferData::new(prototype, length, true))))
}

fn this_buffer(vm: &mut Vm, this: &Value) -> JsResult<crate::object::Gc<ArrayBufferData>> {
    match this {
        Value::ArrayBuffer(b) => Ok(b.clone()),
        _ => Err(vm.throw_type_error("receiver is not an ArrayBuffer")),
    }
}

fn byte_length_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let buf = this_buffer(vm, &this)?;
    let len = buf.borrow().byte_length();
    Ok(Value::number(len as f64))
}

fn to_string_tag_getter(_vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(this.with_base(|b| Value::string(b.class_name)).unwrap_or(Value::Undefined))
}

fn slice(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let buf = this_buffer(vm, &this)?;
    let len = buf.borrow().byte_length();
    let normalize = |n: f64| -> usize {
        if n < 0.0 {
            ((len as f64 + n).max(0.0)) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => normalize(to_integer(vm, &v)?),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => normalize(to_integer(vm, &v)?),
    };
    let copied: Vec<u8> = if start < end {
        buf.borrow().bytes.borrow()[start..end].to_vec()
    } else {
        Vec::new()
    };
    let (prototype, shared) = {
        let b = buf.borrow();
        (b.base.prototype.clone(), b.shared)
    };
    let new_buf = ArrayBufferData::new(prototype, copied.len(), shared);
    new_buf.bytes.borrow_mut().copy_from_slice(&copied);
    Ok(Value::ArrayBuffer(new_gc(new_buf)))
}

fn is_view(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::TypedArray(_))))
}
