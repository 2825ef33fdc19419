// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed arrays (§3 "ArrayBuffer / TypedArray", §4.D priority table, §4.E
//! "Typed-array constructors share a common prototype wiring helper").
//! [`TypedArrayBaseModule`] installs the abstract `%TypedArray%` prototype
//! and constructor that every concrete array inherits from; one
//! [`ConcreteTypedArrayModule`] per [`ElementKind`] installs the actual
//! `Int8Array`/`Uint8Array`/... global, following the one-module-per-
//! intrinsic shape even though eleven of these modules differ only in
//! which `ElementKind` they close over.

use crate::abstract_ops::to_integer;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, ArrayBufferData, ElementKind, TypedArrayData};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct TypedArrayBaseModule;

impl BuiltinInitializer for TypedArrayBaseModule {
    fn name(&self) -> &'static str {
        "TypedArray"
    }

    fn priority(&self) -> i32 {
        400
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("TypedArray", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "TypedArray",
                dependency: "Object",
            })?;
        let prototype = new_plain_object(object_prototype);
        install_shared_accessors(vm, &prototype);
        define_method(&prototype, "set", 1, false, set);
        define_method(&prototype, "subarray", 2, false, subarray);
        define_method(&prototype, "fill", 1, true, fill);
        vm.intrinsics.typed_array_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "TypedArray",
            0,
            false,
            construct_abstract,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        vm.define_global("TypedArray", constructor);
        Ok(())
    }
}

/// `byteOffset + length*bytesPerElement <= buffer.byteLength` and every
/// `buffer`/`byteLength`/`byteOffset` accessor, installed once on the
/// shared `%TypedArray%` prototype since they read generically off
/// `this`'s [`TypedArrayData`] regardless of concrete element kind.
fn install_shared_accessors(vm: &mut Vm, prototype: &Value) {
    let buffer_getter = create_native_function("get buffer", 0, false, buffer_getter);
    crate::builtins::util::define_accessor(prototype, "buffer", Some(buffer_getter), None);
    let byte_length_getter = create_native_function("get byteLength", 0, false, byte_length_getter);
    crate::builtins::util::define_accessor(prototype, "byteLength", Some(byte_length_getter), None);
    let byte_offset_getter = create_native_function("get byteOffset", 0, false, byte_offset_getter);
    crate::builtins::util::define_accessor(prototype, "byteOffset", Some(byte_offset_getter), None);
    let tag_getter = create_native_function("get [Symbol.toStringTag]", 0, false, to_string_tag_getter);
    crate::builtins::util::well_known_symbol_accessor(
        prototype,
        vm.well_known_symbols.to_string_tag.clone(),
        Some(tag_getter),
        None,
    );
}

fn construct_abstract(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("abstract class TypedArray not directly constructable"))
}

fn this_typed_array(vm: &mut Vm, this: &Value) -> JsResult<crate::object::Gc<TypedArrayData>> {
    match this {
        Value::TypedArray(ta) => Ok(ta.clone()),
        _ => Err(vm.throw_type_error("receiver is not a typed array")),
    }
}

fn buffer_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let ta = this_typed_array(vm, &this)?;
    let buffer = ta.borrow().buffer.clone();
    Ok(Value::ArrayBuffer(buffer))
}

fn byte_length_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let ta = this_typed_array(vm, &this)?;
    let len = ta.borrow().byte_length();
    Ok(Value::number(len as f64))
}

fn byte_offset_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let ta = this_typed_array(vm, &this)?;
    let offset = ta.borrow().byte_offset;
    Ok(Value::number(offset as f64))
}

fn to_string_tag_getter(_vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    match &this {
        Value::TypedArray(ta) => Ok(Value::string(ta.borrow().kind.constructor_name())),
        _ => Ok(Value::Undefined),
    }
}

/// `%TypedArray%.prototype.set(source, offset=0)`: copies elements from
/// `source` (another typed array or an array-like) into `this`, converting
/// each element through `this`'s element kind.
fn set(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let dest = this_typed_array(vm, &this)?;
    let offset = match arg(args, 1) {
        Value::Undefined => 0,
        v => to_integer(vm, &v)?.max(0.0) as usize,
    };
    let source = arg(args, 0);
    let values: Vec<Value> = match &source {
        Value::TypedArray(src) => {
            let src = src.borrow();
            (0..src.length)
                .map(|i| {
                    let start = src.byte_offset + i * src.kind.bytes_per_element();
                    let buf = src.buffer.borrow();
                    let bytes = buf.bytes.borrow();
                    src.kind.decode(&bytes[start..start + src.kind.bytes_per_element()])
                })
                .collect()
        }
        _ => {
            let len_key = crate::property::Key::from("length");
            let len_value = vm.get_property(&source, &len_key)?;
            let len = crate::abstract_ops::to_integer(vm, &len_value)?.max(0.0) as usize;
            (0..len)
                .map(|i| vm.get_property(&source, &crate::property::Key::from(i.to_string().as_str())))
                .collect::<JsResult<Vec<_>>>()?
        }
    };
    let (kind, dest_len, byte_offset, buffer) = {
        let d = dest.borrow();
        (d.kind, d.length, d.byte_offset, d.buffer.clone())
    };
    if offset + values.len() > dest_len {
        return Err(vm.throw_range_error("source is too large for the destination typed array"));
    }
    for (i, v) in values.into_iter().enumerate() {
        let idx = offset + i;
        let start = byte_offset + idx * kind.bytes_per_element();
        if kind.is_bigint() {
            match &v {
                Value::BigInt(n) => {
                    let buf = buffer.borrow();
                    let mut bytes = buf.bytes.borrow_mut();
                    kind.encode_bigint(&mut bytes[start..start + kind.bytes_per_element()], n);
                }
                _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt typed array element")),
            }
        } else {
            let n = crate::abstract_ops::to_number(vm, &v)?;
            let buf = buffer.borrow();
            let mut bytes = buf.bytes.borrow_mut();
            kind.encode_number(&mut bytes[start..start + kind.bytes_per_element()], n);
        }
    }
    Ok(Value::Undefined)
}

/// `%TypedArray%.prototype.subarray(start, end)`: a new view over the same
/// buffer, never copying bytes.
fn subarray(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = this_typed_array(vm, &this)?;
    let (kind, length, byte_offset, buffer, prototype) = {
        let t = ta.borrow();
        (t.kind, t.length, t.byte_offset, t.buffer.clone(), t.base.prototype.clone())
    };
    let normalize = |n: f64| -> usize {
        if n < 0.0 {
            ((length as f64 + n).max(0.0)) as usize
        } else {
            (n as usize).min(length)
        }
    };
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => normalize(to_integer(vm, &v)?),
    };
    let end = match arg(args, 1) {
        Value::Undefined => length,
        v => normalize(to_integer(vm, &v)?),
    };
    let new_length = end.saturating_sub(start);
    let new_offset = byte_offset + start * kind.bytes_per_element();
    Ok(Value::TypedArray(new_gc(TypedArrayData {
        base: crate::object::ObjectBase::new(prototype, kind.constructor_name()),
        buffer,
        byte_offset: new_offset,
        length: new_length,
        kind,
    })))
}

fn fill(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let ta = this_typed_array(vm, &this)?;
    let value = arg(args, 0);
    let (kind, length, byte_offset, buffer) = {
        let t = ta.borrow();
        (t.kind, t.length, t.byte_offset, t.buffer.clone())
    };
    let normalize = |n: f64| -> usize {
        if n < 0.0 {
            ((length as f64 + n).max(0.0)) as usize
        } else {
            (n as usize).min(length)
        }
    };
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => normalize(to_integer(vm, &v)?),
    };
    let end = match arg(args, 2) {
        Value::Undefined => length,
        v => normalize(to_integer(vm, &v)?),
    };
    if kind.is_bigint() {
        let n = match &value {
            Value::BigInt(n) => n.clone(),
            _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt typed array element")),
        };
        for idx in start..end {
            let elem_start = byte_offset + idx * kind.bytes_per_element();
            let buf = buffer.borrow();
            let mut bytes = buf.bytes.borrow_mut();
            kind.encode_bigint(&mut bytes[elem_start..elem_start + kind.bytes_per_element()], &n);
        }
    } else {
        let n = crate::abstract_ops::to_number(vm, &value)?;
        for idx in start..end {
            let elem_start = byte_offset + idx * kind.bytes_per_element();
            let buf = buffer.borrow();
            let mut bytes = buf.bytes.borrow_mut();
            kind.encode_number(&mut bytes[elem_start..elem_start + kind.bytes_per_element()], n);
        }
    }
    Ok(this)
}

/// One instance per [`ElementKind`] (§4.D: `BigInt64Array, BigUint64Array,
/// Int32Array, …` all at priority 430, depending on the base `TypedArray`
/// and `ArrayBuffer` modules already having run).
pub struct ConcreteTypedArrayModule(pub ElementKind);

impl BuiltinInitializer for ConcreteTypedArrayModule {
    fn name(&self) -> &'static str {
        self.0.constructor_name()
    }

    fn priority(&self) -> i32 {
        430
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global(self.0.constructor_name(), Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let name = self.0.constructor_name();
        if vm.intrinsics.object_prototype.is_none() {
            return Err(RegistryError::MissingDependency {
                module: name,
                dependency: "Object",
            });
        }
        let base_prototype = vm
            .intrinsics
            .typed_array_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: name,
                dependency: "TypedArray",
            })?;
        // ArrayBuffer is required to construct instances but not to define
        // the shape of the prototype/constructor themselves; still declared
        // as a dependency since `new Int32Array(n)` allocates one.
        if vm.intrinsics.array_buffer_prototype.is_none() {
            return Err(RegistryError::MissingDependency {
                module: name,
                dependency: "ArrayBuffer",
            });
        }

        let prototype = new_plain_object(base_prototype);
        crate::builtins::util::define_constant(
            &prototype,
            "BYTES_PER_ELEMENT",
            Value::number(self.0.bytes_per_element() as f64),
        );
        vm.intrinsics.set_typed_array_prototype_for(self.0, prototype.clone());

        let kind = self.0;
        let construct: crate::object::NativeFn = match kind {
            ElementKind::Int8 => construct_int8,
            ElementKind::Uint8 => construct_uint8,
            ElementKind::Uint8Clamped => construct_uint8clamped,
            ElementKind::Int16 => construct_int16,
            ElementKind::Uint16 => construct_uint16,
            ElementKind::Int32 => construct_int32,
            ElementKind::Uint32 => construct_uint32,
            ElementKind::Float32 => construct_float32,
            ElementKind::Float64 => construct_float64,
            ElementKind::BigInt64 => construct_bigint64,
            ElementKind::BigUint64 => construct_biguint64,
        };

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            name,
            1,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        crate::builtins::util::define_constant(
            &constructor,
            "BYTES_PER_ELEMENT",
            Value::number(self.0.bytes_per_element() as f64),
        );
        // `Object.getPrototypeOf(Int32Array) === TypedArray` (§4.D note).
        if let Some(base_ctor) = vm.get_global("TypedArray") {
            constructor.with_base_mut(|b| b.prototype = base_ctor);
        }
        vm.define_global(name, constructor);
        Ok(())
    }
}

macro_rules! concrete_constructor {
    ($fn_name:ident, $kind:expr) => {
        fn $fn_name(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
            construct_typed_array(vm, this, args, $kind)
        }
    };
}

concrete_constructor!(construct_int8, ElementKind::Int8);
concrete_constructor!(construct_uint8, ElementKind::Uint8);
concrete_constructor!(construct_uint8clamped, ElementKind::Uint8Clamped);
concrete_constructor!(construct_int16, ElementKind::Int16);
concrete_constructor!(construct_uint16, ElementKind::Uint16);
concrete_constructor!(construct_int32, ElementKind::Int32);
concrete_constructor!(construct_uint32, ElementKind::Uint32);
concrete_constructor!(construct_float32, ElementKind::Float32);
concrete_constructor!(construct_float64, ElementKind::Float64);
concrete_constructor!(construct_bigint64, ElementKind::BigInt64);
concrete_constructor!(construct_biguint64, ElementKind::BigUint64);

/// `new Int32Array(length)` / `new Int32Array(buffer, byteOffset?, length?)`
/// / `new Int32Array(arrayLike)` (§3 invariant: `byteOffset +
/// length*bytesPerElement <= buffer.byteLength`; offset must be a multiple
/// of `bytesPerElement` when auto-sized).
fn construct_typed_array(vm: &mut Vm, _this: Value, args: &[Value], kind: ElementKind) -> JsResult<Value> {
    let prototype = vm
        .intrinsics
        .typed_array_prototype_for(kind)
        .cloned()
        .unwrap_or(Value::Null);
    let bpe = kind.bytes_per_element();

    match arg(args, 0) {
        Value::ArrayBuffer(buffer) => {
            let byte_offset = match arg(args, 1) {
                Value::Undefined => 0,
                v => to_integer(vm, &v)?.max(0.0) as usize,
            };
            if byte_offset % bpe != 0 {
                return Err(vm.throw_range_error("start offset must be a multiple of the element size"));
            }
            let buffer_len = buffer.borrow().byte_length();
            if byte_offset > buffer_len {
                return Err(vm.throw_range_error("start offset is outside the bounds of the buffer"));
            }
            let length = match arg(args, 2) {
                Value::Undefined => {
                    if (buffer_len - byte_offset) % bpe != 0 {
                        return Err(vm.throw_range_error(
                            "byte length of the buffer minus the byte offset must be a multiple of the element size",
                        ));
                    }
                    (buffer_len - byte_offset) / bpe
                }
                v => to_integer(vm, &v)?.max(0.0) as usize,
            };
            if byte_offset + length * bpe > buffer_len {
                return Err(vm.throw_range_error("invalid typed array length"));
            }
            Ok(Value::TypedArray(new_gc(TypedArrayData {
                base: crate::object::ObjectBase::new(prototype, kind.constructor_name()),
                buffer,
                byte_offset,
                length,
                kind,
            })))
        }
        Value::TypedArray(src) => {
            let src = src.borrow();
            let values: Vec<Value> = (0..src.length)
                .map(|i| {
                    let start = src.byte_offset + i * src.kind.bytes_per_element();
                    let buf = src.buffer.borrow();
                    let bytes = buf.bytes.borrow();
                    src.kind.decode(&bytes[start..start + src.kind.bytes_per_element()])
                })
                .collect();
            build_from_values(vm, kind, prototype, values)
        }
        Value::Undefined => {
            let buffer = new_gc(ArrayBufferData::new(
                vm.intrinsics.array_buffer_prototype.clone().unwrap_or(Value::Null),
                0,
                false,
            ));
            Ok(Value::TypedArray(new_gc(TypedArrayData {
                base: crate::object::ObjectBase::new(prototype, kind.constructor_name()),
                buffer,
                byte_offset: 0,
                length: 0,
                kind,
            })))
        }
        v @ (Value::Array(_) | Value::PlainObject(_)) => {
            let len_key = crate::property::Key::from("length");
            let len_value = vm.get_property(&v, &len_key)?;
            let len = crate::abstract_ops::to_integer(vm, &len_value)?.max(0.0) as usize;
            let values = (0..len)
                .map(|i| vm.get_property(&v, &crate::property::Key::from(i.to_string().as_str())))
                .collect::<JsResult<Vec<_>>>()?;
            build_from_values(vm, kind, prototype, values)
        }
        v => {
            let length = to_integer(vm, &v)?;
            if length < 0.0 {
                return Err(vm.throw_range_error("invalid typed array length"));
            }
            let byte_length = length as usize * bpe;
            let buffer = new_gc(ArrayBufferData::new(
                vm.intrinsics.array_buffer_prototype.clone().unwrap_or(Value::Null),
                byte_length,
                false,
            ));
            Ok(Value::TypedArray(new_gc(TypedArrayData {
                base: crate::object::ObjectBase::new(prototype, kind.constructor_name()),
                buffer,
                byte_offset: 0,
                length: length as usize,
                kind,
            })))
        }
    }
}

fn build_from_values(vm: &mut Vm, kind: ElementKind, prototype: Value, values: Vec<Value>) -> JsResult<Value> {
    let bpe = kind.bytes_per_element();
    let buffer = new_gc(ArrayBufferData::new(
        vm.intrinsics.array_buffer_prototype.clone().unwrap_or(Value::Null),
        values.len() * bpe,
        false,
    ));
    for (i, v) in values.into_iter().enumerate() {
        let start = i * bpe;
        if kind.is_bigint() {
            match &v {
                Value::BigInt(n) => {
                    let buf = buffer.borrow();
                    let mut bytes = buf.bytes.borrow_mut();
                    kind.encode_bigint(&mut bytes[start..start + bpe], n);
                }
                _ => return Err(vm.throw_type_error("Cannot convert value to a BigInt typed array element")),
            }
        } else {
            let n = crate::abstract_ops::to_number(vm, &v)?;
            let buf = buffer.borrow();
            let mut bytes = buf.bytes.borrow_mut();
            kind.encode_number(&mut bytes[start..start + bpe], n);
        }
    }
    let length = buffer.borrow().byte_length() / bpe;
    Ok(Value::TypedArray(new_gc(TypedArrayData {
        base: crate::object::ObjectBase::new(prototype, kind.constructor_name()),
        buffer,
        byte_offset: 0,
        length,
        kind,
    })))
}
