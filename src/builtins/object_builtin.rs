// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Object` (§4.E). Installs `Object.prototype` with no `[[Prototype]]` of
//! its own — the root of every prototype chain — then the `Object`
//! constructor and its statics.

use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::object::{new_gc, ObjectData};
use crate::property::{DefineError, Key, PropertyAttributes, Slot, SlotValue};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct ObjectModule;

impl BuiltinInitializer for ObjectModule {
    fn name(&self) -> &'static str {
        "Object"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Object", Type::Any);
        ctx.set_primitive_prototype("object", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        // `Object.prototype` has no `[[Prototype]]` (§3): it is the one
        // object record whose prototype link is `Null` by construction.
        let prototype = Value::PlainObject(new_gc(ObjectData::new(Value::Null)));

        define_method(&prototype, "hasOwnProperty", 1, false, has_own_property);
        define_method(&prototype, "isPrototypeOf", 1, false, is_prototype_of);
        define_method(&prototype, "propertyIsEnumerable", 1, false, property_is_enumerable);
        define_method(&prototype, "toString", 0, false, to_string);
        define_method(&prototype, "toLocaleString", 0, false, to_locale_string);
        define_method(&prototype, "valueOf", 0, false, value_of);

        vm.intrinsics.object_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(Value::Null, "Object", 1, false, construct);
        link_constructor_and_prototype(&constructor, &prototype);

        define_method(&constructor, "keys", 1, false, keys);
        define_method(&constructor, "values", 1, false, values);
        define_method(&constructor, "entries", 1, false, entries);
        define_method(&constructor, "assign", 2, true, assign);
        define_method(&constructor, "create", 2, false, create);
        define_method(&constructor, "freeze", 1, false, freeze);
        define_method(&constructor, "isFrozen", 1, false, is_frozen);
        define_method(&constructor, "seal", 1, false, seal);
        define_method(&constructor, "isSealed", 1, false, is_sealed);
        define_method(&constructor, "preventExtensions", 1, false, prevent_extensions);
        define_method(&constructor, "isExtensible", 1, false, is_extensible);
        define_method(&constructor, "defineProperty", 3, false, define_property);
        define_method(&constructor, "defineProperties", 2, false, define_properties);
        define_method(&constructor, "getPrototypeOf", 1, false, get_prototype_of);
        define_method(&constructor, "setPrototypeOf", 2, false, set_prototype_of);
        define_method(&constructor, "getOwnPropertyNames", 1, false, get_own_property_names);
        define_method(&constructor, "getOwnPropertySymbols", 1, false, get_own_property_symbols);
        define_method(&constructor, "getOwnPropertyDescriptor", 2, false, get_own_property_descriptor);
        define_method(&constructor, "getOwnPropertyDescriptors", 1, false, get_own_property_descriptors);
        define_method(&constructor, "fromEntries", 1, false, from_entries);
        define_method(&constructor, "is", 2, false, object_is);

        vm.define_global("Object", constructor);
        Ok(())
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    match arg(args, 0) {
        v if v.is_nullish() => Ok(new_plain_object(
            vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null),
        )),
        v if v.is_object_like() => Ok(v),
        v => Ok(v), // primitive wrapper boxing is out of scope; callers get the primitive back.
    }
}

fn has_own_property(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let key = property_key(vm, &arg(args, 0))?;
    Ok(Value::Boolean(vm.has_own(&this, &key)))
}

fn is_prototype_of(_vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let mut target = arg(args, 0);
    if !target.is_object_like() {
        return Ok(Value::Boolean(false));
    }
    loop {
        let proto = target.prototype();
        if proto.is_null() {
            return Ok(Value::Boolean(false));
        }
        if proto.same_heap_identity(&this) {
            return Ok(Value::Boolean(true));
        }
        target = proto;
    }
}

fn property_is_enumerable(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let key = property_key(vm, &arg(args, 0))?;
    let enumerable = this
        .with_base(|b| b.slots.get_own(&key).map(|s| s.enumerable))
        .flatten()
        .unwrap_or(false);
    Ok(Value::Boolean(enumerable))
}

/// `[object <Tag>]` (§4.E): `class_name` is the fallback tag;
/// `Symbol.toStringTag` overrides it when present as a string.
fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let tag = if this.is_undefined() {
        "Undefined".to_string()
    } else if this.is_null() {
        "Null".to_string()
    } else {
        let symbolic_tag = this
            .with_base(|b| {
                b.slots
                    .get_own(&Key::Symbol(vm.well_known_symbols.to_string_tag.clone()))
                    .and_then(|s| match &s.value {
                        SlotValue::Data(Value::String(s)) => Some(s.to_string()),
                        _ => None,
                    })
            })
            .flatten();
        symbolic_tag.unwrap_or_else(|| {
            this.with_base(|b| b.class_name.to_string())
                .unwrap_or_else(|| "Object".to_string())
        })
    };
    Ok(Value::string(format!("[object {tag}]")))
}

fn to_locale_string(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let method = vm.get_property(&this, &Key::from("toString"))?;
    vm.call_function_directly(&method, this, args)
}

fn value_of(_vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(this)
}

fn property_key(vm: &mut Vm, v: &Value) -> JsResult<Key> {
    match v.as_key() {
        Some(k) => Ok(k),
        None => Ok(Key::from(crate::abstract_ops::to_display_string(vm, v)?.as_str())),
    }
}

fn keys(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let names = target
        .with_base(|b| b.slots.enumerable_string_keys())
        .unwrap_or_default();
    let elements = names.into_iter().map(Value::String).collect();
    Ok(new_plain_array(vm, elements))
}

fn values(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let names = target
        .with_base(|b| b.slots.enumerable_string_keys())
        .unwrap_or_default();
    let mut elements = Vec::with_capacity(names.len());
    for name in names {
        elements.push(vm.get_property(&target, &Key::String(name))?);
    }
    Ok(new_plain_array(vm, elements))
}

fn entries(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let names = target
        .with_base(|b| b.slots.enumerable_string_keys())
        .unwrap_or_default();
    let mut elements = Vec::with_capacity(names.len());
    for name in names {
        let v = vm.get_property(&target, &Key::String(name.clone()))?;
        elements.push(new_plain_array(vm, vec![Value::String(name), v]));
    }
    Ok(new_plain_array(vm, elements))
}

fn from_entries(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let iterable = arg(args, 0);
    let result = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    if let Value::Array(arr) = &iterable {
        let entries: Vec<Value> = arr.borrow().elements.clone();
        for entry in entries {
            let k = vm.get_property(&entry, &Key::from("0"))?;
            let v = vm.get_property(&entry, &Key::from("1"))?;
            let key = property_key(vm, &k)?;
            result.with_base_mut(|b| b.slots.set_own(key, v));
        }
        Ok(result)
    } else {
        Err(vm.throw_type_error("Object.fromEntries requires an array-like iterable"))
    }
}

fn assign(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        let names = source.with_base(|b| b.slots.enumerable_string_keys()).unwrap_or_default();
        for name in names {
            let v = vm.get_property(source, &Key::String(name.clone()))?;
            vm.set_property(&target, Key::String(name), v)?;
        }
        let symbols: Vec<_> = source
            .with_base(|b| {
                b.slots
                    .symbol_keys()
                    .filter(|s| b.slots.get_own(&Key::Symbol((*s).clone())).is_some_and(|slot| slot.enumerable))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for sym in symbols {
            let v = vm.get_property(source, &Key::Symbol(sym.clone()))?;
            vm.set_property(&target, Key::Symbol(sym), v)?;
        }
    }
    Ok(target)
}

fn create(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let proto = arg(args, 0);
    if !proto.is_null() && !proto.is_object_like() {
        return Err(vm.throw_type_error("Object prototype may only be an Object or null"));
    }
    let result = new_plain_object(proto);
    let descriptors = arg(args, 1);
    if !descriptors.is_undefined() {
        apply_property_descriptors(vm, &result, &descriptors)?;
    }
    Ok(result)
}

fn freeze(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Ok(target);
    }
    let keys: Vec<Key> = target.with_base(|b| b.slots.own_keys()).unwrap_or_default();
    target.with_base_mut(|b| {
        for key in keys {
            if let Some(slot) = b.slots.get_own_mut(&key) {
                slot.configurable = false;
                if !slot.is_accessor() {
                    slot.writable = false;
                }
            }
        }
    });
    if let Value::PlainObject(o) = &target {
        o.borrow_mut().extensible = false;
    }
    Ok(target)
}

fn is_frozen(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Ok(Value::Boolean(true));
    }
    let extensible = extensible_of(&target);
    let sealed = target
        .with_base(|b| {
            b.slots
                .own_keys()
                .into_iter()
                .all(|k| {
                    let slot = b.slots.get_own(&k).unwrap();
                    !slot.configurable && (slot.is_accessor() || !slot.writable)
                })
        })
        .unwrap_or(true);
    Ok(Value::Boolean(!extensible && sealed))
}

fn seal(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Ok(target);
    }
    let keys: Vec<Key> = target.with_base(|b| b.slots.own_keys()).unwrap_or_default();
    target.with_base_mut(|b| {
        for key in keys {
            if let Some(slot) = b.slots.get_own_mut(&key) {
                slot.configurable = false;
            }
        }
    });
    if let Value::PlainObject(o) = &target {
        o.borrow_mut().extensible = false;
    }
    Ok(target)
}

fn is_sealed(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Ok(Value::Boolean(true));
    }
    let extensible = extensible_of(&target);
    let all_non_configurable = target
        .with_base(|b| {
            b.slots
                .own_keys()
                .into_iter()
                .all(|k| !b.slots.get_own(&k).unwrap().configurable)
        })
        .unwrap_or(true);
    Ok(Value::Boolean(!extensible && all_non_configurable))
}

fn prevent_extensions(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if let Value::PlainObject(o) = &target {
        o.borrow_mut().extensible = false;
    }
    Ok(target)
}

fn is_extensible(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    Ok(Value::Boolean(target.is_object_like() && extensible_of(&target)))
}

fn extensible_of(target: &Value) -> bool {
    match target {
        Value::PlainObject(o) => o.borrow().extensible,
        _ => true,
    }
}

fn get_prototype_of(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(arg(args, 0).prototype())
}

fn set_prototype_of(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let proto = arg(args, 1);
    if !proto.is_null() && !proto.is_object_like() {
        return Err(vm.throw_type_error("Object prototype may only be an Object or null"));
    }
    target.with_base_mut(|b| b.prototype = proto);
    Ok(target)
}

fn get_own_property_names(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let names = target.with_base(|b| b.slots.string_keys().cloned().collect::<Vec<_>>()).unwrap_or_default();
    Ok(new_plain_array(vm, names.into_iter().map(Value::String).collect()))
}

fn get_own_property_symbols(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let syms = target.with_base(|b| b.slots.symbol_keys().cloned().collect::<Vec<_>>()).unwrap_or_default();
    Ok(new_plain_array(vm, syms.into_iter().map(Value::Symbol).collect()))
}

fn get_own_property_descriptor(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let key = property_key(vm, &arg(args, 1))?;
    let slot = target.with_base(|b| b.slots.get_own(&key).cloned()).flatten();
    match slot {
        Some(slot) => Ok(descriptor_object(vm, &slot)),
        None => Ok(Value::Undefined),
    }
}

fn get_own_property_descriptors(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let result = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    let keys = target.with_base(|b| b.slots.own_keys()).unwrap_or_default();
    for key in keys {
        let slot = target.with_base(|b| b.slots.get_own(&key).cloned()).flatten();
        if let Some(slot) = slot {
            let descriptor = descriptor_object(vm, &slot);
            result.with_base_mut(|b| b.slots.set_own(key, descriptor));
        }
    }
    Ok(result)
}

fn descriptor_object(vm: &mut Vm, slot: &Slot) -> Value {
    let result = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    match &slot.value {
        SlotValue::Data(v) => {
            result.with_base_mut(|b| {
                b.slots.set_own("value", v.clone());
                b.slots.set_own("writable", Value::Boolean(slot.writable));
            });
        }
        SlotValue::Accessor { get, set } => {
            result.with_base_mut(|b| {
                b.slots.set_own("get", get.clone().unwrap_or(Value::Undefined));
                b.slots.set_own("set", set.clone().unwrap_or(Value::Undefined));
            });
        }
    }
    result.with_base_mut(|b| {
        b.slots.set_own("enumerable", Value::Boolean(slot.enumerable));
        b.slots.set_own("configurable", Value::Boolean(slot.configurable));
    });
    result
}

fn define_property(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Err(vm.throw_type_error("Object.defineProperty called on non-object"));
    }
    let key = property_key(vm, &arg(args, 1))?;
    apply_one_descriptor(vm, &target, key, &arg(args, 2))?;
    Ok(target)
}

fn define_properties(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    if !target.is_object_like() {
        return Err(vm.throw_type_error("Object.defineProperties called on non-object"));
    }
    apply_property_descriptors(vm, &target, &arg(args, 1))?;
    Ok(target)
}

fn apply_property_descriptors(vm: &mut Vm, target: &Value, descriptors: &Value) -> JsResult<()> {
    let names = descriptors.with_base(|b| b.slots.enumerable_string_keys()).unwrap_or_default();
    for name in names {
        let desc = vm.get_property(descriptors, &Key::String(name.clone()))?;
        apply_one_descriptor(vm, target, Key::String(name), &desc)?;
    }
    Ok(())
}

fn apply_one_descriptor(vm: &mut Vm, target: &Value, key: Key, desc: &Value) -> JsResult<()> {
    if !desc.is_object_like() {
        return Err(vm.throw_type_error("Property description must be an object"));
    }
    let get = if vm.has_own(desc, &Key::from("get")) {
        Some(vm.get_property(desc, &Key::from("get"))?)
    } else {
        None
    };
    let set = if vm.has_own(desc, &Key::from("set")) {
        Some(vm.get_property(desc, &Key::from("set"))?)
    } else {
        None
    };
    let enumerable = if vm.has_own(desc, &Key::from("enumerable")) {
        Some(truthy(&vm.get_property(desc, &Key::from("enumerable"))?))
    } else {
        None
    };
    let configurable = if vm.has_own(desc, &Key::from("configurable")) {
        Some(truthy(&vm.get_property(desc, &Key::from("configurable"))?))
    } else {
        None
    };

    if get.is_some() || set.is_some() {
        target.with_base_mut(|b| {
            b.slots.define_accessor_property(
                key,
                get,
                set,
                enumerable.unwrap_or(false),
                configurable.unwrap_or(false),
            )
        });
        return Ok(());
    }

    let value = if vm.has_own(desc, &Key::from("value")) {
        Some(vm.get_property(desc, &Key::from("value"))?)
    } else {
        None
    };
    let writable = if vm.has_own(desc, &Key::from("writable")) {
        Some(truthy(&vm.get_property(desc, &Key::from("writable"))?))
    } else {
        None
    };
    let attrs = PropertyAttributes {
        writable,
        enumerable,
        configurable,
    };
    let result = target
        .with_base_mut(|b| b.slots.define_own_property(key, value, attrs))
        .unwrap_or(Ok(()));
    match result {
        Ok(()) => Ok(()),
        Err(DefineError::NotConfigurable) => {
            Err(vm.throw_type_error("Cannot redefine property: object is not configurable"))
        }
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::IntegerNumber(i) => *i != 0,
        Value::FloatNumber(f) => *f != 0.0 && !f.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn object_is(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(crate::abstract_ops::same_value(&arg(args, 0), &arg(args, 1))))
}

fn new_plain_array(vm: &Vm, elements: Vec<Value>) -> Value {
    crate::builtins::util::new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), elements)
}
