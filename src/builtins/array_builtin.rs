// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Array` (§4.E). Array elements live in [`crate::object::ArrayData::elements`]
//! directly rather than going through the generic property store (§3
//! "ArrayData... Invariant: length always equals `elements.len()`" is
//! maintained by [`crate::vm::Vm`]'s fast-path `length`/index handling); the
//! methods below read/write that `Vec<Value>` straight through.

use crate::abstract_ops::{same_value_zero, to_display_string, to_integer};
use crate::builtins::util::{arg, define_method, new_array, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::property::Key;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct ArrayModule;

impl BuiltinInitializer for ArrayModule {
    fn name(&self) -> &'static str {
        "Array"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Array", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Array",
                dependency: "Object",
            })?;
        let prototype = new_array(object_prototype, Vec::new());

        define_method(&prototype, "push", 1, true, push);
        define_method(&prototype, "pop", 0, false, pop);
        define_method(&prototype, "shift", 0, false, shift);
        define_method(&prototype, "unshift", 1, true, unshift);
        define_method(&prototype, "slice", 2, false, slice);
        define_method(&prototype, "splice", 2, true, splice);
        define_method(&prototype, "concat", 1, true, concat);
        define_method(&prototype, "join", 1, false, join);
        define_method(&prototype, "reverse", 0, false, reverse);
        define_method(&prototype, "sort", 1, false, sort);
        define_method(&prototype, "indexOf", 1, false, index_of);
        define_method(&prototype, "lastIndexOf", 1, false, last_index_of);
        define_method(&prototype, "includes", 1, false, includes);
        define_method(&prototype, "find", 1, false, find);
        define_method(&prototype, "findIndex", 1, false, find_index);
        define_method(&prototype, "filter", 1, false, filter);
        define_method(&prototype, "map", 1, false, map);
        define_method(&prototype, "forEach", 1, false, for_each);
        define_method(&prototype, "every", 1, false, every);
        define_method(&prototype, "some", 1, false, some);
        define_method(&prototype, "reduce", 1, false, reduce);
        define_method(&prototype, "reduceRight", 1, false, reduce_right);
        define_method(&prototype, "flat", 0, false, flat);
        define_method(&prototype, "flatMap", 1, false, flat_map);
        define_method(&prototype, "fill", 1, true, fill);
        define_method(&prototype, "copyWithin", 2, true, copy_within);
        define_method(&prototype, "at", 1, false, at);
        define_method(&prototype, "toString", 0, false, to_string);
        let iterator_symbol = vm.well_known_symbols.iterator.clone();
        let iter_fn = crate::function::create_native_function("[Symbol.iterator]", 0, false, values_iterator);
        prototype.with_base_mut(|b| {
            b.slots.set_own_non_enumerable(crate::property::Key::Symbol(iterator_symbol), iter_fn);
        });

        vm.intrinsics.array_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "Array",
            1,
            true,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        define_method(&constructor, "isArray", 1, false, is_array);
        define_method(&constructor, "from", 1, true, from);
        define_method(&constructor, "of", 0, true, of);

        vm.define_global("Array", constructor);
        Ok(())
    }
}

fn this_array(vm: &mut Vm, this: &Value) -> JsResult<crate::object::Gc<crate::object::ArrayData>> {
    match this {
        Value::Array(a) => Ok(a.clone()),
        _ => Err(vm.throw_type_error("receiver is not an Array")),
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let proto = vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null);
    if args.len() == 1 {
        if let Some(n) = args[0].as_f64() {
            if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
                return Err(vm.throw_range_error("Invalid array length"));
            }
            return Ok(new_array(proto, vec![Value::Undefined; n as usize]));
        }
    }
    Ok(new_array(proto, args.to_vec()))
}

fn is_array(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Array(_))))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let source = arg(args, 0);
    let map_fn = arg(args, 1);
    let mut elements = match &source {
        Value::Array(a) => a.borrow().elements.clone(),
        Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
        other if other.is_object_like() => {
            let length_value = vm.get_property(other, &Key::from("length"))?;
            let len = to_integer(vm, &length_value)?.max(0.0) as usize;
            let mut out = Vec::with_capacity(len);
            for i in 0..len {
                out.push(vm.get_property(other, &Key::from(i.to_string().as_str()))?);
            }
            out
        }
        _ => Vec::new(),
    };
    if map_fn.is_callable() {
        for (i, el) in elements.iter_mut().enumerate() {
            *el = vm.call_function_directly(&map_fn, Value::Undefined, &[el.clone(), Value::number(i as f64)])?;
        }
    }
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), elements))
}

fn of(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), args.to_vec()))
}

fn push(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    arr.borrow_mut().elements.extend_from_slice(args);
    let len = arr.borrow().elements.len();
    Ok(Value::number(len as f64))
}

fn pop(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let popped = arr.borrow_mut().elements.pop();
    Ok(popped.unwrap_or(Value::Undefined))
}

fn shift(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let mut data = arr.borrow_mut();
    if data.elements.is_empty() {
        Ok(Value::Undefined)
    } else {
        Ok(data.elements.remove(0))
    }
}

fn unshift(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let mut data = arr.borrow_mut();
    for (offset, v) in args.iter().enumerate() {
        data.elements.insert(offset, v.clone());
    }
    Ok(Value::number(data.elements.len() as f64))
}

/// Negative indices count from the end; both clamp into `[0, len]` (§4.E
/// mirrors standard `Array.prototype.slice` index normalization).
fn normalize_index(n: f64, len: usize) -> usize {
    if n < 0.0 {
        ((len as f64 + n).max(0.0)) as usize
    } else {
        (n as usize).min(len)
    }
}

fn slice(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let len = arr.borrow().elements.len();
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    let elements = if start < end {
        arr.borrow().elements[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), elements))
}

fn splice(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let len = arr.borrow().elements.len();
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    let delete_count = match arg(args, 1) {
        Value::Undefined => len - start,
        v => (to_integer(vm, &v)?.max(0.0) as usize).min(len - start),
    };
    let items: Vec<Value> = if args.len() > 2 { args[2..].to_vec() } else { Vec::new() };
    let removed: Vec<Value> = arr
        .borrow_mut()
        .elements
        .splice(start..start + delete_count, items)
        .collect();
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), removed))
}

fn concat(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let mut elements = arr.borrow().elements.clone();
    for a in args {
        match a {
            Value::Array(other) => elements.extend(other.borrow().elements.clone()),
            other => elements.push(other.clone()),
        }
    }
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), elements))
}

fn join(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        v => to_display_string(vm, &v)?,
    };
    let elements = arr.borrow().elements.clone();
    let mut parts = Vec::with_capacity(elements.len());
    for el in elements {
        parts.push(if el.is_nullish() {
            String::new()
        } else {
            to_display_string(vm, &el)?
        });
    }
    Ok(Value::string(parts.join(&separator)))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    join(vm, this, &[])
}

fn reverse(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    arr.borrow_mut().elements.reverse();
    Ok(this)
}

fn sort(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let comparator = arg(args, 0);
    let mut elements = arr.borrow().elements.clone();
    // `undefined` values always sort to the end (§4.E).
    let (mut defined, undefined_count) = {
        let mut defined = Vec::new();
        let mut count = 0usize;
        for e in elements.drain(..) {
            if e.is_undefined() {
                count += 1;
            } else {
                defined.push(e);
            }
        }
        (defined, count)
    };
    let mut sort_err = None;
    if comparator.is_callable() {
        defined.sort_by(|a, b| {
            if sort_err.is_some() {
                return std::cmp::Ordering::Equal;
            }
            match vm.call_function_directly(&comparator, Value::Undefined, &[a.clone(), b.clone()]) {
                Ok(result) => {
                    let n = result.as_f64().unwrap_or(0.0);
                    n.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)
                }
                Err(e) => {
                    sort_err = Some(e);
                    std::cmp::Ordering::Equal
                }
            }
        });
    } else {
        let mut strings: Vec<(String, Value)> = Vec::with_capacity(defined.len());
        for e in defined {
            let s = to_display_string(vm, &e)?;
            strings.push((s, e));
        }
        strings.sort_by(|a, b| a.0.cmp(&b.0));
        defined = strings.into_iter().map(|(_, v)| v).collect();
    }
    if let Some(e) = sort_err {
        return Err(e);
    }
    defined.extend(std::iter::repeat(Value::Undefined).take(undefined_count));
    arr.borrow_mut().elements = defined;
    Ok(this)
}

fn index_of(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let needle = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => normalize_index(to_integer(vm, &v)?, elements.len()),
    };
    for (i, el) in elements.iter().enumerate().skip(start) {
        if crate::abstract_ops::strict_equal(el, &needle) {
            return Ok(Value::number(i as f64));
        }
    }
    Ok(Value::number(-1.0))
}

fn last_index_of(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let needle = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate().rev() {
        if crate::abstract_ops::strict_equal(el, &needle) {
            return Ok(Value::number(i as f64));
        }
    }
    Ok(Value::number(-1.0))
}

fn includes(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let needle = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    Ok(Value::Boolean(elements.iter().any(|el| same_value_zero(el, &needle))))
}

fn find(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let predicate = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate() {
        let result = vm.call_function_directly(&predicate, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        if crate::builtins::util::truthy(&result) {
            return Ok(el.clone());
        }
    }
    Ok(Value::Undefined)
}

fn find_index(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let predicate = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate() {
        let result = vm.call_function_directly(&predicate, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        if crate::builtins::util::truthy(&result) {
            return Ok(Value::number(i as f64));
        }
    }
    Ok(Value::number(-1.0))
}

fn filter(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let predicate = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let mut out = Vec::new();
    for (i, el) in elements.iter().enumerate() {
        let result = vm.call_function_directly(&predicate, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        if crate::builtins::util::truthy(&result) {
            out.push(el.clone());
        }
    }
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), out))
}

fn map(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let mapper = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let mut out = Vec::with_capacity(elements.len());
    for (i, el) in elements.iter().enumerate() {
        out.push(vm.call_function_directly(&mapper, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?);
    }
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), out))
}

fn for_each(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let callback = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate() {
        vm.call_function_directly(&callback, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
    }
    Ok(Value::Undefined)
}

fn every(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let predicate = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate() {
        let result = vm.call_function_directly(&predicate, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        if !crate::builtins::util::truthy(&result) {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn some(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let predicate = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    for (i, el) in elements.iter().enumerate() {
        let result = vm.call_function_directly(&predicate, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        if crate::builtins::util::truthy(&result) {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn reduce(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let reducer = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let mut iter = elements.into_iter().enumerate();
    let mut acc = if args.len() > 1 {
        arg(args, 1)
    } else {
        match iter.next() {
            Some((_, v)) => v,
            None => return Err(vm.throw_type_error("Reduce of empty array with no initial value")),
        }
    };
    for (i, el) in iter {
        acc = vm.call_function_directly(&reducer, Value::Undefined, &[acc, el, Value::number(i as f64), this.clone()])?;
    }
    Ok(acc)
}

fn reduce_right(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let reducer = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let mut iter = elements.into_iter().enumerate().rev();
    let mut acc = if args.len() > 1 {
        arg(args, 1)
    } else {
        match iter.next() {
            Some((_, v)) => v,
            None => return Err(vm.throw_type_error("Reduce of empty array with no initial value")),
        }
    };
    for (i, el) in iter {
        acc = vm.call_function_directly(&reducer, Value::Undefined, &[acc, el, Value::number(i as f64), this.clone()])?;
    }
    Ok(acc)
}

fn flatten_into(out: &mut Vec<Value>, elements: Vec<Value>, depth: i64) {
    for el in elements {
        match el {
            Value::Array(a) if depth > 0 => flatten_into(out, a.borrow().elements.clone(), depth - 1),
            other => out.push(other),
        }
    }
}

fn flat(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let depth = match arg(args, 0) {
        Value::Undefined => 1,
        v => to_integer(vm, &v)? as i64,
    };
    let mut out = Vec::new();
    flatten_into(&mut out, arr.borrow().elements.clone(), depth);
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), out))
}

fn flat_map(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let mapper = arg(args, 0);
    let elements = arr.borrow().elements.clone();
    let mut out = Vec::with_capacity(elements.len());
    for (i, el) in elements.iter().enumerate() {
        let mapped = vm.call_function_directly(&mapper, Value::Undefined, &[el.clone(), Value::number(i as f64), this.clone()])?;
        match mapped {
            Value::Array(a) => out.extend(a.borrow().elements.clone()),
            other => out.push(other),
        }
    }
    Ok(new_array(vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null), out))
}

fn fill(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let value = arg(args, 0);
    let len = arr.borrow().elements.len();
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    let end = match arg(args, 2) {
        Value::Undefined => len,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    if start < end {
        let mut data = arr.borrow_mut();
        for slot in data.elements[start..end].iter_mut() {
            *slot = value.clone();
        }
    }
    Ok(this)
}

fn copy_within(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let len = arr.borrow().elements.len();
    let target = normalize_index(to_integer(vm, &arg(args, 0))?, len);
    let start = match arg(args, 1) {
        Value::Undefined => 0,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    let end = match arg(args, 2) {
        Value::Undefined => len,
        v => normalize_index(to_integer(vm, &v)?, len),
    };
    if start < end {
        let chunk = arr.borrow().elements[start..end].to_vec();
        let mut data = arr.borrow_mut();
        for (offset, v) in chunk.into_iter().enumerate() {
            let idx = target + offset;
            if idx >= data.elements.len() {
                break;
            }
            data.elements[idx] = v;
        }
    }
    Ok(this)
}

fn at(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let elements = arr.borrow().elements.clone();
    let n = to_integer(vm, &arg(args, 0))?;
    let idx = if n < 0.0 { elements.len() as f64 + n } else { n };
    if idx < 0.0 || idx >= elements.len() as f64 {
        Ok(Value::Undefined)
    } else {
        Ok(elements[idx as usize].clone())
    }
}

/// A minimal `{ next() }` iterator object (§4.E doesn't describe the
/// iterator protocol for anything except `Array.prototype[Symbol.iterator]`;
/// driving `for...of` itself belongs to the host interpreter).
fn values_iterator(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let arr = this_array(vm, &this)?;
    let elements = arr.borrow().elements.clone();
    let iterator = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    // Native functions are plain `fn` pointers (§4.C); closures over
    // per-call state cannot be native functions here, so the iterator's
    // remaining items are snapshotted onto the object itself.
    let buffer = new_array(Value::Null, elements);
    iterator.with_base_mut(|b| {
        b.slots.set_own_non_enumerable("__buffer", buffer);
        b.slots.set_own_non_enumerable("__index", Value::number(0.0));
        let next_fn = crate::function::create_native_function("next", 0, false, iterator_next);
        b.slots.set_own_non_enumerable("next", next_fn);
    });
    Ok(iterator)
}

fn iterator_next(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let buffer = vm.get_property(&this, &Key::from("__buffer"))?;
    let index_value = vm.get_property(&this, &Key::from("__index"))?;
    let index = index_value.as_f64().unwrap_or(0.0) as usize;
    let result = new_plain_object(vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null));
    if let Value::Array(arr) = &buffer {
        let elements = arr.borrow().elements.clone();
        if index < elements.len() {
            result.with_base_mut(|b| {
                b.slots.set_own("value", elements[index].clone());
                b.slots.set_own("done", Value::Boolean(false));
            });
            vm.set_property(&this, Key::from("__index"), Value::number((index + 1) as f64))?;
            return Ok(result);
        }
    }
    result.with_base_mut(|b| {
        b.slots.set_own("value", Value::Undefined);
        b.slots.set_own("done", Value::Boolean(true));
    });
    Ok(result)
}
