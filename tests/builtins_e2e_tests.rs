// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scenarios from §8, driven directly through
//! `call_function_directly`/`get_property` since this crate has no parser
//! or interpreter of its own to feed source text through.

use paserati_builtins::property::Key;
use paserati_builtins::value::Value;

fn boot() -> paserati_builtins::Vm {
    let (vm, _types) = paserati_builtins::bootstrap().expect("bootstrap should succeed");
    vm
}

fn call(vm: &mut paserati_builtins::Vm, target: &Value, name: &str, args: &[Value]) -> Value {
    let f = vm.get_property(target, &Key::from(name)).expect("method lookup failed");
    vm.call_function_directly(&f, target.clone(), args).expect("call failed")
}

fn error_name(vm: &mut paserati_builtins::Vm, err_value: &Value) -> String {
    match vm.get_property(err_value, &Key::from("name")).expect("error has a name") {
        Value::String(s) => s.to_string(),
        other => panic!("error `name` was not a string: {other:?}"),
    }
}

#[test]
fn math_max_coerces_every_argument_before_comparing() {
    let mut vm = boot();
    let math = vm.get_global("Math").expect("Math global");
    // "3" coerces to 3, which beats the bare 2 — coercion happens before
    // the comparison, not after (§8).
    let result = call(&mut vm, &math, "max", &[Value::number(2.0), Value::string("3")]);
    assert_eq!(result.as_f64(), Some(3.0));
}

#[test]
fn array_from_reads_array_like_length_and_maps() {
    let mut vm = boot();
    let array_ctor = vm.get_global("Array").expect("Array global");
    let object_prototype = vm.intrinsics.object_prototype.clone().unwrap();
    let array_like = paserati_builtins::builtins::util::new_plain_object(object_prototype);
    array_like.with_base_mut(|b| {
        b.slots.set_own("0", Value::string("a"));
        b.slots.set_own("1", Value::string("b"));
        b.slots.set_own("length", Value::number(2.0));
    });

    let result = call(&mut vm, &array_ctor, "from", &[array_like]);
    match result {
        Value::Array(a) => {
            let elements = a.borrow().elements.clone();
            assert_eq!(elements.len(), 2);
            assert!(matches!(&elements[0], Value::String(s) if &**s == "a"));
            assert!(matches!(&elements[1], Value::String(s) if &**s == "b"));
        }
        other => panic!("Array.from did not return an array: {other:?}"),
    }
}

#[test]
fn number_parses_numeric_strings_with_radix_prefixes() {
    let mut vm = boot();
    let number_ctor = vm.get_global("Number").expect("Number global");
    let result = vm
        .call_function_directly(&number_ctor, Value::Undefined, &[Value::string("0x1F")])
        .unwrap();
    assert_eq!(result.as_f64(), Some(31.0));

    let nan_result = vm
        .call_function_directly(&number_ctor, Value::Undefined, &[Value::string("1_000")])
        .unwrap();
    assert!(nan_result.is_nan(), "numeric separators are rejected, not silently stripped");
}

#[test]
fn temporal_duration_rejects_mixed_signs_and_round_trips_tostring() {
    let mut vm = boot();
    let temporal = vm.get_global("Temporal").expect("Temporal global");
    let duration_ctor = vm.get_property(&temporal, &Key::from("Duration")).unwrap();

    let err = vm
        .call_function_directly(&duration_ctor, Value::Undefined, &[Value::number(1.0), Value::number(-1.0)])
        .expect_err("mixed-sign Duration fields must throw");
    assert_eq!(error_name(&mut vm, err.value_ref()), "RangeError");

    let from_fn = vm.get_property(&duration_ctor, &Key::from("from")).unwrap();
    let duration = vm
        .call_function_directly(&from_fn, Value::Undefined, &[Value::string("P1Y2M3DT4H5M6.789S")])
        .expect("valid ISO duration string should parse");
    let round_tripped = call(&mut vm, &duration, "toString", &[]);
    match round_tripped {
        Value::String(s) => assert_eq!(&*s, "P1Y2M3DT4H5M6.789S"),
        other => panic!("toString did not return a string: {other:?}"),
    }
}

#[test]
fn temporal_plain_date_constructor_rejects_invalid_month() {
    let mut vm = boot();
    let temporal = vm.get_global("Temporal").expect("Temporal global");
    let plain_date_ctor = vm.get_property(&temporal, &Key::from("PlainDate")).unwrap();
    let err = vm
        .call_function_directly(&plain_date_ctor, Value::Undefined, &[Value::number(2024.0), Value::number(13.0), Value::number(1.0)])
        .expect_err("month 13 must be rejected under the default Reject overflow");
    assert_eq!(error_name(&mut vm, err.value_ref()), "RangeError");
}

#[test]
fn temporal_plain_date_round_trips_iso_string() {
    let mut vm = boot();
    let temporal = vm.get_global("Temporal").expect("Temporal global");
    let plain_date_ctor = vm.get_property(&temporal, &Key::from("PlainDate")).unwrap();
    let date = vm
        .call_function_directly(&plain_date_ctor, Value::Undefined, &[Value::number(2024.0), Value::number(2.0), Value::number(29.0)])
        .unwrap();
    let s = call(&mut vm, &date, "toString", &[]);
    match s {
        Value::String(s) => assert_eq!(&*s, "2024-02-29"),
        other => panic!("toString did not return a string: {other:?}"),
    }
}

#[test]
fn typed_array_aliases_array_buffer_bytes_little_endian() {
    let mut vm = boot();
    let array_buffer_ctor = vm.get_global("ArrayBuffer").expect("ArrayBuffer global");
    let buffer = vm
        .call_function_directly(&array_buffer_ctor, Value::Undefined, &[Value::number(4.0)])
        .unwrap();

    let int32_ctor = vm.get_global("Int32Array").expect("Int32Array global");
    let view = vm
        .call_function_directly(&int32_ctor, Value::Undefined, &[buffer])
        .unwrap();

    match &view {
        Value::TypedArray(t) => {
            let t = t.borrow();
            let buf = t.buffer.borrow();
            let mut bytes = buf.bytes.borrow_mut();
            // Write the little-endian encoding of 1 directly into the backing
            // buffer and confirm the view decodes it without any byte-order
            // flip (§8: typed-array aliasing is little-endian).
            bytes[0..4].copy_from_slice(&1i32.to_le_bytes());
        }
        other => panic!("Int32Array constructor did not return a typed array: {other:?}"),
    }

    let element = vm.get_property(&view, &Key::from("0")).unwrap();
    assert_eq!(element.as_f64(), Some(1.0));
}
