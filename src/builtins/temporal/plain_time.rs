// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.PlainTime` (§6 "Temporal string format": `HH:mm:ss[.fff]`).
//! Record shape/name only; arithmetic and formatting below are built from
//! the shared ISO-8601 helpers.

use super::{format_time, nanos_to_time_and_days, parse_time, regulate_time, time_to_nanos_of_day, Overflow};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, IsoTime, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("hour", hour_getter as fn(&mut Vm, Value, &[Value]) -> JsResult<Value>),
        ("minute", minute_getter),
        ("second", second_getter),
        ("millisecond", millisecond_getter),
        ("microsecond", microsecond_getter),
        ("nanosecond", nanosecond_getter),
    ] {
        let f = create_native_function(&format!("get {name}"), 0, false, getter);
        crate::builtins::util::define_accessor(&prototype, name, Some(f), None);
    }
    define_method(&prototype, "toString", 0, false, to_string);
    define_method(&prototype, "toJSON", 0, false, to_string);
    define_method(&prototype, "valueOf", 0, false, value_of);
    define_method(&prototype, "equals", 1, false, equals);
    define_method(&prototype, "add", 1, false, |vm, this, args| add_or_subtract(vm, this, args, 1));
    define_method(&prototype, "subtract", 1, false, |vm, this, args| add_or_subtract(vm, this, args, -1));

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "PlainTime",
        0,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("PlainTime", prototype);
    constructor
}

pub(super) fn this_time(vm: &mut Vm, this: &Value) -> JsResult<IsoTime> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::PlainTime(time) => Ok(time),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainTime")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainTime")),
    }
}

pub(super) fn make_plain_time(vm: &mut Vm, time: IsoTime) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("PlainTime").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.PlainTime"),
        record: TemporalRecord::PlainTime(time),
    }))
}

fn field(vm: &mut Vm, args: &[Value], idx: usize, name: &str, default: i64) -> JsResult<i64> {
    let v = arg(args, idx);
    if v.is_undefined() {
        Ok(default)
    } else {
        crate::abstract_ops::to_integer_if_integral(vm, &v, name)
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let hour = field(vm, args, 0, "hour", 0)?;
    let minute = field(vm, args, 1, "minute", 0)?;
    let second = field(vm, args, 2, "second", 0)?;
    let ms = field(vm, args, 3, "millisecond", 0)?;
    let us = field(vm, args, 4, "microsecond", 0)?;
    let ns = field(vm, args, 5, "nanosecond", 0)?;
    let time = regulate_time(vm, hour, minute, second, ms, us, ns, Overflow::Reject)?;
    Ok(make_plain_time(vm, time))
}

pub(super) fn to_temporal_plain_time(vm: &mut Vm, item: &Value) -> JsResult<IsoTime> {
    if let Value::Temporal(t) = item {
        match t.borrow().record {
            TemporalRecord::PlainTime(time) => return Ok(time),
            TemporalRecord::PlainDateTime(_, time) => return Ok(time),
            _ => {}
        }
    }
    if let Value::String(s) = item {
        let (time, _rest) = parse_time(s).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainTime string"))?;
        return Ok(time);
    }
    if item.is_object_like() {
        let hour = field_from_object(vm, item, "hour", 0)?;
        let minute = field_from_object(vm, item, "minute", 0)?;
        let second = field_from_object(vm, item, "second", 0)?;
        let ms = field_from_object(vm, item, "millisecond", 0)?;
        let us = field_from_object(vm, item, "microsecond", 0)?;
        let ns = field_from_object(vm, item, "nanosecond", 0)?;
        return regulate_time(vm, hour, minute, second, ms, us, ns, Overflow::Reject);
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.PlainTime"))
}

fn field_from_object(vm: &mut Vm, item: &Value, name: &str, default: i64) -> JsResult<i64> {
    let v = vm.get_property(item, &crate::property::Key::from(name))?;
    if v.is_undefined() {
        Ok(default)
    } else {
        crate::abstract_ops::to_integer_if_integral(vm, &v, name)
    }
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let time = to_temporal_plain_time(vm, &arg(args, 0))?;
    Ok(make_plain_time(vm, time))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.PlainTime to a primitive value"))
}

fn hour_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.hour as f64))
}
fn minute_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.minute as f64))
}
fn second_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.second as f64))
}
fn millisecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.millisecond as f64))
}
fn microsecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.microsecond as f64))
}
fn nanosecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_time(vm, &this)?.nanosecond as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_time(vm, &this)?;
    let b = to_temporal_plain_time(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a == b))
}

/// Adds time-unit Duration fields, discarding any whole-day carry — a bare
/// `PlainTime` has no date component to absorb it into (§4.E).
fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: i64) -> JsResult<Value> {
    let time = this_time(vm, &this)?;
    let d = to_temporal_duration(vm, &arg(args, 0))?;
    let delta_ns = sign
        * (d.hours as i64 * 3_600_000_000_000
            + d.minutes as i64 * 60_000_000_000
            + d.seconds as i64 * 1_000_000_000
            + d.milliseconds as i64 * 1_000_000
            + d.microseconds as i64 * 1_000
            + d.nanoseconds as i64);
    let total = time_to_nanos_of_day(time) + delta_ns;
    let (result, _carry) = nanos_to_time_and_days(total);
    Ok(make_plain_time(vm, result))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(format_time(this_time(vm, &this)?)))
}
