// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.PlainDateTime` (§6 "Temporal string format":
//! `YYYY-MM-DDTHH:mm:ss[.fff]`). Combines [`super::plain_date`] and
//! [`super::plain_time`]'s arithmetic, propagating the day carry produced
//! by time overflow back into the date component.

use super::{civil_from_days, days_from_civil, format_date, format_time, nanos_to_time_and_days, parse_date, parse_time, read_overflow_option, regulate_date, regulate_time, time_to_nanos_of_day, Overflow};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::temporal::plain_date::add_date_duration;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, IsoDate, IsoTime, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("year", year_getter as fn(&mut Vm, Value, &[Value]) -> JsResult<Value>),
        ("month", month_getter),
        ("day", day_getter),
        ("hour", hour_getter),
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
    define_method(&prototype, "add", 1, false, |vm, this, args| add_or_subtract(vm, this, args, 1.0));
    define_method(&prototype, "subtract", 1, false, |vm, this, args| add_or_subtract(vm, this, args, -1.0));

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "PlainDateTime",
        3,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("PlainDateTime", prototype);
    constructor
}

fn this_date_time(vm: &mut Vm, this: &Value) -> JsResult<(IsoDate, IsoTime)> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::PlainDateTime(d, time) => Ok((d, time)),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainDateTime")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainDateTime")),
    }
}

fn make_plain_date_time(vm: &mut Vm, date: IsoDate, time: IsoTime) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("PlainDateTime").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.PlainDateTime"),
        record: TemporalRecord::PlainDateTime(date, time),
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
    let year = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "year")?;
    let month = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 1), "month")?;
    let day = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 2), "day")?;
    let hour = field(vm, args, 3, "hour", 0)?;
    let minute = field(vm, args, 4, "minute", 0)?;
    let second = field(vm, args, 5, "second", 0)?;
    let ms = field(vm, args, 6, "millisecond", 0)?;
    let us = field(vm, args, 7, "microsecond", 0)?;
    let ns = field(vm, args, 8, "nanosecond", 0)?;
    let date = regulate_date(vm, year as i32, month, day, Overflow::Reject)?;
    let time = regulate_time(vm, hour, minute, second, ms, us, ns, Overflow::Reject)?;
    Ok(make_plain_date_time(vm, date, time))
}

fn to_temporal_plain_date_time(vm: &mut Vm, item: &Value) -> JsResult<(IsoDate, IsoTime)> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::PlainDateTime(d, time) = t.borrow().record {
            return Ok((d, time));
        }
        if let TemporalRecord::PlainDate(d) = t.borrow().record {
            return Ok((d, IsoTime::MIDNIGHT));
        }
    }
    if let Value::String(s) = item {
        let (date, rest) = parse_date(s).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainDateTime string"))?;
        let time = match rest.strip_prefix('T').or_else(|| rest.strip_prefix('t')) {
            Some(rest) => parse_time(rest).map(|(t, _)| t).unwrap_or(IsoTime::MIDNIGHT),
            None => IsoTime::MIDNIGHT,
        };
        return Ok((date, time));
    }
    if item.is_object_like() {
        let year_raw = vm.get_property(item, &crate::property::Key::from("year"))?;
        let year = crate::abstract_ops::to_integer_if_integral(vm, &year_raw, "year")?;
        let month_raw = vm.get_property(item, &crate::property::Key::from("month"))?;
        let month = crate::abstract_ops::to_integer_if_integral(vm, &month_raw, "month")?;
        let day_raw = vm.get_property(item, &crate::property::Key::from("day"))?;
        let day = crate::abstract_ops::to_integer_if_integral(vm, &day_raw, "day")?;
        let date = regulate_date(vm, year as i32, month, day, Overflow::Reject)?;
        let hour = field_from_object(vm, item, "hour", 0)?;
        let minute = field_from_object(vm, item, "minute", 0)?;
        let second = field_from_object(vm, item, "second", 0)?;
        let ms = field_from_object(vm, item, "millisecond", 0)?;
        let us = field_from_object(vm, item, "microsecond", 0)?;
        let ns = field_from_object(vm, item, "nanosecond", 0)?;
        let time = regulate_time(vm, hour, minute, second, ms, us, ns, Overflow::Reject)?;
        return Ok((date, time));
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.PlainDateTime"))
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
    let (date, time) = to_temporal_plain_date_time(vm, &arg(args, 0))?;
    Ok(make_plain_date_time(vm, date, time))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.PlainDateTime to a primitive value"))
}

fn year_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.0.year as f64))
}
fn month_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.0.month as f64))
}
fn day_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.0.day as f64))
}
fn hour_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.hour as f64))
}
fn minute_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.minute as f64))
}
fn second_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.second as f64))
}
fn millisecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.millisecond as f64))
}
fn microsecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.microsecond as f64))
}
fn nanosecond_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date_time(vm, &this)?.1.nanosecond as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_date_time(vm, &this)?;
    let b = to_temporal_plain_date_time(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a == b))
}

fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: f64) -> JsResult<Value> {
    let (date, time) = this_date_time(vm, &this)?;
    let d = to_temporal_duration(vm, &arg(args, 0))?;
    let overflow = read_overflow_option(vm, &arg(args, 1))?;

    let delta_ns = sign
        * (d.hours * 3_600_000_000_000.0
            + d.minutes * 60_000_000_000.0
            + d.seconds * 1_000_000_000.0
            + d.milliseconds * 1_000_000.0
            + d.microseconds * 1_000.0
            + d.nanoseconds);
    let total_ns = time_to_nanos_of_day(time) as f64 + delta_ns;
    let (new_time, day_carry) = nanos_to_time_and_days(total_ns as i64);

    let dated = add_date_duration(vm, date, d, sign, overflow)?;
    let total_days = days_from_civil(dated.year, dated.month, dated.day) + day_carry;
    let new_date = civil_from_days(total_days);

    Ok(make_plain_date_time(vm, new_date, new_time))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let (date, time) = this_date_time(vm, &this)?;
    Ok(Value::string(format!("{}T{}", format_date(date), format_time(time))))
}
