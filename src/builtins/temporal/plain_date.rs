// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.PlainDate` (§6 "Temporal string format": `YYYY-MM-DD`). Built
//! from the string-format description plus the shared ISO-8601 helpers,
//! in the same one-record-kind-per-module shape as the other Temporal
//! submodules.

use super::{civil_from_days, days_from_civil, days_in_month, format_date, is_leap_year, parse_date, read_overflow_option, regulate_date, Overflow};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, IsoDate, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("year", year_getter as fn(&mut Vm, Value, &[Value]) -> JsResult<Value>),
        ("month", month_getter),
        ("day", day_getter),
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
        "PlainDate",
        3,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("PlainDate", prototype);
    constructor
}

pub(super) fn this_date(vm: &mut Vm, this: &Value) -> JsResult<IsoDate> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::PlainDate(d) => Ok(d),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainDate")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainDate")),
    }
}

pub(super) fn make_plain_date(vm: &mut Vm, date: IsoDate) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("PlainDate").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.PlainDate"),
        record: TemporalRecord::PlainDate(date),
    }))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let year = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "year")?;
    let month = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 1), "month")?;
    let day = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 2), "day")?;
    let date = regulate_date(vm, year as i32, month, day, Overflow::Reject)?;
    Ok(make_plain_date(vm, date))
}

pub(super) fn to_temporal_plain_date(vm: &mut Vm, item: &Value) -> JsResult<IsoDate> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::PlainDate(d) = t.borrow().record {
            return Ok(d);
        }
        if let TemporalRecord::PlainDateTime(d, _) = t.borrow().record {
            return Ok(d);
        }
    }
    if let Value::String(s) = item {
        let (date, _rest) = parse_date(s).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainDate string"))?;
        return Ok(date);
    }
    if item.is_object_like() {
        let year_raw = vm.get_property(item, &crate::property::Key::from("year"))?;
        let year = crate::abstract_ops::to_integer_if_integral(vm, &year_raw, "year")?;
        let month_raw = vm.get_property(item, &crate::property::Key::from("month"))?;
        let month = crate::abstract_ops::to_integer_if_integral(vm, &month_raw, "month")?;
        let day_raw = vm.get_property(item, &crate::property::Key::from("day"))?;
        let day = crate::abstract_ops::to_integer_if_integral(vm, &day_raw, "day")?;
        return regulate_date(vm, year as i32, month, day, Overflow::Reject);
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.PlainDate"))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let overflow = read_overflow_option(vm, &arg(args, 1))?;
    let item = arg(args, 0);
    if item.is_object_like() && !matches!(item, Value::Temporal(_)) {
        let year_raw = vm.get_property(&item, &crate::property::Key::from("year"))?;
        let year = crate::abstract_ops::to_integer_if_integral(vm, &year_raw, "year")?;
        let month_raw = vm.get_property(&item, &crate::property::Key::from("month"))?;
        let month = crate::abstract_ops::to_integer_if_integral(vm, &month_raw, "month")?;
        let day_raw = vm.get_property(&item, &crate::property::Key::from("day"))?;
        let day = crate::abstract_ops::to_integer_if_integral(vm, &day_raw, "day")?;
        let date = regulate_date(vm, year as i32, month, day, overflow)?;
        return Ok(make_plain_date(vm, date));
    }
    let date = to_temporal_plain_date(vm, &item)?;
    Ok(make_plain_date(vm, date))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.PlainDate to a primitive value"))
}

fn year_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date(vm, &this)?.year as f64))
}

fn month_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date(vm, &this)?.month as f64))
}

fn day_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_date(vm, &this)?.day as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_date(vm, &this)?;
    let b = to_temporal_plain_date(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a == b))
}

/// Adds date-only Duration fields: years/months applied via field-wise
/// calendar arithmetic (constrained into range), weeks/days via the
/// day-count helpers.
pub(super) fn add_date_duration(vm: &mut Vm, date: IsoDate, d: crate::object::DurationFields, sign: f64, overflow: Overflow) -> JsResult<IsoDate> {
    let mut year = date.year + (sign * d.years) as i32;
    let mut month = date.month as i64 + (sign * d.months) as i64;
    while month < 1 {
        month += 12;
        year -= 1;
    }
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let max_day = days_in_month(year, month as u8) as i64;
    let day = match overflow {
        Overflow::Reject if date.day as i64 > max_day => return Err(vm.throw_range_error("day is out of range")),
        _ => (date.day as i64).min(max_day),
    };
    let dated = IsoDate { year, month: month as u8, day: day as u8 };
    let total_days = days_from_civil(dated.year, dated.month, dated.day) + (sign * (d.weeks * 7.0 + d.days)) as i64;
    Ok(civil_from_days(total_days))
}

fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: f64) -> JsResult<Value> {
    let date = this_date(vm, &this)?;
    let d = to_temporal_duration(vm, &arg(args, 0))?;
    let overflow = read_overflow_option(vm, &arg(args, 1))?;
    let result = add_date_duration(vm, date, d, sign, overflow)?;
    Ok(make_plain_date(vm, result))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(format_date(this_date(vm, &this)?)))
}

#[allow(dead_code)]
fn unused_is_leap_year_reference() -> bool {
    is_leap_year(2000)
}
