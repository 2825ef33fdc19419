// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.PlainMonthDay` (§6 "Temporal string format": `--MM-DD`, the
//! ECMAScript canonical form for a calendar-less month/day pair). No
//! teacher file exists for this record kind; `reference_year` mirrors
//! `PlainYearMonth`'s `reference_day` — a concrete year to pin day-count
//! math to, never surfaced by `toString`.

use super::{days_in_month, pad2, regulate_date, Overflow};
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

const REFERENCE_YEAR: i32 = 1972;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("month", month_getter as fn(&mut Vm, Value, &[Value]) -> JsResult<Value>),
        ("day", day_getter),
    ] {
        let f = create_native_function(&format!("get {name}"), 0, false, getter);
        crate::builtins::util::define_accessor(&prototype, name, Some(f), None);
    }
    define_method(&prototype, "toString", 0, false, to_string);
    define_method(&prototype, "toJSON", 0, false, to_string);
    define_method(&prototype, "valueOf", 0, false, value_of);
    define_method(&prototype, "equals", 1, false, equals);

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "PlainMonthDay",
        2,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("PlainMonthDay", prototype);
    constructor
}

fn this_fields(vm: &mut Vm, this: &Value) -> JsResult<(u8, u8, i32)> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::PlainMonthDay { month, day, reference_year } => Ok((month, day, reference_year)),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainMonthDay")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainMonthDay")),
    }
}

fn make_plain_month_day(vm: &mut Vm, month: u8, day: u8, reference_year: i32) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("PlainMonthDay").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.PlainMonthDay"),
        record: TemporalRecord::PlainMonthDay { month, day, reference_year },
    }))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let month = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "month")?;
    let day = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 1), "day")?;
    let year_arg = arg(args, 2);
    let reference_year = if year_arg.is_undefined() { REFERENCE_YEAR } else { crate::abstract_ops::to_integer_if_integral(vm, &year_arg, "referenceISOYear")? as i32 };
    let date = regulate_date(vm, reference_year, month, day, Overflow::Reject)?;
    Ok(make_plain_month_day(vm, date.month, date.day, date.year))
}

fn to_temporal_plain_month_day(vm: &mut Vm, item: &Value) -> JsResult<(u8, u8, i32)> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::PlainMonthDay { month, day, reference_year } = t.borrow().record {
            return Ok((month, day, reference_year));
        }
    }
    if let Value::String(s) = item {
        let s = s.strip_prefix("--").unwrap_or(s);
        let (month, rest) = super::take_digits(s, 2).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainMonthDay string"))?;
        let rest = rest.strip_prefix('-').ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainMonthDay string"))?;
        let (day, _rest) = super::take_digits(rest, 2).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainMonthDay string"))?;
        if !(1..=days_in_month(REFERENCE_YEAR, month as u8) as i64).contains(&day) {
            return Err(vm.throw_range_error("day is out of range"));
        }
        return Ok((month as u8, day as u8, REFERENCE_YEAR));
    }
    if item.is_object_like() {
        let month_raw = vm.get_property(item, &crate::property::Key::from("month"))?;
        let month = crate::abstract_ops::to_integer_if_integral(vm, &month_raw, "month")?;
        let day_raw = vm.get_property(item, &crate::property::Key::from("day"))?;
        let day = crate::abstract_ops::to_integer_if_integral(vm, &day_raw, "day")?;
        let date = regulate_date(vm, REFERENCE_YEAR, month, day, Overflow::Reject)?;
        return Ok((date.month, date.day, date.year));
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.PlainMonthDay"))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let (month, day, reference_year) = to_temporal_plain_month_day(vm, &arg(args, 0))?;
    Ok(make_plain_month_day(vm, month, day, reference_year))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.PlainMonthDay to a primitive value"))
}

fn month_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.0 as f64))
}

fn day_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.1 as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_fields(vm, &this)?;
    let b = to_temporal_plain_month_day(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a.0 == b.0 && a.1 == b.1))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let (month, day, _reference_year) = this_fields(vm, &this)?;
    Ok(Value::string(format!("--{}-{}", pad2(month as i64), pad2(day as i64))))
}
