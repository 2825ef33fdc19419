// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.PlainYearMonth` (§6 "Temporal string format": `YYYY-MM`). No
//! teacher file exists for this record kind; the `reference_day` field
//! exists purely so round-tripping through [`super::plain_date`]'s day-count
//! math has a concrete day to pin arithmetic to (ECMAScript's own
//! `[[ISODay]]` slot serves the same purpose).

use super::{format_year, pad2, parse_date, read_overflow_option, regulate_date, Overflow};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::temporal::plain_date::add_date_duration;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("year", year_getter as fn(&mut Vm, Value, &[Value]) -> JsResult<Value>),
        ("month", month_getter),
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
        "PlainYearMonth",
        2,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("PlainYearMonth", prototype);
    constructor
}

fn this_fields(vm: &mut Vm, this: &Value) -> JsResult<(i32, u8, u8)> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::PlainYearMonth { year, month, reference_day } => Ok((year, month, reference_day)),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainYearMonth")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.PlainYearMonth")),
    }
}

fn make_plain_year_month(vm: &mut Vm, year: i32, month: u8, reference_day: u8) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("PlainYearMonth").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.PlainYearMonth"),
        record: TemporalRecord::PlainYearMonth { year, month, reference_day },
    }))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let year = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "year")?;
    let month = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 1), "month")?;
    let day_arg = arg(args, 2);
    let reference_day = if day_arg.is_undefined() { 1 } else { crate::abstract_ops::to_integer_if_integral(vm, &day_arg, "referenceISODay")? };
    let date = regulate_date(vm, year as i32, month, reference_day, Overflow::Reject)?;
    Ok(make_plain_year_month(vm, date.year, date.month, date.day))
}

fn to_temporal_plain_year_month(vm: &mut Vm, item: &Value) -> JsResult<(i32, u8, u8)> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::PlainYearMonth { year, month, reference_day } = t.borrow().record {
            return Ok((year, month, reference_day));
        }
    }
    if let Value::String(s) = item {
        if let Some((date, _rest)) = parse_date(s) {
            return Ok((date.year, date.month, date.day));
        }
        let (year, rest) = super::take_digits(s, 4).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainYearMonth string"))?;
        let rest = rest.strip_prefix('-').ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainYearMonth string"))?;
        let (month, _rest) = super::take_digits(rest, 2).ok_or_else(|| vm.throw_range_error("invalid Temporal.PlainYearMonth string"))?;
        return Ok((year as i32, month as u8, 1));
    }
    if item.is_object_like() {
        let year_raw = vm.get_property(item, &crate::property::Key::from("year"))?;
        let year = crate::abstract_ops::to_integer_if_integral(vm, &year_raw, "year")?;
        let month_raw = vm.get_property(item, &crate::property::Key::from("month"))?;
        let month = crate::abstract_ops::to_integer_if_integral(vm, &month_raw, "month")?;
        let date = regulate_date(vm, year as i32, month, 1, Overflow::Reject)?;
        return Ok((date.year, date.month, date.day));
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.PlainYearMonth"))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let (year, month, reference_day) = to_temporal_plain_year_month(vm, &arg(args, 0))?;
    Ok(make_plain_year_month(vm, year, month, reference_day))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.PlainYearMonth to a primitive value"))
}

fn year_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.0 as f64))
}

fn month_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.1 as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_fields(vm, &this)?;
    let b = to_temporal_plain_year_month(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a.0 == b.0 && a.1 == b.1))
}

fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: f64) -> JsResult<Value> {
    let (year, month, reference_day) = this_fields(vm, &this)?;
    let date = crate::object::IsoDate { year, month, day: reference_day };
    let d = to_temporal_duration(vm, &arg(args, 0))?;
    let overflow = read_overflow_option(vm, &arg(args, 1))?;
    let result = add_date_duration(vm, date, d, sign, overflow)?;
    Ok(make_plain_year_month(vm, result.year, result.month, result.day))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let (year, month, _reference_day) = this_fields(vm, &this)?;
    Ok(Value::string(format!("{}-{}", format_year(year), pad2(month as i64))))
}
