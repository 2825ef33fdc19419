// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.ZonedDateTime` (§6 "Temporal string format": instant form
//! plus a bracketed `[TimeZone]` annotation). No teacher file exists for
//! this record kind; the offset itself stands in for a full IANA time
//! zone (§1 Non-goals excludes "locale-sensitive formatting", and no time
//! zone database is available to this crate), so `[TimeZone]` here is
//! always rendered as the fixed-offset annotation produced by
//! [`super::format_offset`].

use super::{civil_from_days, days_from_civil, format_offset, format_time, nanos_to_time_and_days, parse_date, parse_offset, parse_time, strip_annotation};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::temporal::instant::parse_instant_string;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, IsoDate, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    let epoch_ns_getter = create_native_function("get epochNanoseconds", 0, false, epoch_nanoseconds_getter);
    crate::builtins::util::define_accessor(&prototype, "epochNanoseconds", Some(epoch_ns_getter), None);
    let offset_getter = create_native_function("get offset", 0, false, offset_getter);
    crate::builtins::util::define_accessor(&prototype, "offset", Some(offset_getter), None);

    define_method(&prototype, "toString", 0, false, to_string);
    define_method(&prototype, "toJSON", 0, false, to_string);
    define_method(&prototype, "valueOf", 0, false, value_of);
    define_method(&prototype, "equals", 1, false, equals);
    define_method(&prototype, "add", 1, false, |vm, this, args| add_or_subtract(vm, this, args, 1));
    define_method(&prototype, "subtract", 1, false, |vm, this, args| add_or_subtract(vm, this, args, -1));

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "ZonedDateTime",
        2,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("ZonedDateTime", prototype);
    constructor
}

fn this_fields(vm: &mut Vm, this: &Value) -> JsResult<(i128, i64)> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::ZonedDateTime { epoch_nanoseconds, offset_nanoseconds } => Ok((epoch_nanoseconds, offset_nanoseconds)),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.ZonedDateTime")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.ZonedDateTime")),
    }
}

fn make_zoned_date_time(vm: &mut Vm, epoch_nanoseconds: i128, offset_nanoseconds: i64) -> Value {
    let prototype = vm.intrinsics.temporal_prototypes.get("ZonedDateTime").cloned().unwrap_or(Value::Null);
    Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.ZonedDateTime"),
        record: TemporalRecord::ZonedDateTime { epoch_nanoseconds, offset_nanoseconds },
    }))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let epoch_arg = arg(args, 0);
    let epoch_nanoseconds = crate::abstract_ops::to_integer_if_integral(vm, &epoch_arg, "epochNanoseconds")? as i128;
    let tz_arg = arg(args, 1);
    let offset_nanoseconds = if tz_arg.is_undefined() {
        0
    } else {
        let s = crate::abstract_ops::to_display_string(vm, &tz_arg)?;
        parse_offset(&s).map(|(o, _)| o).unwrap_or(0)
    };
    Ok(make_zoned_date_time(vm, epoch_nanoseconds, offset_nanoseconds))
}

fn to_temporal_zoned_date_time(vm: &mut Vm, item: &Value) -> JsResult<(i128, i64)> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::ZonedDateTime { epoch_nanoseconds, offset_nanoseconds } = t.borrow().record {
            return Ok((epoch_nanoseconds, offset_nanoseconds));
        }
    }
    if let Value::String(s) = item {
        let (body, _annotation) = strip_annotation(s);
        let epoch_nanoseconds = parse_instant_string(body).ok_or_else(|| vm.throw_range_error("invalid Temporal.ZonedDateTime string"))?;
        let (date, rest) = parse_date(body).ok_or_else(|| vm.throw_range_error("invalid Temporal.ZonedDateTime string"))?;
        let rest = rest.strip_prefix('T').or_else(|| rest.strip_prefix('t')).unwrap_or(rest);
        let (_time, rest) = parse_time(rest).ok_or_else(|| vm.throw_range_error("invalid Temporal.ZonedDateTime string"))?;
        let (offset_nanoseconds, _rest) = parse_offset(rest).unwrap_or((0, rest));
        let _ = date;
        return Ok((epoch_nanoseconds, offset_nanoseconds));
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.ZonedDateTime"))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let (epoch_nanoseconds, offset_nanoseconds) = to_temporal_zoned_date_time(vm, &arg(args, 0))?;
    Ok(make_zoned_date_time(vm, epoch_nanoseconds, offset_nanoseconds))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.ZonedDateTime to a primitive value"))
}

fn epoch_nanoseconds_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.0 as f64))
}

fn offset_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let (_epoch_nanoseconds, offset_nanoseconds) = this_fields(vm, &this)?;
    Ok(Value::string(format_offset(offset_nanoseconds)))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_fields(vm, &this)?;
    let b = to_temporal_zoned_date_time(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a == b))
}

fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: i64) -> JsResult<Value> {
    let (epoch_nanoseconds, offset_nanoseconds) = this_fields(vm, &this)?;
    let d = to_temporal_duration(vm, &arg(args, 0))?;

    let local_days = epoch_nanoseconds.div_euclid(86_400_000_000_000);
    let local_nanos_of_day = epoch_nanoseconds.rem_euclid(86_400_000_000_000) as i64 + offset_nanoseconds;
    let date: IsoDate = civil_from_days(local_days as i64);

    let delta_ns = sign as f64
        * (d.hours * 3_600_000_000_000.0
            + d.minutes * 60_000_000_000.0
            + d.seconds * 1_000_000_000.0
            + d.milliseconds * 1_000_000.0
            + d.microseconds * 1_000.0
            + d.nanoseconds);
    let total_ns = local_nanos_of_day as f64 + delta_ns;
    let (_new_time, day_carry) = nanos_to_time_and_days(total_ns as i64);

    let mut year = date.year + (sign as f64 * d.years) as i32;
    let mut month = date.month as i64 + (sign as f64 * d.months) as i64;
    while month < 1 {
        month += 12;
        year -= 1;
    }
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let max_day = super::days_in_month(year, month as u8) as i64;
    let day = (date.day as i64).min(max_day);
    let total_days = days_from_civil(year, month as u8, day as u8) + day_carry + sign * (d.weeks * 7.0 + d.days) as i64;

    let new_epoch = total_days as i128 * 86_400_000_000_000 + (total_ns as i64).rem_euclid(86_400_000_000_000) as i128 - offset_nanoseconds as i128;
    Ok(make_zoned_date_time(vm, new_epoch, offset_nanoseconds))
}

fn to_string(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let (epoch_nanoseconds, offset_nanoseconds) = this_fields(vm, &this)?;
    let local = epoch_nanoseconds + offset_nanoseconds as i128;
    let days = local.div_euclid(86_400_000_000_000);
    let nanos_of_day = local.rem_euclid(86_400_000_000_000) as i64;
    let date = civil_from_days(days as i64);
    let (time, _carry) = nanos_to_time_and_days(nanos_of_day);

    let options = arg(args, 0);
    let omit_tz = if options.is_undefined() {
        false
    } else {
        let v = vm.get_property(&options, &crate::property::Key::from("timeZoneName"))?;
        !v.is_undefined() && crate::abstract_ops::to_display_string(vm, &v)? == "never"
    };

    let mut out = format!("{}T{}{}", super::format_date(date), format_time(time), format_offset(offset_nanoseconds));
    if !omit_tz {
        out.push_str(&format!("[{}]", format_offset(offset_nanoseconds)));
    }
    Ok(Value::string(out))
}
