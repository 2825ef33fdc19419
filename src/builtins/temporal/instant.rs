// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.Instant` (§4.E "`Instant.add` refuses calendar-relative
//! units"). Follows the `CreateTemporalInstant`/`ToTemporalInstant`/
//! `AddDurationToInstant` shape, reimplemented over a plain `i128`
//! epoch-nanosecond count instead of an arena-backed record.

use super::{civil_from_days, days_from_civil, format_offset, format_time, nanos_to_time_and_days, parse_date, parse_offset, parse_time, time_to_nanos_of_day};
use crate::builtins::temporal::duration::to_temporal_duration;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::object::{new_gc, IsoDate, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

const MAX_EPOCH_NANOS: i128 = 8_640_000_000_000_000_000_000;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    define_method(&prototype, "toString", 0, false, to_string);
    define_method(&prototype, "toJSON", 0, false, to_string);
    define_method(&prototype, "valueOf", 0, false, value_of);
    define_method(&prototype, "add", 1, false, |vm, this, args| add_or_subtract(vm, this, args, 1));
    define_method(&prototype, "subtract", 1, false, |vm, this, args| add_or_subtract(vm, this, args, -1));
    define_method(&prototype, "equals", 1, false, equals);
    define_method(&prototype, "epochMilliseconds", 0, false, epoch_milliseconds);
    define_method(&prototype, "epochNanoseconds", 0, false, epoch_nanoseconds);

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "Instant",
        1,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);
    define_method(&constructor, "fromEpochMilliseconds", 1, false, from_epoch_milliseconds);
    define_method(&constructor, "fromEpochNanoseconds", 1, false, from_epoch_nanoseconds);

    vm.intrinsics.temporal_prototypes.insert("Instant", prototype);
    constructor
}

fn this_epoch_nanos(vm: &mut Vm, this: &Value) -> JsResult<i128> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::Instant { epoch_nanoseconds } => Ok(epoch_nanoseconds),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.Instant")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.Instant")),
    }
}

fn make_instant(vm: &mut Vm, epoch_nanoseconds: i128) -> JsResult<Value> {
    if epoch_nanoseconds.abs() > MAX_EPOCH_NANOS {
        return Err(vm.throw_range_error("epoch nanoseconds out of representable range"));
    }
    let prototype = vm.intrinsics.temporal_prototypes.get("Instant").cloned().unwrap_or(Value::Null);
    Ok(Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.Instant"),
        record: TemporalRecord::Instant { epoch_nanoseconds },
    })))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let v = arg(args, 0);
    let n = crate::abstract_ops::to_integer_if_integral(vm, &v, "epochNanoseconds")? as i128;
    make_instant(vm, n)
}

fn from_epoch_milliseconds(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ms = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "epochMilliseconds")?;
    make_instant(vm, ms as i128 * 1_000_000)
}

fn from_epoch_nanoseconds(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ns = crate::abstract_ops::to_integer_if_integral(vm, &arg(args, 0), "epochNanoseconds")?;
    make_instant(vm, ns as i128)
}

pub(super) fn parse_instant_string(s: &str) -> Option<i128> {
    let (date, rest) = parse_date(s)?;
    let rest = rest.strip_prefix('T').or_else(|| rest.strip_prefix('t'))?;
    let (time, rest) = parse_time(rest)?;
    let (offset_ns, _rest) = parse_offset(rest)?;
    let days = days_from_civil(date.year, date.month, date.day);
    let nanos_of_day = time_to_nanos_of_day(time);
    Some(days as i128 * 86_400_000_000_000 + nanos_of_day as i128 - offset_ns as i128)
}

fn to_temporal_instant(vm: &mut Vm, item: &Value) -> JsResult<i128> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::Instant { epoch_nanoseconds } = t.borrow().record {
            return Ok(epoch_nanoseconds);
        }
    }
    if let Value::String(s) = item {
        return parse_instant_string(s).ok_or_else(|| vm.throw_range_error("invalid Temporal.Instant string"));
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.Instant"))
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let ns = to_temporal_instant(vm, &arg(args, 0))?;
    make_instant(vm, ns)
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.Instant to a primitive value"))
}

fn epoch_milliseconds(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number((this_epoch_nanos(vm, &this)? / 1_000_000) as f64))
}

fn epoch_nanoseconds(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_epoch_nanos(vm, &this)? as f64))
}

fn equals(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let a = this_epoch_nanos(vm, &this)?;
    let b = to_temporal_instant(vm, &arg(args, 0))?;
    Ok(Value::Boolean(a == b))
}

/// `AddDurationToInstant` (§4.E): only the time-unit fields of a Duration
/// apply to an `Instant` — calendar-relative units (years/months/weeks/
/// days) have no fixed nanosecond length and are rejected.
fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], sign: i64) -> JsResult<Value> {
    let base = this_epoch_nanos(vm, &this)?;
    let d = to_temporal_duration(vm, &arg(args, 0))?;
    if d.years != 0.0 || d.months != 0.0 || d.weeks != 0.0 || d.days != 0.0 {
        return Err(vm.throw_range_error("Instant arithmetic does not accept calendar-relative duration units"));
    }
    let delta_ns: i128 = sign as i128
        * (d.hours as i128 * 3_600_000_000_000
            + d.minutes as i128 * 60_000_000_000
            + d.seconds as i128 * 1_000_000_000
            + d.milliseconds as i128 * 1_000_000
            + d.microseconds as i128 * 1_000
            + d.nanoseconds as i128);
    make_instant(vm, base + delta_ns)
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let ns = this_epoch_nanos(vm, &this)?;
    let days = ns.div_euclid(86_400_000_000_000);
    let nanos_of_day = ns.rem_euclid(86_400_000_000_000) as i64;
    let date: IsoDate = civil_from_days(days as i64);
    let (time, _carry) = nanos_to_time_and_days(nanos_of_day);
    Ok(Value::string(format!(
        "{}T{}Z",
        super::format_date(date),
        format_time(time)
    )))
}

#[allow(dead_code)]
fn unused_format_offset_reference() -> String {
    format_offset(0)
}
