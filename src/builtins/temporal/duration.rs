// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Temporal.Duration` (§4.E "Duration enforces uniform sign across all
//! fields"). Follows the `CreateTemporalDuration`/`ToTemporalDuration`
//! shape, reimplemented against plain [`DurationFields`] instead of an
//! arena-backed record.

use super::{pad2, take_digits};
use crate::abstract_ops::to_integer_if_integral;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, create_native_function, link_constructor_and_prototype};
use crate::object::{new_gc, DurationFields, ObjectBase, TemporalData, TemporalRecord};
use crate::value::Value;
use crate::vm::Vm;

pub fn build(vm: &mut Vm, object_prototype: Value) -> Value {
    let prototype = new_plain_object(object_prototype);
    for (name, getter) in [
        ("years", field_getter(0)),
        ("months", field_getter(1)),
        ("weeks", field_getter(2)),
        ("days", field_getter(3)),
        ("hours", field_getter(4)),
        ("minutes", field_getter(5)),
        ("seconds", field_getter(6)),
        ("milliseconds", field_getter(7)),
        ("microseconds", field_getter(8)),
        ("nanoseconds", field_getter(9)),
    ] {
        let f = create_native_function(&format!("get {name}"), 0, false, getter);
        crate::builtins::util::define_accessor(&prototype, name, Some(f), None);
    }
    let sign_getter = create_native_function("get sign", 0, false, sign_getter);
    crate::builtins::util::define_accessor(&prototype, "sign", Some(sign_getter), None);
    let blank_getter = create_native_function("get blank", 0, false, blank_getter);
    crate::builtins::util::define_accessor(&prototype, "blank", Some(blank_getter), None);

    define_method(&prototype, "toString", 0, false, to_string);
    define_method(&prototype, "toJSON", 0, false, to_string);
    define_method(&prototype, "valueOf", 0, false, value_of);
    define_method(&prototype, "negated", 0, false, negated);
    define_method(&prototype, "abs", 0, false, abs);
    define_method(&prototype, "add", 1, false, |vm, this, args| add_or_subtract(vm, this, args, 1.0));
    define_method(&prototype, "subtract", 1, false, |vm, this, args| add_or_subtract(vm, this, args, -1.0));

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        "Duration",
        0,
        false,
        construct,
    );
    link_constructor_and_prototype(&constructor, &prototype);
    define_method(&constructor, "from", 1, false, from);

    vm.intrinsics.temporal_prototypes.insert("Duration", prototype);
    constructor
}

fn this_fields(vm: &mut Vm, this: &Value) -> JsResult<DurationFields> {
    match this {
        Value::Temporal(t) => match t.borrow().record {
            TemporalRecord::Duration(f) => Ok(f),
            _ => Err(vm.throw_type_error("receiver is not a Temporal.Duration")),
        },
        _ => Err(vm.throw_type_error("receiver is not a Temporal.Duration")),
    }
}

fn make_duration(vm: &mut Vm, fields: DurationFields) -> JsResult<Value> {
    if !fields.is_uniform_sign() {
        return Err(vm.throw_range_error("Duration fields must all have the same sign"));
    }
    let prototype = vm.intrinsics.temporal_prototypes.get("Duration").cloned().unwrap_or(Value::Null);
    Ok(Value::Temporal(new_gc(TemporalData {
        base: ObjectBase::new(prototype, "Temporal.Duration"),
        record: TemporalRecord::Duration(fields),
    })))
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let mut values = [0.0f64; 10];
    for (i, v) in values.iter_mut().enumerate() {
        let a = arg(args, i);
        *v = if a.is_undefined() { 0.0 } else { to_integer_if_integral(vm, &a, field_name(i))? as f64 };
    }
    let fields = DurationFields {
        years: values[0], months: values[1], weeks: values[2], days: values[3], hours: values[4],
        minutes: values[5], seconds: values[6], milliseconds: values[7], microseconds: values[8], nanoseconds: values[9],
    };
    make_duration(vm, fields)
}

fn field_name(i: usize) -> &'static str {
    ["years", "months", "weeks", "days", "hours", "minutes", "seconds", "milliseconds", "microseconds", "nanoseconds"][i]
}

fn field_getter(i: usize) -> fn(&mut Vm, Value, &[Value]) -> JsResult<Value> {
    match i {
        0 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.years)),
        1 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.months)),
        2 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.weeks)),
        3 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.days)),
        4 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.hours)),
        5 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.minutes)),
        6 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.seconds)),
        7 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.milliseconds)),
        8 => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.microseconds)),
        _ => |vm, this, _a| Ok(Value::number(this_fields(vm, &this)?.nanoseconds)),
    }
}

fn sign_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_fields(vm, &this)?.sign() as f64))
}

fn blank_getter(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(this_fields(vm, &this)?.is_blank()))
}

fn value_of(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error("Cannot convert a Temporal.Duration to a primitive value"))
}

fn negated(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let f = this_fields(vm, &this)?;
    make_duration(vm, DurationFields {
        years: -f.years, months: -f.months, weeks: -f.weeks, days: -f.days, hours: -f.hours,
        minutes: -f.minutes, seconds: -f.seconds, milliseconds: -f.milliseconds, microseconds: -f.microseconds, nanoseconds: -f.nanoseconds,
    })
}

fn abs(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let f = this_fields(vm, &this)?;
    make_duration(vm, DurationFields {
        years: f.years.abs(), months: f.months.abs(), weeks: f.weeks.abs(), days: f.days.abs(), hours: f.hours.abs(),
        minutes: f.minutes.abs(), seconds: f.seconds.abs(), milliseconds: f.milliseconds.abs(), microseconds: f.microseconds.abs(), nanoseconds: f.nanoseconds.abs(),
    })
}

/// `Temporal.Duration.prototype.add`/`subtract`: field-wise sum (§4.E); the
/// ten fields have no cross-unit range to rebalance, only the uniform-sign
/// invariant of the result is enforced.
fn add_or_subtract(vm: &mut Vm, this: Value, args: &[Value], other_sign: f64) -> JsResult<Value> {
    let a = this_fields(vm, &this)?;
    let b = to_temporal_duration(vm, &arg(args, 0))?;
    make_duration(vm, DurationFields {
        years: a.years + other_sign * b.years,
        months: a.months + other_sign * b.months,
        weeks: a.weeks + other_sign * b.weeks,
        days: a.days + other_sign * b.days,
        hours: a.hours + other_sign * b.hours,
        minutes: a.minutes + other_sign * b.minutes,
        seconds: a.seconds + other_sign * b.seconds,
        milliseconds: a.milliseconds + other_sign * b.milliseconds,
        microseconds: a.microseconds + other_sign * b.microseconds,
        nanoseconds: a.nanoseconds + other_sign * b.nanoseconds,
    })
}

fn from(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let fields = to_temporal_duration(vm, &arg(args, 0))?;
    make_duration(vm, fields)
}

/// `ToTemporalDuration` (§4.E): another Duration, a duck-typed fields
/// object (plural field names, §4.E "singular like `year` raises
/// TypeError" — enforced simply by never reading singular names), or an
/// ISO-8601 duration string.
pub(super) fn to_temporal_duration(vm: &mut Vm, item: &Value) -> JsResult<DurationFields> {
    if let Value::Temporal(t) = item {
        if let TemporalRecord::Duration(f) = t.borrow().record {
            return Ok(f);
        }
    }
    if let Value::String(s) = item {
        return parse_duration(s).ok_or_else(|| vm.throw_range_error("invalid Temporal.Duration string"));
    }
    if item.is_object_like() {
        let mut fields = DurationFields::ZERO;
        let mut any = false;
        for (i, name) in ["years", "months", "weeks", "days", "hours", "minutes", "seconds", "milliseconds", "microseconds", "nanoseconds"].iter().enumerate() {
            let v = vm.get_property(item, &crate::property::Key::from(*name))?;
            if !v.is_undefined() {
                any = true;
                let n = to_integer_if_integral(vm, &v, name)? as f64;
                match i {
                    0 => fields.years = n,
                    1 => fields.months = n,
                    2 => fields.weeks = n,
                    3 => fields.days = n,
                    4 => fields.hours = n,
                    5 => fields.minutes = n,
                    6 => fields.seconds = n,
                    7 => fields.milliseconds = n,
                    8 => fields.microseconds = n,
                    _ => fields.nanoseconds = n,
                }
            }
        }
        if !any {
            return Err(vm.throw_type_error("Duration-like object must have at least one unit"));
        }
        return Ok(fields);
    }
    Err(vm.throw_type_error("cannot convert value to a Temporal.Duration"))
}

fn parse_duration(s: &str) -> Option<DurationFields> {
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1.0, &s[1..]),
        Some(b'-') => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    let rest = rest.strip_prefix('P').or_else(|| rest.strip_prefix('p'))?;
    let (date_part, time_part) = match rest.find(|c| c == 'T' || c == 't') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let mut fields = DurationFields::ZERO;
    let mut rest = date_part;
    while !rest.is_empty() {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        let n: f64 = digits.parse().ok()?;
        rest = &rest[digits.len()..];
        let unit = rest.chars().next()?;
        rest = &rest[unit.len_utf8()..];
        match unit {
            'Y' | 'y' => fields.years = sign * n,
            'M' | 'm' => fields.months = sign * n,
            'W' | 'w' => fields.weeks = sign * n,
            'D' | 'd' => fields.days = sign * n,
            _ => return None,
        }
    }
    if let Some(mut rest) = time_part {
        while !rest.is_empty() {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if digits.is_empty() {
                return None;
            }
            rest = &rest[digits.len()..];
            let unit = rest.chars().next()?;
            rest = &rest[unit.len_utf8()..];
            match unit {
                'H' | 'h' => fields.hours = sign * digits.parse::<f64>().ok()?,
                'M' | 'm' => fields.minutes = sign * digits.parse::<f64>().ok()?,
                'S' | 's' => {
                    let (whole, frac) = match digits.split_once('.') {
                        Some((w, f)) => (w, f),
                        None => (digits.as_str(), ""),
                    };
                    let whole: f64 = if whole.is_empty() { 0.0 } else { whole.parse().ok()? };
                    let mut padded = frac.to_string();
                    while padded.len() < 9 {
                        padded.push('0');
                    }
                    let nanos: i64 = padded[..9].parse().unwrap_or(0);
                    fields.seconds = sign * whole;
                    fields.milliseconds = sign * (nanos / 1_000_000) as f64;
                    fields.microseconds = sign * ((nanos / 1_000) % 1_000) as f64;
                    fields.nanoseconds = sign * (nanos % 1_000) as f64;
                }
                _ => return None,
            }
        }
    }
    Some(fields)
}

fn format_duration(f: DurationFields) -> String {
    if f.is_blank() {
        return "PT0S".to_string();
    }
    let sign = if f.sign() < 0 { "-" } else { "" };
    let abs = |x: f64| x.abs();
    let mut date_part = String::new();
    if f.years != 0.0 {
        date_part.push_str(&format!("{}Y", abs(f.years) as i64));
    }
    if f.months != 0.0 {
        date_part.push_str(&format!("{}M", abs(f.months) as i64));
    }
    if f.weeks != 0.0 {
        date_part.push_str(&format!("{}W", abs(f.weeks) as i64));
    }
    if f.days != 0.0 {
        date_part.push_str(&format!("{}D", abs(f.days) as i64));
    }

    let total_nanos: i128 = abs(f.seconds) as i128 * 1_000_000_000
        + abs(f.milliseconds) as i128 * 1_000_000
        + abs(f.microseconds) as i128 * 1_000
        + abs(f.nanoseconds) as i128;
    let seconds_whole = total_nanos / 1_000_000_000;
    let seconds_frac = (total_nanos % 1_000_000_000) as u32;

    let mut time_part = String::new();
    if f.hours != 0.0 {
        time_part.push_str(&format!("{}H", abs(f.hours) as i64));
    }
    if f.minutes != 0.0 {
        time_part.push_str(&format!("{}M", abs(f.minutes) as i64));
    }
    if seconds_whole != 0 || seconds_frac != 0 {
        if seconds_frac == 0 {
            time_part.push_str(&format!("{seconds_whole}S"));
        } else {
            let mut digits = format!("{:09}", seconds_frac);
            while digits.ends_with('0') {
                digits.pop();
            }
            time_part.push_str(&format!("{seconds_whole}.{digits}S"));
        }
    }

    let mut result = format!("{sign}P{date_part}");
    if !time_part.is_empty() {
        result.push('T');
        result.push_str(&time_part);
    }
    result
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(format_duration(this_fields(vm, &this)?)))
}

#[allow(dead_code)]
fn unused_pad2_reference() -> String {
    pad2(0)
}

#[allow(dead_code)]
fn unused_take_digits_reference() -> Option<(i64, &'static str)> {
    take_digits("0", 1)
}
