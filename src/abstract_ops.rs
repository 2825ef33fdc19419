// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value conversion abstract operations (§4.A).

use num_bigint::BigInt;
use num_traits::ToPrimitive as _;

use crate::error::JsResult;
use crate::value::Value;
use crate::vm::Vm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Default,
    Number,
    String,
}

/// `ToPrimitive(v, hint)`: invokes `Symbol.toPrimitive` then
/// `valueOf`/`toString` in the order the hint determines; re-enters the VM.
/// Primitives are returned unchanged without any re-entry.
pub fn to_primitive(vm: &mut Vm, v: &Value, hint: Hint) -> JsResult<Value> {
    if !v.is_object_like() {
        return Ok(v.clone());
    }

    if let Some(exotic) = v.with_base(|b| {
        b.slots
            .get_own(&crate::property::Key::Symbol(vm.well_known_symbols.to_primitive.clone()))
            .map(|s| s.value.clone())
    }).flatten() {
        if let crate::property::SlotValue::Data(f) = exotic {
            if f.is_callable() {
                let hint_str = match hint {
                    Hint::Default => "default",
                    Hint::Number => "number",
                    Hint::String => "string",
                };
                let result = vm.call_function_directly(&f, v.clone(), &[Value::string(hint_str)])?;
                if !result.is_object_like() {
                    return Ok(result);
                }
                return Err(vm.throw_type_error("Cannot convert object to primitive value"));
            }
        }
    }

    let method_order: [&str; 2] = match hint {
        Hint::String => ["toString", "valueOf"],
        Hint::Number | Hint::Default => ["valueOf", "toString"],
    };

    for method_name in method_order {
        let method = vm.get_property(v, &crate::property::Key::from(method_name))?;
        if method.is_callable() {
            let result = vm.call_function_directly(&method, v.clone(), &[])?;
            if !result.is_object_like() {
                return Ok(result);
            }
        }
    }

    Err(vm.throw_type_error("Cannot convert object to primitive value"))
}

/// `ToNumber(v)` (§4.A). Never throws for primitives; the object path may
/// throw if `valueOf`/`toString` throws.
pub fn to_number(vm: &mut Vm, v: &Value) -> JsResult<f64> {
    match v {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::IntegerNumber(i) => Ok(*i as f64),
        Value::FloatNumber(f) => Ok(*f),
        Value::String(s) => Ok(string_to_number(s)),
        Value::BigInt(b) => Ok(b.to_f64().unwrap_or(f64::NAN)),
        Value::Symbol(_) => Err(vm.throw_type_error("Cannot convert a Symbol value to a number")),
        _ => {
            let prim = to_primitive(vm, v, Hint::Number)?;
            to_number(vm, &prim)
        }
    }
}

/// Parses per the ECMAScript numeric string grammar (§4.A): leading/trailing
/// unicode whitespace trimmed, `0x`/`0b`/`0o` prefixes, exact-case
/// `"Infinity"`/`"+Infinity"`/`"-Infinity"`, numeric separators (`_`)
/// rejected.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c: char| c.is_whitespace());
    if trimmed.is_empty() {
        return 0.0;
    }
    if trimmed.contains('_') {
        return f64::NAN;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let (sign, rest) = match trimmed.as_bytes()[0] {
        b'+' => (1.0, &trimmed[1..]),
        b'-' => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return match u128::from_str_radix(hex, 16) {
            Ok(n) if !hex.is_empty() => sign * n as f64,
            _ => f64::NAN,
        };
    }
    if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        return match u128::from_str_radix(bin, 2) {
            Ok(n) if !bin.is_empty() => sign * n as f64,
            _ => f64::NAN,
        };
    }
    if let Some(oct) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        return match u128::from_str_radix(oct, 8) {
            Ok(n) if !oct.is_empty() => sign * n as f64,
            _ => f64::NAN,
        };
    }
    match fast_float::parse::<f64, _>(rest) {
        Ok(n) => sign * n,
        Err(_) => f64::NAN,
    }
}

/// `ToInteger(v)` (§4.A): truncated toward zero; `NaN`->0; `±Infinity`
/// preserved. Note this differs from `ToIntegerOrInfinity` in ECMAScript
/// proper only in naming; the semantics spec.md gives match that AO.
pub fn to_integer(vm: &mut Vm, v: &Value) -> JsResult<f64> {
    let n = to_number(vm, v)?;
    Ok(to_integer_from_f64(n))
}

pub fn to_integer_from_f64(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() {
        n
    } else {
        n.trunc()
    }
}

/// `ToUint32(v)`: `NaN`, `±0`, `±Infinity` -> 0; otherwise `trunc` then
/// modulo 2^32 with wrap.
pub fn to_uint32(vm: &mut Vm, v: &Value) -> JsResult<u32> {
    let n = to_number(vm, v)?;
    Ok(f64_to_uint32(n))
}

pub fn f64_to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let n = n.trunc();
    let modulo = n.rem_euclid(4294967296.0);
    modulo as u32
}

/// `ToInt32(v)`: as `ToUint32`, reinterpreting the high bit as sign.
pub fn to_int32(vm: &mut Vm, v: &Value) -> JsResult<i32> {
    let n = to_number(vm, v)?;
    Ok(f64_to_uint32(n) as i32)
}

/// `ToIntegerIfIntegral(v, fieldName)`, used by Temporal (§4.A): `Symbol`/
/// `BigInt` throw `TypeError`; non-finite throws `RangeError`; non-integral
/// finite throws `RangeError`; otherwise returns the truncated integer.
pub fn to_integer_if_integral(vm: &mut Vm, v: &Value, field_name: &str) -> JsResult<i64> {
    match v {
        Value::Symbol(_) | Value::BigInt(_) => Err(vm.throw_type_error(&format!(
            "{field_name} must not be a Symbol or BigInt"
        ))),
        _ => {
            let n = to_number(vm, v)?;
            if !n.is_finite() {
                return Err(vm.throw_range_error(&format!("{field_name} must be finite")));
            }
            if n.fract() != 0.0 {
                return Err(vm.throw_range_error(&format!("{field_name} must be an integer")));
            }
            Ok(n as i64)
        }
    }
}

/// `SameValue` (ECMAScript `Object.is`): `+0` and `-0` are distinguished,
/// `NaN` equals itself.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (a, b) if a.is_number() && b.is_number() => {
            let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
            if x.is_nan() && y.is_nan() {
                true
            } else if x == 0.0 && y == 0.0 {
                x.is_sign_negative() == y.is_sign_negative()
            } else {
                x == y
            }
        }
        _ => a.same_heap_identity(b),
    }
}

/// `SameValueZero`: as `SameValue` but `+0` and `-0` compare equal.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
        return (x.is_nan() && y.is_nan()) || x == y;
    }
    same_value(a, b)
}

/// `StrictEqual`: distinguishes `+0`/`-0` as equal and `NaN` from itself as
/// unequal (§4.A).
pub fn strict_equal(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
        return x == y;
    }
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        _ => a.same_heap_identity(b),
    }
}

/// Loose `Equal` with the standard ECMAScript coercions.
pub fn loose_equal(vm: &mut Vm, a: &Value, b: &Value) -> JsResult<bool> {
    if std::mem::discriminant(a) == std::mem::discriminant(b) || (a.is_number() && b.is_number()) {
        return Ok(strict_equal(a, b));
    }
    match (a, b) {
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => Ok(true),
        (Value::String(_), _) if b.is_number() => {
            let na = to_number(vm, a)?;
            Ok(na == b.as_f64().unwrap())
        }
        (_, Value::String(_)) if a.is_number() => {
            let nb = to_number(vm, b)?;
            Ok(a.as_f64().unwrap() == nb)
        }
        (Value::Boolean(_), _) => {
            let na = Value::number(to_number(vm, a)?);
            loose_equal(vm, &na, b)
        }
        (_, Value::Boolean(_)) => {
            let nb = Value::number(to_number(vm, b)?);
            loose_equal(vm, a, &nb)
        }
        (a, b) if (a.is_number() || matches!(a, Value::String(_) | Value::BigInt(_))) && b.is_object_like() => {
            let prim = to_primitive(vm, b, Hint::Default)?;
            loose_equal(vm, a, &prim)
        }
        (a, b) if a.is_object_like() && (b.is_number() || matches!(b, Value::String(_) | Value::BigInt(_))) => {
            let prim = to_primitive(vm, a, Hint::Default)?;
            loose_equal(vm, &prim, b)
        }
        (Value::BigInt(x), Value::String(s)) => Ok(bigint_from_str(s) == Some((**x).clone())),
        (Value::String(s), Value::BigInt(x)) => Ok(bigint_from_str(s) == Some((**x).clone())),
        _ => Ok(false),
    }
}

fn bigint_from_str(s: &str) -> Option<BigInt> {
    s.trim().parse::<BigInt>().ok()
}

/// `ToString` used for array join/index-key conversion; the host string
/// interner is out of scope, we use `Rc<str>` directly.
pub fn to_display_string(vm: &mut Vm, v: &Value) -> JsResult<String> {
    match v {
        Value::Undefined => Ok("undefined".into()),
        Value::Null => Ok("null".into()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::String(s) => Ok(s.to_string()),
        Value::IntegerNumber(i) => Ok(i.to_string()),
        Value::FloatNumber(f) => Ok(number_to_string_radix10(*f)),
        Value::BigInt(b) => Ok(b.to_string()),
        Value::Symbol(_) => Err(vm.throw_type_error("Cannot convert a Symbol value to a string")),
        _ => {
            let prim = to_primitive(vm, v, Hint::String)?;
            to_display_string(vm, &prim)
        }
    }
}

/// ECMAScript-correct shortest round-trip float formatting (base 10).
pub fn number_to_string_radix10(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    if f == 0.0 {
        return "0".into();
    }
    ryu_js::Buffer::new().format(f).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_number_prefixes() {
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert!(string_to_number("1_000").is_nan());
        assert_eq!(string_to_number("Infinity"), f64::INFINITY);
        assert!(string_to_number("infinity").is_nan());
    }

    #[test]
    fn to_uint32_wraps() {
        assert_eq!(f64_to_uint32(4294967296.0), 0);
        assert_eq!(f64_to_uint32(-1.0), 4294967295);
        assert_eq!(f64_to_uint32(f64::NAN), 0);
    }

    #[test]
    fn same_value_distinguishes_signed_zero() {
        assert!(!same_value(&Value::pos_zero(), &Value::neg_zero()));
        assert!(same_value_zero(&Value::pos_zero(), &Value::neg_zero()));
        assert!(same_value(&Value::nan(), &Value::nan()));
    }
}
