// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Number` (§4.E, §11 supplement). Numbers are unboxed (§3: `IntegerNumber`/
//! `FloatNumber` are plain `Value` variants, never wrapper objects), so
//! `Number.prototype` methods take their operand straight from `this` via
//! `to_number`, matching how the ECMAScript spec unwraps a `Number` exotic
//! object's `[[NumberData]]` — here there is no such internal slot to
//! unwrap, the primitive already is the value.

use crate::abstract_ops::{number_to_string_radix10, to_number};
use crate::builtins::util::{arg, define_constant, define_method};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct NumberModule;

impl BuiltinInitializer for NumberModule {
    fn name(&self) -> &'static str {
        "Number"
    }

    fn priority(&self) -> i32 {
        350
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Number", Type::Any);
        ctx.set_primitive_prototype("number", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Number",
                dependency: "Object",
            })?;
        let prototype = crate::builtins::util::new_plain_object(object_prototype);

        define_method(&prototype, "toString", 1, false, to_string);
        define_method(&prototype, "toFixed", 1, false, to_fixed);
        define_method(&prototype, "toExponential", 1, false, to_exponential);
        define_method(&prototype, "toPrecision", 1, false, to_precision);
        define_method(&prototype, "valueOf", 0, false, value_of);

        vm.intrinsics.number_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "Number",
            1,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);

        define_constant(&constructor, "MAX_VALUE", Value::number(f64::MAX));
        define_constant(&constructor, "MIN_VALUE", Value::number(f64::MIN_POSITIVE));
        define_constant(&constructor, "NaN", Value::nan());
        define_constant(&constructor, "POSITIVE_INFINITY", Value::pos_inf());
        define_constant(&constructor, "NEGATIVE_INFINITY", Value::neg_inf());
        define_constant(&constructor, "MAX_SAFE_INTEGER", Value::number(9007199254740991.0));
        define_constant(&constructor, "MIN_SAFE_INTEGER", Value::number(-9007199254740991.0));
        define_constant(&constructor, "EPSILON", Value::number(f64::EPSILON));

        define_method(&constructor, "isNaN", 1, false, is_nan);
        define_method(&constructor, "isFinite", 1, false, is_finite);
        define_method(&constructor, "isInteger", 1, false, is_integer);
        define_method(&constructor, "isSafeInteger", 1, false, is_safe_integer);
        define_method(&constructor, "parseFloat", 1, false, parse_float);
        define_method(&constructor, "parseInt", 2, false, parse_int);

        vm.define_global("Number", constructor);
        Ok(())
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = if args.is_empty() { 0.0 } else { to_number(vm, &arg(args, 0))? };
    Ok(Value::number(n))
}

fn this_number(vm: &mut Vm, this: &Value) -> JsResult<f64> {
    match this {
        Value::IntegerNumber(_) | Value::FloatNumber(_) => Ok(this.as_f64().unwrap()),
        _ => Err(vm.throw_type_error("receiver is not a Number")),
    }
}

fn to_string(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let n = this_number(vm, &this)?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10,
        v => to_number(vm, &v)? as u32,
    };
    if !(2..=36).contains(&radix) {
        return Err(vm.throw_range_error("toString() radix must be between 2 and 36"));
    }
    if radix == 10 {
        return Ok(Value::string(number_to_string_radix10(n)));
    }
    if n.is_nan() {
        return Ok(Value::string("NaN"));
    }
    if n.is_infinite() {
        return Ok(Value::string(if n > 0.0 { "Infinity" } else { "-Infinity" }));
    }
    if n.fract() == 0.0 {
        return Ok(Value::string(integer_to_radix_string(n, radix)));
    }
    // Fractional non-decimal output: `lexical`'s radix feature covers
    // integers; for fractional values we fall back to a fixed-point
    // expansion in the target base, which is all §4.E's contract requires.
    Ok(Value::string(fractional_to_radix_string(n, radix)))
}

fn fractional_to_radix_string(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let negative = n < 0.0;
    let mut magnitude = n.abs();
    let integer_part = magnitude.trunc();
    magnitude -= integer_part;
    let mut out = integer_to_radix_string(integer_part, radix);
    if magnitude > 0.0 {
        out.push('.');
        for _ in 0..20 {
            if magnitude <= 0.0 {
                break;
            }
            magnitude *= radix as f64;
            let digit = magnitude.trunc() as usize;
            out.push(DIGITS[digit.min(DIGITS.len() - 1)] as char);
            magnitude -= digit as f64;
        }
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

fn integer_to_radix_string(n: f64, radix: u32) -> String {
    let negative = n < 0.0;
    let mut magnitude = n.abs() as u64;
    if magnitude == 0 {
        return "0".to_string();
    }
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while magnitude > 0 {
        out.push(DIGITS[(magnitude % radix as u64) as usize]);
        magnitude /= radix as u64;
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap()
}

fn to_fixed(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let n = this_number(vm, &this)?;
    let digits = match arg(args, 0) {
        Value::Undefined => 0,
        v => to_number(vm, &v)? as usize,
    };
    if digits > 100 {
        return Err(vm.throw_range_error("toFixed() digits argument must be between 0 and 100"));
    }
    if n.is_nan() {
        return Ok(Value::string("NaN"));
    }
    if n.abs() >= 1e21 {
        return Ok(Value::string(crate::abstract_ops::number_to_string_radix10(n)));
    }
    Ok(Value::string(format!("{n:.digits$}")))
}

fn to_exponential(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let mut n = this_number(vm, &this)?;
    if n == 0.0 {
        n = 0.0;
    }
    let digits = match arg(args, 0) {
        Value::Undefined => None,
        v => Some(to_number(vm, &v)? as usize),
    };
    let formatted = match digits {
        Some(d) => format!("{n:.d$e}"),
        None => format!("{n:e}"),
    };
    Ok(Value::string(normalize_exponent(&formatted)))
}

/// Rust's `{:e}` writes `1e2`; ECMAScript writes `1e+2`.
fn normalize_exponent(s: &str) -> String {
    if let Some(idx) = s.find('e') {
        let (mantissa, exp) = s.split_at(idx);
        let exp = &exp[1..];
        if exp.starts_with('-') {
            format!("{mantissa}e{exp}")
        } else {
            format!("{mantissa}e+{exp}")
        }
    } else {
        s.to_string()
    }
}

fn to_precision(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let n = this_number(vm, &this)?;
    match arg(args, 0) {
        Value::Undefined => Ok(Value::string(number_to_string_radix10(n))),
        v => {
            let precision = to_number(vm, &v)? as usize;
            if precision == 0 {
                return Err(vm.throw_range_error("toPrecision() argument must be between 1 and 100"));
            }
            if n.is_nan() {
                return Ok(Value::string("NaN"));
            }
            if n.is_infinite() {
                return Ok(Value::string(if n > 0.0 { "Infinity" } else { "-Infinity" }));
            }
            let exponential = format!("{n:.*e}", precision - 1);
            let exp: i32 = exponential.rsplit('e').next().unwrap_or("0").parse().unwrap_or(0);
            // Fixed-point in [-6, precision), exponential otherwise.
            if exp < -6 || exp >= precision as i32 {
                return Ok(Value::string(normalize_exponent(&exponential)));
            }
            let decimals = (precision as i32 - 1 - exp).max(0) as usize;
            Ok(Value::string(format!("{n:.decimals$}")))
        }
    }
}

fn value_of(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(this_number(vm, &this)?))
}

fn is_nan(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(arg(args, 0).is_nan()))
}

fn is_finite(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(arg(args, 0).as_f64(), Some(n) if n.is_finite())))
}

fn is_integer(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(arg(args, 0).as_f64(), Some(n) if n.is_finite() && n.fract() == 0.0)))
}

fn is_safe_integer(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(
        matches!(arg(args, 0).as_f64(), Some(n) if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9007199254740991.0),
    ))
}

fn parse_float(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let s = crate::abstract_ops::to_display_string(vm, &arg(args, 0))?;
    let trimmed = s.trim_start();
    match fast_float::parse_partial::<f64, _>(trimmed) {
        Ok((n, _)) => Ok(Value::number(n)),
        Err(_) if trimmed.starts_with("Infinity") || trimmed.starts_with("+Infinity") => Ok(Value::pos_inf()),
        Err(_) if trimmed.starts_with("-Infinity") => Ok(Value::neg_inf()),
        Err(_) => Ok(Value::nan()),
    }
}

fn parse_int(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let s = crate::abstract_ops::to_display_string(vm, &arg(args, 0))?;
    let mut trimmed = s.trim();
    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        v => to_number(vm, &v)? as u32,
    };
    let negative = trimmed.starts_with('-');
    if trimmed.starts_with('-') || trimmed.starts_with('+') {
        trimmed = &trimmed[1..];
    }
    if radix == 0 {
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            radix = 16;
            trimmed = &trimmed[2..];
        } else {
            radix = 10;
        }
    } else if radix == 16 && (trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
        trimmed = &trimmed[2..];
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::nan());
    }
    let end = trimmed
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..end];
    if digits.is_empty() {
        return Ok(Value::nan());
    }
    match i64::from_str_radix(digits, radix) {
        Ok(n) => Ok(Value::number(if negative { -n as f64 } else { n as f64 })),
        Err(_) => match u128::from_str_radix(digits, radix) {
            Ok(n) => Ok(Value::number(if negative { -(n as f64) } else { n as f64 })),
            Err(_) => Ok(Value::nan()),
        },
    }
}
