// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Math` (§4.E). A namespace object, not a constructor — every member is
//! either a frozen numeric constant or a stateless transcendental wrapper
//! around `f64`'s own methods, with the deviations from a naive library
//! call §4.E calls out explicitly (`pow`, `round`, `max`/`min`, `hypot`,
//! `sumPrecise`).

use crate::abstract_ops::{to_int32, to_number, to_uint32};
use crate::builtins::util::{
    arg, define_constant, define_method, define_to_string_tag_symbol, get_iterator, iterator_close, iterator_step,
    new_plain_object,
};
use crate::error::JsResult;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct MathModule;

impl BuiltinInitializer for MathModule {
    fn name(&self) -> &'static str {
        "Math"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Math", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Math",
                dependency: "Object",
            })?;
        let math = new_plain_object(object_prototype);

        define_constant(&math, "E", Value::number(std::f64::consts::E));
        define_constant(&math, "LN10", Value::number(std::f64::consts::LN_10));
        define_constant(&math, "LN2", Value::number(std::f64::consts::LN_2));
        define_constant(&math, "LOG10E", Value::number(std::f64::consts::LOG10_E));
        define_constant(&math, "LOG2E", Value::number(std::f64::consts::LOG2_E));
        define_constant(&math, "PI", Value::number(std::f64::consts::PI));
        define_constant(&math, "SQRT1_2", Value::number(std::f64::consts::FRAC_1_SQRT_2));
        define_constant(&math, "SQRT2", Value::number(std::f64::consts::SQRT_2));

        define_method(&math, "abs", 1, false, |vm, _t, a| unary(vm, a, f64::abs));
        define_method(&math, "acos", 1, false, |vm, _t, a| unary(vm, a, f64::acos));
        define_method(&math, "acosh", 1, false, |vm, _t, a| unary(vm, a, f64::acosh));
        define_method(&math, "asin", 1, false, |vm, _t, a| unary(vm, a, f64::asin));
        define_method(&math, "asinh", 1, false, |vm, _t, a| unary(vm, a, f64::asinh));
        define_method(&math, "atan", 1, false, |vm, _t, a| unary(vm, a, f64::atan));
        define_method(&math, "atanh", 1, false, |vm, _t, a| unary(vm, a, f64::atanh));
        define_method(&math, "atan2", 2, false, atan2);
        define_method(&math, "cbrt", 1, false, |vm, _t, a| unary(vm, a, f64::cbrt));
        define_method(&math, "ceil", 1, false, |vm, _t, a| unary(vm, a, f64::ceil));
        define_method(&math, "clz32", 1, false, clz32);
        define_method(&math, "cos", 1, false, |vm, _t, a| unary(vm, a, f64::cos));
        define_method(&math, "cosh", 1, false, |vm, _t, a| unary(vm, a, f64::cosh));
        define_method(&math, "exp", 1, false, |vm, _t, a| unary(vm, a, f64::exp));
        define_method(&math, "expm1", 1, false, |vm, _t, a| unary(vm, a, f64::exp_m1));
        define_method(&math, "floor", 1, false, |vm, _t, a| unary(vm, a, f64::floor));
        define_method(&math, "fround", 1, false, fround);
        define_method(&math, "f16round", 1, false, f16round);
        define_method(&math, "hypot", 2, true, hypot);
        define_method(&math, "imul", 2, false, imul);
        define_method(&math, "log", 1, false, |vm, _t, a| unary(vm, a, f64::ln));
        define_method(&math, "log1p", 1, false, |vm, _t, a| unary(vm, a, f64::ln_1p));
        define_method(&math, "log2", 1, false, |vm, _t, a| unary(vm, a, f64::log2));
        define_method(&math, "log10", 1, false, |vm, _t, a| unary(vm, a, f64::log10));
        define_method(&math, "max", 2, true, max);
        define_method(&math, "min", 2, true, min);
        define_method(&math, "pow", 2, false, pow);
        define_method(&math, "random", 0, false, random);
        define_method(&math, "round", 1, false, round);
        define_method(&math, "sign", 1, false, sign);
        define_method(&math, "sin", 1, false, |vm, _t, a| unary(vm, a, f64::sin));
        define_method(&math, "sinh", 1, false, |vm, _t, a| unary(vm, a, f64::sinh));
        define_method(&math, "sqrt", 1, false, |vm, _t, a| unary(vm, a, f64::sqrt));
        define_method(&math, "tan", 1, false, |vm, _t, a| unary(vm, a, f64::tan));
        define_method(&math, "tanh", 1, false, |vm, _t, a| unary(vm, a, f64::tanh));
        define_method(&math, "trunc", 1, false, |vm, _t, a| unary(vm, a, f64::trunc));

        #[cfg(feature = "proposal-math-sum")]
        define_method(&math, "sumPrecise", 1, false, sum_precise);

        define_to_string_tag_symbol(vm, &math, "Math");

        vm.define_global("Math", math);
        Ok(())
    }
}

fn unary(vm: &mut Vm, args: &[Value], f: fn(f64) -> f64) -> JsResult<Value> {
    let n = to_number(vm, &arg(args, 0))?;
    Ok(Value::number(f(n)))
}

fn atan2(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let y = to_number(vm, &arg(args, 0))?;
    let x = to_number(vm, &arg(args, 1))?;
    Ok(Value::number(y.atan2(x)))
}

fn clz32(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = to_uint32(vm, &arg(args, 0))?;
    Ok(Value::number(n.leading_zeros() as f64))
}

fn imul(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let a = to_int32(vm, &arg(args, 0))?;
    let b = to_int32(vm, &arg(args, 1))?;
    Ok(Value::number(a.wrapping_mul(b) as f64))
}

fn fround(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = to_number(vm, &arg(args, 0))?;
    Ok(Value::number(n as f32 as f64))
}

/// `Math.f16round` (§4.E). Rust's stable toolchain has no native `f16`
/// type, so the binary16 round-trip (ties-to-even) is computed from the
/// mantissa/exponent directly rather than via a half-precision library —
/// Nova's own implementation notes the same library gap and offers this as
/// one of its two accepted alternatives (cast-and-correct vs. a direct
/// from-scratch rounding), minus its extra double-rounding correction step.
fn f16round(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = to_number(vm, &arg(args, 0))?;
    Ok(Value::number(round_to_f16(n)))
}

fn round_ties_even(x: f64) -> f64 {
    let floor = x.floor();
    let diff = x - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

fn round_to_f16(n: f64) -> f64 {
    if n.is_nan() {
        return f64::NAN;
    }
    if n == 0.0 || n.is_infinite() {
        return n;
    }
    let sign = n.signum();
    let magnitude = n.abs();
    if magnitude >= 65520.0 {
        return sign * f64::INFINITY;
    }
    if magnitude < 2f64.powi(-24) {
        return sign * 0.0;
    }
    let mut exponent = magnitude.log2().floor() as i32;
    if magnitude / 2f64.powi(exponent) >= 2.0 {
        exponent += 1;
    } else if magnitude / 2f64.powi(exponent) < 1.0 {
        exponent -= 1;
    }
    let subnormal = exponent < -14;
    let mut effective_exponent = exponent.max(-14);
    let scaled = magnitude / 2f64.powi(effective_exponent);
    let fraction = if subnormal { scaled } else { scaled - 1.0 };
    let mut mantissa = round_ties_even(fraction * 1024.0) as i64;
    let mut now_subnormal = subnormal;
    if mantissa == 1024 {
        mantissa = 0;
        if now_subnormal {
            now_subnormal = false;
        } else {
            effective_exponent += 1;
            if effective_exponent > 15 {
                return sign * f64::INFINITY;
            }
        }
    }
    let value = if now_subnormal {
        (mantissa as f64 / 1024.0) * 2f64.powi(-14)
    } else {
        (1.0 + mantissa as f64 / 1024.0) * 2f64.powi(effective_exponent)
    };
    sign * value
}

fn hypot(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let mut numbers = Vec::with_capacity(args.len());
    for a in args {
        numbers.push(to_number(vm, a)?);
    }
    if numbers.iter().any(|n| n.is_infinite()) {
        return Ok(Value::pos_inf());
    }
    if numbers.iter().any(|n| n.is_nan()) {
        return Ok(Value::nan());
    }
    Ok(Value::number(numbers.iter().map(|n| n * n).sum::<f64>().sqrt()))
}

fn max(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let mut numbers = Vec::with_capacity(args.len());
    for a in args {
        numbers.push(to_number(vm, a)?);
    }
    if numbers.iter().any(|n| n.is_nan()) {
        return Ok(Value::nan());
    }
    let mut result = f64::NEG_INFINITY;
    for n in numbers {
        if n > result || (n == 0.0 && result == 0.0 && n.is_sign_positive() && result.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::number(result))
}

fn min(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let mut numbers = Vec::with_capacity(args.len());
    for a in args {
        numbers.push(to_number(vm, a)?);
    }
    if numbers.iter().any(|n| n.is_nan()) {
        return Ok(Value::nan());
    }
    let mut result = f64::INFINITY;
    for n in numbers {
        if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative() && result.is_sign_positive()) {
            result = n;
        }
    }
    Ok(Value::number(result))
}

/// `Math.pow` deviations (§4.E): `pow(x, NaN) = NaN` even for `x = 1`;
/// `pow(±1, ±∞) = NaN`. Rust's `f64::powf` already returns `1.0` in both of
/// those cases (matching `libm`, not ECMAScript), so they're special-cased
/// before falling through to `powf`.
fn pow(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let base = to_number(vm, &arg(args, 0))?;
    let exponent = to_number(vm, &arg(args, 1))?;
    if exponent.is_nan() {
        return Ok(Value::nan());
    }
    if (base == 1.0 || base == -1.0) && exponent.is_infinite() {
        return Ok(Value::nan());
    }
    Ok(Value::number(base.powf(exponent)))
}

fn random(_vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::number(rand::random::<f64>()))
}

/// `Math.round` (§4.E): "round half toward +∞ but preserves `-0` for
/// `x ∈ [-0.5, -0)`" — plain `(n + 0.5).floor()` would turn `-0.4` into
/// `+0`, so the negative-near-zero band is special-cased first.
fn round(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = to_number(vm, &arg(args, 0))?;
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return Ok(Value::number(n));
    }
    if n < 0.0 && n >= -0.5 {
        return Ok(Value::FloatNumber(-0.0));
    }
    Ok(Value::number((n + 0.5).floor()))
}

fn sign(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let n = to_number(vm, &arg(args, 0))?;
    if n.is_nan() || n == 0.0 {
        return Ok(Value::number(n));
    }
    Ok(Value::number(if n > 0.0 { 1.0 } else { -1.0 }))
}

/// `Math.sumPrecise` (§4.E, §7, §8 testable property 2). Consumes the
/// argument via `@@iterator` left-to-right (§5), requiring every yielded
/// value to be a Number — on a type mismatch it calls the iterator's
/// `return()` (ignoring whatever that throws) before surfacing the
/// original `TypeError` (§7 "Local recovery"). Uses Neumaier-compensated
/// summation so `[0.1, 0.2, 0.3]` sums to exactly `0.6` (§8 property 2).
#[cfg(feature = "proposal-math-sum")]
fn sum_precise(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let iterable = arg(args, 0);
    let iterator = get_iterator(vm, &iterable)?;

    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;
    let mut saw_value = false;
    let mut saw_nan = false;
    let mut saw_pos_inf = false;
    let mut saw_neg_inf = false;
    let mut all_zeros_negative = true;

    loop {
        let next = match iterator_step(vm, &iterator) {
            Ok(next) => next,
            Err(e) => return Err(e),
        };
        let value = match next {
            Some(v) => v,
            None => break,
        };
        saw_value = true;
        let n = match value {
            Value::IntegerNumber(_) | Value::FloatNumber(_) => value.as_f64().unwrap(),
            _ => {
                iterator_close(vm, &iterator);
                return Err(vm.throw_type_error("Math.sumPrecise requires every value to be a Number"));
            }
        };
        if n.is_nan() {
            saw_nan = true;
        } else if n == f64::INFINITY {
            saw_pos_inf = true;
        } else if n == f64::NEG_INFINITY {
            saw_neg_inf = true;
        } else {
            if n != 0.0 || !n.is_sign_negative() {
                all_zeros_negative = false;
            }
            let t = sum + n;
            if sum.abs() >= n.abs() {
                compensation += (sum - t) + n;
            } else {
                compensation += (n - t) + sum;
            }
            sum = t;
        }
    }

    if saw_nan || (saw_pos_inf && saw_neg_inf) {
        return Ok(Value::nan());
    }
    if saw_pos_inf {
        return Ok(Value::pos_inf());
    }
    if saw_neg_inf {
        return Ok(Value::neg_inf());
    }
    if !saw_value {
        return Ok(Value::FloatNumber(-0.0));
    }
    let total = sum + compensation;
    if total == 0.0 && all_zeros_negative {
        return Ok(Value::FloatNumber(-0.0));
    }
    Ok(Value::number(total))
}
