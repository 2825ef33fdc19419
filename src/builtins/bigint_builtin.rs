// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `BigInt` (§4.E, §11 supplement). Arbitrary precision, backed by
//! `num-bigint`; `toString(radix)` goes through `num-bigint`'s own radix
//! support rather than `lexical`'s, since the magnitude is unbounded.

use std::rc::Rc;

use num_bigint::{BigInt, Sign};
use num_traits::Zero;

use crate::builtins::util::{arg, define_method};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct BigIntModule;

impl BuiltinInitializer for BigIntModule {
    fn name(&self) -> &'static str {
        "BigInt"
    }

    fn priority(&self) -> i32 {
        360
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("BigInt", Type::Any);
        ctx.set_primitive_prototype("bigint", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "BigInt",
                dependency: "Object",
            })?;
        let prototype = crate::builtins::util::new_plain_object(object_prototype);
        define_method(&prototype, "toString", 1, false, to_string);
        define_method(&prototype, "valueOf", 0, false, value_of);
        vm.intrinsics.bigint_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "BigInt",
            1,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        define_method(&constructor, "asIntN", 2, false, as_int_n);
        define_method(&constructor, "asUintN", 2, false, as_uint_n);

        vm.define_global("BigInt", constructor);
        Ok(())
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    match arg(args, 0) {
        Value::BigInt(b) => Ok(Value::BigInt(b)),
        Value::IntegerNumber(i) => Ok(Value::BigInt(Rc::new(BigInt::from(i)))),
        Value::FloatNumber(f) => {
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(vm.throw_range_error("The number is not a safe integer"));
            }
            Ok(Value::BigInt(Rc::new(
                BigInt::parse_bytes(format!("{f:.0}").as_bytes(), 10)
                    .ok_or_else(|| vm.throw_range_error("value out of BigInt range"))?,
            )))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::BigInt(Rc::new(BigInt::from(0))));
            }
            let (sign, rest) = match trimmed.as_bytes()[0] {
                b'-' => (Sign::Minus, &trimmed[1..]),
                b'+' => (Sign::Plus, &trimmed[1..]),
                _ => (Sign::Plus, trimmed),
            };
            let radix_prefixed = rest
                .strip_prefix("0x")
                .or_else(|| rest.strip_prefix("0X"))
                .map(|d| (16, d))
                .or_else(|| rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")).map(|d| (2, d)))
                .or_else(|| rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")).map(|d| (8, d)));
            if let Some((radix, digits)) = radix_prefixed {
                // The non-decimal integer literal grammar has no sign.
                if sign == Sign::Minus || digits.is_empty() {
                    return Err(vm.throw_syntax_error("Cannot convert string to a BigInt"));
                }
                return BigInt::parse_bytes(digits.as_bytes(), radix)
                    .map(|n| Value::BigInt(Rc::new(n)))
                    .ok_or_else(|| vm.throw_syntax_error("Cannot convert string to a BigInt"));
            }
            match trimmed.parse::<BigInt>() {
                Ok(n) => Ok(Value::BigInt(Rc::new(n))),
                Err(_) => Err(vm.throw_syntax_error("Cannot convert string to a BigInt")),
            }
        }
        Value::Boolean(b) => Ok(Value::BigInt(Rc::new(BigInt::from(if b { 1 } else { 0 })))),
        _ => Err(vm.throw_type_error("Cannot convert value to a BigInt")),
    }
}

fn this_bigint(vm: &mut Vm, this: &Value) -> JsResult<Rc<BigInt>> {
    match this {
        Value::BigInt(b) => Ok(b.clone()),
        _ => Err(vm.throw_type_error("receiver is not a BigInt")),
    }
}

fn to_string(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let b = this_bigint(vm, &this)?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10,
        v => crate::abstract_ops::to_number(vm, &v)? as u32,
    };
    if !(2..=36).contains(&radix) {
        return Err(vm.throw_range_error("toString() radix must be between 2 and 36"));
    }
    Ok(Value::string(b.to_str_radix(radix)))
}

fn value_of(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::BigInt(this_bigint(vm, &this)?))
}

fn as_int_n(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let bits = crate::abstract_ops::to_number(vm, &arg(args, 0))? as u32;
    let value = require_bigint(vm, &arg(args, 1))?;
    Ok(Value::BigInt(Rc::new(wrap_signed(&value, bits))))
}

fn as_uint_n(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let bits = crate::abstract_ops::to_number(vm, &arg(args, 0))? as u32;
    let value = require_bigint(vm, &arg(args, 1))?;
    Ok(Value::BigInt(Rc::new(wrap_unsigned(&value, bits))))
}

fn require_bigint(vm: &mut Vm, v: &Value) -> JsResult<BigInt> {
    match v {
        Value::BigInt(b) => Ok((**b).clone()),
        _ => Err(vm.throw_type_error("value is not a BigInt")),
    }
}

fn wrap_unsigned(value: &BigInt, bits: u32) -> BigInt {
    if bits == 0 {
        return BigInt::zero();
    }
    let modulus = BigInt::from(1u32) << bits;
    let mut result = value % &modulus;
    if result.sign() == Sign::Minus {
        result += &modulus;
    }
    result
}

fn wrap_signed(value: &BigInt, bits: u32) -> BigInt {
    if bits == 0 {
        return BigInt::zero();
    }
    let unsigned = wrap_unsigned(value, bits);
    let half = BigInt::from(1u32) << (bits - 1);
    if unsigned >= half {
        unsigned - (BigInt::from(1u32) << bits)
    } else {
        unsigned
    }
}
