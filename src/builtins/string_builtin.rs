// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `String` (§12.4 Open Question: minimal module, named in the priority
//! table without a dedicated §4.E contract). Strings are unboxed `Rc<str>`
//! (§3), so the prototype covers the handful of methods every other
//! builtin's `to_display_string`/coercion path assumes exist.

use crate::abstract_ops::to_display_string;
use crate::builtins::util::{arg, define_method};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct StringModule;

impl BuiltinInitializer for StringModule {
    fn name(&self) -> &'static str {
        "String"
    }

    fn priority(&self) -> i32 {
        300
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("String", Type::Any);
        ctx.set_primitive_prototype("string", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "String",
                dependency: "Object",
            })?;
        let prototype = crate::builtins::util::new_plain_object(object_prototype);
        define_method(&prototype, "toString", 0, false, to_string);
        define_method(&prototype, "valueOf", 0, false, to_string);
        define_method(&prototype, "charAt", 1, false, char_at);
        define_method(&prototype, "indexOf", 1, false, index_of);
        define_method(&prototype, "slice", 2, false, slice);
        define_method(&prototype, "includes", 1, false, includes);
        define_method(&prototype, "split", 1, false, split);
        define_method(&prototype, "toUpperCase", 0, false, to_upper_case);
        define_method(&prototype, "toLowerCase", 0, false, to_lower_case);
        define_method(&prototype, "trim", 0, false, trim);
        vm.intrinsics.string_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "String",
            1,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        vm.define_global("String", constructor);
        Ok(())
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    match arg(args, 0) {
        Value::Undefined => Ok(Value::string("")),
        v => Ok(Value::string(to_display_string(vm, &v)?)),
    }
}

fn this_string(vm: &mut Vm, this: &Value) -> JsResult<std::rc::Rc<str>> {
    match this {
        Value::String(s) => Ok(s.clone()),
        _ => Err(vm.throw_type_error("receiver is not a String")),
    }
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::String(this_string(vm, &this)?))
}

fn char_at(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(vm, &this)?;
    let idx = crate::abstract_ops::to_integer(vm, &arg(args, 0))?;
    Ok(match s.chars().nth(idx.max(0.0) as usize) {
        Some(c) => Value::string(c.to_string()),
        None => Value::string(""),
    })
}

fn index_of(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(vm, &this)?;
    let needle = to_display_string(vm, &arg(args, 0))?;
    Ok(Value::number(match s.find(&needle) {
        Some(byte_idx) => s[..byte_idx].chars().count() as f64,
        None => -1.0,
    }))
}

fn slice(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(vm, &this)?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let normalize = |n: f64| -> usize {
        if n < 0.0 {
            ((len as f64 + n).max(0.0)) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = match arg(args, 0) {
        Value::Undefined => 0,
        v => normalize(crate::abstract_ops::to_integer(vm, &v)?),
    };
    let end = match arg(args, 1) {
        Value::Undefined => len,
        v => normalize(crate::abstract_ops::to_integer(vm, &v)?),
    };
    if start < end {
        Ok(Value::string(chars[start..end].iter().collect::<String>()))
    } else {
        Ok(Value::string(""))
    }
}

fn includes(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(vm, &this)?;
    let needle = to_display_string(vm, &arg(args, 0))?;
    Ok(Value::Boolean(s.contains(&needle)))
}

fn split(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(vm, &this)?;
    let proto = vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null);
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::String(s)],
        v => {
            let separator = to_display_string(vm, &v)?;
            if separator.is_empty() {
                s.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                s.split(separator.as_str()).map(Value::string).collect()
            }
        }
    };
    Ok(crate::builtins::util::new_array(proto, parts))
}

fn to_upper_case(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(this_string(vm, &this)?.to_uppercase()))
}

fn to_lower_case(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(this_string(vm, &this)?.to_lowercase()))
}

fn trim(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(this_string(vm, &this)?.trim().to_string()))
}
