// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Boolean` (§12.3 Open Question: minimal module — present in the
//! priority table but without a dedicated §4.E contract). Booleans are
//! unboxed (§3), so the prototype only needs `toString`/`valueOf`.

use crate::builtins::util::{arg, define_method};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct BooleanModule;

impl BuiltinInitializer for BooleanModule {
    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn priority(&self) -> i32 {
        355
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Boolean", Type::Any);
        ctx.set_primitive_prototype("boolean", Type::Object(Vec::new()));
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Boolean",
                dependency: "Object",
            })?;
        let prototype = crate::builtins::util::new_plain_object(object_prototype);
        define_method(&prototype, "toString", 0, false, to_string);
        define_method(&prototype, "valueOf", 0, false, value_of);

        vm.intrinsics.boolean_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "Boolean",
            1,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        vm.define_global("Boolean", constructor);
        Ok(())
    }
}

fn construct(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(crate::builtins::util::truthy(&arg(args, 0))))
}

fn this_bool(vm: &mut Vm, this: &Value) -> JsResult<bool> {
    match this {
        Value::Boolean(b) => Ok(*b),
        _ => Err(vm.throw_type_error("receiver is not a Boolean")),
    }
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(if this_bool(vm, &this)? { "true" } else { "false" }))
}

fn value_of(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(this_bool(vm, &this)?))
}
