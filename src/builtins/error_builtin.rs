// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `Error` family (§4.E, §7). `Error.prototype` sits at the root;
//! `TypeError.prototype` etc. chain to it. `Vm::make_error` (§7) looks up
//! `vm.intrinsics.error_prototypes` by [`ErrorKind`], so every concrete
//! error module must run before any native throws of that kind.

use crate::abstract_ops::to_display_string;
use crate::builtins::util::{arg, define_method, new_plain_object};
use crate::error::{ErrorKind, JsResult};
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::object::ObjectBase;
use crate::property::Key;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

fn install(
    vm: &mut Vm,
    kind: ErrorKind,
    parent_prototype: Value,
    priority_name: &'static str,
    construct_fn: crate::object::NativeFn,
) -> Value {
    let prototype = new_plain_object(parent_prototype);
    prototype.with_base_mut(|b| {
        b.slots.set_own_non_enumerable("name", Value::string(kind.name()));
        b.slots.set_own_non_enumerable("message", Value::string(""));
    });
    define_method(&prototype, "toString", 0, false, to_string);

    let constructor = create_constructor_function_with_proto(
        vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
        priority_name,
        1,
        false,
        construct_fn,
    );
    link_constructor_and_prototype(&constructor, &prototype);

    vm.intrinsics.error_prototypes.insert(kind, prototype.clone());
    vm.intrinsics.error_constructors.insert(kind, constructor.clone());
    vm.define_global(priority_name, constructor);
    prototype
}

fn construct_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::Error)
}

fn construct_type_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::TypeError)
}

fn construct_range_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::RangeError)
}

fn construct_syntax_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::SyntaxError)
}

fn construct_reference_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::ReferenceError)
}

fn construct_eval_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::EvalError)
}

fn construct_uri_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::UriError)
}

fn construct_aggregate_error(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    construct(vm, this, args, ErrorKind::AggregateError)
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value], kind: ErrorKind) -> JsResult<Value> {
    let prototype = vm
        .intrinsics
        .error_prototypes
        .get(&kind)
        .cloned()
        .unwrap_or(Value::Null);
    let mut base = ObjectBase::new(prototype, "Error");
    let message_arg = arg(args, 0);
    if !message_arg.is_undefined() {
        let message = to_display_string(vm, &message_arg)?;
        base.slots.set_own_non_enumerable("message", Value::string(message));
    }
    let options = arg(args, 1);
    if let Value::PlainObject(_) = &options {
        if vm.has_own(&options, &Key::from("cause")) {
            let cause = vm.get_property(&options, &Key::from("cause"))?;
            base.slots.set_own_non_enumerable("cause", cause);
        }
    }
    let name = kind.name().to_string();
    let message = match base.slots.get_own(&Key::from("message")) {
        Some(slot) => match &slot.value {
            crate::property::SlotValue::Data(Value::String(s)) => s.to_string(),
            _ => String::new(),
        },
        None => String::new(),
    };
    base.slots
        .set_own_non_enumerable("stack", Value::string(format!("{name}: {message}")));
    Ok(Value::PlainObject(crate::object::new_gc(crate::object::ObjectData {
        base,
        extensible: true,
    })))
}

/// `Error.prototype.toString` (§4.E supplement): `"<name>: <message>"`, or
/// just `<name>` when the message is empty.
fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let name = match vm.get_property(&this, &Key::from("name"))? {
        Value::Undefined => "Error".to_string(),
        v => to_display_string(vm, &v)?,
    };
    let message = match vm.get_property(&this, &Key::from("message"))? {
        Value::Undefined => String::new(),
        v => to_display_string(vm, &v)?,
    };
    Ok(Value::string(if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{name}: {message}")
    }))
}

pub struct ErrorModule;

impl BuiltinInitializer for ErrorModule {
    fn name(&self) -> &'static str {
        "Error"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Error", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Error",
                dependency: "Object",
            })?;
        install(vm, ErrorKind::Error, object_prototype, "Error", construct_error);
        Ok(())
    }
}

macro_rules! derived_error_module {
    ($module:ident, $name:literal, $kind:expr, $construct_fn:expr) => {
        pub struct $module;

        impl BuiltinInitializer for $module {
            fn name(&self) -> &'static str {
                $name
            }

            fn priority(&self) -> i32 {
                31
            }

            fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
                ctx.define_global($name, Type::Any);
                Ok(())
            }

            fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
                let error_prototype = vm.intrinsics.error_prototypes.get(&ErrorKind::Error).cloned().ok_or(
                    RegistryError::MissingDependency {
                        module: $name,
                        dependency: "Error",
                    },
                )?;
                install(vm, $kind, error_prototype, $name, $construct_fn);
                Ok(())
            }
        }
    };
}

derived_error_module!(TypeErrorModule, "TypeError", ErrorKind::TypeError, construct_type_error);
derived_error_module!(RangeErrorModule, "RangeError", ErrorKind::RangeError, construct_range_error);
derived_error_module!(
    SyntaxErrorModule,
    "SyntaxError",
    ErrorKind::SyntaxError,
    construct_syntax_error
);
derived_error_module!(
    ReferenceErrorModule,
    "ReferenceError",
    ErrorKind::ReferenceError,
    construct_reference_error
);
derived_error_module!(EvalErrorModule, "EvalError", ErrorKind::EvalError, construct_eval_error);
derived_error_module!(UriErrorModule, "URIError", ErrorKind::UriError, construct_uri_error);

/// `AggregateError` (§11 supplement): takes an iterable of errors plus an
/// optional message; exposes them as an own `errors` array.
pub struct AggregateErrorModule;

impl BuiltinInitializer for AggregateErrorModule {
    fn name(&self) -> &'static str {
        "AggregateError"
    }

    fn priority(&self) -> i32 {
        31
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("AggregateError", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let error_prototype = vm.intrinsics.error_prototypes.get(&ErrorKind::Error).cloned().ok_or(
            RegistryError::MissingDependency {
                module: "AggregateError",
                dependency: "Error",
            },
        )?;
        let prototype = install(
            vm,
            ErrorKind::AggregateError,
            error_prototype,
            "AggregateError",
            construct_aggregate_error,
        );
        prototype.with_base_mut(|b| {
            b.slots.set_own_non_enumerable("name", Value::string("AggregateError"));
        });
        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "AggregateError",
            2,
            false,
            construct_aggregate,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        vm.define_global("AggregateError", constructor);
        Ok(())
    }
}

fn construct_aggregate(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let message_args = if args.len() > 1 { &args[1..] } else { &[][..] };
    let base_error = construct(vm, this, message_args, ErrorKind::AggregateError)?;
    let errors_arg = arg(args, 0);
    let errors: Vec<Value> = match &errors_arg {
        Value::Array(a) => a.borrow().elements.clone(),
        _ => Vec::new(),
    };
    let array_prototype = vm.intrinsics.array_prototype.clone().unwrap_or(Value::Null);
    base_error.with_base_mut(|b| {
        b.slots.set_own_non_enumerable(
            "errors",
            crate::builtins::util::new_array(array_prototype, errors),
        );
    });
    Ok(base_error)
}
