// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Function` (§4.E). `Function.prototype` is itself callable in real
//! ECMAScript (a no-op function); this crate models it as the one
//! `NativeFunctionWithProps` whose own `call` is a no-op, so
//! `function_builtin::FunctionModule` can still hang methods off it like
//! any other prototype object.

use crate::builtins::util::{arg, define_method};
use crate::error::JsResult;
use crate::function::{self, create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::object::NativeFunctionWithPropsData;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct FunctionModule;

impl BuiltinInitializer for FunctionModule {
    fn name(&self) -> &'static str {
        "Function"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Function", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let prototype = Value::NativeFunctionWithProps(crate::object::new_gc(
            NativeFunctionWithPropsData::new(
                crate::object::NativeFunctionData {
                    name: "".into(),
                    arity: 0,
                    variadic: true,
                    func: noop,
                },
                vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null),
            ),
        ));

        define_method(&prototype, "call", 1, true, call);
        define_method(&prototype, "apply", 2, false, apply);
        define_method(&prototype, "bind", 1, true, bind);
        define_method(&prototype, "toString", 0, false, to_string);

        vm.intrinsics.function_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            prototype.clone(),
            "Function",
            1,
            true,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        vm.define_global("Function", constructor);
        Ok(())
    }
}

fn noop(_vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Undefined)
}

fn construct(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    // Compiling a function body from source text requires the parser and
    // compiler, both external collaborators (§1) this crate never reaches.
    Err(vm.throw_type_error("the Function constructor requires a host compiler"))
}

fn call(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let bound_this = arg(args, 0);
    let rest = if args.is_empty() { &[][..] } else { &args[1..] };
    function::call(vm, &this, bound_this, rest)
}

fn apply(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    let bound_this = arg(args, 0);
    let arg_list = arg(args, 1);
    let spread = array_like_to_vec(vm, &arg_list)?;
    function::call(vm, &this, bound_this, &spread)
}

fn bind(vm: &mut Vm, this: Value, args: &[Value]) -> JsResult<Value> {
    if !this.is_callable() {
        return Err(vm.throw_type_error("Bind must be called on a function"));
    }
    let bound_this = arg(args, 0);
    let bound_args = if args.is_empty() { Vec::new() } else { args[1..].to_vec() };
    let name = function::function_name(&this).unwrap_or_else(|| "bound".into());
    let bound_name: std::rc::Rc<str> = format!("bound {name}").into();
    Ok(vm.bind_function(this, bound_this, bound_args, bound_name))
}

fn to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let name = function::function_name(&this).unwrap_or_else(|| "".into());
    Ok(Value::string(match &this {
        Value::Closure(_) => format!("function {name}() {{ [compiled code] }}"),
        _ if this.is_callable() => format!("function {name}() {{ [native code] }}"),
        _ => return Err(vm.throw_type_error("Function.prototype.toString requires a function receiver")),
    }))
}

fn array_like_to_vec(vm: &mut Vm, v: &Value) -> JsResult<Vec<Value>> {
    if v.is_nullish() {
        return Ok(Vec::new());
    }
    if let Value::Array(arr) = v {
        return Ok(arr.borrow().elements.clone());
    }
    let length_value = vm.get_property(v, &crate::property::Key::from("length"))?;
    let len = crate::abstract_ops::to_integer(vm, &length_value)?.max(0.0) as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(vm.get_property(v, &crate::property::Key::from(i.to_string().as_str()))?);
    }
    Ok(out)
}
