// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Symbol` (§4.D priority table: runs before every other intrinsic since
//! well-known symbols are cached on the [`Vm`] at construction time, §12.3).
//! This module only needs to expose the constructor/registry surface —
//! [`crate::symbol::WellKnownSymbols`] already minted the well-known symbols
//! themselves in [`Vm::new`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins::util::{arg, define_method};
use crate::error::JsResult;
use crate::function::{create_constructor_function_with_proto, link_constructor_and_prototype};
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::symbol::Symbol;
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

thread_local! {
    /// The global symbol registry `Symbol.for`/`Symbol.keyFor` share (§9
    /// glossary "Symbol.for registry" is process-wide in real ECMAScript;
    /// since this crate's `Vm` is not literally a process singleton we keep
    /// it thread-local, matching `Vm`'s own single-threaded assumption).
    static SYMBOL_REGISTRY: RefCell<HashMap<Rc<str>, Symbol>> = RefCell::new(HashMap::new());
}

pub struct SymbolModule;

impl BuiltinInitializer for SymbolModule {
    fn name(&self) -> &'static str {
        "Symbol"
    }

    fn priority(&self) -> i32 {
        15
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Symbol", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm.intrinsics.object_prototype.clone().unwrap_or(Value::Null);
        let prototype = crate::builtins::util::new_plain_object(object_prototype);
        define_method(&prototype, "toString", 0, false, to_string);
        define_method(&prototype, "valueOf", 0, false, value_of);
        vm.intrinsics.symbol_prototype = Some(prototype.clone());

        let constructor = create_constructor_function_with_proto(
            vm.intrinsics.function_prototype.clone().unwrap_or(Value::Null),
            "Symbol",
            0,
            false,
            construct,
        );
        link_constructor_and_prototype(&constructor, &prototype);
        define_method(&constructor, "for", 1, false, symbol_for);
        define_method(&constructor, "keyFor", 1, false, key_for);

        crate::builtins::util::define_value(&constructor, "iterator", Value::Symbol(vm.well_known_symbols.iterator.clone()));
        crate::builtins::util::define_value(
            &constructor,
            "asyncIterator",
            Value::Symbol(vm.well_known_symbols.async_iterator.clone()),
        );
        crate::builtins::util::define_value(
            &constructor,
            "toStringTag",
            Value::Symbol(vm.well_known_symbols.to_string_tag.clone()),
        );
        crate::builtins::util::define_value(
            &constructor,
            "toPrimitive",
            Value::Symbol(vm.well_known_symbols.to_primitive.clone()),
        );
        crate::builtins::util::define_value(
            &constructor,
            "hasInstance",
            Value::Symbol(vm.well_known_symbols.has_instance.clone()),
        );

        vm.define_global("Symbol", constructor);
        Ok(())
    }
}

fn construct(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let description = match arg(args, 0) {
        Value::Undefined => None,
        v => Some(crate::abstract_ops::to_display_string(vm, &v)?),
    };
    Ok(Value::Symbol(Symbol::new(description.as_deref())))
}

fn symbol_for(vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    let key: Rc<str> = crate::abstract_ops::to_display_string(vm, &arg(args, 0))?.into();
    let symbol = SYMBOL_REGISTRY.with(|registry| {
        registry
            .borrow_mut()
            .entry(key.clone())
            .or_insert_with(|| Symbol::new(Some(&key)))
            .clone()
    });
    Ok(Value::Symbol(symbol))
}

fn key_for(_vm: &mut Vm, _this: Value, args: &[Value]) -> JsResult<Value> {
    if let Value::Symbol(sym) = arg(args, 0) {
        let found = SYMBOL_REGISTRY.with(|registry| {
            registry
                .borrow()
                .iter()
                .find(|(_, v)| **v == sym)
                .map(|(k, _)| k.clone())
        });
        return Ok(found.map(Value::String).unwrap_or(Value::Undefined));
    }
    Ok(Value::Undefined)
}

fn to_string(_vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    match this {
        Value::Symbol(s) => Ok(Value::string(s.to_string())),
        _ => Ok(Value::string("Symbol()")),
    }
}

fn value_of(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    match this {
        Value::Symbol(_) => Ok(this),
        _ => Err(vm.throw_type_error("receiver is not a Symbol")),
    }
}
