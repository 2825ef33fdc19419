// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Paserati.reflect<T>()` (§4.E "Reflection"). The call site itself is
//! rewritten by the type checker (an external collaborator, §1) into a
//! literal type-descriptor tree before this crate ever sees it — calling
//! `Paserati.reflect` directly at runtime, without that rewrite, is a
//! misuse the same way calling the bare `Function` constructor without a
//! host compiler is (`function_builtin::construct`). What this module
//! *does* own is the runtime object model those descriptor trees share:
//! a `toString()`/`toJSONSchema()` pair installed on a common prototype,
//! driven entirely off the descriptor's own `kind` field and kind-specific
//! properties.

use crate::builtins::util::{define_method, define_value, new_array, new_plain_object, truthy};
use crate::error::JsResult;
use crate::property::Key;
use crate::registry::{BuiltinInitializer, RegistryError, RuntimeContext, TypeContext};
use crate::types::Type;
use crate::value::Value;
use crate::vm::Vm;

pub struct PaseratiModule;

impl BuiltinInitializer for PaseratiModule {
    fn name(&self) -> &'static str {
        "Paserati"
    }

    fn priority(&self) -> i32 {
        200
    }

    fn init_types(&self, ctx: TypeContext<'_>) -> Result<(), RegistryError> {
        ctx.define_global("Paserati", Type::Any);
        Ok(())
    }

    fn init_runtime(&self, vm: RuntimeContext<'_>) -> Result<(), RegistryError> {
        let object_prototype = vm
            .intrinsics
            .object_prototype
            .clone()
            .ok_or(RegistryError::MissingDependency {
                module: "Paserati",
                dependency: "Object",
            })?;

        let descriptor_prototype = new_plain_object(object_prototype.clone());
        define_method(&descriptor_prototype, "toString", 0, false, descriptor_to_string);
        define_method(&descriptor_prototype, "toJSONSchema", 0, false, descriptor_to_json_schema);

        let paserati = new_plain_object(object_prototype);
        define_value(&paserati, "TypeDescriptor", descriptor_prototype);
        define_method(&paserati, "reflect", 0, false, reflect);

        vm.define_global("Paserati", paserati);
        Ok(())
    }
}

fn reflect(vm: &mut Vm, _this: Value, _args: &[Value]) -> JsResult<Value> {
    Err(vm.throw_type_error(
        "Paserati.reflect<T>() is a compile-time intrinsic; the type checker must rewrite the call site into a type descriptor before it runs",
    ))
}

fn get_str(vm: &mut Vm, value: &Value, field: &str) -> JsResult<String> {
    let v = vm.get_property(value, &Key::from(field))?;
    crate::abstract_ops::to_display_string(vm, &v)
}

fn array_items(vm: &mut Vm, value: &Value, field: &str) -> JsResult<Vec<Value>> {
    match vm.get_property(value, &Key::from(field))? {
        Value::Array(a) => Ok(a.borrow().elements.clone()),
        _ => Ok(Vec::new()),
    }
}

fn format_literal(vm: &mut Vm, value: &Value) -> JsResult<String> {
    match value {
        Value::String(s) => Ok(format!("\"{s}\"")),
        _ => crate::abstract_ops::to_display_string(vm, value),
    }
}

fn descriptor_to_string(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::string(format_descriptor(vm, &this)?))
}

/// Formats a descriptor tree as a TypeScript-like type (§4.E).
fn format_descriptor(vm: &mut Vm, descriptor: &Value) -> JsResult<String> {
    let kind = get_str(vm, descriptor, "kind")?;
    match kind.as_str() {
        "primitive" => get_str(vm, descriptor, "name"),
        "literal" => {
            let value = vm.get_property(descriptor, &Key::from("value"))?;
            format_literal(vm, &value)
        }
        "array" => {
            let element = vm.get_property(descriptor, &Key::from("elementType"))?;
            let inner = format_descriptor(vm, &element)?;
            let element_kind = get_str(vm, &element, "kind").unwrap_or_default();
            let wrapped = if matches!(element_kind.as_str(), "union" | "intersection" | "function") {
                format!("({inner})")
            } else {
                inner
            };
            Ok(format!("{wrapped}[]"))
        }
        "tuple" => {
            let items = array_items(vm, descriptor, "elementTypes")?;
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(format_descriptor(vm, item)?);
            }
            Ok(format!("[{}]", parts.join(", ")))
        }
        "object" => {
            let props = array_items(vm, descriptor, "properties")?;
            let mut parts = Vec::with_capacity(props.len());
            for p in &props {
                let name = get_str(vm, p, "name")?;
                let optional = truthy(&vm.get_property(p, &Key::from("optional"))?);
                let ty = vm.get_property(p, &Key::from("type"))?;
                parts.push(format!(
                    "{name}{}: {}",
                    if optional { "?" } else { "" },
                    format_descriptor(vm, &ty)?
                ));
            }
            let index_ty = vm.get_property(descriptor, &Key::from("indexSignatureType"))?;
            if !matches!(index_ty, Value::Undefined) {
                parts.push(format!("[key: string]: {}", format_descriptor(vm, &index_ty)?));
            }
            Ok(format!("{{ {} }}", parts.join("; ")))
        }
        "union" => {
            let items = array_items(vm, descriptor, "types")?;
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(format_descriptor(vm, item)?);
            }
            Ok(parts.join(" | "))
        }
        "intersection" => {
            let items = array_items(vm, descriptor, "types")?;
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(format_descriptor(vm, item)?);
            }
            Ok(parts.join(" & "))
        }
        "function" => {
            let params = array_items(vm, descriptor, "params")?;
            let mut parts = Vec::with_capacity(params.len());
            for (i, p) in params.iter().enumerate() {
                parts.push(format!("arg{i}: {}", format_descriptor(vm, p)?));
            }
            let return_type = vm.get_property(descriptor, &Key::from("returnType"))?;
            Ok(format!("({}) => {}", parts.join(", "), format_descriptor(vm, &return_type)?))
        }
        "class" => get_str(vm, descriptor, "name"),
        "named" => get_str(vm, descriptor, "name"),
        other => Ok(other.to_string()),
    }
}

fn descriptor_to_json_schema(vm: &mut Vm, this: Value, _args: &[Value]) -> JsResult<Value> {
    let mut defs: Vec<(String, Value)> = Vec::new();
    let schema = build_schema(vm, &this, &mut defs)?;
    if !defs.is_empty() {
        let defs_object = new_plain_object(Value::Null);
        for (name, def_schema) in defs {
            define_value(&defs_object, &name, def_schema);
        }
        define_value(&schema, "$defs", defs_object);
    }
    Ok(schema)
}

/// Builds a JSON-Schema-2020-12 fragment for one descriptor node (§4.E),
/// accumulating named-type definitions into `defs` so the caller can
/// attach them as `$defs` once, at the root.
fn build_schema(vm: &mut Vm, descriptor: &Value, defs: &mut Vec<(String, Value)>) -> JsResult<Value> {
    let kind = get_str(vm, descriptor, "kind")?;
    let schema = new_plain_object(Value::Null);
    match kind.as_str() {
        "primitive" => {
            let name = get_str(vm, descriptor, "name")?;
            let json_type = match name.as_str() {
                "string" => "string",
                "number" => "number",
                "boolean" => "boolean",
                "bigint" => "integer",
                "null" => "null",
                // `any`/`unknown`/`undefined`/`void`/`never` have no direct
                // JSON Schema equivalent; falling back to `string` is a
                // documented simplification (DESIGN.md).
                _ => "string",
            };
            define_value(&schema, "type", Value::string(json_type));
        }
        "literal" => {
            let value = vm.get_property(descriptor, &Key::from("value"))?;
            define_value(&schema, "const", value);
        }
        "array" => {
            let element = vm.get_property(descriptor, &Key::from("elementType"))?;
            let item_schema = build_schema(vm, &element, defs)?;
            define_value(&schema, "type", Value::string("array"));
            define_value(&schema, "items", item_schema);
        }
        "tuple" => {
            let items = array_items(vm, descriptor, "elementTypes")?;
            let mut prefix = Vec::with_capacity(items.len());
            for item in &items {
                prefix.push(build_schema(vm, item, defs)?);
            }
            define_value(&schema, "type", Value::string("array"));
            define_value(&schema, "prefixItems", new_array(Value::Null, prefix));
            define_value(&schema, "items", Value::Boolean(false));
        }
        "object" => {
            define_value(&schema, "type", Value::string("object"));
            let props = array_items(vm, descriptor, "properties")?;
            let props_object = new_plain_object(Value::Null);
            let mut required = Vec::new();
            for p in &props {
                let ty = vm.get_property(p, &Key::from("type"))?;
                let call_signatures = array_items(vm, &ty, "callSignatures")?;
                if !call_signatures.is_empty() {
                    continue;
                }
                let name = get_str(vm, p, "name")?;
                let optional = truthy(&vm.get_property(p, &Key::from("optional"))?);
                let prop_schema = build_schema(vm, &ty, defs)?;
                define_value(&props_object, &name, prop_schema);
                if !optional {
                    required.push(Value::string(name));
                }
            }
            define_value(&schema, "properties", props_object);
            if !required.is_empty() {
                define_value(&schema, "required", new_array(Value::Null, required));
            }
            match vm.get_property(descriptor, &Key::from("indexSignatureType"))? {
                Value::Undefined => define_value(&schema, "additionalProperties", Value::Boolean(false)),
                index_ty => {
                    let index_schema = build_schema(vm, &index_ty, defs)?;
                    define_value(&schema, "additionalProperties", index_schema);
                }
            }
        }
        "union" => {
            let items = array_items(vm, descriptor, "types")?;
            let mut string_literals = Vec::with_capacity(items.len());
            let mut all_string_literals = !items.is_empty();
            for item in &items {
                let item_kind = get_str(vm, item, "kind")?;
                let value = vm.get_property(item, &Key::from("value"))?;
                if item_kind == "literal" && matches!(value, Value::String(_)) {
                    string_literals.push(value);
                } else {
                    all_string_literals = false;
                }
            }
            if all_string_literals {
                define_value(&schema, "enum", new_array(Value::Null, string_literals));
            } else {
                let mut any_of = Vec::with_capacity(items.len());
                for item in &items {
                    any_of.push(build_schema(vm, item, defs)?);
                }
                define_value(&schema, "anyOf", new_array(Value::Null, any_of));
            }
        }
        "intersection" => {
            let items = array_items(vm, descriptor, "types")?;
            let mut all_of = Vec::with_capacity(items.len());
            for item in &items {
                all_of.push(build_schema(vm, item, defs)?);
            }
            define_value(&schema, "allOf", new_array(Value::Null, all_of));
        }
        "named" => {
            let name = get_str(vm, descriptor, "name")?;
            if !defs.iter().any(|(n, _)| n == &name) {
                defs.push((name.clone(), Value::Undefined));
                let definition = vm.get_property(descriptor, &Key::from("definition"))?;
                let def_schema = build_schema(vm, &definition, defs)?;
                if let Some(entry) = defs.iter_mut().find(|(n, _)| n == &name) {
                    entry.1 = def_schema;
                }
            }
            define_value(&schema, "$ref", Value::string(format!("#/$defs/{name}")));
        }
        "class" => {
            define_value(&schema, "type", Value::string("object"));
            let props = array_items(vm, descriptor, "properties")?;
            let props_object = new_plain_object(Value::Null);
            for p in &props {
                let ty = vm.get_property(p, &Key::from("type"))?;
                let call_signatures = array_items(vm, &ty, "callSignatures")?;
                if !call_signatures.is_empty() {
                    continue;
                }
                let name = get_str(vm, p, "name")?;
                define_value(&props_object, &name, build_schema(vm, &ty, defs)?);
            }
            define_value(&schema, "properties", props_object);
        }
        // `function` descriptors have no JSON Schema representation; an
        // empty schema (matches anything) is the closest honest fallback.
        _ => {}
    }
    Ok(schema)
}

