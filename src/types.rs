// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The static type environment (§3 "Type environment", §4.D
//! `TypeContext`). The type checker itself is an external collaborator
//! (§1); this module only carries the shapes it understands well enough for
//! builtin modules to declare global bindings and primitive prototypes.

use std::collections::HashMap;
use std::rc::Rc;

/// A type descriptor the checker understands (§9 design notes: "The type
/// system's `NewOptionalFunction`/`NewVariadicFunction` are shapes the
/// checker understands; the runtime honors them only through
/// `arity`+`variadic` on the callable record").
#[derive(Debug, Clone)]
pub enum Type {
    Any,
    Unknown,
    Never,
    Primitive(&'static str),
    Literal(Literal),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Object(Vec<(Rc<str>, Type)>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
    /// Fixed params, a suffix of optional params, an optional rest param,
    /// and a return type — the function shape §9 calls out.
    Function {
        params: Vec<Type>,
        optional_params: Vec<Type>,
        rest_param: Option<Box<Type>>,
        return_type: Box<Type>,
    },
    /// A reference to a name registered via `DefineTypeAlias`.
    Named(Rc<str>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(Rc<str>),
    Number(f64),
    Boolean(bool),
}

impl Type {
    pub fn new_function(params: Vec<Type>, return_type: Type) -> Self {
        Type::Function {
            params,
            optional_params: Vec::new(),
            rest_param: None,
            return_type: Box::new(return_type),
        }
    }

    /// `NewOptionalFunction(params, ret, optionals[])`.
    pub fn new_optional_function(params: Vec<Type>, return_type: Type, optionals: Vec<Type>) -> Self {
        Type::Function {
            params,
            optional_params: optionals,
            rest_param: None,
            return_type: Box::new(return_type),
        }
    }

    /// `NewVariadicFunction(fixed, ret, rest)`.
    pub fn new_variadic_function(fixed: Vec<Type>, return_type: Type, rest: Type) -> Self {
        Type::Function {
            params: fixed,
            optional_params: Vec::new(),
            rest_param: Some(Box::new(rest)),
            return_type: Box::new(return_type),
        }
    }
}

/// `TypeContext` (§4.D). Mirrors the runtime environment's shape: a flat
/// namespace of global bindings plus a side table from primitive tags
/// (`"number"`, `"string"`, ...) to the object-type representing that
/// primitive's prototype (§3 "Type environment").
#[derive(Debug, Default)]
pub struct TypeEnv {
    globals: HashMap<Rc<str>, Type>,
    aliases: HashMap<Rc<str>, Type>,
    primitive_prototypes: HashMap<&'static str, Type>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_global(&mut self, name: impl Into<Rc<str>>, ty: Type) {
        self.globals.insert(name.into(), ty);
    }

    pub fn define_type_alias(&mut self, name: impl Into<Rc<str>>, ty: Type) {
        self.aliases.insert(name.into(), ty);
    }

    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.globals.get(name).or_else(|| self.aliases.get(name))
    }

    pub fn set_primitive_prototype(&mut self, primitive_tag: &'static str, object_type: Type) {
        self.primitive_prototypes.insert(primitive_tag, object_type);
    }

    pub fn primitive_prototype(&self, primitive_tag: &str) -> Option<&Type> {
        self.primitive_prototypes.get(primitive_tag)
    }

    pub fn global_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.globals.keys()
    }
}
