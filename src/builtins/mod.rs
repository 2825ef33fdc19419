// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One module per intrinsic (§2 component E, §4.E). Each exposes a
//! zero-sized `BuiltinInitializer` registered at the priority §4.D's table
//! assigns it.

pub mod array_builtin;
pub mod array_buffer_builtin;
pub mod async_generator_builtin;
pub mod atomics_builtin;
pub mod bigint_builtin;
pub mod boolean_builtin;
pub mod error_builtin;
pub mod function_builtin;
pub mod math_builtin;
pub mod number_builtin;
pub mod object_builtin;
pub mod reflect_builtin;
pub mod string_builtin;
pub mod symbol_builtin;
pub mod temporal;
pub mod typed_array_builtin;
pub mod util;

use crate::registry::Registry;

/// Registers every builtin module this crate ships, at the priorities
/// §4.D's canonical ordering table assigns them. Optional intrinsics are
/// gated behind the matching Cargo feature (§10.6 of `SPEC_FULL.md`).
pub fn default_registry() -> Registry {
    let registry = Registry::new()
        .register(symbol_builtin::SymbolModule)
        .register(object_builtin::ObjectModule)
        .register(function_builtin::FunctionModule)
        .register(array_builtin::ArrayModule)
        .register(error_builtin::ErrorModule)
        .register(error_builtin::TypeErrorModule)
        .register(error_builtin::RangeErrorModule)
        .register(error_builtin::SyntaxErrorModule)
        .register(error_builtin::ReferenceErrorModule)
        .register(error_builtin::EvalErrorModule)
        .register(error_builtin::UriErrorModule)
        .register(error_builtin::AggregateErrorModule)
        .register(reflect_builtin::PaseratiModule)
        .register(string_builtin::StringModule)
        .register(number_builtin::NumberModule)
        .register(boolean_builtin::BooleanModule)
        .register(bigint_builtin::BigIntModule)
        .register(async_generator_builtin::AsyncGeneratorModule);

    #[cfg(feature = "math")]
    let registry = registry.register(math_builtin::MathModule);

    #[cfg(feature = "temporal")]
    let registry = registry.register(temporal::TemporalModule);

    #[cfg(feature = "array-buffer")]
    let registry = registry.register(array_buffer_builtin::ArrayBufferModule);

    #[cfg(feature = "shared-array-buffer")]
    let registry = registry.register(array_buffer_builtin::SharedArrayBufferModule);

    #[cfg(feature = "array-buffer")]
    let registry = registry
        .register(typed_array_builtin::TypedArrayBaseModule)
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Int8,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Uint8,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Uint8Clamped,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Int16,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Uint16,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Int32,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Uint32,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Float32,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::Float64,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::BigInt64,
        ))
        .register(typed_array_builtin::ConcreteTypedArrayModule(
            crate::object::ElementKind::BigUint64,
        ));

    #[cfg(feature = "atomics")]
    let registry = registry.register(atomics_builtin::AtomicsModule);

    registry
}
