// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The property store (§4.B): an ordered string/symbol-keyed map of
//! [`Slot`]s with full descriptors, backing every heap object.

use indexmap::IndexMap;
use std::rc::Rc;

use crate::symbol::Symbol;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    String(Rc<str>),
    Symbol(Symbol),
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(Rc::from(s))
    }
}
impl From<Rc<str>> for Key {
    fn from(s: Rc<str>) -> Self {
        Key::String(s)
    }
}
impl From<Symbol> for Key {
    fn from(s: Symbol) -> Self {
        Key::Symbol(s)
    }
}

#[derive(Debug, Clone)]
pub enum SlotValue {
    Data(Value),
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
    },
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub value: SlotValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Slot {
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: SlotValue::Data(value),
            writable,
            enumerable,
            configurable,
        }
    }

    pub fn accessor(
        get: Option<Value>,
        set: Option<Value>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value: SlotValue::Accessor { get, set },
            // accessor slots have no `value`/`writable` fields (§4.B); we
            // keep `writable` at false as a harmless default, it is never
            // consulted for accessor slots.
            writable: false,
            enumerable,
            configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.value, SlotValue::Accessor { .. })
    }
}

/// Attributes passed to `DefineOwnProperty`. `None` means "unspecified":
/// defaults to `false` for a brand new slot, "leave unchanged" for an
/// existing one, per ECMAScript `[[DefineOwnProperty]]` semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyAttributes {
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyAttributes {
    pub fn all(writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }
}

#[derive(Debug, Default)]
pub struct PropertyStore {
    strings: IndexMap<Rc<str>, Slot>,
    symbols: IndexMap<Symbol, Slot>,
}

#[derive(Debug)]
pub enum DefineError {
    /// Attempted to reconfigure a non-configurable slot in a way that is
    /// not a no-op.
    NotConfigurable,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_own(&self, key: &Key) -> Option<&Slot> {
        match key {
            Key::String(s) => self.strings.get(s),
            Key::Symbol(s) => self.symbols.get(s),
        }
    }

    pub fn get_own_mut(&mut self, key: &Key) -> Option<&mut Slot> {
        match key {
            Key::String(s) => self.strings.get_mut(s),
            Key::Symbol(s) => self.symbols.get_mut(s),
        }
    }

    pub fn has_own(&self, key: &Key) -> bool {
        self.get_own(key).is_some()
    }

    /// `SetOwn`: defaults to a writable/enumerable/configurable data slot.
    pub fn set_own(&mut self, key: impl Into<Key>, value: Value) {
        self.insert_data(key.into(), value, true, true, true);
    }

    /// `SetOwnNonEnumerable`: for intrinsic bookkeeping (e.g. `constructor`,
    /// internal slots).
    pub fn set_own_non_enumerable(&mut self, key: impl Into<Key>, value: Value) {
        self.insert_data(key.into(), value, true, false, true);
    }

    /// Installs a non-writable, non-enumerable, non-configurable data slot
    /// (used for spec constants like `Number.MAX_VALUE`).
    pub fn set_own_frozen(&mut self, key: impl Into<Key>, value: Value) {
        self.insert_data(key.into(), value, false, false, false);
    }

    fn insert_data(
        &mut self,
        key: Key,
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) {
        let slot = Slot::data(value, writable, enumerable, configurable);
        match key {
            Key::String(s) => {
                self.strings.insert(s, slot);
            }
            Key::Symbol(s) => {
                self.symbols.insert(s, slot);
            }
        }
    }

    pub fn define_accessor_property(
        &mut self,
        key: impl Into<Key>,
        get: Option<Value>,
        set: Option<Value>,
        enumerable: bool,
        configurable: bool,
    ) {
        let slot = Slot::accessor(get, set, enumerable, configurable);
        match key.into() {
            Key::String(s) => {
                self.strings.insert(s, slot);
            }
            Key::Symbol(s) => {
                self.symbols.insert(s, slot);
            }
        }
    }

    /// `DefineOwnProperty`: a missing attribute defaults to `false` for a
    /// new slot, "unchanged" for an existing one; reconfiguring a
    /// non-configurable slot fails unless the change is a no-op.
    pub fn define_own_property(
        &mut self,
        key: impl Into<Key>,
        value: Option<Value>,
        attrs: PropertyAttributes,
    ) -> Result<(), DefineError> {
        let key = key.into();
        if let Some(existing) = self.get_own(&key) {
            if !existing.configurable {
                let would_change_writable = attrs
                    .writable
                    .is_some_and(|w| w != existing.writable && !existing.writable);
                let would_change_enumerable = attrs
                    .enumerable
                    .is_some_and(|e| e != existing.enumerable);
                let would_change_value = if existing.writable {
                    false
                } else {
                    match (&value, &existing.value) {
                        (None, _) => false,
                        (Some(new), SlotValue::Data(old)) => !crate::abstract_ops::same_value(new, old),
                        (Some(_), SlotValue::Accessor { .. }) => true,
                    }
                };
                if would_change_writable || would_change_enumerable || would_change_value {
                    return Err(DefineError::NotConfigurable);
                }
            }
            let writable = attrs.writable.unwrap_or(existing.writable);
            let enumerable = attrs.enumerable.unwrap_or(existing.enumerable);
            let configurable = attrs.configurable.unwrap_or(existing.configurable);
            let new_value = value.unwrap_or_else(|| match &existing.value {
                SlotValue::Data(v) => v.clone(),
                SlotValue::Accessor { .. } => Value::Undefined,
            });
            self.insert_data(key, new_value, writable, enumerable, configurable);
            Ok(())
        } else {
            let writable = attrs.writable.unwrap_or(false);
            let enumerable = attrs.enumerable.unwrap_or(false);
            let configurable = attrs.configurable.unwrap_or(false);
            self.insert_data(
                key,
                value.unwrap_or(Value::Undefined),
                writable,
                enumerable,
                configurable,
            );
            Ok(())
        }
    }

    pub fn delete(&mut self, key: &Key) -> bool {
        match key {
            Key::String(s) => self.strings.shift_remove(s).is_some(),
            Key::Symbol(s) => self.symbols.shift_remove(s).is_some(),
        }
    }

    /// `OwnKeys`: string keys first in insertion order, then symbol keys in
    /// insertion order.
    pub fn own_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.strings.keys().cloned().map(Key::String).collect();
        keys.extend(self.symbols.keys().cloned().map(Key::Symbol));
        keys
    }

    /// Enumerable string keys only, in insertion order — what
    /// `Object.keys`/`values`/`entries`/`for...in` observe.
    pub fn enumerable_string_keys(&self) -> Vec<Rc<str>> {
        self.strings
            .iter()
            .filter(|(_, slot)| slot.enumerable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn string_keys(&self) -> impl Iterator<Item = &Rc<str>> {
        self.strings.keys()
    }

    pub fn symbol_keys(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.keys()
    }

    pub fn len(&self) -> usize {
        self.strings.len() + self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
