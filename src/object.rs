// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The runtime value/object model (§3): heap object records that every
//! builtin module allocates and wires together. Every heap object carries
//! at most one `[[Prototype]]` link (§3 invariant); that link plus the
//! [`crate::property::PropertyStore`] live together in [`ObjectBase`], which
//! every record below embeds.
//!
//! Ownership is "shared, collected when unreachable" (§3, "PlainObject...
//! Destruction: by the external garbage collector"). Since the GC itself is
//! an external collaborator (§1) this crate does not implement one: `Gc<T>`
//! is a plain `Rc<RefCell<T>>`, which gives the same externally-observable
//! sharing semantics a tracing collector would, without requiring this
//! crate to build an arena/heap of its own — that machinery belongs to the
//! host VM's garbage collector, not to the builtin-initialization layer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::property::{Key, PropertyStore};
use crate::value::Value;

pub type Gc<T> = Rc<RefCell<T>>;

pub fn new_gc<T>(data: T) -> Gc<T> {
    Rc::new(RefCell::new(data))
}

/// `{ prototype: Value, slots: ordered-map<Key, Slot> }` (§3 "PlainObject").
/// Every heap record other than [`NativeFunctionData`] (which is callable
/// but owns no property bag, §4.C) embeds one of these.
#[derive(Debug)]
pub struct ObjectBase {
    pub prototype: Value,
    pub slots: PropertyStore,
    /// `@@toStringTag`-less class tag consulted by `Object.prototype.toString`'s
    /// fallback table (§4.E "Object").
    pub class_name: &'static str,
}

impl ObjectBase {
    pub fn new(prototype: Value, class_name: &'static str) -> Self {
        Self {
            prototype,
            slots: PropertyStore::new(),
            class_name,
        }
    }

    pub fn get_own(&self, key: &Key) -> Option<&crate::property::Slot> {
        self.slots.get_own(key)
    }
}

#[derive(Debug)]
pub struct ObjectData {
    pub base: ObjectBase,
    /// `true` after `Object.freeze`/`Object.preventExtensions`.
    pub extensible: bool,
}

impl ObjectData {
    pub fn new(prototype: Value) -> Self {
        Self {
            base: ObjectBase::new(prototype, "Object"),
            extensible: true,
        }
    }
}

#[derive(Debug)]
pub struct ArrayData {
    pub base: ObjectBase,
    pub elements: Vec<Value>,
}

impl ArrayData {
    pub fn new(prototype: Value) -> Self {
        Self {
            base: ObjectBase::new(prototype, "Array"),
            elements: Vec::new(),
        }
    }

    pub fn from_elements(prototype: Value, elements: Vec<Value>) -> Self {
        Self {
            base: ObjectBase::new(prototype, "Array"),
            elements,
        }
    }
}

/// `fn: (args[]) -> Result<Value, Error>` (§4.C). `this` is passed
/// explicitly rather than threaded through thread-local state, matching
/// the VM's call-frame push described in the invocation protocol step 1.
pub type NativeFn = fn(&mut crate::vm::Vm, Value, &[Value]) -> crate::error::JsResult<Value>;

#[derive(Clone)]
pub struct NativeFunctionData {
    pub name: Rc<str>,
    pub arity: u32,
    pub variadic: bool,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunctionData")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish()
    }
}

/// `{arity, variadic, name, fn}` plus `{properties, prototype}` (§3,§4.C):
/// native functions usable as constructors carrying static members (e.g.
/// `Array.isArray`) and an own `prototype` property.
#[derive(Debug)]
pub struct NativeFunctionWithPropsData {
    pub call: NativeFunctionData,
    pub base: ObjectBase,
}

impl NativeFunctionWithPropsData {
    pub fn new(call: NativeFunctionData, function_prototype: Value) -> Self {
        Self {
            call,
            base: ObjectBase::new(function_prototype, "Function"),
        }
    }
}

/// A compiled user function plus its captured environments (§4.C). The
/// compiler and its environment representation are external collaborators
/// (§1); this is a data-only stub that the host interpreter populates and
/// drives. `body` is therefore opaque to this crate.
#[derive(Debug)]
pub struct ClosureData {
    pub base: ObjectBase,
    pub name: Rc<str>,
    pub arity: u32,
    pub variadic: bool,
}

/// `{target, boundThis, boundArgs, name}` (§4.C).
#[derive(Debug)]
pub struct BoundFunctionData {
    pub target: Value,
    pub bound_this: Value,
    pub bound_args: Vec<Value>,
    pub name: Rc<str>,
    pub base: ObjectBase,
}

#[derive(Debug)]
pub struct ArrayBufferData {
    pub bytes: RefCell<Vec<u8>>,
    pub base: ObjectBase,
    pub shared: bool,
    /// `true` once detached via a transfer (not reachable from any spec
    /// operation in this crate, reserved for host interpreter use).
    pub detached: bool,
}

impl ArrayBufferData {
    pub fn new(prototype: Value, byte_length: usize, shared: bool) -> Self {
        Self {
            bytes: RefCell::new(vec![0u8; byte_length]),
            base: ObjectBase::new(prototype, if shared { "SharedArrayBuffer" } else { "ArrayBuffer" }),
            shared,
            detached: false,
        }
    }

    pub fn byte_length(&self) -> usize {
        self.bytes.borrow().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl ElementKind {
    pub fn bytes_per_element(self) -> usize {
        match self {
            ElementKind::Int8 | ElementKind::Uint8 | ElementKind::Uint8Clamped => 1,
            ElementKind::Int16 | ElementKind::Uint16 => 2,
            ElementKind::Int32 | ElementKind::Uint32 | ElementKind::Float32 => 4,
            ElementKind::Float64 | ElementKind::BigInt64 | ElementKind::BigUint64 => 8,
        }
    }

    pub fn is_bigint(self) -> bool {
        matches!(self, ElementKind::BigInt64 | ElementKind::BigUint64)
    }

    /// Whether `Atomics` accepts this element kind (§4.E "Atomics": rejects
    /// `Float32`/`Float64`/`Uint8Clamped`).
    pub fn atomics_allowed(self) -> bool {
        !matches!(
            self,
            ElementKind::Float32 | ElementKind::Float64 | ElementKind::Uint8Clamped
        )
    }

    pub fn constructor_name(self) -> &'static str {
        match self {
            ElementKind::Int8 => "Int8Array",
            ElementKind::Uint8 => "Uint8Array",
            ElementKind::Uint8Clamped => "Uint8ClampedArray",
            ElementKind::Int16 => "Int16Array",
            ElementKind::Uint16 => "Uint16Array",
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Float32 => "Float32Array",
            ElementKind::Float64 => "Float64Array",
            ElementKind::BigInt64 => "BigInt64Array",
            ElementKind::BigUint64 => "BigUint64Array",
        }
    }

    pub const ALL: [ElementKind; 11] = [
        ElementKind::Int8,
        ElementKind::Uint8,
        ElementKind::Uint8Clamped,
        ElementKind::Int16,
        ElementKind::Uint16,
        ElementKind::Int32,
        ElementKind::Uint32,
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::BigInt64,
        ElementKind::BigUint64,
    ];

    /// Decodes the element at `bytes[0..bytes_per_element()]` into the
    /// `Value` a typed array read observes (§3: indexed access on a typed
    /// array reads through to the backing buffer's raw bytes).
    pub fn decode(self, bytes: &[u8]) -> Value {
        match self {
            ElementKind::Int8 => Value::number(bytes[0] as i8 as f64),
            ElementKind::Uint8 | ElementKind::Uint8Clamped => Value::number(bytes[0] as f64),
            ElementKind::Int16 => Value::number(i16::from_le_bytes([bytes[0], bytes[1]]) as f64),
            ElementKind::Uint16 => Value::number(u16::from_le_bytes([bytes[0], bytes[1]]) as f64),
            ElementKind::Int32 => Value::number(i32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64),
            ElementKind::Uint32 => Value::number(u32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64),
            ElementKind::Float32 => Value::number(f32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64),
            ElementKind::Float64 => Value::number(f64::from_le_bytes(bytes[..8].try_into().unwrap())),
            ElementKind::BigInt64 => {
                Value::BigInt(Rc::new(BigInt::from(i64::from_le_bytes(bytes[..8].try_into().unwrap()))))
            }
            ElementKind::BigUint64 => {
                Value::BigInt(Rc::new(BigInt::from(u64::from_le_bytes(bytes[..8].try_into().unwrap()))))
            }
        }
    }

    /// Encodes an already-coerced `f64` into `bytes[0..bytes_per_element()]`,
    /// applying the same truncating/clamping conversions ECMAScript's
    /// `ToIntN`/`ToUintN`/`ToUint8Clamp` perform. Never called for
    /// [`ElementKind::is_bigint`] kinds — those go through [`Self::encode_bigint`].
    pub fn encode_number(self, bytes: &mut [u8], n: f64) {
        let truncated = if n.is_finite() { n.trunc() } else { 0.0 };
        match self {
            ElementKind::Int8 => bytes[0] = (truncated as i64 as i8) as u8,
            ElementKind::Uint8 => bytes[0] = truncated as i64 as u8,
            ElementKind::Uint8Clamped => {
                bytes[0] = if n.is_nan() {
                    0
                } else {
                    round_ties_even(n.clamp(0.0, 255.0)) as u8
                }
            }
            ElementKind::Int16 => bytes[..2].copy_from_slice(&(truncated as i64 as i16).to_le_bytes()),
            ElementKind::Uint16 => bytes[..2].copy_from_slice(&(truncated as i64 as u16).to_le_bytes()),
            ElementKind::Int32 => bytes[..4].copy_from_slice(&(truncated as i64 as i32).to_le_bytes()),
            ElementKind::Uint32 => bytes[..4].copy_from_slice(&(truncated as i64 as u32).to_le_bytes()),
            ElementKind::Float32 => bytes[..4].copy_from_slice(&(n as f32).to_le_bytes()),
            ElementKind::Float64 => bytes[..8].copy_from_slice(&n.to_le_bytes()),
            ElementKind::BigInt64 | ElementKind::BigUint64 => {
                unreachable!("BigInt-backed elements are written via encode_bigint")
            }
        }
    }

    /// Encodes a `BigInt` into a `BigInt64`/`BigUint64` slot, wrapping
    /// modulo 2^64 the way `ToBigInt64`/`ToBigUint64` do.
    pub fn encode_bigint(self, bytes: &mut [u8], n: &BigInt) {
        use num_traits::ToPrimitive;
        let modulus = BigInt::from(1u128) << 64u32;
        let wrapped = ((n % &modulus) + &modulus) % &modulus;
        let unsigned = wrapped.to_u64().unwrap_or(0);
        match self {
            ElementKind::BigInt64 => bytes[..8].copy_from_slice(&(unsigned as i64).to_le_bytes()),
            ElementKind::BigUint64 => bytes[..8].copy_from_slice(&unsigned.to_le_bytes()),
            _ => unreachable!("only BigInt64/BigUint64 are written via encode_bigint"),
        }
    }
}

fn round_ties_even(x: f64) -> f64 {
    let floor = x.floor();
    let diff = x - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// An element-typed view over a shared (non-owning) [`ArrayBufferData`]
/// reference at a byte offset with a length and element kind (§3). The
/// invariant `byteOffset + length*bytesPerElement <= buffer.byteLength` is
/// enforced at construction time by the typed-array builtin module.
#[derive(Debug)]
pub struct TypedArrayData {
    pub base: ObjectBase,
    pub buffer: Gc<ArrayBufferData>,
    pub byte_offset: usize,
    pub length: usize,
    pub kind: ElementKind,
}

impl TypedArrayData {
    pub fn byte_length(&self) -> usize {
        self.length * self.kind.bytes_per_element()
    }
}

/// Data-only generator record (§3, §9 Open Question 1). Suspension is
/// driven by the external interpreter's stored frames (§5); this crate only
/// models the observable `{done, value}` shape generator methods return.
#[derive(Debug)]
pub struct GeneratorData {
    pub base: ObjectBase,
    pub done: bool,
}

#[derive(Debug)]
pub struct AsyncGeneratorData {
    pub base: ObjectBase,
    pub done: bool,
}

/// ISO-8601 calendar date fields (§3 "Temporal"). Non-ISO calendars are out
/// of scope (§1 Non-goals), so every record below stores plain ISO fields
/// rather than a `temporal_rs::Calendar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
    pub nanosecond: u16,
}

impl IsoTime {
    pub const MIDNIGHT: IsoTime = IsoTime { hour: 0, minute: 0, second: 0, millisecond: 0, microsecond: 0, nanosecond: 0 };
}

/// A Temporal.Duration's ten fields (§3). `sign()` enforces the uniform-sign
/// invariant at construction time, never at read time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationFields {
    pub years: f64,
    pub months: f64,
    pub weeks: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
    pub milliseconds: f64,
    pub microseconds: f64,
    pub nanoseconds: f64,
}

impl DurationFields {
    pub const ZERO: DurationFields = DurationFields {
        years: 0.0, months: 0.0, weeks: 0.0, days: 0.0, hours: 0.0,
        minutes: 0.0, seconds: 0.0, milliseconds: 0.0, microseconds: 0.0, nanoseconds: 0.0,
    };

    pub fn fields(&self) -> [f64; 10] {
        [
            self.years, self.months, self.weeks, self.days, self.hours,
            self.minutes, self.seconds, self.milliseconds, self.microseconds, self.nanoseconds,
        ]
    }

    /// `-1` / `0` / `1` per the sign of the first non-zero field (§3 "Duration
    /// enforces uniform sign across all fields").
    pub fn sign(&self) -> i32 {
        for f in self.fields() {
            if f > 0.0 {
                return 1;
            }
            if f < 0.0 {
                return -1;
            }
        }
        0
    }

    pub fn is_uniform_sign(&self) -> bool {
        let sign = self.sign();
        self.fields().iter().all(|f| sign == 0 || *f == 0.0 || f.signum() as i32 == sign)
    }

    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|f| *f == 0.0)
    }
}

/// The kind-specific payload of a Temporal record (§3 "Temporal"); every
/// variant is ISO-8601-only (§1 Non-goals exclude other calendar systems).
#[derive(Debug, Clone, Copy)]
pub enum TemporalRecord {
    Instant { epoch_nanoseconds: i128 },
    PlainDate(IsoDate),
    PlainTime(IsoTime),
    PlainDateTime(IsoDate, IsoTime),
    PlainYearMonth { year: i32, month: u8, reference_day: u8 },
    PlainMonthDay { month: u8, day: u8, reference_year: i32 },
    Duration(DurationFields),
    ZonedDateTime { epoch_nanoseconds: i128, offset_nanoseconds: i64 },
}

#[derive(Debug)]
pub struct TemporalData {
    pub base: ObjectBase,
    pub record: TemporalRecord,
}

/// BigInt values: arbitrary-precision signed integers (§3), backed by
/// `num-bigint`.
pub type BigIntData = BigInt;

/// Uniform read access to the `[[Prototype]]`+property-store pair every
/// heap record embeds, used by the generic `Get`/`Set`/`OwnKeys` walk in
/// [`crate::vm`] without matching on every `Value` variant at each call
/// site.
pub trait HasBase {
    fn base(&self) -> &ObjectBase;
    fn base_mut(&mut self) -> &mut ObjectBase;
}

macro_rules! impl_has_base {
    ($($t:ty),* $(,)?) => {
        $(
            impl HasBase for $t {
                fn base(&self) -> &ObjectBase { &self.base }
                fn base_mut(&mut self) -> &mut ObjectBase { &mut self.base }
            }
        )*
    };
}

impl_has_base!(
    ObjectData,
    ArrayData,
    NativeFunctionWithPropsData,
    ClosureData,
    BoundFunctionData,
    ArrayBufferData,
    TypedArrayData,
    GeneratorData,
    AsyncGeneratorData,
    TemporalData
);
