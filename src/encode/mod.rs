//! The plan compiler.
//!
//! A plan is a closure specialized for one concrete type under one set of
//! [`Flags`]. It appends the JSON for a value straight from the value's
//! memory. Plans are built on first use by [`plan_for`] and cached for the
//! life of the process, keyed by (type, flags, depth, addressability).
//!
//! Dispatch order at every level:
//!
//! 1. pointer kinds
//! 2. encoders installed with [`register_encoder`](crate::register_encoder)
//! 3. well-known library types (`DateTime<Utc>`, `BigInt`, `RawNumber`)
//! 4. [`AppendJson`](crate::AppendJson)
//! 5. [`MarshalJson`](crate::MarshalJson)
//! 6. [`MarshalText`](crate::MarshalText)
//! 7. the structural kind; kinds without a JSON form append nothing
//!
//! Cycles in the type graph are cut by a nesting limit: past
//! [`MAX_DEPTH`] a no-op plan is substituted. The payload of a dynamic value
//! is resolved per call and starts a fresh count.

mod custom;
mod indirect;
mod map;
mod primitive;
mod seq;
mod string;
pub(crate) mod struct_;

pub use custom::EncoderFn;
pub(crate) use custom::{is_registered, register, rfc3339};
pub(crate) use primitive::{append_f64, append_i64, append_u64};
pub(crate) use string::quote_bytes;

use crate::options::Flags;
use crate::ptr::Ptr;
use crate::reflect::{Kind, TypeInfo};
use crate::Result;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Deepest nesting of struct fields, elements and map values that is encoded.
pub(crate) const MAX_DEPTH: u8 = 32;

/// A compiled encoder.
pub(crate) type Plan = Arc<dyn for<'a> Fn(&mut Vec<u8>, Ptr<'a>) -> Result<()> + Send + Sync>;

/// Boxes a closure as a [`Plan`].
#[inline]
pub(crate) fn plan<F>(f: F) -> Plan
where
    F: for<'a> Fn(&mut Vec<u8>, Ptr<'a>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A plan that appends nothing.
pub(crate) fn noop() -> Plan {
    plan(|_, _| Ok(()))
}

/// Where a plan is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Site {
    pub(crate) flags: Flags,
    /// Type nesting below the nearest root or dynamic value, bounded by
    /// [`MAX_DEPTH`].
    pub(crate) depth: u8,
    /// Indentation level in pretty mode; zero otherwise.
    pub(crate) indent: u16,
    /// Whether the value's address may be handed to pointer-receiver
    /// capabilities.
    pub(crate) addressable: bool,
}

impl Site {
    pub(crate) fn root(flags: Flags) -> Self {
        Site {
            flags,
            depth: 0,
            indent: 0,
            addressable: true,
        }
    }

    /// A nested element, field or map value.
    pub(crate) fn child(self, flags: Flags) -> Self {
        Site {
            flags,
            depth: self.depth.saturating_add(1),
            indent: if flags.contains(Flags::PRETTY) {
                self.indent.saturating_add(1)
            } else {
                0
            },
            addressable: self.addressable,
        }
    }

    /// The site a dynamic value's payload is compiled for. The payload is
    /// finite data, so it starts a fresh nesting budget at the same
    /// indentation.
    pub(crate) fn payload(self, flags: Flags) -> Self {
        Site {
            flags,
            depth: 0,
            indent: self.indent,
            addressable: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PlanKey {
    type_id: TypeId,
    site: Site,
}

fn cache() -> &'static RwLock<HashMap<PlanKey, Plan>> {
    static CACHE: OnceLock<RwLock<HashMap<PlanKey, Plan>>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Returns the cached plan for `info` at `site`, compiling it on a miss.
///
/// Compilation runs without holding the cache lock. Threads racing on the
/// same miss may each build a plan; the first insert is kept and returned to
/// all of them.
pub(crate) fn plan_for(info: &'static TypeInfo, site: Site) -> Plan {
    if site.depth > MAX_DEPTH {
        tracing::trace!(
            type_name = info.type_name(),
            depth = site.depth,
            "nesting limit reached, encoding nothing"
        );
        return noop();
    }
    let key = PlanKey {
        type_id: info.type_id(),
        site,
    };
    if let Some(plan) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return plan.clone();
    }

    let built = compile(info, site);
    tracing::debug!(
        type_name = info.type_name(),
        flags = ?site.flags,
        depth = site.depth,
        indent = site.indent,
        addressable = site.addressable,
        "compiled encoder plan"
    );
    cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_insert(built)
        .clone()
}

fn compile(info: &'static TypeInfo, site: Site) -> Plan {
    if let Kind::Pointer(pointer) = info.kind() {
        return indirect::pointer_plan(pointer, site);
    }
    if let Some(plan) = custom::registered_plan(info, site.flags) {
        return plan;
    }
    if let Some(plan) = custom::well_known_plan(info, site.flags) {
        return plan;
    }
    if let Some(plan) = custom::capability_plan(info, site) {
        return plan;
    }

    let flags = site.flags;
    match info.kind() {
        Kind::Bool => primitive::primitive_plan::<bool>(flags),
        Kind::I8 => primitive::primitive_plan::<i8>(flags),
        Kind::I16 => primitive::primitive_plan::<i16>(flags),
        Kind::I32 => primitive::primitive_plan::<i32>(flags),
        Kind::I64 => primitive::primitive_plan::<i64>(flags),
        Kind::Isize => primitive::primitive_plan::<isize>(flags),
        Kind::U8 => primitive::primitive_plan::<u8>(flags),
        Kind::U16 => primitive::primitive_plan::<u16>(flags),
        Kind::U32 => primitive::primitive_plan::<u32>(flags),
        Kind::U64 => primitive::primitive_plan::<u64>(flags),
        Kind::Usize => primitive::primitive_plan::<usize>(flags),
        Kind::F32 => primitive::primitive_plan::<f32>(flags),
        Kind::F64 => primitive::primitive_plan::<f64>(flags),
        Kind::String => string::string_plan(flags),
        Kind::Struct(_) => struct_::struct_plan(info, site),
        Kind::Slice(slice) => seq::slice_plan(slice, site),
        Kind::Array(array) => seq::array_plan(array, site),
        Kind::Map(map) => map::map_plan(map, site),
        Kind::Interface(iface) => indirect::interface_plan(iface, site),
        Kind::Pointer(_) | Kind::Opaque => noop(),
    }
}

/// Appends the JSON for `value` to `buf` using the cached plan for
/// (`T`, `flags`).
pub(crate) fn encode_value<T: crate::Typed>(
    buf: &mut Vec<u8>,
    value: &T,
    flags: Flags,
) -> Result<()> {
    let plan = plan_for(T::type_info(), Site::root(flags));
    plan(buf, Ptr::from_ref(value))
}

/// Appends a newline and `level` tabs.
#[inline]
pub(crate) fn indent(buf: &mut Vec<u8>, level: u16) {
    buf.push(b'\n');
    buf.extend(std::iter::repeat(b'\t').take(usize::from(level)));
}
