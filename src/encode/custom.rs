//! Registered encoders, well-known types and capability dispatch.

use super::primitive::Primitive;
use super::string::{quote_bytes, requote};
use super::{noop, plan, Plan, Site};
use crate::options::Flags;
use crate::ptr::Ptr;
use crate::reflect::{Kind, Receiver, TypeInfo};
use crate::value::RawNumber;
use crate::{Error, Result, Typed};
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::{BigInt, Sign};
use std::any::TypeId;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A caller-supplied encoder for `T`, produced by a factory for one set of
/// flags.
pub type EncoderFn<T> = Arc<dyn Fn(&mut Vec<u8>, &T) -> Result<()> + Send + Sync>;

type Factory = Arc<dyn Fn(Flags) -> Plan + Send + Sync>;

struct Registration {
    type_id: TypeId,
    factory: Factory,
}

fn registry() -> &'static RwLock<Vec<Registration>> {
    static REGISTRY: OnceLock<RwLock<Vec<Registration>>> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Appends a factory for `T` to the registry.
///
/// Plans already compiled for `T` are not rebuilt, so registration belongs in
/// program start-up.
pub(crate) fn register<T, F>(factory: F)
where
    T: Typed,
    F: Fn(Flags) -> EncoderFn<T> + Send + Sync + 'static,
{
    let type_name = std::any::type_name::<T>();
    let factory: Factory = Arc::new(move |flags| {
        let encoder = factory(flags);
        plan(move |buf, ptr| {
            // SAFETY: the factory is only consulted for `T`.
            let value = unsafe { ptr.deref::<T>() };
            encoder(buf, value).map_err(|err| Error::marshaler(type_name, "registered encoder", err))
        })
    });
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Registration {
            type_id: TypeId::of::<T>(),
            factory,
        });
    tracing::debug!(type_name, "registered custom encoder");
}

/// Whether an encoder was registered for the type.
pub(crate) fn is_registered(type_id: TypeId) -> bool {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .any(|r| r.type_id == type_id)
}

/// The most recent registration for the type wins.
pub(super) fn registered_plan(info: &'static TypeInfo, flags: Flags) -> Option<Plan> {
    let factory = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .rev()
        .find(|r| r.type_id == info.type_id())
        .map(|r| r.factory.clone())?;
    Some(wrap(info, flags, factory(flags)))
}

pub(super) fn well_known_plan(info: &'static TypeInfo, flags: Flags) -> Option<Plan> {
    let omit = flags.contains(Flags::OMIT_EMPTY);
    let quote = flags.contains(Flags::NEED_QUOTES);
    if info.is::<DateTime<Utc>>() {
        return Some(plan(|buf, ptr| {
            // SAFETY: compiled for `DateTime<Utc>`.
            let time = unsafe { ptr.deref::<DateTime<Utc>>() };
            buf.push(b'"');
            buf.extend_from_slice(rfc3339(time).as_bytes());
            buf.push(b'"');
            Ok(())
        }));
    }
    if info.is::<BigInt>() {
        return Some(plan(move |buf, ptr| {
            // SAFETY: compiled for `BigInt`.
            let n = unsafe { ptr.deref::<BigInt>() };
            if omit && n.sign() == Sign::NoSign {
                return Ok(());
            }
            push_number(buf, &n.to_string(), quote);
            Ok(())
        }));
    }
    if info.is::<RawNumber>() {
        return Some(plan(move |buf, ptr| {
            // SAFETY: compiled for `RawNumber`.
            let n = unsafe { ptr.deref::<RawNumber>() };
            let literal = match n.as_str() {
                "" if omit => return Ok(()),
                "" => "0",
                s if RawNumber::is_valid(s) => s,
                s => return Err(Error::invalid_number(s)),
            };
            push_number(buf, literal, quote);
            Ok(())
        }));
    }
    None
}

/// RFC 3339 in UTC with as few sub-second digits as the instant needs.
pub(crate) fn rfc3339(time: &DateTime<Utc>) -> String {
    let mut text = time.to_rfc3339_opts(SecondsFormat::Nanos, true);
    // "...:SS.fffffffffZ"
    text.pop();
    let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
    text.truncate(trimmed);
    text.push('Z');
    text
}

fn push_number(buf: &mut Vec<u8>, literal: &str, quote: bool) {
    if quote {
        buf.push(b'"');
        buf.extend_from_slice(literal.as_bytes());
        buf.push(b'"');
    } else {
        buf.extend_from_slice(literal.as_bytes());
    }
}

/// Plan for the first capability the type declares, if any.
///
/// A pointer-receiver capability on a value that is not addressable yields a
/// plan that appends nothing.
pub(super) fn capability_plan(info: &'static TypeInfo, site: Site) -> Option<Plan> {
    let caps = info.capabilities();
    let flags = site.flags;
    let type_name = info.type_name();
    let validate = flags.contains(Flags::VALIDATE_MARSHALERS);
    let usable = |receiver: Receiver| receiver == Receiver::Value || site.addressable;

    let hooked = if let Some(hook) = caps.append_json {
        if !usable(hook.receiver) {
            return Some(noop());
        }
        let call = hook.call;
        plan(move |buf, ptr| {
            let start = buf.len();
            // SAFETY: the hook was declared on this type's descriptor.
            unsafe { call(ptr, buf) }
                .map_err(|err| Error::marshaler(type_name, "append_json", err))?;
            if validate && buf.len() > start {
                check_json(type_name, &buf[start..])?;
            }
            Ok(())
        })
    } else if let Some(hook) = caps.marshal_json {
        if !usable(hook.receiver) {
            return Some(noop());
        }
        let call = hook.call;
        plan(move |buf, ptr| {
            // SAFETY: the hook was declared on this type's descriptor.
            let json = unsafe { call(ptr) }
                .map_err(|err| Error::marshaler(type_name, "marshal_json", err))?;
            if validate {
                check_json(type_name, &json)?;
            }
            buf.extend_from_slice(&json);
            Ok(())
        })
    } else if let Some(hook) = caps.marshal_text {
        if !usable(hook.receiver) {
            return Some(noop());
        }
        let call = hook.call;
        plan(move |buf, ptr| {
            // SAFETY: the hook was declared on this type's descriptor.
            let text = unsafe { call(ptr) }
                .map_err(|err| Error::marshaler(type_name, "marshal_text", err))?;
            quote_bytes(buf, &text, flags);
            Ok(())
        })
    } else {
        return None;
    };
    Some(wrap(info, flags, hooked))
}

fn check_json(type_name: &'static str, json: &[u8]) -> Result<()> {
    serde_json::from_slice::<serde::de::IgnoredAny>(json)
        .map(drop)
        .map_err(|err| Error::invalid_json(type_name, err))
}

/// Applies the slot flags to a plan that does not know about them.
fn wrap(info: &'static TypeInfo, flags: Flags, inner: Plan) -> Plan {
    let inner = if flags.contains(Flags::NEED_QUOTES) {
        plan(move |buf, ptr| {
            let start = buf.len();
            inner(buf, ptr)?;
            if buf.len() > start {
                requote(buf, start, flags);
            }
            Ok(())
        })
    } else {
        inner
    };
    if flags.contains(Flags::OMIT_EMPTY) {
        plan(move |buf, ptr| {
            // SAFETY: `ptr` points at a value described by `info`.
            if unsafe { is_empty(info, ptr) } {
                return Ok(());
            }
            inner(buf, ptr)
        })
    } else {
        inner
    }
}

/// The zero-value test used for `omitempty`, by kind.
///
/// # Safety
///
/// `ptr` must point at a value described by `info`.
pub(crate) unsafe fn is_empty(info: &TypeInfo, ptr: Ptr<'_>) -> bool {
    unsafe fn zero<T: Primitive>(ptr: Ptr<'_>) -> bool {
        unsafe { *ptr.deref::<T>() }.is_zero()
    }

    unsafe {
        match info.kind() {
            Kind::Bool => zero::<bool>(ptr),
            Kind::I8 => zero::<i8>(ptr),
            Kind::I16 => zero::<i16>(ptr),
            Kind::I32 => zero::<i32>(ptr),
            Kind::I64 => zero::<i64>(ptr),
            Kind::Isize => zero::<isize>(ptr),
            Kind::U8 => zero::<u8>(ptr),
            Kind::U16 => zero::<u16>(ptr),
            Kind::U32 => zero::<u32>(ptr),
            Kind::U64 => zero::<u64>(ptr),
            Kind::Usize => zero::<usize>(ptr),
            Kind::F32 => zero::<f32>(ptr),
            Kind::F64 => zero::<f64>(ptr),
            Kind::String => ptr.deref::<String>().is_empty(),
            Kind::Slice(slice) => slice.parts(ptr).1 == 0,
            Kind::Array(array) => array.is_empty(),
            Kind::Map(map) => map.len(ptr) == 0,
            Kind::Pointer(pointer) => pointer.deref(ptr).is_none(),
            Kind::Interface(iface) => iface.resolve(ptr).is_none(),
            Kind::Opaque if info.is::<BigInt>() => ptr.deref::<BigInt>().sign() == Sign::NoSign,
            Kind::Struct(_) | Kind::Opaque => false,
        }
    }
}
