//! Custom serialization capabilities.
//!
//! A type overrides its structural encoding by implementing one of the traits
//! below and declaring it on its [`TypeInfo`](super::TypeInfo). The plan
//! compiler checks the declarations once per type, in this order:
//! [`AppendJson`], [`MarshalJson`], [`MarshalText`].

use crate::ptr::Ptr;
use crate::Result;

/// Appends the value's JSON representation to `buf`.
///
/// This is the fastest capability: nothing is allocated on the encoder's
/// side. Implementations must append exactly one JSON value, or nothing when
/// the value should be omitted.
pub trait AppendJson {
    fn append_json(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// Returns the value's complete JSON representation.
pub trait MarshalJson {
    fn marshal_json(&self) -> Result<Vec<u8>>;
}

/// Returns text that is encoded as a JSON string.
///
/// The text is raw bytes; when
/// [`Flags::VALIDATE_STRING`](crate::Flags::VALIDATE_STRING) is set, invalid
/// UTF-8 is replaced with U+FFFD.
pub trait MarshalText {
    fn marshal_text(&self) -> Result<Vec<u8>>;
}

/// Which form of the value a capability is declared on.
///
/// A `Pointer` receiver needs the value's address, so it is only usable when
/// the value is addressable: struct fields, sequence elements, pointees and
/// top-level values. Map values and values held by a dynamic value are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receiver {
    Value,
    Pointer,
}

pub(crate) type AppendFn = for<'a> unsafe fn(Ptr<'a>, &mut Vec<u8>) -> Result<()>;
pub(crate) type MarshalFn = for<'a> unsafe fn(Ptr<'a>) -> Result<Vec<u8>>;

#[derive(Clone, Copy)]
pub(crate) struct Hook<F> {
    pub(crate) receiver: Receiver,
    pub(crate) call: F,
}

impl<F> Hook<F> {
    pub(crate) fn new(receiver: Receiver, call: F) -> Self {
        Hook { receiver, call }
    }
}

/// The capabilities declared on one type.
#[derive(Default)]
pub struct Capabilities {
    pub(crate) append_json: Option<Hook<AppendFn>>,
    pub(crate) marshal_json: Option<Hook<MarshalFn>>,
    pub(crate) marshal_text: Option<Hook<MarshalFn>>,
}

impl Capabilities {
    /// Installs `hook` unless the slot already holds a value-receiver form.
    pub(crate) fn offer<F>(slot: &mut Option<Hook<F>>, hook: Hook<F>) {
        let keep_existing = matches!(slot, Some(existing)
            if existing.receiver == Receiver::Value && hook.receiver == Receiver::Pointer);
        if !keep_existing {
            *slot = Some(hook);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.append_json.is_none() && self.marshal_json.is_none() && self.marshal_text.is_none()
    }

    pub fn append_json(&self) -> Option<Receiver> {
        self.append_json.map(|hook| hook.receiver)
    }

    pub fn marshal_json(&self) -> Option<Receiver> {
        self.marshal_json.map(|hook| hook.receiver)
    }

    pub fn marshal_text(&self) -> Option<Receiver> {
        self.marshal_text.map(|hook| hook.receiver)
    }
}

pub(crate) unsafe fn append_json_thunk<T: AppendJson + 'static>(ptr: Ptr<'_>, buf: &mut Vec<u8>) -> Result<()> {
    unsafe { ptr.deref::<T>() }.append_json(buf)
}

pub(crate) unsafe fn marshal_json_thunk<T: MarshalJson + 'static>(ptr: Ptr<'_>) -> Result<Vec<u8>> {
    unsafe { ptr.deref::<T>() }.marshal_json()
}

pub(crate) unsafe fn marshal_text_thunk<T: MarshalText + 'static>(ptr: Ptr<'_>) -> Result<Vec<u8>> {
    unsafe { ptr.deref::<T>() }.marshal_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn first(_: Ptr<'_>) -> Result<Vec<u8>> {
        Ok(b"1".to_vec())
    }

    unsafe fn second(_: Ptr<'_>) -> Result<Vec<u8>> {
        Ok(b"2".to_vec())
    }

    fn call(slot: &Option<Hook<MarshalFn>>) -> Vec<u8> {
        let value = 0u8;
        let hook = slot.expect("hook installed");
        unsafe { (hook.call)(Ptr::from_ref(&value)) }.unwrap()
    }

    #[test]
    fn test_value_receiver_wins_over_pointer() {
        let mut slot: Option<Hook<MarshalFn>> = None;
        Capabilities::offer(&mut slot, Hook::new(Receiver::Value, first as MarshalFn));
        Capabilities::offer(&mut slot, Hook::new(Receiver::Pointer, second as MarshalFn));
        assert_eq!(call(&slot), b"1");
        assert_eq!(slot.map(|h| h.receiver), Some(Receiver::Value));

        let mut slot: Option<Hook<MarshalFn>> = None;
        Capabilities::offer(&mut slot, Hook::new(Receiver::Pointer, second as MarshalFn));
        Capabilities::offer(&mut slot, Hook::new(Receiver::Value, first as MarshalFn));
        assert_eq!(call(&slot), b"1");
    }
}
