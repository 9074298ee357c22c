//! Booleans, integers and floats.

use super::{plan, Plan};
use crate::options::Flags;

/// Appends the decimal digits of `v`.
///
/// Values below 1000 take a branch per digit count; larger values are
/// rendered right to left into a stack buffer.
#[inline]
pub(crate) fn append_u64(buf: &mut Vec<u8>, v: u64) {
    if v < 10 {
        buf.push(b'0' + v as u8);
    } else if v < 100 {
        buf.extend_from_slice(&[b'0' + (v / 10) as u8, b'0' + (v % 10) as u8]);
    } else if v < 1000 {
        buf.extend_from_slice(&[
            b'0' + (v / 100) as u8,
            b'0' + (v / 10 % 10) as u8,
            b'0' + (v % 10) as u8,
        ]);
    } else {
        // "18446744073709551615"
        let mut digits = [0u8; 20];
        let mut i = digits.len();
        let mut v = v;
        while v > 0 {
            i -= 1;
            digits[i] = (v % 10) as u8 + b'0';
            v /= 10;
        }
        buf.extend_from_slice(&digits[i..]);
    }
}

#[inline]
pub(crate) fn append_i64(buf: &mut Vec<u8>, v: i64) {
    if v < 0 {
        buf.push(b'-');
    }
    append_u64(buf, v.unsigned_abs());
}

/// Appends the shortest decimal that round-trips `v` in fixed notation.
/// Non-finite values have no JSON form and become `null`.
pub(crate) fn append_f64(buf: &mut Vec<u8>, v: f64) {
    if !v.is_finite() {
        buf.extend_from_slice(b"null");
        return;
    }
    let mut ryu = ryu::Buffer::new();
    push_fixed(buf, ryu.format_finite(v), || v.to_string());
}

pub(crate) fn append_f32(buf: &mut Vec<u8>, v: f32) {
    if !v.is_finite() {
        buf.extend_from_slice(b"null");
        return;
    }
    let mut ryu = ryu::Buffer::new();
    push_fixed(buf, ryu.format_finite(v), || v.to_string());
}

/// ryu renders large and small magnitudes with an exponent; `Display` gives
/// the same digits in fixed notation.
fn push_fixed(buf: &mut Vec<u8>, shortest: &str, fixed: impl FnOnce() -> String) {
    if shortest.contains('e') {
        buf.extend_from_slice(fixed().as_bytes());
    } else {
        let digits = shortest.strip_suffix(".0").unwrap_or(shortest);
        buf.extend_from_slice(digits.as_bytes());
    }
}

/// A primitive kind with a zero value and a JSON rendering.
pub(crate) trait Primitive: Copy + Send + Sync + 'static {
    fn is_zero(self) -> bool;
    fn append(self, buf: &mut Vec<u8>);
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Primitive for $ty {
                #[inline]
                fn is_zero(self) -> bool {
                    self == 0
                }

                #[inline]
                fn append(self, buf: &mut Vec<u8>) {
                    append_u64(buf, self as u64);
                }
            }
        )*
    };
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl Primitive for $ty {
                #[inline]
                fn is_zero(self) -> bool {
                    self == 0
                }

                #[inline]
                fn append(self, buf: &mut Vec<u8>) {
                    append_i64(buf, self as i64);
                }
            }
        )*
    };
}

impl_unsigned!(u8, u16, u32, u64, usize);
impl_signed!(i8, i16, i32, i64, isize);

impl Primitive for bool {
    #[inline]
    fn is_zero(self) -> bool {
        !self
    }

    #[inline]
    fn append(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(if self { b"true" } else { b"false" });
    }
}

impl Primitive for f32 {
    #[inline]
    fn is_zero(self) -> bool {
        self == 0.0
    }

    #[inline]
    fn append(self, buf: &mut Vec<u8>) {
        append_f32(buf, self);
    }
}

impl Primitive for f64 {
    #[inline]
    fn is_zero(self) -> bool {
        self == 0.0
    }

    #[inline]
    fn append(self, buf: &mut Vec<u8>) {
        append_f64(buf, self);
    }
}

/// Plan for a primitive, honoring `OMIT_EMPTY` and `NEED_QUOTES`.
pub(super) fn primitive_plan<T: Primitive>(flags: Flags) -> Plan {
    match (flags.contains(Flags::OMIT_EMPTY), flags.contains(Flags::NEED_QUOTES)) {
        (false, false) => plan(|buf, ptr| {
            // SAFETY: the plan was compiled for `T`.
            unsafe { *ptr.deref::<T>() }.append(buf);
            Ok(())
        }),
        (omit, quote) => plan(move |buf, ptr| {
            // SAFETY: the plan was compiled for `T`.
            let v = unsafe { *ptr.deref::<T>() };
            if omit && v.is_zero() {
                return Ok(());
            }
            if quote {
                buf.push(b'"');
                v.append(buf);
                buf.push(b'"');
            } else {
                v.append(buf);
            }
            Ok(())
        }),
    }
}
