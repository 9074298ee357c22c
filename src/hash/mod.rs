//! Structural hashing.
//!
//! A second compiler over the same type descriptors as the encoder. It
//! produces a digest of a value's content that does not depend on map
//! iteration order:
//!
//! - scalars are folded as their little-endian bytes, floats as their bits
//! - strings and slices fold their length first; byte sequences are folded as
//!   raw bytes
//! - pointers and dynamic values fold a presence byte
//! - struct fields (the same visible set the encoder uses) are folded in the
//!   order of their name digests, each as name digest then value
//! - each map entry is digested on its own, the entry digests are sorted and
//!   folded after the entry count
//!
//! Hashers are cached per (type, depth) and share the encoder's nesting
//! limit; dynamic payloads start a fresh count. Custom encoders and capabilities have no effect on hashing.

mod fnv;

use crate::encode::struct_::collect_fields;
use crate::encode::MAX_DEPTH;
use crate::pool;
use crate::ptr::Ptr;
use crate::reflect::{Kind, TypeInfo};
use crate::Typed;
use chrono::{DateTime, Utc};
use fnv::{digest, Fnv};
use num_bigint::BigInt;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type Hasher = Arc<dyn for<'a> Fn(&mut Fnv, Ptr<'a>) + Send + Sync>;

#[inline]
fn hasher<F>(f: F) -> Hasher
where
    F: for<'a> Fn(&mut Fnv, Ptr<'a>) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn cache() -> &'static RwLock<HashMap<(TypeId, u8), Hasher>> {
    static CACHE: OnceLock<RwLock<HashMap<(TypeId, u8), Hasher>>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

fn hasher_for(info: &'static TypeInfo, depth: u8) -> Hasher {
    if depth > MAX_DEPTH {
        tracing::trace!(
            type_name = info.type_name(),
            depth,
            "nesting limit reached, hashing nothing"
        );
        return hasher(|_, _| {});
    }
    let key = (info.type_id(), depth);
    if let Some(h) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return h.clone();
    }
    let built = compile(info, depth);
    tracing::debug!(type_name = info.type_name(), depth, "compiled hasher");
    cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_insert(built)
        .clone()
}

macro_rules! fold_le {
    ($ty:ty) => {
        hasher(|h, ptr| {
            // SAFETY: compiled for this scalar type.
            h.write(&unsafe { *ptr.deref::<$ty>() }.to_le_bytes())
        })
    };
}

fn compile(info: &'static TypeInfo, depth: u8) -> Hasher {
    if info.is::<DateTime<Utc>>() {
        return hasher(|h, ptr| {
            // SAFETY: compiled for `DateTime<Utc>`.
            let time = unsafe { ptr.deref::<DateTime<Utc>>() };
            h.write_u64(time.timestamp() as u64);
            h.write_u32(time.timestamp_subsec_nanos());
        });
    }
    if info.is::<BigInt>() {
        return hasher(|h, ptr| {
            // SAFETY: compiled for `BigInt`.
            h.write(&unsafe { ptr.deref::<BigInt>() }.to_signed_bytes_le());
        });
    }

    match info.kind() {
        Kind::Bool => hasher(|h, ptr| {
            // SAFETY: compiled for `bool`.
            h.write_u8(u8::from(unsafe { *ptr.deref::<bool>() }))
        }),
        Kind::I8 => fold_le!(i8),
        Kind::I16 => fold_le!(i16),
        Kind::I32 => fold_le!(i32),
        Kind::I64 => fold_le!(i64),
        Kind::Isize => hasher(|h, ptr| {
            // SAFETY: compiled for `isize`.
            h.write_u64(unsafe { *ptr.deref::<isize>() } as i64 as u64)
        }),
        Kind::U8 => fold_le!(u8),
        Kind::U16 => fold_le!(u16),
        Kind::U32 => fold_le!(u32),
        Kind::U64 => fold_le!(u64),
        Kind::Usize => hasher(|h, ptr| {
            // SAFETY: compiled for `usize`.
            h.write_u64(unsafe { *ptr.deref::<usize>() } as u64)
        }),
        Kind::F32 => hasher(|h, ptr| {
            // SAFETY: compiled for `f32`.
            h.write_u32(unsafe { *ptr.deref::<f32>() }.to_bits())
        }),
        Kind::F64 => hasher(|h, ptr| {
            // SAFETY: compiled for `f64`.
            h.write_u64(unsafe { *ptr.deref::<f64>() }.to_bits())
        }),
        Kind::String => hasher(|h, ptr| {
            // SAFETY: compiled for `String` or a transparent wrapper of it.
            let s = unsafe { ptr.deref::<String>() };
            h.write_len(s.len());
            h.write(s.as_bytes());
        }),
        Kind::Struct(_) => {
            let mut fields: Vec<_> = collect_fields(info, MAX_DEPTH.saturating_sub(depth))
                .into_iter()
                .map(|field| {
                    let name = digest(field.name.as_bytes());
                    let value = hasher_for(field.info, depth + 1);
                    (name, field, value)
                })
                .collect();
            fields.sort_by_key(|(name, _, _)| *name);
            hasher(move |h, ptr| {
                for (name, field, value) in &fields {
                    // SAFETY: the field set was collected from this struct.
                    if let Some(field_ptr) = unsafe { field.locate(ptr) } {
                        h.write_u64(*name);
                        value(h, field_ptr);
                    }
                }
            })
        }
        Kind::Slice(slice) => {
            let elem = slice.elem();
            if elem.is::<u8>() {
                return hasher(move |h, ptr| {
                    // SAFETY: compiled for this slice type; `u8` data is
                    // contiguous.
                    let bytes = unsafe {
                        let (data, len) = slice.parts(ptr);
                        std::slice::from_raw_parts(data.as_ptr(), len)
                    };
                    h.write_len(bytes.len());
                    h.write(bytes);
                });
            }
            let value = hasher_for(elem, depth + 1);
            let stride = elem.size();
            hasher(move |h, ptr| {
                // SAFETY: compiled for this slice type.
                let (data, len) = unsafe { slice.parts(ptr) };
                h.write_len(len);
                for i in 0..len {
                    // SAFETY: `i < len`.
                    value(h, unsafe { data.byte_add(i * stride) });
                }
            })
        }
        Kind::Array(array) => {
            let elem = array.elem();
            let len = array.len();
            if elem.is::<u8>() {
                return hasher(move |h, ptr| {
                    // SAFETY: an array of `len` bytes.
                    h.write(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) });
                });
            }
            let value = hasher_for(elem, depth + 1);
            let stride = elem.size();
            hasher(move |h, ptr| {
                for i in 0..len {
                    // SAFETY: `i < len`.
                    value(h, unsafe { ptr.byte_add(i * stride) });
                }
            })
        }
        Kind::Map(map) => {
            let key = hasher_for(map.key(), depth + 1);
            let value = hasher_for(map.value(), depth + 1);
            hasher(move |h, ptr| {
                let mut entries = pool::digests();
                // SAFETY: compiled for this map type.
                let visited = unsafe {
                    map.visit(ptr, &mut |k, v| {
                        let mut entry = Fnv::new();
                        key(&mut entry, k);
                        value(&mut entry, v);
                        entries.push(entry.finish());
                        Ok(())
                    })
                };
                // Entry hashers cannot fail.
                debug_assert!(visited.is_ok());
                entries.sort_unstable();
                h.write_len(entries.len());
                for entry in entries.iter() {
                    h.write_u64(*entry);
                }
            })
        }
        Kind::Pointer(pointer) => {
            let pointee = hasher_for(pointer.pointee(), depth);
            hasher(move |h, ptr| {
                // SAFETY: compiled for this pointer type.
                match unsafe { pointer.deref(ptr) } {
                    Some(target) => {
                        h.write_u8(1);
                        pointee(h, target);
                    }
                    None => h.write_u8(0),
                }
            })
        }
        Kind::Interface(iface) => hasher(move |h, ptr| {
            // SAFETY: compiled for this interface type.
            match unsafe { iface.resolve(ptr) } {
                Some((info, value)) => {
                    h.write_u8(1);
                    // A resolved payload is finite data with its own budget.
                    hasher_for(info, 0)(h, value);
                }
                None => h.write_u8(0),
            }
        }),
        Kind::Opaque => hasher(|_, _| {}),
    }
}

/// Returns the structural digest of `value`.
///
/// Equal values hash equally regardless of the iteration order of the maps
/// they contain.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
///
/// let a: HashMap<String, u32> = [("x".to_string(), 1), ("y".to_string(), 2)].into();
/// let b: HashMap<String, u32> = [("y".to_string(), 2), ("x".to_string(), 1)].into();
/// assert_eq!(jsonplan::hash(&a), jsonplan::hash(&b));
/// assert_ne!(jsonplan::hash(&a), jsonplan::hash(&HashMap::<String, u32>::new()));
/// ```
pub fn hash<T: Typed>(value: &T) -> u64 {
    let mut h = Fnv::new();
    hasher_for(T::type_info(), 0)(&mut h, Ptr::from_ref(value));
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_scalars_hash_their_bytes() {
        assert_eq!(hash(&0x0201u16), digest(&[1, 2]));
        assert_eq!(hash(&true), digest(&[1]));
        assert_eq!(hash(&1.0f64), digest(&1.0f64.to_bits().to_le_bytes()));
    }

    #[test]
    fn test_length_prefix_separates_strings() {
        let a = vec!["ab".to_string(), "c".to_string()];
        let b = vec!["a".to_string(), "bc".to_string()];
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_map_order_independence() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), 1i32);
        a.insert("y".to_string(), 2i32);
        let mut b = IndexMap::new();
        b.insert("y".to_string(), 2i32);
        b.insert("x".to_string(), 1i32);
        assert_eq!(hash(&a), hash(&b));

        b.insert("y".to_string(), 3i32);
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_presence_byte() {
        assert_ne!(hash(&Some(0u8)), hash(&None::<u8>));
        assert_eq!(hash(&None::<u8>), digest(&[0]));
        assert_eq!(hash(&Some(Box::new(7u8))), digest(&[1, 1, 7]));
    }

    #[test]
    fn test_hashers_are_cached() {
        let a = hasher_for(<Vec<String>>::type_info(), 0);
        let b = hasher_for(<Vec<String>>::type_info(), 0);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
