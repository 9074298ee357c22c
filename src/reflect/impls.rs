//! Descriptors for standard library and dependency types.

use super::{
    ArrayInfo, GenericTypeInfoCell, InterfaceInfo, Kind, MapInfo, PointerInfo, Reflect, SliceInfo,
    TypeInfo, TypeInfoCell, Typed,
};
use crate::ptr::Ptr;
use crate::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            unsafe impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: TypeInfoCell = TypeInfoCell::new();
                    CELL.get_or_init(|| TypeInfo::new::<$ty>(Kind::$kind))
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    DateTime<Utc> => Opaque,
    BigInt => Opaque,
}

unsafe impl Typed for fn() {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::new::<fn()>(Kind::Opaque))
    }
}

// Sequences

unsafe fn vec_parts<T: 'static>(ptr: Ptr<'_>) -> (Ptr<'_>, usize) {
    let vec = unsafe { ptr.deref::<Vec<T>>() };
    (Ptr::from_ref(vec.as_slice()), vec.len())
}

unsafe fn boxed_slice_parts<T: 'static>(ptr: Ptr<'_>) -> (Ptr<'_>, usize) {
    let slice = unsafe { ptr.deref::<Box<[T]>>() };
    (Ptr::from_ref(&**slice), slice.len())
}

unsafe impl<T: Typed> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>(Kind::Slice(SliceInfo::new(T::type_info, vec_parts::<T>)))
        })
    }
}

unsafe impl<T: Typed> Typed for Box<[T]> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>(Kind::Slice(SliceInfo::new(
                T::type_info,
                boxed_slice_parts::<T>,
            )))
        })
    }
}

unsafe impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::new::<Self>(Kind::Array(ArrayInfo::new(T::type_info, N))))
    }
}

// Indirections

unsafe fn option_deref<T: 'static>(ptr: Ptr<'_>) -> Option<Ptr<'_>> {
    unsafe { ptr.deref::<Option<T>>() }.as_ref().map(Ptr::from_ref)
}

unsafe fn box_deref<T: 'static>(ptr: Ptr<'_>) -> Option<Ptr<'_>> {
    Some(Ptr::from_ref(&**unsafe { ptr.deref::<Box<T>>() }))
}

unsafe fn arc_deref<T: 'static>(ptr: Ptr<'_>) -> Option<Ptr<'_>> {
    Some(Ptr::from_ref(&**unsafe { ptr.deref::<Arc<T>>() }))
}

macro_rules! impl_pointer {
    ($($wrapper:ident => $deref:ident),* $(,)?) => {
        $(
            unsafe impl<T: Typed> Typed for $wrapper<T> {
                fn type_info() -> &'static TypeInfo {
                    static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                    CELL.get_or_insert::<Self>(|| {
                        TypeInfo::new::<Self>(Kind::Pointer(PointerInfo::new(
                            T::type_info,
                            $deref::<T>,
                        )))
                    })
                }
            }
        )*
    };
}

impl_pointer! {
    Option => option_deref,
    Box => box_deref,
    Arc => arc_deref,
}

// Maps

macro_rules! impl_map {
    ($($map:ident<K, V $(, $s:ident)?> => ($len:ident, $visit:ident)),* $(,)?) => {
        $(
            unsafe fn $len<K: 'static, V: 'static $(, $s: 'static)?>(ptr: Ptr<'_>) -> usize {
                unsafe { ptr.deref::<$map<K, V $(, $s)?>>() }.len()
            }

            unsafe fn $visit<'a, K: 'static, V: 'static $(, $s: 'static)?>(
                ptr: Ptr<'a>,
                f: &mut dyn FnMut(Ptr<'a>, Ptr<'a>) -> Result<()>,
            ) -> Result<()> {
                for (key, value) in unsafe { ptr.deref::<$map<K, V $(, $s)?>>() } {
                    f(Ptr::from_ref(key), Ptr::from_ref(value))?;
                }
                Ok(())
            }

            unsafe impl<K: Typed, V: Typed $(, $s: Send + Sync + 'static)?> Typed for $map<K, V $(, $s)?> {
                fn type_info() -> &'static TypeInfo {
                    static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                    CELL.get_or_insert::<Self>(|| {
                        TypeInfo::new::<Self>(Kind::Map(MapInfo::new(
                            K::type_info,
                            V::type_info,
                            $len::<K, V $(, $s)?>,
                            $visit::<K, V $(, $s)?>,
                        )))
                    })
                }
            }
        )*
    };
}

impl_map! {
    HashMap<K, V, S> => (hash_map_len, hash_map_visit),
    BTreeMap<K, V> => (btree_map_len, btree_map_visit),
    IndexMap<K, V, S> => (index_map_len, index_map_visit),
}

// Dynamic values

unsafe fn resolve_boxed(ptr: Ptr<'_>) -> Option<(&'static TypeInfo, Ptr<'_>)> {
    let inner: &dyn Reflect = &**unsafe { ptr.deref::<Box<dyn Reflect>>() };
    Some((inner.reflect_type(), Ptr::from_ref(inner)))
}

unsafe impl Typed for Box<dyn Reflect> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Self>(Kind::Interface(InterfaceInfo::new(resolve_boxed)))
        })
    }
}
