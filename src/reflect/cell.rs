//! Static storage for type descriptors.
//!
//! - [`TypeInfoCell`]: for non-generic types, a plain [`OnceLock`].
//! - [`GenericTypeInfoCell`]: a `static` inside a generic function is shared
//!   by every instantiation, so descriptors are kept in a map keyed by
//!   [`TypeId`] and leaked once per concrete type.
//!
//! ## Examples
//!
//! ```rust
//! use jsonplan::reflect::{GenericTypeInfoCell, Kind, TypeInfoCell};
//! use jsonplan::{TypeInfo, Typed};
//!
//! struct Marker;
//!
//! unsafe impl Typed for Marker {
//!     fn type_info() -> &'static TypeInfo {
//!         static CELL: TypeInfoCell = TypeInfoCell::new();
//!         CELL.get_or_init(|| TypeInfo::new::<Self>(Kind::Opaque))
//!     }
//! }
//!
//! struct Wrapper<T>(T);
//!
//! unsafe impl<T: Send + Sync + 'static> Typed for Wrapper<T> {
//!     fn type_info() -> &'static TypeInfo {
//!         static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
//!         CELL.get_or_insert::<Self>(|| TypeInfo::new::<Self>(Kind::Opaque))
//!     }
//! }
//!
//! assert!(Marker::type_info().is::<Marker>());
//! assert!(Wrapper::<u8>::type_info().is::<Wrapper<u8>>());
//! assert!(Wrapper::<u16>::type_info().is::<Wrapper<u16>>());
//! ```

use super::TypeInfo;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Storage for the descriptor of one non-generic type.
pub struct TypeInfoCell(OnceLock<TypeInfo>);

impl TypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        TypeInfoCell(OnceLock::new())
    }

    /// Returns the stored descriptor, creating it with `f` on first use.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &TypeInfo
    where
        F: FnOnce() -> TypeInfo,
    {
        self.0.get_or_init(f)
    }
}

impl Default for TypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage for the descriptors of every instantiation of a generic type.
pub struct GenericTypeInfoCell(OnceLock<RwLock<HashMap<TypeId, &'static TypeInfo>>>);

impl GenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        GenericTypeInfoCell(OnceLock::new())
    }

    /// Returns the descriptor stored for `T`, creating it with `f` on first
    /// use.
    ///
    /// `f` runs under the cell's write lock. Descriptors reference nested
    /// types lazily, so building one never re-enters the same cell.
    pub fn get_or_insert<T: Any>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let map = self.0.get_or_init(Default::default);
        let id = TypeId::of::<T>();
        if let Some(info) = map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
        {
            return info;
        }
        let mut guard = map.write().unwrap_or_else(PoisonError::into_inner);
        *guard.entry(id).or_insert_with(|| &*Box::leak(Box::new(f())))
    }
}

impl Default for GenericTypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}
