//! Runtime type descriptors.
//!
//! Every encodable type implements [`Typed`], which hands out a
//! `&'static` [`TypeInfo`]: its kind, its size, its fields with byte offsets,
//! its element/key/value types and the capabilities it declares. The plan
//! compiler reads descriptors once per type; at encode time plans only touch
//! raw memory through [`Ptr`](crate::Ptr).
//!
//! Descriptors are provided for the standard scalars, `String`, `Vec<T>`,
//! `Box<[T]>`, `[T; N]`, `Option<T>`, `Box<T>`, `Arc<T>`, `HashMap`,
//! `BTreeMap`, `IndexMap`, `Box<dyn Reflect>`, `fn()`, `DateTime<Utc>` and
//! `BigInt`. User structs use [`reflect_struct!`](crate::reflect_struct).
//!
//! ## Examples
//!
//! ```rust
//! use jsonplan::reflect::Kind;
//! use jsonplan::Typed;
//!
//! let info = <Vec<Option<u32>>>::type_info();
//! let Kind::Slice(slice) = info.kind() else { unreachable!() };
//! assert!(matches!(slice.elem().kind(), Kind::Pointer(_)));
//! ```

mod capability;
mod cell;
mod impls;
mod info;
mod macros;

pub use capability::{AppendJson, Capabilities, MarshalJson, MarshalText, Receiver};
pub use cell::{GenericTypeInfoCell, TypeInfoCell};
pub use info::{
    ArrayInfo, DerefFn, FieldInfo, InterfaceInfo, Kind, LenFn, MapInfo, PartsFn, PointerInfo,
    ResolveFn, SliceInfo, StructInfo, TypeInfo, TypeInfoFn, VisitFn,
};

use std::any::Any;

/// A type with a static descriptor.
///
/// # Safety
///
/// Plans read values through the descriptor without further checks. The
/// returned [`TypeInfo`] must describe `Self` exactly: its kind must match
/// the real representation (a `Kind::String` type must be a `String`, a
/// sequence kind's parts function must return its real elements), field
/// offsets must be the offsets of fields of the declared types, and every
/// capability hook must have been declared for `Self`. Prefer
/// [`reflect_struct!`](crate::reflect_struct), which checks field types and
/// takes offsets from `offset_of!`.
///
/// A descriptor cannot be attached without acknowledging this contract:
///
/// ```compile_fail
/// use jsonplan::reflect::{Kind, TypeInfoCell};
/// use jsonplan::{TypeInfo, Typed};
///
/// struct Fake([usize; 3]);
///
/// impl Typed for Fake {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: TypeInfoCell = TypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::new::<Fake>(Kind::String))
///     }
/// }
/// ```
pub unsafe trait Typed: Any + Send + Sync {
    fn type_info() -> &'static TypeInfo;
}

/// Object-safe access to a value's descriptor.
///
/// Implemented for every [`Typed`] type; `Box<dyn Reflect>` is the carrier
/// for values whose concrete type varies at run time.
pub trait Reflect: Any + Send + Sync {
    fn reflect_type(&self) -> &'static TypeInfo;
}

impl<T: Typed> Reflect for T {
    #[inline]
    fn reflect_type(&self) -> &'static TypeInfo {
        T::type_info()
    }
}
