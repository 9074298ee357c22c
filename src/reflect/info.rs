//! Type descriptors.
//!
//! A [`TypeInfo`] is created once per concrete type (see
//! [`cell`](super::cell)) and never mutated afterwards. Nested types are
//! referenced through `fn() -> &'static TypeInfo` getters rather than direct
//! references, so a type may (indirectly) contain itself.

use super::capability::{
    append_json_thunk, marshal_json_thunk, marshal_text_thunk, AppendFn, AppendJson, Capabilities,
    Hook, MarshalFn, MarshalJson, MarshalText, Receiver,
};
use super::Typed;
use crate::ptr::Ptr;
use crate::Result;
use std::any::{Any, TypeId};
use std::fmt;

/// Lazy getter for a nested type's descriptor.
pub type TypeInfoFn = fn() -> &'static TypeInfo;

/// Splits a slice-like value into its data pointer and element count.
pub type PartsFn = for<'a> unsafe fn(Ptr<'a>) -> (Ptr<'a>, usize);

/// Follows one level of indirection; `None` means nil.
pub type DerefFn = for<'a> unsafe fn(Ptr<'a>) -> Option<Ptr<'a>>;

/// Resolves a dynamic value to its concrete type and payload; `None` means nil.
pub type ResolveFn = for<'a> unsafe fn(Ptr<'a>) -> Option<(&'static TypeInfo, Ptr<'a>)>;

/// Number of entries in a map.
pub type LenFn = unsafe fn(Ptr<'_>) -> usize;

/// Visits every (key, value) pair of a map in its native iteration order.
pub type VisitFn =
    for<'a> unsafe fn(Ptr<'a>, &mut dyn FnMut(Ptr<'a>, Ptr<'a>) -> Result<()>) -> Result<()>;

/// Descriptor of one concrete runtime type.
pub struct TypeInfo {
    type_id: TypeId,
    type_name: &'static str,
    size: usize,
    kind: Kind,
    capabilities: Capabilities,
}

/// The structural category of a type.
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    String,
    Struct(StructInfo),
    Slice(SliceInfo),
    Array(ArrayInfo),
    Map(MapInfo),
    Pointer(PointerInfo),
    Interface(InterfaceInfo),
    /// No structural representation (function pointers, library types that
    /// only have a well-known encoder).
    Opaque,
}

impl TypeInfo {
    pub fn new<T: Any>(kind: Kind) -> Self {
        TypeInfo {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            kind,
            capabilities: Capabilities::default(),
        }
    }

    /// Descriptor for a struct with the given fields in declaration order.
    pub fn structure<T: Any>(fields: Vec<FieldInfo>) -> Self {
        Self::new::<T>(Kind::Struct(StructInfo { fields }))
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Size in bytes, which is also the stride between array elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Declares that `T` appends its own JSON.
    #[must_use]
    pub fn with_append_json<T: AppendJson + Typed>(mut self, receiver: Receiver) -> Self {
        self.assert_describes::<T>();
        Capabilities::offer(
            &mut self.capabilities.append_json,
            Hook::new(receiver, append_json_thunk::<T> as AppendFn),
        );
        self
    }

    /// Declares that `T` marshals itself to a complete JSON document.
    #[must_use]
    pub fn with_marshal_json<T: MarshalJson + Typed>(mut self, receiver: Receiver) -> Self {
        self.assert_describes::<T>();
        Capabilities::offer(
            &mut self.capabilities.marshal_json,
            Hook::new(receiver, marshal_json_thunk::<T> as MarshalFn),
        );
        self
    }

    /// Declares that `T` renders itself as text, encoded as a JSON string.
    #[must_use]
    pub fn with_marshal_text<T: MarshalText + Typed>(mut self, receiver: Receiver) -> Self {
        self.assert_describes::<T>();
        Capabilities::offer(
            &mut self.capabilities.marshal_text,
            Hook::new(receiver, marshal_text_thunk::<T> as MarshalFn),
        );
        self
    }

    fn assert_describes<T: Any>(&self) {
        assert!(
            self.is::<T>(),
            "capability of {} attached to descriptor of {}",
            std::any::type_name::<T>(),
            self.type_name
        );
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_name", &self.type_name)
            .field("size", &self.size)
            .field("kind", &self.kind.name())
            .finish()
    }
}

impl Kind {
    /// Short lowercase name of the kind, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::String => "string",
            Kind::Struct(_) => "struct",
            Kind::Slice(_) => "slice",
            Kind::Array(_) => "array",
            Kind::Map(_) => "map",
            Kind::Pointer(_) => "pointer",
            Kind::Interface(_) => "interface",
            Kind::Opaque => "opaque",
        }
    }

    /// Whether the kind may carry the `string` tag option.
    pub fn is_quotable_scalar(&self) -> bool {
        matches!(
            self,
            Kind::Bool
                | Kind::I8
                | Kind::I16
                | Kind::I32
                | Kind::I64
                | Kind::Isize
                | Kind::U8
                | Kind::U16
                | Kind::U32
                | Kind::U64
                | Kind::Usize
                | Kind::F32
                | Kind::F64
        )
    }
}

/// Fields of a struct in declaration order.
pub struct StructInfo {
    fields: Vec<FieldInfo>,
}

impl StructInfo {
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

/// One struct field.
pub struct FieldInfo {
    name: &'static str,
    tag: &'static str,
    offset: usize,
    ty: TypeInfoFn,
    embedded: bool,
    exported: bool,
}

impl FieldInfo {
    /// An exported, non-embedded field of type `F` at `offset`.
    pub fn new<F: Typed>(name: &'static str, offset: usize) -> Self {
        FieldInfo {
            name,
            tag: "",
            offset,
            ty: F::type_info,
            embedded: false,
            exported: true,
        }
    }

    /// Attaches an annotation of the form `name,option,option`.
    #[must_use]
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    /// Marks the field as an anonymous component whose fields may be promoted
    /// into the parent.
    #[must_use]
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Marks the field as not part of the public surface; it is skipped
    /// unless it is an embedded struct eligible for flattening.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.ty)()
    }

    #[inline]
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    #[inline]
    pub fn is_exported(&self) -> bool {
        self.exported
    }
}

/// A growable or boxed contiguous sequence.
pub struct SliceInfo {
    elem: TypeInfoFn,
    parts: PartsFn,
}

impl SliceInfo {
    pub fn new(elem: TypeInfoFn, parts: PartsFn) -> Self {
        SliceInfo { elem, parts }
    }

    #[inline]
    pub fn elem(&self) -> &'static TypeInfo {
        (self.elem)()
    }

    /// # Safety
    ///
    /// `ptr` must point at a value of the described slice type.
    #[inline]
    pub unsafe fn parts<'a>(&self, ptr: Ptr<'a>) -> (Ptr<'a>, usize) {
        unsafe { (self.parts)(ptr) }
    }
}

/// A fixed-length inline array.
pub struct ArrayInfo {
    elem: TypeInfoFn,
    len: usize,
}

impl ArrayInfo {
    pub fn new(elem: TypeInfoFn, len: usize) -> Self {
        ArrayInfo { elem, len }
    }

    #[inline]
    pub fn elem(&self) -> &'static TypeInfo {
        (self.elem)()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// An associative container.
pub struct MapInfo {
    key: TypeInfoFn,
    value: TypeInfoFn,
    len: LenFn,
    visit: VisitFn,
}

impl MapInfo {
    pub fn new(key: TypeInfoFn, value: TypeInfoFn, len: LenFn, visit: VisitFn) -> Self {
        MapInfo {
            key,
            value,
            len,
            visit,
        }
    }

    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }

    /// # Safety
    ///
    /// `ptr` must point at a value of the described map type.
    #[inline]
    pub unsafe fn len(&self, ptr: Ptr<'_>) -> usize {
        unsafe { (self.len)(ptr) }
    }

    /// # Safety
    ///
    /// `ptr` must point at a value of the described map type.
    #[inline]
    pub unsafe fn visit<'a>(
        &self,
        ptr: Ptr<'a>,
        f: &mut dyn FnMut(Ptr<'a>, Ptr<'a>) -> Result<()>,
    ) -> Result<()> {
        unsafe { (self.visit)(ptr, f) }
    }
}

/// A nullable or owning single indirection.
pub struct PointerInfo {
    pointee: TypeInfoFn,
    deref: DerefFn,
}

impl PointerInfo {
    pub fn new(pointee: TypeInfoFn, deref: DerefFn) -> Self {
        PointerInfo { pointee, deref }
    }

    #[inline]
    pub fn pointee(&self) -> &'static TypeInfo {
        (self.pointee)()
    }

    #[inline]
    pub fn deref_fn(&self) -> DerefFn {
        self.deref
    }

    /// # Safety
    ///
    /// `ptr` must point at a value of the described pointer type.
    #[inline]
    pub unsafe fn deref<'a>(&self, ptr: Ptr<'a>) -> Option<Ptr<'a>> {
        unsafe { (self.deref)(ptr) }
    }
}

/// A value whose concrete type is only known at encode time.
pub struct InterfaceInfo {
    resolve: ResolveFn,
}

impl InterfaceInfo {
    pub fn new(resolve: ResolveFn) -> Self {
        InterfaceInfo { resolve }
    }

    /// # Safety
    ///
    /// `ptr` must point at a value of the described interface type.
    #[inline]
    pub unsafe fn resolve<'a>(&self, ptr: Ptr<'a>) -> Option<(&'static TypeInfo, Ptr<'a>)> {
        unsafe { (self.resolve)(ptr) }
    }
}
