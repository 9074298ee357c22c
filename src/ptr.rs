//! Type-erased borrowed pointer used by compiled plans.
//!
//! A [`Ptr<'a>`] is the `&'a dyn Any` of this crate without the vtable: plans
//! are specialized for one concrete type at compile time, so at encode time
//! they only need the address. Struct fields are reached with
//! [`byte_add`](Ptr::byte_add) using offsets recorded in the type descriptor.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// A borrowed, type-erased, non-null pointer.
///
/// - It always points to a valid value of the pointee type the holder was
///   compiled for.
/// - The lifetime `'a` is the lifetime of the borrow it was created from.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<u8>, PhantomData<&'a u8>);

impl<'a> Ptr<'a> {
    /// Creates a `Ptr` from a reference with the same lifetime.
    ///
    /// For unsized pointees (`dyn Trait`, slices) only the data address is
    /// kept.
    #[inline(always)]
    pub fn from_ref<T: ?Sized>(val: &'a T) -> Ptr<'a> {
        Ptr(NonNull::from(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Offsets the pointer by `count` bytes.
    ///
    /// # Safety
    ///
    /// The result must stay inside the allocation the pointer was derived from
    /// and point at a valid value for as long as `'a`.
    #[inline(always)]
    pub unsafe fn byte_add(self, count: usize) -> Ptr<'a> {
        // SAFETY: the caller keeps the offset inside the same allocation.
        Ptr(unsafe { self.0.add(count) }, PhantomData)
    }

    /// Converts this pointer into a `&'a T`.
    ///
    /// # Safety
    ///
    /// - `T` must be the actual type of the pointee.
    /// - The pointer must be aligned for `T`.
    #[inline(always)]
    pub unsafe fn deref<T>(self) -> &'a T {
        debug_assert!(
            self.0.as_ptr().cast::<T>().is_aligned(),
            "pointer {:p} is not aligned for {}",
            self.0,
            std::any::type_name::<T>(),
        );
        // SAFETY: the caller guarantees `T` is the pointee type.
        unsafe { self.0.cast::<T>().as_ref() }
    }
}

impl fmt::Pointer for Ptr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.0, f)
    }
}

impl fmt::Debug for Ptr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ptr({:?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct Pair {
        a: u32,
        b: u64,
    }

    #[test]
    fn test_deref_field_by_offset() {
        let pair = Pair { a: 7, b: 42 };
        let ptr = Ptr::from_ref(&pair);
        let a = unsafe { ptr.byte_add(std::mem::offset_of!(Pair, a)).deref::<u32>() };
        let b = unsafe { ptr.byte_add(std::mem::offset_of!(Pair, b)).deref::<u64>() };
        assert_eq!((*a, *b), (7, 42));
    }

    #[test]
    fn test_from_unsized_keeps_data_address() {
        let boxed: Box<dyn std::any::Any> = Box::new(5i32);
        let ptr = Ptr::from_ref(&*boxed);
        assert_eq!(unsafe { *ptr.deref::<i32>() }, 5);
    }
}
