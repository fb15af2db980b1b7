//! Type-erased owning pointer for polymorphic values.
//!
//! This module encapsulates the `ptr` and `vtable` fields of [`RawPoly`],
//! ensuring they are only visible within this module. This visibility
//! restriction guarantees the safety invariant: **the data half of the
//! pointer always addresses the start of a live `Box<U>` allocation, and the
//! vtable is always the [`PolyVtable`] instantiated for that same `U`**.
//!
//! # Safety Invariant
//!
//! The fields can only be set via [`RawPoly::new`], [`RawPoly::from_value`]
//! and [`RawPoly::clone_value`] (all of which pair a freshly boxed `U` with
//! `PolyVtable::new::<U>()`), or via [`RawPoly::relabel`] (which carries both
//! fields over unchanged while only the static interface type changes). Since
//! the fields cannot be modified afterward, the pairing remains valid
//! throughout the value's lifetime.
//!
//! The [`Drop`] implementation relies on this invariant to safely reconstruct
//! the `Box<U>` and deallocate the memory.
//!
//! # Type Erasure
//!
//! The concrete type `U` is erased in two steps: the interface pointer
//! `NonNull<T>` is produced by applying an [`unsize::Coercion`] witness to
//! the freshly allocated `NonNull<U>`, and the clone/drop capabilities of `U`
//! are captured in the `&'static` [`PolyVtable`]. All later copies and
//! destructions route through those two fields, so no caller ever needs to
//! name `U` again.

use alloc::boxed::Box;
use core::{any::TypeId, marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use unsize::{CoerceUnsize, Coercion};

use crate::poly::vtable::PolyVtable;

/// An owning, type-erased pointer to a heap value viewed through the
/// interface type `T`.
///
/// The concrete type of the pointee is some `U` that coerces to `T`; it was
/// fixed when the value was first stored and is unknown at this point. The
/// vtable captured alongside the pointer provides the clone and drop
/// capabilities of that exact `U`, so copying a [`RawPoly`] always reproduces
/// the original concrete type, never a sliced-down `T`.
///
/// We cannot use a [`Box<T>`] directly, because `T: ?Sized` has no [`Clone`]
/// implementation to copy the pointee with.
pub struct RawPoly<T: ?Sized> {
    /// Pointer to the pointee, viewed through the interface type `T`.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The data half of the pointer addresses the start of an allocation
    ///    created from a `Box<U>` via [`Box::into_raw`] (or [`Box::leak`]),
    ///    where `U` is the concrete type the `vtable` was instantiated with.
    /// 2. The pointer is valid for reads and writes through the interface
    ///    type `T` for the entire lifetime of this object.
    /// 3. The pointee is properly initialized for the entire lifetime of this
    ///    object, except during the execution of the `Drop` implementation.
    ptr: NonNull<T>,

    /// The clone/drop capabilities of the concrete pointee type.
    ///
    /// # Safety
    ///
    /// Always the [`PolyVtable`] instantiated for the concrete type behind
    /// `ptr`.
    vtable: &'static PolyVtable,

    /// Marker to tell the compiler that we own a `T` the way a [`Box<T>`]
    /// does.
    _marker: PhantomData<T>,
}

impl<T: ?Sized> RawPoly<T> {
    /// Creates a new [`RawPoly`] owning a fresh heap allocation of `value`.
    ///
    /// The `interface` witness performs the unsizing coercion from the
    /// concrete type `U` to the interface type `T`; construct it at the call
    /// site with [`unsize::Coercion!`].
    ///
    /// This is the single point where the concrete type is fixed: the
    /// matching [`PolyVtable`] is captured here and propagated through every
    /// subsequent clone.
    ///
    /// [`unsize::Coercion!`]: unsize::Coercion
    #[inline]
    pub fn new<U, F>(value: U, interface: Coercion<U, T, F>) -> Self
    where
        U: Clone + 'static,
        F: FnOnce(*const U) -> *const T,
    {
        let thin: NonNull<U> = NonNull::from(Box::leak(Box::new(value)));
        let ptr: NonNull<T> = thin.unsize(interface);

        Self {
            ptr,
            vtable: PolyVtable::new::<U>(),
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the pointee through the interface type `T`.
    #[inline]
    pub fn as_ref(&self) -> &T {
        // SAFETY: The pointer is valid, aligned and points to an initialized
        // pointee by the invariants of this type. The returned lifetime is
        // bound to the shared borrow of `self`, and no mutation can happen
        // through a shared borrow.
        unsafe { self.ptr.as_ref() }
    }

    /// Returns a mutable reference to the pointee through the interface type
    /// `T`.
    #[inline]
    pub fn as_mut(&mut self) -> &mut T {
        // SAFETY: The pointer is valid, aligned and points to an initialized
        // pointee by the invariants of this type. Ownership is exclusive and
        // the returned lifetime is bound to the exclusive borrow of `self`,
        // so no aliasing access can exist.
        unsafe { self.ptr.as_mut() }
    }

    /// Clones the pointee into a fresh allocation and returns a new
    /// [`RawPoly`] owning it.
    ///
    /// The clone is performed by the concrete type's own [`Clone`]
    /// implementation through the captured vtable, so the new pointee has the
    /// exact dynamic type of the original. A panic from that implementation
    /// propagates before anything has been allocated.
    #[inline]
    pub fn clone_value(&self) -> Self {
        // SAFETY:
        // 1. The vtable matches the concrete pointee type by the invariants of
        //    this type.
        // 2. The data half of `ptr` addresses the live, aligned pointee.
        let data: NonNull<()> = unsafe { self.vtable.clone_pointee(self.ptr.cast::<()>()) };

        // The data half of a (possibly fat) raw pointer sits at offset zero.
        // The clone differs from the original only in that half; the metadata
        // half still describes the same concrete type, so overwriting the
        // data half in place yields a valid interface pointer to the copy.
        let mut ptr: *mut T = self.ptr.as_ptr();
        // SAFETY: `ptr` is a local variable large enough to hold at least one
        // data pointer, and every raw pointer stores its data half first.
        unsafe {
            (&raw mut ptr).cast::<*mut ()>().write(data.as_ptr());
        }
        // SAFETY: The data half now comes from a fresh `Box` allocation and
        // is therefore non-null.
        let ptr = unsafe { NonNull::new_unchecked(ptr) };

        Self {
            ptr,
            vtable: self.vtable,
            _marker: PhantomData,
        }
    }

    /// Returns the [`TypeId`] of the concrete pointee type.
    #[inline]
    pub fn pointee_type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the [`core::any::type_name`] of the concrete pointee type.
    #[inline]
    pub fn pointee_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Attempts to downcast the pointee to the concrete type `U`.
    ///
    /// Returns `None` if the pointee was stored with a different concrete
    /// type.
    #[inline]
    pub fn downcast_ref<U: 'static>(&self) -> Option<&U> {
        if self.pointee_type_id() == TypeId::of::<U>() {
            // SAFETY: We just checked that the type IDs match.
            Some(unsafe { self.downcast_ref_unchecked::<U>() })
        } else {
            None
        }
    }

    /// Attempts to downcast the pointee to the concrete type `U`, mutably.
    ///
    /// Returns `None` if the pointee was stored with a different concrete
    /// type.
    #[inline]
    pub fn downcast_mut<U: 'static>(&mut self) -> Option<&mut U> {
        if self.pointee_type_id() == TypeId::of::<U>() {
            // SAFETY: We just checked that the type IDs match.
            Some(unsafe { self.downcast_mut_unchecked::<U>() })
        } else {
            None
        }
    }

    /// Downcasts the pointee to the concrete type `U` without checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointee is actually of type `U` (can be verified by calling
    ///    [`pointee_type_id`] first).
    ///
    /// [`pointee_type_id`]: RawPoly::pointee_type_id
    #[inline]
    pub unsafe fn downcast_ref_unchecked<U: 'static>(&self) -> &U {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.pointee_type_id(), TypeId::of::<U>());

        // SAFETY: The data half of the pointer addresses a live, aligned `U`
        // by the invariants of this type together with the caller's guarantee
        // that `U` is the concrete pointee type. The lifetime is bound to the
        // shared borrow of `self`.
        unsafe { self.ptr.cast::<U>().as_ref() }
    }

    /// Mutably downcasts the pointee to the concrete type `U` without
    /// checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointee is actually of type `U` (can be verified by calling
    ///    [`pointee_type_id`] first).
    ///
    /// [`pointee_type_id`]: RawPoly::pointee_type_id
    #[inline]
    pub unsafe fn downcast_mut_unchecked<U: 'static>(&mut self) -> &mut U {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.pointee_type_id(), TypeId::of::<U>());

        // SAFETY: Same as `downcast_ref_unchecked`, and ownership is
        // exclusive with the lifetime bound to the exclusive borrow of
        // `self`.
        unsafe { self.ptr.cast::<U>().as_mut() }
    }
}

impl<T> RawPoly<T> {
    /// Creates a new [`RawPoly`] whose interface type equals the concrete
    /// type.
    ///
    /// This is the degenerate identity coercion: the pointee is a `T` and is
    /// viewed as a `T`.
    #[inline]
    pub fn from_value(value: T) -> Self
    where
        T: Clone + 'static,
    {
        let ptr: NonNull<T> = NonNull::from(Box::leak(Box::new(value)));

        Self {
            ptr,
            vtable: PolyVtable::new::<T>(),
            _marker: PhantomData,
        }
    }

    /// Relabels the static interface type from `T` to `S` while the pointee
    /// and its vtable are carried over unchanged.
    ///
    /// Only available when `T` is sized: the only coercions that can produce
    /// a sized interface type are identity coercions, so the stored concrete
    /// type is known to be `T` itself, and the `interface` witness proves
    /// that `T` coerces to `S`. Interface types the pointee does not coerce
    /// to are rejected at compile time because no witness for them exists.
    #[inline]
    pub fn relabel<S: ?Sized, F>(self, interface: Coercion<T, S, F>) -> RawPoly<S>
    where
        F: FnOnce(*const T) -> *const S,
    {
        // Field extraction without running `Drop`; ownership of the pointee
        // moves into the relabeled value.
        let this = ManuallyDrop::new(self);
        let ptr: NonNull<S> = this.ptr.unsize(interface);

        RawPoly {
            ptr,
            vtable: this.vtable,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Drop for RawPoly<T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY:
        // 1. The vtable matches the concrete pointee type by the invariants of
        //    this type.
        // 2. The data half of the pointer comes from a `Box<U>` allocation
        //    (guaranteed by the constructors).
        // 3. The pointee is initialized and has not previously been dropped as
        //    guaranteed by the invariants on this type. We are correctly
        //    transferring ownership here and the pointer is not used
        //    afterwards, as we are in the drop function.
        unsafe {
            self.vtable.drop_pointee(self.ptr.cast::<()>());
        }
    }
}

// SAFETY: `RawPoly<T>` owns its pointee exclusively, exactly like a `Box<T>`.
// Whatever concrete type is stored was proven to coerce to `T` when the value
// was constructed, so it satisfies every auto-trait bound that `T` carries,
// and sending the value to another thread is as safe as sending a `Box<T>`.
unsafe impl<T: ?Sized + Send> Send for RawPoly<T> {}

// SAFETY: Shared access to the pointee only ever happens through `&T`, so the
// same reasoning as for the `Send` implementation applies.
unsafe impl<T: ?Sized + Sync> Sync for RawPoly<T> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::fmt::Debug;

    use super::*;

    #[test]
    fn test_raw_poly_size() {
        // Pointer plus vtable reference, nothing more.
        assert_eq!(
            core::mem::size_of::<RawPoly<i32>>(),
            2 * core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<RawPoly<dyn Debug>>(),
            3 * core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Option<RawPoly<i32>>>(),
            core::mem::size_of::<RawPoly<i32>>()
        );
    }

    #[test]
    fn test_from_value_round_trip() {
        let raw = RawPoly::from_value(41_i32);
        assert_eq!(*raw.as_ref(), 41);
        assert_eq!(raw.pointee_type_id(), TypeId::of::<i32>());
    }

    #[test]
    fn test_new_erases_concrete_type() {
        let raw: RawPoly<dyn Debug> =
            RawPoly::new(String::from("erased"), Coercion!(to dyn Debug));
        assert_eq!(raw.pointee_type_id(), TypeId::of::<String>());
        assert!(raw.pointee_type_name().contains("String"));
        assert_eq!(raw.downcast_ref::<String>().unwrap(), "erased");
        assert!(raw.downcast_ref::<i32>().is_none());
    }

    #[test]
    fn test_clone_value_is_deep() {
        let raw: RawPoly<dyn Debug> =
            RawPoly::new(String::from("deep"), Coercion!(to dyn Debug));
        let copy = raw.clone_value();

        assert_eq!(copy.pointee_type_id(), raw.pointee_type_id());
        assert_eq!(copy.downcast_ref::<String>().unwrap(), "deep");
        assert!(!core::ptr::addr_eq(raw.as_ref(), copy.as_ref()));
    }

    #[test]
    fn test_mutation_through_as_mut() {
        let mut raw = RawPoly::from_value(String::from("a"));
        raw.as_mut().push('b');
        assert_eq!(raw.as_ref(), "ab");

        *raw.downcast_mut::<String>().unwrap() = String::from("c");
        assert_eq!(raw.as_ref(), "c");
        assert!(raw.downcast_mut::<i32>().is_none());
    }

    #[test]
    fn test_relabel_preserves_pointee() {
        let raw = RawPoly::from_value(String::from("relabel"));
        let relabeled: RawPoly<dyn Debug> = raw.relabel(Coercion!(to dyn Debug));

        assert_eq!(relabeled.pointee_type_id(), TypeId::of::<String>());
        assert_eq!(relabeled.downcast_ref::<String>().unwrap(), "relabel");
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_impl_all!(RawPoly<String>: Send, Sync);
        static_assertions::assert_impl_all!(RawPoly<dyn Debug + Send + Sync>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawPoly<dyn Debug>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawPoly<*const ()>: Send, Sync);
    }
}
