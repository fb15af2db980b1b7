//! Vtable for type-erased clone and drop operations.
//!
//! This module contains the [`PolyVtable`] which enables cloning and dropping
//! a stored value when its concrete type `U` has been erased. The vtable
//! stores function pointers that dispatch to the correct typed
//! implementations.
//!
//! This module encapsulates the fields of [`PolyVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the concrete type of
//! the pointee it is paired with in a [`RawPoly`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`PolyVtable::new`], which pairs the function pointers with
//! a specific type `U` at compile time. Exactly one instantiation exists per
//! concrete `U`; it is selected once, when a `U` value is first stored, and a
//! clone produced through the vtable is always paired with the same vtable
//! again, so the association can never drift across copies.
//!
//! [`RawPoly`]: crate::poly::raw::RawPoly

use alloc::boxed::Box;
use core::{any::TypeId, ptr::NonNull};

/// Vtable for type-erased clone and drop operations.
///
/// Contains function pointers for performing operations on a stored value
/// without knowing its concrete type at compile time.
///
/// # Safety Invariant
///
/// The fields `clone_pointee` and `drop_pointee` are guaranteed to point to
/// the functions defined below instantiated with the concrete type `U` that
/// was used to create this [`PolyVtable`].
pub(crate) struct PolyVtable {
    /// Gets the [`TypeId`] of the concrete type that was used to create this
    /// [`PolyVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the concrete type that was used
    /// to create this [`PolyVtable`].
    type_name: fn() -> &'static str,
    /// Clones the `U` behind the pointer into a fresh `Box<U>` allocation and
    /// returns the thin pointer to it.
    clone_pointee: unsafe fn(NonNull<()>) -> NonNull<()>,
    /// Drops the `Box<U>` instance addressed by this pointer.
    drop_pointee: unsafe fn(NonNull<()>),
}

impl PolyVtable {
    /// Creates a new [`PolyVtable`] for the concrete type `U`.
    pub(super) const fn new<U: Clone + 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<U>,
                type_name: core::any::type_name::<U>,
                clone_pointee: clone_pointee::<U>,
                drop_pointee: drop_pointee::<U>,
            }
        }
    }

    /// Gets the [`TypeId`] of the concrete type that was used to create this
    /// [`PolyVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the concrete type that was used
    /// to create this [`PolyVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Clones the pointee behind `ptr` into a fresh heap allocation using the
    /// [`Clone`] implementation of the concrete type used when creating this
    /// [`PolyVtable`], and returns the thin pointer to the new allocation.
    ///
    /// The pointee behind `ptr` is not mutated or invalidated. If the clone
    /// implementation panics, the panic propagates before any allocation has
    /// taken place, so nothing is built and nothing leaks.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the concrete type stored
    ///    behind `ptr`.
    /// 2. `ptr` must point to a live, properly aligned instance of that type.
    #[inline]
    pub(super) unsafe fn clone_pointee(&self, ptr: NonNull<()>) -> NonNull<()> {
        // SAFETY: We know that `self.clone_pointee` points to the function
        // `clone_pointee::<U>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.clone_pointee)(ptr) }
    }

    /// Drops the `Box<U>` instance addressed by `ptr`, where `U` is the
    /// concrete type used when creating this [`PolyVtable`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`PolyVtable`] must be a vtable for the concrete type stored
    ///    behind `ptr`.
    /// 2. The pointer comes from a `Box<U>` via [`Box::into_raw`].
    /// 3. This method drops the `Box<U>`, so the caller must ensure that the
    ///    pointee has not previously been dropped, that it is able to
    ///    transfer ownership of the pointer, and that it will not use the
    ///    pointer after calling this method.
    #[inline]
    pub(super) unsafe fn drop_pointee(&self, ptr: NonNull<()>) {
        // SAFETY: We know that `self.drop_pointee` points to the function
        // `drop_pointee::<U>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe { (self.drop_pointee)(ptr) }
    }
}

/// Clones the `U` behind `ptr` into a fresh `Box<U>` allocation.
///
/// The clone runs before the allocation, so a panicking [`Clone`]
/// implementation escapes without leaking memory or leaving a partially
/// built value reachable.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `U` matches the concrete type stored behind `ptr`.
/// 2. `ptr` must point to a live, properly aligned instance of `U`.
unsafe fn clone_pointee<U: Clone + 'static>(ptr: NonNull<()>) -> NonNull<()> {
    // SAFETY: The pointer has the correct type and points to a live instance,
    // both guaranteed by the caller. Shared access is allowed because this
    // function never mutates the pointee.
    let value: &U = unsafe { ptr.cast::<U>().as_ref() };
    let copy: Box<U> = Box::new(value.clone());
    NonNull::from(Box::leak(copy)).cast::<()>()
}

/// Drops the `Box<U>` instance addressed by `ptr`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The type `U` matches the concrete type stored behind `ptr`.
/// 2. The pointer comes from a `Box<U>` via [`Box::into_raw`].
/// 3. This method drops the `Box<U>`, so the caller must ensure that the
///    pointee has not previously been dropped, that it is able to transfer
///    ownership of the pointer, and that it will not use the pointer after
///    calling this method.
unsafe fn drop_pointee<U: 'static>(ptr: NonNull<()>) {
    let ptr: *mut U = ptr.cast::<U>().as_ptr();
    // SAFETY: The pointer has the correct type and came from `Box::into_raw`,
    // both guaranteed by the caller, which fulfills the requirements of
    // `Box::from_raw`.
    let boxed = unsafe { Box::from_raw(ptr) };
    core::mem::drop(boxed);
}
