//! Copy and delete strategies for [`IndirectValue`].
//!
//! This module provides the traits that let an [`IndirectValue`] customize
//! how its pointee is duplicated and released, plus the [`Box`]-backed
//! defaults that almost every use site wants.
//!
//! A copier and a deleter always travel as a pair: whatever allocation the
//! copier (or the initial construction) produces, the paired deleter must be
//! able to release. The default pair, [`CloneCopier`] and [`BoxDeleter`],
//! round-trips through [`Box`] on both sides.
//!
//! [`IndirectValue`]: crate::IndirectValue

use alloc::boxed::Box;
use core::ptr::NonNull;

/// Strategy for duplicating the pointee of an
/// [`IndirectValue`](crate::IndirectValue).
///
/// # When to Implement
///
/// You typically don't need to implement this trait: [`CloneCopier`] covers
/// every `T: Clone`. Implement it when duplication must go through something
/// other than `T`'s own [`Clone`], for example a pool allocator or a copy
/// routine with instrumentation.
///
/// # Contract
///
/// - The returned pointer owns a fresh, fully initialized heap copy of
///   `value`; the caller releases it with the paired [`Deleter`].
/// - `value` is not mutated or invalidated.
/// - If the copy logic panics, the panic must escape before any allocation
///   is made (or the allocation must be released first), so that nothing
///   leaks and no partially built object is reachable.
pub trait Copier<T> {
    /// Produces an independent heap copy of `value` and returns the owning
    /// pointer to it.
    fn copy_value(&self, value: &T) -> NonNull<T>;
}

/// Strategy for releasing the pointee of an
/// [`IndirectValue`](crate::IndirectValue).
///
/// # Contract
///
/// Implementations must not panic; they are run from [`Drop`] glue, where a
/// panic would abort or corrupt unwinding. This mirrors the expectation
/// placed on ordinary destructors.
pub trait Deleter<T> {
    /// Drops the pointee and releases its storage.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` owns an allocation produced by the paired [`Copier`] (or by
    ///    the construction path this deleter was installed with).
    /// 2. Ownership of `ptr` transfers to this call: the pointee has not been
    ///    released before, and the pointer is not used afterwards.
    unsafe fn delete_value(&self, ptr: NonNull<T>);
}

/// The default copier: duplicates the pointee with its own [`Clone`]
/// implementation into a fresh [`Box`] allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloneCopier;

impl<T: Clone> Copier<T> for CloneCopier {
    #[inline]
    fn copy_value(&self, value: &T) -> NonNull<T> {
        // The clone runs before the allocation, so a panicking `Clone`
        // escapes without leaking.
        NonNull::from(Box::leak(Box::new(value.clone())))
    }
}

/// The default deleter: releases the pointee as a [`Box`] allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxDeleter;

impl<T> Deleter<T> for BoxDeleter {
    #[inline]
    unsafe fn delete_value(&self, ptr: NonNull<T>) {
        // SAFETY: The pointer owns a `Box` allocation and ownership transfers
        // to this call, both guaranteed by the caller. That fulfills the
        // requirements of `Box::from_raw`.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        core::mem::drop(boxed);
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_default_pair_round_trip() {
        let copier = CloneCopier;
        let original = String::from("copy me");
        let ptr = copier.copy_value(&original);

        // SAFETY: `ptr` owns a live `Box<String>` produced by the copier.
        let copy: &String = unsafe { ptr.as_ref() };
        assert_eq!(copy, "copy me");
        assert!(!core::ptr::eq(copy, &original));

        // SAFETY: `ptr` was produced by `CloneCopier` (a `Box` allocation),
        // is released exactly once and never used again.
        unsafe {
            BoxDeleter.delete_value(ptr);
        }
    }

    #[test]
    fn test_strategies_are_zero_sized() {
        assert_eq!(core::mem::size_of::<CloneCopier>(), 0);
        assert_eq!(core::mem::size_of::<BoxDeleter>(), 0);
    }
}
