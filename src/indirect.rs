use alloc::boxed::Box;
use core::ptr::NonNull;

use crate::strategy::{BoxDeleter, CloneCopier, Copier, Deleter};

/// An indirectly allocated value with the semantics of a plain value member.
///
/// An `IndirectValue<T>` owns exactly one heap-allocated `T` — or nothing at
/// all, the *valueless* state. Unlike a raw owning pointer it behaves like
/// the value it stores:
///
/// - cloning deep copies the pointee,
/// - borrowing propagates mutability (`&IndirectValue<T>` only ever hands out
///   `&T`, `&mut IndirectValue<T>` hands out `&mut T`),
/// - dropping releases the pointee,
/// - comparisons, ordering and hashing forward to the pointee.
///
/// The two extra type parameters select the duplication and release
/// strategies; the defaults round-trip through [`Box`] and `T`'s own
/// [`Clone`]. Custom strategies enter through
/// [`from_raw_parts`](IndirectValue::from_raw_parts).
///
/// # Valueless state
///
/// Default construction and [`take`](IndirectValue::take) produce a valueless
/// wrapper. Dereferencing one panics (the documented checked policy — see the
/// crate docs); [`get`](IndirectValue::get) and
/// [`get_mut`](IndirectValue::get_mut) are the non-panicking accessors.
///
/// # Examples
///
/// ```
/// use clonebox::IndirectValue;
///
/// struct Engine {
///     // Heavy, cold configuration kept off the hot path, yet `Engine`
///     // remains plainly clonable.
///     config: IndirectValue<Vec<String>>,
/// }
///
/// let a = IndirectValue::new(vec![String::from("verbose")]);
/// let mut b = a.clone();
/// b.push(String::from("trace"));
///
/// assert_eq!(a.len(), 1);
/// assert_eq!(b.len(), 2);
/// ```
pub struct IndirectValue<T, C = CloneCopier, D = BoxDeleter>
where
    D: Deleter<T>,
{
    /// Pointer to the owned pointee.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. `None` if and only if the wrapper is valueless.
    /// 2. When `Some`, the pointer owns a live, initialized `T` in an
    ///    allocation that `deleter` is able to release and that was produced
    ///    either by `copier`, by the [`Box`]-based construction path, or by
    ///    the caller of [`IndirectValue::from_raw_parts`].
    ptr: Option<NonNull<T>>,
    /// The strategy used to duplicate the pointee on clone.
    copier: C,
    /// The strategy used to release the pointee on drop.
    deleter: D,
}

impl<T> IndirectValue<T> {
    /// Allocates a new `IndirectValue` owning `value`, using the default
    /// [`Box`]-based strategies.
    ///
    /// # Examples
    ///
    /// ```
    /// use clonebox::IndirectValue;
    ///
    /// let value = IndirectValue::new(42);
    /// assert_eq!(*value, 42);
    /// ```
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(Box::new(value)))),
            copier: CloneCopier,
            deleter: BoxDeleter,
        }
    }
}

impl<T, C, D> IndirectValue<T, C, D>
where
    D: Deleter<T>,
{
    /// Creates a valueless `IndirectValue`. No allocation is performed.
    ///
    /// # Examples
    ///
    /// ```
    /// use clonebox::IndirectValue;
    ///
    /// let value: IndirectValue<i32> = IndirectValue::empty();
    /// assert!(!value.has_value());
    /// ```
    #[must_use]
    pub fn empty() -> Self
    where
        C: Default,
        D: Default,
    {
        Self {
            ptr: None,
            copier: C::default(),
            deleter: D::default(),
        }
    }

    /// Adopts an existing allocation together with the strategies that manage
    /// it.
    ///
    /// This is the entry point for custom [`Copier`]/[`Deleter`] pairs, the
    /// analog of handing a raw owning pointer plus its management functions
    /// to the wrapper.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` owns a live, initialized `T`.
    /// 2. The allocation behind `ptr` can be released by `deleter`, and
    ///    allocations produced by `copier` can be released by `deleter` as
    ///    well.
    /// 3. Ownership of `ptr` transfers to the wrapper: it is not released
    ///    elsewhere and not used again by the caller.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, copier: C, deleter: D) -> Self {
        Self {
            ptr: Some(ptr),
            copier,
            deleter,
        }
    }

    /// Returns `true` if the wrapper currently owns a pointee.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.ptr.is_some()
    }

    /// Returns a reference to the pointee, or `None` if the wrapper is
    /// valueless.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.ptr.map(|ptr| {
            // SAFETY: The pointer owns a live, initialized `T` by the
            // invariants of this type. The returned lifetime is bound to the
            // shared borrow of `self`, and no mutation can happen through a
            // shared borrow.
            unsafe { ptr.as_ref() }
        })
    }

    /// Returns a mutable reference to the pointee, or `None` if the wrapper
    /// is valueless.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.ptr.map(|mut ptr| {
            // SAFETY: The pointer owns a live, initialized `T` by the
            // invariants of this type. Ownership is exclusive and the
            // returned lifetime is bound to the exclusive borrow of `self`,
            // so no aliasing access can exist.
            unsafe { ptr.as_mut() }
        })
    }

    /// Moves the contents out into a new wrapper, leaving `self` valueless.
    ///
    /// This is the observable moved-from operation: constant time, no
    /// allocation, never invokes the pointee's copy logic, cannot fail. The
    /// strategies stay usable on both sides, which is why they must be
    /// [`Clone`].
    ///
    /// # Examples
    ///
    /// ```
    /// use clonebox::IndirectValue;
    ///
    /// let mut a = IndirectValue::new(String::from("moved"));
    /// let b = a.take();
    ///
    /// assert!(!a.has_value());
    /// assert_eq!(*b, "moved");
    /// ```
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        C: Clone,
        D: Clone,
    {
        Self {
            ptr: self.ptr.take(),
            copier: self.copier.clone(),
            deleter: self.deleter.clone(),
        }
    }
}

impl<T, C> IndirectValue<T, C, BoxDeleter> {
    /// Consumes the wrapper and returns the pointee, or `None` if the wrapper
    /// is valueless.
    ///
    /// Only available with the default [`BoxDeleter`], whose pairing
    /// invariant guarantees the allocation is an ordinary [`Box`].
    #[must_use]
    pub fn into_inner(mut self) -> Option<T> {
        self.ptr.take().map(|ptr| {
            // SAFETY: With `D = BoxDeleter` the pairing invariant of the
            // `ptr` field guarantees a live `Box` allocation, and we just
            // took sole ownership of it out of the wrapper.
            let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
            *boxed
        })
    }
}

impl<T, C, D> Clone for IndirectValue<T, C, D>
where
    C: Copier<T> + Clone,
    D: Deleter<T> + Clone,
{
    /// Deep copies the wrapper.
    ///
    /// A valueless wrapper clones to a valueless wrapper without allocating.
    /// Otherwise the configured [`Copier`] produces an independent copy of
    /// the pointee; if it panics, the panic propagates with no partial object
    /// visible and nothing leaked.
    fn clone(&self) -> Self {
        let ptr = self.ptr.map(|ptr| {
            // SAFETY: The pointer owns a live, initialized `T` by the
            // invariants of this type; the copier only reads through the
            // reference.
            let value = unsafe { ptr.as_ref() };
            self.copier.copy_value(value)
        });

        Self {
            ptr,
            copier: self.copier.clone(),
            deleter: self.deleter.clone(),
        }
    }

    /// Replaces `self` with a deep copy of `source`.
    ///
    /// Strong exception guarantee: the copy is built into a temporary before
    /// `self` is touched, so if the copier panics, `self` is left exactly as
    /// it was before the call. The previous pointee is released afterwards
    /// through its own deleter.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        core::mem::swap(self, &mut copy);
    }
}

impl<T, C, D> Default for IndirectValue<T, C, D>
where
    C: Default,
    D: Deleter<T> + Default,
{
    /// Creates a valueless wrapper, equivalent to
    /// [`empty`](IndirectValue::empty).
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for IndirectValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T, C, D> core::ops::Deref for IndirectValue<T, C, D>
where
    D: Deleter<T>,
{
    type Target = T;

    /// Const-propagating access to the pointee: a shared borrow of the
    /// wrapper only ever yields a shared borrow of the pointee.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is valueless (the documented checked policy).
    fn deref(&self) -> &T {
        self.get().expect("dereferenced a valueless IndirectValue")
    }
}

impl<T, C, D> core::ops::DerefMut for IndirectValue<T, C, D>
where
    D: Deleter<T>,
{
    /// Mutable access to the pointee, obtainable only through a mutable
    /// borrow of the wrapper.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is valueless (the documented checked policy).
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
            .expect("dereferenced a valueless IndirectValue")
    }
}

impl<T, C, D> Drop for IndirectValue<T, C, D>
where
    D: Deleter<T>,
{
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            // SAFETY: The pointer owns an allocation releasable by `deleter`
            // (invariant of the `ptr` field), it has not been released
            // before, and it is not used afterwards as we are in the drop
            // function.
            unsafe {
                self.deleter.delete_value(ptr);
            }
        }
    }
}

impl<T, C, D> core::fmt::Debug for IndirectValue<T, C, D>
where
    T: core::fmt::Debug,
    D: Deleter<T>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("IndirectValue").field(value).finish(),
            None => f.write_str("IndirectValue(valueless)"),
        }
    }
}

impl<T, C, D> PartialEq for IndirectValue<T, C, D>
where
    T: PartialEq,
    D: Deleter<T>,
{
    /// Forwards to the pointee. Two valueless wrappers compare equal; a
    /// valueless wrapper never equals a non-valueless one.
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T, C, D> Eq for IndirectValue<T, C, D>
where
    T: Eq,
    D: Deleter<T>,
{
}

impl<T, C, D> PartialOrd for IndirectValue<T, C, D>
where
    T: PartialOrd,
    D: Deleter<T>,
{
    /// Forwards to the pointee; a valueless wrapper orders before any
    /// non-valueless one.
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        self.get().partial_cmp(&other.get())
    }
}

impl<T, C, D> Ord for IndirectValue<T, C, D>
where
    T: Ord,
    D: Deleter<T>,
{
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.get().cmp(&other.get())
    }
}

impl<T, C, D> core::hash::Hash for IndirectValue<T, C, D>
where
    T: core::hash::Hash,
    D: Deleter<T>,
{
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

// SAFETY: `IndirectValue` owns its pointee exclusively, exactly like a
// `Box<T>` plus the two strategy values. `NonNull` suppresses the auto
// traits, so the `Box`-shaped implementations are spelled out here.
unsafe impl<T, C, D> Send for IndirectValue<T, C, D>
where
    T: Send,
    C: Send,
    D: Deleter<T> + Send,
{
}

// SAFETY: Shared access to the pointee only ever happens through `&T`, so the
// same reasoning as for the `Send` implementation applies.
unsafe impl<T, C, D> Sync for IndirectValue<T, C, D>
where
    T: Sync,
    C: Sync,
    D: Deleter<T> + Sync,
{
}
