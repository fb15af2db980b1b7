use core::any::TypeId;

use clonebox_internals::RawPoly;
use unsize::Coercion;

/// A polymorphic value with deep-copy semantics and no slicing.
///
/// A `PolymorphicValue<T>` owns exactly one heap object whose *static*
/// interface type is `T` — typically a trait object like `dyn Shape` — while
/// its *dynamic* type may be any implementor, chosen at run time and fixed at
/// construction. Cloning reproduces that exact concrete type through a
/// type-erased clone handle captured when the value was first stored, so the
/// wrapper's own code never needs to know the concrete type to copy it.
///
/// The wrapper itself carries no virtual machinery beyond the captured
/// handle: dereferencing yields `&T`/`&mut T` directly, and any virtual
/// behavior defined on `T` dispatches normally to the concrete type.
///
/// # Valueless state
///
/// Default construction and [`take`](PolymorphicValue::take) produce a
/// valueless wrapper. Dereferencing one panics (the documented checked
/// policy — see the crate docs); [`get`](PolymorphicValue::get) and
/// [`get_mut`](PolymorphicValue::get_mut) are the non-panicking accessors.
///
/// # Examples
///
/// ```
/// use clonebox::{Coercion, PolymorphicValue};
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(Clone)]
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Shape for Circle {
///     fn area(&self) -> f64 {
///         core::f64::consts::PI * self.radius * self.radius
///     }
/// }
///
/// let shape: PolymorphicValue<dyn Shape> =
///     PolymorphicValue::new(Circle { radius: 1.0 }, Coercion!(to dyn Shape));
/// let copy = shape.clone();
///
/// // The copy is a full Circle, not a sliced-down `dyn Shape`.
/// assert!(copy.is::<Circle>());
/// assert_eq!(copy.area(), shape.area());
/// ```
pub struct PolymorphicValue<T: ?Sized> {
    /// The owned, type-erased storage.
    ///
    /// `None` if and only if the wrapper is valueless. All pairing invariants
    /// between the interface pointer and the clone handle live inside
    /// [`RawPoly`].
    raw: Option<RawPoly<T>>,
}

impl<T: ?Sized> PolymorphicValue<T> {
    /// Allocates a new `PolymorphicValue` owning `value`.
    ///
    /// The `interface` witness performs the coercion from the concrete type
    /// `U` to the interface type `T`; construct it at the call site with
    /// [`Coercion!`]. Concrete types that do not implement the interface are
    /// rejected at compile time, because no witness for them exists.
    ///
    /// This is the single point where the concrete type is fixed: the clone
    /// handle for `U` is captured here and every later copy reproduces a `U`
    /// through it.
    ///
    /// [`Coercion!`]: crate::Coercion
    #[must_use]
    pub fn new<U, F>(value: U, interface: Coercion<U, T, F>) -> Self
    where
        U: Clone + 'static,
        F: FnOnce(*const U) -> *const T,
    {
        Self {
            raw: Some(RawPoly::new(value, interface)),
        }
    }

    /// Creates a valueless `PolymorphicValue`. No allocation is performed.
    #[must_use]
    pub fn empty() -> Self {
        Self { raw: None }
    }

    /// Returns `true` if the wrapper currently owns a pointee.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.raw.is_some()
    }

    /// Returns a reference to the pointee through the interface type `T`, or
    /// `None` if the wrapper is valueless.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.raw.as_ref().map(RawPoly::as_ref)
    }

    /// Returns a mutable reference to the pointee through the interface type
    /// `T`, or `None` if the wrapper is valueless.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.raw.as_mut().map(RawPoly::as_mut)
    }

    /// Moves the contents out into a new wrapper, leaving `self` valueless.
    ///
    /// Constant time, no allocation, never invokes the pointee's copy logic,
    /// cannot fail. Both pointee and clone handle move together, so the
    /// dynamic type travels with the value.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
        }
    }

    /// Returns the [`TypeId`] of the concrete pointee type, or `None` if the
    /// wrapper is valueless.
    #[must_use]
    pub fn dynamic_type_id(&self) -> Option<TypeId> {
        self.raw.as_ref().map(RawPoly::pointee_type_id)
    }

    /// Returns the [`core::any::type_name`] of the concrete pointee type, or
    /// `None` if the wrapper is valueless.
    #[must_use]
    pub fn dynamic_type_name(&self) -> Option<&'static str> {
        self.raw.as_ref().map(RawPoly::pointee_type_name)
    }

    /// Returns `true` if the pointee's concrete type is exactly `U`.
    ///
    /// A valueless wrapper holds no concrete type, so this returns `false`.
    #[must_use]
    pub fn is<U: 'static>(&self) -> bool {
        self.dynamic_type_id() == Some(TypeId::of::<U>())
    }

    /// Attempts to downcast the pointee to its concrete type `U`.
    ///
    /// Returns `None` if the wrapper is valueless or holds a different
    /// concrete type.
    #[must_use]
    pub fn downcast_ref<U: 'static>(&self) -> Option<&U> {
        self.raw.as_ref().and_then(|raw| raw.downcast_ref::<U>())
    }

    /// Attempts to downcast the pointee to its concrete type `U`, mutably.
    ///
    /// Returns `None` if the wrapper is valueless or holds a different
    /// concrete type.
    #[must_use]
    pub fn downcast_mut<U: 'static>(&mut self) -> Option<&mut U> {
        self.raw.as_mut().and_then(|raw| raw.downcast_mut::<U>())
    }
}

impl<T> PolymorphicValue<T> {
    /// Creates a new `PolymorphicValue` whose interface type equals the
    /// concrete type.
    ///
    /// This is the degenerate case of [`new`](PolymorphicValue::new) with the
    /// identity coercion, useful when the value starts out concrete and is
    /// relabeled to an interface later via
    /// [`coerce`](PolymorphicValue::coerce).
    #[must_use]
    pub fn from_value(value: T) -> Self
    where
        T: Clone + 'static,
    {
        Self {
            raw: Some(RawPoly::from_value(value)),
        }
    }

    /// Converts this wrapper into one with the wider static interface `S`,
    /// carrying pointee and clone handle over unchanged.
    ///
    /// This is the converting construction between compatible wrapper types:
    /// only the static label changes, the dynamic type and the handle remain
    /// exactly as they were fixed at construction, so copies made after the
    /// conversion still reproduce the original concrete type. Interface types
    /// the pointee does not coerce to are rejected at compile time.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::fmt::Debug;
    ///
    /// use clonebox::{Coercion, PolymorphicValue};
    ///
    /// let concrete: PolymorphicValue<String> =
    ///     PolymorphicValue::from_value(String::from("widen me"));
    /// let widened: PolymorphicValue<dyn Debug> = concrete.coerce(Coercion!(to dyn Debug));
    ///
    /// assert!(widened.is::<String>());
    /// ```
    #[must_use]
    pub fn coerce<S: ?Sized, F>(self, interface: Coercion<T, S, F>) -> PolymorphicValue<S>
    where
        F: FnOnce(*const T) -> *const S,
    {
        PolymorphicValue {
            raw: self.raw.map(|raw| raw.relabel(interface)),
        }
    }
}

impl<T: ?Sized> Clone for PolymorphicValue<T> {
    /// Deep copies the wrapper through the clone handle captured at
    /// construction.
    ///
    /// A valueless wrapper clones to a valueless wrapper without allocating.
    /// Otherwise the new pointee has the exact dynamic type of the original;
    /// a panic from the concrete type's copy logic propagates with no partial
    /// object visible and nothing leaked.
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.as_ref().map(RawPoly::clone_value),
        }
    }

    /// Replaces `self` with a deep copy of `source`.
    ///
    /// Strong exception guarantee: the copy is built into a temporary before
    /// `self` is touched, so if the pointee's copy logic panics, `self` is
    /// left exactly as it was before the call.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        core::mem::swap(self, &mut copy);
    }
}

impl<T: ?Sized> Default for PolymorphicValue<T> {
    /// Creates a valueless wrapper, equivalent to
    /// [`empty`](PolymorphicValue::empty).
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> core::ops::Deref for PolymorphicValue<T> {
    type Target = T;

    /// Const-propagating access to the pointee through the interface type
    /// `T`: a shared borrow of the wrapper only ever yields a shared borrow
    /// of the pointee.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is valueless (the documented checked policy).
    fn deref(&self) -> &T {
        self.get()
            .expect("dereferenced a valueless PolymorphicValue")
    }
}

impl<T: ?Sized> core::ops::DerefMut for PolymorphicValue<T> {
    /// Mutable access to the pointee, obtainable only through a mutable
    /// borrow of the wrapper.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is valueless (the documented checked policy).
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
            .expect("dereferenced a valueless PolymorphicValue")
    }
}

impl<T: ?Sized> core::fmt::Debug for PolymorphicValue<T>
where
    T: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("PolymorphicValue").field(&value).finish(),
            None => f.write_str("PolymorphicValue(valueless)"),
        }
    }
}
