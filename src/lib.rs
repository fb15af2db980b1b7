#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Deep-copying owning indirection for Rust.
//!
//! ## Overview
//!
//! This crate provides two wrapper types that give heap-allocated data the
//! copy, move, destroy and borrow semantics of an ordinary value member, so
//! the containing type needs no hand-written plumbing for either of two
//! recurring structural needs:
//!
//! - [`IndirectValue<T>`] owns exactly one heap object of a fixed, statically
//!   known type. Use it when an object is logically owned by, but stored
//!   indirectly from, its containing type: compilation firewalls, hot/cold
//!   struct layout, or self-size control. Copying an [`IndirectValue`] deep
//!   copies the pointee; borrowing propagates mutability exactly like a plain
//!   field.
//! - [`PolymorphicValue<T>`] owns exactly one heap object whose static
//!   interface type is fixed but whose dynamic type may be any implementor
//!   chosen at run time. Copying reproduces the exact concrete type — no
//!   slicing — even though the wrapper's own code never learns what that type
//!   is. The trick is a type-erased clone handle captured once, at
//!   construction, and propagated through every copy.
//!
//! Both types model **exclusive, non-shared ownership**. If you want shared
//! ownership, reach for [`Rc`]/[`Arc`]; these wrappers are deliberately not
//! that.
//!
//! ## Quick Example
//!
//! ```
//! use core::fmt::Debug;
//!
//! use clonebox::{Coercion, IndirectValue, PolymorphicValue};
//!
//! // A deep-copying boxed value.
//! let a = IndirectValue::new(vec![1, 2, 3]);
//! let mut b = a.clone();
//! b.push(4);
//! assert_eq!(*a, vec![1, 2, 3]);
//! assert_eq!(*b, vec![1, 2, 3, 4]);
//!
//! // A polymorphic value: the concrete type survives every copy.
//! let p: PolymorphicValue<dyn Debug> =
//!     PolymorphicValue::new(String::from("concrete"), Coercion!(to dyn Debug));
//! let q = p.clone();
//! assert!(q.is::<String>());
//! ```
//!
//! ## Valueless state and access policy
//!
//! Both wrappers have a *valueless* (empty) state, reached by default
//! construction or by moving the contents out with
//! [`take`](IndirectValue::take). Dereferencing a valueless wrapper is a
//! contract violation; this crate uses the **checked** policy uniformly:
//! [`Deref`](core::ops::Deref) and [`DerefMut`](core::ops::DerefMut) panic
//! with a fixed message, while [`get`](IndirectValue::get) and
//! [`get_mut`](IndirectValue::get_mut) return [`Option`] for callers that
//! want to handle emptiness themselves.
//!
//! ## Const propagation
//!
//! Even though the pointee is reached through a stored address, the
//! mutability of the *wrapper* borrow governs the mutability of access to
//! the *pointee*, exactly as if it were a plain value member. A shared borrow
//! of a wrapper cannot be used to mutate the pointee:
//!
//! ```compile_fail
//! use clonebox::IndirectValue;
//!
//! fn broken(value: &IndirectValue<Vec<i32>>) {
//!     value.push(1); // no `&mut self` reachable through `&IndirectValue`
//! }
//! ```
//!
//! ## Failure model
//!
//! There are no internal retries and no deferred errors; everything surfaces
//! synchronously at the call site:
//!
//! - Allocation failure follows the global allocation-error path, as with
//!   [`Box`].
//! - A panic from the pointee's copy logic propagates. Plain cloning builds
//!   nothing visible and leaks nothing; [`Clone::clone_from`] additionally
//!   gives the strong guarantee: the target is untouched if the copy panics.
//! - Destructors and [`Deleter`] implementations must not panic. This is a
//!   precondition on client types, not something the wrappers recover from.
//!
//! For implementation details of the type-erased clone handle, see the
//! [`clonebox-internals`] crate.
//!
//! [`clonebox-internals`]: clonebox_internals
//! [`Rc`]: alloc::rc::Rc
//! [`Arc`]: alloc::sync::Arc
//! [`Box`]: alloc::boxed::Box

extern crate alloc;

mod indirect;
mod poly;
pub mod prelude;
mod strategy;

pub use unsize::{CoerceUnsize, Coercion};

pub use crate::{
    indirect::IndirectValue,
    poly::PolymorphicValue,
    strategy::{BoxDeleter, CloneCopier, Copier, Deleter},
};
