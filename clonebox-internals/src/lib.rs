#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`clonebox`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased data structures and unsafe
//! operations that power the [`clonebox`] value-semantics library. It provides
//! the foundation for zero-cost type erasure through vtable-based dispatch.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`clonebox`] crate,
//! not this one.
//!
//! # Architecture
//!
//! The crate is organized around a single type hierarchy for polymorphic
//! values:
//!
//! - **[`poly`]**: Type-erased polymorphic value storage
//!   - [`RawPoly`]: Owned value with [`Box`]-based allocation, viewed through
//!     a fixed interface type while the concrete type is erased
//!   - [`PolyVtable`]: Function pointers for type-erased cloning and dropping,
//!     instantiated once per concrete stored type
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. When a value of concrete type `U` is stored behind an
//! interface type `T`, we must ensure that the vtable function pointers still
//! match the concrete type that actually lives in the allocation.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **Witnessed coercions**: The interface pointer is produced by applying an
//!   [`unsize::Coercion`] to the freshly boxed concrete value, so the pairing
//!   of pointer and vtable happens at exactly one place
//! - **Documented vtable contracts**: Each vtable method specifies exactly
//!   when it can be safely called
//!
//! See the [`poly`] module documentation for detailed explanations of how
//! these patterns are applied.
//!
//! [`clonebox`]: https://docs.rs/clonebox/latest/clonebox/
//! [`PolyVtable`]: poly::vtable::PolyVtable
//! [`Box`]: alloc::boxed::Box

extern crate alloc;

mod poly;

pub use poly::RawPoly;
