//! Convenience re-exports of the types and macros most uses need.
//!
//! ```
//! use clonebox::prelude::*;
//! ```

pub use unsize::{CoerceUnsize, Coercion};

pub use crate::{
    indirect::IndirectValue,
    poly::PolymorphicValue,
    strategy::{BoxDeleter, CloneCopier, Copier, Deleter},
};
