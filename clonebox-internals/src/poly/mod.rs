//! Module containing the type-erased polymorphic value storage

mod raw;
mod vtable;

pub use self::raw::RawPoly;
