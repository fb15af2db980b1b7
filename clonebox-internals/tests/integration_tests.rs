//! Integration tests for the clonebox-internals crate.
//!
//! These tests exercise the type-erased storage through its public surface
//! only: construction with a witnessed coercion, deep cloning through the
//! captured vtable, interface relabeling, downcasting, and drop bookkeeping.

use std::{
    any::TypeId,
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use clonebox_internals::RawPoly;
use unsize::Coercion;

/// A small open interface with two distinct implementors, so the tests can
/// verify that cloning never collapses the dynamic type.
trait Shape: fmt::Debug {
    fn name(&self) -> &'static str;
    fn area(&self) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
struct Circle {
    radius: f64,
}

impl Shape for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn area(&self) -> f64 {
        core::f64::consts::PI * self.radius * self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Rectangle {
    width: f64,
    height: f64,
}

impl Shape for Rectangle {
    fn name(&self) -> &'static str {
        "rectangle"
    }

    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Counts live instances so tests can observe drops of type-erased pointees.
static LIVE: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct Tracked {
    label: &'static str,
}

impl Tracked {
    fn new(label: &'static str) -> Self {
        LIVE.fetch_add(1, Ordering::SeqCst);
        Tracked { label }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(self.label)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.fetch_sub(1, Ordering::SeqCst);
    }
}

#[test]
fn test_construction_and_dispatch() {
    let circle: RawPoly<dyn Shape> = RawPoly::new(Circle { radius: 1.0 }, Coercion!(to dyn Shape));
    let rect: RawPoly<dyn Shape> = RawPoly::new(
        Rectangle {
            width: 2.0,
            height: 3.0,
        },
        Coercion!(to dyn Shape),
    );

    // Virtual dispatch lands on the concrete type.
    assert_eq!(circle.as_ref().name(), "circle");
    assert_eq!(rect.as_ref().name(), "rectangle");
    assert_eq!(rect.as_ref().area(), 6.0);

    assert_eq!(circle.pointee_type_id(), TypeId::of::<Circle>());
    assert_eq!(rect.pointee_type_id(), TypeId::of::<Rectangle>());
}

#[test]
fn test_clone_preserves_dynamic_type() {
    let shapes: [RawPoly<dyn Shape>; 2] = [
        RawPoly::new(Circle { radius: 2.0 }, Coercion!(to dyn Shape)),
        RawPoly::new(
            Rectangle {
                width: 4.0,
                height: 5.0,
            },
            Coercion!(to dyn Shape),
        ),
    ];

    for original in &shapes {
        let copy = original.clone_value();
        assert_eq!(copy.pointee_type_id(), original.pointee_type_id());
        assert_eq!(copy.pointee_type_name(), original.pointee_type_name());
        assert_eq!(copy.as_ref().name(), original.as_ref().name());
        assert_eq!(copy.as_ref().area(), original.as_ref().area());
        assert!(!core::ptr::addr_eq(original.as_ref(), copy.as_ref()));
    }
}

#[test]
fn test_clone_of_clone_still_preserves_dynamic_type() {
    let original: RawPoly<dyn Shape> =
        RawPoly::new(Circle { radius: 3.0 }, Coercion!(to dyn Shape));

    let mut current = original.clone_value();
    for _ in 0..4 {
        current = current.clone_value();
    }

    assert_eq!(current.pointee_type_id(), TypeId::of::<Circle>());
    assert_eq!(current.downcast_ref::<Circle>().unwrap().radius, 3.0);
}

#[test]
fn test_clones_are_independent() {
    let mut original: RawPoly<dyn Shape> =
        RawPoly::new(Circle { radius: 1.0 }, Coercion!(to dyn Shape));
    let copy = original.clone_value();

    original.downcast_mut::<Circle>().unwrap().radius = 9.0;

    assert_eq!(original.downcast_ref::<Circle>().unwrap().radius, 9.0);
    assert_eq!(copy.downcast_ref::<Circle>().unwrap().radius, 1.0);
}

#[test]
fn test_relabel_keeps_pointee_and_handle() {
    let concrete: RawPoly<Circle> = RawPoly::from_value(Circle { radius: 2.5 });
    let erased: RawPoly<dyn Shape> = concrete.relabel(Coercion!(to dyn Shape));

    assert_eq!(erased.as_ref().name(), "circle");
    assert_eq!(erased.pointee_type_id(), TypeId::of::<Circle>());

    // Cloning after relabeling still goes through the handle captured at the
    // original construction.
    let copy = erased.clone_value();
    assert_eq!(copy.downcast_ref::<Circle>().unwrap().radius, 2.5);
}

#[test]
fn test_downcast_checked_and_unchecked() {
    let raw: RawPoly<dyn Shape> = RawPoly::new(
        Rectangle {
            width: 1.0,
            height: 2.0,
        },
        Coercion!(to dyn Shape),
    );

    assert!(raw.downcast_ref::<Circle>().is_none());
    let rect = raw.downcast_ref::<Rectangle>().unwrap();
    assert_eq!(
        rect,
        &Rectangle {
            width: 1.0,
            height: 2.0
        }
    );

    // SAFETY: The pointee was just verified to be a `Rectangle`.
    let rect = unsafe { raw.downcast_ref_unchecked::<Rectangle>() };
    assert_eq!(rect.width, 1.0);
}

#[test]
fn test_drop_runs_concrete_destructor() {
    let raw: RawPoly<dyn fmt::Debug> = RawPoly::new(Tracked::new("a"), Coercion!(to dyn fmt::Debug));
    let copy = raw.clone_value();
    assert_eq!(LIVE.load(Ordering::SeqCst), 2);

    drop(raw);
    assert_eq!(LIVE.load(Ordering::SeqCst), 1);
    assert_eq!(copy.downcast_ref::<Tracked>().unwrap().label, "a");

    drop(copy);
    assert_eq!(LIVE.load(Ordering::SeqCst), 0);
}
