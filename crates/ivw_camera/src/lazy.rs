//! Demand-driven matrix cache

use glam::Mat4;
use std::cell::Cell;

/// A matrix and its inverse, recomputed only when read after an invalidation.
///
/// Reads take `&self`; the cache lives in `Cell`s so a camera can be queried
/// through a shared reference.
#[derive(Debug, Clone)]
pub struct LazyMatrix {
    value: Cell<Mat4>,
    inverse: Cell<Mat4>,
    invalid: Cell<bool>,
    recomputes: Cell<u64>,
}

impl Default for LazyMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyMatrix {
    /// Starts invalid; the first read computes
    pub fn new() -> Self {
        Self {
            value: Cell::new(Mat4::IDENTITY),
            inverse: Cell::new(Mat4::IDENTITY),
            invalid: Cell::new(true),
            recomputes: Cell::new(0),
        }
    }

    pub fn invalidate(&self) {
        self.invalid.set(true);
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid.get()
    }

    /// Cached value, running `compute` first if invalid
    pub fn get(&self, compute: impl FnOnce() -> Mat4) -> Mat4 {
        if self.invalid.get() {
            let value = compute();
            self.value.set(value);
            self.inverse.set(value.inverse());
            self.invalid.set(false);
            self.recomputes.set(self.recomputes.get() + 1);
        }
        self.value.get()
    }

    /// Cached inverse, running `compute` first if invalid
    pub fn inverse(&self, compute: impl FnOnce() -> Mat4) -> Mat4 {
        self.get(compute);
        self.inverse.get()
    }

    /// Number of times `compute` has run
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.get()
    }
}
