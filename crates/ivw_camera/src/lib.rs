//! # ivw_camera - Lazy Cameras
//!
//! View and projection matrices are computed on demand and cached together
//! with their inverses. Mutators only flag the affected matrix:
//!
//! ```text
//!   set_fovy(90) ──► proj.invalid = true
//!   projection_matrix() ──► invalid? ──yes──► compute, cache, clear
//!                              └──no───► cached value
//! ```
//!
//! [`CameraProperty`] wraps a camera in a composite property so it can be
//! edited, observed and serialized like any other property.

pub mod camera;
pub mod config;
pub mod error;
pub mod lazy;
pub mod property;

pub use camera::{frustum_rh_gl, Camera, CameraKind, Projection};
pub use config::CameraConfig;
pub use error::{CameraError, Result};
pub use lazy::LazyMatrix;
pub use property::CameraProperty;

pub mod prelude {
    pub use crate::camera::{Camera, CameraKind, Projection};
    pub use crate::config::CameraConfig;
    pub use crate::error::{CameraError, Result};
    pub use crate::lazy::LazyMatrix;
    pub use crate::property::CameraProperty;
    pub use glam::{Mat4, Vec2, Vec3, Vec4};
}
