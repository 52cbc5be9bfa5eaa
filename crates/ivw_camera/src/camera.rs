//! Cameras
//!
//! A [`Camera`] is a plain value: common look/clip fields plus a
//! [`Projection`] variant. Mutators only mark the affected matrix invalid;
//! the next read recomputes it.

use crate::error::{CameraError, Result};
use crate::lazy::LazyMatrix;
use glam::{Mat4, Vec2, Vec3, Vec4};
use ivw_core::source_context;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Projection variant and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Projection {
    /// Symmetric perspective; `fovy` in degrees
    Perspective { fovy: f32, aspect: f32 },
    /// `frustum` is (left, right, bottom, top)
    Orthographic { frustum: Vec4 },
    /// Off-axis perspective: the near-plane `frustum` shifted by `offset`
    SkewedPerspective { frustum: Vec4, offset: Vec2 },
}

impl Default for Projection {
    fn default() -> Self {
        Self::default_for(CameraKind::Perspective)
    }
}

/// Tag of a [`Projection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraKind {
    Perspective,
    Orthographic,
    SkewedPerspective,
}

impl CameraKind {
    pub const ALL: [CameraKind; 3] = [
        CameraKind::Perspective,
        CameraKind::Orthographic,
        CameraKind::SkewedPerspective,
    ];

    /// Factory key
    pub fn identifier(self) -> &'static str {
        match self {
            CameraKind::Perspective => "PerspectiveCamera",
            CameraKind::Orthographic => "OrthographicCamera",
            CameraKind::SkewedPerspective => "SkewedPerspectiveCamera",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CameraKind::Perspective => "Perspective Camera",
            CameraKind::Orthographic => "Orthographic Camera",
            CameraKind::SkewedPerspective => "Skewed Perspective Camera",
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl Projection {
    pub fn default_for(kind: CameraKind) -> Self {
        match kind {
            CameraKind::Perspective => Projection::Perspective {
                fovy: 60.0,
                aspect: 1.0,
            },
            CameraKind::Orthographic => Projection::Orthographic {
                frustum: Vec4::new(-10.0, 10.0, -10.0, 10.0),
            },
            CameraKind::SkewedPerspective => Projection::SkewedPerspective {
                frustum: Vec4::new(-0.01, 0.01, -0.01, 0.01),
                offset: Vec2::ZERO,
            },
        }
    }

    pub fn kind(&self) -> CameraKind {
        match self {
            Projection::Perspective { .. } => CameraKind::Perspective,
            Projection::Orthographic { .. } => CameraKind::Orthographic,
            Projection::SkewedPerspective { .. } => CameraKind::SkewedPerspective,
        }
    }

    fn matrix(&self, near: f32, far: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fovy, aspect } => {
                Mat4::perspective_rh_gl(fovy.to_radians(), aspect, near, far)
            }
            Projection::Orthographic { frustum } => {
                Mat4::orthographic_rh_gl(frustum.x, frustum.y, frustum.z, frustum.w, near, far)
            }
            Projection::SkewedPerspective { frustum, offset } => frustum_rh_gl(
                frustum.x + offset.x,
                frustum.y + offset.x,
                frustum.z + offset.y,
                frustum.w + offset.y,
                near,
                far,
            ),
        }
    }
}

/// Off-axis perspective projection, right handed, clip z in [-1, 1]
pub fn frustum_rh_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// Look-at camera with lazily computed view and projection matrices
#[derive(Debug, Clone)]
pub struct Camera {
    look_from: Vec3,
    look_to: Vec3,
    look_up: Vec3,
    near: f32,
    far: f32,
    projection: Projection,
    view: LazyMatrix,
    proj: LazyMatrix,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Projection::default())
    }
}

impl PartialEq for Camera {
    fn eq(&self, other: &Self) -> bool {
        self.look_from == other.look_from
            && self.look_to == other.look_to
            && self.look_up == other.look_up
            && self.near == other.near
            && self.far == other.far
            && self.projection == other.projection
    }
}

impl Camera {
    /// Looking from (0, 0, 2) at the origin with +Y up, clip range 0.01..10000
    pub fn new(projection: Projection) -> Self {
        Self {
            look_from: Vec3::new(0.0, 0.0, 2.0),
            look_to: Vec3::ZERO,
            look_up: Vec3::Y,
            near: 0.01,
            far: 10000.0,
            projection,
            view: LazyMatrix::new(),
            proj: LazyMatrix::new(),
        }
    }

    pub fn perspective(fovy: f32, aspect: f32) -> Self {
        Self::new(Projection::Perspective { fovy, aspect })
    }

    pub fn orthographic(frustum: Vec4) -> Self {
        Self::new(Projection::Orthographic { frustum })
    }

    pub fn skewed_perspective(frustum: Vec4, offset: Vec2) -> Self {
        Self::new(Projection::SkewedPerspective { frustum, offset })
    }

    pub fn of_kind(kind: CameraKind) -> Self {
        Self::new(Projection::default_for(kind))
    }

    /// Set eye, target and up vector
    pub fn with_look(mut self, from: Vec3, to: Vec3, up: Vec3) -> Self {
        self.look_from = from;
        self.look_to = to;
        self.look_up = up;
        self.view.invalidate();
        self
    }

    /// Set near and far plane distances
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.proj.invalidate();
        self
    }

    pub fn kind(&self) -> CameraKind {
        self.projection.kind()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    pub fn look_to(&self) -> Vec3 {
        self.look_to
    }

    pub fn look_up(&self) -> Vec3 {
        self.look_up
    }

    /// Unit vector from eye to target
    pub fn direction(&self) -> Vec3 {
        (self.look_to - self.look_from).normalize_or_zero()
    }

    pub fn near_plane_dist(&self) -> f32 {
        self.near
    }

    pub fn far_plane_dist(&self) -> f32 {
        self.far
    }

    /// Vertical field of view in degrees, for perspective cameras
    pub fn fovy(&self) -> Option<f32> {
        match self.projection {
            Projection::Perspective { fovy, .. } => Some(fovy),
            _ => None,
        }
    }

    /// Width over height of the view volume
    pub fn aspect_ratio(&self) -> f32 {
        match self.projection {
            Projection::Perspective { aspect, .. } => aspect,
            Projection::Orthographic { frustum }
            | Projection::SkewedPerspective { frustum, .. } => {
                (frustum.y - frustum.x) / (frustum.w - frustum.z)
            }
        }
    }

    pub fn frustum(&self) -> Option<Vec4> {
        match self.projection {
            Projection::Perspective { .. } => None,
            Projection::Orthographic { frustum }
            | Projection::SkewedPerspective { frustum, .. } => {
                Some(frustum)
            }
        }
    }

    /// Near-plane shift of a skewed perspective camera
    pub fn frustum_skew_offset(&self) -> Option<Vec2> {
        match self.projection {
            Projection::SkewedPerspective { offset, .. } => Some(offset),
            _ => None,
        }
    }

    pub fn set_look_from(&mut self, from: Vec3) {
        self.look_from = from;
        self.view.invalidate();
    }

    pub fn set_look_to(&mut self, to: Vec3) {
        self.look_to = to;
        self.view.invalidate();
    }

    pub fn set_look_up(&mut self, up: Vec3) {
        self.look_up = up;
        self.view.invalidate();
    }

    pub fn set_near_plane_dist(&mut self, near: f32) {
        self.near = near;
        self.proj.invalidate();
    }

    pub fn set_far_plane_dist(&mut self, far: f32) {
        self.far = far;
        self.proj.invalidate();
    }

    fn unsupported(&self, parameter: &'static str) -> CameraError {
        CameraError::UnsupportedParameter {
            parameter,
            camera: self.kind().identifier(),
            context: source_context!(),
        }
    }

    /// Only perspective cameras have a field of view
    pub fn set_fovy(&mut self, degrees: f32) -> Result<()> {
        match &mut self.projection {
            Projection::Perspective { fovy, .. } => {
                *fovy = degrees;
                self.proj.invalidate();
                Ok(())
            }
            _ => Err(self.unsupported("fovy")),
        }
    }

    /// Frustum cameras keep their height and rescale the width around its center
    pub fn set_aspect_ratio(&mut self, ratio: f32) {
        match &mut self.projection {
            Projection::Perspective { aspect, .. } => *aspect = ratio,
            Projection::Orthographic { frustum }
            | Projection::SkewedPerspective { frustum, .. } => {
                let center = 0.5 * (frustum.x + frustum.y);
                let half_width = 0.5 * ratio * (frustum.w - frustum.z);
                frustum.x = center - half_width;
                frustum.y = center + half_width;
            }
        }
        self.proj.invalidate();
    }

    pub fn set_frustum(&mut self, value: Vec4) -> Result<()> {
        match &mut self.projection {
            Projection::Orthographic { frustum }
            | Projection::SkewedPerspective { frustum, .. } => {
                *frustum = value;
                self.proj.invalidate();
                Ok(())
            }
            Projection::Perspective { .. } => Err(self.unsupported("frustum")),
        }
    }

    pub fn set_frustum_skew_offset(&mut self, value: Vec2) -> Result<()> {
        match &mut self.projection {
            Projection::SkewedPerspective { offset, .. } => {
                *offset = value;
                self.proj.invalidate();
                Ok(())
            }
            _ => Err(self.unsupported("frustumSkewOffset")),
        }
    }

    /// Copy every parameter from `source` if it is the same kind of camera.
    /// Returns false, leaving `self` untouched, when the kinds differ.
    pub fn update(&mut self, source: &Camera) -> bool {
        if self.kind() != source.kind() {
            return false;
        }
        self.look_from = source.look_from;
        self.look_to = source.look_to;
        self.look_up = source.look_up;
        self.near = source.near;
        self.far = source.far;
        self.projection = source.projection;
        self.view.invalidate();
        self.proj.invalidate();
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
            .get(|| Mat4::look_at_rh(self.look_from, self.look_to, self.look_up))
    }

    pub fn inverse_view_matrix(&self) -> Mat4 {
        self.view
            .inverse(|| Mat4::look_at_rh(self.look_from, self.look_to, self.look_up))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj.get(|| self.projection.matrix(self.near, self.far))
    }

    pub fn inverse_projection_matrix(&self) -> Mat4 {
        self.proj
            .inverse(|| self.projection.matrix(self.near, self.far))
    }

    /// Map normalized device coordinates (each in [-1, 1]) to world space
    pub fn world_position_from_ndc(&self, ndc: Vec3) -> Vec3 {
        let eye = self.inverse_projection_matrix() * ndc.extend(1.0);
        let world = self.inverse_view_matrix() * eye;
        world.truncate() / world.w
    }

    pub fn view_cache(&self) -> &LazyMatrix {
        &self.view
    }

    pub fn projection_cache(&self) -> &LazyMatrix {
        &self.proj
    }
}
