//! Camera exposed as a composite property
//!
//! The child properties are the editable face of the camera. Each child's
//! observer pushes its value into the shared [`Camera`]; [`CameraProperty::set_camera`]
//! goes the other way and writes a camera back into the children.

use crate::camera::{Camera, CameraKind};
use crate::error::Result;
use glam::{Vec2, Vec3, Vec4};
use ivw_core::InvalidationLevel;
use ivw_property::{
    CompositeProperty, OptionEntry, OptionProperty, OwnerLink, Property, PropertyObject,
    PropertyOwner,
};
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Composite property owning a [`Camera`]
#[derive(Clone)]
pub struct CameraProperty {
    composite: CompositeProperty,
    camera: Rc<RefCell<Camera>>,
    camera_type: OptionProperty<CameraKind>,
    children: Children,
    fit_to_basis: Property<bool>,
}

impl std::fmt::Debug for CameraProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraProperty")
            .field("identifier", &self.composite.identifier())
            .field("camera", &*self.camera.borrow())
            .finish()
    }
}

/// Child properties a camera is rebuilt from.
///
/// `fov` only applies to perspective cameras, `frustum` to orthographic and
/// skewed ones, `frustum_skew_offset` only to skewed ones.
#[derive(Clone)]
struct Children {
    look_from: Property<Vec3>,
    look_to: Property<Vec3>,
    look_up: Property<Vec3>,
    fov: Property<f32>,
    aspect_ratio: Property<f32>,
    near: Property<f32>,
    far: Property<f32>,
    frustum: Property<Vec4>,
    frustum_skew_offset: Property<Vec2>,
}

impl Children {
    fn build(&self, kind: CameraKind) -> Camera {
        let mut camera = Camera::of_kind(kind)
            .with_look(self.look_from.get(), self.look_to.get(), self.look_up.get())
            .with_clip(self.near.get(), self.far.get());
        camera.set_aspect_ratio(self.aspect_ratio.get());
        // A frustum fixes the aspect ratio, so it goes last
        let configured = match kind {
            CameraKind::Perspective => camera.set_fovy(self.fov.get()),
            CameraKind::Orthographic => camera.set_frustum(self.frustum.get()),
            CameraKind::SkewedPerspective => camera
                .set_frustum(self.frustum.get())
                .and_then(|()| camera.set_frustum_skew_offset(self.frustum_skew_offset.get())),
        };
        if let Err(e) = configured {
            log::warn!("Building {} from properties: {}", kind, e);
        }
        camera
    }
}

impl CameraProperty {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        look_from: Vec3,
        look_to: Vec3,
        look_up: Vec3,
    ) -> Result<Self> {
        let composite = CompositeProperty::new(identifier, display_name);
        let camera_type = OptionProperty::new(
            "cameraType",
            "Camera Type",
            CameraKind::ALL
                .iter()
                .map(|k| OptionEntry::new(k.identifier(), k.display_name(), *k))
                .collect(),
        );
        let children = Children {
            look_from: Property::new("lookFrom", "Look from", look_from),
            look_to: Property::new("lookTo", "Look to", look_to),
            look_up: Property::new("lookUp", "Look up", look_up),
            fov: Property::new("fov", "FOV", 60.0f32).with_range(10.0, 180.0),
            aspect_ratio: Property::new("aspectRatio", "Aspect Ratio", 1.0f32)
                .with_range(0.01, 100.0),
            near: Property::new("near", "Near Plane", 0.1f32).with_range(0.001, 10.0),
            far: Property::new("far", "Far Plane", 100.0f32).with_range(1.0, 1000.0),
            frustum: Property::new("frustum", "Frustum", Vec4::new(-10.0, 10.0, -10.0, 10.0)),
            frustum_skew_offset: Property::new(
                "frustumSkewOffset",
                "Frustum Skew Offset",
                Vec2::ZERO,
            ),
        };
        let fit_to_basis = Property::new("fitToBasis", "Adjust camera on data change", true)
            .with_invalidation_level(InvalidationLevel::Valid);

        let camera = Rc::new(RefCell::new(children.build(CameraKind::Perspective)));

        {
            let (camera, children) = (Rc::clone(&camera), children.clone());
            camera_type.on_change(move |index| {
                let Some(kind) = CameraKind::ALL.get(*index).copied() else {
                    return;
                };
                if camera.borrow().kind() != kind {
                    log::debug!("Switching camera to {}", kind);
                    *camera.borrow_mut() = children.build(kind);
                }
            });
        }
        Self::push(&children.look_from, &camera, |c, v| c.set_look_from(*v));
        Self::push(&children.look_to, &camera, |c, v| c.set_look_to(*v));
        Self::push(&children.look_up, &camera, |c, v| c.set_look_up(*v));
        Self::push(&children.aspect_ratio, &camera, |c, v| c.set_aspect_ratio(*v));
        Self::push(&children.near, &camera, |c, v| c.set_near_plane_dist(*v));
        Self::push(&children.far, &camera, |c, v| c.set_far_plane_dist(*v));
        Self::push(&children.fov, &camera, |c, v| {
            if let Err(e) = c.set_fovy(*v) {
                log::trace!("Ignoring fov: {}", e);
            }
        });
        Self::push(&children.frustum, &camera, |c, v| {
            if let Err(e) = c.set_frustum(*v) {
                log::trace!("Ignoring frustum: {}", e);
            }
        });
        Self::push(&children.frustum_skew_offset, &camera, |c, v| {
            if let Err(e) = c.set_frustum_skew_offset(*v) {
                log::trace!("Ignoring frustum skew offset: {}", e);
            }
        });

        composite.add_property(&camera_type)?;
        composite.add_property(&children.look_from)?;
        composite.add_property(&children.look_to)?;
        composite.add_property(&children.look_up)?;
        composite.add_property(&children.fov)?;
        composite.add_property(&children.aspect_ratio)?;
        composite.add_property(&children.near)?;
        composite.add_property(&children.far)?;
        composite.add_property(&children.frustum)?;
        composite.add_property(&children.frustum_skew_offset)?;
        composite.add_property(&fit_to_basis)?;
        composite.set_current_state_as_default();

        Ok(Self {
            composite,
            camera,
            camera_type,
            children,
            fit_to_basis,
        })
    }

    fn push<T: ivw_property::PropertyValue>(
        property: &Property<T>,
        camera: &Rc<RefCell<Camera>>,
        apply: impl Fn(&mut Camera, &T) + 'static,
    ) {
        let camera = Rc::clone(camera);
        property.on_change(move |value| apply(&mut *camera.borrow_mut(), value));
    }

    /// Borrow the camera; do not set child properties while holding it
    pub fn camera(&self) -> Ref<'_, Camera> {
        self.camera.borrow()
    }

    /// Copy `camera` in, replacing the current one if it is of another kind,
    /// then write its parameters back into the child properties
    pub fn set_camera(&self, camera: &Camera) -> Result<()> {
        {
            let mut current = self.camera.borrow_mut();
            if !current.update(camera) {
                *current = camera.clone();
            }
        }
        self.camera_type.set_selected_value(&camera.kind())?;
        self.update_properties_from_camera()
    }

    fn update_properties_from_camera(&self) -> Result<()> {
        let camera = self.camera.borrow().clone();
        let children = &self.children;
        children.look_from.set(camera.look_from())?;
        children.look_to.set(camera.look_to())?;
        children.look_up.set(camera.look_up())?;
        if let Some(fovy) = camera.fovy() {
            children.fov.set(fovy)?;
        }
        children.aspect_ratio.set(camera.aspect_ratio())?;
        children.near.set(camera.near_plane_dist())?;
        children.far.set(camera.far_plane_dist())?;
        if let Some(frustum) = camera.frustum() {
            children.frustum.set(frustum)?;
        }
        if let Some(offset) = camera.frustum_skew_offset() {
            children.frustum_skew_offset.set(offset)?;
        }
        Ok(())
    }

    /// Rebuild the camera from the child properties as they are now
    fn rebuild_camera(&self) {
        let kind = self
            .camera_type
            .selected_value()
            .unwrap_or(CameraKind::Perspective);
        let camera = self.children.build(kind);
        *self.camera.borrow_mut() = camera;
    }

    pub fn set_look(&self, from: Vec3, to: Vec3, up: Vec3) -> Result<()> {
        self.children.look_from.set(from)?;
        self.children.look_to.set(to)?;
        self.children.look_up.set(up)?;
        Ok(())
    }

    /// Restore the default look-from, look-to and look-up
    pub fn reset_camera(&self) -> Result<()> {
        self.children.look_from.reset_to_default()?;
        self.children.look_to.reset_to_default()?;
        self.children.look_up.reset_to_default()?;
        Ok(())
    }

    pub fn composite(&self) -> &CompositeProperty {
        &self.composite
    }

    pub fn camera_type(&self) -> &OptionProperty<CameraKind> {
        &self.camera_type
    }

    pub fn look_from(&self) -> &Property<Vec3> {
        &self.children.look_from
    }

    pub fn look_to(&self) -> &Property<Vec3> {
        &self.children.look_to
    }

    pub fn look_up(&self) -> &Property<Vec3> {
        &self.children.look_up
    }

    pub fn fov(&self) -> &Property<f32> {
        &self.children.fov
    }

    pub fn aspect_ratio(&self) -> &Property<f32> {
        &self.children.aspect_ratio
    }

    pub fn near(&self) -> &Property<f32> {
        &self.children.near
    }

    pub fn far(&self) -> &Property<f32> {
        &self.children.far
    }

    pub fn frustum(&self) -> &Property<Vec4> {
        &self.children.frustum
    }

    pub fn frustum_skew_offset(&self) -> &Property<Vec2> {
        &self.children.frustum_skew_offset
    }

    pub fn fit_to_basis(&self) -> &Property<bool> {
        &self.fit_to_basis
    }
}

impl PropertyObject for CameraProperty {
    fn identifier(&self) -> &str {
        self.composite.identifier()
    }

    fn display_name(&self) -> String {
        PropertyObject::display_name(&self.composite)
    }

    fn class_identifier(&self) -> &'static str {
        "ivw.CameraProperty"
    }

    fn invalidation_level(&self) -> InvalidationLevel {
        PropertyObject::invalidation_level(&self.composite)
    }

    fn is_modified(&self) -> bool {
        self.composite.is_modified()
    }

    fn set_valid(&self) {
        self.composite.set_valid();
    }

    fn set_owner(&self, owner: Option<OwnerLink>) {
        self.composite.set_owner(owner);
    }

    fn reset_to_default(&self) -> ivw_property::Result<()> {
        self.composite.reset_to_default()
    }

    fn set_current_state_as_default(&self) {
        self.composite.set_current_state_as_default();
    }

    fn serialize(&self) -> ivw_property::Result<serde_json::Value> {
        self.composite.serialize()
    }

    // Children arrive in document order, so the camera is rebuilt once all
    // of them hold their restored values.
    fn deserialize(&self, document: &serde_json::Value) -> ivw_property::Result<()> {
        self.composite.deserialize(document)?;
        self.rebuild_camera();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_owner(&self) -> Option<&PropertyOwner> {
        Some(self.composite.owner())
    }
}
