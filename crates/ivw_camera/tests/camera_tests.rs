//! Lazy-cache behaviour of cameras, alone and behind a property

use ivw_camera::prelude::*;
use ivw_property::{PropertyObject, PropertyOwner};

fn scenario_camera() -> Camera {
    Camera::perspective(60.0, 1.0)
        .with_look(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y)
        .with_clip(0.01, 10000.0)
}

#[test]
fn test_end_to_end_fovy_change() {
    let mut camera = scenario_camera();
    let expected = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.01, 10000.0);
    let cached = camera.projection_matrix();
    assert!(cached.abs_diff_eq(expected, 1e-6));

    camera.set_fovy(90.0).expect("Should set fovy on a perspective camera");
    let updated = camera.projection_matrix();
    assert_ne!(updated, cached);
    let expected = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.01, 10000.0);
    assert!(updated.abs_diff_eq(expected, 1e-6));
}

#[test]
fn test_double_invalidate_single_recompute() {
    let mut camera = scenario_camera();
    camera.projection_matrix();
    camera.set_near_plane_dist(0.1);
    camera.set_near_plane_dist(0.2);
    camera.projection_matrix();
    camera.projection_matrix();
    assert_eq!(camera.projection_cache().recompute_count(), 2);
}

#[test]
fn test_projection_never_stale() {
    let mut camera = scenario_camera();
    let steps: [(f32, f32, f32, f32); 5] = [
        (45.0, 1.0, 0.1, 100.0),
        (45.0, 1.5, 0.1, 100.0),
        (30.0, 1.5, 0.5, 100.0),
        (30.0, 1.5, 0.5, 20.0),
        (120.0, 0.5, 1.0, 5.0),
    ];
    for (i, (fovy, aspect, near, far)) in steps.into_iter().enumerate() {
        camera.set_fovy(fovy).expect("Should set fovy");
        camera.set_aspect_ratio(aspect);
        camera.set_near_plane_dist(near);
        camera.set_far_plane_dist(far);
        if i % 2 == 0 {
            camera.projection_matrix();
        }
        let expected = Mat4::perspective_rh_gl(fovy.to_radians(), aspect, near, far);
        assert!(camera.projection_matrix().abs_diff_eq(expected, 1e-5));
        let inverse = camera.inverse_projection_matrix();
        assert!((inverse * expected).abs_diff_eq(Mat4::IDENTITY, 1e-3));
    }
}

#[test]
fn test_camera_property_invalidates_processor_owner() {
    let owner = PropertyOwner::new("renderer");
    let prop = CameraProperty::new(
        "camera",
        "Camera",
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
        Vec3::Y,
    )
    .expect("Should build camera property");
    owner.add_property(&prop).expect("Should add camera property");

    prop.fov().set(30.0).expect("Should set fov");
    assert!(!owner.is_valid());
    assert_eq!(prop.camera().fovy(), Some(30.0));

    let found = owner
        .property_by_path("camera.fov")
        .expect("Should resolve camera.fov");
    assert_eq!(found.display_name(), "FOV");
}

#[test]
fn test_camera_property_document_round_trip() {
    let prop = CameraProperty::new(
        "camera",
        "Camera",
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
        Vec3::Y,
    )
    .expect("Should build camera property");
    prop.camera_type()
        .set_selected_identifier("OrthographicCamera")
        .expect("Should select orthographic");
    prop.near().set(0.25).expect("Should set near");
    prop.look_from().set(Vec3::new(4.0, 0.0, 0.0)).expect("Should set look from");
    let doc = prop.serialize().expect("Should serialize");

    let copy = CameraProperty::new(
        "camera",
        "Camera",
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
        Vec3::Y,
    )
    .expect("Should build camera property");
    copy.deserialize(&doc).expect("Should deserialize");
    let camera = copy.camera();
    assert_eq!(camera.kind(), CameraKind::Orthographic);
    assert_eq!(camera.near_plane_dist(), 0.25);
    assert_eq!(camera.look_from(), Vec3::new(4.0, 0.0, 0.0));
}

#[test]
fn test_config_builds_equivalent_camera() {
    let camera = scenario_camera();
    let config = CameraConfig::from(&camera);
    let rebuilt = config.build();
    assert_eq!(rebuilt, camera);
    assert_eq!(rebuilt.projection_matrix(), camera.projection_matrix());
}
