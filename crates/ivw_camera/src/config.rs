//! Serializable camera settings

use crate::camera::{Camera, Projection};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Plain-data description of a [`Camera`], for config files and documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub look_from: Vec3,
    pub look_to: Vec3,
    pub look_up: Vec3,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::from(&Camera::default())
    }
}

impl CameraConfig {
    pub fn build(&self) -> Camera {
        Camera::new(self.projection)
            .with_look(self.look_from, self.look_to, self.look_up)
            .with_clip(self.near, self.far)
    }
}

impl From<&Camera> for CameraConfig {
    fn from(camera: &Camera) -> Self {
        Self {
            look_from: camera.look_from(),
            look_to: camera.look_to(),
            look_up: camera.look_up(),
            near: camera.near_plane_dist(),
            far: camera.far_plane_dist(),
            projection: *camera.projection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraKind;
    use glam::Vec4;

    #[test]
    fn test_default_matches_default_camera() {
        let config = CameraConfig::default();
        assert_eq!(config.build(), Camera::default());
        assert_eq!(config.near, 0.01);
        assert_eq!(config.far, 10000.0);
    }

    #[test]
    fn test_json_round_trip() {
        let camera = Camera::orthographic(Vec4::new(-5.0, 5.0, -2.0, 2.0))
            .with_look(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Z);
        let config = CameraConfig::from(&camera);
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"type\":\"Orthographic\""));
        let back: CameraConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.build(), camera);
    }

    #[test]
    fn test_toml_with_missing_fields() {
        let text = r#"
            look_from = [0.0, 5.0, 5.0]

            [projection]
            type = "Perspective"
            fovy = 45.0
            aspect = 1.5
        "#;
        let config: CameraConfig = toml::from_str(text).unwrap();
        assert_eq!(config.look_from, Vec3::new(0.0, 5.0, 5.0));
        assert_eq!(config.look_to, Vec3::ZERO);
        let camera = config.build();
        assert_eq!(camera.kind(), CameraKind::Perspective);
        assert_eq!(camera.fovy(), Some(45.0));
    }
}
