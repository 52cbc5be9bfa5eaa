//! Inspect Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. First command line argument: `ivw-inspect my.toml`
//! 2. Environment variable: `IVW_INSPECT_CONFIG=my.toml`
//! 3. `inspect.toml` in the working directory
//! 4. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [pipeline]
//! format = "UINT8"   # any format name, e.g. FLOAT32, Vec3INT16
//! count = 64
//! scale = 3.5
//! passes = 4
//!
//! [camera]
//! look_from = [0.0, 0.0, 5.0]
//! near = 0.1
//! far = 100.0
//!
//! [camera.projection]
//! type = "Perspective"
//! fovy = 45.0
//! aspect = 1.0
//! ```

use crate::error::Result;
use ivw_camera::CameraConfig;
use ivw_format::DataFormatId;
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "IVW_INSPECT_CONFIG";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "inspect.toml";

/// What the source generates and how many passes to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Element format of the generated buffer
    pub format: DataFormatId,
    /// Number of elements
    pub count: usize,
    /// Element `i` holds `i * scale`
    pub scale: f64,
    /// Evaluation passes; a property is changed between passes
    pub passes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            format: DataFormatId::Float32,
            count: 16,
            scale: 1.0,
            passes: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub pipeline: PipelineConfig,
    pub camera: CameraConfig,
    /// Where the configuration was loaded from
    #[serde(skip)]
    pub config_path: Option<String>,
}

impl InspectConfig {
    /// Load from the first source that exists and parses
    pub fn load() -> Self {
        let mut candidates = Vec::new();
        if let Some(arg) = std::env::args().nth(1) {
            candidates.push(arg);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                candidates.push(path);
            }
        }
        candidates.push(DEFAULT_CONFIG_FILE.to_string());

        for path in candidates {
            match Self::load_from_file(&path) {
                Ok(mut config) => {
                    log::info!("Loaded config from {}", path);
                    config.config_path = Some(path);
                    return config;
                }
                Err(e) => log::debug!("Skipping config {}: {}", path, e),
            }
        }
        log::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn print_summary(&self) {
        log::info!("Inspect Configuration:");
        log::info!(
            "  Pipeline: {} x {} (scale {}), {} pass(es)",
            self.pipeline.count,
            self.pipeline.format,
            self.pipeline.scale,
            self.pipeline.passes
        );
        log::info!(
            "  Camera: {:?}, near {}, far {}",
            self.camera.projection.kind(),
            self.camera.near,
            self.camera.far
        );
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path);
        }
    }
}
