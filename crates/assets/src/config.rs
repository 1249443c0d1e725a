use crate::AssetError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkscene_common::{Color, Transform};
use walkscene_kernel::particles::MAX_PARTICLES;
use walkscene_kernel::{LocomotionParams, PositionalEmitter, SmokeParams};

/// First-person camera setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Initial yaw in degrees; -90 looks down -Z.
    pub yaw_deg: f32,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Multiplier on pointer-look rotation.
    pub pointer_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 5.0),
            yaw_deg: -90.0,
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            pointer_speed: 0.5,
        }
    }
}

/// Textured ground plane centred on the world origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundConfig {
    pub size: f32,
    pub texture: PathBuf,
    /// How many times the texture tiles across the plane.
    pub repeat: f32,
    /// Flat colour used in place of the texture.
    pub tint: Color,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            texture: PathBuf::from("Assets/dirt.jpg"),
            repeat: 50.0,
            tint: Color {
                r: 115.0 / 255.0,
                g: 84.0 / 255.0,
                b: 56.0 / 255.0,
            },
        }
    }
}

/// Positional audio attached to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub track: PathBuf,
    /// Start playback on the first click that locks the pointer.
    pub autoplay: bool,
    pub emitter: PositionalEmitter,
}

/// A decorative glTF model placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub path: PathBuf,
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub yaw: f32,
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioConfig>,
}

impl ModelConfig {
    pub fn transform(&self) -> Transform {
        Transform::from_placement(self.position, self.yaw, self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    pub ambient: LightConfig,
    pub directional: LightConfig,
    /// Directional light shines from this point towards the origin.
    pub directional_position: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: LightConfig {
                color: Color::WHITE,
                intensity: 1.0,
            },
            directional: LightConfig {
                color: Color::WHITE,
                intensity: 1.0,
            },
            directional_position: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// Smoke emitter: simulation parameters plus point appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmokeConfig {
    #[serde(flatten)]
    pub params: SmokeParams,
    /// Where the particle cloud is placed in the world. Added to every
    /// simulated position at draw time only.
    #[serde(default = "default_smoke_offset")]
    pub offset: Vec3,
    pub color: Color,
    pub size: f32,
    pub opacity: f32,
    pub additive: bool,
}

fn default_smoke_offset() -> Vec3 {
    Vec3::new(18.0, 3.0, 2.0)
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            params: SmokeParams::default(),
            offset: default_smoke_offset(),
            color: Color {
                r: 59.0 / 255.0,
                g: 57.0 / 255.0,
                b: 59.0 / 255.0,
            },
            size: 0.7,
            opacity: 0.9,
            additive: true,
        }
    }
}

/// The whole declarative scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub locomotion: LocomotionParams,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub smoke: SmokeConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Preset::Showcase.config()
    }
}

/// Built-in scene variants. They share the core and differ only in audio
/// autoplay and light intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Showcase,
    Ambient,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Showcase, Preset::Ambient];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Showcase => "showcase",
            Preset::Ambient => "ambient",
        }
    }

    pub fn config(self) -> SceneConfig {
        let (autoplay, ambient, directional) = match self {
            Preset::Showcase => (true, 1.0, 1.0),
            Preset::Ambient => (false, 0.6, 0.4),
        };

        let mut lighting = LightingConfig::default();
        lighting.ambient.intensity = ambient;
        lighting.directional.intensity = directional;

        SceneConfig {
            camera: CameraConfig::default(),
            locomotion: LocomotionParams::default(),
            ground: GroundConfig::default(),
            models: vec![
                ModelConfig {
                    name: "mountain".into(),
                    path: PathBuf::from("Assets/mountain.glb"),
                    position: Vec3::new(50.0, -0.1, 0.0),
                    yaw: 349.0,
                    scale: 20.0,
                    audio: None,
                },
                ModelConfig {
                    name: "boombox".into(),
                    path: PathBuf::from("Assets/BoomBox.glb"),
                    position: Vec3::new(37.0, 0.0, 2.0),
                    yaw: 185.0,
                    scale: 1.0,
                    audio: Some(AudioConfig {
                        track: PathBuf::from("Assets/music.mp3"),
                        autoplay,
                        emitter: PositionalEmitter::default(),
                    }),
                },
            ],
            lighting,
            smoke: SmokeConfig::default(),
        }
    }
}

impl FromStr for Preset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AssetError::UnknownPreset(s.to_string()))
    }
}

impl SceneConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, AssetError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, AssetError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load and validate a YAML scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "scene config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    /// Load `path`, or fall back to `preset` with a warning if it cannot be
    /// read or is invalid.
    pub fn load_or_preset(path: Option<&Path>, preset: Preset) -> Self {
        let Some(path) = path else {
            return preset.config();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "failed to load scene config {}: {e}; using {} preset",
                    path.display(),
                    preset.name()
                );
                preset.config()
            }
        }
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        let fail = |msg: String| Err(AssetError::InvalidConfig(msg));
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return fail(format!(
                "camera clip planes must satisfy 0 < near < far (near={}, far={})",
                cam.near, cam.far
            ));
        }
        if !(cam.fov_deg > 0.0 && cam.fov_deg < 180.0) {
            return fail(format!("camera fov must be in (0, 180): {}", cam.fov_deg));
        }
        if cam.pointer_speed < 0.0 {
            return fail(format!(
                "pointer speed must not be negative: {}",
                cam.pointer_speed
            ));
        }
        let loco = &self.locomotion;
        if !(loco.damping.is_finite() && loco.acceleration.is_finite()) {
            return fail(format!("locomotion parameters must be finite: {loco:?}"));
        }
        if self.locomotion.damping <= 0.0 || self.locomotion.acceleration < 0.0 {
            return fail(format!(
                "locomotion needs damping > 0 and acceleration >= 0: {:?}",
                self.locomotion
            ));
        }
        if self.ground.size <= 0.0 || self.ground.repeat <= 0.0 {
            return fail("ground size and repeat must be positive".into());
        }
        let smoke = &self.smoke;
        if !(smoke.params.origin.is_finite() && smoke.offset.is_finite()) {
            return fail("smoke origin and offset must be finite".into());
        }
        if smoke.params.count > MAX_PARTICLES {
            return fail(format!(
                "smoke count {} exceeds the limit of {MAX_PARTICLES}",
                smoke.params.count
            ));
        }
        if !(0.0..=1.0).contains(&self.smoke.opacity) {
            return fail(format!("smoke opacity must be in [0, 1]: {}", self.smoke.opacity));
        }
        if self.smoke.size <= 0.0 {
            return fail(format!("smoke size must be positive: {}", self.smoke.size));
        }
        for model in &self.models {
            if model.scale <= 0.0 {
                return fail(format!("model {} has non-positive scale", model.name));
            }
            if let Some(audio) = &model.audio {
                let e = &audio.emitter;
                if e.ref_distance <= 0.0 || e.cone_outer_deg < e.cone_inner_deg {
                    return fail(format!(
                        "model {} has an invalid audio emitter: {e:?}",
                        model.name
                    ));
                }
            }
        }
        Ok(())
    }

    /// The model carrying a positional audio source, if any.
    pub fn audio_model(&self) -> Option<(&ModelConfig, &AudioConfig)> {
        self.models
            .iter()
            .find_map(|m| m.audio.as_ref().map(|a| (m, a)))
    }
}
