//! Scene configuration.
//!
//! Every value has a default matching the stock scene, so an empty document
//! (or no document at all) is a valid configuration. Colors are hex strings
//! and are parsed when the scene is built.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interaction::CameraConfig;
use crate::math::{parse_hex, parse_palette, Vec3};
use crate::morph::{ConeShape, MotionParams, PlacementPlan, RadiusBand, TreeBand};
use crate::particles::{DecorationRecipe, FieldRecipe, SparklesConfig, StarsConfig};

/// The lit shader has a fixed number of point-light slots
pub const MAX_POINT_LIGHTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Placement seed; `None` draws one at startup
    pub seed: Option<u64>,
    /// Translation applied to particles, decorations and trunk
    pub group_offset: GroupOffset,
    pub cone: ConeShape,
    pub particles: ParticlesConfig,
    pub decorations: DecorationsConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub post: PostConfig,
    pub ambient: AmbientConfig,
    pub floor: FloorConfig,
    pub trunk: TrunkConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupOffset(pub Vec3);

impl Default for GroupOffset {
    fn default() -> Self {
        Self(Vec3::new(0.0, -2.0, 0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    pub count: usize,
    pub scatter: RadiusBand,
    pub tree: TreeBand,
    pub motion: MotionParams,
    pub palette: Vec<String>,
    pub bright_chance: f32,
    pub bright_boost: f32,
    pub scale_min: f32,
    pub scale_range: f32,
    pub material: NeedleMaterial,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            scatter: RadiusBand::new(15.0, 30.0),
            tree: TreeBand::volume(-6.0, 8.0),
            motion: MotionParams::particles(),
            palette: ["#C0C0C0", "#FF007F", "#008000", "#00FFFF", "#FFFFFF"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bright_chance: 0.2,
            bright_boost: 2.0,
            scale_min: 0.2,
            scale_range: 0.5,
            material: NeedleMaterial::default(),
        }
    }
}

impl ParticlesConfig {
    pub fn recipe(&self, cone: &ConeShape) -> Result<FieldRecipe> {
        Ok(FieldRecipe {
            plan: PlacementPlan {
                scatter: self.scatter,
                cone: *cone,
                tree: self.tree,
            },
            palette: parse_palette(&self.palette)?,
            bright_chance: self.bright_chance,
            bright_boost: self.bright_boost,
            scale_min: self.scale_min,
            scale_range: self.scale_range,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedleMaterial {
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: String,
    pub emissive_intensity: f32,
}

impl Default for NeedleMaterial {
    fn default() -> Self {
        Self {
            metalness: 0.9,
            roughness: 0.2,
            emissive: "#ff007f".to_string(),
            emissive_intensity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationsConfig {
    pub count: usize,
    pub scatter: RadiusBand,
    pub tree: TreeBand,
    pub motion: MotionParams,
    pub palette: Vec<String>,
}

impl Default for DecorationsConfig {
    fn default() -> Self {
        Self {
            count: 30,
            scatter: RadiusBand::new(10.0, 20.0),
            tree: TreeBand::surface(-5.0, 9.0, 0.5),
            motion: MotionParams::decorations(),
            palette: ["#FF007F", "#00FFFF", "#FFFF00", "#C0C0C0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DecorationsConfig {
    pub fn recipe(&self, cone: &ConeShape) -> Result<DecorationRecipe> {
        Ok(DecorationRecipe {
            plan: PlacementPlan {
                scatter: self.scatter,
                cone: *cone,
                tree: self.tree,
            },
            palette: parse_palette(&self.palette)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLightConfig {
    pub color: String,
    pub position: Vec3,
    pub intensity: f32,
    /// Range cutoff; 0 means unlimited
    pub distance: f32,
    pub decay: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLightConfig {
    pub color: String,
    pub position: Vec3,
    pub target: Vec3,
    /// Cone half-angle in radians
    pub angle: f32,
    /// Share of the cone that fades out, 0..1
    pub penumbra: f32,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub background: String,
    pub fog_color: String,
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_color: String,
    pub ambient_intensity: f32,
    pub point_lights: Vec<PointLightConfig>,
    pub spot: Option<SpotLightConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            background: "#05020a".to_string(),
            fog_color: "#05020a".to_string(),
            fog_near: 10.0,
            fog_far: 50.0,
            ambient_color: "#4a00e0".to_string(),
            ambient_intensity: 0.5,
            point_lights: vec![
                PointLightConfig {
                    color: "#ff007f".to_string(),
                    position: Vec3::new(10.0, 10.0, 10.0),
                    intensity: 2.0,
                    distance: 50.0,
                    decay: 2.0,
                },
                PointLightConfig {
                    color: "#00ffcc".to_string(),
                    position: Vec3::new(-10.0, -5.0, -10.0),
                    intensity: 2.0,
                    distance: 50.0,
                    decay: 2.0,
                },
            ],
            spot: Some(SpotLightConfig {
                color: "#ffffff".to_string(),
                position: Vec3::new(0.0, 20.0, 0.0),
                target: Vec3::ZERO,
                angle: 0.5,
                penumbra: 1.0,
                intensity: 3.0,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
    /// Blur spread, 0..1
    pub bloom_radius: f32,
    pub noise_opacity: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub exposure: f32,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            bloom_threshold: 0.2,
            bloom_intensity: 1.5,
            bloom_radius: 0.6,
            noise_opacity: 0.05,
            vignette_offset: 0.1,
            vignette_darkness: 1.1,
            exposure: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub stars: StarsConfig,
    pub sparkles: SparklesConfig,
}

/// Wireframe floor plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: f32,
    pub segments: usize,
    pub y: f32,
    pub color: String,
    pub emissive: String,
    pub emissive_intensity: f32,
    pub opacity: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            segments: 20,
            y: -6.0,
            color: "#1a1a1a".to_string(),
            emissive: "#ff007f".to_string(),
            emissive_intensity: 0.2,
            opacity: 0.3,
        }
    }
}

/// Glowing core cylinder, shown only in tree mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkConfig {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub segments: usize,
    /// Center of the cylinder, inside the group
    pub position: Vec3,
    pub color: String,
    pub emissive: String,
    pub emissive_intensity: f32,
    pub opacity: f32,
}

impl Default for TrunkConfig {
    fn default() -> Self {
        Self {
            radius_top: 0.2,
            radius_bottom: 0.8,
            height: 12.0,
            segments: 16,
            position: Vec3::new(0.0, 1.0, 0.0),
            color: "#2f1a08".to_string(),
            emissive: "#ff007f".to_string(),
            emissive_intensity: 0.5,
            opacity: 0.8,
        }
    }
}

impl SceneConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SceneConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values the scene cannot be built from
    pub fn validate(&self) -> Result<()> {
        check_band("particles.scatter", &self.particles.scatter)?;
        check_band("decorations.scatter", &self.decorations.scatter)?;
        check_span("particles.tree", &self.particles.tree)?;
        check_span("decorations.tree", &self.decorations.tree)?;

        if self.cone.height <= 0.0 || self.cone.base_radius < 0.0 {
            return Err(Error::Config(format!(
                "cone needs positive height and non-negative radius, got {} / {}",
                self.cone.height, self.cone.base_radius
            )));
        }

        for (name, motion) in [
            ("particles.motion", &self.particles.motion),
            ("decorations.motion", &self.decorations.motion),
        ] {
            if motion.speed.is_nan() || motion.speed <= 0.0 {
                return Err(Error::Config(format!("{}.speed must be positive", name)));
            }
        }

        if !(0.0..=1.0).contains(&self.particles.bright_chance) {
            return Err(Error::Config(format!(
                "particles.bright_chance must be within [0, 1], got {}",
                self.particles.bright_chance
            )));
        }

        if self.lighting.point_lights.len() > MAX_POINT_LIGHTS {
            return Err(Error::Config(format!(
                "at most {} point lights are supported, got {}",
                MAX_POINT_LIGHTS,
                self.lighting.point_lights.len()
            )));
        }

        let camera = &self.camera;
        if camera.min_distance <= 0.0 || camera.min_distance > camera.max_distance {
            return Err(Error::Config(format!(
                "camera distance range [{}, {}] is empty",
                camera.min_distance, camera.max_distance
            )));
        }
        if camera.min_polar > camera.max_polar {
            return Err(Error::Config("camera polar range is empty".to_string()));
        }

        if self.floor.segments == 0 || self.trunk.segments < 3 {
            return Err(Error::Config("floor needs a segment and trunk at least 3".to_string()));
        }

        // Surface every bad color now rather than at build time
        parse_palette(&self.particles.palette)?;
        parse_palette(&self.decorations.palette)?;
        for color in self.colors() {
            parse_hex(color)?;
        }

        if self.particles.count == 0 {
            log::warn!("particle count is 0; the tree will be empty");
        }
        Ok(())
    }

    fn colors(&self) -> impl Iterator<Item = &str> {
        let lighting = &self.lighting;
        [
            lighting.background.as_str(),
            lighting.fog_color.as_str(),
            lighting.ambient_color.as_str(),
            self.particles.material.emissive.as_str(),
            self.ambient.sparkles.color.as_str(),
            self.floor.color.as_str(),
            self.floor.emissive.as_str(),
            self.trunk.color.as_str(),
            self.trunk.emissive.as_str(),
        ]
        .into_iter()
        .chain(lighting.point_lights.iter().map(|l| l.color.as_str()))
        .chain(lighting.spot.iter().map(|s| s.color.as_str()))
    }
}

fn check_band(name: &str, band: &RadiusBand) -> Result<()> {
    if band.min < 0.0 || band.min > band.max {
        return Err(Error::Config(format!(
            "{} radius band [{}, {}) is invalid",
            name, band.min, band.max
        )));
    }
    Ok(())
}

fn check_span(name: &str, band: &TreeBand) -> Result<()> {
    if band.y_min > band.y_max {
        return Err(Error::Config(format!(
            "{} span {}..{} is inverted",
            name, band.y_min, band.y_max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SceneConfig::from_yaml("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.particles.count, 4000);
        assert_eq!(config.decorations.count, 30);
        assert_eq!(config.group_offset.0, Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
seed: 42
particles:
  count: 2500
  scatter: { min: 12, max: 24 }
post:
  exposure: 1.0
"#;
        let config = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.particles.count, 2500);
        assert_eq!(config.particles.scatter, RadiusBand::new(12.0, 24.0));
        assert_eq!(config.particles.palette.len(), 5);
        assert_eq!(config.post.exposure, 1.0);
        assert_eq!(config.post.bloom_intensity, 1.5);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = SceneConfig {
            seed: Some(7),
            ..Default::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(SceneConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_rejects_inverted_band() {
        let err = SceneConfig::from_yaml("particles:\n  scatter: { min: 30, max: 15 }").unwrap_err();
        assert!(err.to_string().contains("particles.scatter"));
    }

    #[test]
    fn test_rejects_bad_color() {
        let err = SceneConfig::from_yaml("lighting:\n  background: '#zzzzzz'").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_extra_point_light() {
        let mut config = SceneConfig::default();
        let light = config.lighting.point_lights[0].clone();
        config.lighting.point_lights.push(light);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_palette() {
        let mut config = SceneConfig::default();
        config.decorations.palette.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recipes_carry_shared_cone() {
        let config = SceneConfig::default();
        let recipe = config.particles.recipe(&config.cone).unwrap();
        assert_eq!(recipe.plan.cone, config.cone);
        assert_eq!(recipe.palette.len(), 5);
        assert!((recipe.palette[1].y).abs() < 1e-6);

        let decorations = config.decorations.recipe(&config.cone).unwrap();
        assert_eq!(decorations.plan.tree.surface_offset, Some(0.5));
    }
}
