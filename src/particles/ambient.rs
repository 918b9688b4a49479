//! Background point sprites: the star dome and the pink sparkles around the
//! tree. Neither takes part in morphing.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::{hsl_to_rgb, Vec3};

/// Floats per point sprite: position(3) + size(1) + alpha(1) + color(3)
pub const POINT_FLOATS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarsConfig {
    pub count: usize,
    /// Inner radius of the star shell
    pub radius: f32,
    /// Thickness of the shell beyond `radius`
    pub depth: f32,
    /// Size multiplier
    pub factor: f32,
    pub saturation: f32,
    /// Twinkle rate
    pub speed: f32,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: 5000,
            radius: 100.0,
            depth: 50.0,
            factor: 4.0,
            saturation: 0.0,
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparklesConfig {
    pub count: usize,
    /// Edge length of the cube the sparkles live in
    pub scale: f32,
    pub size: f32,
    pub speed: f32,
    pub opacity: f32,
    pub color: String,
}

impl Default for SparklesConfig {
    fn default() -> Self {
        Self {
            count: 200,
            scale: 20.0,
            size: 4.0,
            speed: 0.4,
            opacity: 0.5,
            color: "#ff007f".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Star {
    position: Vec3,
    size: f32,
    color: Vec3,
    phase: f32,
}

/// Static shell of stars that twinkle in place
pub struct StarField {
    stars: Vec<Star>,
    speed: f32,
    data: Vec<f32>,
}

impl StarField {
    pub fn generate<R: Rng + ?Sized>(config: &StarsConfig, rng: &mut R) -> Self {
        let mut r = config.radius + config.depth;
        let step = config.depth / config.count.max(1) as f32;

        let stars = (0..config.count)
            .map(|i| {
                // Later stars sit closer in; random jitter keeps shells from banding
                r -= step * rng.gen::<f32>();
                let theta = rng.gen::<f32>() * TAU;
                let phi = (1.0 - 2.0 * rng.gen::<f32>()).acos();
                let hue = i as f32 / config.count as f32;
                Star {
                    position: Vec3::from_spherical(r, theta, phi),
                    size: (0.5 + 0.5 * rng.gen::<f32>()) * config.factor,
                    color: hsl_to_rgb(hue, config.saturation, 0.9),
                    phase: rng.gen::<f32>() * TAU,
                }
            })
            .collect();

        let mut field = Self {
            stars,
            speed: config.speed,
            data: Vec::new(),
        };
        field.update(0.0);
        field
    }

    /// Refresh twinkle alphas for `time` seconds
    pub fn update(&mut self, time: f32) {
        self.data.clear();
        self.data.reserve(self.stars.len() * POINT_FLOATS);
        for s in &self.stars {
            let alpha = 0.6 + 0.4 * (time * self.speed + s.phase).sin();
            self.data.extend_from_slice(&[
                s.position.x, s.position.y, s.position.z,
                s.size, alpha,
                s.color.x, s.color.y, s.color.z,
            ]);
        }
    }

    /// Get particle data for GPU upload
    pub fn point_data(&self) -> &[f32] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.stars.len()
    }
}

#[derive(Debug, Clone)]
struct Sparkle {
    base: Vec3,
    size: f32,
    phase: f32,
}

/// Small glints that rise through a cube around the tree and wrap at the top
pub struct SparkleField {
    sparkles: Vec<Sparkle>,
    scale: f32,
    speed: f32,
    opacity: f32,
    color: Vec3,
    data: Vec<f32>,
}

impl SparkleField {
    pub fn generate<R: Rng + ?Sized>(config: &SparklesConfig, color: Vec3, rng: &mut R) -> Self {
        let half = config.scale * 0.5;
        let sparkles = (0..config.count)
            .map(|_| Sparkle {
                base: Vec3::new(
                    (rng.gen::<f32>() * 2.0 - 1.0) * half,
                    (rng.gen::<f32>() * 2.0 - 1.0) * half,
                    (rng.gen::<f32>() * 2.0 - 1.0) * half,
                ),
                size: config.size * (0.5 + rng.gen::<f32>()),
                phase: rng.gen::<f32>() * TAU,
            })
            .collect();

        let mut field = Self {
            sparkles,
            scale: config.scale,
            speed: config.speed,
            opacity: config.opacity,
            color,
            data: Vec::new(),
        };
        field.update(0.0);
        field
    }

    pub fn update(&mut self, time: f32) {
        let half = self.scale * 0.5;
        self.data.clear();
        self.data.reserve(self.sparkles.len() * POINT_FLOATS);

        for s in &self.sparkles {
            let t = time * self.speed + s.phase;
            let y = (s.base.y + half + time * self.speed).rem_euclid(self.scale) - half;
            let x = s.base.x + 0.2 * t.sin();
            let z = s.base.z + 0.2 * (t * 0.8).cos();
            let alpha = self.opacity * (0.5 + 0.5 * (t * 3.0).sin());
            self.data.extend_from_slice(&[
                x, y, z,
                s.size, alpha,
                self.color.x, self.color.y, self.color.z,
            ]);
        }
    }

    pub fn point_data(&self) -> &[f32] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.sparkles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_stars_fill_shell() {
        let mut rng = SmallRng::seed_from_u64(1);
        let field = StarField::generate(&StarsConfig::default(), &mut rng);
        assert_eq!(field.count(), 5000);

        let data = field.point_data();
        assert_eq!(data.len(), 5000 * POINT_FLOATS);
        for star in data.chunks(POINT_FLOATS) {
            let r = Vec3::new(star[0], star[1], star[2]).length();
            assert!(r >= 100.0 - 0.01 && r <= 150.0 + 0.01, "star radius {}", r);
            assert!(star[3] >= 2.0 && star[3] <= 4.0);
            // zero saturation renders every star grey
            assert_eq!(star[5], star[6]);
        }
    }

    #[test]
    fn test_star_alpha_twinkles() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut field = StarField::generate(&StarsConfig { count: 10, ..Default::default() }, &mut rng);
        let before = field.point_data()[4];
        field.update(1.3);
        let after = field.point_data()[4];
        assert_ne!(before, after);
        assert!(after >= 0.2 && after <= 1.0);
    }

    #[test]
    fn test_sparkles_wrap_inside_cube() {
        let mut rng = SmallRng::seed_from_u64(3);
        let config = SparklesConfig::default();
        let mut field = SparkleField::generate(&config, Vec3::new(1.0, 0.0, 0.5), &mut rng);

        for step in 0..50 {
            field.update(step as f32 * 1.7);
            for s in field.point_data().chunks(POINT_FLOATS) {
                assert!(s[1] >= -10.0 && s[1] < 10.0);
                assert!(s[4] >= 0.0 && s[4] <= config.opacity + 1e-6);
                assert_eq!(s[5], 1.0);
            }
        }
    }
}
