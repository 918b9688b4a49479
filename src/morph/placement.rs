//! Procedural placement of morph targets.
//!
//! Every entity gets two targets: a point on a thick spherical shell
//! (scattered) and a point in or on a cone (tree). Both are pure functions of
//! the random draws, so a seeded generator reproduces the whole layout.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Radii `[min, max)` of the scatter shell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusBand {
    pub min: f32,
    pub max: f32,
}

impl RadiusBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// The tree silhouette: radius tapers linearly from `base_radius` at
/// `base_y` to zero at `base_y + height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeShape {
    pub base_y: f32,
    pub height: f32,
    pub base_radius: f32,
}

impl Default for ConeShape {
    fn default() -> Self {
        Self {
            base_y: -6.0,
            height: 14.0,
            base_radius: 5.0,
        }
    }
}

impl ConeShape {
    pub fn top_y(&self) -> f32 {
        self.base_y + self.height
    }

    /// Cone radius at world height `y`; zero at and above the tip
    pub fn radius_at(&self, y: f32) -> f32 {
        let normalized = (y - self.base_y) / self.height;
        (self.base_radius * (1.0 - normalized)).max(0.0)
    }
}

/// Vertical span of tree targets and how they sit relative to the cone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeBand {
    pub y_min: f32,
    pub y_max: f32,
    /// `None` fills the cone volume; `Some(offset)` hangs the point
    /// `offset` units outside the cone surface.
    #[serde(default)]
    pub surface_offset: Option<f32>,
}

impl TreeBand {
    pub const fn volume(y_min: f32, y_max: f32) -> Self {
        Self { y_min, y_max, surface_offset: None }
    }

    pub const fn surface(y_min: f32, y_max: f32, offset: f32) -> Self {
        Self { y_min, y_max, surface_offset: Some(offset) }
    }
}

/// Uniform draw in `[min, max)` that tolerates an empty range
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.gen::<f32>()
}

/// Uniformly distributed point on the shell.
///
/// Direction uses `phi = acos(2u - 1)` so density does not pile up at the
/// poles the way a plain lat/long draw would.
pub fn sphere_point<R: Rng + ?Sized>(rng: &mut R, band: &RadiusBand) -> Vec3 {
    let r = uniform(rng, band.min, band.max);
    let theta = uniform(rng, 0.0, TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    Vec3::from_spherical(r, theta, phi)
}

/// Point inside (or hung just outside) the cone.
///
/// Volume points take `sqrt(u)` of the local radius for uniform areal
/// density across each horizontal disk.
pub fn cone_point<R: Rng + ?Sized>(rng: &mut R, cone: &ConeShape, band: &TreeBand) -> Vec3 {
    let y = uniform(rng, band.y_min, band.y_max);
    let local = cone.radius_at(y);

    let distance = match band.surface_offset {
        Some(offset) => local + offset,
        None => rng.gen::<f32>().sqrt() * local,
    };

    let angle = uniform(rng, 0.0, TAU);
    Vec3::new(distance * angle.cos(), y, distance * angle.sin())
}

/// Everything needed to place one class of entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPlan {
    pub scatter: RadiusBand,
    pub cone: ConeShape,
    pub tree: TreeBand,
}

impl PlacementPlan {
    /// `(scatter_target, tree_target)` for the next entity
    pub fn targets<R: Rng + ?Sized>(&self, rng: &mut R) -> (Vec3, Vec3) {
        let scatter = sphere_point(rng, &self.scatter);
        let tree = cone_point(rng, &self.cone, &self.tree);
        (scatter, tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const SAMPLES: usize = 20_000;
    const BUCKETS: usize = 10;
    // chi-square critical value, 9 degrees of freedom, p = 0.0001
    const CHI_SQUARE_LIMIT: f32 = 33.72;

    fn chi_square(values: impl Iterator<Item = f32>, min: f32, max: f32) -> f32 {
        let mut counts = [0usize; BUCKETS];
        let mut total = 0usize;
        for v in values {
            let t = ((v - min) / (max - min)).clamp(0.0, 0.999_999);
            counts[(t * BUCKETS as f32) as usize] += 1;
            total += 1;
        }
        let expected = total as f32 / BUCKETS as f32;
        counts
            .iter()
            .map(|&c| (c as f32 - expected).powi(2) / expected)
            .sum()
    }

    fn particle_plan() -> PlacementPlan {
        PlacementPlan {
            scatter: RadiusBand::new(15.0, 30.0),
            cone: ConeShape::default(),
            tree: TreeBand::volume(-6.0, 8.0),
        }
    }

    #[test]
    fn test_radius_at_tapers_to_tip() {
        let cone = ConeShape::default();
        assert!((cone.radius_at(-6.0) - 5.0).abs() < 0.0001);
        assert!((cone.radius_at(1.0) - 2.5).abs() < 0.0001);
        assert!(cone.radius_at(8.0).abs() < 0.0001);
        assert_eq!(cone.radius_at(9.0), 0.0);
        assert_eq!(cone.top_y(), 8.0);
    }

    #[test]
    fn test_sphere_points_stay_in_band() {
        let mut rng = SmallRng::seed_from_u64(7);
        let band = RadiusBand::new(15.0, 30.0);
        for _ in 0..SAMPLES {
            let r = sphere_point(&mut rng, &band).length();
            assert!(r >= 15.0 - 0.001 && r <= 30.0 + 0.001, "radius {} out of band", r);
        }
    }

    #[test]
    fn test_sphere_direction_is_uniform() {
        let mut rng = SmallRng::seed_from_u64(11);
        let band = RadiusBand::new(10.0, 20.0);
        let points: Vec<Vec3> = (0..SAMPLES).map(|_| sphere_point(&mut rng, &band)).collect();

        // cos(phi) uniform in [-1, 1] means no pole clustering
        let cos_phi = chi_square(points.iter().map(|p| p.z / p.length()), -1.0, 1.0);
        assert!(cos_phi < CHI_SQUARE_LIMIT, "cos(phi) chi-square {}", cos_phi);

        let theta = chi_square(
            points.iter().map(|p| p.y.atan2(p.x).rem_euclid(TAU)),
            0.0,
            TAU,
        );
        assert!(theta < CHI_SQUARE_LIMIT, "theta chi-square {}", theta);

        let polar_caps = points
            .iter()
            .filter(|p| (p.z / p.length()).abs() > 0.9)
            .count() as f32
            / SAMPLES as f32;
        assert!((polar_caps - 0.1).abs() < 0.02, "polar cap share {}", polar_caps);
    }

    #[test]
    fn test_cone_volume_points_stay_inside() {
        let mut rng = SmallRng::seed_from_u64(3);
        let cone = ConeShape::default();
        let band = TreeBand::volume(-6.0, 8.0);
        for _ in 0..SAMPLES {
            let p = cone_point(&mut rng, &cone, &band);
            assert!(p.y >= -6.0 && p.y <= 8.0);
            assert!(p.horizontal_length() <= cone.radius_at(p.y) + 0.001);
        }
    }

    #[test]
    fn test_cone_volume_has_uniform_areal_density() {
        let mut rng = SmallRng::seed_from_u64(5);
        let cone = ConeShape::default();
        let band = TreeBand::volume(-6.0, 8.0);

        // (d / local)^2 is uniform on [0, 1] only with the sqrt transform
        let normalized: Vec<f32> = (0..SAMPLES)
            .map(|_| cone_point(&mut rng, &cone, &band))
            .filter_map(|p| {
                let local = cone.radius_at(p.y);
                (local > 0.01).then(|| (p.horizontal_length() / local).powi(2))
            })
            .collect();

        let stat = chi_square(normalized.iter().copied(), 0.0, 1.0);
        assert!(stat < CHI_SQUARE_LIMIT, "areal chi-square {}", stat);
    }

    #[test]
    fn test_cone_surface_points_hang_outside() {
        let mut rng = SmallRng::seed_from_u64(9);
        let cone = ConeShape::default();
        let band = TreeBand::surface(-5.0, 9.0, 0.5);
        for _ in 0..1_000 {
            let p = cone_point(&mut rng, &cone, &band);
            assert!(p.y >= -5.0 && p.y <= 9.0);
            let expected = cone.radius_at(p.y) + 0.5;
            assert!((p.horizontal_length() - expected).abs() < 0.001);
        }
    }

    #[test]
    fn test_placement_is_deterministic_per_seed() {
        let plan = particle_plan();
        let mut a = SmallRng::seed_from_u64(2024);
        let mut b = SmallRng::seed_from_u64(2024);
        let first: Vec<_> = (0..100).map(|_| plan.targets(&mut a)).collect();
        let second: Vec<_> = (0..100).map(|_| plan.targets(&mut b)).collect();
        assert_eq!(first, second);

        let mut c = SmallRng::seed_from_u64(2025);
        let third: Vec<_> = (0..100).map(|_| plan.targets(&mut c)).collect();
        assert_ne!(first, third);
    }

    #[test]
    fn test_band_yaml_shape() {
        let band: TreeBand = serde_yaml::from_str("y_min: -5\ny_max: 9\nsurface_offset: 0.5").unwrap();
        assert_eq!(band, TreeBand::surface(-5.0, 9.0, 0.5));
        let band: TreeBand = serde_yaml::from_str("y_min: -6\ny_max: 8").unwrap();
        assert_eq!(band.surface_offset, None);
    }
}
