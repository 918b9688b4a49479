//! The needle particles that form the tree.

use std::f32::consts::PI;

use rand::Rng;

use crate::math::Vec3;
use crate::morph::{
    advance, ConeShape, FrameTime, MorphBody, MorphMode, MorphPoint, MotionParams, PlacementPlan,
    RadiusBand, TransformSink, TreeBand,
};

/// A single needle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u32,
    pub point: MorphPoint,
    /// Linear RGB; may exceed 1.0 for the brightened share
    pub color: Vec3,
    pub scale: f32,
    pub phase: f32,
}

impl Particle {
    pub fn new(id: u32, scatter: Vec3, tree: Vec3, color: Vec3, scale: f32, phase: f32) -> Self {
        Self {
            id,
            point: MorphPoint::new(scatter, tree),
            color,
            scale,
            phase,
        }
    }
}

impl MorphBody for Particle {
    fn id(&self) -> u32 {
        self.id
    }

    fn point(&self) -> &MorphPoint {
        &self.point
    }

    fn point_mut(&mut self) -> &mut MorphPoint {
        &mut self.point
    }

    fn phase(&self) -> f32 {
        self.phase
    }

    fn color(&self) -> Vec3 {
        self.color
    }

    fn scale(&self) -> f32 {
        self.scale
    }
}

/// How to roll a particle's targets and static attributes
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecipe {
    pub plan: PlacementPlan,
    pub palette: Vec<Vec3>,
    /// Share of particles whose color is multiplied by `bright_boost`
    pub bright_chance: f32,
    pub bright_boost: f32,
    pub scale_min: f32,
    pub scale_range: f32,
}

impl Default for FieldRecipe {
    fn default() -> Self {
        Self {
            plan: PlacementPlan {
                scatter: RadiusBand::new(15.0, 30.0),
                cone: ConeShape::default(),
                tree: TreeBand::volume(-6.0, 8.0),
            },
            palette: vec![
                Vec3::new(0.753, 0.753, 0.753),
                Vec3::new(1.0, 0.0, 0.498),
                Vec3::new(0.0, 0.502, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::ONE,
            ],
            bright_chance: 0.2,
            bright_boost: 2.0,
            scale_min: 0.2,
            scale_range: 0.5,
        }
    }
}

impl FieldRecipe {
    fn roll<R: Rng + ?Sized>(&self, id: u32, rng: &mut R) -> Particle {
        let (scatter, tree) = self.plan.targets(rng);

        let pick = (rng.gen::<f32>() * self.palette.len() as f32) as usize;
        let mut color = self
            .palette
            .get(pick.min(self.palette.len().saturating_sub(1)))
            .copied()
            .unwrap_or(Vec3::ONE);
        if rng.gen::<f32>() < self.bright_chance {
            color = color * self.bright_boost;
        }

        let scale = rng.gen::<f32>() * self.scale_range + self.scale_min;
        let phase = rng.gen::<f32>() * PI;
        Particle::new(id, scatter, tree, color, scale, phase)
    }
}

/// The full needle set and its motion constants
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    recipe: FieldRecipe,
    motion: MotionParams,
}

impl ParticleField {
    pub fn generate<R: Rng + ?Sized>(
        count: usize,
        recipe: FieldRecipe,
        motion: MotionParams,
        rng: &mut R,
    ) -> Self {
        let particles = (0..count as u32).map(|id| recipe.roll(id, rng)).collect();
        Self {
            particles,
            recipe,
            motion,
        }
    }

    /// Regenerate only when `count` differs from the current size.
    /// Returns whether a new set was rolled.
    pub fn ensure_count<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> bool {
        if count == self.particles.len() {
            return false;
        }
        log::debug!("regenerating particles: {} -> {}", self.particles.len(), count);
        self.particles = (0..count as u32).map(|id| self.recipe.roll(id, rng)).collect();
        true
    }

    pub fn advance(
        &mut self,
        mode: MorphMode,
        frame: FrameTime,
        sink: Option<&mut dyn TransformSink>,
    ) -> bool {
        advance(&mut self.particles, mode, frame, &self.motion, sink)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn motion(&self) -> &MotionParams {
        &self.motion
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::{InstanceScratch, Transform};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn field(count: usize, seed: u64) -> ParticleField {
        let mut rng = SmallRng::seed_from_u64(seed);
        ParticleField::generate(count, FieldRecipe::default(), MotionParams::particles(), &mut rng)
    }

    #[test]
    fn test_ids_are_sequential() {
        let field = field(100, 1);
        for (i, p) in field.particles().iter().enumerate() {
            assert_eq!(p.id, i as u32);
        }
    }

    #[test]
    fn test_attributes_in_range() {
        let field = field(2000, 2);
        for p in field.particles() {
            assert!(p.scale >= 0.2 && p.scale < 0.7);
            assert!(p.phase >= 0.0 && p.phase < PI);
            assert_eq!(p.point.position, p.point.scatter_anchor);
        }
    }

    #[test]
    fn test_bright_share_is_about_a_fifth() {
        let field = field(4000, 3);
        let bright = field
            .particles()
            .iter()
            .filter(|p| p.color.x > 1.0 || p.color.y > 1.0 || p.color.z > 1.0)
            .count() as f32
            / 4000.0;
        // every default palette entry has a channel above 0.5
        assert!((bright - 0.2).abs() < 0.03, "bright share {}", bright);
    }

    #[test]
    fn test_same_seed_same_field() {
        assert_eq!(field(50, 9).particles(), field(50, 9).particles());
    }

    #[test]
    fn test_ensure_count_regenerates_only_on_change() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut field = field(10, 4);
        let before = field.particles().to_vec();

        assert!(!field.ensure_count(10, &mut rng));
        assert_eq!(field.particles(), &before[..]);

        assert!(field.ensure_count(25, &mut rng));
        assert_eq!(field.len(), 25);
    }

    #[test]
    fn test_advance_fills_scratch() {
        let mut field = field(32, 5);
        let mut scratch = InstanceScratch::with_count(32);
        assert!(field.advance(MorphMode::TreeShape, FrameTime::new(0.1, 0.016), Some(&mut scratch)));
        assert_eq!(scratch.count(), 32);

        let mut transforms: Vec<Transform> = Vec::new();
        field.advance(MorphMode::TreeShape, FrameTime::new(0.2, 0.016), Some(&mut transforms));
        assert!((transforms[7].scale - field.particles()[7].scale).abs() < 1e-6);
    }
}
