//! Hero ornaments hung on the outside of the cone.

use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::math::Vec3;
use crate::mesh::{Geometry, Material, Tint};
use crate::morph::{
    advance, ConeShape, FrameTime, InstanceScratch, MorphBody, MorphMode, MorphPoint,
    MotionParams, PlacementPlan, RadiusBand, Transform, TransformSink, TreeBand,
};

const WHITE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const SILVER: Vec3 = Vec3::new(0.753, 0.753, 0.753);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Planet,
    Gift,
    Ring,
}

/// One mesh of a decoration, positioned relative to the decoration's origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Part {
    pub geometry: Geometry,
    pub rotation: Vec3,
    pub scale: f32,
    pub material: Material,
}

const PLANET_PARTS: [Part; 2] = [
    Part {
        geometry: Geometry::PlanetCore,
        rotation: Vec3::ZERO,
        scale: 1.0,
        material: Material::standard(Tint::Own, 0.8, 0.1).glowing(Tint::Own, 0.5),
    },
    Part {
        geometry: Geometry::PlanetRing,
        rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
        scale: 1.0,
        material: Material::standard(Tint::Fixed(WHITE), 1.0, 0.0),
    },
];

const GIFT_PARTS: [Part; 3] = [
    Part {
        geometry: Geometry::GiftBox,
        rotation: Vec3::ZERO,
        scale: 1.0,
        material: Material::standard(Tint::Own, 0.5, 0.2),
    },
    Part {
        geometry: Geometry::GiftRibbon,
        rotation: Vec3::ZERO,
        scale: 1.05,
        material: Material::basic(SILVER),
    },
    Part {
        geometry: Geometry::GiftRibbon,
        rotation: Vec3::new(0.0, 0.0, FRAC_PI_2),
        scale: 1.05,
        material: Material::basic(SILVER),
    },
];

const RING_PARTS: [Part; 1] = [Part {
    geometry: Geometry::RingBand,
    rotation: Vec3::ZERO,
    scale: 1.0,
    material: Material::standard(Tint::Own, 1.0, 0.0).glowing(Tint::Own, 1.0),
}];

impl DecorationKind {
    /// Assignment order: decoration `i` gets `ALL[i % 3]`
    pub const ALL: [DecorationKind; 3] = [DecorationKind::Planet, DecorationKind::Gift, DecorationKind::Ring];

    pub fn index(self) -> usize {
        match self {
            DecorationKind::Planet => 0,
            DecorationKind::Gift => 1,
            DecorationKind::Ring => 2,
        }
    }

    pub fn for_id(id: u32) -> Self {
        Self::ALL[id as usize % Self::ALL.len()]
    }

    pub fn parts(self) -> &'static [Part] {
        match self {
            DecorationKind::Planet => &PLANET_PARTS,
            DecorationKind::Gift => &GIFT_PARTS,
            DecorationKind::Ring => &RING_PARTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub id: u32,
    pub kind: DecorationKind,
    pub point: MorphPoint,
    pub color: Vec3,
    /// Offset into the floating bob
    pub phase: f32,
}

impl MorphBody for Decoration {
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
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecorationRecipe {
    pub plan: PlacementPlan,
    /// Decoration `i` takes `palette[i % len]`
    pub palette: Vec<Vec3>,
}

impl Default for DecorationRecipe {
    fn default() -> Self {
        Self {
            plan: PlacementPlan {
                scatter: RadiusBand::new(10.0, 20.0),
                cone: ConeShape::default(),
                tree: TreeBand::surface(-5.0, 9.0, 0.5),
            },
            palette: vec![
                Vec3::new(1.0, 0.0, 0.498),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 0.0),
                SILVER,
            ],
        }
    }
}

impl DecorationRecipe {
    fn roll<R: Rng + ?Sized>(&self, id: u32, rng: &mut R) -> Decoration {
        let (scatter, tree) = self.plan.targets(rng);
        let color = if self.palette.is_empty() {
            WHITE
        } else {
            self.palette[id as usize % self.palette.len()]
        };
        Decoration {
            id,
            kind: DecorationKind::for_id(id),
            point: MorphPoint::new(scatter, tree),
            color,
            phase: rng.gen::<f32>() * TAU,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
    recipe: DecorationRecipe,
    motion: MotionParams,
}

impl DecorationSet {
    pub fn generate<R: Rng + ?Sized>(
        count: usize,
        recipe: DecorationRecipe,
        motion: MotionParams,
        rng: &mut R,
    ) -> Self {
        let decorations = (0..count as u32).map(|id| recipe.roll(id, rng)).collect();
        Self {
            decorations,
            recipe,
            motion,
        }
    }

    pub fn ensure_count<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> bool {
        if count == self.decorations.len() {
            return false;
        }
        log::debug!("regenerating decorations: {} -> {}", self.decorations.len(), count);
        self.decorations = (0..count as u32).map(|id| self.recipe.roll(id, rng)).collect();
        true
    }

    pub fn advance(
        &mut self,
        mode: MorphMode,
        frame: FrameTime,
        sink: Option<&mut dyn TransformSink>,
    ) -> bool {
        advance(&mut self.decorations, mode, frame, &self.motion, sink)
    }

    /// Number of decorations of each kind, indexed by `DecorationKind::index`
    pub fn kind_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for d in &self.decorations {
            counts[d.kind.index()] += 1;
        }
        counts
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}

/// Routes decoration transforms into one instance batch per kind
#[derive(Debug, Clone, Default)]
pub struct DecorationScratch {
    slots: Vec<(DecorationKind, usize)>,
    batches: [InstanceScratch; 3],
}

impl DecorationScratch {
    pub fn for_set(set: &DecorationSet) -> Self {
        let mut scratch = Self::default();
        scratch.rebuild(set);
        scratch
    }

    /// Recompute slot assignment after the set was regenerated
    pub fn rebuild(&mut self, set: &DecorationSet) {
        let mut next = [0usize; 3];
        self.slots = set
            .decorations()
            .iter()
            .map(|d| {
                let slot = next[d.kind.index()];
                next[d.kind.index()] += 1;
                (d.kind, slot)
            })
            .collect();
        for kind in DecorationKind::ALL {
            self.batches[kind.index()].resize(next[kind.index()]);
        }
    }

    pub fn batch(&self, kind: DecorationKind) -> &InstanceScratch {
        &self.batches[kind.index()]
    }
}

impl TransformSink for DecorationScratch {
    fn write(&mut self, index: usize, transform: &Transform, color: Vec3) {
        if let Some(&(kind, slot)) = self.slots.get(index) {
            self.batches[kind.index()].write(slot, transform, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn set(count: usize) -> DecorationSet {
        let mut rng = SmallRng::seed_from_u64(30);
        DecorationSet::generate(count, DecorationRecipe::default(), MotionParams::decorations(), &mut rng)
    }

    #[test]
    fn test_kind_and_color_cycle_by_id() {
        let set = set(30);
        let recipe = DecorationRecipe::default();
        for d in set.decorations() {
            assert_eq!(d.kind, DecorationKind::ALL[d.id as usize % 3]);
            assert_eq!(d.color, recipe.palette[d.id as usize % 4]);
        }
        assert_eq!(set.kind_counts(), [10, 10, 10]);
    }

    #[test]
    fn test_tree_targets_hang_outside_cone() {
        let set = set(30);
        let cone = ConeShape::default();
        for d in set.decorations() {
            let t = d.point.tree_target;
            assert!(t.y >= -5.0 && t.y <= 9.0);
            assert!((t.horizontal_length() - (cone.radius_at(t.y) + 0.5)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_scatter_targets_in_band() {
        for d in set(200).decorations() {
            let r = d.point.scatter_anchor.length();
            assert!(r >= 10.0 - 1e-3 && r <= 20.0 + 1e-3);
        }
    }

    #[test]
    fn test_part_tables() {
        assert_eq!(DecorationKind::Planet.parts().len(), 2);
        assert_eq!(DecorationKind::Gift.parts().len(), 3);
        assert_eq!(DecorationKind::Ring.parts().len(), 1);

        let ribbons: Vec<_> = DecorationKind::Gift.parts()[1..].iter().collect();
        assert!(ribbons.iter().all(|p| p.geometry == Geometry::GiftRibbon && p.material.unlit));
        assert_eq!(ribbons[1].rotation.z, FRAC_PI_2);
    }

    #[test]
    fn test_scratch_routes_by_kind() {
        let mut set = set(7);
        let mut scratch = DecorationScratch::for_set(&set);
        assert_eq!(scratch.batch(DecorationKind::Planet).count(), 3);
        assert_eq!(scratch.batch(DecorationKind::Gift).count(), 2);
        assert_eq!(scratch.batch(DecorationKind::Ring).count(), 2);

        assert!(set.advance(MorphMode::Scattered, FrameTime::new(0.0, 0.0), Some(&mut scratch)));
        // decoration 3 is the second planet; its translation lands in slot 1
        let anchor = set.decorations()[3].point.scatter_anchor;
        let instance = scratch.batch(DecorationKind::Planet).instance(1);
        assert!((instance[12] - anchor.x).abs() < 1e-4);
        assert!((instance[14] - anchor.z).abs() < 1e-4);
    }

    #[test]
    fn test_decorations_never_orbit() {
        let mut set = set(6);
        let mut sink: Vec<Transform> = Vec::new();
        for i in 0..30 {
            set.advance(MorphMode::Scattered, FrameTime::new(i as f32 * 0.1, 0.1), Some(&mut sink));
        }
        for d in set.decorations() {
            assert_eq!(d.point.live_scatter, d.point.scatter_anchor);
        }
    }
}
