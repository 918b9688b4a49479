//! Everything that changes per frame, independent of the GPU.
//!
//! `Scene` owns the entities, their scratch buffers, the mode and the camera.
//! The wasm engine feeds it frame deltas and uploads whatever it wrote.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::SceneConfig;
use crate::error::Result;
use crate::interaction::OrbitCamera;
use crate::math::parse_hex;
use crate::morph::{FrameTime, InstanceScratch, ModeController, MorphMode};
use crate::particles::{DecorationScratch, DecorationSet, ParticleField, SparkleField, StarField};
use crate::render::pipeline::RenderFrame;

pub struct Scene {
    controller: ModeController,
    camera: OrbitCamera,
    particles: ParticleField,
    decorations: DecorationSet,
    particle_scratch: InstanceScratch,
    decoration_scratch: DecorationScratch,
    stars: StarField,
    sparkles: SparkleField,
    rng: SmallRng,
    elapsed: f32,
}

impl Scene {
    pub fn new(config: &SceneConfig, seed: u64, width: f32, height: f32) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);

        let particles = ParticleField::generate(
            config.particles.count,
            config.particles.recipe(&config.cone)?,
            config.particles.motion,
            &mut rng,
        );
        let decorations = DecorationSet::generate(
            config.decorations.count,
            config.decorations.recipe(&config.cone)?,
            config.decorations.motion,
            &mut rng,
        );

        let stars = StarField::generate(&config.ambient.stars, &mut rng);
        let sparkle_color = parse_hex(&config.ambient.sparkles.color)?;
        let sparkles = SparkleField::generate(&config.ambient.sparkles, sparkle_color, &mut rng);

        log::info!(
            "scene seeded with {}: {} particles, {} decorations, {} stars",
            seed,
            particles.len(),
            decorations.len(),
            stars.count()
        );

        Ok(Self {
            controller: ModeController::default(),
            camera: OrbitCamera::new(config.camera.clone(), width, height),
            particle_scratch: InstanceScratch::with_count(particles.len()),
            decoration_scratch: DecorationScratch::for_set(&decorations),
            particles,
            decorations,
            stars,
            sparkles,
            rng,
            elapsed: 0.0,
        })
    }

    /// Advance one frame.
    ///
    /// With `sink_ready` false the morph pass is skipped and nothing is
    /// written; the camera and the ambient sprites still move. Returns
    /// whether instance transforms were written.
    pub fn step(&mut self, delta: f32, sink_ready: bool) -> bool {
        self.elapsed += delta;
        let frame = FrameTime::new(self.elapsed, delta);
        let mode = self.controller.mode();

        self.camera.update(delta, mode.is_tree());
        self.stars.update(self.elapsed);
        self.sparkles.update(self.elapsed);

        if !sink_ready {
            return self.particles.advance(mode, frame, None);
        }

        let wrote = self.particles.advance(mode, frame, Some(&mut self.particle_scratch));
        self.decorations.advance(mode, frame, Some(&mut self.decoration_scratch)) && wrote
    }

    /// Camera and timing for the current frame
    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame {
            view: self.camera.view(),
            projection: self.camera.projection(),
            camera_position: self.camera.position(),
            time: self.elapsed,
            trunk_visible: self.mode().is_tree(),
        }
    }

    pub fn mode(&self) -> MorphMode {
        self.controller.mode()
    }

    pub fn controller_mut(&mut self) -> &mut ModeController {
        &mut self.controller
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    /// Reroll the needle set if `count` differs. Returns whether it did.
    pub fn set_particle_count(&mut self, count: usize) -> bool {
        let rerolled = self.particles.ensure_count(count, &mut self.rng);
        if rerolled {
            self.particle_scratch.resize(count);
        }
        rerolled
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Reroll the decorations if `count` differs and reassign their batch
    /// slots. Returns whether it did.
    pub fn set_decoration_count(&mut self, count: usize) -> bool {
        let rerolled = self.decorations.ensure_count(count, &mut self.rng);
        if rerolled {
            self.decoration_scratch.rebuild(&self.decorations);
            log::debug!("decoration kinds now {:?}", self.decorations.kind_counts());
        }
        rerolled
    }

    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    pub fn particle_scratch(&self) -> &InstanceScratch {
        &self.particle_scratch
    }

    pub fn decoration_scratch(&self) -> &DecorationScratch {
        &self.decoration_scratch
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn sparkles(&self) -> &SparkleField {
        &self.sparkles
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::DecorationKind;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.particles.count = 200;
        config.ambient.stars.count = 50;
        config
    }

    fn scene() -> Scene {
        Scene::new(&small_config(), 42, 800.0, 600.0).unwrap()
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = scene();
        let b = scene();
        assert_eq!(a.particles().particles(), b.particles().particles());
        assert_eq!(a.decorations().decorations(), b.decorations().decorations());
    }

    #[test]
    fn test_step_without_sink_touches_nothing() {
        let mut scene = scene();
        let before = scene.particles().particles().to_vec();
        scene.controller_mut().assemble();

        assert!(!scene.step(0.016, false));
        assert_eq!(scene.particles().particles(), &before[..]);
        assert!(scene.particle_scratch().as_slice().iter().all(|&v| v == 0.0));
        // time still advances
        assert!((scene.elapsed() - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_step_fills_every_batch() {
        let mut scene = scene();
        assert!(scene.step(0.016, true));
        assert_eq!(scene.particle_scratch().count(), 200);
        for kind in DecorationKind::ALL {
            assert_eq!(scene.decoration_scratch().batch(kind).count(), 10);
        }
        // every palette color has a lit channel
        assert!(scene.particle_scratch().instance(0)[16..19].iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_particle_count_rerolls_only_on_change() {
        let mut scene = scene();
        assert!(!scene.set_particle_count(200));
        assert!(scene.set_particle_count(50));
        assert_eq!(scene.particle_count(), 50);
        assert_eq!(scene.particle_scratch().count(), 50);
    }

    #[test]
    fn test_decoration_count_rebuilds_batches() {
        let mut scene = scene();
        assert!(!scene.set_decoration_count(30));
        assert!(scene.set_decoration_count(7));
        assert_eq!(scene.decoration_count(), 7);
        assert_eq!(scene.decorations().kind_counts(), [3, 2, 2]);

        assert!(scene.step(0.016, true));
        for kind in DecorationKind::ALL {
            let expected = scene.decorations().kind_counts()[kind.index()];
            assert_eq!(scene.decoration_scratch().batch(kind).count(), expected);
        }
    }

    #[test]
    fn test_scatter_after_assembly_leaves_the_cone() {
        let mut scene = scene();
        let band = SceneConfig::default().particles.scatter;
        scene.controller_mut().assemble();
        for _ in 0..600 {
            scene.step(1.0 / 60.0, true);
        }
        scene.controller_mut().scatter();
        for _ in 0..600 {
            scene.step(1.0 / 60.0, true);
        }

        for p in scene.particles().particles() {
            let r = p.point.position.length();
            assert!(r >= band.min - 0.1 && r <= band.max + 0.1, "needle {} at r {}", p.id, r);
            assert!((p.point.live_scatter.length() - p.point.scatter_anchor.length()).abs() < 1e-2);
        }
    }

    #[test]
    fn test_trunk_follows_mode() {
        let mut scene = scene();
        assert!(!scene.render_frame().trunk_visible);
        scene.controller_mut().assemble();
        assert!(scene.render_frame().trunk_visible);
    }
}
