//! Per-frame integration of morphing entities.
//!
//! Each frame every entity eases its position toward the target selected by
//! the current [`MorphMode`], then secondary motion (wobble, floating, spin)
//! is layered onto the transform handed to the renderer. Orbit drift turns
//! the scatter target itself, never the eased position.
//! Easing is delta-scaled exponential decay, so a skipped or long frame
//! never accumulates drift.

use serde::{Deserialize, Serialize};

use super::mode::MorphMode;
use crate::math::Vec3;

/// Clock values supplied by the render loop for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the scene started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameTime {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        Self { elapsed, delta }
    }
}

/// Fraction of the remaining distance to cover this frame
pub fn ease_factor(speed: f32, delta: f32) -> f32 {
    (speed * delta).clamp(0.0, 1.0)
}

/// Instance transform consumed by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

/// Receives one transform per entity per integrated frame
pub trait TransformSink {
    fn write(&mut self, index: usize, transform: &Transform, color: Vec3);
}

impl TransformSink for Vec<Transform> {
    fn write(&mut self, index: usize, transform: &Transform, _color: Vec3) {
        if index >= self.len() {
            self.resize(index + 1, Transform::default());
        }
        self[index] = *transform;
    }
}

/// Morph state shared by particles and decorations.
///
/// `scatter_anchor` is what placement produced and never changes.
/// `live_scatter` is the scatter-mode target actually eased toward; orbit
/// drift rotates it about Y every scattered frame, so it keeps the anchor's
/// radius and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphPoint {
    pub scatter_anchor: Vec3,
    pub live_scatter: Vec3,
    pub tree_target: Vec3,
    pub position: Vec3,
}

impl MorphPoint {
    pub fn new(scatter: Vec3, tree: Vec3) -> Self {
        Self {
            scatter_anchor: scatter,
            live_scatter: scatter,
            tree_target: tree,
            position: scatter,
        }
    }

    pub fn target(&self, mode: MorphMode) -> Vec3 {
        match mode {
            MorphMode::TreeShape => self.tree_target,
            MorphMode::Scattered => self.live_scatter,
        }
    }

    /// Move `factor` of the way toward the active target
    pub fn ease(&mut self, mode: MorphMode, factor: f32) {
        self.position = self.position.lerp(&self.target(mode), factor);
    }
}

/// Motion constants for one class of entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Easing speed; `speed * delta` is the per-frame lerp factor
    pub speed: f32,
    /// Vertical shimmer in tree mode
    pub wobble_amplitude: f32,
    pub wobble_frequency: f32,
    /// Radians per second of orbit drift in scatter mode, 0 disables it
    pub orbit_rate: f32,
    /// Vertical bob applied in both modes
    pub float_amplitude: f32,
    pub float_frequency: f32,
    /// Rotational sway that accompanies the bob
    pub float_tilt: f32,
    /// Radians per second of self rotation around each axis
    pub spin_rate: Vec3,
    /// Multiplier on the entity id added to every rotation axis
    pub spin_offset: f32,
}

impl MotionParams {
    pub fn particles() -> Self {
        Self {
            speed: 3.5,
            wobble_amplitude: 0.05,
            wobble_frequency: 2.0,
            orbit_rate: 0.1,
            float_amplitude: 0.0,
            float_frequency: 0.0,
            float_tilt: 0.0,
            spin_rate: Vec3::new(0.5, 0.3, 0.0),
            spin_offset: 1.0,
        }
    }

    pub fn decorations() -> Self {
        Self {
            speed: 2.5,
            wobble_amplitude: 0.0,
            wobble_frequency: 0.0,
            orbit_rate: 0.0,
            float_amplitude: 0.05,
            float_frequency: 0.5,
            float_tilt: 0.0625,
            spin_rate: Vec3::new(0.0, 0.5, 0.2),
            spin_offset: 0.0,
        }
    }

    /// Same constants with orbit drift switched off
    pub fn without_orbit(self) -> Self {
        Self { orbit_rate: 0.0, ..self }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::particles()
    }
}

/// An entity the integrator can drive
pub trait MorphBody {
    fn id(&self) -> u32;
    fn point(&self) -> &MorphPoint;
    fn point_mut(&mut self) -> &mut MorphPoint;
    /// Per-entity offset that desynchronizes oscillations
    fn phase(&self) -> f32;
    fn color(&self) -> Vec3;
    fn scale(&self) -> f32 {
        1.0
    }
}

/// Advance one entity and build its rendered transform
pub fn integrate<B: MorphBody>(
    body: &mut B,
    mode: MorphMode,
    frame: FrameTime,
    motion: &MotionParams,
    factor: f32,
) -> Transform {
    let id = body.id() as f32;
    let phase = body.phase();
    let point = body.point_mut();

    if mode == MorphMode::Scattered && motion.orbit_rate != 0.0 {
        point.live_scatter = point.live_scatter.rotate_xz(motion.orbit_rate * frame.delta);
    }

    point.ease(mode, factor);
    let mut position = point.position;

    if mode.is_tree() {
        position.y += motion.wobble_amplitude * (frame.elapsed * motion.wobble_frequency + phase).sin();
    }

    let float_t = frame.elapsed * motion.float_frequency + phase;
    let (float_sin, float_cos) = float_t.sin_cos();
    position.y += motion.float_amplitude * float_sin;

    let rotation = motion.spin_rate * frame.elapsed
        + Vec3::splat(id * motion.spin_offset)
        + Vec3::new(float_cos, float_sin, 0.4 * float_sin) * motion.float_tilt;

    Transform {
        position,
        rotation,
        scale: body.scale(),
    }
}

/// One integration pass over a set of entities.
///
/// `sink` is `None` while the render surface is not ready; the whole frame is
/// then skipped without touching any entity and `false` is returned.
pub fn advance<B: MorphBody>(
    bodies: &mut [B],
    mode: MorphMode,
    frame: FrameTime,
    motion: &MotionParams,
    sink: Option<&mut dyn TransformSink>,
) -> bool {
    let Some(sink) = sink else {
        return false;
    };

    let factor = ease_factor(motion.speed, frame.delta);
    for (index, body) in bodies.iter_mut().enumerate() {
        let transform = integrate(body, mode, frame, motion, factor);
        sink.write(index, &transform, body.color());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Body {
        id: u32,
        point: MorphPoint,
        phase: f32,
    }

    impl Body {
        fn new(id: u32, scatter: Vec3, tree: Vec3) -> Self {
            Self {
                id,
                point: MorphPoint::new(scatter, tree),
                phase: id as f32 * 0.7,
            }
        }
    }

    impl MorphBody for Body {
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
            Vec3::ONE
        }
    }

    fn close(a: Vec3, b: Vec3, eps: f32) -> bool {
        a.distance(&b) < eps
    }

    fn step(bodies: &mut [Body], mode: MorphMode, frame: FrameTime, motion: &MotionParams) {
        let mut sink: Vec<Transform> = Vec::new();
        assert!(advance(bodies, mode, frame, motion, Some(&mut sink)));
    }

    #[test]
    fn test_ease_factor_clamps() {
        assert_eq!(ease_factor(3.5, 1.0), 1.0);
        assert!((ease_factor(3.5, 0.1) - 0.35).abs() < 1e-6);
        assert_eq!(ease_factor(3.5, -1.0), 0.0);
    }

    #[test]
    fn test_oversized_frame_reaches_target() {
        let mut bodies = vec![Body::new(0, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0))];
        step(&mut bodies, MorphMode::TreeShape, FrameTime::new(1.0, 1.0), &MotionParams::particles());
        assert!(close(bodies[0].point.position, Vec3::new(0.0, 5.0, 0.0), 1e-5));
    }

    #[test]
    fn test_partial_frame_eases_proportionally() {
        let mut bodies = vec![Body::new(0, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0))];
        step(&mut bodies, MorphMode::TreeShape, FrameTime::new(0.1, 0.1), &MotionParams::particles());
        assert!(close(bodies[0].point.position, Vec3::new(6.5, 1.75, 0.0), 1e-5));
    }

    #[test]
    fn test_tree_mode_converges_from_anywhere() {
        let motion = MotionParams::particles();
        let mut bodies: Vec<Body> = (0..50)
            .map(|i| {
                let f = i as f32;
                Body::new(
                    i,
                    Vec3::new(20.0 * (f * 0.3).cos(), 15.0 - f, 25.0 * (f * 0.7).sin()),
                    Vec3::new((f * 0.1).sin(), f * 0.2 - 6.0, (f * 0.1).cos()),
                )
            })
            .collect();

        let mut elapsed = 0.0;
        for _ in 0..300 {
            elapsed += 1.0 / 60.0;
            step(&mut bodies, MorphMode::TreeShape, FrameTime::new(elapsed, 1.0 / 60.0), &motion);
        }

        for body in &bodies {
            assert!(close(body.point.position, body.point.tree_target, 1e-3));
        }
    }

    #[test]
    fn test_double_toggle_moves_continuously() {
        let motion = MotionParams::particles();
        let mut bodies = vec![Body::new(3, Vec3::new(18.0, 4.0, -9.0), Vec3::new(1.0, 2.0, 0.5))];
        let delta = 1.0 / 60.0;
        let factor = ease_factor(motion.speed, delta);
        let mut elapsed = 0.0;

        let modes = [
            MorphMode::TreeShape,
            MorphMode::TreeShape,
            MorphMode::Scattered,
            MorphMode::TreeShape,
            MorphMode::TreeShape,
        ];
        for mode in modes {
            elapsed += delta;
            let before = bodies[0].point;
            step(&mut bodies, mode, FrameTime::new(elapsed, delta), &motion);
            let moved = bodies[0].point.position.distance(&before.position);
            let allowed = factor * bodies[0].point.target(mode).distance(&before.position);
            assert!(moved <= allowed + 1e-4, "jumped {} > {}", moved, allowed);
        }
    }

    #[test]
    fn test_missing_sink_skips_frame() {
        let mut bodies = vec![Body::new(0, Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO)];
        let before = bodies[0].point;
        let advanced = advance(
            &mut bodies,
            MorphMode::TreeShape,
            FrameTime::new(1.0, 0.5),
            &MotionParams::particles(),
            None,
        );
        assert!(!advanced);
        assert_eq!(bodies[0].point, before);
    }

    #[test]
    fn test_orbit_drift_rewrites_live_target_only() {
        let motion = MotionParams::particles();
        let anchor = Vec3::new(20.0, 3.0, 0.0);
        let mut bodies = vec![Body::new(0, anchor, Vec3::ZERO)];

        let mut elapsed = 0.0;
        for _ in 0..120 {
            elapsed += 1.0 / 60.0;
            step(&mut bodies, MorphMode::Scattered, FrameTime::new(elapsed, 1.0 / 60.0), &motion);
        }

        let point = bodies[0].point;
        assert_eq!(point.scatter_anchor, anchor);
        assert_ne!(point.live_scatter, anchor);
        // Drift is a rotation about Y: radius and height are preserved
        assert!((point.live_scatter.horizontal_length() - 20.0).abs() < 0.01);
        assert!((point.live_scatter.y - 3.0).abs() < 1e-4);
        assert!(point.live_scatter.z > 0.0);
    }

    #[test]
    fn test_scatter_after_assembly_returns_to_shell() {
        let motion = MotionParams::particles();
        let delta = 1.0 / 60.0;
        let mut bodies: Vec<Body> = (0..40)
            .map(|i| {
                let a = i as f32 * 0.5;
                let r = 15.0 + (i % 15) as f32;
                Body::new(i, Vec3::new(r * a.cos(), 0.3 * i as f32 - 6.0, r * a.sin()), Vec3::new(0.1 * a.cos(), 1.0, 0.1 * a.sin()))
            })
            .collect();

        let mut elapsed = 0.0;
        for _ in 0..600 {
            elapsed += delta;
            step(&mut bodies, MorphMode::TreeShape, FrameTime::new(elapsed, delta), &motion);
        }
        for body in &bodies {
            assert!(close(body.point.position, body.point.tree_target, 1e-3));
        }

        for _ in 0..300 {
            elapsed += delta;
            step(&mut bodies, MorphMode::Scattered, FrameTime::new(elapsed, delta), &motion);
        }

        for body in &bodies {
            let point = body.point;
            let anchor_r = point.scatter_anchor.length();
            assert!((point.live_scatter.length() - anchor_r).abs() < 1e-2);
            assert!((point.position.length() - anchor_r).abs() < 0.05, "r {} vs {}", point.position.length(), anchor_r);
            assert!(point.position.length() >= 15.0 - 0.05);
        }
    }

    #[test]
    fn test_orbit_drift_can_be_disabled() {
        let motion = MotionParams::particles().without_orbit();
        let anchor = Vec3::new(20.0, 3.0, 0.0);
        let mut bodies = vec![Body::new(0, anchor, Vec3::ZERO)];
        for i in 0..60 {
            step(&mut bodies, MorphMode::Scattered, FrameTime::new(i as f32 / 60.0, 1.0 / 60.0), &motion);
        }
        assert_eq!(bodies[0].point.live_scatter, anchor);
        assert!(close(bodies[0].point.position, anchor, 1e-5));
    }

    #[test]
    fn test_wobble_only_touches_rendered_transform() {
        let motion = MotionParams::particles();
        let tree = Vec3::new(1.0, 2.0, 3.0);
        let mut body = Body::new(0, tree, tree);
        let frame = FrameTime::new(0.4, 1.0 / 60.0);

        let transform = integrate(&mut body, MorphMode::TreeShape, frame, &motion, 1.0);
        let expected = motion.wobble_amplitude * (0.4 * motion.wobble_frequency).sin();

        assert_eq!(body.point.position, tree);
        assert!((transform.position.y - (tree.y + expected)).abs() < 1e-6);
        assert_eq!(transform.position.x, tree.x);
    }

    #[test]
    fn test_spin_depends_on_time_and_index() {
        let motion = MotionParams::particles();
        let mut a = Body::new(1, Vec3::ZERO, Vec3::ZERO);
        let mut b = Body::new(2, Vec3::ZERO, Vec3::ZERO);
        let frame = FrameTime::new(2.0, 0.016);

        let ta = integrate(&mut a, MorphMode::TreeShape, frame, &motion, 0.0);
        let tb = integrate(&mut b, MorphMode::TreeShape, frame, &motion, 0.0);

        assert!((ta.rotation.x - (2.0 * 0.5 + 1.0)).abs() < 1e-5);
        assert!((ta.rotation.y - (2.0 * 0.3 + 1.0)).abs() < 1e-5);
        assert!((tb.rotation.x - ta.rotation.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_decorations_spin_without_index_offset() {
        let motion = MotionParams::decorations();
        let mut body = Body::new(7, Vec3::ZERO, Vec3::ZERO);
        let frame = FrameTime::new(2.0, 0.016);

        let t = integrate(&mut body, MorphMode::TreeShape, frame, &motion, 0.0);
        let float_t = 2.0 * motion.float_frequency + body.phase;
        let tilt = motion.float_tilt;

        assert!((t.rotation.x - float_t.cos() * tilt).abs() < 1e-5);
        assert!((t.rotation.y - (2.0 * 0.5 + float_t.sin() * tilt)).abs() < 1e-5);
    }

    #[test]
    fn test_sink_receives_every_body() {
        let mut bodies: Vec<Body> = (0..4).map(|i| Body::new(i, Vec3::splat(i as f32), Vec3::ZERO)).collect();
        let mut sink: Vec<Transform> = Vec::new();
        advance(
            &mut bodies,
            MorphMode::Scattered,
            FrameTime::new(0.0, 0.0),
            &MotionParams::particles(),
            Some(&mut sink),
        );
        assert_eq!(sink.len(), 4);
        assert_eq!(sink[2].position, Vec3::splat(2.0));
    }
}
