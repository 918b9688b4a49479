//! Dual-target morphing shared by every animated entity: where targets come
//! from, which set is active, and how positions ease between them.

pub mod integrator;
pub mod mode;
pub mod placement;
pub mod scratch;

pub use integrator::{
    advance, ease_factor, FrameTime, MorphBody, MorphPoint, MotionParams, Transform, TransformSink,
};
pub use mode::{ModeController, MorphMode};
pub use placement::{cone_point, sphere_point, ConeShape, PlacementPlan, RadiusBand, TreeBand};
pub use scratch::{InstanceScratch, INSTANCE_FLOATS};
