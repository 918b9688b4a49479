//! Everything that moves: the morphing needle field, the decorations, and the
//! ambient point sprites.

pub mod ambient;
pub mod decorations;
pub mod field;

pub use ambient::{SparkleField, SparklesConfig, StarField, StarsConfig, POINT_FLOATS};
pub use decorations::{Decoration, DecorationKind, DecorationRecipe, DecorationScratch, DecorationSet, Part};
pub use field::{FieldRecipe, Particle, ParticleField};
