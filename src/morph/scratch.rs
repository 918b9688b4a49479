use super::integrator::{Transform, TransformSink};
use crate::math::{Mat4, Vec3};

/// Floats per instance: column-major model matrix followed by RGB color
pub const INSTANCE_FLOATS: usize = 16 + 3;

/// Reusable per-frame instance data for one batch.
///
/// Owned by the render side and lent to the integrator for a single pass;
/// two passes must not write into the same scratch at once.
#[derive(Debug, Clone, Default)]
pub struct InstanceScratch {
    data: Vec<f32>,
}

impl InstanceScratch {
    pub fn with_count(count: usize) -> Self {
        let mut scratch = Self::default();
        scratch.resize(count);
        scratch
    }

    /// Grow or shrink to hold exactly `count` instances
    pub fn resize(&mut self, count: usize) {
        self.data.resize(count * INSTANCE_FLOATS, 0.0);
    }

    pub fn count(&self) -> usize {
        self.data.len() / INSTANCE_FLOATS
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn instance(&self, index: usize) -> &[f32] {
        let start = index * INSTANCE_FLOATS;
        &self.data[start..start + INSTANCE_FLOATS]
    }
}

impl TransformSink for InstanceScratch {
    fn write(&mut self, index: usize, transform: &Transform, color: Vec3) {
        if index >= self.count() {
            self.resize(index + 1);
        }
        let model = Mat4::from_transform(
            transform.position,
            transform.rotation,
            Vec3::splat(transform.scale),
        );
        let start = index * INSTANCE_FLOATS;
        self.data[start..start + 16].copy_from_slice(model.as_slice());
        self.data[start + 16..start + INSTANCE_FLOATS].copy_from_slice(&color.to_array());
    }
}
