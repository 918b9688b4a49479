//! Triangle meshes for the instanced batches.

pub mod primitives;

pub use primitives::{grid_lines, Geometry};

use crate::math::Vec3;

/// A vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    /// Convert to flat array for WebGL buffer
    /// Layout: position(3) + normal(3) = 6 floats
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.position.x, self.position.y, self.position.z,
            self.normal.x, self.normal.y, self.normal.z,
        ]
    }
}

/// A mesh composed of vertices and triangle indices
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add vertices and return the starting index
    pub fn add_vertices(&mut self, verts: impl IntoIterator<Item = Vertex>) -> u32 {
        let start = self.vertices.len() as u32;
        self.vertices.extend(verts);
        start
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Add a quad as two triangles (CCW winding)
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.add_triangle(a, b, c);
        self.add_triangle(a, c, d);
    }

    /// Largest distance of any vertex from the origin
    pub fn extent(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.position.length())
            .fold(0.0, f32::max)
    }

    /// Get vertex buffer data as flat f32 array
    pub fn vertex_data(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }

    pub fn index_data(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Connect two rings of equal size with quads.
///
/// Rings run counter-clockwise seen from +Y with `ring2` above `ring1`, which
/// gives outward-facing triangles.
pub fn connect_rings(mesh: &mut Mesh, ring1_start: u32, ring2_start: u32, segments: usize) {
    for i in 0..segments {
        let i_next = (i + 1) % segments;

        let a = ring1_start + i as u32;
        let b = ring1_start + i_next as u32;
        let c = ring2_start + i_next as u32;
        let d = ring2_start + i as u32;

        mesh.add_quad(a, d, c, b);
    }
}

/// Where a part takes its color from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tint {
    /// The per-instance color
    Own,
    Fixed(Vec3),
}

/// Surface parameters of one draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub tint: Tint,
    pub emissive: Tint,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Skip lighting entirely and output the tint
    pub unlit: bool,
}

impl Material {
    pub const fn standard(tint: Tint, metalness: f32, roughness: f32) -> Self {
        Self {
            tint,
            emissive: Tint::Fixed(Vec3::ZERO),
            emissive_intensity: 0.0,
            metalness,
            roughness,
            opacity: 1.0,
            unlit: false,
        }
    }

    pub const fn basic(color: Vec3) -> Self {
        Self {
            tint: Tint::Fixed(color),
            emissive: Tint::Fixed(Vec3::ZERO),
            emissive_intensity: 0.0,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            unlit: true,
        }
    }

    pub const fn glowing(self, emissive: Tint, intensity: f32) -> Self {
        Self {
            emissive,
            emissive_intensity: intensity,
            ..self
        }
    }

    pub const fn translucent(self, opacity: f32) -> Self {
        Self { opacity, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}
