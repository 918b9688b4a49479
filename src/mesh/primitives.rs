//! Procedural primitives, centered on the origin.
//!
//! Cones and cylinders stand on the Y axis the way a lathe would turn them;
//! tori lie in the XY plane.

use std::f32::consts::{PI, TAU};

use super::{connect_rings, Mesh, Vertex};
use crate::math::Vec3;

/// Every fixed shape the scene instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// Four-sided cone used for every particle
    Needle,
    PlanetCore,
    PlanetRing,
    GiftBox,
    GiftRibbon,
    RingBand,
}

impl Geometry {
    pub fn build(self) -> Mesh {
        match self {
            Geometry::Needle => cone(0.15, 0.4, 4),
            Geometry::PlanetCore => sphere(0.4, 16, 16),
            Geometry::PlanetRing => torus(0.7, 0.05, 16, 32),
            Geometry::GiftBox => cuboid(Vec3::splat(0.6)),
            Geometry::GiftRibbon => cuboid(Vec3::new(0.6, 0.1, 0.6)),
            Geometry::RingBand => torus(0.4, 0.08, 16, 32),
        }
    }
}

/// Side wall between two radii; normals tilt with the slope of the wall
fn lathe_wall(mesh: &mut Mesh, r_bottom: f32, r_top: f32, height: f32, segments: usize) {
    let half = height * 0.5;
    let slope = (r_bottom - r_top) / height;

    let ring = |radius: f32, y: f32| {
        (0..segments).map(move |i| {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            Vertex::new(
                Vec3::new(radius * cos, y, radius * sin),
                Vec3::new(cos, slope, sin).normalize(),
            )
        })
    };

    let bottom = mesh.add_vertices(ring(r_bottom, -half));
    let top = mesh.add_vertices(ring(r_top, half));
    connect_rings(mesh, bottom, top, segments);
}

/// Flat disk facing `normal_y` (+1 up, -1 down)
fn cap(mesh: &mut Mesh, radius: f32, y: f32, normal_y: f32, segments: usize) {
    let normal = Vec3::new(0.0, normal_y, 0.0);
    let center = mesh.add_vertices([Vertex::new(Vec3::new(0.0, y, 0.0), normal)]);
    let rim = mesh.add_vertices((0..segments).map(|i| {
        let angle = i as f32 / segments as f32 * TAU;
        Vertex::new(Vec3::new(radius * angle.cos(), y, radius * angle.sin()), normal)
    }));

    for i in 0..segments as u32 {
        let next = (i + 1) % segments as u32;
        if normal_y > 0.0 {
            mesh.add_triangle(center, rim + next, rim + i);
        } else {
            mesh.add_triangle(center, rim + i, rim + next);
        }
    }
}

pub fn cone(radius: f32, height: f32, segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    lathe_wall(&mut mesh, radius, 0.0, height, segments);
    cap(&mut mesh, radius, -height * 0.5, -1.0, segments);
    mesh
}

pub fn cylinder(r_top: f32, r_bottom: f32, height: f32, segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    lathe_wall(&mut mesh, r_bottom, r_top, height, segments);
    cap(&mut mesh, r_top, height * 0.5, 1.0, segments);
    cap(&mut mesh, r_bottom, -height * 0.5, -1.0, segments);
    mesh
}

pub fn sphere(radius: f32, width_segments: usize, height_segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    // Rings from the south pole upward
    let starts: Vec<u32> = (0..=height_segments)
        .map(|j| {
            let phi = PI - j as f32 / height_segments as f32 * PI;
            mesh.add_vertices((0..width_segments).map(move |i| {
                let theta = i as f32 / width_segments as f32 * TAU;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                Vertex::new(normal * radius, normal)
            }))
        })
        .collect();

    for pair in starts.windows(2) {
        connect_rings(&mut mesh, pair[0], pair[1], width_segments);
    }
    mesh
}

pub fn torus(radius: f32, tube: f32, radial_segments: usize, tubular_segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    let starts: Vec<u32> = (0..tubular_segments)
        .map(|i| {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let (sin_u, cos_u) = u.sin_cos();
            mesh.add_vertices((0..radial_segments).map(move |j| {
                let v = j as f32 / radial_segments as f32 * TAU;
                let (sin_v, cos_v) = v.sin_cos();
                let normal = Vec3::new(cos_v * cos_u, cos_v * sin_u, sin_v);
                let center = Vec3::new(radius * cos_u, radius * sin_u, 0.0);
                Vertex::new(center + normal * tube, normal)
            }))
        })
        .collect();

    for i in 0..tubular_segments {
        let next = starts[(i + 1) % tubular_segments];
        connect_rings(&mut mesh, starts[i], next, radial_segments);
    }
    mesh
}

pub fn cuboid(size: Vec3) -> Mesh {
    let h = size * 0.5;
    let mut mesh = Mesh::new();
    // (normal, u axis, v axis); u x v = normal keeps faces CCW from outside
    let faces = [
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
        (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
    ];

    let stretch = |v: Vec3| Vec3::new(v.x * h.x, v.y * h.y, v.z * h.z);
    for (normal, u, v) in faces {
        let center = stretch(normal);
        let (su, sv) = (stretch(u), stretch(v));
        let start = mesh.add_vertices([
            Vertex::new(center - su - sv, normal),
            Vertex::new(center + su - sv, normal),
            Vertex::new(center + su + sv, normal),
            Vertex::new(center - su + sv, normal),
        ]);
        mesh.add_quad(start, start + 1, start + 2, start + 3);
    }
    mesh
}

/// Square grid in the XZ plane as line-segment endpoints, `xyz` per vertex
pub fn grid_lines(size: f32, segments: usize) -> Vec<f32> {
    let half = size * 0.5;
    let step = size / segments as f32;
    let mut data = Vec::with_capacity((segments + 1) * 12);
    for i in 0..=segments {
        let t = -half + i as f32 * step;
        data.extend_from_slice(&[t, 0.0, -half, t, 0.0, half]);
        data.extend_from_slice(&[-half, 0.0, t, half, 0.0, t]);
    }
    data
}
