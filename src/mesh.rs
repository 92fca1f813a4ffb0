//! Canonical meshes instanced by the tree.
//!
//! Any indexed triangle mesh can stand in for the branch or leaf; the
//! primitives here reproduce the bark cylinder, the two-sided leaf card and
//! the foliage sphere so a tree can be exported without a renderer.

use bevy_math::primitives::{Cylinder, Rectangle, Sphere};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

const CYLINDER_SLICES: u32 = 50;
const SPHERE_STACKS: u32 = 15;
const SPHERE_SLICES: u32 = 30;

// Bark atlas layout: cap disc centre/radius and side strip span.
const CAP_UV_CENTER: Vec2 = Vec2::new(0.717, 0.740);
const CAP_UV_RADIUS: f32 = 0.218;
const SIDE_UV_START: f32 = 0.976;
const SIDE_UV_SPAN: f32 = 0.958;
const SIDE_UV_TOP: f32 = 0.474;
const SIDE_UV_BOTTOM: f32 = 0.118;

/// One mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Zero-based, three per triangle.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Tapered branch segment centred on the origin along Y.
    ///
    /// The bottom ring has the cylinder radius, the top ring `radius * taper`.
    pub fn branch(cylinder: Cylinder, taper: f32) -> Self {
        let n = CYLINDER_SLICES;
        let radius = cylinder.radius;
        let half = cylinder.half_height;
        let height = half * 2.0;
        let top_radius = radius * taper;
        let step = TAU / n as f32;
        let uv_step = SIDE_UV_SPAN / n as f32;

        let ring = |r: f32, y: f32, i: u32| {
            let a = step * i as f32;
            Vec3::new(a.cos() * r, y, a.sin() * r)
        };
        let cap_uv = |i: u32| {
            let a = step * i as f32;
            Vec2::new(
                CAP_UV_CENTER.x + CAP_UV_RADIUS * a.cos(),
                CAP_UV_CENTER.y - CAP_UV_RADIUS * a.sin(),
            )
        };
        let side_normal = |i: u32| {
            let a = step * i as f32;
            Vec3::new(
                a.cos() * radius,
                radius / height * (radius - top_radius),
                a.sin() * radius,
            )
            .normalize_or_zero()
        };

        let mut vertices = Vec::with_capacity(4 * n as usize + 2);
        vertices.push(Vertex::new(Vec3::new(0.0, half, 0.0), Vec3::Y, CAP_UV_CENTER));
        vertices.extend((0..n).map(|i| Vertex::new(ring(top_radius, half, i), Vec3::Y, cap_uv(i))));
        vertices.push(Vertex::new(Vec3::new(0.0, -half, 0.0), Vec3::NEG_Y, CAP_UV_CENTER));
        vertices.extend(
            (0..n).map(|i| Vertex::new(ring(radius, -half, i), Vec3::NEG_Y, cap_uv(i))),
        );
        vertices.extend((0..n).map(|i| {
            let uv = Vec2::new(SIDE_UV_START - uv_step * i as f32, SIDE_UV_TOP);
            Vertex::new(ring(top_radius, half, i), side_normal(i), uv)
        }));
        vertices.extend((0..n).map(|i| {
            let uv = Vec2::new(SIDE_UV_START - uv_step * i as f32, SIDE_UV_BOTTOM);
            Vertex::new(ring(radius, -half, i), side_normal(i), uv)
        }));

        let mut indices = Vec::with_capacity(12 * n as usize);
        // Top cap fan around vertex 0.
        for i in 1..n {
            indices.extend([0, i + 1, i]);
        }
        indices.extend([0, n, 1]);
        // Bottom cap fan around vertex n + 1.
        let bottom = n + 1;
        for i in bottom + 1..bottom + n {
            indices.extend([bottom, i, i + 1]);
        }
        indices.extend([bottom, 2 * n + 1, bottom + 1]);
        // Side quads between the upper ring (2n+2..) and lower ring (3n+2..).
        let upper = 2 * n + 2;
        let lower = 3 * n + 2;
        for i in upper..lower - 1 {
            indices.extend([i + n + 1, i + n, i, i, i + 1, i + n + 1]);
        }
        indices.extend([lower, 4 * n + 1, lower - 1, lower - 1, upper, lower]);

        Self::new(vertices, indices)
    }

    /// Two-sided leaf card in the YZ plane, rising from the origin.
    pub fn leaf(card: Rectangle) -> Self {
        let w = card.half_size.x;
        let h = card.half_size.y * 2.0;
        let corners = [
            (Vec3::new(0.0, 0.0, w), Vec2::new(0.0, 0.5)),
            (Vec3::new(0.0, 0.0, -w), Vec2::new(0.47, 0.5)),
            (Vec3::new(0.0, h, -w), Vec2::new(0.47, 1.0)),
            (Vec3::new(0.0, h, w), Vec2::new(0.0, 1.0)),
        ];
        let vertices = [Vec3::X, Vec3::NEG_X]
            .into_iter()
            .flat_map(|normal| corners.map(|(p, uv)| Vertex::new(p, normal, uv)))
            .collect();
        let indices = vec![0, 1, 2, 2, 3, 0, 4, 7, 5, 5, 7, 6];
        Self::new(vertices, indices)
    }

    /// UV sphere offset by half its radius on every axis.
    pub fn sphere(sphere: Sphere) -> Self {
        let r = sphere.radius;
        let offset = Vec3::splat(r / 2.0);
        let mut vertices = Vec::with_capacity(((SPHERE_STACKS + 1) * (SPHERE_SLICES + 1)) as usize);
        for i in 0..=SPHERE_STACKS {
            let phi = PI / 2.0 - i as f32 * PI / SPHERE_STACKS as f32;
            for j in 0..=SPHERE_SLICES {
                let theta = j as f32 * TAU / SPHERE_SLICES as f32;
                let n = Vec3::new(phi.cos() * theta.sin(), phi.sin(), phi.cos() * theta.cos());
                let uv = Vec2::new(
                    j as f32 / SPHERE_SLICES as f32,
                    1.0 - i as f32 / SPHERE_STACKS as f32,
                );
                vertices.push(Vertex::new(n * r + offset, n, uv));
            }
        }

        let mut indices = Vec::with_capacity((SPHERE_STACKS * SPHERE_SLICES * 6) as usize);
        let row = SPHERE_SLICES + 1;
        for i in 0..SPHERE_STACKS {
            let curr = i * row;
            let next = (i + 1) * row;
            for j in 0..SPHERE_SLICES {
                indices.extend([curr + j, next + j, next + j + 1]);
                indices.extend([next + j + 1, curr + j + 1, curr + j]);
            }
        }
        Self::new(vertices, indices)
    }
}
