//! Mesh data structures and generation

use crate::backend::types::Vertex;
use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Identifier of a mesh uploaded to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let mut mesh = Mesh::new("cube");

        // (normal, u axis, v axis) per face; corners go counter-clockwise
        // when seen from outside
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (face, (normal, u_axis, v_axis)) in faces.into_iter().enumerate() {
            let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
            for (cu, cv) in corners {
                mesh.vertices.push(Vertex {
                    position: normal * 0.5 + u_axis * cu + v_axis * cv,
                    normal,
                    uv: Vec2::new(cu + 0.5, 0.5 - cv),
                    tangent: u_axis.extend(1.0),
                });
            }

            let base = face as u32 * 4;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a subdivided icosahedron.
    ///
    /// Every subdivision splits each triangle into four, so the result has
    /// `20 * 4^subdivisions` triangles and `10 * 4^subdivisions + 2` shared
    /// vertices, all exactly `radius` away from `center`.
    pub fn icosphere(center: Vec3, radius: f32, subdivisions: u32) -> Self {
        let t = (1.0 + 5.0f32.sqrt()) / 2.0;

        let mut directions: Vec<Vec3> = [
            (-1.0, t, 0.0),
            (1.0, t, 0.0),
            (-1.0, -t, 0.0),
            (1.0, -t, 0.0),
            (0.0, -1.0, t),
            (0.0, 1.0, t),
            (0.0, -1.0, -t),
            (0.0, 1.0, -t),
            (t, 0.0, -1.0),
            (t, 0.0, 1.0),
            (-t, 0.0, -1.0),
            (-t, 0.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
        .collect();

        let mut triangles: Vec<[u32; 3]> = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
            let mut midpoint = |a: u32, b: u32, directions: &mut Vec<Vec3>| -> u32 {
                let key = (a.min(b), a.max(b));
                *midpoints.entry(key).or_insert_with(|| {
                    let mid = (directions[a as usize] + directions[b as usize]).normalize();
                    directions.push(mid);
                    directions.len() as u32 - 1
                })
            };

            let mut next = Vec::with_capacity(triangles.len() * 4);
            for [a, b, c] in triangles {
                let ab = midpoint(a, b, &mut directions);
                let bc = midpoint(b, c, &mut directions);
                let ca = midpoint(c, a, &mut directions);
                next.push([a, ab, ca]);
                next.push([b, bc, ab]);
                next.push([c, ca, bc]);
                next.push([ab, bc, ca]);
            }
            triangles = next;
        }

        let mut mesh = Mesh::new("icosphere");
        mesh.vertices = directions
            .iter()
            .map(|&n| {
                let uv = Vec2::new(
                    0.5 + n.y.atan2(n.x) / std::f32::consts::TAU,
                    0.5 - n.z.asin() / std::f32::consts::PI,
                );
                let tangent = Vec3::Z.cross(n);
                let tangent = if tangent.length_squared() > 1e-6 {
                    tangent.normalize()
                } else {
                    Vec3::X
                };
                Vertex {
                    position: center + n * radius,
                    normal: n,
                    uv,
                    tangent: tangent.extend(1.0),
                }
            })
            .collect();
        mesh.indices = triangles.into_iter().flatten().collect();
        mesh
    }

    /// Turn the mesh inside out: reverse triangle winding and flip normals
    pub fn invert_faces(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
            vertex.tangent = (-vertex.tangent.truncate()).extend(vertex.tangent.w);
        }
    }

    /// Recompute smooth vertex normals by accumulating face normals
    pub fn compute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = self.vertices[a].position;
            let face = (self.vertices[b].position - pa).cross(self.vertices[c].position - pa);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = normal.normalize_or_zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outward_faces(mesh: &Mesh, center: Vec3) -> bool {
        mesh.indices.chunks_exact(3).all(|tri| {
            let [a, b, c] = [
                mesh.vertices[tri[0] as usize].position,
                mesh.vertices[tri[1] as usize].position,
                mesh.vertices[tri[2] as usize].position,
            ];
            let normal = (b - a).cross(c - a);
            normal.dot((a + b + c) / 3.0 - center) > 0.0
        })
    }

    #[test]
    fn icosahedron_has_twenty_faces() {
        let mesh = Mesh::icosphere(Vec3::ZERO, 1.0, 0);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 20);
    }

    #[test]
    fn subdivision_shares_midpoints() {
        let mesh = Mesh::icosphere(Vec3::ZERO, 1.0, 2);
        assert_eq!(mesh.triangle_count(), 20 * 16);
        assert_eq!(mesh.vertex_count(), 10 * 16 + 2);
    }

    #[test]
    fn icosphere_vertices_lie_on_radius() {
        let center = Vec3::new(1.0, -2.0, 0.5);
        let mesh = Mesh::icosphere(center, 2.5, 3);
        for v in &mesh.vertices {
            assert!(((v.position - center).length() - 2.5).abs() < 1e-4);
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
        }
        assert!(outward_faces(&mesh, center));
    }

    #[test]
    fn invert_faces_points_inward() {
        let mut mesh = Mesh::icosphere(Vec3::ZERO, 1.0, 1);
        let before = mesh.vertices[0].normal;
        mesh.invert_faces();
        assert!((mesh.vertices[0].normal + before).length() < 1e-6);
        assert!(!outward_faces(&mesh, Vec3::ZERO));
        assert!(mesh
            .indices
            .chunks_exact(3)
            .all(|tri| {
                let [a, b, c] = [
                    mesh.vertices[tri[0] as usize].position,
                    mesh.vertices[tri[1] as usize].position,
                    mesh.vertices[tri[2] as usize].position,
                ];
                (b - a).cross(c - a).dot(a) < 0.0
            }));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let mesh = Mesh::cube();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(outward_faces(&mesh, Vec3::ZERO));
    }

    #[test]
    fn compute_normals_on_flat_quad() {
        let mut mesh = Mesh::new("quad");
        for p in [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y] {
            mesh.vertices.push(Vertex {
                position: p,
                normal: Vec3::ZERO,
                uv: Vec2::ZERO,
                tangent: Vec4::ZERO,
            });
        }
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh.compute_normals();
        for v in &mesh.vertices {
            assert!((v.normal - Vec3::Z).length() < 1e-5);
        }
    }
}
