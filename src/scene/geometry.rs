//! Mesh generation for scene primitives
//!
//! Generates indexed triangle meshes for the primitives a scene description
//! can name. Parameterisation follows the common scene-graph conventions:
//! tori lie in the XY plane facing +Z, cylinders run along Y, and an
//! icosahedron of detail `n` splits every face into `(n + 1)^2` triangles.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::{PI, TAU};

use crate::scene::description::Geometry;

/// Vertex data for GPU rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position of the vertex
    pub position: [f32; 3],
    /// Surface normal (normalized)
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex, normalizing the supplied normal
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.normalize_or_zero().to_array(),
            uv,
        }
    }

    /// Returns the vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // UV
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data for the mesh
    pub vertices: Vec<Vertex>,
    /// Triangle indices (3 per triangle)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Generate the mesh for a scene geometry
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Self::sphere(radius, width_segments, height_segments),
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => Self::torus(radius, tube, radial_segments, tubular_segments),
            Geometry::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => Self::cylinder(radius_top, radius_bottom, height, radial_segments),
            Geometry::Icosahedron { radius, detail } => Self::icosahedron(radius, detail),
        }
    }

    /// UV sphere (latitude/longitude grid)
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let lon_segments = width_segments.max(3);
        let lat_segments = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((lat_segments + 1) * (lon_segments + 1)) as usize);
        let mut indices = Vec::new();

        for lat in 0..=lat_segments {
            let theta = (lat as f32 / lat_segments as f32) * PI; // 0 to PI (top to bottom)
            let sin_theta = theta.sin();
            let cos_theta = theta.cos();

            for lon in 0..=lon_segments {
                let phi = (lon as f32 / lon_segments as f32) * TAU;
                let normal = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
                let uv = [lon as f32 / lon_segments as f32, lat as f32 / lat_segments as f32];
                vertices.push(Vertex::new(normal * radius, normal, uv));
            }
        }

        for lat in 0..lat_segments {
            for lon in 0..lon_segments {
                let current = lat * (lon_segments + 1) + lon;
                let next = current + lon_segments + 1;

                // Skip degenerate triangles at the poles
                if lat != 0 {
                    indices.extend_from_slice(&[current, current + 1, next]);
                }
                if lat != lat_segments - 1 {
                    indices.extend_from_slice(&[current + 1, next + 1, next]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Torus centred on the origin in the XY plane
    ///
    /// `radius` is the distance from the centre to the middle of the tube,
    /// `tube` the tube radius.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial_segments + 1) * (tubular_segments + 1)) as usize);
        let mut indices = Vec::new();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let centre = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let uv = [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ];
                vertices.push(Vertex::new(position, position - centre, uv));
            }
        }

        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = (tubular_segments + 1) * j + i - 1;
                let b = (tubular_segments + 1) * (j - 1) + i - 1;
                let c = (tubular_segments + 1) * (j - 1) + i;
                let d = (tubular_segments + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// Capped cylinder (or cone frustum) along the Y axis, centred on the origin
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side wall: two rings
        for (row, (y, r)) in [(half_height, radius_top), (-half_height, radius_bottom)]
            .into_iter()
            .enumerate()
        {
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let theta = u * TAU;
                let (sin, cos) = theta.sin_cos();
                let position = Vec3::new(r * sin, y, r * cos);
                let normal = Vec3::new(sin, slope, cos);
                vertices.push(Vertex::new(position, normal, [u, row as f32]));
            }
        }
        for x in 0..radial_segments {
            let a = x;
            let b = radial_segments + 1 + x;
            let c = radial_segments + 2 + x;
            let d = x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        // Caps
        for (top, y, r) in [(true, half_height, radius_top), (false, -half_height, radius_bottom)] {
            if r <= 0.0 {
                continue;
            }
            let sign = if top { 1.0 } else { -1.0 };
            let normal = Vec3::new(0.0, sign, 0.0);
            let centre = vertices.len() as u32;
            vertices.push(Vertex::new(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]));
            let ring_start = vertices.len() as u32;
            for x in 0..=radial_segments {
                let theta = x as f32 / radial_segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                let uv = [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5];
                vertices.push(Vertex::new(Vec3::new(r * sin, y, r * cos), normal, uv));
            }
            for x in 0..radial_segments {
                let i = ring_start + x;
                if top {
                    indices.extend_from_slice(&[i, i + 1, centre]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, centre]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Icosahedron subdivided `detail` times per edge and projected onto
    /// the sphere of the given radius
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let corners = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ];
        const FACES: [[usize; 3]; 20] = [
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

        let cols = detail + 1;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for face in FACES {
            let [a, b, c] = face.map(|i| corners[i]);
            // Triangular grid of points over the face, row i has cols - i + 1 points
            let base = vertices.len() as u32;
            let mut row_start = Vec::with_capacity(cols as usize + 1);
            for i in 0..=cols {
                row_start.push(vertices.len() as u32 - base);
                let start = a.lerp(c, i as f32 / cols as f32);
                let end = b.lerp(c, i as f32 / cols as f32);
                let rows = cols - i;
                for j in 0..=rows {
                    let point = if rows == 0 {
                        start
                    } else {
                        start.lerp(end, j as f32 / rows as f32)
                    };
                    let direction = point.normalize();
                    vertices.push(Vertex::new(direction * radius, direction, spherical_uv(direction)));
                }
            }
            for i in 0..cols {
                let rows = cols - i;
                for j in 0..rows {
                    let p00 = base + row_start[i as usize] + j;
                    let p01 = p00 + 1;
                    let p10 = base + row_start[i as usize + 1] + j;
                    indices.extend_from_slice(&[p00, p01, p10]);
                    if j + 1 < rows {
                        let p11 = p10 + 1;
                        indices.extend_from_slice(&[p01, p11, p10]);
                    }
                }
            }
        }

        Self { vertices, indices }
    }

    /// Get the number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get vertex data as bytes for GPU buffer creation
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes for GPU buffer creation
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn spherical_uv(direction: Vec3) -> [f32; 2] {
    let u = direction.z.atan2(-direction.x) / TAU + 0.5;
    let v = direction.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
    [u, v]
}
