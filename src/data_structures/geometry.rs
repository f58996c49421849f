//! CPU-side triangle meshes shared by scene nodes.
//!
//! A [`Geometry`] is built once and then only read: nodes hold it behind an
//! `Arc`, the renderer uploads it once per distinct allocation.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

use crate::config::TorusConfig;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Axis aligned bounds of a vertex set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BoundingBox {
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// An indexed triangle list (counter-clockwise front faces).
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub label: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            vertices,
            indices,
        }
    }

    /// Ring torus lying in the xy plane, centered at the origin.
    ///
    /// `radius` is the distance from the center to the middle of the tube,
    /// `tube` the tube radius. Seams are duplicated so uvs stay continuous,
    /// which yields `(radial + 1) * (tubular + 1)` vertices.
    pub fn torus(config: &TorusConfig) -> Self {
        let radial = config.radial_segments;
        let tubular = config.tubular_segments;
        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let ring = config.radius + config.tube * v.cos();
                let position = Vector3::new(ring * u.cos(), ring * u.sin(), config.tube * v.sin());
                let center = Vector3::new(config.radius * u.cos(), config.radius * u.sin(), 0.0);
                let normal = (position - center).normalize();
                vertices.push(Vertex {
                    position: position.into(),
                    normal: normal.into(),
                    tex_coords: [i as f32 / tubular as f32, j as f32 / radial as f32],
                });
            }
        }

        let row = tubular + 1;
        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::new("torus", vertices, indices)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first: Vector3<f32> = self.vertices.first()?.position.into();
        let bounds = self.vertices.iter().fold(
            BoundingBox {
                min: first,
                max: first,
            },
            |acc, v| BoundingBox {
                min: Vector3::new(
                    acc.min.x.min(v.position[0]),
                    acc.min.y.min(v.position[1]),
                    acc.min.z.min(v.position[2]),
                ),
                max: Vector3::new(
                    acc.max.x.max(v.position[0]),
                    acc.max.y.max(v.position[1]),
                    acc.max.z.max(v.position[2]),
                ),
            },
        );
        Some(bounds)
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for v in self.vertices.iter_mut() {
            v.position[0] += offset.x;
            v.position[1] += offset.y;
            v.position[2] += offset.z;
        }
    }

    /// Move the vertices so the bounding box is centered on the origin.
    /// Returns the applied offset.
    pub fn center(&mut self) -> Vector3<f32> {
        match self.bounding_box() {
            Some(bounds) => {
                let offset = -bounds.center();
                self.translate(offset);
                offset
            }
            None => Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Nothing to draw, e.g. text made only of spaces.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() || self.vertices.is_empty()
    }
}
