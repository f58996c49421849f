//! Extruded text geometry.
//!
//! Glyph outlines are laid out by [`Typeface::text_path`], filled with lyon's
//! tessellator for the front and back caps and flattened into closed contours
//! for the side walls. The result is a plain [`Geometry`] spanning
//! `z ∈ [-bevel, depth + bevel]` (bevel only when enabled), which callers
//! usually [`center`](Geometry::center) afterwards.

use lyon::math::Point;
use lyon::path::{Path, PathEvent, iterator::PathIterator};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use crate::{
    config::TextConfig,
    data_structures::geometry::{Geometry, Vertex},
    error::{Result, SceneError},
    resources::font::Typeface,
};

/// Flattening tolerance for a given curve resolution. More segments, finer curves.
pub fn curve_tolerance(size: f32, curve_segments: u32) -> f32 {
    (size / (curve_segments.max(1) as f32 * 20.0)).max(1e-4)
}

/// Build the centered-ready text mesh for `config.content`.
pub fn build_text_geometry(font: &Typeface, config: &TextConfig) -> Result<Geometry> {
    let path = font.text_path(&config.content, config.size)?;
    let tolerance = curve_tolerance(config.size, config.curve_segments);
    let bevel = if config.bevel_enabled {
        config.bevel_thickness
    } else {
        0.0
    };
    extrude_path(&path, -bevel, config.depth + bevel, tolerance, &config.content)
}

/// Extrude a filled 2D path between `z_back` and `z_front`.
pub fn extrude_path(
    path: &Path,
    z_back: f32,
    z_front: f32,
    tolerance: f32,
    label: &str,
) -> Result<Geometry> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let caps = tessellate_caps(path, tolerance)?;
    push_cap(&mut vertices, &mut indices, &caps, z_front, true);
    push_cap(&mut vertices, &mut indices, &caps, z_back, false);

    let contours = oriented_contours(path, tolerance);
    for contour in contours.iter() {
        push_walls(&mut vertices, &mut indices, contour, z_back, z_front);
    }

    Ok(Geometry::new(label, vertices, indices))
}

fn tessellate_caps(path: &Path, tolerance: f32) -> Result<VertexBuffers<[f32; 2], u32>> {
    let mut tessellator = FillTessellator::new();
    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    // even-odd keeps counters (the holes in `o`, `A`, ...) open regardless of contour direction
    let options = FillOptions::tolerance(tolerance).with_fill_rule(FillRule::EvenOdd);
    tessellator
        .tessellate_path(
            path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position().to_array()),
        )
        .map_err(|e| SceneError::Geometry(format!("text tessellation failed: {e:?}")))?;
    Ok(buffers)
}

fn signed_area(points: &[[f32; 2]]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p[0] * q[1] - q[0] * p[1]
        })
        .sum::<f32>()
        * 0.5
}

fn push_cap(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    caps: &VertexBuffers<[f32; 2], u32>,
    z: f32,
    front: bool,
) {
    let base = vertices.len() as u32;
    let normal = if front { [0.0, 0.0, 1.0] } else { [0.0, 0.0, -1.0] };
    vertices.extend(caps.vertices.iter().map(|p| Vertex {
        position: [p[0], p[1], z],
        normal,
        tex_coords: *p,
    }));
    for tri in caps.indices.chunks_exact(3) {
        let area = signed_area(&[
            caps.vertices[tri[0] as usize],
            caps.vertices[tri[1] as usize],
            caps.vertices[tri[2] as usize],
        ]);
        // front faces wind counter-clockwise seen from +z, back faces seen from -z
        let (a, b, c) = if (area >= 0.0) == front {
            (tri[0], tri[1], tri[2])
        } else {
            (tri[0], tri[2], tri[1])
        };
        indices.extend_from_slice(&[base + a, base + b, base + c]);
    }
}

/// Flattened closed contours, counter-clockwise for outlines and clockwise for holes.
fn oriented_contours(path: &Path, tolerance: f32) -> Vec<Vec<[f32; 2]>> {
    let mut contours: Vec<Vec<[f32; 2]>> = Vec::new();
    let mut current: Vec<[f32; 2]> = Vec::new();
    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current = vec![at.to_array()];
            }
            PathEvent::Line { to, .. } => current.push(to.to_array()),
            PathEvent::End { first, .. } => {
                if current.last().is_some_and(|last| same_point(*last, first)) && current.len() > 1 {
                    current.pop();
                }
                if current.len() >= 3 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            // flattening only emits lines
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }

    let depths: Vec<usize> = contours
        .iter()
        .enumerate()
        .map(|(i, contour)| {
            contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && contains(other, contour[0]))
                .count()
        })
        .collect();

    contours
        .into_iter()
        .zip(depths)
        .map(|(mut contour, depth)| {
            let is_hole = depth % 2 == 1;
            let ccw = signed_area(&contour) > 0.0;
            if ccw == is_hole {
                contour.reverse();
            }
            contour
        })
        .collect()
}

fn same_point(a: [f32; 2], b: Point) -> bool {
    (a[0] - b.x).abs() < 1e-6 && (a[1] - b.y).abs() < 1e-6
}

/// Even-odd ray cast.
fn contains(polygon: &[[f32; 2]], p: [f32; 2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0];
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn push_walls(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    contour: &[[f32; 2]],
    z_back: f32,
    z_front: f32,
) {
    let n = contour.len();
    for i in 0..n {
        let p = contour[i];
        let q = contour[(i + 1) % n];
        let (dx, dy) = (q[0] - p[0], q[1] - p[1]);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            continue;
        }
        // material lies left of the walking direction, so the right-hand side faces out
        let normal = [dy / len, -dx / len, 0.0];
        let base = vertices.len() as u32;
        for (xy, z) in [(p, z_back), (q, z_back), (q, z_front), (p, z_front)] {
            vertices.push(Vertex {
                position: [xy[0], xy[1], z],
                normal,
                tex_coords: [0.0, 0.0],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}
