/// Interleaved vertex data produced by the mesh loader
use crate::vector::{Vec2, Vec3};

/// Floats per vertex: 3 for position, 2 for texture coordinate
pub const VERTEX_STRIDE: usize = 5;

/// One attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: usize,
    /// Byte offset from the start of the vertex
    pub offset: usize,
}

/// Memory layout of an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices
    pub stride: usize,
    pub attributes: [VertexAttribute; 2],
}

impl VertexLayout {
    /// Position (3 floats at byte 0) followed by texcoord (2 floats at byte 12)
    pub const POSITION_TEXCOORD: VertexLayout = VertexLayout {
        stride: VERTEX_STRIDE * 4,
        attributes: [
            VertexAttribute { location: 0, components: 3, offset: 0 },
            VertexAttribute { location: 1, components: 2, offset: 12 },
        ],
    };
}

/// A flat triangle list, `VERTEX_STRIDE` floats per vertex, ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    vertices: Vec<f32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self { vertices: Vec::new() }
    }

    pub fn push_vertex(&mut self, position: Vec3, tex_coord: Vec2) {
        self.vertices
            .extend_from_slice(&[position.x, position.y, position.z, tex_coord.x, tex_coord.y]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn layout(&self) -> VertexLayout {
        VertexLayout::POSITION_TEXCOORD
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.vertices
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let v = &self.vertices[index * VERTEX_STRIDE..];
        Vec3::new(v[0], v[1], v[2])
    }

    pub fn tex_coord(&self, index: usize) -> Vec2 {
        let v = &self.vertices[index * VERTEX_STRIDE..];
        Vec2::new(v[3], v[4])
    }

    /// Axis-aligned bounds of all positions, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = (0..self.vertex_count()).map(|i| self.position(i));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            (
                Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }
}
