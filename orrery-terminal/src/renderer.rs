/// Software rasterizer drawing into a colour framebuffer shown with half blocks
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use orrery_core::{Mat4, Vec3, VertexLayout};
use std::io::Write;

use crate::texture::MipChain;

/// Each terminal cell shows two vertically stacked pixels using this glyph:
/// the foreground paints the upper pixel, the background the lower one
const HALF_BLOCK: char = '▀';

/// Clip-space w below this is treated as at or behind the eye
const MIN_CLIP_W: f32 = 1e-5;

/// RGB colour buffer with a depth buffer, row 0 at the top
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<[u8; 3]>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color: vec![[0; 3]; size],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: [u8; 3]) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.color[y * self.width + x]
    }

    pub fn depth(&self, x: usize, y: usize) -> f32 {
        self.depth[y * self.width + x]
    }

    /// Write `color` if `depth` is nearer than what is stored
    fn depth_test_and_set(&mut self, x: usize, y: usize, depth: f32, color: [u8; 3]) {
        let idx = y * self.width + x;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
        }
    }

    /// Queue the whole buffer to the terminal, two pixel rows per text row
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<([u8; 3], [u8; 3])> = None;
        for row in 0..(self.height + 1) / 2 {
            writer.queue(cursor::MoveTo(0, row as u16))?;
            for x in 0..self.width {
                let top = self.pixel(x, row * 2);
                let bottom = if row * 2 + 1 < self.height {
                    self.pixel(x, row * 2 + 1)
                } else {
                    top
                };

                if current != Some((top, bottom)) {
                    writer.queue(SetForegroundColor(rgb(top)))?;
                    writer.queue(SetBackgroundColor(rgb(bottom)))?;
                    current = Some((top, bottom));
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

/// A vertex after the perspective divide, in pixel coordinates
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    /// NDC depth in [-1, 1]
    z: f32,
    inv_w: f32,
    u_over_w: f32,
    v_over_w: f32,
}

/// An interleaved float buffer read through a [`VertexLayout`]: position
/// at location 0, texture coordinate at location 1
#[derive(Debug, Clone, Copy)]
pub struct VertexStream<'a> {
    data: &'a [f32],
    /// All three in floats, not bytes
    stride: usize,
    position: usize,
    tex_coord: usize,
}

impl<'a> VertexStream<'a> {
    /// `None` when the layout lacks either attribute or they do not fit in
    /// the stride
    pub fn new(data: &'a [f32], layout: &VertexLayout) -> Option<Self> {
        let float_offset = |location: u32, components: usize| {
            layout
                .attributes
                .iter()
                .find(|a| a.location == location && a.components == components && a.offset % 4 == 0)
                .map(|a| a.offset / 4)
        };
        let position = float_offset(0, 3)?;
        let tex_coord = float_offset(1, 2)?;
        let stride = layout.stride / 4;
        if layout.stride % 4 != 0 || position + 3 > stride || tex_coord + 2 > stride {
            return None;
        }
        Some(Self {
            data,
            stride,
            position,
            tex_coord,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn vertex(&self, index: usize) -> (Vec3, (f32, f32)) {
        let v = &self.data[index * self.stride..(index + 1) * self.stride];
        let p = &v[self.position..self.position + 3];
        let t = &v[self.tex_coord..self.tex_coord + 2];
        (Vec3::new(p[0], p[1], p[2]), (t[0], t[1]))
    }
}

/// Draw `vertex_count` vertices of `vertices` as a triangle list.
/// Counter-clockwise triangles face the viewer; the others are culled.
pub fn draw_textured_triangles(
    target: &mut Framebuffer,
    vertices: &VertexStream<'_>,
    vertex_count: usize,
    mvp: &Mat4,
    texture: &MipChain,
) {
    let count = vertex_count.min(vertices.len());
    for first in (0..count / 3).map(|t| t * 3) {
        let mut screen = [None; 3];
        for (i, corner) in screen.iter_mut().enumerate() {
            let (position, tex_coord) = vertices.vertex(first + i);
            *corner = project(target, mvp, position, tex_coord);
        }
        if let [Some(a), Some(b), Some(c)] = screen {
            rasterize_triangle(target, [a, b, c], texture);
        }
    }
}

fn project(target: &Framebuffer, mvp: &Mat4, position: Vec3, (u, v): (f32, f32)) -> Option<ScreenVertex> {
    let [x, y, z, w] = mvp.transform_point(position);
    // No near-plane clipping: triangles crossing the eye plane are dropped
    if w < MIN_CLIP_W || z < -w {
        return None;
    }

    let inv_w = 1.0 / w;
    let (ndc_x, ndc_y, ndc_z) = (x * inv_w, y * inv_w, z * inv_w);
    Some(ScreenVertex {
        x: (ndc_x + 1.0) * 0.5 * target.width as f32,
        y: (1.0 - ndc_y) * 0.5 * target.height as f32,
        z: ndc_z,
        inv_w,
        u_over_w: u * inv_w,
        v_over_w: v * inv_w,
    })
}

fn rasterize_triangle(target: &mut Framebuffer, v: [ScreenVertex; 3], texture: &MipChain) {
    // Screen y points down, so counter-clockwise in NDC is negative here
    let area = (v[1].x - v[0].x) * (v[2].y - v[0].y) - (v[2].x - v[0].x) * (v[1].y - v[0].y);
    if area >= 0.0 {
        return;
    }

    let lod = mip_lod(&v, area.abs(), texture);

    // Bounding box, clipped to the screen
    let min_x = v[0].x.min(v[1].x).min(v[2].x).floor().max(0.0) as usize;
    let max_x = (v[0].x.max(v[1].x).max(v[2].x).ceil() as i64).min(target.width as i64 - 1);
    let min_y = v[0].y.min(v[1].y).min(v[2].y).floor().max(0.0) as usize;
    let max_y = (v[0].y.max(v[1].y).max(v[2].y).ceil() as i64).min(target.height as i64 - 1);
    if max_x < 0 || max_y < 0 {
        return;
    }

    for y in min_y..=max_y as usize {
        for x in min_x..=max_x as usize {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let Some((w0, w1, w2)) = barycentric((v[0].x, v[0].y), (v[1].x, v[1].y), (v[2].x, v[2].y), (px, py)) else {
                continue;
            };
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v[0].z + w1 * v[1].z + w2 * v[2].z;
            if !(-1.0..=1.0).contains(&depth) || depth >= target.depth(x, y) {
                continue;
            }

            let inv_w = w0 * v[0].inv_w + w1 * v[1].inv_w + w2 * v[2].inv_w;
            let u = (w0 * v[0].u_over_w + w1 * v[1].u_over_w + w2 * v[2].u_over_w) / inv_w;
            let t = (w0 * v[0].v_over_w + w1 * v[1].v_over_w + w2 * v[2].v_over_w) / inv_w;
            let [r, g, b, _] = texture.sample(u, t, lod);
            target.depth_test_and_set(x, y, depth, [r, g, b]);
        }
    }
}

/// Mip level from how many texels land on each covered pixel
fn mip_lod(v: &[ScreenVertex; 3], pixel_area: f32, texture: &MipChain) -> f32 {
    let uv = |s: &ScreenVertex| (s.u_over_w / s.inv_w, s.v_over_w / s.inv_w);
    let (u0, t0) = uv(&v[0]);
    let (u1, t1) = uv(&v[1]);
    let (u2, t2) = uv(&v[2]);
    let (width, height) = texture.size();
    let texel_area = ((u1 - u0) * (t2 - t0) - (u2 - u0) * (t1 - t0)).abs() * width as f32 * height as f32;
    if pixel_area <= f32::EPSILON || texel_area <= f32::EPSILON {
        return 0.0;
    }
    (0.5 * (texel_area / pixel_area).log2()).max(0.0)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
