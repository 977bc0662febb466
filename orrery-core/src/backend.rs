/// Interfaces the viewer drives but does not implement: the graphics device,
/// the window with its input, and the texture image decoder.
use std::fmt;
use std::io;
use std::path::Path;

use crate::error::{ResourceLoadError, ShaderError};
use crate::geometry::MeshData;
use crate::transform::Mat4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A successfully compiled stage along with any non-fatal compiler output
#[derive(Debug)]
pub struct Compiled<T> {
    pub shader: T,
    pub log: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Int(i32),
}

/// RGBA8 pixels, rows stored bottom-up so that row 0 is sampled at v = 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceLoadError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected || expected == 0 {
            return Err(ResourceLoadError::InvalidSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Decodes image files into [`TextureImage`]s
pub trait ImageLoader {
    fn load_rgba(&self, path: &Path) -> Result<TextureImage, ResourceLoadError>;
}

/// GPU-side resources and draw submission.
///
/// Handles are opaque to the viewer. Binding is normally done through
/// [`crate::render::BoundPass`], which pairs every `bind` with an `unbind`.
pub trait GraphicsDevice {
    type Shader;
    type Program;
    type Mesh;
    type Texture;
    /// What the window needs in order to present a finished frame
    type Surface;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Compiled<Self::Shader>, ShaderError>;

    fn link_program(&mut self, vertex: &Self::Shader, fragment: &Self::Shader) -> Result<Self::Program, ShaderError>;

    /// Upload an interleaved buffer; attributes are read with `mesh.layout()`
    fn create_mesh(&mut self, mesh: &MeshData) -> Self::Mesh;

    /// Upload an image and generate its mip levels
    fn create_texture(&mut self, image: &TextureImage) -> Self::Texture;

    fn set_viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, color: [f32; 3]);

    fn bind(&mut self, program: &Self::Program, mesh: &Self::Mesh, texture: &Self::Texture);

    fn unbind(&mut self);

    /// Set a uniform on the bound program. Unknown names are ignored.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Draw `vertex_count` vertices of the bound mesh as a triangle list
    fn draw_triangles(&mut self, vertex_count: usize);

    fn release_shader(&mut self, shader: Self::Shader);

    fn release_program(&mut self, program: Self::Program);

    fn release_mesh(&mut self, mesh: Self::Mesh);

    fn release_texture(&mut self, texture: Self::Texture);

    fn surface(&self) -> &Self::Surface;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Closed,
    Resized { width: u32, height: u32 },
}

/// Keys the camera controls listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LShift,
    Left,
    Right,
    Up,
    Down,
}

pub trait Window {
    type Surface;

    /// Next pending event, or `None` once the queue is drained
    fn poll_event(&mut self) -> io::Result<Option<WindowEvent>>;

    fn is_key_down(&self, key: Key) -> bool;

    /// Seconds since the previous call
    fn elapsed_seconds(&mut self) -> f32;

    /// Drawable size in pixels
    fn size(&self) -> (u32, u32);

    /// Show the finished frame. May block to limit the frame rate.
    fn present(&mut self, surface: &Self::Surface) -> io::Result<()>;
}
