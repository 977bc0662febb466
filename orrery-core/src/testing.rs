/// Recording fakes for the device and window traits
use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::Path;

use crate::backend::{
    Compiled, GraphicsDevice, ImageLoader, Key, ShaderStage, TextureImage, UniformValue, Window, WindowEvent,
};
use crate::error::{ResourceLoadError, ShaderError};
use crate::geometry::MeshData;
use crate::render::SceneResources;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Compile(ShaderStage),
    Link,
    CreateMesh(usize),
    CreateTexture(u32, u32),
    Viewport(u32, u32),
    Clear,
    Bind,
    Unbind,
    Uniform(String, UniformValue),
    Draw(usize),
    ReleaseShader,
    ReleaseProgram,
    ReleaseMesh,
    ReleaseTexture,
}

impl DeviceCall {
    pub fn label(&self) -> String {
        match self {
            DeviceCall::Uniform(name, _) => format!("uniform {}", name),
            DeviceCall::Draw(count) => format!("draw {}", count),
            DeviceCall::Clear => "clear".to_string(),
            DeviceCall::Bind => "bind".to_string(),
            DeviceCall::Unbind => "unbind".to_string(),
            other => format!("{:?}", other),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<DeviceCall>,
    pub fail_link: bool,
    pub compile_log: Option<String>,
    pub(crate) surface: (),
}

impl RecordingDevice {
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }
}

impl GraphicsDevice for RecordingDevice {
    type Shader = ShaderStage;
    type Program = ();
    type Mesh = usize;
    type Texture = ();
    type Surface = ();

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<Compiled<ShaderStage>, ShaderError> {
        self.calls.push(DeviceCall::Compile(stage));
        Ok(Compiled {
            shader: stage,
            log: self.compile_log.clone(),
        })
    }

    fn link_program(&mut self, _vertex: &ShaderStage, _fragment: &ShaderStage) -> Result<(), ShaderError> {
        self.calls.push(DeviceCall::Link);
        if self.fail_link {
            return Err(ShaderError::Link {
                log: "varying mismatch".to_string(),
            });
        }
        Ok(())
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> usize {
        self.calls.push(DeviceCall::CreateMesh(mesh.vertex_count()));
        mesh.vertex_count()
    }

    fn create_texture(&mut self, image: &TextureImage) {
        self.calls.push(DeviceCall::CreateTexture(image.width(), image.height()));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(DeviceCall::Viewport(width, height));
    }

    fn clear(&mut self, _color: [f32; 3]) {
        self.calls.push(DeviceCall::Clear);
    }

    fn bind(&mut self, _program: &(), _mesh: &usize, _texture: &()) {
        self.calls.push(DeviceCall::Bind);
    }

    fn unbind(&mut self) {
        self.calls.push(DeviceCall::Unbind);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.calls.push(DeviceCall::Uniform(name.to_string(), value));
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        self.calls.push(DeviceCall::Draw(vertex_count));
    }

    fn release_shader(&mut self, _shader: ShaderStage) {
        self.calls.push(DeviceCall::ReleaseShader);
    }

    fn release_program(&mut self, _program: ()) {
        self.calls.push(DeviceCall::ReleaseProgram);
    }

    fn release_mesh(&mut self, _mesh: usize) {
        self.calls.push(DeviceCall::ReleaseMesh);
    }

    fn release_texture(&mut self, _texture: ()) {
        self.calls.push(DeviceCall::ReleaseTexture);
    }

    fn surface(&self) -> &() {
        &self.surface
    }
}

pub fn test_resources(device: &mut RecordingDevice, vertex_count: usize) -> SceneResources<RecordingDevice> {
    let resources = SceneResources::from_parts((), vertex_count, (), vertex_count);
    device.take_calls();
    resources
}

/// Hands out one batch of events per frame; the batch is picked up when the
/// frame asks for its elapsed time
pub struct ScriptedWindow {
    frames: VecDeque<Vec<WindowEvent>>,
    pending: VecDeque<WindowEvent>,
    dt: f32,
    pub held: HashSet<Key>,
    pub presented: usize,
}

impl ScriptedWindow {
    pub fn new(frames: Vec<Vec<WindowEvent>>, dt: f32) -> Self {
        Self {
            frames: frames.into(),
            pending: VecDeque::new(),
            dt,
            held: HashSet::new(),
            presented: 0,
        }
    }
}

impl Window for ScriptedWindow {
    type Surface = ();

    fn poll_event(&mut self) -> io::Result<Option<WindowEvent>> {
        Ok(self.pending.pop_front())
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn elapsed_seconds(&mut self) -> f32 {
        self.pending = self.frames.pop_front().unwrap_or_default().into();
        self.dt
    }

    fn size(&self) -> (u32, u32) {
        (4, 3)
    }

    fn present(&mut self, _surface: &()) -> io::Result<()> {
        self.presented += 1;
        Ok(())
    }
}

/// Returns a blank image of a fixed size, or always fails
pub struct FixedImageLoader {
    size: Option<(u32, u32)>,
}

impl FixedImageLoader {
    pub fn ok(width: u32, height: u32) -> Self {
        Self {
            size: Some((width, height)),
        }
    }

    pub fn failing() -> Self {
        Self { size: None }
    }
}

impl ImageLoader for FixedImageLoader {
    fn load_rgba(&self, path: &Path) -> Result<TextureImage, ResourceLoadError> {
        match self.size {
            Some((width, height)) => TextureImage::new(width, height, vec![255; (width * height * 4) as usize]),
            None => Err(ResourceLoadError::Decode {
                path: path.to_path_buf(),
                reason: "unsupported image format".to_string(),
            }),
        }
    }
}
