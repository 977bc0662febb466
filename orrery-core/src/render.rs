/// Device resources shared by every body, and scoped binding for drawing them
use log::{info, warn};

use crate::backend::{GraphicsDevice, ImageLoader, ShaderStage, UniformValue};
use crate::config::SceneConfig;
use crate::error::{ShaderError, ViewerError};
use crate::obj::load_obj;
use crate::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};

/// The program, mesh and texture used for the whole run.
///
/// Created once before the frame loop and released once after it.
pub struct SceneResources<D: GraphicsDevice> {
    pub program: D::Program,
    pub mesh: D::Mesh,
    pub texture: D::Texture,
    vertex_count: usize,
}

impl<D: GraphicsDevice> SceneResources<D> {
    /// Build the shader program, then load the mesh and the texture.
    /// Any failure here is fatal for the viewer.
    pub fn load<L: ImageLoader>(device: &mut D, images: &L, scene: &SceneConfig) -> Result<Self, ViewerError> {
        let program = build_program(device, VERTEX_SHADER, FRAGMENT_SHADER)?;

        let mesh_data = match load_obj(&scene.mesh_path) {
            Ok(mesh_data) => mesh_data,
            Err(e) => {
                device.release_program(program);
                return Err(e.into());
            }
        };
        let mesh = device.create_mesh(&mesh_data);

        let image = match images.load_rgba(&scene.texture_path) {
            Ok(image) => image,
            Err(e) => {
                device.release_mesh(mesh);
                device.release_program(program);
                return Err(e.into());
            }
        };
        info!(
            "Texture loaded: {} ({}x{})",
            scene.texture_path.display(),
            image.width(),
            image.height()
        );
        let texture = device.create_texture(&image);

        Ok(Self {
            program,
            mesh,
            texture,
            vertex_count: mesh_data.vertex_count(),
        })
    }

    /// Wrap resources that were created some other way
    pub fn from_parts(program: D::Program, mesh: D::Mesh, texture: D::Texture, vertex_count: usize) -> Self {
        Self {
            program,
            mesh,
            texture,
            vertex_count,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn release(self, device: &mut D) {
        device.release_mesh(self.mesh);
        device.release_texture(self.texture);
        device.release_program(self.program);
    }
}

/// Compile both stages and link them. Compiler warnings are logged; a failed
/// compile or link is returned as an error.
pub fn build_program<D: GraphicsDevice>(device: &mut D, vertex_src: &str, fragment_src: &str) -> Result<D::Program, ShaderError> {
    let vertex = compile_logged(device, ShaderStage::Vertex, vertex_src)?;
    let fragment = match compile_logged(device, ShaderStage::Fragment, fragment_src) {
        Ok(fragment) => fragment,
        Err(e) => {
            device.release_shader(vertex);
            return Err(e);
        }
    };

    let program = device.link_program(&vertex, &fragment);
    device.release_shader(vertex);
    device.release_shader(fragment);
    program
}

fn compile_logged<D: GraphicsDevice>(device: &mut D, stage: ShaderStage, source: &str) -> Result<D::Shader, ShaderError> {
    let compiled = device.compile_shader(stage, source)?;
    if let Some(log) = compiled.log.as_deref().filter(|log| !log.trim().is_empty()) {
        warn!("{} shader log:\n{}", stage, log);
    }
    Ok(compiled.shader)
}

/// Program, mesh and texture bound for the lifetime of the pass.
/// Dropping the pass unbinds them.
pub struct BoundPass<'a, D: GraphicsDevice> {
    device: &'a mut D,
    vertex_count: usize,
}

impl<'a, D: GraphicsDevice> BoundPass<'a, D> {
    pub fn begin(device: &'a mut D, resources: &SceneResources<D>) -> Self {
        device.bind(&resources.program, &resources.mesh, &resources.texture);
        Self {
            device,
            vertex_count: resources.vertex_count,
        }
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.device.set_uniform(name, value);
    }

    /// Draw every vertex of the bound mesh
    pub fn draw_mesh(&mut self) {
        self.device.draw_triangles(self.vertex_count);
    }
}

impl<D: GraphicsDevice> Drop for BoundPass<'_, D> {
    fn drop(&mut self) {
        self.device.unbind();
    }
}
