/// A CPU implementation of the graphics device that renders into a
/// [`Framebuffer`].
///
/// Shaders are checked for their interface only; every draw runs the fixed
/// textured pipeline: `uProj * uView * uModel * position`, with the texture
/// sampled at the interpolated texture coordinate.
use log::{debug, trace, warn};
use orrery_core::backend::{Compiled, ShaderStage};
use orrery_core::shaders::{MODEL_UNIFORM, PROJECTION_UNIFORM, TEXTURE_UNIFORM, VIEW_UNIFORM};
use orrery_core::{GraphicsDevice, Mat4, MeshData, ShaderError, TextureImage, UniformValue, VertexLayout};
use std::collections::HashMap;

use crate::renderer::{draw_textured_triangles, Framebuffer, VertexStream};
use crate::shader::{self, CompiledShader, GlslType, LinkedProgram};
use crate::texture::MipChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

struct ProgramState {
    program: LinkedProgram,
    values: HashMap<String, UniformValue>,
}

struct StoredMesh {
    vertices: Vec<f32>,
    layout: VertexLayout,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    program: ProgramId,
    mesh: MeshId,
    texture: TextureId,
}

pub struct SoftwareDevice {
    framebuffer: Framebuffer,
    shaders: HashMap<ShaderId, CompiledShader>,
    programs: HashMap<ProgramId, ProgramState>,
    meshes: HashMap<MeshId, StoredMesh>,
    textures: HashMap<TextureId, MipChain>,
    bound: Option<Binding>,
    next_id: u32,
}

impl SoftwareDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: Framebuffer::new(width as usize, height as usize),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            bound: None,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of live resources of every kind
    pub fn live_resources(&self) -> usize {
        self.shaders.len() + self.programs.len() + self.meshes.len() + self.textures.len()
    }

    fn uniform_matrix(values: &HashMap<String, UniformValue>, name: &str) -> Mat4 {
        match values.get(name) {
            Some(UniformValue::Mat4(m)) => *m,
            _ => Mat4::identity(),
        }
    }
}

impl GraphicsDevice for SoftwareDevice {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Mesh = MeshId;
    type Texture = TextureId;
    type Surface = Framebuffer;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Compiled<ShaderId>, ShaderError> {
        let compiled = shader::compile(stage, source)?;
        let id = ShaderId(self.allocate_id());
        self.shaders.insert(id, compiled.shader);
        debug!("Compiled {} shader {:?}", stage, id);
        Ok(Compiled {
            shader: id,
            log: compiled.log,
        })
    }

    fn link_program(&mut self, vertex: &ShaderId, fragment: &ShaderId) -> Result<ProgramId, ShaderError> {
        let (Some(vertex), Some(fragment)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            return Err(ShaderError::Link {
                log: "error: shader handle is not valid".to_string(),
            });
        };
        let program = shader::link(vertex, fragment)?;
        let id = ProgramId(self.allocate_id());
        self.programs.insert(
            id,
            ProgramState {
                program,
                values: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> MeshId {
        let id = MeshId(self.allocate_id());
        self.meshes.insert(
            id,
            StoredMesh {
                vertices: mesh.as_slice().to_vec(),
                layout: mesh.layout(),
            },
        );
        debug!("Uploaded mesh {:?} with {} vertices", id, mesh.vertex_count());
        id
    }

    fn create_texture(&mut self, image: &TextureImage) -> TextureId {
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, MipChain::from_image(image));
        id
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.framebuffer.resize(width as usize, height as usize);
    }

    fn clear(&mut self, color: [f32; 3]) {
        self.framebuffer
            .clear(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
    }

    fn bind(&mut self, program: &ProgramId, mesh: &MeshId, texture: &TextureId) {
        self.bound = Some(Binding {
            program: *program,
            mesh: *mesh,
            texture: *texture,
        });
    }

    fn unbind(&mut self) {
        self.bound = None;
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(binding) = self.bound else {
            warn!("Uniform {} set with no program bound", name);
            return;
        };
        let Some(state) = self.programs.get_mut(&binding.program) else {
            return;
        };

        let accepted = match (state.program.uniform_type(name), value) {
            (None, _) => {
                trace!("Ignoring unknown uniform {}", name);
                return;
            }
            (Some(GlslType::Mat4), UniformValue::Mat4(_)) => true,
            (Some(GlslType::Int | GlslType::Sampler2D), UniformValue::Int(_)) => true,
            _ => false,
        };
        if accepted {
            state.values.insert(name.to_string(), value);
        } else {
            warn!("Uniform {} does not accept {:?}", name, value);
        }
    }

    fn draw_triangles(&mut self, vertex_count: usize) {
        let Some(binding) = self.bound else {
            warn!("Draw call with nothing bound");
            return;
        };
        let (Some(state), Some(mesh), Some(texture)) = (
            self.programs.get(&binding.program),
            self.meshes.get(&binding.mesh),
            self.textures.get(&binding.texture),
        ) else {
            warn!("Draw call with released resources");
            return;
        };

        let Some(vertices) = VertexStream::new(&mesh.vertices, &mesh.layout) else {
            warn!("Mesh {:?} has no position/texcoord layout the rasterizer can read", binding.mesh);
            return;
        };

        if let Some(UniformValue::Int(unit)) = state.values.get(TEXTURE_UNIFORM) {
            if *unit != 0 {
                warn!("Only texture unit 0 exists, sampler set to {}", unit);
            }
        }

        let mvp = Self::uniform_matrix(&state.values, PROJECTION_UNIFORM)
            * Self::uniform_matrix(&state.values, VIEW_UNIFORM)
            * Self::uniform_matrix(&state.values, MODEL_UNIFORM);
        draw_textured_triangles(&mut self.framebuffer, &vertices, vertex_count, &mvp, texture);
    }

    fn release_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn release_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
    }

    fn release_mesh(&mut self, mesh: MeshId) {
        self.meshes.remove(&mesh);
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn surface(&self) -> &Framebuffer {
        &self.framebuffer
    }
}
