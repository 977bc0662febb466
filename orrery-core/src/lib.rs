/// Orrery Core Library - math, mesh loading and the frame loop
///
/// This library holds everything that does not depend on a particular window
/// or graphics backend: vector and matrix math, the OBJ loader, the orbiting
/// bodies, the camera, and the frame loop that drives backend traits.

pub mod backend;
pub mod body;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod render;
pub mod shaders;
pub mod transform;
pub mod vector;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use backend::{GraphicsDevice, ImageLoader, Key, TextureImage, UniformValue, Window, WindowEvent};
pub use body::{BodyGenerator, SceneBody};
pub use config::ViewerConfig;
pub use error::{ParseError, ResourceLoadError, ShaderError, ViewerError};
pub use frame::{run_frame, run_frame_loop, FrameOutcome, FrameSettings, FrameState};
pub use geometry::{MeshData, VertexLayout, VERTEX_STRIDE};
pub use projection::{CameraInput, CameraSpeeds, CameraState, Projection};
pub use render::{BoundPass, SceneResources};
pub use transform::Mat4;
pub use vector::{Vec2, Vec3};
