/// Terminal front end for the orrery viewer
///
/// Renders the scene with a software rasterizer and shows it in the terminal
/// using half-block characters with 24-bit colour.
use log::info;
use orrery_core::{
    run_frame_loop, FrameSettings, FrameState, GraphicsDevice, SceneBody, SceneResources, ViewerConfig, ViewerError,
    Window,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod device;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod window;

pub use device::SoftwareDevice;
pub use renderer::Framebuffer;
pub use texture::ImageCrateLoader;
pub use window::TerminalWindow;

/// Load everything, run the viewer until the window closes, then release
/// the device resources. Returns the number of frames drawn.
pub fn run(config: &ViewerConfig) -> Result<u64, ViewerError> {
    let (cols, rows) = crossterm::terminal::size()?;
    let (width, height) = window::pixel_size(cols, rows);
    let mut device = SoftwareDevice::new(width, height);

    let resources = SceneResources::load(&mut device, &ImageCrateLoader, &config.scene)?;

    let mut rng = match config.scene.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let bodies = config.body_generator().generate(&mut rng);
    info!("Generated {} bodies", bodies.len());

    let result = run_window(config, &mut device, &resources, bodies);
    resources.release(&mut device);
    result
}

fn run_window(
    config: &ViewerConfig,
    device: &mut SoftwareDevice,
    resources: &SceneResources<SoftwareDevice>,
    bodies: Vec<SceneBody>,
) -> Result<u64, ViewerError> {
    let mut window = TerminalWindow::open(config.display.target_fps)?;

    let settings = FrameSettings::from_config(config);
    let (width, height) = window.size();
    device.set_viewport(width, height);
    let mut state = FrameState {
        camera: config.camera_state(),
        projection: settings.projection.matrix(width, height),
        bodies,
    };

    let frames = run_frame_loop(&mut window, device, resources, &settings, &mut state)?;
    info!("Viewer closed after {} frames", frames);
    Ok(frames)
}
