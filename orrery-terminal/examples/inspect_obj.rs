/// Example: Load an OBJ file and print what the viewer would upload
///
/// Usage: cargo run --example inspect_obj -- path/to/model.obj

use std::env;
use std::process::ExitCode;
use orrery_core::obj::load_obj;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <obj-file>", args[0]);
        return ExitCode::FAILURE;
    }

    let obj_path = &args[1];
    println!("Loading OBJ file: {}", obj_path);

    let mesh = match load_obj(obj_path) {
        Ok(mesh) => mesh,
        Err(e) => {
            eprintln!("Failed to load OBJ: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let layout = mesh.layout();
    println!("Vertices:  {}", mesh.vertex_count());
    println!("Triangles: {}", mesh.vertex_count() / 3);
    println!("Stride:    {} bytes", layout.stride);
    if let Some((min, max)) = mesh.bounds() {
        println!("Bounds:    ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})", min.x, min.y, min.z, max.x, max.y, max.z);
    }
    ExitCode::SUCCESS
}
