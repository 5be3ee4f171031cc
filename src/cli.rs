//! Command-line driver.
//!
//! ## Commands
//! - `inspect` - Load a mesh (or the built-in sky box and cube) and report its buffers
//! - `orbit` - Replay drags and wheel steps through the orbit camera and print the result

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use winit::event::MouseButton;

use crate::config::ViewerConfig;
use crate::geometry::SceneData;
use crate::input::{InteractionEvent, Key, ScrollDirection};
use crate::mesh::{MaterialVertex, Mesh, MeshBuffers, MeshOptions, Vertex, VertexRecord};
use crate::orbit_camera::OrbitCamera;

/// Orbit viewer and mesh buffer inspector
#[derive(Parser)]
#[command(name = "crystal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build GPU buffers for a mesh and report their sizes
    Inspect {
        /// Model file; the built-in sky box and cube scene when omitted
        path: Option<PathBuf>,

        /// Emit material-carrying 64-byte vertices
        #[arg(long)]
        lit: bool,

        /// Fail on the first malformed face instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Replay mouse interaction through the orbit camera
    Orbit {
        /// Drag by DX,DY pixels from the viewport centre (repeatable)
        #[arg(short, long, value_parser = parse_drag, allow_hyphen_values = true)]
        drag: Vec<(f32, f32)>,

        /// Wheel steps at the viewport centre, negative to zoom out
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        scroll: i32,

        /// Depth-buffer value under the cursor; zooms toward the view centre when omitted
        #[arg(long)]
        depth: Option<f32>,

        /// Viewport width
        #[arg(long, default_value = "800")]
        width: u32,

        /// Viewport height
        #[arg(long, default_value = "600")]
        height: u32,
    },
}

fn parse_drag(s: &str) -> std::result::Result<(f32, f32), String> {
    let (dx, dy) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got '{}'", s))?;
    let dx = dx.trim().parse().map_err(|e| format!("bad DX '{}': {}", dx, e))?;
    let dy = dy.trim().parse().map_err(|e| format!("bad DY '{}': {}", dy, e))?;
    Ok((dx, dy))
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Inspect { path, lit, strict } => {
            let options = if strict {
                MeshOptions::new().strict()
            } else {
                MeshOptions::new()
            };
            let meshes = load_meshes(path, options)?;

            for (name, mut mesh) in meshes {
                let report = if lit {
                    inspect::<MaterialVertex>(&mut mesh)
                } else {
                    inspect::<Vertex>(&mut mesh)
                }
                .with_context(|| format!("building buffers for {}", name))?;
                println!("{}: {}", name, report);
            }
        }

        Commands::Orbit {
            drag,
            scroll,
            depth,
            width,
            height,
        } => {
            let config = ViewerConfig::new().size(width, height);
            let orbit = replay(&config, &drag, scroll, depth);

            println!("eye:      {}", orbit.camera().eye);
            println!("center:   {}", orbit.camera().center);
            println!("rotation: {}", orbit.rotation());
            let mut rotation = *orbit.rotation();
            println!("rotation matrix:\n{}", rotation.matrix_display());
            println!("model matrix:\n{}", orbit.model_matrix());
        }
    }

    Ok(())
}

fn load_meshes(path: Option<PathBuf>, options: MeshOptions) -> Result<Vec<(String, Mesh)>> {
    match path {
        Some(path) => {
            let scene = SceneData::from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            if let Some((min, max)) = scene.bounds() {
                log::info!("bounds: {} .. {}", min, max);
            }
            let mesh = Mesh::from_scene_with_options(&scene, options)?;
            Ok(vec![(path.display().to_string(), mesh)])
        }
        None => Ok(vec![
            ("skybox".to_string(), Mesh::skybox(500.0)),
            ("cube".to_string(), Mesh::cube(10.0)),
        ]),
    }
}

fn inspect<V: VertexRecord>(mesh: &mut Mesh) -> Result<String> {
    let buffers: MeshBuffers<V> = mesh.load_buffers()?;
    let skipped = mesh.skipped_faces().len();
    mesh.free_arrays();

    Ok(format!(
        "{} vertices ({} bytes), {} triangles, index buffers {:?}, {} face(s) skipped",
        mesh.vbo_size(),
        std::mem::size_of_val(buffers.vertices.as_slice()),
        buffers.triangle_count(),
        mesh.ibo_sizes(),
        skipped
    ))
}

/// Drives an orbit camera with one drag per entry, starting at the viewport
/// centre, then `scroll` wheel steps.
pub fn replay(
    config: &ViewerConfig,
    drags: &[(f32, f32)],
    scroll: i32,
    depth: Option<f32>,
) -> OrbitCamera {
    let mut orbit = OrbitCamera::from_config(config);
    let cx = config.width as f32 * 0.5;
    let cy = config.height as f32 * 0.5;

    for &(dx, dy) in drags {
        orbit.handle_event(InteractionEvent::ButtonDown {
            button: MouseButton::Left,
            x: cx,
            y: cy,
        });
        orbit.handle_event(InteractionEvent::Motion {
            x: cx + dx,
            y: cy + dy,
        });
        orbit.handle_event(InteractionEvent::ButtonUp {
            button: MouseButton::Left,
            x: cx + dx,
            y: cy + dy,
        });
        orbit.collapse();
    }

    let direction = if scroll >= 0 {
        ScrollDirection::In
    } else {
        ScrollDirection::Out
    };
    for _ in 0..scroll.unsigned_abs() {
        let event = match depth {
            Some(depth) => InteractionEvent::Wheel {
                direction,
                x: cx,
                y: cy,
                depth,
            },
            None if direction == ScrollDirection::In => InteractionEvent::Key(Key::ZoomIn),
            None => InteractionEvent::Key(Key::ZoomOut),
        };
        orbit.handle_event(event);
        orbit.collapse();
    }

    orbit
}
